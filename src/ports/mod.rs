//! Port traits the engine's collaborators implement.

pub mod config_port;
pub mod data_port;
