//! sepagrade: grades stocks against the SEPA trend/base/strength/volume/breakout
//! methodology.
//!
//! Hexagonal architecture: the pure grading engine in [`domain`], port traits
//! in [`ports`], concrete implementations in [`adapters`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
