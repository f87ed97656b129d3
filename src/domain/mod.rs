//! Core domain types and logic.

pub mod ohlcv;
pub mod series;
pub mod indicator;
pub mod base;
pub mod criterion;
pub mod criteria;
pub mod grade;
pub mod scan;
pub mod config;
pub mod config_validation;
pub mod universe;
pub mod error;
