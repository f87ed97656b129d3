//! The five SEPA criterion evaluators.
//!
//! Each evaluator is a pure function returning a [`CriterionResult`]. Errors
//! raised while computing (short history, misaligned benchmark, zero
//! denominators) are caught here and recorded as failures, so no evaluator
//! can abort a scan.
//!
//! [`CriterionResult`]: crate::domain::criterion::CriterionResult

pub mod base_quality;
pub mod breakout;
pub mod relative_strength;
pub mod trend;
pub mod volume;
