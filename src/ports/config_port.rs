//! Configuration access port trait.
//!
//! Absent keys yield the caller's default; a present but unparsable value is
//! a `ConfigInvalid` error rather than a silent fallback.

use crate::domain::error::SepaError;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> Result<i64, SepaError>;
    fn get_double(&self, section: &str, key: &str, default: f64) -> Result<f64, SepaError>;
    fn get_bool(&self, section: &str, key: &str, default: bool) -> Result<bool, SepaError>;
    /// Section names present in the source, lower-cased.
    fn sections(&self) -> Vec<String>;
}
