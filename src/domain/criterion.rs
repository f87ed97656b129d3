//! Outcome record shared by every criterion evaluator.

use crate::domain::error::EvalError;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Criterion {
    TrendStructure,
    BaseQuality,
    RelativeStrength,
    VolumeSignature,
    BreakoutRules,
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Criterion::TrendStructure => "trend structure",
            Criterion::BaseQuality => "base quality",
            Criterion::RelativeStrength => "relative strength",
            Criterion::VolumeSignature => "volume signature",
            Criterion::BreakoutRules => "breakout rules",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DetailValue {
    Number(f64),
    Flag(bool),
    Text(String),
    Date(NaiveDate),
}

impl From<f64> for DetailValue {
    fn from(v: f64) -> Self {
        DetailValue::Number(v)
    }
}

impl From<usize> for DetailValue {
    fn from(v: usize) -> Self {
        DetailValue::Number(v as f64)
    }
}

impl From<bool> for DetailValue {
    fn from(v: bool) -> Self {
        DetailValue::Flag(v)
    }
}

impl From<&str> for DetailValue {
    fn from(v: &str) -> Self {
        DetailValue::Text(v.to_string())
    }
}

impl From<String> for DetailValue {
    fn from(v: String) -> Self {
        DetailValue::Text(v)
    }
}

impl From<NaiveDate> for DetailValue {
    fn from(v: NaiveDate) -> Self {
        DetailValue::Date(v)
    }
}

/// Whether a criterion could be judged at all.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CriterionStatus {
    Evaluated,
    /// Requires an identified base and none was found. Neither a pass nor a
    /// fail; grading leaves it out of the tally.
    NotApplicable { reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Fail,
    NotApplicable,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CriterionResult {
    pub criterion: Criterion,
    pub status: CriterionStatus,
    pub failures: Vec<String>,
    pub warnings: Vec<String>,
    pub details: BTreeMap<String, DetailValue>,
}

impl CriterionResult {
    pub fn new(criterion: Criterion) -> Self {
        Self {
            criterion,
            status: CriterionStatus::Evaluated,
            failures: Vec::new(),
            warnings: Vec::new(),
            details: BTreeMap::new(),
        }
    }

    pub fn not_applicable(criterion: Criterion, reason: impl Into<String>) -> Self {
        Self {
            status: CriterionStatus::NotApplicable {
                reason: reason.into(),
            },
            ..Self::new(criterion)
        }
    }

    /// An evaluated result holding the error as its single failure.
    pub fn from_error(criterion: Criterion, err: &EvalError) -> Self {
        let mut result = Self::new(criterion);
        result.fail(err.to_string());
        result
    }

    pub fn fail(&mut self, reason: impl Into<String>) {
        self.failures.push(reason.into());
    }

    pub fn warn(&mut self, reason: impl Into<String>) {
        self.warnings.push(reason.into());
    }

    pub fn detail(&mut self, name: &str, value: impl Into<DetailValue>) {
        self.details.insert(name.to_string(), value.into());
    }

    pub fn is_applicable(&self) -> bool {
        matches!(self.status, CriterionStatus::Evaluated)
    }

    pub fn passed(&self) -> bool {
        self.verdict() == Verdict::Pass
    }

    pub fn verdict(&self) -> Verdict {
        match self.status {
            CriterionStatus::NotApplicable { .. } => Verdict::NotApplicable,
            CriterionStatus::Evaluated if self.failures.is_empty() => Verdict::Pass,
            CriterionStatus::Evaluated => Verdict::Fail,
        }
    }

    /// Failures this criterion contributes to the grade tally.
    pub fn failure_count(&self) -> usize {
        if self.is_applicable() {
            self.failures.len()
        } else {
            0
        }
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        match self.details.get(name) {
            Some(DetailValue::Number(v)) => Some(*v),
            _ => None,
        }
    }
}
