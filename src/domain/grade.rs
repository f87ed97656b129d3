//! Grade and position size from the five criterion results.
//!
//! Trend structure is non-negotiable: any trend failure is an F with no
//! position, whatever else passed. Otherwise failures across the remaining
//! four criteria are tallied against [`GradeThresholds`]. Not-applicable
//! criteria contribute nothing to the tally.

use crate::domain::config::GradeThresholds;
use crate::domain::criterion::CriterionResult;
use std::fmt;

/// Ordered best to worst, so sorting ascending puts A+ first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Grade {
    APlus,
    A,
    B,
    C,
    F,
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::F => "F",
        };
        f.pad(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PositionSize {
    Full,
    Half,
    None,
}

impl fmt::Display for PositionSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PositionSize::Full => "Full",
            PositionSize::Half => "Half",
            PositionSize::None => "None",
        };
        f.pad(s)
    }
}

impl Grade {
    pub fn position_size(self) -> PositionSize {
        match self {
            Grade::APlus => PositionSize::Full,
            Grade::A => PositionSize::Half,
            Grade::B | Grade::C | Grade::F => PositionSize::None,
        }
    }

    /// Only A+ and A setups are actionable.
    pub fn meets_criteria(self) -> bool {
        matches!(self, Grade::APlus | Grade::A)
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GradeOutcome {
    pub grade: Grade,
    pub position_size: PositionSize,
    pub meets_criteria: bool,
    /// Failures across every applicable criterion, trend included.
    pub total_failures: usize,
}

impl GradeOutcome {
    fn from_grade(grade: Grade, total_failures: usize) -> Self {
        Self {
            grade,
            position_size: grade.position_size(),
            meets_criteria: grade.meets_criteria(),
            total_failures,
        }
    }
}

pub fn grade_for_failures(failures: usize, thresholds: &GradeThresholds) -> Grade {
    if failures <= thresholds.a_plus_max {
        Grade::APlus
    } else if failures <= thresholds.a_max {
        Grade::A
    } else if failures <= thresholds.b_max {
        Grade::B
    } else if failures <= thresholds.c_max {
        Grade::C
    } else {
        Grade::F
    }
}

pub fn calculate(
    trend: &CriterionResult,
    base_quality: &CriterionResult,
    relative_strength: &CriterionResult,
    volume: &CriterionResult,
    breakout: &CriterionResult,
    thresholds: &GradeThresholds,
) -> GradeOutcome {
    let others = base_quality.failure_count()
        + relative_strength.failure_count()
        + volume.failure_count()
        + breakout.failure_count();
    let total = trend.failure_count() + others;

    if trend.failure_count() > 0 {
        return GradeOutcome::from_grade(Grade::F, total);
    }
    GradeOutcome::from_grade(grade_for_failures(others, thresholds), total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::criterion::Criterion;

    fn result(criterion: Criterion, failures: usize) -> CriterionResult {
        let mut r = CriterionResult::new(criterion);
        for i in 0..failures {
            r.fail(format!("failure {}", i));
        }
        r
    }

    fn grade_with(trend: usize, others: [usize; 4]) -> GradeOutcome {
        calculate(
            &result(Criterion::TrendStructure, trend),
            &result(Criterion::BaseQuality, others[0]),
            &result(Criterion::RelativeStrength, others[1]),
            &result(Criterion::VolumeSignature, others[2]),
            &result(Criterion::BreakoutRules, others[3]),
            &GradeThresholds::default(),
        )
    }

    #[test]
    fn clean_sheet_is_a_plus_full() {
        let outcome = grade_with(0, [0, 0, 0, 0]);
        assert_eq!(outcome.grade, Grade::APlus);
        assert_eq!(outcome.position_size, PositionSize::Full);
        assert!(outcome.meets_criteria);
        assert_eq!(outcome.total_failures, 0);
    }

    #[test]
    fn tally_boundaries() {
        let cases = [
            (0, Grade::APlus),
            (1, Grade::A),
            (2, Grade::A),
            (3, Grade::B),
            (4, Grade::C),
            (5, Grade::F),
            (9, Grade::F),
        ];
        for (n, expected) in cases {
            assert_eq!(
                grade_for_failures(n, &GradeThresholds::default()),
                expected,
                "{} failures",
                n
            );
        }
    }

    #[test]
    fn trend_failure_overrides_everything() {
        let outcome = grade_with(1, [0, 0, 0, 0]);
        assert_eq!(outcome.grade, Grade::F);
        assert_eq!(outcome.position_size, PositionSize::None);
        assert!(!outcome.meets_criteria);
        assert_eq!(outcome.total_failures, 1);
    }

    #[test]
    fn failures_spread_across_criteria() {
        let outcome = grade_with(0, [1, 1, 0, 0]);
        assert_eq!(outcome.grade, Grade::A);
        assert_eq!(outcome.position_size, PositionSize::Half);

        let outcome = grade_with(0, [1, 1, 1, 0]);
        assert_eq!(outcome.grade, Grade::B);
        assert_eq!(outcome.position_size, PositionSize::None);
        assert!(!outcome.meets_criteria);
    }

    #[test]
    fn not_applicable_adds_nothing() {
        let outcome = calculate(
            &result(Criterion::TrendStructure, 0),
            &result(Criterion::BaseQuality, 1),
            &result(Criterion::RelativeStrength, 0),
            &CriterionResult::not_applicable(Criterion::VolumeSignature, "no base"),
            &CriterionResult::not_applicable(Criterion::BreakoutRules, "no base"),
            &GradeThresholds::default(),
        );
        assert_eq!(outcome.grade, Grade::A);
        assert_eq!(outcome.total_failures, 1);
    }

    #[test]
    fn grades_sort_best_first() {
        let mut grades = vec![Grade::F, Grade::A, Grade::APlus, Grade::C, Grade::B];
        grades.sort();
        assert_eq!(
            grades,
            vec![Grade::APlus, Grade::A, Grade::B, Grade::C, Grade::F]
        );
        assert_eq!(Grade::APlus.to_string(), "A+");
    }
}
