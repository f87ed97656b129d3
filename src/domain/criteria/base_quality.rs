//! Base quality: is the consolidation a constructive one?
//!
//! Length within 3-8 weeks, depth at most 25% (over 20% warns), volatility
//! inside the base no more than 1.5x the trailing year's, and closes sitting
//! in the upper part of each day's range. Without a base this criterion
//! fails outright.

use crate::domain::base::BaseInfo;
use crate::domain::config::BaseQualityConfig;
use crate::domain::criterion::{Criterion, CriterionResult};
use crate::domain::error::EvalError;
use crate::domain::indicator::stddev::sample_stddev;
use crate::domain::series::{daily_returns, PriceSeries};

pub fn evaluate(
    series: &PriceSeries,
    base: Option<&BaseInfo>,
    config: &BaseQualityConfig,
) -> CriterionResult {
    let mut result = CriterionResult::new(Criterion::BaseQuality);
    let Some(base) = base else {
        result.fail("No clear base pattern identified");
        return result;
    };

    result.detail("base_start", base.start_date);
    result.detail("base_end", base.end_date);
    result.detail("detection_method", base.detection_method.to_string());
    result.detail("length_weeks", base.length_in_weeks);
    result.detail("depth_pct", base.depth_pct);
    result.detail("pivot", base.pivot);

    if base.length_in_weeks < config.min_weeks || base.length_in_weeks > config.max_weeks {
        result.fail(format!(
            "Base length {:.1} weeks (need {:.0}-{:.0} weeks)",
            base.length_in_weeks, config.min_weeks, config.max_weeks
        ));
    }

    if base.depth_pct > config.max_depth_pct {
        result.fail(format!(
            "Base too deep: {:.1}% (max {:.0}%)",
            base.depth_pct, config.max_depth_pct
        ));
    } else if base.depth_pct > config.depth_warning_pct {
        result.warn(format!("Base depth {:.1}% is on the deep side", base.depth_pct));
    }

    if let Err(err) = check_tightness(series, base, config, &mut result) {
        result.fail(err.to_string());
    }
    if let Err(err) = check_close_position(series, base, config, &mut result) {
        result.fail(err.to_string());
    }

    result
}

fn check_tightness(
    series: &PriceSeries,
    base: &BaseInfo,
    config: &BaseQualityConfig,
    result: &mut CriterionResult,
) -> Result<(), EvalError> {
    let base_returns = daily_returns(base.bars(series));
    let base_vol = sample_stddev(&base_returns)
        .ok_or_else(|| EvalError::insufficient("base volatility", base.bar_count(), 3))?;

    let reference_returns = daily_returns(series.tail(config.volatility_reference_bars + 1));
    let reference_vol = sample_stddev(&reference_returns)
        .ok_or_else(|| EvalError::insufficient("reference volatility", series.len(), 3))?;
    if reference_vol <= 0.0 {
        return Err(EvalError::guard("base tightness (reference volatility)"));
    }

    let ratio = base_vol / reference_vol;
    result.detail("base_volatility", base_vol);
    result.detail("reference_volatility", reference_vol);
    result.detail("volatility_ratio", ratio);
    if ratio > config.max_volatility_ratio {
        result.fail(format!(
            "Base too loose: volatility {:.2}x the {}-bar average (need ≤{:.1}x)",
            ratio, config.volatility_reference_bars, config.max_volatility_ratio
        ));
    }
    Ok(())
}

fn check_close_position(
    series: &PriceSeries,
    base: &BaseInfo,
    config: &BaseQualityConfig,
    result: &mut CriterionResult,
) -> Result<(), EvalError> {
    let positions: Vec<f64> = base
        .bars(series)
        .iter()
        .filter_map(|b| b.close_position_pct())
        .collect();
    if positions.is_empty() {
        return Err(EvalError::guard("close position in base (every bar has zero range)"));
    }

    let avg = positions.iter().sum::<f64>() / positions.len() as f64;
    result.detail("avg_close_position_pct", avg);
    if avg < config.min_avg_close_position_pct {
        result.fail(format!(
            "Closes not near highs: average {:.1}% of range (need ≥{:.0}%)",
            avg, config.min_avg_close_position_pct
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::base::DetectionMethod;
    use crate::domain::ohlcv::PriceBar;
    use crate::domain::series::high_low;
    use chrono::NaiveDate;

    /// History bars span ±1% around the close; base bars use the given
    /// high/low multipliers.
    fn build(history: &[f64], base: &[f64], high_mult: f64, low_mult: f64) -> Vec<PriceBar> {
        let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        let spans = history
            .iter()
            .map(|&c| (c, 1.01, 0.99))
            .chain(base.iter().map(|&c| (c, high_mult, low_mult)));
        spans
            .enumerate()
            .map(|(i, (close, hi, lo))| PriceBar {
                date: start + chrono::Duration::days(i as i64),
                open: close,
                high: close * hi,
                low: close * lo,
                close,
                volume: 10_000,
            })
            .collect()
    }

    fn alternating(len: usize, a: f64, b: f64) -> Vec<f64> {
        (0..len).map(|i| if i % 2 == 0 { a } else { b }).collect()
    }

    fn base_over(bars: &[PriceBar], start: usize, end: usize) -> BaseInfo {
        let (pivot, base_low) = high_low(&bars[start..=end]).unwrap();
        BaseInfo {
            start_date: bars[start].date,
            end_date: bars[end].date,
            start_index: start,
            end_index: end,
            length_in_weeks: (end - start + 1) as f64 / 5.0,
            depth_pct: (pivot - base_low) / pivot * 100.0,
            detection_method: DetectionMethod::Volatility,
            avg_volume_in_base: 10_000.0,
            pivot,
            base_low,
        }
    }

    fn tight_fixture() -> Vec<PriceBar> {
        build(
            &alternating(230, 100.0, 102.0),
            &alternating(30, 101.0, 101.5),
            1.002,
            0.99,
        )
    }

    #[test]
    fn missing_base_is_one_failure() {
        let bars = tight_fixture();
        let series = PriceSeries::new(&bars).unwrap();
        let result = evaluate(&series, None, &BaseQualityConfig::default());
        assert_eq!(result.failure_count(), 1);
        assert!(result.failures[0].contains("No clear base"));
    }

    #[test]
    fn tight_base_with_strong_closes_passes() {
        let bars = tight_fixture();
        let series = PriceSeries::new(&bars).unwrap();
        let base = base_over(&bars, 230, 259);
        let result = evaluate(&series, Some(&base), &BaseQualityConfig::default());
        assert!(result.passed(), "{:?}", result.failures);
        assert!(result.number("volatility_ratio").unwrap() < 1.0);
        assert!(result.number("avg_close_position_pct").unwrap() > 80.0);
    }

    #[test]
    fn short_base_fails_length() {
        let bars = tight_fixture();
        let series = PriceSeries::new(&bars).unwrap();
        let base = base_over(&bars, 250, 259);
        let result = evaluate(&series, Some(&base), &BaseQualityConfig::default());
        assert_eq!(result.failure_count(), 1, "{:?}", result.failures);
        assert!(result.failures[0].starts_with("Base length 2.0 weeks"));
    }

    #[test]
    fn depth_fails_past_ceiling_and_warns_before_it() {
        let bars = tight_fixture();
        let series = PriceSeries::new(&bars).unwrap();
        let mut base = base_over(&bars, 230, 259);

        base.depth_pct = 30.0;
        let result = evaluate(&series, Some(&base), &BaseQualityConfig::default());
        assert!(result.failures.iter().any(|f| f.contains("too deep")));

        base.depth_pct = 22.0;
        let result = evaluate(&series, Some(&base), &BaseQualityConfig::default());
        assert!(result.passed());
        assert!(result.warnings.iter().any(|w| w.contains("deep side")));
    }

    #[test]
    fn loose_base_fails_tightness() {
        let bars = build(
            &alternating(230, 100.0, 100.5),
            &alternating(30, 100.0, 106.0),
            1.002,
            0.99,
        );
        let series = PriceSeries::new(&bars).unwrap();
        let base = base_over(&bars, 230, 259);
        let result = evaluate(&series, Some(&base), &BaseQualityConfig::default());
        assert!(result.failures.iter().any(|f| f.contains("too loose")));
    }

    #[test]
    fn closes_near_lows_fail() {
        let bars = build(
            &alternating(230, 100.0, 102.0),
            &alternating(30, 101.0, 101.5),
            1.01,
            0.998,
        );
        let series = PriceSeries::new(&bars).unwrap();
        let base = base_over(&bars, 230, 259);
        let result = evaluate(&series, Some(&base), &BaseQualityConfig::default());
        assert_eq!(result.failure_count(), 1, "{:?}", result.failures);
        assert!(result.failures[0].contains("Closes not near highs"));
    }
}
