//! Volume signature around the base.
//!
//! Volume should dry up inside the base, then expand on the latest bars,
//! without heavy volume on down days. Needs a base; without one the
//! criterion is not applicable.

use crate::domain::base::BaseInfo;
use crate::domain::config::VolumeConfig;
use crate::domain::criterion::{Criterion, CriterionResult};
use crate::domain::error::EvalError;
use crate::domain::series::{average_volume, PriceSeries};

pub fn evaluate(
    series: &PriceSeries,
    base: Option<&BaseInfo>,
    config: &VolumeConfig,
) -> CriterionResult {
    let Some(base) = base else {
        return CriterionResult::not_applicable(Criterion::VolumeSignature, "no base identified");
    };

    let mut result = CriterionResult::new(Criterion::VolumeSignature);
    result.detail("base_avg_volume", base.avg_volume_in_base);
    if let Err(err) = check_contraction(series, base, config, &mut result) {
        result.fail(err.to_string());
    }
    if let Err(err) = check_expansion(series, config, &mut result) {
        result.fail(err.to_string());
    }
    if let Err(err) = check_heavy_selling(series, base, config, &mut result) {
        result.fail(err.to_string());
    }
    result
}

fn check_contraction(
    series: &PriceSeries,
    base: &BaseInfo,
    config: &VolumeConfig,
    result: &mut CriterionResult,
) -> Result<(), EvalError> {
    let start = base.start_index.saturating_sub(config.pre_base_bars);
    let pre_base = &series.bars()[start..base.start_index];
    let pre_avg = average_volume(pre_base).ok_or_else(|| {
        EvalError::insufficient("pre-base volume", pre_base.len(), config.pre_base_bars)
    })?;
    if pre_avg <= 0.0 {
        return Err(EvalError::guard("volume contraction (pre-base average volume)"));
    }

    let ratio = base.avg_volume_in_base / pre_avg;
    let dry = ratio < config.contraction_warning;
    result.detail("pre_base_avg_volume", pre_avg);
    result.detail("contraction_ratio", ratio);
    result.detail("volume_dry_in_base", dry);
    if !dry {
        result.warn(format!(
            "Volume not drying up in base: {:.2}x pre-base average (prefer <{:.2}x)",
            ratio, config.contraction_warning
        ));
    }
    Ok(())
}

fn check_expansion(
    series: &PriceSeries,
    config: &VolumeConfig,
    result: &mut CriterionResult,
) -> Result<(), EvalError> {
    if series.len() < config.average_bars || config.recent_bars == 0 {
        return Err(EvalError::insufficient(
            "volume expansion",
            series.len(),
            config.average_bars,
        ));
    }
    let recent = average_volume(series.tail(config.recent_bars))
        .ok_or_else(|| EvalError::insufficient("recent volume", 0, config.recent_bars))?;
    let trailing = average_volume(series.tail(config.average_bars))
        .ok_or_else(|| EvalError::insufficient("trailing volume", 0, config.average_bars))?;
    if trailing <= 0.0 {
        return Err(EvalError::guard("volume expansion (trailing average volume)"));
    }

    let ratio = recent / trailing;
    result.detail("expansion_ratio", ratio);
    if ratio < config.expansion_min {
        result.fail(format!(
            "No volume expansion: last {} bars average {:.2}x the {}-bar average (need ≥{:.2}x)",
            config.recent_bars, ratio, config.average_bars, config.expansion_min
        ));
    }
    Ok(())
}

fn check_heavy_selling(
    series: &PriceSeries,
    base: &BaseInfo,
    config: &VolumeConfig,
    result: &mut CriterionResult,
) -> Result<(), EvalError> {
    if base.avg_volume_in_base <= 0.0 {
        return Err(EvalError::guard("heavy-sell check (base average volume)"));
    }
    let limit = base.avg_volume_in_base * config.heavy_sell_multiplier;
    let heavy: Vec<_> = series
        .tail(config.recent_bars)
        .iter()
        .filter(|b| b.is_down() && b.volume as f64 >= limit)
        .collect();

    result.detail("heavy_sell_days", heavy.len());
    if let Some(first) = heavy.first() {
        result.fail(format!(
            "Heavy selling: {} down day(s) at ≥{:.1}x base volume, first on {} ({} shares)",
            heavy.len(),
            config.heavy_sell_multiplier,
            first.date,
            first.volume
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
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    const BASE_START: usize = 60;
    const BASE_END: usize = 94;

    /// 60 pre-base bars, a 35-bar base, then 5 recent bars.
    fn fixture(pre: u64, in_base: u64, recent: u64, recent_down: bool) -> Vec<PriceBar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        (0..100)
            .map(|i| {
                let (volume, down) = match i {
                    i if i < BASE_START => (pre, false),
                    i if i <= BASE_END => (in_base, false),
                    _ => (recent, recent_down),
                };
                PriceBar {
                    date: start + chrono::Duration::days(i as i64),
                    open: if down { 100.5 } else { 100.0 },
                    high: 101.0,
                    low: 99.0,
                    close: 100.0,
                    volume,
                }
            })
            .collect()
    }

    fn base_of(bars: &[PriceBar]) -> BaseInfo {
        let slice = &bars[BASE_START..=BASE_END];
        let (pivot, base_low) = high_low(slice).unwrap();
        BaseInfo {
            start_date: slice[0].date,
            end_date: slice[slice.len() - 1].date,
            start_index: BASE_START,
            end_index: BASE_END,
            length_in_weeks: 7.0,
            depth_pct: 2.0,
            detection_method: DetectionMethod::Volatility,
            avg_volume_in_base: average_volume(slice).unwrap(),
            pivot,
            base_low,
        }
    }

    #[test]
    fn constructive_volume_passes() {
        let bars = fixture(10_000, 8_000, 20_000, false);
        let series = PriceSeries::new(&bars).unwrap();
        let result = evaluate(&series, Some(&base_of(&bars)), &VolumeConfig::default());

        assert!(result.passed(), "{:?}", result.failures);
        assert!(result.warnings.is_empty());
        assert_relative_eq!(result.number("contraction_ratio").unwrap(), 0.8);
        // 15 base bars at 8k and 5 recent at 20k in the 20-bar average.
        assert_relative_eq!(result.number("expansion_ratio").unwrap(), 20_000.0 / 11_000.0);
    }

    #[test]
    fn no_base_is_not_applicable() {
        let bars = fixture(10_000, 8_000, 20_000, false);
        let series = PriceSeries::new(&bars).unwrap();
        let result = evaluate(&series, None, &VolumeConfig::default());
        assert!(!result.is_applicable());
        assert_eq!(result.failure_count(), 0);
    }

    #[test]
    fn base_at_series_start_has_no_pre_base() {
        let bars = fixture(10_000, 8_000, 20_000, false);
        let series = PriceSeries::new(&bars).unwrap();
        let mut base = base_of(&bars);
        base.start_index = 0;
        let result = evaluate(&series, Some(&base), &VolumeConfig::default());
        assert!(result
            .failures
            .iter()
            .any(|f| f.starts_with("insufficient data for pre-base volume")));
    }

    #[test]
    fn zero_pre_base_volume_is_guarded() {
        let bars = fixture(0, 8_000, 20_000, false);
        let series = PriceSeries::new(&bars).unwrap();
        let result = evaluate(&series, Some(&base_of(&bars)), &VolumeConfig::default());
        assert_eq!(result.failure_count(), 1, "{:?}", result.failures);
        assert!(result.failures[0].contains("cannot compute volume contraction"));
    }

    #[test]
    fn busy_base_warns() {
        let bars = fixture(10_000, 9_500, 20_000, false);
        let series = PriceSeries::new(&bars).unwrap();
        let result = evaluate(&series, Some(&base_of(&bars)), &VolumeConfig::default());
        assert!(result.passed(), "{:?}", result.failures);
        assert!(result.warnings[0].starts_with("Volume not drying up"));
    }

    #[test]
    fn flat_recent_volume_fails_expansion() {
        let bars = fixture(10_000, 8_000, 8_000, false);
        let series = PriceSeries::new(&bars).unwrap();
        let result = evaluate(&series, Some(&base_of(&bars)), &VolumeConfig::default());
        assert_eq!(result.failure_count(), 1);
        assert!(result.failures[0].starts_with("No volume expansion"));
    }

    #[test]
    fn heavy_down_days_fail() {
        let bars = fixture(10_000, 8_000, 20_000, true);
        let series = PriceSeries::new(&bars).unwrap();
        let result = evaluate(&series, Some(&base_of(&bars)), &VolumeConfig::default());
        assert_eq!(result.number("heavy_sell_days"), Some(5.0));
        assert!(result.failures.iter().any(|f| f.starts_with("Heavy selling: 5 down day(s)")));
    }
}
