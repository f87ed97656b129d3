//! Breakout rules over the most recent bars.
//!
//! The first bar of the recent window closing at least 2% over the pivot is
//! the breakout day. It must close in the top 30% of its range on at least
//! 1.2x its 20-bar average volume. Needs a base for the pivot.

use crate::domain::base::BaseInfo;
use crate::domain::config::BreakoutConfig;
use crate::domain::criterion::{Criterion, CriterionResult};
use crate::domain::error::EvalError;
use crate::domain::ohlcv::PriceBar;
use crate::domain::series::{average_volume, PriceSeries};

pub fn evaluate(
    series: &PriceSeries,
    base: Option<&BaseInfo>,
    config: &BreakoutConfig,
) -> CriterionResult {
    let Some(base) = base else {
        return CriterionResult::not_applicable(Criterion::BreakoutRules, "no base identified");
    };

    let mut result = CriterionResult::new(Criterion::BreakoutRules);
    let trigger = base.pivot * (1.0 + config.pivot_clearance_pct / 100.0);
    result.detail("pivot", base.pivot);
    result.detail("trigger_price", trigger);

    let bars = series.bars();
    let window_start = bars.len().saturating_sub(config.window_bars);
    let Some(index) = (window_start..bars.len()).find(|&i| bars[i].close >= trigger) else {
        result.detail("breakout_found", false);
        result.fail(format!(
            "Pivot not cleared: last close {:.2} below {:.2} (pivot {:.2} + {:.0}%)",
            series.last().close,
            trigger,
            base.pivot,
            config.pivot_clearance_pct
        ));
        return result;
    };

    let bar = &bars[index];
    result.detail("breakout_found", true);
    result.detail("breakout_date", bar.date);
    result.detail("clearance_pct", (bar.close / base.pivot - 1.0) * 100.0);

    if let Err(err) = check_close(bar, config, &mut result) {
        result.fail(err.to_string());
    }
    if let Err(err) = check_volume(bars, index, config, &mut result) {
        result.fail(err.to_string());
    }
    result
}

fn check_close(
    bar: &PriceBar,
    config: &BreakoutConfig,
    result: &mut CriterionResult,
) -> Result<(), EvalError> {
    let position = bar
        .close_position_pct()
        .ok_or_else(|| EvalError::guard("breakout close position (zero-range bar)"))?;
    result.detail("close_position_pct", position);
    if position < config.min_close_position_pct {
        result.fail(format!(
            "Weak breakout close: {:.1}% of the day's range (need ≥{:.0}%)",
            position, config.min_close_position_pct
        ));
    }
    Ok(())
}

fn check_volume(
    bars: &[PriceBar],
    index: usize,
    config: &BreakoutConfig,
    result: &mut CriterionResult,
) -> Result<(), EvalError> {
    if config.average_bars == 0 || index + 1 < config.average_bars {
        return Err(EvalError::insufficient(
            "breakout volume average",
            index + 1,
            config.average_bars,
        ));
    }
    let window = &bars[index + 1 - config.average_bars..=index];
    let avg = average_volume(window)
        .ok_or_else(|| EvalError::insufficient("breakout volume average", 0, config.average_bars))?;
    if avg <= 0.0 {
        return Err(EvalError::guard("breakout volume ratio (average volume)"));
    }

    let ratio = bars[index].volume as f64 / avg;
    result.detail("volume_ratio", ratio);
    if ratio < config.min_volume_ratio {
        result.fail(format!(
            "Breakout volume {:.2}x the {}-bar average (need ≥{:.2}x)",
            ratio, config.average_bars, config.min_volume_ratio
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::base::{identify_base, DetectionMethod};
    use crate::domain::config::BaseConfig;
    use crate::domain::criterion::DetailValue;
    use chrono::NaiveDate;

    /// (close, high, low, volume) for the last five bars.
    type Tail = [(f64, f64, f64, u64); 5];

    /// 55 quiet bars topping at 101 followed by the given tail.
    fn fixture(tail: Tail) -> Vec<PriceBar> {
        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let quiet = (0..55).map(|_| (100.0, 101.0, 99.0, 10_000u64));
        quiet
            .chain(tail)
            .enumerate()
            .map(|(i, (close, high, low, volume))| PriceBar {
                date: start + chrono::Duration::days(i as i64),
                open: close.min(high).max(low),
                high,
                low,
                close,
                volume,
            })
            .collect()
    }

    fn base(bars: &[PriceBar]) -> BaseInfo {
        BaseInfo {
            start_date: bars[25].date,
            end_date: bars[54].date,
            start_index: 25,
            end_index: 54,
            length_in_weeks: 6.0,
            depth_pct: 2.0,
            detection_method: DetectionMethod::Volatility,
            avg_volume_in_base: 10_000.0,
            pivot: 101.0,
            base_low: 99.0,
        }
    }

    const QUIET: (f64, f64, f64, u64) = (100.0, 101.0, 99.0, 10_000);

    #[test]
    fn clean_breakout_passes() {
        let bars = fixture([
            QUIET,
            QUIET,
            (104.0, 104.5, 102.0, 20_000),
            (104.5, 105.0, 103.5, 15_000),
            (105.0, 105.5, 104.0, 15_000),
        ]);
        let series = PriceSeries::new(&bars).unwrap();
        let result = evaluate(&series, Some(&base(&bars)), &BreakoutConfig::default());

        assert!(result.passed(), "{:?}", result.failures);
        assert_eq!(
            result.details.get("breakout_date"),
            Some(&DetailValue::Date(bars[57].date))
        );
        // Window is bars 38..=57: nineteen quiet bars plus the breakout day.
        let expected = 20_000.0 / (210_000.0 / 20.0);
        assert!((result.number("volume_ratio").unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn no_base_is_not_applicable() {
        let bars = fixture([QUIET; 5]);
        let series = PriceSeries::new(&bars).unwrap();
        let result = evaluate(&series, None, &BreakoutConfig::default());
        assert!(!result.is_applicable());
    }

    #[test]
    fn close_below_trigger_is_not_a_breakout() {
        // 102.9 clears the pivot but not by 2%.
        let bars = fixture([QUIET, QUIET, QUIET, QUIET, (102.9, 103.0, 101.0, 30_000)]);
        let series = PriceSeries::new(&bars).unwrap();
        let result = evaluate(&series, Some(&base(&bars)), &BreakoutConfig::default());
        assert_eq!(result.failure_count(), 1);
        assert!(result.failures[0].starts_with("Pivot not cleared"));
        assert_eq!(result.details.get("breakout_found"), Some(&DetailValue::Flag(false)));
    }

    #[test]
    fn weak_close_fails() {
        let bars = fixture([QUIET, QUIET, QUIET, QUIET, (103.5, 106.0, 102.0, 30_000)]);
        let series = PriceSeries::new(&bars).unwrap();
        let result = evaluate(&series, Some(&base(&bars)), &BreakoutConfig::default());
        assert_eq!(result.failure_count(), 1, "{:?}", result.failures);
        assert!(result.failures[0].starts_with("Weak breakout close: 37.5%"));
    }

    #[test]
    fn quiet_breakout_fails_volume() {
        let bars = fixture([QUIET, QUIET, QUIET, QUIET, (104.0, 104.5, 102.0, 10_000)]);
        let series = PriceSeries::new(&bars).unwrap();
        let result = evaluate(&series, Some(&base(&bars)), &BreakoutConfig::default());
        assert_eq!(result.failure_count(), 1, "{:?}", result.failures);
        assert!(result.failures[0].starts_with("Breakout volume 1.00x"));
    }

    #[test]
    fn zero_range_breakout_bar_is_guarded() {
        let bars = fixture([QUIET, QUIET, QUIET, QUIET, (104.0, 104.0, 104.0, 30_000)]);
        let series = PriceSeries::new(&bars).unwrap();
        let result = evaluate(&series, Some(&base(&bars)), &BreakoutConfig::default());
        assert!(result
            .failures
            .iter()
            .any(|f| f.contains("cannot compute breakout close position")));
    }

    #[test]
    fn earliest_qualifying_bar_is_the_breakout() {
        let bars = fixture([
            QUIET,
            (103.5, 104.0, 102.0, 25_000),
            (105.0, 105.5, 103.0, 25_000),
            QUIET,
            QUIET,
        ]);
        let series = PriceSeries::new(&bars).unwrap();
        let result = evaluate(&series, Some(&base(&bars)), &BreakoutConfig::default());
        assert_eq!(
            result.details.get("breakout_date"),
            Some(&DetailValue::Date(bars[56].date))
        );
    }

    #[test]
    fn base_ending_on_last_bar_has_no_breakout() {
        let bars = fixture([QUIET; 5]);
        let series = PriceSeries::new(&bars).unwrap();
        let base = identify_base(&series, &BaseConfig::default()).unwrap();
        assert_eq!(base.end_index, bars.len() - 1);

        let result = evaluate(&series, Some(&base), &BreakoutConfig::default());
        assert_eq!(result.failures.len(), 1);
        assert!(result.failures[0].starts_with("Pivot not cleared"));
        assert_eq!(result.details.get("breakout_found"), Some(&DetailValue::Flag(false)));
    }
}
