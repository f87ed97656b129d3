//! Simple moving average of closes.
//!
//! SMA(n)[i] = sum(C[i-n+1..=i]) / n
//! Warmup: first (n-1) bars are invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::PriceBar;

pub fn calculate_sma(bars: &[PriceBar], period: usize) -> IndicatorSeries {
    let mut values = Vec::with_capacity(bars.len());
    let mut running = 0.0;

    for (i, bar) in bars.iter().enumerate() {
        running += bar.close;
        if period > 0 && i >= period {
            running -= bars[i - period].close;
        }

        let valid = period > 0 && i + 1 >= period;
        values.push(IndicatorPoint {
            date: bar.date,
            valid,
            value: if valid { running / period as f64 } else { 0.0 },
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Sma(period),
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_bars(prices: &[f64]) -> Vec<PriceBar> {
        prices
            .iter()
            .enumerate()
            .map(|(i, &close)| PriceBar {
                date: NaiveDate::from_ymd_opt(2024, 1, (i + 1) as u32).unwrap(),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1000,
            })
            .collect()
    }

    #[test]
    fn sma_warmup() {
        let bars = make_bars(&[1.0, 2.0, 3.0, 4.0]);
        let series = calculate_sma(&bars, 3);
        assert!(!series.values[0].valid);
        assert!(!series.values[1].valid);
        assert!(series.values[2].valid);
        assert!(series.values[3].valid);
    }

    #[test]
    fn sma_values() {
        let bars = make_bars(&[1.0, 2.0, 3.0, 4.0, 10.0]);
        let series = calculate_sma(&bars, 3);
        assert!((series.value_at(2).unwrap() - 2.0).abs() < 1e-12);
        assert!((series.value_at(3).unwrap() - 3.0).abs() < 1e-12);
        assert!((series.value_at(4).unwrap() - 17.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn sma_period_longer_than_series() {
        let bars = make_bars(&[1.0, 2.0]);
        let series = calculate_sma(&bars, 5);
        assert_eq!(series.values.len(), 2);
        assert_eq!(series.valid_count(), 0);
    }

    #[test]
    fn sma_zero_period_is_all_invalid() {
        let bars = make_bars(&[1.0, 2.0]);
        let series = calculate_sma(&bars, 0);
        assert_eq!(series.valid_count(), 0);
        assert_eq!(series.indicator_type, IndicatorType::Sma(0));
    }
}
