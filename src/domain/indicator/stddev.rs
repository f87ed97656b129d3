//! Rolling volatility of daily returns.
//!
//! RETSTD(n)[i] = sample stddev of the n returns ending at bar i, where
//! return[i] = C[i] / C[i-1] - 1.
//! Warmup: first n bars are invalid (bar 0 has no return).

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::PriceBar;
use crate::domain::series::daily_returns;

/// Sample (n-1) standard deviation. `None` with fewer than two values.
pub fn sample_stddev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some(variance.sqrt())
}

pub fn calculate_return_stddev(bars: &[PriceBar], period: usize) -> IndicatorSeries {
    let returns = daily_returns(bars);
    let mut values = Vec::with_capacity(bars.len());

    for (i, bar) in bars.iter().enumerate() {
        // returns[k] belongs to bar k + 1
        let value = if period >= 2 && i >= period {
            sample_stddev(&returns[i - period..i])
        } else {
            None
        };

        values.push(IndicatorPoint {
            date: bar.date,
            valid: value.is_some(),
            value: value.unwrap_or(0.0),
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::ReturnStddev(period),
        values,
    }
}
