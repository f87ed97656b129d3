//! Trend & structure: the non-negotiable criterion.
//!
//! Checks, each a separate failure:
//! - close above SMA(50), SMA(150) and SMA(200)
//! - SMA(50) > SMA(150) > SMA(200)
//! - every SMA rising over the slope lookback (fallback lookback when the SMA
//!   has too little history)
//! - close at least 30% above the 52-week low
//! - close within 15% of the 52-week high (within 10% only warns: late stage)

use crate::domain::config::TrendConfig;
use crate::domain::criterion::{Criterion, CriterionResult};
use crate::domain::error::EvalError;
use crate::domain::indicator::sma::calculate_sma;
use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::series::{high_low, PriceSeries};

/// Position of the last close inside its 52-week range.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct YearRange {
    pub high: f64,
    pub low: f64,
    pub pct_above_low: f64,
    pub pct_below_high: f64,
}

pub fn year_range(series: &PriceSeries, year_bars: usize) -> Result<YearRange, EvalError> {
    let year = series.tail(year_bars);
    let (high, low) = high_low(year).ok_or_else(|| EvalError::insufficient("52-week range", 0, 1))?;
    if low <= 0.0 {
        return Err(EvalError::guard("distance from 52-week low"));
    }
    if high <= 0.0 {
        return Err(EvalError::guard("distance from 52-week high"));
    }
    let price = series.last().close;
    Ok(YearRange {
        high,
        low,
        pct_above_low: (price - low) / low * 100.0,
        pct_below_high: (high - price) / high * 100.0,
    })
}

pub fn evaluate(series: &PriceSeries, config: &TrendConfig) -> CriterionResult {
    check(series, config)
        .unwrap_or_else(|err| CriterionResult::from_error(Criterion::TrendStructure, &err))
}

fn check(series: &PriceSeries, config: &TrendConfig) -> Result<CriterionResult, EvalError> {
    let bars = series.bars();
    if bars.len() < config.min_history {
        return Err(EvalError::insufficient(
            "trend structure",
            bars.len(),
            config.min_history,
        ));
    }

    let mut result = CriterionResult::new(Criterion::TrendStructure);
    let price = series.last().close;
    result.detail("current_price", price);

    let mut current = Vec::with_capacity(3);
    for period in [config.sma_fast, config.sma_mid, config.sma_slow] {
        let sma = calculate_sma(bars, period);
        let value = sma.latest().ok_or_else(|| {
            EvalError::insufficient(sma.indicator_type.to_string(), bars.len(), period)
        })?;
        result.detail(&format!("sma_{}", period), value);

        let above = price > value;
        result.detail(&format!("above_{}", period), above);
        if !above {
            result.fail(format!(
                "Price {:.2} not above {} {:.2}",
                price, sma.indicator_type, value
            ));
        }

        check_slope(&sma, config, &mut result);
        current.push((period, value));
    }

    let (fast, mid, slow) = (current[0], current[1], current[2]);
    let ordered = fast.1 > mid.1 && mid.1 > slow.1;
    result.detail("sma_order_correct", ordered);
    if !ordered {
        result.fail(format!(
            "SMA order incorrect: SMA({}) {:.2}, SMA({}) {:.2}, SMA({}) {:.2} (need fast > mid > slow)",
            fast.0, fast.1, mid.0, mid.1, slow.0, slow.1
        ));
    }

    let range = match year_range(series, config.year_bars) {
        Ok(range) => range,
        Err(err) => {
            result.fail(err.to_string());
            return Ok(result);
        }
    };
    result.detail("52_week_high", range.high);
    result.detail("52_week_low", range.low);
    result.detail("price_from_52w_low_pct", range.pct_above_low);
    result.detail("price_from_52w_high_pct", range.pct_below_high);

    if range.pct_above_low < config.min_above_52w_low_pct {
        result.fail(format!(
            "Price only {:.1}% above 52W low (need ≥{:.0}%)",
            range.pct_above_low, config.min_above_52w_low_pct
        ));
    }
    if range.pct_below_high > config.max_below_52w_high_pct {
        result.fail(format!(
            "Price {:.1}% below 52W high (need within {:.0}%)",
            range.pct_below_high, config.max_below_52w_high_pct
        ));
    } else if range.pct_below_high < config.late_stage_warning_pct {
        result.warn(format!(
            "Price within {:.1}% of 52W high, may be late stage",
            range.pct_below_high
        ));
    }

    Ok(result)
}

fn check_slope(sma: &IndicatorSeries, config: &TrendConfig, result: &mut CriterionResult) {
    let history = sma.valid_count();
    let lookback = if history > config.slope_lookback {
        config.slope_lookback
    } else if history > config.slope_lookback_fallback {
        config.slope_lookback_fallback
    } else {
        result.warn(format!(
            "{} slope not measurable ({} values, need {})",
            sma.indicator_type,
            history,
            config.slope_lookback_fallback + 1
        ));
        return;
    };

    let last = sma.values.len() - 1;
    let (Some(now), Some(then)) = (sma.value_at(last), sma.value_at(last - lookback)) else {
        return;
    };
    let rising = now > then;
    let key = match sma.indicator_type {
        IndicatorType::Sma(period) => period,
        _ => 0,
    };
    result.detail(&format!("sma_{}_slope_lookback", key), lookback);
    result.detail(&format!("sma_{}_rising", key), rising);
    if !rising {
        result.fail(format!(
            "{} not sloping up over {} bars ({:.2} → {:.2})",
            sma.indicator_type, lookback, then, now
        ));
    }
}
