//! Base (consolidation) detection over the most recent bars.
//!
//! Two heuristics are tried in order:
//!
//! 1. Volatility: a rolling stddev of daily returns is compared against its
//!    own mean over the analysis window. Enough low-volatility bars, or a
//!    high enough share of them in the trailing sub-window, marks a base.
//! 2. Price range: the trailing short window (then the long one) is a base
//!    when its high-low range is small relative to its average close.
//!
//! Any candidate must also fit the configured length and depth bounds.
//! Detection is a pure function of the bars passed in.

use crate::domain::config::BaseConfig;
use crate::domain::indicator::stddev::calculate_return_stddev;
use crate::domain::ohlcv::PriceBar;
use crate::domain::series::{average_volume, high_low, PriceSeries};
use chrono::NaiveDate;
use log::debug;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DetectionMethod {
    Volatility,
    PriceRange,
}

impl fmt::Display for DetectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectionMethod::Volatility => f.write_str("volatility"),
            DetectionMethod::PriceRange => f.write_str("price_range"),
        }
    }
}

/// An identified base. Indices are positions in the series it was found in.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BaseInfo {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_index: usize,
    pub end_index: usize,
    pub length_in_weeks: f64,
    pub depth_pct: f64,
    pub detection_method: DetectionMethod,
    pub avg_volume_in_base: f64,
    /// Highest high inside the base.
    pub pivot: f64,
    pub base_low: f64,
}

impl BaseInfo {
    pub fn bar_count(&self) -> usize {
        self.end_index - self.start_index + 1
    }

    pub fn bars<'a>(&self, series: &PriceSeries<'a>) -> &'a [PriceBar] {
        &series.bars()[self.start_index..=self.end_index]
    }
}

pub fn identify_base(series: &PriceSeries, config: &BaseConfig) -> Option<BaseInfo> {
    let bars = series.bars();
    let lookback = config.lookback_bars.min(bars.len());
    if lookback < config.min_bars || lookback == 0 {
        return None;
    }
    let offset = bars.len() - lookback;
    let window = &bars[offset..];

    let base = volatility_base(bars, window, offset, config)
        .or_else(|| price_range_base(bars, lookback, config));

    match &base {
        Some(b) => debug!(
            "base found by {} method: {} → {} ({:.1} weeks, depth {:.1}%)",
            b.detection_method, b.start_date, b.end_date, b.length_in_weeks, b.depth_pct
        ),
        None => debug!("no base in last {} bars", lookback),
    }
    base
}

fn volatility_base(
    bars: &[PriceBar],
    window: &[PriceBar],
    offset: usize,
    config: &BaseConfig,
) -> Option<BaseInfo> {
    let volatility = calculate_return_stddev(window, config.volatility_window);
    let valid: Vec<f64> = volatility.valid_values().collect();
    if valid.is_empty() {
        return None;
    }
    let avg_volatility = valid.iter().sum::<f64>() / valid.len() as f64;
    let threshold = avg_volatility * config.volatility_ratio;

    let low_vol: Vec<usize> = volatility
        .values
        .iter()
        .enumerate()
        .filter(|(_, p)| p.valid && p.value < threshold)
        .map(|(i, _)| i)
        .collect();

    if low_vol.len() >= config.min_consecutive_days {
        if let (Some(&first), Some(&last)) = (low_vol.first(), low_vol.last()) {
            let found = accept_window(
                bars,
                offset + first,
                offset + last,
                DetectionMethod::Volatility,
                config,
            );
            if found.is_some() {
                return found;
            }
        }
    }

    let sub_len = if window.len() >= config.recent_window {
        config.recent_window
    } else {
        config.recent_window_short.min(window.len())
    };
    if sub_len == 0 || sub_len < config.min_percentage_days {
        return None;
    }
    let sub_start = window.len() - sub_len;
    let low_in_sub = low_vol.iter().filter(|&&i| i >= sub_start).count();
    let share = low_in_sub as f64 / sub_len as f64;
    if share < config.min_percentage {
        return None;
    }

    accept_window(
        bars,
        offset + sub_start,
        bars.len() - 1,
        DetectionMethod::Volatility,
        config,
    )
}

fn price_range_base(bars: &[PriceBar], lookback: usize, config: &BaseConfig) -> Option<BaseInfo> {
    let end = bars.len() - 1;

    if config.range_short_bars > 0 && lookback >= config.range_short_bars {
        let start = bars.len() - config.range_short_bars;
        if range_pct(&bars[start..]).is_some_and(|r| r <= config.range_short_max_pct) {
            return accept_window(bars, start, end, DetectionMethod::PriceRange, config);
        }
        if lookback >= config.range_long_min_bars {
            let long = config.range_long_bars.min(lookback);
            let start = bars.len() - long;
            if range_pct(&bars[start..]).is_some_and(|r| r <= config.range_long_max_pct) {
                return accept_window(bars, start, end, DetectionMethod::PriceRange, config);
            }
        }
    }
    None
}

/// (highest high - lowest low) as a percentage of the average close.
fn range_pct(bars: &[PriceBar]) -> Option<f64> {
    let (high, low) = high_low(bars)?;
    let avg_close = bars.iter().map(|b| b.close).sum::<f64>() / bars.len() as f64;
    if avg_close <= 0.0 {
        return None;
    }
    Some((high - low) / avg_close * 100.0)
}

fn accept_window(
    bars: &[PriceBar],
    start: usize,
    end: usize,
    method: DetectionMethod,
    config: &BaseConfig,
) -> Option<BaseInfo> {
    if start >= end || end >= bars.len() || config.bars_per_week <= 0.0 {
        return None;
    }
    let slice = &bars[start..=end];
    let (pivot, base_low) = high_low(slice)?;
    if pivot <= 0.0 {
        return None;
    }

    let length_in_weeks = slice.len() as f64 / config.bars_per_week;
    let depth_pct = (pivot - base_low) / pivot * 100.0;
    if length_in_weeks < config.min_weeks
        || length_in_weeks > config.max_weeks
        || depth_pct > config.max_depth_pct
    {
        debug!(
            "{} candidate rejected: {:.1} weeks, depth {:.1}%",
            method, length_in_weeks, depth_pct
        );
        return None;
    }

    Some(BaseInfo {
        start_date: slice[0].date,
        end_date: slice[slice.len() - 1].date,
        start_index: start,
        end_index: end,
        length_in_weeks,
        depth_pct,
        detection_method: method,
        avg_volume_in_base: average_volume(slice)?,
        pivot,
        base_low,
    })
}
