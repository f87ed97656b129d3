//! Scan orchestration: one instrument in, one [`ScanResult`] out.
//!
//! The base is identified once per scan and shared read-only with every
//! evaluator that needs it. Nothing here panics on bad input: a malformed or
//! short series, or a failed fetch, becomes a `ScanResult` carrying an
//! error message with grade F.

use crate::domain::base::{identify_base, BaseInfo};
use crate::domain::config::SepaConfig;
use crate::domain::criteria::{base_quality, breakout, relative_strength, trend, volume};
use crate::domain::criterion::CriterionResult;
use crate::domain::error::SepaError;
use crate::domain::grade::{self, Grade, PositionSize};
use crate::domain::ohlcv::PriceBar;
use crate::domain::series::PriceSeries;
use chrono::NaiveDateTime;
use log::{debug, info, warn};
use rayon::prelude::*;
use std::cmp::Ordering;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};

/// Why the data layer could not deliver a series.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FetchFailure {
    pub message: String,
    pub timestamp: NaiveDateTime,
}

/// What the data layer hands the engine for one ticker.
pub type SeriesFetch = Result<Vec<PriceBar>, FetchFailure>;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PriceInfo {
    pub current_price: f64,
    pub week_52_high: f64,
    pub week_52_low: f64,
    pub pct_below_52w_high: f64,
    pub pct_above_52w_low: f64,
}

impl PriceInfo {
    fn from_series(series: &PriceSeries, year_bars: usize) -> Option<Self> {
        let range = trend::year_range(series, year_bars).ok()?;
        Some(Self {
            current_price: series.last().close,
            week_52_high: range.high,
            week_52_low: range.low,
            pct_below_52w_high: range.pct_below_high,
            pct_above_52w_low: range.pct_above_low,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Checklist {
    pub trend: CriterionResult,
    pub base_quality: CriterionResult,
    pub relative_strength: CriterionResult,
    pub volume: CriterionResult,
    pub breakout: CriterionResult,
}

impl Checklist {
    /// All five results in grading order.
    pub fn results(&self) -> [&CriterionResult; 5] {
        [
            &self.trend,
            &self.base_quality,
            &self.relative_strength,
            &self.volume,
            &self.breakout,
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScanResult {
    pub ticker: String,
    pub grade: Grade,
    pub meets_criteria: bool,
    pub position_size: PositionSize,
    pub total_failures: usize,
    pub price_info: Option<PriceInfo>,
    pub base: Option<BaseInfo>,
    pub checklist: Option<Checklist>,
    pub error: Option<String>,
}

impl ScanResult {
    pub fn failed(ticker: &str, error: impl Into<String>) -> Self {
        Self {
            ticker: ticker.to_string(),
            grade: Grade::F,
            meets_criteria: false,
            position_size: PositionSize::None,
            total_failures: 0,
            price_info: None,
            base: None,
            checklist: None,
            error: Some(error.into()),
        }
    }

    /// First failure reason across the checklist, in grading order.
    pub fn first_failure(&self) -> Option<&str> {
        self.checklist.as_ref().and_then(|c| {
            c.results()
                .into_iter()
                .flat_map(|r| r.failures.iter())
                .map(String::as_str)
                .next()
        })
    }
}

pub fn scan_one(
    ticker: &str,
    bars: &[PriceBar],
    benchmark: &PriceSeries,
    config: &SepaConfig,
) -> ScanResult {
    match evaluate(ticker, bars, benchmark, config) {
        Ok(result) => {
            info!(
                "{}: grade {} ({}), {} failure(s)",
                ticker, result.grade, result.position_size, result.total_failures
            );
            result
        }
        Err(err) => {
            warn!("{}: {}", ticker, err);
            ScanResult::failed(ticker, err.to_string())
        }
    }
}

fn evaluate(
    ticker: &str,
    bars: &[PriceBar],
    benchmark: &PriceSeries,
    config: &SepaConfig,
) -> Result<ScanResult, SepaError> {
    let series = PriceSeries::new(bars).map_err(|source| SepaError::Series {
        ticker: ticker.to_string(),
        source,
    })?;
    if series.len() < config.trend.min_history {
        return Err(SepaError::InsufficientData {
            ticker: ticker.to_string(),
            bars: series.len(),
            minimum: config.trend.min_history,
        });
    }

    let base = identify_base(&series, &config.base);
    let checklist = Checklist {
        trend: trend::evaluate(&series, &config.trend),
        base_quality: base_quality::evaluate(&series, base.as_ref(), &config.base_quality),
        relative_strength: relative_strength::evaluate(
            &series,
            benchmark,
            base.as_ref(),
            &config.relative_strength,
        ),
        volume: volume::evaluate(&series, base.as_ref(), &config.volume),
        breakout: breakout::evaluate(&series, base.as_ref(), &config.breakout),
    };
    for result in checklist.results() {
        debug!(
            "{}: {} {:?}, {} failure(s), {} warning(s)",
            ticker,
            result.criterion,
            result.verdict(),
            result.failures.len(),
            result.warnings.len()
        );
    }

    let outcome = grade::calculate(
        &checklist.trend,
        &checklist.base_quality,
        &checklist.relative_strength,
        &checklist.volume,
        &checklist.breakout,
        &config.grade,
    );

    Ok(ScanResult {
        ticker: ticker.to_string(),
        grade: outcome.grade,
        meets_criteria: outcome.meets_criteria,
        position_size: outcome.position_size,
        total_failures: outcome.total_failures,
        price_info: PriceInfo::from_series(&series, config.trend.year_bars),
        base,
        checklist: Some(checklist),
        error: None,
    })
}

fn scan_fetched(
    ticker: &str,
    fetch: &SeriesFetch,
    benchmark: &PriceSeries,
    config: &SepaConfig,
) -> ScanResult {
    match fetch {
        Ok(bars) => scan_one(ticker, bars, benchmark, config),
        Err(failure) => {
            warn!("{}: fetch failed at {}: {}", ticker, failure.timestamp, failure.message);
            ScanResult::failed(
                ticker,
                format!("data fetch failed at {}: {}", failure.timestamp, failure.message),
            )
        }
    }
}

/// Scans every instrument in parallel. Output order matches input order.
pub fn scan_many(
    instruments: &[(String, SeriesFetch)],
    benchmark: &PriceSeries,
    config: &SepaConfig,
) -> Vec<ScanResult> {
    instruments
        .par_iter()
        .map(|(ticker, fetch)| scan_fetched(ticker, fetch, benchmark, config))
        .collect()
}

/// Like [`scan_many`], but instruments not yet started when `cancel` is set
/// are skipped. Scans already running finish; results keep input order.
pub fn scan_many_cancellable(
    instruments: &[(String, SeriesFetch)],
    benchmark: &PriceSeries,
    config: &SepaConfig,
    cancel: &AtomicBool,
) -> Vec<ScanResult> {
    let results: Vec<ScanResult> = instruments
        .par_iter()
        .filter_map(|(ticker, fetch)| {
            if cancel.load(AtomicOrdering::Relaxed) {
                return None;
            }
            Some(scan_fetched(ticker, fetch, benchmark, config))
        })
        .collect();
    if results.len() < instruments.len() {
        info!(
            "scan cancelled: {} of {} instruments scanned",
            results.len(),
            instruments.len()
        );
    }
    results
}

/// Best grade first; within a grade, closest to the 52-week high first.
/// Results without price info sort last within their grade.
pub fn rank_results(results: &mut [ScanResult]) {
    results.sort_by(|a, b| {
        a.grade.cmp(&b.grade).then_with(|| {
            let da = a.price_info.as_ref().map(|p| p.pct_below_52w_high);
            let db = b.price_info.as_ref().map(|p| p.pct_below_52w_high);
            match (da, db) {
                (Some(x), Some(y)) => x.total_cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        })
    });
}
