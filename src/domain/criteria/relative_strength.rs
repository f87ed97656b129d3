//! Relative strength: momentum of its own, and strength against the market.
//!
//! - RSI(14) of at least 60, read at the start of the base when the base
//!   start date is in the series, otherwise at the latest bar
//! - RS line (close / benchmark close over the last 60 shared dates, indexed
//!   to 100) no more than 10% below its 20-bar high; more than 5% warns
//! - the instrument outperformed the benchmark over the same window

use crate::domain::base::BaseInfo;
use crate::domain::config::RelativeStrengthConfig;
use crate::domain::criterion::{Criterion, CriterionResult};
use crate::domain::error::EvalError;
use crate::domain::indicator::rsi::calculate_rsi;
use crate::domain::series::PriceSeries;

pub fn evaluate(
    series: &PriceSeries,
    benchmark: &PriceSeries,
    base: Option<&BaseInfo>,
    config: &RelativeStrengthConfig,
) -> CriterionResult {
    let mut result = CriterionResult::new(Criterion::RelativeStrength);
    if let Err(err) = check_rsi(series, base, config, &mut result) {
        result.fail(err.to_string());
    }
    if let Err(err) = check_rs_line(series, benchmark, config, &mut result) {
        result.fail(err.to_string());
    }
    result
}

fn check_rsi(
    series: &PriceSeries,
    base: Option<&BaseInfo>,
    config: &RelativeStrengthConfig,
    result: &mut CriterionResult,
) -> Result<(), EvalError> {
    let rsi = calculate_rsi(series.bars(), config.rsi_period);
    let index = base
        .and_then(|b| series.index_of(b.start_date))
        .unwrap_or(series.len() - 1);

    let value = rsi.value_at(index).ok_or_else(|| {
        EvalError::insufficient(rsi.indicator_type.to_string(), index + 1, config.rsi_period + 1)
    })?;
    result.detail("rsi", value);
    result.detail("rsi_date", series.bars()[index].date);
    if value < config.rsi_min {
        result.fail(format!(
            "{} = {:.1}, need ≥{:.0}",
            rsi.indicator_type, value, config.rsi_min
        ));
    }
    Ok(())
}

fn check_rs_line(
    series: &PriceSeries,
    benchmark: &PriceSeries,
    config: &RelativeStrengthConfig,
    result: &mut CriterionResult,
) -> Result<(), EvalError> {
    let aligned: Vec<(f64, f64)> = series
        .bars()
        .iter()
        .filter_map(|bar| benchmark.get_bar(bar.date).map(|b| (bar.close, b.close)))
        .collect();
    if config.line_lookback < 2 || aligned.len() < config.line_lookback {
        return Err(EvalError::DateAlignment {
            overlap: aligned.len(),
            need: config.line_lookback.max(2),
        });
    }

    let window = &aligned[aligned.len() - config.line_lookback..];
    if window.iter().any(|&(_, bench)| bench <= 0.0) {
        return Err(EvalError::guard("relative strength line (benchmark close)"));
    }
    let (first_close, first_bench) = window[0];
    if first_close <= 0.0 {
        return Err(EvalError::guard("relative strength line (window start close)"));
    }

    let start_ratio = first_close / first_bench;
    let line: Vec<f64> = window
        .iter()
        .map(|&(close, bench)| close / bench / start_ratio * 100.0)
        .collect();
    let current = line[line.len() - 1];
    let recent = &line[line.len().saturating_sub(config.high_lookback.max(1))..];
    let recent_high = recent.iter().copied().fold(f64::MIN, f64::max);
    let decline = (recent_high - current) / recent_high * 100.0;

    result.detail("rs_line", current);
    result.detail("rs_line_high", recent_high);
    result.detail("rs_line_decline_pct", decline);
    if decline > config.decline_failure_pct {
        result.fail(format!(
            "RS line {:.1}% below its {}-bar high (need within {:.0}%)",
            decline, config.high_lookback, config.decline_failure_pct
        ));
    } else if decline > config.decline_warning_pct {
        result.warn(format!(
            "RS line {:.1}% below its {}-bar high",
            decline, config.high_lookback
        ));
    }

    let (last_close, last_bench) = window[window.len() - 1];
    let stock_return = last_close / first_close - 1.0;
    let bench_return = last_bench / first_bench - 1.0;
    let relative = stock_return - bench_return;
    let rating = (50.0 + relative * 100.0).clamp(0.0, 100.0);
    result.detail("stock_return_pct", stock_return * 100.0);
    result.detail("benchmark_return_pct", bench_return * 100.0);
    result.detail("rs_rating", rating);

    let outperforming = relative > 0.0;
    result.detail("outperforming", outperforming);
    if config.require_outperformance && !outperforming {
        result.fail(format!(
            "Not outperforming benchmark: {:+.1}% vs {:+.1}% over {} bars",
            stock_return * 100.0,
            bench_return * 100.0,
            config.line_lookback
        ));
    }
    Ok(())
}
