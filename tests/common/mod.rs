#![allow(dead_code)]

use chrono::NaiveDate;
pub use sepagrade::domain::ohlcv::PriceBar;
use sepagrade::domain::error::SepaError;
use sepagrade::ports::data_port::DataPort;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<PriceBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, ticker: &str, bars: Vec<PriceBar>) -> Self {
        self.data.insert(ticker.to_string(), bars);
        self
    }

    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_series(&self, ticker: &str) -> Result<Vec<PriceBar>, SepaError> {
        if let Some(reason) = self.errors.get(ticker) {
            return Err(SepaError::Data {
                reason: reason.clone(),
            });
        }
        self.data.get(ticker).cloned().ok_or_else(|| SepaError::Data {
            reason: format!("no data for {}", ticker),
        })
    }

    fn list_tickers(&self) -> Result<Vec<String>, SepaError> {
        let mut tickers: Vec<String> = self
            .data
            .keys()
            .chain(self.errors.keys())
            .cloned()
            .collect();
        tickers.sort();
        Ok(tickers)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn start_date() -> NaiveDate {
    date(2023, 1, 2)
}

/// Appends a bar opening at the previous close, moved by `factor`.
fn push_bar(bars: &mut Vec<PriceBar>, factor: f64, wick_up: f64, wick_down: f64, volume: u64) {
    let open = bars.last().map(|b| b.close).unwrap_or(50.0);
    let close = open * factor;
    bars.push(PriceBar {
        date: start_date() + chrono::Duration::days(bars.len() as i64),
        open,
        high: open.max(close) * (1.0 + wick_up),
        low: open.min(close) * (1.0 - wick_down),
        close,
        volume,
    });
}

/// A textbook setup over `advance + 40` bars:
///
/// - `advance` bars of steady uptrend (+0.45% / -0.2%) on 1M shares, one of
///   them with a blow-off wick leaving the last close 8% under the 52-week high
/// - 35 bars of tight consolidation on 750k shares with closes near the highs
///   and one shakeout wick making the base 12% deep
/// - 5 up bars on 1.24M shares, the first clearing the pivot by ~3% and
///   closing at ~90% of its range on ~1.6x average volume
///
/// With `advance = 260` every criterion passes.
pub fn setup_bars(advance: usize) -> Vec<PriceBar> {
    let mut bars = Vec::with_capacity(advance + 40);
    for i in 0..advance {
        let factor = if i % 2 == 0 { 1.0045 } else { 0.998 };
        push_bar(&mut bars, factor, 0.002, 0.002, 1_000_000);
    }

    let base_start = bars.len();
    for i in 0..35 {
        let factor = if i % 2 == 0 { 1.001 } else { 0.9995 };
        push_bar(&mut bars, factor, 0.0005, 0.002, 750_000);
    }
    let pivot = bars[base_start..]
        .iter()
        .map(|b| b.high)
        .fold(f64::MIN, f64::max);
    bars[base_start + 25].low = pivot * 0.88;

    for i in 0..5 {
        let factor = if i == 0 { 1.032 } else { 1.005 };
        let open = bars.last().map(|b| b.close).unwrap_or(50.0);
        let close = open * factor;
        bars.push(PriceBar {
            date: start_date() + chrono::Duration::days(bars.len() as i64),
            open,
            high: close * 1.003,
            low: open * 0.997,
            close,
            volume: 1_240_000,
        });
    }

    let last_close = bars[bars.len() - 1].close;
    let spike = bars.len() - 100;
    bars[spike].high = last_close / 0.92;
    bars
}

pub fn a_plus_bars() -> Vec<PriceBar> {
    setup_bars(260)
}

/// Flat benchmark on the same calendar as the fixtures above.
pub fn flat_benchmark(len: usize) -> Vec<PriceBar> {
    (0..len)
        .map(|i| PriceBar {
            date: start_date() + chrono::Duration::days(i as i64),
            open: 100.0,
            high: 101.0,
            low: 99.0,
            close: 100.0,
            volume: 5_000_000,
        })
        .collect()
}

/// Bars built from a close path; open is the previous close.
pub fn bars_from_closes(closes: &[f64]) -> Vec<PriceBar> {
    let mut bars: Vec<PriceBar> = Vec::with_capacity(closes.len());
    for (i, &close) in closes.iter().enumerate() {
        let open = bars.last().map(|b| b.close).unwrap_or(close);
        bars.push(PriceBar {
            date: start_date() + chrono::Duration::days(i as i64),
            open,
            high: open.max(close) * 1.005,
            low: open.min(close) * 0.995,
            close,
            volume: 1_000_000 + (i as u64 % 7) * 50_000,
        });
    }
    bars
}

pub fn to_csv(bars: &[PriceBar]) -> String {
    let mut out = String::from("date,open,high,low,close,volume\n");
    for b in bars {
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            b.date, b.open, b.high, b.low, b.close, b.volume
        ));
    }
    out
}
