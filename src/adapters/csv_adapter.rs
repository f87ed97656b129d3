//! CSV file data adapter.
//!
//! One `<TICKER>.csv` per instrument under a base directory. Columns are
//! located by header name (case-insensitive), so both plain
//! `date,open,high,low,close,volume` files and vendor exports with extra
//! columns such as `Adj Close` load.

use crate::domain::error::SepaError;
use crate::domain::ohlcv::PriceBar;
use crate::domain::universe::sanitize_ticker;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

const COLUMNS: [&str; 6] = ["date", "open", "high", "low", "close", "volume"];

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, ticker: &str) -> Result<PathBuf, SepaError> {
        let ticker = sanitize_ticker(ticker)?;
        Ok(self.base_path.join(format!("{}.csv", ticker)))
    }
}

fn data_err(reason: String) -> SepaError {
    SepaError::Data { reason }
}

/// Index of each required column in the header row.
fn column_indices(headers: &csv::StringRecord, file: &str) -> Result<[usize; 6], SepaError> {
    let mut indices = [0usize; 6];
    for (slot, name) in indices.iter_mut().zip(COLUMNS) {
        *slot = headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
            .ok_or_else(|| data_err(format!("{}: missing {} column", file, name)))?;
    }
    Ok(indices)
}

fn field<'r>(
    record: &'r csv::StringRecord,
    index: usize,
    name: &str,
    line: u64,
) -> Result<&'r str, SepaError> {
    record
        .get(index)
        .map(str::trim)
        .ok_or_else(|| data_err(format!("line {}: missing {} value", line, name)))
}

fn parse_price(raw: &str, name: &str, line: u64) -> Result<f64, SepaError> {
    raw.parse()
        .map_err(|e| data_err(format!("line {}: invalid {} value '{}': {}", line, name, raw, e)))
}

/// Accepts integer or float-formatted volume (`12345` or `12345.0`).
fn parse_volume(raw: &str, line: u64) -> Result<u64, SepaError> {
    if let Ok(v) = raw.parse::<u64>() {
        return Ok(v);
    }
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Ok(v.round() as u64),
        _ => Err(data_err(format!("line {}: invalid volume value '{}'", line, raw))),
    }
}

/// `YYYY-MM-DD`, optionally followed by a time part which is ignored.
fn parse_date(raw: &str, line: u64) -> Result<NaiveDate, SepaError> {
    let day = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map_err(|e| data_err(format!("line {}: invalid date '{}': {}", line, raw, e)))
}

impl DataPort for CsvAdapter {
    fn fetch_series(&self, ticker: &str) -> Result<Vec<PriceBar>, SepaError> {
        let path = self.csv_path(ticker)?;
        let file = path.display().to_string();
        let content = fs::read_to_string(&path)
            .map_err(|e| data_err(format!("failed to read {}: {}", file, e)))?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| data_err(format!("{}: CSV header error: {}", file, e)))?
            .clone();
        let [date_i, open_i, high_i, low_i, close_i, volume_i] = column_indices(&headers, &file)?;

        let mut bars = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| data_err(format!("{}: CSV parse error: {}", file, e)))?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);

            // Vendor exports leave prices blank on non-trading days.
            let close_raw = field(&record, close_i, "close", line)?;
            if close_raw.is_empty() || close_raw.eq_ignore_ascii_case("null") {
                continue;
            }

            bars.push(PriceBar {
                date: parse_date(field(&record, date_i, "date", line)?, line)?,
                open: parse_price(field(&record, open_i, "open", line)?, "open", line)?,
                high: parse_price(field(&record, high_i, "high", line)?, "high", line)?,
                low: parse_price(field(&record, low_i, "low", line)?, "low", line)?,
                close: parse_price(close_raw, "close", line)?,
                volume: parse_volume(field(&record, volume_i, "volume", line)?, line)?,
            });
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }

    fn list_tickers(&self) -> Result<Vec<String>, SepaError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| {
            data_err(format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ))
        })?;

        let mut tickers = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| data_err(format!("directory entry error: {}", e)))?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if let Some(stem) = name.strip_suffix(".csv") {
                tickers.push(stem.to_string());
            }
        }

        tickers.sort();
        Ok(tickers)
    }
}
