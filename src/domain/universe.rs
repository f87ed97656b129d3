//! Ticker universe: parsing and cleaning the list of instruments to scan.
//!
//! Tickers arrive from config or the command line as a comma-separated
//! list, often in broker form (`ASMLa_EQ`). They are cleaned to the symbol
//! the data layer files them under, then checked against a conservative
//! character set before being used to build file paths.

use std::collections::HashSet;

pub const MAX_TICKER_LEN: usize = 20;

/// Broker tickers that do not reduce to the right symbol by suffix stripping.
const TICKER_MAPPING: &[(&str, &str)] = &[("WTAIM_EQ", "WTAI")];

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in ticker list")]
    EmptyToken,

    #[error("duplicate ticker: {0}")]
    DuplicateTicker(String),

    #[error("ticker list is empty")]
    Empty,

    #[error("ticker too long: {ticker} (max {max} characters)")]
    TooLong { ticker: String, max: usize },

    #[error("ticker {ticker} contains invalid characters: {chars}")]
    InvalidChars { ticker: String, chars: String },
}

/// Applies the mapping table, then strips everything from the first `_`.
/// Always upper-case.
pub fn clean_ticker(raw: &str) -> String {
    let upper = raw.trim().to_uppercase();
    if let Some((_, mapped)) = TICKER_MAPPING.iter().find(|(from, _)| *from == upper) {
        return mapped.to_string();
    }
    match upper.split_once('_') {
        Some((symbol, _)) => symbol.to_string(),
        None => upper,
    }
}

/// Upper-cases and checks length and charset (`A-Z 0-9 . _ - ^`).
pub fn sanitize_ticker(raw: &str) -> Result<String, UniverseError> {
    let ticker = raw.trim().to_uppercase();
    if ticker.is_empty() {
        return Err(UniverseError::EmptyToken);
    }
    if ticker.chars().count() > MAX_TICKER_LEN {
        return Err(UniverseError::TooLong {
            ticker,
            max: MAX_TICKER_LEN,
        });
    }
    let mut invalid: Vec<char> = ticker
        .chars()
        .filter(|c| !(c.is_ascii_uppercase() || c.is_ascii_digit() || ".-_^".contains(*c)))
        .collect();
    if !invalid.is_empty() {
        invalid.sort_unstable();
        invalid.dedup();
        return Err(UniverseError::InvalidChars {
            ticker,
            chars: invalid.into_iter().collect(),
        });
    }
    Ok(ticker)
}

/// Parses a comma-separated list into cleaned, validated, unique tickers in
/// input order.
pub fn parse_tickers(input: &str) -> Result<Vec<String>, UniverseError> {
    if input.trim().is_empty() {
        return Err(UniverseError::Empty);
    }

    let mut tickers = Vec::new();
    let mut seen = HashSet::new();
    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let ticker = sanitize_ticker(&clean_ticker(trimmed))?;
        if !seen.insert(ticker.clone()) {
            return Err(UniverseError::DuplicateTicker(ticker));
        }
        tickers.push(ticker);
    }

    Ok(tickers)
}
