//! Validated, date-indexed view over a slice of bars.

use crate::domain::error::SeriesError;
use crate::domain::ohlcv::PriceBar;
use chrono::NaiveDate;
use std::collections::HashMap;

/// Chronologically ordered bars for one instrument or benchmark.
///
/// Borrows the bars, so one benchmark series can be shared by reference
/// across every scan in a batch.
#[derive(Debug, Clone)]
pub struct PriceSeries<'a> {
    bars: &'a [PriceBar],
    date_index: HashMap<NaiveDate, usize>,
}

impl<'a> PriceSeries<'a> {
    pub fn new(bars: &'a [PriceBar]) -> Result<Self, SeriesError> {
        if bars.is_empty() {
            return Err(SeriesError::Empty);
        }

        let mut date_index = HashMap::with_capacity(bars.len());
        for (i, bar) in bars.iter().enumerate() {
            bar.validate().map_err(|reason| SeriesError::MalformedBar {
                date: bar.date,
                reason,
            })?;
            if i > 0 {
                let prev = bars[i - 1].date;
                if bar.date == prev {
                    return Err(SeriesError::DuplicateDate(bar.date));
                }
                if bar.date < prev {
                    return Err(SeriesError::OutOfOrder {
                        index: i,
                        date: bar.date,
                    });
                }
            }
            date_index.insert(bar.date, i);
        }

        Ok(Self { bars, date_index })
    }

    pub fn bars(&self) -> &'a [PriceBar] {
        self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> &'a PriceBar {
        // Construction rejects empty slices.
        &self.bars[self.bars.len() - 1]
    }

    pub fn get_bar(&self, date: NaiveDate) -> Option<&'a PriceBar> {
        self.date_index.get(&date).map(|&i| &self.bars[i])
    }

    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        self.date_index.get(&date).copied()
    }

    /// The trailing `n` bars, or all of them if the series is shorter.
    pub fn tail(&self, n: usize) -> &'a [PriceBar] {
        let start = self.bars.len().saturating_sub(n);
        &self.bars[start..]
    }
}

/// Mean volume of a bar slice. `None` for an empty slice.
pub fn average_volume(bars: &[PriceBar]) -> Option<f64> {
    if bars.is_empty() {
        return None;
    }
    Some(bars.iter().map(|b| b.volume as f64).sum::<f64>() / bars.len() as f64)
}

/// Highest high and lowest low of a bar slice. `None` for an empty slice.
pub fn high_low(bars: &[PriceBar]) -> Option<(f64, f64)> {
    if bars.is_empty() {
        return None;
    }
    let high = bars.iter().map(|b| b.high).fold(f64::MIN, f64::max);
    let low = bars.iter().map(|b| b.low).fold(f64::MAX, f64::min);
    Some((high, low))
}

/// Simple daily returns `close[i] / close[i-1] - 1`; one shorter than the input.
pub fn daily_returns(bars: &[PriceBar]) -> Vec<f64> {
    bars.windows(2)
        .map(|w| {
            if w[0].close == 0.0 {
                0.0
            } else {
                w[1].close / w[0].close - 1.0
            }
        })
        .collect()
}
