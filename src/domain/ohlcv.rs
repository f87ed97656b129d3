//! Daily price bar representation.

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl PriceBar {
    /// high - low
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// Where the close sits inside the day's range, 0 (low) to 100 (high).
    /// `None` for a zero-range bar.
    pub fn close_position_pct(&self) -> Option<f64> {
        let range = self.range();
        if range <= 0.0 {
            return None;
        }
        Some((self.close - self.low) / range * 100.0)
    }

    pub fn is_down(&self) -> bool {
        self.close < self.open
    }

    /// Checks the OHLC ordering invariants. Returns a reason on violation.
    pub fn validate(&self) -> Result<(), String> {
        let prices = [self.open, self.high, self.low, self.close];
        if prices.iter().any(|p| !p.is_finite()) {
            return Err("non-finite price".into());
        }
        if self.high < self.low {
            return Err(format!("high {} below low {}", self.high, self.low));
        }
        if self.high < self.open.max(self.close) {
            return Err(format!(
                "high {} below max(open, close) {}",
                self.high,
                self.open.max(self.close)
            ));
        }
        if self.low > self.open.min(self.close) {
            return Err(format!(
                "low {} above min(open, close) {}",
                self.low,
                self.open.min(self.close)
            ));
        }
        Ok(())
    }
}
