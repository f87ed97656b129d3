//! Data access port trait.

use crate::domain::error::SepaError;
use crate::domain::ohlcv::PriceBar;

pub trait DataPort {
    /// Full daily history for one ticker, oldest bar first.
    fn fetch_series(&self, ticker: &str) -> Result<Vec<PriceBar>, SepaError>;

    fn list_tickers(&self) -> Result<Vec<String>, SepaError>;
}
