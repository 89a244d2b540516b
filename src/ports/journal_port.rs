//! Journal access port trait.

use crate::domain::error::TradelogError;
use crate::domain::trade::Trade;
use chrono::{DateTime, NaiveDate, Utc};

/// Source of closed trades. Implementations validate rows and report the
/// offending data row on failure.
pub trait JournalPort {
    /// Trades whose exit date (UTC) falls within the inclusive range. `None`
    /// bounds are open.
    fn fetch_trades(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<Trade>, TradelogError>;

    /// Earliest and latest exit time plus trade count, or `None` for an
    /// empty journal.
    fn journal_range(&self) -> Result<Option<(DateTime<Utc>, DateTime<Utc>, usize)>, TradelogError>;

    /// Distinct symbols, sorted.
    fn list_symbols(&self) -> Result<Vec<String>, TradelogError>;
}
