#![allow(dead_code)]

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use tradelog::domain::error::TradelogError;
use tradelog::domain::journal::Journal;
pub use tradelog::domain::trade::{Trade, TradeDirection};
use tradelog::ports::journal_port::JournalPort;

pub struct MockJournalPort {
    pub trades: Vec<Trade>,
    pub error: Option<String>,
}

impl MockJournalPort {
    pub fn new() -> Self {
        Self {
            trades: Vec::new(),
            error: None,
        }
    }

    pub fn with_trades(mut self, trades: Vec<Trade>) -> Self {
        self.trades = trades;
        self
    }

    pub fn with_error(mut self, reason: &str) -> Self {
        self.error = Some(reason.to_string());
        self
    }
}

impl JournalPort for MockJournalPort {
    fn fetch_trades(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<Trade>, TradelogError> {
        if let Some(reason) = &self.error {
            return Err(TradelogError::Journal {
                reason: reason.clone(),
            });
        }
        let mut trades: Vec<Trade> = self
            .trades
            .iter()
            .filter(|t| {
                let exit_date = t.exit_time.date_naive();
                start.is_none_or(|s| exit_date >= s) && end.is_none_or(|e| exit_date <= e)
            })
            .cloned()
            .collect();
        trades.sort_by_key(|t| t.exit_time);
        Ok(trades)
    }

    fn journal_range(
        &self,
    ) -> Result<Option<(DateTime<Utc>, DateTime<Utc>, usize)>, TradelogError> {
        let trades = self.fetch_trades(None, None)?;
        match (trades.first(), trades.last()) {
            (Some(first), Some(last)) => Ok(Some((first.exit_time, last.exit_time, trades.len()))),
            _ => Ok(None),
        }
    }

    fn list_symbols(&self) -> Result<Vec<String>, TradelogError> {
        let mut symbols: Vec<String> =
            self.fetch_trades(None, None)?.into_iter().map(|t| t.symbol).collect();
        symbols.sort();
        symbols.dedup();
        Ok(symbols)
    }
}

/// 2024-03-<day> at <hour>:00 UTC.
pub fn ts(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Long trade closed on 2024-03-<exit_day> whose net PnL equals `pnl`
/// (quantity 1, no fees).
pub fn trade_with_pnl(symbol: &str, pnl: f64, exit_day: u32) -> Trade {
    Trade {
        symbol: symbol.to_string(),
        direction: TradeDirection::Long,
        quantity: 1.0,
        entry_price: 5000.0,
        exit_price: 5000.0 + pnl,
        entry_time: ts(exit_day, 9),
        exit_time: ts(exit_day, 17),
        fees: 0.0,
    }
}

pub fn journal_of(initial_capital: f64, trades: Vec<Trade>) -> Journal {
    Journal::new(initial_capital, trades).unwrap()
}
