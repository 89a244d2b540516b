//! Journal container and realized-equity tracking.

use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeMap;

use super::error::TradelogError;
use super::trade::Trade;

#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
}

/// A validated set of closed trades, held sorted by exit time.
#[derive(Debug, Clone, PartialEq)]
pub struct Journal {
    pub initial_capital: f64,
    trades: Vec<Trade>,
}

impl Journal {
    /// Validates every trade and sorts by exit time.
    pub fn new(initial_capital: f64, mut trades: Vec<Trade>) -> Result<Self, TradelogError> {
        for trade in &trades {
            trade.validate()?;
        }
        trades.sort_by_key(|t| t.exit_time);
        Ok(Journal {
            initial_capital,
            trades,
        })
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn len(&self) -> usize {
        self.trades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }

    /// Distinct symbols, sorted.
    pub fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.trades.iter().map(|t| t.symbol.clone()).collect();
        symbols.sort();
        symbols.dedup();
        symbols
    }

    /// First and last exit time, None when empty.
    pub fn date_range(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let first = self.trades.first()?.exit_time;
        let last = self.trades.last()?.exit_time;
        Some((first, last))
    }

    /// Realized equity per calendar day (UTC): initial capital plus the
    /// running sum of net PnL, one point per day that closed a trade.
    pub fn equity_curve(&self) -> Vec<EquityPoint> {
        let mut daily: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        for trade in &self.trades {
            *daily.entry(trade.exit_time.date_naive()).or_insert(0.0) += trade.net_pnl();
        }

        let mut equity = self.initial_capital;
        daily
            .into_iter()
            .map(|(date, pnl)| {
                equity += pnl;
                EquityPoint { date, equity }
            })
            .collect()
    }

    /// Current realized equity (initial capital plus all net PnL).
    pub fn realized_equity(&self) -> f64 {
        self.initial_capital + self.trades.iter().map(|t| t.net_pnl()).sum::<f64>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::trade::TradeDirection;
    use chrono::{Datelike, TimeZone};

    fn make_trade(symbol: &str, day: u32, pnl: f64) -> Trade {
        // quantity 1 at entry 100 makes exit_price encode the pnl directly
        Trade {
            symbol: symbol.into(),
            direction: TradeDirection::Long,
            quantity: 1.0,
            entry_price: 100.0,
            exit_price: 100.0 + pnl,
            entry_time: Utc.with_ymd_and_hms(2024, 1, day, 9, 0, 0).unwrap(),
            exit_time: Utc.with_ymd_and_hms(2024, 1, day, 17, 0, 0).unwrap(),
            fees: 0.0,
        }
    }

    #[test]
    fn new_sorts_by_exit_time() {
        let journal = Journal::new(
            10_000.0,
            vec![
                make_trade("B", 20, 5.0),
                make_trade("A", 10, 3.0),
                make_trade("C", 15, -2.0),
            ],
        )
        .unwrap();

        let days: Vec<u32> = journal
            .trades()
            .iter()
            .map(|t| t.exit_time.date_naive().day())
            .collect();
        assert_eq!(days, vec![10, 15, 20]);
    }

    #[test]
    fn new_rejects_invalid_trade() {
        let mut bad = make_trade("A", 10, 3.0);
        bad.quantity = -1.0;
        let result = Journal::new(10_000.0, vec![make_trade("B", 11, 1.0), bad]);
        assert!(result.is_err());
    }

    #[test]
    fn empty_journal() {
        let journal = Journal::new(10_000.0, vec![]).unwrap();
        assert!(journal.is_empty());
        assert_eq!(journal.len(), 0);
        assert!(journal.date_range().is_none());
        assert!(journal.equity_curve().is_empty());
        assert!((journal.realized_equity() - 10_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn symbols_sorted_and_deduped() {
        let journal = Journal::new(
            10_000.0,
            vec![
                make_trade("ETHUSDT", 10, 1.0),
                make_trade("BTCUSDT", 11, 1.0),
                make_trade("ETHUSDT", 12, 1.0),
            ],
        )
        .unwrap();
        assert_eq!(journal.symbols(), vec!["BTCUSDT", "ETHUSDT"]);
    }

    #[test]
    fn equity_curve_accumulates() {
        let journal = Journal::new(
            1_000.0,
            vec![
                make_trade("A", 10, 50.0),
                make_trade("A", 11, -20.0),
                make_trade("A", 12, 10.0),
            ],
        )
        .unwrap();

        let curve = journal.equity_curve();
        assert_eq!(curve.len(), 3);
        assert!((curve[0].equity - 1_050.0).abs() < f64::EPSILON);
        assert!((curve[1].equity - 1_030.0).abs() < f64::EPSILON);
        assert!((curve[2].equity - 1_040.0).abs() < f64::EPSILON);
    }

    #[test]
    fn equity_curve_merges_same_day_trades() {
        let journal = Journal::new(
            1_000.0,
            vec![
                make_trade("A", 10, 50.0),
                make_trade("B", 10, -30.0),
                make_trade("C", 11, 5.0),
            ],
        )
        .unwrap();

        let curve = journal.equity_curve();
        assert_eq!(curve.len(), 2);
        assert!((curve[0].equity - 1_020.0).abs() < f64::EPSILON);
        assert!((curve[1].equity - 1_025.0).abs() < f64::EPSILON);
    }

    #[test]
    fn equity_curve_dates_ascend() {
        let journal = Journal::new(
            1_000.0,
            vec![
                make_trade("A", 20, 1.0),
                make_trade("A", 5, 1.0),
                make_trade("A", 12, 1.0),
            ],
        )
        .unwrap();

        let curve = journal.equity_curve();
        assert!(curve.windows(2).all(|w| w[0].date < w[1].date));
    }

    #[test]
    fn realized_equity_includes_fees() {
        let mut trade = make_trade("A", 10, 50.0);
        trade.fees = 10.0;
        let journal = Journal::new(1_000.0, vec![trade]).unwrap();
        assert!((journal.realized_equity() - 1_040.0).abs() < f64::EPSILON);
    }

    #[test]
    fn date_range_spans_first_to_last() {
        let journal = Journal::new(
            1_000.0,
            vec![make_trade("A", 10, 1.0), make_trade("A", 25, 1.0)],
        )
        .unwrap();
        let (first, last) = journal.date_range().unwrap();
        assert_eq!(first.date_naive().day(), 10);
        assert_eq!(last.date_naive().day(), 25);
    }
}
