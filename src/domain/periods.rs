//! Calendar P&L aggregation: daily and monthly buckets with best/worst
//! lookups.

use super::journal::Journal;
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct PeriodPnl {
    pub date: NaiveDate,
    pub pnl: f64,
    pub trades: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyPnl {
    pub year: i32,
    pub month: u32,
    pub pnl: f64,
    pub trades: usize,
}

/// Net PnL per UTC calendar day of exit, ascending. Days without trades do
/// not appear.
pub fn daily_pnl(journal: &Journal) -> Vec<PeriodPnl> {
    let mut days: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
    for trade in journal.trades() {
        let entry = days.entry(trade.exit_time.date_naive()).or_default();
        entry.0 += trade.net_pnl();
        entry.1 += 1;
    }
    days.into_iter()
        .map(|(date, (pnl, trades))| PeriodPnl { date, pnl, trades })
        .collect()
}

/// Net PnL per (year, month) of exit, ascending.
pub fn monthly_pnl(journal: &Journal) -> Vec<MonthlyPnl> {
    let mut months: BTreeMap<(i32, u32), (f64, usize)> = BTreeMap::new();
    for trade in journal.trades() {
        let date = trade.exit_time.date_naive();
        let entry = months.entry((date.year(), date.month())).or_default();
        entry.0 += trade.net_pnl();
        entry.1 += 1;
    }
    months
        .into_iter()
        .map(|((year, month), (pnl, trades))| MonthlyPnl {
            year,
            month,
            pnl,
            trades,
        })
        .collect()
}

/// Highest-PnL day; ties resolve to the earliest. None for an empty slice.
pub fn best_day(days: &[PeriodPnl]) -> Option<&PeriodPnl> {
    extreme_by(days, |best, candidate| candidate.pnl > best.pnl)
}

pub fn worst_day(days: &[PeriodPnl]) -> Option<&PeriodPnl> {
    extreme_by(days, |worst, candidate| candidate.pnl < worst.pnl)
}

pub fn best_month(months: &[MonthlyPnl]) -> Option<&MonthlyPnl> {
    extreme_by(months, |best, candidate| candidate.pnl > best.pnl)
}

pub fn worst_month(months: &[MonthlyPnl]) -> Option<&MonthlyPnl> {
    extreme_by(months, |worst, candidate| candidate.pnl < worst.pnl)
}

fn extreme_by<T>(items: &[T], replaces: impl Fn(&T, &T) -> bool) -> Option<&T> {
    let mut found = items.first()?;
    for item in &items[1..] {
        if replaces(found, item) {
            found = item;
        }
    }
    Some(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::trade::{Trade, TradeDirection};
    use chrono::{TimeZone, Utc};

    fn make_trade(month: u32, day: u32, pnl: f64) -> Trade {
        let entry_time = Utc.with_ymd_and_hms(2024, month, day, 9, 0, 0).unwrap();
        Trade {
            symbol: "BTC-USD".to_string(),
            direction: TradeDirection::Long,
            quantity: 1.0,
            entry_price: 100.0,
            exit_price: 100.0 + pnl,
            entry_time,
            exit_time: entry_time + chrono::Duration::hours(4),
            fees: 0.0,
        }
    }

    fn make_journal(trades: Vec<Trade>) -> Journal {
        Journal::new(10_000.0, trades).unwrap()
    }

    #[test]
    fn daily_pnl_buckets_by_exit_day() {
        let journal = make_journal(vec![
            make_trade(3, 1, 50.0),
            make_trade(3, 1, -20.0),
            make_trade(3, 5, 100.0),
        ]);
        let days = daily_pnl(&journal);
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert!((days[0].pnl - 30.0).abs() < 1e-9);
        assert_eq!(days[0].trades, 2);
        assert_eq!(days[1].trades, 1);
    }

    #[test]
    fn daily_pnl_empty_journal() {
        assert!(daily_pnl(&make_journal(vec![])).is_empty());
    }

    #[test]
    fn monthly_pnl_buckets_by_year_and_month() {
        let journal = make_journal(vec![
            make_trade(1, 10, 100.0),
            make_trade(1, 20, -40.0),
            make_trade(2, 3, 25.0),
        ]);
        let months = monthly_pnl(&journal);
        assert_eq!(months.len(), 2);
        assert_eq!((months[0].year, months[0].month), (2024, 1));
        assert!((months[0].pnl - 60.0).abs() < 1e-9);
        assert_eq!(months[0].trades, 2);
        assert_eq!((months[1].year, months[1].month), (2024, 2));
        assert!((months[1].pnl - 25.0).abs() < 1e-9);
    }

    #[test]
    fn best_and_worst_day() {
        let journal = make_journal(vec![
            make_trade(3, 1, 50.0),
            make_trade(3, 2, -80.0),
            make_trade(3, 3, 120.0),
        ]);
        let days = daily_pnl(&journal);
        assert_eq!(
            best_day(&days).map(|d| d.date),
            NaiveDate::from_ymd_opt(2024, 3, 3)
        );
        assert_eq!(
            worst_day(&days).map(|d| d.date),
            NaiveDate::from_ymd_opt(2024, 3, 2)
        );
    }

    #[test]
    fn best_day_tie_resolves_to_earliest() {
        let journal = make_journal(vec![make_trade(3, 1, 50.0), make_trade(3, 4, 50.0)]);
        let days = daily_pnl(&journal);
        assert_eq!(
            best_day(&days).map(|d| d.date),
            NaiveDate::from_ymd_opt(2024, 3, 1)
        );
    }

    #[test]
    fn best_and_worst_month() {
        let journal = make_journal(vec![
            make_trade(1, 10, -30.0),
            make_trade(2, 10, 90.0),
            make_trade(3, 10, 40.0),
        ]);
        let months = monthly_pnl(&journal);
        assert_eq!(best_month(&months).map(|m| m.month), Some(2));
        assert_eq!(worst_month(&months).map(|m| m.month), Some(1));
    }

    #[test]
    fn best_of_empty_is_none() {
        assert!(best_day(&[]).is_none());
        assert!(worst_month(&[]).is_none());
    }
}
