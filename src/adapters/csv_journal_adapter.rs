//! CSV journal adapter: one file of closed trades.
//!
//! Expected header:
//! `symbol,direction,quantity,entry_price,exit_price,entry_time,exit_time,fees`
//! with RFC 3339 timestamps. The `fees` column may be omitted entirely.

use crate::domain::error::TradelogError;
use crate::domain::trade::{Trade, TradeDirection};
use crate::ports::journal_port::JournalPort;
use chrono::{DateTime, NaiveDate, Utc};
use std::fs;
use std::path::PathBuf;
use tracing::debug;

const REQUIRED_COLUMNS: [&str; 7] = [
    "symbol",
    "direction",
    "quantity",
    "entry_price",
    "exit_price",
    "entry_time",
    "exit_time",
];

pub struct CsvJournalAdapter {
    path: PathBuf,
}

struct ColumnMap {
    symbol: usize,
    direction: usize,
    quantity: usize,
    entry_price: usize,
    exit_price: usize,
    entry_time: usize,
    exit_time: usize,
    fees: Option<usize>,
}

impl CsvJournalAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn load_all(&self) -> Result<Vec<Trade>, TradelogError> {
        let content = fs::read_to_string(&self.path).map_err(|e| TradelogError::Journal {
            reason: format!("failed to read {}: {}", self.path.display(), e),
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let headers = rdr.headers().map_err(|e| TradelogError::Journal {
            reason: format!("CSV header error: {}", e),
        })?;
        let columns = map_columns(headers)?;

        let mut trades = Vec::new();
        for (i, result) in rdr.records().enumerate() {
            let row = i + 1;
            let record = result.map_err(|e| TradelogError::JournalRow {
                row,
                reason: format!("CSV parse error: {}", e),
            })?;
            let trade = parse_trade(&record, &columns, row)?;
            trade
                .validate()
                .map_err(|e| TradelogError::JournalRow {
                    row,
                    reason: e.to_string(),
                })?;
            trades.push(trade);
        }

        trades.sort_by_key(|t| t.exit_time);
        debug!(path = %self.path.display(), rows = trades.len(), "loaded journal");
        Ok(trades)
    }
}

impl JournalPort for CsvJournalAdapter {
    fn fetch_trades(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<Trade>, TradelogError> {
        let mut trades = self.load_all()?;
        trades.retain(|t| {
            let exit_date = t.exit_time.date_naive();
            start.is_none_or(|s| exit_date >= s) && end.is_none_or(|e| exit_date <= e)
        });
        Ok(trades)
    }

    fn journal_range(
        &self,
    ) -> Result<Option<(DateTime<Utc>, DateTime<Utc>, usize)>, TradelogError> {
        let trades = self.load_all()?;
        let first = match trades.first() {
            Some(t) => t.exit_time,
            None => return Ok(None),
        };
        // load_all returns exit-time order
        let last = trades[trades.len() - 1].exit_time;
        Ok(Some((first, last, trades.len())))
    }

    fn list_symbols(&self) -> Result<Vec<String>, TradelogError> {
        let trades = self.load_all()?;
        let mut symbols: Vec<String> = trades.into_iter().map(|t| t.symbol).collect();
        symbols.sort();
        symbols.dedup();
        Ok(symbols)
    }
}

fn map_columns(headers: &csv::StringRecord) -> Result<ColumnMap, TradelogError> {
    let find = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));

    for required in REQUIRED_COLUMNS {
        if find(required).is_none() {
            return Err(TradelogError::Journal {
                reason: format!("missing CSV column '{}'", required),
            });
        }
    }

    Ok(ColumnMap {
        symbol: find("symbol").unwrap_or(0),
        direction: find("direction").unwrap_or(0),
        quantity: find("quantity").unwrap_or(0),
        entry_price: find("entry_price").unwrap_or(0),
        exit_price: find("exit_price").unwrap_or(0),
        entry_time: find("entry_time").unwrap_or(0),
        exit_time: find("exit_time").unwrap_or(0),
        fees: find("fees"),
    })
}

fn parse_trade(
    record: &csv::StringRecord,
    columns: &ColumnMap,
    row: usize,
) -> Result<Trade, TradelogError> {
    let field = |idx: usize, name: &str| -> Result<&str, TradelogError> {
        record.get(idx).ok_or_else(|| TradelogError::JournalRow {
            row,
            reason: format!("missing {} field", name),
        })
    };

    let number = |idx: usize, name: &str| -> Result<f64, TradelogError> {
        field(idx, name)?
            .parse()
            .map_err(|e| TradelogError::JournalRow {
                row,
                reason: format!("invalid {} value: {}", name, e),
            })
    };

    let timestamp = |idx: usize, name: &str| -> Result<DateTime<Utc>, TradelogError> {
        let raw = field(idx, name)?;
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| TradelogError::JournalRow {
                row,
                reason: format!("invalid {} timestamp: {}", name, e),
            })
    };

    let direction_raw = field(columns.direction, "direction")?;
    let direction =
        TradeDirection::parse(direction_raw).ok_or_else(|| TradelogError::JournalRow {
            row,
            reason: format!("invalid direction '{}'", direction_raw),
        })?;

    let fees = match columns.fees {
        Some(idx) => match record.get(idx) {
            None | Some("") => 0.0,
            Some(raw) => raw.parse().map_err(|e| TradelogError::JournalRow {
                row,
                reason: format!("invalid fees value: {}", e),
            })?,
        },
        None => 0.0,
    };

    Ok(Trade {
        symbol: field(columns.symbol, "symbol")?.to_string(),
        direction,
        quantity: number(columns.quantity, "quantity")?,
        entry_price: number(columns.entry_price, "entry_price")?,
        exit_price: number(columns.exit_price, "exit_price")?,
        entry_time: timestamp(columns.entry_time, "entry_time")?,
        exit_time: timestamp(columns.exit_time, "exit_time")?,
        fees,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str = "symbol,direction,quantity,entry_price,exit_price,entry_time,exit_time,fees\n";

    fn write_journal(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    fn adapter_for(content: &str) -> (NamedTempFile, CsvJournalAdapter) {
        let file = write_journal(content);
        let adapter = CsvJournalAdapter::new(file.path().to_path_buf());
        (file, adapter)
    }

    #[test]
    fn fetch_trades_parses_rows() {
        let content = format!(
            "{}BTC-USD,long,0.5,40000,42000,2024-03-01T09:00:00Z,2024-03-02T17:00:00Z,25\n\
             ETH-USD,short,2,3000,2900,2024-03-03T10:00:00Z,2024-03-04T10:00:00Z,8\n",
            HEADER
        );
        let (_file, adapter) = adapter_for(&content);

        let trades = adapter.fetch_trades(None, None).unwrap();
        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].symbol, "BTC-USD");
        assert_eq!(trades[0].direction, TradeDirection::Long);
        assert!((trades[0].quantity - 0.5).abs() < f64::EPSILON);
        assert!((trades[0].fees - 25.0).abs() < f64::EPSILON);
        assert_eq!(trades[1].direction, TradeDirection::Short);
    }

    #[test]
    fn fetch_trades_sorts_by_exit_time() {
        let content = format!(
            "{}ETH-USD,long,1,3000,3100,2024-03-05T10:00:00Z,2024-03-06T10:00:00Z,0\n\
             BTC-USD,long,1,40000,41000,2024-03-01T09:00:00Z,2024-03-02T09:00:00Z,0\n",
            HEADER
        );
        let (_file, adapter) = adapter_for(&content);

        let trades = adapter.fetch_trades(None, None).unwrap();
        assert_eq!(trades[0].symbol, "BTC-USD");
        assert_eq!(trades[1].symbol, "ETH-USD");
    }

    #[test]
    fn fetch_trades_filters_by_exit_date() {
        let content = format!(
            "{}BTC-USD,long,1,40000,41000,2024-03-01T09:00:00Z,2024-03-02T09:00:00Z,0\n\
             ETH-USD,long,1,3000,3100,2024-03-05T10:00:00Z,2024-03-06T10:00:00Z,0\n\
             SOL-USD,long,10,150,160,2024-03-09T10:00:00Z,2024-03-10T10:00:00Z,0\n",
            HEADER
        );
        let (_file, adapter) = adapter_for(&content);

        let start = NaiveDate::from_ymd_opt(2024, 3, 3).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 3, 8).unwrap();
        let trades = adapter.fetch_trades(Some(start), Some(end)).unwrap();

        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].symbol, "ETH-USD");
    }

    #[test]
    fn fees_column_may_be_omitted() {
        let content = "symbol,direction,quantity,entry_price,exit_price,entry_time,exit_time\n\
             BTC-USD,long,1,40000,41000,2024-03-01T09:00:00Z,2024-03-02T09:00:00Z\n";
        let (_file, adapter) = adapter_for(content);

        let trades = adapter.fetch_trades(None, None).unwrap();
        assert!((trades[0].fees - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_fees_field_defaults_to_zero() {
        let content = format!(
            "{}BTC-USD,long,1,40000,41000,2024-03-01T09:00:00Z,2024-03-02T09:00:00Z,\n",
            HEADER
        );
        let (_file, adapter) = adapter_for(&content);

        let trades = adapter.fetch_trades(None, None).unwrap();
        assert!((trades[0].fees - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn missing_column_is_reported() {
        let content = "symbol,direction,quantity,entry_price,exit_price,entry_time\n";
        let (_file, adapter) = adapter_for(content);

        let err = adapter.fetch_trades(None, None).unwrap_err();
        assert!(
            matches!(err, TradelogError::Journal { reason } if reason.contains("exit_time"))
        );
    }

    #[test]
    fn bad_row_reports_one_based_number() {
        let content = format!(
            "{}BTC-USD,long,1,40000,41000,2024-03-01T09:00:00Z,2024-03-02T09:00:00Z,0\n\
             ETH-USD,sideways,1,3000,3100,2024-03-05T10:00:00Z,2024-03-06T10:00:00Z,0\n",
            HEADER
        );
        let (_file, adapter) = adapter_for(&content);

        let err = adapter.fetch_trades(None, None).unwrap_err();
        assert!(matches!(err, TradelogError::JournalRow { row: 2, .. }));
    }

    #[test]
    fn invalid_timestamp_is_reported() {
        let content = format!(
            "{}BTC-USD,long,1,40000,41000,March 1st,2024-03-02T09:00:00Z,0\n",
            HEADER
        );
        let (_file, adapter) = adapter_for(&content);

        let err = adapter.fetch_trades(None, None).unwrap_err();
        assert!(
            matches!(err, TradelogError::JournalRow { row: 1, reason } if reason.contains("entry_time"))
        );
    }

    #[test]
    fn invalid_trade_fields_are_reported_with_row() {
        let content = format!(
            "{}BTC-USD,long,-1,40000,41000,2024-03-01T09:00:00Z,2024-03-02T09:00:00Z,0\n",
            HEADER
        );
        let (_file, adapter) = adapter_for(&content);

        let err = adapter.fetch_trades(None, None).unwrap_err();
        assert!(
            matches!(err, TradelogError::JournalRow { row: 1, reason } if reason.contains("quantity"))
        );
    }

    #[test]
    fn journal_range_reports_span_and_count() {
        let content = format!(
            "{}BTC-USD,long,1,40000,41000,2024-03-01T09:00:00Z,2024-03-02T09:00:00Z,0\n\
             ETH-USD,long,1,3000,3100,2024-03-05T10:00:00Z,2024-03-06T10:00:00Z,0\n",
            HEADER
        );
        let (_file, adapter) = adapter_for(&content);

        let (first, last, count) = adapter.journal_range().unwrap().unwrap();
        assert_eq!(first.date_naive(), NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());
        assert_eq!(last.date_naive(), NaiveDate::from_ymd_opt(2024, 3, 6).unwrap());
        assert_eq!(count, 2);
    }

    #[test]
    fn journal_range_empty_file() {
        let (_file, adapter) = adapter_for(HEADER);
        assert_eq!(adapter.journal_range().unwrap(), None);
    }

    #[test]
    fn list_symbols_sorted_and_deduplicated() {
        let content = format!(
            "{}ETH-USD,long,1,3000,3100,2024-03-05T10:00:00Z,2024-03-06T10:00:00Z,0\n\
             BTC-USD,long,1,40000,41000,2024-03-01T09:00:00Z,2024-03-02T09:00:00Z,0\n\
             BTC-USD,short,1,41000,40500,2024-03-07T09:00:00Z,2024-03-08T09:00:00Z,0\n",
            HEADER
        );
        let (_file, adapter) = adapter_for(&content);

        assert_eq!(adapter.list_symbols().unwrap(), vec!["BTC-USD", "ETH-USD"]);
    }

    #[test]
    fn missing_file_is_an_error() {
        let adapter = CsvJournalAdapter::new(PathBuf::from("/nonexistent/journal.csv"));
        assert!(adapter.fetch_trades(None, None).is_err());
    }
}
