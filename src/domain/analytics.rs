//! Journal performance statistics: win/loss profile, drawdown, risk-adjusted
//! returns, per-symbol breakdown.

use super::journal::{EquityPoint, Journal};
use super::trade::TradeOutcome;
use chrono::NaiveDate;

/// Crypto journals trade every calendar day, so annualization uses 365
/// rather than an equity-session count.
const DAYS_PER_YEAR: f64 = 365.0;

/// Aggregate win/loss statistics over a journal, in exit-time order.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeStats {
    pub total_trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub breakeven: usize,
    pub win_rate: f64,
    pub gross_profit: f64,
    pub gross_loss: f64,
    pub net_pnl: f64,
    pub total_fees: f64,
    pub profit_factor: f64,
    pub expectancy: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub payoff_ratio: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    pub avg_holding_hours: f64,
    pub max_win_streak: usize,
    pub max_loss_streak: usize,
    /// +n for n trailing wins, -n for n trailing losses, 0 otherwise.
    pub current_streak: i64,
}

impl TradeStats {
    pub fn compute(journal: &Journal) -> Self {
        let mut wins = 0usize;
        let mut losses = 0usize;
        let mut breakeven = 0usize;
        let mut gross_profit = 0.0_f64;
        let mut gross_loss = 0.0_f64;
        let mut net_pnl = 0.0_f64;
        let mut total_fees = 0.0_f64;
        let mut largest_win = 0.0_f64;
        let mut largest_loss = 0.0_f64;
        let mut total_holding_secs = 0i64;

        let mut win_run = 0usize;
        let mut loss_run = 0usize;
        let mut max_win_streak = 0usize;
        let mut max_loss_streak = 0usize;

        for trade in journal.trades() {
            let pnl = trade.net_pnl();
            net_pnl += pnl;
            total_fees += trade.fees;
            total_holding_secs += trade.holding_period().num_seconds();

            match trade.outcome() {
                TradeOutcome::Win => {
                    wins += 1;
                    gross_profit += pnl;
                    if pnl > largest_win {
                        largest_win = pnl;
                    }
                    win_run += 1;
                    loss_run = 0;
                    if win_run > max_win_streak {
                        max_win_streak = win_run;
                    }
                }
                TradeOutcome::Loss => {
                    losses += 1;
                    gross_loss += pnl.abs();
                    if pnl.abs() > largest_loss {
                        largest_loss = pnl.abs();
                    }
                    loss_run += 1;
                    win_run = 0;
                    if loss_run > max_loss_streak {
                        max_loss_streak = loss_run;
                    }
                }
                TradeOutcome::Breakeven => {
                    breakeven += 1;
                    win_run = 0;
                    loss_run = 0;
                }
            }
        }

        let total_trades = wins + losses + breakeven;
        let win_rate = if total_trades > 0 {
            wins as f64 / total_trades as f64
        } else {
            0.0
        };

        let profit_factor = ratio_or_infinity(gross_profit, gross_loss);

        let expectancy = if total_trades > 0 {
            net_pnl / total_trades as f64
        } else {
            0.0
        };

        let avg_win = if wins > 0 {
            gross_profit / wins as f64
        } else {
            0.0
        };
        let avg_loss = if losses > 0 {
            gross_loss / losses as f64
        } else {
            0.0
        };
        let payoff_ratio = ratio_or_infinity(avg_win, avg_loss);

        let avg_holding_hours = if total_trades > 0 {
            total_holding_secs as f64 / 3600.0 / total_trades as f64
        } else {
            0.0
        };

        let current_streak = if win_run > 0 {
            win_run as i64
        } else if loss_run > 0 {
            -(loss_run as i64)
        } else {
            0
        };

        TradeStats {
            total_trades,
            wins,
            losses,
            breakeven,
            win_rate,
            gross_profit,
            gross_loss,
            net_pnl,
            total_fees,
            profit_factor,
            expectancy,
            avg_win,
            avg_loss,
            payoff_ratio,
            largest_win,
            largest_loss,
            avg_holding_hours,
            max_win_streak,
            max_loss_streak,
            current_streak,
        }
    }
}

/// `numerator / denominator`, with the conventional f64::INFINITY when the
/// denominator is zero but the numerator is not, and 0.0 when both are.
fn ratio_or_infinity(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else if numerator > 0.0 {
        f64::INFINITY
    } else {
        0.0
    }
}

/// Peak-relative drawdown over an equity curve.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawdownStats {
    /// Largest peak-to-trough decline as a fraction of the peak. Equity can
    /// go negative (a short's loss is unbounded); the fraction caps at 1.0.
    pub max_drawdown: f64,
    /// Longest stretch below a prior peak, in calendar days.
    pub max_drawdown_duration: i64,
    /// Decline of the final point from the running peak, capped at 1.0.
    pub current_drawdown: f64,
    pub peak_equity: f64,
}

impl DrawdownStats {
    pub fn compute(equity_curve: &[EquityPoint]) -> Self {
        Self::compute_seeded(equity_curve, None)
    }

    /// Drawdown over a journal's realized equity curve, measured against the
    /// account's initial capital as the first peak so a journal that opens
    /// with losses is already underwater.
    pub fn for_journal(journal: &Journal) -> Self {
        let curve = journal.equity_curve();
        Self::compute_seeded(&curve, Some(journal.initial_capital))
    }

    fn compute_seeded(equity_curve: &[EquityPoint], seed_peak: Option<f64>) -> Self {
        if equity_curve.is_empty() {
            return DrawdownStats {
                max_drawdown: 0.0,
                max_drawdown_duration: 0,
                current_drawdown: 0.0,
                peak_equity: seed_peak.unwrap_or(0.0),
            };
        }

        let mut peak = seed_peak
            .unwrap_or(equity_curve[0].equity)
            .max(equity_curve[0].equity);
        let mut max_dd = 0.0_f64;
        let mut max_dd_duration = 0i64;
        let mut dd_start: Option<NaiveDate> = None;

        for point in equity_curve {
            if point.equity > peak {
                peak = point.equity;
                dd_start = None;
            } else if peak > 0.0 {
                let dd = ((peak - point.equity) / peak).min(1.0);
                if dd > max_dd {
                    max_dd = dd;
                }
                let start = *dd_start.get_or_insert(point.date);
                let span = (point.date - start).num_days() + 1;
                if span > max_dd_duration {
                    max_dd_duration = span;
                }
            }
        }

        let last = equity_curve[equity_curve.len() - 1].equity;
        let current_drawdown = if peak > 0.0 && last < peak {
            ((peak - last) / peak).min(1.0)
        } else {
            0.0
        };

        DrawdownStats {
            max_drawdown: max_dd,
            max_drawdown_duration: max_dd_duration,
            current_drawdown,
            peak_equity: peak,
        }
    }
}

/// Sharpe and Sortino ratios from daily simple returns, annualized by √365.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskAdjusted {
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
}

impl RiskAdjusted {
    /// `risk_free_rate` is annual; it is de-annualized to a daily hurdle
    /// before comparison. Fewer than two points or zero dispersion yields 0.0.
    pub fn compute(equity_curve: &[EquityPoint], risk_free_rate: f64) -> Self {
        if equity_curve.len() < 2 {
            return RiskAdjusted {
                sharpe_ratio: 0.0,
                sortino_ratio: 0.0,
            };
        }

        let returns: Vec<f64> = equity_curve
            .windows(2)
            .map(|w| {
                let prev = w[0].equity;
                let curr = w[1].equity;
                if prev > 0.0 { (curr - prev) / prev } else { 0.0 }
            })
            .collect();

        let n = returns.len() as f64;
        let mean: f64 = returns.iter().sum::<f64>() / n;
        let variance: f64 = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
        let stddev = variance.sqrt();

        let daily_rf = risk_free_rate / DAYS_PER_YEAR;
        let excess_return = mean - daily_rf;

        let sharpe_ratio = if stddev > 0.0 {
            (excess_return / stddev) * DAYS_PER_YEAR.sqrt()
        } else {
            0.0
        };

        let downside: Vec<f64> = returns
            .iter()
            .filter(|&&r| r < daily_rf)
            .map(|&r| (r - daily_rf).powi(2))
            .collect();

        let downside_stddev = if !downside.is_empty() {
            (downside.iter().sum::<f64>() / n).sqrt()
        } else {
            0.0
        };

        let sortino_ratio = if downside_stddev > 0.0 {
            (excess_return / downside_stddev) * DAYS_PER_YEAR.sqrt()
        } else {
            0.0
        };

        RiskAdjusted {
            sharpe_ratio,
            sortino_ratio,
        }
    }
}

/// Per-symbol aggregation, sorted by net PnL descending.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolStats {
    pub symbol: String,
    pub trades: usize,
    pub wins: usize,
    pub win_rate: f64,
    pub net_pnl: f64,
    pub fees: f64,
}

impl SymbolStats {
    pub fn compute_per_symbol(journal: &Journal) -> Vec<SymbolStats> {
        use std::collections::BTreeMap;

        let mut by_symbol: BTreeMap<&str, (usize, usize, f64, f64)> = BTreeMap::new();
        for trade in journal.trades() {
            let entry = by_symbol.entry(trade.symbol.as_str()).or_default();
            entry.0 += 1;
            if trade.outcome() == TradeOutcome::Win {
                entry.1 += 1;
            }
            entry.2 += trade.net_pnl();
            entry.3 += trade.fees;
        }

        let mut results: Vec<SymbolStats> = by_symbol
            .into_iter()
            .map(|(symbol, (trades, wins, net_pnl, fees))| SymbolStats {
                symbol: symbol.to_string(),
                trades,
                wins,
                win_rate: wins as f64 / trades as f64,
                net_pnl,
                fees,
            })
            .collect();

        results.sort_by(|a, b| {
            b.net_pnl
                .partial_cmp(&a.net_pnl)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.symbol.cmp(&b.symbol))
        });
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::trade::{Trade, TradeDirection};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn ts(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
    }

    fn make_trade(symbol: &str, day: u32, pnl: f64) -> Trade {
        Trade {
            symbol: symbol.to_string(),
            direction: TradeDirection::Long,
            quantity: 1.0,
            entry_price: 5_000.0,
            exit_price: 5_000.0 + pnl,
            entry_time: ts(day, 9),
            exit_time: ts(day, 17),
            fees: 0.0,
        }
    }

    fn make_journal(pnls: &[f64]) -> Journal {
        let trades = pnls
            .iter()
            .enumerate()
            .map(|(i, &pnl)| make_trade("BTC-USD", 1 + i as u32, pnl))
            .collect();
        Journal::new(10_000.0, trades).unwrap()
    }

    fn make_curve(values: &[f64]) -> Vec<EquityPoint> {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| EquityPoint {
                date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap() + Duration::days(i as i64),
                equity: v,
            })
            .collect()
    }

    #[test]
    fn stats_empty_journal_all_zero() {
        let stats = TradeStats::compute(&make_journal(&[]));
        assert_eq!(stats.total_trades, 0);
        assert!((stats.win_rate - 0.0).abs() < f64::EPSILON);
        assert!((stats.profit_factor - 0.0).abs() < f64::EPSILON);
        assert!((stats.expectancy - 0.0).abs() < f64::EPSILON);
        assert!((stats.payoff_ratio - 0.0).abs() < f64::EPSILON);
        assert!((stats.avg_holding_hours - 0.0).abs() < f64::EPSILON);
        assert_eq!(stats.current_streak, 0);
    }

    #[test]
    fn stats_counts_and_win_rate() {
        let stats = TradeStats::compute(&make_journal(&[100.0, -50.0, 200.0, 0.0]));
        assert_eq!(stats.total_trades, 4);
        assert_eq!(stats.wins, 2);
        assert_eq!(stats.losses, 1);
        assert_eq!(stats.breakeven, 1);
        assert!((stats.win_rate - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn stats_profit_factor() {
        let stats = TradeStats::compute(&make_journal(&[100.0, -50.0, 200.0]));
        assert!((stats.profit_factor - 6.0).abs() < 1e-9);
    }

    #[test]
    fn stats_profit_factor_no_losses_is_infinite() {
        let stats = TradeStats::compute(&make_journal(&[100.0, 50.0]));
        assert!(stats.profit_factor.is_infinite());
        assert!(stats.payoff_ratio.is_infinite());
    }

    #[test]
    fn stats_expectancy_is_mean_net_pnl() {
        let stats = TradeStats::compute(&make_journal(&[100.0, -60.0, 200.0, -40.0]));
        assert!((stats.expectancy - 50.0).abs() < 1e-9);
        assert!((stats.net_pnl - 200.0).abs() < 1e-9);
    }

    #[test]
    fn stats_avg_win_loss_and_payoff() {
        let stats = TradeStats::compute(&make_journal(&[100.0, -60.0, 200.0, -40.0]));
        assert!((stats.avg_win - 150.0).abs() < 1e-9);
        assert!((stats.avg_loss - 50.0).abs() < 1e-9);
        assert!((stats.payoff_ratio - 3.0).abs() < 1e-9);
    }

    #[test]
    fn stats_largest_win_and_loss() {
        let stats = TradeStats::compute(&make_journal(&[100.0, 300.0, -50.0, -150.0]));
        assert!((stats.largest_win - 300.0).abs() < 1e-9);
        assert!((stats.largest_loss - 150.0).abs() < 1e-9);
    }

    #[test]
    fn stats_fees_reduce_net_pnl() {
        let mut winner = make_trade("BTC-USD", 1, 100.0);
        winner.fees = 10.0;
        let mut loser = make_trade("BTC-USD", 2, -50.0);
        loser.fees = 5.0;
        let journal = Journal::new(10_000.0, vec![winner, loser]).unwrap();
        let stats = TradeStats::compute(&journal);
        assert!((stats.total_fees - 15.0).abs() < 1e-9);
        assert!((stats.net_pnl - 35.0).abs() < 1e-9);
        assert!((stats.gross_profit - 90.0).abs() < 1e-9);
        assert!((stats.gross_loss - 55.0).abs() < 1e-9);
    }

    #[test]
    fn stats_avg_holding_hours() {
        let stats = TradeStats::compute(&make_journal(&[10.0, -10.0]));
        assert!((stats.avg_holding_hours - 8.0).abs() < 1e-9);
    }

    #[test]
    fn stats_streaks() {
        let stats =
            TradeStats::compute(&make_journal(&[10.0, 20.0, 30.0, -5.0, -5.0, 10.0, -5.0]));
        assert_eq!(stats.max_win_streak, 3);
        assert_eq!(stats.max_loss_streak, 2);
        assert_eq!(stats.current_streak, -1);
    }

    #[test]
    fn stats_current_streak_positive() {
        let stats = TradeStats::compute(&make_journal(&[-5.0, 10.0, 20.0]));
        assert_eq!(stats.current_streak, 2);
    }

    #[test]
    fn stats_breakeven_breaks_streak_without_starting_one() {
        let stats = TradeStats::compute(&make_journal(&[10.0, 20.0, 0.0]));
        assert_eq!(stats.max_win_streak, 2);
        assert_eq!(stats.current_streak, 0);
    }

    #[test]
    fn drawdown_empty_curve_all_zero() {
        let dd = DrawdownStats::compute(&[]);
        assert!((dd.max_drawdown - 0.0).abs() < f64::EPSILON);
        assert_eq!(dd.max_drawdown_duration, 0);
        assert!((dd.current_drawdown - 0.0).abs() < f64::EPSILON);
        assert!((dd.peak_equity - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn drawdown_max_fraction_of_peak() {
        let dd = DrawdownStats::compute(&make_curve(&[100.0, 110.0, 90.0, 95.0, 80.0, 100.0]));
        assert!((dd.max_drawdown - (110.0 - 80.0) / 110.0).abs() < 1e-9);
        assert!((dd.peak_equity - 110.0).abs() < 1e-9);
    }

    #[test]
    fn drawdown_duration_in_days() {
        let dd = DrawdownStats::compute(&make_curve(&[100.0, 110.0, 100.0, 90.0, 85.0, 95.0]));
        assert_eq!(dd.max_drawdown_duration, 4);
    }

    #[test]
    fn drawdown_current_when_ending_underwater() {
        let dd = DrawdownStats::compute(&make_curve(&[100.0, 120.0, 110.0]));
        assert!((dd.current_drawdown - 10.0 / 120.0).abs() < 1e-9);
    }

    #[test]
    fn drawdown_current_zero_at_new_high() {
        let dd = DrawdownStats::compute(&make_curve(&[100.0, 90.0, 130.0]));
        assert!((dd.current_drawdown - 0.0).abs() < f64::EPSILON);
        assert!((dd.max_drawdown - 0.10).abs() < 1e-9);
    }

    #[test]
    fn drawdown_for_journal_measures_against_initial_capital() {
        let journal = make_journal(&[-500.0, -500.0]);
        let dd = DrawdownStats::for_journal(&journal);
        assert!((dd.peak_equity - 10_000.0).abs() < 1e-9);
        assert!((dd.max_drawdown - 0.10).abs() < 1e-9);
        assert!((dd.current_drawdown - 0.10).abs() < 1e-9);
    }

    #[test]
    fn drawdown_capped_at_one_when_losses_exceed_equity() {
        let blowup = Trade {
            symbol: "BTC-USD".to_string(),
            direction: TradeDirection::Short,
            quantity: 4.0,
            entry_price: 10_000.0,
            exit_price: 40_000.0,
            entry_time: ts(1, 9),
            exit_time: ts(1, 17),
            fees: 0.0,
        };
        let journal = Journal::new(10_000.0, vec![blowup]).unwrap();
        let dd = DrawdownStats::for_journal(&journal);
        assert!((dd.max_drawdown - 1.0).abs() < f64::EPSILON);
        assert!((dd.current_drawdown - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn drawdown_not_capped_below_full_loss() {
        let dd = DrawdownStats::compute(&make_curve(&[100.0, 5.0]));
        assert!((dd.max_drawdown - 0.95).abs() < 1e-9);
        assert!((dd.current_drawdown - 0.95).abs() < 1e-9);
    }

    #[test]
    fn risk_adjusted_needs_two_points() {
        let ra = RiskAdjusted::compute(&make_curve(&[100.0]), 0.0);
        assert!((ra.sharpe_ratio - 0.0).abs() < f64::EPSILON);
        assert!((ra.sortino_ratio - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn risk_adjusted_positive_for_steady_gains() {
        let values: Vec<f64> = (0..30)
            .map(|i| 10_000.0 * (1.0 + 0.001 * i as f64))
            .collect();
        let ra = RiskAdjusted::compute(&make_curve(&values), 0.0);
        assert!(ra.sharpe_ratio > 0.0);
    }

    #[test]
    fn risk_adjusted_finite_for_mixed_curve() {
        let ra = RiskAdjusted::compute(
            &make_curve(&[100.0, 101.0, 100.5, 101.5, 100.0, 102.0]),
            0.02,
        );
        assert!(ra.sharpe_ratio.is_finite());
        assert!(ra.sortino_ratio.is_finite());
    }

    #[test]
    fn per_symbol_sorted_by_net_pnl_desc() {
        let trades = vec![
            make_trade("ETH-USD", 1, -20.0),
            make_trade("BTC-USD", 2, 100.0),
            make_trade("SOL-USD", 3, 40.0),
            make_trade("BTC-USD", 4, -30.0),
        ];
        let journal = Journal::new(10_000.0, trades).unwrap();
        let stats = SymbolStats::compute_per_symbol(&journal);
        let symbols: Vec<&str> = stats.iter().map(|s| s.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["BTC-USD", "SOL-USD", "ETH-USD"]);
        assert!((stats[0].net_pnl - 70.0).abs() < 1e-9);
        assert_eq!(stats[0].trades, 2);
        assert_eq!(stats[0].wins, 1);
        assert!((stats[0].win_rate - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn per_symbol_empty_journal() {
        assert!(SymbolStats::compute_per_symbol(&make_journal(&[])).is_empty());
    }
}
