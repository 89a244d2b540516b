//! Plain-text report adapter implementing ReportPort.
//!
//! Renders aligned key/value sections suitable for a terminal or a text
//! file: account summary, performance, risk, per-symbol and monthly
//! breakdowns, plus optional FIRE and market-regime sections.

use crate::domain::analytics::{DrawdownStats, RiskAdjusted, SymbolStats, TradeStats};
use crate::domain::error::TradelogError;
use crate::domain::periods::{MonthlyPnl, PeriodPnl};
use crate::ports::report_port::{FireSection, RegimeSection, ReportContext, ReportPort};

pub struct TextReportAdapter;

impl TextReportAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TextReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportPort for TextReportAdapter {
    fn render(&self, context: &ReportContext) -> Result<String, TradelogError> {
        let mut out = String::new();

        out.push_str("TRADE JOURNAL REPORT\n");
        out.push_str("====================\n\n");
        out.push_str(&header_section(context));
        out.push_str(&performance_section(&context.stats));
        out.push_str(&risk_section(&context.drawdown, &context.risk));
        out.push_str(&symbol_section(&context.symbols));
        out.push_str(&monthly_section(
            &context.monthly,
            context.best_day.as_ref(),
            context.worst_day.as_ref(),
        ));
        if let Some(fire) = &context.fire {
            out.push_str(&fire_section(fire));
        }
        if let Some(regime) = &context.regime {
            out.push_str(&regime_section(regime));
        }

        Ok(out)
    }
}

fn title(name: &str) -> String {
    format!("{}\n{}\n", name, "-".repeat(name.len()))
}

fn line(label: &str, value: impl std::fmt::Display) -> String {
    format!("{:<20}{}\n", format!("{}:", label), value)
}

fn fmt_money(value: f64) -> String {
    format!("{:.2}", value)
}

fn fmt_signed(value: f64) -> String {
    format!("{:+.2}", value)
}

fn fmt_pct(fraction: f64) -> String {
    format!("{:.1}%", fraction * 100.0)
}

/// Infinite ratios (profit on zero loss) print as "inf".
fn fmt_ratio(value: f64) -> String {
    if value.is_infinite() {
        "inf".to_string()
    } else {
        format!("{:.2}", value)
    }
}

fn header_section(context: &ReportContext) -> String {
    let mut out = String::new();
    out.push_str(&line("Generated", context.generated_on.format("%Y-%m-%d")));
    out.push_str(&line("Journal", &context.journal_path));
    if let Some((first, last)) = &context.date_range {
        out.push_str(&line(
            "Period",
            format!(
                "{} to {}",
                first.format("%Y-%m-%d"),
                last.format("%Y-%m-%d")
            ),
        ));
    }
    out.push_str(&line("Initial capital", fmt_money(context.initial_capital)));
    out.push_str(&line("Final equity", fmt_money(context.final_equity)));
    out.push('\n');
    out
}

fn performance_section(stats: &TradeStats) -> String {
    let mut out = title("PERFORMANCE");
    out.push_str(&line(
        "Trades",
        format!(
            "{} ({} wins / {} losses / {} breakeven)",
            stats.total_trades, stats.wins, stats.losses, stats.breakeven
        ),
    ));
    out.push_str(&line("Win rate", fmt_pct(stats.win_rate)));
    out.push_str(&line("Net P&L", fmt_signed(stats.net_pnl)));
    out.push_str(&line("Gross profit", fmt_money(stats.gross_profit)));
    out.push_str(&line("Gross loss", fmt_money(stats.gross_loss)));
    out.push_str(&line("Fees paid", fmt_money(stats.total_fees)));
    out.push_str(&line("Profit factor", fmt_ratio(stats.profit_factor)));
    out.push_str(&line("Expectancy", fmt_signed(stats.expectancy)));
    out.push_str(&line(
        "Avg win / loss",
        format!("{} / {}", fmt_money(stats.avg_win), fmt_money(stats.avg_loss)),
    ));
    out.push_str(&line("Payoff ratio", fmt_ratio(stats.payoff_ratio)));
    out.push_str(&line("Largest win", fmt_money(stats.largest_win)));
    out.push_str(&line("Largest loss", fmt_money(stats.largest_loss)));
    out.push_str(&line(
        "Avg holding",
        format!("{:.1} h", stats.avg_holding_hours),
    ));
    out.push_str(&line(
        "Streaks",
        format!(
            "max {} wins, max {} losses, current {:+}",
            stats.max_win_streak, stats.max_loss_streak, stats.current_streak
        ),
    ));
    out.push('\n');
    out
}

fn risk_section(drawdown: &DrawdownStats, risk: &RiskAdjusted) -> String {
    let mut out = title("RISK");
    out.push_str(&line(
        "Max drawdown",
        format!(
            "{} over {} days",
            fmt_pct(drawdown.max_drawdown),
            drawdown.max_drawdown_duration
        ),
    ));
    out.push_str(&line("Current drawdown", fmt_pct(drawdown.current_drawdown)));
    out.push_str(&line("Peak equity", fmt_money(drawdown.peak_equity)));
    out.push_str(&line("Sharpe ratio", format!("{:.2}", risk.sharpe_ratio)));
    out.push_str(&line("Sortino ratio", format!("{:.2}", risk.sortino_ratio)));
    out.push('\n');
    out
}

fn symbol_section(symbols: &[SymbolStats]) -> String {
    let mut out = title("BY SYMBOL");
    if symbols.is_empty() {
        out.push_str("No trades recorded.\n\n");
        return out;
    }

    out.push_str(&format!(
        "  {:<12}{:>8}{:>10}{:>14}{:>12}\n",
        "symbol", "trades", "win rate", "net P&L", "fees"
    ));
    for s in symbols {
        out.push_str(&format!(
            "  {:<12}{:>8}{:>10}{:>14}{:>12}\n",
            s.symbol,
            s.trades,
            fmt_pct(s.win_rate),
            fmt_signed(s.net_pnl),
            fmt_money(s.fees)
        ));
    }
    out.push('\n');
    out
}

fn monthly_section(
    monthly: &[MonthlyPnl],
    best_day: Option<&PeriodPnl>,
    worst_day: Option<&PeriodPnl>,
) -> String {
    let mut out = title("MONTHLY P&L");
    if monthly.is_empty() {
        out.push_str("No trades recorded.\n\n");
        return out;
    }

    for m in monthly {
        out.push_str(&format!(
            "  {:>4}-{:02}  {:>12}  ({} trades)\n",
            m.year,
            m.month,
            fmt_signed(m.pnl),
            m.trades
        ));
    }
    if let Some(day) = best_day {
        out.push_str(&format!(
            "Best day:   {}  {}  ({} trades)\n",
            day.date,
            fmt_signed(day.pnl),
            day.trades
        ));
    }
    if let Some(day) = worst_day {
        out.push_str(&format!(
            "Worst day:  {}  {}  ({} trades)\n",
            day.date,
            fmt_signed(day.pnl),
            day.trades
        ));
    }
    out.push('\n');
    out
}

/// FIRE summary and projection table. Also used standalone by the `fire`
/// subcommand.
pub fn fire_section(fire: &FireSection) -> String {
    let summary = &fire.summary;
    let mut out = title("FIRE");
    out.push_str(&line("FIRE number", fmt_money(summary.fire_number)));
    out.push_str(&line(
        "Current value",
        format!(
            "{} ({} of target)",
            fmt_money(summary.current_value),
            fmt_pct(summary.progress)
        ),
    ));
    match (summary.years_to_target, summary.months_to_target) {
        (Some(years), Some(months)) => {
            out.push_str(&line(
                "Time to target",
                format!("{:.1} years ({:.0} months)", years, months),
            ));
        }
        _ => {
            out.push_str(&line(
                "Time to target",
                "not reachable with current plan",
            ));
        }
    }
    if let Some(date) = summary.projected_fi_date {
        out.push_str(&line("Projected FI date", date));
    }
    if let Some(coast) = summary.coast_number {
        let status = if summary.coast_reached {
            "reached"
        } else {
            "not yet reached"
        };
        out.push_str(&line(
            "Coast number",
            format!("{} ({})", fmt_money(coast), status),
        ));
    }

    if !fire.projection.is_empty() {
        out.push('\n');
        out.push_str(&format!(
            "  {:>4}{:>16}{:>16}{:>12}{:>14}\n",
            "year", "start balance", "contributions", "growth", "end balance"
        ));
        for row in &fire.projection {
            out.push_str(&format!(
                "  {:>4}{:>16}{:>16}{:>12}{:>14}\n",
                row.year,
                fmt_money(row.start_balance),
                fmt_money(row.contributions),
                fmt_money(row.growth),
                fmt_money(row.end_balance)
            ));
        }
    }
    out.push('\n');
    out
}

/// Regime assessment and risk-mode guidance. Also used standalone by the
/// `regime` subcommand.
pub fn regime_section(regime: &RegimeSection) -> String {
    let assessment = &regime.assessment;
    let mut out = title("MARKET REGIME");
    out.push_str(&line(
        "Composite score",
        format!("{:.1} / 100", assessment.score),
    ));
    out.push_str(&format!(
        "  sentiment {:.1}  momentum {:.1}  volatility {:.1}  funding {:.1}\n",
        assessment.sentiment_score,
        assessment.momentum_score,
        assessment.volatility_score,
        assessment.funding_score
    ));
    out.push_str(&line(
        "Regime",
        format!(
            "{} (confidence {})",
            assessment.regime,
            fmt_pct(assessment.confidence)
        ),
    ));
    out.push_str(&line("Risk mode", regime.risk_mode));
    out.push_str(&line(
        "Position sizing",
        format!(
            "x{:.2} of baseline, max risk {} per trade",
            regime.risk_mode.position_size_factor(),
            fmt_pct(regime.risk_mode.max_risk_per_trade())
        ),
    ));
    out.push_str(&line(
        "Account drawdown",
        fmt_pct(regime.account_drawdown),
    ));
    out.push('\n');
    out
}
