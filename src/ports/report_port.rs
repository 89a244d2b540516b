//! Report generation port trait.

use crate::domain::analytics::{DrawdownStats, RiskAdjusted, SymbolStats, TradeStats};
use crate::domain::error::TradelogError;
use crate::domain::fire::{FireSummary, ProjectionYear};
use crate::domain::periods::{MonthlyPnl, PeriodPnl};
use crate::domain::regime::{RegimeAssessment, RiskMode};
use chrono::{DateTime, NaiveDate, Utc};

/// Everything a report renders, assembled by the pipeline.
#[derive(Debug, Clone)]
pub struct ReportContext {
    pub generated_on: NaiveDate,
    pub journal_path: String,
    pub initial_capital: f64,
    pub final_equity: f64,
    pub date_range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    pub stats: TradeStats,
    pub drawdown: DrawdownStats,
    pub risk: RiskAdjusted,
    pub symbols: Vec<SymbolStats>,
    pub monthly: Vec<MonthlyPnl>,
    pub best_day: Option<PeriodPnl>,
    pub worst_day: Option<PeriodPnl>,
    pub fire: Option<FireSection>,
    pub regime: Option<RegimeSection>,
}

#[derive(Debug, Clone)]
pub struct FireSection {
    pub summary: FireSummary,
    pub projection: Vec<ProjectionYear>,
}

#[derive(Debug, Clone)]
pub struct RegimeSection {
    pub assessment: RegimeAssessment,
    pub risk_mode: RiskMode,
    /// Account drawdown the risk mode was derived from.
    pub account_drawdown: f64,
}

/// Port for rendering reports.
pub trait ReportPort {
    fn render(&self, context: &ReportContext) -> Result<String, TradelogError>;

    /// Default implementation: render and write to `output_path`.
    fn write(&self, context: &ReportContext, output_path: &str) -> Result<(), TradelogError> {
        let rendered = self.render(context)?;
        std::fs::write(output_path, rendered)?;
        Ok(())
    }
}
