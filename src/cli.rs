//! CLI definition and dispatch.

use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;

use crate::adapters::csv_journal_adapter::CsvJournalAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::text_report::{self, TextReportAdapter};
use crate::domain::analytics::{DrawdownStats, RiskAdjusted, SymbolStats, TradeStats};
use crate::domain::config_validation::{
    validate_analytics_config, validate_fire_config, validate_journal_config,
    validate_market_config, validate_regime_config,
};
use crate::domain::error::TradelogError;
use crate::domain::fire::{self, FirePlan, FireSummary};
use crate::domain::journal::Journal;
use crate::domain::periods;
use crate::domain::regime::{
    MarketSnapshot, RegimeAssessment, RegimeThresholds, RegimeTracker, RegimeWeights,
    derive_risk_mode,
};
use crate::ports::config_port::ConfigPort;
use crate::ports::journal_port::JournalPort;
use crate::ports::report_port::{FireSection, RegimeSection, ReportContext, ReportPort};

#[derive(Parser, Debug)]
#[command(name = "tradelog", about = "Trading journal analytics and FIRE planning")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyze the journal and render a report
    Report {
        #[arg(short, long)]
        config: PathBuf,
        /// Journal CSV, overrides the configured path
        #[arg(short, long)]
        journal: Option<PathBuf>,
        /// Write the report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Keep only trades exiting on or after this date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Keep only trades exiting on or before this date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,
    },
    /// Show FIRE progress and a year-by-year projection
    Fire {
        #[arg(short, long)]
        config: PathBuf,
        /// Portfolio value, overrides config and journal equity
        #[arg(long)]
        current_value: Option<f64>,
        /// Monthly contribution, overrides the configured value
        #[arg(long)]
        monthly: Option<f64>,
        /// Projection start date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },
    /// Classify the market regime and derive a risk mode
    Regime {
        #[arg(short, long)]
        config: PathBuf,
        /// Fear & greed sentiment 0-100, overrides [market]
        #[arg(long)]
        sentiment: Option<f64>,
        /// Momentum -1..1, overrides [market]
        #[arg(long)]
        momentum: Option<f64>,
        /// Volatility percentile 0-100, overrides [market]
        #[arg(long)]
        volatility: Option<f64>,
        /// Annualized funding rate fraction, overrides [market]
        #[arg(long)]
        funding: Option<f64>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show journal range, trade count and symbols
    Info {
        #[arg(short, long)]
        config: PathBuf,
        /// Journal CSV, overrides the configured path
        #[arg(short, long)]
        journal: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Report {
            config,
            journal,
            output,
            from,
            to,
        } => run_report(&config, journal.as_ref(), output.as_ref(), from, to),
        Command::Fire {
            config,
            current_value,
            monthly,
            as_of,
        } => run_fire(&config, current_value, monthly, as_of),
        Command::Regime {
            config,
            sentiment,
            momentum,
            volatility,
            funding,
        } => run_regime(&config, sentiment, momentum, volatility, funding),
        Command::Validate { config } => run_validate(&config),
        Command::Info { config, journal } => run_info(&config, journal.as_ref()),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })
}

/// The FIRE and regime report sections are opt-in: each is rendered only
/// when its config section carries the keys that have no default.
pub fn fire_configured(config: &dyn ConfigPort) -> bool {
    config.get_string("fire", "annual_expenses").is_some()
}

pub fn market_configured(config: &dyn ConfigPort) -> bool {
    config.get_string("market", "sentiment").is_some()
}

fn run_report(
    config_path: &PathBuf,
    journal_override: Option<&PathBuf>,
    output_path: Option<&PathBuf>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> ExitCode {
    // Stage 1: Load config
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    // Stage 2: Validate the sections this run will read
    if let Err(e) = validate_journal_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    if let Err(e) = validate_analytics_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    if fire_configured(&adapter) {
        if let Err(e) = validate_fire_config(&adapter) {
            eprintln!("error: {e}");
            return (&e).into();
        }
    }
    if market_configured(&adapter) {
        if let Err(e) = validate_regime_config(&adapter) {
            eprintln!("error: {e}");
            return (&e).into();
        }
        if let Err(e) = validate_market_config(&adapter) {
            eprintln!("error: {e}");
            return (&e).into();
        }
    }

    // Stage 3: Load the journal
    let journal_path = match resolve_journal_path(journal_override, &adapter) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let initial_capital = adapter.get_f64_or("journal", "initial_capital", 0.0);

    let journal = match load_journal(&journal_path, initial_capital, from, to) {
        Ok(j) => j,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    if journal.is_empty() {
        let e = TradelogError::EmptyJournal {
            operation: "report".to_string(),
        };
        eprintln!("error: {e}");
        return (&e).into();
    }
    eprintln!(
        "Loaded {} trades from {}",
        journal.len(),
        journal_path.display()
    );

    // Stage 4: Compute analytics
    let stats = TradeStats::compute(&journal);
    let drawdown = DrawdownStats::for_journal(&journal);
    let risk_free_rate = adapter.get_f64_or("analytics", "risk_free_rate", 0.0);
    let risk = RiskAdjusted::compute(&journal.equity_curve(), risk_free_rate);
    let symbols = SymbolStats::compute_per_symbol(&journal);
    let monthly = periods::monthly_pnl(&journal);
    let days = periods::daily_pnl(&journal);
    debug!(trades = stats.total_trades, symbols = symbols.len(), "analytics computed");

    let generated_on = Utc::now().date_naive();

    // Stage 5: Optional FIRE section
    let fire_section = if fire_configured(&adapter) {
        let plan = match build_fire_plan(&adapter, None) {
            Ok(p) => p,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };
        let current_value = adapter
            .get_f64("fire", "current_value")
            .unwrap_or_else(|| journal.realized_equity());
        let summary = FireSummary::compute(current_value, &plan, generated_on);
        let projection_years = adapter.get_i64_or("fire", "projection_years", 50) as u32;
        let projection = fire::projection(current_value, &plan, projection_years);
        Some(FireSection {
            summary,
            projection,
        })
    } else {
        None
    };

    // Stage 6: Optional regime section
    let regime_section = if market_configured(&adapter) {
        let (weights, thresholds, mut tracker) = match build_regime_inputs(&adapter) {
            Ok(v) => v,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };
        let snapshot = match build_snapshot(&adapter, None, None, None, None) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };
        let assessment = RegimeAssessment::compute(&snapshot, &weights, &thresholds);
        let regime = tracker.observe(assessment.regime);
        let risk_mode = derive_risk_mode(regime, drawdown.current_drawdown);
        Some(RegimeSection {
            assessment,
            risk_mode,
            account_drawdown: drawdown.current_drawdown,
        })
    } else {
        None
    };

    // Stage 7: Console summary to stderr
    eprintln!();
    eprintln!("Net P&L:       {:+.2}", stats.net_pnl);
    eprintln!("Win rate:      {:.1}%", stats.win_rate * 100.0);
    eprintln!("Max drawdown:  {:.1}%", drawdown.max_drawdown * 100.0);

    // Stage 8: Render
    let context = ReportContext {
        generated_on,
        journal_path: journal_path.display().to_string(),
        initial_capital: journal.initial_capital,
        final_equity: journal.realized_equity(),
        date_range: journal.date_range(),
        stats,
        drawdown,
        risk,
        symbols,
        monthly,
        best_day: periods::best_day(&days).cloned(),
        worst_day: periods::worst_day(&days).cloned(),
        fire: fire_section,
        regime: regime_section,
    };

    let renderer = TextReportAdapter::new();
    match output_path {
        Some(path) => {
            let path_str = path.display().to_string();
            match renderer.write(&context, &path_str) {
                Ok(()) => {
                    eprintln!("\nReport written to: {}", path_str);
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("error: {e}");
                    (&e).into()
                }
            }
        }
        None => match renderer.render(&context) {
            Ok(report) => {
                println!("{}", report);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("error: {e}");
                (&e).into()
            }
        },
    }
}

fn run_fire(
    config_path: &PathBuf,
    current_value: Option<f64>,
    monthly: Option<f64>,
    as_of: Option<NaiveDate>,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_fire_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    let plan = match build_fire_plan(&adapter, monthly) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let current = match resolve_current_value(&adapter, current_value) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let as_of = as_of.unwrap_or_else(|| Utc::now().date_naive());
    let summary = FireSummary::compute(current, &plan, as_of);
    let projection_years = adapter.get_i64_or("fire", "projection_years", 50) as u32;
    let projection = fire::projection(current, &plan, projection_years);

    print!(
        "{}",
        text_report::fire_section(&FireSection {
            summary,
            projection,
        })
    );
    ExitCode::SUCCESS
}

fn run_regime(
    config_path: &PathBuf,
    sentiment: Option<f64>,
    momentum: Option<f64>,
    volatility: Option<f64>,
    funding: Option<f64>,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_regime_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    if market_configured(&adapter) {
        if let Err(e) = validate_market_config(&adapter) {
            eprintln!("error: {e}");
            return (&e).into();
        }
    }

    let (weights, thresholds, mut tracker) = match build_regime_inputs(&adapter) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let snapshot = match build_snapshot(&adapter, sentiment, momentum, volatility, funding) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // Risk mode uses journal drawdown when a journal is configured.
    let account_drawdown = match journal_drawdown(&adapter) {
        Ok(dd) => dd,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let assessment = RegimeAssessment::compute(&snapshot, &weights, &thresholds);
    let regime = tracker.observe(assessment.regime);
    let risk_mode = derive_risk_mode(regime, account_drawdown);

    print!(
        "{}",
        text_report::regime_section(&RegimeSection {
            assessment,
            risk_mode,
            account_drawdown,
        })
    );
    ExitCode::SUCCESS
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_journal_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    eprintln!(
        "journal:   path = {}, initial_capital = {}",
        adapter.get_string_or("journal", "path", ""),
        adapter.get_f64_or("journal", "initial_capital", 0.0)
    );

    if let Err(e) = validate_analytics_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    eprintln!(
        "analytics: risk_free_rate = {}",
        adapter.get_f64_or("analytics", "risk_free_rate", 0.0)
    );

    if fire_configured(&adapter) {
        if let Err(e) = validate_fire_config(&adapter) {
            eprintln!("error: {e}");
            return (&e).into();
        }
        match build_fire_plan(&adapter, None) {
            Ok(plan) => {
                eprintln!(
                    "fire:      expenses = {}, SWR = {}, return = {}, contribution = {}/mo, FIRE number = {:.2}",
                    plan.annual_expenses,
                    plan.safe_withdrawal_rate,
                    plan.expected_annual_return,
                    plan.monthly_contribution,
                    plan.fire_number()
                );
            }
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        }
    } else {
        eprintln!("fire:      not configured");
    }

    if let Err(e) = validate_regime_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    match build_regime_inputs(&adapter) {
        Ok((weights, thresholds, tracker)) => {
            eprintln!(
                "regime:    weights = {}/{}/{}/{}, thresholds = {}/{}/{} (crisis vol {}), smoothing = {}",
                weights.sentiment,
                weights.momentum,
                weights.volatility,
                weights.funding,
                thresholds.risk_on,
                thresholds.risk_off,
                thresholds.crisis,
                thresholds.crisis_volatility,
                tracker.window()
            );
        }
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    }

    if market_configured(&adapter) {
        if let Err(e) = validate_market_config(&adapter) {
            eprintln!("error: {e}");
            return (&e).into();
        }
        eprintln!(
            "market:    sentiment = {}, momentum = {}, volatility = {}, funding = {}",
            adapter.get_f64_or("market", "sentiment", 0.0),
            adapter.get_f64_or("market", "momentum", 0.0),
            adapter.get_f64_or("market", "volatility_percentile", 0.0),
            adapter.get_f64_or("market", "funding_rate", 0.0)
        );
    } else {
        eprintln!("market:    not configured");
    }

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn run_info(config_path: &PathBuf, journal_override: Option<&PathBuf>) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let journal_path = match resolve_journal_path(journal_override, &adapter) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let journal_adapter = CsvJournalAdapter::new(journal_path.clone());
    match journal_adapter.journal_range() {
        Ok(Some((first, last, count))) => {
            println!(
                "{}: {} trades, {} to {}",
                journal_path.display(),
                count,
                first.format("%Y-%m-%d"),
                last.format("%Y-%m-%d")
            );
        }
        Ok(None) => {
            eprintln!("{}: journal is empty", journal_path.display());
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    }

    match journal_adapter.list_symbols() {
        Ok(symbols) => {
            for symbol in &symbols {
                println!("{}", symbol);
            }
            eprintln!("{} symbols", symbols.len());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// CLI override beats the configured path.
pub fn resolve_journal_path(
    journal_override: Option<&PathBuf>,
    config: &dyn ConfigPort,
) -> Result<PathBuf, TradelogError> {
    if let Some(path) = journal_override {
        return Ok(path.clone());
    }
    config
        .get_string("journal", "path")
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from)
        .ok_or_else(|| TradelogError::ConfigMissing {
            section: "journal".to_string(),
            key: "path".to_string(),
        })
}

fn load_journal(
    path: &PathBuf,
    initial_capital: f64,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<Journal, TradelogError> {
    let adapter = CsvJournalAdapter::new(path.clone());
    let trades = adapter.fetch_trades(from, to)?;
    Journal::new(initial_capital, trades)
}

pub fn build_fire_plan(
    config: &dyn ConfigPort,
    monthly_override: Option<f64>,
) -> Result<FirePlan, TradelogError> {
    let annual_expenses =
        config
            .get_f64("fire", "annual_expenses")
            .ok_or_else(|| TradelogError::ConfigMissing {
                section: "fire".to_string(),
                key: "annual_expenses".to_string(),
            })?;
    let monthly_contribution =
        monthly_override.unwrap_or_else(|| config.get_f64_or("fire", "monthly_contribution", 0.0));

    FirePlan::new(
        annual_expenses,
        config.get_f64_or("fire", "safe_withdrawal_rate", 0.04),
        config.get_f64_or("fire", "expected_annual_return", 0.07),
        monthly_contribution,
    )
}

/// Portfolio value for FIRE math: CLI flag, then `[fire] current_value`,
/// then the journal's realized equity.
pub fn resolve_current_value(
    config: &dyn ConfigPort,
    cli_override: Option<f64>,
) -> Result<f64, TradelogError> {
    if let Some(value) = cli_override {
        if !value.is_finite() || value < 0.0 {
            return Err(TradelogError::ConfigInvalid {
                section: "fire".to_string(),
                key: "current_value".to_string(),
                reason: "must be non-negative".to_string(),
            });
        }
        return Ok(value);
    }
    if let Some(value) = config.get_f64("fire", "current_value") {
        return Ok(value);
    }

    // No explicit value anywhere: fall back to the journal.
    if config.get_string("journal", "path").is_none() {
        return Err(TradelogError::ConfigMissing {
            section: "fire".to_string(),
            key: "current_value".to_string(),
        });
    }
    validate_journal_config(config)?;
    let path = resolve_journal_path(None, config)?;
    let initial_capital = config.get_f64_or("journal", "initial_capital", 0.0);
    let journal = load_journal(&path, initial_capital, None, None)?;
    debug!(equity = journal.realized_equity(), "current value from journal");
    Ok(journal.realized_equity())
}

/// Weights, thresholds, and a label tracker sized by `smoothing_window`.
pub fn build_regime_inputs(
    config: &dyn ConfigPort,
) -> Result<(RegimeWeights, RegimeThresholds, RegimeTracker), TradelogError> {
    let dw = RegimeWeights::default();
    let weights = RegimeWeights {
        sentiment: config.get_f64_or("regime", "weight_sentiment", dw.sentiment),
        momentum: config.get_f64_or("regime", "weight_momentum", dw.momentum),
        volatility: config.get_f64_or("regime", "weight_volatility", dw.volatility),
        funding: config.get_f64_or("regime", "weight_funding", dw.funding),
    };
    weights.validate()?;

    let dt = RegimeThresholds::default();
    let thresholds = RegimeThresholds {
        risk_on: config.get_f64_or("regime", "risk_on_threshold", dt.risk_on),
        risk_off: config.get_f64_or("regime", "risk_off_threshold", dt.risk_off),
        crisis: config.get_f64_or("regime", "crisis_threshold", dt.crisis),
        crisis_volatility: config.get_f64_or("regime", "crisis_volatility", dt.crisis_volatility),
    };
    thresholds.validate()?;

    let window = config.get_i64_or("regime", "smoothing_window", 3).max(0) as usize;
    let tracker = RegimeTracker::new(window)?;

    Ok((weights, thresholds, tracker))
}

/// Each observation resolves CLI flag first, then `[market]`. The three
/// required inputs must come from one of the two.
pub fn build_snapshot(
    config: &dyn ConfigPort,
    sentiment: Option<f64>,
    momentum: Option<f64>,
    volatility: Option<f64>,
    funding: Option<f64>,
) -> Result<MarketSnapshot, TradelogError> {
    let required = |value: Option<f64>, key: &str| -> Result<f64, TradelogError> {
        value
            .or_else(|| config.get_f64("market", key))
            .ok_or_else(|| TradelogError::ConfigMissing {
                section: "market".to_string(),
                key: key.to_string(),
            })
    };

    MarketSnapshot::new(
        required(sentiment, "sentiment")?,
        required(momentum, "momentum")?,
        required(volatility, "volatility_percentile")?,
        funding.unwrap_or_else(|| config.get_f64_or("market", "funding_rate", 0.0)),
    )
}

/// Current account drawdown from the configured journal, 0.0 when no
/// journal is configured.
fn journal_drawdown(config: &dyn ConfigPort) -> Result<f64, TradelogError> {
    if config.get_string("journal", "path").is_none() {
        return Ok(0.0);
    }
    validate_journal_config(config)?;
    let path = resolve_journal_path(None, config)?;
    let initial_capital = config.get_f64_or("journal", "initial_capital", 0.0);
    let journal = load_journal(&path, initial_capital, None, None)?;
    Ok(DrawdownStats::for_journal(&journal).current_drawdown)
}
