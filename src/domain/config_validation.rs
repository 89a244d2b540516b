//! Configuration validation.
//!
//! Validates all config sections before any pipeline runs. Missing keys and
//! unparseable values are reported separately, always with section and key.

use crate::domain::error::TradelogError;
use crate::domain::regime::{RegimeThresholds, RegimeWeights};
use crate::ports::config_port::ConfigPort;

pub fn validate_journal_config(config: &dyn ConfigPort) -> Result<(), TradelogError> {
    match config.get_string("journal", "path") {
        Some(p) if !p.trim().is_empty() => {}
        _ => {
            return Err(TradelogError::ConfigMissing {
                section: "journal".to_string(),
                key: "path".to_string(),
            });
        }
    }

    let capital = require_f64(config, "journal", "initial_capital")?;
    if capital <= 0.0 {
        return Err(invalid(
            "journal",
            "initial_capital",
            "initial_capital must be positive",
        ));
    }
    Ok(())
}

pub fn validate_analytics_config(config: &dyn ConfigPort) -> Result<(), TradelogError> {
    let rate = optional_f64(config, "analytics", "risk_free_rate", 0.0)?;
    if rate < 0.0 || rate >= 1.0 {
        return Err(invalid(
            "analytics",
            "risk_free_rate",
            "risk_free_rate must be between 0 and 1",
        ));
    }
    Ok(())
}

pub fn validate_fire_config(config: &dyn ConfigPort) -> Result<(), TradelogError> {
    let expenses = require_f64(config, "fire", "annual_expenses")?;
    if expenses < 0.0 {
        return Err(invalid(
            "fire",
            "annual_expenses",
            "annual_expenses must be non-negative",
        ));
    }

    let swr = optional_f64(config, "fire", "safe_withdrawal_rate", 0.04)?;
    if swr <= 0.0 || swr >= 1.0 {
        return Err(invalid(
            "fire",
            "safe_withdrawal_rate",
            "safe_withdrawal_rate must be between 0 and 1 exclusive",
        ));
    }

    let annual_return = optional_f64(config, "fire", "expected_annual_return", 0.07)?;
    if annual_return <= -1.0 || annual_return >= 1.0 {
        return Err(invalid(
            "fire",
            "expected_annual_return",
            "expected_annual_return must be between -1 and 1 exclusive",
        ));
    }

    let contribution = optional_f64(config, "fire", "monthly_contribution", 0.0)?;
    if contribution < 0.0 {
        return Err(invalid(
            "fire",
            "monthly_contribution",
            "monthly_contribution must be non-negative",
        ));
    }

    if let Some(current) = present_f64(config, "fire", "current_value")? {
        if current < 0.0 {
            return Err(invalid(
                "fire",
                "current_value",
                "current_value must be non-negative",
            ));
        }
    }

    let years = optional_i64(config, "fire", "projection_years", 50)?;
    if years < 1 {
        return Err(invalid(
            "fire",
            "projection_years",
            "projection_years must be at least 1",
        ));
    }
    Ok(())
}

pub fn validate_regime_config(config: &dyn ConfigPort) -> Result<(), TradelogError> {
    let defaults = RegimeWeights::default();
    let weights = RegimeWeights {
        sentiment: optional_f64(config, "regime", "weight_sentiment", defaults.sentiment)?,
        momentum: optional_f64(config, "regime", "weight_momentum", defaults.momentum)?,
        volatility: optional_f64(config, "regime", "weight_volatility", defaults.volatility)?,
        funding: optional_f64(config, "regime", "weight_funding", defaults.funding)?,
    };
    weights.validate()?;

    let defaults = RegimeThresholds::default();
    let thresholds = RegimeThresholds {
        risk_on: optional_f64(config, "regime", "risk_on_threshold", defaults.risk_on)?,
        risk_off: optional_f64(config, "regime", "risk_off_threshold", defaults.risk_off)?,
        crisis: optional_f64(config, "regime", "crisis_threshold", defaults.crisis)?,
        crisis_volatility: optional_f64(
            config,
            "regime",
            "crisis_volatility",
            defaults.crisis_volatility,
        )?,
    };
    thresholds.validate()?;

    let window = optional_i64(config, "regime", "smoothing_window", 3)?;
    if window < 1 {
        return Err(invalid(
            "regime",
            "smoothing_window",
            "smoothing_window must be at least 1",
        ));
    }
    Ok(())
}

pub fn validate_market_config(config: &dyn ConfigPort) -> Result<(), TradelogError> {
    require_f64(config, "market", "sentiment")?;
    require_f64(config, "market", "momentum")?;
    require_f64(config, "market", "volatility_percentile")?;
    optional_f64(config, "market", "funding_rate", 0.0)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: &str) -> TradelogError {
    TradelogError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

/// The key must be present and numeric.
fn require_f64(config: &dyn ConfigPort, section: &str, key: &str) -> Result<f64, TradelogError> {
    match present_f64(config, section, key)? {
        Some(value) => Ok(value),
        None => Err(TradelogError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }),
    }
}

/// The key may be absent; if present it must be numeric.
fn optional_f64(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, TradelogError> {
    Ok(present_f64(config, section, key)?.unwrap_or(default))
}

fn present_f64(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<f64>, TradelogError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(_) => match config.get_f64(section, key) {
            Some(value) => Ok(Some(value)),
            None => Err(invalid(section, key, "must be a number")),
        },
    }
}

fn optional_i64(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: i64,
) -> Result<i64, TradelogError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) if raw.trim().is_empty() => Ok(default),
        Some(_) => match config.get_i64(section, key) {
            Some(value) => Ok(value),
            None => Err(invalid(section, key, "must be an integer")),
        },
    }
}
