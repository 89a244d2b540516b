//! Closed-trade records and per-trade arithmetic.

use chrono::{DateTime, Duration, Utc};

use super::error::TradelogError;

/// Net PnL within this band of zero counts as breakeven, so float dust
/// never flips a trade between win and loss.
pub const BREAKEVEN_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeDirection {
    Long,
    Short,
}

impl TradeDirection {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "long" | "buy" => Some(TradeDirection::Long),
            "short" | "sell" => Some(TradeDirection::Short),
            _ => None,
        }
    }
}

impl std::fmt::Display for TradeDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeDirection::Long => write!(f, "long"),
            TradeDirection::Short => write!(f, "short"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeOutcome {
    Win,
    Loss,
    Breakeven,
}

/// One closed trade in the journal.
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub symbol: String,
    pub direction: TradeDirection,
    pub quantity: f64,
    pub entry_price: f64,
    pub exit_price: f64,
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
    pub fees: f64,
}

impl Trade {
    pub fn is_long(&self) -> bool {
        self.direction == TradeDirection::Long
    }

    pub fn is_short(&self) -> bool {
        self.direction == TradeDirection::Short
    }

    /// PnL before fees. Longs profit when price rises, shorts when it falls.
    pub fn gross_pnl(&self) -> f64 {
        match self.direction {
            TradeDirection::Long => self.quantity * (self.exit_price - self.entry_price),
            TradeDirection::Short => self.quantity * (self.entry_price - self.exit_price),
        }
    }

    pub fn net_pnl(&self) -> f64 {
        self.gross_pnl() - self.fees
    }

    /// Net PnL as a fraction of entry notional. 0.0 when the notional is 0.
    pub fn return_pct(&self) -> f64 {
        let notional = self.quantity * self.entry_price;
        if notional > 0.0 {
            self.net_pnl() / notional
        } else {
            0.0
        }
    }

    pub fn holding_period(&self) -> Duration {
        self.exit_time - self.entry_time
    }

    pub fn outcome(&self) -> TradeOutcome {
        let pnl = self.net_pnl();
        if pnl > BREAKEVEN_EPSILON {
            TradeOutcome::Win
        } else if pnl < -BREAKEVEN_EPSILON {
            TradeOutcome::Loss
        } else {
            TradeOutcome::Breakeven
        }
    }

    pub fn validate(&self) -> Result<(), TradelogError> {
        let fail = |reason: &str| {
            Err(TradelogError::InvalidTrade {
                symbol: self.symbol.clone(),
                reason: reason.to_string(),
            })
        };

        if self.symbol.trim().is_empty() {
            return Err(TradelogError::InvalidTrade {
                symbol: "<blank>".into(),
                reason: "symbol must not be empty".into(),
            });
        }
        for (name, value) in [
            ("quantity", self.quantity),
            ("entry_price", self.entry_price),
            ("exit_price", self.exit_price),
            ("fees", self.fees),
        ] {
            if !value.is_finite() {
                return fail(&format!("{name} must be finite"));
            }
        }
        if self.quantity <= 0.0 {
            return fail("quantity must be positive");
        }
        if self.entry_price <= 0.0 {
            return fail("entry_price must be positive");
        }
        if self.exit_price <= 0.0 {
            return fail("exit_price must be positive");
        }
        if self.fees < 0.0 {
            return fail("fees must be non-negative");
        }
        if self.exit_time < self.entry_time {
            return fail("exit_time must not precede entry_time");
        }
        Ok(())
    }
}
