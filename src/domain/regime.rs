//! Market regime classification: a weighted composite of sentiment and
//! technical observations scored 0-100, thresholded into a regime label,
//! then combined with account drawdown into a position-sizing risk mode.

use super::error::TradelogError;
use std::collections::VecDeque;
use std::fmt;

/// Annualized funding at or beyond this magnitude saturates the funding
/// sub-score (crowded longs at +40%/yr score 0, crowded shorts 100).
const FUNDING_SATURATION: f64 = 0.40;

/// Drawdown floors for risk-mode derivation.
const HALT_DRAWDOWN: f64 = 0.30;
const DEFENSIVE_DRAWDOWN: f64 = 0.15;
const CAUTION_DRAWDOWN: f64 = 0.08;

/// One observation of market conditions. Construction clamps each field into
/// its documented range; non-finite input is rejected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarketSnapshot {
    /// Fear & greed style sentiment index, 0 (extreme fear) to 100.
    pub sentiment: f64,
    /// Price vs long-term anchor, -1 (far below) to 1 (far above).
    pub momentum: f64,
    /// Realized volatility rank against own history, 0 to 100.
    pub volatility_percentile: f64,
    /// Annualized perp funding rate as a fraction.
    pub funding_rate: f64,
}

impl MarketSnapshot {
    pub fn new(
        sentiment: f64,
        momentum: f64,
        volatility_percentile: f64,
        funding_rate: f64,
    ) -> Result<Self, TradelogError> {
        for (key, value) in [
            ("sentiment", sentiment),
            ("momentum", momentum),
            ("volatility_percentile", volatility_percentile),
            ("funding_rate", funding_rate),
        ] {
            if !value.is_finite() {
                return Err(TradelogError::ConfigInvalid {
                    section: "market".to_string(),
                    key: key.to_string(),
                    reason: "must be finite".to_string(),
                });
            }
        }
        Ok(MarketSnapshot {
            sentiment: sentiment.clamp(0.0, 100.0),
            momentum: momentum.clamp(-1.0, 1.0),
            volatility_percentile: volatility_percentile.clamp(0.0, 100.0),
            funding_rate: funding_rate.clamp(-1.0, 1.0),
        })
    }
}

/// Composite weights per input. Must be non-negative and sum to 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegimeWeights {
    pub sentiment: f64,
    pub momentum: f64,
    pub volatility: f64,
    pub funding: f64,
}

impl Default for RegimeWeights {
    fn default() -> Self {
        RegimeWeights {
            sentiment: 0.35,
            momentum: 0.30,
            volatility: 0.20,
            funding: 0.15,
        }
    }
}

impl RegimeWeights {
    pub fn validate(&self) -> Result<(), TradelogError> {
        for (key, value) in [
            ("weight_sentiment", self.sentiment),
            ("weight_momentum", self.momentum),
            ("weight_volatility", self.volatility),
            ("weight_funding", self.funding),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(regime_invalid(key, "must be >= 0"));
            }
        }
        let sum = self.sentiment + self.momentum + self.volatility + self.funding;
        if (sum - 1.0).abs() > 1e-6 {
            return Err(regime_invalid("weight_sentiment", "weights must sum to 1"));
        }
        Ok(())
    }
}

/// Score cuts for the regime labels, all on the 0-100 composite scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegimeThresholds {
    pub risk_on: f64,
    pub risk_off: f64,
    pub crisis: f64,
    /// Volatility percentile that forces Crisis regardless of score.
    pub crisis_volatility: f64,
}

impl Default for RegimeThresholds {
    fn default() -> Self {
        RegimeThresholds {
            risk_on: 60.0,
            risk_off: 40.0,
            crisis: 20.0,
            crisis_volatility: 90.0,
        }
    }
}

impl RegimeThresholds {
    pub fn validate(&self) -> Result<(), TradelogError> {
        for (key, value) in [
            ("risk_on_threshold", self.risk_on),
            ("risk_off_threshold", self.risk_off),
            ("crisis_threshold", self.crisis),
            ("crisis_volatility", self.crisis_volatility),
        ] {
            if !value.is_finite() || !(0.0..=100.0).contains(&value) {
                return Err(regime_invalid(key, "must be between 0 and 100"));
            }
        }
        if !(self.crisis < self.risk_off && self.risk_off < self.risk_on) {
            return Err(regime_invalid(
                "risk_on_threshold",
                "thresholds must satisfy crisis < risk_off < risk_on",
            ));
        }
        Ok(())
    }
}

fn regime_invalid(key: &str, reason: &str) -> TradelogError {
    TradelogError::ConfigInvalid {
        section: "regime".to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketRegime {
    RiskOn,
    Neutral,
    RiskOff,
    Crisis,
}

impl fmt::Display for MarketRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MarketRegime::RiskOn => "risk-on",
            MarketRegime::Neutral => "neutral",
            MarketRegime::RiskOff => "risk-off",
            MarketRegime::Crisis => "crisis",
        };
        write!(f, "{}", label)
    }
}

/// Position-sizing stance. Ordered from most to least aggressive so that
/// `max` picks the safer of two modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RiskMode {
    Aggressive,
    Standard,
    Defensive,
    Halted,
}

impl RiskMode {
    /// Multiplier on baseline position size.
    pub fn position_size_factor(&self) -> f64 {
        match self {
            RiskMode::Aggressive => 1.25,
            RiskMode::Standard => 1.0,
            RiskMode::Defensive => 0.5,
            RiskMode::Halted => 0.0,
        }
    }

    /// Fraction of equity riskable on a single trade.
    pub fn max_risk_per_trade(&self) -> f64 {
        match self {
            RiskMode::Aggressive => 0.02,
            RiskMode::Standard => 0.01,
            RiskMode::Defensive => 0.005,
            RiskMode::Halted => 0.0,
        }
    }
}

impl fmt::Display for RiskMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RiskMode::Aggressive => "aggressive",
            RiskMode::Standard => "standard",
            RiskMode::Defensive => "defensive",
            RiskMode::Halted => "halted",
        };
        write!(f, "{}", label)
    }
}

/// Classification result with the composite score, its per-input sub-scores,
/// and a 0-1 confidence in the label.
#[derive(Debug, Clone, PartialEq)]
pub struct RegimeAssessment {
    pub score: f64,
    pub regime: MarketRegime,
    pub confidence: f64,
    pub sentiment_score: f64,
    pub momentum_score: f64,
    pub volatility_score: f64,
    pub funding_score: f64,
}

impl RegimeAssessment {
    /// Score the snapshot and classify it. Weights and thresholds are
    /// assumed validated at the config boundary.
    pub fn compute(
        snapshot: &MarketSnapshot,
        weights: &RegimeWeights,
        thresholds: &RegimeThresholds,
    ) -> Self {
        let sentiment_score = snapshot.sentiment;
        let momentum_score = clamp_score((snapshot.momentum + 1.0) / 2.0 * 100.0);
        let volatility_score = clamp_score(100.0 - snapshot.volatility_percentile);
        let funding_score =
            clamp_score(50.0 - snapshot.funding_rate / FUNDING_SATURATION * 50.0);

        let score = clamp_score(
            weights.sentiment * sentiment_score
                + weights.momentum * momentum_score
                + weights.volatility * volatility_score
                + weights.funding * funding_score,
        );

        let (regime, confidence) = classify(score, snapshot.volatility_percentile, thresholds);

        RegimeAssessment {
            score,
            regime,
            confidence,
            sentiment_score,
            momentum_score,
            volatility_score,
            funding_score,
        }
    }
}

fn clamp_score(score: f64) -> f64 {
    score.clamp(0.0, 100.0)
}

/// Threshold the composite score, with the volatility override checked
/// first. Confidence is the distance from the decisive boundary scaled into
/// [0, 1]; a volatility-forced Crisis is floored at 0.5 so an override is
/// never reported as low-confidence.
fn classify(
    score: f64,
    volatility_percentile: f64,
    thresholds: &RegimeThresholds,
) -> (MarketRegime, f64) {
    if volatility_percentile >= thresholds.crisis_volatility {
        let headroom = 100.0 - thresholds.crisis_volatility;
        let confidence = if headroom > 0.0 {
            (volatility_percentile - thresholds.crisis_volatility) / headroom
        } else {
            1.0
        };
        return (MarketRegime::Crisis, confidence.clamp(0.5, 1.0));
    }

    if score < thresholds.crisis {
        let confidence = if thresholds.crisis > 0.0 {
            (thresholds.crisis - score) / thresholds.crisis
        } else {
            1.0
        };
        return (MarketRegime::Crisis, confidence.clamp(0.0, 1.0));
    }

    if score >= thresholds.risk_on {
        let headroom = 100.0 - thresholds.risk_on;
        let confidence = if headroom > 0.0 {
            (score - thresholds.risk_on) / headroom
        } else {
            1.0
        };
        return (MarketRegime::RiskOn, confidence.clamp(0.0, 1.0));
    }

    if score < thresholds.risk_off {
        let band = thresholds.risk_off - thresholds.crisis;
        let confidence = if band > 0.0 {
            (thresholds.risk_off - score) / band
        } else {
            1.0
        };
        return (MarketRegime::RiskOff, confidence.clamp(0.0, 1.0));
    }

    let half_band = (thresholds.risk_on - thresholds.risk_off) / 2.0;
    let nearest = (score - thresholds.risk_off).min(thresholds.risk_on - score);
    let confidence = if half_band > 0.0 {
        (nearest / half_band).clamp(0.0, 1.0)
    } else {
        0.0
    };
    (MarketRegime::Neutral, confidence)
}

/// Map a regime to a sizing stance, then apply account-drawdown floors.
/// Deeper drawdown never yields a riskier mode.
pub fn derive_risk_mode(regime: MarketRegime, current_drawdown: f64) -> RiskMode {
    let dd = if current_drawdown.is_finite() {
        current_drawdown.clamp(0.0, 1.0)
    } else {
        0.0
    };

    let base = match regime {
        MarketRegime::RiskOn => RiskMode::Aggressive,
        MarketRegime::Neutral => RiskMode::Standard,
        MarketRegime::RiskOff => RiskMode::Defensive,
        MarketRegime::Crisis => RiskMode::Halted,
    };

    let floor = if dd >= HALT_DRAWDOWN {
        RiskMode::Halted
    } else if dd >= DEFENSIVE_DRAWDOWN {
        RiskMode::Defensive
    } else if dd >= CAUTION_DRAWDOWN {
        RiskMode::Standard
    } else {
        RiskMode::Aggressive
    };

    base.max(floor)
}

/// Fixed-window smoothing of successive regime labels: majority vote over
/// the last `window` observations, ties resolved toward the most recent.
#[derive(Debug, Clone)]
pub struct RegimeTracker {
    window: usize,
    history: VecDeque<MarketRegime>,
    smoothed: Option<MarketRegime>,
    previous: Option<MarketRegime>,
}

impl RegimeTracker {
    pub fn new(window: usize) -> Result<Self, TradelogError> {
        if window == 0 {
            return Err(regime_invalid("smoothing_window", "must be >= 1"));
        }
        Ok(RegimeTracker {
            window,
            history: VecDeque::with_capacity(window),
            smoothed: None,
            previous: None,
        })
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Record one raw classification and return the smoothed regime.
    pub fn observe(&mut self, regime: MarketRegime) -> MarketRegime {
        self.history.push_back(regime);
        while self.history.len() > self.window {
            self.history.pop_front();
        }

        let voted = self.majority();
        self.previous = self.smoothed;
        self.smoothed = Some(voted);
        voted
    }

    /// Latest smoothed regime, if anything has been observed.
    pub fn current(&self) -> Option<MarketRegime> {
        self.smoothed
    }

    /// `(from, to)` when the last observation changed the smoothed regime.
    pub fn transition(&self) -> Option<(MarketRegime, MarketRegime)> {
        match (self.previous, self.smoothed) {
            (Some(from), Some(to)) if from != to => Some((from, to)),
            _ => None,
        }
    }

    fn majority(&self) -> MarketRegime {
        // Walk newest-first; an older candidate replaces only on a strictly
        // higher count, which settles ties toward the most recent.
        let mut best: Option<(MarketRegime, usize)> = None;
        for &candidate in self.history.iter().rev() {
            let count = self.history.iter().filter(|&&r| r == candidate).count();
            match best {
                Some((_, n)) if n >= count => {}
                _ => best = Some((candidate, count)),
            }
        }
        // history is non-empty whenever this is called
        best.map(|(r, _)| r).unwrap_or(MarketRegime::Neutral)
    }
}
