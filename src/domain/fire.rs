//! FIRE (financial independence) projections: target number, time to
//! target, required contribution, coast threshold, year-by-year table.
//!
//! Everything compounds monthly and takes dates as parameters; nothing here
//! reads the clock.

use super::error::TradelogError;
use chrono::{Months, NaiveDate};

/// Rates this close to zero take the linear (no-growth) branch instead of
/// the logarithmic closed form.
const ZERO_RATE_EPSILON: f64 = 1e-12;

/// Cap for the negative-rate simulation branch (200 years of months).
const MAX_SIMULATED_MONTHS: u32 = 2_400;

#[derive(Debug, Clone, PartialEq)]
pub struct FirePlan {
    pub annual_expenses: f64,
    pub safe_withdrawal_rate: f64,
    pub expected_annual_return: f64,
    pub monthly_contribution: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FireSummary {
    pub fire_number: f64,
    pub current_value: f64,
    /// Fraction of the FIRE number already accumulated, in [0, 1].
    pub progress: f64,
    pub months_to_target: Option<f64>,
    pub years_to_target: Option<f64>,
    pub projected_fi_date: Option<NaiveDate>,
    /// Balance that would coast to the target by the projected date with no
    /// further contributions. None when no target date exists.
    pub coast_number: Option<f64>,
    pub coast_reached: bool,
}

/// One row of the year-by-year projection table.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionYear {
    pub year: u32,
    pub start_balance: f64,
    pub contributions: f64,
    pub growth: f64,
    pub end_balance: f64,
}

impl FirePlan {
    pub fn new(
        annual_expenses: f64,
        safe_withdrawal_rate: f64,
        expected_annual_return: f64,
        monthly_contribution: f64,
    ) -> Result<Self, TradelogError> {
        if !annual_expenses.is_finite() || annual_expenses < 0.0 {
            return Err(plan_invalid("annual_expenses", "must be >= 0"));
        }
        if !safe_withdrawal_rate.is_finite()
            || safe_withdrawal_rate <= 0.0
            || safe_withdrawal_rate >= 1.0
        {
            return Err(plan_invalid(
                "safe_withdrawal_rate",
                "must be between 0 and 1 exclusive",
            ));
        }
        if !expected_annual_return.is_finite()
            || expected_annual_return <= -1.0
            || expected_annual_return >= 1.0
        {
            return Err(plan_invalid(
                "expected_annual_return",
                "must be between -1 and 1 exclusive",
            ));
        }
        if !monthly_contribution.is_finite() || monthly_contribution < 0.0 {
            return Err(plan_invalid("monthly_contribution", "must be >= 0"));
        }
        Ok(FirePlan {
            annual_expenses,
            safe_withdrawal_rate,
            expected_annual_return,
            monthly_contribution,
        })
    }

    /// Portfolio value at which the safe withdrawal rate covers expenses.
    pub fn fire_number(&self) -> f64 {
        self.annual_expenses / self.safe_withdrawal_rate
    }

    /// Effective monthly compounding rate for the expected annual return.
    pub fn monthly_rate(&self) -> f64 {
        (1.0 + self.expected_annual_return).powf(1.0 / 12.0) - 1.0
    }

    /// Months until the balance reaches the FIRE number with end-of-month
    /// contributions, or None when it never does.
    pub fn months_to_target(&self, current_value: f64) -> Option<f64> {
        let target = self.fire_number();
        let current = current_value.max(0.0);
        if current >= target {
            return Some(0.0);
        }

        let r = self.monthly_rate();
        let contribution = self.monthly_contribution;

        if r.abs() < ZERO_RATE_EPSILON {
            if contribution > 0.0 {
                return Some((target - current) / contribution);
            }
            return None;
        }

        if r > 0.0 {
            let offset = contribution / r;
            let denominator = current + offset;
            if denominator <= 0.0 {
                return None;
            }
            let months = ((target + offset) / denominator).ln() / (1.0 + r).ln();
            return Some(months.max(0.0));
        }

        // Negative rates have no log closed form over the target; walk the
        // recurrence until it reaches the target or stops growing.
        let mut balance = current;
        for month in 0..MAX_SIMULATED_MONTHS {
            if balance >= target {
                return Some(f64::from(month));
            }
            let next = balance * (1.0 + r) + contribution;
            if next <= balance + 1e-9 {
                return None;
            }
            balance = next;
        }
        None
    }

    pub fn years_to_target(&self, current_value: f64) -> Option<f64> {
        self.months_to_target(current_value).map(|m| m / 12.0)
    }
}

fn plan_invalid(key: &str, reason: &str) -> TradelogError {
    TradelogError::ConfigInvalid {
        section: "fire".to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

/// Fraction of the FIRE number already accumulated, clamped to [0, 1].
/// A zero target counts as reached.
pub fn progress(current_value: f64, fire_number: f64) -> f64 {
    if fire_number <= 0.0 {
        1.0
    } else {
        (current_value / fire_number).clamp(0.0, 1.0)
    }
}

/// `as_of` advanced by `months` rounded up to whole months. None for
/// negative or non-finite input, or past the calendar's range.
pub fn projected_fi_date(as_of: NaiveDate, months: f64) -> Option<NaiveDate> {
    if !months.is_finite() || months < 0.0 {
        return None;
    }
    let whole = months.ceil();
    if whole > f64::from(u32::MAX) {
        return None;
    }
    as_of.checked_add_months(Months::new(whole as u32))
}

/// Monthly contribution needed to reach the FIRE number in `target_years`.
/// Some(0) when growth alone suffices, None when `target_years <= 0` and the
/// target is not already met.
pub fn required_monthly_contribution(
    current_value: f64,
    plan: &FirePlan,
    target_years: f64,
) -> Option<f64> {
    let target = plan.fire_number();
    let current = current_value.max(0.0);
    if current >= target {
        return Some(0.0);
    }
    if !(target_years > 0.0) {
        return None;
    }

    let months = target_years * 12.0;
    let r = plan.monthly_rate();
    if r.abs() < ZERO_RATE_EPSILON {
        return Some((target - current) / months);
    }

    let growth = (1.0 + r).powf(months);
    let grown = current * growth;
    if grown >= target {
        return Some(0.0);
    }
    Some((target - grown) * r / (growth - 1.0))
}

/// Balance today that compounds to the FIRE number in `years_until_target`
/// with zero further contributions.
pub fn coast_number(plan: &FirePlan, years_until_target: f64) -> f64 {
    let years = years_until_target.max(0.0);
    plan.fire_number() / (1.0 + plan.expected_annual_return).powf(years)
}

pub fn coast_reached(current_value: f64, plan: &FirePlan, years_until_target: f64) -> bool {
    current_value >= coast_number(plan, years_until_target)
}

/// Year-by-year balance table. Contributions land at the start of each month
/// and then compound; rows stop after the first year that ends at or above
/// the FIRE number, or at `max_years`.
pub fn projection(current_value: f64, plan: &FirePlan, max_years: u32) -> Vec<ProjectionYear> {
    let target = plan.fire_number();
    let r = plan.monthly_rate();
    let mut balance = current_value.max(0.0);
    let mut rows = Vec::new();

    for year in 1..=max_years {
        let start_balance = balance;
        let mut contributions = 0.0_f64;
        let mut growth = 0.0_f64;
        for _ in 0..12 {
            balance += plan.monthly_contribution;
            contributions += plan.monthly_contribution;
            let gained = balance * r;
            balance += gained;
            growth += gained;
        }
        let end_balance = start_balance + contributions + growth;
        balance = end_balance;
        rows.push(ProjectionYear {
            year,
            start_balance,
            contributions,
            growth,
            end_balance,
        });
        if end_balance >= target {
            break;
        }
    }
    rows
}

impl FireSummary {
    pub fn compute(current_value: f64, plan: &FirePlan, as_of: NaiveDate) -> Self {
        let fire_number = plan.fire_number();
        let months_to_target = plan.months_to_target(current_value);
        let years_to_target = months_to_target.map(|m| m / 12.0);
        let projected = months_to_target.and_then(|m| projected_fi_date(as_of, m));
        let coast = years_to_target.map(|y| coast_number(plan, y));
        let coast_reached = coast.map(|c| current_value >= c).unwrap_or(false);

        FireSummary {
            fire_number,
            current_value,
            progress: progress(current_value, fire_number),
            months_to_target,
            years_to_target,
            projected_fi_date: projected,
            coast_number: coast,
            coast_reached,
        }
    }
}
