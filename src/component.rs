//! Pay component evaluation.
//!
//! Turns a catalog [`PayComponent`] into an amount for one employee.
//! Inactive components must be filtered out by the caller.

use crate::models::{Basis, ComputationMethod, PayBasis, PayComponent};
use crate::numeric::{finite_or_zero, non_zero};

/// Amount before clamping and rounding.
///
/// `bruto` is the gross pay visible to `BRUTO`-basis percentages at
/// the point the component is evaluated.
pub fn raw_amount(method: &ComputationMethod, basis: &PayBasis, bruto: f64) -> f64 {
    let amount = match *method {
        ComputationMethod::Flat { nominal } => nominal,
        // Despite the shared field name, a per-day rate is a nominal
        // amount per day, not a percentage.
        ComputationMethod::PerDay { rate } => rate * basis.working_days,
        ComputationMethod::Percentage { rate, basis: on } => {
            let base = match on {
                Basis::DailyWage => basis.daily_wage,
                Basis::Gross => bruto,
                // Working days are used as a plain number here.
                Basis::WorkingDays => basis.working_days,
                Basis::Unknown => 0.0,
            };
            base * (rate / 100.0)
        }
        ComputationMethod::Unknown => 0.0,
    };
    finite_or_zero(amount)
}

/// Clamp `amount` into `[cap_min, cap_max]`.  A bound of zero or
/// `None` is treated as unset.  The minimum is applied first, so when
/// the bounds cross the maximum wins.
pub fn apply_caps(amount: f64, cap_min: Option<f64>, cap_max: Option<f64>) -> f64 {
    let mut amount = amount;
    if let Some(min) = non_zero(cap_min) {
        if amount < min {
            amount = min;
        }
    }
    if let Some(max) = non_zero(cap_max) {
        if amount > max {
            amount = max;
        }
    }
    amount
}

/// Compute a component's contribution: raw amount, clamped to the
/// component's caps and rounded to whole currency units.
pub fn compute_component_amount(component: &PayComponent, basis: &PayBasis, bruto: f64) -> f64 {
    let amount = raw_amount(&component.method, basis, bruto);
    let amount = apply_caps(amount, component.cap_min, component.cap_max);
    amount.round()
}
