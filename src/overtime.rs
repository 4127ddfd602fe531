//! Overtime evaluation.
//!
//! The hourly rate is the effective daily wage divided by the
//! configured hours per day.  Each tier is paid at its own multiplier;
//! the legacy hours-times-rate pair and the manual amount are added on
//! top without caps.  Legacy hours without a rate of their own are paid
//! at the normal tier.

use crate::config::PayrollConfig;
use crate::models::{EmployeeOverride, PayBasis};
use crate::numeric::{finite_or_zero, non_negative};
use serde::Serialize;

/// Overtime pay split by tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OvertimeBreakdown {
    pub hourly_rate: f64,
    pub normal: f64,
    pub holiday: f64,
    pub night_first: f64,
    pub night_additional: f64,
    /// Legacy `overtime_hours * overtime_rate`, the rate falling back to
    /// the normal tier's hourly pay.
    pub legacy: f64,
    pub manual: f64,
}

impl OvertimeBreakdown {
    pub fn total(&self) -> f64 {
        self.normal + self.holiday + self.night_first + self.night_additional + self.legacy + self.manual
    }
}

pub fn hourly_rate(basis: &PayBasis, config: &PayrollConfig) -> f64 {
    if config.hours_per_day > 0.0 {
        finite_or_zero(basis.daily_wage / config.hours_per_day)
    } else {
        0.0
    }
}

/// Evaluate every overtime tier.  Negative hours count as zero.
pub fn overtime_breakdown(
    override_: &EmployeeOverride,
    basis: &PayBasis,
    config: &PayrollConfig,
) -> OvertimeBreakdown {
    if !config.overtime_enabled {
        return OvertimeBreakdown::default();
    }

    let input = &override_.overtime;
    let rate = hourly_rate(basis, config);
    let multipliers = &config.overtime;

    let legacy_hours = non_negative(input.overtime_hours);
    let legacy_rate = match non_negative(input.overtime_rate) {
        r if r > 0.0 => r,
        _ => rate * multipliers.normal,
    };

    OvertimeBreakdown {
        hourly_rate: rate,
        normal: non_negative(input.normal_hours) * rate * multipliers.normal,
        holiday: non_negative(input.holiday_hours) * rate * multipliers.holiday,
        night_first: non_negative(input.night_first_hour) * rate * multipliers.night,
        night_additional: non_negative(input.night_additional_hours)
            * rate
            * multipliers.night_additional(),
        legacy: legacy_hours * legacy_rate,
        manual: non_negative(input.overtime_amount),
    }
}

/// Total overtime pay for one employee.
pub fn compute_overtime_amount(
    override_: &EmployeeOverride,
    basis: &PayBasis,
    config: &PayrollConfig,
) -> f64 {
    overtime_breakdown(override_, basis, config).total()
}
