//! Soft validation of payroll input.
//!
//! The engine accepts any input and never fails; problems in the data
//! are surfaced to the form layer as warnings instead.  Nothing in the
//! calculation path calls [`validate_payroll`].

use crate::models::{Employee, EmployeeOverride, PayComponent};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Highest number of working days accepted in one period.
pub const MAX_WORKING_DAYS: f64 = 31.0;

#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[serde(tag = "code", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum PayrollWarning {
    #[error("no employees supplied")]
    NoEmployees,

    #[error("the pay component catalog is empty")]
    EmptyCatalog,

    #[error("employee {employee_id}: name is blank")]
    BlankName { employee_id: String },

    #[error("employee {employee_id}: daily wage must be greater than 0")]
    NonPositiveWage { employee_id: String },

    #[error("employee {employee_id}: position is blank")]
    BlankPosition { employee_id: String },

    #[error("employee {employee_id}: site is blank")]
    BlankSite { employee_id: String },

    #[error("employee {employee_id}: working days must be between 0 and 31, got {days}")]
    WorkingDaysOutOfRange { employee_id: String, days: f64 },

    #[error("employee {employee_id}: working days is 0")]
    ZeroWorkingDays { employee_id: String },

    #[error("employee {employee_id}: {field} must not be negative")]
    NegativeHours {
        employee_id: String,
        field: &'static str,
    },

    #[error("override references unknown employee {employee_id}")]
    UnknownEmployee { employee_id: String },

    #[error("employee {employee_id}: selected component {component_id} is not in the catalog")]
    UnknownComponent {
        employee_id: String,
        component_id: String,
    },

    #[error("employee {employee_id}: selected component {component_id} is inactive")]
    InactiveComponent {
        employee_id: String,
        component_id: String,
    },
}

fn validate_employee(employee: &Employee, warnings: &mut Vec<PayrollWarning>) {
    let employee_id = || employee.id.clone();
    if employee.name.trim().is_empty() {
        warnings.push(PayrollWarning::BlankName {
            employee_id: employee_id(),
        });
    }
    if !(employee.daily_wage > 0.0) {
        warnings.push(PayrollWarning::NonPositiveWage {
            employee_id: employee_id(),
        });
    }
    if employee.position.trim().is_empty() {
        warnings.push(PayrollWarning::BlankPosition {
            employee_id: employee_id(),
        });
    }
    if employee.site.trim().is_empty() {
        warnings.push(PayrollWarning::BlankSite {
            employee_id: employee_id(),
        });
    }
}

fn validate_override(
    override_: &EmployeeOverride,
    catalog: &HashMap<&str, &PayComponent>,
    warnings: &mut Vec<PayrollWarning>,
) {
    let employee_id = || override_.employee_id.clone();

    if let Some(days) = override_.working_days {
        if !(0.0..=MAX_WORKING_DAYS).contains(&days) {
            warnings.push(PayrollWarning::WorkingDaysOutOfRange {
                employee_id: employee_id(),
                days,
            });
        } else if days == 0.0 {
            warnings.push(PayrollWarning::ZeroWorkingDays {
                employee_id: employee_id(),
            });
        }
    }

    let overtime = &override_.overtime;
    let hours = [
        ("normalHours", overtime.normal_hours),
        ("holidayHours", overtime.holiday_hours),
        ("nightFirstHour", overtime.night_first_hour),
        ("nightAdditionalHours", overtime.night_additional_hours),
        ("overtimeHours", overtime.overtime_hours),
    ];
    for (field, value) in hours {
        if value < 0.0 {
            warnings.push(PayrollWarning::NegativeHours {
                employee_id: employee_id(),
                field,
            });
        }
    }

    for component_id in override_.selected_component_ids() {
        match catalog.get(component_id) {
            None => warnings.push(PayrollWarning::UnknownComponent {
                employee_id: employee_id(),
                component_id: component_id.to_string(),
            }),
            Some(component) if !component.active => {
                warnings.push(PayrollWarning::InactiveComponent {
                    employee_id: employee_id(),
                    component_id: component_id.to_string(),
                })
            }
            Some(_) => {}
        }
    }
}

/// Collect every data-entry problem in a payroll input.
///
/// Employees are checked once each, in input order, followed by the
/// overrides in input order.
pub fn validate_payroll(
    employees: &[Employee],
    catalog: &[PayComponent],
    overrides: &[EmployeeOverride],
) -> Vec<PayrollWarning> {
    let mut warnings = Vec::new();

    if employees.is_empty() {
        warnings.push(PayrollWarning::NoEmployees);
    }
    if catalog.is_empty() {
        warnings.push(PayrollWarning::EmptyCatalog);
    }

    for employee in employees {
        validate_employee(employee, &mut warnings);
    }

    let known: HashSet<&str> = employees.iter().map(|e| e.id.as_str()).collect();
    let mut by_id: HashMap<&str, &PayComponent> = HashMap::new();
    for component in catalog {
        by_id.entry(component.id.as_str()).or_insert(component);
    }

    for override_ in overrides {
        if !known.contains(override_.employee_id.as_str()) {
            warnings.push(PayrollWarning::UnknownEmployee {
                employee_id: override_.employee_id.clone(),
            });
            continue;
        }
        validate_override(override_, &by_id, &mut warnings);
    }

    if !warnings.is_empty() {
        tracing::debug!("Payroll validation produced {} warnings", warnings.len());
    }
    warnings
}
