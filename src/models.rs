//! Data models for the Payroll Engine.
//!
//! The `models` module defines the serialisable structs and enums
//! that describe employees, pay components, per-run overrides and the
//! calculation results.  JSON field names are camelCase to match the
//! host UI; the Indonesian field names used by the back-office forms
//! (`kontrakUpahHarian`, `hariKerja`, `nama`, ...) are accepted as
//! aliases.  Every numeric input field is read permissively (see
//! [`crate::numeric`]).

use crate::config::PayrollConfig;
use crate::numeric::{lenient, lenient_opt, non_negative, non_zero};
use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

/// A worker eligible for payroll.  Treated as immutable input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: String,
    #[serde(alias = "nama")]
    pub name: String,
    /// Job title.  Display only.
    #[serde(default, alias = "jabatan")]
    pub position: String,
    /// Mining site.  Display only.
    #[serde(default)]
    pub site: String,
    /// Contracted daily base wage.
    #[serde(default, deserialize_with = "lenient", alias = "kontrakUpahHarian")]
    pub daily_wage: f64,
    /// Default daily meal allowance.
    #[serde(default, deserialize_with = "lenient", alias = "defaultUangMakan")]
    pub default_meal_allowance: f64,
    /// Default daily fuel allowance.
    #[serde(default, deserialize_with = "lenient", alias = "defaultUangBbm")]
    pub default_fuel_allowance: f64,
    #[serde(default = "default_true", alias = "aktif")]
    pub active: bool,
}

impl Employee {
    pub fn new(id: impl Into<String>, name: impl Into<String>, daily_wage: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            position: String::new(),
            site: String::new(),
            daily_wage,
            default_meal_allowance: 0.0,
            default_fuel_allowance: 0.0,
            active: true,
        }
    }

    pub fn with_position(mut self, position: impl Into<String>, site: impl Into<String>) -> Self {
        self.position = position.into();
        self.site = site.into();
        self
    }

    pub fn with_allowances(mut self, meal: f64, fuel: f64) -> Self {
        self.default_meal_allowance = meal;
        self.default_fuel_allowance = fuel;
        self
    }
}

/// Whether a component adds to or subtracts from pay.  Records
/// without a type are earnings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComponentKind {
    #[default]
    #[serde(alias = "earning")]
    Earning,
    #[serde(alias = "deduction")]
    Deduction,
}

/// The quantity a percentage component's rate is applied to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Basis {
    /// Effective daily wage.
    #[serde(rename = "UPAH_HARIAN")]
    DailyWage,
    /// Gross pay accumulated so far.
    #[serde(rename = "BRUTO")]
    Gross,
    /// Working days, taken as a raw number.
    #[serde(rename = "HARI_KERJA")]
    WorkingDays,
    /// Unrecognised basis; evaluates to zero.
    #[default]
    #[serde(other)]
    Unknown,
}

/// How a component's amount is computed.
///
/// Serialised as a flat record tagged by `method`.  Catalog records are
/// read through [`PayComponentRecord`], which accepts the back-office
/// spelling `metode` and fields that do not belong to the method.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "method")]
pub enum ComputationMethod {
    /// A fixed amount per period.
    #[serde(rename = "FLAT")]
    Flat { nominal: f64 },
    /// A nominal rate per working day.
    #[serde(rename = "PER_HARI")]
    PerDay { rate: f64 },
    /// `rate` percent of the chosen basis.
    #[serde(rename = "PERSENTASE")]
    Percentage { rate: f64, basis: Basis },
    /// Unrecognised method; evaluates to zero.
    #[serde(rename = "UNKNOWN")]
    Unknown,
}

impl ComputationMethod {
    pub fn is_gross_percentage(&self) -> bool {
        matches!(
            self,
            ComputationMethod::Percentage {
                basis: Basis::Gross,
                ..
            }
        )
    }
}

/// Ordering index from which catalog components count as
/// "additional" rather than "standard".
pub const ADDITIONAL_ORDER_START: i64 = 100;

/// A named, reusable payroll rule from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "PayComponentRecord")]
pub struct PayComponent {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ComponentKind,
    pub taxable: bool,
    #[serde(flatten)]
    pub method: ComputationMethod,
    pub cap_min: Option<f64>,
    pub cap_max: Option<f64>,
    pub order: i64,
    pub active: bool,
}

/// Wire form of a catalog record.
///
/// Records carry `rate`, `nominal` and `basis` side by side whatever
/// their method, so they are read flat and folded into a
/// [`ComputationMethod`] afterwards.  A record without an `id` gets an
/// empty one; no selection can reference it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayComponentRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default, alias = "nama")]
    pub name: String,
    #[serde(default, rename = "type", alias = "tipe")]
    pub kind: ComponentKind,
    #[serde(default)]
    pub taxable: bool,
    #[serde(default, alias = "metode")]
    pub method: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub rate: f64,
    #[serde(default, deserialize_with = "lenient")]
    pub nominal: f64,
    #[serde(default)]
    pub basis: Option<Basis>,
    #[serde(default, deserialize_with = "lenient_opt")]
    pub cap_min: Option<f64>,
    #[serde(default, deserialize_with = "lenient_opt")]
    pub cap_max: Option<f64>,
    #[serde(default)]
    pub order: i64,
    #[serde(default = "default_true", alias = "aktif")]
    pub active: bool,
}

impl From<&PayComponentRecord> for ComputationMethod {
    fn from(record: &PayComponentRecord) -> Self {
        match record.method.as_deref().map(str::trim) {
            Some("FLAT") => ComputationMethod::Flat {
                nominal: record.nominal,
            },
            Some("PER_HARI") => ComputationMethod::PerDay { rate: record.rate },
            Some("PERSENTASE") => ComputationMethod::Percentage {
                rate: record.rate,
                basis: record.basis.unwrap_or_default(),
            },
            _ => ComputationMethod::Unknown,
        }
    }
}

impl From<PayComponentRecord> for PayComponent {
    fn from(record: PayComponentRecord) -> Self {
        let method = ComputationMethod::from(&record);
        Self {
            id: record.id,
            name: record.name,
            kind: record.kind,
            taxable: record.taxable,
            method,
            cap_min: record.cap_min,
            cap_max: record.cap_max,
            order: record.order,
            active: record.active,
        }
    }
}

impl PayComponent {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        kind: ComponentKind,
        method: ComputationMethod,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            taxable: false,
            method,
            cap_min: None,
            cap_max: None,
            order: 0,
            active: true,
        }
    }

    pub fn earning(id: impl Into<String>, name: impl Into<String>, method: ComputationMethod) -> Self {
        Self::new(id, name, ComponentKind::Earning, method)
    }

    pub fn deduction(id: impl Into<String>, name: impl Into<String>, method: ComputationMethod) -> Self {
        Self::new(id, name, ComponentKind::Deduction, method)
    }

    pub fn with_taxable(mut self, taxable: bool) -> Self {
        self.taxable = taxable;
        self
    }

    pub fn with_caps(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.cap_min = min;
        self.cap_max = max;
        self
    }

    pub fn with_order(mut self, order: i64) -> Self {
        self.order = order;
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Standard components sort before the additional ones in the
    /// selection UI.  The split has no effect on the calculation.
    pub fn is_standard(&self) -> bool {
        self.order < ADDITIONAL_ORDER_START
    }
}

/// An ad-hoc component entered for a single employee in a single run.
/// Its amount is final and is not recomputed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomComponent {
    #[serde(default, alias = "nama")]
    pub name: String,
    #[serde(default, rename = "type", alias = "tipe")]
    pub kind: ComponentKind,
    #[serde(default, deserialize_with = "lenient", alias = "nominal")]
    pub amount: f64,
    #[serde(default)]
    pub taxable: bool,
}

impl CustomComponent {
    pub fn earning(name: impl Into<String>, amount: f64, taxable: bool) -> Self {
        Self {
            name: name.into(),
            kind: ComponentKind::Earning,
            amount,
            taxable,
        }
    }

    pub fn deduction(name: impl Into<String>, amount: f64) -> Self {
        Self {
            name: name.into(),
            kind: ComponentKind::Deduction,
            amount,
            taxable: false,
        }
    }

    /// Ad-hoc lines without a name or with a non-positive amount are
    /// ignored.
    pub fn is_applicable(&self) -> bool {
        !self.name.trim().is_empty() && self.amount > 0.0
    }
}

/// Overtime inputs.  The itemised hour buckets, the legacy
/// hours-times-rate pair and the manual amount are all additive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OvertimeInput {
    #[serde(default, deserialize_with = "lenient")]
    pub normal_hours: f64,
    #[serde(default, deserialize_with = "lenient")]
    pub holiday_hours: f64,
    #[serde(default, deserialize_with = "lenient")]
    pub night_first_hour: f64,
    #[serde(default, deserialize_with = "lenient")]
    pub night_additional_hours: f64,
    /// Legacy simple overtime: hours paid at `overtime_rate` each.
    #[serde(default, deserialize_with = "lenient")]
    pub overtime_hours: f64,
    #[serde(default, deserialize_with = "lenient")]
    pub overtime_rate: f64,
    /// Manually entered overtime amount.
    #[serde(default, deserialize_with = "lenient")]
    pub overtime_amount: f64,
}

/// Per-run, per-employee input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeOverride {
    pub employee_id: String,
    /// Working days in the period.  `None` falls back to the configured
    /// default; an explicit zero stays zero.
    #[serde(default, deserialize_with = "lenient_opt", alias = "hariKerja")]
    pub working_days: Option<f64>,
    /// Replacement for the contracted daily wage.
    #[serde(default, deserialize_with = "lenient_opt", alias = "customHourlyRate")]
    pub custom_daily_rate: Option<f64>,
    /// Cash advance to recover from this period's pay.
    #[serde(default, deserialize_with = "lenient")]
    pub cashbon: f64,
    #[serde(flatten)]
    pub overtime: OvertimeInput,
    #[serde(default)]
    pub selected_standard_components: Vec<String>,
    #[serde(default)]
    pub selected_additional_components: Vec<String>,
    #[serde(default)]
    pub custom_components: Vec<CustomComponent>,
}

impl EmployeeOverride {
    pub fn new(employee_id: impl Into<String>) -> Self {
        Self {
            employee_id: employee_id.into(),
            ..Self::default()
        }
    }

    pub fn with_working_days(mut self, days: f64) -> Self {
        self.working_days = Some(days);
        self
    }

    pub fn with_custom_daily_rate(mut self, rate: f64) -> Self {
        self.custom_daily_rate = Some(rate);
        self
    }

    pub fn with_cashbon(mut self, cashbon: f64) -> Self {
        self.cashbon = cashbon;
        self
    }

    pub fn with_overtime(mut self, overtime: OvertimeInput) -> Self {
        self.overtime = overtime;
        self
    }

    pub fn with_standard_components<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selected_standard_components = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_additional_components<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selected_additional_components = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_custom_component(mut self, component: CustomComponent) -> Self {
        self.custom_components.push(component);
        self
    }

    /// Selected catalog IDs, standard before additional, each ID once.
    pub fn selected_component_ids(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        self.selected_standard_components
            .iter()
            .chain(self.selected_additional_components.iter())
            .map(String::as_str)
            .filter(|id| seen.insert(*id))
            .collect()
    }
}

/// The wage and day count a calculation runs on, after applying the
/// override's fallbacks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PayBasis {
    pub daily_wage: f64,
    pub working_days: f64,
}

impl PayBasis {
    pub fn resolve(employee: &Employee, override_: &EmployeeOverride, config: &PayrollConfig) -> Self {
        let daily_wage = non_zero(override_.custom_daily_rate)
            .unwrap_or_else(|| non_negative(employee.daily_wage));
        let working_days = match override_.working_days {
            Some(days) => non_negative(days),
            None => non_negative(config.default_working_days),
        };
        Self {
            daily_wage,
            working_days,
        }
    }

    pub fn base_pay(&self) -> f64 {
        self.daily_wage * self.working_days
    }
}

/// Where a line item came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LineSource {
    /// Base pay, overtime, allowances and cashbon.
    Builtin,
    /// A selected catalog component.
    Catalog,
    /// An ad-hoc component entered on the override.
    Adhoc,
}

/// One line on the earnings side of a payslip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EarningLine {
    /// Display name, also the grouping key of the summary breakdown.
    pub name: String,
    /// Amount added to gross pay.
    pub amount: f64,
    /// Whether the amount counts towards the taxable base.
    pub taxable: bool,
    pub source: LineSource,
    /// Catalog ID for [`LineSource::Catalog`] lines; `None` otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_id: Option<String>,
}

/// One line on the deductions side of a payslip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeductionLine {
    pub name: String,
    /// Amount subtracted from gross pay.  Always positive.
    pub amount: f64,
    pub source: LineSource,
    /// Catalog ID for [`LineSource::Catalog`] lines; `None` otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_id: Option<String>,
}

/// The result of a payroll calculation for a single employee.  Line
/// items keep their insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayrollCalculationResult {
    pub employee_id: String,
    pub employee_name: String,
    /// Working days the employee was paid for, after defaulting.
    pub working_days: f64,
    /// Effective daily wage: the override's rate if set, otherwise the
    /// contract wage.
    pub daily_wage: f64,
    /// Daily wage times working days.
    pub base_pay: f64,
    /// Total overtime pay, all tiers included.  Zero when no overtime
    /// line was emitted.
    pub overtime_amount: f64,
    /// Earning lines in evaluation order, base pay first.
    pub earnings: Vec<EarningLine>,
    /// Deduction lines in evaluation order, cashbon first.
    pub deductions: Vec<DeductionLine>,
    /// Gross pay: sum of all earning lines.
    pub bruto: f64,
    /// Sum of the taxable earning lines.
    pub taxable_base: f64,
    /// Rate reported by the tax calculator, as a fraction.
    pub tax_rate: f64,
    /// Tax on the taxable base.
    pub tax: f64,
    /// Sum of the deduction lines, tax excluded.
    pub total_deductions: f64,
    /// Net pay: gross minus deductions minus tax.
    pub neto: f64,
}

/// Defines the start and end dates of a pay period.  Dates are
/// represented as ISO 8601 strings (`YYYY-MM-DD`) for simplicity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PayPeriod {
    /// Inclusive start date of the pay period.
    #[serde(alias = "awal")]
    pub start: String,
    /// Inclusive end date of the pay period.
    #[serde(alias = "akhir")]
    pub end: String,
}

/// Input to a payroll run: the employee list, the component catalog
/// and one override per employee to be paid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayRunInput {
    #[serde(default)]
    pub employees: Vec<Employee>,
    #[serde(default)]
    pub components: Vec<PayComponent>,
    #[serde(default)]
    pub overrides: Vec<EmployeeOverride>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<PayPeriod>,
}

/// The aggregate result of a payroll run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayRunResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<PayPeriod>,
    /// One result per override whose employee was found, in override
    /// order.
    pub results: Vec<PayrollCalculationResult>,
    /// Employee IDs of overrides that were skipped because the
    /// employee was not in the supplied list.
    pub skipped: Vec<String>,
    pub summary: crate::summary::PayrollSummary,
}
