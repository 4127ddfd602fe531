//! Payroll run summary.
//!
//! Rolls per-employee results into totals, averages, the highest and
//! lowest net pay, and a per-component breakdown.  Every ordering in
//! the summary is deterministic: groups keep first-appearance order
//! and all sorts are stable.

use crate::models::PayrollCalculationResult;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An employee and an amount, used for the highest/lowest net pay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayeeAmount {
    pub employee_id: String,
    pub employee_name: String,
    /// Net pay.
    pub amount: f64,
}

/// Totals for every line item sharing a name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentBreakdown {
    pub name: String,
    /// Sum of every line with this name across all employees.
    pub total: f64,
    /// Number of employees carrying at least one line with this name.
    pub count: usize,
    /// `total / count`.
    pub average: f64,
}

/// Per-name breakdowns, each sorted by total, largest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BreakdownByKind {
    pub earnings: Vec<ComponentBreakdown>,
    pub deductions: Vec<ComponentBreakdown>,
}

/// Aggregate view of a payroll run.  An empty run yields zero totals,
/// zero averages and no highest or lowest payee.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayrollSummary {
    /// Number of results summarised; skipped overrides are not counted.
    pub employee_count: usize,
    /// Sum of gross pay.
    pub total_bruto: f64,
    /// Sum of deduction lines; tax is reported separately.
    pub total_deductions: f64,
    pub total_tax: f64,
    /// Sum of net pay.
    pub total_neto: f64,
    pub total_overtime: f64,
    /// `total_bruto / employee_count`.
    pub average_bruto: f64,
    /// `total_neto / employee_count`.
    pub average_neto: f64,
    pub average_working_days: f64,
    /// Highest net pay; the earliest employee wins a tie.
    pub highest_neto: Option<PayeeAmount>,
    /// Lowest net pay; the latest employee wins a tie.
    pub lowest_neto: Option<PayeeAmount>,
    pub breakdown: BreakdownByKind,
}

#[derive(Default)]
struct Grouping {
    index: HashMap<String, usize>,
    groups: Vec<(String, f64, usize)>,
}

impl Grouping {
    /// Add one employee's lines.  Repeated names within the same
    /// employee add to the total but count the employee once.
    fn add_employee<'a, I>(&mut self, lines: I)
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let mut seen: Vec<usize> = Vec::new();
        for (name, amount) in lines {
            let slot = match self.index.get(name) {
                Some(slot) => *slot,
                None => {
                    self.groups.push((name.to_string(), 0.0, 0));
                    self.index.insert(name.to_string(), self.groups.len() - 1);
                    self.groups.len() - 1
                }
            };
            self.groups[slot].1 += amount;
            if !seen.contains(&slot) {
                seen.push(slot);
                self.groups[slot].2 += 1;
            }
        }
    }

    fn into_breakdown(self) -> Vec<ComponentBreakdown> {
        let mut breakdown: Vec<ComponentBreakdown> = self
            .groups
            .into_iter()
            .map(|(name, total, count)| ComponentBreakdown {
                name,
                total,
                count,
                average: if count > 0 { total / count as f64 } else { 0.0 },
            })
            .collect();
        breakdown.sort_by(|a, b| b.total.total_cmp(&a.total));
        breakdown
    }
}

/// Group earning and deduction lines across all results by name.
pub fn component_breakdown(results: &[PayrollCalculationResult]) -> BreakdownByKind {
    let mut earnings = Grouping::default();
    let mut deductions = Grouping::default();
    for result in results {
        earnings.add_employee(result.earnings.iter().map(|l| (l.name.as_str(), l.amount)));
        deductions.add_employee(result.deductions.iter().map(|l| (l.name.as_str(), l.amount)));
    }
    BreakdownByKind {
        earnings: earnings.into_breakdown(),
        deductions: deductions.into_breakdown(),
    }
}

/// Results ordered by net pay, highest first.  Ties keep input order.
pub fn rank_by_neto(results: &[PayrollCalculationResult]) -> Vec<&PayrollCalculationResult> {
    let mut ranked: Vec<&PayrollCalculationResult> = results.iter().collect();
    ranked.sort_by(|a, b| b.neto.total_cmp(&a.neto));
    ranked
}

fn payee(result: &PayrollCalculationResult) -> PayeeAmount {
    PayeeAmount {
        employee_id: result.employee_id.clone(),
        employee_name: result.employee_name.clone(),
        amount: result.neto,
    }
}

/// Summarise a set of results.
pub fn summarize(results: &[PayrollCalculationResult]) -> PayrollSummary {
    if results.is_empty() {
        return PayrollSummary::default();
    }

    let employee_count = results.len();
    let total_bruto: f64 = results.iter().map(|r| r.bruto).sum();
    let total_deductions: f64 = results.iter().map(|r| r.total_deductions).sum();
    let total_tax: f64 = results.iter().map(|r| r.tax).sum();
    let total_neto: f64 = results.iter().map(|r| r.neto).sum();
    let total_overtime: f64 = results.iter().map(|r| r.overtime_amount).sum();
    let total_working_days: f64 = results.iter().map(|r| r.working_days).sum();

    let ranked = rank_by_neto(results);
    let count = employee_count as f64;

    PayrollSummary {
        employee_count,
        total_bruto,
        total_deductions,
        total_tax,
        total_neto,
        total_overtime,
        average_bruto: total_bruto / count,
        average_neto: total_neto / count,
        average_working_days: total_working_days / count,
        highest_neto: ranked.first().map(|r| payee(r)),
        lowest_neto: ranked.last().map(|r| payee(r)),
        breakdown: component_breakdown(results),
    }
}
