//! Payroll computation engine.
//!
//! The `engine` module turns an employee, its [`EmployeeOverride`] and
//! the component catalog into a [`PayrollCalculationResult`], and a
//! whole [`PayRunInput`] into a [`PayRunResult`].  Employees do not
//! interact, so a run evaluates them in parallel with [`rayon`] and
//! then reduces the results into a summary sequentially.
//!
//! Earnings are evaluated in a fixed order: base pay, overtime,
//! default allowances (when enabled), catalog earnings in selection
//! order, then ad-hoc earnings.  The order matters for percentage
//! components on the `BRUTO` basis; see [`BrutoBasis`].  Tax is
//! computed on the taxable earnings, and deductions are evaluated
//! last against the final gross.

use crate::component::compute_component_amount;
use crate::config::{BrutoBasis, PayrollConfig};
use crate::models::{
    ComponentKind, DeductionLine, EarningLine, Employee, EmployeeOverride, LineSource, PayBasis,
    PayComponent, PayRunInput, PayRunResult, PayrollCalculationResult,
};
use crate::numeric::non_negative;
use crate::overtime::compute_overtime_amount;
use crate::summary::summarize;
use crate::tax::{FlatRateTax, TaxCalculator};
use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;

pub const BASE_PAY_LINE: &str = "Upah Pokok";
pub const OVERTIME_LINE: &str = "Lembur";
pub const MEAL_ALLOWANCE_LINE: &str = "Uang Makan";
pub const FUEL_ALLOWANCE_LINE: &str = "Uang BBM";
pub const CASHBON_LINE: &str = "Cashbon";

/// Active catalog components indexed by ID.  When IDs repeat, the
/// first component wins.
struct ActiveCatalog<'a> {
    by_id: HashMap<&'a str, &'a PayComponent>,
}

impl<'a> ActiveCatalog<'a> {
    fn new(catalog: &'a [PayComponent]) -> Self {
        let mut by_id = HashMap::new();
        for component in catalog.iter().filter(|c| c.active) {
            by_id.entry(component.id.as_str()).or_insert(component);
        }
        Self { by_id }
    }

    /// The override's selected components that exist and are active,
    /// in selection order.
    fn selected(&self, override_: &EmployeeOverride) -> Vec<&'a PayComponent> {
        override_
            .selected_component_ids()
            .into_iter()
            .filter_map(|id| self.by_id.get(id).copied())
            .collect()
    }
}

fn builtin_earning(name: &str, amount: f64) -> EarningLine {
    EarningLine {
        name: name.to_string(),
        amount,
        taxable: true,
        source: LineSource::Builtin,
        component_id: None,
    }
}

fn catalog_earning(component: &PayComponent, amount: f64) -> EarningLine {
    EarningLine {
        name: component.name.clone(),
        amount,
        taxable: component.taxable,
        source: LineSource::Catalog,
        component_id: Some(component.id.clone()),
    }
}

fn earnings_total(earnings: &[EarningLine]) -> f64 {
    earnings.iter().map(|line| line.amount).sum()
}

/// Calculates payroll with a fixed configuration and tax calculator.
#[derive(Clone)]
pub struct PayrollEngine {
    config: PayrollConfig,
    tax: Arc<dyn TaxCalculator>,
}

impl std::fmt::Debug for PayrollEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PayrollEngine")
            .field("config", &self.config)
            .field("tax_rate", &self.tax.rate())
            .finish()
    }
}

impl PayrollEngine {
    /// Build an engine that taxes at the configuration's flat rate.
    pub fn new(config: PayrollConfig) -> Self {
        let tax = Arc::new(FlatRateTax::new(config.tax_rate));
        Self { config, tax }
    }

    /// Replace the tax calculator.
    pub fn with_tax_calculator(mut self, tax: Arc<dyn TaxCalculator>) -> Self {
        self.tax = tax;
        self
    }

    pub fn config(&self) -> &PayrollConfig {
        &self.config
    }

    /// Calculate payroll for a single employee.
    pub fn calculate_employee(
        &self,
        employee: &Employee,
        override_: &EmployeeOverride,
        catalog: &[PayComponent],
    ) -> PayrollCalculationResult {
        self.calculate_with(employee, override_, &ActiveCatalog::new(catalog))
    }

    fn calculate_with(
        &self,
        employee: &Employee,
        override_: &EmployeeOverride,
        catalog: &ActiveCatalog<'_>,
    ) -> PayrollCalculationResult {
        let basis = PayBasis::resolve(employee, override_, &self.config);
        let selected = catalog.selected(override_);

        let mut earnings = Vec::new();
        let base_pay = basis.base_pay();
        earnings.push(builtin_earning(BASE_PAY_LINE, base_pay));

        let overtime_amount = compute_overtime_amount(override_, &basis, &self.config);
        if overtime_amount > 0.0 {
            earnings.push(builtin_earning(OVERTIME_LINE, overtime_amount));
        }

        if self.config.include_default_allowances {
            let meal = non_negative(employee.default_meal_allowance) * basis.working_days;
            if meal > 0.0 {
                earnings.push(builtin_earning(MEAL_ALLOWANCE_LINE, meal));
            }
            let fuel = non_negative(employee.default_fuel_allowance) * basis.working_days;
            if fuel > 0.0 {
                earnings.push(builtin_earning(FUEL_ALLOWANCE_LINE, fuel));
            }
        }

        let custom_earnings: Vec<EarningLine> = override_
            .custom_components
            .iter()
            .filter(|c| c.kind == ComponentKind::Earning && c.is_applicable())
            .map(|c| EarningLine {
                name: c.name.clone(),
                amount: c.amount,
                taxable: c.taxable,
                source: LineSource::Adhoc,
                component_id: None,
            })
            .collect();

        let catalog_earnings: Vec<&PayComponent> = selected
            .iter()
            .copied()
            .filter(|c| c.kind == ComponentKind::Earning)
            .collect();
        self.push_catalog_earnings(
            &mut earnings,
            &catalog_earnings,
            &basis,
            earnings_total(&custom_earnings),
        );
        earnings.extend(custom_earnings);

        let bruto = earnings_total(&earnings);
        let taxable_base: f64 = earnings
            .iter()
            .filter(|line| line.taxable)
            .map(|line| line.amount)
            .sum();
        let tax = self.tax.calculate(taxable_base);

        let mut deductions = Vec::new();
        let cashbon = non_negative(override_.cashbon);
        if cashbon > 0.0 {
            deductions.push(DeductionLine {
                name: CASHBON_LINE.to_string(),
                amount: cashbon,
                source: LineSource::Builtin,
                component_id: None,
            });
        }
        for component in selected.iter().filter(|c| c.kind == ComponentKind::Deduction) {
            let amount = compute_component_amount(component, &basis, bruto);
            if amount > 0.0 {
                deductions.push(DeductionLine {
                    name: component.name.clone(),
                    amount,
                    source: LineSource::Catalog,
                    component_id: Some(component.id.clone()),
                });
            }
        }
        for custom in override_
            .custom_components
            .iter()
            .filter(|c| c.kind == ComponentKind::Deduction && c.is_applicable())
        {
            deductions.push(DeductionLine {
                name: custom.name.clone(),
                amount: custom.amount,
                source: LineSource::Adhoc,
                component_id: None,
            });
        }

        let total_deductions: f64 = deductions.iter().map(|line| line.amount).sum();
        let neto = bruto - total_deductions - tax;

        tracing::debug!(
            "Calculated payroll for {}: bruto {}, tax {}, deductions {}, neto {}",
            employee.id,
            bruto,
            tax,
            total_deductions,
            neto
        );

        PayrollCalculationResult {
            employee_id: employee.id.clone(),
            employee_name: employee.name.clone(),
            working_days: basis.working_days,
            daily_wage: basis.daily_wage,
            base_pay,
            overtime_amount,
            earnings,
            deductions,
            bruto,
            taxable_base,
            tax_rate: self.tax.rate(),
            tax,
            total_deductions,
            neto,
        }
    }

    /// Append the selected catalog earnings.  `custom_total` is the sum
    /// of the ad-hoc earnings that will follow; it only counts towards
    /// the gross seen under [`BrutoBasis::Final`].
    fn push_catalog_earnings(
        &self,
        earnings: &mut Vec<EarningLine>,
        components: &[&PayComponent],
        basis: &PayBasis,
        custom_total: f64,
    ) {
        match self.config.bruto_basis {
            BrutoBasis::Running => {
                let mut running = earnings_total(earnings);
                for component in components {
                    let amount = compute_component_amount(component, basis, running);
                    if amount > 0.0 {
                        running += amount;
                        earnings.push(catalog_earning(component, amount));
                    }
                }
            }
            BrutoBasis::Final => {
                let fixed: Vec<Option<f64>> = components
                    .iter()
                    .map(|c| {
                        (!c.method.is_gross_percentage())
                            .then(|| compute_component_amount(c, basis, 0.0))
                    })
                    .collect();
                let gross = earnings_total(earnings)
                    + fixed.iter().flatten().filter(|a| **a > 0.0).sum::<f64>()
                    + custom_total;
                for (component, fixed) in components.iter().zip(fixed) {
                    let amount =
                        fixed.unwrap_or_else(|| compute_component_amount(component, basis, gross));
                    if amount > 0.0 {
                        earnings.push(catalog_earning(component, amount));
                    }
                }
            }
        }
    }

    /// Run payroll for every override in `input`.
    ///
    /// Overrides whose employee is not in `input.employees` are skipped
    /// and reported in [`PayRunResult::skipped`]; they never abort the
    /// batch.  Results keep the order of the overrides.
    pub fn run(&self, input: &PayRunInput) -> PayRunResult {
        tracing::info!(
            "Starting payroll run: {} employees, {} components, {} overrides",
            input.employees.len(),
            input.components.len(),
            input.overrides.len()
        );
        let start_time = std::time::Instant::now();

        let mut employees: HashMap<&str, &Employee> = HashMap::new();
        for employee in &input.employees {
            employees.entry(employee.id.as_str()).or_insert(employee);
        }
        let catalog = ActiveCatalog::new(&input.components);

        let outcomes: Vec<Result<PayrollCalculationResult, String>> = input
            .overrides
            .par_iter()
            .map(|override_| match employees.get(override_.employee_id.as_str()) {
                Some(employee) => Ok(self.calculate_with(employee, override_, &catalog)),
                None => {
                    tracing::warn!(
                        "Skipping override for unknown employee {}",
                        override_.employee_id
                    );
                    Err(override_.employee_id.clone())
                }
            })
            .collect();

        let mut results = Vec::with_capacity(outcomes.len());
        let mut skipped = Vec::new();
        for outcome in outcomes {
            match outcome {
                Ok(result) => results.push(result),
                Err(employee_id) => skipped.push(employee_id),
            }
        }

        let summary = summarize(&results);
        tracing::info!(
            "Payroll run complete in {:?}: {} calculated, {} skipped, total neto {}",
            start_time.elapsed(),
            results.len(),
            skipped.len(),
            summary.total_neto
        );

        PayRunResult {
            period: input.period.clone(),
            results,
            skipped,
            summary,
        }
    }
}

/// Calculate payroll for one employee with a flat-rate tax taken from
/// `config`.
pub fn calculate_employee_payroll(
    employee: &Employee,
    override_: &EmployeeOverride,
    catalog: &[PayComponent],
    config: &PayrollConfig,
) -> PayrollCalculationResult {
    PayrollEngine::new(config.clone()).calculate_employee(employee, override_, catalog)
}

/// Run a whole payroll batch with a flat-rate tax taken from `config`.
pub fn run_payroll(input: &PayRunInput, config: &PayrollConfig) -> PayRunResult {
    PayrollEngine::new(config.clone()).run(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Basis, ComputationMethod, CustomComponent, OvertimeInput};

    fn budi() -> Employee {
        Employee::new("emp-1", "Budi", 200_000.0).with_position("Operator", "Pit A")
    }

    fn base_override() -> EmployeeOverride {
        EmployeeOverride::new("emp-1").with_working_days(22.0)
    }

    fn ten_percent_of_gross() -> PayComponent {
        PayComponent::earning(
            "bonus-bruto",
            "Bonus Produksi",
            ComputationMethod::Percentage {
                rate: 10.0,
                basis: Basis::Gross,
            },
        )
    }

    fn flat_earning(id: &str, amount: f64) -> PayComponent {
        PayComponent::earning(id, id, ComputationMethod::Flat { nominal: amount })
    }

    #[test]
    fn test_base_pay_only() {
        let result =
            calculate_employee_payroll(&budi(), &base_override(), &[], &PayrollConfig::default());

        assert_eq!(result.base_pay, 4_400_000.0);
        assert_eq!(result.bruto, 4_400_000.0);
        assert_eq!(result.taxable_base, 4_400_000.0);
        assert_eq!(result.tax, 0.0);
        assert_eq!(result.neto, 4_400_000.0);
        assert_eq!(result.earnings.len(), 1);
        assert_eq!(result.earnings[0].name, BASE_PAY_LINE);
        assert!(result.earnings[0].taxable);
        assert!(result.deductions.is_empty());
    }

    #[test]
    fn test_overtime_line_follows_base_pay() {
        let override_ = base_override().with_overtime(OvertimeInput {
            normal_hours: 2.0,
            ..OvertimeInput::default()
        });
        let result = calculate_employee_payroll(&budi(), &override_, &[], &PayrollConfig::default());

        assert_eq!(result.overtime_amount, 75_000.0);
        assert_eq!(result.earnings[1].name, OVERTIME_LINE);
        assert!(result.earnings[1].taxable);
        assert_eq!(result.bruto, 4_475_000.0);
    }

    #[test]
    fn test_only_selected_active_components_apply() {
        let catalog = vec![
            flat_earning("a", 100_000.0),
            flat_earning("b", 200_000.0).with_active(false),
            flat_earning("c", 300_000.0),
        ];
        let override_ = base_override()
            .with_standard_components(["a", "b"])
            .with_additional_components(["missing"]);
        let result = calculate_employee_payroll(&budi(), &override_, &catalog, &PayrollConfig::default());

        let names: Vec<&str> = result.earnings.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec![BASE_PAY_LINE, "a"]);
        assert_eq!(result.bruto, 4_500_000.0);
    }

    #[test]
    fn test_component_selected_twice_counts_once() {
        let catalog = vec![flat_earning("a", 100_000.0)];
        let override_ = base_override()
            .with_standard_components(["a"])
            .with_additional_components(["a"]);
        let result = calculate_employee_payroll(&budi(), &override_, &catalog, &PayrollConfig::default());
        assert_eq!(result.bruto, 4_500_000.0);
    }

    #[test]
    fn test_running_gross_depends_on_selection_order() {
        let catalog = vec![ten_percent_of_gross(), flat_earning("flat", 100_000.0)];
        let config = PayrollConfig::default();

        let first = base_override().with_standard_components(["bonus-bruto", "flat"]);
        let first = calculate_employee_payroll(&budi(), &first, &catalog, &config);
        // 10% of base pay alone
        assert_eq!(first.earnings[1].amount, 440_000.0);
        assert_eq!(first.bruto, 4_940_000.0);

        let second = base_override().with_standard_components(["flat", "bonus-bruto"]);
        let second = calculate_employee_payroll(&budi(), &second, &catalog, &config);
        // 10% of base pay plus the flat earning
        assert_eq!(second.earnings[2].amount, 450_000.0);
        assert_eq!(second.bruto, 4_950_000.0);

        assert_ne!(first.bruto, second.bruto);
    }

    #[test]
    fn test_final_gross_is_order_independent() {
        let catalog = vec![ten_percent_of_gross(), flat_earning("flat", 100_000.0)];
        let config = PayrollConfig::default().with_bruto_basis(BrutoBasis::Final);

        for order in [["bonus-bruto", "flat"], ["flat", "bonus-bruto"]] {
            let override_ = base_override()
                .with_standard_components(order)
                .with_custom_component(CustomComponent::earning("Insentif", 50_000.0, true));
            let result = calculate_employee_payroll(&budi(), &override_, &catalog, &config);
            let bonus = result
                .earnings
                .iter()
                .find(|l| l.component_id.as_deref() == Some("bonus-bruto"))
                .unwrap();
            // 10% of 4,400,000 + 100,000 + 50,000
            assert_eq!(bonus.amount, 455_000.0);
            assert_eq!(result.bruto, 5_005_000.0);
        }
    }

    #[test]
    fn test_bruto_is_order_invariant_without_gross_percentages() {
        let catalog = vec![
            flat_earning("a", 100_000.0),
            PayComponent::earning(
                "b",
                "b",
                ComputationMethod::Percentage {
                    rate: 10.0,
                    basis: Basis::DailyWage,
                },
            ),
            PayComponent::earning("c", "c", ComputationMethod::PerDay { rate: 15_000.0 }),
        ];
        let config = PayrollConfig::default();
        let forward = base_override().with_standard_components(["a", "b", "c"]);
        let backward = base_override().with_standard_components(["c", "b", "a"]);

        let forward = calculate_employee_payroll(&budi(), &forward, &catalog, &config);
        let backward = calculate_employee_payroll(&budi(), &backward, &catalog, &config);
        assert_eq!(forward.bruto, backward.bruto);
        assert_eq!(forward.bruto, 4_400_000.0 + 100_000.0 + 20_000.0 + 330_000.0);
    }

    #[test]
    fn test_tax_applies_to_taxable_lines_only() {
        let catalog = vec![
            flat_earning("transport", 100_000.0),
            flat_earning("premi", 200_000.0).with_taxable(true),
        ];
        let override_ = base_override()
            .with_standard_components(["transport", "premi"])
            .with_custom_component(CustomComponent::earning("Bonus", 300_000.0, false));
        let config = PayrollConfig::default().with_tax_rate(0.05);
        let result = calculate_employee_payroll(&budi(), &override_, &catalog, &config);

        assert_eq!(result.bruto, 5_000_000.0);
        assert_eq!(result.taxable_base, 4_600_000.0);
        assert_eq!(result.tax_rate, 0.05);
        assert_eq!(result.tax, 230_000.0);
        assert_eq!(result.neto, 4_770_000.0);
    }

    #[test]
    fn test_deductions_in_order_and_against_final_gross() {
        let catalog = vec![
            flat_earning("premi", 600_000.0),
            PayComponent::deduction(
                "bpjs",
                "BPJS",
                ComputationMethod::Percentage {
                    rate: 1.0,
                    basis: Basis::Gross,
                },
            ),
            PayComponent::deduction("zero", "Zero", ComputationMethod::Flat { nominal: 0.0 }),
        ];
        let override_ = base_override()
            .with_cashbon(100_000.0)
            .with_standard_components(["premi"])
            .with_additional_components(["bpjs", "zero"])
            .with_custom_component(CustomComponent::deduction("Denda APD", 25_000.0))
            .with_custom_component(CustomComponent::deduction("", 99_000.0));
        let result = calculate_employee_payroll(&budi(), &override_, &catalog, &PayrollConfig::default());

        let names: Vec<&str> = result.deductions.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec![CASHBON_LINE, "BPJS", "Denda APD"]);
        // 1% of 5,000,000
        assert_eq!(result.deductions[1].amount, 50_000.0);
        assert_eq!(result.total_deductions, 175_000.0);
        assert_eq!(result.neto, 5_000_000.0 - 175_000.0);
    }

    #[test]
    fn test_default_allowances() {
        let employee = budi().with_allowances(20_000.0, 15_000.0);
        let catalog = vec![ten_percent_of_gross()];
        let override_ = base_override().with_standard_components(["bonus-bruto"]);

        let result = calculate_employee_payroll(&employee, &override_, &catalog, &PayrollConfig::default());
        assert_eq!(result.bruto, 4_840_000.0);

        let config = PayrollConfig::default().with_default_allowances(true);
        let result = calculate_employee_payroll(&employee, &override_, &catalog, &config);
        let names: Vec<&str> = result.earnings.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(
            names,
            vec![BASE_PAY_LINE, MEAL_ALLOWANCE_LINE, FUEL_ALLOWANCE_LINE, "Bonus Produksi"]
        );
        // 4,400,000 + 440,000 + 330,000, then 10% on top
        assert_eq!(result.earnings[3].amount, 517_000.0);
        assert_eq!(result.bruto, 5_687_000.0);
    }

    #[test]
    fn test_custom_daily_rate_replaces_contract_wage() {
        let override_ = base_override()
            .with_custom_daily_rate(250_000.0)
            .with_overtime(OvertimeInput {
                holiday_hours: 4.0,
                ..OvertimeInput::default()
            });
        let result = calculate_employee_payroll(&budi(), &override_, &[], &PayrollConfig::default());
        assert_eq!(result.daily_wage, 250_000.0);
        assert_eq!(result.base_pay, 5_500_000.0);
        assert_eq!(result.overtime_amount, 250_000.0);
    }

    #[test]
    fn test_calculation_is_deterministic() {
        let catalog = vec![ten_percent_of_gross(), flat_earning("flat", 100_000.0)];
        let override_ = base_override()
            .with_standard_components(["flat", "bonus-bruto"])
            .with_cashbon(10_000.0);
        let config = PayrollConfig::default().with_tax_rate(0.05);
        let first = calculate_employee_payroll(&budi(), &override_, &catalog, &config);
        let second = calculate_employee_payroll(&budi(), &override_, &catalog, &config);
        assert_eq!(first, second);
        assert_eq!(first.neto.to_bits(), second.neto.to_bits());
    }

    struct ThresholdTax;

    impl TaxCalculator for ThresholdTax {
        fn rate(&self) -> f64 {
            0.1
        }

        fn calculate(&self, taxable_base: f64) -> f64 {
            ((taxable_base - 4_000_000.0).max(0.0) * 0.1).round()
        }
    }

    #[test]
    fn test_custom_tax_calculator() {
        let engine = PayrollEngine::new(PayrollConfig::default()).with_tax_calculator(Arc::new(ThresholdTax));
        let result = engine.calculate_employee(&budi(), &base_override(), &[]);
        assert_eq!(result.tax, 40_000.0);
        assert_eq!(result.tax_rate, 0.1);
        assert_eq!(result.neto, 4_360_000.0);
    }

    #[test]
    fn test_run_skips_unknown_employees_and_keeps_order() {
        let input = PayRunInput {
            employees: vec![
                budi(),
                Employee::new("emp-2", "Sari", 150_000.0),
            ],
            components: vec![],
            overrides: vec![
                EmployeeOverride::new("emp-2").with_working_days(20.0),
                EmployeeOverride::new("ghost").with_working_days(20.0),
                base_override(),
            ],
            period: None,
        };
        let run = run_payroll(&input, &PayrollConfig::default());

        let ids: Vec<&str> = run.results.iter().map(|r| r.employee_id.as_str()).collect();
        assert_eq!(ids, vec!["emp-2", "emp-1"]);
        assert_eq!(run.skipped, vec!["ghost".to_string()]);
        assert_eq!(run.summary.employee_count, 2);
        assert_eq!(run.summary.total_bruto, 3_000_000.0 + 4_400_000.0);
    }
}
