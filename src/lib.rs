//! Payroll Engine library crate.
//!
//! This crate exposes the payroll calculation engine for daily-wage
//! workers: pay component evaluation, overtime, per-employee
//! aggregation of earnings, tax and deductions, and a summary rollup.
//! External applications may depend on the `payroll_engine` crate and
//! call into `engine::run_payroll` directly or embed the API via
//! `api::build_router`.

pub mod api;
pub mod component;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod numeric;
pub mod overtime;
pub mod summary;
pub mod tax;
pub mod validation;

pub use config::{BrutoBasis, OvertimeMultipliers, PayrollConfig};
pub use engine::{calculate_employee_payroll, run_payroll, PayrollEngine};
pub use error::{PayrollError, Result};
pub use models::{
    Basis, ComponentKind, ComputationMethod, CustomComponent, Employee, EmployeeOverride,
    OvertimeInput, PayComponent, PayRunInput, PayRunResult, PayrollCalculationResult,
};
pub use summary::{summarize, PayrollSummary};
