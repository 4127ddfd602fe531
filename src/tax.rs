//! Tax calculation.
//!
//! The `tax` module defines the [`TaxCalculator`] trait used by the
//! engine to turn an employee's taxable base into a tax amount.  The
//! default implementation, [`FlatRateTax`], applies the rate carried
//! by [`PayrollConfig`](crate::config::PayrollConfig).  Other regimes
//! (brackets, non-taxable thresholds) can be plugged into
//! [`PayrollEngine`](crate::engine::PayrollEngine) without touching the
//! aggregation logic.

use crate::numeric::finite_or_zero;

/// Determines how much tax to withhold from a taxable base.
///
/// Tax calculators must be thread-safe (`Send + Sync`) because the
/// engine evaluates employees concurrently.
pub trait TaxCalculator: Send + Sync {
    /// The effective rate reported on the result, as a fraction.
    fn rate(&self) -> f64;

    /// Tax owed on `taxable_base` for one pay period.
    fn calculate(&self, taxable_base: f64) -> f64;
}

/// A single rate applied to the whole taxable base.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatRateTax {
    rate: f64,
}

impl FlatRateTax {
    pub fn new(rate: f64) -> Self {
        Self {
            rate: finite_or_zero(rate),
        }
    }
}

impl TaxCalculator for FlatRateTax {
    fn rate(&self) -> f64 {
        self.rate
    }

    fn calculate(&self, taxable_base: f64) -> f64 {
        taxable_base * self.rate
    }
}
