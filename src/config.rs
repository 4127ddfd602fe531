//! Configuration for payroll runs and the HTTP server.
//!
//! [`PayrollConfig`] is passed explicitly into every calculation; the
//! engine reads no ambient state.  It can be built in code with the
//! `with_*` builder methods, loaded from a TOML file, or supplied per
//! request through the HTTP API.

use crate::error::{PayrollError, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Extra multiplier applied on top of the night multiplier for every
/// night-shift hour after the first.
pub const NIGHT_ADDITIONAL_STEP: f64 = 0.25;

/// Multipliers applied to the hourly rate for each overtime tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OvertimeMultipliers {
    pub normal: f64,
    pub holiday: f64,
    pub night: f64,
}

impl OvertimeMultipliers {
    /// Multiplier for night-shift hours after the first.
    pub fn night_additional(&self) -> f64 {
        self.night + NIGHT_ADDITIONAL_STEP
    }
}

impl Default for OvertimeMultipliers {
    fn default() -> Self {
        Self {
            normal: 1.5,
            holiday: 2.0,
            night: 1.25,
        }
    }
}

/// How percentage components on the `BRUTO` basis see gross pay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrutoBasis {
    /// Gross accumulated up to the component's position in the
    /// evaluation order (base pay, overtime, allowances, then catalog
    /// earnings in selection order).
    #[default]
    Running,
    /// Gross of every earning that is not itself a `BRUTO`-basis
    /// percentage, so the result does not depend on selection order.
    Final,
}

/// Settings for a payroll calculation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PayrollConfig {
    /// Tax rate applied to the taxable base, as a fraction
    /// (`0.05` = 5%).
    pub tax_rate: f64,
    /// When false, overtime is always zero.
    pub overtime_enabled: bool,
    pub overtime: OvertimeMultipliers,
    /// Hours in a working day; the hourly rate is the daily wage
    /// divided by this.
    pub hours_per_day: f64,
    /// Working days used when an override does not specify any.
    pub default_working_days: f64,
    /// Add the employee's default meal and fuel allowances as earning
    /// lines.
    pub include_default_allowances: bool,
    pub bruto_basis: BrutoBasis,
}

impl Default for PayrollConfig {
    fn default() -> Self {
        Self {
            tax_rate: 0.0,
            overtime_enabled: true,
            overtime: OvertimeMultipliers::default(),
            hours_per_day: 8.0,
            default_working_days: 22.0,
            include_default_allowances: false,
            bruto_basis: BrutoBasis::Running,
        }
    }
}

impl PayrollConfig {
    pub fn with_tax_rate(mut self, rate: f64) -> Self {
        self.tax_rate = rate;
        self
    }

    pub fn with_overtime_multipliers(mut self, multipliers: OvertimeMultipliers) -> Self {
        self.overtime = multipliers;
        self
    }

    pub fn with_overtime_enabled(mut self, enabled: bool) -> Self {
        self.overtime_enabled = enabled;
        self
    }

    pub fn with_default_working_days(mut self, days: f64) -> Self {
        self.default_working_days = days;
        self
    }

    pub fn with_default_allowances(mut self, include: bool) -> Self {
        self.include_default_allowances = include;
        self
    }

    pub fn with_bruto_basis(mut self, basis: BrutoBasis) -> Self {
        self.bruto_basis = basis;
        self
    }

    /// Check that the numeric settings are usable.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.tax_rate) {
            return Err(PayrollError::InvalidConfig(format!(
                "taxRate must be a fraction between 0 and 1, got {}",
                self.tax_rate
            )));
        }
        if !(self.hours_per_day > 0.0) {
            return Err(PayrollError::InvalidConfig(format!(
                "hoursPerDay must be positive, got {}",
                self.hours_per_day
            )));
        }
        if self.default_working_days < 0.0 {
            return Err(PayrollError::InvalidConfig(format!(
                "defaultWorkingDays must not be negative, got {}",
                self.default_working_days
            )));
        }
        let m = &self.overtime;
        if [m.normal, m.holiday, m.night].iter().any(|v| !(*v >= 0.0)) {
            return Err(PayrollError::InvalidConfig(
                "overtime multipliers must not be negative".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse and validate a configuration from TOML text.
    pub fn from_toml_str(contents: &str, path: &Path) -> Result<Self> {
        let config: PayrollConfig =
            toml::from_str(contents).map_err(|source| PayrollError::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a TOML file.  Keys that are absent keep
    /// their default value.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!("Loading payroll configuration from {:?}", path);
        let contents = std::fs::read_to_string(path).map_err(|source| PayrollError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents, path)
    }
}

/// Settings for the HTTP server binary, read from the environment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Optional TOML file holding the default [`PayrollConfig`].
    pub config_path: Option<PathBuf>,
}

impl ServerConfig {
    pub const BIND_ADDR_VAR: &'static str = "PAYROLL_BIND_ADDR";
    pub const CONFIG_PATH_VAR: &'static str = "PAYROLL_CONFIG";
    pub const DEFAULT_BIND_ADDR: &'static str = "127.0.0.1:3000";

    pub fn from_env() -> Result<Self> {
        let addr = std::env::var(Self::BIND_ADDR_VAR)
            .unwrap_or_else(|_| Self::DEFAULT_BIND_ADDR.to_string());
        let config_path = std::env::var_os(Self::CONFIG_PATH_VAR).map(PathBuf::from);
        Self::from_parts(&addr, config_path)
    }

    pub fn from_parts(addr: &str, config_path: Option<PathBuf>) -> Result<Self> {
        let bind_addr = addr
            .parse::<SocketAddr>()
            .map_err(|_| PayrollError::BindAddress(addr.to_string()))?;
        Ok(Self {
            bind_addr,
            config_path,
        })
    }

    /// Load the payroll configuration named by `config_path`, or the
    /// defaults when none is set.
    pub fn payroll_config(&self) -> Result<PayrollConfig> {
        match &self.config_path {
            Some(path) => PayrollConfig::load(path),
            None => Ok(PayrollConfig::default()),
        }
    }
}
