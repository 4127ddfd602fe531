//! Error types for the Payroll Engine.
//!
//! The calculation itself never fails: malformed numeric input is
//! coerced to zero and overrides that reference unknown employees are
//! skipped.  Errors only arise at the edges, when loading
//! configuration or starting the HTTP server.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PayrollError {
    #[error("failed to read config file {path:?}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path:?}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid payroll configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid bind address `{0}`")]
    BindAddress(String),
}

pub type Result<T> = std::result::Result<T, PayrollError>;
