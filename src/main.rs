//! Entry point for the Payroll Engine binary.
//!
//! Running this binary starts an HTTP server that exposes the payroll
//! calculation as JSON.  The bind address is taken from the
//! `PAYROLL_BIND_ADDR` environment variable (default
//! `127.0.0.1:3000`).  If `PAYROLL_CONFIG` names a TOML file, it
//! provides the default tax rate and overtime settings.  Log output is
//! controlled with `RUST_LOG` and defaults to `info`.

use payroll_engine::config::ServerConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let server = ServerConfig::from_env()
        .inspect_err(|e| tracing::error!("Invalid server settings: {}", e))?;
    let config = server
        .payroll_config()
        .inspect_err(|e| tracing::error!("Failed to load payroll configuration: {}", e))?;
    tracing::info!(
        "Payroll configuration loaded: tax rate {}, overtime {:?}",
        config.tax_rate,
        config.overtime
    );

    payroll_engine::api::serve(server.bind_addr, config).await
}
