//! Logging setup
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: filter directives (default: `hostexec=info`)
//! - `HOSTEXEC_LOG_FORMAT`: `json` or `pretty` (default: `pretty`)
//!
//! Logs always go to stderr; stdout carries command output only.

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const LOG_FORMAT_ENV: &str = "HOSTEXEC_LOG_FORMAT";
const DEFAULT_DIRECTIVE: &str = "hostexec=info";
const VERBOSE_DIRECTIVE: &str = "hostexec=debug";

pub fn init(verbose: bool) -> Result<()> {
    let log_format = std::env::var(LOG_FORMAT_ENV).unwrap_or_else(|_| "pretty".to_string());

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| {
            EnvFilter::try_new(if verbose {
                VERBOSE_DIRECTIVE
            } else {
                DEFAULT_DIRECTIVE
            })
        })
        .context("Failed to create env filter")?;

    match log_format.as_str() {
        "json" => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        _ => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().pretty().with_writer(std::io::stderr))
            .try_init(),
    }
    .context("Failed to install tracing subscriber")
}
