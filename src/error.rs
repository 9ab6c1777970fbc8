//! Error types for probing, analysis and configuration.
//!
//! Probe errors never abort a run: the runner folds them into a failed
//! [`ProbeResult`](crate::ping::ProbeResult). Analysis errors split into
//! [`AnalysisError::EmptyResultSet`], which is an expected per-host outcome,
//! and [`AnalysisError::InvalidState`], which means a caller broke a contract.

use std::time::Duration;

use thiserror::Error;

/// Failure of a single probe run (one host, one packet size).
#[derive(Debug, Error)]
pub enum ProbeError {
    /// `ping` exited non-zero.
    #[error("host unreachable (exit code {})", .exit_code.map_or("unknown".to_string(), |c| c.to_string()))]
    Unreachable { exit_code: Option<i32> },

    /// `ping` did not finish within its timeout plus grace period.
    #[error("probe timed out after {}s", .after.as_secs_f64())]
    Timeout { after: Duration },

    /// The `ping` process could not be started.
    #[error("failed to run ping: {0}")]
    Spawn(#[from] std::io::Error),

    /// Host name was empty after sanitizing.
    #[error("invalid host name: {0:?}")]
    InvalidHost(String),
}

/// Errors raised by the metrics, aggregation and ranking stages.
#[derive(Debug, Error, PartialEq)]
pub enum AnalysisError {
    /// Every packet size failed for this host.
    #[error("no successful results for {host}")]
    EmptyResultSet { host: String },

    /// A caller violated a precondition, e.g. metrics on a failed result.
    #[error("invalid state: {0}")]
    InvalidState(String),
}

/// Errors loading or validating [`AppConfig`](crate::config::AppConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not parse config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
