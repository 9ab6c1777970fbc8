//! Compare reachability and latency quality of network hosts.
//!
//! Each host is pinged with a sweep of payload sizes. The raw `ping` output
//! is parsed into RTT samples, turned into per-size metrics and a quality
//! label, summarized per host, and finally ranked across hosts.

pub mod config;
pub mod error;
pub mod menu;
pub mod metrics;
pub mod parser;
pub mod ping;
pub mod ping_executor;
pub mod quality;
pub mod ranking;
pub mod report;
pub mod runner;
pub mod summary;

pub use config::AppConfig;
pub use error::{AnalysisError, ConfigError, ProbeError};
pub use metrics::Metrics;
pub use ping::{ProbeFailure, ProbeOutcome, ProbeOutput, ProbeRequest, ProbeResult, ProbeSample};
pub use ping_executor::{Prober, SystemPing};
pub use quality::{Grade, Quality};
pub use ranking::{ComparisonEntry, Ranking};
pub use runner::{HostReport, HostStatus, RunConfig, RunEvent, RunReport, Runner};
pub use summary::{HostSummary, MeasuredResult};
