use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::error::ProbeError;

/// One round-trip time measurement in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct ProbeSample(f64);

impl ProbeSample {
    /// Returns `None` for negative or non-finite values.
    pub fn from_millis(rtt_ms: f64) -> Option<Self> {
        (rtt_ms.is_finite() && rtt_ms >= 0.0).then_some(Self(rtt_ms))
    }

    pub fn millis(self) -> f64 {
        self.0
    }
}

/// Why a probe produced no samples.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProbeFailure {
    Unreachable { exit_code: Option<i32> },
    Timeout { after_secs: f64 },
    NoSamplesParsed,
    Spawn { message: String },
    InvalidHost,
}

impl fmt::Display for ProbeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeFailure::Unreachable { .. } => write!(f, "Host unreachable"),
            ProbeFailure::Timeout { after_secs } => write!(f, "Timeout after {after_secs}s"),
            ProbeFailure::NoSamplesParsed => write!(f, "No packets received"),
            ProbeFailure::Spawn { message } => write!(f, "Failed to run ping: {message}"),
            ProbeFailure::InvalidHost => write!(f, "Invalid host name"),
        }
    }
}

impl From<ProbeError> for ProbeFailure {
    fn from(err: ProbeError) -> Self {
        match err {
            ProbeError::Unreachable { exit_code } => ProbeFailure::Unreachable { exit_code },
            ProbeError::Timeout { after } => ProbeFailure::Timeout {
                after_secs: after.as_secs_f64(),
            },
            ProbeError::Spawn(e) => ProbeFailure::Spawn {
                message: e.to_string(),
            },
            ProbeError::InvalidHost(_) => ProbeFailure::InvalidHost,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProbeOutcome {
    /// Always holds at least one sample, in reply arrival order.
    Success { samples: Vec<ProbeSample> },
    Failed { reason: ProbeFailure },
}

/// Outcome of probing one (host, packet size) pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeResult {
    pub host: String,
    pub resolved_ip: String,
    pub packet_size: u32,
    pub packets_sent: u32,
    pub outcome: ProbeOutcome,
}

impl ProbeResult {
    /// Builds a result from parsed samples. An empty sample list becomes a
    /// failure with [`ProbeFailure::NoSamplesParsed`].
    pub fn from_samples(
        host: impl Into<String>,
        resolved_ip: Option<String>,
        packet_size: u32,
        packets_sent: u32,
        samples: Vec<ProbeSample>,
    ) -> Self {
        let host = host.into();
        let outcome = if samples.is_empty() {
            ProbeOutcome::Failed {
                reason: ProbeFailure::NoSamplesParsed,
            }
        } else {
            ProbeOutcome::Success { samples }
        };
        Self {
            resolved_ip: resolved_ip.unwrap_or_else(|| host.clone()),
            host,
            packet_size,
            packets_sent,
            outcome,
        }
    }

    pub fn failure(
        host: impl Into<String>,
        packet_size: u32,
        packets_sent: u32,
        reason: ProbeFailure,
    ) -> Self {
        let host = host.into();
        Self {
            resolved_ip: host.clone(),
            host,
            packet_size,
            packets_sent,
            outcome: ProbeOutcome::Failed { reason },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, ProbeOutcome::Success { .. })
    }

    /// Empty for failed results.
    pub fn samples(&self) -> &[ProbeSample] {
        match &self.outcome {
            ProbeOutcome::Success { samples } => samples,
            ProbeOutcome::Failed { .. } => &[],
        }
    }

    pub fn failure_reason(&self) -> Option<&ProbeFailure> {
        match &self.outcome {
            ProbeOutcome::Success { .. } => None,
            ProbeOutcome::Failed { reason } => Some(reason),
        }
    }

    /// Requested probes without a matching reply line.
    ///
    /// This is an estimate: replies are counted, not matched by sequence
    /// number, so a reply whose time field failed to parse counts as lost.
    pub fn packets_lost(&self) -> u32 {
        let received = u32::try_from(self.samples().len()).unwrap_or(u32::MAX);
        self.packets_sent.saturating_sub(received)
    }
}

/// Parameters for one probe run.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeRequest {
    pub host: String,
    pub packet_size: u32,
    pub count: u32,
    pub timeout: Duration,
    pub kill_after: Duration,
}

/// Raw output of a probe run that exited successfully.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeOutput {
    pub stdout: String,
}
