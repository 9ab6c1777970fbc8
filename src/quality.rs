use std::fmt;

use serde::Serialize;

const LOSS_THRESHOLD: u32 = 2;
const POOR_LATENCY_MS: f64 = 200.0;
const FAIR_LATENCY_MS: f64 = 100.0;
const FAIR_JITTER_MS: f64 = 30.0;
const EXCELLENT_LATENCY_MS: f64 = 30.0;
const EXCELLENT_JITTER_MS: f64 = 10.0;

/// Coarse quality bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Grade {
    Excellent,
    Good,
    Fair,
    Poor,
}

/// Quality label for one probe run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Quality {
    PoorPacketLoss,
    PoorLatency,
    FairLatency,
    FairJitter,
    Excellent,
    Good,
}

impl Quality {
    /// Applies the rules in priority order; the first match wins.
    pub fn classify(packets_lost: u32, average_rtt: f64, jitter: f64) -> Self {
        if packets_lost > LOSS_THRESHOLD {
            Quality::PoorPacketLoss
        } else if average_rtt > POOR_LATENCY_MS {
            Quality::PoorLatency
        } else if average_rtt > FAIR_LATENCY_MS {
            Quality::FairLatency
        } else if jitter > FAIR_JITTER_MS {
            Quality::FairJitter
        } else if average_rtt < EXCELLENT_LATENCY_MS && jitter < EXCELLENT_JITTER_MS {
            Quality::Excellent
        } else {
            Quality::Good
        }
    }

    pub fn grade(self) -> Grade {
        match self {
            Quality::PoorPacketLoss | Quality::PoorLatency => Grade::Poor,
            Quality::FairLatency | Quality::FairJitter => Grade::Fair,
            Quality::Excellent => Grade::Excellent,
            Quality::Good => Grade::Good,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Quality::PoorPacketLoss => "Poor: high packet loss",
            Quality::PoorLatency => "Poor: very high latency",
            Quality::FairLatency => "Fair: high latency",
            Quality::FairJitter => "Fair: high jitter",
            Quality::Excellent => "Excellent",
            Quality::Good => "Good",
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
