//! Per-host aggregation across packet sizes.

use serde::Serialize;

use crate::error::AnalysisError;
use crate::metrics::Metrics;
use crate::ping::ProbeResult;

/// A successful probe result together with its computed metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasuredResult {
    pub result: ProbeResult,
    pub metrics: Metrics,
}

impl MeasuredResult {
    pub fn new(result: ProbeResult) -> Result<Self, AnalysisError> {
        let metrics = Metrics::compute(&result)?;
        Ok(Self { result, metrics })
    }

    pub fn average_rtt(&self) -> f64 {
        self.metrics.average_rtt
    }
}

/// Summary of every successful packet size for one host.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HostSummary {
    pub host: String,
    pub resolved_ip: String,
    pub results: Vec<MeasuredResult>,
    best_index: usize,
    worst_index: usize,
    /// Mean of the per-size averages, not weighted by sample count.
    pub overall_average_rtt: f64,
}

impl HostSummary {
    /// Builds a summary from successful results in packet-size order.
    ///
    /// Empty input yields [`AnalysisError::EmptyResultSet`]. Mixed hosts or
    /// failed results yield [`AnalysisError::InvalidState`].
    pub fn from_results(
        host: &str,
        results: Vec<ProbeResult>,
    ) -> Result<Self, AnalysisError> {
        if results.is_empty() {
            return Err(AnalysisError::EmptyResultSet {
                host: host.to_string(),
            });
        }
        if let Some(other) = results.iter().find(|r| r.host != host) {
            return Err(AnalysisError::InvalidState(format!(
                "result for {} passed to summary of {host}",
                other.host
            )));
        }

        let measured = results
            .into_iter()
            .map(MeasuredResult::new)
            .collect::<Result<Vec<_>, _>>()?;

        let mut best_index = 0;
        let mut worst_index = 0;
        for (i, m) in measured.iter().enumerate().skip(1) {
            if m.average_rtt() < measured[best_index].average_rtt() {
                best_index = i;
            }
            if m.average_rtt() > measured[worst_index].average_rtt() {
                worst_index = i;
            }
        }

        let overall_average_rtt =
            measured.iter().map(MeasuredResult::average_rtt).sum::<f64>() / measured.len() as f64;

        Ok(Self {
            host: host.to_string(),
            resolved_ip: measured[0].result.resolved_ip.clone(),
            results: measured,
            best_index,
            worst_index,
            overall_average_rtt,
        })
    }

    /// Lowest average RTT; the earliest packet size wins ties.
    pub fn best(&self) -> &MeasuredResult {
        &self.results[self.best_index]
    }

    /// Highest average RTT; the earliest packet size wins ties.
    pub fn worst(&self) -> &MeasuredResult {
        &self.results[self.worst_index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ping::{ProbeFailure, ProbeSample};

    fn result(host: &str, size: u32, values: &[f64]) -> ProbeResult {
        let samples = values
            .iter()
            .map(|v| ProbeSample::from_millis(*v).unwrap())
            .collect();
        ProbeResult::from_samples(host, Some("10.0.0.1".into()), size, 4, samples)
    }

    #[test]
    fn test_best_and_worst() {
        let summary = HostSummary::from_results(
            "a",
            vec![
                result("a", 32, &[20.0, 20.0]),
                result("a", 56, &[10.0, 12.0]),
                result("a", 128, &[40.0]),
                result("a", 512, &[30.0]),
            ],
        )
        .unwrap();

        assert_eq!(summary.best().result.packet_size, 56);
        assert_eq!(summary.worst().result.packet_size, 128);
        assert_eq!(summary.resolved_ip, "10.0.0.1");
        assert!((summary.overall_average_rtt - 25.25).abs() < 1e-9);
        for m in &summary.results {
            assert!(summary.best().average_rtt() <= m.average_rtt());
            assert!(summary.worst().average_rtt() >= m.average_rtt());
        }
    }

    #[test]
    fn test_ties_prefer_first() {
        let summary = HostSummary::from_results(
            "a",
            vec![
                result("a", 32, &[10.0]),
                result("a", 56, &[10.0]),
                result("a", 128, &[10.0]),
            ],
        )
        .unwrap();
        assert_eq!(summary.best().result.packet_size, 32);
        assert_eq!(summary.worst().result.packet_size, 32);
    }

    #[test]
    fn test_mean_of_means_not_weighted() {
        let summary = HostSummary::from_results(
            "a",
            vec![
                result("a", 32, &[10.0]),
                result("a", 56, &[30.0, 30.0, 30.0, 30.0]),
            ],
        )
        .unwrap();
        assert_eq!(summary.overall_average_rtt, 20.0);
    }

    #[test]
    fn test_empty_is_empty_result_set() {
        assert_eq!(
            HostSummary::from_results("a", Vec::new()),
            Err(AnalysisError::EmptyResultSet {
                host: "a".to_string()
            })
        );
    }

    #[test]
    fn test_mixed_hosts_rejected() {
        let err = HostSummary::from_results(
            "a",
            vec![result("a", 32, &[1.0]), result("b", 56, &[1.0])],
        )
        .unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidState(_)));
    }

    #[test]
    fn test_failed_result_rejected() {
        let failed = ProbeResult::failure("a", 32, 4, ProbeFailure::NoSamplesParsed);
        let err = HostSummary::from_results("a", vec![failed]).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidState(_)));
    }
}
