use serde::Serialize;

use crate::error::AnalysisError;
use crate::ping::{ProbeResult, ProbeSample};
use crate::quality::Quality;

/// Derived statistics for one successful probe run. All times in ms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Metrics {
    pub min_rtt: f64,
    pub max_rtt: f64,
    pub average_rtt: f64,
    /// Sample standard deviation (n - 1), 0 for fewer than two samples.
    pub jitter: f64,
    pub packets_lost: u32,
    pub quality: Quality,
}

impl Metrics {
    /// Fails with [`AnalysisError::InvalidState`] for failed results.
    pub fn compute(result: &ProbeResult) -> Result<Self, AnalysisError> {
        let samples = result.samples();
        if samples.is_empty() {
            return Err(AnalysisError::InvalidState(format!(
                "metrics requested for failed probe of {} ({} bytes)",
                result.host, result.packet_size
            )));
        }

        let (min_rtt, max_rtt) = samples.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY),
            |(lo, hi), s| (lo.min(s.millis()), hi.max(s.millis())),
        );
        let average_rtt = mean(samples);
        let jitter = sample_std_dev(samples, average_rtt);
        let packets_lost = result.packets_lost();

        Ok(Self {
            min_rtt,
            max_rtt,
            average_rtt,
            jitter,
            packets_lost,
            quality: Quality::classify(packets_lost, average_rtt, jitter),
        })
    }
}

fn mean(samples: &[ProbeSample]) -> f64 {
    samples.iter().map(|s| s.millis()).sum::<f64>() / samples.len() as f64
}

fn sample_std_dev(samples: &[ProbeSample], mean: f64) -> f64 {
    if samples.len() < 2 {
        return 0.0;
    }
    let sum_sq: f64 = samples
        .iter()
        .map(|s| {
            let d = s.millis() - mean;
            d * d
        })
        .sum();
    (sum_sq / (samples.len() - 1) as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ping::ProbeFailure;

    fn result_with(values: &[f64], sent: u32) -> ProbeResult {
        let samples = values
            .iter()
            .map(|v| ProbeSample::from_millis(*v).unwrap())
            .collect();
        ProbeResult::from_samples("host", None, 56, sent, samples)
    }

    #[test]
    fn test_basic_metrics() {
        let metrics = Metrics::compute(&result_with(&[10.0, 20.5, 15.2], 4)).unwrap();
        assert_eq!(metrics.min_rtt, 10.0);
        assert_eq!(metrics.max_rtt, 20.5);
        assert!((metrics.average_rtt - 15.2333).abs() < 1e-3);
        assert!((metrics.jitter - 5.2501).abs() < 1e-3);
        assert_eq!(metrics.packets_lost, 1);
        assert_eq!(metrics.quality, Quality::Excellent);
    }

    #[test]
    fn test_single_sample_has_zero_jitter() {
        let metrics = Metrics::compute(&result_with(&[42.0], 4)).unwrap();
        assert_eq!(metrics.jitter, 0.0);
        assert_eq!(metrics.min_rtt, metrics.max_rtt);
        assert_eq!(metrics.packets_lost, 3);
        assert_eq!(metrics.quality, Quality::PoorPacketLoss);
    }

    #[test]
    fn test_identical_samples_have_zero_jitter() {
        let metrics = Metrics::compute(&result_with(&[5.0, 5.0, 5.0, 5.0], 4)).unwrap();
        assert_eq!(metrics.jitter, 0.0);
        assert_eq!(metrics.packets_lost, 0);
    }

    #[test]
    fn test_jitter_uses_n_minus_one() {
        // mean 3, squared deviations sum to 8, 8 / (2 - 1) = 8
        let metrics = Metrics::compute(&result_with(&[1.0, 5.0], 2)).unwrap();
        assert!((metrics.jitter - 8f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_failed_result_is_invalid_state() {
        let failed = ProbeResult::failure("host", 56, 4, ProbeFailure::NoSamplesParsed);
        assert!(matches!(
            Metrics::compute(&failed),
            Err(AnalysisError::InvalidState(_))
        ));
    }
}
