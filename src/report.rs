//! Human-readable and JSON renderings of a [`RunReport`].

use std::fmt::Write;

use crate::metrics::Metrics;
use crate::ping::ProbeResult;
use crate::runner::{HostReport, HostStatus, RunEvent, RunReport};

fn sizes_list(sizes: &[u32]) -> String {
    sizes
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// One line describing a single (host, packet size) attempt.
pub fn format_attempt(result: &ProbeResult) -> String {
    match Metrics::compute(result) {
        Ok(m) => format!(
            "{:>5} B  avg {:>7.2} ms  min {:>7.2}  max {:>7.2}  jitter {:>6.2}  loss {}/{}  {}",
            result.packet_size,
            m.average_rtt,
            m.min_rtt,
            m.max_rtt,
            m.jitter,
            m.packets_lost,
            result.packets_sent,
            m.quality
        ),
        Err(_) => format!(
            "{:>5} B  FAILED: {}",
            result.packet_size,
            result
                .failure_reason()
                .map(ToString::to_string)
                .unwrap_or_default()
        ),
    }
}

/// Progress line for a runner event, if it warrants one.
pub fn format_event(event: &RunEvent) -> Option<String> {
    match event {
        RunEvent::HostStarted { host } => Some(format!("Testing {host} ...")),
        RunEvent::ProbeFinished(result) => Some(format!("  {}", format_attempt(result))),
        RunEvent::HostFinished { .. } => None,
    }
}

fn write_host(out: &mut String, host: &HostReport) {
    let resolved = host
        .summary()
        .map(|s| s.resolved_ip.as_str())
        .or_else(|| host.attempts.iter().find(|a| a.is_success()).map(|a| a.resolved_ip.as_str()))
        .unwrap_or(host.host.as_str());
    if resolved == host.host {
        let _ = writeln!(out, "== {} ==", host.host);
    } else {
        let _ = writeln!(out, "== {} ({resolved}) ==", host.host);
    }

    for attempt in &host.attempts {
        let _ = writeln!(out, "  {}", format_attempt(attempt));
    }

    match &host.status {
        HostStatus::Summarized { summary } => {
            let best = summary.best();
            let worst = summary.worst();
            let _ = writeln!(
                out,
                "  Best: {} B ({:.2} ms)  Worst: {} B ({:.2} ms)  Overall average: {:.2} ms",
                best.result.packet_size,
                best.average_rtt(),
                worst.result.packet_size,
                worst.average_rtt(),
                summary.overall_average_rtt
            );
        }
        HostStatus::AllFailed => {
            let _ = writeln!(out, "  All packet sizes failed, excluded from comparison");
        }
        HostStatus::Partial { completed, total } => {
            let _ = writeln!(
                out,
                "  Interrupted: partial, {completed} of {total} sizes completed, excluded from comparison"
            );
        }
        HostStatus::Skipped => {
            let _ = writeln!(out, "  Not tested");
        }
    }
    out.push('\n');
}

pub fn render_text(report: &RunReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Ping quality report (started {})",
        report.started_at.format("%Y-%m-%d %H:%M:%S")
    );
    let _ = writeln!(out, "Packet sizes: {} bytes", sizes_list(&report.packet_sizes));
    if report.cancelled {
        let _ = writeln!(out, "Run interrupted, results are incomplete");
    }
    out.push('\n');

    for host in &report.hosts {
        write_host(&mut out, host);
    }

    let Some(ranking) = &report.ranking else {
        let _ = writeln!(out, "No comparable results: no host completed successfully.");
        return out;
    };

    let _ = writeln!(out, "== Comparison ==");
    let _ = writeln!(
        out,
        "  {:>2}  {:<24} {:<40} {:>10} {:>10}",
        "#", "Host", "Address", "Avg (ms)", "Best (ms)"
    );
    for entry in ranking.entries() {
        let _ = writeln!(
            out,
            "  {:>2}  {:<24} {:<40} {:>10.2} {:>10.2}",
            entry.rank,
            entry.host,
            entry.resolved_ip,
            entry.overall_average_rtt,
            entry.best_average_rtt
        );
    }
    out.push('\n');
    let _ = writeln!(
        out,
        "Fastest: {} ({:.2} ms best average)",
        ranking.fastest().host,
        ranking.fastest_rtt()
    );
    let _ = writeln!(
        out,
        "Slowest: {} ({:.2} ms overall average)",
        ranking.slowest().host,
        ranking.slowest_rtt()
    );
    out
}

pub fn render_json(report: &RunReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ping::{ProbeFailure, ProbeSample};
    use crate::ranking::Ranking;
    use crate::summary::HostSummary;
    use chrono::Local;

    fn success(host: &str, size: u32, values: &[f64]) -> ProbeResult {
        let samples = values
            .iter()
            .map(|v| ProbeSample::from_millis(*v).unwrap())
            .collect();
        ProbeResult::from_samples(host, Some("192.0.2.1".into()), size, 4, samples)
    }

    fn sample_report() -> RunReport {
        let ok = vec![success("fast.example", 32, &[10.0, 12.0, 11.0, 11.0])];
        let summary = HostSummary::from_results("fast.example", ok.clone()).unwrap();
        let failed = ProbeResult::failure(
            "down.example",
            32,
            4,
            ProbeFailure::Unreachable { exit_code: Some(2) },
        );
        let hosts = vec![
            HostReport {
                host: "fast.example".into(),
                attempts: ok,
                status: HostStatus::Summarized { summary },
            },
            HostReport {
                host: "down.example".into(),
                attempts: vec![failed],
                status: HostStatus::AllFailed,
            },
        ];
        let ranking = Ranking::from_summaries(hosts.iter().filter_map(HostReport::summary));
        RunReport {
            started_at: Local::now(),
            packet_sizes: vec![32],
            hosts,
            ranking,
            cancelled: false,
        }
    }

    #[test]
    fn test_format_failed_attempt() {
        let failed = ProbeResult::failure("h", 56, 4, ProbeFailure::NoSamplesParsed);
        assert_eq!(format_attempt(&failed), "   56 B  FAILED: No packets received");
    }

    #[test]
    fn test_format_successful_attempt() {
        let line = format_attempt(&success("h", 32, &[10.0, 20.0]));
        assert!(line.contains("avg   15.00 ms"));
        assert!(line.contains("loss 2/4"));
        assert!(line.ends_with("Excellent"));
    }

    #[test]
    fn test_text_report_sections() {
        let text = render_text(&sample_report());
        assert!(text.contains("== fast.example (192.0.2.1) =="));
        assert!(text.contains("FAILED: Host unreachable"));
        assert!(text.contains("All packet sizes failed"));
        assert!(text.contains("Fastest: fast.example (11.00 ms best average)"));
        assert!(!text.contains("No comparable results"));
    }

    #[test]
    fn test_text_report_without_ranking() {
        let mut report = sample_report();
        report.hosts.remove(0);
        report.ranking = None;
        let text = render_text(&report);
        assert!(text.contains("No comparable results"));
        assert!(!text.contains("Fastest"));
    }

    #[test]
    fn test_json_report() {
        let json = render_json(&sample_report()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["hosts"][0]["status"]["status"], "summarized");
        assert_eq!(value["hosts"][1]["status"]["status"], "all_failed");
        assert_eq!(
            value["hosts"][1]["attempts"][0]["outcome"]["reason"]["kind"],
            "unreachable"
        );
        assert_eq!(value["ranking"]["entries"][0]["host"], "fast.example");
        assert_eq!(value["ranking"]["entries"][0]["rank"], 1);
    }

    #[test]
    fn test_event_lines() {
        let started = RunEvent::HostStarted {
            host: "x".into(),
        };
        assert_eq!(format_event(&started).as_deref(), Some("Testing x ..."));
        assert!(format_event(&RunEvent::HostFinished { host: "x".into() }).is_none());
    }
}
