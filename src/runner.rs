//! Drives a probe session: every host, every packet size, then aggregation
//! and ranking.
//!
//! Packet sizes for one host are always probed one after another in
//! increasing order, with the configured delay between attempts. Hosts run
//! sequentially when `max_concurrency` is 1 and in parallel (bounded by a
//! semaphore) otherwise. Per-host reports are collected over a channel and
//! put back into input order before ranking.
//!
//! A shutdown signal stops the session early. A host interrupted once it has
//! started, even during its first probe, is reported as
//! [`HostStatus::Partial`] and never summarized, since its overall average
//! would cover only some of the sizes.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use log::{debug, info, warn};
use serde::Serialize;
use tokio::sync::{Semaphore, mpsc, watch};

use crate::config::AppConfig;
use crate::error::AnalysisError;
use crate::parser::parse_probe_output;
use crate::ping::{ProbeFailure, ProbeRequest, ProbeResult};
use crate::ping_executor::Prober;
use crate::ranking::Ranking;
use crate::summary::HostSummary;

#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    /// Probed in this order; kept sorted ascending.
    pub packet_sizes: Vec<u32>,
    pub count: u32,
    pub timeout: Duration,
    pub kill_after: Duration,
    pub delay: Duration,
    pub max_concurrency: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        AppConfig::default().run_config()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum HostStatus {
    Summarized { summary: HostSummary },
    /// Every packet size failed.
    AllFailed,
    /// Started, then interrupted after `completed` of `total` sizes.
    /// `completed` may be 0 when the first probe was cut short.
    Partial { completed: usize, total: usize },
    /// Never started before shutdown.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HostReport {
    pub host: String,
    /// One entry per attempted packet size, in probe order.
    pub attempts: Vec<ProbeResult>,
    pub status: HostStatus,
}

impl HostReport {
    fn skipped(host: &str) -> Self {
        Self {
            host: host.to_string(),
            attempts: Vec::new(),
            status: HostStatus::Skipped,
        }
    }

    pub fn summary(&self) -> Option<&HostSummary> {
        match &self.status {
            HostStatus::Summarized { summary } => Some(summary),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Local>,
    pub packet_sizes: Vec<u32>,
    pub hosts: Vec<HostReport>,
    /// `None` when no host produced a summary.
    pub ranking: Option<Ranking>,
    pub cancelled: bool,
}

/// Progress notifications, sent as results become available.
#[derive(Debug, Clone)]
pub enum RunEvent {
    HostStarted { host: String },
    ProbeFinished(ProbeResult),
    HostFinished { host: String },
}

pub struct Runner<P> {
    prober: Arc<P>,
    config: RunConfig,
    events: Option<mpsc::UnboundedSender<RunEvent>>,
}

impl<P: Prober + 'static> Runner<P> {
    pub fn new(prober: P, config: RunConfig) -> Self {
        Self {
            prober: Arc::new(prober),
            config,
            events: None,
        }
    }

    pub fn with_events(mut self, sender: mpsc::UnboundedSender<RunEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Probes every host and builds the report.
    ///
    /// Probe failures are recorded in the report. Only contract violations
    /// inside aggregation come back as errors.
    pub async fn run(
        &self,
        hosts: &[String],
        shutdown: watch::Receiver<bool>,
    ) -> Result<RunReport, AnalysisError> {
        let started_at = Local::now();
        let mut reports: Vec<Option<HostReport>> = std::iter::repeat_with(|| None)
            .take(hosts.len())
            .collect();

        if self.config.max_concurrency <= 1 {
            for (i, host) in hosts.iter().enumerate() {
                let session = HostSession {
                    prober: self.prober.as_ref(),
                    config: &self.config,
                    events: self.events.as_ref(),
                };
                let report = session.run(host, shutdown.clone(), i > 0).await?;
                reports[i] = Some(report);
            }
        } else {
            let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency));
            let (tx, mut rx) = mpsc::unbounded_channel();

            for (i, host) in hosts.iter().enumerate() {
                let prober = Arc::clone(&self.prober);
                let config = self.config.clone();
                let events = self.events.clone();
                let semaphore = Arc::clone(&semaphore);
                let shutdown = shutdown.clone();
                let host = host.clone();
                let tx = tx.clone();

                tokio::spawn(async move {
                    let Ok(_permit) = semaphore.acquire_owned().await else {
                        return;
                    };
                    let session = HostSession {
                        prober: prober.as_ref(),
                        config: &config,
                        events: events.as_ref(),
                    };
                    let report = session.run(&host, shutdown, false).await;
                    let _ = tx.send((i, report));
                });
            }
            drop(tx);

            while let Some((i, report)) = rx.recv().await {
                reports[i] = Some(report?);
            }
        }

        let hosts: Vec<HostReport> = reports
            .into_iter()
            .zip(hosts)
            .map(|(report, host)| {
                report.unwrap_or_else(|| {
                    warn!("no report for {host}, marking skipped");
                    HostReport::skipped(host)
                })
            })
            .collect();

        let ranking = Ranking::from_summaries(hosts.iter().filter_map(HostReport::summary));
        let cancelled = *shutdown.borrow();
        if ranking.is_none() {
            info!("no host produced comparable results");
        }

        Ok(RunReport {
            started_at,
            packet_sizes: self.config.packet_sizes.clone(),
            hosts,
            ranking,
            cancelled,
        })
    }
}

struct HostSession<'a, P> {
    prober: &'a P,
    config: &'a RunConfig,
    events: Option<&'a mpsc::UnboundedSender<RunEvent>>,
}

impl<P: Prober> HostSession<'_, P> {
    fn emit(&self, event: RunEvent) {
        if let Some(events) = self.events {
            let _ = events.send(event);
        }
    }

    async fn run(
        &self,
        host: &str,
        mut shutdown: watch::Receiver<bool>,
        lead_in: bool,
    ) -> Result<HostReport, AnalysisError> {
        let total = self.config.packet_sizes.len();
        let mut attempts = Vec::with_capacity(total);
        let mut started = false;

        for (i, &packet_size) in self.config.packet_sizes.iter().enumerate() {
            let stopped = if i > 0 || lead_in {
                pause(&mut shutdown, self.config.delay).await
            } else {
                *shutdown.borrow()
            };
            if stopped {
                return Ok(interrupted(host, attempts, total, started));
            }
            if !started {
                started = true;
                self.emit(RunEvent::HostStarted {
                    host: host.to_string(),
                });
            }

            let Some(result) = self.probe_once(host, packet_size, &mut shutdown).await else {
                return Ok(interrupted(host, attempts, total, started));
            };
            self.emit(RunEvent::ProbeFinished(result.clone()));
            attempts.push(result);
        }

        self.emit(RunEvent::HostFinished {
            host: host.to_string(),
        });

        let successes: Vec<ProbeResult> = attempts.iter().filter(|r| r.is_success()).cloned().collect();
        let status = match HostSummary::from_results(host, successes) {
            Ok(summary) => HostStatus::Summarized { summary },
            Err(AnalysisError::EmptyResultSet { .. }) => {
                info!("{host}: every packet size failed");
                HostStatus::AllFailed
            }
            Err(e) => return Err(e),
        };

        Ok(HostReport {
            host: host.to_string(),
            attempts,
            status,
        })
    }

    /// `None` if shutdown arrived while the probe was running.
    async fn probe_once(
        &self,
        host: &str,
        packet_size: u32,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Option<ProbeResult> {
        let request = ProbeRequest {
            host: host.to_string(),
            packet_size,
            count: self.config.count,
            timeout: self.config.timeout,
            kill_after: self.config.kill_after,
        };

        let outcome = tokio::select! {
            res = self.prober.probe(&request) => Some(res),
            _ = stop_requested(shutdown) => None,
        };
        let outcome = outcome?;

        let result = match outcome {
            Ok(output) => parse_probe_output(&output.stdout, host, packet_size, self.config.count),
            Err(e) => {
                debug!("{host} ({packet_size} bytes): {e}");
                ProbeResult::failure(host, packet_size, self.config.count, ProbeFailure::from(e))
            }
        };

        match result.failure_reason() {
            None => info!(
                "{host} ({packet_size} bytes): {}/{} replies",
                result.samples().len(),
                result.packets_sent
            ),
            Some(reason) => info!("{host} ({packet_size} bytes): {reason}"),
        }
        Some(result)
    }
}

fn interrupted(host: &str, attempts: Vec<ProbeResult>, total: usize, started: bool) -> HostReport {
    let status = if started {
        HostStatus::Partial {
            completed: attempts.len(),
            total,
        }
    } else {
        HostStatus::Skipped
    };
    info!("{host}: interrupted ({status:?})");
    HostReport {
        host: host.to_string(),
        attempts,
        status,
    }
}

/// Sleeps for `delay`. Returns true if shutdown was requested.
async fn pause(shutdown: &mut watch::Receiver<bool>, delay: Duration) -> bool {
    if delay.is_zero() {
        return *shutdown.borrow();
    }
    let stopped = tokio::select! {
        _ = tokio::time::sleep(delay) => false,
        _ = stop_requested(shutdown) => true,
    };
    stopped || *shutdown.borrow()
}

/// Resolves once shutdown is requested. Pends forever if the sender is gone.
async fn stop_requested(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
