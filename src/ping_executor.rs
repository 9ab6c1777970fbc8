use std::future::Future;
use std::net::IpAddr;
use std::process::Stdio;

use log::debug;
use tokio::process::Command;
use tokio::time::timeout;

use crate::error::ProbeError;
use crate::ping::{ProbeOutput, ProbeRequest};

/// Runs one probe for a (host, packet size) pair and hands back the raw
/// output text.
pub trait Prober: Send + Sync {
    fn probe(
        &self,
        request: &ProbeRequest,
    ) -> impl Future<Output = Result<ProbeOutput, ProbeError>> + Send;
}

/// Sanitize hostname by keeping only valid characters (alphanumeric, dots, hyphens).
/// IP literals, including IPv6, pass through unchanged.
/// Returns None if the result is empty
pub fn sanitize_hostname(hostname: &str) -> Option<String> {
    let hostname = hostname.trim();
    if let Ok(ip) = hostname.parse::<IpAddr>() {
        return Some(ip.to_string());
    }

    // Also handle case where user included port like "example.com:8080"
    let hostname = hostname.split(':').next().unwrap_or(hostname);

    let sanitized: String = hostname
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '.' || *c == '-')
        .collect();

    if sanitized.is_empty() || sanitized.starts_with('-') {
        None
    } else {
        Some(sanitized)
    }
}

/// Arguments for the platform `ping` binary.
pub fn ping_args(host: &str, request: &ProbeRequest) -> Vec<String> {
    let count = request.count.to_string();
    let size = request.packet_size.to_string();
    let deadline_secs = request.timeout.as_secs().max(1).to_string();

    if cfg!(target_os = "windows") {
        let reply_wait_ms = request.timeout.as_millis().max(1).to_string();
        vec![
            "-n".into(),
            count,
            "-l".into(),
            size,
            "-w".into(),
            reply_wait_ms,
            host.into(),
        ]
    } else if cfg!(target_os = "macos") {
        vec![
            "-c".into(),
            count,
            "-s".into(),
            size,
            "-t".into(),
            deadline_secs,
            host.into(),
        ]
    } else {
        // iputils exits 1 on any loss when `-w` is combined with `-c`, so
        // only bound the per-reply wait and leave the deadline to `probe`.
        vec![
            "-c".into(),
            count,
            "-s".into(),
            size,
            "-W".into(),
            deadline_secs,
            host.into(),
        ]
    }
}

/// Probes by running the system `ping` utility as a subprocess.
///
/// `ping` exits 0 as long as at least one reply arrived, so partial loss
/// still yields output. If it is still running after `timeout + kill_after`,
/// the process is killed and the probe reports [`ProbeError::Timeout`].
#[derive(Debug, Clone)]
pub struct SystemPing {
    program: String,
}

impl Default for SystemPing {
    fn default() -> Self {
        Self {
            program: "ping".to_string(),
        }
    }
}

impl SystemPing {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different binary, e.g. `ping6` or an absolute path.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Prober for SystemPing {
    async fn probe(&self, request: &ProbeRequest) -> Result<ProbeOutput, ProbeError> {
        let host = sanitize_hostname(&request.host)
            .ok_or_else(|| ProbeError::InvalidHost(request.host.clone()))?;
        let args = ping_args(&host, request);
        debug!("running {} {}", self.program, args.join(" "));

        let child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let limit = request.timeout + request.kill_after;
        let output = match timeout(limit, child.wait_with_output()).await {
            Ok(output) => output?,
            Err(_) => return Err(ProbeError::Timeout { after: limit }),
        };

        if !output.status.success() {
            debug!(
                "ping {host} exited with {:?}: {}",
                output.status.code(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
            return Err(ProbeError::Unreachable {
                exit_code: output.status.code(),
            });
        }

        Ok(ProbeOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        })
    }
}
