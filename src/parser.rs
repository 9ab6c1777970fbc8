//! Turns raw `ping` output into a [`ProbeResult`].
//!
//! Two kinds of lines matter:
//! - the resolution header, `PING example.com (93.184.216.34): 56 data bytes`,
//!   which supplies the resolved address (first match wins);
//! - reply lines containing `bytes from` and `time=<float> ms`, each of which
//!   contributes one sample in line order.
//!
//! Windows output is recognised as well: the header
//! `Pinging example.com [93.184.216.34] with 32 bytes of data:` and replies
//! `Reply from 93.184.216.34: bytes=32 time=12ms TTL=56`. A `time<1ms`
//! reply is recorded as 1 ms. Only the English wording is matched.
//!
//! Everything else is ignored. A reply line whose time field does not parse
//! as a number is skipped, so it shows up as a lost packet rather than an
//! error. Loss is therefore `sent - parsed replies`, not a sequence-number
//! based count.

use std::sync::OnceLock;

use log::debug;
use regex::Regex;

use crate::ping::{ProbeResult, ProbeSample};

const REPLY_MARKER: &str = "bytes from";
const WINDOWS_REPLY_PREFIX: &str = "Reply from";
const SUB_MILLISECOND_MS: f64 = 1.0;

fn header_regex() -> &'static Regex {
    static HEADER: OnceLock<Regex> = OnceLock::new();
    HEADER.get_or_init(|| {
        Regex::new(r"^(?:PING6?\s.*?\(([^)\s]+)\)|Pinging\s+\S+\s+\[([^\]\s]+)\])").unwrap()
    })
}

fn time_regex() -> &'static Regex {
    static TIME: OnceLock<Regex> = OnceLock::new();
    TIME.get_or_init(|| Regex::new(r"time([=<])(\S+?)\s*ms").unwrap())
}

fn is_reply_line(line: &str) -> bool {
    line.contains(REPLY_MARKER) || line.trim_start().starts_with(WINDOWS_REPLY_PREFIX)
}

/// Extracts the bracketed or parenthesized address from a resolution header
/// line.
pub fn parse_resolved_ip(line: &str) -> Option<&str> {
    let caps = header_regex().captures(line.trim_start())?;
    caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str())
}

/// Extracts the RTT from a reply line. `None` for non-reply lines and for
/// reply lines with a malformed time field.
pub fn parse_reply_time(line: &str) -> Option<ProbeSample> {
    if !is_reply_line(line) {
        return None;
    }
    let caps = time_regex().captures(line)?;
    let raw = caps.get(2)?.as_str();
    if &caps[1] == "<" {
        return raw
            .parse::<f64>()
            .ok()
            .and_then(|_| ProbeSample::from_millis(SUB_MILLISECOND_MS));
    }
    match raw.parse::<f64>() {
        Ok(ms) => ProbeSample::from_millis(ms),
        Err(_) => {
            debug!("skipping reply with unparseable time field {raw:?}");
            None
        }
    }
}

/// Parses the full output of one probe run.
pub fn parse_probe_output(
    output: &str,
    host: &str,
    packet_size: u32,
    packets_sent: u32,
) -> ProbeResult {
    let mut resolved_ip: Option<String> = None;
    let mut samples = Vec::new();

    for line in output.lines() {
        if resolved_ip.is_none() {
            if let Some(ip) = parse_resolved_ip(line) {
                resolved_ip = Some(ip.to_string());
                continue;
            }
        }
        if let Some(sample) = parse_reply_time(line) {
            samples.push(sample);
        }
    }

    debug!(
        "parsed {} replies for {host} ({packet_size} bytes)",
        samples.len()
    );
    ProbeResult::from_samples(host, resolved_ip, packet_size, packets_sent, samples)
}
