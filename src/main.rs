use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use ping_quality::menu::prompt_hosts;
use ping_quality::report::{format_event, render_json, render_text};
use ping_quality::{AppConfig, Runner, SystemPing};
use tokio::sync::{mpsc, watch};

/// Ping hosts with several payload sizes and compare latency, jitter and loss
#[derive(Parser, Debug)]
#[command(name = "ping-quality")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Hosts to test. Without hosts an interactive menu is shown.
    hosts: Vec<String>,

    /// Test the quick host list without prompting
    #[arg(long = "quick", conflicts_with = "hosts")]
    quick: bool,

    /// Payload sizes in bytes, comma-separated
    #[arg(short = 's', long = "sizes", value_delimiter = ',')]
    sizes: Option<Vec<u32>>,

    /// Echo requests per test
    #[arg(short = 'c', long = "count")]
    count: Option<u32>,

    /// Per-test timeout in seconds
    #[arg(long = "timeout")]
    timeout: Option<u64>,

    /// Grace period in seconds before a hung ping is killed
    #[arg(long = "kill-after")]
    kill_after: Option<u64>,

    /// Pause between tests in milliseconds
    #[arg(long = "delay-ms")]
    delay_ms: Option<u64>,

    /// Hosts tested in parallel (1 = sequential)
    #[arg(short = 'j', long = "parallel")]
    parallel: Option<usize>,

    /// Config file (default: per-user config dir)
    #[arg(long = "config")]
    config: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long = "json")]
    json: bool,
}

impl Args {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(sizes) = &self.sizes {
            config.packet_sizes = sizes.clone();
        }
        if let Some(count) = self.count {
            config.count = count;
        }
        if let Some(timeout) = self.timeout {
            config.timeout_secs = timeout;
        }
        if let Some(kill_after) = self.kill_after {
            config.kill_after_secs = kill_after;
        }
        if let Some(delay_ms) = self.delay_ms {
            config.delay_ms = delay_ms;
        }
        if let Some(parallel) = self.parallel {
            config.max_concurrency = parallel;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => AppConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => AppConfig::load(),
    };
    args.apply(&mut config);
    config.validate().context("invalid settings")?;

    let hosts = if args.quick {
        config.quick_hosts.clone()
    } else if !args.hosts.is_empty() {
        args.hosts.clone()
    } else {
        let stdin = io::stdin();
        prompt_hosts(&mut stdin.lock(), &mut io::stdout(), &config)
            .context("reading host selection")?
    };
    info!("testing {} host(s): {}", hosts.len(), hosts.join(", "));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, stopping after current probes");
            let _ = shutdown_tx.send(true);
        }
    });

    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let show_progress = !args.json;
    let progress = tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            if show_progress {
                if let Some(line) = format_event(&event) {
                    eprintln!("{line}");
                }
            }
        }
    });

    let runner = Runner::new(SystemPing::new(), config.run_config()).with_events(events_tx);
    let report = runner.run(&hosts, shutdown_rx).await?;
    drop(runner);
    let _ = progress.await;

    if args.json {
        println!("{}", render_json(&report)?);
    } else {
        println!();
        print!("{}", render_text(&report));
    }
    Ok(())
}
