use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::runner::RunConfig;

const CONFIG_DIR_NAME: &str = "PingQuality";
const CONFIG_FILE_NAME: &str = "config.json";

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// User-tunable settings. Read from a JSON file if present, never written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Hosts offered by the "predefined list" menu option.
    pub predefined_hosts: Vec<String>,
    /// Hosts used by the quick test.
    pub quick_hosts: Vec<String>,
    /// Fallback when a menu selection is invalid or empty.
    pub default_hosts: Vec<String>,
    pub packet_sizes: Vec<u32>,
    pub count: u32,
    pub timeout_secs: u64,
    pub kill_after_secs: u64,
    /// Pause between consecutive probes of the same run.
    pub delay_ms: u64,
    /// Hosts probed at once. 1 means strictly sequential.
    pub max_concurrency: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            predefined_hosts: strings(&[
                "8.8.8.8",
                "8.8.4.4",
                "1.1.1.1",
                "1.0.0.1",
                "9.9.9.9",
                "208.67.222.222",
                "google.com",
                "cloudflare.com",
                "github.com",
                "amazon.com",
            ]),
            quick_hosts: strings(&["8.8.8.8", "1.1.1.1", "google.com"]),
            default_hosts: strings(&["8.8.8.8", "1.1.1.1", "google.com"]),
            packet_sizes: vec![32, 56, 128, 512],
            count: 4,
            timeout_secs: 10,
            kill_after_secs: 2,
            delay_ms: 1000,
            max_concurrency: 1,
        }
    }
}

impl AppConfig {
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Reads and validates a config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the per-user config file, falling back to defaults when it is
    /// missing or unusable.
    pub fn load() -> Self {
        let Some(path) = Self::get_config_path() else {
            debug!("no config directory, using defaults");
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        Self::from_file(&path).unwrap_or_else(|e| {
            warn!("ignoring {}: {e}", path.display());
            Self::default()
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.packet_sizes.is_empty() {
            return Err(ConfigError::Invalid("packet_sizes is empty".into()));
        }
        if self.packet_sizes.contains(&0) {
            return Err(ConfigError::Invalid("packet sizes must be positive".into()));
        }
        if self.count == 0 {
            return Err(ConfigError::Invalid("count must be positive".into()));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeout_secs must be positive".into()));
        }
        if self.max_concurrency == 0 {
            return Err(ConfigError::Invalid("max_concurrency must be positive".into()));
        }
        if self.default_hosts.is_empty() {
            return Err(ConfigError::Invalid("default_hosts is empty".into()));
        }
        Ok(())
    }

    pub fn run_config(&self) -> RunConfig {
        let mut packet_sizes = self.packet_sizes.clone();
        packet_sizes.sort_unstable();
        packet_sizes.dedup();
        RunConfig {
            packet_sizes,
            count: self.count,
            timeout: Duration::from_secs(self.timeout_secs),
            kill_after: Duration::from_secs(self.kill_after_secs),
            delay: Duration::from_millis(self.delay_ms),
            max_concurrency: self.max_concurrency,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.packet_sizes, vec![32, 56, 128, 512]);
        assert_eq!(config.count, 4);
        assert_eq!(config.delay_ms, 1000);
        assert_eq!(config.max_concurrency, 1);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"packet_sizes": [512, 64, 64], "max_concurrency": 4}"#)
                .unwrap();
        assert_eq!(config.count, 4);
        assert_eq!(config.max_concurrency, 4);

        let run = config.run_config();
        assert_eq!(run.packet_sizes, vec![64, 512]);
        assert_eq!(run.timeout, Duration::from_secs(10));
        assert_eq!(run.kill_after, Duration::from_secs(2));
        assert_eq!(run.delay, Duration::from_secs(1));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.packet_sizes = vec![];
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = AppConfig::default();
        config.packet_sizes = vec![32, 0];
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.count = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.max_concurrency = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file() {
        let path = std::env::temp_dir().join(format!(
            "ping-quality-config-{}.json",
            std::process::id()
        ));
        fs::write(&path, r#"{"count": 6, "quick_hosts": ["9.9.9.9"]}"#).unwrap();
        let config = AppConfig::from_file(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(config.count, 6);
        assert_eq!(config.quick_hosts, vec!["9.9.9.9".to_string()]);
    }

    #[test]
    fn test_from_file_reports_parse_errors() {
        let path = std::env::temp_dir().join(format!(
            "ping-quality-bad-config-{}.json",
            std::process::id()
        ));
        fs::write(&path, "{ not json").unwrap();
        let result = AppConfig::from_file(&path);
        fs::remove_file(&path).unwrap();

        assert!(matches!(result, Err(ConfigError::Json(_))));
    }
}
