use std::path::PathBuf;
use std::time::Duration;

use eyre::Result;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::analyzer::AnalyzerSettings;
use crate::lifecycle::PollConfig;

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub default_model: Option<String>,
    pub default_prompt: Option<String>,
    pub webhook_url: Option<String>,
    pub poll_interval_secs: Option<f64>,
    pub poll_backoff: Option<f64>,
    pub poll_max_interval_secs: Option<f64>,
    /// 0 disables the limit
    pub poll_max_wait_secs: Option<f64>,
}

impl Config {
    /// Load config from ~/.config/video-analyzer/config.toml if it exists
    pub fn load() -> Result<Self> {
        let path = config_path();
        if path.exists() {
            debug!("Loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            debug!("No config file found at {}", path.display());
            Ok(Config::default())
        }
    }

    pub fn poll_config(&self) -> PollConfig {
        let defaults = PollConfig::default();
        PollConfig {
            interval: secs(self.poll_interval_secs).unwrap_or(defaults.interval),
            backoff: self
                .poll_backoff
                .filter(|b| b.is_finite() && *b >= 1.0)
                .unwrap_or(defaults.backoff),
            max_interval: secs(self.poll_max_interval_secs).unwrap_or(defaults.max_interval),
            max_wait: match self.poll_max_wait_secs {
                Some(s) if s == 0.0 => None,
                other => secs(other).or(defaults.max_wait),
            },
        }
    }

    pub fn analyzer_settings(&self) -> AnalyzerSettings {
        let defaults = AnalyzerSettings::default();
        AnalyzerSettings {
            default_prompt: self
                .default_prompt
                .clone()
                .filter(|p| !p.trim().is_empty())
                .unwrap_or(defaults.default_prompt),
            poll: self.poll_config(),
            show_progress: defaults.show_progress,
        }
    }
}

fn secs(value: Option<f64>) -> Option<Duration> {
    value
        .filter(|s| *s > 0.0)
        .and_then(|s| Duration::try_from_secs_f64(s).ok())
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from(".config"))
        .join("video-analyzer")
        .join("config.toml")
}
