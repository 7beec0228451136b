use anyhow::{Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about = "Antigravity model quota monitor")]
pub struct Config {
    /// Enable debug mode
    #[arg(short, long)]
    pub debug: bool,

    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Refresh interval in seconds
    #[arg(short = 'r', long)]
    pub refresh_interval: Option<u64>,

    /// Run a single refresh, print the snapshot, and exit
    #[arg(long)]
    pub once: bool,
}

impl Config {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Application settings (from config file)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// How often quota data is fetched from the language server (seconds)
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,

    /// Display tick interval for countdown re-rendering (seconds)
    #[serde(default = "default_tick_interval")]
    pub tick_interval_secs: u64,

    /// Timeout for a single port probe (seconds)
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,
}

fn default_refresh_interval() -> u64 {
    300
}

fn default_tick_interval() -> u64 {
    10
}

fn default_probe_timeout() -> u64 {
    4
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            refresh_interval_secs: default_refresh_interval(),
            tick_interval_secs: default_tick_interval(),
            probe_timeout_secs: default_probe_timeout(),
        }
    }
}

impl Settings {
    /// Load settings from config file or use defaults
    pub fn load(path: Option<&PathBuf>) -> Result<Self> {
        // Try custom path first
        if let Some(p) = path {
            if p.exists() {
                let content = std::fs::read_to_string(p)
                    .with_context(|| format!("Failed to read config file: {:?}", p))?;
                return toml::from_str(&content)
                    .with_context(|| format!("Failed to parse config file: {:?}", p));
            }
        }

        // Try default config locations
        let default_paths = [
            dirs::config_dir().map(|p| p.join("gravimon/config.toml")),
            dirs::home_dir().map(|p| p.join(".config/gravimon/config.toml")),
            dirs::home_dir().map(|p| p.join(".gravimon.toml")),
        ];

        for path in default_paths.iter().flatten() {
            if path.exists() {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file: {:?}", path))?;
                return toml::from_str(&content)
                    .with_context(|| format!("Failed to parse config file: {:?}", path));
            }
        }

        // Return defaults if no config file found
        Ok(Self::default())
    }

    /// Merge CLI config into settings (CLI takes precedence)
    pub fn merge_cli(&mut self, cli: &Config) {
        if let Some(refresh_interval) = cli.refresh_interval {
            self.refresh_interval_secs = refresh_interval;
        }
    }

    /// Validate and normalize settings values
    ///
    /// Enforces minimums and keeps the display tick strictly shorter than
    /// the refresh interval, so countdown rendering stays responsive.
    pub fn validate(&mut self) {
        const MIN_REFRESH_INTERVAL: u64 = 30;
        const MIN_TICK_INTERVAL: u64 = 1;
        const MIN_PROBE_TIMEOUT: u64 = 1;

        if self.refresh_interval_secs < MIN_REFRESH_INTERVAL {
            self.refresh_interval_secs = MIN_REFRESH_INTERVAL;
        }
        if self.tick_interval_secs < MIN_TICK_INTERVAL {
            self.tick_interval_secs = MIN_TICK_INTERVAL;
        }
        if self.probe_timeout_secs < MIN_PROBE_TIMEOUT {
            self.probe_timeout_secs = MIN_PROBE_TIMEOUT;
        }
        if self.tick_interval_secs >= self.refresh_interval_secs {
            self.tick_interval_secs =
                (self.refresh_interval_secs / 2).max(MIN_TICK_INTERVAL);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.refresh_interval_secs, 300);
        assert_eq!(settings.tick_interval_secs, 10);
        assert_eq!(settings.probe_timeout_secs, 4);
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
            refresh_interval_secs = 120
            tick_interval_secs = 5
        "#;

        let settings: Settings = toml::from_str(toml).expect("Should parse TOML");
        assert_eq!(settings.refresh_interval_secs, 120);
        assert_eq!(settings.tick_interval_secs, 5);
        assert_eq!(settings.probe_timeout_secs, 4);
    }

    #[test]
    fn test_validate_clamps_minimums() {
        let mut settings = Settings {
            refresh_interval_secs: 1,
            tick_interval_secs: 0,
            probe_timeout_secs: 0,
        };
        settings.validate();
        assert_eq!(settings.refresh_interval_secs, 30);
        assert_eq!(settings.probe_timeout_secs, 1);
        assert!(settings.tick_interval_secs >= 1);
        assert!(settings.tick_interval_secs < settings.refresh_interval_secs);
    }

    #[test]
    fn test_validate_keeps_tick_shorter_than_refresh() {
        let mut settings = Settings {
            refresh_interval_secs: 60,
            tick_interval_secs: 90,
            probe_timeout_secs: 4,
        };
        settings.validate();
        assert_eq!(settings.tick_interval_secs, 30);
    }
}
