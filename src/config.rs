use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub timing: TimingConfig,
    pub runner: RunnerConfig,
    pub osc: OscConfig,
}

impl Config {
    /// Load configuration from the default location, creating it if absent
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Config::default();
            config.save_to(&config_path)?;
            Ok(config)
        }
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Get config file path
    pub fn config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME")?;
        Ok(PathBuf::from(home).join(".config/json-group-deck/config.toml"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Holds longer than this refresh the whole device instead of triggering
    pub long_press_ms: u64,
    /// Delay padded onto short delay lists
    pub default_delay_ms: u64,
    /// Pause between buttons during a device refresh
    pub refresh_pause_ms: u64,
}

impl TimingConfig {
    pub fn long_press(&self) -> Duration {
        Duration::from_millis(self.long_press_ms)
    }

    pub fn refresh_pause(&self) -> Duration {
        Duration::from_millis(self.refresh_pause_ms)
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            long_press_ms: 2000,
            default_delay_ms: 500,
            refresh_pause_ms: 200,
        }
    }
}

/// When the sequencer waits after a step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DelayPolicy {
    /// Wait only after steps that succeeded
    #[default]
    SkipOnFailure,
    /// Wait after every step regardless of outcome
    Always,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Interpreter used for scripts and inline commands
    pub interpreter: String,
    pub delay_policy: DelayPolicy,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            interpreter: "pwsh".to_string(),
            delay_policy: DelayPolicy::SkipOnFailure,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OscConfig {
    /// Target address for OSC messages
    pub host: String,
    /// Target port for OSC messages
    pub port: u16,
    /// Module providing `Send-OscMessage`
    pub module: String,
    /// Send to each command's own port instead of `port`
    pub use_command_port: bool,
}

impl Default for OscConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            module: "SendOscModule".to_string(),
            use_command_port: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.timing.long_press(), Duration::from_secs(2));
        assert_eq!(config.timing.default_delay_ms, 500);
        assert_eq!(config.timing.refresh_pause(), Duration::from_millis(200));
        assert_eq!(config.runner.interpreter, "pwsh");
        assert_eq!(config.runner.delay_policy, DelayPolicy::SkipOnFailure);
        assert_eq!(config.osc.host, "127.0.0.1");
        assert_eq!(config.osc.port, 8000);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [timing]
            long_press_ms = 1500

            [runner]
            delay_policy = "always"
            "#,
        )
        .unwrap();

        assert_eq!(config.timing.long_press_ms, 1500);
        assert_eq!(config.timing.default_delay_ms, 500);
        assert_eq!(config.runner.delay_policy, DelayPolicy::Always);
        assert_eq!(config.runner.interpreter, "pwsh");
        assert_eq!(config.osc.module, "SendOscModule");
    }

    #[test]
    fn test_save_and_load_from() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.toml");

        let mut config = Config::default();
        config.osc.port = 9000;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.osc.port, 9000);
    }

    #[test]
    fn test_load_from_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load_from(&dir.path().join("absent.toml")).is_err());
    }
}
