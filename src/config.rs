//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! Every section and field has a default, so an empty file (or no file at all)
//! yields the stock ground-station setup.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::command::source::DEFAULT_COMMAND_FILE;
use crate::error::{GroundLinkError, Result};
use crate::scheduler::control_loop::{
    DEFAULT_MIN_SEND_SPACING_MS, DEFAULT_SEND_PERIOD_MS, DEFAULT_TICK_MS,
};
use crate::scheduler::WorkMode;
use crate::telemetry::sink::DEFAULT_TELEMETRY_FILE;
use crate::telemetry::snapshotter::DEFAULT_TELEMETRY_PERIOD_MS;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// IPC file locations
#[derive(Debug, Deserialize, Clone)]
pub struct PathsConfig {
    #[serde(default = "default_command_file")]
    pub command_file: String,

    #[serde(default = "default_telemetry_file")]
    pub telemetry_file: String,
}

/// Joystick configuration
#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    #[serde(default = "default_input_enabled")]
    pub enabled: bool,

    /// evdev node; empty means auto-detect
    #[serde(default)]
    pub device_path: String,
}

/// Control loop configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SchedulerConfig {
    #[serde(default = "default_send_period_ms")]
    pub send_period_ms: u64,

    #[serde(default = "default_min_send_spacing_ms")]
    pub min_send_spacing_ms: u64,

    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,

    #[serde(default)]
    pub mode: WorkMode,
}

/// Telemetry output configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TelemetryConfig {
    #[serde(default = "default_telemetry_enabled")]
    pub enabled: bool,

    #[serde(default = "default_update_period_ms")]
    pub update_period_ms: u64,
}

// Default value functions
fn default_command_file() -> String { DEFAULT_COMMAND_FILE.to_string() }
fn default_telemetry_file() -> String { DEFAULT_TELEMETRY_FILE.to_string() }

fn default_input_enabled() -> bool { true }

fn default_send_period_ms() -> u64 { DEFAULT_SEND_PERIOD_MS }
fn default_min_send_spacing_ms() -> u64 { DEFAULT_MIN_SEND_SPACING_MS }
fn default_tick_ms() -> u64 { DEFAULT_TICK_MS }

fn default_telemetry_enabled() -> bool { true }
fn default_update_period_ms() -> u64 { DEFAULT_TELEMETRY_PERIOD_MS }

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            command_file: default_command_file(),
            telemetry_file: default_telemetry_file(),
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            enabled: default_input_enabled(),
            device_path: String::new(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            send_period_ms: default_send_period_ms(),
            min_send_spacing_ms: default_min_send_spacing_ms(),
            tick_ms: default_tick_ms(),
            mode: WorkMode::default(),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: default_telemetry_enabled(),
            update_period_ms: default_update_period_ms(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use rc_groundlink::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        if self.paths.command_file.is_empty() {
            return Err(invalid("command_file cannot be empty"));
        }

        if self.telemetry.enabled && self.paths.telemetry_file.is_empty() {
            return Err(invalid("telemetry_file cannot be empty when telemetry is enabled"));
        }

        if self.paths.command_file == self.paths.telemetry_file {
            return Err(invalid("command_file and telemetry_file must differ"));
        }

        // Validate timing fields
        let scheduler = &self.scheduler;
        if scheduler.send_period_ms == 0 || scheduler.send_period_ms > 1000 {
            return Err(invalid("send_period_ms must be between 1 and 1000"));
        }

        if scheduler.min_send_spacing_ms == 0
            || scheduler.min_send_spacing_ms > scheduler.send_period_ms
        {
            return Err(invalid("min_send_spacing_ms must be between 1 and send_period_ms"));
        }

        if scheduler.tick_ms == 0 || scheduler.tick_ms > scheduler.min_send_spacing_ms {
            return Err(invalid("tick_ms must be between 1 and min_send_spacing_ms"));
        }

        if self.telemetry.update_period_ms == 0 || self.telemetry.update_period_ms > 60000 {
            return Err(invalid("update_period_ms must be between 1 and 60000"));
        }

        Ok(())
    }
}

fn invalid(msg: &str) -> GroundLinkError {
    GroundLinkError::Config(toml::de::Error::custom(msg))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_valid_config() -> Config {
        Config {
            paths: PathsConfig {
                command_file: default_command_file(),
                telemetry_file: default_telemetry_file(),
            },
            input: InputConfig {
                enabled: default_input_enabled(),
                device_path: String::new(),
            },
            scheduler: SchedulerConfig {
                send_period_ms: default_send_period_ms(),
                min_send_spacing_ms: default_min_send_spacing_ms(),
                tick_ms: default_tick_ms(),
                mode: WorkMode::Manual,
            },
            telemetry: TelemetryConfig {
                enabled: default_telemetry_enabled(),
                update_period_ms: default_update_period_ms(),
            },
        }
    }

    #[test]
    fn test_default_config() {
        assert!(create_valid_config().validate().is_ok());
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.paths.command_file, "/tmp/crsf_command.txt");
        assert_eq!(config.paths.telemetry_file, "/tmp/crsf_telemetry.dat");
        assert_eq!(config.scheduler.send_period_ms, 10);
        assert_eq!(config.scheduler.mode, WorkMode::Manual);
        assert_eq!(config.telemetry.update_period_ms, 20);
    }

    #[test]
    fn test_load_config_from_file() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let toml_content = r#"
[paths]
command_file = "/run/groundlink/cmd.txt"

[input]
device_path = "/dev/input/event3"

[scheduler]
mode = "joystick"
send_period_ms = 4

[telemetry]
enabled = false
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = Config::load(temp_file.path()).unwrap();
        assert_eq!(config.paths.command_file, "/run/groundlink/cmd.txt");
        assert_eq!(config.input.device_path, "/dev/input/event3");
        assert!(config.input.enabled);
        assert_eq!(config.scheduler.mode, WorkMode::Joystick);
        assert_eq!(config.scheduler.send_period_ms, 4);
        assert_eq!(config.scheduler.min_send_spacing_ms, 2);
        assert!(!config.telemetry.enabled);
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load("/nonexistent/groundlink.toml");
        assert!(matches!(result, Err(GroundLinkError::Io(_))));
    }

    #[test]
    fn test_unknown_mode_rejected() {
        let result = Config::from_toml("[scheduler]\nmode = \"autopilot\"\n");
        assert!(matches!(result, Err(GroundLinkError::Config(_))));
    }

    #[test]
    fn test_empty_command_file() {
        let mut config = create_valid_config();
        config.paths.command_file = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_telemetry_file_when_enabled() {
        let mut config = create_valid_config();
        config.paths.telemetry_file = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_telemetry_file_when_disabled() {
        let mut config = create_valid_config();
        config.telemetry.enabled = false;
        config.paths.telemetry_file = String::new();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_same_command_and_telemetry_file() {
        let mut config = create_valid_config();
        config.paths.telemetry_file = config.paths.command_file.clone();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_send_period_zero() {
        let mut config = create_valid_config();
        config.scheduler.send_period_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_send_period_too_high() {
        let mut config = create_valid_config();
        config.scheduler.send_period_ms = 1001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_min_spacing_zero() {
        let mut config = create_valid_config();
        config.scheduler.min_send_spacing_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_min_spacing_above_period() {
        let mut config = create_valid_config();
        config.scheduler.min_send_spacing_ms = 11;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_min_spacing_equal_to_period() {
        let mut config = create_valid_config();
        config.scheduler.min_send_spacing_ms = 10;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_tick_zero() {
        let mut config = create_valid_config();
        config.scheduler.tick_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_tick_above_min_spacing() {
        let mut config = create_valid_config();
        config.scheduler.tick_ms = 3;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_update_period_zero() {
        let mut config = create_valid_config();
        config.telemetry.update_period_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_update_period_too_high() {
        let mut config = create_valid_config();
        config.telemetry.update_period_ms = 60001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_functions() {
        assert_eq!(default_command_file(), "/tmp/crsf_command.txt");
        assert_eq!(default_telemetry_file(), "/tmp/crsf_telemetry.dat");
        assert_eq!(default_input_enabled(), true);
        assert_eq!(default_send_period_ms(), 10);
        assert_eq!(default_min_send_spacing_ms(), 2);
        assert_eq!(default_tick_ms(), 1);
        assert_eq!(default_telemetry_enabled(), true);
        assert_eq!(default_update_period_ms(), 20);
    }
}
