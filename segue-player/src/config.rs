//! Configuration for the segue playback controller
//!
//! One TOML file, all keys optional. Missing keys take built-in defaults,
//! a missing file means all defaults.
//!
//! # Settings Sources Priority
//!
//! 1. Command-line arguments (`--config`, `--repeat`)
//! 2. Environment variable (`SEGUE_CONFIG`)
//! 3. Per-user TOML file (`<config dir>/segue/config.toml`)
//! 4. Built-in defaults (code constants)

use crate::error::{Error, Result};
use segue_common::{FadeCurve, RepeatMode};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "SEGUE_CONFIG";

/// Playback controller configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    // === Timeline ===
    /// Position-sampling tick interval
    pub tick_interval_ms: u64,

    // === Transition Detection ===
    /// Remaining time at or below which the handoff fires
    pub end_threshold_ms: u64,

    // === Volume Envelopes ===
    pub fade_out_steps: u32,
    pub fade_out_duration_ms: u64,
    pub fade_in_steps: u32,
    pub fade_in_duration_ms: u64,
    /// Fade the next item in after an automatic handoff
    pub fade_in_enabled: bool,
    pub fade_curve: FadeCurve,

    // === Playback Policy ===
    /// Pause before seek-to-zero on single-track repeat
    pub repeat_settle_delay_ms: u64,
    /// Auto-start after the engine prepares a newly loaded item
    pub play_when_ready: bool,
    pub repeat_mode: RepeatMode,

    // === Events ===
    pub event_capacity: usize,

    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 10,
            end_threshold_ms: 100,
            fade_out_steps: 5,
            fade_out_duration_ms: 200,
            fade_in_steps: 20,
            fade_in_duration_ms: 350,
            fade_in_enabled: true,
            fade_curve: FadeCurve::Quadratic,
            repeat_settle_delay_ms: 100,
            play_when_ready: true,
            repeat_mode: RepeatMode::Off,
            event_capacity: 100,
            logging: LoggingConfig::default(),
        }
    }
}

impl PlayerConfig {
    /// Resolve, load and validate the config file
    pub fn load(cli_path: Option<&Path>) -> Result<Self> {
        let config: Self = segue_common::config::load_or_default(cli_path, CONFIG_ENV_VAR)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = segue_common::config::parse_toml(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the timeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.tick_interval_ms == 0 {
            return Err(Error::Config("tick_interval_ms must be > 0".to_string()));
        }
        if self.fade_out_steps == 0 {
            return Err(Error::Config("fade_out_steps must be > 0".to_string()));
        }
        if self.fade_in_steps == 0 {
            return Err(Error::Config("fade_in_steps must be > 0".to_string()));
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn end_threshold(&self) -> Duration {
        Duration::from_millis(self.end_threshold_ms)
    }

    pub fn fade_out_duration(&self) -> Duration {
        Duration::from_millis(self.fade_out_duration_ms)
    }

    pub fn fade_in_duration(&self) -> Duration {
        Duration::from_millis(self.fade_in_duration_ms)
    }

    pub fn repeat_settle_delay(&self) -> Duration {
        Duration::from_millis(self.repeat_settle_delay_ms)
    }

    /// Remaining time at which the fade-out starts
    ///
    /// The fade-out finishes exactly when the handoff threshold is reached.
    pub fn fade_out_lead(&self) -> Duration {
        self.end_threshold() + self.fade_out_duration()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PlayerConfig::default();
        assert_eq!(config.tick_interval(), Duration::from_millis(10));
        assert_eq!(config.fade_out_steps, 5);
        assert_eq!(config.fade_in_steps, 20);
        assert_eq!(config.fade_out_lead(), Duration::from_millis(300));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = PlayerConfig::from_toml_str(
            r#"
            end_threshold_ms = 150
            repeat_mode = "queue"
            fade_curve = "linear"

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.end_threshold(), Duration::from_millis(150));
        assert_eq!(config.repeat_mode, RepeatMode::Queue);
        assert_eq!(config.fade_curve, FadeCurve::Linear);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.fade_in_duration_ms, 350);
    }

    #[test]
    fn test_zero_steps_rejected() {
        let result = PlayerConfig::from_toml_str("fade_out_steps = 0");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_unknown_repeat_mode_rejected() {
        let result = PlayerConfig::from_toml_str("repeat_mode = \"sometimes\"");
        assert!(matches!(result, Err(Error::Common(_))));
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("segue.toml");
        std::fs::write(&path, "tick_interval_ms = 20\nplay_when_ready = false\n").unwrap();

        let config = PlayerConfig::load(Some(path.as_path())).unwrap();
        assert_eq!(config.tick_interval(), Duration::from_millis(20));
        assert!(!config.play_when_ready);
    }

    #[test]
    fn test_load_invalid_file_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("segue.toml");
        std::fs::write(&path, "tick_interval_ms = 0\n").unwrap();

        assert!(matches!(
            PlayerConfig::load(Some(path.as_path())),
            Err(Error::Config(_))
        ));
    }
}
