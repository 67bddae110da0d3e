// src/config.rs

//! Configuration for the compositor host.
//!
//! Settings are grouped into small structs with individual defaults so a
//! configuration file only needs to name what it overrides. On hardware
//! these values are baked in at build time; the host simulator can load
//! them from a JSON file instead.

use std::path::Path;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::geometry::Size;

/// Process-wide default configuration.
pub static CONFIG: Lazy<Config> = Lazy::new(Config::default);

/// Root of the configuration tree.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub display: DisplayConfig,
    pub timing: TimingConfig,
    pub system: SystemConfig,
}

impl Config {
    /// Loads a configuration file, filling missing fields with defaults.
    pub fn load(path: &Path) -> Result<Config> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }
}

/// Physical display panel parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Panel width in pixels.
    pub cols: u32,
    /// Panel height in pixels.
    pub rows: u32,
    /// Simulated flush latency of the headless driver, in poll cycles.
    pub flush_latency_polls: u32,
}

impl DisplayConfig {
    pub fn size(&self) -> Size {
        Size::new(self.cols, self.rows)
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            cols: 200,
            rows: 228,
            flush_latency_polls: 1,
        }
    }
}

/// Kernel-loop pacing and default animation timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Nominal interval between kernel cycles in milliseconds.
    pub frame_interval_ms: u64,
    /// Default duration of modal transitions in milliseconds.
    pub transition_duration_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        TimingConfig {
            frame_interval_ms: 33,
            transition_duration_ms: 250,
        }
    }
}

/// System-level compositing knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    /// Rows the bezeled app image is shifted down to make room for a
    /// system peek overlay. Clamped to the top bezel height at composite
    /// time.
    pub bezel_peek_offset: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        SystemConfig {
            bezel_peek_offset: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_describe_the_round_panel() {
        let config = Config::default();
        assert_eq!(config.display.size(), Size::new(200, 228));
        assert_eq!(config.timing.transition_duration_ms, 250);
        assert_eq!(config.system.bezel_peek_offset, 0);
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: Config =
            serde_json::from_str(r#"{ "display": { "cols": 144, "rows": 168 } }"#).unwrap();
        assert_eq!(config.display.size(), Size::new(144, 168));
        assert_eq!(config.display.flush_latency_polls, 1);
        assert_eq!(config.timing.frame_interval_ms, 33);
    }
}
