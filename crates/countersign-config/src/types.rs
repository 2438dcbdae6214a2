//! Configuration struct definitions.
//!
//! Field values are plain data (strings and integers). Turning them into
//! domain types is the job of the binary's config bridge.

use serde::{Deserialize, Serialize};

/// The complete Countersign configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Approval step behaviour.
    pub step: StepSection,
    /// Host runtime settings.
    pub host: HostSection,
    /// Logging settings.
    pub logging: LoggingSection,
}

/// `[step]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepSection {
    /// Pause between a click and the completion report, in milliseconds.
    pub settling_delay_ms: u64,
    /// Reviewer source: `requester` or `actor`.
    pub reviewer: String,
}

impl Default for StepSection {
    fn default() -> Self {
        Self {
            settling_delay_ms: 5000,
            reviewer: "requester".to_owned(),
        }
    }
}

/// `[host]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostSection {
    /// Depth of the inbound event queue.
    pub event_buffer: usize,
}

impl Default for HostSection {
    fn default() -> Self {
        Self { event_buffer: 64 }
    }
}

/// `[logging]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Filter directive, e.g. `info` or `countersign_step=debug`.
    pub level: String,
    /// Output format: `pretty`, `compact`, `json` or `full`.
    pub format: String,
    /// Destination: `stderr`, `stdout` or `file`.
    pub target: String,
    /// Directory for rolling log files when `target` is `file`.
    pub directory: String,
    /// File rotation: `daily`, `hourly` or `never`.
    pub rotation: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "compact".to_owned(),
            target: "stderr".to_owned(),
            directory: "logs".to_owned(),
            rotation: "daily".to_owned(),
        }
    }
}

impl Config {
    /// Render the configuration as TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
