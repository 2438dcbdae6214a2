//! Post-merge configuration validation.

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

/// Upper bound for the settling delay (one hour).
pub const MAX_SETTLING_DELAY_MS: u64 = 3_600_000;

/// Upper bound for the event queue depth.
const MAX_EVENT_BUFFER: usize = 65_536;

/// Accepted reviewer sources.
pub const REVIEWER_SOURCES: &[&str] = &["requester", "actor"];

/// Accepted log formats.
pub const LOG_FORMATS: &[&str] = &["pretty", "compact", "json", "full"];

/// Accepted log targets.
pub const LOG_TARGETS: &[&str] = &["stderr", "stdout", "file"];

/// Accepted log file rotations.
pub const LOG_ROTATIONS: &[&str] = &["daily", "hourly", "never"];

/// Validate a merged and deserialized configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_step(config)?;
    validate_host(config)?;
    validate_logging(config)?;
    Ok(())
}

fn validate_step(config: &Config) -> ConfigResult<()> {
    let s = &config.step;

    if s.settling_delay_ms > MAX_SETTLING_DELAY_MS {
        return Err(ConfigError::ValidationError {
            field: "step.settling_delay_ms".to_owned(),
            message: format!(
                "{} ms exceeds the {MAX_SETTLING_DELAY_MS} ms limit",
                s.settling_delay_ms
            ),
        });
    }

    if !REVIEWER_SOURCES.contains(&s.reviewer.as_str()) {
        return Err(ConfigError::ValidationError {
            field: "step.reviewer".to_owned(),
            message: format!(
                "unsupported reviewer source '{}'; expected one of: {}",
                s.reviewer,
                REVIEWER_SOURCES.join(", ")
            ),
        });
    }

    Ok(())
}

fn validate_host(config: &Config) -> ConfigResult<()> {
    let buffer = config.host.event_buffer;
    if buffer == 0 || buffer > MAX_EVENT_BUFFER {
        return Err(ConfigError::ValidationError {
            field: "host.event_buffer".to_owned(),
            message: format!("{buffer} is out of range; must be between 1 and {MAX_EVENT_BUFFER}"),
        });
    }
    Ok(())
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    let l = &config.logging;

    if l.level.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "logging.level".to_owned(),
            message: "must not be empty".to_owned(),
        });
    }

    if !LOG_FORMATS.contains(&l.format.as_str()) {
        return Err(ConfigError::ValidationError {
            field: "logging.format".to_owned(),
            message: format!(
                "unsupported format '{}'; expected one of: {}",
                l.format,
                LOG_FORMATS.join(", ")
            ),
        });
    }

    if !LOG_TARGETS.contains(&l.target.as_str()) {
        return Err(ConfigError::ValidationError {
            field: "logging.target".to_owned(),
            message: format!(
                "unsupported target '{}'; expected one of: {}",
                l.target,
                LOG_TARGETS.join(", ")
            ),
        });
    }

    if !LOG_ROTATIONS.contains(&l.rotation.as_str()) {
        return Err(ConfigError::ValidationError {
            field: "logging.rotation".to_owned(),
            message: format!(
                "unsupported rotation '{}'; expected one of: {}",
                l.rotation,
                LOG_ROTATIONS.join(", ")
            ),
        });
    }

    if l.target == "file" && l.directory.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "logging.directory".to_owned(),
            message: "must not be empty when logging to files".to_owned(),
        });
    }

    Ok(())
}
