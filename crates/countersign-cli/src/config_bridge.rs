//! Bridge from `countersign_config::Config` to domain types.

use std::time::Duration;

use countersign_config::Config;
use countersign_step::{ReviewerSource, StepSettings};
use countersign_telemetry::{FileRotation, LogConfig, LogFormat, LogTarget};

/// File name prefix for rolling log files.
const LOG_FILE_PREFIX: &str = "countersign";

/// Convert config to [`StepSettings`].
#[must_use]
pub(crate) fn to_step_settings(cfg: &Config) -> StepSettings {
    let reviewer = cfg.step.reviewer.parse().unwrap_or(ReviewerSource::Requester);
    StepSettings::default()
        .with_settling_delay(Duration::from_millis(cfg.step.settling_delay_ms))
        .with_reviewer(reviewer)
}

/// Convert config to [`LogConfig`].
#[must_use]
pub(crate) fn to_log_config(cfg: &Config) -> LogConfig {
    let logging = &cfg.logging;
    let format = logging.format.parse().unwrap_or(LogFormat::Compact);
    let log = LogConfig::new(&logging.level).with_format(format);

    match logging.target.as_str() {
        "stdout" => log.with_target(LogTarget::Stdout),
        "file" => {
            let rotation = logging.rotation.parse().unwrap_or(FileRotation::Daily);
            log.with_file_logging(&logging.directory, LOG_FILE_PREFIX, rotation)
        },
        _ => log.with_target(LogTarget::Stderr),
    }
}
