//! Step settings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default wait between a click and the completion report.
pub const DEFAULT_SETTLING_DELAY: Duration = Duration::from_secs(5);

/// Who is recorded as the reviewer of a decision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewerSource {
    /// The original requester, whoever clicked.
    #[default]
    Requester,
    /// The user who clicked the action.
    Actor,
}

impl fmt::Display for ReviewerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Requester => write!(f, "requester"),
            Self::Actor => write!(f, "actor"),
        }
    }
}

impl FromStr for ReviewerSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "requester" => Ok(Self::Requester),
            "actor" => Ok(Self::Actor),
            other => Err(format!(
                "unknown reviewer source '{other}' (expected 'requester' or 'actor')"
            )),
        }
    }
}

/// Tunables of the approval step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepSettings {
    /// Wait applied after a click, before completion.
    pub settling_delay: Duration,
    /// Reviewer attribution.
    pub reviewer: ReviewerSource,
}

impl Default for StepSettings {
    fn default() -> Self {
        Self {
            settling_delay: DEFAULT_SETTLING_DELAY,
            reviewer: ReviewerSource::default(),
        }
    }
}

impl StepSettings {
    /// Set the settling delay.
    #[must_use]
    pub fn with_settling_delay(mut self, delay: Duration) -> Self {
        self.settling_delay = delay;
        self
    }

    /// Set the reviewer attribution.
    #[must_use]
    pub fn with_reviewer(mut self, reviewer: ReviewerSource) -> Self {
        self.reviewer = reviewer;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = StepSettings::default();
        assert_eq!(settings.settling_delay, Duration::from_secs(5));
        assert_eq!(settings.reviewer, ReviewerSource::Requester);
    }

    #[test]
    fn test_reviewer_source_parse() {
        assert_eq!(
            "actor".parse::<ReviewerSource>().unwrap(),
            ReviewerSource::Actor
        );
        assert_eq!(ReviewerSource::Requester.to_string(), "requester");
        assert!("clicker".parse::<ReviewerSource>().is_err());
    }
}
