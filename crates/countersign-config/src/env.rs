//! Environment variable fallbacks.
//!
//! Env vars are fallbacks, not overrides: they only fill fields that no
//! config file set.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::error::{ConfigError, ConfigResult};

/// Kind of value a field holds, for coercing env strings.
#[derive(Clone, Copy)]
enum FieldKind {
    Integer,
    String,
}

/// Mapping from environment variable name to config field path.
struct EnvMapping {
    var_name: &'static str,
    field_path: &'static str,
    kind: FieldKind,
}

/// All supported `COUNTERSIGN_*` env var mappings.
const ENV_MAPPINGS: &[EnvMapping] = &[
    EnvMapping {
        var_name: "COUNTERSIGN_SETTLING_DELAY_MS",
        field_path: "step.settling_delay_ms",
        kind: FieldKind::Integer,
    },
    EnvMapping {
        var_name: "COUNTERSIGN_REVIEWER",
        field_path: "step.reviewer",
        kind: FieldKind::String,
    },
    EnvMapping {
        var_name: "COUNTERSIGN_EVENT_BUFFER",
        field_path: "host.event_buffer",
        kind: FieldKind::Integer,
    },
    EnvMapping {
        var_name: "COUNTERSIGN_LOG_LEVEL",
        field_path: "logging.level",
        kind: FieldKind::String,
    },
    EnvMapping {
        var_name: "COUNTERSIGN_LOG_FORMAT",
        field_path: "logging.format",
        kind: FieldKind::String,
    },
    EnvMapping {
        var_name: "COUNTERSIGN_LOG_TARGET",
        field_path: "logging.target",
        kind: FieldKind::String,
    },
    EnvMapping {
        var_name: "COUNTERSIGN_LOG_DIR",
        field_path: "logging.directory",
        kind: FieldKind::String,
    },
];

/// Snapshot the process environment.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars().collect()
}

/// Apply env var fallbacks to fields not listed in `set_by_files`.
///
/// Returns the dotted paths of the fields that were filled.
///
/// # Errors
///
/// [`ConfigError::EnvError`] if a numeric field's variable does not parse.
pub fn apply_env_fallbacks<S: ::std::hash::BuildHasher>(
    merged: &mut toml::Value,
    set_by_files: &HashSet<String>,
    env_vars: &HashMap<String, String, S>,
) -> ConfigResult<Vec<String>> {
    let mut applied = Vec::new();

    for mapping in ENV_MAPPINGS {
        if set_by_files.contains(mapping.field_path) {
            continue;
        }
        let Some(raw) = env_vars.get(mapping.var_name) else {
            continue;
        };

        let value = coerce(mapping, raw)?;
        debug!(
            var = mapping.var_name,
            field = mapping.field_path,
            "applying env var fallback"
        );
        set_field(merged, mapping.field_path, value);
        applied.push(mapping.field_path.to_owned());
    }

    Ok(applied)
}

fn coerce(mapping: &EnvMapping, raw: &str) -> ConfigResult<toml::Value> {
    match mapping.kind {
        FieldKind::String => Ok(toml::Value::String(raw.to_owned())),
        FieldKind::Integer => raw
            .trim()
            .parse::<i64>()
            .ok()
            .filter(|n| *n >= 0)
            .map(toml::Value::Integer)
            .ok_or_else(|| ConfigError::EnvError {
                var_name: mapping.var_name.to_owned(),
                message: format!("expected a non-negative integer, got '{raw}'"),
            }),
    }
}

/// Set a dotted `section.field` path, creating the section table if needed.
fn set_field(root: &mut toml::Value, path: &str, value: toml::Value) {
    let Some((section, field)) = path.split_once('.') else {
        return;
    };
    let Some(root) = root.as_table_mut() else {
        return;
    };
    let section = root
        .entry(section.to_owned())
        .or_insert(toml::Value::Table(toml::map::Map::new()));
    if let Some(table) = section.as_table_mut() {
        table.insert(field.to_owned(), value);
    }
}
