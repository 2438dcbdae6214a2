//! Config file discovery and layered loading.
//!
//! `load` runs these steps:
//! 1. Parse the embedded `defaults.toml` as the base
//! 2. Merge `~/.countersign/config.toml` (user), if present
//! 3. Merge the explicit `--config` file, which must exist
//! 4. Apply env var fallbacks for fields neither file set
//! 5. Deserialize the merged tree into [`Config`]
//! 6. Validate

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::env::{apply_env_fallbacks, collect_env_vars};
use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;
use crate::validate;

/// Embedded default configuration.
const DEFAULTS_TOML: &str = include_str!("defaults.toml");

/// Maximum allowed config file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1_048_576;

/// A loaded configuration and where its values came from.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// The final configuration.
    pub config: Config,
    /// Config files that were merged, in precedence order.
    pub loaded_files: Vec<String>,
    /// Dotted paths of fields filled from environment variables.
    pub env_fields: Vec<String>,
}

/// Load the configuration from the real environment.
///
/// `countersign_home` replaces `~/.countersign` as the directory holding the
/// user config file.
///
/// # Errors
///
/// Returns a [`ConfigError`] if a file is malformed, the explicit file is
/// missing, or the merged configuration fails validation.
pub fn load(
    explicit: Option<&Path>,
    countersign_home: Option<&Path>,
) -> ConfigResult<ResolvedConfig> {
    load_with_env(explicit, countersign_home, &collect_env_vars())
}

/// Load the configuration with an explicit set of environment variables.
///
/// # Errors
///
/// See [`load`].
pub fn load_with_env<S: ::std::hash::BuildHasher>(
    explicit: Option<&Path>,
    countersign_home: Option<&Path>,
    env_vars: &HashMap<String, String, S>,
) -> ConfigResult<ResolvedConfig> {
    let mut merged: toml::Value =
        toml::from_str(DEFAULTS_TOML).map_err(|e| ConfigError::ParseError {
            path: "<embedded defaults>".to_owned(),
            source: e,
        })?;
    let mut set_by_files = HashSet::new();
    let mut loaded_files = Vec::new();

    let user_path = match countersign_home {
        Some(dir) => dir.join("config.toml"),
        None => home_directory()?.join(".countersign").join("config.toml"),
    };
    if let Some(overlay) = try_load_file(&user_path)? {
        deep_merge(&mut merged, &overlay, "", &mut set_by_files);
        loaded_files.push(user_path.display().to_string());
        info!(path = %user_path.display(), "loaded user config");
    }

    if let Some(path) = explicit {
        let overlay = try_load_file(path)?.ok_or_else(|| ConfigError::ReadError {
            path: path.display().to_string(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        })?;
        deep_merge(&mut merged, &overlay, "", &mut set_by_files);
        loaded_files.push(path.display().to_string());
        info!(path = %path.display(), "loaded config file");
    }

    let env_fields = apply_env_fallbacks(&mut merged, &set_by_files, env_vars)?;
    if !env_fields.is_empty() {
        debug!(count = env_fields.len(), "applied environment variable fallbacks");
    }

    let config: Config =
        merged
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::ParseError {
                path: "<merged config>".to_owned(),
                source: e,
            })?;
    validate::validate(&config)?;

    Ok(ResolvedConfig {
        config,
        loaded_files,
        env_fields,
    })
}

/// Try to load a file, returning `None` if it does not exist.
fn try_load_file(path: &Path) -> ConfigResult<Option<toml::Value>> {
    let content = match read_bounded(path) {
        Ok(c) => c,
        Err(ConfigError::ReadError { source, .. })
            if source.kind() == std::io::ErrorKind::NotFound =>
        {
            debug!(path = %path.display(), "config file not found, skipping");
            return Ok(None);
        },
        Err(e) => return Err(e),
    };

    let value: toml::Value = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(Some(value))
}

fn read_bounded(path: &Path) -> ConfigResult<String> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    if content.len() as u64 > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::ValidationError {
            field: path.display().to_string(),
            message: format!(
                "config file is {} bytes, exceeding the {MAX_CONFIG_FILE_SIZE} byte limit",
                content.len()
            ),
        });
    }
    Ok(content)
}

/// Merge `overlay` into `base`, recording every leaf path the overlay sets.
fn deep_merge(
    base: &mut toml::Value,
    overlay: &toml::Value,
    prefix: &str,
    set_paths: &mut HashSet<String>,
) {
    let (Some(base_table), Some(overlay_table)) = (base.as_table_mut(), overlay.as_table()) else {
        return;
    };

    for (key, value) in overlay_table {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match base_table.get_mut(key) {
            Some(existing) if existing.is_table() && value.is_table() => {
                deep_merge(existing, value, &path, set_paths);
            },
            _ => {
                base_table.insert(key.clone(), value.clone());
                set_paths.insert(path);
            },
        }
    }
}

/// Determine the user's home directory.
fn home_directory() -> ConfigResult<PathBuf> {
    directories::BaseDirs::new()
        .map(|d| d.home_dir().to_path_buf())
        .ok_or(ConfigError::NoHomeDir)
}
