//! `countersign config ...`

use std::fmt::Write as _;

use anyhow::{Context, Result};

use countersign_config::ResolvedConfig;

/// Print the resolved configuration as TOML, headed by where it came from.
pub(crate) fn show_config(resolved: &ResolvedConfig) -> Result<()> {
    print!("{}", render(resolved)?);
    Ok(())
}

fn render(resolved: &ResolvedConfig) -> Result<String> {
    let body = resolved
        .config
        .to_toml()
        .context("failed to serialize configuration")?;

    let mut out = String::from("# Resolved Countersign configuration\n");
    if resolved.loaded_files.is_empty() {
        out.push_str("# No config files loaded; using defaults.\n");
    } else {
        out.push_str("# Loaded files (in precedence order):\n");
        for (i, path) in resolved.loaded_files.iter().enumerate() {
            let _ = writeln!(out, "#   {}. {path}", i.saturating_add(1));
        }
    }
    for field in &resolved.env_fields {
        let _ = writeln!(out, "# {field} set from environment");
    }
    out.push('\n');
    out.push_str(&body);
    Ok(out)
}
