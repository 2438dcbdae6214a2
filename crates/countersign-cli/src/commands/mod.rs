//! Subcommand implementations.

pub(crate) mod config;
pub(crate) mod definition;
pub(crate) mod simulate;
