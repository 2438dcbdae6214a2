//! Countersign Telemetry - logging setup on top of `tracing`.
//!
//! Library crates only emit `tracing` events; the binary calls
//! [`setup_logging`] once at startup.
//!
//! # Example
//!
//! ```rust,no_run
//! use countersign_telemetry::{LogConfig, LogFormat, setup_logging};
//!
//! # fn main() -> Result<(), countersign_telemetry::TelemetryError> {
//! let config = LogConfig::new("info")
//!     .with_format(LogFormat::Compact)
//!     .with_directive("countersign_step=debug");
//!
//! setup_logging(&config)?;
//! tracing::info!("ready");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{
    FileLogConfig, FileRotation, LogConfig, LogFormat, LogTarget, setup_logging,
};
