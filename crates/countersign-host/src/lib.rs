//! Countersign Host - A reference workflow host for the approval step.
//!
//! - [`InMemoryHost`] keeps execution records, enforces the function's input
//!   and output schemas, and accepts at most one completion per execution.
//! - [`HostRuntime`] is the inbound event queue: invocations and clicks are
//!   sent through a [`HostHandle`] and dispatched to the step.
//!
//! # Example
//!
//! ```rust,ignore
//! let host = InMemoryHost::new();
//! let (runtime, handle) = HostRuntime::new(host.clone(), transport, StepSettings::default(), 64);
//! tokio::spawn(runtime.run());
//!
//! let execution_id = handle.invoke(inputs).await?;
//! let decision = handle.click(execution_id, "approve_request", "U2".into()).await?;
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

/// Runtime error types.
pub mod error;
pub mod memory;
pub mod runtime;

pub use error::RuntimeError;
pub use memory::InMemoryHost;
pub use runtime::{DEFAULT_EVENT_BUFFER, HostEvent, HostHandle, HostRuntime};
