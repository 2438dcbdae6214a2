//! Countersign Test - Shared test utilities.
//!
//! Mock collaborators and fixtures used as a dev-dependency across the
//! workspace.
//!
//! ```rust,ignore
//! use countersign_test::{MockTransport, RecordingHost, expense_request};
//!
//! #[tokio::test]
//! async fn test_posts_to_channel() {
//!     let transport = MockTransport::new();
//!     let host = RecordingHost::new();
//!     // build the step with Arc::new(transport.clone()), Arc::new(host.clone())
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod fixtures;
pub mod harness;
pub mod mocks;

pub use fixtures::*;
pub use harness::*;
pub use mocks::*;
