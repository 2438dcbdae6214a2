//! Shared harness for the end-to-end scenarios.

use std::sync::Arc;
use std::time::Duration;

use countersign_host::{DEFAULT_EVENT_BUFFER, HostHandle, HostRuntime, InMemoryHost};
use countersign_step::StepSettings;
use countersign_test::{MockTransport, init_test_tracing};
use tokio::task::JoinHandle;

/// A running host runtime wired to a mock transport.
#[allow(dead_code)]
pub struct Harness {
    /// Shared execution store.
    pub host: InMemoryHost,
    /// Records every posted approval message.
    pub transport: MockTransport,
    /// Sender side of the runtime.
    pub handle: HostHandle,
    runtime: JoinHandle<()>,
}

#[allow(dead_code)]
impl Harness {
    /// Start a runtime with the given step settings.
    pub fn start(settings: StepSettings) -> Self {
        Self::with_transport(MockTransport::new(), settings)
    }

    /// Start a runtime with default settings (5 s settling delay).
    pub fn with_defaults() -> Self {
        Self::start(StepSettings::default())
    }

    /// Start a runtime with no settling delay.
    pub fn immediate() -> Self {
        Self::start(StepSettings::default().with_settling_delay(Duration::ZERO))
    }

    /// Start a runtime around a pre-configured transport.
    pub fn with_transport(transport: MockTransport, settings: StepSettings) -> Self {
        init_test_tracing();
        let host = InMemoryHost::new();
        let (runtime, handle) = HostRuntime::new(
            host.clone(),
            Arc::new(transport.clone()),
            settings,
            DEFAULT_EVENT_BUFFER,
        );
        Self {
            host,
            transport,
            handle,
            runtime: tokio::spawn(runtime.run()),
        }
    }

    /// Drop the handle and wait for in-flight clicks to finish.
    pub async fn shutdown(self) -> InMemoryHost {
        drop(self.handle);
        self.runtime.await.unwrap();
        self.host
    }
}
