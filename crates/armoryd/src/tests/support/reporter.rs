//! Health reporter that records events for assertions.

use std::sync::Mutex;

use armory_config::Config;

use crate::bootstrap::BootstrapError;
use crate::dispatch::SessionSummary;
use crate::health::HealthReporter;

/// Structured health events tracked during tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthEvent {
    /// Bootstrap started.
    BootstrapStarting,
    /// Bootstrap completed with this many registered plugins.
    BootstrapSucceeded {
        /// Registered plugin count.
        plugins: usize,
    },
    /// Bootstrap failed with an error description.
    BootstrapFailed(String),
    /// The request stream closed.
    SessionFinished(SessionSummary),
}

/// Records health events for assertions.
#[derive(Default)]
pub struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    /// Captures a copy of the recorded events.
    pub fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .clone()
    }

    fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self) {
        self.record(HealthEvent::BootstrapStarting);
    }

    fn bootstrap_succeeded(&self, _config: &Config, plugins: usize) {
        self.record(HealthEvent::BootstrapSucceeded { plugins });
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.record(HealthEvent::BootstrapFailed(error.to_string()));
    }

    fn session_finished(&self, summary: &SessionSummary) {
        self.record(HealthEvent::SessionFinished(*summary));
    }
}
