//! Structured health reporting for daemon lifecycle events.

use std::sync::Arc;

use armory_config::Config;

use crate::bootstrap::BootstrapError;
use crate::dispatch::SessionSummary;

const HEALTH_TARGET: &str = "armoryd::health";

/// Observer trait used to surface lifecycle events to telemetry sinks.
pub trait HealthReporter: Send + Sync {
    /// Invoked before configuration loading begins.
    fn bootstrap_starting(&self);

    /// Invoked after bootstrap completes successfully.
    fn bootstrap_succeeded(&self, config: &Config, plugins: usize);

    /// Invoked when bootstrap fails.
    fn bootstrap_failed(&self, error: &BootstrapError);

    /// Invoked once the request stream is exhausted.
    fn session_finished(&self, summary: &SessionSummary);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter,
{
    fn bootstrap_starting(&self) {
        (**self).bootstrap_starting();
    }

    fn bootstrap_succeeded(&self, config: &Config, plugins: usize) {
        (**self).bootstrap_succeeded(config, plugins);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }

    fn session_finished(&self, summary: &SessionSummary) {
        (**self).session_finished(summary);
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_starting",
            "starting daemon bootstrap"
        );
    }

    fn bootstrap_succeeded(&self, config: &Config, plugins: usize) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_succeeded",
            plugins,
            log_filter = %config.log_filter(),
            log_format = %config.log_format(),
            max_input_bytes = config.max_input_bytes(),
            queue_capacity = config.queue_capacity(),
            "daemon bootstrap completed"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "bootstrap_failed",
            error = %error,
            "daemon bootstrap failed"
        );
    }

    fn session_finished(&self, summary: &SessionSummary) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "session_finished",
            requests = summary.requests,
            rejected = summary.rejected,
            failed = summary.failed,
            "request stream closed"
        );
    }
}
