//! Daemon bootstrap orchestration.

use std::io::{BufRead, Write};
use std::sync::Arc;

use armory_config::{Config, LimitError};
use armory_jobs::{JobSubmitter, MemoryQueue};
use armory_plugins::{ClassRegistry, Pipeline, RegistryError};
use ortho_config::{OrthoConfig, OrthoError};
use thiserror::Error;

use crate::dispatch::{DispatchError, Dispatcher, Session, SessionSummary};
use crate::health::HealthReporter;
use crate::telemetry::{self, TelemetryError, TelemetryHandle};

/// Trait abstracting configuration loading for testability.
pub trait ConfigLoader: Send + Sync {
    /// Loads the daemon configuration.
    ///
    /// # Errors
    ///
    /// Returns the loader's diagnostic when no configuration can be built.
    fn load(&self) -> Result<Config, Arc<OrthoError>>;
}

/// Loader that delegates to [`Config::load`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load()
    }
}

/// Loader returning a fixed configuration.
#[derive(Debug, Default, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Wraps `config`.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Underlying loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// The configured limits are unusable.
    #[error("invalid configuration: {source}")]
    Limits {
        /// The inconsistent limit.
        #[source]
        source: LimitError,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// The built-in plugins could not be registered.
    #[error("failed to register built-in plugins: {source}")]
    Registry {
        /// Registration error.
        #[source]
        source: RegistryError,
    },
}

/// Result of a successful bootstrap invocation.
pub struct Daemon {
    config: Config,
    registry: ClassRegistry,
    queue: MemoryQueue,
    telemetry: TelemetryHandle,
    reporter: Arc<dyn HealthReporter>,
}

impl Daemon {
    /// Accessor for the resolved configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Plugins available to requests.
    #[must_use]
    pub const fn registry(&self) -> &ClassRegistry {
        &self.registry
    }

    /// Jobs enqueued so far.
    ///
    /// The daemon runs no workers and never drains this queue. After
    /// `queue_capacity` accepted jobs, every later `enqueue` request for the
    /// life of the process is answered with status 500 and error `queue`.
    #[must_use]
    pub const fn queue(&self) -> &MemoryQueue {
        &self.queue
    }

    /// Telemetry installed for the process.
    #[must_use]
    pub const fn telemetry(&self) -> TelemetryHandle {
        self.telemetry
    }

    /// Dispatcher honouring the configured limits.
    #[must_use]
    pub const fn dispatcher(&self) -> Dispatcher<'_> {
        let pipeline =
            Pipeline::new(&self.registry).with_max_input_bytes(self.config.max_input_bytes());
        Dispatcher::new(&self.registry, pipeline, JobSubmitter::new(&self.queue))
    }

    /// Answers requests from `input` until it is exhausted.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError`] when the streams fail.
    pub fn serve<R: BufRead, W: Write>(
        &self,
        input: R,
        output: W,
    ) -> Result<SessionSummary, DispatchError> {
        let session = Session::new(self.dispatcher(), self.config.max_request_bytes());
        let summary = session.run(input, output)?;
        self.reporter.session_finished(&summary);
        Ok(summary)
    }
}

/// Bootstraps the daemon using the supplied collaborators.
///
/// # Errors
///
/// Returns the [`BootstrapError`] of the first step that failed, after
/// reporting it.
pub fn bootstrap_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
) -> Result<Daemon, BootstrapError> {
    reporter.bootstrap_starting();
    match assemble(loader, Arc::clone(&reporter)) {
        Ok(daemon) => {
            reporter.bootstrap_succeeded(&daemon.config, daemon.registry.len());
            Ok(daemon)
        }
        Err(error) => {
            reporter.bootstrap_failed(&error);
            Err(error)
        }
    }
}

fn assemble(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
) -> Result<Daemon, BootstrapError> {
    let config = loader
        .load()
        .map_err(|source| BootstrapError::Configuration { source })?;
    config
        .check_limits()
        .map_err(|source| BootstrapError::Limits { source })?;
    let telemetry =
        telemetry::initialise(&config).map_err(|source| BootstrapError::Telemetry { source })?;
    let registry =
        ClassRegistry::with_builtins().map_err(|source| BootstrapError::Registry { source })?;
    let queue = MemoryQueue::with_capacity(config.queue_capacity());

    Ok(Daemon {
        config,
        registry,
        queue,
        telemetry,
        reporter,
    })
}
