//! The Armory daemon.
//!
//! `armoryd` loads its configuration, installs structured telemetry,
//! registers the built-in plugins, and then answers JSONL requests on its
//! standard streams: plugin listing and description, encoding, building, and
//! job submission. Each request runs through the `armory-plugins` pipeline or
//! the `armory-jobs` submitter and is answered with an HTTP-like status and a
//! JSON body. See [`dispatch`] for the wire format.
//!
//! Lifecycle events are surfaced through a [`HealthReporter`]; the default
//! [`StructuredHealthReporter`] writes them as `tracing` events.

mod bootstrap;
pub mod dispatch;
mod health;
mod telemetry;

pub use bootstrap::{
    BootstrapError, ConfigLoader, Daemon, StaticConfigLoader, SystemConfigLoader, bootstrap_with,
};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use telemetry::{TelemetryError, TelemetryHandle};

#[cfg(test)]
mod tests;
