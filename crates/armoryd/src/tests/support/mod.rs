//! Shared harness for the daemon test suites.

mod loaders;
mod reporter;
mod world;

pub use loaders::{FailingConfigLoader, limited_config};
pub use reporter::{HealthEvent, RecordingHealthReporter};
pub use world::{TestWorld, world};
