//! Configuration loaders used by the daemon tests.

use std::ffi::OsString;
use std::sync::Arc;

use armory_config::Config;
use ortho_config::{OrthoConfig, OrthoError};

use crate::bootstrap::ConfigLoader;

/// Loader that fails by passing an unknown log format on the command line.
pub struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        let args = vec![
            OsString::from("armoryd"),
            OsString::from("--log-format"),
            OsString::from("pretty"),
        ];
        Config::load_from_iter(args)
    }
}

/// Default configuration with a request limit and a queue capacity.
pub fn limited_config(max_request_bytes: usize, queue_capacity: usize) -> Config {
    let defaults = Config::default();
    Config {
        max_input_bytes: defaults.max_input_bytes.min(max_request_bytes),
        max_request_bytes,
        queue_capacity,
        ..defaults
    }
}
