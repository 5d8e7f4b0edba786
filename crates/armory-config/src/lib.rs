//! Shared configuration for the Armory daemon.
//!
//! [`Config`] is layered by `ortho_config`: built-in defaults, then an
//! optional TOML file named by `--config-path` or `ARMORY_CONFIG_PATH`, then
//! `ARMORY_*` environment variables, then command-line flags.

mod defaults;
mod logging;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use defaults::{
    DEFAULT_LOG_FILTER, DEFAULT_MAX_INPUT_BYTES, DEFAULT_MAX_REQUEST_BYTES,
    DEFAULT_QUEUE_CAPACITY, default_log_filter, default_log_filter_string, default_log_format,
    default_max_input_bytes, default_max_request_bytes, default_queue_capacity,
};
pub use logging::{LogFormat, LogFormatParseError};

/// Resolved daemon configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "ARMORY")]
pub struct Config {
    /// `tracing` filter directive applied to daemon output.
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Output format of daemon logs.
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
    /// Largest encoder input accepted, in bytes.
    #[ortho_config(default = default_max_input_bytes())]
    pub max_input_bytes: usize,
    /// Largest protocol request line accepted, in bytes.
    #[ortho_config(default = default_max_request_bytes())]
    pub max_request_bytes: usize,
    /// Jobs held by the in-memory queue before it refuses more.
    #[ortho_config(default = default_queue_capacity())]
    pub queue_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            max_input_bytes: default_max_input_bytes(),
            max_request_bytes: default_max_request_bytes(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

impl Config {
    /// Filter directive applied to daemon output.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Output format of daemon logs.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Largest encoder input accepted, in bytes.
    #[must_use]
    pub const fn max_input_bytes(&self) -> usize {
        self.max_input_bytes
    }

    /// Largest protocol request line accepted, in bytes.
    #[must_use]
    pub const fn max_request_bytes(&self) -> usize {
        self.max_request_bytes
    }

    /// Jobs held by the in-memory queue before it refuses more.
    #[must_use]
    pub const fn queue_capacity(&self) -> usize {
        self.queue_capacity
    }

    /// Checks the limits describe a usable daemon.
    ///
    /// # Errors
    ///
    /// Returns [`LimitError`] when a bound is zero or when a request line
    /// cannot hold the largest encoder input.
    pub const fn check_limits(&self) -> Result<(), LimitError> {
        if self.max_input_bytes == 0 {
            return Err(LimitError::Zero {
                field: "max_input_bytes",
            });
        }
        if self.max_request_bytes == 0 {
            return Err(LimitError::Zero {
                field: "max_request_bytes",
            });
        }
        if self.queue_capacity == 0 {
            return Err(LimitError::Zero {
                field: "queue_capacity",
            });
        }
        if self.max_request_bytes < self.max_input_bytes {
            return Err(LimitError::RequestSmallerThanInput {
                max_request_bytes: self.max_request_bytes,
                max_input_bytes: self.max_input_bytes,
            });
        }
        Ok(())
    }
}

/// Inconsistent limits in a loaded [`Config`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LimitError {
    /// A bound was set to zero.
    #[error("{field} must be greater than zero")]
    Zero {
        /// Name of the offending field.
        field: &'static str,
    },
    /// A request line cannot carry the largest encoder input.
    #[error(
        "max_request_bytes ({max_request_bytes}) must be at least \
         max_input_bytes ({max_input_bytes})"
    )]
    RequestSmallerThanInput {
        /// Configured request line bound.
        max_request_bytes: usize,
        /// Configured encoder input bound.
        max_input_bytes: usize,
    },
}

#[cfg(test)]
mod tests;
