/// Default log filter expression used by the daemon.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default upper bound on encoder input, in bytes.
///
/// Matches the bound a [`Pipeline`](armory_plugins::Pipeline) applies when
/// none is configured.
pub const DEFAULT_MAX_INPUT_BYTES: usize = armory_plugins::pipeline::DEFAULT_MAX_INPUT_BYTES;

/// Default upper bound on one protocol request line, in bytes.
pub const DEFAULT_MAX_REQUEST_BYTES: usize = 1024 * 1024;

/// Default number of jobs the in-memory queue holds before refusing more.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Default log filter expression used by the daemon.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the daemon.
#[must_use]
pub const fn default_log_format() -> crate::logging::LogFormat {
    crate::logging::LogFormat::Json
}

/// Default encoder input bound.
#[must_use]
pub const fn default_max_input_bytes() -> usize {
    DEFAULT_MAX_INPUT_BYTES
}

/// Default request line bound.
#[must_use]
pub const fn default_max_request_bytes() -> usize {
    DEFAULT_MAX_REQUEST_BYTES
}

/// Default queue capacity.
#[must_use]
pub const fn default_queue_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}
