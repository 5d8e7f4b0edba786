//! Behavioural tests for layered configuration precedence.

use std::cell::RefCell;
use std::ffi::OsString;
use std::fs;
use std::sync::{Mutex, MutexGuard};

use once_cell::sync::Lazy;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use ortho_config::OrthoConfig;
use tempfile::TempDir;

use armory_config::{
    Config, LogFormat, default_log_filter, default_log_format, default_max_input_bytes,
    default_queue_capacity,
};

static ENV_MUTEX: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

struct Harness {
    _env_guard: MutexGuard<'static, ()>,
    temp_dir: TempDir,
    cli_args: RefCell<Vec<OsString>>,
    env_overrides: RefCell<Vec<(String, Option<OsString>)>>,
    loaded: RefCell<Option<Config>>,
    error: RefCell<Option<String>>,
}

impl Harness {
    fn new() -> Self {
        let temp_dir = match TempDir::new() {
            Ok(dir) => dir,
            Err(error) => panic!("failed to create temporary directory: {error}"),
        };
        let env_guard = ENV_MUTEX
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Self {
            _env_guard: env_guard,
            temp_dir,
            cli_args: RefCell::new(vec![OsString::from("armoryd")]),
            env_overrides: RefCell::new(Vec::new()),
            loaded: RefCell::new(None),
            error: RefCell::new(None),
        }
    }

    fn write_config(&self, contents: &str) {
        let path = self.temp_dir.path().join("armory.toml");
        if let Err(error) = fs::write(&path, contents) {
            panic!("failed to write configuration: {error}");
        }

        let mut args = self.cli_args.borrow_mut();
        args.push(OsString::from("--config-path"));
        args.push(path.into_os_string());
    }

    fn set_env(&self, key: &str, value: &str) {
        let previous = std::env::var_os(key);
        // Environment mutation is `unsafe` on edition 2024; overrides are
        // restored in `Drop`.
        unsafe { std::env::set_var(key, value) };
        self.env_overrides
            .borrow_mut()
            .push((key.to_owned(), previous));
    }

    fn push_cli_arg(&self, arg: impl Into<OsString>) {
        self.cli_args.borrow_mut().push(arg.into());
    }

    fn load(&self) {
        if self.loaded.borrow().is_some() || self.error.borrow().is_some() {
            return;
        }

        let args = self.cli_args.borrow().clone();
        match Config::load_from_iter(args) {
            Ok(config) => {
                *self.loaded.borrow_mut() = Some(config);
            }
            Err(error) => {
                *self.error.borrow_mut() = Some(error.to_string());
            }
        }
    }

    fn config(&self) -> Config {
        self.load();

        if let Some(error) = self.error.borrow().as_ref() {
            panic!("configuration failed to load: {error}");
        }

        match self.loaded.borrow().as_ref() {
            Some(config) => config.clone(),
            None => panic!("configuration was not loaded"),
        }
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        let mut overrides = self.env_overrides.borrow_mut();
        while let Some((key, value)) = overrides.pop() {
            if let Some(os_value) = value {
                unsafe { std::env::set_var(&key, os_value) };
            } else {
                unsafe { std::env::remove_var(&key) };
            }
        }
    }
}

#[fixture]
fn harness() -> Harness {
    Harness::new()
}

#[given("a configuration file setting the queue capacity to \"{capacity}\"")]
fn given_configuration_file(harness: &Harness, capacity: String) {
    harness.write_config(&format!("queue_capacity = {capacity}\n"));
}

#[given("the environment overrides the queue capacity to \"{capacity}\"")]
fn given_environment_override(harness: &Harness, capacity: String) {
    harness.set_env("ARMORY_QUEUE_CAPACITY", &capacity);
}

#[when("the command line sets the queue capacity to \"{capacity}\"")]
fn when_cli_capacity(harness: &Harness, capacity: String) {
    harness.push_cli_arg("--queue-capacity");
    harness.push_cli_arg(capacity);
}

#[when("the command line sets the log format to \"{format}\"")]
fn when_cli_log_format(harness: &Harness, format: String) {
    harness.push_cli_arg("--log-format");
    harness.push_cli_arg(format);
}

#[when("the configuration loads without overrides")]
fn when_load_without_overrides(harness: &Harness) {
    harness.load();
}

#[then("loading the configuration resolves the queue capacity to \"{capacity}\"")]
fn then_resolved_capacity(harness: &Harness, capacity: String) {
    let expected = match capacity.parse::<usize>() {
        Ok(value) => value,
        Err(error) => panic!("invalid expected capacity '{capacity}': {error}"),
    };
    assert_eq!(harness.config().queue_capacity(), expected);
}

#[then("loading the configuration resolves the log format to \"{format}\"")]
fn then_resolved_log_format(harness: &Harness, format: String) {
    let expected = match format.parse::<LogFormat>() {
        Ok(value) => value,
        Err(error) => panic!("invalid expected format '{format}': {error}"),
    };
    assert_eq!(harness.config().log_format(), expected);
}

#[then("loading the configuration applies the built-in defaults")]
fn then_defaults_applied(harness: &Harness) {
    let config = harness.config();
    assert_eq!(config.log_filter(), default_log_filter());
    assert_eq!(config.log_format(), default_log_format());
    assert_eq!(config.max_input_bytes(), default_max_input_bytes());
    assert_eq!(config.queue_capacity(), default_queue_capacity());
}

#[scenario(
    path = "tests/features/configuration_precedence.feature",
    name = "Built-in defaults apply without overrides"
)]
fn defaults_apply(#[from(harness)] harness: Harness) {
    let _ = harness;
}

#[scenario(
    path = "tests/features/configuration_precedence.feature",
    name = "A configuration file overrides the defaults"
)]
fn file_overrides_defaults(#[from(harness)] harness: Harness) {
    let _ = harness;
}

#[scenario(
    path = "tests/features/configuration_precedence.feature",
    name = "The environment overrides the configuration file"
)]
fn environment_overrides_file(#[from(harness)] harness: Harness) {
    let _ = harness;
}

#[scenario(
    path = "tests/features/configuration_precedence.feature",
    name = "The command line overrides the environment"
)]
fn cli_overrides_environment(#[from(harness)] harness: Harness) {
    let _ = harness;
}

#[scenario(
    path = "tests/features/configuration_precedence.feature",
    name = "The command line selects the compact log format"
)]
fn cli_selects_log_format(#[from(harness)] harness: Harness) {
    let _ = harness;
}
