//! Scenario world for the daemon protocol behaviour.

use std::cell::RefCell;
use std::sync::Arc;

use armory_config::Config;
use serde_json::Value;

use crate::bootstrap::{BootstrapError, ConfigLoader, Daemon, StaticConfigLoader, bootstrap_with};
use crate::dispatch::SessionSummary;

use super::reporter::RecordingHealthReporter;

/// Scenario world shared across BDD steps.
pub struct TestWorld {
    loader: Box<dyn ConfigLoader>,
    pub reporter: Arc<RecordingHealthReporter>,
    daemon: Option<Daemon>,
    bootstrap_error: Option<BootstrapError>,
    input: String,
    replies: Vec<Value>,
    summary: Option<SessionSummary>,
}

impl TestWorld {
    /// Builds a world loading the default configuration.
    pub fn new() -> Self {
        Self {
            loader: Box::new(StaticConfigLoader::new(Config::default())),
            reporter: Arc::new(RecordingHealthReporter::default()),
            daemon: None,
            bootstrap_error: None,
            input: String::new(),
            replies: Vec::new(),
            summary: None,
        }
    }

    /// Replaces the configuration loader.
    pub fn use_loader(&mut self, loader: impl ConfigLoader + 'static) {
        self.loader = Box::new(loader);
        self.daemon = None;
        self.bootstrap_error = None;
    }

    /// Runs the bootstrap sequence once.
    pub fn bootstrap(&mut self) {
        if self.daemon.is_some() || self.bootstrap_error.is_some() {
            return;
        }
        match bootstrap_with(&*self.loader, self.reporter.clone()) {
            Ok(daemon) => self.daemon = Some(daemon),
            Err(error) => self.bootstrap_error = Some(error),
        }
    }

    /// Appends one line to the request stream.
    pub fn push_line(&mut self, line: &str) {
        self.input.push_str(line);
        self.input.push('\n');
    }

    /// Bootstraps if needed and serves the buffered request stream.
    pub fn serve(&mut self) {
        self.bootstrap();
        let daemon = self.daemon.as_ref().expect("daemon bootstrapped");
        let mut output = Vec::new();
        let summary = daemon
            .serve(self.input.as_bytes(), &mut output)
            .expect("session completes");
        self.summary = Some(summary);
        self.replies = String::from_utf8(output)
            .expect("replies are UTF-8")
            .lines()
            .map(|line| serde_json::from_str(line).expect("reply is JSON"))
            .collect();
    }

    /// Returns the bootstrap error, if any.
    pub fn bootstrap_error(&self) -> Option<&BootstrapError> {
        self.bootstrap_error.as_ref()
    }

    /// Returns the bootstrapped daemon.
    pub fn daemon(&self) -> &Daemon {
        self.daemon.as_ref().expect("daemon bootstrapped")
    }

    /// Returns the reply with the 1-based `position`.
    pub fn reply(&self, position: usize) -> &Value {
        position
            .checked_sub(1)
            .and_then(|index| self.replies.get(index))
            .unwrap_or_else(|| panic!("no reply {position}: {:?}", self.replies))
    }

    /// Returns the summary of the served session.
    pub fn summary(&self) -> SessionSummary {
        self.summary.expect("requests served")
    }
}

impl Default for TestWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Default test world fixture.
pub fn world() -> RefCell<TestWorld> {
    RefCell::new(TestWorld::new())
}
