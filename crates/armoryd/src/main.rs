//! Entry point for the Armory daemon.

use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;

use armoryd::{StructuredHealthReporter, SystemConfigLoader, bootstrap_with};

fn main() -> ExitCode {
    let reporter = Arc::new(StructuredHealthReporter::new());
    let daemon = match bootstrap_with(&SystemConfigLoader, reporter) {
        Ok(daemon) => daemon,
        Err(error) => {
            // Telemetry may not be installed yet, so the reporter's event can be lost.
            if writeln!(io::stderr().lock(), "armoryd: {error}").is_err() {
                return ExitCode::from(2);
            }
            return ExitCode::FAILURE;
        }
    };

    match daemon.serve(io::stdin().lock(), io::stdout().lock()) {
        Ok(_) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(target: "armoryd", %error, "request loop failed");
            ExitCode::FAILURE
        }
    }
}
