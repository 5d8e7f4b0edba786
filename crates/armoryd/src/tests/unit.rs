//! Unit tests for the daemon bootstrap sequence.

use std::sync::Arc;

use armory_config::{Config, LimitError};
use rstest::rstest;
use serde_json::Value;

use crate::{BootstrapError, StaticConfigLoader, bootstrap_with};

use super::support::{FailingConfigLoader, HealthEvent, RecordingHealthReporter, limited_config};

#[rstest]
fn bootstrap_registers_builtins_and_reports_success() {
    let reporter = Arc::new(RecordingHealthReporter::default());
    let loader = StaticConfigLoader::new(limited_config(4096, 8));

    let daemon = bootstrap_with(&loader, reporter.clone()).expect("bootstrap should succeed");

    assert_eq!(daemon.queue().capacity(), 8);
    assert_eq!(daemon.config().max_request_bytes(), 4096);
    assert_eq!(
        reporter.events(),
        [
            HealthEvent::BootstrapStarting,
            HealthEvent::BootstrapSucceeded {
                plugins: daemon.registry().len(),
            },
        ]
    );
}

#[rstest]
fn configuration_failure_is_reported() {
    let reporter = Arc::new(RecordingHealthReporter::default());

    let error = bootstrap_with(&FailingConfigLoader, reporter.clone())
        .err()
        .expect("bootstrap should fail");

    assert!(matches!(error, BootstrapError::Configuration { .. }));
    let events = reporter.events();
    assert_eq!(events.first(), Some(&HealthEvent::BootstrapStarting));
    assert!(matches!(events.last(), Some(HealthEvent::BootstrapFailed(_))));
}

#[rstest]
#[case::zero_queue(limited_config(4096, 0), LimitError::Zero { field: "queue_capacity" })]
#[case::request_below_input(
    Config { max_request_bytes: 512, max_input_bytes: 1024, ..Config::default() },
    LimitError::RequestSmallerThanInput { max_request_bytes: 512, max_input_bytes: 1024 }
)]
fn unusable_limits_stop_bootstrap(#[case] config: Config, #[case] expected: LimitError) {
    let reporter = Arc::new(RecordingHealthReporter::default());

    let error = bootstrap_with(&StaticConfigLoader::new(config), reporter.clone())
        .err()
        .expect("bootstrap should fail");

    let BootstrapError::Limits { source } = error else {
        panic!("expected a limit error, got {error}");
    };
    assert_eq!(source, expected);
    assert!(
        !reporter
            .events()
            .iter()
            .any(|event| matches!(event, HealthEvent::BootstrapSucceeded { .. }))
    );
}

#[rstest]
fn serve_uses_configured_queue_and_reports_the_session() {
    let reporter = Arc::new(RecordingHealthReporter::default());
    let daemon = bootstrap_with(&StaticConfigLoader::new(limited_config(4096, 1)), reporter.clone())
        .expect("bootstrap should succeed");
    let input = concat!(
        r#"{"op":"enqueue","job":"purge_repos"}"#,
        "\n",
        r#"{"op":"enqueue","job":"update_repos"}"#,
        "\n",
    );

    let mut output = Vec::new();
    let summary = daemon.serve(input.as_bytes(), &mut output).expect("serve");

    let statuses: Vec<u64> = String::from_utf8(output)
        .expect("UTF-8")
        .lines()
        .filter_map(|line| serde_json::from_str::<Value>(line).ok())
        .filter_map(|reply| reply["status"].as_u64())
        .collect();
    assert_eq!(statuses, [202, 500]);
    assert_eq!(summary.failed, 1);
    assert_eq!(daemon.queue().len(), 1);
    assert_eq!(
        reporter.events().last(),
        Some(&HealthEvent::SessionFinished(summary))
    );
}

#[rstest]
fn full_queue_stays_full_across_sessions() {
    let reporter = Arc::new(RecordingHealthReporter::default());
    let daemon = bootstrap_with(&StaticConfigLoader::new(limited_config(4096, 1)), reporter)
        .expect("bootstrap should succeed");
    let line = concat!(r#"{"op":"enqueue","job":"update_repos"}"#, "\n");

    let first = daemon.serve(line.as_bytes(), Vec::new()).expect("first session");
    let second = daemon.serve(line.as_bytes(), Vec::new()).expect("second session");

    assert_eq!(first.failed, 0);
    assert_eq!(second.failed, 1);
    assert_eq!(daemon.queue().len(), 1);
}

#[rstest]
fn dispatcher_reads_the_configured_input_limit() {
    let reporter = Arc::new(RecordingHealthReporter::default());
    let config = Config {
        max_input_bytes: 4,
        ..Config::default()
    };
    let daemon = bootstrap_with(&StaticConfigLoader::new(config), reporter)
        .expect("bootstrap should succeed");
    let request = crate::dispatch::Request::parse(
        br#"{"op":"encode","plugin":"hex","form":{"data":"hello"}}"#,
    )
    .expect("request parses");

    let reply = daemon.dispatcher().handle(request).expect("reply");

    assert_eq!(reply.status, 400);
    assert_eq!(reply.body["errors"][0]["field"], "data");
}
