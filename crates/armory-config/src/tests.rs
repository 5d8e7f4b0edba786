//! Unit tests for configuration defaults and limit checks.

use rstest::rstest;

use super::*;

#[rstest]
fn defaults_match_constants() {
    let config = Config::default();
    assert_eq!(config.log_filter(), DEFAULT_LOG_FILTER);
    assert_eq!(config.log_format(), LogFormat::Json);
    assert_eq!(config.max_input_bytes(), 65_536);
    assert_eq!(config.max_request_bytes(), 1_048_576);
    assert_eq!(config.queue_capacity(), 1024);
    assert_eq!(config.check_limits(), Ok(()));
}

#[rstest]
fn input_bound_matches_the_pipeline_default() {
    let registry = armory_plugins::ClassRegistry::new();
    let pipeline = armory_plugins::Pipeline::new(&registry);
    assert_eq!(Config::default().max_input_bytes(), pipeline.max_input_bytes());
}

#[rstest]
#[case::json("json", LogFormat::Json)]
#[case::compact("compact", LogFormat::Compact)]
#[case::mixed_case("JSON", LogFormat::Json)]
fn log_format_parses(#[case] text: &str, #[case] expected: LogFormat) {
    assert_eq!(text.parse::<LogFormat>(), Ok(expected));
}

#[rstest]
fn unknown_log_format_is_rejected() {
    let error: LogFormatParseError = "pretty".parse::<LogFormat>().expect_err("unknown");
    assert_eq!(error, strum::ParseError::VariantNotFound);
}

#[rstest]
#[case::input(Config { max_input_bytes: 0, ..Config::default() }, "max_input_bytes")]
#[case::request(Config { max_request_bytes: 0, ..Config::default() }, "max_request_bytes")]
#[case::queue(Config { queue_capacity: 0, ..Config::default() }, "queue_capacity")]
fn zero_limits_are_rejected(#[case] config: Config, #[case] field: &str) {
    let error = config.check_limits().expect_err("zero bound");
    assert!(matches!(error, LimitError::Zero { field: name } if name == field));
}

#[rstest]
fn request_line_must_hold_the_input() {
    let config = Config {
        max_input_bytes: 2048,
        max_request_bytes: 1024,
        ..Config::default()
    };
    let error = config.check_limits().expect_err("inconsistent");
    assert_eq!(
        error.to_string(),
        "max_request_bytes (1024) must be at least max_input_bytes (2048)"
    );
}

#[rstest]
#[case::json(LogFormat::Json, true)]
#[case::compact(LogFormat::Compact, false)]
fn only_json_output_is_structured(#[case] format: LogFormat, #[case] structured: bool) {
    assert_eq!(format.is_structured(), structured);
}
