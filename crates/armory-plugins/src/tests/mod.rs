//! Crate-level integration and BDD tests.

use crate::capability::{Buildable, Capability, PluginRejection};
use crate::class::{ClassDefinition, PluginKind};
use crate::error::{PipelineError, SchemaError};
use crate::form::FormInput;
use crate::pipeline::{BuildForm, EncodeForm, Pipeline, PipelineStage};
use crate::registry::ClassRegistry;
use crate::schema::{DeclaredType, ParamDecl};
use crate::value::ParamValue;


/// A payload declaring a float parameter, which forms cannot validate.
struct Ratio;

impl Buildable for Ratio {
    fn assign(&mut self, name: &str, _value: &ParamValue) -> Result<(), PluginRejection> {
        Err(PluginRejection::unknown_param(name))
    }

    fn build(&self) -> Result<String, PluginRejection> {
        Ok(String::new())
    }
}

fn ratio_definition() -> ClassDefinition {
    ClassDefinition::new("declares a float", || Capability::buildable(Ratio))
        .with_params(vec![ParamDecl::new("ratio", DeclaredType::Float)])
}

/// Built-in registry plus the unsupported-kind fixture plugin.
fn registry_with_fixtures() -> ClassRegistry {
    let mut registry = ClassRegistry::with_builtins().expect("built-ins");
    registry
        .register_str(PluginKind::Payload, "test/ratio", ratio_definition)
        .expect("register fixture");
    registry
}

#[test]
fn end_to_end_encode_from_flat_form() {
    let registry = ClassRegistry::with_builtins().expect("built-ins");
    let form = FormInput::parse_urlencoded("data=hello&params%5Bpadding%5D=false");
    let outcome = Pipeline::new(&registry)
        .encode("base64", &EncodeForm::from_form(&form))
        .expect("encode");
    assert_eq!(outcome.artifact().as_bytes(), b"aGVsbG8");
    assert_eq!(outcome.params().get("padding"), Some(&ParamValue::Boolean(false)));

    let json = serde_json::to_value(&outcome).expect("serialise");
    assert_eq!(json["plugin"], "base64");
    assert_eq!(json["kind"], "encoder");
    assert_eq!(json["artifact"]["text"], "aGVsbG8");
}

#[test]
fn unsupported_param_kind_is_a_server_fault() {
    let registry = registry_with_fixtures();
    let error = Pipeline::new(&registry)
        .build(PluginKind::Payload, "test/ratio", &BuildForm::default())
        .expect_err("float is unsupported");
    assert!(matches!(
        error,
        PipelineError::Schema(SchemaError::UnsupportedParamKind { .. })
    ));
    assert_eq!(error.status_code(), 500);
    assert_eq!(error.stage(), PipelineStage::SchemaFailed);
}

#[test]
fn describe_renders_schema_in_declaration_order() {
    let registry = ClassRegistry::with_builtins().expect("built-ins");
    let description = Pipeline::new(&registry)
        .describe(PluginKind::Payload, "shell/reverse_tcp")
        .expect("describe");
    let names: Vec<&str> = description.params().iter().map(|spec| spec.name()).collect();
    assert_eq!(names, ["host", "port", "shell"]);

    let json = serde_json::to_value(&description).expect("serialise");
    assert_eq!(json["namespace"], "payloads");
    assert_eq!(json["params"][1]["kind"]["type"], "integer");
}

#[test]
fn encode_input_is_bounded() {
    let registry = ClassRegistry::with_builtins().expect("built-ins");
    let error = Pipeline::new(&registry)
        .with_max_input_bytes(4)
        .encode("hex", &EncodeForm::new("hello"))
        .expect_err("too large");
    let PipelineError::Validation(errors) = &error else {
        panic!("expected validation error, got {error}");
    };
    assert_eq!(errors.len(), 1);
    assert_eq!(errors.as_slice()[0].field(), "data");
}

#[test]
fn data_and_param_errors_are_reported_together() {
    let registry = ClassRegistry::with_builtins().expect("built-ins");
    let form = EncodeForm::default().with_params(FormInput::from_pairs([("key", "x")]));
    let error = Pipeline::new(&registry)
        .encode("xor", &form)
        .expect_err("invalid");
    let PipelineError::Validation(errors) = &error else {
        panic!("expected validation error, got {error}");
    };
    let fields: Vec<&str> = errors.iter().map(|e| e.field()).collect();
    assert_eq!(fields, ["data", "key"]);
}
