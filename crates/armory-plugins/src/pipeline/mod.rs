//! Request driver for the plugin pages.
//!
//! A [`Pipeline`] carries one request through resolution, schema derivation,
//! form validation, binding, and invocation. Each transition is logged at
//! `debug`; a terminal failure is logged once, at `warn` when the request was
//! at fault and at `error` when the plugin or its declarations were.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::binder;
use crate::class::{PluginClass, PluginKind};
use crate::error::PipelineError;
use crate::form::{self, FieldError, FieldErrors, FormInput, FormValue, ValidatedParams};
use crate::invoker::{self, Artifact, InvocationMode};
use crate::registry::ClassRegistry;
use crate::schema::{self, ParamSpec};

const PIPELINE_TARGET: &str = "armory_plugins::pipeline";

/// Default upper bound on encoder input, in bytes.
pub const DEFAULT_MAX_INPUT_BYTES: usize = 64 * 1024;

/// Name of the encoder input field.
const DATA_FIELD: &str = "data";
/// Prefix of the nested parameter fields.
const PARAMS_PREFIX: &str = "params";

/// States a request passes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// The class was found.
    Resolved,
    /// The identifier was malformed or unknown.
    ResolveFailed,
    /// The parameter schema was derived.
    SchemaDerived,
    /// The class declares parameters that cannot be validated.
    SchemaFailed,
    /// The submitted form was rejected.
    ValidationFailed,
    /// The submitted form was accepted.
    Validated,
    /// The plugin rejected a parameter.
    BindFailed,
    /// Every parameter was assigned.
    Bound,
    /// The plugin failed to validate, build, or encode.
    InvocationFailed,
    /// The artefact was produced.
    Invoked,
}

impl PipelineStage {
    /// Returns the state name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Resolved => "resolved",
            Self::ResolveFailed => "resolve_failed",
            Self::SchemaDerived => "schema_derived",
            Self::SchemaFailed => "schema_failed",
            Self::ValidationFailed => "validation_failed",
            Self::Validated => "validated",
            Self::BindFailed => "bind_failed",
            Self::Bound => "bound",
            Self::InvocationFailed => "invocation_failed",
            Self::Invoked => "invoked",
        }
    }

    /// Returns `true` for the states a request ends in.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::ResolveFailed
                | Self::SchemaFailed
                | Self::ValidationFailed
                | Self::BindFailed
                | Self::InvocationFailed
                | Self::Invoked
        )
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Submission of the encoder page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodeForm {
    data: Option<FormValue>,
    params: FormInput,
}

impl EncodeForm {
    /// Creates a form encoding `data` with no parameters.
    #[must_use]
    pub fn new(data: impl Into<String>) -> Self {
        Self {
            data: Some(FormValue::Single(data.into())),
            params: FormInput::new(),
        }
    }

    /// Sets the encoder parameters.
    #[must_use]
    pub fn with_params(mut self, params: FormInput) -> Self {
        self.params = params;
        self
    }

    /// Splits a flat submission into `data` and the `params[...]` fields.
    #[must_use]
    pub fn from_form(form: &FormInput) -> Self {
        Self {
            data: form.get(DATA_FIELD).cloned(),
            params: form.nested(PARAMS_PREFIX),
        }
    }

    /// Returns the encoder parameters.
    #[must_use]
    pub const fn params(&self) -> &FormInput {
        &self.params
    }

    fn checked_data(&self, max_input_bytes: usize) -> Result<&str, FieldError> {
        let data = match &self.data {
            None => None,
            Some(value) if value.values().iter().all(String::is_empty) => None,
            Some(value) => Some(value.single().ok_or_else(|| FieldError::InvalidFormat {
                field: DATA_FIELD.to_owned(),
                value: value.values().join(","),
                expected: "single string".to_owned(),
            })?),
        };
        let data = data.ok_or_else(|| FieldError::MissingRequired {
            field: DATA_FIELD.to_owned(),
        })?;
        if data.len() > max_input_bytes {
            return Err(FieldError::ConstraintViolation {
                field: DATA_FIELD.to_owned(),
                value: format!("{} bytes", data.len()),
                constraint: format!("at most {max_input_bytes} bytes"),
            });
        }
        Ok(data)
    }
}

/// Submission of the payload and exploit build pages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildForm {
    params: FormInput,
}

impl BuildForm {
    /// Creates a form with the given parameters.
    #[must_use]
    pub const fn new(params: FormInput) -> Self {
        Self { params }
    }

    /// Extracts the `params[...]` fields of a flat submission.
    #[must_use]
    pub fn from_form(form: &FormInput) -> Self {
        Self::new(form.nested(PARAMS_PREFIX))
    }

    /// Returns the submitted parameters.
    #[must_use]
    pub const fn params(&self) -> &FormInput {
        &self.params
    }
}

/// Result of a successful request.
#[derive(Debug, Clone)]
pub struct Outcome {
    class: Arc<PluginClass>,
    params: ValidatedParams,
    artifact: Artifact,
}

impl Outcome {
    /// Returns the class that handled the request.
    #[must_use]
    pub fn class(&self) -> &PluginClass {
        &self.class
    }

    /// Returns the parameters that were bound.
    #[must_use]
    pub const fn params(&self) -> &ValidatedParams {
        &self.params
    }

    /// Returns the artefact.
    #[must_use]
    pub const fn artifact(&self) -> &Artifact {
        &self.artifact
    }

    /// Consumes the outcome, returning the artefact.
    #[must_use]
    pub fn into_artifact(self) -> Artifact {
        self.artifact
    }
}

impl Serialize for Outcome {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("Outcome", 4)?;
        state.serialize_field("plugin", self.class.identifier())?;
        state.serialize_field("kind", &self.class.kind())?;
        state.serialize_field("params", &self.params)?;
        state.serialize_field("artifact", &self.artifact)?;
        state.end()
    }
}

/// What the show page of a plugin renders.
#[derive(Debug, Clone, Serialize)]
pub struct ClassDescription {
    #[serde(rename = "plugin")]
    identifier: String,
    kind: PluginKind,
    namespace: &'static str,
    summary: String,
    params: Vec<ParamSpec>,
}

impl ClassDescription {
    /// Returns the plugin identifier.
    #[must_use]
    pub fn identifier(&self) -> &str {
        self.identifier.as_str()
    }

    /// Returns the parameter schema.
    #[must_use]
    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }
}

/// Drives requests against a registry.
#[derive(Debug, Clone, Copy)]
pub struct Pipeline<'r> {
    registry: &'r ClassRegistry,
    max_input_bytes: usize,
}

impl<'r> Pipeline<'r> {
    /// Creates a pipeline over `registry`.
    #[must_use]
    pub const fn new(registry: &'r ClassRegistry) -> Self {
        Self {
            registry,
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
        }
    }

    /// Sets the upper bound on encoder input.
    #[must_use]
    pub const fn with_max_input_bytes(mut self, max_input_bytes: usize) -> Self {
        self.max_input_bytes = max_input_bytes;
        self
    }

    /// Upper bound on encoder input, in bytes.
    #[must_use]
    pub const fn max_input_bytes(&self) -> usize {
        self.max_input_bytes
    }

    /// Resolves a class and derives its schema.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Registry`] or [`PipelineError::Schema`].
    pub fn describe(
        &self,
        kind: PluginKind,
        identifier: &str,
    ) -> Result<ClassDescription, PipelineError> {
        let result = self.resolve_and_derive(kind, identifier).map(|(class, specs)| {
            ClassDescription {
                identifier: class.identifier().to_string(),
                kind,
                namespace: kind.namespace(),
                summary: class.summary().to_owned(),
                params: specs,
            }
        });
        log_failure(kind, identifier, result.as_ref().err());
        result
    }

    /// Encodes the form's `data` with the named encoder.
    ///
    /// # Errors
    ///
    /// Returns the [`PipelineError`] of the stage that failed. Errors in
    /// `data` and in the parameters are reported together.
    pub fn encode(&self, identifier: &str, form: &EncodeForm) -> Result<Outcome, PipelineError> {
        self.execute(PluginKind::Encoder, identifier, |specs| {
            let data = form.checked_data(self.max_input_bytes);
            let params = form::validate(&form.params, specs);
            match (data, params) {
                (Ok(data), Ok(params)) => {
                    Ok((params, InvocationMode::Encode(data.as_bytes().to_vec())))
                }
                (Err(error), Ok(_)) => Err(FieldErrors::single(error)),
                (Ok(_), Err(errors)) => Err(errors),
                (Err(error), Err(rest)) => {
                    let mut errors = FieldErrors::single(error);
                    errors.extend(rest);
                    Err(errors)
                }
            }
        })
    }

    /// Builds the named payload or exploit.
    ///
    /// # Errors
    ///
    /// Returns the [`PipelineError`] of the stage that failed.
    pub fn build(
        &self,
        kind: PluginKind,
        identifier: &str,
        form: &BuildForm,
    ) -> Result<Outcome, PipelineError> {
        self.execute(kind, identifier, |specs| {
            form::validate(&form.params, specs).map(|params| (params, InvocationMode::Build))
        })
    }

    fn execute(
        &self,
        kind: PluginKind,
        identifier: &str,
        validate: impl FnOnce(
            &[ParamSpec],
        ) -> Result<(ValidatedParams, InvocationMode), FieldErrors>,
    ) -> Result<Outcome, PipelineError> {
        let result = self.run(kind, identifier, validate);
        log_failure(kind, identifier, result.as_ref().err());
        result
    }

    fn run(
        &self,
        kind: PluginKind,
        identifier: &str,
        validate: impl FnOnce(
            &[ParamSpec],
        ) -> Result<(ValidatedParams, InvocationMode), FieldErrors>,
    ) -> Result<Outcome, PipelineError> {
        let (class, specs) = self.resolve_and_derive(kind, identifier)?;

        let (params, mode) = validate(&specs)?;
        transition(kind, identifier, PipelineStage::Validated);

        let bound = binder::bind(class.instantiate(), params.clone())?;
        transition(kind, identifier, PipelineStage::Bound);

        let artifact = invoker::invoke(bound, mode)?;
        transition(kind, identifier, PipelineStage::Invoked);

        Ok(Outcome {
            class,
            params,
            artifact,
        })
    }

    fn resolve_and_derive(
        &self,
        kind: PluginKind,
        identifier: &str,
    ) -> Result<(Arc<PluginClass>, Vec<ParamSpec>), PipelineError> {
        let class = self.registry.resolve_str(identifier, kind)?;
        transition(kind, identifier, PipelineStage::Resolved);

        let specs = schema::derive(&class)?;
        transition(kind, identifier, PipelineStage::SchemaDerived);
        Ok((class, specs))
    }
}

fn transition(kind: PluginKind, identifier: &str, stage: PipelineStage) {
    debug!(target: PIPELINE_TARGET, %kind, identifier, %stage, "pipeline transition");
}

fn log_failure(kind: PluginKind, identifier: &str, failure: Option<&PipelineError>) {
    let Some(failure) = failure else {
        return;
    };
    let stage = failure.stage();
    let status = failure.status_code();
    if failure.is_server_fault() {
        error!(
            target: PIPELINE_TARGET,
            %kind, identifier, %stage, status, error = %failure,
            "request failed"
        );
    } else {
        warn!(
            target: PIPELINE_TARGET,
            %kind, identifier, %stage, status, error = %failure,
            "request rejected"
        );
    }
}
