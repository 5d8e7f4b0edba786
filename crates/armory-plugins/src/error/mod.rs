//! Domain errors raised by the plugin pipeline.
//!
//! Each pipeline stage owns one error type so callers can choose a response
//! status and template per failure kind. [`PipelineError`] wraps them for the
//! request driver and carries the status mapping.

use thiserror::Error;

use crate::class::PluginKind;
use crate::form::FieldErrors;
use crate::invoker::Stage;
use crate::pipeline::PipelineStage;

/// Reasons an identifier string is rejected before lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    /// The identifier was empty.
    #[error("plugin identifier is empty")]
    Empty,

    /// The identifier exceeded the length limit.
    #[error("plugin identifier is {len} bytes long, limit is {max}")]
    TooLong {
        /// Observed length in bytes.
        len: usize,
        /// Maximum permitted length.
        max: usize,
    },

    /// A `/`-separated segment was empty.
    #[error("plugin identifier '{identifier}' has an empty segment at position {position}")]
    EmptySegment {
        /// Rejected input.
        identifier: String,
        /// Zero-based index of the empty segment.
        position: usize,
    },

    /// A character outside `[a-z0-9_-]` appeared in a segment.
    #[error("plugin identifier '{identifier}' contains invalid character {character:?}")]
    InvalidCharacter {
        /// Rejected input.
        identifier: String,
        /// First offending character.
        character: char,
    },
}

/// Errors arising from class registration and lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The identifier failed to parse.
    #[error(transparent)]
    InvalidIdentifier(#[from] IdentifierError),

    /// No class is registered under the identifier for this kind.
    #[error("{kind} '{identifier}' not found")]
    ClassNotFound {
        /// Namespace that was searched.
        kind: PluginKind,
        /// Identifier that was looked up.
        identifier: String,
    },

    /// A class was already registered under the identifier for this kind.
    #[error("{kind} '{identifier}' is already registered")]
    Duplicate {
        /// Namespace of the clashing registration.
        kind: PluginKind,
        /// Clashing identifier.
        identifier: String,
    },
}

/// Configuration defects found while deriving a parameter schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// A parameter declares a kind the form validator cannot handle.
    #[error("{owner}: parameter '{param}' has unsupported kind '{declared}'")]
    UnsupportedParamKind {
        /// Plugin or form that owns the declaration.
        owner: String,
        /// Parameter name.
        param: String,
        /// Declared kind, as written by the plugin.
        declared: String,
    },

    /// A parameter declaration is internally inconsistent.
    #[error("{owner}: parameter '{param}' is invalid: {reason}")]
    InvalidDeclaration {
        /// Plugin or form that owns the declaration.
        owner: String,
        /// Parameter name.
        param: String,
        /// What is wrong with the declaration.
        reason: String,
    },
}

/// A plugin instance rejected a parameter during binding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to set parameter '{field}': {reason}")]
pub struct BindError {
    field: String,
    reason: String,
}

impl BindError {
    /// Creates a binding error for a field.
    #[must_use]
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Returns the rejected field name.
    #[must_use]
    pub fn field(&self) -> &str {
        self.field.as_str()
    }

    /// Returns the rejection reason reported by the plugin.
    #[must_use]
    pub fn reason(&self) -> &str {
        self.reason.as_str()
    }
}

/// A failure raised while a bound plugin validates, builds, or encodes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{stage} failed: {message}")]
pub struct InvocationFailure {
    stage: Stage,
    message: String,
}

impl InvocationFailure {
    /// Creates an invocation failure for a stage.
    #[must_use]
    pub fn new(stage: Stage, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
        }
    }

    /// Returns the lifecycle stage that failed.
    #[must_use]
    pub const fn stage(&self) -> Stage {
        self.stage
    }

    /// Returns the failure message.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }
}

/// Terminal failure of a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// The identifier could not be resolved.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The plugin declares parameters that cannot be validated.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// The submitted form failed shape-level validation.
    #[error("form validation failed: {0}")]
    Validation(FieldErrors),

    /// The plugin rejected a validated parameter.
    #[error(transparent)]
    Bind(#[from] BindError),

    /// The plugin failed during self-validation or execution.
    #[error(transparent)]
    Invocation(#[from] InvocationFailure),
}

impl From<FieldErrors> for PipelineError {
    fn from(errors: FieldErrors) -> Self {
        Self::Validation(errors)
    }
}

impl PipelineError {
    /// HTTP status the caller should answer with.
    ///
    /// Unknown or malformed identifiers are 404. Declaration defects are 500.
    /// Form and binding rejections are 400. Plugin self-validation failures
    /// are 400 because they describe an incoherent combination of submitted
    /// values; build and encode failures are 500.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Registry(
                RegistryError::InvalidIdentifier(_) | RegistryError::ClassNotFound { .. },
            ) => 404,
            Self::Registry(RegistryError::Duplicate { .. }) | Self::Schema(_) => 500,
            Self::Validation(_) | Self::Bind(_) => 400,
            Self::Invocation(failure) => match failure.stage() {
                Stage::Validate => 400,
                Stage::Build | Stage::Encode => 500,
            },
        }
    }

    /// Terminal pipeline state this error corresponds to.
    #[must_use]
    pub const fn stage(&self) -> PipelineStage {
        match self {
            Self::Registry(_) => PipelineStage::ResolveFailed,
            Self::Schema(_) => PipelineStage::SchemaFailed,
            Self::Validation(_) => PipelineStage::ValidationFailed,
            Self::Bind(_) => PipelineStage::BindFailed,
            Self::Invocation(_) => PipelineStage::InvocationFailed,
        }
    }

    /// Returns `true` when the failure reflects a server-side defect rather
    /// than bad input.
    #[must_use]
    pub const fn is_server_fault(&self) -> bool {
        self.status_code() >= 500
    }
}
