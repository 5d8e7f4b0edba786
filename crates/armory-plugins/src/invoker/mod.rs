//! Invocation of bound plugins.
//!
//! [`invoke`] runs the plugin's self-validation and then the requested build
//! or encode step. Plugin code is third-party code from the pipeline's point
//! of view: every error it returns, and every panic it raises, becomes an
//! [`InvocationFailure`] tagged with the [`Stage`] it happened in.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use tracing::{debug, warn};

use crate::binder::BoundPlugin;
use crate::capability::{Capability, PluginRejection};
use crate::error::InvocationFailure;

const INVOKE_TARGET: &str = "armory_plugins::invoker";

/// Lifecycle stage of an invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// The plugin checks its bound configuration.
    Validate,
    /// The plugin builds its artefact.
    Build,
    /// The plugin encodes input data.
    Encode,
}

impl Stage {
    /// Returns the stage name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validate => "validate",
            Self::Build => "build",
            Self::Encode => "encode",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the caller asks a bound plugin to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvocationMode {
    /// Encode the given bytes.
    Encode(Vec<u8>),
    /// Build the artefact.
    Build,
}

impl InvocationMode {
    const fn stage(&self) -> Stage {
        match self {
            Self::Encode(_) => Stage::Encode,
            Self::Build => Stage::Build,
        }
    }
}

/// Output of a successful invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Artifact {
    /// Bytes produced by an encoder.
    Encoded(Vec<u8>),
    /// Text produced by a payload or exploit.
    Built(String),
}

impl Artifact {
    /// Returns the raw bytes of the artefact.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Encoded(bytes) => bytes,
            Self::Built(text) => text.as_bytes(),
        }
    }

    /// Returns the artefact as text, replacing invalid UTF-8.
    #[must_use]
    pub fn to_text(&self) -> String {
        String::from_utf8_lossy(self.as_bytes()).into_owned()
    }

    const fn type_name(&self) -> &'static str {
        match self {
            Self::Encoded(_) => "encoded",
            Self::Built(_) => "built",
        }
    }
}

impl Serialize for Artifact {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let fields = match self {
            Self::Encoded(_) => 3,
            Self::Built(_) => 2,
        };
        let mut state = serializer.serialize_struct("Artifact", fields)?;
        state.serialize_field("type", self.type_name())?;
        state.serialize_field("text", &self.to_text())?;
        if let Self::Encoded(bytes) = self {
            state.serialize_field("hex", &hex::encode(bytes))?;
        }
        state.end()
    }
}

/// Runs a bound plugin.
///
/// # Errors
///
/// Returns an [`InvocationFailure`] when self-validation rejects the
/// configuration, when the build or encode step fails or panics, or when the
/// mode does not match the plugin's capability.
pub fn invoke(bound: BoundPlugin, mode: InvocationMode) -> Result<Artifact, InvocationFailure> {
    let plugin = bound.class().identifier().to_string();
    let stage = mode.stage();
    let capability = bound.into_capability();

    guarded(&plugin, Stage::Validate, || match &capability {
        Capability::Buildable(inner) => inner.validate(),
        Capability::Encodable(inner) => inner.validate(),
    })?;

    let artifact = match (&capability, mode) {
        (Capability::Buildable(inner), InvocationMode::Build) => {
            guarded(&plugin, stage, || inner.build()).map(Artifact::Built)
        }
        (Capability::Encodable(inner), InvocationMode::Encode(data)) => {
            guarded(&plugin, stage, || inner.encode(&data)).map(Artifact::Encoded)
        }
        (other, _) => Err(InvocationFailure::new(
            stage,
            format!("plugin is {} and cannot {stage}", other.name()),
        )),
    }?;

    debug!(target: INVOKE_TARGET, plugin = plugin.as_str(), %stage, "plugin invoked");
    Ok(artifact)
}

/// Runs one plugin call, converting rejections and panics into failures.
fn guarded<T>(
    plugin: &str,
    stage: Stage,
    call: impl FnOnce() -> Result<T, PluginRejection>,
) -> Result<T, InvocationFailure> {
    match panic::catch_unwind(AssertUnwindSafe(call)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(rejection)) => {
            debug!(
                target: INVOKE_TARGET,
                plugin,
                %stage,
                reason = rejection.message(),
                "plugin rejected invocation"
            );
            Err(InvocationFailure::new(stage, rejection.message()))
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            warn!(target: INVOKE_TARGET, plugin, %stage, message, "plugin panicked");
            Err(InvocationFailure::new(stage, format!("plugin panicked: {message}")))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
