//! Plugin resolution, parameter binding, and invocation for Armory.
//!
//! The `armory-plugins` crate implements the request-handling core behind the
//! payload, encoder, and exploit pages. A request names a plugin by
//! identifier; the crate resolves the plugin class, derives the shape of the
//! parameters it accepts, validates the submitted form against that shape,
//! binds the accepted values onto a fresh plugin instance, and finally builds
//! or encodes with it.
//!
//! # Architecture
//!
//! Each stage is a separate module with its own error type so the caller can
//! map every failure to a distinct response:
//!
//! 1. [`ClassRegistry`] resolves a [`PluginIdentifier`] within a
//!    [`PluginKind`] namespace. Class definitions load lazily, once per
//!    process.
//! 2. [`schema::derive`] turns a class's [`ParamDecl`]s into ordered
//!    [`ParamSpec`]s, failing closed on kinds it cannot validate.
//! 3. [`form::validate`] converts an untrusted [`FormInput`] into
//!    [`ValidatedParams`], collecting every [`FieldError`] in one pass.
//! 4. [`binder::bind`] assigns the validated values through the plugin's own
//!    checks and yields a [`BoundPlugin`].
//! 5. [`invoker::invoke`] runs self-validation and then the build or encode
//!    step, converting any plugin failure into an [`InvocationFailure`].
//!
//! [`Pipeline`] drives the five stages for one request.
//!
//! # Example
//!
//! ```
//! use armory_plugins::{ClassRegistry, EncodeForm, Pipeline};
//!
//! let registry = ClassRegistry::with_builtins().expect("built-ins register");
//! let pipeline = Pipeline::new(&registry);
//! let form = EncodeForm::new("hello");
//! let outcome = pipeline.encode("base64", &form).expect("encode succeeds");
//! assert_eq!(outcome.artifact().as_bytes(), b"aGVsbG8=");
//! ```

pub mod binder;
pub mod builtin;
pub mod capability;
pub mod class;
pub mod error;
pub mod form;
pub mod identifier;
pub mod invoker;
pub mod pipeline;
pub mod registry;
pub mod schema;
pub mod value;

#[cfg(test)]
mod tests;

pub use self::binder::BoundPlugin;
pub use self::capability::{Buildable, Capability, Encodable, PluginRejection};
pub use self::class::{ClassDefinition, PluginClass, PluginInstance, PluginKind};
pub use self::error::{
    BindError, IdentifierError, InvocationFailure, PipelineError, RegistryError, SchemaError,
};
pub use self::form::{FieldError, FieldErrors, FormInput, FormValue, ValidatedParams};
pub use self::identifier::PluginIdentifier;
pub use self::invoker::{Artifact, InvocationMode, Stage};
pub use self::pipeline::{BuildForm, ClassDescription, EncodeForm, Outcome, Pipeline, PipelineStage};
pub use self::registry::ClassRegistry;
pub use self::schema::{DeclaredType, ParamDecl, ParamKind, ParamSpec};
pub use self::value::ParamValue;
