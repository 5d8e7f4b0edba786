//! Request deserialisation for the dispatch loop.

use armory_jobs::JobKind;
use armory_plugins::{BuildForm, EncodeForm, FormInput, PluginKind};
use serde::Deserialize;

use super::errors::DispatchError;

/// One parsed request line.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    /// Lists plugin identifiers, optionally within one kind.
    List {
        /// Kind to list; every kind when absent.
        #[serde(default)]
        kind: Option<PluginKind>,
    },
    /// Renders the parameter schema of a plugin.
    Describe {
        /// Namespace of the plugin.
        kind: PluginKind,
        /// Plugin identifier.
        plugin: String,
    },
    /// Encodes data with an encoder.
    Encode {
        /// Encoder identifier.
        plugin: String,
        /// The encoder page submission.
        #[serde(default)]
        form: FormBody<EncodeForm>,
    },
    /// Builds a payload or exploit.
    Build {
        /// Namespace of the plugin.
        kind: PluginKind,
        /// Plugin identifier.
        plugin: String,
        /// The build page submission.
        #[serde(default)]
        form: FormBody<BuildForm>,
    },
    /// Enqueues a background job.
    Enqueue {
        /// Kind of job.
        job: JobKind,
        /// The job page submission.
        #[serde(default)]
        form: FormBody<FormInput>,
    },
}

impl Request {
    /// Operation name, for logs.
    #[must_use]
    pub const fn op(&self) -> &'static str {
        match self {
            Self::List { .. } => "list",
            Self::Describe { .. } => "describe",
            Self::Encode { .. } => "encode",
            Self::Build { .. } => "build",
            Self::Enqueue { .. } => "enqueue",
        }
    }

    /// Parses a request line.
    ///
    /// Trailing whitespace, including the newline delimiter, is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::MalformedRequest`] if the line is empty or is
    /// not a JSON request.
    pub fn parse(line: &[u8]) -> Result<Self, DispatchError> {
        let trimmed = line.trim_ascii_end();
        if trimmed.is_empty() {
            return Err(DispatchError::malformed("empty request line"));
        }
        serde_json::from_slice(trimmed).map_err(DispatchError::from_json_error)
    }
}

/// A submission given either as its urlencoded body or as JSON fields.
///
/// A urlencoded body uses the page's field names: `data` and
/// `params[name]` for plugin pages, the bare field names for job pages.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum FormBody<T> {
    /// `application/x-www-form-urlencoded` text.
    Urlencoded(String),
    /// Structured fields.
    Fields(T),
}

impl<T: Default> Default for FormBody<T> {
    fn default() -> Self {
        Self::Fields(T::default())
    }
}

impl<T: FromFlatForm> FormBody<T> {
    /// Resolves the submission into its structured form.
    #[must_use]
    pub fn into_form(self) -> T {
        match self {
            Self::Urlencoded(body) => T::from_flat(&FormInput::parse_urlencoded(&body)),
            Self::Fields(form) => form,
        }
    }
}

/// Forms that can be extracted from a flat field map.
pub trait FromFlatForm: Sized {
    /// Extracts the form from flat, page-named fields.
    fn from_flat(form: &FormInput) -> Self;
}

impl FromFlatForm for EncodeForm {
    fn from_flat(form: &FormInput) -> Self {
        Self::from_form(form)
    }
}

impl FromFlatForm for BuildForm {
    fn from_flat(form: &FormInput) -> Self {
        Self::from_form(form)
    }
}

impl FromFlatForm for FormInput {
    fn from_flat(form: &FormInput) -> Self {
        form.clone()
    }
}
