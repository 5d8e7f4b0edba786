//! Reply framing for the dispatch loop.

use std::io::Write;

use armory_jobs::JobError;
use armory_plugins::{PipelineError, RegistryError};
use serde::Serialize;
use serde_json::{Map, Value, json};

use super::errors::DispatchError;

/// Status of a successful read-only or plugin request.
pub const STATUS_OK: u16 = 200;
/// Status of an accepted job.
pub const STATUS_ACCEPTED: u16 = 202;

/// One reply line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reply {
    /// HTTP-like status code.
    pub status: u16,
    /// Result or error description.
    pub body: Value,
}

impl Reply {
    /// Creates a reply with `status` and a serialisable body.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::SerializeReply`] if `body` cannot be
    /// represented as JSON.
    pub fn with_body(status: u16, body: &impl Serialize) -> Result<Self, DispatchError> {
        let body = serde_json::to_value(body).map_err(DispatchError::SerializeReply)?;
        Ok(Self { status, body })
    }

    /// Describes a failed plugin request.
    #[must_use]
    pub fn pipeline_error(error: &PipelineError) -> Self {
        let mut body = error_body(pipeline_error_kind(error), error);
        match error {
            PipelineError::Validation(errors) => {
                body.insert("errors".to_owned(), json!(errors));
            }
            PipelineError::Bind(bind) => {
                body.insert(
                    "bind_error".to_owned(),
                    json!({ "field": bind.field(), "reason": bind.reason() }),
                );
            }
            PipelineError::Invocation(failure) => {
                body.insert(
                    "invocation_failure".to_owned(),
                    json!({ "stage": failure.stage(), "message": failure.message() }),
                );
            }
            PipelineError::Registry(_) | PipelineError::Schema(_) => {}
        }
        Self {
            status: error.status_code(),
            body: Value::Object(body),
        }
    }

    /// Describes a failed job submission.
    #[must_use]
    pub fn job_error(error: &JobError) -> Self {
        let kind = match error {
            JobError::Validation(_) => "validation",
            JobError::Schema(_) => "schema",
            JobError::Queue(_) => "queue",
        };
        let mut body = error_body(kind, error);
        if let JobError::Validation(errors) = error {
            body.insert("errors".to_owned(), json!(errors));
        }
        Self {
            status: error.status_code(),
            body: Value::Object(body),
        }
    }

    /// Describes a protocol or daemon failure.
    #[must_use]
    pub fn dispatch_error(error: &DispatchError) -> Self {
        Self {
            status: error.status_code(),
            body: Value::Object(error_body(error.kind(), error)),
        }
    }

    /// Returns `true` for 4xx statuses.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        self.status >= 400 && self.status < 500
    }

    /// Returns `true` for 5xx statuses.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        self.status >= 500
    }
}

fn error_body(kind: &str, error: &dyn std::error::Error) -> Map<String, Value> {
    let mut body = Map::new();
    body.insert("error".to_owned(), Value::from(kind));
    body.insert("message".to_owned(), Value::String(error.to_string()));
    body
}

const fn pipeline_error_kind(error: &PipelineError) -> &'static str {
    match error {
        PipelineError::Registry(RegistryError::InvalidIdentifier(_)) => "invalid_identifier",
        PipelineError::Registry(RegistryError::ClassNotFound { .. }) => "not_found",
        PipelineError::Registry(RegistryError::Duplicate { .. }) => "duplicate",
        PipelineError::Schema(_) => "schema",
        PipelineError::Validation(_) => "validation",
        PipelineError::Bind(_) => "bind",
        PipelineError::Invocation(_) => "invocation",
    }
}

/// Writes replies as JSONL.
pub struct ReplyWriter<W> {
    writer: W,
}

impl<W: Write> ReplyWriter<W> {
    /// Creates a writer over `writer`.
    #[must_use]
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Writes one reply line and flushes it.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation or writing fails.
    pub fn write_reply(&mut self, reply: &Reply) -> Result<(), DispatchError> {
        serde_json::to_writer(&mut self.writer, reply).map_err(DispatchError::SerializeReply)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}
