//! Validating and enqueueing job submissions.

use armory_plugins::error::SchemaError;
use armory_plugins::form::{self, FieldErrors};
use armory_plugins::{FormInput, ValidatedParams};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::kind::JobKind;
use crate::queue::{JobId, JobQueue, JobRequest, QueueError};

const SUBMIT_TARGET: &str = "armory_jobs::submit";

/// Why a submission was not enqueued.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobError {
    /// The form failed validation.
    #[error("job form validation failed: {0}")]
    Validation(FieldErrors),
    /// The job's own form schema is inconsistent.
    #[error(transparent)]
    Schema(#[from] SchemaError),
    /// The queue refused the job.
    #[error(transparent)]
    Queue(#[from] QueueError),
}

impl From<FieldErrors> for JobError {
    fn from(errors: FieldErrors) -> Self {
        Self::Validation(errors)
    }
}

impl JobError {
    /// HTTP status the caller should answer with.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::Schema(_) | Self::Queue(_) => 500,
        }
    }
}

/// Acknowledgement of an enqueued job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobReceipt {
    job_id: JobId,
    kind: JobKind,
    worker: &'static str,
    message: String,
}

impl JobReceipt {
    /// Identifier the queue issued.
    #[must_use]
    pub const fn job_id(&self) -> &JobId {
        &self.job_id
    }

    /// Kind of job enqueued.
    #[must_use]
    pub const fn kind(&self) -> JobKind {
        self.kind
    }

    /// Confirmation text for the submitter.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }
}

/// Validates job forms and hands them to a queue.
#[derive(Clone, Copy)]
pub struct JobSubmitter<'q> {
    queue: &'q dyn JobQueue,
}

impl<'q> JobSubmitter<'q> {
    /// Creates a submitter over `queue`.
    #[must_use]
    pub const fn new(queue: &'q dyn JobQueue) -> Self {
        Self { queue }
    }

    /// Validates `form` for `kind` and enqueues the job.
    ///
    /// Jobs that take no arguments ignore the form entirely.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::Validation`] with every field error when the form
    /// is rejected, and [`JobError::Queue`] when the queue refuses the job.
    pub fn submit(&self, kind: JobKind, form: &FormInput) -> Result<JobReceipt, JobError> {
        let result = self.enqueue(kind, form);
        match &result {
            Ok(receipt) => info!(
                target: SUBMIT_TARGET,
                worker = kind.worker(),
                job_id = %receipt.job_id,
                "job submitted"
            ),
            Err(error) => warn!(
                target: SUBMIT_TARGET,
                worker = kind.worker(),
                status = error.status_code(),
                error = %error,
                "job submission rejected"
            ),
        }
        result
    }

    fn enqueue(&self, kind: JobKind, form: &FormInput) -> Result<JobReceipt, JobError> {
        let params = if kind.takes_form() {
            form::validate(form, &kind.schema()?)?
        } else {
            ValidatedParams::empty()
        };
        let request = JobRequest::new(kind.worker(), kind.arguments(&params));
        let job_id = self.queue.enqueue(&request)?;
        Ok(JobReceipt {
            job_id,
            kind,
            worker: kind.worker(),
            message: kind.confirmation(&params),
        })
    }
}
