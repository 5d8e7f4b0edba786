//! The queue seam and an in-process implementation.
//!
//! Execution of queued jobs is out of scope here: [`MemoryQueue`] holds
//! requests until a consumer calls [`MemoryQueue::drain`].

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const QUEUE_TARGET: &str = "armory_jobs::queue";

/// Identifier the queue assigns to an accepted job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Wraps an identifier issued by a queue.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A unit of work addressed to a named worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRequest {
    worker: String,
    args: Vec<serde_json::Value>,
}

impl JobRequest {
    /// Creates a request for `worker` with positional `args`.
    #[must_use]
    pub fn new(worker: impl Into<String>, args: Vec<serde_json::Value>) -> Self {
        Self {
            worker: worker.into(),
            args,
        }
    }

    /// Name of the worker.
    #[must_use]
    pub fn worker(&self) -> &str {
        self.worker.as_str()
    }

    /// Positional worker arguments.
    #[must_use]
    pub fn args(&self) -> &[serde_json::Value] {
        &self.args
    }
}

/// Errors reported by a [`JobQueue`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    /// The queue holds as many jobs as it accepts.
    #[error("job queue is full ({capacity} jobs)")]
    Full {
        /// Configured capacity.
        capacity: usize,
    },
    /// The backing queue could not accept work.
    #[error("job queue is unavailable: {reason}")]
    Unavailable {
        /// Backend diagnostic.
        reason: String,
    },
}

/// Accepts job requests for later execution.
pub trait JobQueue: Send + Sync {
    /// Enqueues `request`, returning the identifier of the job.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError`] if the job was not accepted.
    fn enqueue(&self, request: &JobRequest) -> Result<JobId, QueueError>;
}

/// A job held by [`MemoryQueue`].
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedJob {
    /// Identifier issued on enqueue.
    pub id: JobId,
    /// The accepted request.
    pub request: JobRequest,
}

#[derive(Debug, Default)]
struct State {
    issued: u64,
    jobs: VecDeque<QueuedJob>,
}

/// Bounded, thread-safe in-process queue.
///
/// Jobs leave only through [`MemoryQueue::drain`]. Once `capacity` jobs are
/// held, every further enqueue fails with [`QueueError::Full`].
#[derive(Debug)]
pub struct MemoryQueue {
    capacity: usize,
    state: Mutex<State>,
}

impl MemoryQueue {
    /// Creates a queue that holds at most `capacity` jobs.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            state: Mutex::new(State::default()),
        }
    }

    /// Maximum number of held jobs.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of held jobs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().jobs.len()
    }

    /// Returns `true` when no jobs are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().jobs.is_empty()
    }

    /// Removes and returns every held job, oldest first.
    #[must_use]
    pub fn drain(&self) -> Vec<QueuedJob> {
        self.lock().jobs.drain(..).collect()
    }

    // A panic while holding the lock cannot leave `State` half-updated.
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl JobQueue for MemoryQueue {
    fn enqueue(&self, request: &JobRequest) -> Result<JobId, QueueError> {
        let mut state = self.lock();
        if state.jobs.len() >= self.capacity {
            return Err(QueueError::Full {
                capacity: self.capacity,
            });
        }
        state.issued += 1;
        let id = JobId::new(format!("{:024x}", state.issued));
        state.jobs.push_back(QueuedJob {
            id: id.clone(),
            request: request.clone(),
        });
        debug!(
            target: QUEUE_TARGET,
            worker = request.worker(),
            job_id = %id,
            depth = state.jobs.len(),
            "job enqueued"
        );
        Ok(id)
    }
}
