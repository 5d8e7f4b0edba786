//! Background job submission for Armory.
//!
//! Repository management, scans, imports, spidering, and recon run outside
//! the request that starts them. Each [`JobKind`] carries a static form
//! schema expressed with the plugin [`ParamDecl`](armory_plugins::ParamDecl)
//! vocabulary, so job forms are derived and validated by the same
//! [`form::validate`](armory_plugins::form::validate) as plugin parameters.
//! A [`JobSubmitter`] validates a submission and hands the resulting
//! [`JobRequest`] to a [`JobQueue`].
//!
//! ```
//! use armory_jobs::{JobKind, JobSubmitter, MemoryQueue};
//! use armory_plugins::FormInput;
//!
//! let queue = MemoryQueue::with_capacity(8);
//! let submitter = JobSubmitter::new(&queue);
//! let form = FormInput::from_pairs([("targets", "10.0.0.1, 10.0.0.2")]);
//! let receipt = submitter.submit(JobKind::Nmap, &form).expect("enqueued");
//! assert_eq!(receipt.message(), "Scan of 10.0.0.1,10.0.0.2 enqueued");
//! assert_eq!(queue.len(), 1);
//! ```

mod kind;
pub mod queue;
pub mod submit;

pub use self::kind::JobKind;
pub use self::queue::{JobId, JobQueue, JobRequest, MemoryQueue, QueueError, QueuedJob};
pub use self::submit::{JobError, JobReceipt, JobSubmitter};
