//! Routes parsed requests onto the plugin pipeline and job submission.

use armory_jobs::JobSubmitter;
use armory_plugins::{ClassRegistry, Pipeline, PluginKind};
use serde::Serialize;
use tracing::debug;

use super::errors::DispatchError;
use super::reply::{Reply, STATUS_ACCEPTED, STATUS_OK};
use super::request::Request;

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

#[derive(Debug, Serialize)]
struct Listing<'a> {
    plugin: &'a str,
    kind: PluginKind,
}

#[derive(Debug, Serialize)]
struct Listings<'a> {
    plugins: Vec<Listing<'a>>,
}

/// Answers one request at a time.
#[derive(Clone, Copy)]
pub struct Dispatcher<'d> {
    registry: &'d ClassRegistry,
    pipeline: Pipeline<'d>,
    jobs: JobSubmitter<'d>,
}

impl<'d> Dispatcher<'d> {
    /// Creates a dispatcher over a registry, a configured pipeline, and a
    /// job submitter.
    #[must_use]
    pub const fn new(
        registry: &'d ClassRegistry,
        pipeline: Pipeline<'d>,
        jobs: JobSubmitter<'d>,
    ) -> Self {
        Self {
            registry,
            pipeline,
            jobs,
        }
    }

    /// Answers `request`.
    ///
    /// Plugin and job failures become error replies; only a reply that
    /// cannot be serialised is an error.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::SerializeReply`].
    pub fn handle(&self, request: Request) -> Result<Reply, DispatchError> {
        debug!(target: DISPATCH_TARGET, op = request.op(), "dispatching request");
        match request {
            Request::List { kind } => Reply::with_body(STATUS_OK, &self.list(kind)),
            Request::Describe { kind, plugin } => match self.pipeline.describe(kind, &plugin) {
                Ok(description) => Reply::with_body(STATUS_OK, &description),
                Err(error) => Ok(Reply::pipeline_error(&error)),
            },
            Request::Encode { plugin, form } => {
                match self.pipeline.encode(&plugin, &form.into_form()) {
                    Ok(outcome) => Reply::with_body(STATUS_OK, &outcome),
                    Err(error) => Ok(Reply::pipeline_error(&error)),
                }
            }
            Request::Build { kind, plugin, form } => {
                match self.pipeline.build(kind, &plugin, &form.into_form()) {
                    Ok(outcome) => Reply::with_body(STATUS_OK, &outcome),
                    Err(error) => Ok(Reply::pipeline_error(&error)),
                }
            }
            Request::Enqueue { job, form } => match self.jobs.submit(job, &form.into_form()) {
                Ok(receipt) => Reply::with_body(STATUS_ACCEPTED, &receipt),
                Err(error) => Ok(Reply::job_error(&error)),
            },
        }
    }

    fn list(&self, kind: Option<PluginKind>) -> Listings<'d> {
        let registry = self.registry;
        let kinds = kind.map_or_else(|| PluginKind::ALL.to_vec(), |only| vec![only]);
        let plugins = kinds
            .into_iter()
            .flat_map(|listed| {
                registry
                    .list(listed)
                    .into_iter()
                    .map(move |identifier| Listing {
                        plugin: identifier.as_str(),
                        kind: listed,
                    })
            })
            .collect();
        Listings { plugins }
    }
}
