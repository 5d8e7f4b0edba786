//! Job kinds and their form schemas.

use armory_plugins::error::SchemaError;
use armory_plugins::schema::{DeclaredType, ParamDecl, ParamSpec, derive_declarations};
use armory_plugins::{ParamValue, ValidatedParams};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Repository names accepted by the repo jobs.
const REPO_NAME_PATTERN: &str = r"[A-Za-z0-9][A-Za-z0-9._-]*";

/// Git remotes: URL forms plus the scp-like `user@host:path` form.
const GIT_URI_PATTERN: &str =
    r"(?:https?|git|ssh)://[^\s/]+/\S+|[A-Za-z0-9._-]+@[A-Za-z0-9.-]+:\S+";

const PORT_MIN: i64 = 1;
const PORT_MAX: i64 = 65_535;

/// Background work Armory can enqueue.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JobKind {
    /// Clones a plugin repository.
    InstallRepo,
    /// Pulls one installed repository.
    UpdateRepo,
    /// Pulls every installed repository.
    UpdateRepos,
    /// Deletes one installed repository.
    RemoveRepo,
    /// Deletes every installed repository.
    PurgeRepos,
    /// Runs an nmap scan.
    Nmap,
    /// Runs a masscan scan.
    Masscan,
    /// Imports scan output into the database.
    Import,
    /// Spiders a host, domain, or site.
    Spider,
    /// Runs recursive recon over a scope.
    Recon,
}

impl JobKind {
    /// Every job kind.
    pub const ALL: [Self; 10] = [
        Self::InstallRepo,
        Self::UpdateRepo,
        Self::UpdateRepos,
        Self::RemoveRepo,
        Self::PurgeRepos,
        Self::Nmap,
        Self::Masscan,
        Self::Import,
        Self::Spider,
        Self::Recon,
    ];

    /// Name of the worker that executes this job.
    #[must_use]
    pub const fn worker(self) -> &'static str {
        match self {
            Self::InstallRepo => "install_repo",
            Self::UpdateRepo => "update_repo",
            Self::UpdateRepos => "update_repos",
            Self::RemoveRepo => "remove_repo",
            Self::PurgeRepos => "purge_repos",
            Self::Nmap => "nmap",
            Self::Masscan => "masscan",
            Self::Import => "import",
            Self::Spider => "spider",
            Self::Recon => "recon",
        }
    }

    /// Returns `false` for jobs that run without arguments.
    #[must_use]
    pub const fn takes_form(self) -> bool {
        !matches!(self, Self::UpdateRepos | Self::PurgeRepos)
    }

    /// Form fields this job accepts, in display order.
    #[must_use]
    pub fn declarations(self) -> Vec<ParamDecl> {
        match self {
            Self::InstallRepo => vec![
                ParamDecl::new("uri", DeclaredType::String)
                    .required()
                    .with_pattern(GIT_URI_PATTERN)
                    .describe("Git URI of the repository"),
                ParamDecl::new("name", DeclaredType::String)
                    .with_pattern(REPO_NAME_PATTERN)
                    .describe("Directory name to install under"),
            ],
            Self::UpdateRepo | Self::RemoveRepo => vec![
                ParamDecl::new("name", DeclaredType::String)
                    .required()
                    .with_pattern(REPO_NAME_PATTERN)
                    .describe("Installed repository name"),
            ],
            Self::UpdateRepos | Self::PurgeRepos => Vec::new(),
            Self::Nmap => vec![
                ParamDecl::new("targets", strings()).required(),
                ports(),
                ParamDecl::new("service_scan", DeclaredType::Boolean)
                    .describe("Probe open ports for service versions"),
                ParamDecl::new("os_fingerprint", DeclaredType::Boolean)
                    .describe("Attempt OS detection"),
                ParamDecl::new("skip_discovery", DeclaredType::Boolean)
                    .describe("Treat every target as up"),
            ],
            Self::Masscan => vec![
                ParamDecl::new("ips", strings()).required(),
                ports().required(),
            ],
            Self::Import => vec![
                ParamDecl::new("type", DeclaredType::choices(["nmap", "masscan"])).required(),
                ParamDecl::new("path", DeclaredType::String)
                    .required()
                    .describe("Path of the scan output file"),
            ],
            Self::Spider => vec![
                ParamDecl::new("type", DeclaredType::choices(["host", "domain", "site"]))
                    .required(),
                ParamDecl::new("target", DeclaredType::String).required(),
                ParamDecl::new("hosts", strings()).describe("Additional hosts to visit"),
                ports(),
                ParamDecl::new("urls", strings()).describe("Seed URLs"),
                ParamDecl::new("exts", strings()).describe("File extensions to follow"),
            ],
            Self::Recon => vec![
                ParamDecl::new("scope", strings()).required(),
                ParamDecl::new("max_depth", DeclaredType::Integer)
                    .with_range(1, 10)
                    .describe("How far to recurse from the scope"),
            ],
        }
    }

    /// Derives the form schema of this job.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] if a declaration is inconsistent.
    pub fn schema(self) -> Result<Vec<ParamSpec>, SchemaError> {
        derive_declarations(self.worker(), &self.declarations())
    }

    /// Positional worker arguments for validated form values.
    ///
    /// Repository jobs take their fields positionally; scan jobs take one
    /// object holding every accepted field.
    #[must_use]
    pub fn arguments(self, params: &ValidatedParams) -> Vec<serde_json::Value> {
        let field = |name: &str| {
            params
                .get(name)
                .map_or(serde_json::Value::Null, ParamValue::to_json)
        };
        match self {
            Self::InstallRepo => vec![field("uri"), field("name")],
            Self::UpdateRepo | Self::RemoveRepo => vec![field("name")],
            Self::UpdateRepos | Self::PurgeRepos => Vec::new(),
            Self::Nmap | Self::Masscan | Self::Import | Self::Spider | Self::Recon => {
                vec![params.to_json()]
            }
        }
    }

    /// Confirmation shown once the job is enqueued.
    #[must_use]
    pub fn confirmation(self, params: &ValidatedParams) -> String {
        let text = |name: &str| params.get(name).map(ToString::to_string).unwrap_or_default();
        match self {
            Self::InstallRepo => format!("Installing repo at {}", text("uri")),
            Self::UpdateRepo => format!("Repo {} enqueued for update", text("name")),
            Self::UpdateRepos => "All repos will be updated".to_owned(),
            Self::RemoveRepo => format!("Repo {} enqueued for removal", text("name")),
            Self::PurgeRepos => "All repos will be purged".to_owned(),
            Self::Nmap => format!("Scan of {} enqueued", joined(params, "targets", ",")),
            Self::Masscan => format!("Scan of {} enqueued", joined(params, "ips", ",")),
            Self::Import => format!("Import of {} file {} enqueued", text("type"), text("path")),
            Self::Spider => format!("Web spider of {} {} enqueued", text("type"), text("target")),
            Self::Recon => format!("Recon of {} enqueued", joined(params, "scope", ", ")),
        }
    }
}

fn strings() -> DeclaredType {
    DeclaredType::list_of(DeclaredType::String)
}

fn ports() -> ParamDecl {
    ParamDecl::new("ports", DeclaredType::list_of(DeclaredType::Integer))
        .with_range(PORT_MIN, PORT_MAX)
        .describe("Ports to probe")
}

fn joined(params: &ValidatedParams, name: &str, separator: &str) -> String {
    params
        .get(name)
        .and_then(ParamValue::as_list)
        .map(|items| {
            items
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(separator)
        })
        .unwrap_or_default()
}
