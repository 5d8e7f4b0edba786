//! Plugins shipped with Armory.
//!
//! Every built-in is registered lazily: [`register_all`] only records the
//! loaders, and a class definition is built the first time it is resolved.

mod encoders;
mod exploits;
mod payloads;

use crate::capability::PluginRejection;
use crate::class::PluginKind;
use crate::error::RegistryError;
use crate::registry::{ClassLoader, ClassRegistry};
use crate::value::ParamValue;

const BUILTINS: &[(PluginKind, &str, ClassLoader)] = &[
    (PluginKind::Encoder, "base64", encoders::base64),
    (PluginKind::Encoder, "hex", encoders::hex),
    (PluginKind::Encoder, "url", encoders::url),
    (PluginKind::Encoder, "xor", encoders::xor),
    (PluginKind::Payload, "cmd/exec", payloads::cmd_exec),
    (PluginKind::Payload, "shell/reverse_tcp", payloads::reverse_tcp),
    (PluginKind::Exploit, "http/path_traversal", exploits::path_traversal),
];

/// Registers every built-in plugin.
///
/// # Errors
///
/// Returns [`RegistryError::Duplicate`] if one of the identifiers is already
/// registered for its kind.
pub fn register_all(registry: &mut ClassRegistry) -> Result<(), RegistryError> {
    for (kind, identifier, loader) in BUILTINS {
        registry.register_str(*kind, identifier, *loader)?;
    }
    Ok(())
}

fn expect_str(value: &ParamValue) -> Result<&str, PluginRejection> {
    value
        .as_str()
        .ok_or_else(|| PluginRejection::expected("string", value))
}

fn expect_integer(value: &ParamValue) -> Result<i64, PluginRejection> {
    value
        .as_integer()
        .ok_or_else(|| PluginRejection::expected("integer", value))
}

fn expect_bool(value: &ParamValue) -> Result<bool, PluginRejection> {
    value
        .as_bool()
        .ok_or_else(|| PluginRejection::expected("boolean", value))
}

fn expect_strings(value: &ParamValue) -> Result<Vec<String>, PluginRejection> {
    value
        .as_list()
        .ok_or_else(|| PluginRejection::expected("list", value))?
        .iter()
        .map(|item| expect_str(item).map(str::to_owned))
        .collect()
}

#[cfg(test)]
mod tests;
