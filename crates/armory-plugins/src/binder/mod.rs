//! Binding validated parameters onto plugin instances.
//!
//! Binding walks the class's declarations in order and hands each value to
//! the plugin's own `assign` hook, so checks a static schema cannot express
//! (shell metacharacters in a host, say) run before anything is built.

use std::sync::Arc;

use tracing::debug;

use crate::capability::Capability;
use crate::class::{PluginClass, PluginInstance};
use crate::error::BindError;
use crate::form::ValidatedParams;

const BIND_TARGET: &str = "armory_plugins::binder";

/// A plugin instance whose parameters have all been accepted.
///
/// Only [`bind`] produces values of this type, so an invocation can never
/// run against an instance that skipped binding.
#[derive(Debug)]
pub struct BoundPlugin {
    class: Arc<PluginClass>,
    capability: Capability,
}

impl BoundPlugin {
    /// Returns the class of the bound instance.
    #[must_use]
    pub fn class(&self) -> &PluginClass {
        &self.class
    }

    pub(crate) fn into_capability(self) -> Capability {
        self.capability
    }
}

/// Assigns validated parameters to a fresh instance.
///
/// Submitted values take precedence over declared defaults. Binding stops at
/// the first rejection; the instance is consumed either way.
///
/// # Errors
///
/// Returns a [`BindError`] naming the field when the plugin rejects a value,
/// or when a required parameter ends up with neither a value nor a default.
pub fn bind(
    instance: PluginInstance,
    mut params: ValidatedParams,
) -> Result<BoundPlugin, BindError> {
    let (class, mut capability) = instance.into_parts();

    for decl in class.params() {
        let value = match params.take(decl.name()) {
            Some(value) => value,
            None => match decl.default() {
                Some(default) => default.clone(),
                None if decl.is_required() => {
                    return Err(BindError::new(decl.name(), "required parameter is not set"));
                }
                None => continue,
            },
        };
        capability
            .assign(decl.name(), &value)
            .map_err(|rejection| BindError::new(decl.name(), rejection.message()))?;
        debug!(
            target: BIND_TARGET,
            plugin = %class.identifier(),
            param = decl.name(),
            "parameter bound"
        );
    }

    if let Some((name, _)) = params.iter().next() {
        return Err(BindError::new(name, "parameter is not declared by the plugin"));
    }

    Ok(BoundPlugin { class, capability })
}
