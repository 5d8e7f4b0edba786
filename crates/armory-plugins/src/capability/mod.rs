//! Plugin capability traits.
//!
//! Plugins implement exactly one capability, selected by their
//! [`PluginKind`](crate::PluginKind): payloads and exploits are
//! [`Buildable`], encoders are [`Encodable`]. Both capabilities share the
//! same binding hook, [`assign`](Buildable::assign), which lets a plugin
//! apply checks that a static parameter schema cannot express.

use std::fmt;

use thiserror::Error;

use crate::value::ParamValue;

/// A plugin's refusal of a value or configuration.
///
/// The message is shown to the user verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct PluginRejection {
    message: String,
}

impl PluginRejection {
    /// Creates a rejection with the given message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Rejection for a parameter name the plugin does not declare.
    #[must_use]
    pub fn unknown_param(name: &str) -> Self {
        Self::new(format!("unknown parameter '{name}'"))
    }

    /// Rejection for a value of the wrong shape.
    #[must_use]
    pub fn expected(expected: &str, value: &ParamValue) -> Self {
        Self::new(format!("expected {expected}, got {}", value.shape()))
    }

    /// Returns the rejection message.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }
}

/// A plugin that assembles an artefact from its bound parameters.
pub trait Buildable: Send {
    /// Stores one parameter value, applying plugin-specific checks.
    ///
    /// # Errors
    ///
    /// Returns a [`PluginRejection`] when the value is unacceptable.
    fn assign(&mut self, name: &str, value: &ParamValue) -> Result<(), PluginRejection>;

    /// Checks that the bound parameters form an executable configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`PluginRejection`] describing the incoherence.
    fn validate(&self) -> Result<(), PluginRejection> {
        Ok(())
    }

    /// Builds the artefact.
    ///
    /// # Errors
    ///
    /// Returns a [`PluginRejection`] when building fails.
    fn build(&self) -> Result<String, PluginRejection>;
}

/// A plugin that transforms arbitrary bytes.
pub trait Encodable: Send {
    /// Stores one parameter value, applying plugin-specific checks.
    ///
    /// # Errors
    ///
    /// Returns a [`PluginRejection`] when the value is unacceptable.
    fn assign(&mut self, name: &str, value: &ParamValue) -> Result<(), PluginRejection>;

    /// Checks that the bound parameters form an executable configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`PluginRejection`] describing the incoherence.
    fn validate(&self) -> Result<(), PluginRejection> {
        Ok(())
    }

    /// Encodes `data`.
    ///
    /// # Errors
    ///
    /// Returns a [`PluginRejection`] when encoding fails.
    fn encode(&self, data: &[u8]) -> Result<Vec<u8>, PluginRejection>;

    /// Reverses [`encode`](Self::encode), when the encoding is invertible.
    ///
    /// Returns `None` for one-way encoders.
    fn decode(&self, data: &[u8]) -> Option<Result<Vec<u8>, PluginRejection>> {
        let _ = data;
        None
    }
}

/// The capability a plugin instance exposes.
pub enum Capability {
    /// The instance builds artefacts.
    Buildable(Box<dyn Buildable>),
    /// The instance encodes data.
    Encodable(Box<dyn Encodable>),
}

impl Capability {
    /// Wraps a buildable plugin.
    #[must_use]
    pub fn buildable(plugin: impl Buildable + 'static) -> Self {
        Self::Buildable(Box::new(plugin))
    }

    /// Wraps an encodable plugin.
    #[must_use]
    pub fn encodable(plugin: impl Encodable + 'static) -> Self {
        Self::Encodable(Box::new(plugin))
    }

    /// Forwards a parameter to the plugin's binding hook.
    ///
    /// # Errors
    ///
    /// Propagates the plugin's [`PluginRejection`].
    pub fn assign(&mut self, name: &str, value: &ParamValue) -> Result<(), PluginRejection> {
        match self {
            Self::Buildable(plugin) => plugin.assign(name, value),
            Self::Encodable(plugin) => plugin.assign(name, value),
        }
    }

    /// Returns the capability name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Buildable(_) => "buildable",
            Self::Encodable(_) => "encodable",
        }
    }
}

impl fmt::Debug for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Capability").field(&self.name()).finish()
    }
}
