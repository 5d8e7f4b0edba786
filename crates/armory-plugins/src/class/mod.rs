//! Plugin kinds, class descriptors, and per-request instances.
//!
//! A [`PluginClass`] is the resolved, immutable description of one plugin:
//! its identifier, kind, summary, parameter declarations, and the factory
//! that constructs instances. A [`PluginInstance`] is a freshly constructed
//! plugin owned by a single request.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::capability::Capability;
use crate::identifier::PluginIdentifier;
use crate::schema::ParamDecl;

/// Namespace a plugin class lives in.
///
/// # Example
///
/// ```
/// use armory_plugins::PluginKind;
///
/// assert_eq!(PluginKind::Encoder.as_str(), "encoder");
/// assert_eq!(PluginKind::Encoder.namespace(), "payloads/encoders");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PluginKind {
    /// Builds a payload artefact.
    Payload,
    /// Transforms payload bytes.
    Encoder,
    /// Builds an exploit request.
    Exploit,
}

impl PluginKind {
    /// All kinds, in display order.
    pub const ALL: [Self; 3] = [Self::Payload, Self::Encoder, Self::Exploit];

    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Payload => "payload",
            Self::Encoder => "encoder",
            Self::Exploit => "exploit",
        }
    }

    /// Returns the namespace path the kind's classes are grouped under.
    #[must_use]
    pub const fn namespace(self) -> &'static str {
        match self {
            Self::Payload => "payloads",
            Self::Encoder => "payloads/encoders",
            Self::Exploit => "exploits",
        }
    }

    /// Returns `true` when instances of this kind encode data rather than
    /// build artefacts.
    #[must_use]
    pub const fn encodes(self) -> bool {
        matches!(self, Self::Encoder)
    }
}

impl fmt::Display for PluginKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Constructs the capability of a fresh plugin instance.
pub type PluginFactory = fn() -> Capability;

/// What a class loader produces: everything about a class except its
/// identity, which the registry supplies.
#[derive(Debug, Clone)]
pub struct ClassDefinition {
    summary: String,
    params: Vec<ParamDecl>,
    factory: PluginFactory,
}

impl ClassDefinition {
    /// Creates a definition with no parameters.
    #[must_use]
    pub fn new(summary: impl Into<String>, factory: PluginFactory) -> Self {
        Self {
            summary: summary.into(),
            params: Vec::new(),
            factory,
        }
    }

    /// Declares the class's parameters, in form order.
    #[must_use]
    pub fn with_params(mut self, params: Vec<ParamDecl>) -> Self {
        self.params = params;
        self
    }
}

/// A resolved plugin class.
#[derive(Debug, Clone)]
pub struct PluginClass {
    identifier: PluginIdentifier,
    kind: PluginKind,
    summary: String,
    params: Vec<ParamDecl>,
    factory: PluginFactory,
}

impl PluginClass {
    /// Binds a definition to its registered identity.
    #[must_use]
    pub fn from_definition(
        identifier: PluginIdentifier,
        kind: PluginKind,
        definition: ClassDefinition,
    ) -> Self {
        Self {
            identifier,
            kind,
            summary: definition.summary,
            params: definition.params,
            factory: definition.factory,
        }
    }

    /// Returns the class identifier.
    #[must_use]
    pub const fn identifier(&self) -> &PluginIdentifier {
        &self.identifier
    }

    /// Returns the class kind.
    #[must_use]
    pub const fn kind(&self) -> PluginKind {
        self.kind
    }

    /// Returns the one-line summary.
    #[must_use]
    pub fn summary(&self) -> &str {
        self.summary.as_str()
    }

    /// Returns the declared parameters in declaration order.
    #[must_use]
    pub fn params(&self) -> &[ParamDecl] {
        &self.params
    }

    /// Constructs a fresh instance for one request.
    #[must_use]
    pub fn instantiate(self: &Arc<Self>) -> PluginInstance {
        PluginInstance {
            class: Arc::clone(self),
            capability: (self.factory)(),
        }
    }
}

/// One constructed plugin, owned by the request handling it.
#[derive(Debug)]
pub struct PluginInstance {
    class: Arc<PluginClass>,
    capability: Capability,
}

impl PluginInstance {
    /// Returns the class this instance was constructed from.
    #[must_use]
    pub fn class(&self) -> &PluginClass {
        &self.class
    }

    pub(crate) fn into_parts(self) -> (Arc<PluginClass>, Capability) {
        (self.class, self.capability)
    }
}
