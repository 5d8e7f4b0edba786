//! Registry of loadable plugin classes.
//!
//! The [`ClassRegistry`] maps identifiers to class loaders, one namespace per
//! [`PluginKind`]. A loader runs at most once per process, on first
//! resolution; concurrent first resolutions of the same identifier observe
//! the same class. Lookup never falls back to a name outside the registered
//! set, so a resolved identifier always names a registered class.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::{debug, info};

use crate::class::{ClassDefinition, PluginClass, PluginKind};
use crate::error::RegistryError;
use crate::identifier::PluginIdentifier;

const REGISTRY_TARGET: &str = "armory_plugins::registry";

/// Produces a class definition on first resolution.
pub type ClassLoader = fn() -> ClassDefinition;

#[derive(Debug)]
struct Entry {
    loader: ClassLoader,
    class: OnceCell<Arc<PluginClass>>,
}

/// Registry of plugin classes keyed by kind and identifier.
///
/// # Example
///
/// ```
/// use armory_plugins::{ClassRegistry, PluginKind};
///
/// let registry = ClassRegistry::with_builtins().expect("built-ins register");
/// let class = registry
///     .resolve_str("base64", PluginKind::Encoder)
///     .expect("base64 is registered");
/// assert_eq!(class.identifier().as_str(), "base64");
///
/// assert!(registry.resolve_str("base64", PluginKind::Payload).is_err());
/// ```
#[derive(Debug, Default)]
pub struct ClassRegistry {
    namespaces: HashMap<PluginKind, BTreeMap<PluginIdentifier, Entry>>,
}

impl ClassRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in plugins.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Duplicate`] if the built-in set registers an
    /// identifier twice.
    pub fn with_builtins() -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        crate::builtin::register_all(&mut registry)?;
        info!(
            target: REGISTRY_TARGET,
            classes = registry.len(),
            "built-in plugins registered"
        );
        Ok(registry)
    }

    /// Registers a class loader under an identifier.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Duplicate`] when the identifier is already
    /// registered for `kind`.
    pub fn register(
        &mut self,
        kind: PluginKind,
        identifier: PluginIdentifier,
        loader: ClassLoader,
    ) -> Result<(), RegistryError> {
        let namespace = self.namespaces.entry(kind).or_default();
        if namespace.contains_key(&identifier) {
            return Err(RegistryError::Duplicate {
                kind,
                identifier: identifier.into_string(),
            });
        }
        namespace.insert(
            identifier,
            Entry {
                loader,
                class: OnceCell::new(),
            },
        );
        Ok(())
    }

    /// Parses `identifier` and registers a class loader under it.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidIdentifier`] for malformed input and
    /// [`RegistryError::Duplicate`] for clashes.
    pub fn register_str(
        &mut self,
        kind: PluginKind,
        identifier: &str,
        loader: ClassLoader,
    ) -> Result<(), RegistryError> {
        self.register(kind, PluginIdentifier::parse(identifier)?, loader)
    }

    /// Resolves a class, loading it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::ClassNotFound`] when no class is registered
    /// under `identifier` for `kind`.
    pub fn resolve(
        &self,
        identifier: &PluginIdentifier,
        kind: PluginKind,
    ) -> Result<Arc<PluginClass>, RegistryError> {
        let entry = self
            .namespaces
            .get(&kind)
            .and_then(|namespace| namespace.get(identifier))
            .ok_or_else(|| RegistryError::ClassNotFound {
                kind,
                identifier: identifier.to_string(),
            })?;

        let class = entry.class.get_or_init(|| {
            debug!(
                target: REGISTRY_TARGET,
                %kind,
                identifier = identifier.as_str(),
                "loading plugin class"
            );
            Arc::new(PluginClass::from_definition(
                identifier.clone(),
                kind,
                (entry.loader)(),
            ))
        });
        Ok(Arc::clone(class))
    }

    /// Parses `identifier` and resolves it.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidIdentifier`] for malformed input and
    /// [`RegistryError::ClassNotFound`] for unknown identifiers.
    pub fn resolve_str(
        &self,
        identifier: &str,
        kind: PluginKind,
    ) -> Result<Arc<PluginClass>, RegistryError> {
        self.resolve(&PluginIdentifier::parse(identifier)?, kind)
    }

    /// Returns the identifiers registered for `kind`, sorted.
    #[must_use]
    pub fn list(&self, kind: PluginKind) -> Vec<&PluginIdentifier> {
        self.namespaces
            .get(&kind)
            .map(|namespace| namespace.keys().collect())
            .unwrap_or_default()
    }

    /// Returns `true` if `identifier` is registered for `kind`.
    #[must_use]
    pub fn contains(&self, identifier: &PluginIdentifier, kind: PluginKind) -> bool {
        self.namespaces
            .get(&kind)
            .is_some_and(|namespace| namespace.contains_key(identifier))
    }

    /// Returns the number of registered classes across all kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.namespaces.values().map(BTreeMap::len).sum()
    }

    /// Returns `true` when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
