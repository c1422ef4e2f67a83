//! Descriptor registries: written during bootstrap, immutable afterwards.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use crate::provision::descriptor::Describe;

/// Mutable registry under construction. Only discovery writes here; once
/// `build` is called the entries never change again.
pub struct RegistryBuilder<D: Describe> {
    entries: HashMap<String, D>,
}

impl<D: Describe> RegistryBuilder<D> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Insert a descriptor. A duplicate name overwrites the previous entry
    /// (last writer wins) with a warning — never an error.
    pub fn register(&mut self, descriptor: D) {
        let name = descriptor.name().to_string();
        if self.entries.insert(name.clone(), descriptor).is_some() {
            warn!(step = %name, "descriptor re-registered; keeping the later registration");
        }
    }

    /// Freeze into the immutable snapshot handed to the orchestrators.
    pub fn build(self) -> Registry<D> {
        Registry {
            entries: Arc::new(self.entries),
        }
    }
}

impl<D: Describe> Default for RegistryBuilder<D> {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable post-bootstrap registry snapshot. Cloning is cheap.
#[derive(Clone)]
pub struct Registry<D: Describe> {
    entries: Arc<HashMap<String, D>>,
}

impl<D: Describe> Registry<D> {
    /// An empty registry; both engines treat it as a trivially successful
    /// run with nothing to do.
    pub fn empty() -> Self {
        RegistryBuilder::new().build()
    }

    pub fn get(&self, name: &str) -> Option<&D> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &D> {
        self.entries.values()
    }
}

#[cfg(test)]
// Tests are allowed to use unwrap/expect freely.
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::provision::descriptor::InitializerDescriptor;
    use crate::provision::testing::NoopInitializer;

    fn descriptor(name: &str, description: &str) -> InitializerDescriptor {
        InitializerDescriptor::new(name, || Arc::new(NoopInitializer))
            .with_description(description)
    }

    #[test]
    fn register_and_lookup() {
        let mut builder = RegistryBuilder::new();
        builder.register(descriptor("profile", "first"));
        builder.register(descriptor("locale_prefs", "second"));

        let registry = builder.build();
        assert_eq!(registry.len(), 2);
        assert!(registry.contains("profile"));
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn duplicate_name_keeps_later_registration() {
        let mut builder = RegistryBuilder::new();
        builder.register(descriptor("profile", "first"));
        builder.register(descriptor("profile", "second"));

        let registry = builder.build();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("profile").unwrap().description(), "second");
    }

    #[test]
    fn empty_registry_reports_empty() {
        let registry = Registry::<InitializerDescriptor>::empty();
        assert!(registry.is_empty());
        assert_eq!(registry.iter().count(), 0);
    }
}
