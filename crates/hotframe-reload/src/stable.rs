//! Host stable registry
//!
//! Types the host owns for the whole process lifetime. Every generation
//! delegates non-reloadable names here, so static registries and equality
//! checks on these types keep working across hot swaps.

use std::collections::HashMap;
use std::sync::Arc;

use hotframe_kernel::reload::{ResolutionError, ResolutionResult, TypeDescriptor, TypeRef, TypeResolver};
use parking_lot::RwLock;
use tracing::debug;

/// Identity-stable type registry
#[derive(Default)]
pub struct StableRegistry {
    types: RwLock<HashMap<String, TypeRef>>,
}

impl StableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type and return its canonical handle.
    ///
    /// The first registration of a name wins; later registrations return the
    /// existing handle unchanged.
    pub fn register(&self, descriptor: TypeDescriptor) -> TypeRef {
        let mut types = self.types.write();
        if let Some(existing) = types.get(descriptor.name()) {
            debug!("Stable type {} already registered", descriptor.name());
            return existing.clone();
        }

        let name = descriptor.name().to_string();
        let handle: TypeRef = Arc::new(descriptor);
        types.insert(name, handle.clone());
        handle
    }

    /// Register a host type that has no backing unit.
    pub fn register_named(&self, name: &str) -> TypeRef {
        self.register(TypeDescriptor::stable(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.read().contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.types.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.types.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.read().is_empty()
    }
}

impl TypeResolver for StableRegistry {
    fn resolve(&self, name: &str) -> ResolutionResult<TypeRef> {
        self.types
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| ResolutionError::not_found(name))
    }
}
