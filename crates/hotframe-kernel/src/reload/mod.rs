//! Type resolution contracts
//!
//! A resolved type is an [`Arc<TypeDescriptor>`](TypeRef). Identity is pointer
//! identity of the `Arc`: two resolutions returning the same type object within
//! one generation compare equal under [`TypeDescriptor::same`].

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub mod error;
pub use error::{ConfigurationError, ResolutionError, ResolutionResult};

/// Separator between package segments in a fully-qualified type name.
pub const SEGMENT_SEPARATOR: char = '.';

/// Separator between an outer type and a nested type.
pub const NESTED_SEPARATOR: char = '$';

/// Which tier produced a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeTier {
    /// Owned by the host; one identity for the whole process.
    Stable,
    /// Loaded from the reload class-path by one generation.
    Reloadable {
        /// Generation that defined the type.
        generation: u64,
    },
}

impl TypeTier {
    pub fn is_reloadable(&self) -> bool {
        matches!(self, TypeTier::Reloadable { .. })
    }

    /// Generation id for reloadable types.
    pub fn generation(&self) -> Option<u64> {
        match self {
            TypeTier::Stable => None,
            TypeTier::Reloadable { generation } => Some(*generation),
        }
    }
}

/// A resolved type
#[derive(Debug)]
pub struct TypeDescriptor {
    name: String,
    tier: TypeTier,
    origin: Option<PathBuf>,
    digest: String,
    unit: Vec<u8>,
}

/// Shared handle to a resolved type.
pub type TypeRef = Arc<TypeDescriptor>;

impl TypeDescriptor {
    /// Descriptor for a host-owned type with no backing unit.
    pub fn stable(name: impl Into<String>) -> Self {
        Self::from_unit(name, TypeTier::Stable, None, Vec::new())
    }

    /// Descriptor for a type defined from unit bytes. The digest is the
    /// SHA-256 of `unit`.
    pub fn from_unit(
        name: impl Into<String>,
        tier: TypeTier,
        origin: Option<PathBuf>,
        unit: Vec<u8>,
    ) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(&unit);
        Self {
            name: name.into(),
            tier,
            origin,
            digest: hex::encode(hasher.finalize()),
            unit,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tier(&self) -> TypeTier {
        self.tier
    }

    /// File the unit was read from, if any.
    pub fn origin(&self) -> Option<&Path> {
        self.origin.as_deref()
    }

    /// Hex SHA-256 of the unit bytes.
    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn unit(&self) -> &[u8] {
        &self.unit
    }

    /// Simple name: the last segment, nested part included.
    pub fn simple_name(&self) -> &str {
        self.name
            .rsplit(SEGMENT_SEPARATOR)
            .next()
            .unwrap_or(&self.name)
    }

    /// Reference identity of two resolved types.
    pub fn same(a: &TypeRef, b: &TypeRef) -> bool {
        Arc::ptr_eq(a, b)
    }
}

/// Resolves fully-qualified type names to type objects.
///
/// Implemented by the host's stable registry and by every generation's
/// delegating loader.
pub trait TypeResolver: Send + Sync {
    fn resolve(&self, name: &str) -> ResolutionResult<TypeRef>;
}

impl<T: TypeResolver + ?Sized> TypeResolver for Arc<T> {
    fn resolve(&self, name: &str) -> ResolutionResult<TypeRef> {
        (**self).resolve(name)
    }
}
