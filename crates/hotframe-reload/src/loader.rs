//! Selective delegating loader
//!
//! One loader per generation. Names the [`ReloadPolicy`] marks reloadable are
//! defined from unit files under the reload class-path and cached for the
//! life of the generation; every other name goes to the host's stable
//! resolver untouched.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use hotframe_kernel::config::ReloadConfig;
use hotframe_kernel::reload::{
    ConfigurationError, ResolutionError, ResolutionResult, SEGMENT_SEPARATOR, TypeDescriptor,
    TypeRef, TypeResolver, TypeTier,
};
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::policy::ReloadPolicy;

/// Generation-scoped loader
pub struct DelegatingLoader {
    generation: u64,
    class_path: Vec<PathBuf>,
    unit_extension: String,
    policy: Arc<ReloadPolicy>,
    stable: Arc<dyn TypeResolver>,
    /// Types defined by this generation. The lock also serializes the whole
    /// reloadable resolution path of this generation.
    defined: Mutex<HashMap<String, TypeRef>>,
    created_at: Instant,
}

impl DelegatingLoader {
    /// Build a generation. Every class-path root must be an existing
    /// directory.
    pub fn new(
        generation: u64,
        class_path: Vec<PathBuf>,
        unit_extension: &str,
        policy: Arc<ReloadPolicy>,
        stable: Arc<dyn TypeResolver>,
    ) -> Result<Self, ConfigurationError> {
        for root in &class_path {
            if !root.exists() {
                return Err(ConfigurationError::MissingRoot(root.clone()));
            }
            if !root.is_dir() {
                return Err(ConfigurationError::NotADirectory(root.clone()));
            }
        }

        if unit_extension.is_empty() || unit_extension.contains(['/', '\\']) {
            return Err(ConfigurationError::InvalidExtension(unit_extension.to_string()));
        }

        info!(
            "Created loader generation {} over {} class-path root(s)",
            generation,
            class_path.len()
        );

        Ok(Self {
            generation,
            class_path,
            unit_extension: unit_extension.to_string(),
            policy,
            stable,
            defined: Mutex::new(HashMap::new()),
            created_at: Instant::now(),
        })
    }

    pub fn from_config(
        generation: u64,
        config: &ReloadConfig,
        stable: Arc<dyn TypeResolver>,
    ) -> Result<Self, ConfigurationError> {
        Self::new(
            generation,
            config.class_path.clone(),
            &config.unit_extension,
            Arc::new(ReloadPolicy::from_config(config)),
            stable,
        )
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn class_path(&self) -> &[PathBuf] {
        &self.class_path
    }

    pub fn policy(&self) -> &ReloadPolicy {
        &self.policy
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Resolve a type name through the tier the policy selects.
    pub fn resolve(&self, name: &str) -> ResolutionResult<TypeRef> {
        if !self.policy.is_reloadable(name) {
            debug!("Resolving {} through the stable resolver", name);
            return self.stable.resolve(name);
        }

        let mut defined = self.defined.lock();
        if let Some(existing) = defined.get(name) {
            return Ok(existing.clone());
        }

        let handle = self.define(name)?;
        defined.insert(name.to_string(), handle.clone());
        Ok(handle)
    }

    /// Relative unit path of a type name, e.g. `a/b/C.frame` for `a.b.C`.
    pub fn unit_path(&self, name: &str) -> ResolutionResult<PathBuf> {
        let segments: Vec<&str> = name.split(SEGMENT_SEPARATOR).collect();
        let valid = segments.iter().all(|segment| {
            !segment.is_empty()
                && segment.trim() == *segment
                && !segment.contains(['/', '\\', ':', '\0'])
        });
        if !valid {
            return Err(ResolutionError::InvalidName(name.to_string()));
        }

        let (file, dirs) = segments
            .split_last()
            .ok_or_else(|| ResolutionError::InvalidName(name.to_string()))?;
        let mut path: PathBuf = dirs.iter().collect();
        path.push(format!("{}.{}", file, self.unit_extension));
        Ok(path)
    }

    /// Names defined by this generation, sorted.
    pub fn loaded_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.defined.lock().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn loaded_count(&self) -> usize {
        self.defined.lock().len()
    }

    /// Define a reloadable type from the first class-path root holding its unit.
    fn define(&self, name: &str) -> ResolutionResult<TypeRef> {
        let relative = self.unit_path(name)?;
        let path = self
            .find_unit(&relative)
            .ok_or_else(|| ResolutionError::not_found(name))?;

        let unit = std::fs::read(&path).map_err(|source| ResolutionError::Io {
            name: name.to_string(),
            path: path.clone(),
            source,
        })?;

        debug!(
            "Generation {} defined {} from {:?}",
            self.generation, name, path
        );

        Ok(Arc::new(TypeDescriptor::from_unit(
            name,
            TypeTier::Reloadable {
                generation: self.generation,
            },
            Some(path),
            unit,
        )))
    }

    fn find_unit(&self, relative: &Path) -> Option<PathBuf> {
        self.class_path
            .iter()
            .map(|root| root.join(relative))
            .find(|candidate| candidate.is_file())
    }
}

impl TypeResolver for DelegatingLoader {
    fn resolve(&self, name: &str) -> ResolutionResult<TypeRef> {
        DelegatingLoader::resolve(self, name)
    }
}

impl std::fmt::Debug for DelegatingLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DelegatingLoader")
            .field("generation", &self.generation)
            .field("class_path", &self.class_path)
            .field("unit_extension", &self.unit_extension)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl Drop for DelegatingLoader {
    fn drop(&mut self) {
        debug!("Retiring loader generation {}", self.generation);
    }
}
