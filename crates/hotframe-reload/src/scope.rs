//! Generation rotation
//!
//! [`ReloadableLoaderScope`] holds the active [`DelegatingLoader`]. Rotating
//! builds a fresh generation from the current configuration and swaps it in;
//! the old generation lives on only as long as someone still holds it or a
//! type it defined.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use hotframe_kernel::config::ReloadConfig;
use hotframe_kernel::reload::{ConfigurationError, ResolutionResult, TypeRef, TypeResolver};
use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::loader::DelegatingLoader;

/// Generation lifecycle event
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum ReloadEvent {
    /// A new generation became active.
    GenerationRotated {
        previous: u64,
        current: u64,
        duration: Duration,
    },
    /// Building a generation failed; the previous one stays active.
    RotationFailed { generation: u64, error: String },
}

/// Owner of the active generation
pub struct ReloadableLoaderScope {
    config: RwLock<ReloadConfig>,
    stable: Arc<dyn TypeResolver>,
    active: RwLock<Arc<DelegatingLoader>>,
    next_generation: AtomicU64,
    event_tx: broadcast::Sender<ReloadEvent>,
}

impl ReloadableLoaderScope {
    /// Build the scope and its first generation (generation 1).
    pub fn new(
        config: ReloadConfig,
        stable: Arc<dyn TypeResolver>,
    ) -> Result<Self, ConfigurationError> {
        let first = DelegatingLoader::from_config(1, &config, stable.clone())?;
        let (event_tx, _) = broadcast::channel(64);

        Ok(Self {
            config: RwLock::new(config),
            stable,
            active: RwLock::new(Arc::new(first)),
            next_generation: AtomicU64::new(2),
            event_tx,
        })
    }

    /// The active generation.
    ///
    /// Callers that keep the returned handle keep resolving against that
    /// generation even after a rotation.
    pub fn current(&self) -> Arc<DelegatingLoader> {
        self.active.read().clone()
    }

    pub fn generation(&self) -> u64 {
        self.active.read().generation()
    }

    /// Resolve against the generation active when the call starts.
    pub fn resolve(&self, name: &str) -> ResolutionResult<TypeRef> {
        self.current().resolve(name)
    }

    /// Build a new generation from the current configuration and make it
    /// active.
    pub fn rotate(&self) -> Result<Arc<DelegatingLoader>, ConfigurationError> {
        let started = Instant::now();
        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst);
        let config = self.config.read().clone();

        let loader = match DelegatingLoader::from_config(generation, &config, self.stable.clone()) {
            Ok(loader) => Arc::new(loader),
            Err(e) => {
                warn!("Failed to build loader generation {}: {}", generation, e);
                let _ = self.event_tx.send(ReloadEvent::RotationFailed {
                    generation,
                    error: e.to_string(),
                });
                return Err(e);
            }
        };

        let previous = {
            let mut active = self.active.write();
            std::mem::replace(&mut *active, loader.clone())
        };

        let duration = started.elapsed();
        info!(
            "Rotated loader generation {} -> {} in {:?}",
            previous.generation(),
            generation,
            duration
        );
        let _ = self.event_tx.send(ReloadEvent::GenerationRotated {
            previous: previous.generation(),
            current: generation,
            duration,
        });

        Ok(loader)
    }

    /// Replace the configuration used by the next [`rotate`](Self::rotate).
    /// The active generation is unaffected.
    pub fn reconfigure(&self, config: ReloadConfig) {
        *self.config.write() = config;
    }

    pub fn config(&self) -> ReloadConfig {
        self.config.read().clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReloadEvent> {
        self.event_tx.subscribe()
    }
}

impl TypeResolver for ReloadableLoaderScope {
    fn resolve(&self, name: &str) -> ResolutionResult<TypeRef> {
        ReloadableLoaderScope::resolve(self, name)
    }
}
