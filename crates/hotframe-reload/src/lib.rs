//! Hot-reload support for application-defined types
//!
//! - [`ReloadPolicy`]: which names are hot-swappable
//! - [`StableRegistry`]: the host's identity-stable types
//! - [`DelegatingLoader`]: one generation of reloadable definitions
//! - [`ReloadableLoaderScope`]: the active generation and its rotation
//! - [`ClassPathWatcher`]: file-change trigger for rotation

mod loader;
mod policy;
mod scope;
mod stable;
mod watcher;

pub use loader::DelegatingLoader;
pub use policy::{ReloadPolicy, Tier};
pub use scope::{ReloadEvent, ReloadableLoaderScope};
pub use stable::StableRegistry;
pub use watcher::{ClassPathWatcher, WatchEvent, WatchEventKind, spawn_rotation_task};

pub use hotframe_kernel::config::{ReloadConfig, WatchConfig};
pub use hotframe_kernel::reload::{
    ConfigurationError, ResolutionError, ResolutionResult, TypeDescriptor, TypeRef, TypeResolver,
    TypeTier,
};
