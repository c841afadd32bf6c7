//! Hotframe kernel
//!
//! Contracts shared by the reload and render crates:
//! - [`reload`]: type descriptors, the resolver seam and resolution errors
//! - [`frame`]: frame lifecycle, cache, template and hook collaborators
//! - [`config`]: multi-format configuration loading and the reload settings
//! - [`error`]: the crate-level error umbrella
//! - [`logging`]: tracing subscriber bootstrap

// reload contracts
pub mod reload;
pub use reload::{
    ConfigurationError, ResolutionError, ResolutionResult, TypeDescriptor, TypeRef,
    TypeResolver, TypeTier,
};

// frame contracts
pub mod frame;
pub use frame::{
    ActionHook, BoxError, CacheHandler, Frame, FrameError, FrameResult, Template, TemplateError,
    TemplateParams, TemplateRenderError, TemplateResult, UsageError,
};

// config module
pub mod config;

// error module
pub mod error;

// logging module
pub mod logging;
