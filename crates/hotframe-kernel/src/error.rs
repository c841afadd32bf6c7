//! Crate-level error types for `hotframe-kernel`.
//!
//! [`KernelError`] composes the typed errors of every sub-system so callers
//! that juggle both resolution and rendering can use one type, and
//! [`KernelResult`] pairs it with [`error_stack::Report`] for context-carrying
//! propagation.
//!
//! ```rust,ignore
//! use error_stack::ResultExt;
//! use hotframe_kernel::error::{KernelError, KernelResult};
//!
//! fn boot(scope: &ReloadableLoaderScope) -> KernelResult<TypeRef> {
//!     scope
//!         .resolve("com.example.app.NewsFrame")
//!         .map_err(KernelError::from)
//!         .map_err(error_stack::Report::new)
//!         .attach("resolving the news frame")
//! }
//! ```

use thiserror::Error;

use crate::config::ConfigError;
use crate::frame::{FrameError, TemplateError, TemplateRenderError, UsageError};
use crate::reload::{ConfigurationError, ResolutionError};

/// Crate-level error type for `hotframe-kernel`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum KernelError {
    /// Invalid reload class-path.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Type resolution failed.
    #[error("Resolution error: {0}")]
    Resolution(#[from] ResolutionError),

    /// Once directive misuse outside a template render.
    #[error("Usage error: {0}")]
    Usage(#[from] UsageError),

    /// A template failed for a known frame.
    #[error("Template render error: {0}")]
    TemplateRender(#[from] TemplateRenderError),

    /// A template failed outside the render pipeline.
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    /// A render invocation failed.
    #[error("Frame error: {0}")]
    Frame(#[from] FrameError),

    /// A settings file could not be loaded.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// An internal / untyped error described by a message string.
    #[error("{0}")]
    Internal(String),
}

/// Convenience result alias using [`error_stack::Report`].
pub type KernelResult<T> = Result<T, error_stack::Report<KernelError>>;
