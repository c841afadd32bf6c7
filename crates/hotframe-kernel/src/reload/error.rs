//! Typed errors for the reload sub-system.

use std::path::PathBuf;

use thiserror::Error;

/// Invalid reload class-path configuration.
///
/// Raised while a generation is being constructed; a generation with a bad
/// class-path never becomes active.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigurationError {
    /// A configured class-path root does not exist.
    #[error("Reload class-path root does not exist: {}", .0.display())]
    MissingRoot(PathBuf),

    /// A configured class-path root exists but is not a directory.
    #[error("Expected to find directory for the reload class-path root {}", .0.display())]
    NotADirectory(PathBuf),

    /// The unit file extension is empty or contains a path separator.
    #[error("Invalid unit extension: '{0}'")]
    InvalidExtension(String),
}

/// A type name could not be resolved on either path.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ResolutionError {
    /// Nothing is registered or present under this name.
    #[error("Type not found: {name}")]
    NotFound {
        /// The fully-qualified type name.
        name: String,
    },

    /// The name has empty segments or characters that cannot map to a unit path.
    #[error("Invalid type name: '{0}'")]
    InvalidName(String),

    /// The unit file exists but could not be read.
    #[error("Failed to read unit for {name} from {}: {source}", path.display())]
    Io {
        name: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ResolutionError {
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    /// The type name this error is about.
    pub fn name(&self) -> &str {
        match self {
            Self::NotFound { name } | Self::InvalidName(name) | Self::Io { name, .. } => name,
        }
    }
}

/// Resolution result type.
pub type ResolutionResult<T> = Result<T, ResolutionError>;
