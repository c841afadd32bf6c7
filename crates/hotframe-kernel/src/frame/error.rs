//! Typed errors for the frame render path.

use thiserror::Error;

/// Once directive invoked with a bad configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum UsageError {
    /// The `scope` key is absent.
    #[error("Once directive expects exactly one attribute 'scope', none given")]
    MissingScope,

    /// `scope` is present but empty.
    #[error("Once directive attribute 'scope' must not be empty")]
    EmptyScope,

    /// Keys other than `scope` were supplied.
    #[error("Once directive expects exactly one attribute 'scope', got unexpected: {}", .0.join(", "))]
    UnexpectedKeys(Vec<String>),

    /// A key was given more than once.
    #[error("Once directive attribute '{0}' given more than once")]
    DuplicateKey(String),
}

/// Failure raised by a template collaborator.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TemplateError {
    /// The template source is malformed.
    #[error("Parse error at offset {offset}: {message}")]
    Parse { offset: usize, message: String },

    /// A referenced parameter is not in the mapping.
    #[error("Required parameter not provided: {0}")]
    MissingParameter(String),

    /// A directive was used incorrectly.
    #[error("Directive usage error: {0}")]
    Usage(#[from] UsageError),

    /// Writing to or flushing the output sink failed.
    #[error("Output sink error: {0}")]
    Io(#[from] std::io::Error),

    /// The rendered bytes are not valid UTF-8.
    #[error("Rendered output is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    /// Catch-all for engine-specific failures.
    #[error("{0}")]
    Other(String),
}

impl TemplateError {
    pub fn parse(offset: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            offset,
            message: message.into(),
        }
    }
}

/// Template result type.
pub type TemplateResult<T> = Result<T, TemplateError>;

/// A template failure attributed to the frame being rendered.
///
/// This is the only shape in which template collaborator errors leave the
/// render pipeline.
#[derive(Debug, Error)]
#[error("Can't render frame {frame}: {source}")]
pub struct TemplateRenderError {
    frame: String,
    #[source]
    source: TemplateError,
}

impl TemplateRenderError {
    pub fn new(frame: impl Into<String>, source: TemplateError) -> Self {
        Self {
            frame: frame.into(),
            source,
        }
    }

    /// Name of the frame whose template failed.
    pub fn frame(&self) -> &str {
        &self.frame
    }

    /// The underlying collaborator failure.
    pub fn cause(&self) -> &TemplateError {
        &self.source
    }

    pub fn into_cause(self) -> TemplateError {
        self.source
    }
}

/// Boxed underlying cause of a lifecycle failure.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors surfaced by one render invocation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FrameError {
    /// The action body failed.
    #[error("Action '{action}' of frame {frame} failed: {message}")]
    Action {
        frame: String,
        action: String,
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// A lifecycle step other than the action body failed.
    #[error("Lifecycle step '{step}' of frame {frame} failed: {message}")]
    Lifecycle {
        frame: String,
        step: &'static str,
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Template materialization failed.
    #[error(transparent)]
    Template(#[from] TemplateRenderError),
}

impl FrameError {
    pub fn action(
        frame: impl Into<String>,
        action: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Action {
            frame: frame.into(),
            action: action.into(),
            message: message.into(),
            source: None,
        }
    }

    pub fn lifecycle(frame: impl Into<String>, step: &'static str, message: impl Into<String>) -> Self {
        Self::Lifecycle {
            frame: frame.into(),
            step,
            message: message.into(),
            source: None,
        }
    }

    /// Attach the underlying cause of an action or lifecycle failure.
    pub fn with_source(mut self, cause: impl Into<BoxError>) -> Self {
        match &mut self {
            FrameError::Action { source, .. } | FrameError::Lifecycle { source, .. } => {
                *source = Some(cause.into());
            }
            FrameError::Template(_) => {}
        }
        self
    }

    /// Name of the frame the error belongs to.
    pub fn frame(&self) -> &str {
        match self {
            FrameError::Action { frame, .. } | FrameError::Lifecycle { frame, .. } => frame,
            FrameError::Template(e) => e.frame(),
        }
    }
}

/// Frame result type.
pub type FrameResult<T> = Result<T, FrameError>;
