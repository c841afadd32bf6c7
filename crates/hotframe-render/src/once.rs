//! At-most-once fragment emission
//!
//! [`OnceRegistry`] records scope tokens whose fragment has been emitted. It
//! belongs to a template configuration and lives as long as that
//! configuration. A token whose fragment was written is never evicted.

use std::io::Write;
use std::sync::Arc;

use dashmap::DashSet;
use hotframe_kernel::frame::{TemplateResult, UsageError};
use tracing::{debug, trace};

/// The only attribute the once directive accepts.
pub const SCOPE_KEY: &str = "scope";

/// Set of emitted scope tokens
#[derive(Debug, Default)]
pub struct OnceRegistry {
    emitted: DashSet<String>,
}

impl OnceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `scope` as emitted. Returns `true` for exactly one caller per
    /// token, however many race on it.
    pub fn try_claim(&self, scope: &str) -> bool {
        self.emitted.insert(scope.to_string())
    }

    pub fn is_emitted(&self, scope: &str) -> bool {
        self.emitted.contains(scope)
    }

    pub fn len(&self) -> usize {
        self.emitted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emitted.is_empty()
    }

    /// Emit the fragment produced by `body` into `out` unless `scope` was
    /// already emitted.
    ///
    /// The token is claimed before the body runs, so concurrent callers never
    /// both emit. The body renders into a buffer first; nothing reaches `out`
    /// unless it succeeds. If the body or the write fails the claim is
    /// released and a later render emits the fragment. Returns whether this
    /// call emitted.
    pub fn render_once<F>(&self, scope: &str, out: &mut dyn Write, body: Option<F>) -> TemplateResult<bool>
    where
        F: FnOnce(&mut dyn Write) -> TemplateResult<()>,
    {
        if scope.is_empty() {
            return Err(UsageError::EmptyScope.into());
        }

        if !self.try_claim(scope) {
            trace!("Once scope '{}' already emitted", scope);
            return Ok(false);
        }

        if let Some(body) = body {
            if let Err(e) = emit(out, body) {
                debug!("Once scope '{}' failed to emit, releasing it: {}", scope, e);
                self.emitted.remove(scope);
                return Err(e);
            }
        }

        Ok(true)
    }
}

fn emit<F>(out: &mut dyn Write, body: F) -> TemplateResult<()>
where
    F: FnOnce(&mut dyn Write) -> TemplateResult<()>,
{
    let mut buffer = Vec::new();
    body(&mut buffer)?;
    out.write_all(&buffer)?;
    out.flush()?;
    Ok(())
}

/// Template-facing once directive
///
/// Validates the directive attributes and forwards to the shared registry.
#[derive(Debug, Clone)]
pub struct OnceDirective {
    registry: Arc<OnceRegistry>,
}

impl OnceDirective {
    pub fn new(registry: Arc<OnceRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<OnceRegistry> {
        &self.registry
    }

    /// Extract the scope token from directive attributes.
    ///
    /// Exactly one non-empty `scope` attribute is accepted.
    pub fn scope_of(args: &[(String, String)]) -> Result<&str, UsageError> {
        let mut unexpected: Vec<String> = args
            .iter()
            .filter(|(key, _)| key != SCOPE_KEY)
            .map(|(key, _)| key.clone())
            .collect();
        if !unexpected.is_empty() {
            unexpected.sort();
            unexpected.dedup();
            return Err(UsageError::UnexpectedKeys(unexpected));
        }

        match args {
            [] => Err(UsageError::MissingScope),
            [(_, scope)] if scope.is_empty() => Err(UsageError::EmptyScope),
            [(_, scope)] => Ok(scope),
            _ => Err(UsageError::DuplicateKey(SCOPE_KEY.to_string())),
        }
    }

    /// Run the directive. Returns whether the fragment was emitted.
    pub fn execute<F>(&self, args: &[(String, String)], out: &mut dyn Write, body: Option<F>) -> TemplateResult<bool>
    where
        F: FnOnce(&mut dyn Write) -> TemplateResult<()>,
    {
        let scope = Self::scope_of(args)?;
        self.registry.render_once(scope, out, body)
    }
}
