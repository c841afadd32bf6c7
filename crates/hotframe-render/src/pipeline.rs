//! Frame render pipeline
//!
//! One [`RenderPipeline::render`] call drives a frame through cache
//! interception, its action lifecycle, template materialization and cache
//! post-processing:
//!
//! ```text
//! cache check ─hit──────────────────────────────────────────────┐
//!     │ miss                                                     │
//! prepare → initialize → before hooks → action → after hooks     │
//!     → finalize → skip template? ─yes──────────────────────────┤
//!                      │ no                                      │
//!              merge params → apply template → postprocess ─────┤
//!                                                                ▼
//!                                                       finalize always
//! ```

use std::io::Write;
use std::sync::Arc;

use hotframe_kernel::frame::{
    CacheHandler, Frame, FrameResult, TemplateError, TemplateParams, TemplateRenderError,
};
use tracing::{debug, trace, warn};

use crate::hooks::ActionHooks;
use crate::params::merge_params;

/// Initial capacity of the render buffer.
pub const RENDER_BUFFER_CAPACITY: usize = 4096;

/// Runs `finalize_after_action` when dropped, on every exit path.
struct FinalizeGuard<'a> {
    frame: &'a mut dyn Frame,
}

impl Drop for FinalizeGuard<'_> {
    fn drop(&mut self) {
        self.frame.finalize_after_action();
    }
}

/// Render pipeline shared by all frames of a page.
///
/// Holds no per-render state, so one instance serves concurrent renders.
#[derive(Clone, Default)]
pub struct RenderPipeline {
    cache: Option<Arc<dyn CacheHandler>>,
    hooks: Arc<ActionHooks>,
}

impl std::fmt::Debug for RenderPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderPipeline")
            .field("cache", &self.cache.is_some())
            .field("hooks", &self.hooks)
            .finish()
    }
}

impl RenderPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cache(mut self, cache: Arc<dyn CacheHandler>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_hooks(mut self, hooks: Arc<ActionHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn hooks(&self) -> &Arc<ActionHooks> {
        &self.hooks
    }

    pub fn has_cache(&self) -> bool {
        self.cache.is_some()
    }

    /// Render `frame` with the page-global parameters `globals`.
    ///
    /// Returns `None` when the frame skips its template. Errors from the
    /// action lifecycle propagate unchanged; template failures arrive as
    /// [`FrameError::Template`](hotframe_kernel::frame::FrameError::Template)
    /// naming the frame.
    pub fn render(&self, frame: &mut dyn Frame, globals: &TemplateParams) -> FrameResult<Option<String>> {
        let mut guard = FinalizeGuard { frame };
        self.run(&mut *guard.frame, globals)
    }

    /// Render `frame` and write the output to `out`.
    ///
    /// Returns whether anything was written.
    pub fn render_to(
        &self,
        frame: &mut dyn Frame,
        globals: &TemplateParams,
        out: &mut dyn Write,
    ) -> FrameResult<bool> {
        let name = frame.frame_name().to_string();
        let Some(rendered) = self.render(frame, globals)? else {
            return Ok(false);
        };

        out.write_all(rendered.as_bytes())
            .and_then(|_| out.flush())
            .map_err(|e| TemplateRenderError::new(name, e.into()))?;
        Ok(true)
    }

    fn run(&self, frame: &mut dyn Frame, globals: &TemplateParams) -> FrameResult<Option<String>> {
        if !frame.is_skip_template() {
            if let Some(cache) = &self.cache {
                if let Some(cached) = cache.intercept(&*frame) {
                    debug!("Cache hit for frame {}", frame.frame_name());
                    return Ok(Some(cached));
                }
                trace!("Cache miss for frame {}", frame.frame_name());
            }
        }

        frame.prepare_for_action()?;
        frame.initialize_action()?;

        self.hooks.fire_before(&*frame);
        let action = frame.action_name().map(str::to_owned);
        let outcome = frame.run_action(action.as_deref());
        match &outcome {
            Ok(()) => self.hooks.fire_after(&*frame),
            Err(e) => warn!("Action of frame {} failed: {}", frame.frame_name(), e),
        }
        frame.finalize_action();
        outcome?;

        if frame.is_skip_template() {
            debug!("Frame {} skips its template", frame.frame_name());
            return Ok(None);
        }

        let params = merge_params(frame.template_params(), globals);
        let rendered = apply_template(&*frame, &params)
            .map_err(|e| TemplateRenderError::new(frame.frame_name(), e))?;

        if let Some(cache) = &self.cache {
            cache.postprocess(&*frame, &rendered);
        }

        Ok(Some(rendered))
    }
}

fn apply_template(frame: &dyn Frame, params: &TemplateParams) -> Result<String, TemplateError> {
    let mut buffer = Vec::with_capacity(RENDER_BUFFER_CAPACITY);
    frame.template().process(params, &mut buffer)?;
    buffer.flush()?;
    Ok(String::from_utf8(buffer)?)
}
