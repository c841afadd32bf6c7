//! Frame collaborator contracts
//!
//! A frame is an embeddable component with its own action logic and template.
//! The render pipeline drives a frame through these traits only; routing,
//! action resolution and the cache store stay on the host side.

use std::collections::HashMap;
use std::io::Write;

pub mod error;
pub use error::{
    BoxError, FrameError, FrameResult, TemplateError, TemplateRenderError, TemplateResult, UsageError,
};

/// Parameter mapping handed to a template.
pub type TemplateParams = HashMap<String, serde_json::Value>;

/// Template collaborator
pub trait Template: Send + Sync {
    /// Render `params` into `out`.
    fn process(&self, params: &TemplateParams, out: &mut dyn Write) -> TemplateResult<()>;
}

/// Action-lifecycle owner.
///
/// Lifecycle methods default to no-ops so a frame only overrides the steps it
/// cares about.
pub trait Frame: Send {
    /// Identity used in logs and errors.
    fn frame_name(&self) -> &str;

    /// Action to run; `None` selects the frame's default action.
    fn action_name(&self) -> Option<&str> {
        None
    }

    fn prepare_for_action(&mut self) -> FrameResult<()> {
        Ok(())
    }

    fn initialize_action(&mut self) -> FrameResult<()> {
        Ok(())
    }

    /// The action body.
    fn run_action(&mut self, action: Option<&str>) -> FrameResult<()>;

    /// Runs after the action body whether it succeeded or not.
    fn finalize_action(&mut self) {}

    /// Runs exactly once at the end of every render invocation.
    fn finalize_after_action(&mut self) {}

    /// `true` when the frame produces no template output.
    fn is_skip_template(&self) -> bool {
        false
    }

    /// Frame-local template parameters.
    fn template_params(&self) -> &TemplateParams;

    fn template(&self) -> &dyn Template;
}

/// Cache collaborator consulted around a render.
pub trait CacheHandler: Send + Sync {
    /// Previously rendered output for `frame`, or `None` on a miss.
    fn intercept(&self, frame: &dyn Frame) -> Option<String>;

    /// Called with a fresh render after a miss.
    fn postprocess(&self, frame: &dyn Frame, rendered: &str);
}

/// Observer notified around every action body.
pub trait ActionHook: Send + Sync {
    fn before_action(&self, frame: &dyn Frame) {}

    fn after_action(&self, frame: &dyn Frame) {}
}
