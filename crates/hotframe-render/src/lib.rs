//! Frame rendering
//!
//! - [`RenderPipeline`]: cache check, action lifecycle and template
//!   materialization for one frame
//! - [`ActionHooks`]: observers fired around action bodies
//! - [`OnceRegistry`] / [`OnceDirective`]: at-most-once fragment emission
//! - [`FrameTemplate`]: the built-in template engine

mod hooks;
mod once;
mod params;
mod pipeline;
mod template;

pub use hooks::{ActionHooks, HookId};
pub use once::{OnceDirective, OnceRegistry, SCOPE_KEY};
pub use params::merge_params;
pub use pipeline::{RENDER_BUFFER_CAPACITY, RenderPipeline};
pub use template::{FrameTemplate, TemplateConfig};

pub use hotframe_kernel::frame::{
    ActionHook, CacheHandler, Frame, FrameError, FrameResult, Template, TemplateError,
    TemplateParams, TemplateRenderError, TemplateResult, UsageError,
};
