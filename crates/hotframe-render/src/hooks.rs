//! Action hook list.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use hotframe_kernel::frame::{ActionHook, Frame};
use parking_lot::RwLock;
use tracing::{debug, trace};

/// Handle returned by [`ActionHooks::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HookId(u64);

/// Hooks notified around every action body, in registration order.
///
/// Safe to share between render threads; registering while a render is
/// firing hooks affects only later renders.
#[derive(Default)]
pub struct ActionHooks {
    hooks: RwLock<Vec<(HookId, Arc<dyn ActionHook>)>>,
    next_id: AtomicU64,
}

impl ActionHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, hook: Arc<dyn ActionHook>) -> HookId {
        let id = HookId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut hooks = self.hooks.write();
        hooks.push((id, hook));
        debug!("Registered action hook {:?} ({} total)", id, hooks.len());
        id
    }

    /// Remove a hook. Returns `false` if `id` was not registered.
    pub fn unregister(&self, id: HookId) -> bool {
        let mut hooks = self.hooks.write();
        let before = hooks.len();
        hooks.retain(|(hook_id, _)| *hook_id != id);
        hooks.len() != before
    }

    pub fn len(&self) -> usize {
        self.hooks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.read().is_empty()
    }

    pub fn fire_before(&self, frame: &dyn Frame) {
        for hook in self.snapshot() {
            hook.before_action(frame);
        }
    }

    pub fn fire_after(&self, frame: &dyn Frame) {
        for hook in self.snapshot() {
            hook.after_action(frame);
        }
    }

    // Hooks run outside the lock so one may register another.
    fn snapshot(&self) -> Vec<Arc<dyn ActionHook>> {
        let hooks = self.hooks.read();
        trace!("Firing {} action hook(s)", hooks.len());
        hooks.iter().map(|(_, hook)| Arc::clone(hook)).collect()
    }
}

impl std::fmt::Debug for ActionHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionHooks")
            .field("len", &self.len())
            .finish()
    }
}
