//! Closure-backed hooks.

use keel_core::{BoxError, Hook, HookResult, Message};

/// A hook backed by a synchronous closure.
///
/// Most kernel listeners do their work synchronously against request state;
/// `FnHook` lets them register a plain closure as a stage.
pub struct FnHook<F> {
    func: F,
}

impl<F> FnHook<F> {
    /// Wrap a closure.
    pub const fn new(func: F) -> Self {
        Self { func }
    }
}

/// Build a [`FnHook`] from a closure.
pub fn from_fn<E, F>(func: F) -> FnHook<F>
where
    E: Message,
    F: Fn(&E) -> Result<HookResult, BoxError> + Send + Sync + 'static,
{
    FnHook::new(func)
}

impl<E, F> Hook<E> for FnHook<F>
where
    E: Message,
    F: Fn(&E) -> Result<HookResult, BoxError> + Send + Sync + 'static,
{
    async fn on_event(&self, event: &E) -> Result<HookResult, BoxError> {
        (self.func)(event)
    }
}
