//! # Hook
//!
//! The unit of event processing in Keel.
//!
//! A kernel stage (request, controller, response, finish-request) is an
//! ordered list of hooks. Each hook observes the event, may mutate the
//! request state it carries, and decides whether lower-priority hooks still
//! get to see it.
//!
//! # Use Cases
//!
//! - Applying request state (default locale, negotiated locale)
//! - Remembering per-request data for later collection (profilers)
//! - Observing events (logging)

use crate::{error::BoxError, message::Message};
use std::{future::Future, pin::Pin};

/// What a hook tells the registry after seeing an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookResult {
    /// Let lower-priority hooks see the event.
    Next,
    /// Lower-priority hooks on this stage are skipped.
    Stop,
}

/// A listener on one kernel stage.
///
/// Implemented with native `async fn`; registries erase the concrete type
/// through [`DynHook`].
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot listen to `{E}`",
    label = "no `Hook<{E}>` implementation",
    note = "implement `Hook<{E}>::on_event`, or wrap a closure with `from_fn`"
)]
pub trait Hook<E: Message>: Send + Sync + 'static {
    /// Observe `event`.
    fn on_event(&self, event: &E) -> impl Future<Output = Result<HookResult, BoxError>> + Send;
}

/// Object-safe form of [`Hook`], stored by registries.
pub trait DynHook<E: Message>: Send + Sync + 'static {
    /// Observe `event` through a boxed future.
    fn on_event_dyn<'a>(&'a self, event: &'a E) -> HookFuture<'a>;
}

/// Boxed future returned by [`DynHook::on_event_dyn`].
pub type HookFuture<'a> = Pin<Box<dyn Future<Output = Result<HookResult, BoxError>> + Send + 'a>>;

impl<E: Message, T: Hook<E>> DynHook<E> for T {
    fn on_event_dyn<'a>(&'a self, event: &'a E) -> HookFuture<'a> {
        Box::pin(self.on_event(event))
    }
}

impl<E: Message> Hook<E> for Box<dyn DynHook<E>> {
    async fn on_event(&self, event: &E) -> Result<HookResult, BoxError> {
        // `self.on_event_dyn` would pick the blanket impl on the box itself.
        (**self).on_event_dyn(event).await
    }
}
