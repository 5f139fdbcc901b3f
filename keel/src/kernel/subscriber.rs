//! Listeners that register several kernel stages at once.

use super::{KernelBuilder, KernelEvent};
use std::sync::Arc;

/// One row of a subscriber's registration table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription {
    /// Stage the hook runs on.
    pub event: KernelEvent,
    /// Name of the registered hook.
    pub name: &'static str,
    /// Priority on that stage (higher runs first).
    pub priority: i32,
}

impl Subscription {
    /// A table row.
    pub const fn new(event: KernelEvent, name: &'static str, priority: i32) -> Self {
        Self {
            event,
            name,
            priority,
        }
    }
}

/// A listener that knows which stages it wants and at which priority.
pub trait EventSubscriber: Send + Sync + 'static {
    /// The static registration table.
    fn subscriptions(&self) -> &'static [Subscription];

    /// Register every row of [`Self::subscriptions`] into `kernel`.
    fn subscribe(self: Arc<Self>, kernel: &mut KernelBuilder);
}
