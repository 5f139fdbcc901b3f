//! Events that can be dispatched.

/// Marker for kernel events.
///
/// Registries are shared between requests and stage futures must be `Send`,
/// so events are `Send + Sync + 'static`.
///
/// ```rust,ignore
/// #[derive(Debug, Clone)]
/// struct PoolCleared { pool: String }
///
/// impl Message for PoolCleared {}
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot be dispatched as a kernel event",
    label = "does not implement `Message`",
    note = "events must be `Send + Sync + 'static` and implement `Message`"
)]
pub trait Message: Send + Sync + 'static {}

impl Message for () {}
impl Message for String {}
impl Message for &'static str {}
impl<T: Message> Message for Box<T> {}
impl<T: Message> Message for std::sync::Arc<T> {}
