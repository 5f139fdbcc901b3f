//! Error types for Keel.
//!
//! - [`KeelError`] - top-level error, what embedders usually bubble up
//! - [`DispatchError`] - a stage hook failed
//! - [`BoxError`] - what hooks return

use thiserror::Error;

/// A boxed error type for dynamic error handling.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level error type for all Keel operations.
#[derive(Error, Debug)]
pub enum KeelError {
    /// A stage could not be dispatched.
    #[error("dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    /// Any other failure (controller, cache, configuration).
    #[error(transparent)]
    Custom(BoxError),
}

/// Errors raised while dispatching an event to a stage.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// A registered hook failed; lower-priority hooks did not run.
    #[error("hook `{name}` failed")]
    Hook {
        /// Registration name of the failing hook.
        name: String,
        /// The underlying failure.
        #[source]
        source: BoxError,
    },
}

impl From<BoxError> for KeelError {
    fn from(err: BoxError) -> Self {
        KeelError::Custom(err)
    }
}
