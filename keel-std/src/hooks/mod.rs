//! Standard hook implementations.

mod func;
mod logging;

pub use func::{FnHook, from_fn};
pub use logging::LoggingHook;
