//! Request profiling.
//!
//! [`RequestDataCollector`] listens to the controller and response stages and
//! turns a finished request/response pair into a serializable
//! [`RequestProfile`].

mod profile;
mod request;

pub use profile::{RedirectRecord, RequestProfile};
pub use request::RequestDataCollector;

/// Replacement for secrets in collected data.
pub const REDACTED: &str = "******";

/// Session key holding the redirect record between two requests.
pub const REDIRECT_SESSION_KEY: &str = "keel_redirect";
