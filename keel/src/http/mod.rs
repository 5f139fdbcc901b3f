//! Minimal HTTP model the kernel stages operate on.
//!
//! - [`Request`] - incoming request with interior-mutable attributes and locale
//! - [`Response`] - status, headers and body produced by a controller
//! - [`Session`] - attribute bag, flash bag and metadata
//! - [`RequestStack`] - LIFO stack of in-flight (main and nested) requests
//! - [`ParameterBag`] - ordered string-keyed value map

mod parameters;
mod request;
mod response;
mod session;
mod stack;

pub use parameters::ParameterBag;
pub use request::{Request, RequestBuilder, RequestId};
pub use response::{Response, ResponseBuilder};
pub use session::{Session, SessionMetadata};
pub use stack::RequestStack;

/// Attribute holding an explicit, request-scoped locale.
pub const LOCALE_ATTRIBUTE: &str = "_locale";
/// Attribute holding the matched route name.
pub const ROUTE_ATTRIBUTE: &str = "_route";
/// Attribute holding the matched route parameters.
pub const ROUTE_PARAMS_ATTRIBUTE: &str = "_route_params";
/// Attribute set on a request that follows a profiled redirect.
pub const REDIRECTED_ATTRIBUTE: &str = "_redirected";
