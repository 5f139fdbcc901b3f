//! Controllers and their identity.
//!
//! A controller can be a free function, a method on a type, an invokable
//! type or an opaque name. [`ControllerTarget`] records which one it is and
//! where it was declared, so profiles can point back at the source.

use super::Kernel;
use crate::http::{Request, Response};
use futures::{FutureExt, future::BoxFuture};
use keel_core::BoxError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::panic::Location;
use std::sync::Arc;

/// Where a controller was declared.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    /// Source file.
    pub file: String,
    /// Line in `file`.
    pub line: u32,
}

impl SourceLocation {
    /// The location of the caller.
    #[track_caller]
    pub fn caller() -> Self {
        let location = Location::caller();
        Self {
            file: location.file().to_string(),
            line: location.line(),
        }
    }
}

/// The resolvable shapes of a controller.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ControllerTarget {
    /// A free function or closure.
    Function {
        /// Function name.
        name: String,
        /// Declaration site.
        location: Option<SourceLocation>,
    },
    /// A method on a type.
    Method {
        /// Type name.
        class: String,
        /// Method name.
        method: String,
        /// Declaration site.
        location: Option<SourceLocation>,
    },
    /// A type that is itself callable.
    Invokable {
        /// Type name.
        class: String,
        /// Declaration site.
        location: Option<SourceLocation>,
    },
    /// An opaque controller name.
    Named(String),
}

impl ControllerTarget {
    /// A function controller declared at the call site.
    #[track_caller]
    pub fn function(name: impl Into<String>) -> Self {
        Self::Function {
            name: name.into(),
            location: Some(SourceLocation::caller()),
        }
    }

    /// A method controller declared at the call site.
    #[track_caller]
    pub fn method(class: impl Into<String>, method: impl Into<String>) -> Self {
        Self::Method {
            class: class.into(),
            method: method.into(),
            location: Some(SourceLocation::caller()),
        }
    }

    /// An invokable controller declared at the call site.
    #[track_caller]
    pub fn invokable(class: impl Into<String>) -> Self {
        Self::Invokable {
            class: class.into(),
            location: Some(SourceLocation::caller()),
        }
    }

    /// Parse a `"Class::method"` string.
    ///
    /// Anything without a non-empty class and method becomes [`Self::Named`].
    pub fn parse(controller: &str) -> Self {
        match controller.split_once("::") {
            Some((class, method)) if !class.is_empty() && !method.is_empty() => Self::Method {
                class: class.to_string(),
                method: method.to_string(),
                location: None,
            },
            _ => Self::Named(controller.to_string()),
        }
    }

    /// Declaration site, when known.
    pub fn location(&self) -> Option<&SourceLocation> {
        match self {
            Self::Function { location, .. }
            | Self::Method { location, .. }
            | Self::Invokable { location, .. } => location.as_ref(),
            Self::Named(_) => None,
        }
    }

    /// Serializable description for profiles.
    pub fn summary(&self) -> ControllerSummary {
        let (file, line) = match self.location() {
            Some(location) => (Some(location.file.clone()), Some(location.line)),
            None => (None, None),
        };
        match self {
            Self::Function { name, .. } => ControllerSummary::Detailed {
                class: name.clone(),
                method: None,
                file,
                line,
            },
            Self::Method { class, method, .. } => ControllerSummary::Detailed {
                class: class.clone(),
                method: Some(method.clone()),
                file,
                line,
            },
            Self::Invokable { class, .. } => ControllerSummary::Detailed {
                class: class.clone(),
                method: None,
                file,
                line,
            },
            Self::Named(name) => ControllerSummary::Name(name.clone()),
        }
    }
}

impl fmt::Display for ControllerTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Function { name, .. } => f.write_str(name),
            Self::Method { class, method, .. } => write!(f, "{class}::{method}"),
            Self::Invokable { class, .. } => f.write_str(class),
            Self::Named(name) => f.write_str(name),
        }
    }
}

/// Controller description stored in a profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ControllerSummary {
    /// A controller with a known type (and possibly method and location).
    Detailed {
        /// Type or function name.
        class: String,
        /// Method name, if any.
        method: Option<String>,
        /// Declaration file.
        file: Option<String>,
        /// Declaration line.
        line: Option<u32>,
    },
    /// An opaque controller name.
    Name(String),
}

impl ControllerSummary {
    /// Placeholder used when no controller ran.
    pub const UNKNOWN: &'static str = "n/a";

    /// Summary for a request without a controller.
    pub fn unknown() -> Self {
        Self::Name(Self::UNKNOWN.to_string())
    }

    /// `Class::method()`, the class alone, or the opaque name.
    pub fn identifier(&self) -> String {
        match self {
            Self::Detailed {
                class,
                method: Some(method),
                ..
            } => format!("{class}::{method}()"),
            Self::Detailed { class, .. } => class.clone(),
            Self::Name(name) => name.clone(),
        }
    }
}

/// Produces the response for a request.
///
/// Controllers receive a clone of the [`Kernel`] so they can issue nested
/// sub-requests.
pub trait Controller: Send + Sync + 'static {
    /// Identity reported to the controller stage and to profiles.
    fn target(&self) -> ControllerTarget;

    /// Handle the request.
    fn call(
        &self,
        request: Arc<Request>,
        kernel: Kernel,
    ) -> BoxFuture<'static, Result<Response, BoxError>>;
}

/// A controller backed by an async closure. Created by [`controller_fn`].
pub struct FnController<F> {
    target: ControllerTarget,
    func: F,
}

impl<F, Fut> Controller for FnController<F>
where
    F: Fn(Arc<Request>, Kernel) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, BoxError>> + Send + 'static,
{
    fn target(&self) -> ControllerTarget {
        self.target.clone()
    }

    fn call(
        &self,
        request: Arc<Request>,
        kernel: Kernel,
    ) -> BoxFuture<'static, Result<Response, BoxError>> {
        (self.func)(request, kernel).boxed()
    }
}

/// Adapt an async closure into a shareable controller.
///
/// # Example
///
/// ```rust,ignore
/// let home = controller_fn(ControllerTarget::method("HomeController", "index"), |_, _| async {
///     Ok(Response::ok("welcome"))
/// });
/// ```
pub fn controller_fn<F, Fut>(target: ControllerTarget, func: F) -> Arc<dyn Controller>
where
    F: Fn(Arc<Request>, Kernel) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, BoxError>> + Send + 'static,
{
    Arc::new(FnController { target, func })
}
