//! Routing context collaborator.
//!
//! The router keeps a context of parameters (host, scheme, locale, ...) it
//! uses while matching and generating URLs. Listeners push request-derived
//! values into it through [`RoutingContext`].

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

/// Routing parameter carrying the request locale.
pub const LOCALE_PARAMETER: &str = "_locale";

/// Parameters used by the router during matching and generation.
pub trait RoutingContext: Send + Sync {
    /// Set a parameter.
    fn set_parameter(&self, name: &str, value: &str);

    /// Read a parameter.
    fn parameter(&self, name: &str) -> Option<String>;
}

/// In-memory [`RoutingContext`].
#[derive(Debug, Default)]
pub struct RouteContext {
    parameters: RwLock<BTreeMap<String, String>>,
}

impl RouteContext {
    /// An empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of every parameter.
    pub fn parameters(&self) -> BTreeMap<String, String> {
        self.parameters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl RoutingContext for RouteContext {
    fn set_parameter(&self, name: &str, value: &str) {
        self.parameters
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), value.to_string());
    }

    fn parameter(&self, name: &str) -> Option<String> {
        self.parameters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }
}
