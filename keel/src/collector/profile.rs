//! Serializable request profile.

use crate::http::ROUTE_PARAMS_ATTRIBUTE;
use crate::kernel::ControllerSummary;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// What the profiler remembers about a redirect response, carried over to the
/// request that follows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectRecord {
    /// Profiler token of the redirecting response (`x-debug-token`).
    pub token: Option<String>,
    /// Route of the redirecting request, `"n/a"` when unknown.
    pub route: String,
    /// HTTP method of the redirecting request.
    pub method: String,
    /// Controller of the redirecting request.
    pub controller: ControllerSummary,
    /// Redirect status code.
    pub status_code: u16,
    /// Reason phrase of the status code.
    pub status_text: String,
}

/// Data collected for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestProfile {
    /// HTTP method.
    pub method: String,
    /// Request format.
    pub format: String,
    /// Request body; `None` when it was consumed as a stream.
    pub content: Option<String>,
    /// Response content type, `text/html` when absent.
    pub content_type: String,
    /// Response status code.
    pub status_code: u16,
    /// Response reason phrase.
    pub status_text: String,
    /// Query string parameters.
    pub request_query: BTreeMap<String, Value>,
    /// Body parameters.
    pub request_request: BTreeMap<String, Value>,
    /// Request headers; single values are collapsed to strings.
    pub request_headers: BTreeMap<String, Value>,
    /// Server parameters.
    pub request_server: BTreeMap<String, Value>,
    /// Cookies.
    pub request_cookies: BTreeMap<String, Value>,
    /// Request attributes.
    pub request_attributes: BTreeMap<String, Value>,
    /// Matched route name, empty when none.
    pub route: String,
    /// Response headers; single values are collapsed to strings.
    pub response_headers: BTreeMap<String, Value>,
    /// `Created`, `Last used` and `Lifetime` of a started session.
    pub session_metadata: BTreeMap<String, Value>,
    /// Attributes of a started session.
    pub session_attributes: BTreeMap<String, Value>,
    /// Pending flash messages of a started session.
    pub flashes: BTreeMap<String, Vec<String>>,
    /// Request path info.
    pub path_info: String,
    /// The controller that handled the request.
    pub controller: ControllerSummary,
    /// Locale of the request.
    pub locale: String,
    /// Redirect that led to this request, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<RedirectRecord>,
}

impl RequestProfile {
    /// The route, or else the controller identifier.
    pub fn identifier(&self) -> String {
        if self.route.is_empty() {
            self.controller.identifier()
        } else {
            self.route.clone()
        }
    }

    /// Route parameters recorded in the `_route_params` attribute.
    pub fn route_params(&self) -> BTreeMap<String, Value> {
        match self.request_attributes.get(ROUTE_PARAMS_ATTRIBUTE) {
            Some(Value::Object(params)) => params
                .iter()
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
            _ => BTreeMap::new(),
        }
    }
}
