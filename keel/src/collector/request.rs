//! The request data collector.

use super::{REDACTED, REDIRECT_SESSION_KEY, RedirectRecord, RequestProfile};
use crate::http::{REDIRECTED_ATTRIBUTE, ROUTE_ATTRIBUTE, Request, RequestId, Response, Session};
use crate::kernel::{
    ControllerEvent, ControllerSummary, ControllerTarget, EventSubscriber, KernelBuilder,
    KernelEvent, ResponseEvent, Subscription,
};
use http::HeaderMap;
use http::header::CONTENT_TYPE;
use keel_core::HookResult;
use keel_std::hooks::from_fn;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

const ON_KERNEL_CONTROLLER: &str = "collector.request.on_kernel_controller";
const ON_KERNEL_RESPONSE: &str = "collector.request.on_kernel_response";

const DEFAULT_CONTENT_TYPE: &str = "text/html";
const DEBUG_TOKEN_HEADER: &str = "x-debug-token";
const AUTH_PASSWORD_HEADER: &str = "php-auth-pw";
const AUTH_PASSWORD_SERVER: &str = "PHP_AUTH_PW";
const PASSWORD_PARAMETER: &str = "_password";

/// Collects request and response data for the profiler.
///
/// The controller of each request is remembered on the controller stage and
/// consumed by [`collect`](Self::collect). Redirects are linked across
/// requests through the session.
#[derive(Debug, Default)]
pub struct RequestDataCollector {
    controllers: Mutex<HashMap<RequestId, ControllerTarget>>,
}

impl RequestDataCollector {
    /// Registration table: stage, hook name, priority.
    pub const SUBSCRIPTIONS: &'static [Subscription] = &[
        Subscription::new(KernelEvent::Controller, ON_KERNEL_CONTROLLER, 0),
        Subscription::new(KernelEvent::Response, ON_KERNEL_RESPONSE, 0),
    ];

    /// A collector with no remembered controller.
    pub fn new() -> Self {
        Self::default()
    }

    /// Collector name.
    pub fn name(&self) -> &'static str {
        "request"
    }

    /// Remember the controller handling the request.
    pub fn on_kernel_controller(&self, event: &ControllerEvent) {
        self.controllers()
            .insert(event.request().id(), event.controller().clone());
    }

    /// Mark a main request that follows a recorded redirect.
    pub fn on_kernel_response(&self, event: &ResponseEvent) {
        if !event.is_main_request() {
            return;
        }
        let Some(session) = started_session(event.request()) else {
            return;
        };
        if session.has(REDIRECT_SESSION_KEY) {
            event.request().set_attribute(REDIRECTED_ATTRIBUTE, true);
        }
    }

    /// Build the profile of a finished request.
    pub fn collect(&self, request: &Request, response: &Response) -> RequestProfile {
        let attributes = request.attributes().into_inner();
        let route = attributes
            .get(ROUTE_ATTRIBUTE)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let mut request_headers = collapse_headers(request.headers());
        redact(&mut request_headers, AUTH_PASSWORD_HEADER);
        let mut request_server = request.server().all().clone();
        redact(&mut request_server, AUTH_PASSWORD_SERVER);
        let mut request_request = request.request().all().clone();
        redact(&mut request_request, PASSWORD_PARAMETER);

        let session = started_session(request);
        let (session_metadata, session_attributes, flashes) = match session {
            Some(session) => {
                let metadata = session.metadata();
                let summary = BTreeMap::from([
                    ("Created".to_string(), Value::from(metadata.created.to_rfc2822())),
                    ("Last used".to_string(), Value::from(metadata.last_used.to_rfc2822())),
                    ("Lifetime".to_string(), Value::from(metadata.lifetime)),
                ]);
                (summary, session.all(), session.peek_all_flashes())
            }
            None => Default::default(),
        };

        let controller = self
            .controllers()
            .remove(&request.id())
            .map(|target| target.summary())
            .unwrap_or_else(ControllerSummary::unknown);

        let status = response.status();
        let mut profile = RequestProfile {
            method: request.method().to_string(),
            format: request.format().to_string(),
            content: request.content().map(str::to_string),
            content_type: response
                .header(CONTENT_TYPE.as_str())
                .unwrap_or(DEFAULT_CONTENT_TYPE)
                .to_string(),
            status_code: status.as_u16(),
            status_text: response.status_text().to_string(),
            request_query: request.query().all().clone(),
            request_request,
            request_headers,
            request_server,
            request_cookies: request.cookies().all().clone(),
            request_attributes: attributes,
            route,
            response_headers: collapse_headers(response.headers()),
            session_metadata,
            session_attributes,
            flashes,
            path_info: request.path_info().to_string(),
            controller,
            locale: request.locale(),
            redirect: None,
        };

        if let Some(session) = session {
            if request.has_attribute(REDIRECTED_ATTRIBUTE) {
                profile.redirect = take_redirect(session);
            }
            if response.is_redirect() {
                store_redirect(session, request, response);
            }
        }

        tracing::debug!(
            request = %request.id(),
            identifier = %profile.identifier(),
            status = profile.status_code,
            "collected request profile"
        );
        profile
    }

    fn controllers(&self) -> MutexGuard<'_, HashMap<RequestId, ControllerTarget>> {
        self.controllers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl EventSubscriber for RequestDataCollector {
    fn subscriptions(&self) -> &'static [Subscription] {
        Self::SUBSCRIPTIONS
    }

    fn subscribe(self: Arc<Self>, kernel: &mut KernelBuilder) {
        let collector = self.clone();
        kernel.on_controller(
            ON_KERNEL_CONTROLLER,
            0,
            from_fn(move |event: &ControllerEvent| {
                collector.on_kernel_controller(event);
                Ok(HookResult::Next)
            }),
        );
        kernel.on_response(
            ON_KERNEL_RESPONSE,
            0,
            from_fn(move |event: &ResponseEvent| {
                self.on_kernel_response(event);
                Ok(HookResult::Next)
            }),
        );
    }
}

fn started_session(request: &Request) -> Option<&Arc<Session>> {
    request.session().filter(|session| session.is_started())
}

fn take_redirect(session: &Session) -> Option<RedirectRecord> {
    let value = session.remove(REDIRECT_SESSION_KEY)?;
    match serde_json::from_value(value) {
        Ok(record) => Some(record),
        Err(err) => {
            tracing::warn!(error = %err, "discarding unreadable redirect record");
            None
        }
    }
}

fn store_redirect(session: &Session, request: &Request, response: &Response) {
    let record = RedirectRecord {
        token: response.header(DEBUG_TOKEN_HEADER).map(str::to_string),
        route: request
            .attribute_str(ROUTE_ATTRIBUTE)
            .unwrap_or_else(|| ControllerSummary::UNKNOWN.to_string()),
        method: request.method().to_string(),
        controller: request
            .controller()
            .map(|controller| controller.target().summary())
            .unwrap_or_else(ControllerSummary::unknown),
        status_code: response.status().as_u16(),
        status_text: response.status_text().to_string(),
    };
    match serde_json::to_value(&record) {
        Ok(value) => session.set(REDIRECT_SESSION_KEY, value),
        Err(err) => tracing::warn!(error = %err, "unable to store redirect record"),
    }
}

/// Header map as JSON: one value becomes a string, several become an array.
fn collapse_headers(headers: &HeaderMap) -> BTreeMap<String, Value> {
    headers
        .keys()
        .map(|name| {
            let mut values: Vec<Value> = headers
                .get_all(name)
                .iter()
                .map(|value| Value::from(String::from_utf8_lossy(value.as_bytes()).into_owned()))
                .collect();
            let value = if values.len() == 1 {
                values.remove(0)
            } else {
                Value::Array(values)
            };
            (name.as_str().to_string(), value)
        })
        .collect()
}

fn redact(values: &mut BTreeMap<String, Value>, key: &str) {
    if let Some(value) = values.get_mut(key) {
        *value = Value::from(REDACTED);
    }
}
