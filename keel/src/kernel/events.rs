//! Kernel lifecycle events.

use super::ControllerTarget;
use crate::http::{Request, Response};
use keel_core::Message;
use std::fmt;
use std::sync::Arc;

/// Whether a request is the outermost one or nested inside another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// The request received from the client.
    Main,
    /// A request issued while handling another one.
    Sub,
}

/// The stages of the request lifecycle, in dispatch order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KernelEvent {
    /// A request starts; listeners prepare request state.
    Request,
    /// The controller has been resolved.
    Controller,
    /// The controller returned a response.
    Response,
    /// The request is done, successful or not.
    FinishRequest,
}

impl KernelEvent {
    /// Stable event name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Request => "kernel.request",
            Self::Controller => "kernel.controller",
            Self::Response => "kernel.response",
            Self::FinishRequest => "kernel.finish_request",
        }
    }
}

impl fmt::Display for KernelEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Dispatched when a request starts.
#[derive(Debug, Clone)]
pub struct RequestEvent {
    request: Arc<Request>,
    kind: RequestKind,
}

impl RequestEvent {
    /// Create the event.
    pub fn new(request: Arc<Request>, kind: RequestKind) -> Self {
        Self { request, kind }
    }

    /// The request.
    pub fn request(&self) -> &Arc<Request> {
        &self.request
    }

    /// Main or sub request.
    pub fn kind(&self) -> RequestKind {
        self.kind
    }

    /// Whether this is the main request.
    pub fn is_main_request(&self) -> bool {
        self.kind == RequestKind::Main
    }
}

/// Dispatched once the controller for a request is known.
#[derive(Debug, Clone)]
pub struct ControllerEvent {
    request: Arc<Request>,
    kind: RequestKind,
    controller: ControllerTarget,
}

impl ControllerEvent {
    /// Create the event.
    pub fn new(request: Arc<Request>, kind: RequestKind, controller: ControllerTarget) -> Self {
        Self {
            request,
            kind,
            controller,
        }
    }

    /// The request.
    pub fn request(&self) -> &Arc<Request> {
        &self.request
    }

    /// Main or sub request.
    pub fn kind(&self) -> RequestKind {
        self.kind
    }

    /// The controller about to run.
    pub fn controller(&self) -> &ControllerTarget {
        &self.controller
    }
}

/// Dispatched with the response a controller produced.
#[derive(Debug, Clone)]
pub struct ResponseEvent {
    request: Arc<Request>,
    kind: RequestKind,
    response: Arc<Response>,
}

impl ResponseEvent {
    /// Create the event.
    pub fn new(request: Arc<Request>, kind: RequestKind, response: Arc<Response>) -> Self {
        Self {
            request,
            kind,
            response,
        }
    }

    /// The request.
    pub fn request(&self) -> &Arc<Request> {
        &self.request
    }

    /// Main or sub request.
    pub fn kind(&self) -> RequestKind {
        self.kind
    }

    /// Whether this is the main request.
    pub fn is_main_request(&self) -> bool {
        self.kind == RequestKind::Main
    }

    /// The response.
    pub fn response(&self) -> &Arc<Response> {
        &self.response
    }
}

/// Dispatched when a request is done, before it leaves the request stack.
#[derive(Debug, Clone)]
pub struct FinishRequestEvent {
    request: Arc<Request>,
    kind: RequestKind,
}

impl FinishRequestEvent {
    /// Create the event.
    pub fn new(request: Arc<Request>, kind: RequestKind) -> Self {
        Self { request, kind }
    }

    /// The request that finished.
    pub fn request(&self) -> &Arc<Request> {
        &self.request
    }

    /// Main or sub request.
    pub fn kind(&self) -> RequestKind {
        self.kind
    }
}

impl Message for RequestEvent {}
impl Message for ControllerEvent {}
impl Message for ResponseEvent {}
impl Message for FinishRequestEvent {}
