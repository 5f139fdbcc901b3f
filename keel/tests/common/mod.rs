#![allow(dead_code)]

use keel::http::{LOCALE_ATTRIBUTE, Request, RequestStack, Response};
use keel::kernel::{Controller, ControllerTarget, Kernel, RequestKind, controller_fn};
use keel::locale::LocaleListener;
use keel::testing::RecordingContext;
use http::Method;
use std::sync::Arc;

// ============================================================================
// Fixtures
// ============================================================================

/// The header a browser with French preferences sends, echoed header name
/// included.
pub const BROWSER_ACCEPT_LANGUAGE: &str =
    "Accept-Language: fr-FR,fr;q=0.9,en-GB;q=0.8,en;q=0.7,en-US;q=0.6,es;q=0.5";

pub fn request_with_header(accept_language: &str) -> Request {
    Request::builder(Method::GET, "/")
        .header("accept-language", accept_language)
        .build()
        .unwrap()
}

pub fn request_with_locale_attribute(locale: &str) -> Request {
    Request::builder(Method::GET, "/")
        .attribute(LOCALE_ATTRIBUTE, locale)
        .build()
        .unwrap()
}

/// A controller answering with the request locale.
pub fn echo_locale() -> Arc<dyn Controller> {
    controller_fn(
        ControllerTarget::method("LocaleController", "echo"),
        |request: Arc<Request>, _| async move { Ok(Response::ok(request.locale())) },
    )
}

// ============================================================================
// Kernel wiring
// ============================================================================

pub struct LocaleKernel {
    pub kernel: Kernel,
    pub stack: Arc<RequestStack>,
    pub context: RecordingContext,
}

/// A kernel with a locale listener writing to a recording routing context.
pub fn locale_kernel(default: &str, enabled: &[&str]) -> LocaleKernel {
    let stack = Arc::new(RequestStack::new());
    let context = RecordingContext::new();
    let listener = LocaleListener::new(stack.clone(), default)
        .with_enabled_locales(enabled.iter().copied())
        .with_routing_context(Arc::new(context.clone()));

    let mut builder = Kernel::builder().with_request_stack(stack.clone());
    builder.subscribe(Arc::new(listener));

    LocaleKernel {
        kernel: builder.build(),
        stack,
        context,
    }
}

pub async fn handle_main(kernel: &Kernel, request: Request) -> Arc<Response> {
    kernel
        .handle(Arc::new(request), RequestKind::Main)
        .await
        .unwrap()
}
