//! The request lifecycle kernel.
//!
//! [`Kernel::handle`] drives a request through four stages, each backed by
//! its own priority [`Registry`]:
//!
//! 1. [`KernelEvent::Request`] - listeners prepare the request (locale, ...)
//! 2. [`KernelEvent::Controller`] - the resolved controller is announced
//! 3. [`KernelEvent::Response`] - the controller's response is inspected
//! 4. [`KernelEvent::FinishRequest`] - always runs, even when a stage failed
//!
//! The request is pushed on the [`RequestStack`] for the whole lifecycle, so
//! nested sub-requests issued by a controller see their parent below them.

mod controller;
mod events;
mod subscriber;

pub use controller::{
    Controller, ControllerSummary, ControllerTarget, FnController, SourceLocation, controller_fn,
};
pub use events::{
    ControllerEvent, FinishRequestEvent, KernelEvent, RequestEvent, RequestKind, ResponseEvent,
};
pub use subscriber::{EventSubscriber, Subscription};

use crate::http::{Request, RequestStack, Response};
use futures::{FutureExt, future::BoxFuture};
use keel_core::{BoxError, DispatchError, Hook, KeelError};
use keel_std::{Registry, RegistrationMeta, RegistryBuilder};
use std::borrow::Cow;
use std::sync::Arc;
use thiserror::Error;

/// Errors returned by [`Kernel::handle`].
#[derive(Error, Debug)]
pub enum KernelError {
    /// The request carries no controller.
    #[error("unable to find the controller for path \"{0}\"")]
    ControllerNotFound(String),

    /// The controller returned an error.
    #[error("controller `{controller}` failed")]
    Controller {
        /// Controller identity.
        controller: String,
        /// Underlying error.
        #[source]
        source: BoxError,
    },

    /// A stage hook failed.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl From<KernelError> for KeelError {
    fn from(err: KernelError) -> Self {
        match err {
            KernelError::Dispatch(err) => KeelError::Dispatch(err),
            other => KeelError::Custom(Box::new(other)),
        }
    }
}

/// Collects stage hooks and builds a [`Kernel`].
///
/// # Example
///
/// ```rust,ignore
/// let mut builder = Kernel::builder();
/// builder
///     .on_request("app.firewall", 8, firewall)
///     .subscribe(Arc::new(locale_listener));
/// let kernel = builder.build();
/// ```
pub struct KernelBuilder {
    request: RegistryBuilder<RequestEvent>,
    controller: RegistryBuilder<ControllerEvent>,
    response: RegistryBuilder<ResponseEvent>,
    finish_request: RegistryBuilder<FinishRequestEvent>,
    request_stack: Arc<RequestStack>,
}

impl KernelBuilder {
    /// A builder with empty stages and a fresh request stack.
    pub fn new() -> Self {
        Self {
            request: RegistryBuilder::new(),
            controller: RegistryBuilder::new(),
            response: RegistryBuilder::new(),
            finish_request: RegistryBuilder::new(),
            request_stack: Arc::new(RequestStack::new()),
        }
    }

    /// Share an existing request stack (listeners holding it must see the
    /// same stack the kernel pushes to).
    pub fn with_request_stack(mut self, request_stack: Arc<RequestStack>) -> Self {
        self.request_stack = request_stack;
        self
    }

    /// The request stack the kernel will use.
    pub fn request_stack(&self) -> &Arc<RequestStack> {
        &self.request_stack
    }

    /// Register a request-stage hook.
    pub fn on_request<H: Hook<RequestEvent>>(
        &mut self,
        name: impl Into<Cow<'static, str>>,
        priority: i32,
        hook: H,
    ) -> &mut Self {
        self.request.register_with_meta_mut(hook, meta(name, priority));
        self
    }

    /// Register a controller-stage hook.
    pub fn on_controller<H: Hook<ControllerEvent>>(
        &mut self,
        name: impl Into<Cow<'static, str>>,
        priority: i32,
        hook: H,
    ) -> &mut Self {
        self.controller
            .register_with_meta_mut(hook, meta(name, priority));
        self
    }

    /// Register a response-stage hook.
    pub fn on_response<H: Hook<ResponseEvent>>(
        &mut self,
        name: impl Into<Cow<'static, str>>,
        priority: i32,
        hook: H,
    ) -> &mut Self {
        self.response.register_with_meta_mut(hook, meta(name, priority));
        self
    }

    /// Register a finish-request-stage hook.
    pub fn on_finish_request<H: Hook<FinishRequestEvent>>(
        &mut self,
        name: impl Into<Cow<'static, str>>,
        priority: i32,
        hook: H,
    ) -> &mut Self {
        self.finish_request
            .register_with_meta_mut(hook, meta(name, priority));
        self
    }

    /// Let a subscriber register its stages.
    pub fn subscribe<S: EventSubscriber>(&mut self, subscriber: Arc<S>) -> &mut Self {
        subscriber.subscribe(self);
        self
    }

    /// Freeze the registrations.
    pub fn build(self) -> Kernel {
        Kernel {
            inner: Arc::new(KernelInner {
                request: self.request.build(),
                controller: self.controller.build(),
                response: self.response.build(),
                finish_request: self.finish_request.build(),
                request_stack: self.request_stack,
            }),
        }
    }
}

impl Default for KernelBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn meta(name: impl Into<Cow<'static, str>>, priority: i32) -> RegistrationMeta {
    RegistrationMeta::new(name).with_priority(priority)
}

struct KernelInner {
    request: Registry<RequestEvent>,
    controller: Registry<ControllerEvent>,
    response: Registry<ResponseEvent>,
    finish_request: Registry<FinishRequestEvent>,
    request_stack: Arc<RequestStack>,
}

/// Runs requests through the lifecycle stages.
///
/// Cheap to clone; clones share registrations and the request stack.
#[derive(Clone)]
pub struct Kernel {
    inner: Arc<KernelInner>,
}

impl Kernel {
    /// Start building a kernel.
    pub fn builder() -> KernelBuilder {
        KernelBuilder::new()
    }

    /// The stack of in-flight requests.
    pub fn request_stack(&self) -> &Arc<RequestStack> {
        &self.inner.request_stack
    }

    /// `(name, priority)` of the hooks on a stage, in execution order.
    pub fn listeners(&self, event: KernelEvent) -> Vec<(&str, i32)> {
        match event {
            KernelEvent::Request => self.inner.request.listeners(),
            KernelEvent::Controller => self.inner.controller.listeners(),
            KernelEvent::Response => self.inner.response.listeners(),
            KernelEvent::FinishRequest => self.inner.finish_request.listeners(),
        }
    }

    /// Handle a request.
    ///
    /// The finish-request stage runs and the request leaves the stack even
    /// when an earlier stage or the controller failed. The first error wins.
    pub fn handle(
        &self,
        request: Arc<Request>,
        kind: RequestKind,
    ) -> BoxFuture<'_, Result<Arc<Response>, KernelError>> {
        async move {
            tracing::debug!(
                request = %request.id(),
                path = request.path_info(),
                ?kind,
                "handling request"
            );
            self.inner.request_stack.push(request.clone());

            let handled = self.handle_raw(&request, kind).await;
            let finished = self
                .inner
                .finish_request
                .dispatch(&FinishRequestEvent::new(request.clone(), kind))
                .await;

            self.inner.request_stack.pop();

            let response = handled?;
            finished?;
            Ok(response)
        }
        .boxed()
    }

    async fn handle_raw(
        &self,
        request: &Arc<Request>,
        kind: RequestKind,
    ) -> Result<Arc<Response>, KernelError> {
        self.inner
            .request
            .dispatch(&RequestEvent::new(request.clone(), kind))
            .await?;

        let controller = request
            .controller()
            .cloned()
            .ok_or_else(|| KernelError::ControllerNotFound(request.path_info().to_string()))?;
        let target = controller.target();

        self.inner
            .controller
            .dispatch(&ControllerEvent::new(request.clone(), kind, target.clone()))
            .await?;

        let response = controller
            .call(request.clone(), self.clone())
            .await
            .map_err(|source| KernelError::Controller {
                controller: target.to_string(),
                source,
            })?;
        let response = Arc::new(response);

        self.inner
            .response
            .dispatch(&ResponseEvent::new(request.clone(), kind, response.clone()))
            .await?;

        Ok(response)
    }
}

impl std::fmt::Debug for Kernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Kernel")
            .field("request", &self.inner.request.len())
            .field("controller", &self.inner.controller.len())
            .field("response", &self.inner.response.len())
            .field("finish_request", &self.inner.finish_request.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;
    use keel_core::{DynHook, HookResult};
    use keel_std::hooks::from_fn;
    use keel_std::testing::{CountingHook, OrderHook};
    use std::sync::Mutex;

    fn request_with(controller: Arc<dyn Controller>) -> Arc<Request> {
        Arc::new(
            Request::builder(Method::GET, "/")
                .controller(controller)
                .build()
                .unwrap(),
        )
    }

    fn ok_controller() -> Arc<dyn Controller> {
        controller_fn(ControllerTarget::parse("Home::index"), |_, _| async {
            Ok(Response::ok("home"))
        })
    }

    #[tokio::test]
    async fn test_stages_run_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut builder = Kernel::builder();
        builder
            .on_finish_request("finish", 0, OrderHook::new(4, log.clone()))
            .on_response("response", 0, OrderHook::new(3, log.clone()))
            .on_controller("controller", 0, OrderHook::new(2, log.clone()))
            .on_request("request", 0, OrderHook::new(1, log.clone()));
        let kernel = builder.build();

        let response = kernel
            .handle(request_with(ok_controller()), RequestKind::Main)
            .await
            .unwrap();

        assert_eq!(response.content(), "home");
        assert_eq!(*log.lock().unwrap(), vec![1, 2, 3, 4]);
        assert!(kernel.request_stack().is_empty());
    }

    #[tokio::test]
    async fn test_missing_controller_still_finishes() {
        let finish = CountingHook::new();
        let mut builder = Kernel::builder();
        builder.on_finish_request("finish", 0, finish.clone());
        let kernel = builder.build();

        let err = kernel
            .handle(Arc::new(Request::get("/missing")), RequestKind::Main)
            .await
            .unwrap_err();

        assert!(matches!(err, KernelError::ControllerNotFound(ref path) if path == "/missing"));
        assert_eq!(finish.count(), 1);
        assert!(kernel.request_stack().is_empty());

        let err = KeelError::from(err);
        assert_eq!(err.to_string(), "unable to find the controller for path \"/missing\"");
    }

    #[tokio::test]
    async fn test_controller_error_is_reported() {
        let failing = controller_fn(ControllerTarget::parse("Broken::run"), |_, _| async {
            Err::<Response, BoxError>("boom".into())
        });
        let kernel = Kernel::builder().build();

        let err = kernel
            .handle(request_with(failing), RequestKind::Main)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "controller `Broken::run` failed");
    }

    #[tokio::test]
    async fn test_stage_hook_error_aborts_before_controller() {
        let controller_stage = CountingHook::new();
        let mut builder = Kernel::builder();
        builder
            .on_request(
                "firewall",
                8,
                from_fn(|_: &RequestEvent| Err("denied".into())),
            )
            .on_controller("observer", 0, controller_stage.clone());
        let kernel = builder.build();

        let err = kernel
            .handle(request_with(ok_controller()), RequestKind::Main)
            .await
            .unwrap_err();

        assert!(matches!(err, KernelError::Dispatch(DispatchError::Hook { ref name, .. }) if name == "firewall"));
        assert_eq!(controller_stage.count(), 0);
        assert!(matches!(KeelError::from(err), KeelError::Dispatch(_)));
    }

    #[tokio::test]
    async fn test_stop_only_skips_lower_hooks() {
        let lower = CountingHook::new();
        let mut builder = Kernel::builder();
        builder
            .on_request("stopper", 10, CountingHook::with_result(HookResult::Stop))
            .on_request("lower", 0, lower.clone());
        let kernel = builder.build();

        kernel
            .handle(request_with(ok_controller()), RequestKind::Main)
            .await
            .unwrap();

        assert_eq!(lower.count(), 0);
        assert_eq!(
            kernel.listeners(KernelEvent::Request),
            vec![("stopper", 10), ("lower", 0)]
        );
    }

    #[tokio::test]
    async fn test_boxed_hooks_dispatch_to_inner_hook() {
        let counter = CountingHook::new();
        let boxed: Box<dyn DynHook<RequestEvent>> = Box::new(counter.clone());
        let mut builder = Kernel::builder();
        builder.on_request("boxed", 0, boxed);
        let kernel = builder.build();

        kernel
            .handle(request_with(ok_controller()), RequestKind::Main)
            .await
            .unwrap();

        assert_eq!(counter.count(), 1);
    }
}
