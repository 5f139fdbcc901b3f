//! Kernel listener applying the resolved locale to each request.

use super::{FALLBACK_LOCALE, resolve_locale};
use crate::config::LocaleConfig;
use crate::http::{Request, RequestStack};
use crate::kernel::{
    EventSubscriber, FinishRequestEvent, KernelBuilder, KernelEvent, RequestEvent, Subscription,
};
use crate::routing::{LOCALE_PARAMETER, RoutingContext};
use keel_core::HookResult;
use keel_std::hooks::from_fn;
use std::fmt;
use std::sync::Arc;

const SET_DEFAULT_LOCALE: &str = "locale.set_default_locale";
const ON_KERNEL_REQUEST: &str = "locale.on_kernel_request";
const ON_KERNEL_FINISH_REQUEST: &str = "locale.on_kernel_finish_request";

/// Sets the request locale from, in order: the `_locale` attribute, the
/// Accept-Language header negotiated against the enabled locales, and the
/// default locale.
///
/// When a routing context is attached, the resolved locale is written to its
/// `_locale` parameter, and restored to the parent request's locale when a
/// sub-request finishes.
pub struct LocaleListener {
    request_stack: Arc<RequestStack>,
    default_locale: String,
    enabled_locales: Vec<String>,
    routing_context: Option<Arc<dyn RoutingContext>>,
}

impl LocaleListener {
    /// Registration table: stage, hook name, priority.
    pub const SUBSCRIPTIONS: &'static [Subscription] = &[
        Subscription::new(KernelEvent::Request, SET_DEFAULT_LOCALE, 100),
        Subscription::new(KernelEvent::Request, ON_KERNEL_REQUEST, 16),
        Subscription::new(KernelEvent::FinishRequest, ON_KERNEL_FINISH_REQUEST, 0),
    ];

    /// A listener without routing context or enabled locales.
    ///
    /// An empty `default_locale` falls back to `"en"`.
    pub fn new(request_stack: Arc<RequestStack>, default_locale: impl Into<String>) -> Self {
        let mut default_locale = default_locale.into();
        if default_locale.is_empty() {
            tracing::warn!(
                fallback = FALLBACK_LOCALE,
                "empty default locale configured, falling back"
            );
            default_locale = FALLBACK_LOCALE.to_string();
        }
        Self {
            request_stack,
            default_locale,
            enabled_locales: Vec::new(),
            routing_context: None,
        }
    }

    /// Build from configuration.
    pub fn from_config(config: &LocaleConfig, request_stack: Arc<RequestStack>) -> Self {
        Self::new(request_stack, config.default_locale.clone())
            .with_enabled_locales(config.enabled_locales.iter().cloned())
    }

    /// Propagate resolved locales to `routing_context`.
    pub fn with_routing_context(mut self, routing_context: Arc<dyn RoutingContext>) -> Self {
        self.routing_context = Some(routing_context);
        self
    }

    /// Negotiate Accept-Language against these locales. Empty disables
    /// negotiation.
    pub fn with_enabled_locales<I, S>(mut self, locales: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enabled_locales = locales.into_iter().map(Into::into).collect();
        self
    }

    /// The default locale.
    pub fn default_locale(&self) -> &str {
        &self.default_locale
    }

    /// The locales Accept-Language is negotiated against.
    pub fn enabled_locales(&self) -> &[String] {
        &self.enabled_locales
    }

    /// Write the default locale into the request.
    pub fn set_default_locale(&self, event: &RequestEvent) {
        event.request().set_default_locale(self.default_locale.as_str());
    }

    /// Resolve and apply the request locale, then propagate it to routing.
    pub fn on_kernel_request(&self, event: &RequestEvent) {
        let request = event.request();
        self.apply_locale(request);
        self.set_router_context(request);
    }

    /// Restore the parent request's locale into the routing context.
    pub fn on_kernel_finish_request(&self, _event: &FinishRequestEvent) {
        if let Some(parent) = self.request_stack.parent() {
            self.set_router_context(&parent);
        }
    }

    fn apply_locale(&self, request: &Request) {
        let explicit = request.explicit_locale();
        let accept_language = request.accept_language();
        let current = request.locale();

        let locale = resolve_locale(
            explicit.as_deref(),
            accept_language.as_deref(),
            &self.enabled_locales,
            &current,
        );

        tracing::debug!(
            request = %request.id(),
            locale = %locale,
            explicit = explicit.is_some(),
            "resolved request locale"
        );

        if locale != current {
            request.set_locale(locale);
        }
    }

    fn set_router_context(&self, request: &Request) {
        if let Some(context) = &self.routing_context {
            let locale = request.locale();
            tracing::trace!(request = %request.id(), locale = %locale, "updating routing context");
            context.set_parameter(LOCALE_PARAMETER, &locale);
        }
    }
}

impl fmt::Debug for LocaleListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocaleListener")
            .field("default_locale", &self.default_locale)
            .field("enabled_locales", &self.enabled_locales)
            .field("routing_context", &self.routing_context.is_some())
            .finish()
    }
}

impl EventSubscriber for LocaleListener {
    fn subscriptions(&self) -> &'static [Subscription] {
        Self::SUBSCRIPTIONS
    }

    fn subscribe(self: Arc<Self>, kernel: &mut KernelBuilder) {
        for subscription in Self::SUBSCRIPTIONS {
            let listener = self.clone();
            match subscription.name {
                SET_DEFAULT_LOCALE => {
                    kernel.on_request(
                        subscription.name,
                        subscription.priority,
                        from_fn(move |event: &RequestEvent| {
                            listener.set_default_locale(event);
                            Ok(HookResult::Next)
                        }),
                    );
                }
                ON_KERNEL_REQUEST => {
                    kernel.on_request(
                        subscription.name,
                        subscription.priority,
                        from_fn(move |event: &RequestEvent| {
                            listener.on_kernel_request(event);
                            Ok(HookResult::Next)
                        }),
                    );
                }
                ON_KERNEL_FINISH_REQUEST => {
                    kernel.on_finish_request(
                        subscription.name,
                        subscription.priority,
                        from_fn(move |event: &FinishRequestEvent| {
                            listener.on_kernel_finish_request(event);
                            Ok(HookResult::Next)
                        }),
                    );
                }
                other => {
                    tracing::warn!(hook = other, "locale subscription has no handler");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::LOCALE_ATTRIBUTE;
    use crate::kernel::RequestKind;
    use crate::routing::RouteContext;
    use http::Method;

    fn event(request: Request) -> RequestEvent {
        RequestEvent::new(Arc::new(request), RequestKind::Main)
    }

    fn listener(default: &str) -> LocaleListener {
        LocaleListener::new(Arc::new(RequestStack::new()), default)
    }

    #[test]
    fn test_default_locale_is_applied() {
        let listener = listener("fr");
        let event = event(Request::get("/"));

        listener.set_default_locale(&event);
        listener.on_kernel_request(&event);

        assert_eq!(event.request().locale(), "fr");
    }

    #[test]
    fn test_explicit_attribute_wins() {
        let listener = listener("fr").with_enabled_locales(["de"]);
        let event = event(
            Request::builder(Method::GET, "/")
                .attribute(LOCALE_ATTRIBUTE, "es")
                .header("accept-language", "de")
                .build()
                .unwrap(),
        );

        listener.set_default_locale(&event);
        listener.on_kernel_request(&event);

        assert_eq!(event.request().locale(), "es");
    }

    #[test]
    fn test_header_ignored_without_enabled_locales() {
        let listener = listener("de");
        let event = event(
            Request::builder(Method::GET, "/")
                .header("accept-language", "fr-FR,fr;q=0.9")
                .build()
                .unwrap(),
        );

        listener.set_default_locale(&event);
        listener.on_kernel_request(&event);

        assert_eq!(event.request().locale(), "de");
    }

    #[test]
    fn test_empty_default_falls_back_to_en() {
        let listener = listener("");
        assert_eq!(listener.default_locale(), "en");
    }

    #[test]
    fn test_routing_context_receives_locale() {
        let context = Arc::new(RouteContext::new());
        let listener = listener("fr").with_routing_context(context.clone());
        let event = event(Request::get("/"));

        listener.set_default_locale(&event);
        listener.on_kernel_request(&event);

        assert_eq!(context.parameter(LOCALE_PARAMETER).as_deref(), Some("fr"));
    }

    #[test]
    fn test_from_config() {
        let config = LocaleConfig {
            default_locale: "it".to_string(),
            enabled_locales: vec!["it".to_string(), "de".to_string()],
        };
        let listener = LocaleListener::from_config(&config, Arc::new(RequestStack::new()));
        assert_eq!(listener.default_locale(), "it");
        assert_eq!(listener.enabled_locales(), ["it", "de"]);
    }

    #[test]
    fn test_subscriptions_table() {
        let table: Vec<_> = LocaleListener::SUBSCRIPTIONS
            .iter()
            .map(|s| (s.event, s.priority))
            .collect();
        assert_eq!(
            table,
            vec![
                (KernelEvent::Request, 100),
                (KernelEvent::Request, 16),
                (KernelEvent::FinishRequest, 0),
            ]
        );
    }

    #[test]
    fn test_subscribe_registers_each_row_on_its_stage() {
        let mut builder = KernelBuilder::new();
        builder.subscribe(Arc::new(listener("en")));
        let kernel = builder.build();

        for subscription in LocaleListener::SUBSCRIPTIONS {
            assert!(
                kernel
                    .listeners(subscription.event)
                    .contains(&(subscription.name, subscription.priority)),
                "{} missing from {}",
                subscription.name,
                subscription.event
            );
        }
        assert!(kernel.listeners(KernelEvent::Controller).is_empty());
        assert!(kernel.listeners(KernelEvent::Response).is_empty());
        assert_eq!(kernel.listeners(KernelEvent::Request).len(), 2);
        assert_eq!(kernel.listeners(KernelEvent::FinishRequest).len(), 1);
    }
}
