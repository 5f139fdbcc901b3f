//! # keel - Request Lifecycle Kernel
//!
//! `keel` runs requests through four priority-ordered stages (request,
//! controller, response, finish-request) and ships the listeners a web
//! application kernel needs around them:
//!
//! - [`locale::LocaleListener`] - resolves the request locale from the
//!   `_locale` attribute, the Accept-Language header and a default, and keeps
//!   the routing context in sync across nested requests
//! - [`collector::RequestDataCollector`] - builds profiler data for each
//!   request, linking redirects across requests
//! - [`cache::PoolClearer`] and [`cache::WarmerAggregate`] - cache
//!   maintenance
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use keel::prelude::*;
//!
//! let stack = Arc::new(RequestStack::new());
//! let context = Arc::new(RouteContext::new());
//! let locale = LocaleListener::new(stack.clone(), "en")
//!     .with_enabled_locales(["en", "fr"])
//!     .with_routing_context(context.clone());
//!
//! let mut builder = Kernel::builder().with_request_stack(stack);
//! builder.subscribe(Arc::new(locale));
//! let kernel = builder.build();
//!
//! let response = kernel.handle(Arc::new(request), RequestKind::Main).await?;
//! ```

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

pub use keel_core::{
    // Error types
    BoxError,
    DispatchError,
    // Hook
    DynHook,
    Hook,
    HookFuture,
    HookResult,
    KeelError,
    // Message
    Message,
};

pub use keel_std::{HookEntry, Registry, RegistryBuilder, RegistrationMeta};

pub mod cache;
pub mod collector;
pub mod config;
pub mod http;
pub mod kernel;
pub mod locale;
pub mod routing;
pub mod testing;

/// Standard hook implementations.
pub mod hooks {
    pub use keel_std::hooks::{FnHook, LoggingHook, from_fn};
}

/// Prelude module - common imports for Keel.
///
/// # Usage
///
/// ```rust,ignore
/// use keel::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        BoxError,
        DispatchError,
        Hook,
        HookResult,
        Message,
        // Cache
        cache::{CacheClearer, CachePool, CacheWarmer, PoolClearer, WarmerAggregate},
        // Collector
        collector::{RequestDataCollector, RequestProfile},
        // Configuration
        config::{KernelConfig, LocaleConfig, WarmupConfig},
        // HTTP model
        http::{Request, RequestStack, Response, Session},
        // Kernel
        kernel::{
            Controller, ControllerTarget, EventSubscriber, Kernel, KernelBuilder, KernelError,
            RequestKind, controller_fn,
        },
        // Locale
        locale::LocaleListener,
        // Routing
        routing::{RouteContext, RoutingContext},
    };
    pub use std::sync::Arc;
}
