//! Locale resolution.
//!
//! A request's locale comes from, in order:
//!
//! 1. an explicit `_locale` attribute,
//! 2. the Accept-Language header negotiated against the enabled locales
//!    (only when an allow-list is configured),
//! 3. the configured default locale.
//!
//! [`LocaleListener`] applies this to requests flowing through the kernel and
//! keeps the routing context in sync, including after nested requests.

mod accept;
mod listener;
mod resolve;

pub use accept::{AcceptLanguage, LanguageRange, Quality};
pub use listener::LocaleListener;
pub use resolve::{FALLBACK_LOCALE, resolve_locale};
