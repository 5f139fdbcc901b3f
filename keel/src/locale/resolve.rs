//! Locale resolution from request inputs.

use super::AcceptLanguage;

/// Locale used when no usable default is configured.
pub const FALLBACK_LOCALE: &str = "en";

/// Pick the locale for a request.
///
/// An explicit non-empty locale wins without looking at the header. The
/// header is only negotiated when `allow_list` is non-empty; the matching
/// allow-list entry is returned. Otherwise `default` is returned.
///
/// Never fails: malformed header entries are skipped.
pub fn resolve_locale<S: AsRef<str>>(
    explicit: Option<&str>,
    accept_language: Option<&str>,
    allow_list: &[S],
    default: &str,
) -> String {
    if let Some(locale) = explicit.filter(|locale| !locale.is_empty()) {
        return locale.to_string();
    }

    if !allow_list.is_empty() {
        if let Some(header) = accept_language {
            if let Some(locale) = AcceptLanguage::parse(header).negotiate(allow_list) {
                return locale.to_string();
            }
        }
    }

    default.to_string()
}
