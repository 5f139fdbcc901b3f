//! Kernel configuration.
//!
//! Every field has a default, so a partial (or empty) document is valid:
//!
//! ```json
//! { "locale": { "default_locale": "fr", "enabled_locales": ["fr", "de"] } }
//! ```

use crate::locale::FALLBACK_LOCALE;
use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    /// Locale resolution.
    pub locale: LocaleConfig,
    /// Cache warm-up.
    pub warmup: WarmupConfig,
}

impl KernelConfig {
    /// Parse a JSON document.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Locale resolution settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocaleConfig {
    /// Locale used when neither the request nor the header decides.
    pub default_locale: String,
    /// Locales Accept-Language is negotiated against. Empty disables
    /// negotiation.
    pub enabled_locales: Vec<String>,
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            default_locale: FALLBACK_LOCALE.to_string(),
            enabled_locales: Vec::new(),
        }
    }
}

/// Cache warm-up settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarmupConfig {
    /// Run optional warmers too.
    pub enable_optional: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = KernelConfig::from_json("{}").unwrap();
        assert_eq!(config, KernelConfig::default());
        assert_eq!(config.locale.default_locale, "en");
        assert!(config.locale.enabled_locales.is_empty());
        assert!(!config.warmup.enable_optional);
    }

    #[test]
    fn test_partial_document() {
        let config = KernelConfig::from_json(
            r#"{"locale": {"enabled_locales": ["fr", "de"]}, "warmup": {"enable_optional": true}}"#,
        )
        .unwrap();
        assert_eq!(config.locale.default_locale, "en");
        assert_eq!(config.locale.enabled_locales, ["fr", "de"]);
        assert!(config.warmup.enable_optional);
    }

    #[test]
    fn test_invalid_document() {
        assert!(KernelConfig::from_json(r#"{"locale": {"enabled_locales": "fr"}}"#).is_err());
    }
}
