//! Incoming request model.

use super::{LOCALE_ATTRIBUTE, ParameterBag, Session};
use crate::kernel::Controller;
use crate::locale::{AcceptLanguage, FALLBACK_LOCALE};
use http::{HeaderMap, HeaderName, HeaderValue, Method, header::ACCEPT_LANGUAGE};
use serde_json::Value;
use std::fmt;
use std::sync::{
    Arc, PoisonError, RwLock,
    atomic::{AtomicU64, Ordering},
};

static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique request identifier.
///
/// Listeners that keep per-request state (the request collector) key it by
/// this id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u64);

impl RequestId {
    fn next() -> Self {
        Self(NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Numeric value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

/// An incoming request.
///
/// The immutable parts (method, headers, bags) are fixed at build time.
/// Attributes and locale are interior-mutable because kernel hooks receive
/// events by shared reference.
pub struct Request {
    id: RequestId,
    method: Method,
    path_info: String,
    format: String,
    headers: HeaderMap,
    query: ParameterBag,
    request: ParameterBag,
    server: ParameterBag,
    cookies: ParameterBag,
    content: Option<String>,
    attributes: RwLock<ParameterBag>,
    locale: RwLock<Option<String>>,
    default_locale: RwLock<String>,
    session: Option<Arc<Session>>,
    controller: Option<Arc<dyn Controller>>,
}

impl Request {
    /// Start building a request.
    pub fn builder(method: Method, path_info: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(method, path_info)
    }

    /// A bodiless GET request for `path_info`.
    pub fn get(path_info: impl Into<String>) -> Self {
        RequestBuilder::new(Method::GET, path_info).into_request()
    }

    /// Request id.
    pub fn id(&self) -> RequestId {
        self.id
    }

    /// HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Path relative to the application entry point.
    pub fn path_info(&self) -> &str {
        &self.path_info
    }

    /// Request format (`"html"`, `"json"`, ...).
    pub fn format(&self) -> &str {
        &self.format
    }

    /// Request headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// First value of a header, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Query string parameters.
    pub fn query(&self) -> &ParameterBag {
        &self.query
    }

    /// Body parameters.
    pub fn request(&self) -> &ParameterBag {
        &self.request
    }

    /// Server and execution environment parameters.
    pub fn server(&self) -> &ParameterBag {
        &self.server
    }

    /// Cookies.
    pub fn cookies(&self) -> &ParameterBag {
        &self.cookies
    }

    /// Raw body, or `None` when the body was consumed as a stream.
    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    /// A copy of the attribute bag.
    pub fn attributes(&self) -> ParameterBag {
        self.attributes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// A single attribute.
    pub fn attribute(&self, name: &str) -> Option<Value> {
        self.attributes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// A single attribute, if it is a string.
    pub fn attribute_str(&self, name: &str) -> Option<String> {
        self.attribute(name)
            .and_then(|v| v.as_str().map(str::to_string))
    }

    /// Whether an attribute is present.
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .has(name)
    }

    /// Set an attribute.
    pub fn set_attribute(&self, name: impl Into<String>, value: impl Into<Value>) {
        self.attributes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .set(name, value);
    }

    /// The explicit `_locale` attribute, if set and non-empty.
    pub fn explicit_locale(&self) -> Option<String> {
        self.attribute_str(LOCALE_ATTRIBUTE)
            .filter(|locale| !locale.is_empty())
    }

    /// The applied locale, or the default locale when none was applied.
    pub fn locale(&self) -> String {
        match &*self.locale.read().unwrap_or_else(PoisonError::into_inner) {
            Some(locale) => locale.clone(),
            None => self.default_locale(),
        }
    }

    /// Apply a locale to the request.
    pub fn set_locale(&self, locale: impl Into<String>) {
        *self.locale.write().unwrap_or_else(PoisonError::into_inner) = Some(locale.into());
    }

    /// Default locale used while no locale has been applied.
    pub fn default_locale(&self) -> String {
        self.default_locale
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the default locale.
    pub fn set_default_locale(&self, locale: impl Into<String>) {
        *self
            .default_locale
            .write()
            .unwrap_or_else(PoisonError::into_inner) = locale.into();
    }

    /// The Accept-Language header, with repeated header lines joined.
    pub fn accept_language(&self) -> Option<String> {
        let values: Vec<&str> = self
            .headers
            .get_all(ACCEPT_LANGUAGE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect();
        if values.is_empty() {
            None
        } else {
            Some(values.join(","))
        }
    }

    /// Language tags from Accept-Language, most preferred first.
    pub fn preferred_languages(&self) -> Vec<String> {
        self.accept_language()
            .map(|header| {
                AcceptLanguage::parse(&header)
                    .ranked()
                    .map(|range| range.tag().to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The most preferred entry of `supported` according to Accept-Language.
    pub fn preferred_language<'a, S: AsRef<str>>(&self, supported: &'a [S]) -> Option<&'a str> {
        let header = self.accept_language()?;
        AcceptLanguage::parse(&header).negotiate(supported)
    }

    /// Whether a session is attached.
    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// The attached session.
    pub fn session(&self) -> Option<&Arc<Session>> {
        self.session.as_ref()
    }

    /// The controller resolved for this request.
    pub fn controller(&self) -> Option<&Arc<dyn Controller>> {
        self.controller.as_ref()
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("id", &self.id)
            .field("method", &self.method)
            .field("path_info", &self.path_info)
            .field("locale", &self.locale())
            .field("controller", &self.controller.as_ref().map(|c| c.target()))
            .finish_non_exhaustive()
    }
}

/// Builder for [`Request`].
///
/// Header errors are deferred to [`RequestBuilder::build`], the way
/// `http::request::Builder` does it.
pub struct RequestBuilder {
    request: Request,
    error: Option<http::Error>,
}

impl RequestBuilder {
    fn new(method: Method, path_info: impl Into<String>) -> Self {
        Self {
            request: Request {
                id: RequestId::next(),
                method,
                path_info: path_info.into(),
                format: "html".to_string(),
                headers: HeaderMap::new(),
                query: ParameterBag::new(),
                request: ParameterBag::new(),
                server: ParameterBag::new(),
                cookies: ParameterBag::new(),
                content: Some(String::new()),
                attributes: RwLock::new(ParameterBag::new()),
                locale: RwLock::new(None),
                default_locale: RwLock::new(FALLBACK_LOCALE.to_string()),
                session: None,
                controller: None,
            },
            error: None,
        }
    }

    /// Append a header.
    pub fn header<K, V>(mut self, name: K, value: V) -> Self
    where
        K: TryInto<HeaderName>,
        <K as TryInto<HeaderName>>::Error: Into<http::Error>,
        V: TryInto<HeaderValue>,
        <V as TryInto<HeaderValue>>::Error: Into<http::Error>,
    {
        if self.error.is_some() {
            return self;
        }
        match (name.try_into(), value.try_into()) {
            (Ok(name), Ok(value)) => {
                self.request.headers.append(name, value);
            }
            (Err(e), _) => self.error = Some(e.into()),
            (_, Err(e)) => self.error = Some(e.into()),
        }
        self
    }

    /// Add a query string parameter.
    pub fn query(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.request.query.set(name, value);
        self
    }

    /// Add a body parameter.
    pub fn body_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.request.request.set(name, value);
        self
    }

    /// Add a server parameter.
    pub fn server(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.request.server.set(name, value);
        self
    }

    /// Add a cookie.
    pub fn cookie(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.request.cookies.set(name, value);
        self
    }

    /// Set an attribute.
    pub fn attribute(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.request.set_attribute(name, value);
        self
    }

    /// Set the raw body.
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.request.content = Some(content.into());
        self
    }

    /// Mark the body as already consumed as a stream.
    pub fn streamed_content(mut self) -> Self {
        self.request.content = None;
        self
    }

    /// Set the request format.
    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.request.format = format.into();
        self
    }

    /// Apply a locale up front.
    pub fn locale(self, locale: impl Into<String>) -> Self {
        self.request.set_locale(locale);
        self
    }

    /// Attach a session.
    pub fn session(mut self, session: Arc<Session>) -> Self {
        self.request.session = Some(session);
        self
    }

    /// Attach the controller that will handle the request.
    pub fn controller(mut self, controller: Arc<dyn Controller>) -> Self {
        self.request.controller = Some(controller);
        self
    }

    /// Finish building, failing on the first invalid header.
    pub fn build(self) -> Result<Request, http::Error> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.request),
        }
    }

    fn into_request(self) -> Request {
        self.request
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locale_falls_back_to_default() {
        let request = Request::get("/");
        assert_eq!(request.locale(), "en");

        request.set_default_locale("fr");
        assert_eq!(request.locale(), "fr");

        request.set_locale("de");
        request.set_default_locale("it");
        assert_eq!(request.locale(), "de");
    }

    #[test]
    fn test_explicit_locale_ignores_empty() {
        let request = Request::builder(Method::GET, "/")
            .attribute(LOCALE_ATTRIBUTE, "")
            .build()
            .unwrap();
        assert_eq!(request.explicit_locale(), None);

        request.set_attribute(LOCALE_ATTRIBUTE, "es");
        assert_eq!(request.explicit_locale().as_deref(), Some("es"));
    }

    #[test]
    fn test_ids_are_unique() {
        let a = Request::get("/a");
        let b = Request::get("/b");
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_invalid_header_fails_build() {
        let result = Request::builder(Method::GET, "/")
            .header("bad header", "value")
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_accept_language_joins_lines() {
        let request = Request::builder(Method::GET, "/")
            .header("accept-language", "fr-FR")
            .header("accept-language", "en;q=0.5")
            .build()
            .unwrap();

        assert_eq!(request.accept_language().as_deref(), Some("fr-FR,en;q=0.5"));
        assert_eq!(request.preferred_languages(), vec!["fr-FR", "en"]);
        assert_eq!(request.preferred_language(&["en", "fr"]), Some("fr"));
    }
}
