//! Response model.

use http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header};

/// A response produced by a controller.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    content: String,
}

impl Response {
    /// A response with the given status and body and no headers.
    pub fn new(status: StatusCode, content: impl Into<String>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            content: content.into(),
        }
    }

    /// A `200 OK` response.
    pub fn ok(content: impl Into<String>) -> Self {
        Self::new(StatusCode::OK, content)
    }

    /// Start building a response.
    pub fn builder(status: StatusCode) -> ResponseBuilder {
        ResponseBuilder {
            response: Self::new(status, String::new()),
            error: None,
        }
    }

    /// A `302 Found` redirect to `location`.
    pub fn redirect(location: &str) -> Result<Self, http::Error> {
        Self::builder(StatusCode::FOUND)
            .header(header::LOCATION, location)
            .build()
    }

    /// Status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Reason phrase of the status code, empty when unknown.
    pub fn status_text(&self) -> &'static str {
        self.status.canonical_reason().unwrap_or("")
    }

    /// Response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// First value of a header, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Body.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Whether the status is one of the redirect statuses
    /// (201, 301, 302, 303, 307, 308).
    pub fn is_redirect(&self) -> bool {
        matches!(
            self.status,
            StatusCode::CREATED
                | StatusCode::MOVED_PERMANENTLY
                | StatusCode::FOUND
                | StatusCode::SEE_OTHER
                | StatusCode::TEMPORARY_REDIRECT
                | StatusCode::PERMANENT_REDIRECT
        )
    }
}

/// Builder for [`Response`].
pub struct ResponseBuilder {
    response: Response,
    error: Option<http::Error>,
}

impl ResponseBuilder {
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
                self.response.headers.append(name, value);
            }
            (Err(e), _) => self.error = Some(e.into()),
            (_, Err(e)) => self.error = Some(e.into()),
        }
        self
    }

    /// Set the body.
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.response.content = content.into();
        self
    }

    /// Finish building, failing on the first invalid header.
    pub fn build(self) -> Result<Response, http::Error> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.response),
        }
    }
}
