//! HTTP response building module
//!
//! `ServeResponse` is the mutable response handlers write into. Callers may
//! pre-set headers before handing it to the delivery engine; the engine only
//! fills headers that are still unset.

use crate::error::ServeError;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE};
use hyper::{Response, StatusCode};

#[derive(Debug)]
pub struct ServeResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    body: Bytes,
    finished: bool,
}

impl Default for ServeResponse {
    fn default() -> Self {
        Self::new()
    }
}

impl ServeResponse {
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            finished: false,
        }
    }

    /// Header value as a string, `None` when absent or not visible ASCII
    pub fn header(&self, name: &HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn has_header(&self, name: &HeaderName) -> bool {
        self.headers.contains_key(name)
    }

    /// Set a header, replacing any previous value. Values that are not valid
    /// header text are dropped with a warning.
    pub fn set_header(&mut self, name: HeaderName, value: impl AsRef<str>) {
        match HeaderValue::from_str(value.as_ref()) {
            Ok(v) => {
                self.headers.insert(name, v);
            }
            Err(e) => {
                tracing::warn!(header = %name, error = %e, "dropping invalid header value");
            }
        }
    }

    /// Set a header only when the caller has not already set it
    pub fn set_header_if_absent(&mut self, name: HeaderName, value: impl AsRef<str>) {
        if !self.has_header(&name) {
            self.set_header(name, value);
        }
    }

    /// Strip every header whose name starts with `content`
    pub fn remove_content_headers(&mut self) {
        let content: Vec<HeaderName> = self
            .headers
            .keys()
            .filter(|name| name.as_str().starts_with("content"))
            .cloned()
            .collect();
        for name in content {
            self.headers.remove(name);
        }
    }

    /// Finish the response with the given body
    pub fn end(&mut self, body: Bytes) {
        self.body = body;
        self.finished = true;
    }

    pub const fn is_finished(&self) -> bool {
        self.finished
    }

    pub const fn body(&self) -> &Bytes {
        &self.body
    }

    /// Write a plain-text error status with its message as the body
    pub fn write_error(&mut self, status: StatusCode, message: &str) {
        self.status = status;
        self.set_header(CONTENT_TYPE, "text/plain; charset=utf-8");
        self.set_header(CONTENT_LENGTH, message.len().to_string());
        self.end(Bytes::from(message.to_owned()));
    }

    /// Convert into a hyper response
    pub fn into_hyper(self) -> Response<Full<Bytes>> {
        let mut response = Response::new(Full::new(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// Build the response for an error that reached the router
///
/// 416 responses always carry `Content-Range: bytes */<size>`.
pub fn build_error_response(err: &ServeError) -> ServeResponse {
    let mut res = ServeResponse::new();
    if let ServeError::BadRange { size } = err {
        res.set_header(CONTENT_RANGE, format!("bytes */{size}"));
    }
    res.write_error(err.status(), &err.public_message());
    res
}

/// Build 404 Not Found response for requests no handler claimed
pub fn build_404_response() -> ServeResponse {
    let mut res = ServeResponse::new();
    let status = StatusCode::NOT_FOUND;
    res.write_error(status, status.canonical_reason().unwrap_or("Not Found"));
    res
}
