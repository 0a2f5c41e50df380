//! Inbound request view
//!
//! Handlers only need the method, the raw URL (path plus query) and the
//! headers. Keeping them in a plain struct lets tests build requests without
//! a live connection.

use hyper::header::{HeaderMap, HeaderName, HeaderValue};
use hyper::http::request::Parts;
use hyper::Method;

#[derive(Debug, Clone)]
pub struct ServeRequest {
    pub method: Method,
    /// Path and query exactly as received
    pub url: String,
    pub headers: HeaderMap,
}

impl ServeRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HeaderMap::new(),
        }
    }

    /// Shorthand for a GET request
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    /// Builder-style header insertion; invalid values are ignored
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: &str) -> Self {
        if let Ok(value) = HeaderValue::from_str(value) {
            self.headers.insert(name, value);
        }
        self
    }

    pub fn from_parts(parts: &Parts) -> Self {
        let url = parts
            .uri
            .path_and_query()
            .map_or_else(|| parts.uri.path().to_string(), ToString::to_string);
        Self {
            method: parts.method.clone(),
            url,
            headers: parts.headers.clone(),
        }
    }

    /// URL path without the query string
    pub fn path(&self) -> &str {
        self.url.split_once('?').map_or(self.url.as_str(), |(p, _)| p)
    }

    /// Header value as a string, `None` when absent or not visible ASCII
    pub fn header(&self, name: &HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn is_head(&self) -> bool {
        self.method == Method::HEAD
    }

    /// Only GET and HEAD are served; everything else passes through
    pub fn is_get_or_head(&self) -> bool {
        self.method == Method::GET || self.method == Method::HEAD
    }
}
