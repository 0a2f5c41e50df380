//! Delivery engine
//!
//! Writes an in-memory asset into a [`ServeResponse`] with caching headers,
//! conditional GET and single byte-range support.
//!
//! Failures go through one contract, [`Delivery::error`]. With
//! [`ErrorPolicy::Respond`] the engine writes the error status itself; with
//! [`ErrorPolicy::Propagate`] it hands the error back so the calling handler
//! can route it through its own continuation. Which one applies is chosen by
//! whoever constructs the engine.

use crate::asset::Asset;
use crate::error::{Result, ServeError};
use crate::http::cache::{self, MaxAge};
use crate::http::range::{parse_range_header, RangeParseResult};
use crate::http::{MimeTable, ServeRequest, ServeResponse};
use hyper::body::Bytes;
use hyper::header::{
    ACCEPT_RANGES, CACHE_CONTROL, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE, DATE, ETAG,
    IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED, RANGE,
};
use hyper::StatusCode;
use percent_encoding::percent_decode_str;
use std::time::SystemTime;

/// What to do with a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Write status and reason phrase into the response
    #[default]
    Respond,
    /// Return the error to the caller untouched
    Propagate,
}

/// Per-send options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SendOptions {
    /// First byte of the asset to expose
    pub start: Option<u64>,
    /// Last byte (inclusive) of the asset to expose
    pub end: Option<u64>,
    pub max_age: MaxAge,
}

/// Lifecycle of one delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryState {
    Init,
    HeaderComputed,
    NotModified,
    RangeInvalid,
    Streaming,
    Done,
    Error,
}

pub struct Delivery<'a> {
    req: &'a ServeRequest,
    res: &'a mut ServeResponse,
    options: SendOptions,
    policy: ErrorPolicy,
    mime: Option<&'a MimeTable>,
    state: DeliveryState,
}

impl<'a> Delivery<'a> {
    pub fn new(req: &'a ServeRequest, res: &'a mut ServeResponse) -> Self {
        Self {
            req,
            res,
            options: SendOptions::default(),
            policy: ErrorPolicy::default(),
            mime: None,
            state: DeliveryState::Init,
        }
    }

    #[must_use]
    pub fn options(mut self, options: SendOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn max_age(mut self, max_age: MaxAge) -> Self {
        self.options.max_age = max_age;
        self
    }

    #[must_use]
    pub fn policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn mime_table(mut self, table: &'a MimeTable) -> Self {
        self.mime = Some(table);
        self
    }

    pub const fn state(&self) -> DeliveryState {
        self.state
    }

    /// Fill caching headers the caller has not set
    pub fn set_caching_headers(&mut self, asset: &Asset) {
        let res = &mut *self.res;
        res.set_header_if_absent(ACCEPT_RANGES, "bytes");
        res.set_header_if_absent(ETAG, cache::generate_etag(asset.size, asset.mtime));
        res.set_header_if_absent(DATE, cache::format_http_date(SystemTime::now()));
        res.set_header_if_absent(CACHE_CONTROL, self.options.max_age.to_header_value());
        res.set_header_if_absent(LAST_MODIFIED, cache::format_http_date(asset.mtime));
    }

    /// Set Content-Type from the request path unless already set
    pub fn detect_content_type(&mut self) {
        if self.res.has_header(&CONTENT_TYPE) {
            return;
        }
        let default_table = MimeTable::default();
        let table = self.mime.unwrap_or(&default_table);
        let content_type = table.content_type(self.req.path());
        tracing::trace!(%content_type, "content-type");
        self.res.set_header(CONTENT_TYPE, content_type);
    }

    pub fn is_conditional_get(&self) -> bool {
        self.req.headers.contains_key(IF_NONE_MATCH)
            || self.req.headers.contains_key(IF_MODIFIED_SINCE)
    }

    /// 2xx or 304 (RFC 2616 section 14.25/14.26)
    pub fn is_cacheable(&self) -> bool {
        self.res.status.is_success() || self.res.status == StatusCode::NOT_MODIFIED
    }

    pub fn is_fresh(&self) -> bool {
        cache::is_fresh(
            self.req.header(&IF_NONE_MATCH),
            self.req.header(&IF_MODIFIED_SINCE),
            self.res.header(&ETAG),
            self.res.header(&LAST_MODIFIED),
        )
    }

    /// Validate the request URL, then [`send`](Self::send).
    ///
    /// The whole URL is checked, query included, since combo members live
    /// there. One that does not percent-decode to UTF-8, or decodes to one
    /// containing a NUL byte, is a 400.
    pub fn pipe(&mut self, asset: &Asset) -> Result<()> {
        let req = self.req;
        let Ok(decoded) = percent_decode_str(&req.url).decode_utf8() else {
            return self.error(ServeError::BadRequest("invalid request uri"));
        };
        if decoded.contains('\0') {
            return self.error(ServeError::BadRequest("null byte in request uri"));
        }
        self.send(asset)
    }

    /// Write `asset` to the response
    pub fn send(&mut self, asset: &Asset) -> Result<()> {
        self.set_caching_headers(asset);
        self.detect_content_type();
        self.state = DeliveryState::HeaderComputed;

        if self.is_conditional_get() && self.is_cacheable() && self.is_fresh() {
            self.not_modified();
            return Ok(());
        }

        // Window exposed by the caller's start/end options
        let offset = self.options.start.unwrap_or(0);
        let mut len = asset.size.saturating_sub(offset);
        if let Some(end) = self.options.end {
            let window = if end < offset { 0 } else { end - offset + 1 };
            len = len.min(window);
        }

        let req = self.req;
        let mut start = offset;
        if let Some(header) = req.header(&RANGE) {
            match parse_range_header(header, len) {
                RangeParseResult::NotSatisfiable => {
                    self.res
                        .set_header(CONTENT_RANGE, format!("bytes */{}", asset.size));
                    let result = self.error(ServeError::BadRange { size: asset.size });
                    self.state = DeliveryState::RangeInvalid;
                    return result;
                }
                RangeParseResult::Valid(range) => {
                    self.res.status = StatusCode::PARTIAL_CONTENT;
                    self.res.set_header(
                        CONTENT_RANGE,
                        format!("bytes {}-{}/{len}", range.start, range.end),
                    );
                    start = range.offset_by(offset).start;
                    len = range.len();
                }
                // Syntactically invalid ranges are served as a regular response
                RangeParseResult::None => {}
            }
        }

        self.res.set_header(CONTENT_LENGTH, len.to_string());

        if req.is_head() {
            self.res.end(Bytes::new());
            self.state = DeliveryState::Done;
            return Ok(());
        }

        self.stream(asset, start, len)
    }

    /// Report a failure according to the configured policy
    pub fn error(&mut self, err: ServeError) -> Result<()> {
        self.state = DeliveryState::Error;
        match self.policy {
            ErrorPolicy::Propagate => Err(err),
            ErrorPolicy::Respond => {
                let status = err.status();
                tracing::debug!(%status, error = %err, "responding with error");
                self.res
                    .write_error(status, status.canonical_reason().unwrap_or("Error"));
                Ok(())
            }
        }
    }

    fn not_modified(&mut self) {
        tracing::debug!(path = self.req.path(), "not modified");
        self.res.remove_content_headers();
        self.res.status = StatusCode::NOT_MODIFIED;
        self.res.end(Bytes::new());
        self.state = DeliveryState::NotModified;
    }

    fn stream(&mut self, asset: &Asset, start: u64, len: u64) -> Result<()> {
        self.state = DeliveryState::Streaming;
        if len == 0 {
            self.res.end(Bytes::new());
            self.state = DeliveryState::Done;
            return Ok(());
        }
        let total = asset.bytes.len();
        let (Ok(from), Ok(count)) = (usize::try_from(start), usize::try_from(len)) else {
            return self.error(ServeError::Internal("range exceeds address space".into()));
        };
        let Some(to) = from.checked_add(count).filter(|&to| to <= total) else {
            return self.error(ServeError::Internal(format!(
                "asset shorter than its stat: {total} bytes, wanted {from}+{count}"
            )));
        };
        self.res.end(asset.bytes.slice(from..to));
        self.state = DeliveryState::Done;
        tracing::trace!(bytes = count, "stream end");
        Ok(())
    }
}
