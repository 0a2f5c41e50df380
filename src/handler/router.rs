//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: runs the handler chain and turns
//! its outcome into a hyper response.

use super::{Flow, RouteHandler};
use crate::config::AppState;
use crate::error::ErrorKind;
use crate::http::{build_404_response, build_error_response, ServeRequest, ServeResponse};
use crate::logger::{self, AccessLogEntry};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Request, Response};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::rc::Rc;
use std::time::Instant;

/// Ordered handler chain
#[derive(Default)]
pub struct Router {
    handlers: Vec<Box<dyn RouteHandler>>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, handler: impl RouteHandler + 'static) -> &mut Self {
        self.handlers.push(Box::new(handler));
        self
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Try each handler in order.
    ///
    /// The first `Handled` wins; an error is rendered as its status; if every
    /// handler passes, the request is a 404.
    pub async fn dispatch(&self, req: &ServeRequest) -> ServeResponse {
        let mut res = ServeResponse::new();
        for handler in &self.handlers {
            match handler.handle(req, &mut res).await {
                Ok(Flow::Handled) => return res,
                Ok(Flow::Next) => {}
                Err(err) => {
                    match err.kind() {
                        ErrorKind::ReadError | ErrorKind::InternalError => {
                            tracing::error!(url = %req.url, error = %err, "request failed");
                        }
                        _ => tracing::debug!(url = %req.url, error = %err, "request failed"),
                    }
                    return build_error_response(&err);
                }
            }
        }
        tracing::debug!(url = %req.url, "no handler matched");
        build_404_response()
    }
}

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Rc<AppState>,
    peer: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let (parts, _) = req.into_parts();
    let serve_req = ServeRequest::from_parts(&parts);

    let res = state.router.dispatch(&serve_req).await;

    if state.config.logging.access_log {
        let mut entry = AccessLogEntry::from_request(peer, &parts);
        entry.status = res.status.as_u16();
        entry.body_bytes = res.body().len();
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(res.into_hyper())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Result, ServeError};
    use async_trait::async_trait;
    use hyper::header::CONTENT_RANGE;
    use hyper::StatusCode;

    enum Fixed {
        Handled(&'static str),
        Next,
        Fail(fn() -> ServeError),
    }

    #[async_trait(?Send)]
    impl RouteHandler for Fixed {
        async fn handle(&self, _req: &ServeRequest, res: &mut ServeResponse) -> Result<Flow> {
            match self {
                Self::Handled(body) => {
                    res.end(Bytes::from_static(body.as_bytes()));
                    Ok(Flow::Handled)
                }
                Self::Next => Ok(Flow::Next),
                Self::Fail(make) => Err(make()),
            }
        }
    }

    #[tokio::test]
    async fn test_first_handled_wins() {
        let mut router = Router::new();
        router
            .push(Fixed::Next)
            .push(Fixed::Handled("b"))
            .push(Fixed::Handled("c"));
        let res = router.dispatch(&ServeRequest::get("/x")).await;
        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(res.body().as_ref(), b"b");
    }

    #[tokio::test]
    async fn test_all_next_is_404() {
        let mut router = Router::new();
        router.push(Fixed::Next);
        let res = router.dispatch(&ServeRequest::get("/x")).await;
        assert_eq!(res.status, StatusCode::NOT_FOUND);
        let empty = Router::new().dispatch(&ServeRequest::get("/x")).await;
        assert_eq!(empty.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_error_is_rendered() {
        let mut router = Router::new();
        router
            .push(Fixed::Fail(|| ServeError::BadRange { size: 42 }))
            .push(Fixed::Handled("unreachable"));
        let res = router.dispatch(&ServeRequest::get("/x")).await;
        assert_eq!(res.status, StatusCode::RANGE_NOT_SATISFIABLE);
        assert_eq!(res.header(&CONTENT_RANGE), Some("bytes */42"));

        let mut router = Router::new();
        router.push(Fixed::Fail(|| ServeError::MixedContentTypes));
        let res = router.dispatch(&ServeRequest::get("/combo?a.js~b.css")).await;
        assert_eq!(res.status, StatusCode::NOT_FOUND);
        assert_eq!(
            res.body().as_ref(),
            b"Mixing content-types in combo request."
        );
    }
}
