//! Request handler module
//!
//! Handlers are tried in order by the [`Router`]. Each one either serves the
//! request, fails it, or returns [`Flow::Next`] so the next handler can try.

pub mod combo;
pub mod group;
pub mod router;

pub use combo::{parse_combo_url, ComboHandler, ComboOptions};
pub use group::{folder, map, register, GroupHandler, GroupOptions};
pub use router::{handle_request, Router};

use crate::error::Result;
use crate::http::{ServeRequest, ServeResponse};
use async_trait::async_trait;

/// Outcome of a handler that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// The response has been written
    Handled,
    /// Not for this handler; the response is untouched
    Next,
}

/// One link of the handler chain.
///
/// Handlers run on a single-threaded executor, so their futures need not be
/// `Send`.
#[async_trait(?Send)]
pub trait RouteHandler {
    async fn handle(&self, req: &ServeRequest, res: &mut ServeResponse) -> Result<Flow>;
}
