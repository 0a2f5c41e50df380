//! Static asset server with combo requests.
//!
//! Files are exposed through registered groups, either an explicit map of
//! allowed files or a whole folder, and several of them can be fetched in one
//! request that returns their concatenation:
//!
//! ```text
//! GET /combo?/yui/yui-min.js~/yui/oop-min.js
//! ```
//!
//! Every response carries `ETag`, `Last-Modified` and `Cache-Control`, and
//! answers conditional GETs and single byte ranges.

pub mod asset;
pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod registry;
pub mod send;
pub mod server;

pub use asset::{Asset, AssetLoader, FsLoader, MemoryLoader};
pub use error::{ErrorKind, Result, ServeError};
pub use handler::{Flow, RouteHandler, Router};
pub use registry::{Group, GroupRegistry};
pub use send::{Delivery, ErrorPolicy};
