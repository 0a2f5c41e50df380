//! HTTP protocol layer module
//!
//! Provides HTTP protocol-related base functionality (validators, ranges,
//! content types, request/response views), decoupled from path resolution.

pub mod cache;
pub mod mime;
pub mod range;
pub mod request;
pub mod response;

// Re-export commonly used types
pub use cache::MaxAge;
pub use mime::MimeTable;
pub use range::{parse_range_header, ByteRange, RangeParseResult};
pub use request::ServeRequest;
pub use response::{build_404_response, build_error_response, ServeResponse};
