//! Wire protocol.
//!
//! # Data Flow
//! ```text
//! TCP/TLS stream
//!     → request.rs (single bounded read, decode, sanitize)
//!     → [lookup]
//!     → response.rs (one newline-terminated line)
//!     → close
//! ```

pub mod request;
pub mod response;

pub use request::{parse_query, read_request, RawRequest};
pub use response::Response;
