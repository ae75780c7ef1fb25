//! Response lines.
//!
//! Every connection receives exactly one of these, newline terminated.
//! Failure responses are fixed sentences and never carry error detail.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Exists(String),
    NotFound(String),
    RateLimited,
    Oversized,
    InvalidQuery,
    InternalError,
}

impl Response {
    /// The response as sent on the wire.
    pub fn to_line(&self) -> String {
        format!("{self}\n")
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::Exists(query) => write!(f, "Query '{query}' EXISTS"),
            Response::NotFound(query) => write!(f, "Query '{query}' NOT FOUND"),
            Response::RateLimited => f.write_str("Rate limit exceeded. Please try again later."),
            Response::Oversized => f.write_str("Request too large. Please limit your request size."),
            Response::InvalidQuery => f.write_str("Invalid query received."),
            Response::InternalError => f.write_str("An internal server error occurred."),
        }
    }
}
