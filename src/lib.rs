//! Concurrent line-matching server library.
//!
//! A client connects over TCP (optionally TLS), sends one query, and receives
//! one line saying whether the query is a complete line of the reference file.

pub mod admin;
pub mod config;
pub mod dataset;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod protocol;
pub mod query;
pub mod security;
pub mod server;

pub use config::schema::ServerConfig;
pub use lifecycle::Shutdown;
pub use server::LineServer;
