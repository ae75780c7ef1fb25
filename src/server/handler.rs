//! Per-connection protocol state machine.
//!
//! # States
//! ```text
//! Connected → RateCheck → Reading → Validating → (Reloading) → Executing
//!     → Responding → Closed
//! ```
//!
//! Each phase returns an explicit value: a rejection ends processing with
//! `Outcome::Rejected`, an unexpected failure with `Err(InternalError)`.
//! Either way exactly one response line is written, flushed, and the stream
//! is shut down and dropped.

use std::net::SocketAddr;
use std::str::Utf8Error;
use std::time::Instant;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use crate::dataset::FileError;
use crate::net::ConnectionId;
use crate::observability::metrics::RejectionKind;
use crate::protocol::{parse_query, read_request, RawRequest, Response};
use crate::query::{ExecutorError, MatchResult};
use crate::server::ServerContext;

/// How a request ended, when it ended as expected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Answered { query: String, result: MatchResult },
    Rejected(RejectionKind),
}

impl Outcome {
    pub fn response(&self) -> Response {
        match self {
            Outcome::Answered {
                query,
                result: MatchResult::Exists,
            } => Response::Exists(query.clone()),
            Outcome::Answered {
                query,
                result: MatchResult::NotFound,
            } => Response::NotFound(query.clone()),
            Outcome::Rejected(RejectionKind::RateLimited) => Response::RateLimited,
            Outcome::Rejected(RejectionKind::Oversized) => Response::Oversized,
            Outcome::Rejected(RejectionKind::InvalidQuery) => Response::InvalidQuery,
        }
    }
}

/// Unexpected failures. Logged in full, reported to the client generically.
#[derive(Debug, Error)]
pub enum InternalError {
    #[error("reading request failed: {0}")]
    Read(#[source] std::io::Error),
    #[error("request is not valid UTF-8: {0}")]
    Decode(#[from] Utf8Error),
    #[error("dataset reload failed: {0}")]
    Reload(#[from] FileError),
    #[error("no dataset is published")]
    NoDataset,
    #[error("lookup failed: {0}")]
    Execute(#[from] ExecutorError),
}

/// Serve one request on `stream` and close it.
pub async fn handle_connection<S>(
    ctx: &ServerContext,
    mut stream: S,
    peer: SocketAddr,
    id: ConnectionId,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let start = Instant::now();
    let outcome = process(ctx, &mut stream, peer, id).await;

    let response = match &outcome {
        Ok(outcome) => outcome.response(),
        Err(e) => {
            tracing::error!(
                connection_id = %id,
                peer_addr = %peer,
                error = %e,
                "Request failed"
            );
            Response::InternalError
        }
    };

    let written = respond(&mut stream, &response).await;

    match (outcome, written) {
        (Ok(Outcome::Answered { query, result }), Ok(())) => {
            ctx.metrics.record_success();
            tracing::debug!(
                connection_id = %id,
                peer_addr = %peer,
                query = %query,
                result = ?result,
                elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Response sent"
            );
        }
        (Ok(Outcome::Answered { .. }), Err(e)) => {
            ctx.metrics.record_failure();
            tracing::error!(
                connection_id = %id,
                peer_addr = %peer,
                error = %e,
                "Writing response failed"
            );
        }
        (Ok(Outcome::Rejected(kind)), written) => {
            ctx.metrics.record_rejection(kind);
            if let Err(e) = written {
                tracing::debug!(connection_id = %id, error = %e, "Rejection not delivered");
            }
        }
        (Err(_), _) => ctx.metrics.record_failure(),
    }
}

async fn process<S>(
    ctx: &ServerContext,
    stream: &mut S,
    peer: SocketAddr,
    id: ConnectionId,
) -> Result<Outcome, InternalError>
where
    S: AsyncRead + Unpin,
{
    // RateCheck
    if !ctx.limiter.admit(peer.ip(), Instant::now()) {
        tracing::warn!(connection_id = %id, client = %peer.ip(), "Rate limit exceeded");
        return Ok(Outcome::Rejected(RejectionKind::RateLimited));
    }
    ctx.metrics.record_request();

    // Reading
    let max = ctx.config.limits.max_request_bytes;
    let payload = match read_request(stream, max).await.map_err(InternalError::Read)? {
        RawRequest::Payload(bytes) => bytes,
        RawRequest::Oversized => {
            tracing::warn!(connection_id = %id, peer_addr = %peer, max, "Request too large");
            return Ok(Outcome::Rejected(RejectionKind::Oversized));
        }
    };

    // Validating
    let Some(query) = parse_query(&payload)? else {
        tracing::debug!(connection_id = %id, peer_addr = %peer, "Invalid query");
        return Ok(Outcome::Rejected(RejectionKind::InvalidQuery));
    };
    tracing::debug!(connection_id = %id, peer_addr = %peer, query = %query, "Query received");

    // Reloading
    let dataset = if ctx.config.dataset.reread_on_query {
        ctx.store.reload().await?
    } else {
        ctx.store.current().ok_or(InternalError::NoDataset)?
    };

    // Executing
    let result = ctx.executor.execute(query.clone(), dataset).await?;
    Ok(Outcome::Answered { query, result })
}

async fn respond<S>(stream: &mut S, response: &Response) -> std::io::Result<()>
where
    S: AsyncWrite + Unpin,
{
    stream.write_all(response.to_line().as_bytes()).await?;
    stream.flush().await?;
    // The peer may already be gone; the response was flushed either way.
    let _ = stream.shutdown().await;
    Ok(())
}
