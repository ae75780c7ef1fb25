//! Request reading and validation.
//!
//! # Responsibilities
//! - Read the unframed query in a single read, bounded by the size cap
//! - Detect payloads that overflow the cap
//! - Turn raw bytes into a sanitized lookup key
//!
//! # Design Decisions
//! - One read only: the protocol has no framing, the first chunk is the query
//! - The buffer is one byte larger than the cap so overflow is observable
//! - Non-UTF-8 input is a server-side decode failure, not an invalid query

use std::str::Utf8Error;

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::security::sanitize_query;

/// What a single bounded read produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawRequest {
    /// At most `max` bytes; may be empty if the peer sent nothing.
    Payload(Vec<u8>),
    /// More than `max` bytes were pending.
    Oversized,
}

/// Perform one read of up to `max` bytes from `stream`.
pub async fn read_request<S>(stream: &mut S, max: usize) -> std::io::Result<RawRequest>
where
    S: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; max + 1];
    let n = stream.read(&mut buf).await?;
    if n > max {
        return Ok(RawRequest::Oversized);
    }
    buf.truncate(n);
    Ok(RawRequest::Payload(buf))
}

/// Decode and sanitize a payload. `Ok(None)` means the query is invalid.
pub fn parse_query(payload: &[u8]) -> Result<Option<String>, Utf8Error> {
    let query = sanitize_query(std::str::from_utf8(payload)?);
    Ok((!query.is_empty()).then_some(query))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    #[tokio::test]
    async fn test_reads_small_payload() {
        let (mut client, mut server) = tokio::io::duplex(4096);
        client.write_all(b"exact_line\n").await.unwrap();

        let raw = read_request(&mut server, 1024).await.unwrap();
        assert_eq!(raw, RawRequest::Payload(b"exact_line\n".to_vec()));
    }

    #[tokio::test]
    async fn test_exactly_max_is_accepted() {
        let (mut client, mut server) = tokio::io::duplex(4096);
        client.write_all(&[b'a'; 1024]).await.unwrap();

        let raw = read_request(&mut server, 1024).await.unwrap();
        assert!(matches!(raw, RawRequest::Payload(bytes) if bytes.len() == 1024));
    }

    #[tokio::test]
    async fn test_overflow_is_detected() {
        let (mut client, mut server) = tokio::io::duplex(4096);
        client.write_all(&[b'a'; 2000]).await.unwrap();

        let raw = read_request(&mut server, 1024).await.unwrap();
        assert_eq!(raw, RawRequest::Oversized);
    }

    #[tokio::test]
    async fn test_closed_peer_reads_empty() {
        let (client, mut server) = tokio::io::duplex(64);
        drop(client);

        let raw = read_request(&mut server, 1024).await.unwrap();
        assert_eq!(raw, RawRequest::Payload(Vec::new()));
    }

    #[test]
    fn test_parse_query() {
        assert_eq!(
            parse_query(b"exact_line;\n").unwrap().as_deref(),
            Some("exact_line")
        );
        assert_eq!(parse_query(b"  \n"), Ok(None));
        assert_eq!(parse_query(b""), Ok(None));
    }

    #[test]
    fn test_undecodable_payload_is_an_error() {
        assert!(parse_query(&[b'a', 0xff, 0xfe]).is_err());
    }
}
