//! Request framing
//!
//! Turns a byte stream into exactly one request: everything up to and
//! including the blank line that ends the headers, followed by exactly
//! `Content-Length` body bytes. Nothing here assumes that headers or body
//! arrive in a single read.

use bytes::{Bytes, BytesMut};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::config::ServerConfig;
use crate::http::find_bytes;

const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";
const CONTENT_LENGTH_TOKEN: &[u8] = b"\r\nContent-Length:";

#[derive(Debug, Error)]
pub enum FrameError {
    /// Peer closed the connection before sending a single byte.
    #[error("connection closed before any request data arrived")]
    ConnectionClosed,

    /// Peer closed the connection part-way through a request.
    #[error("connection closed after {received} bytes of an incomplete request")]
    IncompleteRequest { received: usize },

    #[error("request headers exceed {limit} bytes")]
    HeadersTooLarge { limit: usize },

    #[error("declared body of {declared} bytes exceeds {limit} bytes")]
    BodyTooLarge { declared: usize, limit: usize },

    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),
}

/// A complete request as it came off the wire.
#[derive(Debug, Clone)]
pub struct FramedMessage {
    /// Request line and headers, including the trailing CRLF CRLF
    pub header_block: Bytes,
    /// Exactly `Content-Length` bytes of body
    pub body: Bytes,
}

/// Reads framed requests off a stream using bounded reads.
#[derive(Debug, Clone)]
pub struct RequestFramer {
    read_buffer_size: usize,
    max_header_size: usize,
    max_body_size: usize,
}

impl Default for RequestFramer {
    fn default() -> Self {
        Self::from_config(&ServerConfig::default())
    }
}

impl RequestFramer {
    pub fn new(read_buffer_size: usize, max_header_size: usize, max_body_size: usize) -> Self {
        Self {
            read_buffer_size: read_buffer_size.max(1),
            max_header_size,
            max_body_size,
        }
    }

    pub fn from_config(cfg: &ServerConfig) -> Self {
        Self::new(cfg.read_buffer_size, cfg.max_header_size, cfg.max_body_size)
    }

    /// Reads one complete request from `reader`.
    ///
    /// Returns only once the header terminator has been seen and the declared
    /// number of body bytes has arrived. Any bytes past the declared length
    /// are discarded.
    pub async fn read_message<R>(&self, reader: &mut R) -> Result<FramedMessage, FrameError>
    where
        R: AsyncRead + Unpin,
    {
        let mut buffer = BytesMut::with_capacity(self.read_buffer_size);
        let mut chunk = vec![0u8; self.read_buffer_size];

        // Header phase
        let mut scanned = 0usize;
        let headers_end = loop {
            // Only rescan the tail that could complete a terminator
            let from = scanned.saturating_sub(HEADER_TERMINATOR.len() - 1);
            if let Some(pos) = find_bytes(&buffer, HEADER_TERMINATOR, from) {
                break pos + HEADER_TERMINATOR.len();
            }
            scanned = buffer.len();

            if buffer.len() > self.max_header_size {
                return Err(FrameError::HeadersTooLarge {
                    limit: self.max_header_size,
                });
            }

            let n = reader.read(&mut chunk).await?;
            if n == 0 {
                return Err(if buffer.is_empty() {
                    FrameError::ConnectionClosed
                } else {
                    FrameError::IncompleteRequest {
                        received: buffer.len(),
                    }
                });
            }
            buffer.extend_from_slice(&chunk[..n]);
        };

        let header_block = buffer.split_to(headers_end).freeze();
        let content_length = declared_content_length(&header_block);

        if content_length > self.max_body_size {
            return Err(FrameError::BodyTooLarge {
                declared: content_length,
                limit: self.max_body_size,
            });
        }

        tracing::debug!(
            header_bytes = header_block.len(),
            content_length,
            buffered = buffer.len(),
            "Request headers framed"
        );

        // Body phase, growing the buffer one read at a time
        while buffer.len() < content_length {
            let want = (content_length - buffer.len()).min(chunk.len());
            buffer.reserve(want);
            let n = reader.read(&mut chunk[..want]).await?;
            if n == 0 {
                return Err(FrameError::IncompleteRequest {
                    received: header_block.len() + buffer.len(),
                });
            }
            buffer.extend_from_slice(&chunk[..n]);
        }
        buffer.truncate(content_length);

        Ok(FramedMessage {
            header_block,
            body: buffer.freeze(),
        })
    }
}

/// Returns the value of the first `Content-Length:` header line, or 0 when
/// the header is absent or its value does not parse.
///
/// The header name is matched case-sensitively.
pub fn declared_content_length(header_block: &[u8]) -> usize {
    let Some(pos) = find_bytes(header_block, CONTENT_LENGTH_TOKEN, 0) else {
        return 0;
    };

    let value_start = pos + CONTENT_LENGTH_TOKEN.len();
    let value_end = find_bytes(header_block, b"\r\n", value_start).unwrap_or(header_block.len());

    std::str::from_utf8(&header_block[value_start..value_end])
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(0)
}
