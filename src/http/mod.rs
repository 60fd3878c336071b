//! HTTP protocol implementation.
//!
//! A deliberately small HTTP/1.1 subset: one request per connection, GET and
//! POST only, bodies framed exclusively by `Content-Length`.
//!
//! # Architecture
//!
//! - **`framer`**: Reads a complete request (header block + declared body) off a stream
//! - **`parser`**: Extracts method, decoded path, query and headers from a framed request
//! - **`request`**: HTTP request representation
//! - **`multipart`**: Pulls a single uploaded file out of a `multipart/form-data` body
//! - **`response`**: HTTP response representation with builder pattern
//! - **`writer`**: Serializes and writes HTTP responses to the client
//! - **`connection`**: Drives one connection through read, dispatch, write and close
//! - **`mime`**: MIME type detection based on file extensions
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← Frame the request (headers + Content-Length body)
//!        └──────┬──────┘
//!               │ Request framed          (transport failure → Closed, no response)
//!               ▼
//!        ┌──────────────────┐
//!        │   Processing     │ ← Parse, sandbox, dispatch
//!        └──────┬───────────┘
//!               │ Response ready
//!               ▼
//!        ┌──────────────────┐
//!        │    Writing       │ ← Send response to client
//!        └──────┬───────────┘
//!               │ Response sent
//!               └─ Closed (no keep-alive)
//! ```

pub mod connection;
pub mod framer;
pub mod mime;
pub mod multipart;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;

/// Finds `needle` in `haystack` at or after `from`.
pub(crate) fn find_bytes(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if needle.is_empty() || from > haystack.len() {
        return None;
    }

    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|pos| pos + from)
}
