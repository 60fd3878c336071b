use std::collections::HashMap;

use thiserror::Error;

use crate::http::framer::FramedMessage;
use crate::http::request::{Method, Request};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("only GET and POST requests are supported")]
    UnsupportedMethod,
    #[error("malformed request line")]
    MalformedRequestLine,
}

/// Parses a framed request into method, decoded path, raw query and headers.
///
/// The version token is read and discarded. Header lines without a `:` are
/// skipped rather than rejected.
pub fn parse_request(message: &FramedMessage) -> Result<Request, ParseError> {
    let head = &message.header_block[..];
    let line_end = head
        .iter()
        .position(|&b| b == b'\n')
        .unwrap_or(head.len());
    let request_line = &head[..line_end];

    let mut parts = request_line
        .split(|b| b.is_ascii_whitespace())
        .filter(|t| !t.is_empty());

    let method_token = parts.next().ok_or(ParseError::MalformedRequestLine)?;
    let method = std::str::from_utf8(method_token)
        .ok()
        .and_then(Method::from_str)
        .ok_or(ParseError::UnsupportedMethod)?;

    let target = parts.next().ok_or(ParseError::MalformedRequestLine)?;
    let _version = parts.next();

    let (raw_path, query) = split_target(target);
    let path = String::from_utf8_lossy(&percent_decode(raw_path)).into_owned();
    let query = String::from_utf8_lossy(query).into_owned();

    let headers = parse_headers(&head[(line_end + 1).min(head.len())..]);

    Ok(Request {
        method,
        path,
        query,
        headers,
        body: message.body.clone(),
    })
}

/// Splits a request target on its first `?`. The query keeps the `?`.
pub fn split_target(target: &[u8]) -> (&[u8], &[u8]) {
    match target.iter().position(|&b| b == b'?') {
        Some(pos) => target.split_at(pos),
        None => (target, &target[target.len()..]),
    }
}

/// Decodes `%XY` escapes on raw bytes.
///
/// A `%` that is not followed by two hex digits is copied through as-is.
pub fn percent_decode(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len());
    let mut i = 0;

    while i < input.len() {
        if input[i] == b'%' && i + 2 < input.len() {
            if let (Some(hi), Some(lo)) = (hex_value(input[i + 1]), hex_value(input[i + 2])) {
                out.push((hi << 4) | lo);
                i += 3;
                continue;
            }
        }
        out.push(input[i]);
        i += 1;
    }

    out
}

/// Percent-encodes a path for use in a link.
///
/// Unreserved characters and `/` are kept; every other byte becomes `%XY`,
/// so the result always decodes back to `input` via [`percent_decode`].
pub fn percent_encode_path(input: &[u8]) -> String {
    let mut out = String::with_capacity(input.len());

    for &b in input {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~' | b'/') {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{:02X}", b));
        }
    }

    out
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

fn parse_headers(block: &[u8]) -> HashMap<String, String> {
    let text = String::from_utf8_lossy(block);
    let mut headers = HashMap::new();

    for line in text.split("\r\n") {
        if line.is_empty() {
            continue;
        }

        if let Some((key, value)) = line.split_once(':') {
            headers.insert(key.trim().to_string(), value.trim().to_string());
        }
    }

    headers
}
