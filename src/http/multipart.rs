//! Single-file `multipart/form-data` extraction.
//!
//! Only the first part of a submission is looked at. Part boundaries are
//! found purely by byte position, so file content may contain CRLFs, stray
//! dashes or anything else short of the actual delimiter.

use bytes::Bytes;
use thiserror::Error;

use crate::http::find_bytes;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MultipartError {
    #[error("malformed multipart body: {0}")]
    Malformed(&'static str),
    #[error("multipart part has no filename")]
    MissingFilename,
}

/// The uploaded file carried by the first part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedPart {
    /// Filename exactly as the client sent it; not yet validated
    pub filename: String,
    /// Raw part content
    pub content: Bytes,
}

/// Extracts the `boundary` parameter from a `Content-Type` header value.
///
/// ```
/// # use burrow::http::multipart::extract_boundary;
/// let ct = "multipart/form-data; boundary=----abc123";
/// assert_eq!(extract_boundary(ct).as_deref(), Some("----abc123"));
/// ```
pub fn extract_boundary(content_type: &str) -> Option<String> {
    content_type.split(';').find_map(|param| {
        let (key, value) = param.trim().split_once('=')?;
        if !key.trim().eq_ignore_ascii_case("boundary") {
            return None;
        }

        let value = value.trim().trim_matches('"');
        if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        }
    })
}

/// Returns the filename and content of the first part in `body`.
///
/// The part starts after the first `--boundary` line and ends right before
/// the CRLF that precedes the next delimiter (`--boundary` or the terminal
/// `--boundary--`). A part without `filename="..."` in its
/// `Content-Disposition` header is rejected.
pub fn parse_multipart(body: &Bytes, boundary: &str) -> Result<UploadedPart, MultipartError> {
    if boundary.is_empty() {
        return Err(MultipartError::Malformed("empty boundary"));
    }

    let delimiter = format!("--{}", boundary);
    let delimiter = delimiter.as_bytes();

    let first = find_bytes(body, delimiter, 0).ok_or(MultipartError::Malformed("boundary not found"))?;

    // Skip the delimiter's own CRLF
    let part_start = first + delimiter.len() + 2;
    if part_start > body.len() {
        return Err(MultipartError::Malformed("truncated after boundary"));
    }

    let mut closing = Vec::with_capacity(delimiter.len() + 2);
    closing.extend_from_slice(b"\r\n");
    closing.extend_from_slice(delimiter);

    let part_end = find_bytes(body, &closing, part_start)
        .ok_or(MultipartError::Malformed("closing boundary not found"))?;

    let part = &body[part_start..part_end];
    let headers_end =
        find_bytes(part, b"\r\n\r\n", 0).ok_or(MultipartError::Malformed("part has no header block"))?;

    let part_headers = String::from_utf8_lossy(&part[..headers_end]);
    let filename = disposition_filename(&part_headers).ok_or(MultipartError::MissingFilename)?;

    let content_start = part_start + headers_end + 4;

    Ok(UploadedPart {
        filename,
        content: body.slice(content_start..part_end),
    })
}

fn disposition_filename(headers: &str) -> Option<String> {
    const ATTR: &str = "filename=\"";

    headers
        .split("\r\n")
        .filter(|line| {
            line.split_once(':')
                .is_some_and(|(name, _)| name.trim().eq_ignore_ascii_case("Content-Disposition"))
        })
        .find_map(|line| {
            let start = line.find(ATTR)? + ATTR.len();
            let len = line[start..].find('"')?;
            Some(line[start..start + len].to_string())
        })
}
