use std::collections::HashMap;

use bytes::Bytes;

/// HTTP request methods understood by the server.
///
/// Anything other than GET and POST is rejected by the parser before the
/// target is even looked at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET - Retrieve a file, a directory listing or the upload form
    GET,
    /// POST - Submit a multipart upload
    POST,
}

/// A parsed request from a client.
///
/// `path` has already been percent-decoded; `query` is kept raw, including
/// its leading `?`, and is empty when the target had none.
#[derive(Debug, Clone)]
pub struct Request {
    /// The HTTP method (GET or POST)
    pub method: Method,
    /// Decoded request path (e.g. "/docs/read me.txt")
    pub path: String,
    /// Raw query string including the `?` (e.g. "?path=/docs")
    pub query: String,
    /// Request headers as key-value pairs
    pub headers: HashMap<String, String>,
    /// Request body, exactly `Content-Length` bytes
    pub body: Bytes,
}

impl Method {
    /// Parses an HTTP method from a string.
    ///
    /// Matching is case-sensitive.
    ///
    /// # Example
    ///
    /// ```
    /// # use burrow::http::request::Method;
    /// assert_eq!(Method::from_str("GET"), Some(Method::GET));
    /// assert_eq!(Method::from_str("get"), None);
    /// assert_eq!(Method::from_str("PUT"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "GET" => Some(Method::GET),
            "POST" => Some(Method::POST),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
        }
    }
}

impl Request {
    /// Retrieves a header value by name.
    ///
    /// An exact match wins; otherwise names are compared ASCII
    /// case-insensitively.
    pub fn header(&self, key: &str) -> Option<&str> {
        if let Some(v) = self.headers.get(key) {
            return Some(v.as_str());
        }

        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Looks up a single parameter in the query string.
    ///
    /// Values are form-urlencoded decoded. Returns the first occurrence.
    pub fn query_param(&self, name: &str) -> Option<String> {
        let raw = self.query.strip_prefix('?').unwrap_or(&self.query);

        url::form_urlencoded::parse(raw.as_bytes())
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    }
}
