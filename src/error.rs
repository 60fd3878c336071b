//! Request-level error taxonomy.
//!
//! Every failure that can happen after a request has been framed ends up as
//! a [`ServerError`], and the dispatcher turns it into exactly one response.

use thiserror::Error;

use crate::files::sandbox::SandboxError;
use crate::http::multipart::MultipartError;
use crate::http::parser::ParseError;
use crate::http::response::{Response, StatusCode};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("only GET and POST requests are supported")]
    UnsupportedMethod,

    #[error("malformed request line")]
    MalformedRequestLine,

    #[error("malformed multipart upload: {0}")]
    MalformedMultipart(String),

    #[error("upload has no filename")]
    MissingFilename,

    #[error("invalid upload filename: {0:?}")]
    InvalidFilename(String),

    #[error("failed to store upload: {0}")]
    UploadWriteFailure(#[source] std::io::Error),

    #[error("path escapes the served root: {0}")]
    PathEscapesRoot(String),

    #[error("template directory is not accessible")]
    TemplateDirectoryAccess,

    #[error("not found: {0}")]
    PathNotFound(String),

    #[error("upload destination does not exist: {0}")]
    UploadDestinationMissing(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::UnsupportedMethod
            | ServerError::MalformedRequestLine
            | ServerError::MalformedMultipart(_)
            | ServerError::MissingFilename
            | ServerError::InvalidFilename(_)
            | ServerError::UploadWriteFailure(_) => StatusCode::BadRequest,
            ServerError::PathEscapesRoot(_) | ServerError::TemplateDirectoryAccess => {
                StatusCode::Forbidden
            }
            ServerError::PathNotFound(_) | ServerError::UploadDestinationMissing(_) => {
                StatusCode::NotFound
            }
            ServerError::Internal(_) => StatusCode::InternalServerError,
        }
    }

    /// Body text sent to the client. Never echoes filesystem paths.
    pub fn public_message(&self) -> &'static str {
        match self {
            ServerError::UnsupportedMethod => "Only GET and POST requests are supported",
            ServerError::MalformedRequestLine => "Malformed request",
            ServerError::MalformedMultipart(_) => "Malformed multipart upload",
            ServerError::MissingFilename => "Upload is missing a filename",
            ServerError::InvalidFilename(_) => "Invalid filename",
            ServerError::UploadWriteFailure(_) => "Failed to store upload",
            ServerError::PathEscapesRoot(_) | ServerError::TemplateDirectoryAccess => {
                "Access denied"
            }
            ServerError::PathNotFound(_) => "File not found",
            ServerError::UploadDestinationMissing(_) => "Upload destination not found",
            ServerError::Internal(_) => "Internal server error",
        }
    }

    pub fn into_response(self) -> Response {
        Response::text(self.status(), self.public_message())
    }
}

impl From<ParseError> for ServerError {
    fn from(e: ParseError) -> Self {
        match e {
            ParseError::UnsupportedMethod => ServerError::UnsupportedMethod,
            ParseError::MalformedRequestLine => ServerError::MalformedRequestLine,
        }
    }
}

impl From<MultipartError> for ServerError {
    fn from(e: MultipartError) -> Self {
        match e {
            MultipartError::MissingFilename => ServerError::MissingFilename,
            MultipartError::Malformed(reason) => ServerError::MalformedMultipart(reason.to_string()),
        }
    }
}

impl From<SandboxError> for ServerError {
    fn from(e: SandboxError) -> Self {
        match e {
            SandboxError::TemplateDirectory => ServerError::TemplateDirectoryAccess,
            SandboxError::EscapesRoot(p) => ServerError::PathEscapesRoot(p),
            SandboxError::NotFound(p) => ServerError::PathNotFound(p),
        }
    }
}
