//! Per-request routing.
//!
//! Turns a framed request into exactly one response:
//!
//! | Request               | Outcome                                   |
//! |-----------------------|-------------------------------------------|
//! | `GET /upload?path=P`  | upload form for destination `P`           |
//! | `POST /upload?path=P` | store the first multipart file under `P`  |
//! | `GET <path>`          | file contents or directory tree listing   |
//! | anything else         | 400                                       |
//!
//! All errors are folded into a status code here; nothing below this point
//! writes to the socket.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use crate::config::FilesConfig;
use crate::error::ServerError;
use crate::files::sandbox::{PathSandbox, ResolvedPath, SandboxError};
use crate::files::template::{
    LISTING_URL, RELATIVE_PATH, UPLOAD_URL, escape_html, listing_url, load_upload_template,
    substitute, upload_url,
};
use crate::files::tree::{TreeRenderer, join_virtual};
use crate::http::framer::FramedMessage;
use crate::http::mime::mime_for_path;
use crate::http::multipart::{extract_boundary, parse_multipart};
use crate::http::parser::parse_request;
use crate::http::request::{Method, Request};
use crate::http::response::Response;

pub const UPLOAD_ROUTE: &str = "/upload";

/// Routes requests against a sandboxed root. Cheap to clone; every
/// connection task gets its own handle.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    sandbox: Arc<PathSandbox>,
    max_tree_depth: usize,
}

impl Dispatcher {
    pub fn new(sandbox: PathSandbox, max_tree_depth: usize) -> Self {
        Self {
            sandbox: Arc::new(sandbox),
            max_tree_depth,
        }
    }

    /// Creates the root directory if needed and builds a dispatcher for it.
    pub fn prepare(files: &FilesConfig) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&files.root)
            .with_context(|| format!("failed to create root directory {}", files.root.display()))?;

        let sandbox = PathSandbox::new(&files.root)
            .with_context(|| format!("failed to resolve root directory {}", files.root.display()))?;

        Ok(Self::new(sandbox, files.max_tree_depth))
    }

    pub fn sandbox(&self) -> &PathSandbox {
        &self.sandbox
    }

    /// Parses and handles a framed request.
    pub async fn dispatch(&self, message: &FramedMessage) -> Response {
        let request = match parse_request(message) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "Rejected request");
                return ServerError::from(e).into_response();
            }
        };

        self.handle(&request).await
    }

    /// Handles an already parsed request.
    pub async fn handle(&self, request: &Request) -> Response {
        let result = match (request.method, request.path.as_str()) {
            (Method::GET, UPLOAD_ROUTE) => self.upload_form(request),
            (Method::POST, UPLOAD_ROUTE) => self.accept_upload(request).await,
            (Method::GET, _) => self.serve(request).await,
            (Method::POST, _) => Err(ServerError::UnsupportedMethod),
        };

        match result {
            Ok(response) => {
                info!(
                    method = request.method.as_str(),
                    path = %request.path,
                    status = response.status.as_u16(),
                    bytes = response.body.len(),
                    "Request served"
                );
                response
            }
            Err(e) => {
                let status = e.status().as_u16();
                info!(
                    method = request.method.as_str(),
                    path = %request.path,
                    status,
                    error = %e,
                    "Request failed"
                );
                e.into_response()
            }
        }
    }

    async fn serve(&self, request: &Request) -> Result<Response, ServerError> {
        let resolved = self.sandbox.resolve(&request.path)?;

        if resolved.canonical_path.is_dir() {
            let page = self.render_listing(resolved).await?;
            return Ok(Response::html(page));
        }

        let content = tokio::fs::read(&resolved.canonical_path)
            .await
            .map_err(|_| ServerError::PathNotFound(request.path.clone()))?;

        if content.is_empty() {
            return Err(ServerError::PathNotFound(request.path.clone()));
        }

        let mime = mime_for_path(Path::new(&resolved.virtual_path));
        Ok(Response::ok(mime, content))
    }

    async fn render_listing(&self, dir: ResolvedPath) -> Result<String, ServerError> {
        let sandbox = Arc::clone(&self.sandbox);
        let max_depth = self.max_tree_depth;

        tokio::task::spawn_blocking(move || TreeRenderer::new(&sandbox, max_depth).render_page(&dir))
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }

    fn upload_form(&self, request: &Request) -> Result<Response, ServerError> {
        let destination = upload_destination(request);
        let template = load_upload_template(&self.sandbox.template_dir());
        let relative = escape_html(&destination);
        let upload = upload_url(&destination);
        let listing = listing_url(&destination);

        Ok(Response::html(substitute(
            &template,
            &[
                (RELATIVE_PATH, relative.as_str()),
                (UPLOAD_URL, upload.as_str()),
                (LISTING_URL, listing.as_str()),
            ],
        )))
    }

    async fn accept_upload(&self, request: &Request) -> Result<Response, ServerError> {
        let destination = upload_destination(request);

        let dir = self.sandbox.resolve(&destination).map_err(|e| match e {
            SandboxError::NotFound(p) => ServerError::UploadDestinationMissing(p),
            other => other.into(),
        })?;

        if !dir.canonical_path.is_dir() {
            return Err(ServerError::UploadDestinationMissing(destination));
        }

        let content_type = request
            .header("Content-Type")
            .ok_or_else(|| ServerError::MalformedMultipart("missing Content-Type".to_string()))?;
        let boundary = extract_boundary(content_type)
            .ok_or_else(|| ServerError::MalformedMultipart("missing boundary".to_string()))?;

        let part = parse_multipart(&request.body, &boundary)?;
        validate_filename(&part.filename)?;

        tokio::fs::create_dir_all(&dir.canonical_path)
            .await
            .map_err(ServerError::UploadWriteFailure)?;

        let virtual_target = join_virtual(&destination, &part.filename);
        let target = self
            .sandbox
            .verify_destination(&virtual_target, &dir.canonical_path.join(&part.filename))
            .map_err(|e| match e {
                SandboxError::NotFound(p) => ServerError::UploadDestinationMissing(p),
                other => other.into(),
            })?;

        // Concurrent uploads of the same name are not serialized; last write wins.
        tokio::fs::write(&target, &part.content)
            .await
            .map_err(ServerError::UploadWriteFailure)?;

        info!(
            destination = %virtual_target,
            bytes = part.content.len(),
            "Stored upload"
        );

        let body = format!(
            "<!DOCTYPE html>\n<html><body><p>Uploaded {} ({} bytes).</p>\
             <p><a href=\"{}\">Back to listing</a></p></body></html>\n",
            escape_html(&part.filename),
            part.content.len(),
            listing_url(&destination),
        );
        Ok(Response::html(body))
    }
}

fn upload_destination(request: &Request) -> String {
    request
        .query_param("path")
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| "/".to_string())
}

/// Rejects upload filenames that could name anything other than a single
/// entry in the destination directory.
pub fn validate_filename(name: &str) -> Result<(), ServerError> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);

    if invalid {
        warn!(filename = ?name, "Rejected upload filename");
        return Err(ServerError::InvalidFilename(name.to_string()));
    }

    Ok(())
}
