//! Extension-based MIME lookup.

use std::path::Path;

pub const DEFAULT_MIME: &str = "application/octet-stream";

/// Returns the MIME type for `path` based on its extension.
///
/// The lookup table is `mime_guess`'s static one and is shared freely
/// between connections. Unknown or missing extensions map to
/// [`DEFAULT_MIME`].
pub fn mime_for_path(path: &Path) -> &'static str {
    mime_guess::from_path(path).first_raw().unwrap_or(DEFAULT_MIME)
}
