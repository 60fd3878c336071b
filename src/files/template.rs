//! HTML page templates.
//!
//! Templates live in the reserved `templates/` directory under the root and
//! are read directly from disk on every request, without going through the
//! sandbox. When a template cannot be read the built-in copy compiled into
//! the binary is used instead.

use std::borrow::Cow;
use std::path::Path;

use tracing::debug;

use crate::http::parser::percent_encode_path;
use crate::server::dispatcher::UPLOAD_ROUTE;

/// Virtual path as display text, HTML-escaped.
pub const RELATIVE_PATH: &str = "{{RELATIVE_PATH}}";
pub const TREE_CONTENT: &str = "{{TREE_CONTENT}}";
/// Link to the upload form for the listed directory.
pub const UPLOAD_URL: &str = "{{UPLOAD_URL}}";
/// Link back to the directory listing.
pub const LISTING_URL: &str = "{{LISTING_URL}}";

pub const TREE_TEMPLATE_FILE: &str = "tree_template.html";
pub const UPLOAD_TEMPLATE_FILE: &str = "upload_template.html";

pub const FALLBACK_TREE_TEMPLATE: &str = include_str!("../../web/templates/tree_template.html");
pub const FALLBACK_UPLOAD_TEMPLATE: &str = include_str!("../../web/templates/upload_template.html");

pub fn load_tree_template(template_dir: &Path) -> Cow<'static, str> {
    load_template(template_dir, TREE_TEMPLATE_FILE, FALLBACK_TREE_TEMPLATE)
}

pub fn load_upload_template(template_dir: &Path) -> Cow<'static, str> {
    load_template(template_dir, UPLOAD_TEMPLATE_FILE, FALLBACK_UPLOAD_TEMPLATE)
}

fn load_template(template_dir: &Path, name: &str, fallback: &'static str) -> Cow<'static, str> {
    let path = template_dir.join(name);

    match std::fs::read_to_string(&path) {
        Ok(content) => Cow::Owned(content),
        Err(e) => {
            debug!(template = %path.display(), error = %e, "Using built-in template");
            Cow::Borrowed(fallback)
        }
    }
}

/// Replaces every occurrence of each placeholder in a single left-to-right
/// pass.
///
/// Substituted text is never scanned again, so a value that itself contains
/// a placeholder is emitted verbatim.
pub fn substitute(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    loop {
        let next = values
            .iter()
            .filter(|(key, _)| !key.is_empty())
            .filter_map(|(key, value)| rest.find(key).map(|pos| (pos, key.len(), *value)))
            .min_by_key(|(pos, _, _)| *pos);

        match next {
            Some((pos, key_len, value)) => {
                out.push_str(&rest[..pos]);
                out.push_str(value);
                rest = &rest[pos + key_len..];
            }
            None => {
                out.push_str(rest);
                return out;
            }
        }
    }
}

/// Link target for a virtual path, percent-encoded.
pub fn listing_url(virtual_path: &str) -> String {
    percent_encode_path(virtual_path.as_bytes())
}

/// Link to the upload form for a virtual directory.
///
/// The path is percent-encoded so that `&`, `+`, `#` and `;` in names
/// survive form-urlencoded decoding of the query.
pub fn upload_url(virtual_path: &str) -> String {
    format!("{}?path={}", UPLOAD_ROUTE, percent_encode_path(virtual_path.as_bytes()))
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());

    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }

    out
}
