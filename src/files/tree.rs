//! Directory tree rendering.
//!
//! A listing is built top-down from a live `read_dir` walk on every request.
//! Each subdirectory is expanded inline as a collapsed nested list, so the
//! whole tree below the requested directory ships in one page and the
//! browser only toggles visibility.

use std::ffi::OsString;
use std::fmt::Write as _;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::files::sandbox::{PathSandbox, ResolvedPath};
use crate::files::template::{
    LISTING_URL, RELATIVE_PATH, TREE_CONTENT, UPLOAD_URL, escape_html, listing_url,
    load_tree_template, substitute, upload_url,
};

struct Entry {
    name: OsString,
    path: PathBuf,
}

/// Renders directory listings for paths inside a sandbox.
pub struct TreeRenderer<'a> {
    sandbox: &'a PathSandbox,
    max_depth: usize,
}

impl<'a> TreeRenderer<'a> {
    pub fn new(sandbox: &'a PathSandbox, max_depth: usize) -> Self {
        Self {
            sandbox,
            max_depth: max_depth.max(1),
        }
    }

    /// Renders the complete HTML page for a resolved directory.
    pub fn render_page(&self, dir: &ResolvedPath) -> String {
        let fragment = self.render_fragment(&dir.canonical_path, &dir.virtual_path);
        let template = load_tree_template(&self.sandbox.template_dir());
        let relative = escape_html(&dir.virtual_path);
        let upload = upload_url(&dir.virtual_path);
        let listing = listing_url(&dir.virtual_path);

        substitute(
            &template,
            &[
                (RELATIVE_PATH, relative.as_str()),
                (TREE_CONTENT, fragment.as_str()),
                (UPLOAD_URL, upload.as_str()),
                (LISTING_URL, listing.as_str()),
            ],
        )
    }

    /// Renders the `<li>` items for `dir` and everything beneath it.
    ///
    /// `relative` is the virtual path `dir` was requested as; it prefixes
    /// every link in the fragment.
    pub fn render_fragment(&self, dir: &Path, relative: &str) -> String {
        let mut out = String::new();
        let mut ancestors = vec![dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf())];

        self.render_dir(dir, relative, 1, &mut ancestors, &mut out);
        out
    }

    fn render_dir(
        &self,
        dir: &Path,
        relative: &str,
        depth: usize,
        ancestors: &mut Vec<PathBuf>,
        out: &mut String,
    ) {
        let (dirs, files) = match list_entries(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "Failed to enumerate directory");
                push_error(out, &format!("Error reading directory: {}", e));
                return;
            }
        };

        for entry in dirs {
            let name = entry.name.to_string_lossy();
            let child_relative = join_virtual(relative, &name);

            let _ = write!(
                out,
                "<li class=\"directory\"><span class=\"toggle\" onclick=\"toggle(this)\"></span>\
                 <a href=\"{}\">{}/</a>",
                listing_url(&child_relative),
                escape_html(&name),
            );

            if depth < self.max_depth {
                out.push_str("<ul class=\"tree collapsed\">\n");
                self.render_subdir(&entry.path, &child_relative, depth, ancestors, out);
                out.push_str("</ul>");
            }

            out.push_str("</li>\n");
        }

        for entry in files {
            let name = entry.name.to_string_lossy();
            let child_relative = join_virtual(relative, &name);

            let _ = writeln!(
                out,
                "<li class=\"file\"><a href=\"{}\">{}</a></li>",
                listing_url(&child_relative),
                escape_html(&name),
            );
        }
    }

    fn render_subdir(
        &self,
        path: &Path,
        relative: &str,
        depth: usize,
        ancestors: &mut Vec<PathBuf>,
        out: &mut String,
    ) {
        let canonical = match path.canonicalize() {
            Ok(c) => c,
            Err(e) => {
                push_error(out, &format!("Error reading directory: {}", e));
                return;
            }
        };

        if ancestors.contains(&canonical) {
            debug!(dir = %path.display(), "Skipping symbolic link cycle");
            push_error(out, "Symbolic link cycle");
            return;
        }

        if !self.sandbox.contains(&canonical) {
            debug!(dir = %path.display(), "Not expanding directory outside root");
            push_error(out, "Outside served root");
            return;
        }

        ancestors.push(canonical);
        self.render_dir(path, relative, depth + 1, ancestors, out);
        ancestors.pop();
    }
}

/// Joins a child name onto a virtual directory path without doubling `/`.
pub fn join_virtual(relative: &str, name: &str) -> String {
    if relative.ends_with('/') {
        format!("{}{}", relative, name)
    } else {
        format!("{}/{}", relative, name)
    }
}

/// Reads `dir` and returns its subdirectories and files, each sorted by
/// byte-wise name comparison.
fn list_entries(dir: &Path) -> io::Result<(Vec<Entry>, Vec<Entry>)> {
    let mut dirs = Vec::new();
    let mut files = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let item = Entry {
            name: entry.file_name(),
            path,
        };

        if item.path.is_dir() {
            dirs.push(item);
        } else {
            files.push(item);
        }
    }

    let by_name = |a: &Entry, b: &Entry| a.name.as_encoded_bytes().cmp(b.name.as_encoded_bytes());
    dirs.sort_by(by_name);
    files.sort_by(by_name);

    Ok((dirs, files))
}

fn push_error(out: &mut String, message: &str) {
    let _ = writeln!(out, "<li class=\"error\">{}</li>", escape_html(message));
}
