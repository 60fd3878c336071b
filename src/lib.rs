//! Burrow - sandboxed file server
//!
//! Serves files and directory trees from a single root directory and accepts
//! single-file multipart uploads into it, over a minimal HTTP/1.1 subset.

pub mod config;
pub mod error;
pub mod files;
pub mod http;
pub mod server;
