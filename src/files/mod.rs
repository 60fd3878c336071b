//! Filesystem side of the server: root sandboxing, directory listings and
//! the HTML templates they are rendered into.

pub mod sandbox;
pub mod template;
pub mod tree;

pub use sandbox::{PathSandbox, ResolvedPath, SandboxError};
pub use tree::TreeRenderer;
