use burrow::files::sandbox::PathSandbox;
use burrow::files::template::FALLBACK_TREE_TEMPLATE;
use burrow::files::tree::TreeRenderer;
use std::fs;
use tempfile::TempDir;

fn position(haystack: &str, needle: &str) -> usize {
    haystack
        .find(needle)
        .unwrap_or_else(|| panic!("{:?} not found in listing:\n{}", needle, haystack))
}

#[test]
fn test_directories_listed_before_files() {
    let temp = TempDir::new().unwrap();
    fs::create_dir(temp.path().join("a")).unwrap();
    fs::write(temp.path().join("b.txt"), "b").unwrap();

    let sandbox = PathSandbox::new(temp.path()).unwrap();
    let html = TreeRenderer::new(&sandbox, 8).render_fragment(sandbox.root(), "/");

    assert!(position(&html, ">a/</a>") < position(&html, ">b.txt</a>"));
    assert!(html.contains("href=\"/a\""));
    assert!(html.contains("href=\"/b.txt\""));
}

#[test]
fn test_ordering_at_every_level() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    fs::write(root.join("zeta.txt"), "z").unwrap();
    fs::write(root.join("Alpha.txt"), "a").unwrap();
    fs::create_dir_all(root.join("src/zz")).unwrap();
    fs::create_dir_all(root.join("src/aa")).unwrap();
    fs::write(root.join("src/main.rs"), "m").unwrap();
    fs::write(root.join("src/b.rs"), "b").unwrap();
    fs::create_dir_all(root.join("Docs")).unwrap();

    let sandbox = PathSandbox::new(root).unwrap();
    let html = TreeRenderer::new(&sandbox, 8).render_fragment(sandbox.root(), "/");

    // Top level: dirs (byte order, uppercase first) then files
    let docs = position(&html, ">Docs/</a>");
    let src = position(&html, ">src/</a>");
    let alpha = position(&html, ">Alpha.txt</a>");
    let zeta = position(&html, ">zeta.txt</a>");
    assert!(docs < src);
    assert!(zeta > alpha);

    // Nested level, rendered inside src/
    let aa = position(&html, ">aa/</a>");
    let zz = position(&html, ">zz/</a>");
    let b = position(&html, ">b.rs</a>");
    let main = position(&html, ">main.rs</a>");
    assert!(src < aa && aa < zz && zz < b && b < main);
    assert!(main < alpha, "nested entries render before top-level files");
    assert!(html.contains("href=\"/src/zz\""));
    assert!(html.contains("href=\"/src/main.rs\""));
}

#[test]
fn test_subdirectories_start_collapsed() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("a/b")).unwrap();

    let sandbox = PathSandbox::new(temp.path()).unwrap();
    let html = TreeRenderer::new(&sandbox, 8).render_fragment(sandbox.root(), "/");

    assert_eq!(html.matches("<ul class=\"tree collapsed\">").count(), 2);
    assert!(html.contains("onclick=\"toggle(this)\""));
}

#[test]
fn test_links_use_relative_prefix() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("docs/sub")).unwrap();
    fs::write(temp.path().join("docs/sub/my file.txt"), "x").unwrap();

    let sandbox = PathSandbox::new(temp.path()).unwrap();
    let docs = sandbox.resolve("/docs").unwrap();
    let html = TreeRenderer::new(&sandbox, 8).render_fragment(&docs.canonical_path, "/docs");

    assert!(html.contains("href=\"/docs/sub\""));
    assert!(html.contains("href=\"/docs/sub/my%20file.txt\""));
    assert!(html.contains(">my file.txt</a>"));
    assert!(!html.contains("//"));
}

#[test]
fn test_names_are_html_escaped() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("<b>&.txt"), "x").unwrap();

    let sandbox = PathSandbox::new(temp.path()).unwrap();
    let html = TreeRenderer::new(&sandbox, 8).render_fragment(sandbox.root(), "/");

    assert!(html.contains(">&lt;b&gt;&amp;.txt</a>"));
    assert!(!html.contains("<b>"));
}

#[test]
fn test_max_depth_stops_expansion() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("one/two/three")).unwrap();

    let sandbox = PathSandbox::new(temp.path()).unwrap();
    let html = TreeRenderer::new(&sandbox, 2).render_fragment(sandbox.root(), "/");

    assert!(html.contains(">one/</a>"));
    assert!(html.contains(">two/</a>"));
    assert!(!html.contains(">three/</a>"));
}

#[test]
fn test_unreadable_root_renders_inline_error() {
    let temp = TempDir::new().unwrap();
    let sandbox = PathSandbox::new(temp.path()).unwrap();

    let html = TreeRenderer::new(&sandbox, 8).render_fragment(&temp.path().join("gone"), "/gone");
    assert!(html.contains("<li class=\"error\">"));
}

#[cfg(unix)]
#[test]
fn test_symlink_cycle_is_not_followed() {
    use std::os::unix::fs::symlink;

    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("a")).unwrap();
    fs::write(temp.path().join("a/file.txt"), "x").unwrap();
    symlink(temp.path().join("a"), temp.path().join("a/loop")).unwrap();

    let sandbox = PathSandbox::new(temp.path()).unwrap();
    let html = TreeRenderer::new(&sandbox, 64).render_fragment(sandbox.root(), "/");

    assert!(html.contains(">loop/</a>"));
    assert!(html.contains("Symbolic link cycle"));
    assert_eq!(html.matches(">file.txt</a>").count(), 1);
}

#[cfg(unix)]
#[test]
fn test_symlink_outside_root_is_not_expanded() {
    use std::os::unix::fs::symlink;

    let temp = TempDir::new().unwrap();
    let outside = TempDir::new().unwrap();
    fs::write(outside.path().join("secret.txt"), "secret").unwrap();
    symlink(outside.path(), temp.path().join("elsewhere")).unwrap();

    let sandbox = PathSandbox::new(temp.path()).unwrap();
    let html = TreeRenderer::new(&sandbox, 8).render_fragment(sandbox.root(), "/");

    assert!(html.contains(">elsewhere/</a>"));
    assert!(!html.contains("secret.txt"));
}

#[cfg(unix)]
#[test]
fn test_unreadable_subtree_does_not_abort_listing() {
    use std::os::unix::fs::PermissionsExt;

    let temp = TempDir::new().unwrap();
    let locked = temp.path().join("locked");
    fs::create_dir_all(&locked).unwrap();
    fs::write(temp.path().join("visible.txt"), "x").unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Root bypasses permission bits; nothing to observe in that case
    let readable_anyway = fs::read_dir(&locked).is_ok();

    let sandbox = PathSandbox::new(temp.path()).unwrap();
    let html = TreeRenderer::new(&sandbox, 8).render_fragment(sandbox.root(), "/");

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    assert!(html.contains(">locked/</a>"));
    assert!(html.contains(">visible.txt</a>"));
    if !readable_anyway {
        assert!(html.contains("<li class=\"error\">"));
    }
}

#[test]
fn test_render_page_uses_template_from_root() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("templates")).unwrap();
    fs::write(
        temp.path().join("templates/tree_template.html"),
        "[{{RELATIVE_PATH}}][{{TREE_CONTENT}}][{{RELATIVE_PATH}}]",
    )
    .unwrap();
    fs::write(temp.path().join("x.txt"), "x").unwrap();

    let sandbox = PathSandbox::new(temp.path()).unwrap();
    let root = sandbox.resolve("/").unwrap();
    let page = TreeRenderer::new(&sandbox, 8).render_page(&root);

    assert!(page.starts_with("[/]["));
    assert!(page.ends_with("][/]"));
    assert!(page.contains(">x.txt</a>"));
    assert!(!page.contains("{{"));
}

#[test]
fn test_render_page_falls_back_to_builtin_template() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("x.txt"), "x").unwrap();

    let sandbox = PathSandbox::new(temp.path()).unwrap();
    let root = sandbox.resolve("/").unwrap();
    let page = TreeRenderer::new(&sandbox, 8).render_page(&root);

    assert!(FALLBACK_TREE_TEMPLATE.contains("<!DOCTYPE html>"));
    assert!(page.starts_with("<!DOCTYPE html>"));
    assert!(page.contains("Index of /"));
    assert!(page.contains(">x.txt</a>"));
    assert!(!page.contains("{{RELATIVE_PATH}}"));
    assert!(!page.contains("{{TREE_CONTENT}}"));
}
