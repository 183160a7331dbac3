use serifian_templates::discover::{discover, DiscoveryError, TemplateFolder};
use std::ffi::OsStr;
use std::fs::{create_dir_all, write};
use std::path::Path;
use tempfile::tempdir;

fn touch(path: &Path) {
    create_dir_all(path.parent().unwrap()).unwrap();
    write(path, "= Template\n").unwrap();
}

#[test]
fn test_discover_finds_folders_at_any_depth() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    touch(&root.join("a/main.typ"));
    touch(&root.join("b/c/main.typ"));
    touch(&root.join("b/readme.md"));
    touch(&root.join("d/e/f/notes.typ"));

    let folders = discover(root, "main.typ").expect("Discovery should succeed");

    assert_eq!(
        folders,
        vec![
            TemplateFolder::new(root.join("a")),
            TemplateFolder::new(root.join("b/c")),
        ]
    );
}

#[test]
fn test_discover_returns_empty_without_entry_points() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    touch(&root.join("a/template.typ"));
    touch(&root.join("b/c/lib.typ"));

    let folders = discover(root, "main.typ").expect("Discovery should succeed");
    assert!(folders.is_empty(), "Expected no folders, got {folders:?}");
}

#[test]
fn test_discover_matches_parent_and_nested_folder_in_preorder() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    touch(&root.join("report/main.typ"));
    touch(&root.join("report/appendix/main.typ"));
    touch(&root.join("report/zz/main.typ"));

    let folders = discover(root, "main.typ").unwrap();
    let names: Vec<_> = folders.iter().map(|f| f.path().to_path_buf()).collect();

    // "appendix" < "main.typ" < "zz" in listing order.
    assert_eq!(
        names,
        vec![
            root.join("report/appendix"),
            root.join("report"),
            root.join("report/zz"),
        ]
    );
}

#[test]
fn test_discover_recurses_into_directory_named_like_entry_point() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    create_dir_all(root.join("odd/main.typ")).unwrap();

    let folders = discover(root, "main.typ").unwrap();
    assert!(folders.is_empty(), "A directory is never an entry point: {folders:?}");

    touch(&root.join("odd/main.typ/main.typ"));
    let folders = discover(root, "main.typ").unwrap();
    assert_eq!(folders, vec![TemplateFolder::new(root.join("odd/main.typ"))]);
}

#[test]
fn test_discover_matches_root_itself() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    touch(&root.join("main.typ"));

    let folders = discover(root, "main.typ").unwrap();
    assert_eq!(folders, vec![TemplateFolder::new(root)]);
}

#[test]
fn test_discover_is_idempotent() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    for name in ["x", "y/z", "y/w", "q/r/s"] {
        touch(&root.join(name).join("main.typ"));
    }

    let first = discover(root, "main.typ").unwrap();
    let second = discover(root, "main.typ").unwrap();
    assert_eq!(first.len(), 4);
    assert_eq!(first, second);
}

#[test]
fn test_discovered_folders_print_with_trailing_separator() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    touch(&root.join("a/main.typ"));

    let folders = discover(root, "main.typ").unwrap();
    let shown = folders[0].to_string();
    assert!(shown.ends_with(std::path::MAIN_SEPARATOR), "{shown}");
    assert!(!shown.ends_with("//"), "{shown}");
    assert_eq!(folders[0].name(), Some(OsStr::new("a")));
}

#[test]
fn test_discover_fails_for_missing_root() {
    let tmp = tempdir().unwrap();
    let missing = tmp.path().join("does-not-exist");

    let err = discover(&missing, "main.typ").unwrap_err();
    match err {
        DiscoveryError::ReadDir { path, .. } => assert_eq!(path, missing),
    }
}

#[cfg(unix)]
#[test]
fn test_discover_does_not_follow_symlinked_directories() {
    use std::os::unix::fs::symlink;

    let tmp = tempdir().unwrap();
    let root = tmp.path().join("root");
    let outside = tmp.path().join("outside");
    touch(&root.join("a/main.typ"));
    touch(&outside.join("elsewhere/main.typ"));
    // One link loops back to an ancestor, the other leaves the tree.
    symlink(&root, root.join("a/loop")).unwrap();
    symlink(&outside, root.join("escape")).unwrap();

    let folders = discover(&root, "main.typ").expect("Discovery should terminate");
    assert_eq!(folders, vec![TemplateFolder::new(root.join("a"))]);
}
