use serifian_templates::config::RepositoryRef;
use serifian_templates::contract::{MockToolchain, ToolError};
use serifian_templates::fake::{FakeToolchain, ToolCall};
use serifian_templates::fetch::{fetch, FetchError};
use serifian_templates::layout::Layout;
use std::fs::{create_dir_all, write};
use tempfile::tempdir;

#[tokio::test]
async fn test_fetch_clones_into_author_repo_path() {
    let tmp = tempdir().unwrap();
    let layout = Layout::new(tmp.path().join("Templates"));
    let toolchain = FakeToolchain::new();
    let repo = RepositoryRef::new("typst", "templates");

    let dest = fetch(&repo, "github.com", &layout, &toolchain)
        .await
        .expect("Fetch should succeed");

    assert_eq!(dest, tmp.path().join("Templates/repos/typst/templates"));
    assert!(dest.is_dir());
    assert_eq!(
        toolchain.calls(),
        vec![ToolCall::Clone {
            url: "https://github.com/typst/templates.git".to_string(),
            destination: dest.clone(),
        }]
    );
}

#[tokio::test]
async fn test_fetch_replaces_existing_clone() {
    let tmp = tempdir().unwrap();
    let layout = Layout::new(tmp.path());
    let repo = RepositoryRef::new("typst", "templates");
    let existing = layout.clone_dir(&repo).join("old/main.typ");
    create_dir_all(existing.parent().unwrap()).unwrap();
    write(&existing, "stale").unwrap();

    let fixture = tmp.path().join("fixture");
    create_dir_all(fixture.join("fresh")).unwrap();
    write(fixture.join("fresh/main.typ"), "= Fresh").unwrap();
    let toolchain = FakeToolchain::new().with_clone_fixture(&fixture);

    let dest = fetch(&repo, "github.com", &layout, &toolchain).await.unwrap();

    assert!(!existing.exists(), "Previous clone must be deleted first");
    assert!(dest.join("fresh/main.typ").is_file());
}

#[tokio::test]
async fn test_fetch_replaces_regular_file_at_clone_path() {
    let tmp = tempdir().unwrap();
    let layout = Layout::new(tmp.path());
    let repo = RepositoryRef::new("typst", "templates");
    let clone = layout.clone_dir(&repo);
    create_dir_all(clone.parent().unwrap()).unwrap();
    write(&clone, "left over").unwrap();

    let dest = fetch(&repo, "github.com", &layout, &FakeToolchain::new())
        .await
        .expect("A stray file is removed before cloning");

    assert!(dest.is_dir());
}

#[tokio::test]
async fn test_fetch_checks_out_reference_after_clone() {
    let tmp = tempdir().unwrap();
    let layout = Layout::new(tmp.path());
    let toolchain = FakeToolchain::new();
    let mut repo = RepositoryRef::new("typst", "templates");
    repo.reference = Some("v0.1.0".to_string());

    let dest = fetch(&repo, "example.org", &layout, &toolchain).await.unwrap();

    let calls = toolchain.calls();
    assert_eq!(calls.len(), 2);
    assert!(matches!(&calls[0], ToolCall::Clone { url, .. } if url == "https://example.org/typst/templates.git"));
    assert_eq!(
        calls[1],
        ToolCall::Checkout {
            repository: dest,
            reference: "v0.1.0".to_string(),
        }
    );
}

#[tokio::test]
async fn test_fetch_propagates_clone_failure() {
    let tmp = tempdir().unwrap();
    let layout = Layout::new(tmp.path());
    let toolchain = FakeToolchain::new().failing_clone();
    let repo = RepositoryRef::new("nobody", "missing");

    let err = fetch(&repo, "github.com", &layout, &toolchain).await.unwrap_err();
    assert!(matches!(err, FetchError::Clone { .. }), "{err:?}");
    assert!(err.to_string().contains("nobody/missing"), "{err}");
}

#[tokio::test]
async fn test_fetch_does_not_checkout_when_clone_fails() {
    let tmp = tempdir().unwrap();
    let layout = Layout::new(tmp.path());
    let mut repo = RepositoryRef::new("typst", "templates");
    repo.reference = Some("main".to_string());

    let mut mock = MockToolchain::new();
    mock.expect_clone_repository()
        .times(1)
        .returning(|_, _| Err(ToolError::Io(std::io::Error::other("network unreachable"))));
    mock.expect_checkout().never();

    let err = fetch(&repo, "github.com", &layout, &mock).await.unwrap_err();
    assert!(matches!(err, FetchError::Clone { .. }), "{err:?}");
}

#[tokio::test]
async fn test_fetch_rejects_invalid_identifiers() {
    let tmp = tempdir().unwrap();
    let layout = Layout::new(tmp.path());
    let toolchain = FakeToolchain::new();

    for (author, repo) in [("", "templates"), ("typst", ""), ("..", "x"), ("a/b", "c")] {
        let err = fetch(&RepositoryRef::new(author, repo), "github.com", &layout, &toolchain)
            .await
            .unwrap_err();
        assert!(
            matches!(err, FetchError::InvalidRepository(_)),
            "{author}/{repo}: {err:?}"
        );
    }
    assert!(toolchain.calls().is_empty());
    assert!(!tmp.path().join("repos").exists());
}
