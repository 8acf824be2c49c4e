//! Dynamic-discovery tests against a local HTTP server.
//!
//! The resolver is exercised in insecure mode so the https probe fails fast
//! against the plain-HTTP test server and falls back to http.

use stowage_resolver::{Resolver, ResolverError, SecurityMode};
use stowage_vcs::VcsKind;

fn meta_page(prefix: &str, vcs: &str, repo: &str) -> String {
    format!(
        "<html><head><meta name=\"go-import\" content=\"{prefix} {vcs} {repo}\"></head><body>ok</body></html>"
    )
}

fn unwrap_dynamic(err: &ResolverError) -> &ResolverError {
    match err {
        ResolverError::UnknownSite { source, .. } => source,
        other => other,
    }
}

#[test]
fn discovers_repo_from_meta_tag() {
    let mut server = mockito::Server::new();
    let host = server.host_with_port();
    let import_path = format!("{host}/pkg/foo");

    let mock = server
        .mock("GET", "/pkg/foo")
        .with_body(meta_page(&import_path, "git", "https://git.example.org/foo"))
        .expect(1)
        .create();

    let resolver = Resolver::new().unwrap();
    let root = resolver
        .resolve(&import_path, SecurityMode::Insecure)
        .unwrap();
    assert_eq!(root.kind, VcsKind::Git);
    assert_eq!(root.repo, "https://git.example.org/foo");
    assert_eq!(root.root, import_path);
    mock.assert();
}

#[test]
fn shorter_prefix_is_verified_and_memoized() {
    let mut server = mockito::Server::new();
    let host = server.host_with_port();
    let prefix = format!("{host}/x");
    let page = meta_page(&prefix, "git", "https://git.example.org/x");

    let _leaf_a = server
        .mock("GET", "/x/a")
        .with_body(page.clone())
        .expect(1)
        .create();
    let _leaf_b = server
        .mock("GET", "/x/b")
        .with_body(page.clone())
        .expect(1)
        .create();
    // The verification fetch for the shared prefix must happen exactly once
    // for the lifetime of the resolver.
    let prefix_mock = server
        .mock("GET", "/x")
        .with_body(page)
        .expect(1)
        .create();

    let resolver = Resolver::new().unwrap();
    for leaf in ["a", "b"] {
        let root = resolver
            .resolve(&format!("{prefix}/{leaf}"), SecurityMode::Insecure)
            .unwrap();
        assert_eq!(root.root, prefix);
    }
    prefix_mock.assert();
}

#[test]
fn disagreeing_prefix_discovery_fails() {
    let mut server = mockito::Server::new();
    let host = server.host_with_port();
    let prefix = format!("{host}/proj");
    let import_path = format!("{prefix}/sub");

    let _leaf = server
        .mock("GET", "/proj/sub")
        .with_body(meta_page(&prefix, "git", "https://evilroot.example.org/proj"))
        .create();
    let _prefix = server
        .mock("GET", "/proj")
        .with_body(meta_page(&prefix, "git", "https://git.example.org/proj"))
        .create();

    let resolver = Resolver::new().unwrap();
    let err = resolver
        .resolve(&import_path, SecurityMode::Insecure)
        .unwrap_err();
    assert!(matches!(
        unwrap_dynamic(&err),
        ResolverError::DiscoveryMismatch { .. }
    ));
}

#[test]
fn multiple_matching_tags_are_ambiguous() {
    let mut server = mockito::Server::new();
    let host = server.host_with_port();
    let import_path = format!("{host}/pkg/foo");

    let body = format!(
        "<head>\
         <meta name=\"go-import\" content=\"{host}/pkg git https://one.example.org\">\
         <meta name=\"go-import\" content=\"{host}/pkg/foo git https://two.example.org\">\
         </head>"
    );
    let _mock = server.mock("GET", "/pkg/foo").with_body(body).create();

    let resolver = Resolver::new().unwrap();
    let err = resolver
        .resolve(&import_path, SecurityMode::Insecure)
        .unwrap_err();
    assert!(matches!(
        unwrap_dynamic(&err),
        ResolverError::Ambiguous { .. }
    ));
}

#[test]
fn repo_root_without_scheme_is_rejected() {
    let mut server = mockito::Server::new();
    let host = server.host_with_port();
    let import_path = format!("{host}/pkg/foo");

    let _mock = server
        .mock("GET", "/pkg/foo")
        .with_body(meta_page(&import_path, "git", "git.example.org/foo"))
        .create();

    let resolver = Resolver::new().unwrap();
    let err = resolver
        .resolve(&import_path, SecurityMode::Insecure)
        .unwrap_err();
    assert!(matches!(
        unwrap_dynamic(&err),
        ResolverError::NoScheme { .. }
    ));
}

#[test]
fn page_without_tags_is_unknown_site() {
    let mut server = mockito::Server::new();
    let host = server.host_with_port();
    let import_path = format!("{host}/pkg/foo");

    let _mock = server
        .mock("GET", "/pkg/foo")
        .with_body("<html><head><title>nothing here</title></head></html>")
        .create();

    let resolver = Resolver::new().unwrap();
    let err = resolver
        .resolve(&import_path, SecurityMode::Insecure)
        .unwrap_err();
    assert!(matches!(err, ResolverError::UnknownSite { .. }));
    assert!(matches!(
        unwrap_dynamic(&err),
        ResolverError::NoMetaTag { .. }
    ));
}

#[test]
fn memoized_discovery_failure_is_replayed() {
    let mut server = mockito::Server::new();
    let host = server.host_with_port();
    let prefix = format!("{host}/gone");
    let import_path = format!("{prefix}/pkg");

    let _leaf = server
        .mock("GET", "/gone/pkg")
        .with_body(meta_page(&prefix, "git", "https://git.example.org/gone"))
        .expect(2)
        .create();
    // The prefix page serves no tags; the failure is memoized and the page
    // is never fetched again.
    let prefix_mock = server
        .mock("GET", "/gone")
        .with_body("<html><head></head></html>")
        .expect(1)
        .create();

    let resolver = Resolver::new().unwrap();
    for _ in 0..2 {
        let err = resolver
            .resolve(&import_path, SecurityMode::Insecure)
            .unwrap_err();
        assert!(matches!(
            unwrap_dynamic(&err),
            ResolverError::Discovery { .. }
        ));
    }
    prefix_mock.assert();
}
