use combo_static::config::{AppState, Config};
use combo_static::http::{ServeRequest, ServeResponse};
use combo_static::FsLoader;
use hyper::header::{
    CACHE_CONTROL, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE, ETAG, IF_NONE_MATCH,
    LAST_MODIFIED, RANGE,
};
use hyper::{Method, StatusCode};
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tempfile::TempDir;
use tokio::task::LocalSet;

fn write(path: &Path, body: &str, mtime: SystemTime) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, body).unwrap();
    File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(mtime)
        .unwrap();
}

/// Site layout:
///   <root>/secret.txt
///   <root>/public/js/{a.js,b.js,c.css}
///   <root>/pages/one.html
fn fixture() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let t = |secs| UNIX_EPOCH + Duration::from_secs(secs);
    write(&root.join("secret.txt"), "top secret", t(1_000));
    write(&root.join("public/js/a.js"), "AAAAA", t(2_000_000));
    write(&root.join("public/js/b.js"), "BBB", t(1_000_000));
    write(&root.join("public/js/c.css"), "c{}", t(1_000));
    write(&root.join("pages/one.html"), "<p>one</p>", t(1_000));
    dir
}

fn state(dir: &TempDir, extra: &str) -> AppState {
    let text = format!(
        r#"
        root = "{root}"
        {extra}

        [[groups]]
        name = "js"
        type = "folder"
        path = "public/js"
        max_age = 600

        [[groups]]
        name = "pages"
        type = "map"
        urls = {{ "one.html" = "pages/one.html" }}
        "#,
        root = dir.path().display(),
    );
    let config = Config::from_toml_str(&text).unwrap();
    AppState::new(&config, Arc::new(FsLoader))
}

async fn dispatch(state: &AppState, req: ServeRequest) -> ServeResponse {
    LocalSet::new().run_until(state.router.dispatch(&req)).await
}

#[tokio::test]
async fn combo_joins_files_in_request_order() {
    let dir = fixture();
    let state = state(&dir, "");
    let res = dispatch(&state, ServeRequest::get("/combo?/js/a.js~/js/b.js")).await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body().as_ref(), b"AAAAABBB");
    assert_eq!(res.header(&CONTENT_LENGTH), Some("8"));
    assert_eq!(
        res.header(&CONTENT_TYPE),
        Some("application/javascript; charset=utf-8")
    );
    // a.js is the newest member
    assert_eq!(
        res.header(&LAST_MODIFIED),
        Some("Sat, 24 Jan 1970 03:33:20 GMT")
    );
    assert_eq!(res.header(&ETAG), Some("\"8-2000000000\""));
    assert_eq!(res.header(&CACHE_CONTROL), Some("public, max-age=0"));

    let reversed = dispatch(&state, ServeRequest::get("/combo?/js/b.js~/js/a.js")).await;
    assert_eq!(reversed.body().as_ref(), b"BBBAAAAA");
}

#[tokio::test]
async fn combo_rejects_mixed_content_types() {
    let dir = fixture();
    let state = state(&dir, "");
    let res = dispatch(&state, ServeRequest::get("/combo?/js/a.js~/js/c.css")).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(
        res.body().as_ref(),
        b"Mixing content-types in combo request."
    );
}

#[tokio::test]
async fn combo_without_members_is_not_found() {
    let dir = fixture();
    let state = state(&dir, "");
    let res = dispatch(&state, ServeRequest::get("/combo?")).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.body().as_ref(), b"No files requested.");
}

#[tokio::test]
async fn combo_with_missing_member_is_not_found() {
    let dir = fixture();
    let state = state(&dir, "");
    for url in [
        "/combo?/js/a.js~/js/missing.js",
        "/combo?/js/a.js~/elsewhere/b.js",
        "/combo?/js/a.js~/js/../../secret.js",
    ] {
        let res = dispatch(&state, ServeRequest::get(url)).await;
        assert_eq!(res.status, StatusCode::NOT_FOUND, "{url}");
    }
}

#[tokio::test]
async fn combo_honors_configured_options() {
    let dir = fixture();
    let state = state(
        &dir,
        r#"
        [combo]
        base = "/all:"
        separator = ","
        max_age = "forever"
        "#,
    );
    let res = dispatch(&state, ServeRequest::get("/all:/js/b.js,/js/a.js")).await;
    assert_eq!(res.body().as_ref(), b"BBBAAAAA");
    assert_eq!(
        res.header(&CACHE_CONTROL),
        Some("public, max-age=31536000")
    );

    let old_base = dispatch(&state, ServeRequest::get("/combo?/js/a.js")).await;
    assert_eq!(old_base.status, StatusCode::NOT_FOUND);
    assert_eq!(old_base.body().as_ref(), b"Not Found");
}

#[tokio::test]
async fn combo_can_be_disabled() {
    let dir = fixture();
    let state = state(&dir, "[combo]\nenabled = false");
    assert_eq!(state.router.len(), 2);
    let res = dispatch(&state, ServeRequest::get("/combo?/js/a.js")).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn combo_supports_range_and_head() {
    let dir = fixture();
    let state = state(&dir, "");

    let req = ServeRequest::get("/combo?/js/a.js~/js/b.js").with_header(RANGE, "bytes=3-5");
    let res = dispatch(&state, req).await;
    assert_eq!(res.status, StatusCode::PARTIAL_CONTENT);
    assert_eq!(res.header(&CONTENT_RANGE), Some("bytes 3-5/8"));
    assert_eq!(res.body().as_ref(), b"AAB");

    let req = ServeRequest::get("/combo?/js/a.js~/js/b.js").with_header(RANGE, "bytes=8-");
    let res = dispatch(&state, req).await;
    assert_eq!(res.status, StatusCode::RANGE_NOT_SATISFIABLE);
    assert_eq!(res.header(&CONTENT_RANGE), Some("bytes */8"));

    let req = ServeRequest::new(Method::HEAD, "/combo?/js/a.js~/js/b.js");
    let res = dispatch(&state, req).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.header(&CONTENT_LENGTH), Some("8"));
    assert!(res.body().is_empty());
}

#[tokio::test]
async fn conditional_get_returns_not_modified() {
    let dir = fixture();
    let state = state(&dir, "");

    let first = dispatch(&state, ServeRequest::get("/js/a.js")).await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.header(&CACHE_CONTROL), Some("public, max-age=600"));
    let etag = first.header(&ETAG).unwrap().to_string();

    let req = ServeRequest::get("/js/a.js").with_header(IF_NONE_MATCH, &etag);
    let second = dispatch(&state, req).await;
    assert_eq!(second.status, StatusCode::NOT_MODIFIED);
    assert!(second.body().is_empty());
    assert!(!second.has_header(&CONTENT_TYPE));
    assert!(!second.has_header(&CONTENT_LENGTH));
}

#[tokio::test]
async fn folder_group_blocks_traversal() {
    let dir = fixture();
    let state = state(&dir, "");

    let res = dispatch(&state, ServeRequest::get("/js/../../secret.txt")).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_ne!(res.body().as_ref(), b"top secret");

    let res = dispatch(&state, ServeRequest::get("/js/missing.js")).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn map_group_serves_only_listed_files() {
    let dir = fixture();
    let state = state(&dir, "");

    let res = dispatch(&state, ServeRequest::get("/pages/one.html")).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body().as_ref(), b"<p>one</p>");
    assert_eq!(
        res.header(&CONTENT_TYPE),
        Some("text/html; charset=utf-8")
    );

    let res = dispatch(&state, ServeRequest::get("/pages/two.html")).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[test]
fn groups_are_registered_in_file_order() {
    let dir = fixture();
    let state = state(&dir, "");
    let prefixes: Vec<&str> = state.registry.iter().map(|g| g.prefix.as_str()).collect();
    assert_eq!(prefixes, ["/js/", "/pages/"]);
    assert_eq!(
        state.registry.resolve("/js/a.js"),
        Some(dir.path().join("public/js/a.js"))
    );
    assert_eq!(state.registry.resolve("/js/../js-secret/key.txt"), None);
    assert_eq!(state.registry.resolve("/pages/two.html"), None);
}

#[tokio::test]
async fn other_methods_pass_through() {
    let dir = fixture();
    let state = state(&dir, "");
    for url in ["/js/a.js", "/pages/one.html", "/combo?/js/a.js"] {
        let res = dispatch(&state, ServeRequest::new(Method::POST, url)).await;
        assert_eq!(res.status, StatusCode::NOT_FOUND, "{url}");
    }
}
