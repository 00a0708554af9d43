//! Requests must never reach files outside the configured roots.

use axum::http::StatusCode;

use crate::support::{body_bytes, get, test_app};

#[tokio::test]
async fn test_literal_traversal_is_forbidden() {
    let (_tree, app) = test_app();

    let response = get(&app, "/library/../../../etc/passwd", None).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(body_bytes(response).await.is_empty());
}

#[tokio::test]
async fn test_encoded_traversal_is_forbidden() {
    let (_tree, app) = test_app();

    for uri in [
        "/library/..%2Fsecret.txt",
        "/library/a/..%2F..%2Fsecret.txt",
        "/library/%2e%2e/secret.txt",
        "/library/a%5C..%5C..%5Csecret.txt",
        "/library/%2Fetc%2Fpasswd",
        "/subtitles/..%2Fsecret.txt",
    ] {
        let response = get(&app, uri, None).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "{uri}");
    }
}

#[tokio::test]
async fn test_upload_surface_is_confined() {
    let (_tree, app) = test_app();

    let response = get(&app, "/stream/..%2Fsecret.txt", None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // The library tree is a sibling of the upload store, not a child.
    let response = get(&app, "/stream/..%2Flibrary%2Fa%2Fv.mp4", None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_dot_segments_staying_inside_are_served() {
    let (tree, app) = test_app();

    let response = get(&app, "/library/a/./x/../v.mp4", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, tree.sample);
}

#[tokio::test]
async fn test_missing_and_directory_targets_are_not_found() {
    let (_tree, app) = test_app();

    for uri in ["/library/a/missing.mp4", "/library/a", "/stream/missing.mp4"] {
        let response = get(&app, uri, None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
    }
}

#[tokio::test]
async fn test_undecodable_path_is_bad_request() {
    let (_tree, app) = test_app();

    let response = get(&app, "/library/a/%FF.mp4", None).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[cfg(unix)]
#[tokio::test]
async fn test_symlink_out_of_root_is_forbidden() {
    let (tree, app) = test_app();
    std::os::unix::fs::symlink(
        tree.temp_dir.path().join("secret.txt"),
        tree.library_root.join("a/escape.mp4"),
    )
    .unwrap();

    let response = get(&app, "/library/a/escape.mp4", None).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
