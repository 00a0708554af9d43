//! Library listing, video info, subtitles and Drive routes.

use axum::http::{StatusCode, header};

use crate::support::{body_bytes, get, test_app};

async fn json(app: &axum::Router, uri: &str) -> serde_json::Value {
    let response = get(app, uri, None).await;
    assert_eq!(response.status(), StatusCode::OK, "{uri}");
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

#[tokio::test]
async fn test_listing_entries_are_streamable() {
    let (tree, app) = test_app();
    std::fs::create_dir_all(tree.library_root.join("b/Module 2")).unwrap();
    std::fs::write(tree.library_root.join("b/Module 2/next_lesson.webm"), b"webm").unwrap();

    let listing = json(&app, "/api/library").await;
    let entries = listing.as_array().unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1]["relativePath"], "b/Module 2/next_lesson.webm");
    assert_eq!(entries[1]["title"], "next lesson");
    assert_eq!(entries[1]["contentType"], "video/webm");

    let response = get(&app, "/library/b/Module%202/next_lesson.webm", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"webm");
}

#[tokio::test]
async fn test_video_info_for_upload() {
    let (_tree, app) = test_app();

    let info = json(&app, "/api/videos/v.mp4/info").await;

    assert_eq!(info["filename"], "v.mp4");
    assert_eq!(info["size"], 1000);
    assert_eq!(info["contentType"], "video/mp4");
}

#[tokio::test]
async fn test_subtitles_converted_to_vtt() {
    let (_tree, app) = test_app();

    let response = get(&app, "/subtitles/a/v.mp4", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(body.starts_with("WEBVTT\n\n"));
    assert!(body.contains("00:00:00.500 --> 00:00:02.000"));
}

#[tokio::test]
async fn test_drive_redirect_and_validation() {
    let (_tree, app) = test_app();

    let response = get(&app, "/drive/stream/1a2B3c4D5e6F", None).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        response.headers()[header::LOCATION],
        "https://drive.google.com/uc?export=download&id=1a2B3c4D5e6F"
    );

    for uri in ["/drive/stream/short", "/drive/embed/has%2Fslash%2Finside"] {
        let response = get(&app, uri, None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
    }
}

#[tokio::test]
async fn test_health() {
    let (_tree, app) = test_app();

    let response = get(&app, "/health", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, br#"{"status":"ok"}"#);
}
