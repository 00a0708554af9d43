//! Range request handling on both streaming surfaces.

use axum::http::{Method, StatusCode, header};
use lectern_core::streaming::OpenRangePolicy;
use proptest::prelude::*;

use crate::support::{body_bytes, get, send, test_app, test_app_with_policy};

#[tokio::test]
async fn test_bounded_range_returns_exact_slice() {
    let (tree, app) = test_app();

    for uri in ["/library/a/v.mp4", "/stream/v.mp4"] {
        let response = get(&app, uri, Some("bytes=100-199")).await;

        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT, "{uri}");
        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_RANGE], "bytes 100-199/1000");
        assert_eq!(headers[header::CONTENT_LENGTH], "100");
        assert_eq!(headers[header::ACCEPT_RANGES], "bytes");
        assert_eq!(headers[header::CONTENT_TYPE], "video/mp4");
        assert_eq!(body_bytes(response).await, &tree.sample[100..200]);
    }
}

#[tokio::test]
async fn test_no_range_returns_whole_file() {
    let (tree, app) = test_app();

    let response = get(&app, "/library/a/v.mp4", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_LENGTH], "1000");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "inline; filename=\"v.mp4\""
    );
    assert!(response.headers().get(header::CONTENT_RANGE).is_none());
    assert_eq!(body_bytes(response).await, tree.sample);
}

#[tokio::test]
async fn test_open_range_of_last_byte() {
    let (tree, app) = test_app();

    let response = get(&app, "/library/a/v.mp4", Some("bytes=999-")).await;

    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(
        response.headers()[header::CONTENT_RANGE],
        "bytes 999-999/1000"
    );
    assert_eq!(body_bytes(response).await, &tree.sample[999..]);
}

#[tokio::test]
async fn test_suffix_range_serves_tail() {
    let (tree, app) = test_app();

    let response = get(&app, "/stream/v.mp4", Some("bytes=-100")).await;

    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(
        response.headers()[header::CONTENT_RANGE],
        "bytes 900-999/1000"
    );
    assert_eq!(body_bytes(response).await, &tree.sample[900..]);
}

#[tokio::test]
async fn test_range_past_end_is_unsatisfiable() {
    let (_tree, app) = test_app();

    let response = get(&app, "/library/a/v.mp4", Some("bytes=2000-3000")).await;

    assert_eq!(response.status(), StatusCode::RANGE_NOT_SATISFIABLE);
    assert_eq!(response.headers()[header::CONTENT_RANGE], "bytes */1000");
    assert!(body_bytes(response).await.is_empty());
}

#[tokio::test]
async fn test_oversized_end_is_clamped() {
    let (tree, app) = test_app();

    let response = get(&app, "/library/a/v.mp4", Some("bytes=990-5000")).await;

    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(
        response.headers()[header::CONTENT_RANGE],
        "bytes 990-999/1000"
    );
    assert_eq!(body_bytes(response).await, &tree.sample[990..]);
}

#[tokio::test]
async fn test_malformed_range_falls_back_to_full_body() {
    let (tree, app) = test_app();

    for range in ["bytes=abc", "items=0-10", "bytes=", "bytes=10-5x"] {
        let response = get(&app, "/library/a/v.mp4", Some(range)).await;

        assert_eq!(response.status(), StatusCode::OK, "{range}");
        assert_eq!(body_bytes(response).await, tree.sample);
    }
}

#[tokio::test]
async fn test_multi_range_is_rejected() {
    let (_tree, app) = test_app();

    let response = get(&app, "/library/a/v.mp4", Some("bytes=0-1,5-6")).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_chunked_open_range_policy_on_both_surfaces() {
    let (tree, app) = test_app_with_policy(OpenRangePolicy::Chunk(256));

    for uri in ["/library/a/v.mp4", "/stream/v.mp4"] {
        let response = get(&app, uri, Some("bytes=100-")).await;

        assert_eq!(
            response.headers()[header::CONTENT_RANGE],
            "bytes 100-355/1000",
            "{uri}"
        );
        assert_eq!(body_bytes(response).await, &tree.sample[100..356]);
    }
}

#[tokio::test]
async fn test_repeated_request_is_identical() {
    let (_tree, app) = test_app();

    let first = get(&app, "/library/a/v.mp4", Some("bytes=10-500")).await;
    let second = get(&app, "/library/a/v.mp4", Some("bytes=10-500")).await;

    assert_eq!(first.status(), second.status());
    assert_eq!(
        first.headers()[header::CONTENT_RANGE],
        second.headers()[header::CONTENT_RANGE]
    );
    assert_eq!(body_bytes(first).await, body_bytes(second).await);
}

#[tokio::test]
async fn test_head_has_headers_without_body() {
    let (_tree, app) = test_app();

    let response = send(&app, Method::HEAD, "/library/a/v.mp4", Some("bytes=0-99")).await;

    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(response.headers()[header::CONTENT_LENGTH], "100");
    assert!(body_bytes(response).await.is_empty());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_any_valid_range_yields_source_slice(start in 0u64..1000, len in 1u64..1000) {
        let end = (start + len - 1).min(999);
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        let (status, body, sample) = runtime.block_on(async {
            let (tree, app) = test_app();
            let range = format!("bytes={start}-{end}");
            let response = get(&app, "/library/a/v.mp4", Some(&range)).await;
            let status = response.status();
            (status, body_bytes(response).await, tree.sample.clone())
        });

        prop_assert_eq!(status, StatusCode::PARTIAL_CONTENT);
        prop_assert_eq!(body.len() as u64, end - start + 1);
        prop_assert_eq!(&body[..], &sample[start as usize..=end as usize]);
    }
}
