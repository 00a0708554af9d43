//! Shared setup for router-level tests.

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use lectern_core::config::LecternConfig;
use lectern_core::storage::test_fixtures::{MediaTree, create_media_tree};
use lectern_core::streaming::OpenRangePolicy;
use lectern_web::{AppState, build_router};
use tower::ServiceExt;

/// Router over a fresh media tree with default streaming settings.
pub fn test_app() -> (MediaTree, Router) {
    test_app_with_policy(OpenRangePolicy::ToEnd)
}

/// Router over a fresh media tree with a specific open-range policy.
pub fn test_app_with_policy(policy: OpenRangePolicy) -> (MediaTree, Router) {
    let tree = create_media_tree();
    let mut config = LecternConfig::with_roots(&tree.library_root, &tree.upload_dir);
    config.streaming.open_range_policy = policy;
    config.streaming.read_chunk_size = 64;
    let state = AppState::new(config).unwrap();
    (tree, build_router(state))
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    range: Option<&str>,
) -> Response<Body> {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(range) = range {
        request = request.header("range", range);
    }
    app.clone()
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn get(app: &Router, uri: &str, range: Option<&str>) -> Response<Body> {
    send(app, Method::GET, uri, range).await
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}
