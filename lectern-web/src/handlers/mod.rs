//! HTTP request handlers organized by functionality

pub mod api;
pub mod drive;
pub mod streaming;
pub mod subtitles;

use axum::http::{HeaderMap, Uri, header};
use lectern_core::StreamingError;

// Re-export handler functions
pub use api::{api_library, health};
pub use drive::{drive_embed, drive_stream};
pub use streaming::{VideoInfo, stream_library, stream_upload, video_info};
pub use subtitles::subtitle_track;

/// Value of the `Range` header, if present and visible ASCII.
pub(crate) fn range_header(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::RANGE)
        .and_then(|value| value.to_str().ok())
}

/// Still-encoded request path after a route prefix such as `/library/`.
///
/// Handlers resolve this raw tail themselves so that percent-decoding happens
/// exactly once, inside the path resolver.
pub(crate) fn raw_path_after<'a>(
    uri: &'a Uri,
    prefix: &str,
) -> Result<&'a str, StreamingError> {
    uri.path()
        .strip_prefix(prefix)
        .ok_or_else(|| StreamingError::NotFound {
            path: uri.path().to_string(),
        })
}

#[cfg(test)]
pub(crate) mod test_support {
    use axum::Router;
    use axum::body::Body;
    use axum::http::{Request, Response};
    use lectern_core::config::LecternConfig;
    use lectern_core::storage::test_fixtures::{MediaTree, create_media_tree};
    use tower::ServiceExt;

    use crate::server::{AppState, build_router};

    pub(crate) fn test_app() -> (MediaTree, Router) {
        let tree = create_media_tree();
        let config = LecternConfig::with_roots(&tree.library_root, &tree.upload_dir);
        let state = AppState::new(config).unwrap();
        (tree, build_router(state))
    }

    pub(crate) async fn get(app: &Router, uri: &str, range: Option<&str>) -> Response<Body> {
        let mut request = Request::builder().uri(uri);
        if let Some(range) = range {
            request = request.header("range", range);
        }
        app.clone()
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    pub(crate) async fn body_bytes(response: Response<Body>) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_range_header_extraction() {
        let mut headers = HeaderMap::new();
        assert_eq!(range_header(&headers), None);

        headers.insert(header::RANGE, HeaderValue::from_static("bytes=0-1"));
        assert_eq!(range_header(&headers), Some("bytes=0-1"));
    }

    #[test]
    fn test_raw_path_keeps_encoding() {
        let uri: Uri = "/library/a/..%2F..%2Fsecret.txt".parse().unwrap();

        assert_eq!(
            raw_path_after(&uri, "/library/").unwrap(),
            "a/..%2F..%2Fsecret.txt"
        );
        assert!(raw_path_after(&uri, "/stream/").is_err());
    }
}
