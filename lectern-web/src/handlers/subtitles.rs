//! WebVTT subtitle track handler

use axum::extract::{OriginalUri, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use lectern_core::StreamingError;
use lectern_core::streaming::{convert_srt_to_vtt, find_subtitle_sidecar};
use tracing::debug;

use super::raw_path_after;
use crate::error::WebError;
use crate::server::AppState;

/// Serves the SRT sidecar of a library video converted to WebVTT.
///
/// # Errors
///
/// - `WebError::Streaming` - 403/404 if the video or its sidecar is unavailable
pub async fn subtitle_track(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
) -> Result<Response, WebError> {
    let raw_path = raw_path_after(&uri, "/subtitles/")?;
    let sidecar = find_subtitle_sidecar(&state.library, raw_path).await?;
    debug!("Serving subtitles {} for {}", sidecar.relative, raw_path);

    let srt = tokio::fs::read(&sidecar.absolute)
        .await
        .map_err(StreamingError::StreamIo)?;
    let vtt = convert_srt_to_vtt(&String::from_utf8_lossy(&srt));

    Ok(([(header::CONTENT_TYPE, "text/vtt; charset=utf-8")], vtt).into_response())
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::*;
    use crate::handlers::test_support::{body_bytes, get, test_app};

    #[tokio::test]
    async fn test_sidecar_served_as_vtt() {
        let (_tree, app) = test_app();

        let response = get(&app, "/subtitles/a/v.mp4", None).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/vtt; charset=utf-8"
        );
        let body = String::from_utf8(body_bytes(response).await).unwrap();
        assert_eq!(body, "WEBVTT\n\n1\n00:00:00.500 --> 00:00:02.000\nHello\n");
    }

    #[tokio::test]
    async fn test_missing_video_has_no_subtitles() {
        let (_tree, app) = test_app();

        let response = get(&app, "/subtitles/a/none.mp4", None).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
