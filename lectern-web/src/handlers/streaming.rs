//! Range-aware video streaming handlers

use axum::extract::{OriginalUri, Path, State};
use axum::http::HeaderMap;
use axum::response::{Json, Response};
use serde::Serialize;
use tracing::debug;

use super::{range_header, raw_path_after};
use crate::error::WebError;
use crate::server::AppState;

/// Metadata of an uploaded video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoInfo {
    /// File name as stored.
    pub filename: String,
    /// Size in bytes.
    pub size: u64,
    /// MIME type the stream endpoint would send.
    pub content_type: String,
}

/// Streams a file from the upload store.
///
/// # Errors
///
/// - `WebError::Streaming` - 400/403/404/416 per the failed stage
pub async fn stream_upload(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, WebError> {
    debug!(
        "Upload stream request for {} (range {:?})",
        id,
        range_header(&headers)
    );

    let stream = state
        .upload_responder()
        .resolve_decoded(&id)
        .await?
        .classify(range_header(&headers))?;

    Ok(stream.into_response())
}

/// Streams a file from the library tree.
///
/// The path is taken from the raw request URI so that encoded separators and
/// dot segments reach the resolver untouched.
///
/// # Errors
///
/// - `WebError::Streaming` - 400/403/404/416 per the failed stage
pub async fn stream_library(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
) -> Result<Response, WebError> {
    let raw_path = raw_path_after(&uri, "/library/")?;
    debug!(
        "Library stream request for {} (range {:?})",
        raw_path,
        range_header(&headers)
    );

    let stream = state
        .library_responder()
        .resolve(raw_path)
        .await?
        .classify(range_header(&headers))?;

    Ok(stream.into_response())
}

/// Describes an uploaded video without streaming it.
///
/// # Errors
///
/// - `WebError::Streaming` - 403/404 if the upload cannot be resolved
pub async fn video_info(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<VideoInfo>, WebError> {
    let resolved = state.upload_responder().resolve_decoded(&id).await?;

    Ok(Json(VideoInfo {
        filename: resolved.path().file_name.clone(),
        size: resolved.total_size(),
        content_type: resolved.content_type().to_string(),
    }))
}
