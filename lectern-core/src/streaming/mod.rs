//! Range-aware media delivery.
//!
//! A request flows through a fixed pipeline: the storage layer resolves the
//! target inside its root, `range` interprets the `Range` header against the
//! file size, `content_type` picks the MIME type from the file name and
//! `responder` assembles status, headers and a lazily read body produced by
//! `range_reader`.

pub mod content_type;
pub mod descriptor;
pub mod range;
pub mod range_reader;
pub mod responder;
pub mod subtitles;

use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
pub use content_type::{ContentTypeResolver, FallbackType};
pub use descriptor::StreamDescriptor;
pub use range::{ByteRange, OpenRangePolicy, parse_range_header};
pub use range_reader::ByteRangeReader;
pub use responder::{ClassifiedStream, ResolvedStream, StreamingResponder};
pub use subtitles::{convert_srt_to_vtt, find_subtitle_sidecar};
use thiserror::Error;

/// Errors produced while resolving, classifying or streaming a media file.
///
/// Every variant is terminal for the request it occurred in; nothing here is
/// retried by the server.
#[derive(Debug, Error)]
pub enum StreamingError {
    /// Request input could not be interpreted (undecodable path, multi-range).
    #[error("Bad request: {reason}")]
    BadRequest {
        /// What was wrong with the request.
        reason: String,
    },

    /// Resolution escaped the configured root directory.
    #[error("Path escapes root directory: {path}")]
    ForbiddenPath {
        /// The offending path as supplied by the caller.
        path: String,
    },

    /// Target does not exist or is not a readable regular file.
    #[error("File not found: {path}")]
    NotFound {
        /// The path that could not be served.
        path: String,
    },

    /// Requested range starts beyond the end of the resource.
    #[error("Range not satisfiable for resource of {total_size} bytes")]
    RangeNotSatisfiable {
        /// Total size of the resource, echoed in `Content-Range: bytes */N`.
        total_size: u64,
    },

    /// Read failure after streaming started.
    #[error("Stream I/O error: {0}")]
    StreamIo(#[from] std::io::Error),
}

pub type StreamingResult<T> = Result<T, StreamingError>;

impl StreamingError {
    /// HTTP status this error maps to.
    pub fn status_code(&self) -> StatusCode {
        match self {
            StreamingError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            StreamingError::ForbiddenPath { .. } => StatusCode::FORBIDDEN,
            StreamingError::NotFound { .. } => StatusCode::NOT_FOUND,
            StreamingError::RangeNotSatisfiable { .. } => StatusCode::RANGE_NOT_SATISFIABLE,
            StreamingError::StreamIo(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the failure was caused by the request rather than the server.
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

impl IntoResponse for StreamingError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Streaming request failed: {self}");
        } else {
            tracing::debug!("Rejecting streaming request: {self}");
        }

        match self {
            StreamingError::RangeNotSatisfiable { total_size } => {
                let content_range = HeaderValue::from_str(&format!("bytes */{total_size}"))
                    .unwrap_or_else(|_| HeaderValue::from_static("bytes */0"));
                (status, [(header::CONTENT_RANGE, content_range)]).into_response()
            }
            _ => status.into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (
                StreamingError::BadRequest {
                    reason: "x".to_string(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                StreamingError::ForbiddenPath {
                    path: "../x".to_string(),
                },
                StatusCode::FORBIDDEN,
            ),
            (
                StreamingError::NotFound {
                    path: "x".to_string(),
                },
                StatusCode::NOT_FOUND,
            ),
            (
                StreamingError::RangeNotSatisfiable { total_size: 10 },
                StatusCode::RANGE_NOT_SATISFIABLE,
            ),
            (
                StreamingError::StreamIo(std::io::Error::other("boom")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.status_code(), expected);
        }
    }

    #[tokio::test]
    async fn test_range_not_satisfiable_response_has_no_body() {
        let response = StreamingError::RangeNotSatisfiable { total_size: 1000 }.into_response();

        assert_eq!(response.status(), StatusCode::RANGE_NOT_SATISFIABLE);
        assert_eq!(
            response.headers().get(header::CONTENT_RANGE).unwrap(),
            "bytes */1000"
        );
        let body = axum::body::to_bytes(response.into_body(), 1024)
            .await
            .unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_forbidden_response_has_no_body() {
        let response = StreamingError::ForbiddenPath {
            path: "../../etc/passwd".to_string(),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = axum::body::to_bytes(response.into_body(), 1024)
            .await
            .unwrap();
        assert!(body.is_empty());
    }
}
