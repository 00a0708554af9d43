//! Errors surfaced by the web layer.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use lectern_core::{LecternError, StreamingError};
use thiserror::Error;
use tracing::{error, warn};

/// Failures of a handler or of server startup.
#[derive(Debug, Error)]
pub enum WebError {
    /// Request-level streaming failure, mapped to its own status code.
    #[error(transparent)]
    Streaming(#[from] StreamingError),

    /// A Drive file id failed validation.
    #[error("Invalid Drive file id: {file_id}")]
    InvalidDriveId {
        /// Rejected id as received.
        file_id: String,
    },

    /// Startup failure from the core crate (configuration, roots).
    #[error(transparent)]
    Core(#[from] LecternError),

    /// Socket or filesystem failure outside a streaming request.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        match self {
            WebError::Streaming(e) => e.into_response(),
            WebError::InvalidDriveId { file_id } => {
                warn!("Rejecting Drive file id {:?}", file_id);
                StatusCode::BAD_REQUEST.into_response()
            }
            WebError::Core(e) => {
                error!("Request failed: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
            WebError::Io(e) => {
                error!("Request failed with I/O error: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let not_found = WebError::from(StreamingError::NotFound {
            path: "x".to_string(),
        });
        let drive = WebError::InvalidDriveId {
            file_id: "short".to_string(),
        };
        let io = WebError::from(std::io::Error::other("disk"));

        assert_eq!(not_found.into_response().status(), StatusCode::NOT_FOUND);
        assert_eq!(drive.into_response().status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            io.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
