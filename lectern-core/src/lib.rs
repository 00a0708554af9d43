//! Lectern Core - Range-aware media delivery for course video
//!
//! This crate provides the building blocks for serving large video files over
//! HTTP: root-confined path resolution, `Range` header parsing, content-type
//! negotiation, bounded file readers and the response state machine that ties
//! them together.

pub mod config;
pub mod storage;
pub mod streaming;
pub mod tracing_setup;

// Re-export main types for convenient access
pub use config::LecternConfig;
pub use storage::{LibraryEntry, LibraryIndex, PathResolver, ResolvedPath, ResourceLocation};
pub use streaming::{
    ByteRange, ByteRangeReader, ContentTypeResolver, OpenRangePolicy, StreamDescriptor,
    StreamingError, StreamingResponder,
};

/// Core errors that can bubble up from any Lectern subsystem.
///
/// Request-level failures are `StreamingError`s; this type additionally
/// covers startup paths such as configuration and directory setup.
#[derive(Debug, thiserror::Error)]
pub enum LecternError {
    #[error("Streaming error: {0}")]
    Streaming(#[from] StreamingError),

    #[error("Configuration error: {reason}")]
    Configuration { reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LecternError {
    /// Returns a user-friendly error message suitable for display.
    pub fn user_message(&self) -> String {
        match self {
            LecternError::Streaming(e) => match e {
                StreamingError::NotFound { path } => format!("File not found: {path}"),
                StreamingError::ForbiddenPath { path } => {
                    format!("Path is outside the configured root: {path}")
                }
                _ => "Streaming error occurred".to_string(),
            },
            LecternError::Configuration { reason } => format!("Invalid configuration: {reason}"),
            LecternError::Io(_) => "File system error occurred".to_string(),
        }
    }

    /// Checks if this error is due to user input validation.
    pub fn is_user_error(&self) -> bool {
        match self {
            LecternError::Configuration { .. } => true,
            LecternError::Streaming(e) => e.is_client_error(),
            LecternError::Io(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, LecternError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_for_missing_file() {
        let error = LecternError::from(StreamingError::NotFound {
            path: "a/v.mp4".to_string(),
        });
        assert_eq!(error.user_message(), "File not found: a/v.mp4");
        assert!(error.is_user_error());
    }

    #[test]
    fn test_io_error_is_not_user_error() {
        let error = LecternError::from(std::io::Error::other("disk gone"));
        assert!(!error.is_user_error());
        assert_eq!(error.user_message(), "File system error occurred");
    }
}
