//! Redirects to videos hosted on Google Drive

use axum::extract::Path;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use tracing::info;

use crate::error::WebError;

const DRIVE_DOWNLOAD_URL: &str = "https://drive.google.com/uc?export=download&id=";
const DRIVE_PREVIEW_URL: &str = "https://drive.google.com/file/d/";

/// Drive ids are long opaque tokens; anything shorter is a typo.
const MIN_DRIVE_ID_LEN: usize = 10;

fn validate_drive_id(file_id: &str) -> Result<(), WebError> {
    let well_formed = file_id.len() >= MIN_DRIVE_ID_LEN
        && file_id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');

    if well_formed {
        Ok(())
    } else {
        Err(WebError::InvalidDriveId {
            file_id: file_id.to_string(),
        })
    }
}

/// Redirects the player to Drive's direct download URL.
///
/// # Errors
///
/// - `WebError::InvalidDriveId` - If the id is malformed (400)
pub async fn drive_stream(Path(file_id): Path<String>) -> Result<Response, WebError> {
    validate_drive_id(&file_id)?;
    info!("Redirecting to Drive file {}", file_id);

    let location = format!("{DRIVE_DOWNLOAD_URL}{file_id}");
    Ok((StatusCode::FOUND, [(header::LOCATION, location)]).into_response())
}

/// Returns the Drive preview URL suitable for an iframe.
///
/// # Errors
///
/// - `WebError::InvalidDriveId` - If the id is malformed (400)
pub async fn drive_embed(Path(file_id): Path<String>) -> Result<Response, WebError> {
    validate_drive_id(&file_id)?;

    let url = format!("{DRIVE_PREVIEW_URL}{file_id}/preview");
    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], url).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::{body_bytes, get, test_app};

    #[test]
    fn test_drive_id_validation() {
        assert!(validate_drive_id("1AbC-def_GHIjkl").is_ok());
        assert!(validate_drive_id("short").is_err());
        assert!(validate_drive_id("1AbCdefGHI/../x").is_err());
        assert!(validate_drive_id("1AbCdefGHI?x=1").is_err());
    }

    #[tokio::test]
    async fn test_stream_redirects() {
        let (_tree, app) = test_app();

        let response = get(&app, "/drive/stream/1AbCdefGHIjk", None).await;

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers()[header::LOCATION],
            "https://drive.google.com/uc?export=download&id=1AbCdefGHIjk"
        );
    }

    #[tokio::test]
    async fn test_embed_and_invalid_id() {
        let (_tree, app) = test_app();

        let embed = get(&app, "/drive/embed/1AbCdefGHIjk", None).await;
        assert_eq!(embed.status(), StatusCode::OK);
        assert_eq!(
            body_bytes(embed).await,
            b"https://drive.google.com/file/d/1AbCdefGHIjk/preview"
        );

        let invalid = get(&app, "/drive/stream/abc", None).await;
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
    }
}
