//! JSON API handlers

use axum::extract::State;
use axum::response::Json;
use lectern_core::LibraryIndex;
use serde_json::{Value, json};

use crate::error::WebError;
use crate::server::AppState;

/// Lists every video in the library tree.
///
/// The tree is rescanned on each call so new files show up without restart.
///
/// # Errors
///
/// - `WebError::Io` - If the library root cannot be read (500)
pub async fn api_library(State(state): State<AppState>) -> Result<Json<LibraryIndex>, WebError> {
    let index = LibraryIndex::scan(state.library.root()).await?;
    Ok(Json(index))
}

/// Liveness probe.
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::handlers::test_support::{body_bytes, get, test_app};

    #[tokio::test]
    async fn test_library_listing_skips_hidden() {
        let (_tree, app) = test_app();

        let response = get(&app, "/api/library", None).await;

        assert_eq!(response.status(), StatusCode::OK);
        let listing: serde_json::Value =
            serde_json::from_slice(&body_bytes(response).await).unwrap();
        let entries = listing.as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["relativePath"], "a/v.mp4");
        assert_eq!(entries[0]["size"], 1000);
    }

    #[tokio::test]
    async fn test_health() {
        let (_tree, app) = test_app();

        let response = get(&app, "/health", None).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_bytes(response).await, br#"{"status":"ok"}"#);
    }
}
