//! HTTP server for Lectern
//!
//! Wires the streaming handlers into an axum router and runs it on the
//! configured address. Application state is read-only after startup.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use lectern_core::config::LecternConfig;
use lectern_core::streaming::ContentTypeResolver;
use lectern_core::{LecternError, PathResolver, StreamingResponder};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::WebError;
use crate::handlers::{
    api_library, drive_embed, drive_stream, health, stream_library, stream_upload,
    subtitle_track, video_info,
};

/// Shared, immutable state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Effective configuration.
    pub config: Arc<LecternConfig>,
    /// Resolver confined to the library tree.
    pub library: Arc<PathResolver>,
    /// Resolver confined to the upload store.
    pub uploads: Arc<PathResolver>,
    /// Content types for library files (unknown extensions are video).
    pub library_types: Arc<ContentTypeResolver>,
    /// Content types for uploads (unknown extensions are binary).
    pub upload_types: Arc<ContentTypeResolver>,
}

impl AppState {
    /// Builds state from configuration.
    ///
    /// The upload directory is created if missing; the library root must
    /// already exist.
    ///
    /// # Errors
    ///
    /// - `LecternError::Configuration` - If validation fails or a root is unusable
    /// - `LecternError::Io` - If the upload directory cannot be created
    pub fn new(config: LecternConfig) -> Result<Self, LecternError> {
        config.validate()?;
        std::fs::create_dir_all(&config.library.upload_dir)?;

        let library = root_resolver(&config.library.library_root, "library_root")?;
        let uploads = root_resolver(&config.library.upload_dir, "upload_dir")?;

        Ok(Self {
            config: Arc::new(config),
            library: Arc::new(library),
            uploads: Arc::new(uploads),
            library_types: Arc::new(ContentTypeResolver::for_library()),
            upload_types: Arc::new(ContentTypeResolver::for_uploads()),
        })
    }

    /// Responder over the library tree using the configured policies.
    pub fn library_responder(&self) -> StreamingResponder<'_> {
        self.responder(&self.library, &self.library_types)
    }

    /// Responder over the upload store using the configured policies.
    pub fn upload_responder(&self) -> StreamingResponder<'_> {
        self.responder(&self.uploads, &self.upload_types)
    }

    fn responder<'a>(
        &'a self,
        resolver: &'a PathResolver,
        content_types: &'a ContentTypeResolver,
    ) -> StreamingResponder<'a> {
        StreamingResponder::new(resolver, content_types)
            .with_open_range_policy(self.config.streaming.open_range_policy)
            .with_chunk_size(self.config.streaming.read_chunk_size)
    }
}

fn root_resolver(
    path: &std::path::Path,
    setting: &str,
) -> Result<PathResolver, LecternError> {
    PathResolver::new(path).map_err(|e| LecternError::Configuration {
        reason: format!("{setting} {} is not a usable directory: {e}", path.display()),
    })
}

/// Builds the application router.
///
/// Every `GET` route also answers `HEAD`.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Media streaming
        .route("/stream/{id}", get(stream_upload))
        .route("/library/{*path}", get(stream_library))
        .route("/subtitles/{*path}", get(subtitle_track))
        // Remote Drive files
        .route("/drive/stream/{file_id}", get(drive_stream))
        .route("/drive/embed/{file_id}", get(drive_embed))
        // JSON API
        .route("/api/videos/{id}/info", get(video_info))
        .route("/api/library", get(api_library))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Runs the server until the listener fails.
///
/// # Errors
///
/// - `WebError::Core` - If the configuration or roots are invalid
/// - `WebError::Io` - If the address cannot be bound or serving fails
pub async fn run_server(config: LecternConfig) -> Result<(), WebError> {
    let address = config.server.listen_address();
    let state = AppState::new(config)?;

    info!(
        "Serving library {} and uploads {}",
        state.library.root().display(),
        state.uploads.root().display()
    );

    let app = build_router(state.clone());
    let listener = tokio::net::TcpListener::bind((
        state.config.server.host.as_str(),
        state.config.server.port,
    ))
    .await?;

    info!("Lectern media server running on http://{}", address);
    axum::serve(listener, app).await?;
    Ok(())
}
