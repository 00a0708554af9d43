//! Request-scoped state machine turning a path and a `Range` header into a
//! media response.
//!
//! `StreamingResponder` (idle) → `ResolvedStream` → `ClassifiedStream` →
//! response. Every transition consumes its input, so an instance cannot be
//! reused across requests and the open file handle always has exactly one
//! owner.

use std::time::SystemTime;

use axum::body::Body;
use axum::http::{Response, StatusCode};
use axum::response::IntoResponse;
use tokio::fs::File;
use tracing::{debug, warn};

use super::{
    ByteRangeReader, ContentTypeResolver, OpenRangePolicy, StreamDescriptor, StreamingError,
    StreamingResult, parse_range_header,
};
use crate::config::DEFAULT_READ_CHUNK_SIZE;
use crate::storage::{PathResolver, ResolvedPath};

/// Idle state: knows where to look and how to classify, has touched nothing.
#[derive(Debug, Clone, Copy)]
pub struct StreamingResponder<'a> {
    resolver: &'a PathResolver,
    content_types: &'a ContentTypeResolver,
    open_range_policy: OpenRangePolicy,
    chunk_size: usize,
}

impl<'a> StreamingResponder<'a> {
    pub fn new(resolver: &'a PathResolver, content_types: &'a ContentTypeResolver) -> Self {
        Self {
            resolver,
            content_types,
            open_range_policy: OpenRangePolicy::ToEnd,
            chunk_size: DEFAULT_READ_CHUNK_SIZE,
        }
    }

    pub fn with_open_range_policy(mut self, policy: OpenRangePolicy) -> Self {
        self.open_range_policy = policy;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Resolves and opens a raw (URL-encoded) path.
    ///
    /// # Errors
    ///
    /// - `StreamingError::BadRequest` - Path cannot be decoded
    /// - `StreamingError::ForbiddenPath` - Path escapes the root
    /// - `StreamingError::NotFound` - Missing, not a regular file, or unreadable
    pub async fn resolve(self, raw_path: &str) -> StreamingResult<ResolvedStream> {
        let resolved = self.resolver.resolve(raw_path).await?;
        self.open(resolved).await
    }

    /// Resolves and opens a path that was already percent-decoded.
    ///
    /// # Errors
    ///
    /// Same as [`StreamingResponder::resolve`], minus decoding failures.
    pub async fn resolve_decoded(self, path: &str) -> StreamingResult<ResolvedStream> {
        let resolved = self.resolver.resolve_decoded(path).await?;
        self.open(resolved).await
    }

    async fn open(self, path: ResolvedPath) -> StreamingResult<ResolvedStream> {
        let not_readable = |e: std::io::Error| {
            debug!("Cannot open {}: {}", path.absolute.display(), e);
            StreamingError::NotFound {
                path: path.relative.clone(),
            }
        };

        let file = File::open(&path.absolute).await.map_err(not_readable)?;
        let metadata = file.metadata().await.map_err(not_readable)?;
        let content_type = self.content_types.resolve(&path.file_name);

        debug!(
            "Resolved {} ({} bytes, {})",
            path.relative,
            metadata.len(),
            content_type
        );

        Ok(ResolvedStream {
            total_size: metadata.len(),
            last_modified: metadata.modified().ok(),
            content_type,
            path,
            file,
            open_range_policy: self.open_range_policy,
            chunk_size: self.chunk_size,
        })
    }
}

/// Resolved state: the file is open and its size and type are known.
#[derive(Debug)]
pub struct ResolvedStream {
    path: ResolvedPath,
    file: File,
    content_type: String,
    total_size: u64,
    last_modified: Option<SystemTime>,
    open_range_policy: OpenRangePolicy,
    chunk_size: usize,
}

impl ResolvedStream {
    pub fn path(&self) -> &ResolvedPath {
        &self.path
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// Interprets the `Range` header against the file size.
    ///
    /// On error the file handle is dropped with `self`.
    ///
    /// # Errors
    ///
    /// - `StreamingError::BadRequest` - Multi-range request
    /// - `StreamingError::RangeNotSatisfiable` - Range does not overlap the file
    pub fn classify(self, range_header: Option<&str>) -> StreamingResult<ClassifiedStream> {
        let range = parse_range_header(range_header, self.total_size, self.open_range_policy)
            .inspect_err(|e| {
                warn!(
                    "Rejecting range {:?} for {}: {}",
                    range_header, self.path.relative, e
                );
            })?;

        let descriptor = StreamDescriptor::new(
            self.path.file_name,
            self.content_type,
            self.total_size,
            range,
        )
        .with_last_modified(self.last_modified);

        Ok(ClassifiedStream {
            descriptor,
            file: self.file,
            chunk_size: self.chunk_size,
        })
    }
}

/// Range-classified state: headers are fixed, the body is ready to be read.
#[derive(Debug)]
pub struct ClassifiedStream {
    descriptor: StreamDescriptor,
    file: File,
    chunk_size: usize,
}

impl ClassifiedStream {
    pub fn descriptor(&self) -> &StreamDescriptor {
        &self.descriptor
    }

    /// Whether this is the partial-content (206) branch.
    pub fn is_partial(&self) -> bool {
        self.descriptor.range().is_some()
    }

    /// Splits into the descriptor and a reader over exactly the body bytes.
    pub fn into_parts(self) -> (StreamDescriptor, ByteRangeReader) {
        let reader = ByteRangeReader::new(
            self.file,
            self.descriptor.body_offset(),
            self.descriptor.content_length(),
        )
        .with_chunk_size(self.chunk_size);
        (self.descriptor, reader)
    }

    /// Builds the final response; the body is read lazily as it is sent.
    pub fn into_response(self) -> Response<Body> {
        let (descriptor, reader) = self.into_parts();
        let body = Body::from_stream(reader.into_stream());

        descriptor
            .apply(Response::builder())
            .body(body)
            .unwrap_or_else(|e| {
                warn!("Failed to build response for {}: {}", descriptor.file_name(), e);
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            })
    }
}
