//! Filename-based MIME type selection.
//!
//! Classification never looks at file contents. Explicit overrides win over
//! the `mime_guess` table, which in turn wins over the caller's fallback.

use std::collections::HashMap;
use std::path::Path;

/// Default used when the extension is unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackType {
    /// Generic binary delivery (`application/octet-stream`).
    Binary,
    /// Caller guarantees video content (`video/mp4`).
    Video,
}

impl FallbackType {
    /// MIME type emitted for unknown extensions.
    pub fn mime(self) -> &'static str {
        match self {
            FallbackType::Binary => "application/octet-stream",
            FallbackType::Video => "video/mp4",
        }
    }
}

/// Container and subtitle types browsers care about that the generic table
/// either lacks or maps inconsistently across platforms.
const MEDIA_OVERRIDES: &[(&str, &str)] = &[
    ("mp4", "video/mp4"),
    ("m4v", "video/x-m4v"),
    ("mkv", "video/x-matroska"),
    ("webm", "video/webm"),
    ("mov", "video/quicktime"),
    ("avi", "video/x-msvideo"),
    ("flv", "video/x-flv"),
    ("vtt", "text/vtt"),
    ("srt", "application/x-subrip"),
];

/// Static, extensible extension → MIME table with a context-specific fallback.
#[derive(Debug, Clone)]
pub struct ContentTypeResolver {
    overrides: HashMap<String, String>,
    fallback: FallbackType,
}

impl ContentTypeResolver {
    /// Creates a resolver with the built-in media overrides.
    pub fn new(fallback: FallbackType) -> Self {
        let overrides = MEDIA_OVERRIDES
            .iter()
            .map(|(ext, mime)| ((*ext).to_string(), (*mime).to_string()))
            .collect();
        Self {
            overrides,
            fallback,
        }
    }

    /// Resolver for the upload store, where anything may have been stored.
    pub fn for_uploads() -> Self {
        Self::new(FallbackType::Binary)
    }

    /// Resolver for the library tree, which only holds course video.
    pub fn for_library() -> Self {
        Self::new(FallbackType::Video)
    }

    /// Adds or replaces the MIME type for an extension (case-insensitive).
    pub fn with_override(mut self, extension: &str, mime: &str) -> Self {
        self.overrides
            .insert(extension.trim_start_matches('.').to_ascii_lowercase(), mime.to_string());
        self
    }

    /// Fallback this resolver applies to unknown extensions.
    pub fn fallback(&self) -> FallbackType {
        self.fallback
    }

    /// MIME type for a file name or path.
    pub fn resolve(&self, file_name: impl AsRef<Path>) -> String {
        let path = file_name.as_ref();
        let Some(extension) = path.extension().and_then(|ext| ext.to_str()) else {
            return self.fallback.mime().to_string();
        };

        let extension = extension.to_ascii_lowercase();
        if let Some(mime) = self.overrides.get(&extension) {
            return mime.clone();
        }

        mime_guess::from_ext(&extension)
            .first_raw()
            .map(str::to_string)
            .unwrap_or_else(|| self.fallback.mime().to_string())
    }
}
