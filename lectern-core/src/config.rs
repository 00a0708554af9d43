//! Centralized configuration for Lectern.
//!
//! All tunable parameters and settings are defined here to avoid
//! hard-coded values scattered throughout the codebase.

use std::path::PathBuf;

use tracing::warn;

use crate::LecternError;
use crate::streaming::OpenRangePolicy;

/// Default size of a single body chunk read from disk.
pub const DEFAULT_READ_CHUNK_SIZE: usize = 256 * 1024; // 256 KiB

/// Central configuration for all Lectern components.
///
/// Groups related configuration settings into logical sections.
/// Supports environment variable overrides for runtime customization.
#[derive(Debug, Clone, Default)]
pub struct LecternConfig {
    pub server: ServerConfig,
    pub library: LibraryConfig,
    pub streaming: StreamingConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface to bind to
    pub host: String,
    /// TCP port to listen on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl ServerConfig {
    /// Human-readable listen address, `host:port`.
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Locations of the directories media is served from.
///
/// Both directories act as roots: nothing outside of them is ever served.
#[derive(Debug, Clone)]
pub struct LibraryConfig {
    /// Root of the local course library tree (Course/Module/Group/video)
    pub library_root: PathBuf,
    /// Flat directory holding uploaded videos addressed by file name
    pub upload_dir: PathBuf,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            library_root: PathBuf::from("library"),
            upload_dir: PathBuf::from("uploads/videos"),
        }
    }
}

/// Byte-range delivery settings.
#[derive(Debug, Clone)]
pub struct StreamingConfig {
    /// How `bytes=<start>-` requests are bounded
    pub open_range_policy: OpenRangePolicy,
    /// Size of each chunk read from disk into the response body
    pub read_chunk_size: usize,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            open_range_policy: OpenRangePolicy::ToEnd,
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
        }
    }
}

impl LecternConfig {
    /// Creates configuration with environment variable overrides.
    ///
    /// Allows runtime configuration via environment variables while
    /// maintaining sensible defaults. Unparseable values are ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(host) = std::env::var("LECTERN_HOST") {
            config.server.host = host;
        }

        if let Ok(port) = std::env::var("LECTERN_PORT") {
            match port.parse::<u16>() {
                Ok(port) => config.server.port = port,
                Err(_) => warn!("Ignoring invalid LECTERN_PORT value: {port}"),
            }
        }

        if let Ok(root) = std::env::var("LECTERN_LIBRARY_ROOT") {
            config.library.library_root = PathBuf::from(root);
        }

        if let Ok(dir) = std::env::var("LECTERN_UPLOAD_DIR") {
            config.library.upload_dir = PathBuf::from(dir);
        }

        if let Ok(chunk) = std::env::var("LECTERN_OPEN_RANGE_CHUNK") {
            match chunk.parse::<u64>() {
                Ok(bytes) => {
                    config.streaming.open_range_policy = OpenRangePolicy::from_chunk(bytes);
                }
                Err(_) => warn!("Ignoring invalid LECTERN_OPEN_RANGE_CHUNK value: {chunk}"),
            }
        }

        if let Ok(size) = std::env::var("LECTERN_READ_CHUNK_SIZE") {
            match size.parse::<usize>() {
                Ok(bytes) if bytes > 0 => config.streaming.read_chunk_size = bytes,
                _ => warn!("Ignoring invalid LECTERN_READ_CHUNK_SIZE value: {size}"),
            }
        }

        config
    }

    /// Creates a configuration rooted at the given directories.
    pub fn with_roots(library_root: impl Into<PathBuf>, upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            library: LibraryConfig {
                library_root: library_root.into(),
                upload_dir: upload_dir.into(),
            },
            ..Default::default()
        }
    }

    /// Checks settings that cannot be expressed through types alone.
    ///
    /// # Errors
    ///
    /// - `LecternError::Configuration` - If a value is out of range
    pub fn validate(&self) -> Result<(), LecternError> {
        if self.streaming.read_chunk_size == 0 {
            return Err(LecternError::Configuration {
                reason: "read_chunk_size must be greater than zero".to_string(),
            });
        }
        if self.library.library_root.as_os_str().is_empty() {
            return Err(LecternError::Configuration {
                reason: "library_root must not be empty".to_string(),
            });
        }
        if self.server.host.trim().is_empty() {
            return Err(LecternError::Configuration {
                reason: "server host must not be empty".to_string(),
            });
        }
        Ok(())
    }
}
