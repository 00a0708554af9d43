//! Root-confined resolution of caller-supplied relative paths.
//!
//! Resolution happens in two phases. The lexical phase decodes and normalizes
//! the path without touching the filesystem and rejects anything that climbs
//! out of the root. The filesystem phase canonicalizes the survivor, which
//! catches symlinks that point outside the root, and checks that the target is
//! a regular file.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::streaming::{StreamingError, StreamingResult};

/// A relative resource identifier paired with the root it must stay under.
///
/// Only produced by [`PathResolver::locate`], after lexical normalization, so
/// `root_directory().join(relative_path())` is always a descendant of the root
/// as far as path syntax is concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLocation {
    root_directory: PathBuf,
    segments: Vec<String>,
}

impl ResourceLocation {
    /// Root the location is confined to.
    pub fn root_directory(&self) -> &Path {
        &self.root_directory
    }

    /// Normalized `/`-separated path below the root.
    pub fn relative_path(&self) -> String {
        self.segments.join("/")
    }

    /// Last path segment, if any.
    pub fn file_name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Absolute candidate path, before symlinks are resolved.
    pub fn candidate_path(&self) -> PathBuf {
        self.segments
            .iter()
            .fold(self.root_directory.clone(), |path, segment| path.join(segment))
    }
}

/// A successfully resolved regular file under a root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    /// Canonical absolute path of the file.
    pub absolute: PathBuf,
    /// Normalized `/`-separated path below the root, as requested.
    pub relative: String,
    /// Name of the requested file, used for `Content-Disposition`.
    pub file_name: String,
}

/// Maps relative identifiers to files strictly inside one root directory.
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
}

impl PathResolver {
    /// Creates a resolver for an existing root directory.
    ///
    /// The root is canonicalized once here; every later comparison is made
    /// against the canonical form.
    ///
    /// # Errors
    ///
    /// - `std::io::Error` - If the root does not exist or is not a directory
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = std::fs::canonicalize(root.as_ref())?;
        if !root.is_dir() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotADirectory,
                format!("{} is not a directory", root.display()),
            ));
        }
        Ok(Self { root })
    }

    /// Canonical root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Percent-decodes and lexically normalizes a raw (URL-encoded) path.
    ///
    /// Performs no filesystem access.
    ///
    /// # Errors
    ///
    /// - `StreamingError::BadRequest` - If the path does not decode to UTF-8 or contains NUL
    /// - `StreamingError::ForbiddenPath` - If the path is absolute or climbs above the root
    pub fn locate(&self, raw_path: &str) -> StreamingResult<ResourceLocation> {
        let decoded = urlencoding::decode(raw_path).map_err(|e| StreamingError::BadRequest {
            reason: format!("path is not valid percent-encoded UTF-8: {e}"),
        })?;
        self.locate_decoded(&decoded)
    }

    /// Lexically normalizes an already decoded path.
    ///
    /// Both `/` and `\` act as separators. Empty and `.` segments are dropped,
    /// `..` removes the previous segment.
    ///
    /// # Errors
    ///
    /// - `StreamingError::BadRequest` - If the path contains NUL
    /// - `StreamingError::ForbiddenPath` - If the path is absolute or climbs above the root
    pub fn locate_decoded(&self, path: &str) -> StreamingResult<ResourceLocation> {
        if path.contains('\0') {
            return Err(StreamingError::BadRequest {
                reason: "path contains NUL byte".to_string(),
            });
        }

        let forbidden = || StreamingError::ForbiddenPath {
            path: path.to_string(),
        };

        let normalized = path.replace('\\', "/");
        if normalized.starts_with('/') {
            return Err(forbidden());
        }

        let mut segments: Vec<String> = Vec::new();
        for (index, segment) in normalized.split('/').enumerate() {
            match segment {
                "" | "." => {}
                ".." => {
                    if segments.pop().is_none() {
                        return Err(forbidden());
                    }
                }
                _ if index == 0 && is_drive_prefix(segment) => return Err(forbidden()),
                _ => segments.push(segment.to_string()),
            }
        }

        Ok(ResourceLocation {
            root_directory: self.root.clone(),
            segments,
        })
    }

    /// Resolves a raw (URL-encoded) path to a regular file inside the root.
    ///
    /// # Errors
    ///
    /// - `StreamingError::BadRequest` - If the path cannot be decoded
    /// - `StreamingError::ForbiddenPath` - If the path escapes the root, lexically or via symlink
    /// - `StreamingError::NotFound` - If nothing exists there or it is not a regular file
    pub async fn resolve(&self, raw_path: &str) -> StreamingResult<ResolvedPath> {
        let location = self.locate(raw_path)?;
        self.resolve_location(location).await
    }

    /// Resolves an already decoded path to a regular file inside the root.
    ///
    /// # Errors
    ///
    /// Same as [`PathResolver::resolve`], minus decoding failures.
    pub async fn resolve_decoded(&self, path: &str) -> StreamingResult<ResolvedPath> {
        let location = self.locate_decoded(path)?;
        self.resolve_location(location).await
    }

    async fn resolve_location(&self, location: ResourceLocation) -> StreamingResult<ResolvedPath> {
        let relative = location.relative_path();
        let Some(file_name) = location.file_name().map(str::to_string) else {
            return Err(StreamingError::NotFound { path: relative });
        };

        let candidate = location.candidate_path();
        let canonical = match tokio::fs::canonicalize(&candidate).await {
            Ok(path) => path,
            Err(e) => {
                debug!("Cannot canonicalize {}: {}", candidate.display(), e);
                return Err(StreamingError::NotFound { path: relative });
            }
        };

        if !canonical.starts_with(&self.root) {
            warn!(
                "Rejecting {} which resolves outside {} (to {})",
                relative,
                self.root.display(),
                canonical.display()
            );
            return Err(StreamingError::ForbiddenPath { path: relative });
        }

        match tokio::fs::metadata(&canonical).await {
            Ok(metadata) if metadata.is_file() => Ok(ResolvedPath {
                absolute: canonical,
                relative,
                file_name,
            }),
            Ok(_) => Err(StreamingError::NotFound { path: relative }),
            Err(e) => {
                debug!("Cannot stat {}: {}", canonical.display(), e);
                Err(StreamingError::NotFound { path: relative })
            }
        }
    }
}

/// `C:`-style prefix, which would make the path absolute on Windows.
fn is_drive_prefix(segment: &str) -> bool {
    let bytes = segment.as_bytes();
    bytes.len() == 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn library() -> (TempDir, PathResolver) {
        let temp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(temp.path().join("a")).unwrap();
        std::fs::write(temp.path().join("a/v.mp4"), vec![7u8; 1000]).unwrap();
        std::fs::write(temp.path().join("a/Lesson 1: Intro.mp4"), b"x").unwrap();
        let resolver = PathResolver::new(temp.path()).unwrap();
        (temp, resolver)
    }

    #[tokio::test]
    async fn test_resolves_file_inside_root() {
        let (_temp, resolver) = library();

        let resolved = resolver.resolve("a/v.mp4").await.unwrap();

        assert_eq!(resolved.relative, "a/v.mp4");
        assert_eq!(resolved.file_name, "v.mp4");
        assert!(resolved.absolute.starts_with(resolver.root()));
    }

    #[tokio::test]
    async fn test_percent_encoded_and_backslash_paths() {
        let (_temp, resolver) = library();

        let encoded = resolver.resolve("a/Lesson%201%3A%20Intro.mp4").await.unwrap();
        assert_eq!(encoded.file_name, "Lesson 1: Intro.mp4");

        let backslash = resolver.resolve("a\\v.mp4").await.unwrap();
        assert_eq!(backslash.relative, "a/v.mp4");
    }

    #[tokio::test]
    async fn test_dot_segments_inside_root_are_normalized() {
        let (_temp, resolver) = library();

        let resolved = resolver.resolve("a/./b/../v.mp4").await;

        // `b` does not exist but `..` is applied lexically before any lookup.
        assert_eq!(resolved.unwrap().relative, "a/v.mp4");
    }

    #[test]
    fn test_traversal_is_forbidden_without_filesystem_access() {
        let (_temp, resolver) = library();

        for path in [
            "../../../etc/passwd",
            "a/../../etc/passwd",
            "..%2F..%2F..%2Fetc%2Fpasswd",
            "%2e%2e/%2e%2e/etc/passwd",
            "a\\..\\..\\secret",
            "/etc/passwd",
            "%2Fetc%2Fpasswd",
            "C:\\Windows\\win.ini",
        ] {
            assert!(
                matches!(
                    resolver.locate(path),
                    Err(StreamingError::ForbiddenPath { .. })
                ),
                "{path} was not rejected"
            );
        }
    }

    #[test]
    fn test_colon_inside_name_is_not_a_drive_prefix() {
        let (_temp, resolver) = library();
        assert!(resolver.locate("a/Lesson 1: Intro.mp4").is_ok());
        assert!(resolver.locate("ab:/x.mp4").is_ok());
    }

    #[test]
    fn test_undecodable_path_is_bad_request() {
        let (_temp, resolver) = library();

        assert!(matches!(
            resolver.locate("a/%FF%FE.mp4"),
            Err(StreamingError::BadRequest { .. })
        ));
        assert!(matches!(
            resolver.locate("a/v.mp4%00.txt"),
            Err(StreamingError::BadRequest { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_file_and_directory_are_not_found() {
        let (_temp, resolver) = library();

        for path in ["a/missing.mp4", "a", "", "a/.."] {
            assert!(
                matches!(
                    resolver.resolve(path).await,
                    Err(StreamingError::NotFound { .. })
                ),
                "{path} should be not found"
            );
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlink_escaping_root_is_forbidden() {
        let outside = tempfile::tempdir().unwrap();
        std::fs::write(outside.path().join("secret.mp4"), b"secret").unwrap();
        let (temp, resolver) = library();
        std::os::unix::fs::symlink(
            outside.path().join("secret.mp4"),
            temp.path().join("a/link.mp4"),
        )
        .unwrap();

        assert!(matches!(
            resolver.resolve("a/link.mp4").await,
            Err(StreamingError::ForbiddenPath { .. })
        ));
    }

    #[test]
    fn test_root_must_be_directory() {
        let temp = tempfile::tempdir().unwrap();
        let file = temp.path().join("file.mp4");
        std::fs::write(&file, b"x").unwrap();

        assert!(PathResolver::new(&file).is_err());
        assert!(PathResolver::new(temp.path().join("missing")).is_err());
    }
}
