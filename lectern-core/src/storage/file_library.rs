//! Index of the video files available in the library tree.

use std::collections::HashSet;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::streaming::ContentTypeResolver;

/// Extensions listed in the library.
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "avi", "mov", "m4v", "webm", "flv"];

/// OS bookkeeping directories that never hold course content.
const JUNK_DIRECTORIES: &[&str] = &["Thumbs.db", "$RECYCLE.BIN", "System Volume Information"];

/// One playable video below the library root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryEntry {
    /// `/`-separated path below the root, usable as `/library/{path}`.
    pub relative_path: String,
    /// Human readable title derived from the file name.
    pub title: String,
    /// File size in bytes.
    pub size: u64,
    /// MIME type the file is served with.
    pub content_type: String,
}

/// Sorted snapshot of the library tree.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct LibraryIndex {
    entries: Vec<LibraryEntry>,
}

type ScanFuture<'a> = Pin<Box<dyn Future<Output = std::io::Result<()>> + Send + 'a>>;

impl LibraryIndex {
    /// Scans `root` recursively.
    ///
    /// Hidden entries and OS junk directories are skipped. Subdirectories that
    /// cannot be read are logged and left out. Symlinks are followed only while
    /// their target stays inside the root, and each directory is visited once.
    ///
    /// # Errors
    ///
    /// - `std::io::Error` - If the root itself cannot be read
    pub async fn scan(root: &Path) -> std::io::Result<Self> {
        let canonical_root = tokio::fs::canonicalize(root).await?;
        let mut scan = Scan {
            root,
            visited: HashSet::from([canonical_root.clone()]),
            canonical_root,
            content_types: ContentTypeResolver::for_library(),
            entries: Vec::new(),
        };

        scan_directory(&mut scan, root).await?;
        let mut entries = scan.entries;
        entries.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));

        info!("Indexed {} videos under {}", entries.len(), root.display());
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[LibraryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry with the given relative path, if indexed.
    pub fn find(&self, relative_path: &str) -> Option<&LibraryEntry> {
        self.entries
            .binary_search_by(|entry| entry.relative_path.as_str().cmp(relative_path))
            .ok()
            .map(|index| &self.entries[index])
    }

    /// Total size of all indexed videos in bytes.
    pub fn total_size(&self) -> u64 {
        self.entries.iter().map(|entry| entry.size).sum()
    }
}

/// Walk state shared across the recursion.
struct Scan<'a> {
    root: &'a Path,
    canonical_root: PathBuf,
    visited: HashSet<PathBuf>,
    content_types: ContentTypeResolver,
    entries: Vec<LibraryEntry>,
}

fn scan_directory<'a>(scan: &'a mut Scan<'_>, dir: &'a Path) -> ScanFuture<'a> {
    Box::pin(async move {
        let mut listing = tokio::fs::read_dir(dir).await?;

        while let Some(entry) = listing.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                debug!("Skipping non UTF-8 name in {}", dir.display());
                continue;
            };
            if name.starts_with('.') || JUNK_DIRECTORIES.contains(&name) {
                continue;
            }

            let path = entry.path();
            let Ok(target) = tokio::fs::canonicalize(&path).await else {
                debug!("Skipping dangling entry {}", path.display());
                continue;
            };
            if !target.starts_with(&scan.canonical_root) {
                debug!("Skipping {} outside the library root", path.display());
                continue;
            }
            let Ok(metadata) = tokio::fs::metadata(&target).await else {
                debug!("Skipping unreadable entry {}", path.display());
                continue;
            };

            if metadata.is_dir() {
                if !scan.visited.insert(target) {
                    debug!("Skipping already visited directory {}", path.display());
                    continue;
                }
                if let Err(e) = scan_directory(scan, &path).await {
                    warn!("Failed to scan {}: {}", path.display(), e);
                }
            } else if metadata.is_file() && is_video(&path) {
                let Some(relative_path) = relative_to(scan.root, &path) else {
                    continue;
                };
                scan.entries.push(LibraryEntry {
                    title: title_from_name(&path),
                    size: metadata.len(),
                    content_type: scan.content_types.resolve(&path),
                    relative_path,
                });
            }
        }

        Ok(())
    })
}

fn is_video(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            VIDEO_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

fn relative_to(root: &Path, path: &Path) -> Option<String> {
    let segments: Option<Vec<&str>> = path
        .strip_prefix(root)
        .ok()?
        .components()
        .map(|component| component.as_os_str().to_str())
        .collect();
    Some(segments?.join("/"))
}

fn title_from_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("Untitled")
        .replace(['.', '_'], " ")
}
