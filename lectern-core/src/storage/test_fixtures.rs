//! Test fixtures for storage and streaming tests.
//!
//! Builds a throwaway media tree with a known byte pattern so tests can
//! compare response bodies against exact file slices.

use std::path::PathBuf;

/// Size of the sample video written by [`create_media_tree`].
pub const SAMPLE_VIDEO_SIZE: usize = 1000;

/// Temporary library and upload roots with sample content.
pub struct MediaTree {
    /// Keeps the directories alive for the lifetime of the fixture.
    pub temp_dir: tempfile::TempDir,
    pub library_root: PathBuf,
    pub upload_dir: PathBuf,
    /// Contents of `a/v.mp4` in the library and `v.mp4` in the uploads.
    pub sample: Vec<u8>,
}

/// Deterministic content where byte `i` is `i % 256`.
pub fn sample_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 256) as u8).collect()
}

/// Creates a library with `a/v.mp4`, a subtitle sidecar, a hidden directory
/// and a secret file next to (not inside) the roots.
///
/// # Panics
///
/// Panics if the temporary directory or any file cannot be created. This is
/// acceptable in test fixtures where failures indicate environment issues.
pub fn create_media_tree() -> MediaTree {
    let temp_dir = tempfile::tempdir().unwrap();
    let library_root = temp_dir.path().join("library");
    let upload_dir = temp_dir.path().join("uploads");
    let sample = sample_bytes(SAMPLE_VIDEO_SIZE);

    std::fs::create_dir_all(library_root.join("a")).unwrap();
    std::fs::create_dir_all(library_root.join(".hidden")).unwrap();
    std::fs::create_dir_all(&upload_dir).unwrap();

    std::fs::write(library_root.join("a/v.mp4"), &sample).unwrap();
    std::fs::write(
        library_root.join("a/v.srt"),
        "1\n00:00:00,500 --> 00:00:02,000\nHello\n",
    )
    .unwrap();
    std::fs::write(library_root.join(".hidden/skip.mp4"), b"hidden").unwrap();
    std::fs::write(upload_dir.join("v.mp4"), &sample).unwrap();
    std::fs::write(upload_dir.join("blob.zzqx"), b"opaque").unwrap();
    std::fs::write(temp_dir.path().join("secret.txt"), b"secret").unwrap();

    MediaTree {
        temp_dir,
        library_root,
        upload_dir,
        sample,
    }
}
