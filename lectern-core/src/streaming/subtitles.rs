//! Subtitle sidecars for library videos.
//!
//! A video `dir/lesson.mp4` may ship with `dir/lesson.en.srt` or
//! `dir/lesson.srt`. Browsers only play WebVTT, so sidecars are converted on
//! the fly.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::{StreamingError, StreamingResult};
use crate::storage::{PathResolver, ResolvedPath};

/// Sidecar suffixes in lookup order.
const SIDECAR_SUFFIXES: &[&str] = &[".en.srt", ".srt"];

static SRT_TIMING: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^(\s*\d{1,2}:\d{2}:\d{2}),(\d{3}\s*-->\s*\d{1,2}:\d{2}:\d{2}),(\d{3}.*)$").ok()
});

/// Converts SubRip text to WebVTT.
///
/// Only timing lines are rewritten (`,` → `.` before the milliseconds); cue
/// numbers and text pass through untouched.
pub fn convert_srt_to_vtt(srt: &str) -> String {
    let srt = srt.strip_prefix('\u{feff}').unwrap_or(srt);
    let mut vtt = String::with_capacity(srt.len() + 8);
    vtt.push_str("WEBVTT\n\n");

    for line in srt.lines() {
        match SRT_TIMING.as_ref() {
            Some(timing) if timing.is_match(line) => {
                vtt.push_str(&timing.replace(line, "$1.$2.$3"));
            }
            _ => vtt.push_str(line),
        }
        vtt.push('\n');
    }

    vtt
}

/// Finds the subtitle sidecar for a raw (URL-encoded) library video path.
///
/// The video itself must resolve first, so a missing or forbidden video never
/// leaks whether a sidecar exists.
///
/// # Errors
///
/// - `StreamingError::BadRequest` - Path cannot be decoded
/// - `StreamingError::ForbiddenPath` - Video or sidecar escapes the root
/// - `StreamingError::NotFound` - Video or every sidecar candidate is missing
pub async fn find_subtitle_sidecar(
    resolver: &PathResolver,
    raw_video_path: &str,
) -> StreamingResult<ResolvedPath> {
    let video = resolver.resolve(raw_video_path).await?;

    let stem = video
        .file_name
        .rsplit_once('.')
        .map_or(video.file_name.as_str(), |(stem, _)| stem);
    let directory = video
        .relative
        .rsplit_once('/')
        .map_or("", |(directory, _)| directory);

    for suffix in SIDECAR_SUFFIXES {
        let candidate = if directory.is_empty() {
            format!("{stem}{suffix}")
        } else {
            format!("{directory}/{stem}{suffix}")
        };

        match resolver.resolve_decoded(&candidate).await {
            Ok(sidecar) => return Ok(sidecar),
            Err(StreamingError::NotFound { .. }) => {
                debug!("No subtitle sidecar at {}", candidate);
            }
            Err(e) => return Err(e),
        }
    }

    Err(StreamingError::NotFound {
        path: video.relative,
    })
}
