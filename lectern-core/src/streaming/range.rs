//! HTTP Range header parsing for single byte ranges.
//!
//! Implements the subset of RFC 7233 needed for media seeking: one
//! `bytes=<start>-<end>` interval, open-ended ranges and suffix ranges.
//! Syntactically broken headers are ignored so the client receives the full
//! resource, while ranges that cannot overlap the resource are rejected.

use super::{StreamingError, StreamingResult};

/// Inclusive byte interval inside a resource of known size.
///
/// Always satisfies `start <= end < total_size`; the fields are private so the
/// invariant can only be established through [`ByteRange::new`] or the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    start: u64,
    end: u64,
    total_size: u64,
}

impl ByteRange {
    /// Creates a range, checking it lies within the resource.
    ///
    /// # Errors
    ///
    /// - `StreamingError::RangeNotSatisfiable` - If `start > end` or `end >= total_size`
    pub fn new(start: u64, end: u64, total_size: u64) -> StreamingResult<Self> {
        if start > end || end >= total_size {
            return Err(StreamingError::RangeNotSatisfiable { total_size });
        }
        Ok(Self {
            start,
            end,
            total_size,
        })
    }

    /// First byte offset, inclusive.
    pub fn start(&self) -> u64 {
        self.start
    }

    /// Last byte offset, inclusive.
    pub fn end(&self) -> u64 {
        self.end
    }

    /// Size of the whole resource the range was taken from.
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// Number of bytes covered by the range.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Value for the `Content-Range` response header.
    pub fn content_range(&self) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, self.total_size)
    }
}

/// How an open-ended request (`bytes=<start>-`) is bounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpenRangePolicy {
    /// Serve through the last byte of the resource.
    #[default]
    ToEnd,
    /// Serve at most this many bytes starting at `start`.
    Chunk(u64),
}

impl OpenRangePolicy {
    /// Maps a configured chunk size to a policy; zero means unbounded.
    pub fn from_chunk(bytes: u64) -> Self {
        if bytes == 0 {
            OpenRangePolicy::ToEnd
        } else {
            OpenRangePolicy::Chunk(bytes)
        }
    }

    fn open_end(self, start: u64, total_size: u64) -> u64 {
        let last = total_size.saturating_sub(1);
        match self {
            OpenRangePolicy::ToEnd => last,
            OpenRangePolicy::Chunk(bytes) => {
                start.saturating_add(bytes.saturating_sub(1)).min(last)
            }
        }
    }
}

/// Parses a `Range` header value against a resource of `total_size` bytes.
///
/// Returns `Ok(None)` when no range was requested: the header is absent, uses
/// a unit other than `bytes`, or is not syntactically a byte range. An `end`
/// past the resource is clamped to the last byte.
///
/// # Errors
///
/// - `StreamingError::BadRequest` - Multiple ranges were requested
/// - `StreamingError::RangeNotSatisfiable` - The range starts at or beyond
///   `total_size`, ends before it starts, or is an empty suffix
///
/// # Examples
/// ```
/// use lectern_core::streaming::{OpenRangePolicy, parse_range_header};
///
/// let range = parse_range_header(Some("bytes=100-199"), 1000, OpenRangePolicy::ToEnd)
///     .unwrap()
///     .unwrap();
/// assert_eq!((range.start(), range.end(), range.len()), (100, 199, 100));
/// ```
pub fn parse_range_header(
    header: Option<&str>,
    total_size: u64,
    policy: OpenRangePolicy,
) -> StreamingResult<Option<ByteRange>> {
    let Some(header) = header else {
        return Ok(None);
    };

    let Some((unit, spec)) = header.trim().split_once('=') else {
        return Ok(None);
    };
    if !unit.trim().eq_ignore_ascii_case("bytes") {
        return Ok(None);
    }

    let spec = spec.trim();
    if spec.contains(',') {
        return Err(StreamingError::BadRequest {
            reason: format!("multiple ranges are not supported: {spec}"),
        });
    }

    let Some((start_str, end_str)) = spec.split_once('-') else {
        return Ok(None);
    };
    let (start_str, end_str) = (start_str.trim(), end_str.trim());

    if start_str.is_empty() {
        // Suffix form: the last N bytes.
        let Ok(suffix) = end_str.parse::<u64>() else {
            return Ok(None);
        };
        if suffix == 0 || total_size == 0 {
            return Err(StreamingError::RangeNotSatisfiable { total_size });
        }
        let start = total_size.saturating_sub(suffix);
        return ByteRange::new(start, total_size - 1, total_size).map(Some);
    }

    let Ok(start) = start_str.parse::<u64>() else {
        return Ok(None);
    };
    let requested_end = if end_str.is_empty() {
        None
    } else {
        match end_str.parse::<u64>() {
            Ok(end) => Some(end),
            Err(_) => return Ok(None),
        }
    };

    if start >= total_size {
        return Err(StreamingError::RangeNotSatisfiable { total_size });
    }

    let end = match requested_end {
        Some(end) if end < start => {
            return Err(StreamingError::RangeNotSatisfiable { total_size });
        }
        Some(end) => end.min(total_size - 1),
        None => policy.open_end(start, total_size),
    };

    ByteRange::new(start, end, total_size).map(Some)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn parse(header: &str, total_size: u64) -> StreamingResult<Option<ByteRange>> {
        parse_range_header(Some(header), total_size, OpenRangePolicy::ToEnd)
    }

    fn bounds(header: &str, total_size: u64) -> (u64, u64, u64) {
        let range = parse(header, total_size).unwrap().unwrap();
        (range.start(), range.end(), range.len())
    }

    #[test]
    fn test_parse_range_header_valid() {
        assert_eq!(bounds("bytes=100-199", 1000), (100, 199, 100));
    }

    #[test]
    fn test_parse_range_header_open_end() {
        assert_eq!(bounds("bytes=500-", 1000), (500, 999, 500));
        assert_eq!(bounds("bytes=999-", 1000), (999, 999, 1));
    }

    #[test]
    fn test_parse_range_header_clamps_end() {
        assert_eq!(bounds("bytes=100-5000", 1000), (100, 999, 900));
    }

    #[test]
    fn test_parse_range_header_suffix() {
        assert_eq!(bounds("bytes=-100", 1000), (900, 999, 100));
        assert_eq!(bounds("bytes=-5000", 1000), (0, 999, 1000));
        assert!(matches!(
            parse("bytes=-0", 1000),
            Err(StreamingError::RangeNotSatisfiable { total_size: 1000 })
        ));
    }

    #[test]
    fn test_parse_range_header_tolerates_whitespace_and_case() {
        assert_eq!(bounds(" Bytes = 10 - 19 ", 100), (10, 19, 10));
    }

    #[test]
    fn test_missing_or_unparseable_header_means_no_range() {
        assert!(
            parse_range_header(None, 1000, OpenRangePolicy::ToEnd)
                .unwrap()
                .is_none()
        );
        for header in ["invalid", "items=0-10", "bytes=abc-def", "bytes=10", "bytes=-"] {
            assert!(parse(header, 1000).unwrap().is_none(), "{header}");
        }
    }

    #[test]
    fn test_start_beyond_size_is_not_satisfiable() {
        assert!(matches!(
            parse("bytes=2000-3000", 1000),
            Err(StreamingError::RangeNotSatisfiable { total_size: 1000 })
        ));
        assert!(matches!(
            parse("bytes=1000-", 1000),
            Err(StreamingError::RangeNotSatisfiable { .. })
        ));
    }

    #[test]
    fn test_inverted_range_is_not_satisfiable() {
        assert!(matches!(
            parse("bytes=500-100", 1000),
            Err(StreamingError::RangeNotSatisfiable { .. })
        ));
    }

    #[test]
    fn test_empty_resource_rejects_every_range() {
        assert!(parse("bytes=0-", 0).is_err());
        assert!(parse("bytes=-10", 0).is_err());
        assert!(
            parse_range_header(None, 0, OpenRangePolicy::ToEnd)
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_multi_range_is_bad_request() {
        assert!(matches!(
            parse("bytes=0-10,20-30", 1000),
            Err(StreamingError::BadRequest { .. })
        ));
    }

    #[test]
    fn test_chunk_policy_bounds_open_ranges() {
        let policy = OpenRangePolicy::Chunk(1024 * 1024);
        let total = 10 * 1024 * 1024;

        let range = parse_range_header(Some("bytes=0-"), total, policy)
            .unwrap()
            .unwrap();
        assert_eq!(range.end(), 1024 * 1024 - 1);

        let near_end = parse_range_header(Some("bytes=999-"), 1000, policy)
            .unwrap()
            .unwrap();
        assert_eq!((near_end.start(), near_end.end()), (999, 999));

        // Explicit ends are never affected by the policy.
        let explicit = parse_range_header(Some("bytes=0-4194303"), total, policy)
            .unwrap()
            .unwrap();
        assert_eq!(explicit.len(), 4 * 1024 * 1024);
    }

    #[test]
    fn test_open_range_policy_from_chunk() {
        assert_eq!(OpenRangePolicy::from_chunk(0), OpenRangePolicy::ToEnd);
        assert_eq!(OpenRangePolicy::from_chunk(42), OpenRangePolicy::Chunk(42));
    }

    #[test]
    fn test_content_range_header_value() {
        let range = ByteRange::new(100, 199, 1000).unwrap();
        assert_eq!(range.content_range(), "bytes 100-199/1000");
    }

    #[test]
    fn test_byte_range_new_enforces_invariant() {
        assert!(ByteRange::new(0, 0, 1).is_ok());
        assert!(ByteRange::new(5, 4, 10).is_err());
        assert!(ByteRange::new(0, 10, 10).is_err());
    }

    proptest! {
        #[test]
        fn prop_valid_ranges_round_trip(total in 1u64..1_000_000, a in any::<u64>(), b in any::<u64>()) {
            let start = a % total;
            let end = start + b % (total - start);
            let range = parse(&format!("bytes={start}-{end}"), total).unwrap().unwrap();

            prop_assert_eq!(range.start(), start);
            prop_assert_eq!(range.end(), end);
            prop_assert_eq!(range.len(), end - start + 1);
        }

        #[test]
        fn prop_start_past_end_of_resource_rejected(total in 0u64..1_000_000, extra in 0u64..1_000) {
            let start = total + extra;
            let result = parse(&format!("bytes={start}-"), total);
            prop_assert!(
                matches!(result, Err(StreamingError::RangeNotSatisfiable { .. })),
                "unexpected result for start {}",
                start
            );
        }
    }
}
