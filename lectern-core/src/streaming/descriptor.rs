//! Per-request description of what is about to be streamed.

use std::time::SystemTime;

use axum::http::response::Builder;
use axum::http::{StatusCode, header};
use chrono::{DateTime, Utc};

use super::ByteRange;

/// Fully determines the status and headers of a media response.
///
/// Built once per request after range classification and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamDescriptor {
    file_name: String,
    content_type: String,
    total_size: u64,
    range: Option<ByteRange>,
    last_modified: Option<DateTime<Utc>>,
}

impl StreamDescriptor {
    /// Creates a descriptor. `range` must have been parsed against `total_size`.
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        total_size: u64,
        range: Option<ByteRange>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            total_size,
            range,
            last_modified: None,
        }
    }

    /// Attaches the file's modification time for `Last-Modified`.
    pub fn with_last_modified(mut self, modified: Option<SystemTime>) -> Self {
        self.last_modified = modified.map(DateTime::<Utc>::from);
        self
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    pub fn range(&self) -> Option<ByteRange> {
        self.range
    }

    /// 206 for a sub-range, 200 for the whole resource.
    pub fn status(&self) -> StatusCode {
        if self.range.is_some() {
            StatusCode::PARTIAL_CONTENT
        } else {
            StatusCode::OK
        }
    }

    /// First byte offset of the body within the file.
    pub fn body_offset(&self) -> u64 {
        self.range.map_or(0, |range| range.start())
    }

    /// Number of body bytes, i.e. the `Content-Length`.
    pub fn content_length(&self) -> u64 {
        self.range.map_or(self.total_size, |range| range.len())
    }

    /// `Content-Disposition` value that keeps the browser playing inline.
    ///
    /// Quotes and backslashes are escaped and control characters dropped.
    /// Non-ASCII names get an ASCII fallback plus an RFC 5987 `filename*`.
    pub fn content_disposition(&self) -> String {
        let mut fallback = String::with_capacity(self.file_name.len());
        for c in self.file_name.chars() {
            match c {
                '"' | '\\' => {
                    fallback.push('\\');
                    fallback.push(c);
                }
                c if c.is_control() => {}
                c if c.is_ascii() => fallback.push(c),
                _ => fallback.push('_'),
            }
        }

        if self.file_name.is_ascii() {
            format!("inline; filename=\"{fallback}\"")
        } else {
            format!(
                "inline; filename=\"{fallback}\"; filename*=UTF-8''{}",
                urlencoding::encode(&self.file_name)
            )
        }
    }

    /// HTTP-date for `Last-Modified`, if the modification time is known.
    pub fn last_modified(&self) -> Option<String> {
        self.last_modified
            .map(|time| time.format("%a, %d %b %Y %H:%M:%S GMT").to_string())
    }

    /// Applies status and every header this descriptor determines.
    pub fn apply(&self, builder: Builder) -> Builder {
        let mut builder = builder
            .status(self.status())
            .header(header::CONTENT_TYPE, &self.content_type)
            .header(header::CONTENT_LENGTH, self.content_length())
            .header(header::ACCEPT_RANGES, "bytes")
            .header(header::CONTENT_DISPOSITION, self.content_disposition());

        if let Some(range) = self.range {
            builder = builder.header(header::CONTENT_RANGE, range.content_range());
        }
        if let Some(modified) = self.last_modified() {
            builder = builder.header(header::LAST_MODIFIED, modified);
        }

        builder
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, UNIX_EPOCH};

    use super::*;

    #[test]
    fn test_full_body_descriptor() {
        let descriptor = StreamDescriptor::new("v.mp4", "video/mp4", 1000, None);

        assert_eq!(descriptor.status(), StatusCode::OK);
        assert_eq!(descriptor.content_length(), 1000);
        assert_eq!(descriptor.body_offset(), 0);
        assert_eq!(
            descriptor.content_disposition(),
            "inline; filename=\"v.mp4\""
        );
    }

    #[test]
    fn test_partial_body_descriptor() {
        let range = ByteRange::new(100, 199, 1000).unwrap();
        let descriptor = StreamDescriptor::new("v.mp4", "video/mp4", 1000, Some(range));

        assert_eq!(descriptor.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(descriptor.content_length(), 100);
        assert_eq!(descriptor.body_offset(), 100);
    }

    #[test]
    fn test_apply_sets_range_headers() {
        let range = ByteRange::new(999, 999, 1000).unwrap();
        let descriptor = StreamDescriptor::new("v.mp4", "video/mp4", 1000, Some(range));

        let response = descriptor
            .apply(axum::http::Response::builder())
            .body(())
            .unwrap();

        let headers = response.headers();
        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(headers[header::CONTENT_RANGE], "bytes 999-999/1000");
        assert_eq!(headers[header::CONTENT_LENGTH], "1");
        assert_eq!(headers[header::ACCEPT_RANGES], "bytes");
        assert_eq!(headers[header::CONTENT_TYPE], "video/mp4");
        assert!(headers.get(header::LAST_MODIFIED).is_none());
    }

    #[test]
    fn test_content_disposition_escapes_name() {
        let quoted = StreamDescriptor::new("a \"b\".mp4", "video/mp4", 1, None);
        assert_eq!(
            quoted.content_disposition(),
            "inline; filename=\"a \\\"b\\\".mp4\""
        );

        let unicode = StreamDescriptor::new("café.mp4", "video/mp4", 1, None);
        assert_eq!(
            unicode.content_disposition(),
            "inline; filename=\"caf_.mp4\"; filename*=UTF-8''caf%C3%A9.mp4"
        );
    }

    #[test]
    fn test_last_modified_is_http_date() {
        let modified = UNIX_EPOCH + Duration::from_secs(784_111_777);
        let descriptor =
            StreamDescriptor::new("v.mp4", "video/mp4", 1, None).with_last_modified(Some(modified));

        assert_eq!(
            descriptor.last_modified().unwrap(),
            "Sun, 06 Nov 1994 08:49:37 GMT"
        );
    }
}
