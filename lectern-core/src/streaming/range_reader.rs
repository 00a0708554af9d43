//! Bounded, forward-only reader over one byte interval of a file.
//!
//! The reader owns its file handle. The handle is released as soon as the
//! interval is exhausted, a read fails, [`ByteRangeReader::close`] is called,
//! or the reader is dropped (which is what happens when a client disconnects
//! and hyper drops the response body).

use std::io::SeekFrom;

use bytes::{Bytes, BytesMut};
use futures::{Stream, stream};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing::{debug, error, trace};

use super::{StreamingError, StreamingResult};
use crate::config::DEFAULT_READ_CHUNK_SIZE;

/// Lazy sequence of chunks covering exactly `count` bytes from `start`.
#[derive(Debug)]
pub struct ByteRangeReader {
    file: Option<File>,
    start: u64,
    bytes_remaining: u64,
    seeked: bool,
    chunk_size: usize,
}

impl ByteRangeReader {
    /// Creates a reader that will yield at most `count` bytes from `start`.
    ///
    /// Nothing is read or seeked until the first call to `next_chunk`.
    pub fn new(file: File, start: u64, count: u64) -> Self {
        Self {
            file: Some(file),
            start,
            bytes_remaining: count,
            seeked: false,
            chunk_size: DEFAULT_READ_CHUNK_SIZE,
        }
    }

    /// Sets the maximum size of each yielded chunk.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Bytes still to be delivered before the reader reports exhaustion.
    pub fn bytes_remaining(&self) -> u64 {
        self.bytes_remaining
    }

    /// Whether the underlying file handle has been released.
    pub fn is_closed(&self) -> bool {
        self.file.is_none()
    }

    /// Releases the file handle; subsequent calls to `next_chunk` yield `None`.
    pub fn close(&mut self) {
        if self.file.take().is_some() {
            trace!(
                "Closed range reader at offset {} with {} bytes undelivered",
                self.start,
                self.bytes_remaining
            );
        }
        self.bytes_remaining = 0;
    }

    /// Reads the next chunk of the interval.
    ///
    /// Returns `None` once `count` bytes were delivered, the file ended early,
    /// or the reader was closed. An `Err` is yielded at most once; the reader
    /// is closed afterwards.
    pub async fn next_chunk(&mut self) -> Option<StreamingResult<Bytes>> {
        if self.bytes_remaining == 0 {
            self.close();
            return None;
        }

        let result = self.read_chunk().await;
        match result {
            Ok(Some(chunk)) => {
                self.bytes_remaining -= chunk.len() as u64;
                if self.bytes_remaining == 0 {
                    self.close();
                }
                Some(Ok(chunk))
            }
            Ok(None) => {
                debug!(
                    "File ended with {} bytes of the range undelivered",
                    self.bytes_remaining
                );
                self.close();
                None
            }
            Err(e) => {
                error!("Range read failed at offset {}: {}", self.start, e);
                self.close();
                Some(Err(StreamingError::StreamIo(e)))
            }
        }
    }

    async fn read_chunk(&mut self) -> std::io::Result<Option<Bytes>> {
        let Some(file) = self.file.as_mut() else {
            return Ok(None);
        };

        if !self.seeked {
            file.seek(SeekFrom::Start(self.start)).await?;
            self.seeked = true;
        }

        let want = self.bytes_remaining.min(self.chunk_size as u64) as usize;
        let mut buffer = BytesMut::zeroed(want);
        let read = file.read(&mut buffer).await?;
        if read == 0 {
            return Ok(None);
        }

        buffer.truncate(read);
        self.start += read as u64;
        Ok(Some(buffer.freeze()))
    }

    /// Converts the reader into a stream suitable for `Body::from_stream`.
    ///
    /// Dropping the stream drops the reader and with it the file handle.
    pub fn into_stream(self) -> impl Stream<Item = StreamingResult<Bytes>> + Send + 'static {
        stream::unfold(self, |mut reader| async move {
            let chunk = reader.next_chunk().await?;
            Some((chunk, reader))
        })
    }
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;
    use tempfile::NamedTempFile;

    use super::*;

    fn sample_file(len: usize) -> (NamedTempFile, Vec<u8>) {
        let data: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), &data).unwrap();
        (file, data)
    }

    async fn collect(mut reader: ByteRangeReader) -> Vec<u8> {
        let mut out = Vec::new();
        while let Some(chunk) = reader.next_chunk().await {
            out.extend_from_slice(&chunk.unwrap());
        }
        assert!(reader.is_closed());
        out
    }

    #[tokio::test]
    async fn test_reads_exact_interval() {
        let (temp, data) = sample_file(1000);
        let file = File::open(temp.path()).await.unwrap();

        let bytes = collect(ByteRangeReader::new(file, 100, 100)).await;

        assert_eq!(bytes, &data[100..200]);
    }

    #[tokio::test]
    async fn test_never_reads_past_count() {
        let (temp, data) = sample_file(4096);
        let file = File::open(temp.path()).await.unwrap();
        let mut reader = ByteRangeReader::new(file, 10, 5).with_chunk_size(1024);

        let chunk = reader.next_chunk().await.unwrap().unwrap();
        assert_eq!(&chunk[..], &data[10..15]);
        assert_eq!(reader.bytes_remaining(), 0);
        assert!(reader.is_closed());
        assert!(reader.next_chunk().await.is_none());
    }

    #[tokio::test]
    async fn test_small_chunks_cover_whole_range() {
        let (temp, data) = sample_file(1000);
        let file = File::open(temp.path()).await.unwrap();
        let reader = ByteRangeReader::new(file, 0, 1000).with_chunk_size(7);

        let chunks: Vec<_> = reader.into_stream().collect().await;

        assert_eq!(chunks.len(), 143);
        let joined: Vec<u8> = chunks
            .into_iter()
            .flat_map(|chunk| chunk.unwrap().to_vec())
            .collect();
        assert_eq!(joined, data);
    }

    #[tokio::test]
    async fn test_stops_at_end_of_file() {
        let (temp, data) = sample_file(50);
        let file = File::open(temp.path()).await.unwrap();

        let bytes = collect(ByteRangeReader::new(file, 40, 100)).await;

        assert_eq!(bytes, &data[40..50]);
    }

    #[tokio::test]
    async fn test_zero_count_yields_nothing() {
        let (temp, _) = sample_file(10);
        let file = File::open(temp.path()).await.unwrap();
        let mut reader = ByteRangeReader::new(file, 0, 0);

        assert!(reader.next_chunk().await.is_none());
        assert!(reader.is_closed());
    }

    #[tokio::test]
    async fn test_close_releases_handle_early() {
        let (temp, _) = sample_file(1000);
        let file = File::open(temp.path()).await.unwrap();
        let mut reader = ByteRangeReader::new(file, 0, 1000).with_chunk_size(100);

        assert!(reader.next_chunk().await.is_some());
        reader.close();

        assert!(reader.is_closed());
        assert_eq!(reader.bytes_remaining(), 0);
        assert!(reader.next_chunk().await.is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_read_failure_yields_one_error_then_closes() {
        let temp = tempfile::tempdir().unwrap();
        // Opening a directory succeeds on unix, reading it fails with EISDIR.
        let file = File::open(temp.path()).await.unwrap();
        let mut reader = ByteRangeReader::new(file, 0, 100);

        assert!(matches!(
            reader.next_chunk().await,
            Some(Err(StreamingError::StreamIo(_)))
        ));
        assert!(reader.is_closed());
        assert!(reader.next_chunk().await.is_none());
    }

    #[tokio::test]
    async fn test_fresh_readers_are_independent() {
        let (temp, data) = sample_file(500);

        let first = collect(ByteRangeReader::new(
            File::open(temp.path()).await.unwrap(),
            200,
            50,
        ))
        .await;
        let second = collect(ByteRangeReader::new(
            File::open(temp.path()).await.unwrap(),
            200,
            50,
        ))
        .await;

        assert_eq!(first, second);
        assert_eq!(first, &data[200..250]);
    }
}
