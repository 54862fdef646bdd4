//! Piece-aware random-access reader over one file inside a torrent.

use std::io::{self, SeekFrom};
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::task::AtomicWaker;
use tokio::io::{AsyncRead, AsyncSeek, AsyncSeekExt, ReadBuf};

use super::SessionError;

/// Raw byte source backing a [`StreamReader`]: the engine's per-file stream
/// in production, an in-memory double in tests. Reads on a missing region
/// park until the swarm delivers it.
pub trait RawFileReader: AsyncRead + AsyncSeek + Send + Unpin {}

impl<T: AsyncRead + AsyncSeek + Send + Unpin> RawFileReader for T {}

/// Shared close flag; wakes a parked read so it can fail promptly.
#[derive(Default)]
struct CloseFlag {
    closed: AtomicBool,
    waker: AtomicWaker,
}

/// Closes the owning [`StreamReader`] from another task.
///
/// Used by the HTTP layer to tear a stream down on cancellation without
/// waiting for the next piece to arrive.
#[derive(Clone)]
pub struct CloseHandle {
    flag: Arc<CloseFlag>,
}

impl CloseHandle {
    /// Fail the reader's current and future reads.
    pub fn close(&self) {
        self.flag.closed.store(true, Ordering::SeqCst);
        self.flag.waker.wake();
    }
}

/// Seekable, piece-aware reader over exactly one file.
///
/// `seek` only moves the cursor and never touches the network. A read
/// returns immediately when the bytes under the cursor are already on disk;
/// otherwise it parks until the session downloads the piece holding the
/// cursor, which the engine prioritizes (together with a short read-ahead
/// window) while the reader exists. Dropping the reader withdraws that
/// hint. Each reader has a single consumer; open several readers for
/// concurrent streams over the same file.
pub struct StreamReader {
    inner: Box<dyn RawFileReader>,
    length: u64,
    position: u64,
    flag: Arc<CloseFlag>,
}

impl std::fmt::Debug for StreamReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamReader")
            .field("length", &self.length)
            .field("position", &self.position)
            .finish()
    }
}

impl StreamReader {
    /// Wrap a raw per-file stream of `length` bytes, cursor at 0.
    pub fn new(inner: Box<dyn RawFileReader>, length: u64) -> Self {
        Self {
            inner,
            length,
            position: 0,
            flag: Arc::new(CloseFlag::default()),
        }
    }

    /// Length of the underlying file in bytes.
    pub fn length(&self) -> u64 {
        self.length
    }

    /// Current cursor offset.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Handle for closing this reader from another task.
    pub fn close_handle(&self) -> CloseHandle {
        CloseHandle {
            flag: Arc::clone(&self.flag),
        }
    }

    /// Close the reader; subsequent reads fail.
    pub fn close(&self) {
        self.close_handle().close();
    }

    fn is_closed(&self) -> bool {
        self.flag.closed.load(Ordering::SeqCst)
    }

    /// Move the cursor. Never blocks on piece availability; offsets outside
    /// `[0, length]` are rejected.
    pub async fn seek(&mut self, pos: SeekFrom) -> Result<u64, SessionError> {
        if self.is_closed() {
            return Err(SessionError::ReaderClosed);
        }

        let target = match pos {
            SeekFrom::Start(offset) => offset as i64,
            SeekFrom::End(delta) => self.length as i64 + delta,
            SeekFrom::Current(delta) => self.position as i64 + delta,
        };

        if target < 0 || target as u64 > self.length {
            return Err(SessionError::RangeOutOfBounds {
                offset: target,
                length: self.length,
            });
        }

        let target = target as u64;
        self.inner.seek(SeekFrom::Start(target)).await?;
        self.position = target;
        Ok(target)
    }
}

impl AsyncRead for StreamReader {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();

        if this.is_closed() {
            return Poll::Ready(Err(closed_error()));
        }

        let remaining = this.length.saturating_sub(this.position);
        if remaining == 0 || buf.remaining() == 0 {
            // Cursor at or past the file length: clean end of stream.
            return Poll::Ready(Ok(()));
        }

        let limit = remaining.min(buf.remaining() as u64) as usize;
        let mut limited = buf.take(limit);

        match Pin::new(&mut this.inner).poll_read(cx, &mut limited) {
            Poll::Ready(Ok(())) => {
                let filled = limited.filled().len();
                // Safety: `limited` borrows `buf`'s unfilled region, and
                // exactly `filled` of its bytes were initialized by the
                // inner reader.
                unsafe { buf.assume_init(filled) };
                buf.advance(filled);
                this.position += filled as u64;
                Poll::Ready(Ok(()))
            }
            Poll::Ready(Err(e)) => Poll::Ready(Err(e)),
            Poll::Pending => {
                // Parked on a missing piece. Register with the close flag so
                // close() can fail this read without waiting for data.
                this.flag.waker.register(cx.waker());
                if this.is_closed() {
                    return Poll::Ready(Err(closed_error()));
                }
                Poll::Pending
            }
        }
    }
}

fn closed_error() -> io::Error {
    io::Error::new(io::ErrorKind::Other, SessionError::ReaderClosed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::GatedFile;
    use std::time::Duration;
    use tokio::io::AsyncReadExt;

    fn bytes(n: usize) -> Vec<u8> {
        (0..n).map(|i| (i % 251) as u8).collect()
    }

    fn available_reader(data: Vec<u8>) -> StreamReader {
        let len = data.len() as u64;
        let gate = GatedFile::new(data);
        gate.set_available(len);
        StreamReader::new(Box::new(gate.reader()), len)
    }

    #[tokio::test]
    async fn test_read_to_end() {
        let data = bytes(10_000);
        let mut reader = available_reader(data.clone());

        let mut out = Vec::new();
        reader.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, data);
    }

    #[tokio::test]
    async fn test_seek_then_read_returns_bytes_at_offset() {
        let data = bytes(10_000);
        let mut reader = available_reader(data.clone());

        let pos = reader.seek(SeekFrom::Start(5000)).await.unwrap();
        assert_eq!(pos, 5000);

        let mut out = [0u8; 16];
        reader.read_exact(&mut out).await.unwrap();
        assert_eq!(&out[..], &data[5000..5016]);
        assert_eq!(reader.position(), 5016);
    }

    #[tokio::test]
    async fn test_seek_variants() {
        let mut reader = available_reader(bytes(1000));

        assert_eq!(reader.seek(SeekFrom::End(-100)).await.unwrap(), 900);
        assert_eq!(reader.seek(SeekFrom::Current(-400)).await.unwrap(), 500);
        assert_eq!(reader.seek(SeekFrom::Current(100)).await.unwrap(), 600);
        assert_eq!(reader.seek(SeekFrom::End(0)).await.unwrap(), 1000);
    }

    #[tokio::test]
    async fn test_seek_out_of_bounds() {
        let mut reader = available_reader(bytes(1000));

        let err = reader.seek(SeekFrom::Start(1001)).await.unwrap_err();
        assert!(matches!(err, SessionError::RangeOutOfBounds { .. }));

        let err = reader.seek(SeekFrom::Current(-1)).await.unwrap_err();
        assert!(matches!(err, SessionError::RangeOutOfBounds { .. }));

        // A failed seek leaves the cursor in place.
        assert_eq!(reader.position(), 0);
    }

    #[tokio::test]
    async fn test_read_at_end_returns_zero() {
        let mut reader = available_reader(bytes(100));
        reader.seek(SeekFrom::End(0)).await.unwrap();

        let mut buf = [0u8; 8];
        let n = reader.read(&mut buf).await.unwrap();
        assert_eq!(n, 0);
    }

    #[tokio::test]
    async fn test_read_blocks_until_bytes_arrive() {
        let data = bytes(1000);
        let gate = GatedFile::new(data.clone());
        let mut reader = StreamReader::new(Box::new(gate.reader()), 1000);

        let handle = tokio::spawn(async move {
            let mut buf = [0u8; 100];
            let n = reader.read(&mut buf).await.unwrap();
            (n, buf)
        });

        // The read parks while no bytes are available.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!handle.is_finished());

        gate.set_available(200);
        let (n, buf) = handle.await.unwrap();
        assert!(n > 0);
        assert_eq!(&buf[..n], &data[..n]);
    }

    #[tokio::test]
    async fn test_close_fails_inflight_read() {
        let gate = GatedFile::new(bytes(1000));
        let mut reader = StreamReader::new(Box::new(gate.reader()), 1000);
        let close = reader.close_handle();

        let handle = tokio::spawn(async move {
            let mut buf = [0u8; 100];
            reader.read(&mut buf).await
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        close.close();

        let result = tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("read did not fail after close")
            .unwrap();
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_read_after_close_fails() {
        let mut reader = available_reader(bytes(100));
        reader.close();

        let mut buf = [0u8; 8];
        assert!(reader.read(&mut buf).await.is_err());
        assert!(matches!(
            reader.seek(SeekFrom::Start(0)).await.unwrap_err(),
            SessionError::ReaderClosed
        ));
    }

    #[tokio::test]
    async fn test_read_clamped_to_file_length() {
        // The raw source is longer than the declared file length; the
        // reader must not serve bytes past it.
        let data = bytes(200);
        let gate = GatedFile::new(data.clone());
        gate.set_available(200);
        let mut reader = StreamReader::new(Box::new(gate.reader()), 150);

        let mut out = Vec::new();
        reader.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, &data[..150]);
    }

    #[tokio::test]
    async fn test_multiple_readers_one_file() {
        let data = bytes(5000);
        let gate = GatedFile::new(data.clone());
        gate.set_available(5000);

        let mut first = StreamReader::new(Box::new(gate.reader()), 5000);
        let mut second = StreamReader::new(Box::new(gate.reader()), 5000);

        first.seek(SeekFrom::Start(4000)).await.unwrap();
        let mut a = [0u8; 10];
        first.read_exact(&mut a).await.unwrap();

        let mut b = [0u8; 10];
        second.read_exact(&mut b).await.unwrap();

        assert_eq!(&a[..], &data[4000..4010]);
        assert_eq!(&b[..], &data[..10]);
    }
}
