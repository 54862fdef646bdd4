//! In-memory file with controllable byte availability, standing in for
//! piece-by-piece arrival from a swarm.

use std::io::{self, SeekFrom};
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, Waker};

use tokio::io::{AsyncRead, AsyncSeek, ReadBuf};

struct GateShared {
    data: Vec<u8>,
    available: AtomicU64,
    wakers: Mutex<Vec<Waker>>,
}

/// Byte buffer whose prefix availability is raised over time. Readers block
/// on bytes past the availability watermark, exactly like a torrent reader
/// blocking on an undownloaded piece.
#[derive(Clone)]
pub struct GatedFile {
    shared: Arc<GateShared>,
}

impl GatedFile {
    /// New gated file with no bytes available yet.
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            shared: Arc::new(GateShared {
                data,
                available: AtomicU64::new(0),
                wakers: Mutex::new(Vec::new()),
            }),
        }
    }

    /// New gated file with every byte immediately readable.
    pub fn fully_available(data: Vec<u8>) -> Self {
        let file = Self::new(data);
        file.set_available(file.len());
        file
    }

    pub fn len(&self) -> u64 {
        self.shared.data.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.shared.data.is_empty()
    }

    /// Bytes currently readable from the start of the file.
    pub fn available(&self) -> u64 {
        self.shared.available.load(Ordering::SeqCst).min(self.len())
    }

    /// Raise the availability watermark and wake parked readers.
    pub fn set_available(&self, bytes: u64) {
        self.shared.available.store(bytes, Ordering::SeqCst);
        for waker in self.shared.wakers.lock().unwrap().drain(..) {
            waker.wake();
        }
    }

    /// A new independent reader with its own cursor.
    pub fn reader(&self) -> GatedReader {
        GatedReader {
            shared: Arc::clone(&self.shared),
            position: 0,
        }
    }
}

/// Cursor over a [`GatedFile`].
pub struct GatedReader {
    shared: Arc<GateShared>,
    position: u64,
}

impl GatedReader {
    /// Copy the readable span under the cursor into `buf`.
    fn copy_out(&mut self, buf: &mut ReadBuf<'_>, available: u64) {
        let len = self.shared.data.len() as u64;
        let start = self.position as usize;
        let end = available.min(len) as usize;
        let n = (end - start).min(buf.remaining());
        buf.put_slice(&self.shared.data[start..start + n]);
        self.position += n as u64;
    }
}

impl AsyncRead for GatedReader {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();

        let len = this.shared.data.len() as u64;
        if this.position >= len {
            return Poll::Ready(Ok(()));
        }

        let available = this.shared.available.load(Ordering::SeqCst);
        if this.position < available {
            this.copy_out(buf, available);
            return Poll::Ready(Ok(()));
        }

        // Park until the watermark moves; re-check afterwards so a wakeup
        // racing the registration is not lost.
        this.shared.wakers.lock().unwrap().push(cx.waker().clone());
        let available = this.shared.available.load(Ordering::SeqCst);
        if this.position < available {
            this.copy_out(buf, available);
            return Poll::Ready(Ok(()));
        }

        Poll::Pending
    }
}

impl AsyncSeek for GatedReader {
    fn start_seek(mut self: Pin<&mut Self>, position: SeekFrom) -> io::Result<()> {
        let len = self.shared.data.len() as i64;
        let target = match position {
            SeekFrom::Start(offset) => offset as i64,
            SeekFrom::End(delta) => len + delta,
            SeekFrom::Current(delta) => self.position as i64 + delta,
        };

        if target < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek before start of file",
            ));
        }

        self.position = target as u64;
        Ok(())
    }

    fn poll_complete(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<u64>> {
        Poll::Ready(Ok(self.position))
    }
}
