//! Shared byte-stream handles for stream-backed sources and targets.
//!
//! A job never owns the only reference to a caller's stream: the caller
//! keeps a clone of the [`StreamHandle`] and the job captures another. The
//! engine reads or writes through its clone; when a source or target is
//! flagged close-on-completion, dropping it closes the underlying stream.
//!
//! Closing is idempotent. The boxed reader or writer is taken out of the
//! shared slot and dropped by the first `close`; later calls
//! find the slot empty and do nothing, so the stream is closed exactly once
//! whichever owner gets there first. Reading from or writing to a closed
//! handle fails with [`std::io::ErrorKind::BrokenPipe`].

use std::fmt;
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex, MutexGuard};

/// A cloneable, shared handle over a boxed stream.
///
/// Use the [`InputStream`] and [`OutputStream`] aliases.
pub struct StreamHandle<S: ?Sized> {
    slot: Arc<Mutex<Option<Box<S>>>>,
}

/// Handle over a readable stream, used by stream-backed sources.
pub type InputStream = StreamHandle<dyn Read + Send>;

/// Handle over a writable stream, used by stream-backed targets.
pub type OutputStream = StreamHandle<dyn Write + Send>;

impl<S: ?Sized> StreamHandle<S> {
    fn from_box(stream: Box<S>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(stream))),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Box<S>>> {
        // A panic while holding the lock cannot leave the Option half-written.
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Whether the underlying stream is still open.
    pub fn is_open(&self) -> bool {
        self.lock().is_some()
    }

    /// Whether both handles refer to the same underlying stream.
    pub fn same_stream(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.slot, &other.slot)
    }

    fn take(&self) -> Option<Box<S>> {
        self.lock().take()
    }
}

impl InputStream {
    /// Wrap a reader.
    pub fn new(reader: impl Read + Send + 'static) -> Self {
        Self::from_box(Box::new(reader))
    }

    /// Close the stream by dropping the reader.
    ///
    /// Returns `true` if this call closed it, `false` if it was already closed.
    pub fn close(&self) -> bool {
        self.take().is_some()
    }
}

impl OutputStream {
    /// Wrap a writer.
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self::from_box(Box::new(writer))
    }

    /// Flush and close the stream by dropping the writer.
    ///
    /// Returns `Ok(true)` if this call closed it and `Ok(false)` if it was
    /// already closed. The writer is dropped even when the flush fails.
    pub fn close(&self) -> io::Result<bool> {
        match self.take() {
            Some(mut writer) => writer.flush().map(|()| true),
            None => Ok(false),
        }
    }
}

fn closed_error() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "stream is closed")
}

impl Read for &InputStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.lock().as_mut() {
            Some(reader) => reader.read(buf),
            None => Err(closed_error()),
        }
    }
}

impl Read for InputStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (&*self).read(buf)
    }
}

impl Write for &OutputStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.lock().as_mut() {
            Some(writer) => writer.write(buf),
            None => Err(closed_error()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.lock().as_mut() {
            Some(writer) => writer.flush(),
            None => Err(closed_error()),
        }
    }
}

impl Write for OutputStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        (&*self).write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        (&*self).flush()
    }
}

impl<S: ?Sized> Clone for StreamHandle<S> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<S: ?Sized> fmt::Debug for StreamHandle<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamHandle")
            .field("open", &self.is_open())
            .field("handles", &Arc::strong_count(&self.slot))
            .finish()
    }
}
