//! Stream Handles
//!
//! Shared, identity-comparable handles around caller-supplied `Read` and
//! `Write` implementations. Handles are what environment slots hold: cloning a
//! handle shares the underlying stream, and two handles are "the same stream"
//! only when they come from the same construction.

mod capture;
mod placeholder;

pub use capture::Capture;

use parking_lot::Mutex;
use std::fmt;
use std::io::{self, Cursor, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

struct SourceInner {
    label: String,
    reader: Mutex<Box<dyn Read + Send>>,
    ended: AtomicBool,
}

/// A readable stream suitable for the input slot.
#[derive(Clone)]
pub struct InputStream(Arc<SourceInner>);

impl InputStream {
    pub fn new<R: Read + Send + 'static>(reader: R) -> Self {
        Self::labeled("reader", reader)
    }

    /// Wrap `reader`, naming it for diagnostics.
    pub fn labeled<R: Read + Send + 'static>(label: impl Into<String>, reader: R) -> Self {
        Self(Arc::new(SourceInner {
            label: label.into(),
            reader: Mutex::new(Box::new(reader)),
            ended: AtomicBool::new(false),
        }))
    }

    /// In-memory source yielding `bytes` and then end-of-input.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::labeled("bytes", Cursor::new(bytes.into()))
    }

    pub fn read(&self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.0.reader.lock().read(buf)?;
        if n == 0 && !buf.is_empty() {
            self.0.ended.store(true, Ordering::Release);
        }
        Ok(n)
    }

    /// Read until end-of-input.
    pub fn read_to_string(&self) -> io::Result<String> {
        let mut out = String::new();
        self.0.reader.lock().read_to_string(&mut out)?;
        self.0.ended.store(true, Ordering::Release);
        Ok(out)
    }

    /// Whether a read has observed end-of-input.
    pub fn is_ended(&self) -> bool {
        self.0.ended.load(Ordering::Acquire)
    }

    pub fn label(&self) -> &str {
        &self.0.label
    }

    /// Identity comparison: true only for clones of the same handle.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }
}

impl Read for &InputStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        InputStream::read(*self, buf)
    }
}

impl fmt::Debug for InputStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("InputStream").field(&self.0.label).finish()
    }
}

struct SinkInner {
    label: String,
    writer: Mutex<Box<dyn Write + Send>>,
}

/// A writable stream suitable for the output and error slots.
#[derive(Clone)]
pub struct OutputStream(Arc<SinkInner>);

impl OutputStream {
    pub fn new<W: Write + Send + 'static>(writer: W) -> Self {
        Self::labeled("writer", writer)
    }

    /// Wrap `writer`, naming it for diagnostics.
    pub fn labeled<W: Write + Send + 'static>(label: impl Into<String>, writer: W) -> Self {
        Self(Arc::new(SinkInner {
            label: label.into(),
            writer: Mutex::new(Box::new(writer)),
        }))
    }

    pub fn write(&self, buf: &[u8]) -> io::Result<usize> {
        self.0.writer.lock().write(buf)
    }

    pub fn write_all(&self, buf: &[u8]) -> io::Result<()> {
        self.0.writer.lock().write_all(buf)
    }

    pub fn write_str(&self, s: &str) -> io::Result<()> {
        self.write_all(s.as_bytes())
    }

    /// Write formatted text under a single lock, so concurrent lines do not interleave.
    pub fn write_fmt(&self, args: fmt::Arguments<'_>) -> io::Result<()> {
        self.0.writer.lock().write_fmt(args)
    }

    pub fn flush(&self) -> io::Result<()> {
        self.0.writer.lock().flush()
    }

    pub fn label(&self) -> &str {
        &self.0.label
    }

    /// Identity comparison: true only for clones of the same handle.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }
}

impl Write for &OutputStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        OutputStream::write(*self, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        OutputStream::flush(*self)
    }
}

impl fmt::Debug for OutputStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("OutputStream").field(&self.0.label).finish()
    }
}

/// A caller-supplied stream of unknown direction, checked against the slot it
/// is configured for.
#[derive(Debug, Clone)]
pub enum StreamHandle {
    Readable(InputStream),
    Writable(OutputStream),
}

impl From<InputStream> for StreamHandle {
    fn from(stream: InputStream) -> Self {
        StreamHandle::Readable(stream)
    }
}

impl From<OutputStream> for StreamHandle {
    fn from(stream: OutputStream) -> Self {
        StreamHandle::Writable(stream)
    }
}

impl From<&Capture> for StreamHandle {
    fn from(capture: &Capture) -> Self {
        StreamHandle::Writable(capture.stream())
    }
}
