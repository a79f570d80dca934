//! In-memory sink for capturing what a scoped task writes.

use super::OutputStream;
use parking_lot::Mutex;
use std::io::{self, Write};
use std::sync::Arc;

struct CaptureWriter(Arc<Mutex<Vec<u8>>>);

impl Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Buffer that records everything written to its [`OutputStream`].
#[derive(Clone)]
pub struct Capture {
    buffer: Arc<Mutex<Vec<u8>>>,
    stream: OutputStream,
}

impl Capture {
    pub fn new() -> Self {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let stream = OutputStream::labeled("capture", CaptureWriter(buffer.clone()));
        Self { buffer, stream }
    }

    /// The stream writing into this buffer. Always the same handle.
    pub fn stream(&self) -> OutputStream {
        self.stream.clone()
    }

    /// Everything written so far, lossily decoded.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock()).into_owned()
    }

    /// Drain the buffer, returning what was written since the last take.
    pub fn take(&self) -> String {
        let bytes = std::mem::take(&mut *self.buffer.lock());
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl Default for Capture {
    fn default() -> Self {
        Self::new()
    }
}
