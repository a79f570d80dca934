//! Console: the logging facade bound to an output/error stream pair.

use crate::stream::OutputStream;
use std::fmt;
use tracing::debug;

/// Line-oriented logger writing to a fixed output/error pair.
///
/// Write failures are not reported to the caller.
pub struct Console {
    out: OutputStream,
    err: OutputStream,
}

impl Console {
    pub fn new(out: OutputStream, err: OutputStream) -> Self {
        Self { out, err }
    }

    /// Write a line to the output stream.
    pub fn log(&self, args: fmt::Arguments<'_>) {
        Self::line(&self.out, args);
    }

    pub fn info(&self, args: fmt::Arguments<'_>) {
        self.log(args);
    }

    /// Write a line to the error stream.
    pub fn error(&self, args: fmt::Arguments<'_>) {
        Self::line(&self.err, args);
    }

    pub fn warn(&self, args: fmt::Arguments<'_>) {
        self.error(args);
    }

    pub fn stdout(&self) -> &OutputStream {
        &self.out
    }

    pub fn stderr(&self) -> &OutputStream {
        &self.err
    }

    fn line(stream: &OutputStream, args: fmt::Arguments<'_>) {
        if let Err(err) = stream.write_fmt(format_args!("{}\n", args)) {
            debug!(stream = %stream.label(), error = %err, "console write failed");
        }
    }
}

impl fmt::Debug for Console {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Console")
            .field("out", &self.out)
            .field("err", &self.err)
            .finish()
    }
}
