//! Placeholder streams installed for slots configured as null.

use super::{InputStream, OutputStream};
use std::io;

impl InputStream {
    /// A source with no data. End-of-input is reported on the first read
    /// request, not when the stream is created or installed.
    pub fn empty() -> Self {
        Self::labeled("empty", io::empty())
    }
}

impl OutputStream {
    /// A sink that accepts and drops everything written to it.
    pub fn discard() -> Self {
        Self::labeled("discard", io::sink())
    }
}
