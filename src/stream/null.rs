//! Discard stream.

use std::io::{self, SeekFrom};

use super::ByteStream;

/// Accepts and discards every byte written to it.
///
/// Off-limits samples are drained through their pipeline into this stream
/// so the hash taps still observe the full content.
pub struct DevNullStream {
    written: u64,
}

impl DevNullStream {
    pub fn new() -> Self {
        DevNullStream { written: 0 }
    }

    /// Bytes swallowed so far.
    pub fn written(&self) -> u64 {
        self.written
    }
}

impl Default for DevNullStream {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteStream for DevNullStream {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Ok(0)
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.written += buf.len() as u64;
        Ok(buf.len())
    }

    fn size(&self) -> io::Result<u64> {
        Ok(0)
    }

    fn seek(&mut self, _pos: SeekFrom) -> io::Result<u64> {
        Ok(0)
    }
}
