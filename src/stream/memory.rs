//! In-memory byte stream.

use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};

use super::ByteStream;

/// A stream over an owned byte buffer. Used for small payloads and as a
/// test double for attribute data streams.
pub struct MemoryStream {
    cursor: Cursor<Vec<u8>>,
}

impl MemoryStream {
    /// Empty, writable stream.
    pub fn new() -> Self {
        MemoryStream {
            cursor: Cursor::new(Vec::new()),
        }
    }

    /// Stream positioned at the start of `data`.
    pub fn from_vec(data: Vec<u8>) -> Self {
        MemoryStream {
            cursor: Cursor::new(data),
        }
    }

    /// Bytes currently held by the stream.
    pub fn data(&self) -> &[u8] {
        self.cursor.get_ref()
    }
}

impl Default for MemoryStream {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteStream for MemoryStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.cursor.read(buf)
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.cursor.write(buf)
    }

    fn size(&self) -> io::Result<u64> {
        Ok(self.cursor.get_ref().len() as u64)
    }

    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.cursor.seek(pos)
    }
}
