//! Memory-backed stream that spills to disk past a threshold.

use std::fs::File;
use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};

use super::ByteStream;
use crate::constants::TEMP_STREAM_SPILL_THRESHOLD;

enum Backing {
    Memory(Cursor<Vec<u8>>),
    Disk(File),
}

/// A read/write scratch stream.
///
/// Contents stay in memory until they grow past the spill threshold, then
/// move to an anonymous temporary file which the OS reclaims on drop. The
/// index table and the collection transcript are buffered here before the
/// sink appends them to the container.
pub struct TemporaryStream {
    backing: Backing,
    spill_threshold: usize,
    len: u64,
}

impl TemporaryStream {
    pub fn new() -> Self {
        Self::with_spill_threshold(TEMP_STREAM_SPILL_THRESHOLD)
    }

    /// A stream that spills once its contents exceed `threshold` bytes.
    pub fn with_spill_threshold(threshold: usize) -> Self {
        TemporaryStream {
            backing: Backing::Memory(Cursor::new(Vec::new())),
            spill_threshold: threshold,
            len: 0,
        }
    }

    /// True once contents have moved to a temporary file.
    pub fn spilled(&self) -> bool {
        matches!(self.backing, Backing::Disk(_))
    }

    fn spill(&mut self) -> io::Result<()> {
        if let Backing::Memory(cursor) = &mut self.backing {
            let pos = cursor.position();
            let mut file = tempfile::tempfile()?;
            file.write_all(cursor.get_ref())?;
            file.seek(SeekFrom::Start(pos))?;
            self.backing = Backing::Disk(file);
        }
        Ok(())
    }
}

impl Default for TemporaryStream {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteStream for TemporaryStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.backing {
            Backing::Memory(cursor) => cursor.read(buf),
            Backing::Disk(file) => file.read(buf),
        }
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Backing::Memory(cursor) = &self.backing {
            let projected = cursor.position() as usize + buf.len();
            if projected > self.spill_threshold {
                self.spill()?;
            }
        }
        let (n, pos) = match &mut self.backing {
            Backing::Memory(cursor) => {
                let n = cursor.write(buf)?;
                (n, cursor.position())
            }
            Backing::Disk(file) => {
                let n = file.write(buf)?;
                (n, file.stream_position()?)
            }
        };
        self.len = self.len.max(pos);
        Ok(n)
    }

    fn size(&self) -> io::Result<u64> {
        Ok(self.len)
    }

    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match &mut self.backing {
            Backing::Memory(cursor) => cursor.seek(pos),
            Backing::Disk(file) => file.seek(pos),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stays_in_memory_under_threshold() {
        let mut stream = TemporaryStream::with_spill_threshold(1024);
        stream.write_all(&[7u8; 512]).unwrap();
        assert!(!stream.spilled());
        assert_eq!(stream.size().unwrap(), 512);
    }

    #[test]
    fn test_spills_past_threshold_and_preserves_content() {
        let mut stream = TemporaryStream::with_spill_threshold(64);
        let payload: Vec<u8> = (0..200u8).collect();
        stream.write_all(&payload).unwrap();
        assert!(stream.spilled());
        assert_eq!(stream.size().unwrap(), 200);

        stream.seek(SeekFrom::Start(0)).unwrap();
        let mut back = Vec::new();
        let mut buf = [0u8; 32];
        loop {
            let n = stream.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            back.extend_from_slice(&buf[..n]);
        }
        assert_eq!(back, payload);
    }

    #[test]
    fn test_rewind_then_overwrite_keeps_max_len() {
        let mut stream = TemporaryStream::with_spill_threshold(1024);
        stream.write_all(b"0123456789").unwrap();
        stream.seek(SeekFrom::Start(0)).unwrap();
        stream.write_all(b"ab").unwrap();
        assert_eq!(stream.size().unwrap(), 10);
    }
}
