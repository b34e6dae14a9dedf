//! Printable-string extraction stream.

use std::io::{self, SeekFrom};

use super::{ByteStream, SharedStream};
use crate::constants::COPY_BUFFER_SIZE;

/// Extracts printable ASCII runs from an underlying stream.
///
/// A run is a maximal sequence of bytes in `0x20..=0x7E`. Runs of at least
/// `min_chars` characters are emitted newline-terminated; runs longer than
/// `max_chars` are truncated to `max_chars` and emitted once. `size()`
/// reports the underlying source size, which is what budget arbitration
/// keys on.
pub struct StringsStream {
    inner: SharedStream,
    min_chars: usize,
    max_chars: usize,
    run: Vec<u8>,
    pending: Vec<u8>,
    pending_pos: usize,
    source_done: bool,
}

impl StringsStream {
    /// Wrap `inner` with run bounds. `max_chars == 0` means unbounded.
    pub fn open(inner: SharedStream, min_chars: u32, max_chars: u32) -> Self {
        StringsStream {
            inner,
            min_chars: (min_chars.max(1)) as usize,
            max_chars: if max_chars == 0 {
                usize::MAX
            } else {
                max_chars as usize
            },
            run: Vec::new(),
            pending: Vec::new(),
            pending_pos: 0,
            source_done: false,
        }
    }

    fn flush_run(&mut self) {
        if self.run.len() >= self.min_chars {
            self.pending.extend_from_slice(&self.run);
            self.pending.push(b'\n');
        }
        self.run.clear();
    }

    fn fill_pending(&mut self) -> io::Result<()> {
        let mut buf = vec![0u8; COPY_BUFFER_SIZE];
        let n = self.inner.borrow_mut().read(&mut buf)?;
        if n == 0 {
            self.source_done = true;
            self.flush_run();
            return Ok(());
        }
        for &byte in &buf[..n] {
            if (0x20..=0x7E).contains(&byte) {
                if self.run.len() < self.max_chars {
                    self.run.push(byte);
                }
            } else {
                self.flush_run();
            }
        }
        Ok(())
    }
}

impl ByteStream for StringsStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            if self.pending_pos < self.pending.len() {
                let available = &self.pending[self.pending_pos..];
                let n = available.len().min(buf.len());
                buf[..n].copy_from_slice(&available[..n]);
                self.pending_pos += n;
                if self.pending_pos == self.pending.len() {
                    self.pending.clear();
                    self.pending_pos = 0;
                }
                return Ok(n);
            }
            if self.source_done {
                return Ok(0);
            }
            self.fill_pending()?;
        }
    }

    fn size(&self) -> io::Result<u64> {
        self.inner.borrow().size()
    }

    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match pos {
            SeekFrom::Start(0) => {
                self.run.clear();
                self.pending.clear();
                self.pending_pos = 0;
                self.source_done = false;
                self.inner.borrow_mut().seek(SeekFrom::Start(0))
            }
            _ => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "strings stream only rewinds to the start",
            )),
        }
    }

    fn close(&mut self) -> io::Result<()> {
        self.inner.borrow_mut().close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::{shared, MemoryStream};

    fn extract(data: &[u8], min: u32, max: u32) -> String {
        let inner = shared(MemoryStream::from_vec(data.to_vec()));
        let mut strings = StringsStream::open(inner, min, max);
        let mut out = Vec::new();
        let mut buf = [0u8; 7]; // deliberately small to cross boundaries
        loop {
            let n = strings.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            out.extend_from_slice(&buf[..n]);
        }
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_extracts_runs_meeting_minimum() {
        let data = b"\x00\x01hello\xffab\x02world!\x03";
        assert_eq!(extract(data, 3, 0), "hello\nworld!\n");
    }

    #[test]
    fn test_short_runs_are_dropped() {
        let data = b"ab\x00cd\x00efgh";
        assert_eq!(extract(data, 4, 0), "efgh\n");
    }

    #[test]
    fn test_long_runs_are_truncated_once() {
        let data = b"\x00abcdefghij\x00";
        assert_eq!(extract(data, 1, 4), "abcd\n");
    }

    #[test]
    fn test_size_reports_underlying_source() {
        let inner = shared(MemoryStream::from_vec(vec![0u8; 100]));
        let strings = StringsStream::open(inner, 4, 0);
        assert_eq!(strings.size().unwrap(), 100);
    }

    #[test]
    fn test_rewind_restarts_extraction() {
        let inner = shared(MemoryStream::from_vec(b"\x00string\x00".to_vec()));
        let mut strings = StringsStream::open(inner, 3, 0);
        let mut buf = [0u8; 32];
        let n = strings.read(&mut buf).unwrap();
        assert!(n > 0);
        strings.seek(SeekFrom::Start(0)).unwrap();
        let mut out = Vec::new();
        loop {
            let n = strings.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            out.extend_from_slice(&buf[..n]);
        }
        assert_eq!(out, b"string\n");
    }
}
