//! Composable byte streams.
//!
//! Every source and every tap in the collection pipeline speaks the same
//! small capability interface, [`ByteStream`]. Variants are independent
//! implementations composed by wrapping: a file source can sit under a
//! string extractor, which sits under a crypto hash tap, which sits under
//! a fuzzy hash tap. The top of such a stack is what the collector copies.

use std::cell::RefCell;
use std::io::{self, SeekFrom};
use std::rc::Rc;

use crate::constants::COPY_BUFFER_SIZE;

mod file;
mod fuzzy;
mod hash;
mod memory;
mod null;
mod strings;
mod temporary;

pub use file::FileStream;
pub use fuzzy::{FuzzyDigests, FuzzyHashAlgs, FuzzyHashStream};
pub use hash::{CryptoDigests, CryptoHashAlgs, CryptoHashStream};
pub use memory::MemoryStream;
pub use null::DevNullStream;
pub use strings::StringsStream;
pub use temporary::TemporaryStream;

/// A byte stream shared between the pipeline and the handles that the
/// collector keeps for digest harvesting. The engine is single-threaded,
/// so interior mutability is enough.
pub type SharedStream = Rc<RefCell<dyn ByteStream>>;

/// Wrap a concrete stream into a [`SharedStream`].
pub fn shared<S: ByteStream + 'static>(stream: S) -> SharedStream {
    Rc::new(RefCell::new(stream))
}

/// Capability interface for readable (and, for sink-side streams,
/// writable) byte streams.
pub trait ByteStream {
    /// Read up to `buf.len()` bytes, returning the count read. Zero means
    /// end of stream.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Write `buf`, returning the count written. Source streams reject
    /// writes.
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "stream is not writable",
        ))
    }

    /// Total size of the stream in bytes. Taps report the size of the
    /// stream they wrap.
    fn size(&self) -> io::Result<u64>;

    /// Move the read/write position, returning the new absolute offset.
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64>;

    /// Release underlying handles. Further reads fail or return 0.
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Copy the remainder of this stream into `dst`, returning the number
    /// of bytes written.
    fn copy_to(&mut self, dst: &mut dyn ByteStream) -> io::Result<u64> {
        let mut buf = vec![0u8; COPY_BUFFER_SIZE];
        let mut total = 0u64;
        loop {
            let n = self.read(&mut buf)?;
            if n == 0 {
                break;
            }
            dst.write_all(&buf[..n])?;
            total += n as u64;
        }
        Ok(total)
    }

    /// Write the whole of `buf`, retrying partial writes.
    fn write_all(&mut self, mut buf: &[u8]) -> io::Result<()> {
        while !buf.is_empty() {
            let n = self.write(buf)?;
            if n == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "stream refused further bytes",
                ));
            }
            buf = &buf[n..];
        }
        Ok(())
    }
}

/// Drain a shared stream into any `io::Write`, returning the bytes copied.
///
/// Used by the sinks, whose destinations (zip entries, files) are plain
/// writers rather than byte streams.
pub fn drain_to_writer(stream: &SharedStream, dst: &mut dyn io::Write) -> io::Result<u64> {
    let mut src = stream.borrow_mut();
    let mut buf = vec![0u8; COPY_BUFFER_SIZE];
    let mut total = 0u64;
    loop {
        let n = src.read(&mut buf)?;
        if n == 0 {
            break;
        }
        dst.write_all(&buf[..n])?;
        total += n as u64;
    }
    Ok(total)
}
