//! File-backed byte stream.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use super::ByteStream;

/// A stream over a regular file, opened either for reading or writing.
pub struct FileStream {
    file: Option<File>,
    path: PathBuf,
    size: u64,
}

impl FileStream {
    /// Open an existing file for reading.
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        let size = file.metadata()?.len();
        Ok(FileStream {
            file: Some(file),
            path: path.to_path_buf(),
            size,
        })
    }

    /// Create (or truncate) a file for writing.
    pub fn create(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        Ok(FileStream {
            file: Some(file),
            path: path.to_path_buf(),
            size: 0,
        })
    }

    /// Path this stream was opened on.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn file_mut(&mut self) -> io::Result<&mut File> {
        self.file.as_mut().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotConnected, "file stream is closed")
        })
    }
}

impl ByteStream for FileStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file_mut()?.read(buf)
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let file = self.file_mut()?;
        let n = file.write(buf)?;
        let pos = file.stream_position()?;
        self.size = self.size.max(pos);
        Ok(n)
    }

    fn size(&self) -> io::Result<u64> {
        Ok(self.size)
    }

    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.file_mut()?.seek(pos)
    }

    fn close(&mut self) -> io::Result<()> {
        if let Some(mut file) = self.file.take() {
            file.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_read_and_size() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sample.bin");
        std::fs::write(&path, b"forensic payload").unwrap();

        let mut stream = FileStream::open(&path).unwrap();
        assert_eq!(stream.size().unwrap(), 16);

        let mut buf = [0u8; 32];
        let n = stream.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"forensic payload");
    }

    #[test]
    fn test_write_then_rewind_and_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.bin");

        let mut stream = FileStream::create(&path).unwrap();
        stream.write_all(b"abc").unwrap();
        assert_eq!(stream.size().unwrap(), 3);

        stream.seek(SeekFrom::Start(0)).unwrap();
        let mut buf = [0u8; 8];
        let n = stream.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"abc");
    }

    #[test]
    fn test_read_after_close_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gone.bin");
        std::fs::write(&path, b"x").unwrap();

        let mut stream = FileStream::open(&path).unwrap();
        stream.close().unwrap();
        let mut buf = [0u8; 1];
        assert!(stream.read(&mut buf).is_err());
    }
}
