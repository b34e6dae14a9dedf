//! Read-through crypto hash tap.

use std::io::{self, SeekFrom};

use md5::{Digest, Md5};
use sha1::Sha1;
use sha2::Sha256;

use super::{ByteStream, SharedStream};

/// Which crypto digests a scan computes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CryptoHashAlgs {
    pub md5: bool,
    pub sha1: bool,
    pub sha256: bool,
}

impl CryptoHashAlgs {
    /// True when at least one algorithm is selected.
    pub fn any(&self) -> bool {
        self.md5 || self.sha1 || self.sha256
    }

    /// All three digests.
    pub fn all() -> Self {
        CryptoHashAlgs {
            md5: true,
            sha1: true,
            sha256: true,
        }
    }
}

/// Finalized digests harvested from a tap.
#[derive(Debug, Default, Clone)]
pub struct CryptoDigests {
    pub md5: Option<Vec<u8>>,
    pub sha1: Option<Vec<u8>>,
    pub sha256: Option<Vec<u8>>,
}

/// A pass-through stream that updates the selected hashers as bytes flow
/// through `read`.
///
/// The handle is retained on the sample so digests can be harvested after
/// the archive or directory sink has consumed the stream; harvesting
/// clones the hasher states and does not disturb the tap.
pub struct CryptoHashStream {
    inner: SharedStream,
    md5: Option<Md5>,
    sha1: Option<Sha1>,
    sha256: Option<Sha256>,
    bytes_hashed: u64,
}

impl CryptoHashStream {
    /// Interpose a tap for `algs` above `inner`.
    pub fn open_to_read(algs: CryptoHashAlgs, inner: SharedStream) -> Self {
        CryptoHashStream {
            inner,
            md5: algs.md5.then(Md5::new),
            sha1: algs.sha1.then(Sha1::new),
            sha256: algs.sha256.then(Sha256::new),
            bytes_hashed: 0,
        }
    }

    /// Number of bytes the tap has observed.
    pub fn bytes_hashed(&self) -> u64 {
        self.bytes_hashed
    }

    /// Snapshot the configured digests over the bytes observed so far.
    pub fn digests(&self) -> CryptoDigests {
        CryptoDigests {
            md5: self.md5.clone().map(|h| h.finalize().to_vec()),
            sha1: self.sha1.clone().map(|h| h.finalize().to_vec()),
            sha256: self.sha256.clone().map(|h| h.finalize().to_vec()),
        }
    }

    fn reset(&mut self) {
        if self.md5.is_some() {
            self.md5 = Some(Md5::new());
        }
        if self.sha1.is_some() {
            self.sha1 = Some(Sha1::new());
        }
        if self.sha256.is_some() {
            self.sha256 = Some(Sha256::new());
        }
        self.bytes_hashed = 0;
    }
}

impl ByteStream for CryptoHashStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.borrow_mut().read(buf)?;
        if n > 0 {
            if let Some(h) = &mut self.md5 {
                h.update(&buf[..n]);
            }
            if let Some(h) = &mut self.sha1 {
                h.update(&buf[..n]);
            }
            if let Some(h) = &mut self.sha256 {
                h.update(&buf[..n]);
            }
            self.bytes_hashed += n as u64;
        }
        Ok(n)
    }

    fn size(&self) -> io::Result<u64> {
        self.inner.borrow().size()
    }

    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        // Rewinding restarts the digest computation; anything else would
        // silently corrupt it.
        match pos {
            SeekFrom::Start(0) => {
                self.reset();
                self.inner.borrow_mut().seek(SeekFrom::Start(0))
            }
            _ => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "hash tap only rewinds to the start",
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
    use crate::stream::{shared, DevNullStream, MemoryStream};

    #[test]
    fn test_digests_match_known_values() {
        let inner = shared(MemoryStream::from_vec(b"Hello, World!".to_vec()));
        let mut tap = CryptoHashStream::open_to_read(CryptoHashAlgs::all(), inner);

        let mut sink = DevNullStream::new();
        let copied = tap.copy_to(&mut sink).unwrap();
        assert_eq!(copied, 13);
        assert_eq!(tap.bytes_hashed(), 13);

        let digests = tap.digests();
        assert_eq!(
            hex(&digests.sha256.unwrap()),
            "dffd6021bb2bd5b0af676290809ec3a53191dd81c7f70a4b28688a362182986f"
        );
        assert_eq!(
            hex(&digests.md5.unwrap()),
            "65a8e27d8879283831b664bd8b7f0ad4"
        );
        assert_eq!(
            hex(&digests.sha1.unwrap()),
            "0a0a9f2a6772942557ab5355d76af442f8f65e01"
        );
    }

    #[test]
    fn test_unselected_algorithms_stay_empty() {
        let inner = shared(MemoryStream::from_vec(b"abc".to_vec()));
        let algs = CryptoHashAlgs {
            sha256: true,
            ..CryptoHashAlgs::default()
        };
        let mut tap = CryptoHashStream::open_to_read(algs, inner);
        let mut sink = DevNullStream::new();
        tap.copy_to(&mut sink).unwrap();

        let digests = tap.digests();
        assert!(digests.md5.is_none());
        assert!(digests.sha1.is_none());
        assert!(digests.sha256.is_some());
    }

    #[test]
    fn test_rewind_resets_digest() {
        let inner = shared(MemoryStream::from_vec(b"abcabc".to_vec()));
        let mut tap = CryptoHashStream::open_to_read(CryptoHashAlgs::all(), inner);
        let mut buf = [0u8; 3];
        tap.read(&mut buf).unwrap();
        tap.seek(SeekFrom::Start(0)).unwrap();
        assert_eq!(tap.bytes_hashed(), 0);

        let mut sink = DevNullStream::new();
        tap.copy_to(&mut sink).unwrap();
        assert_eq!(tap.bytes_hashed(), 6);
    }

    fn hex(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }
}
