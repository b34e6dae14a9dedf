//! Read-through fuzzy hash tap (ssdeep and TLSH).

use std::io::{self, SeekFrom};

use fuzzyhash::FuzzyHash;
use tlsh_fixed::{BucketKind, ChecksumKind, TlshBuilder, Version};

use super::{ByteStream, SharedStream};

/// Which fuzzy digests a scan computes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FuzzyHashAlgs {
    pub ssdeep: bool,
    pub tlsh: bool,
}

impl FuzzyHashAlgs {
    /// True when at least one algorithm is selected.
    pub fn any(&self) -> bool {
        self.ssdeep || self.tlsh
    }
}

/// Finalized fuzzy digests in their canonical ASCII forms.
#[derive(Debug, Default, Clone)]
pub struct FuzzyDigests {
    pub ssdeep: Option<String>,
    pub tlsh: Option<String>,
}

/// A pass-through stream feeding the selected fuzzy hashers.
///
/// Sits above the crypto tap so both observe the same bytes. TLSH needs a
/// minimum amount of input; samples below its floor yield no TLSH digest.
pub struct FuzzyHashStream {
    inner: SharedStream,
    ssdeep: Option<FuzzyHash>,
    tlsh: Option<TlshBuilder>,
}

impl FuzzyHashStream {
    /// Interpose a tap for `algs` above `inner`.
    pub fn open_to_read(algs: FuzzyHashAlgs, inner: SharedStream) -> Self {
        FuzzyHashStream {
            inner,
            ssdeep: algs.ssdeep.then(FuzzyHash::default),
            tlsh: algs.tlsh.then(new_tlsh_builder),
        }
    }

    /// Finalize and take the digests. The tap stops accumulating.
    pub fn digests(&mut self) -> FuzzyDigests {
        let ssdeep = self.ssdeep.take().map(|mut h| {
            h.finalize();
            h.to_string()
        });
        let tlsh = self
            .tlsh
            .take()
            .and_then(|builder| builder.build().ok())
            .map(|t| t.hash());
        FuzzyDigests { ssdeep, tlsh }
    }
}

fn new_tlsh_builder() -> TlshBuilder {
    TlshBuilder::new(BucketKind::Bucket128, ChecksumKind::OneByte, Version::Version4)
}

impl ByteStream for FuzzyHashStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.borrow_mut().read(buf)?;
        if n > 0 {
            if let Some(h) = &mut self.ssdeep {
                h.update(&buf[..n]);
            }
            if let Some(b) = &mut self.tlsh {
                b.update(&buf[..n]);
            }
        }
        Ok(n)
    }

    fn size(&self) -> io::Result<u64> {
        self.inner.borrow().size()
    }

    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match pos {
            SeekFrom::Start(0) => {
                if self.ssdeep.is_some() {
                    self.ssdeep = Some(FuzzyHash::default());
                }
                if self.tlsh.is_some() {
                    self.tlsh = Some(new_tlsh_builder());
                }
                self.inner.borrow_mut().seek(SeekFrom::Start(0))
            }
            _ => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "fuzzy hash tap only rewinds to the start",
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
    fn test_ssdeep_digest_is_produced() {
        let data: Vec<u8> = (0..4096u32).map(|i| (i % 251) as u8).collect();
        let inner = shared(MemoryStream::from_vec(data));
        let algs = FuzzyHashAlgs {
            ssdeep: true,
            tlsh: false,
        };
        let mut tap = FuzzyHashStream::open_to_read(algs, inner);
        let mut sink = DevNullStream::new();
        tap.copy_to(&mut sink).unwrap();

        let digests = tap.digests();
        let ssdeep = digests.ssdeep.unwrap();
        assert!(ssdeep.contains(':'), "unexpected ssdeep form: {}", ssdeep);
        assert!(digests.tlsh.is_none());
    }

    #[test]
    fn test_tlsh_below_floor_yields_nothing() {
        let inner = shared(MemoryStream::from_vec(b"tiny".to_vec()));
        let algs = FuzzyHashAlgs {
            ssdeep: false,
            tlsh: true,
        };
        let mut tap = FuzzyHashStream::open_to_read(algs, inner);
        let mut sink = DevNullStream::new();
        tap.copy_to(&mut sink).unwrap();
        assert!(tap.digests().tlsh.is_none());
    }
}
