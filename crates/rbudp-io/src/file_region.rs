//! Fixed-size, offset-addressable file region, backed by a memory mapping.
//!
//! Mirrors the original implementation's `MemMap`/`MapMemory`/`UnmapMemory`
//! trio (see the design notes on cross-platform file mapping), but expressed
//! as a scoped-ownership RAII type per the required re-architecture: the
//! mapping and its backing file are released on every exit path, including
//! error paths, instead of through a manually paired open/close call.

use std::fs::{File, OpenOptions};
use std::path::Path;

use memmap2::{Mmap, MmapMut};

use rbudp_core::RbudpError;

/// Whether a [`FileRegion`] is opened for reading or read-write access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Read-only; the backing file must already hold at least `size` bytes.
    ReadOnly,
    /// Read-write; the backing file is created or truncated to `size` bytes.
    ReadWrite,
}

/// A contiguous, byte-addressable region of exactly `size` bytes that the
/// protocol core reads and writes via offset + length.
///
/// The region is valid for the lifetime of the session; dropping it flushes
/// (if writable) and releases the mapping.
pub trait FileRegion {
    /// Total length, in bytes, of the mapped region.
    fn len(&self) -> u64;

    /// True iff the region has zero length.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copies `buf.len()` bytes starting at `offset` out of the region.
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<(), RbudpError>;

    /// Copies `buf` into the region starting at `offset`.
    ///
    /// Returns an error if this region was opened [`OpenMode::ReadOnly`].
    fn write_at(&mut self, offset: u64, buf: &[u8]) -> Result<(), RbudpError>;

    /// Flushes any writes to the backing file. A no-op on read-only regions.
    fn flush(&mut self) -> Result<(), RbudpError>;
}

enum Mapping {
    ReadOnly(Mmap),
    ReadWrite(MmapMut),
}

/// A [`FileRegion`] backed by a memory-mapped file.
pub struct MmapFileRegion {
    _file: File,
    mapping: Mapping,
    len: u64,
}

impl MmapFileRegion {
    /// Opens `path` as a file region of exactly `size` bytes.
    ///
    /// In [`OpenMode::ReadWrite`] the file is created or truncated to
    /// `size` bytes. In [`OpenMode::ReadOnly`] the file must already exist
    /// and be at least `size` bytes long.
    ///
    /// # Errors
    ///
    /// Returns [`RbudpError::ResourceAcquisition`] if the file cannot be
    /// opened, sized, or mapped.
    pub fn open(path: &Path, size: u64, mode: OpenMode, stage: &'static str) -> Result<Self, RbudpError> {
        let acquisition_error = |source: std::io::Error| RbudpError::ResourceAcquisition { stage, source };

        let (file, mapping) = match mode {
            OpenMode::ReadWrite => {
                let file = OpenOptions::new()
                    .read(true)
                    .write(true)
                    .create(true)
                    .truncate(true)
                    .open(path)
                    .map_err(acquisition_error)?;
                file.set_len(size).map_err(acquisition_error)?;
                // SAFETY: the mapping is exclusive to this process for the
                // session's lifetime; nothing else truncates or rewrites
                // `path` out from under it.
                let mmap = unsafe { MmapMut::map_mut(&file) }.map_err(acquisition_error)?;
                (file, Mapping::ReadWrite(mmap))
            }
            OpenMode::ReadOnly => {
                let file = OpenOptions::new()
                    .read(true)
                    .open(path)
                    .map_err(acquisition_error)?;
                let actual_len = file.metadata().map_err(acquisition_error)?.len();
                if actual_len < size {
                    return Err(RbudpError::ResourceAcquisition {
                        stage,
                        source: std::io::Error::new(
                            std::io::ErrorKind::InvalidInput,
                            format!("source file is {actual_len} bytes, need at least {size}"),
                        ),
                    });
                }
                // SAFETY: same argument as the read-write mapping above.
                let mmap = unsafe { Mmap::map(&file) }.map_err(acquisition_error)?;
                (file, Mapping::ReadOnly(mmap))
            }
        };

        Ok(Self {
            _file: file,
            mapping,
            len: size,
        })
    }

    fn as_slice(&self) -> &[u8] {
        match &self.mapping {
            Mapping::ReadOnly(mmap) => &mmap[..],
            Mapping::ReadWrite(mmap) => &mmap[..],
        }
    }
}

impl FileRegion for MmapFileRegion {
    fn len(&self) -> u64 {
        self.len
    }

    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<(), RbudpError> {
        let start = offset as usize;
        let end = start + buf.len();
        buf.copy_from_slice(&self.as_slice()[start..end]);
        Ok(())
    }

    fn write_at(&mut self, offset: u64, buf: &[u8]) -> Result<(), RbudpError> {
        match &mut self.mapping {
            Mapping::ReadWrite(mmap) => {
                let start = offset as usize;
                let end = start + buf.len();
                mmap[start..end].copy_from_slice(buf);
                Ok(())
            }
            Mapping::ReadOnly(_) => Err(RbudpError::ResourceAcquisition {
                stage: "file write",
                source: std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "region was opened read-only",
                ),
            }),
        }
    }

    fn flush(&mut self) -> Result<(), RbudpError> {
        match &self.mapping {
            Mapping::ReadWrite(mmap) => mmap.flush().map_err(|source| RbudpError::ResourceAcquisition {
                stage: "flush",
                source,
            }),
            Mapping::ReadOnly(_) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_write_region_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("region.bin");

        let mut region = MmapFileRegion::open(&path, 16, OpenMode::ReadWrite, "test").unwrap();
        region.write_at(0, b"hello, world!!!!").unwrap();

        let mut buf = [0u8; 5];
        region.read_at(0, &mut buf).unwrap();
        assert_eq!(&buf, b"hello");
    }

    #[test]
    fn read_only_region_rejects_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("region.bin");
        std::fs::write(&path, vec![0u8; 16]).unwrap();

        let mut region = MmapFileRegion::open(&path, 16, OpenMode::ReadOnly, "test").unwrap();
        assert!(region.write_at(0, b"nope!").is_err());
    }

    #[test]
    fn read_only_open_fails_if_file_too_small() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("region.bin");
        std::fs::write(&path, vec![0u8; 4]).unwrap();

        assert!(MmapFileRegion::open(&path, 16, OpenMode::ReadOnly, "test").is_err());
    }

    #[test]
    fn flush_on_read_only_region_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("region.bin");
        std::fs::write(&path, vec![0u8; 16]).unwrap();

        let mut region = MmapFileRegion::open(&path, 16, OpenMode::ReadOnly, "test").unwrap();
        assert!(region.flush().is_ok());
    }

    #[test]
    fn read_write_open_creates_and_sizes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("new.bin");
        assert!(!path.exists());

        let region = MmapFileRegion::open(&path, 4096, OpenMode::ReadWrite, "test").unwrap();
        assert_eq!(region.len(), 4096);
        drop(region);
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 4096);
    }
}
