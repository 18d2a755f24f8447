// store.rs
use crate::{Error, Result, records::common::u64_to_usize};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Random-access byte source a product is decoded from.
///
/// Implementations must be shareable between threads; reads past the end
/// fail with [`Error::Truncated`].
pub trait BackingStore: Send + Sync {
    /// Total length in bytes.
    fn len(&self) -> u64;

    /// Read exactly `length` bytes starting at `offset`.
    fn read_range(&self, offset: u64, length: u64) -> Result<Vec<u8>>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn check_range(available: u64, offset: u64, length: u64) -> Result<()> {
    match offset.checked_add(length) {
        Some(end) if end <= available => Ok(()),
        _ => Err(Error::Truncated {
            offset,
            length,
            available,
        }),
    }
}

/// File-backed store: every read is a seek plus an exact read.
///
/// The handle is serialised by a mutex; nothing is read ahead.
#[derive(Debug)]
pub struct FileStore {
    file: Mutex<File>,
    len: u64,
    path: PathBuf,
}

impl FileStore {
    /// Open `path` for reading.
    ///
    /// # Arguments
    /// * `path` - Product file to read from.
    ///
    /// # Returns
    /// A store whose length is the file size at open time, or
    /// [`Error::IOError`] when the file cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(Error::IOError)?;
        let len = file.metadata().map_err(Error::IOError)?.len();
        Ok(Self {
            file: Mutex::new(file),
            len,
            path: path.to_path_buf(),
        })
    }

    /// Path the store was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BackingStore for FileStore {
    fn len(&self) -> u64 {
        self.len
    }

    fn read_range(&self, offset: u64, length: u64) -> Result<Vec<u8>> {
        check_range(self.len, offset, length)?;
        let mut buffer = vec![0u8; u64_to_usize(length, "read length")?];

        // a poisoned lock only means another reader panicked mid-read; the
        // file handle itself is still usable since every read seeks first
        let mut file = self.file.lock().unwrap_or_else(|e| e.into_inner());
        file.seek(SeekFrom::Start(offset)).map_err(Error::IOError)?;
        file.read_exact(&mut buffer).map_err(Error::IOError)?;
        Ok(buffer)
    }
}

/// In-memory store, mainly for products assembled by
/// [`EpsWriter`](crate::EpsWriter) and for tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: Vec<u8>,
}

impl MemoryStore {
    /// Wrap `data`; reads are served directly from it.
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

impl From<Vec<u8>> for MemoryStore {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}

impl BackingStore for MemoryStore {
    fn len(&self) -> u64 {
        self.data.len() as u64
    }

    fn read_range(&self, offset: u64, length: u64) -> Result<Vec<u8>> {
        check_range(self.len(), offset, length)?;
        let start = u64_to_usize(offset, "read offset")?;
        let end = u64_to_usize(offset + length, "read end")?;
        Ok(self.data[start..end].to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_reads_are_bounds_checked() -> Result<()> {
        let store = MemoryStore::new((0u8..10).collect());
        assert_eq!(store.read_range(2, 3)?, vec![2, 3, 4]);
        assert_eq!(store.read_range(10, 0)?, Vec::<u8>::new());
        let err = store.read_range(8, 3).unwrap_err();
        assert!(matches!(
            err,
            Error::Truncated {
                offset: 8,
                length: 3,
                available: 10
            }
        ));
        assert!(store.read_range(u64::MAX, 2).is_err());
        Ok(())
    }

    #[test]
    fn file_store_reads_ranges() -> Result<()> {
        let path = std::env::temp_dir().join("eps_rs_file_store_test.bin");
        std::fs::write(&path, (0u8..64).collect::<Vec<_>>())?;

        let store = FileStore::open(&path)?;
        assert_eq!(store.len(), 64);
        assert_eq!(store.read_range(60, 4)?, vec![60, 61, 62, 63]);
        assert!(store.read_range(62, 4).is_err());

        drop(store);
        std::fs::remove_file(&path)?;
        Ok(())
    }
}
