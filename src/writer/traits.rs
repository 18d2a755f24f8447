//! Output sinks for [`EpsWriter`](super::EpsWriter).

use crate::Result;
use std::fs::File;
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

/// Append-only byte sink with in-place patching of bytes already written.
pub trait EpsWrite {
    /// Append `bytes` at the end of the output.
    fn write_all(&mut self, bytes: &[u8]) -> Result<()>;

    /// Overwrite bytes at `pos`, which must lie inside the written output.
    /// The append position is unchanged.
    fn patch(&mut self, pos: u64, bytes: &[u8]) -> Result<()>;

    /// Number of bytes written so far.
    fn position(&self) -> u64;

    fn flush(&mut self) -> Result<()>;
}

/// In-memory sink.
#[derive(Debug, Default, Clone)]
pub struct VecWriter {
    buffer: Vec<u8>,
}

impl VecWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    /// Consume the writer and return the written bytes.
    pub fn into_inner(self) -> Vec<u8> {
        self.buffer
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }
}

impl EpsWrite for VecWriter {
    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        self.buffer.extend_from_slice(bytes);
        Ok(())
    }

    fn patch(&mut self, pos: u64, bytes: &[u8]) -> Result<()> {
        let start = usize::try_from(pos).unwrap_or(usize::MAX);
        match self.buffer.get_mut(start..start.saturating_add(bytes.len())) {
            Some(target) => {
                target.copy_from_slice(bytes);
                Ok(())
            }
            None => Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("patch at {pos} outside written output"),
            )
            .into()),
        }
    }

    fn position(&self) -> u64 {
        self.buffer.len() as u64
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Buffered file sink.
pub struct FileWriter {
    inner: BufWriter<File>,
    position: u64,
}

impl FileWriter {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        Self::with_capacity(path, 1_048_576)
    }

    pub fn with_capacity(path: impl AsRef<Path>, capacity: usize) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            inner: BufWriter::with_capacity(capacity, file),
            position: 0,
        })
    }
}

impl EpsWrite for FileWriter {
    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner.write_all(bytes)?;
        self.position += bytes.len() as u64;
        Ok(())
    }

    fn patch(&mut self, pos: u64, bytes: &[u8]) -> Result<()> {
        if pos + bytes.len() as u64 > self.position {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("patch at {pos} outside written output"),
            )
            .into());
        }
        // seeking a BufWriter flushes it first
        self.inner.seek(SeekFrom::Start(pos))?;
        self.inner.write_all(bytes)?;
        self.inner.seek(SeekFrom::Start(self.position))?;
        Ok(())
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_keeps_append_position() -> Result<()> {
        let mut w = VecWriter::new();
        w.write_all(&[0; 8])?;
        w.patch(2, &[1, 2])?;
        w.write_all(&[9])?;
        assert_eq!(w.as_slice(), &[0, 0, 1, 2, 0, 0, 0, 0, 9]);
        assert!(w.patch(8, &[1, 2]).is_err());
        Ok(())
    }
}
