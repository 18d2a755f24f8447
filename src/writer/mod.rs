//! EPS product writer.
//!
//! [`EpsWriter`] lays out a product in file order: headers, the pointer
//! table, then one run of records per pointer. Pointers are written with a
//! placeholder offset and patched when their run begins.
//!
//! # Example
//!
//! ```no_run
//! use eps_rs::{
//!     EpsWriter, HeaderRecord, InstrumentGroup, RecordClass, RecordKey, Result,
//! };
//!
//! fn write_product() -> Result<()> {
//!     let mdr = RecordKey::new(RecordClass::Mdr, InstrumentGroup::Iasi, 2);
//!     let mut writer = EpsWriter::new("product.nat")?;
//!     writer.write_header(&HeaderRecord::new(
//!         RecordClass::Mphr,
//!         vec![("INSTRUMENT_ID".into(), "IASI".into())],
//!     ))?;
//!     let pointer = writer.write_pointer(mdr)?;
//!
//!     writer.begin_run(pointer)?;
//!     writer.write_record(mdr, 5, &[0u8; 64])?;
//!     writer.finish()?;
//!     Ok(())
//! }
//! ```

mod record;
mod traits;

pub use record::RecordBuilder;
pub use traits::{EpsWrite, FileWriter, VecWriter};

use crate::{
    Error, Result,
    records::{
        GRH_SIZE, GenericRecordHeader, HeaderRecord, IPR_RECORD_SIZE, InternalPointerRecord,
        RecordKey,
    },
};
use log::{debug, warn};
use std::path::Path;

/// Offset of the target offset field inside a pointer record.
const TARGET_OFFSET_POS: u64 = (IPR_RECORD_SIZE - 4) as u64;

/// Refers to a pointer written by [`EpsWriter::write_pointer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerHandle(usize);

struct PendingPointer {
    position: u64,
    target: RecordKey,
    patched: bool,
}

/// Writer for EPS products.
///
/// `EpsWriter` is not thread-safe; write from a single thread.
pub struct EpsWriter<W: EpsWrite> {
    writer: W,
    pointers: Vec<PendingPointer>,
}

impl EpsWriter<FileWriter> {
    /// Create a product file at `path`, replacing any existing file.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::from_writer(FileWriter::new(path)?))
    }
}

impl EpsWriter<VecWriter> {
    /// Write the product to memory; [`finish`](Self::finish) returns the sink.
    pub fn in_memory() -> Self {
        Self::from_writer(VecWriter::new())
    }
}

impl<W: EpsWrite> EpsWriter<W> {
    pub fn from_writer(writer: W) -> Self {
        Self {
            writer,
            pointers: Vec::new(),
        }
    }

    /// Current write position.
    pub fn offset(&self) -> u64 {
        self.writer.position()
    }

    /// Append raw bytes. Returns their starting offset.
    pub fn write_raw(&mut self, bytes: &[u8]) -> Result<u64> {
        let start = self.writer.position();
        self.writer.write_all(bytes)?;
        Ok(start)
    }

    /// Write an MPHR or SPHR. Returns its starting offset.
    pub fn write_header(&mut self, header: &HeaderRecord) -> Result<u64> {
        self.write_raw(&header.to_bytes())
    }

    /// Write a pointer to a run of `target` records whose offset is not yet
    /// known.
    pub fn write_pointer(&mut self, target: RecordKey) -> Result<PointerHandle> {
        let position = self.write_raw(&InternalPointerRecord::new(target, 0).to_bytes())?;
        self.pointers.push(PendingPointer {
            position,
            target,
            patched: false,
        });
        Ok(PointerHandle(self.pointers.len() - 1))
    }

    /// Start the run `handle` points at: its target offset becomes the
    /// current position.
    pub fn begin_run(&mut self, handle: PointerHandle) -> Result<u64> {
        let here = self.writer.position();
        let offset = u32::try_from(here).map_err(|_| Error::InvalidRecordSize {
            offset: here,
            size: u32::MAX,
        })?;
        let pointer = self
            .pointers
            .get_mut(handle.0)
            .ok_or(Error::IndexOutOfRange {
                index: handle.0 as u64,
                len: 0,
            })?;
        pointer.patched = true;
        let position = pointer.position + TARGET_OFFSET_POS;
        debug!("Run of {} records starts at {}", pointer.target, here);
        self.writer.patch(position, &offset.to_be_bytes())?;
        Ok(here)
    }

    /// Write one record: a GRH for `key` followed by `body`.
    pub fn write_record(&mut self, key: RecordKey, version: u8, body: &[u8]) -> Result<u64> {
        let size = u32::try_from(body.len() + GRH_SIZE).map_err(|_| Error::InvalidRecordSize {
            offset: self.writer.position(),
            size: u32::MAX,
        })?;
        let header = GenericRecordHeader::new(key, version, size - GRH_SIZE as u32);
        self.write_record_with_header(&header, body)
    }

    /// Write one record with a caller-supplied header, e.g. to set record
    /// times. The header is written as given.
    pub fn write_record_with_header(
        &mut self,
        header: &GenericRecordHeader,
        body: &[u8],
    ) -> Result<u64> {
        let start = self.write_raw(&header.to_bytes())?;
        self.writer.write_all(body)?;
        Ok(start)
    }

    /// Flush and return the sink.
    pub fn finish(mut self) -> Result<W> {
        for pointer in self.pointers.iter().filter(|p| !p.patched) {
            warn!(
                "Pointer to {} at offset {} was never given a run",
                pointer.target, pointer.position
            );
        }
        self.writer.flush()?;
        Ok(self.writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{InstrumentGroup, RecordClass};

    #[test]
    fn pointer_is_patched_to_run_start() -> Result<()> {
        let key = RecordKey::new(RecordClass::Mdr, InstrumentGroup::Iasi, 2);
        let mut w = EpsWriter::in_memory();
        w.write_header(&HeaderRecord::new(RecordClass::Mphr, vec![]))?;
        let handle = w.write_pointer(key)?;
        let start = w.begin_run(handle)?;
        w.write_record(key, 5, &[1, 2, 3])?;
        let bytes = w.finish()?.into_inner();

        let pointer = InternalPointerRecord::from_bytes(&bytes[GRH_SIZE..])?;
        assert_eq!(u64::from(pointer.target_offset), start);
        assert_eq!(pointer.target(), key);

        let grh = GenericRecordHeader::from_bytes(&bytes[start as usize..])?;
        assert_eq!(grh.record_size, 23);
        assert_eq!(grh.subclass_version, 5);
        assert_eq!(bytes.len() as u64, start + 23);
        Ok(())
    }
}
