// grh.rs
use super::GRH_SIZE;
use crate::{
    Result,
    records::{
        InstrumentGroup, RecordClass, RecordKey, ShortCdsTime,
        common::{read_u8, read_u32, validate_buffer_size},
    },
};

/// Generic Record Header - the fixed 20-byte prefix of every EPS record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct GenericRecordHeader {
    pub record_class: RecordClass,
    pub instrument_group: InstrumentGroup,
    pub record_subclass: u8,
    pub subclass_version: u8,
    /// Total record size in bytes, including this header.
    pub record_size: u32,
    pub record_start_time: ShortCdsTime,
    pub record_end_time: ShortCdsTime,
}

impl GenericRecordHeader {
    /// Header for a record of `body_size` bytes, with zero timestamps.
    pub fn new(key: RecordKey, subclass_version: u8, body_size: u32) -> Self {
        Self {
            record_class: key.class,
            instrument_group: key.group,
            record_subclass: key.subclass,
            subclass_version,
            record_size: body_size + GRH_SIZE as u32,
            record_start_time: ShortCdsTime::default(),
            record_end_time: ShortCdsTime::default(),
        }
    }

    /// Serializes the header according to the EPS generic format.
    ///
    /// # Structure (20 bytes total):
    /// - record class: 1 byte
    /// - instrument group: 1 byte
    /// - record subclass: 1 byte
    /// - record subclass version: 1 byte
    /// - record size: 4 bytes
    /// - record start time: 6 bytes (short CDS)
    /// - record stop time: 6 bytes (short CDS)
    pub fn to_bytes(&self) -> [u8; GRH_SIZE] {
        let mut out = [0u8; GRH_SIZE];
        out[0] = self.record_class as u8;
        out[1] = self.instrument_group as u8;
        out[2] = self.record_subclass;
        out[3] = self.subclass_version;
        out[4..8].copy_from_slice(&self.record_size.to_be_bytes());
        out[8..14].copy_from_slice(&self.record_start_time.to_bytes());
        out[14..20].copy_from_slice(&self.record_end_time.to_bytes());
        out
    }

    /// Parse a header from the first 20 bytes of `bytes`.
    ///
    /// # Returns
    /// The header, [`crate::Error::TooShortBuffer`] for short input, or a
    /// format error when the class or instrument group byte is out of range.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        validate_buffer_size(bytes, GRH_SIZE)?;

        Ok(Self {
            record_class: RecordClass::try_from(read_u8(bytes, 0))?,
            instrument_group: InstrumentGroup::try_from(read_u8(bytes, 1))?,
            record_subclass: read_u8(bytes, 2),
            subclass_version: read_u8(bytes, 3),
            record_size: read_u32(bytes, 4),
            record_start_time: ShortCdsTime::from_bytes(&bytes[8..14])?,
            record_end_time: ShortCdsTime::from_bytes(&bytes[14..20])?,
        })
    }

    pub fn key(&self) -> RecordKey {
        RecordKey::new(
            self.record_class,
            self.instrument_group,
            self.record_subclass,
        )
    }

    /// Bytes following the header.
    pub fn body_size(&self) -> u32 {
        self.record_size.saturating_sub(GRH_SIZE as u32)
    }
}
