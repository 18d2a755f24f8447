// ipr.rs
use super::{GRH_SIZE, IPR_RECORD_SIZE};
use crate::{
    Error, Result,
    records::{
        GenericRecordHeader, InstrumentGroup, RecordClass, RecordKey,
        common::{read_u8, read_u32, validate_buffer_size},
    },
};

/// Internal Pointer Record - one entry of the product's table of contents.
///
/// Points at the first record of a homogeneous run of records of the
/// target type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct InternalPointerRecord {
    pub header: GenericRecordHeader,
    pub target_class: RecordClass,
    pub target_group: InstrumentGroup,
    pub target_subclass: u8,
    /// Absolute byte offset of the target record from the start of the file.
    pub target_offset: u32,
}

impl InternalPointerRecord {
    pub fn new(target: RecordKey, target_offset: u32) -> Self {
        Self {
            header: GenericRecordHeader::new(
                RecordKey::new(RecordClass::Ipr, InstrumentGroup::Generic, 0),
                2,
                (IPR_RECORD_SIZE - GRH_SIZE) as u32,
            ),
            target_class: target.class,
            target_group: target.group,
            target_subclass: target.subclass,
            target_offset,
        }
    }

    pub fn target(&self) -> RecordKey {
        RecordKey::new(self.target_class, self.target_group, self.target_subclass)
    }

    /// Serialize the full record (header and pointer body, 27 bytes).
    pub fn to_bytes(&self) -> [u8; IPR_RECORD_SIZE] {
        let mut out = [0u8; IPR_RECORD_SIZE];
        out[..GRH_SIZE].copy_from_slice(&self.header.to_bytes());
        out[20] = self.target_class as u8;
        out[21] = self.target_group as u8;
        out[22] = self.target_subclass;
        out[23..27].copy_from_slice(&self.target_offset.to_be_bytes());
        out
    }

    /// Parse a full pointer record.
    ///
    /// The header must carry the IPR record class; both the header and the
    /// target triple are validated against the known enumerations.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        validate_buffer_size(bytes, IPR_RECORD_SIZE)?;
        let header = GenericRecordHeader::from_bytes(bytes)?;
        if header.record_class != RecordClass::Ipr {
            return Err(Error::UnexpectedRecord {
                offset: 0,
                expected: RecordClass::Ipr.to_string(),
                found: header.key().to_string(),
            });
        }

        Ok(Self {
            header,
            target_class: RecordClass::try_from(read_u8(bytes, 20))?,
            target_group: InstrumentGroup::try_from(read_u8(bytes, 21))?,
            target_subclass: read_u8(bytes, 22),
            target_offset: read_u32(bytes, 23),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pointer_layout() -> Result<()> {
        let ipr = InternalPointerRecord::new(
            RecordKey::new(RecordClass::Mdr, InstrumentGroup::Iasi, 2),
            0x0102_0304,
        );
        let bytes = ipr.to_bytes();
        assert_eq!(bytes[0], RecordClass::Ipr as u8);
        assert_eq!(&bytes[4..8], &27u32.to_be_bytes());
        assert_eq!(&bytes[20..27], &[8, 8, 2, 1, 2, 3, 4]);
        assert_eq!(InternalPointerRecord::from_bytes(&bytes)?, ipr);
        Ok(())
    }

    #[test]
    fn rejects_non_pointer_header() {
        let mut bytes = InternalPointerRecord::new(
            RecordKey::new(RecordClass::Mdr, InstrumentGroup::Iasi, 2),
            100,
        )
        .to_bytes();
        bytes[0] = RecordClass::Giadr as u8;
        assert!(matches!(
            InternalPointerRecord::from_bytes(&bytes),
            Err(Error::UnexpectedRecord { .. })
        ));
    }

    #[test]
    fn rejects_invalid_target_class() {
        let mut bytes = InternalPointerRecord::new(
            RecordKey::new(RecordClass::Mdr, InstrumentGroup::Iasi, 2),
            100,
        )
        .to_bytes();
        bytes[20] = 42;
        assert!(matches!(
            InternalPointerRecord::from_bytes(&bytes),
            Err(Error::InvalidRecordClass(42))
        ));
    }
}
