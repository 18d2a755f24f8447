// record_class.rs
use crate::{Error, Result};
use core::fmt;

/// Record class of a generic record header.
///
/// The discriminants are the byte values stored in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(serde::Serialize, serde::Deserialize)]
#[repr(u8)]
pub enum RecordClass {
    Reserved = 0,
    /// Main Product Header Record (ASCII key/value).
    Mphr = 1,
    /// Secondary Product Header Record (ASCII key/value).
    Sphr = 2,
    /// Internal Pointer Record.
    Ipr = 3,
    /// Global External Auxiliary Data Record.
    Geadr = 4,
    /// Global Internal Auxiliary Data Record.
    Giadr = 5,
    /// Variable External Auxiliary Data Record.
    Veadr = 6,
    /// Variable Internal Auxiliary Data Record.
    Viadr = 7,
    /// Measurement Data Record.
    Mdr = 8,
}

impl RecordClass {
    /// Lower-case name used in schema registry keys.
    pub fn name(&self) -> &'static str {
        match self {
            RecordClass::Reserved => "reserved",
            RecordClass::Mphr => "mphr",
            RecordClass::Sphr => "sphr",
            RecordClass::Ipr => "ipr",
            RecordClass::Geadr => "geadr",
            RecordClass::Giadr => "giadr",
            RecordClass::Veadr => "veadr",
            RecordClass::Viadr => "viadr",
            RecordClass::Mdr => "mdr",
        }
    }
}

impl TryFrom<u8> for RecordClass {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        Ok(match value {
            0 => RecordClass::Reserved,
            1 => RecordClass::Mphr,
            2 => RecordClass::Sphr,
            3 => RecordClass::Ipr,
            4 => RecordClass::Geadr,
            5 => RecordClass::Giadr,
            6 => RecordClass::Veadr,
            7 => RecordClass::Viadr,
            8 => RecordClass::Mdr,
            other => return Err(Error::InvalidRecordClass(other)),
        })
    }
}

impl fmt::Display for RecordClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Instrument group of a generic record header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(serde::Serialize, serde::Deserialize)]
#[repr(u8)]
pub enum InstrumentGroup {
    Generic = 0,
    Amsua = 1,
    Ascat = 2,
    Atovs = 3,
    Avhrr = 4,
    Gome = 5,
    Gras = 6,
    Hirs4 = 7,
    Iasi = 8,
    Mhs = 9,
    Sem = 10,
    Adcs = 11,
    Sbuv = 12,
    Dummy = 13,
    Archive = 14,
    IasiL2 = 15,
}

impl InstrumentGroup {
    /// Lower-case name used in schema registry keys.
    pub fn name(&self) -> &'static str {
        match self {
            InstrumentGroup::Generic => "generic",
            InstrumentGroup::Amsua => "amsua",
            InstrumentGroup::Ascat => "ascat",
            InstrumentGroup::Atovs => "atovs",
            InstrumentGroup::Avhrr => "avhrr",
            InstrumentGroup::Gome => "gome",
            InstrumentGroup::Gras => "gras",
            InstrumentGroup::Hirs4 => "hirs4",
            InstrumentGroup::Iasi => "iasi",
            InstrumentGroup::Mhs => "mhs",
            InstrumentGroup::Sem => "sem",
            InstrumentGroup::Adcs => "adcs",
            InstrumentGroup::Sbuv => "sbuv",
            InstrumentGroup::Dummy => "dummy",
            InstrumentGroup::Archive => "archive",
            InstrumentGroup::IasiL2 => "iasi_l2",
        }
    }
}

impl TryFrom<u8> for InstrumentGroup {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        Ok(match value {
            0 => InstrumentGroup::Generic,
            1 => InstrumentGroup::Amsua,
            2 => InstrumentGroup::Ascat,
            3 => InstrumentGroup::Atovs,
            4 => InstrumentGroup::Avhrr,
            5 => InstrumentGroup::Gome,
            6 => InstrumentGroup::Gras,
            7 => InstrumentGroup::Hirs4,
            8 => InstrumentGroup::Iasi,
            9 => InstrumentGroup::Mhs,
            10 => InstrumentGroup::Sem,
            11 => InstrumentGroup::Adcs,
            12 => InstrumentGroup::Sbuv,
            13 => InstrumentGroup::Dummy,
            14 => InstrumentGroup::Archive,
            15 => InstrumentGroup::IasiL2,
            other => return Err(Error::InvalidInstrumentGroup(other)),
        })
    }
}

impl fmt::Display for InstrumentGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The (class, instrument group, subclass) triple identifying a record type.
///
/// Its `Display` form, e.g. `giadr:iasi:1`, is the exact-match key used by
/// [`SchemaRegistry`](crate::SchemaRegistry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct RecordKey {
    pub class: RecordClass,
    pub group: InstrumentGroup,
    pub subclass: u8,
}

impl RecordKey {
    pub fn new(class: RecordClass, group: InstrumentGroup, subclass: u8) -> Self {
        Self {
            class,
            group,
            subclass,
        }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.class, self.group, self.subclass)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_valid_byte_maps_back_to_itself() {
        for b in 0u8..=8 {
            assert_eq!(RecordClass::try_from(b).unwrap() as u8, b);
        }
        for b in 0u8..=15 {
            assert_eq!(InstrumentGroup::try_from(b).unwrap() as u8, b);
        }
    }

    #[test]
    fn out_of_range_bytes_are_format_errors() {
        let err = RecordClass::try_from(9).unwrap_err();
        assert!(matches!(err, Error::InvalidRecordClass(9)));
        assert_eq!(err.kind(), crate::ErrorKind::Format);
        assert!(matches!(
            InstrumentGroup::try_from(16),
            Err(Error::InvalidInstrumentGroup(16))
        ));
    }

    #[test]
    fn key_display_matches_registry_format() {
        let key = RecordKey::new(RecordClass::Giadr, InstrumentGroup::IasiL2, 1);
        assert_eq!(key.to_string(), "giadr:iasi_l2:1");
    }
}
