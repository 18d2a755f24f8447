// header_record.rs
use super::GRH_SIZE;
use crate::{
    Error, Result,
    records::{GenericRecordHeader, InstrumentGroup, RecordClass, RecordKey},
};

/// Width of the key column in an ASCII header line.
const KEY_WIDTH: usize = 30;

/// ASCII product header record (MPHR or SPHR).
///
/// The body is a sequence of `KEY = VALUE` lines. It is kept as an ordered
/// list so a header can be written back byte-for-byte in the same order.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderRecord {
    pub header: GenericRecordHeader,
    pub entries: Vec<(String, String)>,
}

impl HeaderRecord {
    /// Build a header record of the given class (MPHR or SPHR).
    ///
    /// The GRH record size is computed from the encoded entries.
    pub fn new(class: RecordClass, entries: Vec<(String, String)>) -> Self {
        let mut record = Self {
            header: GenericRecordHeader::new(
                RecordKey::new(class, InstrumentGroup::Generic, 0),
                2,
                0,
            ),
            entries,
        };
        record.header.record_size = (GRH_SIZE + record.encode_body().len()) as u32;
        record
    }

    /// Look up the value of `key`, trimmed of surrounding whitespace.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Look up an integer value (`+000000000765` style values are accepted).
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(|v| v.parse::<i64>().ok())
    }

    pub fn product_name(&self) -> Option<&str> {
        self.get("PRODUCT_NAME")
    }

    pub fn instrument_id(&self) -> Option<&str> {
        self.get("INSTRUMENT_ID")
    }

    /// Number of MDRs announced by the header.
    pub fn total_mdr(&self) -> Option<i64> {
        self.get_i64("TOTAL_MDR")
    }

    fn encode_body(&self) -> Vec<u8> {
        let mut body = Vec::new();
        for (key, value) in &self.entries {
            body.extend_from_slice(format!("{key:<KEY_WIDTH$}= {value}\n").as_bytes());
        }
        body
    }

    /// Serialize the full record (GRH + ASCII body).
    pub fn to_bytes(&self) -> Vec<u8> {
        let body = self.encode_body();
        let mut header = self.header;
        header.record_size = (GRH_SIZE + body.len()) as u32;
        let mut out = Vec::with_capacity(GRH_SIZE + body.len());
        out.extend_from_slice(&header.to_bytes());
        out.extend_from_slice(&body);
        out
    }

    /// Parse a full record; `bytes` must contain at least `record_size` bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let header = GenericRecordHeader::from_bytes(bytes)?;
        if !matches!(header.record_class, RecordClass::Mphr | RecordClass::Sphr) {
            return Err(Error::UnexpectedRecord {
                offset: 0,
                expected: "mphr or sphr".to_string(),
                found: header.key().to_string(),
            });
        }
        let end = header.record_size as usize;
        if end < GRH_SIZE || end > bytes.len() {
            return Err(Error::TooShortBuffer {
                actual: bytes.len(),
                expected: end.max(GRH_SIZE),
                file: file!(),
                line: line!(),
            });
        }

        let text = String::from_utf8_lossy(&bytes[GRH_SIZE..end]);
        let mut entries = Vec::new();
        for line in text.lines() {
            let line = line.trim_end_matches('\0');
            if line.trim().is_empty() {
                continue;
            }
            let (key, value) = line.split_once('=').ok_or_else(|| {
                Error::InvalidHeaderRecord(format!("line without '=': {:?}", line))
            })?;
            entries.push((key.trim().to_string(), value.trim().to_string()));
        }

        Ok(Self { header, entries })
    }
}
