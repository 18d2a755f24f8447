// src/records/mod.rs

// ============================================================================
// Record Size Constants
// ============================================================================
// Fixed sizes of the generic EPS structures. Instrument record bodies are
// described by the schema catalog and have no constants here.

/// Generic record header size (20 bytes) - prefix of every record.
pub const GRH_SIZE: usize = 20;

/// Internal pointer record size (27 bytes) - GRH plus the 7-byte target.
pub const IPR_RECORD_SIZE: usize = 27;

/// Short CDS time size (6 bytes) - u16 day, u32 milliseconds.
pub const SHORT_CDS_TIME_SIZE: usize = 6;

/// Scaled integer size (5 bytes) - i8 exponent, i32 mantissa.
pub const VINT4_SIZE: usize = 5;

// ============================================================================
// Submodules
// ============================================================================

pub(crate) mod common;
mod grh;
mod header_record;
mod ipr;
mod record_class;
mod time;
mod vint4;

pub use grh::GenericRecordHeader;
pub use header_record::HeaderRecord;
pub use ipr::InternalPointerRecord;
pub use record_class::{InstrumentGroup, RecordClass, RecordKey};
pub use time::{EPS_EPOCH_UNIX_SECONDS, ShortCdsTime};
pub use vint4::VInt4;
