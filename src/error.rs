//! Error types for EPS product decoding.
//!
//! This module defines the [`Error`] enum which represents all possible failures
//! that can occur when opening, decoding or writing EPS products, and the
//! coarser [`ErrorKind`] classification used to decide how far a failure
//! propagates.
//!
//! # Example
//!
//! ```no_run
//! use eps_rs::{EpsProduct, Error, ErrorKind, SchemaRegistry};
//! use std::sync::Arc;
//!
//! fn open(path: &str) -> eps_rs::Result<()> {
//!     let registry = Arc::new(SchemaRegistry::with_generic_types()?);
//!     match EpsProduct::from_file(path, registry) {
//!         Ok(product) => {
//!             println!("{} pointers", product.pointers().len());
//!             Ok(())
//!         }
//!         Err(e) if e.kind() == ErrorKind::Format => {
//!             eprintln!("Not a readable EPS product: {}", e);
//!             Err(e)
//!         }
//!         Err(e) => Err(e),
//!     }
//! }
//! ```

use core::fmt;

/// Coarse classification of an [`Error`].
///
/// Format and schema errors abort opening a product. Index and decode errors
/// are caller precondition violations. `Missing` means a record type an
/// instrument decoder needs is not present in the product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Format,
    Schema,
    Index,
    Decode,
    Missing,
    Io,
}

/// Errors that can occur during EPS product operations.
#[derive(Debug)]
pub enum Error {
    /// Buffer provided for parsing was too small.
    TooShortBuffer {
        /// Actual number of bytes available
        actual: usize,
        /// Minimum number of bytes required
        expected: usize,
        /// Source file where the error was detected
        file: &'static str,
        /// Line number where the error was detected
        line: u32,
    },

    /// A read went past the end of the backing store.
    Truncated {
        offset: u64,
        length: u64,
        available: u64,
    },

    /// A record header carried a record class byte outside the known range.
    InvalidRecordClass(u8),

    /// A record header carried an instrument group byte outside the known range.
    InvalidInstrumentGroup(u8),

    /// A record was found where a different record was required.
    UnexpectedRecord {
        /// Offset of the offending record
        offset: u64,
        /// What was expected, e.g. "mphr:generic:0"
        expected: String,
        /// What was found
        found: String,
    },

    /// The internal pointer chain ended without a pointer to the MDRs.
    MissingMdrPointer {
        /// Number of pointer records read before the stream ended
        scanned: usize,
    },

    /// Pointer target offsets are not ascending, so run spans cannot be derived.
    PointerOutOfOrder { previous: u64, next: u64 },

    /// An ASCII header record (MPHR/SPHR) could not be parsed.
    InvalidHeaderRecord(String),

    /// A record header declares a size that cannot hold the record.
    InvalidRecordSize { offset: u64, size: u32 },

    /// A type or record key was defined twice in a schema registry.
    DuplicateType(String),

    /// A compound was built with two members of the same name.
    DuplicateMember { compound: String, member: String },

    /// A simple type with an unsupported width/kind combination.
    InvalidSimpleType { width: u8, float: bool },

    /// A variable count refers to a field that is not an earlier integer sibling.
    InvalidFieldReference { compound: String, field: String },

    /// A catalog refers to a type name that is not registered.
    UnknownType(String),

    /// A schema catalog document could not be read.
    Catalog(String),

    /// A sequence element or record index outside the valid range.
    IndexOutOfRange { index: u64, len: u64 },

    /// An observation coordinate outside the instrument geometry.
    InvalidObservation(String),

    /// A compound has no member with the requested name.
    NoSuchField { compound: String, field: String },

    /// A field was accessed as the wrong kind of value.
    TypeMismatch {
        expected: &'static str,
        found: String,
    },

    /// A byte size was required for a type whose size depends on instance data.
    UnresolvedSize(String),

    /// A field path could not be parsed or walked.
    InvalidPath(String),

    /// A record type required by a decoder is absent from the product.
    MissingRecord(String),

    /// A product index could not be written or read back as JSON.
    IndexSerialization(String),

    /// An I/O error occurred while reading or writing a file.
    IOError(std::io::Error),
}

impl Error {
    /// Return the taxonomy class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::TooShortBuffer { .. }
            | Error::Truncated { .. }
            | Error::InvalidRecordClass(_)
            | Error::InvalidInstrumentGroup(_)
            | Error::UnexpectedRecord { .. }
            | Error::MissingMdrPointer { .. }
            | Error::PointerOutOfOrder { .. }
            | Error::InvalidHeaderRecord(_)
            | Error::InvalidRecordSize { .. } => ErrorKind::Format,
            Error::DuplicateType(_)
            | Error::DuplicateMember { .. }
            | Error::InvalidSimpleType { .. }
            | Error::InvalidFieldReference { .. }
            | Error::UnknownType(_)
            | Error::Catalog(_) => ErrorKind::Schema,
            Error::IndexOutOfRange { .. } | Error::InvalidObservation(_) => ErrorKind::Index,
            Error::NoSuchField { .. }
            | Error::TypeMismatch { .. }
            | Error::UnresolvedSize(_)
            | Error::InvalidPath(_) => ErrorKind::Decode,
            Error::MissingRecord(_) => ErrorKind::Missing,
            Error::IndexSerialization(_) | Error::IOError(_) => ErrorKind::Io,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::TooShortBuffer {
                actual,
                expected,
                file,
                line,
            } => write!(
                f,
                "Buffer too small at {file}:{line}: need at least {expected} bytes, got {actual}"
            ),
            Error::Truncated {
                offset,
                length,
                available,
            } => write!(
                f,
                "Truncated stream: {length} bytes requested at offset {offset}, store holds {available}"
            ),
            Error::InvalidRecordClass(b) => write!(f, "Invalid record class byte {b}"),
            Error::InvalidInstrumentGroup(b) => write!(f, "Invalid instrument group byte {b}"),
            Error::UnexpectedRecord {
                offset,
                expected,
                found,
            } => write!(
                f,
                "Unexpected record at offset {offset}: expected {expected}, found {found}"
            ),
            Error::MissingMdrPointer { scanned } => write!(
                f,
                "Pointer chain ended after {scanned} records without an MDR pointer"
            ),
            Error::PointerOutOfOrder { previous, next } => write!(
                f,
                "Pointer target offsets not ascending: {next} follows {previous}"
            ),
            Error::InvalidHeaderRecord(s) => write!(f, "Invalid header record: {s}"),
            Error::InvalidRecordSize { offset, size } => {
                write!(f, "Record at offset {offset} declares invalid size {size}")
            }
            Error::DuplicateType(name) => write!(f, "Type {name:?} is already defined"),
            Error::DuplicateMember { compound, member } => {
                write!(f, "Compound {compound:?} declares member {member:?} twice")
            }
            Error::InvalidSimpleType { width, float } => {
                write!(f, "Unsupported simple type: width {width}, float {float}")
            }
            Error::InvalidFieldReference { compound, field } => write!(
                f,
                "Count of a member in {compound:?} refers to {field:?}, which is not an earlier integer member"
            ),
            Error::UnknownType(name) => write!(f, "Unknown type {name:?}"),
            Error::Catalog(s) => write!(f, "Schema catalog error: {s}"),
            Error::IndexOutOfRange { index, len } => {
                write!(f, "Index {index} out of range for length {len}")
            }
            Error::InvalidObservation(s) => write!(f, "Invalid observation: {s}"),
            Error::NoSuchField { compound, field } => {
                write!(f, "Compound {compound:?} has no member {field:?}")
            }
            Error::TypeMismatch { expected, found } => {
                write!(f, "Type mismatch: expected {expected}, found {found}")
            }
            Error::UnresolvedSize(s) => write!(f, "Size of {s} depends on instance data"),
            Error::InvalidPath(s) => write!(f, "Invalid field path: {s}"),
            Error::MissingRecord(s) => write!(f, "Record {s:?} not present in this product"),
            Error::IndexSerialization(s) => write!(f, "Index serialization failed: {s}"),
            Error::IOError(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IOError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IOError(err)
    }
}

/// A specialized Result type for EPS operations.
pub type Result<T> = core::result::Result<T, Error>;
