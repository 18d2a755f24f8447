#![forbid(unsafe_code)]

//! # eps-rs
//!
//! A Rust library for reading and writing EUMETSAT Polar System (EPS)
//! native products, such as those of the METOP IASI sounder.
//!
//! EPS products are big-endian binary files made of records. Every record
//! starts with a 20-byte generic record header (GRH). A product begins with
//! an ASCII main product header (MPHR), an optional secondary header (SPHR)
//! and a table of internal pointer records (IPR). Each IPR points at a run of
//! records of one type: auxiliary data records and, last, the measurement
//! data records (MDR).
//!
//! Record layouts are not compiled in. They come from a type catalog loaded
//! into a [`SchemaRegistry`], and may contain arrays whose length is a value
//! stored earlier in the same record. Records are decoded lazily: opening a
//! product reads the headers and pointers only, and each field is read from
//! the file when it is first requested.
//!
//! ## Features
//!
//! - **Reading**: open products from disk or memory and walk any record by
//!   field name or path
//! - **Schemas**: JSON type catalogs with variable-length arrays
//! - **IASI**: geolocation, calibrated spectra and brightness temperatures
//!   (`iasi` feature, on by default)
//! - **Writing**: assemble products with [`EpsWriter`] and [`RecordBuilder`]
//! - **Indexing**: JSON indexes for fetching single records later
//!
//! ## Quick Start
//!
//! ### Reading records
//!
//! ```no_run
//! use eps_rs::{EpsProduct, Result, SchemaRegistry};
//! use std::sync::Arc;
//!
//! fn main() -> Result<()> {
//!     let registry = Arc::new(SchemaRegistry::iasi()?);
//!     let product = EpsProduct::from_file("IASI_xxx_1C_M02.nat", registry)?;
//!
//!     for run in product.runs()? {
//!         println!("{}: {} records at {}", run.name, run.count, run.offset);
//!     }
//!     if let Some(mdrs) = product.mdr_sequence()? {
//!         let first = mdrs.compound(0)?;
//!         let lat = first.lookup("GGeoSondLoc[0][0][1]")?.into_value()?;
//!         println!("first pixel latitude (1e-6 deg): {}", lat);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ### IASI brightness temperatures
//!
//! ```no_run
//! use eps_rs::{Result, SchemaRegistry, iasi::IasiProduct};
//! use std::sync::Arc;
//!
//! fn main() -> Result<()> {
//!     let product = IasiProduct::open("IASI_xxx_1C_M02.nat", Arc::new(SchemaRegistry::iasi()?))?;
//!     for sample in product.spectrum(0)?.iter().take(5) {
//!         println!("{:.1} m-1: {:e}", sample.wavenumber, sample.radiance);
//!     }
//!     println!("BT: {:.2} K", product.brightness_temperature(0, 1000)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`records`] | Fixed-format records: GRH, IPR, MPHR/SPHR, CDS time, VInt4 |
//! | [`schema`] | Type system, [`SchemaRegistry`] and JSON catalogs |
//! | [`engine`] | Lazy instances over a [`BackingStore`] |
//! | [`parsing`] | Container parsing and body layout |
//! | [`iasi`] | IASI instrument decoding |
//! | [`writer`] | Product creation with [`EpsWriter`] |
//! | [`index`] | Product indexing for single-record reads |
//! | [`error`] | Error types and [`Result`] alias |
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T>`], an alias for
//! `std::result::Result<T, Error>`. [`Error::kind`] classifies a failure as
//! a format, schema, index, decode, missing-record or I/O error.
//!
//! ## Logging
//!
//! The crate logs through the [`log`](https://docs.rs/log) facade; install
//! any logger to see pointer scans, layout expansion and skipped records.

pub mod engine;
pub mod error;
pub mod index;
pub mod parsing;
pub mod records;
pub mod schema;
pub mod writer;

#[cfg(feature = "iasi")]
pub mod iasi;

mod product;
mod types;

// Re-export commonly used types at the crate root
pub use engine::{BackingStore, CompoundInstance, Field, FileStore, MemoryStore, SequenceInstance};
pub use error::{Error, ErrorKind, Result};
pub use index::ProductIndex;
pub use parsing::{EpsFile, LookupKind, RecordRun};
pub use product::EpsProduct;
pub use records::{
    GenericRecordHeader, HeaderRecord, InstrumentGroup, InternalPointerRecord, RecordClass,
    RecordKey, ShortCdsTime, VInt4,
};
pub use schema::{RecordLookup, SchemaRegistry, Type};
pub use types::DecodedValue;
pub use writer::{EpsWriter, RecordBuilder};
