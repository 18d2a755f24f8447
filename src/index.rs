//! Product indexing.
//!
//! A [`ProductIndex`] records where every run of records lives in a product
//! file. It serializes to JSON, so a later session can fetch single records
//! without parsing headers, pointers or schemas again.
//!
//! ```no_run
//! use eps_rs::{FileStore, ProductIndex, Result, SchemaRegistry};
//! use std::sync::Arc;
//!
//! fn index_once() -> Result<()> {
//!     let registry = Arc::new(SchemaRegistry::with_generic_types()?);
//!     let index = ProductIndex::from_file("product.nat", registry)?;
//!     index.save_to_file("product.index.json")?;
//!
//!     // later
//!     let index = ProductIndex::load_from_file("product.index.json")?;
//!     let store = FileStore::open("product.nat")?;
//!     let run = index.mdr_run().map(|r| r.name.clone()).unwrap_or_default();
//!     let bytes = index.read_record(&run, 0, &store)?;
//!     println!("first MDR is {} bytes", bytes.len());
//!     Ok(())
//! }
//! ```

use crate::{
    Error, Result,
    engine::BackingStore,
    parsing::RecordRun,
    product::EpsProduct,
    records::{GRH_SIZE, GenericRecordHeader, InternalPointerRecord},
    schema::SchemaRegistry,
};
use std::path::Path;
use std::sync::Arc;

/// Location of every record run of one product file.
#[derive(Debug, Clone, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct ProductIndex {
    /// File size, checked before reading through the index.
    pub file_size: u64,
    /// Size of the MPHR and optional SPHR.
    pub header_size: u64,
    pub product_name: Option<String>,
    pub pointers: Vec<InternalPointerRecord>,
    pub runs: Vec<RecordRun>,
}

impl ProductIndex {
    /// Build an index of an opened product. Expands its body layout.
    pub fn from_product(product: &EpsProduct) -> Result<Self> {
        let raw = product.raw();
        Ok(Self {
            file_size: raw.store().len(),
            header_size: raw.header_size(),
            product_name: product.mphr().product_name().map(str::to_string),
            pointers: product.pointers().to_vec(),
            runs: product.runs()?.to_vec(),
        })
    }

    /// Open a product file and index it.
    pub fn from_file(path: impl AsRef<Path>, registry: Arc<SchemaRegistry>) -> Result<Self> {
        Self::from_product(&EpsProduct::from_file(path, registry)?)
    }

    /// Save the index as pretty-printed JSON.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| Error::IndexSerialization(format!("JSON serialization failed: {e}")))?;
        std::fs::write(path, json).map_err(Error::IOError)?;
        Ok(())
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(Error::IOError)?;
        serde_json::from_str(&json)
            .map_err(|e| Error::IndexSerialization(format!("JSON deserialization failed: {e}")))
    }

    pub fn run(&self, name: &str) -> Option<&RecordRun> {
        self.runs.iter().find(|r| r.name == name)
    }

    /// The first typed run of measurement data records.
    pub fn mdr_run(&self) -> Option<&RecordRun> {
        self.runs
            .iter()
            .find(|r| !r.is_opaque() && r.record_name.starts_with("mdr"))
    }

    fn check_store(&self, store: &dyn BackingStore) -> Result<()> {
        if store.len() != self.file_size {
            return Err(Error::IndexSerialization(format!(
                "index describes {} bytes, store holds {}",
                self.file_size,
                store.len()
            )));
        }
        Ok(())
    }

    /// Absolute offset and size of record `index` of run `run`.
    ///
    /// Runs of variable-size records are walked header by header.
    pub fn record_location(
        &self,
        run: &str,
        index: u64,
        store: &dyn BackingStore,
    ) -> Result<(u64, u64)> {
        self.check_store(store)?;
        let run = self
            .run(run)
            .ok_or_else(|| Error::MissingRecord(run.to_string()))?;
        if index >= run.count {
            return Err(Error::IndexOutOfRange {
                index,
                len: run.count,
            });
        }
        if let Some(size) = run.record_size {
            return Ok((run.offset + index * size, size));
        }

        let grh_size = |pos: u64| -> Result<u64> {
            let grh = GenericRecordHeader::from_bytes(&store.read_range(pos, GRH_SIZE as u64)?)?;
            Ok(u64::from(grh.record_size))
        };
        let mut pos = run.offset;
        for _ in 0..index {
            pos += grh_size(pos)?;
        }
        Ok((pos, grh_size(pos)?))
    }

    /// Raw bytes (GRH included) of record `index` of run `run`.
    pub fn read_record(&self, run: &str, index: u64, store: &dyn BackingStore) -> Result<Vec<u8>> {
        let (offset, size) = self.record_location(run, index, store)?;
        store.read_range(offset, size)
    }
}
