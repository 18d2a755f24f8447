use crate::{
    Result,
    engine::{BackingStore, CompoundInstance, FileStore, MemoryStore, SequenceInstance},
    parsing::{EpsFile, RecordRun},
    records::{HeaderRecord, InternalPointerRecord},
    schema::SchemaRegistry,
};
use log::debug;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug)]
/// High level handle on an EPS product.
///
/// Opening a product reads only its headers and pointer table; records are
/// decoded on demand. The backing file is closed when the product and every
/// instance obtained from it have been dropped.
pub struct EpsProduct {
    raw: EpsFile,
}

impl EpsProduct {
    /// Open a product file from disk.
    ///
    /// # Arguments
    /// * `path` - Path to the product file.
    /// * `registry` - Types used to decode the product's records.
    ///
    /// # Returns
    /// A new [`EpsProduct`] on success or [`crate::Error`] on failure.
    pub fn from_file(path: impl AsRef<Path>, registry: Arc<SchemaRegistry>) -> Result<Self> {
        Self::from_store(Arc::new(FileStore::open(path)?), registry)
    }

    /// Open a product held in memory.
    ///
    /// # Arguments
    /// * `data` - Complete product bytes.
    /// * `registry` - Types used to decode the product's records.
    pub fn from_bytes(data: Vec<u8>, registry: Arc<SchemaRegistry>) -> Result<Self> {
        Self::from_store(Arc::new(MemoryStore::new(data)), registry)
    }

    /// Open a product over any [`BackingStore`].
    ///
    /// # Errors
    /// A format error when the headers or the pointer table are corrupt.
    pub fn from_store(store: Arc<dyn BackingStore>, registry: Arc<SchemaRegistry>) -> Result<Self> {
        Ok(Self {
            raw: EpsFile::open(store, registry)?,
        })
    }

    /// Access the parsed container structure: headers, pointer table and
    /// body layout.
    pub fn raw(&self) -> &EpsFile {
        &self.raw
    }

    /// Main product header.
    pub fn mphr(&self) -> &HeaderRecord {
        self.raw.mphr()
    }

    /// Secondary product header, when the product carries one.
    pub fn sphr(&self) -> Option<&HeaderRecord> {
        self.raw.sphr()
    }

    /// Internal pointer records, in file order. The last one targets the
    /// MDR class.
    pub fn pointers(&self) -> &[InternalPointerRecord] {
        self.raw.pointers()
    }

    /// Record runs of the body, in file order.
    pub fn runs(&self) -> Result<&[RecordRun]> {
        self.raw.runs()
    }

    /// The whole product decoded as one compound.
    pub fn root(&self) -> Result<Arc<CompoundInstance>> {
        self.raw.root()
    }

    /// Records of the first run whose record type is called `name`, e.g.
    /// `giadr-scalefactors`.
    pub fn aux_data_record(&self, name: &str) -> Result<Option<Arc<SequenceInstance>>> {
        self.raw.aux_data_record(name)
    }

    /// The measurement data records, if the product has any typed MDR run.
    pub fn mdr_sequence(&self) -> Result<Option<Arc<SequenceInstance>>> {
        self.raw.mdr_sequence()
    }

    /// Number of measurement data records (0 without a typed MDR run).
    pub fn mdr_count(&self) -> Result<u64> {
        Ok(self.mdr_sequence()?.map_or(0, |mdrs| mdrs.len()))
    }

    /// Release the product; equivalent to dropping it.
    ///
    /// The backing store is shared with every instance obtained from the
    /// product, so it stays open until the last of those is dropped too.
    pub fn close(self) {
        debug!(
            "Closing product {:?}",
            self.mphr().product_name().unwrap_or("?")
        );
    }
}
