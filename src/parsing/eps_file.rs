// eps_file.rs
use super::body::{BodyLayout, RecordRun, build_layout};
use crate::{
    Error, Result,
    engine::{BackingStore, CompoundInstance, SequenceInstance},
    records::{
        GRH_SIZE, GenericRecordHeader, HeaderRecord, IPR_RECORD_SIZE, InstrumentGroup,
        InternalPointerRecord, RecordClass, RecordKey,
    },
    schema::{Member, SchemaRegistry, Type, generic},
};
use log::{debug, warn};
use once_cell::sync::OnceCell;
use std::sync::Arc;

struct Body {
    layout: BodyLayout,
    root: Arc<CompoundInstance>,
    body: Arc<CompoundInstance>,
}

/// A parsed EPS container: product headers, the pointer table, and a body
/// layout that is expanded on first use.
///
/// Opening reads only the headers and the pointer records. The body layout
/// (record types, counts and offsets of every run) is built once, the first
/// time any body accessor is called.
pub struct EpsFile {
    store: Arc<dyn BackingStore>,
    registry: Arc<SchemaRegistry>,
    mphr: HeaderRecord,
    sphr: Option<HeaderRecord>,
    header_size: u64,
    pointers: Vec<InternalPointerRecord>,
    body: OnceCell<Body>,
}

fn read_grh(store: &dyn BackingStore, offset: u64) -> Result<GenericRecordHeader> {
    GenericRecordHeader::from_bytes(&store.read_range(offset, GRH_SIZE as u64)?)
}

/// Read a full ASCII header record starting at `offset`.
fn read_header_record(store: &dyn BackingStore, offset: u64) -> Result<HeaderRecord> {
    let grh = read_grh(store, offset)?;
    let size = u64::from(grh.record_size);
    if size <= GRH_SIZE as u64 {
        return Err(Error::InvalidRecordSize {
            offset,
            size: grh.record_size,
        });
    }
    HeaderRecord::from_bytes(&store.read_range(offset, size)?)
}

/// Read pointer records from `offset` up to and including the first one
/// that targets the MDR class.
fn scan_pointers(store: &dyn BackingStore, mut offset: u64) -> Result<Vec<InternalPointerRecord>> {
    let mut pointers: Vec<InternalPointerRecord> = Vec::new();
    loop {
        if offset + IPR_RECORD_SIZE as u64 > store.len() {
            return Err(Error::MissingMdrPointer {
                scanned: pointers.len(),
            });
        }
        let bytes = store.read_range(offset, IPR_RECORD_SIZE as u64)?;
        let grh = GenericRecordHeader::from_bytes(&bytes)?;
        if grh.record_class != RecordClass::Ipr {
            return Err(Error::UnexpectedRecord {
                offset,
                expected: RecordClass::Ipr.to_string(),
                found: grh.key().to_string(),
            });
        }
        if grh.record_size as usize != IPR_RECORD_SIZE {
            return Err(Error::InvalidRecordSize {
                offset,
                size: grh.record_size,
            });
        }
        let pointer = InternalPointerRecord::from_bytes(&bytes)?;
        if let Some(previous) = pointers.last() {
            if pointer.target_offset < previous.target_offset {
                return Err(Error::PointerOutOfOrder {
                    previous: u64::from(previous.target_offset),
                    next: u64::from(pointer.target_offset),
                });
            }
        }
        debug!(
            "Pointer {} at offset {}: {} -> {}",
            pointers.len(),
            offset,
            pointer.target(),
            pointer.target_offset
        );
        offset += IPR_RECORD_SIZE as u64;
        let is_mdr = pointer.target_class == RecordClass::Mdr;
        pointers.push(pointer);
        if is_mdr {
            return Ok(pointers);
        }
    }
}

impl EpsFile {
    /// Parse the product headers and pointer table of `store`.
    ///
    /// # Errors
    /// A format error when the first record is not an MPHR, when a header
    /// carries an invalid enumeration byte, or when the pointer table ends
    /// before a pointer to the MDRs.
    pub fn open(store: Arc<dyn BackingStore>, registry: Arc<SchemaRegistry>) -> Result<Self> {
        let first = read_grh(&*store, 0)?;
        let expected = RecordKey::new(RecordClass::Mphr, InstrumentGroup::Generic, 0);
        if first.key() != expected {
            return Err(Error::UnexpectedRecord {
                offset: 0,
                expected: expected.to_string(),
                found: first.key().to_string(),
            });
        }
        let mphr = read_header_record(&*store, 0)?;
        let mut header_size = u64::from(mphr.header.record_size);

        let mut sphr = None;
        if header_size + GRH_SIZE as u64 <= store.len()
            && read_grh(&*store, header_size)?.record_class == RecordClass::Sphr
        {
            let record = read_header_record(&*store, header_size)?;
            header_size += u64::from(record.header.record_size);
            sphr = Some(record);
        }
        debug!(
            "Product {:?}: headers end at offset {}",
            mphr.product_name().unwrap_or("?"),
            header_size
        );

        let pointers = scan_pointers(&*store, header_size)?;
        debug!("Pointer table holds {} entries", pointers.len());

        Ok(Self {
            store,
            registry,
            mphr,
            sphr,
            header_size,
            pointers,
            body: OnceCell::new(),
        })
    }

    pub fn store(&self) -> &Arc<dyn BackingStore> {
        &self.store
    }

    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    pub fn mphr(&self) -> &HeaderRecord {
        &self.mphr
    }

    pub fn sphr(&self) -> Option<&HeaderRecord> {
        self.sphr.as_ref()
    }

    /// Size of the MPHR plus the optional SPHR.
    pub fn header_size(&self) -> u64 {
        self.header_size
    }

    pub fn pointers(&self) -> &[InternalPointerRecord] {
        &self.pointers
    }

    /// End of the pointer table.
    pub fn pointer_table_end(&self) -> u64 {
        self.header_size + (self.pointers.len() * IPR_RECORD_SIZE) as u64
    }

    fn body(&self) -> Result<&Body> {
        self.body.get_or_try_init(|| self.expand_body())
    }

    fn expand_body(&self) -> Result<Body> {
        debug!("Expanding body layout of {} pointers", self.pointers.len());
        let layout = build_layout(&*self.store, &self.registry, &self.pointers)?;

        let mut members = vec![Member::new(
            "mphr",
            Type::opaque(u64::from(self.mphr.header.record_size)),
        )];
        if let Some(sphr) = &self.sphr {
            members.push(Member::new(
                "sphr",
                Type::opaque(u64::from(sphr.header.record_size)),
            ));
        }
        let ipr = generic::with_header("ipr", &generic::grh()?, &generic::ipr()?)?;
        members.push(Member::new(
            "ipr",
            Type::sequence(ipr, self.pointers.len() as u64),
        ));

        let table_end = self.pointer_table_end();
        if layout.offset < table_end {
            return Err(Error::PointerOutOfOrder {
                previous: table_end,
                next: layout.offset,
            });
        }
        if layout.offset > table_end {
            warn!(
                "{} unreferenced bytes between the pointer table and the first run",
                layout.offset - table_end
            );
            members.push(Member::new("gap", Type::opaque(layout.offset - table_end)));
        }
        members.push(Member::new("body", layout.ty.clone()));

        let root_type = Type::compound("product", members)?;
        let root = match root_type.as_compound() {
            Some(c) => Arc::new(CompoundInstance::new(self.store.clone(), c.clone(), 0)),
            None => return Err(Error::UnresolvedSize("product".to_string())),
        };
        let body = root.compound("body")?;
        Ok(Body { layout, root, body })
    }

    /// The body layout, expanded on first call.
    pub fn layout(&self) -> Result<&BodyLayout> {
        Ok(&self.body()?.layout)
    }

    pub fn runs(&self) -> Result<&[RecordRun]> {
        Ok(&self.body()?.layout.runs)
    }

    /// The whole product as one compound: headers, pointer table, body.
    pub fn root(&self) -> Result<Arc<CompoundInstance>> {
        Ok(self.body()?.root.clone())
    }

    /// The records of one run.
    pub fn records(&self, run: &RecordRun) -> Result<Arc<SequenceInstance>> {
        self.body()?.body.sequence(&run.name)
    }

    fn first_run(&self, matches: impl Fn(&RecordRun) -> bool) -> Result<Option<Arc<SequenceInstance>>> {
        match self.runs()?.iter().find(|r| !r.is_opaque() && matches(r)) {
            Some(run) => self.records(run).map(Some),
            None => Ok(None),
        }
    }

    /// Records of the first run whose record type is called `name`.
    pub fn aux_data_record(&self, name: &str) -> Result<Option<Arc<SequenceInstance>>> {
        self.first_run(|r| r.record_name == name)
    }

    /// Records of the first run of measurement data records.
    pub fn mdr_sequence(&self) -> Result<Option<Arc<SequenceInstance>>> {
        self.first_run(|r| r.record_name.starts_with("mdr"))
    }

    /// Raw bytes of record `index` of `run`, GRH included.
    pub fn record_bytes(&self, run: &RecordRun, index: u64) -> Result<Vec<u8>> {
        let records = self.records(run)?;
        let offset = records.element_offset(index)?;
        let size = match run.record_size {
            Some(size) => size,
            None => u64::from(read_grh(&*self.store, offset)?.record_size),
        };
        self.store.read_range(offset, size)
    }
}

impl core::fmt::Debug for EpsFile {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EpsFile")
            .field("product", &self.mphr.product_name())
            .field("header_size", &self.header_size)
            .field("pointers", &self.pointers.len())
            .finish()
    }
}
