// body.rs
//! Expansion of the pointer table into the product body layout.

use crate::{
    Error, Result,
    engine::BackingStore,
    records::{GRH_SIZE, GenericRecordHeader, InternalPointerRecord, RecordKey},
    schema::{Member, RecordLookup, SchemaRegistry, Type, generic},
};
use log::{debug, warn};
use std::collections::HashSet;

/// How the record type of a run was found in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub enum LookupKind {
    Exact,
    ClassFallback,
    /// Not registered; the run is kept as one opaque element.
    Unknown,
}

/// A homogeneous run of records addressed by one internal pointer.
#[derive(Debug, Clone, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct RecordRun {
    pub key: RecordKey,
    /// Member name of the run in the body compound (unique).
    pub name: String,
    /// Name of the record type, e.g. `mdr-1c`; the key for unknown records.
    pub record_name: String,
    /// Absolute offset of the first record.
    pub offset: u64,
    /// Bytes from `offset` to the next run (or the end of the store).
    pub span: u64,
    /// Full record size including the GRH, when static.
    pub record_size: Option<u64>,
    pub count: u64,
    pub lookup: LookupKind,
}

impl RecordRun {
    pub fn is_opaque(&self) -> bool {
        self.lookup == LookupKind::Unknown
    }
}

/// Layout of everything after the pointer table.
#[derive(Debug, Clone)]
pub struct BodyLayout {
    /// Absolute offset of the first run.
    pub offset: u64,
    pub runs: Vec<RecordRun>,
    /// Compound with one sequence member per run, plus padding members for
    /// trailing bytes that do not form a whole record.
    pub ty: Type,
}

impl BodyLayout {
    pub fn run(&self, name: &str) -> Option<&RecordRun> {
        self.runs.iter().find(|r| r.name == name)
    }
}

fn unique_name(used: &mut HashSet<String>, base: &str) -> String {
    let mut name = base.to_string();
    let mut n = 2;
    while !used.insert(name.clone()) {
        name = format!("{base}-{n}");
        n += 1;
    }
    name
}

/// Count records of variable size by following each GRH `record_size`.
fn walk_records(store: &dyn BackingStore, start: u64, end: u64) -> Result<u64> {
    let mut pos = start;
    let mut count = 0;
    while pos < end {
        let grh = GenericRecordHeader::from_bytes(&store.read_range(pos, GRH_SIZE as u64)?)?;
        let size = u64::from(grh.record_size);
        if size < GRH_SIZE as u64 || pos + size > end {
            return Err(Error::InvalidRecordSize {
                offset: pos,
                size: grh.record_size,
            });
        }
        pos += size;
        count += 1;
    }
    Ok(count)
}

/// Build the body layout from the pointer table.
///
/// Run `i` spans from its pointer's target offset to the next pointer's
/// target offset; the last run extends to the end of the store.
pub(crate) fn build_layout(
    store: &dyn BackingStore,
    registry: &SchemaRegistry,
    pointers: &[InternalPointerRecord],
) -> Result<BodyLayout> {
    let end_of_store = store.len();
    let offset = pointers
        .first()
        .map_or(end_of_store, |p| u64::from(p.target_offset));
    let grh = generic::grh()?;

    let mut used = HashSet::new();
    let mut runs = Vec::with_capacity(pointers.len());
    let mut members = Vec::with_capacity(pointers.len());

    for (i, pointer) in pointers.iter().enumerate() {
        let start = u64::from(pointer.target_offset);
        let end = pointers
            .get(i + 1)
            .map_or(end_of_store, |next| u64::from(next.target_offset));
        if end < start {
            return Err(Error::PointerOutOfOrder {
                previous: start,
                next: end,
            });
        }
        if end > end_of_store {
            return Err(Error::Truncated {
                offset: start,
                length: end - start,
                available: end_of_store,
            });
        }
        let span = end - start;
        let key = pointer.target();

        let lookup = registry.resolve_record_type(key, span);
        let (kind, body) = match lookup {
            RecordLookup::Exact(t) => (LookupKind::Exact, t),
            RecordLookup::ClassFallback(t) => (LookupKind::ClassFallback, t),
            RecordLookup::Unknown(t) => (LookupKind::Unknown, t),
        };

        if kind == LookupKind::Unknown {
            warn!(
                "No type registered for {} records; keeping {} bytes at offset {} opaque",
                key, span, start
            );
            let record_name = key.to_string();
            let name = unique_name(&mut used, &record_name);
            let count = u64::from(span > 0);
            members.push(Member::new(name.clone(), Type::sequence(body, count)));
            runs.push(RecordRun {
                key,
                name,
                record_name,
                offset: start,
                span,
                record_size: Some(span),
                count,
                lookup: kind,
            });
            continue;
        }

        let record_name = match body.as_compound() {
            Some(c) => c.name().to_string(),
            None => key.to_string(),
        };
        let element = generic::with_header(&record_name, &grh, &body)?;
        let name = unique_name(&mut used, &record_name);

        let (count, record_size) = match element.size() {
            Some(size) => {
                let count = span / size;
                let remainder = span % size;
                members.push(Member::new(name.clone(), Type::sequence(element, count)));
                if remainder != 0 {
                    warn!(
                        "{} run at offset {}: {} trailing bytes after {} records of {} bytes",
                        record_name, start, remainder, count, size
                    );
                    let padding = unique_name(&mut used, &format!("{name}-padding"));
                    members.push(Member::new(padding, Type::opaque(remainder)));
                }
                (count, Some(size))
            }
            None => {
                let count = walk_records(store, start, end)?;
                members.push(Member::new(name.clone(), Type::sequence(element, count)));
                (count, None)
            }
        };

        debug!(
            "Run {} ({}): {} records at offset {}",
            name, key, count, start
        );
        runs.push(RecordRun {
            key,
            name,
            record_name,
            offset: start,
            span,
            record_size,
            count,
            lookup: kind,
        });
    }

    Ok(BodyLayout {
        offset,
        runs,
        ty: Type::compound("body", members)?,
    })
}
