// instance.rs
//! Lazily decoded compound and sequence instances.
//!
//! An instance is a type bound to an absolute offset in a backing store.
//! Nothing is read until a member or element is requested. Member offsets
//! are derived strictly in declaration order: the offset of member `i` is
//! the end of member `i - 1`, so resolving a member first resolves every
//! member before it. Each resolution (offset, size, variable count) happens
//! at most once per instance and is cached in a once-cell, so a shared
//! instance can be read from several threads.

use super::{path::FieldPath, store::BackingStore};
use crate::{
    DecodedValue, Error, Result,
    records::common::u64_to_usize,
    schema::{CompoundType, Count, SequenceType, SimpleType, Type},
};
use log::trace;
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

/// A decoded member or element.
#[derive(Debug, Clone)]
pub enum Field {
    Value(DecodedValue),
    Compound(Arc<CompoundInstance>),
    Sequence(Arc<SequenceInstance>),
}

impl Field {
    fn kind_name(&self) -> String {
        match self {
            Field::Value(v) => format!("value {v}"),
            Field::Compound(c) => format!("compound {}", c.type_name()),
            Field::Sequence(s) => format!("sequence of {}", s.len()),
        }
    }

    /// The decoded value, or [`Error::TypeMismatch`] for composite fields.
    pub fn into_value(self) -> Result<DecodedValue> {
        match self {
            Field::Value(v) => Ok(v),
            other => Err(Error::TypeMismatch {
                expected: "simple value",
                found: other.kind_name(),
            }),
        }
    }

    pub fn into_compound(self) -> Result<Arc<CompoundInstance>> {
        match self {
            Field::Compound(c) => Ok(c),
            other => Err(Error::TypeMismatch {
                expected: "compound",
                found: other.kind_name(),
            }),
        }
    }

    pub fn into_sequence(self) -> Result<Arc<SequenceInstance>> {
        match self {
            Field::Sequence(s) => Ok(s),
            other => Err(Error::TypeMismatch {
                expected: "sequence",
                found: other.kind_name(),
            }),
        }
    }
}

/// Bind `ty` to `offset` in `store`.
///
/// Simple types are read immediately; composite types return an unread
/// instance. A variable-count sequence cannot be a root since its count is
/// defined relative to an enclosing compound.
pub fn open_at(store: Arc<dyn BackingStore>, ty: &Type, offset: u64) -> Result<Field> {
    match ty {
        Type::Simple(s) => read_simple(&*store, *s, offset).map(Field::Value),
        Type::Compound(c) => Ok(Field::Compound(Arc::new(CompoundInstance::new(
            store,
            c.clone(),
            offset,
        )))),
        Type::Sequence(s) => match s.count() {
            Count::Fixed(n) => Ok(Field::Sequence(Arc::new(SequenceInstance::new(
                store,
                s.clone(),
                offset,
                *n,
            )?))),
            Count::Variable(_) => Err(Error::UnresolvedSize(ty.describe())),
        },
    }
}

/// Bind `ty` to the start of `store`.
pub fn open(store: Arc<dyn BackingStore>, ty: &Type) -> Result<Field> {
    open_at(store, ty, 0)
}

fn read_simple(store: &dyn BackingStore, ty: SimpleType, offset: u64) -> Result<DecodedValue> {
    let bytes = store.read_range(offset, u64::from(ty.width()))?;
    Ok(ty.decode(&bytes))
}

#[derive(Debug, Clone)]
enum Node {
    Simple(SimpleType),
    Compound(Arc<CompoundInstance>),
    Sequence(Arc<SequenceInstance>),
}

/// `offset + length`, or [`Error::Truncated`] when it does not fit in a u64.
fn checked_end(store: &dyn BackingStore, offset: u64, length: u64) -> Result<u64> {
    offset.checked_add(length).ok_or(Error::Truncated {
        offset,
        length,
        available: store.len(),
    })
}

/// Resolved position of one member or element.
#[derive(Debug)]
struct Slot {
    offset: u64,
    end: u64,
    node: Node,
}

impl Slot {
    fn new(store: &dyn BackingStore, offset: u64, size: u64, node: Node) -> Result<Self> {
        Ok(Self {
            offset,
            end: checked_end(store, offset, size)?,
            node,
        })
    }

    fn size(&self) -> u64 {
        self.end - self.offset
    }
}

/// Build the slot for a value of type `ty` at `offset`.
///
/// `parent` supplies the enclosing compound for variable counts; it is
/// `None` for sequence elements, whose types may not carry resolvers of
/// their own at the top level.
fn make_slot(
    store: &Arc<dyn BackingStore>,
    ty: &Type,
    offset: u64,
    parent: Option<&PartialCompound<'_>>,
) -> Result<Slot> {
    match ty {
        Type::Simple(s) => Slot::new(&**store, offset, u64::from(s.width()), Node::Simple(*s)),
        Type::Compound(c) => {
            let instance = Arc::new(CompoundInstance::new(store.clone(), c.clone(), offset));
            let size = match c.size() {
                Some(size) => size,
                None => instance.byte_len()?,
            };
            Slot::new(&**store, offset, size, Node::Compound(instance))
        }
        Type::Sequence(s) => {
            let count = match (s.count(), parent) {
                (Count::Fixed(n), _) => *n,
                (Count::Variable(resolver), Some(parent)) => {
                    let n = resolver.resolve(parent)?;
                    trace!(
                        "{}: resolved count {} for {} at offset {}",
                        parent.type_name(),
                        n,
                        ty.describe(),
                        offset
                    );
                    n
                }
                (Count::Variable(_), None) => return Err(Error::UnresolvedSize(ty.describe())),
            };
            let instance = Arc::new(SequenceInstance::new(store.clone(), s.clone(), offset, count)?);
            let size = instance.byte_len()?;
            Slot::new(&**store, offset, size, Node::Sequence(instance))
        }
    }
}

fn slot_field(store: &dyn BackingStore, slot: &Slot) -> Result<Field> {
    Ok(match &slot.node {
        Node::Simple(s) => Field::Value(read_simple(store, *s, slot.offset)?),
        Node::Compound(c) => Field::Compound(c.clone()),
        Node::Sequence(s) => Field::Sequence(s.clone()),
    })
}

/// Resolve `cells[index]`, resolving unresolved predecessors first.
///
/// `init(i, offset)` builds the slot for position `i` starting at `offset`.
fn resolve_in_order<'a, F>(
    cells: &'a [OnceCell<Slot>],
    start: u64,
    index: usize,
    init: F,
) -> Result<&'a Slot>
where
    F: Fn(usize, u64) -> Result<Slot>,
{
    if let Some(slot) = cells[index].get() {
        return Ok(slot);
    }
    let mut first = index;
    while first > 0 && cells[first - 1].get().is_none() {
        first -= 1;
    }
    for i in first..index {
        resolve_one(cells, start, i, &init)?;
    }
    resolve_one(cells, start, index, &init)
}

fn resolve_one<'a, F>(
    cells: &'a [OnceCell<Slot>],
    start: u64,
    i: usize,
    init: &F,
) -> Result<&'a Slot>
where
    F: Fn(usize, u64) -> Result<Slot>,
{
    cells[i].get_or_try_init(|| {
        let offset = match i.checked_sub(1) {
            None => start,
            Some(prev) => match cells[prev].get() {
                Some(slot) => slot.end,
                None => return Err(Error::UnresolvedSize(format!("element {prev}"))),
            },
        };
        init(i, offset)
    })
}

/// A compound type bound to an offset.
pub struct CompoundInstance {
    store: Arc<dyn BackingStore>,
    ty: Arc<CompoundType>,
    offset: u64,
    slots: Vec<OnceCell<Slot>>,
}

impl CompoundInstance {
    /// Bind `ty` to `offset` in `store`. Nothing is read until a member is
    /// requested.
    pub fn new(store: Arc<dyn BackingStore>, ty: Arc<CompoundType>, offset: u64) -> Self {
        let slots = (0..ty.members().len()).map(|_| OnceCell::new()).collect();
        Self {
            store,
            ty,
            offset,
            slots,
        }
    }

    /// Name of the compound type.
    pub fn type_name(&self) -> &str {
        self.ty.name()
    }

    pub fn compound_type(&self) -> &Arc<CompoundType> {
        &self.ty
    }

    /// Absolute offset of the first byte.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn store(&self) -> &Arc<dyn BackingStore> {
        &self.store
    }

    fn position(&self, name: &str) -> Result<usize> {
        self.ty
            .member(name)
            .map(|(i, _)| i)
            .ok_or_else(|| Error::NoSuchField {
                compound: self.ty.name().to_string(),
                field: name.to_string(),
            })
    }

    fn slot(&self, index: usize) -> Result<&Slot> {
        if index >= self.slots.len() {
            return Err(Error::IndexOutOfRange {
                index: index as u64,
                len: self.slots.len() as u64,
            });
        }
        let init = |i: usize, offset: u64| {
            let partial = PartialCompound {
                instance: self,
                limit: i,
            };
            make_slot(&self.store, &self.ty.members()[i].ty, offset, Some(&partial))
        };
        match self.ty.static_offset(index) {
            // offset known without resolving earlier members
            Some(relative) => {
                let offset = checked_end(&*self.store, self.offset, relative)?;
                self.slots[index].get_or_try_init(|| init(index, offset))
            }
            None => resolve_in_order(&self.slots, self.offset, index, init),
        }
    }

    /// Member by declaration index.
    pub fn field_at(&self, index: usize) -> Result<Field> {
        let slot = self.slot(index)?;
        slot_field(&*self.store, slot)
    }

    /// Member by name.
    pub fn field(&self, name: &str) -> Result<Field> {
        self.field_at(self.position(name)?)
    }

    /// Simple member `name`, decoded.
    ///
    /// # Errors
    /// [`Error::NoSuchField`] for an unknown name, [`Error::TypeMismatch`]
    /// when the member is a compound or sequence.
    pub fn value(&self, name: &str) -> Result<DecodedValue> {
        self.field(name)?.into_value()
    }

    /// Compound member `name`.
    pub fn compound(&self, name: &str) -> Result<Arc<CompoundInstance>> {
        self.field(name)?.into_compound()
    }

    /// Sequence member `name`; a variable count is resolved on first access.
    pub fn sequence(&self, name: &str) -> Result<Arc<SequenceInstance>> {
        self.field(name)?.into_sequence()
    }

    /// Absolute offset of a member.
    pub fn member_offset(&self, name: &str) -> Result<u64> {
        Ok(self.slot(self.position(name)?)?.offset)
    }

    /// Byte size of a member.
    pub fn member_size(&self, name: &str) -> Result<u64> {
        Ok(self.slot(self.position(name)?)?.size())
    }

    /// Total byte size; resolves every member of a variable-size compound.
    pub fn byte_len(&self) -> Result<u64> {
        if let Some(size) = self.ty.size() {
            return Ok(size);
        }
        match self.slots.len().checked_sub(1) {
            None => Ok(0),
            Some(last) => Ok(self.slot(last)?.end - self.offset),
        }
    }

    /// The undecoded bytes of this instance.
    pub fn raw_bytes(&self) -> Result<Vec<u8>> {
        self.store.read_range(self.offset, self.byte_len()?)
    }

    /// Walk a path such as `GGeoSondLoc[3][1][0]` or `IDefSpectDWn1b.mantissa`.
    pub fn lookup(&self, path: &str) -> Result<Field> {
        FieldPath::parse(path)?.walk(self)
    }
}

impl fmt::Debug for CompoundInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompoundInstance")
            .field("type", &self.ty.name())
            .field("offset", &self.offset)
            .finish()
    }
}

/// The members of a compound that precede the member being resolved.
///
/// Handed to [`Resolver`](crate::schema::Resolver) callbacks; asking for a
/// member at or after the one being resolved fails instead of recursing.
pub struct PartialCompound<'a> {
    instance: &'a CompoundInstance,
    limit: usize,
}

impl PartialCompound<'_> {
    pub fn type_name(&self) -> &str {
        self.instance.type_name()
    }

    pub fn field(&self, name: &str) -> Result<Field> {
        let index = self.instance.position(name)?;
        if index >= self.limit {
            return Err(Error::InvalidFieldReference {
                compound: self.instance.type_name().to_string(),
                field: name.to_string(),
            });
        }
        self.instance.field_at(index)
    }

    pub fn value(&self, name: &str) -> Result<DecodedValue> {
        self.field(name)?.into_value()
    }
}

enum Elements {
    /// Static element size: element `i` starts at `offset + i * size`.
    /// Composite elements are kept once built.
    Strided {
        size: u64,
        built: Mutex<HashMap<u64, Field>>,
    },
    /// Variable element size: resolved in order and cached.
    Dynamic(Vec<OnceCell<Slot>>),
}

/// A sequence type bound to an offset with a known element count.
pub struct SequenceInstance {
    store: Arc<dyn BackingStore>,
    ty: Arc<SequenceType>,
    offset: u64,
    count: u64,
    elements: Elements,
}

impl SequenceInstance {
    /// Bind `count` elements of `ty` starting at `offset`.
    ///
    /// # Arguments
    /// * `store` - Byte source the elements are read from
    /// * `ty` - Sequence type; its own count is ignored in favour of `count`
    /// * `offset` - Absolute offset of the first element
    /// * `count` - Number of elements, usually taken from the file
    ///
    /// # Errors
    /// [`Error::Truncated`] when a static-size sequence would end beyond
    /// `u64::MAX`, or when a variable-size sequence claims more elements
    /// than there are bytes left in the store.
    pub fn new(
        store: Arc<dyn BackingStore>,
        ty: Arc<SequenceType>,
        offset: u64,
        count: u64,
    ) -> Result<Self> {
        let elements = match ty.element().size() {
            Some(size) => {
                let length = count.checked_mul(size).ok_or(Error::Truncated {
                    offset,
                    length: u64::MAX,
                    available: store.len(),
                })?;
                checked_end(&*store, offset, length)?;
                Elements::Strided {
                    size,
                    built: Mutex::new(HashMap::new()),
                }
            }
            None => {
                // a variable-size element takes at least one byte
                let available = store.len().saturating_sub(offset);
                if count > available {
                    return Err(Error::Truncated {
                        offset,
                        length: count,
                        available: store.len(),
                    });
                }
                Elements::Dynamic((0..count).map(|_| OnceCell::new()).collect())
            }
        };
        Ok(Self {
            store,
            ty,
            offset,
            count,
            elements,
        })
    }

    /// Number of elements.
    pub fn len(&self) -> u64 {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Absolute offset of the first element.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn element_type(&self) -> &Type {
        self.ty.element()
    }

    fn check_index(&self, index: u64) -> Result<()> {
        if index >= self.count {
            return Err(Error::IndexOutOfRange {
                index,
                len: self.count,
            });
        }
        Ok(())
    }

    fn dynamic_slot<'a>(&'a self, cells: &'a [OnceCell<Slot>], index: u64) -> Result<&'a Slot> {
        let index = u64_to_usize(index, "sequence index")?;
        resolve_in_order(cells, self.offset, index, |_, offset| {
            make_slot(&self.store, self.ty.element(), offset, None)
        })
    }

    /// Absolute offset of element `index`.
    pub fn element_offset(&self, index: u64) -> Result<u64> {
        self.check_index(index)?;
        match &self.elements {
            Elements::Strided { size, .. } => Ok(self.offset + index * size),
            Elements::Dynamic(cells) => Ok(self.dynamic_slot(cells, index)?.offset),
        }
    }

    /// Element `index`; a compound or sequence element is built on first
    /// access and the same instance is returned afterwards.
    ///
    /// # Errors
    /// [`Error::IndexOutOfRange`] when `index >= len()`.
    pub fn element(&self, index: u64) -> Result<Field> {
        self.check_index(index)?;
        match &self.elements {
            Elements::Strided { size, built } => {
                let offset = self.offset + index * size;
                match self.ty.element() {
                    Type::Simple(s) => read_simple(&*self.store, *s, offset).map(Field::Value),
                    ty => {
                        let mut built = built.lock().unwrap_or_else(|e| e.into_inner());
                        if let Some(field) = built.get(&index) {
                            return Ok(field.clone());
                        }
                        // static size: building the element reads nothing
                        let slot = make_slot(&self.store, ty, offset, None)?;
                        let field = slot_field(&*self.store, &slot)?;
                        built.insert(index, field.clone());
                        Ok(field)
                    }
                }
            }
            Elements::Dynamic(cells) => {
                let slot = self.dynamic_slot(cells, index)?;
                slot_field(&*self.store, slot)
            }
        }
    }

    /// Simple element `index`, decoded.
    pub fn value(&self, index: u64) -> Result<DecodedValue> {
        self.element(index)?.into_value()
    }

    pub fn compound(&self, index: u64) -> Result<Arc<CompoundInstance>> {
        self.element(index)?.into_compound()
    }

    pub fn sequence(&self, index: u64) -> Result<Arc<SequenceInstance>> {
        self.element(index)?.into_sequence()
    }

    /// Decode `len` simple elements starting at `start` with a single read.
    pub fn values_range(&self, start: u64, len: u64) -> Result<Vec<DecodedValue>> {
        let simple = self.ty.element().as_simple().ok_or_else(|| Error::TypeMismatch {
            expected: "sequence of simple values",
            found: self.ty.element().describe(),
        })?;
        let end = start.checked_add(len).unwrap_or(u64::MAX);
        if end > self.count {
            return Err(Error::IndexOutOfRange {
                index: end.saturating_sub(1),
                len: self.count,
            });
        }
        let width = u64::from(simple.width());
        let bytes = self
            .store
            .read_range(self.offset + start * width, len * width)?;
        Ok(bytes
            .chunks_exact(simple.width() as usize)
            .map(|chunk| simple.decode(chunk))
            .collect())
    }

    /// Decode every element of a sequence of simple values.
    pub fn values(&self) -> Result<Vec<DecodedValue>> {
        self.values_range(0, self.count)
    }

    /// Total byte size; resolves every element of a variable-size sequence.
    pub fn byte_len(&self) -> Result<u64> {
        match &self.elements {
            // checked in `new`
            Elements::Strided { size, .. } => Ok(self.count * size),
            Elements::Dynamic(cells) => match self.count.checked_sub(1) {
                None => Ok(0),
                Some(last) => Ok(self.dynamic_slot(cells, last)?.end - self.offset),
            },
        }
    }

    pub fn raw_bytes(&self) -> Result<Vec<u8>> {
        self.store.read_range(self.offset, self.byte_len()?)
    }
}

impl fmt::Debug for SequenceInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequenceInstance")
            .field("element", &self.ty.element().describe())
            .field("offset", &self.offset)
            .field("count", &self.count)
            .finish()
    }
}
