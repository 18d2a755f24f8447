//! Binary type descriptions: simple, compound and sequence types.
//!
//! Types are immutable values. Composite types are reference counted, so
//! cloning a [`Type`] is cheap and clones compare equal by identity via
//! [`Type::ptr_eq`].

use crate::{DecodedValue, Error, Result, engine::PartialCompound};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Fixed-width big-endian integer or IEEE float.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SimpleType {
    width: u8,
    signed: bool,
    float: bool,
}

impl SimpleType {
    pub const U8: SimpleType = SimpleType::raw(1, false, false);
    pub const I8: SimpleType = SimpleType::raw(1, true, false);
    pub const U16: SimpleType = SimpleType::raw(2, false, false);
    pub const I16: SimpleType = SimpleType::raw(2, true, false);
    pub const U32: SimpleType = SimpleType::raw(4, false, false);
    pub const I32: SimpleType = SimpleType::raw(4, true, false);
    pub const U64: SimpleType = SimpleType::raw(8, false, false);
    pub const I64: SimpleType = SimpleType::raw(8, true, false);
    pub const F32: SimpleType = SimpleType::raw(4, true, true);
    pub const F64: SimpleType = SimpleType::raw(8, true, true);

    const fn raw(width: u8, signed: bool, float: bool) -> Self {
        Self {
            width,
            signed,
            float,
        }
    }

    /// Validate a width/signedness/kind combination.
    ///
    /// Integers may be 1, 2, 4 or 8 bytes wide; floats 4 or 8 and are always
    /// signed.
    pub fn new(width: u8, signed: bool, float: bool) -> Result<Self> {
        let ok = if float {
            matches!(width, 4 | 8)
        } else {
            matches!(width, 1 | 2 | 4 | 8)
        };
        if !ok {
            return Err(Error::InvalidSimpleType { width, float });
        }
        Ok(Self::raw(width, signed || float, float))
    }

    pub fn width(&self) -> u8 {
        self.width
    }

    pub fn is_signed(&self) -> bool {
        self.signed
    }

    pub fn is_float(&self) -> bool {
        self.float
    }

    /// Catalog name of the type (`u8`, `i32`, `f64`, ...).
    pub fn name(&self) -> &'static str {
        match (self.float, self.signed, self.width) {
            (true, _, 4) => "f32",
            (true, _, _) => "f64",
            (false, true, 1) => "i8",
            (false, true, 2) => "i16",
            (false, true, 4) => "i32",
            (false, true, _) => "i64",
            (false, false, 1) => "u8",
            (false, false, 2) => "u16",
            (false, false, 4) => "u32",
            (false, false, _) => "u64",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "u8" => Self::U8,
            "i8" => Self::I8,
            "u16" => Self::U16,
            "i16" => Self::I16,
            "u32" => Self::U32,
            "i32" => Self::I32,
            "u64" => Self::U64,
            "i64" => Self::I64,
            "f32" => Self::F32,
            "f64" => Self::F64,
            _ => return None,
        })
    }

    /// Decode a value from exactly `width` big-endian bytes.
    ///
    /// # Panics
    /// Panics if `bytes` is shorter than the type width.
    pub fn decode(&self, bytes: &[u8]) -> DecodedValue {
        let w = self.width as usize;
        let mut buf = [0u8; 8];
        buf[8 - w..].copy_from_slice(&bytes[..w]);
        let raw = u64::from_be_bytes(buf);

        if self.float {
            return if w == 4 {
                DecodedValue::Float(f64::from(f32::from_bits(raw as u32)))
            } else {
                DecodedValue::Float(f64::from_bits(raw))
            };
        }
        if self.signed {
            // sign-extend from the type width
            let shift = 64 - 8 * w as u32;
            DecodedValue::SignedInteger(((raw << shift) as i64) >> shift)
        } else {
            DecodedValue::UnsignedInteger(raw)
        }
    }

    /// Encode `value` into exactly `width` big-endian bytes.
    ///
    /// Integers are truncated to the type width; floats written to integer
    /// types are truncated toward zero.
    pub fn encode_into(&self, value: DecodedValue, out: &mut [u8]) {
        let w = self.width as usize;
        if self.float {
            if w == 4 {
                out[..4].copy_from_slice(&(value.as_f64() as f32).to_be_bytes());
            } else {
                out[..8].copy_from_slice(&value.as_f64().to_be_bytes());
            }
            return;
        }
        let raw = match value {
            DecodedValue::UnsignedInteger(v) => v,
            DecodedValue::SignedInteger(v) => v as u64,
            DecodedValue::Float(f) if self.signed => (f as i64) as u64,
            DecodedValue::Float(f) => f as u64,
        };
        out[..w].copy_from_slice(&raw.to_be_bytes()[8 - w..]);
    }
}

/// Optional descriptive metadata attached to a compound member.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemberMeta {
    pub units: Option<String>,
    /// Power of ten the stored integer must be divided by.
    pub scale_factor: Option<i32>,
    pub description: Option<String>,
}

/// A named member of a compound type.
#[derive(Debug, Clone)]
pub struct Member {
    pub name: String,
    pub ty: Type,
    pub meta: Option<MemberMeta>,
}

impl Member {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
            meta: None,
        }
    }

    pub fn with_meta(name: impl Into<String>, ty: Type, meta: MemberMeta) -> Self {
        Self {
            name: name.into(),
            ty,
            meta: Some(meta),
        }
    }
}

/// Ordered, uniquely named members.
pub struct CompoundType {
    name: String,
    members: Vec<Member>,
    index: HashMap<String, usize>,
    offsets: Vec<Option<u64>>,
    size: Option<u64>,
}

impl CompoundType {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// Position and definition of the member called `name`.
    pub fn member(&self, name: &str) -> Option<(usize, &Member)> {
        self.index.get(name).map(|&i| (i, &self.members[i]))
    }

    /// Static byte size, or `None` when any member is variable-sized.
    pub fn size(&self) -> Option<u64> {
        self.size
    }

    /// Offset of member `index` from the start of the compound, when every
    /// member before it has a static size.
    pub fn static_offset(&self, index: usize) -> Option<u64> {
        self.offsets.get(index).copied().flatten()
    }
}

impl fmt::Debug for CompoundType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompoundType")
            .field("name", &self.name)
            .field("members", &self.members)
            .field("size", &self.size)
            .finish()
    }
}

/// Computes the element count of a variable sequence from the members of
/// the enclosing compound that precede it.
#[derive(Clone)]
pub struct Resolver(Arc<dyn Fn(&PartialCompound<'_>) -> Result<u64> + Send + Sync>);

impl Resolver {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&PartialCompound<'_>) -> Result<u64> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Count taken verbatim from an earlier integer sibling called `field`.
    pub fn field(field: impl Into<String>) -> Self {
        let field = field.into();
        Self::new(move |parent| {
            let value = parent.value(&field)?;
            value.as_u64().ok_or_else(|| Error::TypeMismatch {
                expected: "non-negative integer count",
                found: value.to_string(),
            })
        })
    }

    pub(crate) fn resolve(&self, parent: &PartialCompound<'_>) -> Result<u64> {
        (self.0)(parent)
    }
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Resolver(..)")
    }
}

/// Element count of a sequence.
#[derive(Debug, Clone)]
pub enum Count {
    Fixed(u64),
    Variable(Resolver),
}

/// Homogeneous repetition of one element type.
#[derive(Debug)]
pub struct SequenceType {
    element: Type,
    count: Count,
}

impl SequenceType {
    pub fn element(&self) -> &Type {
        &self.element
    }

    pub fn count(&self) -> &Count {
        &self.count
    }

    pub fn fixed_count(&self) -> Option<u64> {
        match self.count {
            Count::Fixed(n) => Some(n),
            Count::Variable(_) => None,
        }
    }

    /// Static byte size: count × element size when both are static.
    pub fn size(&self) -> Option<u64> {
        let n = self.fixed_count()?;
        self.element.size().and_then(|s| s.checked_mul(n))
    }
}

/// A binary type.
#[derive(Debug, Clone)]
pub enum Type {
    Simple(SimpleType),
    Compound(Arc<CompoundType>),
    Sequence(Arc<SequenceType>),
}

impl Type {
    pub fn simple(width: u8, signed: bool, float: bool) -> Result<Type> {
        SimpleType::new(width, signed, float).map(Type::Simple)
    }

    /// Build a compound; fails on duplicate member names.
    pub fn compound(name: impl Into<String>, members: Vec<Member>) -> Result<Type> {
        let name = name.into();
        let mut index = HashMap::with_capacity(members.len());
        let mut offsets = Vec::with_capacity(members.len());
        let mut size = Some(0u64);
        for (i, m) in members.iter().enumerate() {
            offsets.push(size);
            if index.insert(m.name.clone(), i).is_some() {
                return Err(Error::DuplicateMember {
                    compound: name,
                    member: m.name.clone(),
                });
            }
            size = match (size, m.ty.size()) {
                (Some(acc), Some(s)) => acc.checked_add(s),
                _ => None,
            };
        }
        Ok(Type::Compound(Arc::new(CompoundType {
            name,
            members,
            index,
            offsets,
            size,
        })))
    }

    pub fn sequence(element: Type, count: u64) -> Type {
        Type::Sequence(Arc::new(SequenceType {
            element,
            count: Count::Fixed(count),
        }))
    }

    pub fn variable_sequence(element: Type, resolver: Resolver) -> Type {
        Type::Sequence(Arc::new(SequenceType {
            element,
            count: Count::Variable(resolver),
        }))
    }

    /// Raw bytes of a known length with no further structure.
    pub fn opaque(len: u64) -> Type {
        Type::sequence(Type::Simple(SimpleType::U8), len)
    }

    /// Static byte size, or `None` when it depends on instance data.
    pub fn size(&self) -> Option<u64> {
        match self {
            Type::Simple(s) => Some(u64::from(s.width)),
            Type::Compound(c) => c.size(),
            Type::Sequence(s) => s.size(),
        }
    }

    /// Short description used in error messages and logs.
    pub fn describe(&self) -> String {
        match self {
            Type::Simple(s) => s.name().to_string(),
            Type::Compound(c) => c.name().to_string(),
            Type::Sequence(s) => match s.count() {
                Count::Fixed(n) => format!("{}[{}]", s.element().describe(), n),
                Count::Variable(_) => format!("{}[*]", s.element().describe()),
            },
        }
    }

    pub fn as_simple(&self) -> Option<SimpleType> {
        match self {
            Type::Simple(s) => Some(*s),
            _ => None,
        }
    }

    pub fn as_compound(&self) -> Option<&Arc<CompoundType>> {
        match self {
            Type::Compound(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&Arc<SequenceType>> {
        match self {
            Type::Sequence(s) => Some(s),
            _ => None,
        }
    }

    /// Identity comparison: simple types by value, composites by allocation.
    pub fn ptr_eq(&self, other: &Type) -> bool {
        match (self, other) {
            (Type::Simple(a), Type::Simple(b)) => a == b,
            (Type::Compound(a), Type::Compound(b)) => Arc::ptr_eq(a, b),
            (Type::Sequence(a), Type::Sequence(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_widths_are_validated() {
        assert!(SimpleType::new(3, false, false).is_err());
        assert!(SimpleType::new(2, true, true).is_err());
        assert_eq!(SimpleType::new(8, false, true).unwrap(), SimpleType::F64);
    }

    #[test]
    fn signed_decode_sign_extends() {
        assert_eq!(
            SimpleType::I16.decode(&[0xFF, 0xFE]),
            DecodedValue::SignedInteger(-2)
        );
        assert_eq!(
            SimpleType::U16.decode(&[0xFF, 0xFE]),
            DecodedValue::UnsignedInteger(65534)
        );
        assert_eq!(
            SimpleType::F32.decode(&1.5f32.to_be_bytes()),
            DecodedValue::Float(1.5)
        );
    }

    #[test]
    fn encode_truncates_to_width() {
        let mut out = [0u8; 2];
        SimpleType::I16.encode_into(DecodedValue::SignedInteger(-300), &mut out);
        assert_eq!(out, (-300i16).to_be_bytes());
        assert_eq!(
            SimpleType::I16.decode(&out),
            DecodedValue::SignedInteger(-300)
        );
    }

    #[test]
    fn duplicate_members_fail() {
        let err = Type::compound(
            "dup",
            vec![
                Member::new("a", Type::Simple(SimpleType::U8)),
                Member::new("a", Type::Simple(SimpleType::U16)),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, Error::DuplicateMember { .. }));
        assert_eq!(err.kind(), crate::ErrorKind::Schema);
    }

    #[test]
    fn sizes_are_static_only_without_resolvers() {
        let fixed = Type::sequence(Type::Simple(SimpleType::I32), 10);
        assert_eq!(fixed.size(), Some(40));

        let var = Type::variable_sequence(Type::Simple(SimpleType::I32), Resolver::field("n"));
        assert_eq!(var.size(), None);

        let c = Type::compound(
            "c",
            vec![
                Member::new("n", Type::Simple(SimpleType::U8)),
                Member::new("v", var),
            ],
        )
        .unwrap();
        assert_eq!(c.size(), None);
        // a fixed count of variable elements is still unknown
        assert_eq!(Type::sequence(c.clone(), 3).size(), None);

        let outer = Type::compound(
            "outer",
            vec![
                Member::new("head", Type::Simple(SimpleType::U16)),
                Member::new("inner", c),
                Member::new("tail", Type::Simple(SimpleType::U8)),
            ],
        )
        .unwrap();
        let outer = outer.as_compound().unwrap();
        assert_eq!(outer.static_offset(0), Some(0));
        assert_eq!(outer.static_offset(1), Some(2));
        assert_eq!(outer.static_offset(2), None);
        assert_eq!(outer.static_offset(3), None);
    }
}
