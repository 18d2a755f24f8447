// record.rs
use crate::{
    DecodedValue, Error, Result,
    engine::FieldPath,
    records::common::u64_to_usize,
    records::{ShortCdsTime, VInt4},
    schema::{SchemaRegistry, Type},
};

/// Encodes a fixed-size record body field by field.
///
/// Fields are addressed by path, the same way they are read back, so the
/// caller never computes offsets. Unset bytes stay zero.
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    ty: Type,
    buf: Vec<u8>,
}

impl RecordBuilder {
    /// A zero-filled body of type `ty`, which must have a static size.
    pub fn new(ty: &Type) -> Result<Self> {
        let size = ty.size().ok_or_else(|| Error::UnresolvedSize(ty.describe()))?;
        Ok(Self {
            ty: ty.clone(),
            buf: vec![0; u64_to_usize(size, "record size")?],
        })
    }

    /// A body for the type registered under `name` (a type name or record key).
    pub fn for_type(registry: &SchemaRegistry, name: &str) -> Result<Self> {
        let ty = registry
            .lookup(name)
            .ok_or_else(|| Error::UnknownType(name.to_string()))?;
        Self::new(&ty)
    }

    /// Byte range of the path target, which must be `expected` bytes wide
    /// when given.
    fn target(&self, path: &str, expected: Option<usize>) -> Result<(usize, Type)> {
        let (offset, target) = FieldPath::parse(path)?.locate(&self.ty)?;
        let size = target
            .size()
            .ok_or_else(|| Error::UnresolvedSize(target.describe()))?;
        if let Some(expected) = expected {
            if size != expected as u64 {
                return Err(Error::TypeMismatch {
                    expected: "field of matching size",
                    found: format!("{} ({} bytes)", target.describe(), size),
                });
            }
        }
        Ok((u64_to_usize(offset, "field offset")?, target))
    }

    /// Encode a simple value at `path`.
    pub fn set(&mut self, path: &str, value: DecodedValue) -> Result<&mut Self> {
        let (offset, target) = self.target(path, None)?;
        let simple = target.as_simple().ok_or_else(|| Error::TypeMismatch {
            expected: "simple field",
            found: target.describe(),
        })?;
        let width = simple.width() as usize;
        simple.encode_into(value, &mut self.buf[offset..offset + width]);
        Ok(self)
    }

    /// Encode consecutive elements of a sequence of simple values at `path`,
    /// starting with element 0.
    pub fn set_values(&mut self, path: &str, values: &[DecodedValue]) -> Result<&mut Self> {
        let (offset, target) = self.target(path, None)?;
        let seq = target.as_sequence().ok_or_else(|| Error::TypeMismatch {
            expected: "sequence field",
            found: target.describe(),
        })?;
        let simple = seq.element().as_simple().ok_or_else(|| Error::TypeMismatch {
            expected: "sequence of simple values",
            found: target.describe(),
        })?;
        let len = seq.fixed_count().unwrap_or(0);
        if values.len() as u64 > len {
            return Err(Error::IndexOutOfRange {
                index: values.len() as u64 - 1,
                len,
            });
        }
        let width = simple.width() as usize;
        for (i, value) in values.iter().enumerate() {
            let start = offset + i * width;
            simple.encode_into(*value, &mut self.buf[start..start + width]);
        }
        Ok(self)
    }

    /// Copy raw bytes over the field at `path`; sizes must match.
    pub fn set_bytes(&mut self, path: &str, bytes: &[u8]) -> Result<&mut Self> {
        let (offset, _) = self.target(path, Some(bytes.len()))?;
        self.buf[offset..offset + bytes.len()].copy_from_slice(bytes);
        Ok(self)
    }

    pub fn set_vint4(&mut self, path: &str, value: VInt4) -> Result<&mut Self> {
        self.set_bytes(path, &value.to_bytes())
    }

    pub fn set_time(&mut self, path: &str, time: ShortCdsTime) -> Result<&mut Self> {
        self.set_bytes(path, &time.to_bytes())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}
