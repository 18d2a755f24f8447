// registry.rs
use super::{data_type::Type, generic};
use crate::{Error, Result, records::RecordKey};
use log::debug;
use std::collections::HashMap;

/// Result of mapping a record key to a body type.
#[derive(Debug, Clone)]
pub enum RecordLookup {
    /// Registered under the full `class:group:subclass` key.
    Exact(Type),
    /// Registered under the record class alone.
    ClassFallback(Type),
    /// Not registered; an opaque byte type covering the whole run.
    Unknown(Type),
}

impl RecordLookup {
    pub fn ty(&self) -> &Type {
        match self {
            RecordLookup::Exact(t) | RecordLookup::ClassFallback(t) | RecordLookup::Unknown(t) => t,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, RecordLookup::Unknown(_))
    }
}

/// Named types plus record-key bindings.
///
/// Names are unique: a second definition under the same name fails instead
/// of replacing the first. The registry is immutable once shared, so it is
/// usually wrapped in an `Arc` and handed to every product opened with it.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    types: HashMap<String, Type>,
}

impl SchemaRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the generic EPS types (`grh`, `ipr`, `vint4`,
    /// `short-cds-time`).
    pub fn with_generic_types() -> Result<Self> {
        let mut registry = Self::new();
        registry.define(generic::SHORT_CDS_TIME, generic::short_cds_time()?)?;
        registry.define(generic::VINT4, generic::vint4()?)?;
        registry.define(generic::GRH, generic::grh()?)?;
        registry.define(generic::IPR, generic::ipr()?)?;
        Ok(registry)
    }

    /// Register `ty` under `name`.
    pub fn define(&mut self, name: impl Into<String>, ty: Type) -> Result<()> {
        let name = name.into();
        if self.types.contains_key(&name) {
            return Err(Error::DuplicateType(name));
        }
        self.types.insert(name, ty);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<Type> {
        self.types.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Map a record key to its body type.
    ///
    /// Tries the exact key, then the class name alone. When neither is
    /// registered the record is reported as unknown with an opaque type of
    /// `span` bytes; this never fails.
    pub fn resolve_record_type(&self, key: RecordKey, span: u64) -> RecordLookup {
        if let Some(ty) = self.lookup(&key.to_string()) {
            return RecordLookup::Exact(ty);
        }
        if let Some(ty) = self.lookup(key.class.name()) {
            debug!("Record {} resolved by class fallback", key);
            return RecordLookup::ClassFallback(ty);
        }
        RecordLookup::Unknown(Type::opaque(span))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{InstrumentGroup, RecordClass};
    use crate::schema::SimpleType;

    #[test]
    fn duplicate_definition_fails() -> Result<()> {
        let mut registry = SchemaRegistry::with_generic_types()?;
        let err = registry.define("vint4", Type::Simple(SimpleType::U8)).unwrap_err();
        assert!(matches!(err, Error::DuplicateType(ref n) if n == "vint4"));
        // first definition is kept
        assert_eq!(registry.lookup("vint4").and_then(|t| t.size()), Some(5));
        Ok(())
    }

    #[test]
    fn exact_key_wins_over_class() -> Result<()> {
        let mut registry = SchemaRegistry::new();
        registry.define("giadr", Type::opaque(4))?;
        registry.define("giadr:iasi:1", Type::opaque(8))?;

        let exact = RecordKey::new(RecordClass::Giadr, InstrumentGroup::Iasi, 1);
        let other = RecordKey::new(RecordClass::Giadr, InstrumentGroup::Iasi, 3);
        assert!(matches!(
            registry.resolve_record_type(exact, 100),
            RecordLookup::Exact(ref t) if t.size() == Some(8)
        ));
        assert!(matches!(
            registry.resolve_record_type(other, 100),
            RecordLookup::ClassFallback(ref t) if t.size() == Some(4)
        ));
        Ok(())
    }

    #[test]
    fn unknown_record_spans_the_run() {
        let registry = SchemaRegistry::new();
        let key = RecordKey::new(RecordClass::Viadr, InstrumentGroup::Mhs, 9);
        let lookup = registry.resolve_record_type(key, 1234);
        assert!(lookup.is_unknown());
        assert_eq!(lookup.ty().size(), Some(1234));
    }
}
