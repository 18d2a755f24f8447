// catalog.rs
//! JSON type catalogs.
//!
//! A catalog names reusable compound types and binds record keys to record
//! body compounds:
//!
//! ```json
//! {
//!   "name": "example",
//!   "types": [],
//!   "records": [
//!     { "key": "giadr:iasi_l2:1", "name": "giadr-levels", "members": [
//!       { "name": "N", "type": "u8" },
//!       { "name": "LEVELS", "type": "u32", "count": "N", "scale_factor": 2 }
//!     ] }
//!   ]
//! }
//! ```

use super::{
    data_type::{Member, MemberMeta, Resolver, SimpleType, Type},
    registry::SchemaRegistry,
};
use crate::{Error, Result};
use log::debug;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogDoc {
    name: String,
    #[serde(default)]
    types: Vec<TypeDef>,
    #[serde(default)]
    records: Vec<RecordDef>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TypeDef {
    name: String,
    members: Vec<MemberDef>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RecordDef {
    key: String,
    name: String,
    members: Vec<MemberDef>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct MemberDef {
    name: String,
    #[serde(rename = "type")]
    ty: String,
    #[serde(default)]
    dims: Vec<u64>,
    count: Option<String>,
    units: Option<String>,
    scale_factor: Option<i32>,
    description: Option<String>,
}

impl MemberDef {
    fn meta(&self) -> Option<MemberMeta> {
        if self.units.is_none() && self.scale_factor.is_none() && self.description.is_none() {
            return None;
        }
        Some(MemberMeta {
            units: self.units.clone(),
            scale_factor: self.scale_factor,
            description: self.description.clone(),
        })
    }
}

impl SchemaRegistry {
    /// Load every type and record of a JSON catalog into this registry.
    ///
    /// Types are defined in document order and may refer to primitives,
    /// already registered names, or types defined earlier in the same
    /// document. Returns the catalog name.
    pub fn load_catalog(&mut self, json: &str) -> Result<String> {
        let doc: CatalogDoc =
            serde_json::from_str(json).map_err(|e| Error::Catalog(e.to_string()))?;

        for def in &doc.types {
            let ty = self.build_compound(&def.name, &def.members)?;
            self.define(def.name.clone(), ty)?;
        }
        for def in &doc.records {
            let ty = self.build_compound(&def.name, &def.members)?;
            self.define(def.key.clone(), ty)?;
        }

        debug!(
            "Loaded catalog {:?}: {} types, {} records",
            doc.name,
            doc.types.len(),
            doc.records.len()
        );
        Ok(doc.name)
    }

    /// Load a catalog from a JSON file.
    pub fn load_catalog_file(&mut self, path: impl AsRef<Path>) -> Result<String> {
        let json = std::fs::read_to_string(path)?;
        self.load_catalog(&json)
    }

    /// Generic types plus one catalog.
    pub fn from_catalog(json: &str) -> Result<Self> {
        let mut registry = Self::with_generic_types()?;
        registry.load_catalog(json)?;
        Ok(registry)
    }

    fn build_compound(&self, name: &str, defs: &[MemberDef]) -> Result<Type> {
        let mut members: Vec<Member> = Vec::with_capacity(defs.len());
        for def in defs {
            let mut ty = self.resolve_name(&def.ty)?;
            for &dim in def.dims.iter().rev() {
                ty = Type::sequence(ty, dim);
            }
            if let Some(count) = &def.count {
                check_count_reference(name, &members, count)?;
                ty = Type::variable_sequence(ty, Resolver::field(count.clone()));
            }
            members.push(match def.meta() {
                Some(meta) => Member::with_meta(def.name.clone(), ty, meta),
                None => Member::new(def.name.clone(), ty),
            });
        }
        Type::compound(name, members)
    }

    fn resolve_name(&self, name: &str) -> Result<Type> {
        if let Some(simple) = SimpleType::from_name(name) {
            return Ok(Type::Simple(simple));
        }
        self.lookup(name)
            .ok_or_else(|| Error::UnknownType(name.to_string()))
    }
}

/// A count may only name an integer member that precedes it.
fn check_count_reference(compound: &str, earlier: &[Member], field: &str) -> Result<()> {
    let is_integer = earlier
        .iter()
        .find(|m| m.name == field)
        .and_then(|m| m.ty.as_simple())
        .is_some_and(|s| !s.is_float());
    if is_integer {
        Ok(())
    } else {
        Err(Error::InvalidFieldReference {
            compound: compound.to_string(),
            field: field.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEVELS: &str = r#"{
        "name": "levels",
        "types": [
            { "name": "pair", "members": [
                { "name": "a", "type": "i16" },
                { "name": "b", "type": "vint4" }
            ] }
        ],
        "records": [
            { "key": "giadr:iasi_l2:1", "name": "giadr-levels", "members": [
                { "name": "N", "type": "u8" },
                { "name": "LEVELS", "type": "u32", "count": "N", "units": "Pa", "scale_factor": 2 },
                { "name": "PAIRS", "type": "pair", "dims": [2, 3] }
            ] }
        ]
    }"#;

    #[test]
    fn loads_types_and_records() -> Result<()> {
        let registry = SchemaRegistry::from_catalog(LEVELS)?;
        assert_eq!(registry.lookup("pair").and_then(|t| t.size()), Some(7));

        let record = registry.lookup("giadr:iasi_l2:1").unwrap();
        let compound = record.as_compound().unwrap();
        assert_eq!(compound.name(), "giadr-levels");
        assert_eq!(record.size(), None);

        let (_, pairs) = compound.member("PAIRS").unwrap();
        assert_eq!(pairs.ty.size(), Some(6 * 7));
        assert_eq!(pairs.ty.describe(), "pair[3][2]");

        let (_, levels) = compound.member("LEVELS").unwrap();
        let meta = levels.meta.as_ref().unwrap();
        assert_eq!(meta.scale_factor, Some(2));
        assert_eq!(meta.units.as_deref(), Some("Pa"));
        Ok(())
    }

    #[test]
    fn forward_count_reference_is_rejected() {
        let json = r#"{ "name": "bad", "records": [
            { "key": "mdr", "name": "m", "members": [
                { "name": "V", "type": "u8", "count": "N" },
                { "name": "N", "type": "u8" }
            ] } ] }"#;
        let err = SchemaRegistry::from_catalog(json).unwrap_err();
        assert!(matches!(err, Error::InvalidFieldReference { ref field, .. } if field == "N"));
    }

    #[test]
    fn float_count_reference_is_rejected() {
        let json = r#"{ "name": "bad", "records": [
            { "key": "mdr", "name": "m", "members": [
                { "name": "N", "type": "f32" },
                { "name": "V", "type": "u8", "count": "N" }
            ] } ] }"#;
        assert!(matches!(
            SchemaRegistry::from_catalog(json),
            Err(Error::InvalidFieldReference { .. })
        ));
    }

    #[test]
    fn unknown_type_name_is_a_schema_error() {
        let json = r#"{ "name": "bad", "records": [
            { "key": "mdr", "name": "m", "members": [ { "name": "x", "type": "u24" } ] } ] }"#;
        let err = SchemaRegistry::from_catalog(json).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Schema);
    }

    #[test]
    fn malformed_json_is_a_catalog_error() {
        assert!(matches!(
            SchemaRegistry::from_catalog("{ not json"),
            Err(Error::Catalog(_))
        ));
    }
}
