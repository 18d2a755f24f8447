//! Type system and schema registry.
//!
//! A [`Type`] describes how bytes are laid out; a [`SchemaRegistry`] maps
//! names and record keys to types. Registries are usually filled from a
//! JSON catalog (see [`SchemaRegistry::load_catalog`]).

mod catalog;
mod data_type;
pub mod generic;
mod registry;

pub use data_type::{
    CompoundType, Count, Member, MemberMeta, Resolver, SequenceType, SimpleType, Type,
};
pub use registry::{RecordLookup, SchemaRegistry};
