//! Lazy decoding of typed regions of a backing store.

mod instance;
mod path;
mod store;

pub use instance::{CompoundInstance, Field, PartialCompound, SequenceInstance, open, open_at};
pub use path::{FieldPath, PathSegment};
pub use store::{BackingStore, FileStore, MemoryStore};
