//! Container parsing: product headers, the pointer table and the body layout.

mod body;
mod eps_file;

pub use body::{BodyLayout, LookupKind, RecordRun};
pub use eps_file::EpsFile;
