//! Database domain: locating a sidecar and running operations against it.

mod discovery;
mod handle;

pub use discovery::{find_database, require_database};
pub use handle::HashDatabase;
