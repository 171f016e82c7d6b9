//! HEALCHAIN State Management
//!
//! Provides the ledger state store: keyed documents with range scans,
//! selector queries, composite-key scans and per-key history.

pub mod store;
pub mod composite;
pub mod query;
pub mod memory;
pub mod persistent;

pub use store::*;
pub use composite::*;
pub use query::*;
pub use memory::*;
pub use persistent::*;
