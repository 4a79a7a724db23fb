//! helix-store
//!
//! In-memory structured record store with exact and regex field filters,
//! unique field indexes and JSON snapshots. Implements `StructuredStore`.

mod matcher;
mod memory;

pub use memory::MemoryStore;
