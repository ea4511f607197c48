//! REVU Storage - Record Store Trait and In-Memory Implementation
//!
//! Defines the storage abstraction the allocation engine works against.
//! The PostgreSQL implementation lives in revu-api.

mod memory;
mod record_store;

pub use memory::InMemoryStore;
pub use record_store::RecordStore;
