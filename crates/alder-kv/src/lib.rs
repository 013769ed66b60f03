//! Transactional database interface for the client data plane.
//!
//! The layers above (counters, indexes) are written against two small
//! object-safe traits: [`Database`] hands out transactions, and
//! [`Transaction`] provides reads (plain and snapshot), locally buffered
//! writes, and a one-shot commit. Concrete bindings to a native client live
//! elsewhere; this crate ships [`MemoryDatabase`], a deterministic
//! serializable in-memory backend, so every layer can be exercised
//! end-to-end in tests.
//!
//! The [`retry`] module provides the automatic-retry entry points that
//! callers are expected to use for whole read or read/write operations.

mod error;
mod memory;
pub mod retry;
mod traits;
mod types;

pub use error::KvError;
pub use memory::MemoryDatabase;
pub use traits::Database;
pub use traits::Transaction;
pub use types::KeyValue;
pub use types::RangeOptions;
