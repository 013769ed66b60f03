//! Client data plane for an ordered, transactional key-value store.
//!
//! This crate re-exports the member crates as one surface:
//!
//! - [`Slice`]: immutable, zero-copy byte windows with the comparison
//!   semantics every key depends on ([`alder_slice`]).
//! - [`Tuple`], [`SlicedTuple`], [`Subspace`]: the order-preserving tuple
//!   codec and prefix namespaces ([`alder_tuple`]).
//! - [`Database`], [`Transaction`], [`retry`], [`MemoryDatabase`]: the
//!   transactional interface layers are written against, with a
//!   deterministic in-memory backend for tests ([`alder_kv`]).
//! - [`ShardedCounter`]: a contention-tolerant counter built on all of the
//!   above ([`alder_counter`]).
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use alder::retry;
//! use alder::MemoryDatabase;
//! use alder::ShardedCounter;
//! use alder::Subspace;
//! use alder::Tuple;
//! use tokio_util::sync::CancellationToken;
//!
//! # tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap().block_on(async {
//! let db = MemoryDatabase::new();
//! let counter = ShardedCounter::new(
//!     Arc::clone(&db),
//!     Subspace::new(&Tuple::new().push("metrics").push("hits")),
//! );
//! let cancel = CancellationToken::new();
//!
//! retry::write(db.as_ref(), &cancel, |tr| {
//!     let counter = counter.clone();
//!     async move {
//!         counter.add(tr.as_ref(), 1);
//!         Ok(())
//!     }
//! })
//! .await
//! .unwrap();
//!
//! let total = retry::read(db.as_ref(), &cancel, |tr| {
//!     let counter = counter.clone();
//!     async move { counter.get(tr.as_ref()).await.map_err(Into::into) }
//! })
//! .await
//! .unwrap();
//! assert_eq!(total, 1);
//! # });
//! ```

pub use alder_counter::CounterError;
pub use alder_counter::RandomSource;
pub use alder_counter::SeededRandom;
pub use alder_counter::ShardedCounter;
pub use alder_counter::ShardedCounterConfig;
pub use alder_counter::ThreadLocalRandom;
pub use alder_kv::retry;
pub use alder_kv::Database;
pub use alder_kv::KeyValue;
pub use alder_kv::KvError;
pub use alder_kv::MemoryDatabase;
pub use alder_kv::RangeOptions;
pub use alder_kv::Transaction;
pub use alder_slice::Slice;
pub use alder_slice::SliceError;
pub use alder_tuple::CodecError;
pub use alder_tuple::Element;
pub use alder_tuple::SlicedTuple;
pub use alder_tuple::Subspace;
pub use alder_tuple::SubspaceError;
pub use alder_tuple::Tuple;
pub use alder_tuple::TupleError;
pub use alder_tuple::TupleWriter;
pub use alder_tuple::TryFromElement;
