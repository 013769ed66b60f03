//! Contention-tolerant sharded counter.
//!
//! A single counter key written by many concurrent transactions serializes
//! every increment behind conflict retries. [`ShardedCounter`] avoids that
//! by writing each delta to a fresh randomly keyed *shard* inside a
//! subspace: adds land on unique keys and never conflict with each other.
//! Reading sums the shards; a probabilistic background *coalesce* keeps the
//! shard count, and therefore the read cost, bounded.

mod counter;
mod random;

pub use counter::CounterError;
pub use counter::ShardedCounter;
pub use counter::ShardedCounterConfig;
pub use random::RandomSource;
pub use random::SeededRandom;
pub use random::ThreadLocalRandom;
pub use random::SHARD_ID_LEN;
