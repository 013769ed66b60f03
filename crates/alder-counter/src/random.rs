//! Randomness strategy for the sharded counter.
//!
//! The counter draws random bytes for shard identifiers and a coin for the
//! coalesce trigger. Both draws go through [`RandomSource`] so that the
//! generator is injectable: production uses the thread-local generator (no
//! lock on the `add` hot path), tests use a seeded generator for
//! reproducible shard layouts.

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;

/// Length in bytes of a shard identifier. Wide enough that two concurrent
/// adds colliding on the same shard key is not a practical concern.
pub const SHARD_ID_LEN: usize = 20;

/// Source of the counter's randomness.
pub trait RandomSource: Send + Sync {
    /// Fresh random bytes for one shard key.
    fn shard_id(&self) -> [u8; SHARD_ID_LEN];

    /// A uniform draw from `[0, 1)` deciding whether an add triggers a
    /// coalesce.
    fn coalesce_coin(&self) -> f64;
}

/// Thread-local generator; the default source.
///
/// Each call borrows the calling thread's generator, so concurrent adds
/// never contend on a shared lock.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadLocalRandom;

impl RandomSource for ThreadLocalRandom {
    fn shard_id(&self) -> [u8; SHARD_ID_LEN] {
        let mut id = [0u8; SHARD_ID_LEN];
        rand::rng().fill(&mut id[..]);
        id
    }

    fn coalesce_coin(&self) -> f64 {
        rand::rng().random()
    }
}

/// Seeded generator for deterministic tests.
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    /// A source producing the same draw sequence for the same seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        // Poisoning requires a panic while drawing; propagate it.
        let mut rng = self.rng.lock().expect("random source lock poisoned");
        f(&mut rng)
    }
}

impl RandomSource for SeededRandom {
    fn shard_id(&self) -> [u8; SHARD_ID_LEN] {
        self.with_rng(|rng| {
            let mut id = [0u8; SHARD_ID_LEN];
            rng.fill(&mut id[..]);
            id
        })
    }

    fn coalesce_coin(&self) -> f64 {
        self.with_rng(|rng| rng.random())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thread_local_ids_are_distinct() {
        let source = ThreadLocalRandom;
        assert_ne!(source.shard_id(), source.shard_id());
    }

    #[test]
    fn coin_stays_in_unit_interval() {
        let source = ThreadLocalRandom;
        for _ in 0..100 {
            let coin = source.coalesce_coin();
            assert!((0.0..1.0).contains(&coin));
        }
    }

    #[test]
    fn seeded_source_is_reproducible() {
        let a = SeededRandom::new(7);
        let b = SeededRandom::new(7);
        assert_eq!(a.shard_id(), b.shard_id());
        assert_eq!(a.coalesce_coin(), b.coalesce_coin());

        let c = SeededRandom::new(8);
        assert_ne!(a.shard_id(), c.shard_id());
    }
}
