//! Sharded counter over a transactional keyspace.
//!
//! # Algorithm
//!
//! The counter's value is the sum of many *shards*, each one a key
//! `subspace / (shard_id,)` holding a tuple-packed signed delta:
//!
//! 1. `add` writes one fresh shard under a random 20-byte identifier. The
//!    key is effectively unique, so concurrent adds never conflict.
//! 2. `get` scans the subspace and sums the deltas with overflow checking.
//! 3. With a small probability per add, a *coalesce* runs in the
//!    background: it picks a random pivot, scans a bounded window of shards
//!    on one side of it, deletes them, and writes a single shard holding
//!    their sum. Reads of the collapsed shards put them in the coalescing
//!    transaction's conflict footprint, so two coalesces racing over the
//!    same window cannot double-count: one of them conflicts and is
//!    dropped.
//!
//! Coalescing is purely a performance mechanism. Every coalesce commit
//! preserves the total, so readers see the exact sum of all committed adds
//! at any point, before, during, or after compaction.
//!
//! # Example
//!
//! ```ignore
//! let counter = ShardedCounter::new(db, Subspace::new(&Tuple::new().push("likes")));
//!
//! retry::read_write(&db, &cancel, |tr| {
//!     let counter = counter.clone();
//!     async move {
//!         counter.add(tr.as_ref(), 1);
//!         Ok(())
//!     }
//! })
//! .await?;
//! ```

use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use alder_kv::Database;
use alder_kv::KeyValue;
use alder_kv::KvError;
use alder_kv::RangeOptions;
use alder_kv::Transaction;
use alder_slice::Slice;
use alder_tuple::SlicedTuple;
use alder_tuple::Subspace;
use alder_tuple::Tuple;
use alder_tuple::TupleError;
use serde::Deserialize;
use serde::Serialize;
use snafu::ResultExt;
use snafu::Snafu;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::warn;

use crate::random::RandomSource;
use crate::random::ThreadLocalRandom;

// =============================================================================
// Error Types
// =============================================================================

/// Errors surfaced by counter operations.
#[derive(Debug, Snafu)]
pub enum CounterError {
    /// A shard value did not decode as a tuple-packed integer.
    #[snafu(display("malformed shard value: {source}"))]
    MalformedShard {
        /// The decoding failure.
        source: TupleError,
    },

    /// The running total left the signed 64-bit range.
    #[snafu(display("counter total overflows a signed 64-bit integer"))]
    Overflow,

    /// The underlying transaction failed (including cancellation).
    #[snafu(display("storage error: {source}"))]
    Storage {
        /// The underlying database error.
        source: KvError,
    },
}

/// Bridge into the database error type so counter operations compose with
/// the `retry` entry points: storage failures pass through untouched (the
/// retry loop keeps seeing conflicts as retryable), everything else becomes
/// a terminal backend error.
impl From<CounterError> for KvError {
    fn from(e: CounterError) -> Self {
        match e {
            CounterError::Storage { source } => source,
            other => KvError::Backend {
                reason: other.to_string(),
            },
        }
    }
}

// =============================================================================
// Configuration
// =============================================================================

/// Contention tunables for a counter instance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ShardedCounterConfig {
    /// Maximum number of shards one coalesce collapses.
    pub sample_size: usize,
    /// Probability that an `add` triggers a background coalesce.
    pub coalesce_probability: f64,
}

impl Default for ShardedCounterConfig {
    fn default() -> Self {
        Self {
            sample_size: 20,
            coalesce_probability: 0.1,
        }
    }
}

// =============================================================================
// Sharded Counter
// =============================================================================

/// A contention-tolerant integer stored as randomly keyed shards within a
/// subspace.
///
/// The counter holds no value itself; all state lives in the database, and
/// instances are cheap handles that can be cloned freely. Clones share the
/// single-flight coalesce flag, so at most one coalesce per handle family
/// runs at a time.
pub struct ShardedCounter<D: Database + ?Sized> {
    db: Arc<D>,
    subspace: Subspace,
    config: ShardedCounterConfig,
    random: Arc<dyn RandomSource>,
    /// Set while a background coalesce is in flight.
    coalescing: Arc<AtomicBool>,
    cancel: CancellationToken,
}

impl<D: Database + ?Sized + 'static> ShardedCounter<D> {
    /// A counter confined to `subspace`, with default tunables and the
    /// thread-local randomness source.
    pub fn new(db: Arc<D>, subspace: Subspace) -> Self {
        Self {
            db,
            subspace,
            config: ShardedCounterConfig::default(),
            random: Arc::new(ThreadLocalRandom),
            coalescing: Arc::new(AtomicBool::new(false)),
            cancel: CancellationToken::new(),
        }
    }

    /// Replace the contention tunables.
    pub fn with_config(mut self, config: ShardedCounterConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the randomness source.
    pub fn with_random(mut self, random: Arc<dyn RandomSource>) -> Self {
        self.random = random;
        self
    }

    /// Tie background coalescing to an external cancellation token.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// The subspace holding this counter's shards.
    pub fn subspace(&self) -> &Subspace {
        &self.subspace
    }

    /// Key for one fresh shard.
    fn fresh_shard_key(&self) -> Slice {
        let id = self.random.shard_id();
        self.subspace.pack(&Tuple::new().push(id.to_vec()))
    }

    /// Tuple-packed shard value.
    fn encode_total(total: i64) -> Slice {
        Tuple::new().push(total).pack()
    }

    /// Decode one shard value.
    fn decode_total(value: &Slice) -> Result<i64, CounterError> {
        SlicedTuple::new(value.clone()).first::<i64>().context(MalformedShardSnafu)
    }

    /// Sum shard rows with overflow checking.
    fn sum_shards(rows: &[KeyValue]) -> Result<i64, CounterError> {
        let mut total = 0i64;
        for row in rows {
            let delta = Self::decode_total(&row.value)?;
            total = total.checked_add(delta).ok_or(CounterError::Overflow)?;
        }
        Ok(total)
    }

    /// Add `delta` to the counter inside the caller's transaction.
    ///
    /// Writes one shard at a fresh random key, so concurrent adds never
    /// conflict with each other or with readers' snapshots. With
    /// probability [`ShardedCounterConfig::coalesce_probability`] this also
    /// fires a background coalesce.
    pub fn add(&self, tr: &dyn Transaction, delta: i64) {
        tr.set(self.fresh_shard_key(), Self::encode_total(delta));

        if self.random.coalesce_coin() < self.config.coalesce_probability {
            self.background_coalesce(self.config.sample_size);
        }
    }

    /// The exact total, read transactionally: the scan enters the
    /// transaction's conflict footprint.
    pub async fn get(&self, tr: &dyn Transaction) -> Result<i64, CounterError> {
        let (begin, end) = self.subspace.range();
        let rows = tr.get_range(&begin, &end, RangeOptions::all()).await.context(StorageSnafu)?;
        Self::sum_shards(&rows)
    }

    /// The total via the transaction's snapshot view; no read conflicts.
    pub async fn get_snapshot(&self, tr: &dyn Transaction) -> Result<i64, CounterError> {
        let (begin, end) = self.subspace.range();
        let rows = tr
            .snapshot_get_range(&begin, &end, RangeOptions::all())
            .await
            .context(StorageSnafu)?;
        Self::sum_shards(&rows)
    }

    /// Make the total equal `total`: reads the snapshot total and adds the
    /// difference. The net effect commits atomically with the caller's
    /// transaction.
    pub async fn set_total(&self, tr: &dyn Transaction, total: i64) -> Result<(), CounterError> {
        let current = self.get_snapshot(tr).await?;
        let delta = total.checked_sub(current).ok_or(CounterError::Overflow)?;
        self.add(tr, delta);
        Ok(())
    }

    /// One coalesce attempt in its own transaction: pick a random pivot,
    /// scan up to `sample_size` shards on one side of it, replace them with
    /// a single shard holding their sum.
    ///
    /// The window is scanned through the snapshot view; each collapsed
    /// shard is then read plainly so the commit conflicts with any other
    /// transaction touching the same shards. Losing that race is expected
    /// and harmless.
    pub async fn coalesce(&self, sample_size: usize) -> Result<(), CounterError> {
        let tr = self.db.begin(self.cancel.child_token()).context(StorageSnafu)?;

        let (begin, end) = self.subspace.range();
        let pivot = self.fresh_shard_key();
        let forward = self.random.coalesce_coin() < 0.5;
        let options = RangeOptions {
            limit: Some(sample_size),
            reverse: !forward,
        };
        let shards = if forward {
            tr.snapshot_get_range(&pivot, &end, options).await
        } else {
            tr.snapshot_get_range(&begin, &pivot, options).await
        }
        .context(StorageSnafu)?;

        if shards.is_empty() {
            return Ok(());
        }
        let total = Self::sum_shards(&shards)?;

        for shard in &shards {
            // The plain read puts the shard into the conflict footprint.
            tr.get(&shard.key).await.context(StorageSnafu)?;
            tr.clear(shard.key.clone());
        }
        tr.set(self.fresh_shard_key(), Self::encode_total(total));
        tr.commit().await.context(StorageSnafu)?;

        debug!(shards = shards.len(), total, "coalesced counter shards");
        Ok(())
    }

    /// Fire-and-forget coalesce. At most one runs per handle family; when
    /// one is already in flight the trigger is dropped. Failures are
    /// observed and logged, never propagated: a lost coalesce costs read
    /// performance, not correctness. Cancellation is a no-op.
    pub fn background_coalesce(&self, sample_size: usize) {
        if self
            .coalescing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        let counter = self.clone();
        tokio::spawn(async move {
            let result = counter.coalesce(sample_size).await;
            counter.coalescing.store(false, Ordering::Release);
            match result {
                Ok(()) => {}
                Err(CounterError::Storage { source: KvError::Cancelled }) => {
                    debug!("background coalesce cancelled");
                }
                Err(CounterError::Storage { source }) if source.is_retryable() => {
                    debug!(error = %source, "background coalesce lost a race");
                }
                Err(e) => warn!(error = %e, "background coalesce failed"),
            }
        });
    }
}

impl<D: Database + ?Sized> Clone for ShardedCounter<D> {
    fn clone(&self) -> Self {
        Self {
            db: Arc::clone(&self.db),
            subspace: self.subspace.clone(),
            config: self.config,
            random: Arc::clone(&self.random),
            coalescing: Arc::clone(&self.coalescing),
            cancel: self.cancel.clone(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
