//! Deterministic in-memory backend with serializable optimistic
//! concurrency.
//!
//! `MemoryDatabase` keeps the committed state in a `BTreeMap` together with
//! the commit version of every key (deletions leave a versioned tombstone).
//! A transaction takes its read version at `begin`, records the keys and
//! ranges its plain reads touched, buffers its writes, and validates at
//! commit that nothing it read was committed after its read version. A
//! failed validation surfaces a retryable [`KvError::Conflict`], the same
//! contract an ordered transactional store provides over the wire.
//!
//! This backend exists so the layers above can be exercised end-to-end in
//! tests without a native client; it is not a storage engine.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::ops::Bound;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use alder_slice::Slice;
use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::error::KvError;
use crate::traits::Database;
use crate::traits::Transaction;
use crate::types::KeyValue;
use crate::types::RangeOptions;

/// Committed state of one key. Deletions keep a tombstone so conflict
/// validation can see them.
#[derive(Debug, Clone)]
struct Versioned {
    value: Option<Vec<u8>>,
    version: u64,
}

/// State shared between the database handle and its transactions.
struct Shared {
    data: RwLock<BTreeMap<Vec<u8>, Versioned>>,
    /// Version of the most recent commit.
    version: AtomicU64,
}

/// Deterministic in-memory transactional store.
///
/// # Example
///
/// ```
/// use alder_kv::Database;
/// use alder_kv::MemoryDatabase;
/// use alder_slice::Slice;
/// use tokio_util::sync::CancellationToken;
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let db = MemoryDatabase::new();
/// let tr = db.begin(CancellationToken::new()).unwrap();
/// tr.set(Slice::from_utf8("k"), Slice::from_utf8("v"));
/// tr.commit().await.unwrap();
/// # });
/// ```
pub struct MemoryDatabase {
    shared: Arc<Shared>,
}

impl MemoryDatabase {
    /// Create an empty store wrapped in `Arc`.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            shared: Arc::new(Shared {
                data: RwLock::new(BTreeMap::new()),
                version: AtomicU64::new(0),
            }),
        })
    }

    /// Number of live (non-tombstone) keys, for tests and diagnostics.
    pub async fn live_keys(&self) -> usize {
        let data = self.shared.data.read().await;
        data.values().filter(|v| v.value.is_some()).count()
    }
}

impl Database for MemoryDatabase {
    fn begin(&self, cancel: CancellationToken) -> Result<Arc<dyn Transaction>, KvError> {
        if cancel.is_cancelled() {
            return Err(KvError::Cancelled);
        }
        Ok(Arc::new(MemoryTransaction {
            shared: Arc::clone(&self.shared),
            read_version: self.shared.version.load(Ordering::SeqCst),
            cancel,
            state: Mutex::new(TxState::default()),
        }))
    }
}

/// Transaction-local mutable state.
#[derive(Default)]
struct TxState {
    /// Buffered writes; `None` is a deletion.
    writes: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
    /// Keys read outside snapshot mode.
    read_keys: BTreeSet<Vec<u8>>,
    /// Ranges read outside snapshot mode.
    read_ranges: Vec<(Vec<u8>, Vec<u8>)>,
    committed: bool,
}

/// One optimistic transaction over a [`MemoryDatabase`].
pub struct MemoryTransaction {
    shared: Arc<Shared>,
    read_version: u64,
    cancel: CancellationToken,
    state: Mutex<TxState>,
}

impl MemoryTransaction {
    fn state(&self) -> MutexGuard<'_, TxState> {
        // Poisoning only happens if a holder panicked; propagating the
        // panic is the right outcome for a test backend.
        self.state.lock().expect("transaction state lock poisoned")
    }

    fn check_cancelled(&self) -> Result<(), KvError> {
        if self.cancel.is_cancelled() {
            return Err(KvError::Cancelled);
        }
        Ok(())
    }

    /// Read one key, optionally recording it in the conflict footprint.
    async fn read_key(&self, key: &Slice, record: bool) -> Result<Option<Slice>, KvError> {
        self.check_cancelled()?;

        let buffered = {
            let mut state = self.state();
            if state.committed {
                return Err(KvError::TransactionUsedAfterCommit);
            }
            if record {
                state.read_keys.insert(key.to_vec());
            }
            state.writes.get(key.as_bytes()).cloned()
        };
        if let Some(write) = buffered {
            return Ok(write.map(Slice::from_vec));
        }

        let data = self.shared.data.read().await;
        Ok(data
            .get(key.as_bytes())
            .and_then(|v| v.value.clone())
            .map(Slice::from_vec))
    }

    /// Read a range, optionally recording it in the conflict footprint.
    async fn read_range(
        &self,
        begin: &Slice,
        end: &Slice,
        options: RangeOptions,
        record: bool,
    ) -> Result<Vec<KeyValue>, KvError> {
        self.check_cancelled()?;

        let overlay: Vec<(Vec<u8>, Option<Vec<u8>>)> = {
            let mut state = self.state();
            if state.committed {
                return Err(KvError::TransactionUsedAfterCommit);
            }
            if record {
                state.read_ranges.push((begin.to_vec(), end.to_vec()));
            }
            state
                .writes
                .range::<[u8], _>((Bound::Included(begin.as_bytes()), Bound::Excluded(end.as_bytes())))
                .map(|(k, w)| (k.clone(), w.clone()))
                .collect()
        };

        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> = {
            let data = self.shared.data.read().await;
            data.range::<[u8], _>((Bound::Included(begin.as_bytes()), Bound::Excluded(end.as_bytes())))
                .filter_map(|(k, v)| v.value.as_ref().map(|value| (k.clone(), value.clone())))
                .collect()
        };
        for (key, write) in overlay {
            match write {
                Some(value) => {
                    merged.insert(key, value);
                }
                None => {
                    merged.remove(&key);
                }
            }
        }

        let pairs = |iter: &mut dyn Iterator<Item = (Vec<u8>, Vec<u8>)>| -> Vec<KeyValue> {
            let limit = options.limit.unwrap_or(usize::MAX);
            iter.take(limit)
                .map(|(key, value)| KeyValue {
                    key: Slice::from_vec(key),
                    value: Slice::from_vec(value),
                })
                .collect()
        };
        Ok(if options.reverse {
            pairs(&mut merged.into_iter().rev())
        } else {
            pairs(&mut merged.into_iter())
        })
    }
}

#[async_trait]
impl Transaction for MemoryTransaction {
    async fn get(&self, key: &Slice) -> Result<Option<Slice>, KvError> {
        self.read_key(key, true).await
    }

    async fn get_range(&self, begin: &Slice, end: &Slice, options: RangeOptions) -> Result<Vec<KeyValue>, KvError> {
        self.read_range(begin, end, options, true).await
    }

    async fn snapshot_get(&self, key: &Slice) -> Result<Option<Slice>, KvError> {
        self.read_key(key, false).await
    }

    async fn snapshot_get_range(
        &self,
        begin: &Slice,
        end: &Slice,
        options: RangeOptions,
    ) -> Result<Vec<KeyValue>, KvError> {
        self.read_range(begin, end, options, false).await
    }

    fn set(&self, key: Slice, value: Slice) {
        let mut state = self.state();
        if state.committed {
            return;
        }
        state.writes.insert(key.to_vec(), Some(value.to_vec()));
    }

    fn clear(&self, key: Slice) {
        let mut state = self.state();
        if state.committed {
            return;
        }
        state.writes.insert(key.to_vec(), None);
    }

    async fn commit(&self) -> Result<(), KvError> {
        self.check_cancelled()?;

        let (writes, read_keys, read_ranges) = {
            let mut state = self.state();
            if state.committed {
                return Err(KvError::TransactionUsedAfterCommit);
            }
            // One shot either way; a conflicted transaction is dead.
            state.committed = true;
            (
                std::mem::take(&mut state.writes),
                std::mem::take(&mut state.read_keys),
                std::mem::take(&mut state.read_ranges),
            )
        };

        let mut data = self.shared.data.write().await;

        for key in &read_keys {
            if let Some(v) = data.get(key.as_slice()) {
                if v.version > self.read_version {
                    return Err(KvError::Conflict {
                        description: format!("key {:?} changed", Slice::copy_from(key)),
                    });
                }
            }
        }
        for (begin, end) in &read_ranges {
            let stale = data
                .range::<[u8], _>((Bound::Included(begin.as_slice()), Bound::Excluded(end.as_slice())))
                .any(|(_, v)| v.version > self.read_version);
            if stale {
                return Err(KvError::Conflict {
                    description: format!(
                        "range [{:?}, {:?}) changed",
                        Slice::copy_from(begin),
                        Slice::copy_from(end)
                    ),
                });
            }
        }

        let version = self.shared.version.fetch_add(1, Ordering::SeqCst) + 1;
        for (key, write) in writes {
            data.insert(key, Versioned { value: write, version });
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
