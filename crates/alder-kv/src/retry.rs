//! Automatic retry loops for whole transactional operations.
//!
//! Transient failures (conflicts, timeouts) are part of normal operation in
//! an optimistic transactional store. Callers wrap an entire read or
//! read/write operation in one of these entry points; the loop begins a
//! fresh transaction for each attempt, commits write operations on success,
//! and retries with jittered exponential backoff until the error is
//! terminal or the attempt budget runs out. Cancellation is terminal, never
//! retried.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use alder_kv::retry;
//! use alder_kv::MemoryDatabase;
//! use alder_slice::Slice;
//! use tokio_util::sync::CancellationToken;
//!
//! # tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap().block_on(async {
//! let db = MemoryDatabase::new();
//! let cancel = CancellationToken::new();
//!
//! retry::write(db.as_ref(), &cancel, |tr| async move {
//!     tr.set(Slice::from_utf8("greeting"), Slice::from_utf8("hello"));
//!     Ok(())
//! })
//! .await
//! .unwrap();
//! # });
//! ```

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::KvError;
use crate::traits::Database;
use crate::traits::Transaction;

/// Attempts before a retry loop gives up.
const MAX_ATTEMPTS: u32 = 100;

/// First backoff step in milliseconds.
const INITIAL_BACKOFF_MS: u64 = 1;

/// Backoff ceiling in milliseconds.
const MAX_BACKOFF_MS: u64 = 100;

/// Run a read-only operation under automatic retry. The transaction is not
/// committed; use this for pure reads.
pub async fn read<D, T, F, Fut>(db: &D, cancel: &CancellationToken, op: F) -> Result<T, KvError>
where
    D: Database + ?Sized,
    F: Fn(Arc<dyn Transaction>) -> Fut,
    Fut: Future<Output = Result<T, KvError>>,
{
    run(db, cancel, op, false).await
}

/// Run a writing operation under automatic retry, committing after each
/// successful pass of `op`.
pub async fn write<D, T, F, Fut>(db: &D, cancel: &CancellationToken, op: F) -> Result<T, KvError>
where
    D: Database + ?Sized,
    F: Fn(Arc<dyn Transaction>) -> Fut,
    Fut: Future<Output = Result<T, KvError>>,
{
    run(db, cancel, op, true).await
}

/// Run an operation that both reads and writes under automatic retry,
/// committing after each successful pass of `op`.
pub async fn read_write<D, T, F, Fut>(db: &D, cancel: &CancellationToken, op: F) -> Result<T, KvError>
where
    D: Database + ?Sized,
    F: Fn(Arc<dyn Transaction>) -> Fut,
    Fut: Future<Output = Result<T, KvError>>,
{
    run(db, cancel, op, true).await
}

async fn run<D, T, F, Fut>(db: &D, cancel: &CancellationToken, op: F, commit: bool) -> Result<T, KvError>
where
    D: Database + ?Sized,
    F: Fn(Arc<dyn Transaction>) -> Fut,
    Fut: Future<Output = Result<T, KvError>>,
{
    let mut attempt = 0u32;
    let mut backoff_ms = INITIAL_BACKOFF_MS;

    loop {
        let tr = db.begin(cancel.clone())?;

        let outcome = match op(Arc::clone(&tr)).await {
            Ok(value) if commit => tr.commit().await.map(|()| value),
            other => other,
        };

        match outcome {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() => {
                attempt += 1;
                if attempt >= MAX_ATTEMPTS {
                    return Err(KvError::MaxRetriesExceeded { attempts: attempt });
                }
                debug!(attempt, error = %e, "transient error, retrying");
                // Draw the jitter before awaiting so the generator is never
                // held across a suspension point.
                let jitter = rand::rng().random_range(0..=backoff_ms);
                tokio::time::sleep(Duration::from_millis(backoff_ms + jitter)).await;
                backoff_ms = (backoff_ms * 2).min(MAX_BACKOFF_MS);
            }
            Err(e) => return Err(e),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicU32;
    use std::sync::atomic::Ordering;

    use alder_slice::Slice;

    use super::*;
    use crate::memory::MemoryDatabase;
    use crate::types::RangeOptions;

    fn key(s: &str) -> Slice {
        Slice::from_utf8(s)
    }

    #[tokio::test]
    async fn write_commits_the_closure_effects() {
        let db = MemoryDatabase::new();
        let cancel = CancellationToken::new();

        write(db.as_ref(), &cancel, |tr| async move {
            tr.set(Slice::from_utf8("k"), Slice::from_utf8("v"));
            Ok(())
        })
        .await
        .unwrap();

        let got = read(db.as_ref(), &cancel, |tr| async move {
            tr.get(&Slice::from_utf8("k")).await
        })
        .await
        .unwrap();
        assert_eq!(got, Some(key("v")));
    }

    #[tokio::test]
    async fn conflicting_writers_converge_under_retry() {
        let db = MemoryDatabase::new();
        let cancel = CancellationToken::new();

        // Read-modify-write of one shared key from many tasks: every pass
        // conflicts with whoever committed in between, and the retry loop
        // must still drive each task to completion.
        let mut tasks = Vec::new();
        for _ in 0..16 {
            let db = Arc::clone(&db);
            let cancel = cancel.clone();
            tasks.push(tokio::spawn(async move {
                read_write(db.as_ref(), &cancel, |tr| async move {
                    let current = tr
                        .get(&Slice::from_utf8("n"))
                        .await?
                        .map(|v| String::from_utf8_lossy(v.as_bytes()).parse::<u64>().unwrap_or(0))
                        .unwrap_or(0);
                    tr.set(
                        Slice::from_utf8("n"),
                        Slice::from_utf8(&(current + 1).to_string()),
                    );
                    Ok(())
                })
                .await
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let total = read(db.as_ref(), &cancel, |tr| async move {
            tr.get(&Slice::from_utf8("n")).await
        })
        .await
        .unwrap()
        .unwrap();
        assert_eq!(total, key("16"));
    }

    #[tokio::test]
    async fn terminal_errors_are_not_retried() {
        let db = MemoryDatabase::new();
        let cancel = CancellationToken::new();
        let attempts = AtomicU32::new(0);

        let result: Result<(), KvError> = read(db.as_ref(), &cancel, |_tr| {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(KvError::Backend { reason: "boom".into() }) }
        })
        .await;

        assert!(matches!(result, Err(KvError::Backend { .. })));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cancellation_stops_the_loop() {
        let db = MemoryDatabase::new();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = write(db.as_ref(), &cancel, |tr| async move {
            tr.set(Slice::from_utf8("k"), Slice::from_utf8("v"));
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(KvError::Cancelled)));
    }

    #[tokio::test]
    async fn read_does_not_commit() {
        let db = MemoryDatabase::new();
        let cancel = CancellationToken::new();

        read(db.as_ref(), &cancel, |tr| async move {
            tr.set(Slice::from_utf8("k"), Slice::from_utf8("v"));
            Ok(())
        })
        .await
        .unwrap();

        let rows = read(db.as_ref(), &cancel, |tr| async move {
            tr.get_range(&Slice::from_vec(vec![0x00]), &Slice::from_vec(vec![0xFF]), RangeOptions::all())
                .await
        })
        .await
        .unwrap();
        assert!(rows.is_empty());
    }
}
