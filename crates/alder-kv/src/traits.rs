//! Core traits for transactional access to an ordered keyspace.

use std::sync::Arc;

use alder_slice::Slice;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::KvError;
use crate::types::KeyValue;
use crate::types::RangeOptions;

/// One serializable transaction against an ordered keyspace.
///
/// Plain reads (`get`, `get_range`) enter the transaction's conflict
/// footprint: if something they observed changes before commit, the commit
/// fails with a retryable [`KvError::Conflict`]. Snapshot reads observe the
/// same data without any conflict footprint.
///
/// `set` and `clear` buffer locally and are infallible; buffered writes are
/// visible to this transaction's own subsequent reads and take effect only
/// at `commit`. A transaction commits at most once.
///
/// Every async method is a suspension point; cancellation of the token the
/// transaction was begun with takes effect at the next suspension point and
/// abandons the transaction without effect.
#[async_trait]
pub trait Transaction: Send + Sync {
    /// Read one key, entering it into the conflict footprint.
    async fn get(&self, key: &Slice) -> Result<Option<Slice>, KvError>;

    /// Read the keys in `[begin, end)`, entering the range into the
    /// conflict footprint.
    async fn get_range(&self, begin: &Slice, end: &Slice, options: RangeOptions) -> Result<Vec<KeyValue>, KvError>;

    /// Read one key without a conflict footprint.
    async fn snapshot_get(&self, key: &Slice) -> Result<Option<Slice>, KvError>;

    /// Read a range without a conflict footprint.
    async fn snapshot_get_range(
        &self,
        begin: &Slice,
        end: &Slice,
        options: RangeOptions,
    ) -> Result<Vec<KeyValue>, KvError>;

    /// Buffer a write of `value` at `key`.
    fn set(&self, key: Slice, value: Slice);

    /// Buffer a deletion of `key`.
    fn clear(&self, key: Slice);

    /// Validate the conflict footprint and apply the buffered writes
    /// atomically.
    async fn commit(&self) -> Result<(), KvError>;
}

/// Hands out transactions over an ordered keyspace.
pub trait Database: Send + Sync {
    /// Begin a transaction tied to `cancel`.
    fn begin(&self, cancel: CancellationToken) -> Result<Arc<dyn Transaction>, KvError>;
}

// Blanket implementation so layers can hold Arc<D> or Arc<dyn Database>.
impl<D: Database + ?Sized> Database for Arc<D> {
    fn begin(&self, cancel: CancellationToken) -> Result<Arc<dyn Transaction>, KvError> {
        (**self).begin(cancel)
    }
}
