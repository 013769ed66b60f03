//! Error types for database operations.

use snafu::Snafu;

/// Errors surfaced by [`Database`](crate::Database) and
/// [`Transaction`](crate::Transaction) implementations.
///
/// Conflicts and timeouts are *transient*: the transaction lost a race or a
/// deadline, and re-running it against a fresh read version is expected to
/// succeed. Everything else is terminal for the operation. Cancellation is a
/// distinguished outcome rather than a fault; it is never retried.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
pub enum KvError {
    /// Serializable validation failed at commit: something this
    /// transaction read was modified by a later commit.
    #[snafu(display("transaction conflict: {description}"))]
    Conflict {
        /// What was observed to conflict.
        description: String,
    },

    /// The operation exceeded its deadline.
    #[snafu(display("operation timed out after {duration_ms}ms"))]
    TimedOut {
        /// Elapsed time in milliseconds.
        duration_ms: u64,
    },

    /// The caller's cancellation token fired; the transaction was
    /// abandoned without effect.
    #[snafu(display("operation cancelled"))]
    Cancelled,

    /// A transaction was used after its commit completed.
    #[snafu(display("transaction already committed"))]
    TransactionUsedAfterCommit,

    /// A retry loop gave up.
    #[snafu(display("gave up after {attempts} attempts"))]
    MaxRetriesExceeded {
        /// Number of attempts made before giving up.
        attempts: u32,
    },

    /// Failure reported by the backing store.
    #[snafu(display("backend error: {reason}"))]
    Backend {
        /// Description of the failure.
        reason: String,
    },
}

impl KvError {
    /// Whether re-running the transaction is expected to succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, KvError::Conflict { .. } | KvError::TimedOut { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_and_timeout_are_retryable() {
        assert!(KvError::Conflict {
            description: "read range".into()
        }
        .is_retryable());
        assert!(KvError::TimedOut { duration_ms: 10 }.is_retryable());
    }

    #[test]
    fn cancellation_and_misuse_are_not_retryable() {
        assert!(!KvError::Cancelled.is_retryable());
        assert!(!KvError::TransactionUsedAfterCommit.is_retryable());
        assert!(!KvError::MaxRetriesExceeded { attempts: 5 }.is_retryable());
        assert!(!KvError::Backend { reason: "io".into() }.is_retryable());
    }

    #[test]
    fn display_messages() {
        assert_eq!(KvError::Cancelled.to_string(), "operation cancelled");
        assert_eq!(
            KvError::MaxRetriesExceeded { attempts: 3 }.to_string(),
            "gave up after 3 attempts"
        );
    }
}
