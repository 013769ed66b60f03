//! Request and result types for database operations.

use alder_slice::Slice;
use serde::Deserialize;
use serde::Serialize;

/// One key/value pair returned by a range read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    /// The key, including any layer prefix.
    pub key: Slice,
    /// The stored value.
    pub value: Slice,
}

/// Options for a range read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeOptions {
    /// Maximum number of pairs to return; `None` means everything in the
    /// range.
    pub limit: Option<usize>,
    /// Iterate from the end of the range toward the beginning.
    pub reverse: bool,
}

impl RangeOptions {
    /// Everything in the range, in ascending key order.
    pub fn all() -> Self {
        Self::default()
    }

    /// At most `limit` pairs from the beginning of the range.
    pub fn first(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            reverse: false,
        }
    }

    /// At most `limit` pairs from the end of the range, descending.
    pub fn last(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            reverse: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_options_constructors() {
        assert_eq!(RangeOptions::all(), RangeOptions { limit: None, reverse: false });
        assert_eq!(
            RangeOptions::first(5),
            RangeOptions {
                limit: Some(5),
                reverse: false
            }
        );
        assert_eq!(
            RangeOptions::last(3),
            RangeOptions {
                limit: Some(3),
                reverse: true
            }
        );
    }
}
