//! Ordered key-value storage trait.

use crate::StoreError;

/// Direction of a range scan.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanOrder {
    Ascending,
    Descending,
}

/// A half-open key range `[start, end)`. `end = None` is unbounded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyRange {
    pub start: Vec<u8>,
    pub end: Option<Vec<u8>>,
    pub order: ScanOrder,
}

impl KeyRange {
    pub fn new(start: Vec<u8>, end: Option<Vec<u8>>) -> Self {
        Self {
            start,
            end,
            order: ScanOrder::Ascending,
        }
    }

    /// Every key starting with `prefix`.
    pub fn prefix(prefix: &[u8]) -> Self {
        Self::new(prefix.to_vec(), prefix_end(prefix))
    }

    pub fn descending(mut self) -> Self {
        self.order = ScanOrder::Descending;
        self
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        key >= self.start.as_slice() && self.end.as_deref().map_or(true, |end| key < end)
    }
}

/// Smallest key strictly greater than every key starting with `prefix`.
///
/// Increments the last byte that is not `0xFF` and truncates after it.
/// `None` when the prefix is empty or all `0xFF` (unbounded).
pub fn prefix_end(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut end = prefix.to_vec();
    while let Some(last) = end.pop() {
        if last < 0xFF {
            end.push(last + 1);
            return Some(end);
        }
    }
    None
}

/// A single staged mutation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BatchOp {
    Put { key: Vec<u8>, value: Vec<u8> },
    Delete { key: Vec<u8> },
}

/// Ordered key-value store with range iteration.
///
/// Methods take `&self`; implementations provide their own interior
/// mutability. Scans return collected entries so that the backend's
/// iteration handle is released before the call returns.
pub trait KvStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError>;

    fn delete(&self, key: &[u8]) -> Result<(), StoreError>;

    /// All entries in `range`, ordered by key bytes in `range.order`.
    fn scan(&self, range: &KeyRange) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError>;

    /// Apply `ops` all-or-nothing.
    fn apply(&self, ops: Vec<BatchOp>) -> Result<(), StoreError>;

    fn has(&self, key: &[u8]) -> Result<bool, StoreError> {
        Ok(self.get(key)?.is_some())
    }

    /// Shorthand for a prefix scan.
    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        self.scan(&KeyRange::prefix(prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_end_increments_last_byte() {
        assert_eq!(prefix_end(b"ab"), Some(b"ac".to_vec()));
    }

    #[test]
    fn prefix_end_carries_over_ff() {
        assert_eq!(prefix_end(&[0x01, 0xFF]), Some(vec![0x02]));
        assert_eq!(prefix_end(&[0xFF, 0xFF]), None);
        assert_eq!(prefix_end(&[]), None);
    }

    #[test]
    fn prefix_range_contains_only_prefixed_keys() {
        let range = KeyRange::prefix(b"claim:");
        assert!(range.contains(b"claim:1"));
        assert!(!range.contains(b"claim;"));
        assert!(!range.contains(b"clai"));
    }
}
