//! Nullable store: thread-safe in-memory ordered storage for testing.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use tru_store::{BatchOp, KeyRange, KvStore, ScanOrder, StoreError};

/// An in-memory [`KvStore`] backed by a `BTreeMap`.
///
/// `apply` can be told to fail, to exercise rollback paths.
#[derive(Default)]
pub struct NullStore {
    entries: Mutex<BTreeMap<Vec<u8>, Vec<u8>>>,
    fail_apply: AtomicBool,
    applies: AtomicUsize,
}

impl NullStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `apply` fail (or succeed again).
    pub fn fail_applies(&self, fail: bool) {
        self.fail_apply.store(fail, Ordering::SeqCst);
    }

    /// Number of successful `apply` calls.
    pub fn apply_count(&self) -> usize {
        self.applies.load(Ordering::SeqCst)
    }

    /// Copy of every entry, for before/after comparisons.
    pub fn snapshot(&self) -> BTreeMap<Vec<u8>, Vec<u8>> {
        self.entries.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }
}

impl KvStore for NullStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<(), StoreError> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }

    fn scan(&self, range: &KeyRange) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        let entries = self.entries.lock().unwrap();
        let matching = entries
            .range(range.start.clone()..)
            .take_while(|(k, _)| range.end.as_ref().map_or(true, |end| *k < end))
            .map(|(k, v)| (k.clone(), v.clone()));
        Ok(match range.order {
            ScanOrder::Ascending => matching.collect(),
            ScanOrder::Descending => {
                let mut all: Vec<_> = matching.collect();
                all.reverse();
                all
            }
        })
    }

    fn apply(&self, ops: Vec<BatchOp>) -> Result<(), StoreError> {
        if self.fail_apply.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("injected apply failure".into()));
        }
        let mut entries = self.entries.lock().unwrap();
        for op in ops {
            match op {
                BatchOp::Put { key, value } => {
                    entries.insert(key, value);
                }
                BatchOp::Delete { key } => {
                    entries.remove(&key);
                }
            }
        }
        self.applies.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
