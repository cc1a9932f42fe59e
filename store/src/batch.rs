//! Staged write overlay over any [`KvStore`].

use std::cell::RefCell;
use std::collections::BTreeMap;

use crate::kv::{BatchOp, KeyRange, KvStore, ScanOrder};
use crate::StoreError;

/// Buffers writes in memory on top of a base store.
///
/// Reads see staged writes first. Nothing reaches the base until
/// [`WriteBatch::commit`]; dropping the batch discards every staged op.
/// A batch is itself a [`KvStore`], so batches nest.
pub struct WriteBatch<'a> {
    base: &'a dyn KvStore,
    /// `None` marks a staged delete.
    staged: RefCell<BTreeMap<Vec<u8>, Option<Vec<u8>>>>,
}

impl<'a> WriteBatch<'a> {
    pub fn new(base: &'a dyn KvStore) -> Self {
        Self {
            base,
            staged: RefCell::new(BTreeMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.staged.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.staged.borrow().is_empty()
    }

    /// Staged ops in key order.
    pub fn ops(&self) -> Vec<BatchOp> {
        self.staged
            .borrow()
            .iter()
            .map(|(key, value)| match value {
                Some(value) => BatchOp::Put {
                    key: key.clone(),
                    value: value.clone(),
                },
                None => BatchOp::Delete { key: key.clone() },
            })
            .collect()
    }

    /// Hand every staged op to the base store in a single `apply`.
    pub fn commit(self) -> Result<(), StoreError> {
        if self.is_empty() {
            return Ok(());
        }
        let ops = self.ops();
        self.base.apply(ops)
    }
}

impl KvStore for WriteBatch<'_> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        if let Some(staged) = self.staged.borrow().get(key) {
            return Ok(staged.clone());
        }
        self.base.get(key)
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.staged
            .borrow_mut()
            .insert(key.to_vec(), Some(value.to_vec()));
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<(), StoreError> {
        self.staged.borrow_mut().insert(key.to_vec(), None);
        Ok(())
    }

    fn scan(&self, range: &KeyRange) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        let ascending = KeyRange::new(range.start.clone(), range.end.clone());
        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> =
            self.base.scan(&ascending)?.into_iter().collect();

        for (key, value) in self.staged.borrow().iter() {
            if !range.contains(key) {
                continue;
            }
            match value {
                Some(value) => {
                    merged.insert(key.clone(), value.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }

        let entries = merged.into_iter();
        Ok(match range.order {
            ScanOrder::Ascending => entries.collect(),
            ScanOrder::Descending => entries.rev().collect(),
        })
    }

    fn apply(&self, ops: Vec<BatchOp>) -> Result<(), StoreError> {
        let mut staged = self.staged.borrow_mut();
        for op in ops {
            match op {
                BatchOp::Put { key, value } => {
                    staged.insert(key, Some(value));
                }
                BatchOp::Delete { key } => {
                    staged.insert(key, None);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Minimal base store so the batch can be tested without the nullables crate.
    #[derive(Default)]
    struct MapStore {
        inner: Mutex<BTreeMap<Vec<u8>, Vec<u8>>>,
        applies: Mutex<usize>,
    }

    impl KvStore for MapStore {
        fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
            Ok(self.inner.lock().unwrap().get(key).cloned())
        }

        fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
            self.inner.lock().unwrap().insert(key.to_vec(), value.to_vec());
            Ok(())
        }

        fn delete(&self, key: &[u8]) -> Result<(), StoreError> {
            self.inner.lock().unwrap().remove(key);
            Ok(())
        }

        fn scan(&self, range: &KeyRange) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
            let inner = self.inner.lock().unwrap();
            let mut out: Vec<_> = inner
                .iter()
                .filter(|(k, _)| range.contains(k))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            if range.order == ScanOrder::Descending {
                out.reverse();
            }
            Ok(out)
        }

        fn apply(&self, ops: Vec<BatchOp>) -> Result<(), StoreError> {
            *self.applies.lock().unwrap() += 1;
            let mut inner = self.inner.lock().unwrap();
            for op in ops {
                match op {
                    BatchOp::Put { key, value } => {
                        inner.insert(key, value);
                    }
                    BatchOp::Delete { key } => {
                        inner.remove(&key);
                    }
                }
            }
            Ok(())
        }
    }

    #[test]
    fn reads_see_staged_writes() {
        let base = MapStore::default();
        base.put(b"a", b"1").unwrap();

        let batch = WriteBatch::new(&base);
        batch.put(b"a", b"2").unwrap();
        batch.put(b"b", b"3").unwrap();

        assert_eq!(batch.get(b"a").unwrap(), Some(b"2".to_vec()));
        assert_eq!(batch.get(b"b").unwrap(), Some(b"3".to_vec()));
        assert_eq!(base.get(b"a").unwrap(), Some(b"1".to_vec()));
        assert_eq!(base.get(b"b").unwrap(), None);
    }

    #[test]
    fn drop_discards_staged_ops() {
        let base = MapStore::default();
        {
            let batch = WriteBatch::new(&base);
            batch.put(b"x", b"1").unwrap();
        }
        assert_eq!(base.get(b"x").unwrap(), None);
        assert_eq!(*base.applies.lock().unwrap(), 0);
    }

    #[test]
    fn commit_applies_once() {
        let base = MapStore::default();
        base.put(b"gone", b"1").unwrap();

        let batch = WriteBatch::new(&base);
        batch.put(b"k1", b"v1").unwrap();
        batch.put(b"k2", b"v2").unwrap();
        batch.delete(b"gone").unwrap();
        batch.commit().unwrap();

        assert_eq!(*base.applies.lock().unwrap(), 1);
        assert_eq!(base.get(b"k1").unwrap(), Some(b"v1".to_vec()));
        assert_eq!(base.get(b"gone").unwrap(), None);
    }

    #[test]
    fn scan_merges_staged_entries() {
        let base = MapStore::default();
        base.put(b"p:1", b"a").unwrap();
        base.put(b"p:2", b"b").unwrap();
        base.put(b"q:1", b"c").unwrap();

        let batch = WriteBatch::new(&base);
        batch.delete(b"p:1").unwrap();
        batch.put(b"p:3", b"d").unwrap();
        batch.put(b"q:2", b"e").unwrap();

        let keys: Vec<_> = batch
            .scan_prefix(b"p:")
            .unwrap()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, vec![b"p:2".to_vec(), b"p:3".to_vec()]);

        let desc: Vec<_> = batch
            .scan(&KeyRange::prefix(b"p:").descending())
            .unwrap()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(desc, vec![b"p:3".to_vec(), b"p:2".to_vec()]);
    }

    #[test]
    fn nested_batch_commits_into_parent() {
        let base = MapStore::default();
        let outer = WriteBatch::new(&base);
        {
            let inner = WriteBatch::new(&outer);
            inner.put(b"k", b"v").unwrap();
            inner.commit().unwrap();
        }
        assert_eq!(outer.get(b"k").unwrap(), Some(b"v".to_vec()));
        assert_eq!(base.get(b"k").unwrap(), None);
        outer.commit().unwrap();
        assert_eq!(base.get(b"k").unwrap(), Some(b"v".to_vec()));
    }
}
