//! LMDB implementation of KvStore.

use std::ops::Bound;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env};

use tru_store::{BatchOp, KeyRange, KvStore, ScanOrder, StoreError};

use crate::LmdbError;

#[derive(Clone)]
pub struct LmdbKvStore {
    pub(crate) env: Arc<Env>,
    pub(crate) db: Database<Bytes, Bytes>,
}

impl KvStore for LmdbKvStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let value = self.db.get(&rtxn, key).map_err(LmdbError::from)?;
        Ok(value.map(|v| v.to_vec()))
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.db.put(&mut wtxn, key, value).map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.db.delete(&mut wtxn, key).map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn scan(&self, range: &KeyRange) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let upper = match range.end.as_deref() {
            Some(end) => Bound::Excluded(end),
            None => Bound::Unbounded,
        };
        let bounds = (Bound::Included(range.start.as_slice()), upper);

        let mut results = Vec::new();
        match range.order {
            ScanOrder::Ascending => {
                let iter = self.db.range(&rtxn, &bounds).map_err(LmdbError::from)?;
                for entry in iter {
                    let (key, value) = entry.map_err(LmdbError::from)?;
                    results.push((key.to_vec(), value.to_vec()));
                }
            }
            ScanOrder::Descending => {
                let iter = self.db.rev_range(&rtxn, &bounds).map_err(LmdbError::from)?;
                for entry in iter {
                    let (key, value) = entry.map_err(LmdbError::from)?;
                    results.push((key.to_vec(), value.to_vec()));
                }
            }
        }
        Ok(results)
    }

    /// All ops share one write transaction; an error aborts it.
    fn apply(&self, ops: Vec<BatchOp>) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        for op in &ops {
            match op {
                BatchOp::Put { key, value } => {
                    self.db.put(&mut wtxn, key, value).map_err(LmdbError::from)?;
                }
                BatchOp::Delete { key } => {
                    self.db.delete(&mut wtxn, key).map_err(LmdbError::from)?;
                }
            }
        }
        wtxn.commit().map_err(LmdbError::from)?;
        tracing::trace!(ops = ops.len(), "applied batch");
        Ok(())
    }
}
