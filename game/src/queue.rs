//! FIFO of record ids persisted in the key-value store.
//!
//! `head` and `tail` are sequence counters; entries live at
//! `queue:<name>:entry:<seq>` for `head <= seq < tail`. Push, peek and pop
//! each touch a constant number of keys, so draining the expired prefix of
//! the queue costs O(1) per expired entry regardless of ledger size.

use tru_store::KvStore;

use crate::codec::{decode_id, encode_id};
use crate::keys;
use crate::GameError;

/// Queue of validation games, in creation order.
pub const GAME_QUEUE: ExpiryQueue = ExpiryQueue::new("game");

/// Queue of backings awaiting maturity, in creation order.
pub const BACKING_QUEUE: ExpiryQueue = ExpiryQueue::new("backing");

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExpiryQueue {
    name: &'static str,
}

impl ExpiryQueue {
    pub const fn new(name: &'static str) -> Self {
        Self { name }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    fn counter(&self, store: &dyn KvStore, key: &[u8]) -> Result<u64, GameError> {
        match store.get(key)? {
            Some(bytes) => decode_id(&bytes),
            None => Ok(0),
        }
    }

    /// Append `id` at the tail.
    pub fn push(&self, store: &dyn KvStore, id: u64) -> Result<(), GameError> {
        let tail_key = keys::queue_tail(self.name);
        let tail = self.counter(store, &tail_key)?;
        let next = tail
            .checked_add(1)
            .ok_or(GameError::Overflow("queue tail"))?;
        store.put(&keys::queue_entry(self.name, tail), &encode_id(id))?;
        store.put(&tail_key, &encode_id(next))?;
        Ok(())
    }

    /// The id at the head, without removing it.
    pub fn peek(&self, store: &dyn KvStore) -> Result<Option<u64>, GameError> {
        let head = self.counter(store, &keys::queue_head(self.name))?;
        let tail = self.counter(store, &keys::queue_tail(self.name))?;
        if head >= tail {
            return Ok(None);
        }
        match store.get(&keys::queue_entry(self.name, head))? {
            Some(bytes) => decode_id(&bytes).map(Some),
            None => Err(GameError::Corrupted(format!(
                "queue {} has no entry at sequence {}",
                self.name, head
            ))),
        }
    }

    /// Remove and return the id at the head.
    pub fn pop(&self, store: &dyn KvStore) -> Result<Option<u64>, GameError> {
        let Some(id) = self.peek(store)? else {
            return Ok(None);
        };
        let head_key = keys::queue_head(self.name);
        let head = self.counter(store, &head_key)?;
        store.delete(&keys::queue_entry(self.name, head))?;
        store.put(&head_key, &encode_id(head + 1))?;
        Ok(Some(id))
    }

    pub fn len(&self, store: &dyn KvStore) -> Result<u64, GameError> {
        let head = self.counter(store, &keys::queue_head(self.name))?;
        let tail = self.counter(store, &keys::queue_tail(self.name))?;
        Ok(tail.saturating_sub(head))
    }

    pub fn is_empty(&self, store: &dyn KvStore) -> Result<bool, GameError> {
        Ok(self.len(store)? == 0)
    }

    /// Every queued id, head first.
    pub fn ids(&self, store: &dyn KvStore) -> Result<Vec<u64>, GameError> {
        store
            .scan_prefix(&keys::queue_entries_prefix(self.name))?
            .iter()
            .map(|(_, value)| decode_id(value))
            .collect()
    }
}
