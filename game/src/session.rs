//! Operation context.
//!
//! A [`Session`] bundles the store handle of the operation in flight (a
//! staged batch for writes, the base store for reads) with the ledger
//! parameters and the injected services. Each module adds its operations to
//! `Session` in its own `impl` block.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use tru_store::{AccountRegistry, ArgumentRegistry, Bank, CategoryRegistry, KvStore};
use tru_types::{Coin, LedgerParams, Timestamp, UserAddress};

use crate::bank::StoreBank;
use crate::codec::{self, decode_id, encode_id};
use crate::registry::StoreRegistry;
use crate::GameError;

/// External collaborators of the ledger.
#[derive(Clone)]
pub struct Services {
    pub bank: Arc<dyn Bank + Send + Sync>,
    pub accounts: Arc<dyn AccountRegistry + Send + Sync>,
    pub categories: Arc<dyn CategoryRegistry + Send + Sync>,
    pub arguments: Arc<dyn ArgumentRegistry + Send + Sync>,
}

impl Services {
    /// Bank and registries that keep their state in the ledger's own store.
    pub fn store_backed() -> Self {
        let registry = Arc::new(StoreRegistry);
        Self {
            bank: Arc::new(StoreBank),
            accounts: registry.clone(),
            categories: registry.clone(),
            arguments: registry,
        }
    }
}

pub struct Session<'a> {
    pub(crate) store: &'a dyn KvStore,
    pub(crate) params: &'a LedgerParams,
    pub(crate) services: &'a Services,
}

impl<'a> Session<'a> {
    pub fn new(store: &'a dyn KvStore, params: &'a LedgerParams, services: &'a Services) -> Self {
        Self {
            store,
            params,
            services,
        }
    }

    pub fn params(&self) -> &LedgerParams {
        self.params
    }

    pub fn store(&self) -> &dyn KvStore {
        self.store
    }

    // ── Record helpers ──────────────────────────────────────────────────

    pub(crate) fn load<T: DeserializeOwned>(&self, key: &[u8]) -> Result<Option<T>, GameError> {
        match self.store.get(key)? {
            Some(bytes) => codec::decode(&bytes).map(Some),
            None => Ok(None),
        }
    }

    pub(crate) fn save<T: Serialize>(&self, key: &[u8], value: &T) -> Result<(), GameError> {
        self.store.put(key, &codec::encode(value)?)?;
        Ok(())
    }

    pub(crate) fn load_id(&self, key: &[u8]) -> Result<Option<u64>, GameError> {
        match self.store.get(key)? {
            Some(bytes) => decode_id(&bytes).map(Some),
            None => Ok(None),
        }
    }

    pub(crate) fn save_id(&self, key: &[u8], id: u64) -> Result<(), GameError> {
        self.store.put(key, &encode_id(id))?;
        Ok(())
    }

    /// Ids stored as values under `prefix`, in key order.
    pub(crate) fn ids_under(&self, prefix: &[u8]) -> Result<Vec<u64>, GameError> {
        self.store
            .scan_prefix(prefix)?
            .iter()
            .map(|(_, value)| decode_id(value))
            .collect()
    }

    /// Next id of a monotonic counter; the first id is 1.
    pub(crate) fn next_id(&self, counter: &[u8]) -> Result<u64, GameError> {
        let last = self.load_id(counter)?.unwrap_or(0);
        let next = last.checked_add(1).ok_or(GameError::Overflow("id counter"))?;
        self.save_id(counter, next)?;
        Ok(next)
    }

    // ── Service helpers ─────────────────────────────────────────────────

    pub(crate) fn ensure_not_jailed(
        &self,
        address: &UserAddress,
        now: Timestamp,
    ) -> Result<(), GameError> {
        if self.services.accounts.is_jailed(self.store, address, now)? {
            return Err(GameError::CreatorJailed(address.clone()));
        }
        Ok(())
    }

    pub(crate) fn ensure_stake_denom(&self, coin: &Coin) -> Result<(), GameError> {
        if !coin.is_denom(&self.params.stake_denom) {
            return Err(GameError::WrongDenom {
                expected: self.params.stake_denom.clone(),
                got: coin.denom.clone(),
            });
        }
        if coin.is_zero() {
            return Err(GameError::ZeroAmount);
        }
        Ok(())
    }

    pub(crate) fn debit(&self, address: &UserAddress, coin: &Coin) -> Result<(), GameError> {
        self.services.bank.subtract_coins(self.store, address, coin)?;
        Ok(())
    }

    /// Credit `coin`; zero amounts are skipped.
    pub(crate) fn credit(&self, address: &UserAddress, coin: &Coin) -> Result<(), GameError> {
        if coin.is_zero() {
            return Ok(());
        }
        self.services.bank.add_coins(self.store, address, coin)?;
        Ok(())
    }

    pub fn balance(&self, address: &UserAddress, denom: &str) -> Result<Coin, GameError> {
        Ok(self.services.bank.balance(self.store, address, denom)?)
    }
}
