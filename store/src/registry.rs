//! Account, category and argument registries consulted by the ledger.

use serde::{Deserialize, Serialize};
use tru_types::{ArgumentId, CategoryId, ClaimId, Coin, Timestamp, UserAddress};

use crate::{KvStore, StoreError};

/// A claim category (community). Rewards earned on its claims are paid in
/// a denomination named after its slug.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
}

impl Category {
    pub fn coin_name(&self) -> &str {
        &self.slug
    }
}

/// The parts of an argument the slashing ledger needs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgumentInfo {
    pub id: ArgumentId,
    pub claim_id: ClaimId,
    pub creator: UserAddress,
    pub stake: Coin,
}

pub trait AccountRegistry {
    fn is_jailed(
        &self,
        store: &dyn KvStore,
        address: &UserAddress,
        now: Timestamp,
    ) -> Result<bool, StoreError>;

    /// Jail `address` until `until` (exclusive).
    fn jail(
        &self,
        store: &dyn KvStore,
        address: &UserAddress,
        until: Timestamp,
    ) -> Result<(), StoreError>;
}

pub trait CategoryRegistry {
    fn category(
        &self,
        store: &dyn KvStore,
        id: CategoryId,
    ) -> Result<Option<Category>, StoreError>;
}

pub trait ArgumentRegistry {
    fn argument(
        &self,
        store: &dyn KvStore,
        id: ArgumentId,
    ) -> Result<Option<ArgumentInfo>, StoreError>;
}
