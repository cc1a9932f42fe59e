//! Account, category and argument registries kept in the ledger's store.
//!
//! The daemon seeds categories and arguments at genesis; jail terms are
//! written by the slashing ledger.

use tru_store::{
    AccountRegistry, ArgumentInfo, ArgumentRegistry, Category, CategoryRegistry, KvStore,
    StoreError,
};
use tru_types::{ArgumentId, CategoryId, Timestamp, UserAddress};

#[derive(Clone, Copy, Debug, Default)]
pub struct StoreRegistry;

fn category_key(id: CategoryId) -> Vec<u8> {
    let mut key = b"registry:category:".to_vec();
    key.extend_from_slice(&id.to_be_bytes());
    key
}

fn argument_key(id: ArgumentId) -> Vec<u8> {
    let mut key = b"registry:argument:".to_vec();
    key.extend_from_slice(&id.to_be_bytes());
    key
}

fn jail_key(address: &UserAddress) -> Vec<u8> {
    format!("registry:jailed:{address}").into_bytes()
}

fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T, StoreError> {
    bincode::deserialize(bytes).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn encode<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, StoreError> {
    bincode::serialize(value).map_err(|e| StoreError::Serialization(e.to_string()))
}

impl StoreRegistry {
    pub fn put_category(&self, store: &dyn KvStore, category: &Category) -> Result<(), StoreError> {
        store.put(&category_key(category.id), &encode(category)?)
    }

    pub fn put_argument(
        &self,
        store: &dyn KvStore,
        argument: &ArgumentInfo,
    ) -> Result<(), StoreError> {
        store.put(&argument_key(argument.id), &encode(argument)?)
    }

    pub fn jailed_until(
        &self,
        store: &dyn KvStore,
        address: &UserAddress,
    ) -> Result<Option<Timestamp>, StoreError> {
        store
            .get(&jail_key(address))?
            .map(|bytes| decode(&bytes))
            .transpose()
    }
}

impl AccountRegistry for StoreRegistry {
    fn is_jailed(
        &self,
        store: &dyn KvStore,
        address: &UserAddress,
        now: Timestamp,
    ) -> Result<bool, StoreError> {
        Ok(self
            .jailed_until(store, address)?
            .is_some_and(|until| now < until))
    }

    fn jail(
        &self,
        store: &dyn KvStore,
        address: &UserAddress,
        until: Timestamp,
    ) -> Result<(), StoreError> {
        store.put(&jail_key(address), &encode(&until)?)
    }
}

impl CategoryRegistry for StoreRegistry {
    fn category(
        &self,
        store: &dyn KvStore,
        id: CategoryId,
    ) -> Result<Option<Category>, StoreError> {
        store
            .get(&category_key(id))?
            .map(|bytes| decode(&bytes))
            .transpose()
    }
}

impl ArgumentRegistry for StoreRegistry {
    fn argument(
        &self,
        store: &dyn KvStore,
        id: ArgumentId,
    ) -> Result<Option<ArgumentInfo>, StoreError> {
        store
            .get(&argument_key(id))?
            .map(|bytes| decode(&bytes))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tru_nullables::NullStore;
    use tru_types::Coin;

    #[test]
    fn category_round_trip() {
        let store = NullStore::new();
        let category = Category {
            id: 4,
            slug: "sports".into(),
            title: "Sports".into(),
            description: String::new(),
        };
        StoreRegistry.put_category(&store, &category).unwrap();
        assert_eq!(StoreRegistry.category(&store, 4).unwrap(), Some(category));
        assert_eq!(StoreRegistry.category(&store, 5).unwrap(), None);
    }

    #[test]
    fn argument_lookup() {
        let store = NullStore::new();
        let argument = ArgumentInfo {
            id: 11,
            claim_id: 2,
            creator: UserAddress::new("tru1erin"),
            stake: Coin::new("trusteak", 40),
        };
        StoreRegistry.put_argument(&store, &argument).unwrap();
        assert_eq!(
            StoreRegistry.argument(&store, 11).unwrap().unwrap().creator,
            UserAddress::new("tru1erin")
        );
    }

    #[test]
    fn jail_term_ends() {
        let store = NullStore::new();
        let frank = UserAddress::new("tru1frank");
        assert!(!StoreRegistry
            .is_jailed(&store, &frank, Timestamp::new(0))
            .unwrap());
        StoreRegistry
            .jail(&store, &frank, Timestamp::new(50))
            .unwrap();
        assert!(StoreRegistry
            .is_jailed(&store, &frank, Timestamp::new(49))
            .unwrap());
        assert!(!StoreRegistry
            .is_jailed(&store, &frank, Timestamp::new(50))
            .unwrap());
    }
}
