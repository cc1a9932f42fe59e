//! Nullable registries: accounts, categories and arguments in memory.

use std::collections::HashMap;
use std::sync::Mutex;

use tru_store::{
    AccountRegistry, ArgumentInfo, ArgumentRegistry, Category, CategoryRegistry, KvStore,
    StoreError,
};
use tru_types::{ArgumentId, CategoryId, Timestamp, UserAddress};

/// In-memory implementation of every registry trait.
#[derive(Default)]
pub struct NullRegistry {
    categories: Mutex<HashMap<CategoryId, Category>>,
    arguments: Mutex<HashMap<ArgumentId, ArgumentInfo>>,
    jailed_until: Mutex<HashMap<String, Timestamp>>,
}

impl NullRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_category(&self, category: Category) {
        self.categories
            .lock()
            .unwrap()
            .insert(category.id, category);
    }

    pub fn add_argument(&self, argument: ArgumentInfo) {
        self.arguments
            .lock()
            .unwrap()
            .insert(argument.id, argument);
    }

    pub fn jailed_until(&self, address: &UserAddress) -> Option<Timestamp> {
        self.jailed_until
            .lock()
            .unwrap()
            .get(address.as_str())
            .copied()
    }
}

impl AccountRegistry for NullRegistry {
    fn is_jailed(
        &self,
        _store: &dyn KvStore,
        address: &UserAddress,
        now: Timestamp,
    ) -> Result<bool, StoreError> {
        Ok(self.jailed_until(address).is_some_and(|until| now < until))
    }

    fn jail(
        &self,
        _store: &dyn KvStore,
        address: &UserAddress,
        until: Timestamp,
    ) -> Result<(), StoreError> {
        self.jailed_until
            .lock()
            .unwrap()
            .insert(address.to_string(), until);
        Ok(())
    }
}

impl CategoryRegistry for NullRegistry {
    fn category(
        &self,
        _store: &dyn KvStore,
        id: CategoryId,
    ) -> Result<Option<Category>, StoreError> {
        Ok(self.categories.lock().unwrap().get(&id).cloned())
    }
}

impl ArgumentRegistry for NullRegistry {
    fn argument(
        &self,
        _store: &dyn KvStore,
        id: ArgumentId,
    ) -> Result<Option<ArgumentInfo>, StoreError> {
        Ok(self.arguments.lock().unwrap().get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NullStore;

    #[test]
    fn jail_expires() {
        let registry = NullRegistry::new();
        let store = NullStore::new();
        let bob = UserAddress::new("tru1bob");

        registry.jail(&store, &bob, Timestamp::new(100)).unwrap();
        assert!(registry.is_jailed(&store, &bob, Timestamp::new(99)).unwrap());
        assert!(!registry.is_jailed(&store, &bob, Timestamp::new(100)).unwrap());
    }
}
