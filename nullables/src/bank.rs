//! Nullable bank: in-memory balances with failure injection.

use std::collections::HashMap;
use std::sync::Mutex;

use tru_store::{Bank, BankError, KvStore};
use tru_types::{Coin, UserAddress};

/// An in-memory [`Bank`] for testing.
///
/// Balances live outside the store, so they are not rolled back with a
/// failed batch. Use it to observe payouts and to inject downstream
/// failures; use the store-backed bank when atomicity is under test.
#[derive(Default)]
pub struct NullBank {
    balances: Mutex<HashMap<(String, String), u128>>,
    /// Number of `add_coins` calls left before they start failing.
    fail_after: Mutex<Option<usize>>,
    credits: Mutex<Vec<(UserAddress, Coin)>>,
}

impl NullBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a balance directly.
    pub fn set_balance(&self, address: &UserAddress, coin: Coin) {
        self.balances
            .lock()
            .unwrap()
            .insert((address.to_string(), coin.denom), coin.amount);
    }

    pub fn amount(&self, address: &UserAddress, denom: &str) -> u128 {
        self.balances
            .lock()
            .unwrap()
            .get(&(address.to_string(), denom.to_string()))
            .copied()
            .unwrap_or(0)
    }

    /// Let `n` more `add_coins` calls succeed, then fail every one after.
    pub fn fail_add_coins_after(&self, n: usize) {
        *self.fail_after.lock().unwrap() = Some(n);
    }

    /// Every successful credit, in call order.
    pub fn credits(&self) -> Vec<(UserAddress, Coin)> {
        self.credits.lock().unwrap().clone()
    }
}

impl Bank for NullBank {
    fn balance(
        &self,
        _store: &dyn KvStore,
        address: &UserAddress,
        denom: &str,
    ) -> Result<Coin, BankError> {
        Ok(Coin::new(denom, self.amount(address, denom)))
    }

    fn add_coins(
        &self,
        _store: &dyn KvStore,
        address: &UserAddress,
        coin: &Coin,
    ) -> Result<(), BankError> {
        {
            let mut fail_after = self.fail_after.lock().unwrap();
            match fail_after.as_mut() {
                Some(0) => {
                    return Err(BankError::Rejected(format!(
                        "injected failure crediting {address}"
                    )))
                }
                Some(n) => *n -= 1,
                None => {}
            }
        }

        let mut balances = self.balances.lock().unwrap();
        let entry = balances
            .entry((address.to_string(), coin.denom.clone()))
            .or_insert(0);
        *entry = entry
            .checked_add(coin.amount)
            .ok_or_else(|| BankError::Overflow(address.clone()))?;
        self.credits
            .lock()
            .unwrap()
            .push((address.clone(), coin.clone()));
        Ok(())
    }

    fn subtract_coins(
        &self,
        _store: &dyn KvStore,
        address: &UserAddress,
        coin: &Coin,
    ) -> Result<(), BankError> {
        let mut balances = self.balances.lock().unwrap();
        let entry = balances
            .entry((address.to_string(), coin.denom.clone()))
            .or_insert(0);
        if *entry < coin.amount {
            return Err(BankError::InsufficientFunds {
                address: address.clone(),
                needed: coin.clone(),
                available: Coin::new(coin.denom.clone(), *entry),
            });
        }
        *entry -= coin.amount;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NullStore;

    fn alice() -> UserAddress {
        UserAddress::new("tru1alice")
    }

    #[test]
    fn subtract_requires_funds() {
        let bank = NullBank::new();
        let store = NullStore::new();
        bank.set_balance(&alice(), Coin::new("trusteak", 10));

        bank.subtract_coins(&store, &alice(), &Coin::new("trusteak", 4))
            .unwrap();
        assert_eq!(bank.amount(&alice(), "trusteak"), 6);

        let err = bank
            .subtract_coins(&store, &alice(), &Coin::new("trusteak", 7))
            .unwrap_err();
        assert!(matches!(err, BankError::InsufficientFunds { .. }));
    }

    #[test]
    fn add_coins_fails_after_budget() {
        let bank = NullBank::new();
        let store = NullStore::new();
        bank.fail_add_coins_after(1);

        bank.add_coins(&store, &alice(), &Coin::new("crypto", 1)).unwrap();
        assert!(bank.add_coins(&store, &alice(), &Coin::new("crypto", 1)).is_err());
        assert_eq!(bank.credits().len(), 1);
    }
}
