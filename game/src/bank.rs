//! Bank that keeps balances in the ledger's key-value store.

use tru_store::{Bank, BankError, KvStore};
use tru_types::{Coin, UserAddress};

/// Balances at `bank:balance:<addr>:<denom>` as big-endian `u128`.
///
/// Writes go through the store handle of the enclosing operation, so
/// transfers commit or roll back together with the ledger records.
#[derive(Clone, Copy, Debug, Default)]
pub struct StoreBank;

fn balance_key(address: &UserAddress, denom: &str) -> Vec<u8> {
    format!("bank:balance:{address}:{denom}").into_bytes()
}

fn read_amount(store: &dyn KvStore, key: &[u8]) -> Result<u128, BankError> {
    match store.get(key)? {
        Some(bytes) => {
            let arr: [u8; 16] = bytes.as_slice().try_into().map_err(|_| {
                BankError::Rejected(format!("balance record has {} bytes", bytes.len()))
            })?;
            Ok(u128::from_be_bytes(arr))
        }
        None => Ok(0),
    }
}

fn write_amount(store: &dyn KvStore, key: &[u8], amount: u128) -> Result<(), BankError> {
    if amount == 0 {
        store.delete(key)?;
    } else {
        store.put(key, &amount.to_be_bytes())?;
    }
    Ok(())
}

impl Bank for StoreBank {
    fn balance(
        &self,
        store: &dyn KvStore,
        address: &UserAddress,
        denom: &str,
    ) -> Result<Coin, BankError> {
        let amount = read_amount(store, &balance_key(address, denom))?;
        Ok(Coin::new(denom, amount))
    }

    fn add_coins(
        &self,
        store: &dyn KvStore,
        address: &UserAddress,
        coin: &Coin,
    ) -> Result<(), BankError> {
        let key = balance_key(address, &coin.denom);
        let current = read_amount(store, &key)?;
        let next = current
            .checked_add(coin.amount)
            .ok_or_else(|| BankError::Overflow(address.clone()))?;
        write_amount(store, &key, next)
    }

    fn subtract_coins(
        &self,
        store: &dyn KvStore,
        address: &UserAddress,
        coin: &Coin,
    ) -> Result<(), BankError> {
        let key = balance_key(address, &coin.denom);
        let current = read_amount(store, &key)?;
        let Some(next) = current.checked_sub(coin.amount) else {
            return Err(BankError::InsufficientFunds {
                address: address.clone(),
                needed: coin.clone(),
                available: Coin::new(coin.denom.clone(), current),
            });
        };
        write_amount(store, &key, next)
    }
}
