//! Balance transfer contract.

use thiserror::Error;
use tru_types::{Coin, UserAddress};

use crate::{KvStore, StoreError};

#[derive(Debug, Error)]
pub enum BankError {
    #[error("insufficient funds: {address} has {available}, needs {needed}")]
    InsufficientFunds {
        address: UserAddress,
        needed: Coin,
        available: Coin,
    },

    #[error("balance overflow for {0}")]
    Overflow(UserAddress),

    #[error("transfer rejected: {0}")]
    Rejected(String),

    #[error("bank storage error: {0}")]
    Store(#[from] StoreError),
}

/// Credits and debits account balances.
///
/// `store` is the handle of the operation in flight. Implementations that
/// persist balances must write through it so that a failed operation rolls
/// back its transfers together with everything else.
pub trait Bank {
    fn balance(
        &self,
        store: &dyn KvStore,
        address: &UserAddress,
        denom: &str,
    ) -> Result<Coin, BankError>;

    fn add_coins(
        &self,
        store: &dyn KvStore,
        address: &UserAddress,
        coin: &Coin,
    ) -> Result<(), BankError>;

    /// Fails with [`BankError::InsufficientFunds`] when the balance is short.
    fn subtract_coins(
        &self,
        store: &dyn KvStore,
        address: &UserAddress,
        coin: &Coin,
    ) -> Result<(), BankError>;
}
