//! Abstract storage and ledger-service contracts.
//!
//! Every storage backend (LMDB, in-memory for testing) implements [`KvStore`].
//! Balances and the account/category/argument registries are reached through
//! the traits in [`bank`] and [`registry`]; they receive the store handle of
//! the operation in flight so that their writes land in the same batch.
//! The rest of the codebase depends only on these traits.

pub mod bank;
pub mod batch;
pub mod error;
pub mod kv;
pub mod registry;

pub use bank::{Bank, BankError};
pub use batch::WriteBatch;
pub use error::StoreError;
pub use kv::{BatchOp, KeyRange, KvStore, ScanOrder};
pub use registry::{AccountRegistry, ArgumentInfo, ArgumentRegistry, Category, CategoryRegistry};
