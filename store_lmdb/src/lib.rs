//! LMDB storage backend for the claim ledger.
//!
//! Implements [`tru_store::KvStore`] using the `heed` LMDB bindings. All
//! ledger records share one ordered `kv` database; schema bookkeeping lives
//! in a separate `meta` database inside the same environment.

pub mod environment;
pub mod error;
pub mod kv;
pub mod migration;

pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use kv::LmdbKvStore;
pub use migration::{Migrator, CURRENT_SCHEMA_VERSION};
