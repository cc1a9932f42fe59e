//! Nullable infrastructure for deterministic testing.
//!
//! Every collaborator the ledger calls into (clock, storage, bank, account,
//! category and argument registries) is abstracted behind a trait. This
//! crate provides test-friendly implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically, including injected failures
//! - Never touch the filesystem
//!
//! Usage: swap real implementations for nullables in tests.

pub mod bank;
pub mod clock;
pub mod registry;
pub mod store;

pub use bank::NullBank;
pub use clock::NullClock;
pub use registry::NullRegistry;
pub use store::NullStore;
