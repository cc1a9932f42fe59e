//! The validation-game engine of the claim ledger.
//!
//! Users back claims they believe and challenge claims they dispute; once a
//! challenge gathers enough stake the claim's validation game opens and
//! token holders vote. The game closes by quorum or at its deadline and the
//! settlement engine returns, forfeits and rewards every stake position.
//! Arguments flagged often enough get their author punished.
//!
//! This crate handles:
//! - Claim registry and feeds
//! - Backings with period/amount weighted interest and maturity
//! - Challenges and the validation game state machine
//! - Token votes and implicit stake votes
//! - Settlement and reward distribution
//! - Slashing with threshold punishment
//! - The block tick over the game and backing expiry queues
//! - Message handling and JSON queries
//!
//! All state lives in a [`tru_store::KvStore`]. Operations run on a
//! [`Session`]; the [`Ledger`] wraps each of them in a write batch.

pub mod backing;
pub mod bank;
pub mod challenge;
pub mod claim;
pub mod codec;
pub mod error;
pub mod keys;
pub mod ledger;
pub mod msg;
pub mod query;
pub mod queue;
pub mod registry;
pub mod session;
pub mod settlement;
pub mod slashing;
pub mod tick;
pub mod vote;

pub use backing::{Backing, Maturity};
pub use bank::StoreBank;
pub use challenge::{Challenge, ValidationGame};
pub use claim::{Claim, FeedFilter, Outcome};
pub use error::{ErrorCategory, GameError};
pub use ledger::Ledger;
pub use msg::{Msg, Tag, TxResult};
pub use query::Querier;
pub use registry::StoreRegistry;
pub use session::{Services, Session};
pub use settlement::{Payout, PayoutKind, SettlementPlan, SettlementRecord, Tally};
pub use slashing::{PunishmentKind, PunishmentResult, Slash, SlashOutcome, SlashReason, SlashType};
pub use tick::{GameClose, TickReport};
pub use vote::{TokenVote, Vote, VoteKind, VoteReceipt};
