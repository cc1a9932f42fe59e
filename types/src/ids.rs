//! Record identifiers.
//!
//! Every record kind has its own monotonic counter, starting at 1. Zero is
//! never assigned.

pub type ClaimId = u64;
pub type BackingId = u64;
pub type ChallengeId = u64;
pub type GameId = u64;
pub type VoteId = u64;
pub type SlashId = u64;
pub type ArgumentId = u64;
pub type CategoryId = u64;
