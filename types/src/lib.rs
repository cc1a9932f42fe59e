//! Fundamental types for the TruStory claim ledger.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! addresses, coins, timestamps, record identifiers, lifecycle states and the
//! governable ledger parameters.

pub mod address;
pub mod amount;
pub mod ids;
pub mod params;
pub mod state;
pub mod time;

pub use address::{AddressError, UserAddress};
pub use amount::Coin;
pub use ids::{
    ArgumentId, BackingId, CategoryId, ChallengeId, ClaimId, GameId, SlashId, VoteId,
};
pub use params::{
    BackingParams, ChallengeParams, ClaimParams, GameParams, LedgerParams, ParamsError,
    SlashingParams, VotingParams, BPS_DENOMINATOR,
};
pub use state::{ClaimState, GameState};
pub use time::Timestamp;
