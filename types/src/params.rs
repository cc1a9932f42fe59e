//! Ledger parameters: every tunable value the validation game reads.
//!
//! Rates and weights are integer basis points (10_000 = 100%) so that every
//! node computes identical results. Durations are whole seconds.

use serde::{Deserialize, Serialize};
use thiserror::Error;

const DAY_SECS: u64 = 24 * 3600;

/// Basis-point denominator (100%).
pub const BPS_DENOMINATOR: u32 = 10_000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParamsError {
    #[error("stake denomination must not be empty")]
    EmptyStakeDenom,

    #[error("claim length bounds are inverted: min {min} > max {max}")]
    ClaimLengthBounds { min: usize, max: usize },

    #[error("backing weights must sum to {BPS_DENOMINATOR} bps, got {0}")]
    WeightSum(u32),

    #[error("backing period bounds are invalid: min {min}s, max {max}s")]
    PeriodBounds { min: u64, max: u64 },

    #[error("interest rate bounds are invalid: min {min} bps, max {max} bps")]
    RateBounds { min: u32, max: u32 },

    #[error("max_amount must be non-zero")]
    ZeroMaxAmount,

    #[error("min_slash_count must be at least 1")]
    ZeroSlashCount,
}

/// All ledger parameters, grouped by the component that reads them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerParams {
    /// Denomination every stake (backing, challenge, token vote) is made in.
    pub stake_denom: String,
    pub claim: ClaimParams,
    pub backing: BackingParams,
    pub challenge: ChallengeParams,
    pub game: GameParams,
    pub voting: VotingParams,
    pub slashing: SlashingParams,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClaimParams {
    /// Minimum body length in Unicode scalar values.
    pub min_claim_length: usize,
    /// Maximum body length in Unicode scalar values.
    pub max_claim_length: usize,
}

/// Interest model for backings.
///
/// `rate = max_interest_rate × (amount_weight × amount/max_amount + period_weight × period/max_period)`,
/// clamped to `[min_interest_rate, max_interest_rate]`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackingParams {
    pub amount_weight_bps: u32,
    pub period_weight_bps: u32,
    pub min_period_secs: u64,
    pub max_period_secs: u64,
    pub min_interest_rate_bps: u32,
    pub max_interest_rate_bps: u32,
    /// Principal at which the amount factor saturates at 1.
    pub max_amount: u128,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChallengeParams {
    /// Smallest single challenge stake accepted.
    pub min_stake: u128,
    /// Absolute floor on the challenge pool needed to open voting.
    pub min_pool: u128,
    /// Challenge pool needed to open voting, relative to the claim's total backing.
    pub backing_ratio_bps: u32,
    /// Distinct challengers needed to open voting.
    pub min_challengers: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameParams {
    /// Lifetime of a validation game, counted from the first challenge.
    pub expire_duration_secs: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VotingParams {
    /// Smallest token vote stake accepted.
    pub min_stake: u128,
    /// Number of token votes that closes a game early; 0 disables early close.
    pub close_quorum: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlashingParams {
    /// Slash count on an argument that triggers punishment of its author.
    pub min_slash_count: u32,
    /// Stake-denominated penalty taken from the author, capped at their balance.
    pub penalty: u128,
    /// Stake-denominated reward paid to each slasher on punishment.
    pub curator_reward: u128,
    pub jail_duration_secs: u64,
    pub max_detailed_reason_length: usize,
}

impl Default for LedgerParams {
    fn default() -> Self {
        Self {
            stake_denom: "trusteak".to_string(),
            claim: ClaimParams::default(),
            backing: BackingParams::default(),
            challenge: ChallengeParams::default(),
            game: GameParams::default(),
            voting: VotingParams::default(),
            slashing: SlashingParams::default(),
        }
    }
}

impl Default for ClaimParams {
    fn default() -> Self {
        Self {
            min_claim_length: 25,
            max_claim_length: 350,
        }
    }
}

impl Default for BackingParams {
    fn default() -> Self {
        Self {
            amount_weight_bps: 3_330, // 33.3%
            period_weight_bps: 6_670, // 66.7%
            min_period_secs: 3 * DAY_SECS,
            max_period_secs: 90 * DAY_SECS,
            min_interest_rate_bps: 0,
            max_interest_rate_bps: 1_000, // 10%
            max_amount: 1_000_000_000_000_000,
        }
    }
}

impl Default for ChallengeParams {
    fn default() -> Self {
        Self {
            min_stake: 10,
            min_pool: 10,
            backing_ratio_bps: BPS_DENOMINATOR,
            min_challengers: 1,
        }
    }
}

impl Default for GameParams {
    fn default() -> Self {
        Self {
            expire_duration_secs: DAY_SECS,
        }
    }
}

impl Default for VotingParams {
    fn default() -> Self {
        Self {
            min_stake: 1,
            close_quorum: 0,
        }
    }
}

impl Default for SlashingParams {
    fn default() -> Self {
        Self {
            min_slash_count: 5,
            penalty: 50,
            curator_reward: 5,
            jail_duration_secs: 7 * DAY_SECS,
            max_detailed_reason_length: 140,
        }
    }
}

impl LedgerParams {
    /// Check cross-field constraints the type system cannot express.
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.stake_denom.is_empty() {
            return Err(ParamsError::EmptyStakeDenom);
        }
        if self.claim.min_claim_length > self.claim.max_claim_length {
            return Err(ParamsError::ClaimLengthBounds {
                min: self.claim.min_claim_length,
                max: self.claim.max_claim_length,
            });
        }
        let b = &self.backing;
        let weights = b.amount_weight_bps.saturating_add(b.period_weight_bps);
        if weights != BPS_DENOMINATOR {
            return Err(ParamsError::WeightSum(weights));
        }
        if b.max_period_secs == 0 || b.min_period_secs > b.max_period_secs {
            return Err(ParamsError::PeriodBounds {
                min: b.min_period_secs,
                max: b.max_period_secs,
            });
        }
        if b.min_interest_rate_bps > b.max_interest_rate_bps {
            return Err(ParamsError::RateBounds {
                min: b.min_interest_rate_bps,
                max: b.max_interest_rate_bps,
            });
        }
        if b.max_amount == 0 {
            return Err(ParamsError::ZeroMaxAmount);
        }
        if self.slashing.min_slash_count == 0 {
            return Err(ParamsError::ZeroSlashCount);
        }
        Ok(())
    }
}
