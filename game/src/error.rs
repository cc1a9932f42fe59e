//! Ledger errors.
//!
//! Every variant carries a stable numeric code. Codes are grouped in
//! reserved ranges per module (claim 1100s, backing 1200s, challenge 1300s,
//! voting 1400s, slashing 1500s, ledger 1600s, query 1700s) and each range
//! maps to a codespace reported with rejected transactions.

use serde::Serialize;
use thiserror::Error;

use tru_store::{BankError, StoreError};
use tru_types::{
    AddressError, ArgumentId, BackingId, CategoryId, ChallengeId, ClaimId, ClaimState, GameId,
    ParamsError, SlashId, Timestamp, UserAddress, VoteId,
};

/// Coarse classification of a failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Bad input, rejected before any mutation.
    Validation,
    /// Unknown id.
    NotFound,
    /// Corrupted or inconsistent state; halts the operation.
    Invariant,
    /// A collaborator (store, bank) failed; propagated unchanged.
    Downstream,
}

#[derive(Debug, Error)]
pub enum GameError {
    // ── Claim ───────────────────────────────────────────────────────────
    #[error("claim body too short: {len} characters, minimum {min}")]
    ClaimTooShort { len: usize, min: usize },

    #[error("claim body too long: {len} characters, maximum {max}")]
    ClaimTooLong { len: usize, max: usize },

    #[error("claim {0} not found")]
    ClaimNotFound(ClaimId),

    #[error("category {0} not found")]
    CategoryNotFound(CategoryId),

    #[error("account {0} is jailed")]
    CreatorJailed(UserAddress),

    #[error("claim {id} is {state} and no longer accepts stakes")]
    ClaimNotOpen { id: ClaimId, state: ClaimState },

    #[error("claim {id} cannot move from {from} to {to}")]
    IllegalTransition {
        id: ClaimId,
        from: ClaimState,
        to: ClaimState,
    },

    // ── Backing ─────────────────────────────────────────────────────────
    #[error("backing period {period}s outside [{min}s, {max}s]")]
    InvalidPeriod { period: u64, min: u64, max: u64 },

    #[error("wrong denomination: expected {expected}, got {got}")]
    WrongDenom { expected: String, got: String },

    #[error("amount must be non-zero")]
    ZeroAmount,

    #[error("{creator} already backs claim {claim_id}")]
    DuplicateBacking {
        claim_id: ClaimId,
        creator: UserAddress,
    },

    #[error("backing {0} not found")]
    BackingNotFound(BackingId),

    #[error("{creator} challenged claim {claim_id} and cannot back it")]
    ChallengerCannotBack {
        claim_id: ClaimId,
        creator: UserAddress,
    },

    // ── Challenge ───────────────────────────────────────────────────────
    #[error("challenge stake {got} below minimum {min}")]
    ChallengeStakeTooLow { min: u128, got: u128 },

    #[error("{creator} already challenged in game {game_id}")]
    DuplicateChallenge {
        game_id: GameId,
        creator: UserAddress,
    },

    #[error("{creator} backed claim {claim_id} and cannot challenge it")]
    BackerCannotChallenge {
        claim_id: ClaimId,
        creator: UserAddress,
    },

    #[error("game {0} not found")]
    GameNotFound(GameId),

    #[error("challenge {0} not found")]
    ChallengeNotFound(ChallengeId),

    #[error("game {0} never started and cannot be settled")]
    GameNotStarted(GameId),

    #[error("game {game_id} runs until {expires_at} and has not reached quorum")]
    GameStillRunning {
        game_id: GameId,
        expires_at: Timestamp,
    },

    // ── Voting ──────────────────────────────────────────────────────────
    #[error("voting has not started for game {0}")]
    VotingNotStarted(GameId),

    #[error("{voter} already voted in game {game_id}")]
    DuplicateVote { game_id: GameId, voter: UserAddress },

    #[error("game {0} is already closed")]
    GameClosed(GameId),

    #[error("voting window of game {game_id} closed at {expires_at}")]
    VotingWindowClosed {
        game_id: GameId,
        expires_at: Timestamp,
    },

    #[error("invalid vote kind: {0}")]
    InvalidVoteKind(String),

    #[error("{voter} holds a stake in game {game_id}; change the stake vote instead")]
    StakeholderMustChangeVote { game_id: GameId, voter: UserAddress },

    #[error("{voter} holds no backing or challenge in game {game_id}")]
    NoStakeToChange { game_id: GameId, voter: UserAddress },

    #[error("vote stake {got} below minimum {min}")]
    VoteStakeTooLow { min: u128, got: u128 },

    #[error("vote {0} not found")]
    VoteNotFound(VoteId),

    #[error("{creator} cast a token vote in game {game_id} and cannot stake on the claim")]
    VoterCannotStake {
        game_id: GameId,
        creator: UserAddress,
    },

    // ── Slashing ────────────────────────────────────────────────────────
    #[error("argument {0} not found")]
    ArgumentNotFound(ArgumentId),

    #[error("{0} cannot slash their own argument")]
    SelfSlash(UserAddress),

    #[error("{creator} already slashed argument {argument_id}")]
    DuplicateSlash {
        argument_id: ArgumentId,
        creator: UserAddress,
    },

    #[error("slash reason 'other' requires a detailed reason")]
    MissingDetailedReason,

    #[error("detailed reason too long: {len} characters, maximum {max}")]
    DetailedReasonTooLong { len: usize, max: usize },

    #[error("slash {0} not found")]
    SlashNotFound(SlashId),

    // ── Ledger ──────────────────────────────────────────────────────────
    #[error("queued game {0} does not exist")]
    QueuedGameMissing(GameId),

    #[error("queued backing {0} does not exist")]
    QueuedBackingMissing(BackingId),

    #[error("corrupted record: {0}")]
    Corrupted(String),

    #[error("arithmetic overflow in {0}")]
    Overflow(&'static str),

    #[error("invalid parameters: {0}")]
    InvalidParams(#[from] ParamsError),

    #[error("invalid address: {0}")]
    InvalidAddress(#[from] AddressError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Bank(#[from] BankError),

    // ── Query ───────────────────────────────────────────────────────────
    #[error("Incorrectly formatted request data - {0}")]
    InvalidQuery(String),

    #[error("unknown query path: {0}")]
    UnknownQuery(String),
}

impl GameError {
    /// Stable numeric code.
    pub fn code(&self) -> u32 {
        use GameError::*;
        match self {
            ClaimTooShort { .. } => 1101,
            ClaimTooLong { .. } => 1102,
            ClaimNotFound(_) => 1103,
            CategoryNotFound(_) => 1104,
            CreatorJailed(_) => 1105,
            ClaimNotOpen { .. } => 1106,
            IllegalTransition { .. } => 1107,

            InvalidPeriod { .. } => 1201,
            WrongDenom { .. } => 1202,
            ZeroAmount => 1203,
            DuplicateBacking { .. } => 1204,
            BackingNotFound(_) => 1205,
            ChallengerCannotBack { .. } => 1206,

            ChallengeStakeTooLow { .. } => 1301,
            DuplicateChallenge { .. } => 1302,
            BackerCannotChallenge { .. } => 1303,
            GameNotFound(_) => 1304,
            ChallengeNotFound(_) => 1305,
            GameNotStarted(_) => 1306,
            GameStillRunning { .. } => 1307,

            VotingNotStarted(_) => 1401,
            DuplicateVote { .. } => 1402,
            GameClosed(_) => 1403,
            VotingWindowClosed { .. } => 1404,
            InvalidVoteKind(_) => 1405,
            StakeholderMustChangeVote { .. } => 1406,
            NoStakeToChange { .. } => 1407,
            VoteStakeTooLow { .. } => 1408,
            VoteNotFound(_) => 1409,
            VoterCannotStake { .. } => 1410,

            ArgumentNotFound(_) => 1501,
            SelfSlash(_) => 1502,
            DuplicateSlash { .. } => 1503,
            MissingDetailedReason => 1504,
            DetailedReasonTooLong { .. } => 1505,
            SlashNotFound(_) => 1506,

            QueuedGameMissing(_) => 1601,
            QueuedBackingMissing(_) => 1602,
            Corrupted(_) => 1603,
            Overflow(_) => 1604,
            InvalidParams(_) => 1605,
            InvalidAddress(_) => 1606,
            Store(_) => 1607,
            Bank(_) => 1608,

            InvalidQuery(_) => 1701,
            UnknownQuery(_) => 1702,
        }
    }

    /// Module the code belongs to.
    pub fn codespace(&self) -> &'static str {
        match self.code() / 100 {
            11 => "claim",
            12 => "backing",
            13 => "challenge",
            14 => "voting",
            15 => "slashing",
            16 => "ledger",
            _ => "query",
        }
    }

    pub fn category(&self) -> ErrorCategory {
        use GameError::*;
        match self {
            ClaimNotFound(_) | CategoryNotFound(_) | BackingNotFound(_) | GameNotFound(_)
            | ChallengeNotFound(_) | VoteNotFound(_) | ArgumentNotFound(_) | SlashNotFound(_) => {
                ErrorCategory::NotFound
            }
            IllegalTransition { .. }
            | QueuedGameMissing(_)
            | QueuedBackingMissing(_)
            | Corrupted(_)
            | Overflow(_) => ErrorCategory::Invariant,
            Store(_) | Bank(_) => ErrorCategory::Downstream,
            _ => ErrorCategory::Validation,
        }
    }
}
