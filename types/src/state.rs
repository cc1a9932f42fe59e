//! Lifecycle enums for claims and validation games.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The lifecycle state of a claim.
///
/// States only move forward: `Created → Challenged → {Confirmed, Rejected, Expired}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClaimState {
    /// Submitted; may be backed or challenged.
    Created,
    /// A validation game is attached.
    Challenged,
    /// The validation game closed in favour of the claim.
    Confirmed,
    /// The validation game closed against the claim.
    Rejected,
    /// The challenge never gathered enough stake before its deadline.
    Expired,
}

impl ClaimState {
    /// Whether stakes (backings and challenges) are still accepted.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Created | Self::Challenged)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Confirmed | Self::Rejected | Self::Expired)
    }

    /// Whether `self → next` is a legal forward transition.
    pub fn can_transition_to(&self, next: ClaimState) -> bool {
        matches!(
            (self, next),
            (Self::Created, Self::Challenged)
                | (Self::Challenged, Self::Confirmed)
                | (Self::Challenged, Self::Rejected)
                | (Self::Challenged, Self::Expired)
        )
    }
}

impl fmt::Display for ClaimState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Created => "created",
            Self::Challenged => "challenged",
            Self::Confirmed => "confirmed",
            Self::Rejected => "rejected",
            Self::Expired => "expired",
        };
        f.write_str(s)
    }
}

/// The state of a validation game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameState {
    /// Challenge stake or participation below the start threshold.
    Pending,
    /// Voting window active.
    Open,
    /// Closed; the claim was confirmed.
    Confirmed,
    /// Closed; the claim was rejected.
    Rejected,
    /// Closed without ever starting; challenge stakes were refunded.
    Expired,
}

impl GameState {
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Confirmed | Self::Rejected | Self::Expired)
    }

    pub fn started(&self) -> bool {
        matches!(self, Self::Open | Self::Confirmed | Self::Rejected)
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Open => "open",
            Self::Confirmed => "confirmed",
            Self::Rejected => "rejected",
            Self::Expired => "expired",
        };
        f.write_str(s)
    }
}
