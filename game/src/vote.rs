//! Token vote tally.
//!
//! Backings count as implicit TRUE votes and challenges as implicit FALSE
//! votes unless their owner recasts them; token holders without a stake in
//! the claim cast explicit, stake-weighted votes while the game is open.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use tru_types::{Coin, GameId, GameState, Timestamp, UserAddress, VoteId};

use crate::backing::Backing;
use crate::challenge::{Challenge, ValidationGame};
use crate::keys;
use crate::session::Session;
use crate::settlement::SettlementRecord;
use crate::GameError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenVote {
    pub id: VoteId,
    pub game_id: GameId,
    pub creator: UserAddress,
    pub amount: Coin,
    /// `true` confirms the claim.
    pub vote: bool,
    pub created_at: Timestamp,
}

/// Discriminant of [`Vote`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteKind {
    Backing,
    Challenge,
    Token,
}

impl VoteKind {
    pub const ALL: [VoteKind; 3] = [VoteKind::Backing, VoteKind::Challenge, VoteKind::Token];

    pub fn tag(self) -> u8 {
        match self {
            VoteKind::Backing => 0,
            VoteKind::Challenge => 1,
            VoteKind::Token => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            VoteKind::Backing => "backing",
            VoteKind::Challenge => "challenge",
            VoteKind::Token => "token",
        }
    }
}

impl fmt::Display for VoteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<u8> for VoteKind {
    type Error = GameError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        VoteKind::ALL
            .into_iter()
            .find(|kind| kind.tag() == tag)
            .ok_or_else(|| GameError::InvalidVoteKind(format!("tag {tag}")))
    }
}

impl FromStr for VoteKind {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VoteKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| GameError::InvalidVoteKind(s.to_string()))
    }
}

/// A stake position taking part in a tally, with its resolved choice.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Vote {
    Backing { backing: Backing, choice: bool },
    Challenge { challenge: Challenge, choice: bool },
    Token { token: TokenVote },
}

impl Vote {
    pub fn kind(&self) -> VoteKind {
        match self {
            Vote::Backing { .. } => VoteKind::Backing,
            Vote::Challenge { .. } => VoteKind::Challenge,
            Vote::Token { .. } => VoteKind::Token,
        }
    }

    pub fn choice(&self) -> bool {
        match self {
            Vote::Backing { choice, .. } | Vote::Challenge { choice, .. } => *choice,
            Vote::Token { token } => token.vote,
        }
    }

    pub fn voter(&self) -> &UserAddress {
        match self {
            Vote::Backing { backing, .. } => &backing.creator,
            Vote::Challenge { challenge, .. } => &challenge.creator,
            Vote::Token { token } => &token.creator,
        }
    }

    /// Stake weight: backing principal, challenge amount or token stake.
    pub fn stake(&self) -> &Coin {
        match self {
            Vote::Backing { backing, .. } => &backing.principal,
            Vote::Challenge { challenge, .. } => &challenge.amount,
            Vote::Token { token } => &token.amount,
        }
    }
}

/// Result of a token vote; `settlement` is set when the vote closed the game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteReceipt {
    pub vote: TokenVote,
    pub settlement: Option<SettlementRecord>,
}

fn encode_choice(choice: bool) -> [u8; 1] {
    [u8::from(choice)]
}

fn decode_choice(bytes: &[u8]) -> Result<bool, GameError> {
    match bytes {
        [0] => Ok(false),
        [1] => Ok(true),
        other => Err(GameError::Corrupted(format!("vote choice {other:?}"))),
    }
}

impl Session<'_> {
    /// Game that currently accepts votes.
    fn voting_game(&self, game_id: GameId, now: Timestamp) -> Result<ValidationGame, GameError> {
        let game = self.game(game_id)?;
        match game.state {
            GameState::Pending => return Err(GameError::VotingNotStarted(game_id)),
            state if state.is_closed() => return Err(GameError::GameClosed(game_id)),
            _ => {}
        }
        if game.is_expired(now) {
            return Err(GameError::VotingWindowClosed {
                game_id,
                expires_at: game.expires_at,
            });
        }
        Ok(game)
    }

    fn holds_stake(&self, game: &ValidationGame, user: &UserAddress) -> Result<bool, GameError> {
        Ok(self.store.has(&keys::claim_backing(game.claim_id, user))?
            || self.store.has(&keys::game_challenge(game.id, user))?)
    }

    /// Cast an explicit vote with `stake`.
    ///
    /// Closes and settles the game when the configured quorum is reached.
    pub fn cast_token_vote(
        &self,
        game_id: GameId,
        voter: &UserAddress,
        choice: bool,
        stake: &Coin,
        now: Timestamp,
    ) -> Result<VoteReceipt, GameError> {
        let mut game = self.voting_game(game_id, now)?;
        self.ensure_stake_denom(stake)?;
        let min = self.params.voting.min_stake;
        if stake.amount < min {
            return Err(GameError::VoteStakeTooLow {
                min,
                got: stake.amount,
            });
        }
        self.ensure_not_jailed(voter, now)?;
        if self.store.has(&keys::game_vote(game_id, voter))? {
            return Err(GameError::DuplicateVote {
                game_id,
                voter: voter.clone(),
            });
        }
        if self.holds_stake(&game, voter)? {
            return Err(GameError::StakeholderMustChangeVote {
                game_id,
                voter: voter.clone(),
            });
        }

        self.debit(voter, stake)?;
        let id = self.next_id(keys::VOTE_COUNTER)?;
        let vote = TokenVote {
            id,
            game_id,
            creator: voter.clone(),
            amount: stake.clone(),
            vote: choice,
            created_at: now,
        };
        self.save(&keys::vote(id), &vote)?;
        self.save_id(&keys::game_vote(game_id, voter), id)?;
        game.token_vote_count += 1;
        self.save_game(&game)?;

        tracing::info!(
            vote_id = id,
            game_id,
            voter = %voter,
            choice,
            amount = %stake,
            "cast token vote"
        );

        let quorum = self.params.voting.close_quorum;
        let settlement = if quorum > 0 && game.token_vote_count >= quorum {
            tracing::info!(game_id, votes = game.token_vote_count, "vote quorum reached");
            Some(self.settle_game(game_id, now)?)
        } else {
            None
        };
        Ok(VoteReceipt { vote, settlement })
    }

    /// Override the implicit vote of the caller's backing or challenge.
    pub fn change_stake_vote(
        &self,
        game_id: GameId,
        user: &UserAddress,
        choice: bool,
        now: Timestamp,
    ) -> Result<Vote, GameError> {
        let game = self.voting_game(game_id, now)?;
        if !self.holds_stake(&game, user)? {
            return Err(GameError::NoStakeToChange {
                game_id,
                voter: user.clone(),
            });
        }
        self.store
            .put(&keys::game_recast(game_id, user), &encode_choice(choice))?;

        let vote = match self.backing_by_claim_and_creator(game.claim_id, user)? {
            Some(backing) => Vote::Backing { backing, choice },
            None => {
                let challenge = self
                    .challenge_by_game_and_creator(game_id, user)?
                    .ok_or_else(|| GameError::NoStakeToChange {
                        game_id,
                        voter: user.clone(),
                    })?;
                Vote::Challenge { challenge, choice }
            }
        };
        tracing::info!(game_id, user = %user, choice, kind = %vote.kind(), "changed stake vote");
        Ok(vote)
    }

    fn recast_choice(&self, game_id: GameId, user: &UserAddress) -> Result<Option<bool>, GameError> {
        self.store
            .get(&keys::game_recast(game_id, user))?
            .map(|bytes| decode_choice(&bytes))
            .transpose()
    }

    pub fn token_vote(&self, id: VoteId) -> Result<TokenVote, GameError> {
        self.load(&keys::vote(id))?.ok_or(GameError::VoteNotFound(id))
    }

    pub fn game_token_votes(&self, game_id: GameId) -> Result<Vec<TokenVote>, GameError> {
        self.ids_under(&keys::game_votes_prefix(game_id))?
            .into_iter()
            .map(|id| self.token_vote(id))
            .collect()
    }

    /// The full vote set of a game: backings, challenges, then token votes.
    pub fn game_votes(&self, game_id: GameId) -> Result<Vec<Vote>, GameError> {
        let game = self.game(game_id)?;
        let mut votes = Vec::new();
        for backing in self.claim_backings(game.claim_id)? {
            let choice = self.recast_choice(game_id, &backing.creator)?.unwrap_or(true);
            votes.push(Vote::Backing { backing, choice });
        }
        for challenge in self.game_challenges(game_id)? {
            let choice = self
                .recast_choice(game_id, &challenge.creator)?
                .unwrap_or(false);
            votes.push(Vote::Challenge { challenge, choice });
        }
        for token in self.game_token_votes(game_id)? {
            votes.push(Vote::Token { token });
        }
        Ok(votes)
    }
}
