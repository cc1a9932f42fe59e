//! Settlement engine: tally a closed game and distribute its stakes.
//!
//! Settlement is split in two. [`plan_settlement`] is a pure function of
//! the vote set that decides every transfer; [`Session::settle_game`]
//! checks the game, applies the plan and records it. Nothing is credited
//! until the whole plan has been computed.
//!
//! Confirmed: false backings put their interest into the pool and get their
//! principal back, false challenges and false token votes forfeit their
//! stake, true token voters get their stake back plus an equal share of the
//! pool in the category denomination, true backings are left to mature.
//! Rejected mirrors it: true backings forfeit their principal, every
//! challenge is returned, false token voters win and false backings are
//! left to mature.

use serde::{Deserialize, Serialize};

use tru_types::{BackingId, ClaimId, Coin, GameId, GameState, Timestamp, UserAddress};

use crate::claim::Outcome;
use crate::keys;
use crate::session::Session;
use crate::vote::{Vote, VoteKind};
use crate::GameError;

/// Stake weight on each side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub true_weight: u128,
    pub false_weight: u128,
}

impl Tally {
    /// Ties confirm the claim.
    pub fn outcome(&self) -> Outcome {
        if self.true_weight >= self.false_weight {
            Outcome::Confirmed
        } else {
            Outcome::Rejected
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoutKind {
    /// Principal or stake handed back.
    Return,
    /// Share of the reward pool.
    Reward,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    pub address: UserAddress,
    pub coin: Coin,
    pub kind: PayoutKind,
    pub source: VoteKind,
}

/// Every transfer a settlement will make, computed up front.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementPlan {
    pub outcome: Outcome,
    pub tally: Tally,
    /// Forfeited value, in the stake denomination.
    pub pool: Coin,
    /// Reward per winning token voter, in the category denomination.
    pub share: Coin,
    pub winners: u32,
    /// `pool - share·winners`; left in the pool.
    pub remainder: Coin,
    pub payouts: Vec<Payout>,
    /// Backings returned or forfeited here; maturity must skip them.
    pub settled_backings: Vec<BackingId>,
}

/// Audit record persisted for every settled game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementRecord {
    pub game_id: GameId,
    pub claim_id: ClaimId,
    pub outcome: Outcome,
    pub tally: Tally,
    pub pool: Coin,
    pub share: Coin,
    pub winners: u32,
    pub remainder: Coin,
    pub payouts: Vec<Payout>,
    pub settled_at: Timestamp,
}

pub fn tally(votes: &[Vote]) -> Result<Tally, GameError> {
    let mut tally = Tally {
        true_weight: 0,
        false_weight: 0,
    };
    for vote in votes {
        let side = if vote.choice() {
            &mut tally.true_weight
        } else {
            &mut tally.false_weight
        };
        *side = side
            .checked_add(vote.stake().amount)
            .ok_or(GameError::Overflow("tally"))?;
    }
    Ok(tally)
}

/// `floor(pool / winners)`, zero when nobody won.
pub fn reward_share(pool: u128, winners: u32) -> u128 {
    pool.checked_div(u128::from(winners)).unwrap_or(0)
}

pub fn plan_settlement(
    votes: &[Vote],
    stake_denom: &str,
    reward_denom: &str,
) -> Result<SettlementPlan, GameError> {
    let tally = tally(votes)?;
    let outcome = tally.outcome();
    let mut pool: u128 = 0;
    let mut payouts = Vec::new();
    let mut settled_backings = Vec::new();
    let mut winners: Vec<&UserAddress> = Vec::new();

    let mut add_to_pool = |amount: u128| -> Result<(), GameError> {
        pool = pool.checked_add(amount).ok_or(GameError::Overflow("reward pool"))?;
        Ok(())
    };
    let give_back = |vote: &Vote| Payout {
        address: vote.voter().clone(),
        coin: vote.stake().clone(),
        kind: PayoutKind::Return,
        source: vote.kind(),
    };

    for vote in votes {
        let won = vote.choice() == (outcome == Outcome::Confirmed);
        match (vote, outcome, won) {
            // Winning backings keep their position and mature normally.
            (Vote::Backing { .. }, _, true) => {}
            (Vote::Backing { backing, .. }, Outcome::Confirmed, false) => {
                add_to_pool(backing.interest.amount)?;
                payouts.push(give_back(vote));
                settled_backings.push(backing.id);
            }
            (Vote::Backing { backing, .. }, Outcome::Rejected, false) => {
                add_to_pool(backing.principal.amount)?;
                settled_backings.push(backing.id);
            }
            (Vote::Challenge { .. }, Outcome::Rejected, _) | (Vote::Challenge { .. }, _, true) => {
                payouts.push(give_back(vote));
            }
            (Vote::Challenge { challenge, .. }, Outcome::Confirmed, false) => {
                add_to_pool(challenge.amount.amount)?;
            }
            (Vote::Token { token }, _, true) => {
                payouts.push(give_back(vote));
                winners.push(&token.creator);
            }
            (Vote::Token { token }, _, false) => {
                add_to_pool(token.amount.amount)?;
            }
        }
    }

    let winner_count = u32::try_from(winners.len()).map_err(|_| GameError::Overflow("winners"))?;
    let share = reward_share(pool, winner_count);
    let distributed = share
        .checked_mul(u128::from(winner_count))
        .ok_or(GameError::Overflow("reward share"))?;
    if share > 0 {
        for address in winners {
            payouts.push(Payout {
                address: address.clone(),
                coin: Coin::new(reward_denom, share),
                kind: PayoutKind::Reward,
                source: VoteKind::Token,
            });
        }
    }

    Ok(SettlementPlan {
        outcome,
        tally,
        pool: Coin::new(stake_denom, pool),
        share: Coin::new(reward_denom, share),
        winners: winner_count,
        remainder: Coin::new(stake_denom, pool - distributed),
        payouts,
        settled_backings,
    })
}

impl Session<'_> {
    /// Close an open game and distribute its stakes.
    ///
    /// Backings that matured while the game was running hold no stake any
    /// more and take no part in the tally. A closed game is rejected with [`GameError::GameClosed`], so a game
    /// is never paid twice.
    pub(crate) fn settle_game(
        &self,
        game_id: GameId,
        now: Timestamp,
    ) -> Result<SettlementRecord, GameError> {
        let mut game = self.game(game_id)?;
        if game.is_closed() {
            return Err(GameError::GameClosed(game_id));
        }
        if !game.started() {
            return Err(GameError::GameNotStarted(game_id));
        }
        let claim = self.claim(game.claim_id)?;
        let reward_denom = self.reward_denom(&claim)?;
        let votes = self.settleable_votes(game_id)?;
        let plan = plan_settlement(&votes, &self.params.stake_denom, &reward_denom)?;

        for payout in &plan.payouts {
            self.credit(&payout.address, &payout.coin)?;
        }
        for backing_id in &plan.settled_backings {
            self.mark_backing_settled(*backing_id)?;
        }

        game.state = match plan.outcome {
            Outcome::Confirmed => GameState::Confirmed,
            Outcome::Rejected => GameState::Rejected,
        };
        game.ended_at = Some(now);
        self.save_game(&game)?;
        self.finish(claim.id, plan.outcome, now)?;

        let record = SettlementRecord {
            game_id,
            claim_id: claim.id,
            outcome: plan.outcome,
            tally: plan.tally,
            pool: plan.pool,
            share: plan.share,
            winners: plan.winners,
            remainder: plan.remainder,
            payouts: plan.payouts,
            settled_at: now,
        };
        self.save(&keys::settlement(game_id), &record)?;

        if !record.remainder.is_zero() {
            tracing::warn!(
                game_id,
                remainder = %record.remainder,
                winners = record.winners,
                "reward pool remainder left undistributed"
            );
        }
        tracing::info!(
            game_id,
            claim_id = claim.id,
            outcome = ?record.outcome,
            true_weight = record.tally.true_weight,
            false_weight = record.tally.false_weight,
            pool = %record.pool,
            share = %record.share,
            "settled validation game"
        );
        Ok(record)
    }

    /// The vote set of `game_id` minus backings already paid out at maturity.
    fn settleable_votes(&self, game_id: GameId) -> Result<Vec<Vote>, GameError> {
        let mut votes = Vec::new();
        for vote in self.game_votes(game_id)? {
            if let Vote::Backing { backing, .. } = &vote {
                if self.is_backing_settled(backing.id)? {
                    tracing::debug!(game_id, backing_id = backing.id, "matured backing left out of the tally");
                    continue;
                }
            }
            votes.push(vote);
        }
        Ok(votes)
    }

    pub fn settlement(&self, game_id: GameId) -> Result<Option<SettlementRecord>, GameError> {
        self.load(&keys::settlement(game_id))
    }
}
