//! Challenge game: adversarial stakes and the validation game they open.
//!
//! The first challenge on a claim creates its game in `Pending` and queues
//! it for expiry. Once the challenge pool and the number of challengers
//! reach the start threshold the game is `Open` and token holders may vote
//! until `expires_at`.

use serde::{Deserialize, Serialize};

use tru_types::{
    ChallengeId, ClaimId, Coin, GameId, GameState, Timestamp, UserAddress, BPS_DENOMINATOR,
};

use crate::keys;
use crate::queue::GAME_QUEUE;
use crate::session::Session;
use crate::GameError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationGame {
    pub id: GameId,
    pub claim_id: ClaimId,
    /// Author of the first challenge.
    pub creator: UserAddress,
    pub state: GameState,
    pub challenge_pool: Coin,
    pub challenger_count: u32,
    pub token_vote_count: u32,
    pub created_at: Timestamp,
    pub started_at: Option<Timestamp>,
    /// Fixed at creation; the voting window is `[started_at, expires_at)`.
    pub expires_at: Timestamp,
    pub ended_at: Option<Timestamp>,
}

impl ValidationGame {
    pub fn started(&self) -> bool {
        self.state.started()
    }

    pub fn is_closed(&self) -> bool {
        self.state.is_closed()
    }

    pub fn is_expired(&self, now: Timestamp) -> bool {
        !self.expires_at.is_after(now)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    pub id: ChallengeId,
    pub game_id: GameId,
    pub claim_id: ClaimId,
    pub creator: UserAddress,
    pub amount: Coin,
    pub created_at: Timestamp,
}

impl Session<'_> {
    /// Stake `amount` against `claim_id`.
    pub fn create_challenge(
        &self,
        claim_id: ClaimId,
        amount: &Coin,
        creator: &UserAddress,
        now: Timestamp,
    ) -> Result<Challenge, GameError> {
        self.ensure_stake_denom(amount)?;
        let min = self.params.challenge.min_stake;
        if amount.amount < min {
            return Err(GameError::ChallengeStakeTooLow {
                min,
                got: amount.amount,
            });
        }
        let claim = self.open_claim(claim_id)?;
        self.ensure_not_jailed(creator, now)?;
        if self.store.has(&keys::claim_backing(claim_id, creator))? {
            return Err(GameError::BackerCannotChallenge {
                claim_id,
                creator: creator.clone(),
            });
        }

        let existing = match claim.game_id {
            Some(game_id) => {
                let game = self.game(game_id)?;
                if game.is_closed() {
                    return Err(GameError::GameClosed(game_id));
                }
                if game.is_expired(now) {
                    return Err(GameError::VotingWindowClosed {
                        game_id,
                        expires_at: game.expires_at,
                    });
                }
                if self.store.has(&keys::game_challenge(game_id, creator))? {
                    return Err(GameError::DuplicateChallenge {
                        game_id,
                        creator: creator.clone(),
                    });
                }
                if self.store.has(&keys::game_vote(game_id, creator))? {
                    return Err(GameError::VoterCannotStake {
                        game_id,
                        creator: creator.clone(),
                    });
                }
                Some(game)
            }
            None => None,
        };

        self.debit(creator, amount)?;
        let mut game = match existing {
            Some(game) => game,
            None => self.create_game(claim_id, creator, now)?,
        };

        let id = self.next_id(keys::CHALLENGE_COUNTER)?;
        let challenge = Challenge {
            id,
            game_id: game.id,
            claim_id,
            creator: creator.clone(),
            amount: amount.clone(),
            created_at: now,
        };
        self.save(&keys::challenge(id), &challenge)?;
        self.save_id(&keys::game_challenge(game.id, creator), id)?;
        let claim = self.add_challenge_stake(claim_id, amount, now)?;

        game.challenge_pool = game
            .challenge_pool
            .checked_add(amount)
            .ok_or(GameError::Overflow("challenge pool"))?;
        game.challenger_count += 1;
        if game.state == GameState::Pending && self.meets_start_threshold(&game, &claim.total_backed) {
            game.state = GameState::Open;
            game.started_at = Some(now);
            tracing::info!(
                game_id = game.id,
                claim_id,
                pool = %game.challenge_pool,
                challengers = game.challenger_count,
                remaining = %tru_utils::format_remaining(now, game.expires_at),
                "validation game started"
            );
        }
        self.save(&keys::game(game.id), &game)?;

        tracing::info!(
            challenge_id = id,
            game_id = game.id,
            claim_id,
            creator = %creator,
            amount = %amount,
            "created challenge"
        );
        Ok(challenge)
    }

    /// New Pending game for `claim_id`, queued for expiry.
    fn create_game(
        &self,
        claim_id: ClaimId,
        creator: &UserAddress,
        now: Timestamp,
    ) -> Result<ValidationGame, GameError> {
        let id = self.next_id(keys::GAME_COUNTER)?;
        let game = ValidationGame {
            id,
            claim_id,
            creator: creator.clone(),
            state: GameState::Pending,
            challenge_pool: Coin::zero(self.params.stake_denom.clone()),
            challenger_count: 0,
            token_vote_count: 0,
            created_at: now,
            started_at: None,
            expires_at: now.plus_secs(self.params.game.expire_duration_secs),
            ended_at: None,
        };
        self.save(&keys::game(id), &game)?;
        self.save_id(&keys::claim_game(claim_id), id)?;
        GAME_QUEUE.push(self.store, id)?;
        self.start_challenge(claim_id, id, now)?;

        tracing::info!(game_id = id, claim_id, expires_at = %game.expires_at, "created validation game");
        Ok(game)
    }

    /// `pool ≥ max(min_pool, ratio·total_backed)` and enough challengers.
    fn meets_start_threshold(&self, game: &ValidationGame, total_backed: &Coin) -> bool {
        let params = &self.params.challenge;
        let backed_share = total_backed
            .amount
            .saturating_mul(u128::from(params.backing_ratio_bps))
            / u128::from(BPS_DENOMINATOR);
        let required = params.min_pool.max(backed_share);
        game.challenge_pool.amount >= required && game.challenger_count >= params.min_challengers
    }

    pub fn game(&self, id: GameId) -> Result<ValidationGame, GameError> {
        self.load(&keys::game(id))?
            .ok_or(GameError::GameNotFound(id))
    }

    pub(crate) fn save_game(&self, game: &ValidationGame) -> Result<(), GameError> {
        self.save(&keys::game(game.id), game)
    }

    pub fn claim_game(&self, claim_id: ClaimId) -> Result<Option<ValidationGame>, GameError> {
        match self.load_id(&keys::claim_game(claim_id))? {
            Some(id) => self.game(id).map(Some),
            None => Ok(None),
        }
    }

    pub fn challenge(&self, id: ChallengeId) -> Result<Challenge, GameError> {
        self.load(&keys::challenge(id))?
            .ok_or(GameError::ChallengeNotFound(id))
    }

    /// Every challenge of `game_id`, found through the per-user index.
    pub fn game_challenges(&self, game_id: GameId) -> Result<Vec<Challenge>, GameError> {
        self.ids_under(&keys::game_challenges_prefix(game_id))?
            .into_iter()
            .map(|id| self.challenge(id))
            .collect()
    }

    pub fn challenge_by_game_and_creator(
        &self,
        game_id: GameId,
        creator: &UserAddress,
    ) -> Result<Option<Challenge>, GameError> {
        match self.load_id(&keys::game_challenge(game_id, creator))? {
            Some(id) => self.challenge(id).map(Some),
            None => Ok(None),
        }
    }

    /// Return every challenge stake of a game that never started.
    pub(crate) fn refund_challenges(&self, game_id: GameId) -> Result<Vec<Challenge>, GameError> {
        let challenges = self.game_challenges(game_id)?;
        for challenge in &challenges {
            self.credit(&challenge.creator, &challenge.amount)?;
            tracing::debug!(
                challenge_id = challenge.id,
                game_id,
                amount = %challenge.amount,
                "refunded challenge"
            );
        }
        Ok(challenges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Fixture, BODY, DAY};
    use tru_types::ClaimState;

    #[test]
    fn first_challenge_creates_and_queues_game() {
        let fx = Fixture::new();
        let s = fx.session();
        s.submit_claim(BODY, 1, &fx.alice, None, fx.t(0)).unwrap();

        let challenge = s.create_challenge(1, &fx.stake(5), &fx.carol, fx.t(10));
        assert!(matches!(
            challenge,
            Err(GameError::ChallengeStakeTooLow { min: 10, got: 5 })
        ));

        let challenge = s.create_challenge(1, &fx.stake(20), &fx.carol, fx.t(10)).unwrap();
        let game = s.game(challenge.game_id).unwrap();
        assert_eq!(game.expires_at, fx.t(10 + DAY));
        assert_eq!(GAME_QUEUE.ids(s.store()).unwrap(), vec![game.id]);

        let claim = s.claim(1).unwrap();
        assert_eq!(claim.state, ClaimState::Challenged);
        assert_eq!(claim.game_id, Some(game.id));
        assert_eq!(s.challenged_category_claims(1).unwrap().len(), 1);
    }

    #[test]
    fn game_opens_when_pool_covers_backing() {
        let fx = Fixture::new();
        let s = fx.session();
        s.submit_claim(BODY, 1, &fx.alice, None, fx.t(0)).unwrap();
        s.create_backing(1, &fx.stake(100), 10 * DAY, &fx.bob, fx.t(1))
            .unwrap();

        let first = s.create_challenge(1, &fx.stake(60), &fx.carol, fx.t(2)).unwrap();
        assert_eq!(s.game(first.game_id).unwrap().state, GameState::Pending);

        s.create_challenge(1, &fx.stake(40), &fx.dave, fx.t(3)).unwrap();
        let game = s.game(first.game_id).unwrap();
        assert_eq!(game.state, GameState::Open);
        assert_eq!(game.started_at, Some(fx.t(3)));
        assert_eq!(game.challenge_pool.amount, 100);
        assert_eq!(game.challenger_count, 2);
        assert_eq!(s.game_challenges(game.id).unwrap().len(), 2);
    }

    #[test]
    fn stake_sides_are_exclusive() {
        let fx = Fixture::new();
        let s = fx.session();
        s.submit_claim(BODY, 1, &fx.alice, None, fx.t(0)).unwrap();
        s.create_backing(1, &fx.stake(100), 10 * DAY, &fx.bob, fx.t(1))
            .unwrap();
        assert!(matches!(
            s.create_challenge(1, &fx.stake(20), &fx.bob, fx.t(2)),
            Err(GameError::BackerCannotChallenge { .. })
        ));

        s.create_challenge(1, &fx.stake(20), &fx.carol, fx.t(2)).unwrap();
        assert!(matches!(
            s.create_backing(1, &fx.stake(20), 10 * DAY, &fx.carol, fx.t(3)),
            Err(GameError::ChallengerCannotBack { .. })
        ));
        assert!(matches!(
            s.create_challenge(1, &fx.stake(20), &fx.carol, fx.t(3)),
            Err(GameError::DuplicateChallenge { .. })
        ));
    }

    #[test]
    fn token_voter_cannot_challenge_the_same_game() {
        let fx = Fixture::new();
        let s = fx.session();
        s.submit_claim(BODY, 1, &fx.alice, None, fx.t(0)).unwrap();
        let game_id = s
            .create_challenge(1, &fx.stake(20), &fx.carol, fx.t(1))
            .unwrap()
            .game_id;
        s.cast_token_vote(game_id, &fx.dave, true, &fx.stake(50), fx.t(2))
            .unwrap();

        assert!(matches!(
            s.create_challenge(1, &fx.stake(20), &fx.dave, fx.t(3)),
            Err(GameError::VoterCannotStake { .. })
        ));
        assert_eq!(s.challenge_by_game_and_creator(game_id, &fx.dave).unwrap(), None);
        assert_eq!(s.game(game_id).unwrap().challenger_count, 1);
    }

    #[test]
    fn challenge_after_deadline_is_rejected() {
        let fx = Fixture::new();
        let s = fx.session();
        s.submit_claim(BODY, 1, &fx.alice, None, fx.t(0)).unwrap();
        s.create_backing(1, &fx.stake(1_000), 10 * DAY, &fx.bob, fx.t(0))
            .unwrap();
        s.create_challenge(1, &fx.stake(20), &fx.carol, fx.t(0)).unwrap();
        assert!(matches!(
            s.create_challenge(1, &fx.stake(20), &fx.dave, fx.t(DAY)),
            Err(GameError::VotingWindowClosed { .. })
        ));
    }

    #[test]
    fn refund_returns_every_stake() {
        let fx = Fixture::new();
        let s = fx.session();
        s.submit_claim(BODY, 1, &fx.alice, None, fx.t(0)).unwrap();
        s.create_backing(1, &fx.stake(1_000), 10 * DAY, &fx.bob, fx.t(0))
            .unwrap();
        let c = s.create_challenge(1, &fx.stake(20), &fx.carol, fx.t(1)).unwrap();
        s.create_challenge(1, &fx.stake(30), &fx.dave, fx.t(2)).unwrap();

        let refunded = s.refund_challenges(c.game_id).unwrap();
        assert_eq!(refunded.len(), 2);
        assert_eq!(fx.bank.amount(&fx.carol, "trusteak"), fx.initial);
        assert_eq!(fx.bank.amount(&fx.dave, "trusteak"), fx.initial);
    }
}
