//! Block tick: retire expired games and mature backings.
//!
//! Each queue is drained head-first and the drain stops at the first entry
//! that has not expired yet. Queue order is creation order, which is only
//! an approximation of expiry order for backings with different periods.
//! The per-entry steps live here; [`crate::Ledger::tick`] runs each of
//! them in its own batch.

use serde::{Deserialize, Serialize};

use tru_types::{ClaimId, GameId, GameState, Timestamp};

use crate::backing::Maturity;
use crate::challenge::{Challenge, ValidationGame};
use crate::keys;
use crate::queue::GAME_QUEUE;
use crate::session::Session;
use crate::settlement::SettlementRecord;
use crate::GameError;

/// What the tick did with one expired game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum GameClose {
    /// Never started; every challenge stake was refunded.
    Expired {
        game_id: GameId,
        claim_id: ClaimId,
        refunds: Vec<Challenge>,
    },
    Settled { record: SettlementRecord },
    /// Already closed by an earlier quorum settlement.
    Skipped { game_id: GameId, state: GameState },
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickReport {
    pub now: Timestamp,
    pub expired: Vec<GameId>,
    pub settled: Vec<SettlementRecord>,
    pub skipped: Vec<GameId>,
    pub matured: Vec<Maturity>,
}

impl TickReport {
    pub fn new(now: Timestamp) -> Self {
        Self {
            now,
            ..Self::default()
        }
    }

    pub fn record_game(&mut self, close: GameClose) {
        match close {
            GameClose::Expired { game_id, .. } => self.expired.push(game_id),
            GameClose::Settled { record } => self.settled.push(record),
            GameClose::Skipped { game_id, .. } => self.skipped.push(game_id),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.expired.is_empty()
            && self.settled.is_empty()
            && self.skipped.is_empty()
            && self.matured.is_empty()
    }
}

impl Session<'_> {
    /// Close the head of the game queue if its deadline has passed.
    ///
    /// `None` means the queue is empty or its head is still running.
    pub fn close_next_expired_game(&self, now: Timestamp) -> Result<Option<GameClose>, GameError> {
        let Some(game_id) = GAME_QUEUE.peek(self.store)? else {
            return Ok(None);
        };
        let mut game = self
            .load::<ValidationGame>(&keys::game(game_id))?
            .ok_or(GameError::QueuedGameMissing(game_id))?;
        if !game.is_expired(now) {
            tracing::debug!(game_id, expires_at = %game.expires_at, "queue head still running");
            return Ok(None);
        }
        GAME_QUEUE.pop(self.store)?;
        tracing::debug!(game_id, state = %game.state, "popped expired game");

        let close = match game.state {
            GameState::Pending => {
                let refunds = self.refund_challenges(game_id)?;
                game.state = GameState::Expired;
                game.ended_at = Some(now);
                self.save_game(&game)?;
                self.end_challenge(game.claim_id, now)?;
                tracing::info!(
                    game_id,
                    claim_id = game.claim_id,
                    refunds = refunds.len(),
                    "validation game expired before starting"
                );
                GameClose::Expired {
                    game_id,
                    claim_id: game.claim_id,
                    refunds,
                }
            }
            GameState::Open => GameClose::Settled {
                record: self.settle_game(game_id, now)?,
            },
            state => {
                tracing::warn!(game_id, %state, "skipping queued game that is already closed");
                GameClose::Skipped { game_id, state }
            }
        };
        Ok(Some(close))
    }

    /// Drain both queues inside this session's store.
    ///
    /// Used when the caller already holds a batch for the whole block.
    pub fn run_tick(&self, now: Timestamp) -> Result<TickReport, GameError> {
        let mut report = TickReport::new(now);
        while let Some(close) = self.close_next_expired_game(now)? {
            report.record_game(close);
        }
        while let Some(maturity) = self.mature_next_backing(now)? {
            report.matured.push(maturity);
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Fixture, BODY, DAY};
    use tru_types::ClaimState;

    #[test]
    fn empty_queues_are_a_no_op() {
        let fx = Fixture::new();
        let report = fx.session().run_tick(fx.t(DAY)).unwrap();
        assert!(report.is_empty());
        assert_eq!(report.now, fx.t(DAY));
    }

    #[test]
    fn pending_game_expires_with_refund() {
        let fx = Fixture::new();
        let s = fx.session();
        s.submit_claim(BODY, 1, &fx.alice, None, fx.t(0)).unwrap();
        s.create_backing(1, &fx.stake(1_000), 10 * DAY, &fx.bob, fx.t(0))
            .unwrap();
        let game_id = s
            .create_challenge(1, &fx.stake(20), &fx.carol, fx.t(1))
            .unwrap()
            .game_id;

        assert!(s.close_next_expired_game(fx.t(DAY)).unwrap().is_none());
        let close = s.close_next_expired_game(fx.t(1 + DAY)).unwrap().unwrap();
        assert!(matches!(close, GameClose::Expired { ref refunds, .. } if refunds.len() == 1));

        assert_eq!(s.game(game_id).unwrap().state, GameState::Expired);
        assert_eq!(s.claim(1).unwrap().state, ClaimState::Expired);
        assert_eq!(fx.bank.amount(&fx.carol, "trusteak"), fx.initial);
        assert!(GAME_QUEUE.is_empty(s.store()).unwrap());
    }

    #[test]
    fn open_game_settles_on_expiry() {
        let fx = Fixture::new();
        let s = fx.session();
        s.submit_claim(BODY, 1, &fx.alice, None, fx.t(0)).unwrap();
        let game_id = s
            .create_challenge(1, &fx.stake(20), &fx.carol, fx.t(0))
            .unwrap()
            .game_id;
        s.cast_token_vote(game_id, &fx.dave, true, &fx.stake(50), fx.t(5))
            .unwrap();

        let report = s.run_tick(fx.t(DAY)).unwrap();
        assert_eq!(report.settled.len(), 1);
        assert_eq!(s.claim(1).unwrap().state, ClaimState::Confirmed);
        assert_eq!(s.settlement(game_id).unwrap(), Some(report.settled[0].clone()));
    }

    #[test]
    fn quorum_closed_game_is_skipped() {
        let mut fx = Fixture::new();
        fx.params.voting.close_quorum = 1;
        let s = fx.session();
        s.submit_claim(BODY, 1, &fx.alice, None, fx.t(0)).unwrap();
        let game_id = s
            .create_challenge(1, &fx.stake(20), &fx.carol, fx.t(0))
            .unwrap()
            .game_id;
        let receipt = s
            .cast_token_vote(game_id, &fx.dave, false, &fx.stake(5), fx.t(5))
            .unwrap();
        assert!(receipt.settlement.is_some());
        assert!(matches!(
            s.settle_game(game_id, fx.t(6)),
            Err(GameError::GameClosed(_))
        ));

        let report = s.run_tick(fx.t(DAY)).unwrap();
        assert_eq!(report.skipped, vec![game_id]);
        assert!(report.settled.is_empty());
    }

    #[test]
    fn missing_game_is_an_invariant_violation() {
        let fx = Fixture::new();
        let s = fx.session();
        GAME_QUEUE.push(s.store(), 42).unwrap();
        let err = s.close_next_expired_game(fx.t(0)).unwrap_err();
        assert!(matches!(err, GameError::QueuedGameMissing(42)));
        assert_eq!(err.category(), crate::ErrorCategory::Invariant);
    }

    #[test]
    fn backings_mature_after_games() {
        let fx = Fixture::new();
        let s = fx.session();
        s.submit_claim(BODY, 1, &fx.alice, None, fx.t(0)).unwrap();
        s.create_backing(1, &fx.stake(1_000), 3 * DAY, &fx.bob, fx.t(0))
            .unwrap();

        assert!(s.run_tick(fx.t(DAY)).unwrap().matured.is_empty());
        let report = s.run_tick(fx.t(3 * DAY)).unwrap();
        assert_eq!(report.matured.len(), 1);
        assert!(s.run_tick(fx.t(4 * DAY)).unwrap().is_empty());
    }
}
