//! Ledger facade: atomic operations over a shared store.
//!
//! Every operation runs in a fresh [`WriteBatch`] and commits only when it
//! succeeds, so a failed operation leaves the store untouched. The block
//! tick commits one batch per queue entry.

use std::sync::Arc;

use tru_store::{KvStore, WriteBatch};
use tru_types::{ArgumentId, CategoryId, ClaimId, Coin, GameId, LedgerParams, Timestamp, UserAddress};

use crate::backing::Backing;
use crate::challenge::Challenge;
use crate::claim::Claim;
use crate::session::{Services, Session};
use crate::settlement::SettlementRecord;
use crate::slashing::{SlashOutcome, SlashReason, SlashType};
use crate::tick::TickReport;
use crate::vote::{Vote, VoteReceipt};
use crate::GameError;

pub struct Ledger {
    store: Arc<dyn KvStore + Send + Sync>,
    params: LedgerParams,
    services: Services,
}

impl Ledger {
    pub fn new(
        store: Arc<dyn KvStore + Send + Sync>,
        params: LedgerParams,
        services: Services,
    ) -> Result<Self, GameError> {
        params.validate()?;
        Ok(Self {
            store,
            params,
            services,
        })
    }

    pub fn params(&self) -> &LedgerParams {
        &self.params
    }

    pub fn store(&self) -> &Arc<dyn KvStore + Send + Sync> {
        &self.store
    }

    /// Read-only view straight over the store.
    pub fn reader(&self) -> Session<'_> {
        Session::new(self.store.as_ref(), &self.params, &self.services)
    }

    /// Run `op` in a batch; commit on success, discard on error.
    pub fn transact<T>(
        &self,
        op: impl FnOnce(&Session<'_>) -> Result<T, GameError>,
    ) -> Result<T, GameError> {
        let batch = WriteBatch::new(self.store.as_ref());
        let out = {
            let session = Session::new(&batch, &self.params, &self.services);
            op(&session)?
        };
        batch.commit()?;
        Ok(out)
    }

    pub fn submit_claim(
        &self,
        body: &str,
        category_id: CategoryId,
        creator: &UserAddress,
        source: Option<String>,
        now: Timestamp,
    ) -> Result<Claim, GameError> {
        self.transact(|s| s.submit_claim(body, category_id, creator, source, now))
    }

    pub fn create_backing(
        &self,
        claim_id: ClaimId,
        principal: &Coin,
        period_secs: u64,
        creator: &UserAddress,
        now: Timestamp,
    ) -> Result<Backing, GameError> {
        self.transact(|s| s.create_backing(claim_id, principal, period_secs, creator, now))
    }

    pub fn create_challenge(
        &self,
        claim_id: ClaimId,
        amount: &Coin,
        creator: &UserAddress,
        now: Timestamp,
    ) -> Result<Challenge, GameError> {
        self.transact(|s| s.create_challenge(claim_id, amount, creator, now))
    }

    pub fn cast_token_vote(
        &self,
        game_id: GameId,
        voter: &UserAddress,
        choice: bool,
        stake: &Coin,
        now: Timestamp,
    ) -> Result<VoteReceipt, GameError> {
        self.transact(|s| s.cast_token_vote(game_id, voter, choice, stake, now))
    }

    pub fn change_stake_vote(
        &self,
        game_id: GameId,
        user: &UserAddress,
        choice: bool,
        now: Timestamp,
    ) -> Result<Vote, GameError> {
        self.transact(|s| s.change_stake_vote(game_id, user, choice, now))
    }

    pub fn create_slash(
        &self,
        argument_id: ArgumentId,
        slash_type: SlashType,
        reason: SlashReason,
        detailed_reason: &str,
        creator: &UserAddress,
        now: Timestamp,
    ) -> Result<SlashOutcome, GameError> {
        self.transact(|s| s.create_slash(argument_id, slash_type, reason, detailed_reason, creator, now))
    }

    /// Settle a game whose deadline has passed, ahead of the next tick.
    ///
    /// Before the deadline a game closes only through the vote quorum.
    pub fn settle_game(&self, game_id: GameId, now: Timestamp) -> Result<SettlementRecord, GameError> {
        self.transact(|s| {
            let game = s.game(game_id)?;
            if !game.is_closed() && !game.is_expired(now) {
                return Err(GameError::GameStillRunning {
                    game_id,
                    expires_at: game.expires_at,
                });
            }
            s.settle_game(game_id, now)
        })
    }

    /// End-of-block processing: expired games first, then matured backings.
    ///
    /// Entries handled before a failure stay committed; the failing entry
    /// is left at the head of its queue.
    pub fn tick(&self, now: Timestamp) -> Result<TickReport, GameError> {
        let mut report = TickReport::new(now);
        while let Some(close) = self.transact(|s| s.close_next_expired_game(now))? {
            report.record_game(close);
        }
        while let Some(maturity) = self.transact(|s| s.mature_next_backing(now))? {
            report.matured.push(maturity);
        }
        if !report.is_empty() {
            tracing::info!(
                now = %now,
                expired = report.expired.len(),
                settled = report.settled.len(),
                skipped = report.skipped.len(),
                matured = report.matured.len(),
                "block tick"
            );
        }
        Ok(report)
    }
}
