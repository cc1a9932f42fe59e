//! Backing ledger: principal commitments in support of a claim.
//!
//! Interest is fixed when the backing is created. A backing either matures
//! (principal back plus interest, paid by the block tick) or is settled by
//! the claim's validation game; the `backing:settled:<id>` marker keeps the
//! two paths from both paying.

use serde::{Deserialize, Serialize};

use tru_types::{BackingId, BackingParams, ClaimId, Coin, Timestamp, UserAddress, BPS_DENOMINATOR};

use crate::claim::Claim;
use crate::keys;
use crate::queue::BACKING_QUEUE;
use crate::session::Session;
use crate::GameError;

/// Fixed-point scale for rates: parts per billion.
pub const RATE_SCALE: u128 = 1_000_000_000;

const PPB_PER_BPS: u128 = RATE_SCALE / BPS_DENOMINATOR as u128;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Backing {
    pub id: BackingId,
    pub claim_id: ClaimId,
    pub creator: UserAddress,
    pub principal: Coin,
    /// Denominated like the principal; paid in the category denomination.
    pub interest: Coin,
    pub period_secs: u64,
    pub expires_at: Timestamp,
    /// Interest model in force when the backing was made.
    pub params: BackingParams,
    pub created_at: Timestamp,
}

/// What the maturity drain did with one queued backing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Maturity {
    Paid {
        backing_id: BackingId,
        principal: Coin,
        interest: Coin,
    },
    /// Already returned or forfeited by a game settlement.
    AlreadySettled { backing_id: BackingId },
}

/// Interest rate for the whole period, in parts per billion.
///
/// `blend = w_amount·min(p, max_amount)/max_amount + w_period·period/max_period`,
/// `rate = max_rate·blend`, clamped to `[min_rate, max_rate]`.
pub fn interest_rate_ppb(
    params: &BackingParams,
    principal: u128,
    period_secs: u64,
) -> Result<u128, GameError> {
    let max_amount = params.max_amount.max(1);
    let max_period = u128::from(params.max_period_secs.max(1));
    let amount = principal.min(max_amount);
    let period = u128::from(period_secs).min(max_period);

    let weighted = |weight_bps: u32, value: u128, max: u128| {
        u128::from(weight_bps)
            .checked_mul(value)
            .and_then(|v| v.checked_mul(RATE_SCALE))
            .map(|v| v / max)
            .ok_or(GameError::Overflow("interest rate"))
    };
    let blend = (weighted(params.amount_weight_bps, amount, max_amount)?
        + weighted(params.period_weight_bps, period, max_period)?)
        / u128::from(BPS_DENOMINATOR);

    let min_rate = u128::from(params.min_interest_rate_bps) * PPB_PER_BPS;
    let max_rate = u128::from(params.max_interest_rate_bps) * PPB_PER_BPS;
    let rate = max_rate * blend / RATE_SCALE;
    Ok(rate.clamp(min_rate, max_rate.max(min_rate)))
}

/// Interest owed on `principal` over `period_secs`, rounded down.
pub fn interest(
    params: &BackingParams,
    principal: u128,
    period_secs: u64,
) -> Result<u128, GameError> {
    let rate = interest_rate_ppb(params, principal, period_secs)?;
    principal
        .checked_mul(rate)
        .map(|v| v / RATE_SCALE)
        .ok_or(GameError::Overflow("interest"))
}

impl Session<'_> {
    /// Lock `principal` behind `claim_id` for `period_secs`.
    pub fn create_backing(
        &self,
        claim_id: ClaimId,
        principal: &Coin,
        period_secs: u64,
        creator: &UserAddress,
        now: Timestamp,
    ) -> Result<Backing, GameError> {
        self.ensure_stake_denom(principal)?;
        let params = &self.params.backing;
        if period_secs < params.min_period_secs || period_secs > params.max_period_secs {
            return Err(GameError::InvalidPeriod {
                period: period_secs,
                min: params.min_period_secs,
                max: params.max_period_secs,
            });
        }
        let claim = self.open_claim(claim_id)?;
        self.ensure_not_jailed(creator, now)?;
        if self.store.has(&keys::claim_backing(claim_id, creator))? {
            return Err(GameError::DuplicateBacking {
                claim_id,
                creator: creator.clone(),
            });
        }
        if let Some(game_id) = claim.game_id {
            if self.store.has(&keys::game_challenge(game_id, creator))? {
                return Err(GameError::ChallengerCannotBack {
                    claim_id,
                    creator: creator.clone(),
                });
            }
            if self.store.has(&keys::game_vote(game_id, creator))? {
                return Err(GameError::VoterCannotStake {
                    game_id,
                    creator: creator.clone(),
                });
            }
        }

        let interest_amount = interest(params, principal.amount, period_secs)?;
        self.debit(creator, principal)?;

        let id = self.next_id(keys::BACKING_COUNTER)?;
        let backing = Backing {
            id,
            claim_id,
            creator: creator.clone(),
            principal: principal.clone(),
            interest: Coin::new(principal.denom.clone(), interest_amount),
            period_secs,
            expires_at: now.plus_secs(period_secs),
            params: params.clone(),
            created_at: now,
        };
        self.save(&keys::backing(id), &backing)?;
        self.save_id(&keys::claim_backing(claim_id, creator), id)?;
        BACKING_QUEUE.push(self.store, id)?;
        self.add_backing_stake(claim_id, principal, now)?;

        tracing::info!(
            backing_id = id,
            claim_id,
            creator = %creator,
            amount = %principal,
            interest = %backing.interest,
            period = %tru_utils::format_duration(period_secs),
            "created backing"
        );
        Ok(backing)
    }

    pub fn backing(&self, id: BackingId) -> Result<Backing, GameError> {
        self.load(&keys::backing(id))?
            .ok_or(GameError::BackingNotFound(id))
    }

    /// Every backing of `claim_id`, ordered by backer address.
    pub fn claim_backings(&self, claim_id: ClaimId) -> Result<Vec<Backing>, GameError> {
        self.ids_under(&keys::claim_backings_prefix(claim_id))?
            .into_iter()
            .map(|id| self.backing(id))
            .collect()
    }

    pub fn backing_by_claim_and_creator(
        &self,
        claim_id: ClaimId,
        creator: &UserAddress,
    ) -> Result<Option<Backing>, GameError> {
        match self.load_id(&keys::claim_backing(claim_id, creator))? {
            Some(id) => self.backing(id).map(Some),
            None => Ok(None),
        }
    }

    pub fn is_backing_settled(&self, id: BackingId) -> Result<bool, GameError> {
        Ok(self.store.has(&keys::backing_settled(id))?)
    }

    pub(crate) fn mark_backing_settled(&self, id: BackingId) -> Result<(), GameError> {
        self.store.put(&keys::backing_settled(id), &[])?;
        Ok(())
    }

    /// Denomination rewards on `claim` are paid in.
    pub fn reward_denom(&self, claim: &Claim) -> Result<String, GameError> {
        self.services
            .categories
            .category(self.store, claim.category_id)?
            .map(|c| c.coin_name().to_string())
            .ok_or(GameError::CategoryNotFound(claim.category_id))
    }

    /// Pay out the head of the maturity queue if it has matured.
    ///
    /// Returns `None` when the queue is empty or its head has not matured,
    /// which ends the drain for this tick.
    pub fn mature_next_backing(&self, now: Timestamp) -> Result<Option<Maturity>, GameError> {
        let Some(id) = BACKING_QUEUE.peek(self.store)? else {
            return Ok(None);
        };
        let backing: Backing = self
            .load(&keys::backing(id))?
            .ok_or(GameError::QueuedBackingMissing(id))?;
        if backing.expires_at.is_after(now) {
            return Ok(None);
        }
        BACKING_QUEUE.pop(self.store)?;

        if self.is_backing_settled(id)? {
            tracing::debug!(backing_id = id, "backing already settled by its game");
            return Ok(Some(Maturity::AlreadySettled { backing_id: id }));
        }

        let claim = self.claim(backing.claim_id)?;
        let reward = backing.interest.with_denom(self.reward_denom(&claim)?);
        self.credit(&backing.creator, &backing.principal)?;
        self.credit(&backing.creator, &reward)?;
        self.mark_backing_settled(id)?;

        tracing::info!(
            backing_id = id,
            claim_id = backing.claim_id,
            principal = %backing.principal,
            interest = %reward,
            "backing matured"
        );
        Ok(Some(Maturity::Paid {
            backing_id: id,
            principal: backing.principal,
            interest: reward,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Fixture, BODY, DAY};

    #[test]
    fn blended_interest_for_ten_days() {
        let params = BackingParams::default();
        assert_eq!(interest_rate_ppb(&params, 100_000_000_000, 10 * DAY).unwrap(), 7_414_441);
        assert_eq!(interest(&params, 100_000_000_000, 10 * DAY).unwrap(), 741_444_100);
    }

    #[test]
    fn max_amount_and_period_earn_max_rate() {
        let params = BackingParams::default();
        let rate = interest_rate_ppb(&params, params.max_amount * 2, params.max_period_secs).unwrap();
        assert_eq!(rate, 1_000 * PPB_PER_BPS);
    }

    #[test]
    fn rate_is_clamped_to_minimum() {
        let params = BackingParams {
            min_interest_rate_bps: 200,
            ..BackingParams::default()
        };
        let rate = interest_rate_ppb(&params, 1, params.min_period_secs).unwrap();
        assert_eq!(rate, 200 * PPB_PER_BPS);
    }

    #[test]
    fn create_debits_principal_and_updates_claim() {
        let fx = Fixture::new();
        let s = fx.session();
        s.submit_claim(BODY, 1, &fx.alice, None, fx.t(0)).unwrap();

        let backing = s
            .create_backing(1, &fx.stake(1_000), 10 * DAY, &fx.bob, fx.t(1))
            .unwrap();
        assert_eq!(backing.expires_at, fx.t(1).plus_secs(10 * DAY));
        assert_eq!(fx.bank.amount(&fx.bob, "trusteak"), fx.initial - 1_000);

        let claim = s.claim(1).unwrap();
        assert_eq!(claim.total_backed.amount, 1_000);
        assert_eq!(claim.total_stakers, 1);
        assert_eq!(claim.state, tru_types::ClaimState::Created);
        assert_eq!(
            s.backing_by_claim_and_creator(1, &fx.bob).unwrap(),
            Some(backing)
        );
    }

    #[test]
    fn create_validates_input() {
        let fx = Fixture::new();
        let s = fx.session();
        s.submit_claim(BODY, 1, &fx.alice, None, fx.t(0)).unwrap();

        assert!(matches!(
            s.create_backing(1, &fx.stake(10), DAY, &fx.bob, fx.t(1)),
            Err(GameError::InvalidPeriod { .. })
        ));
        assert!(matches!(
            s.create_backing(1, &Coin::new("crypto", 10), 10 * DAY, &fx.bob, fx.t(1)),
            Err(GameError::WrongDenom { .. })
        ));
        assert!(matches!(
            s.create_backing(1, &fx.stake(0), 10 * DAY, &fx.bob, fx.t(1)),
            Err(GameError::ZeroAmount)
        ));
        assert!(matches!(
            s.create_backing(7, &fx.stake(10), 10 * DAY, &fx.bob, fx.t(1)),
            Err(GameError::ClaimNotFound(7))
        ));

        s.create_backing(1, &fx.stake(10), 10 * DAY, &fx.bob, fx.t(1))
            .unwrap();
        assert!(matches!(
            s.create_backing(1, &fx.stake(10), 10 * DAY, &fx.bob, fx.t(2)),
            Err(GameError::DuplicateBacking { .. })
        ));
    }

    #[test]
    fn token_voter_cannot_back_the_same_claim() {
        let fx = Fixture::new();
        let s = fx.session();
        s.submit_claim(BODY, 1, &fx.alice, None, fx.t(0)).unwrap();
        let game_id = s
            .create_challenge(1, &fx.stake(20), &fx.carol, fx.t(1))
            .unwrap()
            .game_id;
        s.cast_token_vote(game_id, &fx.dave, false, &fx.stake(50), fx.t(2))
            .unwrap();

        assert!(matches!(
            s.create_backing(1, &fx.stake(100), 10 * DAY, &fx.dave, fx.t(3)),
            Err(GameError::VoterCannotStake { .. })
        ));
        assert_eq!(fx.bank.amount(&fx.dave, "trusteak"), fx.initial - 50);
        assert_eq!(s.backing_by_claim_and_creator(1, &fx.dave).unwrap(), None);
        assert_eq!(s.game_votes(game_id).unwrap().len(), 2);
    }

    #[test]
    fn maturity_pays_principal_and_interest_once() {
        let fx = Fixture::new();
        let s = fx.session();
        s.submit_claim(BODY, 1, &fx.alice, None, fx.t(0)).unwrap();
        let amount = 100_000_000_000;
        fx.bank.set_balance(&fx.bob, fx.stake(amount));
        let backing = s
            .create_backing(1, &fx.stake(amount), 10 * DAY, &fx.bob, fx.t(0))
            .unwrap();

        assert_eq!(s.mature_next_backing(fx.t(10 * DAY - 1)).unwrap(), None);
        let paid = s.mature_next_backing(fx.t(10 * DAY)).unwrap();
        assert_eq!(
            paid,
            Some(Maturity::Paid {
                backing_id: backing.id,
                principal: fx.stake(amount),
                interest: Coin::new("crypto", 741_444_100),
            })
        );
        assert_eq!(fx.bank.amount(&fx.bob, "trusteak"), amount);
        assert_eq!(fx.bank.amount(&fx.bob, "crypto"), 741_444_100);
        assert_eq!(s.mature_next_backing(fx.t(20 * DAY)).unwrap(), None);
    }

    #[test]
    fn settled_backing_is_skipped_at_maturity() {
        let fx = Fixture::new();
        let s = fx.session();
        s.submit_claim(BODY, 1, &fx.alice, None, fx.t(0)).unwrap();
        let backing = s
            .create_backing(1, &fx.stake(500), 10 * DAY, &fx.bob, fx.t(0))
            .unwrap();
        s.mark_backing_settled(backing.id).unwrap();

        assert_eq!(
            s.mature_next_backing(fx.t(10 * DAY)).unwrap(),
            Some(Maturity::AlreadySettled {
                backing_id: backing.id
            })
        );
        assert_eq!(fx.bank.amount(&fx.bob, "trusteak"), fx.initial - 500);
    }
}
