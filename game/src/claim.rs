//! Claim registry: identity, lifecycle state and feed indexes.

use std::collections::HashSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use tru_store::kv::prefix_end;
use tru_store::KeyRange;
use tru_types::{CategoryId, ClaimId, ClaimState, Coin, GameId, Timestamp, UserAddress};

use crate::codec;
use crate::keys;
use crate::session::Session;
use crate::GameError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    pub id: ClaimId,
    pub body: String,
    pub category_id: CategoryId,
    pub creator: UserAddress,
    /// Optional source URL supplied by the creator.
    pub source: Option<String>,
    pub state: ClaimState,
    pub game_id: Option<GameId>,
    pub total_backed: Coin,
    pub total_challenged: Coin,
    pub total_stakers: u64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Final verdict of a settled game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Confirmed,
    Rejected,
}

impl Outcome {
    pub fn claim_state(self) -> ClaimState {
        match self {
            Outcome::Confirmed => ClaimState::Confirmed,
            Outcome::Rejected => ClaimState::Rejected,
        }
    }
}

/// Ordering of a category feed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedFilter {
    /// Challenged claims first, then the rest.
    #[default]
    None,
    /// Most stakers first.
    Trending,
    /// Newest first.
    Latest,
    /// Settled or expired claims only.
    Completed,
}

impl FromStr for FeedFilter {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "" | "none" => Ok(FeedFilter::None),
            "trending" => Ok(FeedFilter::Trending),
            "latest" => Ok(FeedFilter::Latest),
            "completed" => Ok(FeedFilter::Completed),
            other => Err(GameError::InvalidQuery(format!("unknown feed filter {other}"))),
        }
    }
}

impl Session<'_> {
    /// Register a new claim in state Created.
    pub fn submit_claim(
        &self,
        body: &str,
        category_id: CategoryId,
        creator: &UserAddress,
        source: Option<String>,
        now: Timestamp,
    ) -> Result<Claim, GameError> {
        self.validate_body(body)?;
        self.ensure_not_jailed(creator, now)?;
        if self
            .services
            .categories
            .category(self.store, category_id)?
            .is_none()
        {
            return Err(GameError::CategoryNotFound(category_id));
        }

        let id = self.next_id(keys::CLAIM_COUNTER)?;
        let denom = self.params.stake_denom.clone();
        let claim = Claim {
            id,
            body: body.to_string(),
            category_id,
            creator: creator.clone(),
            source,
            state: ClaimState::Created,
            game_id: None,
            total_backed: Coin::zero(denom.clone()),
            total_challenged: Coin::zero(denom),
            total_stakers: 0,
            created_at: now,
            updated_at: now,
        };

        self.save(&keys::claim(id), &claim)?;
        self.save_id(&keys::category_claim(category_id, false, now, id), id)?;
        self.save_id(&keys::creator_claim(creator, id), id)?;
        self.save_id(&keys::claim_time(now, id), id)?;

        tracing::info!(claim_id = id, category_id, creator = %creator, "submitted claim");
        Ok(claim)
    }

    fn validate_body(&self, body: &str) -> Result<(), GameError> {
        let len = body.chars().count();
        let bounds = &self.params.claim;
        if len < bounds.min_claim_length {
            return Err(GameError::ClaimTooShort {
                len,
                min: bounds.min_claim_length,
            });
        }
        if len > bounds.max_claim_length {
            return Err(GameError::ClaimTooLong {
                len,
                max: bounds.max_claim_length,
            });
        }
        Ok(())
    }

    // ── Accessors ───────────────────────────────────────────────────────

    pub fn claim(&self, id: ClaimId) -> Result<Claim, GameError> {
        self.load(&keys::claim(id))?
            .ok_or(GameError::ClaimNotFound(id))
    }

    pub fn claims(&self) -> Result<Vec<Claim>, GameError> {
        self.store
            .scan_prefix(keys::CLAIM_RECORD_PREFIX)?
            .iter()
            .map(|(_, value)| codec::decode(value))
            .collect()
    }

    /// Claims with `start <= id <= end`.
    pub fn claims_between_ids(&self, start: ClaimId, end: ClaimId) -> Result<Vec<Claim>, GameError> {
        if start > end {
            return Ok(Vec::new());
        }
        let upper = match end.checked_add(1) {
            Some(next) => Some(keys::claim(next)),
            None => prefix_end(keys::CLAIM_RECORD_PREFIX),
        };
        let range = KeyRange::new(keys::claim(start), upper);
        self.store
            .scan(&range)?
            .iter()
            .map(|(_, value)| codec::decode(value))
            .collect()
    }

    /// Claims created in `[start, end]`, oldest first.
    pub fn claims_between_times(
        &self,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<Vec<Claim>, GameError> {
        self.claims_in_time_range(self.time_range(Some(start), Some(end)))
    }

    /// Claims created at or before `time`, oldest first.
    pub fn claims_before_time(&self, time: Timestamp) -> Result<Vec<Claim>, GameError> {
        self.claims_in_time_range(self.time_range(None, Some(time)))
    }

    /// Claims created at or after `time`, oldest first.
    pub fn claims_after_time(&self, time: Timestamp) -> Result<Vec<Claim>, GameError> {
        self.claims_in_time_range(self.time_range(Some(time), None))
    }

    /// Claims created in `[start, end]`, newest first.
    pub fn claims_by_time_desc(
        &self,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<Vec<Claim>, GameError> {
        self.claims_in_time_range(self.time_range(Some(start), Some(end)).descending())
    }

    fn time_range(&self, start: Option<Timestamp>, end: Option<Timestamp>) -> KeyRange {
        let lower = match start {
            Some(t) => keys::claim_time_start(t),
            None => keys::CLAIM_TIME_PREFIX.to_vec(),
        };
        // Inclusive end: stop before the first key of the following second.
        let upper = match end.and_then(|t| t.as_secs().checked_add(1)) {
            Some(next) => Some(keys::claim_time_start(Timestamp::new(next))),
            None => prefix_end(keys::CLAIM_TIME_PREFIX),
        };
        KeyRange::new(lower, upper)
    }

    fn claims_in_time_range(&self, range: KeyRange) -> Result<Vec<Claim>, GameError> {
        let ids = self
            .store
            .scan(&range)?
            .iter()
            .map(|(_, value)| codec::decode_id(value))
            .collect::<Result<Vec<_>, _>>()?;
        self.claims_by_id(&ids)
    }

    fn claims_by_id(&self, ids: &[ClaimId]) -> Result<Vec<Claim>, GameError> {
        ids.iter().map(|id| self.claim(*id)).collect()
    }

    /// Every claim in `category`, oldest first.
    pub fn category_claims(&self, category: CategoryId) -> Result<Vec<Claim>, GameError> {
        let ids = self.ids_under(&keys::category_claims_prefix(category, false))?;
        self.claims_by_id(&ids)
    }

    /// Challenged claims in `category`, oldest first.
    pub fn challenged_category_claims(&self, category: CategoryId) -> Result<Vec<Claim>, GameError> {
        let ids = self.ids_under(&keys::category_claims_prefix(category, true))?;
        self.claims_by_id(&ids)
    }

    pub fn creator_claims(&self, creator: &UserAddress) -> Result<Vec<Claim>, GameError> {
        let ids = self.ids_under(&keys::creator_claims_prefix(creator))?;
        self.claims_by_id(&ids)
    }

    /// The claims of `category` ordered for display.
    pub fn feed(&self, category: CategoryId, filter: FeedFilter) -> Result<Vec<Claim>, GameError> {
        match filter {
            FeedFilter::None => {
                let challenged = self.ids_under(&keys::category_claims_prefix(category, true))?;
                let seen: HashSet<ClaimId> = challenged.iter().copied().collect();
                let rest = self
                    .ids_under(&keys::category_claims_prefix(category, false))?
                    .into_iter()
                    .filter(|id| !seen.contains(id));
                let ordered: Vec<ClaimId> = challenged.iter().copied().chain(rest).collect();
                self.claims_by_id(&ordered)
            }
            FeedFilter::Latest => {
                let mut claims = self.category_claims(category)?;
                claims.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
                Ok(claims)
            }
            FeedFilter::Trending => {
                let mut claims = self.category_claims(category)?;
                claims.sort_by(|a, b| {
                    (b.total_stakers, b.created_at, b.id).cmp(&(a.total_stakers, a.created_at, a.id))
                });
                Ok(claims)
            }
            FeedFilter::Completed => Ok(self
                .category_claims(category)?
                .into_iter()
                .filter(|c| c.state.is_terminal())
                .collect()),
        }
    }

    // ── Lifecycle glue ──────────────────────────────────────────────────

    pub(crate) fn open_claim(&self, id: ClaimId) -> Result<Claim, GameError> {
        let claim = self.claim(id)?;
        if !claim.state.is_open() {
            return Err(GameError::ClaimNotOpen {
                id,
                state: claim.state,
            });
        }
        Ok(claim)
    }

    pub fn add_backing_stake(
        &self,
        id: ClaimId,
        stake: &Coin,
        now: Timestamp,
    ) -> Result<Claim, GameError> {
        let mut claim = self.claim(id)?;
        claim.total_backed = claim
            .total_backed
            .checked_add(stake)
            .ok_or(GameError::Overflow("claim total backed"))?;
        claim.total_stakers += 1;
        claim.updated_at = now;
        self.save(&keys::claim(id), &claim)?;
        Ok(claim)
    }

    pub fn add_challenge_stake(
        &self,
        id: ClaimId,
        stake: &Coin,
        now: Timestamp,
    ) -> Result<Claim, GameError> {
        let mut claim = self.claim(id)?;
        claim.total_challenged = claim
            .total_challenged
            .checked_add(stake)
            .ok_or(GameError::Overflow("claim total challenged"))?;
        claim.total_stakers += 1;
        claim.updated_at = now;
        self.save(&keys::claim(id), &claim)?;
        Ok(claim)
    }

    /// Created → Challenged, recording the game and the challenged index.
    pub fn start_challenge(
        &self,
        id: ClaimId,
        game_id: GameId,
        now: Timestamp,
    ) -> Result<Claim, GameError> {
        let mut claim = self.claim(id)?;
        transition(&mut claim, ClaimState::Challenged, now)?;
        claim.game_id = Some(game_id);
        self.save(&keys::claim(id), &claim)?;
        self.save_id(
            &keys::category_claim(claim.category_id, true, claim.created_at, id),
            id,
        )?;
        Ok(claim)
    }

    /// Challenged → Expired, for a game that never started.
    pub fn end_challenge(&self, id: ClaimId, now: Timestamp) -> Result<Claim, GameError> {
        let mut claim = self.claim(id)?;
        transition(&mut claim, ClaimState::Expired, now)?;
        self.save(&keys::claim(id), &claim)?;
        Ok(claim)
    }

    /// Challenged → Confirmed / Rejected.
    pub fn finish(&self, id: ClaimId, outcome: Outcome, now: Timestamp) -> Result<Claim, GameError> {
        let mut claim = self.claim(id)?;
        transition(&mut claim, outcome.claim_state(), now)?;
        self.save(&keys::claim(id), &claim)?;
        Ok(claim)
    }
}

fn transition(claim: &mut Claim, next: ClaimState, now: Timestamp) -> Result<(), GameError> {
    if !claim.state.can_transition_to(next) {
        return Err(GameError::IllegalTransition {
            id: claim.id,
            from: claim.state,
            to: next,
        });
    }
    tracing::info!(claim_id = claim.id, from = %claim.state, to = %next, "claim state changed");
    claim.state = next;
    claim.updated_at = now;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::Fixture;

    const BODY: &str = "The moon landing footage was filmed in 1969";

    #[test]
    fn submit_assigns_sequential_ids() {
        let fx = Fixture::new();
        let s = fx.session();
        let a = s.submit_claim(BODY, 1, &fx.alice, None, Timestamp::new(10)).unwrap();
        let b = s.submit_claim(BODY, 1, &fx.alice, None, Timestamp::new(11)).unwrap();
        assert_eq!((a.id, b.id), (1, 2));
        assert_eq!(a.state, ClaimState::Created);
        assert_eq!(s.claims().unwrap().len(), 2);
    }

    #[test]
    fn body_length_counts_characters() {
        let fx = Fixture::new();
        let s = fx.session();
        // 25 two-byte characters are exactly the minimum.
        let body: String = "é".repeat(25);
        assert!(s.submit_claim(&body, 1, &fx.alice, None, Timestamp::new(1)).is_ok());

        let short: String = "é".repeat(24);
        assert!(matches!(
            s.submit_claim(&short, 1, &fx.alice, None, Timestamp::new(1)),
            Err(GameError::ClaimTooShort { len: 24, min: 25 })
        ));

        let long = "x".repeat(351);
        assert!(matches!(
            s.submit_claim(&long, 1, &fx.alice, None, Timestamp::new(1)),
            Err(GameError::ClaimTooLong { .. })
        ));
    }

    #[test]
    fn unknown_category_is_rejected() {
        let fx = Fixture::new();
        let err = fx
            .session()
            .submit_claim(BODY, 99, &fx.alice, None, Timestamp::new(1))
            .unwrap_err();
        assert!(matches!(err, GameError::CategoryNotFound(99)));
    }

    #[test]
    fn time_ranges_are_inclusive() {
        let fx = Fixture::new();
        let s = fx.session();
        for t in [10, 20, 20, 30] {
            s.submit_claim(BODY, 1, &fx.alice, None, Timestamp::new(t)).unwrap();
        }
        let ids = |claims: Vec<Claim>| claims.into_iter().map(|c| c.id).collect::<Vec<_>>();

        assert_eq!(
            ids(s.claims_between_times(Timestamp::new(20), Timestamp::new(30)).unwrap()),
            vec![2, 3, 4]
        );
        assert_eq!(ids(s.claims_before_time(Timestamp::new(20)).unwrap()), vec![1, 2, 3]);
        assert_eq!(ids(s.claims_after_time(Timestamp::new(21)).unwrap()), vec![4]);
        assert_eq!(
            ids(s.claims_by_time_desc(Timestamp::new(0), Timestamp::new(100)).unwrap()),
            vec![4, 3, 2, 1]
        );
        assert_eq!(ids(s.claims_between_ids(2, 3).unwrap()), vec![2, 3]);
    }

    #[test]
    fn feed_puts_challenged_claims_first() {
        let fx = Fixture::new();
        let s = fx.session();
        for t in 1..=3 {
            s.submit_claim(BODY, 1, &fx.alice, None, Timestamp::new(t)).unwrap();
        }
        s.start_challenge(3, 1, Timestamp::new(5)).unwrap();

        let feed: Vec<_> = s
            .feed(1, FeedFilter::None)
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(feed, vec![3, 1, 2]);

        let latest: Vec<_> = s
            .feed(1, FeedFilter::Latest)
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(latest, vec![3, 2, 1]);
    }

    #[test]
    fn trending_orders_by_stakers() {
        let fx = Fixture::new();
        let s = fx.session();
        for t in 1..=3 {
            s.submit_claim(BODY, 1, &fx.alice, None, Timestamp::new(t)).unwrap();
        }
        let stake = Coin::new("trusteak", 1);
        s.add_backing_stake(1, &stake, Timestamp::new(4)).unwrap();
        s.add_backing_stake(1, &stake, Timestamp::new(4)).unwrap();
        s.add_challenge_stake(2, &stake, Timestamp::new(4)).unwrap();

        let trending: Vec<_> = s
            .feed(1, FeedFilter::Trending)
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(trending, vec![1, 2, 3]);
        assert_eq!(s.claim(1).unwrap().total_backed.amount, 2);
    }

    #[test]
    fn transitions_only_move_forward() {
        let fx = Fixture::new();
        let s = fx.session();
        s.submit_claim(BODY, 1, &fx.alice, None, Timestamp::new(1)).unwrap();

        assert!(matches!(
            s.finish(1, Outcome::Confirmed, Timestamp::new(2)),
            Err(GameError::IllegalTransition { .. })
        ));
        s.start_challenge(1, 1, Timestamp::new(2)).unwrap();
        s.finish(1, Outcome::Rejected, Timestamp::new(3)).unwrap();
        assert!(matches!(
            s.end_challenge(1, Timestamp::new(4)),
            Err(GameError::IllegalTransition { .. })
        ));
        assert_eq!(s.claim(1).unwrap().state, ClaimState::Rejected);
        assert_eq!(
            s.feed(1, FeedFilter::Completed).unwrap().len(),
            1
        );
    }
}
