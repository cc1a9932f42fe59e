//! JSON querier over the ledger's read accessors.
//!
//! Paths are plain names (`claim`, `feed`, `votes`, ...). Parameters are a
//! JSON object whose shape depends on the path; results are indented JSON.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use tru_types::{CategoryId, ClaimId, Timestamp, UserAddress};

use crate::claim::FeedFilter;
use crate::ledger::Ledger;
use crate::session::Session;
use crate::vote::VoteKind;
use crate::GameError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryByIdParams {
    pub id: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryByCategoryIdParams {
    pub category_id: CategoryId,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryByCategoryIdAndFeedFilter {
    pub category_id: CategoryId,
    #[serde(default)]
    pub feed_filter: FeedFilter,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryByClaimIdAndCreatorParams {
    pub claim_id: ClaimId,
    pub creator: UserAddress,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryByCreatorParams {
    pub creator: UserAddress,
}

/// Inclusive bounds; a missing bound is open.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryTimeRangeParams {
    #[serde(default)]
    pub start: Option<Timestamp>,
    #[serde(default)]
    pub end: Option<Timestamp>,
    #[serde(default)]
    pub descending: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryIdRangeParams {
    pub start: u64,
    pub end: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryVotesParams {
    pub game_id: u64,
    /// `backing`, `challenge` or `token`; all kinds when absent.
    #[serde(default)]
    pub kind: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryBalanceParams {
    pub address: UserAddress,
    pub denom: String,
}

pub struct Querier<'a> {
    session: Session<'a>,
}

fn params<T: DeserializeOwned>(data: &[u8]) -> Result<T, GameError> {
    serde_json::from_slice(data).map_err(|e| GameError::InvalidQuery(e.to_string()))
}

fn render<T: Serialize>(value: &T) -> Result<Vec<u8>, GameError> {
    serde_json::to_vec_pretty(value).map_err(|e| GameError::Corrupted(format!("query result: {e}")))
}

impl<'a> Querier<'a> {
    pub fn new(session: Session<'a>) -> Self {
        Self { session }
    }

    pub fn query(&self, path: &str, data: &[u8]) -> Result<Vec<u8>, GameError> {
        let s = &self.session;
        match path {
            "params" => render(s.params()),
            "claim" => render(&s.claim(params::<QueryByIdParams>(data)?.id)?),
            "claims" => render(&s.claims()?),
            "claims_by_ids" => {
                let p: QueryIdRangeParams = params(data)?;
                render(&s.claims_between_ids(p.start, p.end)?)
            }
            "claims_by_time" => {
                let p: QueryTimeRangeParams = params(data)?;
                let claims = match (p.start, p.end) {
                    (Some(start), Some(end)) if p.descending => s.claims_by_time_desc(start, end)?,
                    (Some(start), Some(end)) => s.claims_between_times(start, end)?,
                    (None, Some(end)) => s.claims_before_time(end)?,
                    (Some(start), None) => s.claims_after_time(start)?,
                    (None, None) => s.claims()?,
                };
                render(&claims)
            }
            "category_claims" => {
                render(&s.category_claims(params::<QueryByCategoryIdParams>(data)?.category_id)?)
            }
            "challenged_claims" => render(
                &s.challenged_category_claims(params::<QueryByCategoryIdParams>(data)?.category_id)?,
            ),
            "feed" => {
                let p: QueryByCategoryIdAndFeedFilter = params(data)?;
                render(&s.feed(p.category_id, p.feed_filter)?)
            }
            "creator_claims" => render(&s.creator_claims(&params::<QueryByCreatorParams>(data)?.creator)?),
            "backing" => render(&s.backing(params::<QueryByIdParams>(data)?.id)?),
            "claim_backings" => render(&s.claim_backings(params::<QueryByIdParams>(data)?.id)?),
            "backing_by_claim_and_creator" => {
                let p: QueryByClaimIdAndCreatorParams = params(data)?;
                render(&s.backing_by_claim_and_creator(p.claim_id, &p.creator)?)
            }
            "game" => render(&s.game(params::<QueryByIdParams>(data)?.id)?),
            "claim_game" => render(&s.claim_game(params::<QueryByIdParams>(data)?.id)?),
            "challenge" => render(&s.challenge(params::<QueryByIdParams>(data)?.id)?),
            "game_challenges" => render(&s.game_challenges(params::<QueryByIdParams>(data)?.id)?),
            "challenge_by_claim_and_creator" => {
                let p: QueryByClaimIdAndCreatorParams = params(data)?;
                let challenge = match s.claim_game(p.claim_id)? {
                    Some(game) => s.challenge_by_game_and_creator(game.id, &p.creator)?,
                    None => None,
                };
                render(&challenge)
            }
            "token_vote" => render(&s.token_vote(params::<QueryByIdParams>(data)?.id)?),
            "votes" => {
                let p: QueryVotesParams = params(data)?;
                let kind = p
                    .kind
                    .as_deref()
                    .map(str::parse::<VoteKind>)
                    .transpose()?;
                let votes: Vec<_> = s
                    .game_votes(p.game_id)?
                    .into_iter()
                    .filter(|v| kind.map_or(true, |k| v.kind() == k))
                    .collect();
                render(&votes)
            }
            "settlement" => render(&s.settlement(params::<QueryByIdParams>(data)?.id)?),
            "slash" => render(&s.slash(params::<QueryByIdParams>(data)?.id)?),
            "argument_slashes" => render(&s.argument_slashes(params::<QueryByIdParams>(data)?.id)?),
            "balance" => {
                let p: QueryBalanceParams = params(data)?;
                render(&s.balance(&p.address, &p.denom)?)
            }
            other => Err(GameError::UnknownQuery(other.to_string())),
        }
    }
}

impl Ledger {
    pub fn querier(&self) -> Querier<'_> {
        Querier::new(self.reader())
    }

    pub fn query(&self, path: &str, data: &[u8]) -> Result<Vec<u8>, GameError> {
        self.querier().query(path, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Fixture, BODY};

    fn query(fx: &Fixture, path: &str, data: &str) -> Result<serde_json::Value, GameError> {
        let bytes = Querier::new(fx.session()).query(path, data.as_bytes())?;
        Ok(serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn claim_by_id() {
        let fx = Fixture::new();
        fx.session()
            .submit_claim(BODY, 1, &fx.alice, None, fx.t(5))
            .unwrap();

        let claim = query(&fx, "claim", r#"{"id": 1}"#).unwrap();
        assert_eq!(claim["body"], BODY);
        assert_eq!(claim["creator"], "tru1alice");
        assert!(matches!(
            query(&fx, "claim", r#"{"id": 2}"#),
            Err(GameError::ClaimNotFound(2))
        ));
    }

    #[test]
    fn results_are_indented() {
        let fx = Fixture::new();
        let bytes = Querier::new(fx.session()).query("params", b"").unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("{\n  \""));
    }

    #[test]
    fn malformed_params_are_reported() {
        let fx = Fixture::new();
        let err = query(&fx, "claim", r#"{"ID": "one"}"#).unwrap_err();
        assert!(err.to_string().starts_with("Incorrectly formatted request data - "));
        assert!(matches!(query(&fx, "nope", "{}"), Err(GameError::UnknownQuery(_))));
        assert!(matches!(
            query(&fx, "votes", r#"{"game_id": 1, "kind": "argument"}"#),
            Err(GameError::InvalidVoteKind(_))
        ));
    }

    #[test]
    fn time_range_and_feed() {
        let fx = Fixture::new();
        let s = fx.session();
        for at in [10, 20, 30] {
            s.submit_claim(BODY, 1, &fx.alice, None, fx.t(at)).unwrap();
        }

        let ids = |value: serde_json::Value| -> Vec<u64> {
            value
                .as_array()
                .unwrap()
                .iter()
                .map(|c| c["id"].as_u64().unwrap())
                .collect()
        };
        let t = |secs: u64| fx.t(secs).as_secs();
        let range = format!(r#"{{"start": {}, "end": {}}}"#, t(10), t(20));
        assert_eq!(ids(query(&fx, "claims_by_time", &range).unwrap()), vec![1, 2]);
        let desc = format!(r#"{{"start": {}, "end": {}, "descending": true}}"#, t(10), t(30));
        assert_eq!(ids(query(&fx, "claims_by_time", &desc).unwrap()), vec![3, 2, 1]);
        let before = format!(r#"{{"end": {}}}"#, t(20));
        assert_eq!(ids(query(&fx, "claims_by_time", &before).unwrap()), vec![1, 2]);

        let latest = query(&fx, "feed", r#"{"category_id": 1, "feed_filter": "latest"}"#).unwrap();
        assert_eq!(ids(latest), vec![3, 2, 1]);
    }
}
