//! Transaction messages and their handler.
//!
//! A [`Msg`] is stateless-checked by [`Msg::validate_basic`] and then
//! applied atomically by [`Ledger::handle`]. The handler never fails: a
//! rejected message yields a [`TxResult`] with a non-zero code, the error's
//! codespace and its message as the log.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use tru_types::{ArgumentId, CategoryId, ClaimId, Coin, GameId, Timestamp, UserAddress};

use crate::ledger::Ledger;
use crate::slashing::{SlashReason, SlashType};
use crate::GameError;

/// Externally tagged: `{"create_backing": {...}}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Msg {
    SubmitClaim {
        body: String,
        category_id: CategoryId,
        creator: UserAddress,
        #[serde(default)]
        source: Option<String>,
    },
    CreateBacking {
        claim_id: ClaimId,
        amount: Coin,
        period_secs: u64,
        creator: UserAddress,
    },
    CreateChallenge {
        claim_id: ClaimId,
        amount: Coin,
        creator: UserAddress,
    },
    CastTokenVote {
        game_id: GameId,
        voter: UserAddress,
        vote: bool,
        amount: Coin,
    },
    ChangeStakeVote {
        game_id: GameId,
        creator: UserAddress,
        vote: bool,
    },
    SlashArgument {
        argument_id: ArgumentId,
        slash_type: SlashType,
        slash_reason: SlashReason,
        #[serde(default)]
        detailed_reason: String,
        creator: UserAddress,
    },
}

impl Msg {
    /// Message type as reported in the `action` tag.
    pub fn action(&self) -> &'static str {
        match self {
            Msg::SubmitClaim { .. } => "submit-claim",
            Msg::CreateBacking { .. } => "create-backing",
            Msg::CreateChallenge { .. } => "create-challenge",
            Msg::CastTokenVote { .. } => "cast-token-vote",
            Msg::ChangeStakeVote { .. } => "change-stake-vote",
            Msg::SlashArgument { .. } => "create-slash",
        }
    }

    /// Module the message belongs to, reported in the `category` tag.
    pub fn module(&self) -> &'static str {
        match self {
            Msg::SubmitClaim { .. } => "claim",
            Msg::CreateBacking { .. } => "backing",
            Msg::CreateChallenge { .. } => "challenge",
            Msg::CastTokenVote { .. } | Msg::ChangeStakeVote { .. } => "voting",
            Msg::SlashArgument { .. } => "slashing",
        }
    }

    pub fn signer(&self) -> &UserAddress {
        match self {
            Msg::SubmitClaim { creator, .. }
            | Msg::CreateBacking { creator, .. }
            | Msg::CreateChallenge { creator, .. }
            | Msg::ChangeStakeVote { creator, .. }
            | Msg::SlashArgument { creator, .. } => creator,
            Msg::CastTokenVote { voter, .. } => voter,
        }
    }

    /// Checks that need no ledger state.
    pub fn validate_basic(&self) -> Result<(), GameError> {
        match self {
            Msg::SubmitClaim { body, .. } if body.trim().is_empty() => Err(GameError::ClaimTooShort {
                len: 0,
                min: 1,
            }),
            Msg::CreateBacking { amount, .. }
            | Msg::CreateChallenge { amount, .. }
            | Msg::CastTokenVote { amount, .. }
                if amount.is_zero() =>
            {
                Err(GameError::ZeroAmount)
            }
            Msg::CreateBacking { period_secs: 0, .. } => Err(GameError::InvalidPeriod {
                period: 0,
                min: 1,
                max: u64::MAX,
            }),
            Msg::SlashArgument {
                slash_reason: SlashReason::Other,
                detailed_reason,
                ..
            } if detailed_reason.trim().is_empty() => Err(GameError::MissingDetailedReason),
            _ => Ok(()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Outcome of one message. `code == 0` means accepted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TxResult {
    pub code: u32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub codespace: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub log: String,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl TxResult {
    pub fn is_ok(&self) -> bool {
        self.code == 0
    }

    fn ok(data: Value, tags: Vec<Tag>) -> Self {
        Self {
            code: 0,
            codespace: String::new(),
            log: String::new(),
            data,
            tags,
        }
    }

    fn err(error: &GameError) -> Self {
        Self {
            code: error.code(),
            codespace: error.codespace().to_string(),
            log: error.to_string(),
            data: Value::Null,
            tags: Vec::new(),
        }
    }
}

fn to_data<T: Serialize>(value: &T) -> Result<Value, GameError> {
    serde_json::to_value(value).map_err(|e| GameError::Corrupted(format!("result encoding: {e}")))
}

impl Ledger {
    /// Validate and apply `msg` at block time `now`.
    pub fn handle(&self, msg: &Msg, now: Timestamp) -> TxResult {
        match self.apply_msg(msg, now) {
            Ok((data, mut tags)) => {
                let mut all = vec![
                    Tag::new("category", msg.module()),
                    Tag::new("action", msg.action()),
                ];
                all.append(&mut tags);
                TxResult::ok(data, all)
            }
            Err(error) => {
                tracing::debug!(
                    action = msg.action(),
                    signer = %msg.signer(),
                    code = error.code(),
                    %error,
                    "rejected message"
                );
                TxResult::err(&error)
            }
        }
    }

    fn apply_msg(&self, msg: &Msg, now: Timestamp) -> Result<(Value, Vec<Tag>), GameError> {
        msg.validate_basic()?;
        let data = match msg {
            Msg::SubmitClaim {
                body,
                category_id,
                creator,
                source,
            } => to_data(&self.submit_claim(body, *category_id, creator, source.clone(), now)?)?,
            Msg::CreateBacking {
                claim_id,
                amount,
                period_secs,
                creator,
            } => to_data(&self.create_backing(*claim_id, amount, *period_secs, creator, now)?)?,
            Msg::CreateChallenge {
                claim_id,
                amount,
                creator,
            } => to_data(&self.create_challenge(*claim_id, amount, creator, now)?)?,
            Msg::CastTokenVote {
                game_id,
                voter,
                vote,
                amount,
            } => to_data(&self.cast_token_vote(*game_id, voter, *vote, amount, now)?)?,
            Msg::ChangeStakeVote {
                game_id,
                creator,
                vote,
            } => to_data(&self.change_stake_vote(*game_id, creator, *vote, now)?)?,
            Msg::SlashArgument {
                argument_id,
                slash_type,
                slash_reason,
                detailed_reason,
                creator,
            } => {
                let outcome = self.create_slash(
                    *argument_id,
                    *slash_type,
                    *slash_reason,
                    detailed_reason,
                    creator,
                    now,
                )?;
                let mut tags = vec![Tag::new(
                    "min_slash_count",
                    self.params().slashing.min_slash_count.to_string(),
                )];
                if !outcome.punishments.is_empty() {
                    let results = serde_json::to_string(&outcome.punishments)
                        .map_err(|e| GameError::Corrupted(format!("result encoding: {e}")))?;
                    tags.push(Tag::new("slash_results", results));
                }
                return Ok((to_data(&outcome.slash)?, tags));
            }
        };
        Ok((data, Vec::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_keyed_by_type() {
        let json = r#"{"create_backing": {
            "claim_id": 3,
            "amount": {"denom": "trusteak", "amount": 100},
            "period_secs": 864000,
            "creator": "tru1bob"
        }}"#;
        let msg: Msg = serde_json::from_str(json).unwrap();
        assert_eq!(
            msg,
            Msg::CreateBacking {
                claim_id: 3,
                amount: Coin::new("trusteak", 100),
                period_secs: 864_000,
                creator: UserAddress::new("tru1bob"),
            }
        );
        assert_eq!(msg.action(), "create-backing");
    }

    #[test]
    fn bad_addresses_fail_to_decode() {
        let json = r#"{"change_stake_vote": {"game_id": 1, "creator": "cosmos1x", "vote": true}}"#;
        assert!(serde_json::from_str::<Msg>(json).is_err());
    }

    #[test]
    fn validate_basic_rejects_zero_amounts() {
        let msg = Msg::CreateChallenge {
            claim_id: 1,
            amount: Coin::zero("trusteak"),
            creator: UserAddress::new("tru1carol"),
        };
        assert!(matches!(msg.validate_basic(), Err(GameError::ZeroAmount)));

        let msg = Msg::SlashArgument {
            argument_id: 1,
            slash_type: SlashType::Unhelpful,
            slash_reason: SlashReason::Other,
            detailed_reason: String::new(),
            creator: UserAddress::new("tru1carol"),
        };
        assert!(matches!(msg.validate_basic(), Err(GameError::MissingDetailedReason)));
    }
}
