//! Slashing ledger: flags against arguments and threshold punishment.
//!
//! Slashes accumulate per argument. The slash that brings the count to
//! `min_slash_count` punishes the argument's author once: a capped stake
//! penalty, a curator reward for every slasher and a jail term. Later
//! slashes are recorded without further effect.

use std::fmt;

use serde::{Deserialize, Serialize};

use tru_store::ArgumentInfo;
use tru_types::{ArgumentId, ClaimId, Coin, SlashId, Timestamp, UserAddress};

use crate::keys;
use crate::session::Session;
use crate::GameError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlashType {
    Unhelpful,
    Harmful,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlashReason {
    LogicOrEvidenceAbsent,
    IssueNotAddressed,
    ByDesign,
    Plagiarism,
    /// Free text in `detailed_reason`.
    Other,
}

impl fmt::Display for SlashReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SlashReason::LogicOrEvidenceAbsent => "logic or evidence absent",
            SlashReason::IssueNotAddressed => "issue not addressed",
            SlashReason::ByDesign => "by design",
            SlashReason::Plagiarism => "plagiarism",
            SlashReason::Other => "other",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slash {
    pub id: SlashId,
    pub argument_id: ArgumentId,
    pub claim_id: ClaimId,
    pub slash_type: SlashType,
    pub reason: SlashReason,
    pub detailed_reason: String,
    pub creator: UserAddress,
    pub created_at: Timestamp,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PunishmentKind {
    /// Stake taken from the argument's author.
    AuthorPenalty,
    /// Paid to each slasher.
    CuratorReward,
    /// Author jailed; the coin is zero.
    Jailed,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PunishmentResult {
    #[serde(rename = "type")]
    pub kind: PunishmentKind,
    pub address: UserAddress,
    pub coin: Coin,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlashOutcome {
    pub slash: Slash,
    /// Slashes on the argument, this one included.
    pub slash_count: u32,
    /// Empty unless this slash crossed the threshold.
    pub punishments: Vec<PunishmentResult>,
}

impl Session<'_> {
    pub fn create_slash(
        &self,
        argument_id: ArgumentId,
        slash_type: SlashType,
        reason: SlashReason,
        detailed_reason: &str,
        creator: &UserAddress,
        now: Timestamp,
    ) -> Result<SlashOutcome, GameError> {
        let argument = self
            .services
            .arguments
            .argument(self.store, argument_id)?
            .ok_or(GameError::ArgumentNotFound(argument_id))?;
        self.ensure_not_jailed(creator, now)?;
        if &argument.creator == creator {
            return Err(GameError::SelfSlash(creator.clone()));
        }
        if self.store.has(&keys::argument_slash(argument_id, creator))? {
            return Err(GameError::DuplicateSlash {
                argument_id,
                creator: creator.clone(),
            });
        }
        if reason == SlashReason::Other {
            let len = detailed_reason.chars().count();
            let max = self.params.slashing.max_detailed_reason_length;
            if detailed_reason.trim().is_empty() {
                return Err(GameError::MissingDetailedReason);
            }
            if len > max {
                return Err(GameError::DetailedReasonTooLong { len, max });
            }
        }

        let id = self.next_id(keys::SLASH_COUNTER)?;
        let slash = Slash {
            id,
            argument_id,
            claim_id: argument.claim_id,
            slash_type,
            reason,
            detailed_reason: detailed_reason.to_string(),
            creator: creator.clone(),
            created_at: now,
        };
        self.save(&keys::slash(id), &slash)?;
        self.save_id(&keys::argument_slash(argument_id, creator), id)?;

        let slash_count = self.slash_count(argument_id)?;
        tracing::info!(
            slash_id = id,
            argument_id,
            creator = %creator,
            reason = %reason,
            slash_count,
            "created slash"
        );

        let punishments = if slash_count == self.params.slashing.min_slash_count
            && !self.store.has(&keys::argument_punished(argument_id))?
        {
            self.punish(&argument, now)?
        } else {
            Vec::new()
        };
        Ok(SlashOutcome {
            slash,
            slash_count,
            punishments,
        })
    }

    fn punish(&self, argument: &ArgumentInfo, now: Timestamp) -> Result<Vec<PunishmentResult>, GameError> {
        let params = &self.params.slashing;
        let denom = &self.params.stake_denom;
        let mut results = Vec::new();

        let balance = self.balance(&argument.creator, denom)?;
        let penalty = Coin::new(denom.clone(), params.penalty.min(balance.amount));
        if !penalty.is_zero() {
            self.debit(&argument.creator, &penalty)?;
            results.push(PunishmentResult {
                kind: PunishmentKind::AuthorPenalty,
                address: argument.creator.clone(),
                coin: penalty,
            });
        }

        let reward = Coin::new(denom.clone(), params.curator_reward);
        for slash in self.argument_slashes(argument.id)? {
            self.credit(&slash.creator, &reward)?;
            results.push(PunishmentResult {
                kind: PunishmentKind::CuratorReward,
                address: slash.creator,
                coin: reward.clone(),
            });
        }

        let until = now.plus_secs(params.jail_duration_secs);
        self.services.accounts.jail(self.store, &argument.creator, until)?;
        results.push(PunishmentResult {
            kind: PunishmentKind::Jailed,
            address: argument.creator.clone(),
            coin: Coin::zero(denom.clone()),
        });

        self.store.put(&keys::argument_punished(argument.id), &[])?;
        tracing::info!(
            argument_id = argument.id,
            author = %argument.creator,
            jailed_until = %until,
            results = results.len(),
            "punished argument author"
        );
        Ok(results)
    }

    pub fn slash(&self, id: SlashId) -> Result<Slash, GameError> {
        self.load(&keys::slash(id))?.ok_or(GameError::SlashNotFound(id))
    }

    pub fn argument_slashes(&self, argument_id: ArgumentId) -> Result<Vec<Slash>, GameError> {
        self.ids_under(&keys::argument_slashes_prefix(argument_id))?
            .into_iter()
            .map(|id| self.slash(id))
            .collect()
    }

    pub fn slash_count(&self, argument_id: ArgumentId) -> Result<u32, GameError> {
        let count = self
            .store
            .scan_prefix(&keys::argument_slashes_prefix(argument_id))?
            .len();
        u32::try_from(count).map_err(|_| GameError::Overflow("slash count"))
    }

    pub fn is_punished(&self, argument_id: ArgumentId) -> Result<bool, GameError> {
        Ok(self.store.has(&keys::argument_punished(argument_id))?)
    }
}
