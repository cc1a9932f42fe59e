//! Key layout.
//!
//! Keys are ASCII table prefixes followed by fixed-width big-endian ids and
//! timestamps, so prefix scans come back in numeric and chronological order.
//! Addresses never contain `:`, so `<addr>:` is an unambiguous prefix.
//!
//! | key | value |
//! |---|---|
//! | `counter:<kind>` | last assigned id |
//! | `claim:id:<claim>` | `Claim` |
//! | `claim:cat:<cat>:all:<created><claim>` | claim id |
//! | `claim:cat:<cat>:challenged:<created><claim>` | claim id |
//! | `claim:creator:<addr>:<claim>` | claim id |
//! | `claim:time:<created><claim>` | claim id |
//! | `backing:id:<backing>` | `Backing` |
//! | `backing:claim:<claim>:<addr>` | backing id |
//! | `backing:settled:<backing>` | empty |
//! | `game:id:<game>` | `ValidationGame` |
//! | `game:claim:<claim>` | game id |
//! | `game:<game>:challenges:user:<addr>` | challenge id |
//! | `game:<game>:votes:user:<addr>` | vote id |
//! | `game:<game>:recast:<addr>` | overridden choice |
//! | `challenge:id:<challenge>` | `Challenge` |
//! | `vote:id:<vote>` | `TokenVote` |
//! | `settlement:<game>` | `SettlementRecord` |
//! | `slash:id:<slash>` | `Slash` |
//! | `slash:argument:<arg>:<addr>` | slash id |
//! | `slash:punished:<arg>` | empty |
//! | `queue:<name>:{head,tail}` / `queue:<name>:entry:<seq>` | expiry queue |

use tru_types::{
    ArgumentId, BackingId, CategoryId, ChallengeId, ClaimId, GameId, SlashId, Timestamp,
    UserAddress, VoteId,
};

fn key(parts: &[&[u8]]) -> Vec<u8> {
    let mut out = Vec::with_capacity(parts.iter().map(|p| p.len()).sum());
    for part in parts {
        out.extend_from_slice(part);
    }
    out
}

fn with_user(prefix: Vec<u8>, user: &UserAddress) -> Vec<u8> {
    let mut out = prefix;
    out.extend_from_slice(user.as_bytes());
    out
}

// ── Counters ────────────────────────────────────────────────────────────

pub const CLAIM_COUNTER: &[u8] = b"counter:claim";
pub const BACKING_COUNTER: &[u8] = b"counter:backing";
pub const GAME_COUNTER: &[u8] = b"counter:game";
pub const CHALLENGE_COUNTER: &[u8] = b"counter:challenge";
pub const VOTE_COUNTER: &[u8] = b"counter:vote";
pub const SLASH_COUNTER: &[u8] = b"counter:slash";

// ── Claims ──────────────────────────────────────────────────────────────

pub const CLAIM_RECORD_PREFIX: &[u8] = b"claim:id:";
pub const CLAIM_TIME_PREFIX: &[u8] = b"claim:time:";

pub fn claim(id: ClaimId) -> Vec<u8> {
    key(&[CLAIM_RECORD_PREFIX, &id.to_be_bytes()])
}

pub fn category_claims_prefix(category: CategoryId, challenged: bool) -> Vec<u8> {
    let tag: &[u8] = if challenged { b":challenged:" } else { b":all:" };
    key(&[b"claim:cat:", &category.to_be_bytes(), tag])
}

pub fn category_claim(
    category: CategoryId,
    challenged: bool,
    created: Timestamp,
    id: ClaimId,
) -> Vec<u8> {
    key(&[
        &category_claims_prefix(category, challenged),
        &created.to_be_bytes(),
        &id.to_be_bytes(),
    ])
}

pub fn creator_claims_prefix(creator: &UserAddress) -> Vec<u8> {
    let mut out = with_user(b"claim:creator:".to_vec(), creator);
    out.push(b':');
    out
}

pub fn creator_claim(creator: &UserAddress, id: ClaimId) -> Vec<u8> {
    key(&[&creator_claims_prefix(creator), &id.to_be_bytes()])
}

/// Start of the created-time index at `time` (all ids at that second follow).
pub fn claim_time_start(time: Timestamp) -> Vec<u8> {
    key(&[CLAIM_TIME_PREFIX, &time.to_be_bytes()])
}

pub fn claim_time(time: Timestamp, id: ClaimId) -> Vec<u8> {
    key(&[&claim_time_start(time), &id.to_be_bytes()])
}

// ── Backings ────────────────────────────────────────────────────────────

pub fn backing(id: BackingId) -> Vec<u8> {
    key(&[b"backing:id:", &id.to_be_bytes()])
}

pub fn claim_backings_prefix(claim: ClaimId) -> Vec<u8> {
    key(&[b"backing:claim:", &claim.to_be_bytes(), b":"])
}

pub fn claim_backing(claim: ClaimId, user: &UserAddress) -> Vec<u8> {
    with_user(claim_backings_prefix(claim), user)
}

pub fn backing_settled(id: BackingId) -> Vec<u8> {
    key(&[b"backing:settled:", &id.to_be_bytes()])
}

// ── Games, challenges, votes ────────────────────────────────────────────

pub fn game(id: GameId) -> Vec<u8> {
    key(&[b"game:id:", &id.to_be_bytes()])
}

pub fn claim_game(claim: ClaimId) -> Vec<u8> {
    key(&[b"game:claim:", &claim.to_be_bytes()])
}

pub fn game_challenges_prefix(game: GameId) -> Vec<u8> {
    key(&[b"game:", &game.to_be_bytes(), b":challenges:user:"])
}

pub fn game_challenge(game: GameId, user: &UserAddress) -> Vec<u8> {
    with_user(game_challenges_prefix(game), user)
}

pub fn game_votes_prefix(game: GameId) -> Vec<u8> {
    key(&[b"game:", &game.to_be_bytes(), b":votes:user:"])
}

pub fn game_vote(game: GameId, user: &UserAddress) -> Vec<u8> {
    with_user(game_votes_prefix(game), user)
}

pub fn game_recast(game: GameId, user: &UserAddress) -> Vec<u8> {
    with_user(key(&[b"game:", &game.to_be_bytes(), b":recast:"]), user)
}

pub fn challenge(id: ChallengeId) -> Vec<u8> {
    key(&[b"challenge:id:", &id.to_be_bytes()])
}

pub fn vote(id: VoteId) -> Vec<u8> {
    key(&[b"vote:id:", &id.to_be_bytes()])
}

pub fn settlement(game: GameId) -> Vec<u8> {
    key(&[b"settlement:", &game.to_be_bytes()])
}

// ── Slashes ─────────────────────────────────────────────────────────────

pub fn slash(id: SlashId) -> Vec<u8> {
    key(&[b"slash:id:", &id.to_be_bytes()])
}

pub fn argument_slashes_prefix(argument: ArgumentId) -> Vec<u8> {
    key(&[b"slash:argument:", &argument.to_be_bytes(), b":"])
}

pub fn argument_slash(argument: ArgumentId, user: &UserAddress) -> Vec<u8> {
    with_user(argument_slashes_prefix(argument), user)
}

pub fn argument_punished(argument: ArgumentId) -> Vec<u8> {
    key(&[b"slash:punished:", &argument.to_be_bytes()])
}

// ── Expiry queues ───────────────────────────────────────────────────────

pub fn queue_head(name: &str) -> Vec<u8> {
    format!("queue:{name}:head").into_bytes()
}

pub fn queue_tail(name: &str) -> Vec<u8> {
    format!("queue:{name}:tail").into_bytes()
}

pub fn queue_entries_prefix(name: &str) -> Vec<u8> {
    format!("queue:{name}:entry:").into_bytes()
}

pub fn queue_entry(name: &str, seq: u64) -> Vec<u8> {
    key(&[&queue_entries_prefix(name), &seq.to_be_bytes()])
}
