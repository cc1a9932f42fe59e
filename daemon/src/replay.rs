//! Block replay: genesis seeding plus message delivery and the end-of-block tick.

use std::io::BufRead;

use anyhow::Context;
use serde::Deserialize;

use tru_game::{Ledger, Msg, StoreBank, StoreRegistry, TickReport};
use tru_store::Bank;
use tru_types::{Coin, Timestamp};

use crate::config::DaemonConfig;

const GENESIS_KEY: &[u8] = b"meta:genesis";

/// One block of messages, read as a JSON line.
#[derive(Clone, Debug, Deserialize)]
pub struct Block {
    pub height: u64,
    pub time: Timestamp,
    #[serde(default)]
    pub msgs: Vec<Msg>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub blocks: u64,
    pub accepted: u64,
    pub rejected: u64,
    pub games_closed: u64,
    pub backings_matured: u64,
}

/// Seed categories, balances and arguments once. Returns `false` when the
/// store was already seeded.
pub fn seed_genesis(ledger: &Ledger, config: &DaemonConfig) -> anyhow::Result<bool> {
    let seeded = ledger.transact(|session| {
        let store = session.store();
        if store.get(GENESIS_KEY)?.is_some() {
            return Ok(false);
        }
        for category in &config.categories {
            StoreRegistry.put_category(store, category)?;
        }
        for balance in &config.balances {
            let coin = Coin::new(balance.denom.clone(), balance.amount);
            StoreBank.add_coins(store, &balance.address, &coin)?;
        }
        for argument in &config.arguments {
            StoreRegistry.put_argument(store, argument)?;
        }
        store.put(GENESIS_KEY, &[1])?;
        Ok(true)
    })?;

    if seeded {
        tracing::info!(
            categories = config.categories.len(),
            balances = config.balances.len(),
            arguments = config.arguments.len(),
            "seeded genesis state"
        );
    } else {
        tracing::debug!("genesis already applied");
    }
    Ok(seeded)
}

/// Deliver every message of `block`, then run the block tick at its time.
pub fn apply_block(
    ledger: &Ledger,
    block: &Block,
    summary: &mut ReplaySummary,
) -> anyhow::Result<TickReport> {
    for (index, msg) in block.msgs.iter().enumerate() {
        let result = ledger.handle(msg, block.time);
        if result.is_ok() {
            summary.accepted += 1;
        } else {
            summary.rejected += 1;
            tracing::warn!(
                height = block.height,
                index,
                action = msg.action(),
                code = result.code,
                codespace = %result.codespace,
                log = %result.log,
                "message rejected"
            );
        }
    }

    let report = ledger
        .tick(block.time)
        .with_context(|| format!("tick at height {}", block.height))?;
    summary.blocks += 1;
    summary.games_closed += (report.expired.len() + report.settled.len()) as u64;
    summary.backings_matured += report.matured.len() as u64;
    Ok(report)
}

/// Replay newline-delimited JSON blocks. Blank lines are skipped.
pub fn replay(ledger: &Ledger, reader: impl BufRead) -> anyhow::Result<ReplaySummary> {
    let mut summary = ReplaySummary::default();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line.context("reading block stream")?;
        if line.trim().is_empty() {
            continue;
        }
        let block: Block = serde_json::from_str(&line)
            .with_context(|| format!("decoding block on line {}", line_no + 1))?;
        apply_block(ledger, &block, &mut summary)?;
    }
    tracing::info!(
        blocks = summary.blocks,
        accepted = summary.accepted,
        rejected = summary.rejected,
        games_closed = summary.games_closed,
        backings_matured = summary.backings_matured,
        "replay finished"
    );
    Ok(summary)
}
