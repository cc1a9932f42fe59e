//! The ledger over a real LMDB environment: state survives a reopen.

use std::path::Path;
use std::sync::Arc;

use tru_game::{Ledger, Outcome, Services, StoreBank, StoreRegistry};
use tru_store::{Bank, Category};
use tru_store_lmdb::{LmdbEnvironment, Migrator};
use tru_types::{ClaimState, Coin, GameState, LedgerParams, Timestamp, UserAddress};

const DAY: u64 = 24 * 3600;
const BODY: &str = "Water boils at 100 C at sea level.";

fn addr(name: &str) -> UserAddress {
    UserAddress::new(format!("tru1{name}"))
}

fn stake(amount: u128) -> Coin {
    Coin::new("trusteak", amount)
}

fn open(dir: &Path) -> Ledger {
    let env = LmdbEnvironment::open(dir, 1 << 24).unwrap();
    Migrator::run(&env).unwrap();
    Ledger::new(
        Arc::new(env.kv_store()),
        LedgerParams::default(),
        Services::store_backed(),
    )
    .unwrap()
}

fn balance(ledger: &Ledger, name: &str, denom: &str) -> u128 {
    ledger.reader().balance(&addr(name), denom).unwrap().amount
}

#[test]
fn settled_game_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();

    let (claim_id, game_id) = {
        let ledger = open(dir.path());
        ledger
            .transact(|s| {
                StoreRegistry.put_category(
                    s.store(),
                    &Category {
                        id: 1,
                        slug: "crypto".into(),
                        title: "Crypto".into(),
                        description: String::new(),
                    },
                )?;
                for name in ["author", "challenger", "v1"] {
                    StoreBank.add_coins(s.store(), &addr(name), &stake(1_000))?;
                }
                Ok(())
            })
            .unwrap();

        let claim_id = ledger
            .submit_claim(BODY, 1, &addr("author"), None, Timestamp::new(0))
            .unwrap()
            .id;
        let game_id = ledger
            .create_challenge(claim_id, &stake(20), &addr("challenger"), Timestamp::new(10))
            .unwrap()
            .game_id;
        ledger
            .cast_token_vote(game_id, &addr("v1"), true, &stake(50), Timestamp::new(20))
            .unwrap();

        let report = ledger.tick(Timestamp::new(10 + DAY)).unwrap();
        assert_eq!(report.settled.len(), 1);
        (claim_id, game_id)
    };

    let ledger = open(dir.path());
    let reader = ledger.reader();
    assert_eq!(reader.claim(claim_id).unwrap().state, ClaimState::Confirmed);
    assert_eq!(reader.game(game_id).unwrap().state, GameState::Confirmed);

    let record = reader.settlement(game_id).unwrap().expect("settlement record");
    assert_eq!(record.outcome, Outcome::Confirmed);
    assert_eq!(record.pool, stake(20));
    assert_eq!(record.winners, 1);

    assert_eq!(balance(&ledger, "challenger", "trusteak"), 980);
    assert_eq!(balance(&ledger, "v1", "trusteak"), 1_000);
    assert_eq!(balance(&ledger, "v1", "crypto"), 20);

    // A second tick at a later time finds nothing left to close.
    assert!(ledger.tick(Timestamp::new(10 * DAY)).unwrap().is_empty());
}

#[test]
fn rejected_operation_leaves_lmdb_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = open(dir.path());

    // No category registered, so the claim is rejected before anything is written.
    assert!(ledger
        .submit_claim(BODY, 1, &addr("author"), None, Timestamp::new(0))
        .is_err());
    drop(ledger);

    let ledger = open(dir.path());
    assert!(ledger.reader().claims().unwrap().is_empty());
}
