use chrono::NaiveDate;
use emporium_core::{
    engine::GameEngine,
    error::SimError,
    store::{Currency, Direction, LedgerPosting},
    types::DayKey,
};

fn day(y: i32, m: u32, d: u32) -> DayKey {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn posting(key: &str, player: &str, direction: Direction, amount: f64) -> LedgerPosting {
    LedgerPosting {
        idempotency_key: key.to_string(),
        player_id: player.to_string(),
        direction,
        category: "TEST".to_string(),
        currency: Currency::Usd,
        amount,
        day_key: day(2024, 4, 1),
    }
}

#[test]
fn posting_twice_with_same_key_writes_one_row_and_one_delta() {
    let engine = GameEngine::build_test(42).unwrap();
    engine.store.create_wallet("p1").unwrap();

    let p = posting("PAYROLL:c1:2024-04", "p1", Direction::In, 100.0);
    assert!(engine.store.post_wallet_transaction(&p).unwrap());
    // Retry with the identical key: success-no-op.
    assert!(!engine.store.post_wallet_transaction(&p).unwrap());

    assert_eq!(
        engine.store.count_ledger_entries("PAYROLL:c1:2024-04").unwrap(),
        1
    );
    let wallet = engine.store.get_wallet("p1").unwrap();
    assert_eq!(wallet.balance_usd, 100.0);
}

#[test]
fn different_keys_post_independently() {
    let engine = GameEngine::build_test(42).unwrap();
    engine.store.create_wallet("p1").unwrap();

    let a = posting("SETTLEMENT:w1:2024-04-05", "p1", Direction::In, 40.0);
    let b = posting("SETTLEMENT:w1:2024-04-20", "p1", Direction::In, 60.0);
    assert!(engine.store.post_wallet_transaction(&a).unwrap());
    assert!(engine.store.post_wallet_transaction(&b).unwrap());

    let wallet = engine.store.get_wallet("p1").unwrap();
    assert_eq!(wallet.balance_usd, 100.0);
    assert_eq!(engine.store.ledger_entries_for_player("p1").unwrap().len(), 2);
}

#[test]
fn out_posting_floors_the_balance_at_zero() {
    let engine = GameEngine::build_test(7).unwrap();
    engine.store.create_wallet("p1").unwrap();

    let seed = posting("SEED:p1", "p1", Direction::In, 30.0);
    engine.store.post_wallet_transaction(&seed).unwrap();

    let rent = posting("RENT:c1:2024-04", "p1", Direction::Out, 50.0);
    assert!(engine.store.post_wallet_transaction(&rent).unwrap());

    // The overdraft burns the remainder; the ledger still records the
    // full movement.
    let wallet = engine.store.get_wallet("p1").unwrap();
    assert_eq!(wallet.balance_usd, 0.0);
    assert_eq!(engine.store.count_ledger_entries("RENT:c1:2024-04").unwrap(), 1);
}

#[test]
fn posting_to_a_missing_wallet_is_not_found() {
    let engine = GameEngine::build_test(7).unwrap();

    let p = posting("TEST:nobody", "ghost", Direction::In, 10.0);
    let err = engine.store.post_wallet_transaction(&p).unwrap_err();
    assert!(matches!(err, SimError::NotFound { entity: "wallet", .. }));
}

#[test]
fn xp_and_diamond_currencies_hit_their_own_balances() {
    let engine = GameEngine::build_test(9).unwrap();
    engine.store.create_wallet("p1").unwrap();

    let mut xp = posting("XP:p1:1", "p1", Direction::In, 25.0);
    xp.currency = Currency::Xp;
    engine.store.post_wallet_transaction(&xp).unwrap();

    let mut diamond = posting("DIAMOND:p1:1", "p1", Direction::In, 3.0);
    diamond.currency = Currency::Diamond;
    engine.store.post_wallet_transaction(&diamond).unwrap();

    let wallet = engine.store.get_wallet("p1").unwrap();
    assert_eq!(wallet.balance_usd, 0.0);
    assert_eq!(wallet.balance_xp, 25.0);
    assert_eq!(wallet.balance_diamond, 3.0);
}
