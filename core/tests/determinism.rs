use chrono::NaiveDate;
use emporium_core::{engine::GameEngine, types::DayKey};

fn day(y: i32, m: u32, d: u32) -> DayKey {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn build_world(seed: u64) -> GameEngine {
    let engine = GameEngine::build_test(seed).unwrap();
    let store = &engine.store;
    store.insert_company("acme", "Acme Trading", "player-1", 1, "US").unwrap();
    store.create_wallet("player-1").unwrap();
    store.init_clock("acme", day(2024, 3, 31)).unwrap();
    store.insert_market_zone("zone-na", "North America", 1.0).unwrap();
    store.insert_category("electronics", None, 2, "Electronics").unwrap();
    store.insert_category("phones", Some("electronics"), 3, "Phones").unwrap();
    store
        .insert_product_template("tpl-phone", "phones", 2, "Phone X", 100.0)
        .unwrap();
    store
        .insert_sales_band("band-1", "phones", 2, 1, 10, 8.0, 12.0, None)
        .unwrap();
    store
        .insert_warehouse("wh-1", "acme", "zone-na", "US", "Main Hub", 900.0, 300.0)
        .unwrap();
    store.insert_listing("lst-1", "wh-1", "tpl-phone", 100.0, 10_000).unwrap();
    store.insert_listing("lst-2", "wh-1", "tpl-phone", 95.0, 10_000).unwrap();
    store
        .insert_staff_member("st-1", "acme", "worker", 1500.0, "active")
        .unwrap();
    engine
}

#[test]
fn identical_seeds_replay_identical_months() {
    const SEED: u64 = 0xDA11_5EED;

    let engine_a = build_world(SEED);
    let engine_b = build_world(SEED);

    for _ in 0..30 {
        engine_a.advance_day("acme").unwrap();
        engine_b.advance_day("acme").unwrap();
    }

    assert_eq!(
        engine_a.current_day_key("acme").unwrap(),
        engine_b.current_day_key("acme").unwrap()
    );
    assert_eq!(
        engine_a.store.sales_totals_for_company("acme").unwrap(),
        engine_b.store.sales_totals_for_company("acme").unwrap()
    );
    assert_eq!(
        engine_a.store.get_wallet("player-1").unwrap().balance_usd,
        engine_b.store.get_wallet("player-1").unwrap().balance_usd
    );
}

#[test]
fn the_demand_stream_varies_across_days() {
    let engine = build_world(42);

    for _ in 0..10 {
        engine.advance_day("acme").unwrap();
    }

    // Ten days of jittered demand against two listings: if every day drew
    // the same jitter, totals would be a flat multiple of day one. Check
    // the per-day sold counts are not all identical.
    let mut per_day = Vec::new();
    let mut current = day(2024, 4, 1);
    for _ in 0..10 {
        let events = engine.store.events_for_day("acme", current).unwrap();
        let ticked = events
            .iter()
            .find(|e| e.event_type == "warehouse_ticked")
            .expect("every day ticks the warehouse");
        per_day.push(ticked.payload.clone());
        current = current.succ_opt().unwrap();
    }
    let first = &per_day[0];
    assert!(
        per_day.iter().any(|p| p != first),
        "every day produced an identical tick payload"
    );
}
