use chrono::NaiveDate;
use emporium_core::{engine::GameEngine, error::SimError, store::CampaignRow, types::DayKey};

fn day(y: i32, m: u32, d: u32) -> DayKey {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// One company, one warehouse, one well-stocked listing with a demand
/// band, two staffers, clock parked on `start`.
fn engine_with_world(start: DayKey) -> GameEngine {
    let engine = GameEngine::build_test(42).unwrap();
    let store = &engine.store;
    store.insert_company("acme", "Acme Trading", "player-1", 1, "US").unwrap();
    store.create_wallet("player-1").unwrap();
    store.init_clock("acme", start).unwrap();
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
    store.insert_listing("lst-1", "wh-1", "tpl-phone", 100.0, 1_000).unwrap();
    store
        .insert_staff_member("st-1", "acme", "worker", 1500.0, "active")
        .unwrap();
    store
        .insert_staff_member("st-2", "acme", "worker", 1500.0, "active")
        .unwrap();
    engine
}

#[test]
fn a_day_advances_exactly_one_step() {
    let engine = engine_with_world(day(2024, 4, 9));

    let summary = engine.advance_day("acme").unwrap();
    assert_eq!(summary.previous_day, day(2024, 4, 9));
    assert_eq!(summary.new_day, day(2024, 4, 10));
    assert_eq!(summary.warehouses_ticked, 1);
    assert_eq!(summary.settlements_run, 0);

    let clock = engine.store.get_clock("acme").unwrap();
    assert_eq!(clock.current_day, day(2024, 4, 10));
    assert_eq!(clock.version, 1);
    assert_eq!(engine.current_day_key("acme").unwrap(), day(2024, 4, 10));

    // The tick sold something out of the 1000-unit stock.
    let (units, revenue) = engine.store.sales_totals_for_company("acme").unwrap();
    assert!(units > 0);
    assert!(revenue > 0.0);
}

#[test]
fn each_advance_bumps_the_version_by_one() {
    let engine = engine_with_world(day(2024, 4, 9));

    engine.advance_day("acme").unwrap();
    engine.advance_day("acme").unwrap();

    let clock = engine.store.get_clock("acme").unwrap();
    assert_eq!(clock.version, 2);
    assert_eq!(clock.current_day, day(2024, 4, 11));
}

#[test]
fn a_stale_version_fails_with_concurrent_advance() {
    let engine = engine_with_world(day(2024, 4, 9));

    // Both requests observe version 0; the first commits.
    let observed = engine.store.get_clock("acme").unwrap();
    engine.advance_day("acme").unwrap();

    // The second request's conditional update hits zero rows.
    let err = engine
        .store
        .advance_clock("acme", observed.version, day(2024, 4, 10))
        .unwrap_err();
    assert!(matches!(err, SimError::ConcurrentAdvance { .. }));

    // Exactly one advancement took effect.
    let clock = engine.store.get_clock("acme").unwrap();
    assert_eq!(clock.version, 1);
    assert_eq!(clock.current_day, day(2024, 4, 10));
}

#[test]
fn advancing_an_unknown_company_is_not_found() {
    let engine = GameEngine::build_test(42).unwrap();
    let err = engine.advance_day("ghost").unwrap_err();
    assert!(matches!(err, SimError::NotFound { entity: "company", .. }));
}

#[test]
fn first_of_month_posts_payroll_and_summarizes() {
    let engine = engine_with_world(day(2024, 3, 31));

    engine.advance_day("acme").unwrap();

    assert_eq!(
        engine.store.count_ledger_entries("PAYROLL:acme:2024-04").unwrap(),
        1
    );
    assert!(engine
        .store
        .message_exists("player-1", "FINANCE_SUMMARY:acme:2024-04-01")
        .unwrap());

    let events = engine.store.events_for_day("acme", day(2024, 4, 1)).unwrap();
    assert!(events.iter().any(|e| e.event_type == "scheduled_cost_posted"));
    assert!(events.iter().any(|e| e.event_type == "day_advanced"));
}

#[test]
fn payout_day_settles_warehouse_revenue_into_the_wallet() {
    let engine = engine_with_world(day(2024, 4, 4));

    let summary = engine.advance_day("acme").unwrap();
    assert_eq!(summary.new_day, day(2024, 4, 5));
    assert_eq!(summary.settlements_run, 1);

    let (_, revenue) = engine.store.sales_totals_for_company("acme").unwrap();
    assert!(revenue > 0.0);
    assert_eq!(engine.store.get_wallet("player-1").unwrap().balance_usd, revenue);
    assert_eq!(engine.store.sum_unsettled_revenue("wh-1").unwrap(), 0.0);
    assert_eq!(
        engine
            .store
            .count_ledger_entries("SETTLEMENT:wh-1:2024-04-05")
            .unwrap(),
        1
    );
}

#[test]
fn ordinary_days_run_no_settlement() {
    let engine = engine_with_world(day(2024, 4, 9));

    let summary = engine.advance_day("acme").unwrap();
    assert_eq!(summary.settlements_run, 0);
    assert!(engine.store.sum_unsettled_revenue("wh-1").unwrap() > 0.0);
}

#[test]
fn unfilled_demand_warns_the_owner_once() {
    let engine = engine_with_world(day(2024, 4, 9));
    engine.store.insert_listing("lst-dry", "wh-1", "tpl-phone", 100.0, 0).unwrap();

    engine.advance_day("acme").unwrap();

    assert!(engine
        .store
        .message_exists("player-1", "BACKLOG:wh-1:2024-04-10")
        .unwrap());
    let events = engine.store.events_for_day("acme", day(2024, 4, 10)).unwrap();
    assert!(events.iter().any(|e| e.event_type == "backlog_detected"));
}

#[test]
fn layered_campaign_boosts_land_on_the_listing() {
    let engine = engine_with_world(day(2024, 3, 31));
    let store = &engine.store;
    store.add_permanent_boost("lst-1", 5.0).unwrap();
    store
        .insert_campaign(&CampaignRow {
            campaign_id: "cmp-w".to_string(),
            company_id: "acme".to_string(),
            warehouse_id: "wh-1".to_string(),
            scope: "warehouse".to_string(),
            target_id: None,
            start_day: day(2024, 4, 1),
            end_day: day(2024, 4, 14),
            positive_boost_pct: 20.0,
            negative_boost_pct: 0.0,
            status: "ACTIVE".to_string(),
        })
        .unwrap();
    store
        .insert_campaign(&CampaignRow {
            campaign_id: "cmp-c".to_string(),
            company_id: "acme".to_string(),
            warehouse_id: "wh-1".to_string(),
            scope: "category".to_string(),
            target_id: Some("electronics".to_string()),
            start_day: day(2024, 4, 1),
            end_day: day(2024, 4, 14),
            positive_boost_pct: 10.0,
            negative_boost_pct: 0.0,
            status: "ACTIVE".to_string(),
        })
        .unwrap();

    engine.advance_day("acme").unwrap();

    let listing = store.get_listing("lst-1").unwrap();
    assert_eq!(listing.positive_boost_pct, 35.0);
}

#[test]
fn campaigns_stay_active_through_their_final_day_then_settle() {
    let engine = engine_with_world(day(2024, 3, 31));
    let store = &engine.store;
    store.add_permanent_boost("lst-1", 5.0).unwrap();
    store
        .insert_campaign(&CampaignRow {
            campaign_id: "cmp-w".to_string(),
            company_id: "acme".to_string(),
            warehouse_id: "wh-1".to_string(),
            scope: "warehouse".to_string(),
            target_id: None,
            start_day: day(2024, 3, 15),
            end_day: day(2024, 4, 1),
            positive_boost_pct: 20.0,
            negative_boost_pct: 0.0,
            status: "ACTIVE".to_string(),
        })
        .unwrap();

    // Advance into the campaign's final day: it still boosts, nothing
    // settles yet.
    engine.advance_day("acme").unwrap();
    let listing = store.get_listing("lst-1").unwrap();
    assert_eq!(listing.positive_boost_pct, 25.0);
    assert_eq!(listing.permanent_positive_boost_pct, 5.0);
    assert_eq!(store.get_campaign("cmp-w").unwrap().status, "ACTIVE");

    // The day after: the ephemeral boost is gone, the one-time awareness
    // gain lands (visible in boosts from tomorrow), and the owner hears
    // about it.
    engine.advance_day("acme").unwrap();
    let listing = store.get_listing("lst-1").unwrap();
    assert_eq!(listing.positive_boost_pct, 5.0);
    assert_eq!(listing.permanent_positive_boost_pct, 7.0);
    assert_eq!(store.get_campaign("cmp-w").unwrap().status, "ENDED");
    assert!(store.message_exists("player-1", "CAMPAIGN_END:cmp-w").unwrap());
}
