//! day-runner: headless runner for the Emporium tick engine.
//!
//! Seeds a demo company and fast-forwards its calendar, one advancement
//! per simulated day.
//!
//! Usage:
//!   day-runner --seed 12345 --days 30 --db run.db --start 2024-01-01

use anyhow::Result;
use emporium_core::{
    clock,
    config::SimConfig,
    engine::GameEngine,
    store::{CampaignRow, SimStore},
    types::DayKey,
};
use std::env;

const DEMO_COMPANY: &str = "demo-co";
const DEMO_PLAYER: &str = "demo-player";

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let days = parse_arg(&args, "--days", 30u64);
    let db = args
        .windows(2)
        .find(|w| w[0] == "--db")
        .map(|w| w[1].as_str())
        .unwrap_or(":memory:");
    let start_raw = args
        .windows(2)
        .find(|w| w[0] == "--start")
        .map(|w| w[1].as_str())
        .unwrap_or("2024-01-01");
    let start = clock::parse_day_key(start_raw)
        .ok_or_else(|| anyhow::anyhow!("--start must be YYYY-MM-DD, got {start_raw}"))?;

    println!("Emporium — day-runner");
    println!("  seed:  {seed}");
    println!("  days:  {days}");
    println!("  db:    {db}");
    println!("  start: {start_raw}");
    println!();

    let store = if db == ":memory:" {
        SimStore::in_memory()?
    } else {
        SimStore::open(db)?
    };
    store.migrate()?;

    let engine = GameEngine::new(store, SimConfig::default(), seed);
    seed_demo_world(&engine, start)?;

    for _ in 0..days {
        engine.advance_day(DEMO_COMPANY)?;
    }

    print_summary(&engine)?;
    Ok(())
}

/// A small but complete world: two category branches, three listings,
/// staff on payroll, and one campaign per scope in the first two weeks.
fn seed_demo_world(engine: &GameEngine, start: DayKey) -> Result<()> {
    let store = &engine.store;

    store.insert_company(DEMO_COMPANY, "Demo Trading Co", DEMO_PLAYER, 1, "US")?;
    store.create_wallet(DEMO_PLAYER)?;
    store.init_clock(DEMO_COMPANY, start)?;

    store.insert_market_zone("zone-na", "North America", 1.05)?;

    store.insert_category("electronics", None, 2, "Electronics")?;
    store.insert_category("phones", Some("electronics"), 3, "Phones")?;
    store.insert_category("home", None, 2, "Home & Living")?;
    store.insert_category("kitchen", Some("home"), 3, "Kitchen")?;

    store.insert_product_template("tpl-phone", "phones", 2, "Pocket Phone", 120.0)?;
    store.insert_product_template("tpl-kettle", "kitchen", 1, "Steel Kettle", 35.0)?;
    store.insert_product_template("tpl-blender", "kitchen", 2, "Pro Blender", 80.0)?;

    store.insert_sales_band("band-phones", "phones", 2, 1, 5, 6.0, 14.0, None)?;
    store.insert_sales_band("band-home", "home", 1, 1, 5, 10.0, 20.0, Some(16.0))?;
    store.insert_sales_band("band-home-q2", "home", 2, 1, 5, 4.0, 9.0, None)?;

    store.insert_warehouse(
        "wh-main",
        DEMO_COMPANY,
        "zone-na",
        "US",
        "Main Hub",
        1_200.0,
        400.0,
    )?;
    store.insert_listing("lst-phone", "wh-main", "tpl-phone", 126.0, 2_000)?;
    store.insert_listing("lst-kettle", "wh-main", "tpl-kettle", 33.0, 3_000)?;
    store.insert_listing("lst-blender", "wh-main", "tpl-blender", 99.0, 1_000)?;

    store.insert_staff_member("st-ops", DEMO_COMPANY, "operations", 2_200.0, "active")?;
    store.insert_staff_member("st-sales", DEMO_COMPANY, "sales", 1_800.0, "active")?;

    store.insert_price_rule("warehouse", None, 40.0, 1.0)?;
    store.insert_price_rule("category", None, 25.0, 1.0)?;
    store.insert_price_rule("product", None, 10.0, 1.0)?;

    let campaign_start = clock::next_day(start);
    let campaign = |id: &str, scope: &str, target: Option<&str>, pos: f64, end_offset: i64| {
        CampaignRow {
            campaign_id: id.to_string(),
            company_id: DEMO_COMPANY.to_string(),
            warehouse_id: "wh-main".to_string(),
            scope: scope.to_string(),
            target_id: target.map(str::to_string),
            start_day: campaign_start,
            end_day: campaign_start + chrono::Duration::days(end_offset),
            positive_boost_pct: pos,
            negative_boost_pct: 0.0,
            status: "SCHEDULED".to_string(),
        }
    };
    store.insert_campaign(&campaign("cmp-wh", "warehouse", None, 15.0, 6))?;
    store.insert_campaign(&campaign("cmp-home", "category", Some("home"), 10.0, 13))?;
    store.insert_campaign(&campaign("cmp-phone", "product", Some("lst-phone"), 25.0, 9))?;

    Ok(())
}

fn print_summary(engine: &GameEngine) -> Result<()> {
    let store = &engine.store;
    let clock_row = store.get_clock(DEMO_COMPANY)?;
    let wallet = store.get_wallet(DEMO_PLAYER)?;
    let (units, revenue) = store.sales_totals_for_company(DEMO_COMPANY)?;
    let unsettled = store.sum_unsettled_revenue("wh-main")?;
    let messages = store.messages_for_player(DEMO_PLAYER)?;

    println!("=== RUN SUMMARY ===");
    println!("  final day:    {}", clock::format_day_key(clock_row.current_day));
    println!("  clock version: {}", clock_row.version);
    println!("  units sold:   {units}");
    println!("  revenue:      ${revenue:.2}");
    println!("  unsettled:    ${unsettled:.2}");
    println!("  wallet (USD): ${:.2}", wallet.balance_usd);
    println!();

    println!("=== LEDGER ===");
    for (key, direction, category, amount) in store.ledger_entries_for_player(DEMO_PLAYER)? {
        println!("  {direction:>3} ${amount:>10.2}  {category:<12} {key}");
    }
    println!();

    println!("=== INBOX ({}) ===", messages.len());
    for message in messages.iter().rev().take(10) {
        println!("  [{}] {}: {}", message.day_key, message.kind, message.body);
    }

    let final_events = store.events_for_day(DEMO_COMPANY, clock_row.current_day)?;
    println!();
    println!("=== FINAL DAY EVENTS ===");
    for event in &final_events {
        let payload: serde_json::Value = serde_json::from_str(&event.payload)?;
        println!("  {:<22} {}", event.event_type, payload);
    }
    Ok(())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
