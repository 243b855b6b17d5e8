//! Day advancement — the heart of the simulation, and the only entry
//! point that mutates a company's game clock.
//!
//! EXECUTION ORDER (fixed, documented, never reordered):
//!   1. Clock compare-and-swap (optimistic version check)
//!   2. Per warehouse, in stable order: marketing layering, then the
//!      sales tick, then the backlog check
//!   3. Awareness settlement for campaigns that ended yesterday
//!   4. Scheduled cost posting
//!   5. Bi-monthly settlement on payout days
//!   6. Finance summary notification
//!
//! RULES:
//!   - Everything runs inside one SQLite transaction per advancement;
//!     no partial day ever commits.
//!   - A stale clock version fails fast with ConcurrentAdvance and is
//!     never retried here; retry policy belongs to the caller.
//!   - Every financial side effect goes through the idempotent ledger
//!     poster, so a reissued day is always safe.
//!   - All randomness flows through the RngBank.

use crate::{
    clock,
    config::SimConfig,
    costs, demand,
    error::SimResult,
    event::SimEvent,
    marketing, notify, pricing,
    rng::{RngBank, SubsystemRng, SubsystemSlot},
    settlement,
    store::{CompanyRow, FinanceSchedule, SimStore, WarehouseRow},
    types::DayKey,
};
use serde::Serialize;

pub struct GameEngine {
    pub store: SimStore,
    pub config: SimConfig,
    rng_bank: RngBank,
}

/// What the caller of AdvanceDay gets back on success.
#[derive(Debug, Clone, Serialize)]
pub struct AdvanceSummary {
    pub previous_day: DayKey,
    pub new_day: DayKey,
    pub warehouses_ticked: usize,
    pub settlements_run: usize,
}

struct WarehouseTickOutcome {
    listings: usize,
    units_sold: i64,
    revenue: f64,
    unfilled_units: i64,
}

impl GameEngine {
    pub fn new(store: SimStore, config: SimConfig, seed: u64) -> Self {
        Self {
            store,
            config,
            rng_bank: RngBank::new(seed),
        }
    }

    /// In-memory engine with a migrated schema and default config.
    /// Tests seed their own companies through the store.
    pub fn build_test(seed: u64) -> SimResult<Self> {
        let store = SimStore::in_memory()?;
        store.migrate()?;
        Ok(Self::new(store, SimConfig::default(), seed))
    }

    // ── Read paths ─────────────────────────────────────────────

    pub fn current_day_key(&self, company_id: &str) -> SimResult<DayKey> {
        Ok(self.store.get_clock(company_id)?.current_day)
    }

    /// Read-only cost preview for a marketing purchase. No side effects.
    pub fn pricing_preview(
        &self,
        scope: marketing::PreviewScope,
        warehouse_id: Option<&str>,
        category_id: Option<&str>,
        listing_id: Option<&str>,
        package_id: Option<&str>,
    ) -> SimResult<marketing::PricingPreview> {
        marketing::pricing_preview(
            &self.store,
            &self.config,
            scope,
            warehouse_id,
            category_id,
            listing_id,
            package_id,
        )
    }

    // ── Day advancement ────────────────────────────────────────

    pub fn advance_day(&self, company_id: &str) -> SimResult<AdvanceSummary> {
        // Prerequisites first — a missing company, wallet, or clock
        // aborts before any write happens.
        let company = self.store.get_company(company_id)?;
        self.store.get_wallet(&company.owner_player_id)?;
        let clock_row = self.store.get_clock(company_id)?;

        let new_day = clock::next_day(clock_row.current_day);
        let schedule = self
            .store
            .get_finance_schedule(company_id)?
            .unwrap_or_else(|| FinanceSchedule::defaults(company_id, &self.config.finance));
        let mut rng = self
            .rng_bank
            .for_day(SubsystemSlot::Demand, clock::day_ordinal(new_day));

        let summary = self.store.in_transaction(|| {
            // The compare-and-swap comes first: the losing request must
            // not run any side effects at all.
            self.store
                .advance_clock(company_id, clock_row.version, new_day)?;

            let warehouses = self.store.warehouses_for_company(company_id)?;
            for warehouse in &warehouses {
                marketing::relayer_warehouse_boosts(
                    &self.store,
                    &warehouse.warehouse_id,
                    new_day,
                )?;
                let outcome = self.tick_warehouse(&company, warehouse, new_day, &mut rng)?;
                if outcome.unfilled_units > 0 {
                    self.warn_backlog(&company, warehouse, new_day, outcome.unfilled_units)?;
                }
            }

            marketing::settle_ended_campaigns(&self.store, &self.config, &company, new_day)?;

            let cost_summary =
                costs::post_scheduled_costs(&self.store, &company, &schedule, new_day)?;

            let mut settlements_run = 0;
            if schedule.is_payout_day(new_day) {
                for warehouse in &warehouses {
                    let paid = settlement::run_settlement(
                        &self.store,
                        &company,
                        &warehouse.warehouse_id,
                        new_day,
                    )?;
                    if paid > 0.0 {
                        settlements_run += 1;
                    }
                }
            }

            if cost_summary.any_posted() {
                notify::notify_once(
                    &self.store,
                    &company.owner_player_id,
                    &format!("FINANCE_SUMMARY:{company_id}:{}", clock::format_day_key(new_day)),
                    "finance_summary",
                    &finance_summary_body(&cost_summary, new_day),
                    new_day,
                )?;
            }

            let summary = AdvanceSummary {
                previous_day: clock_row.current_day,
                new_day,
                warehouses_ticked: warehouses.len(),
                settlements_run,
            };
            self.store.append_event(
                company_id,
                new_day,
                "engine",
                &SimEvent::DayAdvanced {
                    company_id: company_id.to_string(),
                    previous_day: summary.previous_day,
                    new_day,
                    warehouses_ticked: summary.warehouses_ticked,
                    settlements_run: summary.settlements_run,
                },
            )?;
            Ok(summary)
        })?;

        log::info!(
            "day={} company={company_id}: advanced ({} warehouses, {} settlements)",
            clock::format_day_key(summary.new_day),
            summary.warehouses_ticked,
            summary.settlements_run
        );
        Ok(summary)
    }

    /// Demand and fulfillment for one warehouse on one day. Consumes the
    /// freshly layered boosts as a visibility factor on top of the
    /// price-driven demand.
    fn tick_warehouse(
        &self,
        company: &CompanyRow,
        warehouse: &WarehouseRow,
        day: DayKey,
        rng: &mut SubsystemRng,
    ) -> SimResult<WarehouseTickOutcome> {
        let zone_multiplier = self
            .store
            .zone_price_multiplier(&warehouse.zone_id)?
            .unwrap_or(1.0);

        let listings = self.store.listed_listings(&warehouse.warehouse_id)?;
        let mut outcome = WarehouseTickOutcome {
            listings: listings.len(),
            units_sold: 0,
            revenue: 0.0,
            unfilled_units: 0,
        };

        for listing in &listings {
            let template = self.store.get_product_template(&listing.template_id)?;
            let index =
                pricing::price_index(listing.sale_price, template.suggested_price, zone_multiplier);
            let multiplier = pricing::price_multiplier(index);
            let base_desired =
                demand::desired_qty(&self.store, &self.config, rng, &template, company.tier, multiplier)?;

            let visibility =
                1.0 + (listing.positive_boost_pct - listing.negative_boost_pct) / 100.0;
            let desired = ((base_desired as f64 * visibility).round() as i64).max(0);

            let sold = desired.min(listing.stock);
            if sold > 0 {
                self.store.decrement_stock(&listing.listing_id, sold)?;
            }
            let revenue = sold as f64 * listing.sale_price;
            self.store.insert_sales_log(
                &listing.listing_id,
                &warehouse.warehouse_id,
                day,
                desired,
                sold,
                revenue,
            )?;

            outcome.units_sold += sold;
            outcome.revenue += revenue;
            outcome.unfilled_units += desired - sold;
        }

        self.store.append_event(
            &company.company_id,
            day,
            "engine",
            &SimEvent::WarehouseTicked {
                warehouse_id: warehouse.warehouse_id.clone(),
                day,
                listings: outcome.listings,
                units_sold: outcome.units_sold,
                revenue: outcome.revenue,
            },
        )?;
        log::debug!(
            "day={} tick: warehouse {} sold {} units (${:.2}), {} unfilled",
            clock::format_day_key(day),
            warehouse.warehouse_id,
            outcome.units_sold,
            outcome.revenue,
            outcome.unfilled_units
        );
        Ok(outcome)
    }

    fn warn_backlog(
        &self,
        company: &CompanyRow,
        warehouse: &WarehouseRow,
        day: DayKey,
        unfilled_units: i64,
    ) -> SimResult<()> {
        notify::notify_once(
            &self.store,
            &company.owner_player_id,
            &format!(
                "BACKLOG:{}:{}",
                warehouse.warehouse_id,
                clock::format_day_key(day)
            ),
            "backlog_warning",
            &format!(
                "{} could not cover {} units of demand on {}.",
                warehouse.label,
                unfilled_units,
                clock::format_day_key(day)
            ),
            day,
        )?;
        self.store.append_event(
            &company.company_id,
            day,
            "engine",
            &SimEvent::BacklogDetected {
                warehouse_id: warehouse.warehouse_id.clone(),
                day,
                unfilled_units,
            },
        )?;
        Ok(())
    }
}

fn finance_summary_body(summary: &costs::CostSummary, day: DayKey) -> String {
    let mut posted = Vec::new();
    if summary.payroll_posted {
        posted.push("payroll");
    }
    if summary.rent_posted {
        posted.push("rent");
    }
    if summary.overhead_posted {
        posted.push("overhead");
    }
    format!(
        "Scheduled costs posted on {}: {}.",
        clock::format_day_key(day),
        posted.join(", ")
    )
}
