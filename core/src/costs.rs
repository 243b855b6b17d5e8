//! Scheduled financial obligations — payroll, rent, overhead.
//!
//! Trigger days come from the company's finance schedule (config defaults
//! apply when the row is absent). Each category posts through the ledger
//! with a monthly cycle key; that key is the only dedupe guard, so
//! re-running the same day — or re-running after a crash mid-tick —
//! cannot double-post.

use crate::{
    clock,
    error::SimResult,
    event::SimEvent,
    store::{CompanyRow, Currency, Direction, FinanceSchedule, LedgerPosting, SimStore},
    types::DayKey,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct CostSummary {
    pub payroll_posted: bool,
    pub rent_posted: bool,
    pub overhead_posted: bool,
}

impl CostSummary {
    pub fn any_posted(&self) -> bool {
        self.payroll_posted || self.rent_posted || self.overhead_posted
    }
}

/// Evaluate the day-of-month triggers and post whatever is due.
/// Flags report only *new* postings; a deduped re-run reports false.
pub fn post_scheduled_costs(
    store: &SimStore,
    company: &CompanyRow,
    schedule: &FinanceSchedule,
    day: DayKey,
) -> SimResult<CostSummary> {
    let dom = clock::day_of_month(day);
    let cycle = clock::cycle_key(day);
    let mut summary = CostSummary::default();

    if dom == schedule.payroll_day {
        let amount = store.sum_active_salaries(&company.company_id)?;
        summary.payroll_posted = post_cost(store, company, "PAYROLL", amount, day, &cycle)?;
    }
    if dom == schedule.rent_day {
        let amount = store.sum_warehouse_rent(&company.company_id)?;
        summary.rent_posted = post_cost(store, company, "RENT", amount, day, &cycle)?;
    }
    if dom == schedule.overhead_day {
        let amount = store.sum_warehouse_overhead(&company.company_id)?;
        summary.overhead_posted = post_cost(store, company, "OVERHEAD", amount, day, &cycle)?;
    }

    Ok(summary)
}

fn post_cost(
    store: &SimStore,
    company: &CompanyRow,
    category: &str,
    amount: f64,
    day: DayKey,
    cycle: &str,
) -> SimResult<bool> {
    if amount <= 0.0 {
        // No ledger row for an empty payroll.
        log::debug!(
            "day={} costs: {category} is zero for {}, skipped",
            clock::format_day_key(day),
            company.company_id
        );
        return Ok(false);
    }

    let posting = LedgerPosting {
        idempotency_key: format!("{category}:{}:{cycle}", company.company_id),
        player_id: company.owner_player_id.clone(),
        direction: Direction::Out,
        category: category.to_string(),
        currency: Currency::Usd,
        amount,
        day_key: day,
    };
    let posted = store.post_wallet_transaction(&posting)?;
    if posted {
        store.append_event(
            &company.company_id,
            day,
            "costs",
            &SimEvent::ScheduledCostPosted {
                company_id: company.company_id.clone(),
                category: category.to_string(),
                cycle: cycle.to_string(),
                amount,
            },
        )?;
        log::info!(
            "day={} costs: posted {category} ${amount:.2} for cycle {cycle}",
            clock::format_day_key(day)
        );
    }
    Ok(posted)
}
