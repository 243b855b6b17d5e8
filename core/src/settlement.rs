//! Bi-monthly settlement — reconciles a warehouse's accumulated sales
//! into the company owner's wallet.
//!
//! The payout posts through the ledger with a day-scoped idempotency
//! key, then flips the covered sales rows to settled. Both writes share
//! the day transaction, so a crash between them rolls back cleanly.

use crate::{
    clock,
    error::SimResult,
    event::SimEvent,
    store::{CompanyRow, Currency, Direction, LedgerPosting, SimStore},
    types::DayKey,
};

/// Pay out all unsettled revenue for one warehouse. Returns the amount
/// paid (0.0 when there was nothing to settle or the payout was already
/// posted for this day).
pub fn run_settlement(
    store: &SimStore,
    company: &CompanyRow,
    warehouse_id: &str,
    day: DayKey,
) -> SimResult<f64> {
    let amount = store.sum_unsettled_revenue(warehouse_id)?;
    if amount <= 0.0 {
        return Ok(0.0);
    }

    let posting = LedgerPosting {
        idempotency_key: format!("SETTLEMENT:{warehouse_id}:{}", clock::format_day_key(day)),
        player_id: company.owner_player_id.clone(),
        direction: Direction::In,
        category: "SETTLEMENT".to_string(),
        currency: Currency::Usd,
        amount,
        day_key: day,
    };
    if !store.post_wallet_transaction(&posting)? {
        // Key already consumed by an earlier run of this same day; the
        // sales rows were marked settled then.
        return Ok(0.0);
    }

    store.mark_sales_settled(warehouse_id, day)?;
    store.append_event(
        &company.company_id,
        day,
        "settlement",
        &SimEvent::SettlementPaid {
            warehouse_id: warehouse_id.to_string(),
            day,
            amount,
        },
    )?;
    log::info!(
        "day={} settlement: paid ${amount:.2} for warehouse {warehouse_id}",
        clock::format_day_key(day)
    );
    Ok(amount)
}
