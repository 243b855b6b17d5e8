//! The append-only audit trail.
//!
//! RULE: Every state change made during a day advancement is recorded in
//! the event log, inside the same transaction as the change itself.
//! Variants are added as the game grows — never removed or reordered.

use crate::types::{DayKey, EntityId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimEvent {
    // ── Orchestrator events ────────────────────────
    DayAdvanced {
        company_id: EntityId,
        previous_day: DayKey,
        new_day: DayKey,
        warehouses_ticked: usize,
        settlements_run: usize,
    },

    // ── Warehouse tick events ──────────────────────
    WarehouseTicked {
        warehouse_id: EntityId,
        day: DayKey,
        listings: usize,
        units_sold: i64,
        revenue: f64,
    },
    BacklogDetected {
        warehouse_id: EntityId,
        day: DayKey,
        unfilled_units: i64,
    },

    // ── Marketing events ───────────────────────────
    CampaignEnded {
        campaign_id: EntityId,
        scope: String,
        day: DayKey,
        permanent_gain_pct: f64,
    },

    // ── Finance events ─────────────────────────────
    ScheduledCostPosted {
        company_id: EntityId,
        category: String,
        cycle: String,
        amount: f64,
    },
    SettlementPaid {
        warehouse_id: EntityId,
        day: DayKey,
        amount: f64,
    },
}

impl SimEvent {
    /// Stable string name for the event_type column in event_log.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::DayAdvanced { .. }         => "day_advanced",
            Self::WarehouseTicked { .. }     => "warehouse_ticked",
            Self::BacklogDetected { .. }     => "backlog_detected",
            Self::CampaignEnded { .. }       => "campaign_ended",
            Self::ScheduledCostPosted { .. } => "scheduled_cost_posted",
            Self::SettlementPaid { .. }      => "settlement_paid",
        }
    }
}

/// The event log entry as persisted to SQLite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id: Option<i64>,
    pub company_id: EntityId,
    pub day_key: DayKey,
    pub component: String,
    pub event_type: String,
    pub payload: String, // JSON-serialized SimEvent
}
