//! SQLite persistence layer.
//!
//! RULE: Only the store talks to the database.
//! Engine and model code call store methods — they never execute SQL
//! directly. One submodule per concern; row structs live next to the
//! methods that map them.

use crate::{
    clock::{format_day_key, parse_day_key, GameClock},
    error::{SimError, SimResult},
    event::{EventLogEntry, SimEvent},
    types::{DayKey, EntityId},
};
use rusqlite::{params, Connection, OptionalExtension};

mod catalog;
mod finance;
mod ledger;
mod marketing;
mod messages;

pub use catalog::{ListingRow, ProductTemplate, SalesBand};
pub use finance::FinanceSchedule;
pub use ledger::{Currency, Direction, LedgerPosting, WalletRow};
pub use marketing::CampaignRow;
pub use messages::PlayerMessageRow;

pub struct SimStore {
    conn: Connection,
    path: Option<String>, // None for :memory:, Some(path) for file
}

impl SimStore {
    pub fn open(path: &str) -> SimResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self {
            conn,
            path: Some(path.to_string()),
        })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> SimResult<Self> {
        let conn = Connection::open(":memory:")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn, path: None })
    }

    /// Reopen a new connection to the same database.
    /// For in-memory databases this returns a new, isolated database.
    pub fn reopen(&self) -> SimResult<Self> {
        match &self.path {
            Some(p) => Self::open(p),
            None => Self::in_memory(),
        }
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> SimResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_foundation.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/002_catalog.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/003_sales_bands.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/004_marketing.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/005_ledger.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/006_finance.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/007_sales_log.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/008_messages.sql"))?;
        Ok(())
    }

    /// Run `f` inside a single SQLite transaction. Any error rolls back
    /// every write made by `f`; commit happens only on success.
    pub fn in_transaction<T>(&self, f: impl FnOnce() -> SimResult<T>) -> SimResult<T> {
        let tx = self.conn.unchecked_transaction()?;
        let out = f()?;
        tx.commit()?;
        Ok(out)
    }

    // ── Company ────────────────────────────────────────────────

    pub fn insert_company(
        &self,
        company_id: &str,
        name: &str,
        owner_player_id: &str,
        tier: i64,
        country: &str,
    ) -> SimResult<()> {
        self.conn.execute(
            "INSERT INTO company (company_id, name, owner_player_id, tier, country)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![company_id, name, owner_player_id, tier, country],
        )?;
        Ok(())
    }

    pub fn get_company(&self, company_id: &str) -> SimResult<CompanyRow> {
        self.conn
            .query_row(
                "SELECT company_id, name, owner_player_id, tier, country
                 FROM company WHERE company_id = ?1",
                params![company_id],
                |row| {
                    Ok(CompanyRow {
                        company_id: row.get(0)?,
                        name: row.get(1)?,
                        owner_player_id: row.get(2)?,
                        tier: row.get(3)?,
                        country: row.get(4)?,
                    })
                },
            )
            .optional()?
            .ok_or_else(|| SimError::NotFound {
                entity: "company",
                id: company_id.to_string(),
            })
    }

    // ── Warehouse ──────────────────────────────────────────────

    pub fn insert_warehouse(
        &self,
        warehouse_id: &str,
        company_id: &str,
        zone_id: &str,
        country: &str,
        label: &str,
        rent_monthly: f64,
        overhead_monthly: f64,
    ) -> SimResult<()> {
        self.conn.execute(
            "INSERT INTO warehouse
             (warehouse_id, company_id, zone_id, country, label, rent_monthly, overhead_monthly)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                warehouse_id,
                company_id,
                zone_id,
                country,
                label,
                rent_monthly,
                overhead_monthly
            ],
        )?;
        Ok(())
    }

    /// Warehouses in stable id order — ticks must process them in a
    /// deterministic sequence.
    pub fn warehouses_for_company(&self, company_id: &str) -> SimResult<Vec<WarehouseRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT warehouse_id, company_id, zone_id, country, label,
                    rent_monthly, overhead_monthly
             FROM warehouse WHERE company_id = ?1
             ORDER BY warehouse_id ASC",
        )?;
        let rows = stmt
            .query_map(params![company_id], |row| {
                Ok(WarehouseRow {
                    warehouse_id: row.get(0)?,
                    company_id: row.get(1)?,
                    zone_id: row.get(2)?,
                    country: row.get(3)?,
                    label: row.get(4)?,
                    rent_monthly: row.get(5)?,
                    overhead_monthly: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    // ── Game clock ─────────────────────────────────────────────

    pub fn init_clock(&self, company_id: &str, start_day: DayKey) -> SimResult<()> {
        self.conn.execute(
            "INSERT INTO game_clock (company_id, current_day, version) VALUES (?1, ?2, 0)",
            params![company_id, format_day_key(start_day)],
        )?;
        Ok(())
    }

    pub fn get_clock(&self, company_id: &str) -> SimResult<GameClock> {
        let row = self
            .conn
            .query_row(
                "SELECT company_id, current_day, version, last_advanced_at
                 FROM game_clock WHERE company_id = ?1",
                params![company_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, Option<String>>(3)?,
                    ))
                },
            )
            .optional()?
            .ok_or_else(|| SimError::NotFound {
                entity: "game_clock",
                id: company_id.to_string(),
            })?;

        let current_day = parse_day_key(&row.1).ok_or(SimError::InvalidDayKey { raw: row.1 })?;
        Ok(GameClock {
            company_id: row.0,
            current_day,
            version: row.2,
            last_advanced_at: row.3,
        })
    }

    /// Conditional clock advancement — the optimistic lock.
    /// Zero affected rows means the stored version no longer matches what
    /// the caller observed: another request won the race.
    pub fn advance_clock(
        &self,
        company_id: &str,
        expected_version: i64,
        new_day: DayKey,
    ) -> SimResult<()> {
        let changed = self.conn.execute(
            "UPDATE game_clock
             SET current_day = ?1, version = version + 1, last_advanced_at = ?2
             WHERE company_id = ?3 AND version = ?4",
            params![
                format_day_key(new_day),
                chrono::Utc::now().to_rfc3339(),
                company_id,
                expected_version
            ],
        )?;
        if changed == 0 {
            return Err(SimError::ConcurrentAdvance {
                company_id: company_id.to_string(),
            });
        }
        Ok(())
    }

    // ── Event log ──────────────────────────────────────────────

    pub fn append_event(
        &self,
        company_id: &str,
        day: DayKey,
        component: &str,
        event: &SimEvent,
    ) -> SimResult<()> {
        self.conn.execute(
            "INSERT INTO event_log (company_id, day_key, component, event_type, payload)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                company_id,
                format_day_key(day),
                component,
                event.type_name(),
                serde_json::to_string(event)?,
            ],
        )?;
        Ok(())
    }

    pub fn events_for_day(&self, company_id: &str, day: DayKey) -> SimResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, company_id, day_key, component, event_type, payload
             FROM event_log WHERE company_id = ?1 AND day_key = ?2
             ORDER BY id ASC",
        )?;
        let rows = stmt
            .query_map(params![company_id, format_day_key(day)], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|r| {
                let day_key = parse_day_key(&r.2).ok_or(SimError::InvalidDayKey { raw: r.2 })?;
                Ok(EventLogEntry {
                    id: Some(r.0),
                    company_id: r.1,
                    day_key,
                    component: r.3,
                    event_type: r.4,
                    payload: r.5,
                })
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct CompanyRow {
    pub company_id: EntityId,
    pub name: String,
    pub owner_player_id: EntityId,
    pub tier: i64,
    pub country: String,
}

#[derive(Debug, Clone)]
pub struct WarehouseRow {
    pub warehouse_id: EntityId,
    pub company_id: EntityId,
    pub zone_id: EntityId,
    pub country: String,
    pub label: String,
    pub rent_monthly: f64,
    pub overhead_monthly: f64,
}
