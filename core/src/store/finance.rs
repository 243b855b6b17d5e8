use super::SimStore;
use crate::{
    clock::{day_of_month, format_day_key},
    config::FinanceConfig,
    error::SimResult,
    types::{DayKey, EntityId},
};
use rusqlite::{params, OptionalExtension};

/// A company's day-of-month schedule for payroll, rent, overhead, and
/// settlement payouts. Config defaults apply when no row exists.
#[derive(Debug, Clone)]
pub struct FinanceSchedule {
    pub company_id: EntityId,
    pub payroll_day: u32,
    pub rent_day: u32,
    pub overhead_day: u32,
    pub payout_days: Vec<u32>,
}

impl FinanceSchedule {
    pub fn defaults(company_id: &str, config: &FinanceConfig) -> Self {
        Self {
            company_id: company_id.to_string(),
            payroll_day: config.payroll_day,
            rent_day: config.rent_day,
            overhead_day: config.overhead_day,
            payout_days: config.payout_days.clone(),
        }
    }

    pub fn is_payout_day(&self, day: DayKey) -> bool {
        self.payout_days.contains(&day_of_month(day))
    }
}

impl SimStore {
    pub fn upsert_finance_schedule(&self, s: &FinanceSchedule) -> SimResult<()> {
        let payout_days = s
            .payout_days
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join(",");
        self.conn.execute(
            "INSERT INTO finance_schedule (company_id, payroll_day, rent_day, overhead_day, payout_days)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(company_id) DO UPDATE SET
                 payroll_day = excluded.payroll_day,
                 rent_day = excluded.rent_day,
                 overhead_day = excluded.overhead_day,
                 payout_days = excluded.payout_days",
            params![s.company_id, s.payroll_day, s.rent_day, s.overhead_day, payout_days],
        )?;
        Ok(())
    }

    pub fn get_finance_schedule(&self, company_id: &str) -> SimResult<Option<FinanceSchedule>> {
        let row = self
            .conn
            .query_row(
                "SELECT company_id, payroll_day, rent_day, overhead_day, payout_days
                 FROM finance_schedule WHERE company_id = ?1",
                params![company_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, u32>(1)?,
                        row.get::<_, u32>(2)?,
                        row.get::<_, u32>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                },
            )
            .optional()?;

        Ok(row.map(|(company_id, payroll_day, rent_day, overhead_day, payout_raw)| {
            // Malformed entries are dropped rather than failing the tick.
            let payout_days = payout_raw
                .split(',')
                .filter_map(|d| d.trim().parse().ok())
                .collect();
            FinanceSchedule {
                company_id,
                payroll_day,
                rent_day,
                overhead_day,
                payout_days,
            }
        }))
    }

    // ── Staff ──────────────────────────────────────────────────

    pub fn insert_staff_member(
        &self,
        staff_id: &str,
        company_id: &str,
        role: &str,
        salary_monthly: f64,
        status: &str,
    ) -> SimResult<()> {
        self.conn.execute(
            "INSERT INTO staff_member (staff_id, company_id, role, salary_monthly, status)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![staff_id, company_id, role, salary_monthly, status],
        )?;
        Ok(())
    }

    pub fn sum_active_salaries(&self, company_id: &str) -> SimResult<f64> {
        let total = self.conn.query_row(
            "SELECT COALESCE(SUM(salary_monthly), 0.0)
             FROM staff_member WHERE company_id = ?1 AND status = 'active'",
            params![company_id],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    // ── Building costs ─────────────────────────────────────────

    pub fn sum_warehouse_rent(&self, company_id: &str) -> SimResult<f64> {
        let total = self.conn.query_row(
            "SELECT COALESCE(SUM(rent_monthly), 0.0) FROM warehouse WHERE company_id = ?1",
            params![company_id],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    pub fn sum_warehouse_overhead(&self, company_id: &str) -> SimResult<f64> {
        let total = self.conn.query_row(
            "SELECT COALESCE(SUM(overhead_monthly), 0.0) FROM warehouse WHERE company_id = ?1",
            params![company_id],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    // ── Settlement ─────────────────────────────────────────────

    pub fn sum_unsettled_revenue(&self, warehouse_id: &str) -> SimResult<f64> {
        let total = self.conn.query_row(
            "SELECT COALESCE(SUM(revenue), 0.0)
             FROM sales_log WHERE warehouse_id = ?1 AND settled = 0",
            params![warehouse_id],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    /// Flip every unsettled sales row up to and including `day`.
    pub fn mark_sales_settled(&self, warehouse_id: &str, day: DayKey) -> SimResult<usize> {
        let changed = self.conn.execute(
            "UPDATE sales_log SET settled = 1
             WHERE warehouse_id = ?1 AND settled = 0 AND day_key <= ?2",
            params![warehouse_id, format_day_key(day)],
        )?;
        Ok(changed)
    }
}
