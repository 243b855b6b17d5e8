use super::SimStore;
use crate::{
    clock::{format_day_key, parse_day_key},
    error::{SimError, SimResult},
    types::{DayKey, EntityId},
};
use rusqlite::{params, OptionalExtension};

/// A marketing campaign as stored. `scope` is one of 'warehouse',
/// 'category', 'product'; `target_id` names the category or listing for
/// the narrower scopes.
#[derive(Debug, Clone)]
pub struct CampaignRow {
    pub campaign_id: EntityId,
    pub company_id: EntityId,
    pub warehouse_id: EntityId,
    pub scope: String,
    pub target_id: Option<EntityId>,
    pub start_day: DayKey,
    pub end_day: DayKey,
    pub positive_boost_pct: f64,
    pub negative_boost_pct: f64,
    pub status: String,
}

/// Map a stored day-key column inside a query_map closure.
fn day_column(idx: usize, raw: String) -> rusqlite::Result<DayKey> {
    parse_day_key(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            format!("bad day key: {raw}").into(),
        )
    })
}

impl SimStore {
    pub fn insert_campaign(&self, c: &CampaignRow) -> SimResult<()> {
        self.conn.execute(
            "INSERT INTO marketing_campaign
             (campaign_id, company_id, warehouse_id, scope, target_id,
              start_day, end_day, positive_boost_pct, negative_boost_pct, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                c.campaign_id,
                c.company_id,
                c.warehouse_id,
                c.scope,
                c.target_id,
                format_day_key(c.start_day),
                format_day_key(c.end_day),
                c.positive_boost_pct,
                c.negative_boost_pct,
                c.status
            ],
        )?;
        Ok(())
    }

    /// Campaigns counting toward a warehouse's boosts on `day`:
    /// status SCHEDULED or ACTIVE, with start ≤ day ≤ end (inclusive).
    pub fn active_campaigns(&self, warehouse_id: &str, day: DayKey) -> SimResult<Vec<CampaignRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT campaign_id, company_id, warehouse_id, scope, target_id,
                    start_day, end_day, positive_boost_pct, negative_boost_pct, status
             FROM marketing_campaign
             WHERE warehouse_id = ?1
               AND status IN ('SCHEDULED', 'ACTIVE')
               AND start_day <= ?2 AND end_day >= ?2
             ORDER BY campaign_id ASC",
        )?;
        let rows = stmt
            .query_map(params![warehouse_id, format_day_key(day)], Self::map_campaign_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Campaigns whose run ended exactly on `day` and still await their
    /// one-time awareness settlement.
    pub fn campaigns_ended_on(&self, company_id: &str, day: DayKey) -> SimResult<Vec<CampaignRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT campaign_id, company_id, warehouse_id, scope, target_id,
                    start_day, end_day, positive_boost_pct, negative_boost_pct, status
             FROM marketing_campaign
             WHERE company_id = ?1
               AND status IN ('SCHEDULED', 'ACTIVE')
               AND end_day = ?2
             ORDER BY campaign_id ASC",
        )?;
        let rows = stmt
            .query_map(params![company_id, format_day_key(day)], Self::map_campaign_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn set_campaign_status(&self, campaign_id: &str, status: &str) -> SimResult<()> {
        self.conn.execute(
            "UPDATE marketing_campaign SET status = ?1 WHERE campaign_id = ?2",
            params![status, campaign_id],
        )?;
        Ok(())
    }

    pub fn get_campaign(&self, campaign_id: &str) -> SimResult<CampaignRow> {
        self.conn
            .query_row(
                "SELECT campaign_id, company_id, warehouse_id, scope, target_id,
                        start_day, end_day, positive_boost_pct, negative_boost_pct, status
                 FROM marketing_campaign WHERE campaign_id = ?1",
                params![campaign_id],
                Self::map_campaign_row,
            )
            .optional()?
            .ok_or_else(|| SimError::NotFound {
                entity: "marketing_campaign",
                id: campaign_id.to_string(),
            })
    }

    fn map_campaign_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<CampaignRow> {
        Ok(CampaignRow {
            campaign_id: row.get(0)?,
            company_id: row.get(1)?,
            warehouse_id: row.get(2)?,
            scope: row.get(3)?,
            target_id: row.get(4)?,
            start_day: day_column(5, row.get(5)?)?,
            end_day: day_column(6, row.get(6)?)?,
            positive_boost_pct: row.get(7)?,
            negative_boost_pct: row.get(8)?,
            status: row.get(9)?,
        })
    }

    // ── Price rules (campaign-purchase preview) ────────────────

    pub fn insert_price_rule(
        &self,
        scope: &str,
        package_id: Option<&str>,
        base_price: f64,
        multiplier: f64,
    ) -> SimResult<()> {
        self.conn.execute(
            "INSERT INTO marketing_price_rule (scope, package_id, base_price, multiplier)
             VALUES (?1, ?2, ?3, ?4)",
            params![scope, package_id, base_price, multiplier],
        )?;
        Ok(())
    }

    /// (base_price, multiplier) for a scope, preferring an exact package
    /// match, then the scope's default row (NULL package).
    pub fn find_price_rule(
        &self,
        scope: &str,
        package_id: Option<&str>,
    ) -> SimResult<Option<(f64, f64)>> {
        if let Some(package) = package_id {
            let exact = self
                .conn
                .query_row(
                    "SELECT base_price, multiplier FROM marketing_price_rule
                     WHERE scope = ?1 AND package_id = ?2
                     ORDER BY rule_id ASC LIMIT 1",
                    params![scope, package],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;
            if exact.is_some() {
                return Ok(exact);
            }
        }
        let fallback = self
            .conn
            .query_row(
                "SELECT base_price, multiplier FROM marketing_price_rule
                 WHERE scope = ?1 AND package_id IS NULL
                 ORDER BY rule_id ASC LIMIT 1",
                params![scope],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        Ok(fallback)
    }

    // ── Listing counts for the preview ─────────────────────────

    pub fn count_listed_in_warehouse(&self, warehouse_id: &str) -> SimResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM listing WHERE warehouse_id = ?1 AND status = 'LISTED'",
            params![warehouse_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Listed listings in a warehouse whose product's L3 category, or
    /// that category's L2 parent, matches `category_id`.
    pub fn count_listed_in_category(
        &self,
        warehouse_id: &str,
        category_id: &str,
    ) -> SimResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*)
             FROM listing l
             JOIN product_template t ON t.template_id = l.template_id
             JOIN category c ON c.category_id = t.category_id
             WHERE l.warehouse_id = ?1 AND l.status = 'LISTED'
               AND (c.category_id = ?2 OR c.parent_id = ?2)",
            params![warehouse_id, category_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Listing ids covered by a campaign, per its scope.
    pub fn campaign_listing_ids(&self, c: &CampaignRow) -> SimResult<Vec<EntityId>> {
        match c.scope.as_str() {
            "warehouse" => {
                let mut stmt = self.conn.prepare(
                    "SELECT listing_id FROM listing
                     WHERE warehouse_id = ?1 AND status = 'LISTED'
                     ORDER BY listing_id ASC",
                )?;
                let ids = stmt
                    .query_map(params![c.warehouse_id], |row| row.get(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(ids)
            }
            "category" => {
                let target = match &c.target_id {
                    Some(t) => t.clone(),
                    None => return Ok(vec![]),
                };
                let mut stmt = self.conn.prepare(
                    "SELECT l.listing_id
                     FROM listing l
                     JOIN product_template t ON t.template_id = l.template_id
                     JOIN category cat ON cat.category_id = t.category_id
                     WHERE l.warehouse_id = ?1 AND l.status = 'LISTED'
                       AND (cat.category_id = ?2 OR cat.parent_id = ?2)
                     ORDER BY l.listing_id ASC",
                )?;
                let ids = stmt
                    .query_map(params![c.warehouse_id, target], |row| row.get(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(ids)
            }
            "product" => Ok(c.target_id.clone().into_iter().collect()),
            other => {
                log::warn!("marketing: unknown campaign scope '{other}', no listings covered");
                Ok(vec![])
            }
        }
    }
}
