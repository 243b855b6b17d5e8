use super::SimStore;
use crate::{
    clock::format_day_key,
    error::{SimError, SimResult},
    types::{DayKey, EntityId},
};
use rusqlite::{params, OptionalExtension};

#[derive(Debug, Clone)]
pub struct ProductTemplate {
    pub template_id: EntityId,
    pub category_id: EntityId,
    pub quality: i64,
    pub label: String,
    pub suggested_price: f64,
}

#[derive(Debug, Clone)]
pub struct ListingRow {
    pub listing_id: EntityId,
    pub warehouse_id: EntityId,
    pub template_id: EntityId,
    pub status: String,
    pub sale_price: f64,
    pub stock: i64,
    pub positive_boost_pct: f64,
    pub negative_boost_pct: f64,
    pub permanent_positive_boost_pct: f64,
}

#[derive(Debug, Clone)]
pub struct SalesBand {
    pub band_id: EntityId,
    pub category_id: EntityId,
    pub quality: i64,
    pub tier_min: i64,
    pub tier_max: i64,
    pub min_daily: f64,
    pub max_daily: f64,
    pub expected_mode: Option<f64>,
}

impl SimStore {
    // ── Category tree ──────────────────────────────────────────

    pub fn insert_category(
        &self,
        category_id: &str,
        parent_id: Option<&str>,
        level: i64,
        label: &str,
    ) -> SimResult<()> {
        self.conn.execute(
            "INSERT INTO category (category_id, parent_id, level, label) VALUES (?1, ?2, ?3, ?4)",
            params![category_id, parent_id, level, label],
        )?;
        Ok(())
    }

    /// The L2 parent of an L3 node, if the chain resolves.
    pub fn category_parent(&self, category_id: &str) -> SimResult<Option<String>> {
        let parent = self
            .conn
            .query_row(
                "SELECT parent_id FROM category WHERE category_id = ?1",
                params![category_id],
                |row| row.get::<_, Option<String>>(0),
            )
            .optional()?
            .flatten();
        Ok(parent)
    }

    // ── Market zones ───────────────────────────────────────────

    pub fn insert_market_zone(
        &self,
        zone_id: &str,
        label: &str,
        price_multiplier: f64,
    ) -> SimResult<()> {
        self.conn.execute(
            "INSERT INTO market_zone (zone_id, label, price_multiplier) VALUES (?1, ?2, ?3)",
            params![zone_id, label, price_multiplier],
        )?;
        Ok(())
    }

    /// None when the zone row is missing — callers fall back to 1.0
    /// rather than failing the tick.
    pub fn zone_price_multiplier(&self, zone_id: &str) -> SimResult<Option<f64>> {
        let mult = self
            .conn
            .query_row(
                "SELECT price_multiplier FROM market_zone WHERE zone_id = ?1",
                params![zone_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(mult)
    }

    // ── Product templates ──────────────────────────────────────

    pub fn insert_product_template(
        &self,
        template_id: &str,
        category_id: &str,
        quality: i64,
        label: &str,
        suggested_price: f64,
    ) -> SimResult<()> {
        self.conn.execute(
            "INSERT INTO product_template (template_id, category_id, quality, label, suggested_price)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![template_id, category_id, quality, label, suggested_price],
        )?;
        Ok(())
    }

    pub fn get_product_template(&self, template_id: &str) -> SimResult<ProductTemplate> {
        self.conn
            .query_row(
                "SELECT template_id, category_id, quality, label, suggested_price
                 FROM product_template WHERE template_id = ?1",
                params![template_id],
                |row| {
                    Ok(ProductTemplate {
                        template_id: row.get(0)?,
                        category_id: row.get(1)?,
                        quality: row.get(2)?,
                        label: row.get(3)?,
                        suggested_price: row.get(4)?,
                    })
                },
            )
            .optional()?
            .ok_or_else(|| SimError::NotFound {
                entity: "product_template",
                id: template_id.to_string(),
            })
    }

    // ── Listings ───────────────────────────────────────────────

    pub fn insert_listing(
        &self,
        listing_id: &str,
        warehouse_id: &str,
        template_id: &str,
        sale_price: f64,
        stock: i64,
    ) -> SimResult<()> {
        self.conn.execute(
            "INSERT INTO listing (listing_id, warehouse_id, template_id, status, sale_price, stock)
             VALUES (?1, ?2, ?3, 'LISTED', ?4, ?5)",
            params![listing_id, warehouse_id, template_id, sale_price, stock],
        )?;
        Ok(())
    }

    pub fn get_listing(&self, listing_id: &str) -> SimResult<ListingRow> {
        self.conn
            .query_row(
                "SELECT listing_id, warehouse_id, template_id, status, sale_price, stock,
                        positive_boost_pct, negative_boost_pct, permanent_positive_boost_pct
                 FROM listing WHERE listing_id = ?1",
                params![listing_id],
                Self::map_listing_row,
            )
            .optional()?
            .ok_or_else(|| SimError::NotFound {
                entity: "listing",
                id: listing_id.to_string(),
            })
    }

    /// Listed listings in stable id order — tick processing and RNG draws
    /// depend on a deterministic sequence.
    pub fn listed_listings(&self, warehouse_id: &str) -> SimResult<Vec<ListingRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT listing_id, warehouse_id, template_id, status, sale_price, stock,
                    positive_boost_pct, negative_boost_pct, permanent_positive_boost_pct
             FROM listing WHERE warehouse_id = ?1 AND status = 'LISTED'
             ORDER BY listing_id ASC",
        )?;
        let rows = stmt
            .query_map(params![warehouse_id], Self::map_listing_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn map_listing_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ListingRow> {
        Ok(ListingRow {
            listing_id: row.get(0)?,
            warehouse_id: row.get(1)?,
            template_id: row.get(2)?,
            status: row.get(3)?,
            sale_price: row.get(4)?,
            stock: row.get(5)?,
            positive_boost_pct: row.get(6)?,
            negative_boost_pct: row.get(7)?,
            permanent_positive_boost_pct: row.get(8)?,
        })
    }

    pub fn update_listing_boosts(
        &self,
        listing_id: &str,
        positive_boost_pct: f64,
        negative_boost_pct: f64,
    ) -> SimResult<()> {
        self.conn.execute(
            "UPDATE listing SET positive_boost_pct = ?1, negative_boost_pct = ?2
             WHERE listing_id = ?3",
            params![positive_boost_pct, negative_boost_pct, listing_id],
        )?;
        Ok(())
    }

    /// Permanent awareness only ever grows, and never past 100.
    pub fn add_permanent_boost(&self, listing_id: &str, gain_pct: f64) -> SimResult<()> {
        self.conn.execute(
            "UPDATE listing
             SET permanent_positive_boost_pct =
                 MIN(100.0, permanent_positive_boost_pct + ?1)
             WHERE listing_id = ?2",
            params![gain_pct, listing_id],
        )?;
        Ok(())
    }

    pub fn decrement_stock(&self, listing_id: &str, qty: i64) -> SimResult<()> {
        self.conn.execute(
            "UPDATE listing SET stock = MAX(0, stock - ?1) WHERE listing_id = ?2",
            params![qty, listing_id],
        )?;
        Ok(())
    }

    // ── Sales bands ────────────────────────────────────────────

    pub fn insert_sales_band(
        &self,
        band_id: &str,
        category_id: &str,
        quality: i64,
        tier_min: i64,
        tier_max: i64,
        min_daily: f64,
        max_daily: f64,
        expected_mode: Option<f64>,
    ) -> SimResult<()> {
        self.conn.execute(
            "INSERT INTO sales_band
             (band_id, category_id, quality, tier_min, tier_max, min_daily, max_daily, expected_mode)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                band_id,
                category_id,
                quality,
                tier_min,
                tier_max,
                min_daily,
                max_daily,
                expected_mode
            ],
        )?;
        Ok(())
    }

    pub fn find_sales_band(
        &self,
        category_id: &str,
        quality: i64,
        tier: i64,
    ) -> SimResult<Option<SalesBand>> {
        let band = self
            .conn
            .query_row(
                "SELECT band_id, category_id, quality, tier_min, tier_max,
                        min_daily, max_daily, expected_mode
                 FROM sales_band
                 WHERE category_id = ?1 AND quality = ?2
                   AND tier_min <= ?3 AND tier_max >= ?3
                 ORDER BY band_id ASC LIMIT 1",
                params![category_id, quality, tier],
                |row| {
                    Ok(SalesBand {
                        band_id: row.get(0)?,
                        category_id: row.get(1)?,
                        quality: row.get(2)?,
                        tier_min: row.get(3)?,
                        tier_max: row.get(4)?,
                        min_daily: row.get(5)?,
                        max_daily: row.get(6)?,
                        expected_mode: row.get(7)?,
                    })
                },
            )
            .optional()?;
        Ok(band)
    }

    // ── Sales log ──────────────────────────────────────────────

    pub fn insert_sales_log(
        &self,
        listing_id: &str,
        warehouse_id: &str,
        day: DayKey,
        desired_qty: i64,
        sold_qty: i64,
        revenue: f64,
    ) -> SimResult<()> {
        self.conn.execute(
            "INSERT INTO sales_log (listing_id, warehouse_id, day_key, desired_qty, sold_qty, revenue)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                listing_id,
                warehouse_id,
                format_day_key(day),
                desired_qty,
                sold_qty,
                revenue
            ],
        )?;
        Ok(())
    }

    /// (units sold, revenue) across every warehouse of a company.
    pub fn sales_totals_for_company(&self, company_id: &str) -> SimResult<(i64, f64)> {
        let totals = self.conn.query_row(
            "SELECT COALESCE(SUM(s.sold_qty), 0), COALESCE(SUM(s.revenue), 0.0)
             FROM sales_log s
             JOIN warehouse w ON w.warehouse_id = s.warehouse_id
             WHERE w.company_id = ?1",
            params![company_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(totals)
    }
}
