//! Marketing boost layering and campaign lifecycle.
//!
//! LAYER ORDER (fixed, documented, never reordered):
//!   1. warehouse-scope campaigns (plus the listing's permanent boost)
//!   2. category-scope campaigns
//!   3. product-scope campaigns
//!
//! RULES:
//!   - Each layer adds its campaigns' positive and negative sums onto the
//!     totals carried from the previous layer.
//!   - Both totals clamp into [0, 100] after every layer, so boost spent
//!     above the ceiling in one layer never carries forward.
//!   - Category matching walks a listing's L3 category up to its L2
//!     parent; an unresolvable chain leaves the listing untouched by
//!     that layer.
//!   - Effects are recomputed fresh every tick; nothing per-campaign is
//!     persisted on the listing.

use crate::{
    clock,
    config::SimConfig,
    error::{SimError, SimResult},
    event::SimEvent,
    notify,
    store::{CampaignRow, CompanyRow, SimStore},
    types::{DayKey, EntityId},
};
use serde::Serialize;
use std::collections::HashMap;

pub const BOOST_FLOOR: f64 = 0.0;
pub const BOOST_CEIL: f64 = 100.0;

/// The boost state carried through the layering pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoostTotals {
    pub positive: f64,
    pub negative: f64,
}

/// One scope's summed contribution.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LayerSums {
    pub positive: f64,
    pub negative: f64,
}

impl LayerSums {
    fn add(&mut self, campaign: &CampaignRow) {
        self.positive += campaign.positive_boost_pct;
        self.negative += campaign.negative_boost_pct;
    }
}

impl BoostTotals {
    /// Start of the pipeline: the permanent awareness boost is always part
    /// of the positive base, before any campaign contributes.
    pub fn seed(permanent_positive: f64) -> Self {
        Self {
            positive: permanent_positive,
            negative: 0.0,
        }
        .clamped()
    }

    pub fn apply_layer(self, layer: LayerSums) -> Self {
        Self {
            positive: self.positive + layer.positive,
            negative: self.negative + layer.negative,
        }
        .clamped()
    }

    fn clamped(self) -> Self {
        Self {
            positive: self.positive.clamp(BOOST_FLOOR, BOOST_CEIL),
            negative: self.negative.clamp(BOOST_FLOOR, BOOST_CEIL),
        }
    }
}

/// Recompute both boost fields for every listed listing in a warehouse.
/// Runs inside the day transaction. Returns the number of listings written.
pub fn relayer_warehouse_boosts(
    store: &SimStore,
    warehouse_id: &str,
    day: DayKey,
) -> SimResult<usize> {
    let campaigns = store.active_campaigns(warehouse_id, day)?;

    let mut warehouse_layer = LayerSums::default();
    let mut category_layers: HashMap<EntityId, LayerSums> = HashMap::new();
    let mut product_layers: HashMap<EntityId, LayerSums> = HashMap::new();
    for c in &campaigns {
        match c.scope.as_str() {
            "warehouse" => warehouse_layer.add(c),
            "category" => {
                if let Some(target) = &c.target_id {
                    category_layers.entry(target.clone()).or_default().add(c);
                }
            }
            "product" => {
                if let Some(target) = &c.target_id {
                    product_layers.entry(target.clone()).or_default().add(c);
                }
            }
            other => {
                log::warn!(
                    "day={} marketing: campaign {} has unknown scope '{other}', skipped",
                    clock::format_day_key(day),
                    c.campaign_id
                );
            }
        }
    }

    let listings = store.listed_listings(warehouse_id)?;
    for listing in &listings {
        let template = store.get_product_template(&listing.template_id)?;

        let category_layer = match category_layers.get(&template.category_id) {
            Some(layer) => *layer,
            None => match store.category_parent(&template.category_id)? {
                Some(parent) => category_layers.get(&parent).copied().unwrap_or_default(),
                None => LayerSums::default(),
            },
        };
        let product_layer = product_layers
            .get(&listing.listing_id)
            .copied()
            .unwrap_or_default();

        let totals = BoostTotals::seed(listing.permanent_positive_boost_pct)
            .apply_layer(warehouse_layer)
            .apply_layer(category_layer)
            .apply_layer(product_layer);

        store.update_listing_boosts(&listing.listing_id, totals.positive, totals.negative)?;
    }
    Ok(listings.len())
}

/// Campaigns that ended yesterday get their one-time awareness gain,
/// their ENDED status, and their player notification today. The one-day
/// lag keeps campaigns visibly active through their final day.
pub fn settle_ended_campaigns(
    store: &SimStore,
    config: &SimConfig,
    company: &CompanyRow,
    new_day: DayKey,
) -> SimResult<usize> {
    let ended = store.campaigns_ended_on(&company.company_id, clock::prev_day(new_day))?;

    for campaign in &ended {
        let gain =
            campaign.positive_boost_pct * config.marketing.awareness_retention_ratio;
        let covered = store.campaign_listing_ids(campaign)?;
        if gain > 0.0 {
            for listing_id in &covered {
                store.add_permanent_boost(listing_id, gain)?;
            }
        }
        store.set_campaign_status(&campaign.campaign_id, "ENDED")?;

        notify::notify_once(
            store,
            &company.owner_player_id,
            &format!("CAMPAIGN_END:{}", campaign.campaign_id),
            "campaign_ended",
            &format!(
                "Your {} campaign has ended. {} listings keep {:.1}% lasting awareness.",
                campaign.scope,
                covered.len(),
                gain
            ),
            new_day,
        )?;
        store.append_event(
            &company.company_id,
            new_day,
            "marketing",
            &SimEvent::CampaignEnded {
                campaign_id: campaign.campaign_id.clone(),
                scope: campaign.scope.clone(),
                day: new_day,
                permanent_gain_pct: gain,
            },
        )?;
        log::info!(
            "day={} marketing: campaign {} ended, +{:.1}% awareness on {} listings",
            clock::format_day_key(new_day),
            campaign.campaign_id,
            gain,
            covered.len()
        );
    }
    Ok(ended.len())
}

// ── Campaign-purchase preview ──────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewScope {
    Warehouse,
    Category,
    Product,
}

impl PreviewScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Warehouse => "warehouse",
            Self::Category => "category",
            Self::Product => "product",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PricingPreview {
    pub sku_count: i64,
    pub multiplier: f64,
    pub base_price: f64,
    pub total_price: f64,
}

/// Read-only simulation of what a marketing purchase would cost.
/// Pricing-rule gaps resolve to config defaults, never to an error.
pub fn pricing_preview(
    store: &SimStore,
    config: &SimConfig,
    scope: PreviewScope,
    warehouse_id: Option<&str>,
    category_id: Option<&str>,
    listing_id: Option<&str>,
    package_id: Option<&str>,
) -> SimResult<PricingPreview> {
    let sku_count = match scope {
        PreviewScope::Warehouse => {
            store.count_listed_in_warehouse(require(warehouse_id, "warehouse_id")?)?
        }
        PreviewScope::Category => store.count_listed_in_category(
            require(warehouse_id, "warehouse_id")?,
            require(category_id, "category_id")?,
        )?,
        PreviewScope::Product => {
            store.get_listing(require(listing_id, "listing_id")?)?;
            1
        }
    };

    let (base_price, multiplier) = store
        .find_price_rule(scope.as_str(), package_id)?
        .unwrap_or((config.marketing.default_preview_base_price, 1.0));

    Ok(PricingPreview {
        sku_count,
        multiplier,
        base_price,
        total_price: base_price * multiplier * sku_count as f64,
    })
}

fn require<'a>(value: Option<&'a str>, name: &'static str) -> SimResult<&'a str> {
    value.ok_or_else(|| SimError::Other(anyhow::anyhow!("{name} is required for this scope")))
}
