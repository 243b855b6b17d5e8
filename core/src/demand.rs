//! Daily demand for a listed product.
//!
//! Band resolution: the most specific sales band for (category, quality,
//! company tier) wins — the product's own L3 category first, then its L2
//! parent, then a configured baseline. A product with no band anywhere
//! still sells a trickle; new products are never fully starved.

use crate::{
    config::SimConfig,
    error::SimResult,
    rng::SubsystemRng,
    store::{ProductTemplate, SalesBand, SimStore},
};

/// Desired daily quantity for one listing, before stock is considered.
///
/// `price_multiplier` comes from the pricing model (see `pricing`); the
/// caller computes it from the listing's sale price and market zone.
pub fn desired_qty(
    store: &SimStore,
    config: &SimConfig,
    rng: &mut SubsystemRng,
    template: &ProductTemplate,
    tier: i64,
    price_multiplier: f64,
) -> SimResult<i64> {
    let band = resolve_band(store, template, tier)?;

    let base = match &band {
        Some(b) => b.expected_mode.unwrap_or((b.min_daily + b.max_daily) / 2.0),
        None => config.demand.baseline_daily,
    };

    let mut qty = base * config.demand.potential_multiplier * price_multiplier;
    qty *= 1.0 + rng.symmetric(config.demand.jitter_pct);

    if let Some(stress) = config.demand.stress_multiplier {
        qty *= stress;
    }

    Ok((qty.round() as i64).max(0))
}

/// L3 band, else the L2 parent's band, else None (baseline path).
fn resolve_band(
    store: &SimStore,
    template: &ProductTemplate,
    tier: i64,
) -> SimResult<Option<SalesBand>> {
    if let Some(band) = store.find_sales_band(&template.category_id, template.quality, tier)? {
        return Ok(Some(band));
    }
    match store.category_parent(&template.category_id)? {
        Some(parent_id) => store.find_sales_band(&parent_id, template.quality, tier),
        None => Ok(None),
    }
}
