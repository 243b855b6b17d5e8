//! Listing price → demand multiplier.
//!
//! A listing's sale price is normalized against the market-zone baseline
//! (suggested price × zone multiplier) into a price index, which maps
//! through a fixed stepped curve. Bad configuration (zero baseline,
//! non-finite index) resolves to the neutral index — pricing must never
//! block a player's day advancement.

/// Normalized price index. 1.0 means exactly the zone baseline.
pub fn price_index(sale_price: f64, suggested_price: f64, zone_multiplier: f64) -> f64 {
    let normal_price = suggested_price * zone_multiplier;
    if normal_price <= 0.0 {
        return 1.0;
    }
    let index = sale_price / normal_price;
    if index.is_finite() {
        index
    } else {
        1.0
    }
}

/// Stepped demand multiplier over the price index.
///
/// Overpricing beyond 15% above baseline suppresses demand entirely;
/// discounting is rewarded down to a 1.30 cap. Non-increasing in the
/// index across every breakpoint.
pub fn price_multiplier(index: f64) -> f64 {
    if index > 1.15 {
        0.0
    } else if index > 1.10 {
        0.60
    } else if index > 1.05 {
        0.85
    } else if index > 0.90 {
        1.00
    } else if index > 0.80 {
        1.10
    } else if index > 0.70 {
        1.20
    } else {
        1.30
    }
}
