//! Simulation configuration — schedule fallbacks, demand tuning, and the
//! marketing awareness model.
//!
//! `SimConfig::default()` is the production baseline. A JSON file with the
//! same shape can override any subset of fields (every section defaults).

use crate::error::SimResult;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub finance:   FinanceConfig,
    pub demand:    DemandConfig,
    pub marketing: MarketingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FinanceConfig {
    /// Day-of-month fallbacks for companies without a finance_schedule row.
    pub payroll_day:  u32,
    pub rent_day:     u32,
    pub overhead_day: u32,
    pub payout_days:  Vec<u32>,
}

impl Default for FinanceConfig {
    fn default() -> Self {
        Self {
            payroll_day:  1,
            rent_day:     15,
            overhead_day: 15,
            payout_days:  vec![5, 20],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DemandConfig {
    /// Symmetric jitter as a fraction of the pre-jitter quantity.
    pub jitter_pct: f64,
    /// Daily quantity when no sales band resolves at any level.
    /// New products are never fully starved.
    pub baseline_daily: f64,
    /// Reserved for seasonal/hemisphere scaling.
    pub potential_multiplier: f64,
    /// TEST ONLY: scales every demand result, for backlog stress runs.
    /// Must stay None in any production config.
    pub stress_multiplier: Option<f64>,
}

impl Default for DemandConfig {
    fn default() -> Self {
        Self {
            jitter_pct:           0.15,
            baseline_daily:       1.0,
            potential_multiplier: 1.0,
            stress_multiplier:    None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketingConfig {
    /// Fraction of an ended campaign's positive boost converted into
    /// permanent awareness on the listings it covered.
    pub awareness_retention_ratio: f64,
    /// Fallback per-SKU price when no marketing_price_rule row matches.
    pub default_preview_base_price: f64,
}

impl Default for MarketingConfig {
    fn default() -> Self {
        Self {
            awareness_retention_ratio:  0.10,
            default_preview_base_price: 50.0,
        }
    }
}

impl SimConfig {
    pub fn from_file(path: &Path) -> SimResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(anyhow::Error::from)?;
        Ok(serde_json::from_str(&raw)?)
    }
}
