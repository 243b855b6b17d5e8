//! Deterministic random number generation.
//!
//! RULE: Nothing in the simulation may call any platform RNG.
//! All randomness flows through SubsystemRng instances derived from the
//! single master seed the engine was built with.
//!
//! Each subsystem gets its own stream per simulated day, seeded from
//! (master_seed XOR subsystem_index XOR day_ordinal). This means:
//!   - Adding a new subsystem never changes existing subsystems' streams.
//!   - Two days with the same entities still draw different jitter.
//!   - Any (seed, slot, day) stream is fully reproducible in isolation.

use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;

/// A named, deterministic RNG for a single subsystem and day.
pub struct SubsystemRng {
    pub name: &'static str,
    inner: Pcg64Mcg,
}

impl SubsystemRng {
    /// Create a subsystem RNG from the master seed, a stable subsystem
    /// index, and a day ordinal. The index must never change once assigned.
    pub fn new(master_seed: u64, subsystem_index: u64, day_ordinal: u64) -> Self {
        let derived_seed = master_seed
            ^ subsystem_index.wrapping_mul(0x9e37_79b9_7f4a_7c15)
            ^ day_ordinal.wrapping_mul(0xc2b2_ae3d_27d4_eb4f);
        Self {
            name: "unnamed",
            inner: Pcg64Mcg::seed_from_u64(derived_seed),
        }
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        use rand::RngCore;
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Symmetric uniform draw in [-pct, +pct].
    pub fn symmetric(&mut self, pct: f64) -> f64 {
        (self.next_f64() * 2.0 - 1.0) * pct
    }
}

/// All subsystem RNGs for a single engine, indexed by stable slot.
pub struct RngBank {
    master_seed: u64,
}

impl RngBank {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    /// The stream for one subsystem on one simulated day.
    pub fn for_day(&self, slot: SubsystemSlot, day_ordinal: i64) -> SubsystemRng {
        SubsystemRng::new(self.master_seed, slot as u64, day_ordinal as u64).with_name(slot.name())
    }
}

/// Stable subsystem slot assignments.
/// NEVER reorder or remove entries — only append.
/// Reordering changes every subsystem's seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum SubsystemSlot {
    Demand = 0,
    // Add new subsystems here — append only.
}

impl SubsystemSlot {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Demand => "demand",
        }
    }
}
