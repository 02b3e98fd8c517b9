//! # Earthworks Calculation
//!
//! Cut volume and compaction effort for a site platform and a set of
//! identical trenches.
//!
//! Compaction is measured in area-passes: each compacted surface is rolled
//! `passes_per_lift` times for every lift needed to build up its depth.
//! Trench compaction covers the base and both long sides (ends ignored).
//! The compaction target percentage is carried through for reporting only.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{deserialize_count, Component, Quantity, Takeoff};
use crate::errors::{CalcError, CalcResult};
use crate::units::cm_to_m;

/// Input parameters for land preparation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EarthworksInput {
    /// Platform plan area (m²)
    pub site_area: f64,
    /// Platform strip/cut depth (cm)
    pub site_depth_cm: f64,

    pub trench_length: f64,
    pub trench_width: f64,
    pub trench_depth_cm: f64,
    #[serde(deserialize_with = "deserialize_count")]
    pub trench_count: u32,

    /// Proctor target (%), recorded only
    pub compaction_target_pct: f64,
    pub lift_thickness_cm: f64,
    #[serde(deserialize_with = "deserialize_count")]
    pub passes_per_lift: u32,

    pub cost_per_m3_cut: f64,
    pub cost_per_m2_pass: f64,
}

impl Default for EarthworksInput {
    fn default() -> Self {
        EarthworksInput {
            site_area: 0.0,
            site_depth_cm: 0.0,
            trench_length: 0.0,
            trench_width: 0.0,
            trench_depth_cm: 0.0,
            trench_count: 1,
            compaction_target_pct: 95.0,
            lift_thickness_cm: 20.0,
            passes_per_lift: 4,
            cost_per_m3_cut: 3.0,
            cost_per_m2_pass: 0.01,
        }
    }
}

impl EarthworksInput {
    /// Validate input parameters.
    pub fn validate(&self) -> CalcResult<()> {
        for (field, value) in [
            ("site_area", self.site_area),
            ("site_depth_cm", self.site_depth_cm),
            ("trench_length", self.trench_length),
            ("trench_width", self.trench_width),
            ("trench_depth_cm", self.trench_depth_cm),
        ] {
            if value < 0.0 {
                return Err(CalcError::invalid_input(
                    field,
                    value.to_string(),
                    "Areas, lengths and depths cannot be negative",
                ));
            }
        }
        if self.trench_count < 1 {
            return Err(CalcError::invalid_input(
                "trench_count",
                self.trench_count.to_string(),
                "Number of trenches must be at least 1",
            ));
        }
        if self.lift_thickness_cm <= 0.0 {
            return Err(CalcError::invalid_input(
                "lift_thickness_cm",
                self.lift_thickness_cm.to_string(),
                "Compaction lift thickness must be > 0",
            ));
        }
        if self.passes_per_lift < 1 {
            return Err(CalcError::invalid_input(
                "passes_per_lift",
                self.passes_per_lift.to_string(),
                "Passes per lift must be at least 1",
            ));
        }
        Ok(())
    }

    /// Lifts needed to build the platform depth.
    pub fn platform_lifts(&self) -> u32 {
        if self.site_area > 0.0 && self.site_depth_cm > 0.0 && self.lift_thickness_cm > 0.0 {
            lifts(self.site_depth_cm, self.lift_thickness_cm)
        } else {
            0
        }
    }

    /// Lifts needed to backfill one trench.
    pub fn trench_lifts(&self) -> u32 {
        if self.trench_length > 0.0
            && self.trench_width > 0.0
            && self.trench_depth_cm > 0.0
            && self.lift_thickness_cm > 0.0
        {
            lifts(self.trench_depth_cm, self.lift_thickness_cm)
        } else {
            0
        }
    }
}

// Both values in cm so whole multiples divide exactly
fn lifts(depth_cm: f64, lift_cm: f64) -> u32 {
    (depth_cm / lift_cm).ceil() as u32
}

/// Land preparation results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarthworksResult {
    pub platform_volume_m3: f64,
    pub trench_volume_m3: f64,
    pub cut_volume_m3: f64,

    pub platform_compaction_area_m2: f64,
    pub trench_compaction_area_m2: f64,
    pub compaction_area_m2: f64,

    pub platform_lifts: u32,
    pub trench_lifts: u32,
    /// Σ area × lifts × passes (m²·passes)
    pub area_passes_m2: f64,
    pub compaction_target_pct: f64,

    pub cut_cost: f64,
    pub compaction_cost: f64,
    pub total_cost: f64,
}

/// Calculate cut volume, compaction effort and cost.
pub fn calculate(input: &EarthworksInput) -> CalcResult<EarthworksResult> {
    input.validate()?;

    let site_depth_m = cm_to_m(input.site_depth_cm);
    let trench_depth_m = cm_to_m(input.trench_depth_cm);
    let n = input.trench_count as f64;

    let platform_volume_m3 = input.site_area * site_depth_m;
    let trench_volume_m3 = input.trench_length * input.trench_width * trench_depth_m * n;
    let cut_volume_m3 = platform_volume_m3 + trench_volume_m3;

    let platform_compaction_area_m2 = input.site_area;
    let trench_base = input.trench_length * input.trench_width * n;
    let trench_sides = 2.0 * input.trench_length * trench_depth_m * n;
    let trench_compaction_area_m2 = trench_base + trench_sides;

    let platform_lifts = input.platform_lifts();
    let trench_lifts = input.trench_lifts();
    let passes = input.passes_per_lift as f64;
    let area_passes_m2 = platform_compaction_area_m2 * platform_lifts as f64 * passes
        + trench_compaction_area_m2 * trench_lifts as f64 * passes;

    let cut_cost = cut_volume_m3 * input.cost_per_m3_cut;
    let compaction_cost = area_passes_m2 * input.cost_per_m2_pass;

    Ok(EarthworksResult {
        platform_volume_m3,
        trench_volume_m3,
        cut_volume_m3,
        platform_compaction_area_m2,
        trench_compaction_area_m2,
        compaction_area_m2: platform_compaction_area_m2 + trench_compaction_area_m2,
        platform_lifts,
        trench_lifts,
        area_passes_m2,
        compaction_target_pct: input.compaction_target_pct,
        cut_cost,
        compaction_cost,
        total_cost: cut_cost + compaction_cost,
    })
}

impl Takeoff for EarthworksInput {
    type Output = EarthworksResult;

    const COMPONENT: Component = Component::Earthworks;

    fn calculate(&self) -> CalcResult<EarthworksResult> {
        calculate(self)
    }

    fn total_cost(output: &EarthworksResult) -> f64 {
        output.total_cost
    }

    fn headline(output: &EarthworksResult) -> Quantity {
        Quantity::new("Cut volume", output.cut_volume_m3, "m³", 3)
    }

    fn normalize(&mut self) {
        if self.trench_count < 1 || self.passes_per_lift < 1 {
            warn!(
                trench_count = self.trench_count,
                passes_per_lift = self.passes_per_lift,
                "raising trench count and passes per lift to at least 1"
            );
            self.trench_count = self.trench_count.max(1);
            self.passes_per_lift = self.passes_per_lift.max(1);
        }
    }
}
