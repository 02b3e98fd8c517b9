//! # Fill Material Calculation
//!
//! Fill (sweet sand) for a racetrack-shaped basin: a rectangle of width W
//! and straight length `L_total - W`, capped by two semicircles of radius
//! W/2. An optional quarter-circle fillet runs along the outer perimeter and
//! both faces of the central dividing wall.
//!
//! ```text
//!     ______________________
//!   /                        \
//!  |  ======================  |   <- central wall (fillet both sides)
//!   \________________________/
//!   |<-------- L_total ------->|
//! ```
//!
//! ## Example
//!
//! ```rust
//! use takeoff_core::calculations::fill::{calculate, FillInput};
//!
//! let input = FillInput {
//!     length_total_m: 30.0,
//!     width_m: 10.0,
//!     fill_height_cm: 50.0,
//!     ..Default::default()
//! };
//!
//! let result = calculate(&input).unwrap();
//! assert!((result.straight_length_m - 20.0).abs() < 1e-9);
//! assert!(result.total_volume_m3 > result.base_volume_m3 - 1e-9);
//! ```

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use super::{Component, Quantity, Takeoff};
use crate::errors::{CalcError, CalcResult};
use crate::units::{cm_to_m, kg_to_t};

/// Input parameters for basin fill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FillInput {
    /// Overall basin length including both rounded ends (m)
    #[serde(rename = "length_total")]
    pub length_total_m: f64,

    /// Internal width (m); the end radius is half of this
    #[serde(rename = "width")]
    pub width_m: f64,

    /// Fill depth (cm)
    #[serde(rename = "fill_height")]
    pub fill_height_cm: f64,

    /// Floor-to-wall fillet radius (cm); 0 for no fillet
    #[serde(rename = "corner_radius")]
    pub corner_radius_cm: f64,

    /// Loose bulk density (kg/m³)
    #[serde(rename = "bulk_density")]
    pub bulk_density_kg_m3: f64,

    #[serde(rename = "cost_per_ton")]
    pub cost_per_tonne: f64,
}

impl Default for FillInput {
    fn default() -> Self {
        FillInput {
            length_total_m: 0.0,
            width_m: 0.0,
            fill_height_cm: 0.0,
            corner_radius_cm: 0.0,
            bulk_density_kg_m3: 1600.0,
            cost_per_tonne: 13.3,
        }
    }
}

impl FillInput {
    /// Length, width and height all zero: never filled in.
    pub fn is_blank(&self) -> bool {
        self.length_total_m == 0.0 && self.width_m == 0.0 && self.fill_height_cm == 0.0
    }

    /// Validate input parameters.
    pub fn validate(&self) -> CalcResult<()> {
        if self.is_blank() {
            return Ok(());
        }
        if self.length_total_m > 0.0 && self.width_m > 0.0 && self.length_total_m <= self.width_m {
            return Err(CalcError::geometry(
                "basin",
                format!(
                    "Overall length ({} m) must be greater than width ({} m) so that a straight \
                     section exists between the arcs",
                    self.length_total_m, self.width_m
                ),
            ));
        }
        for (field, value) in [
            ("length_total", self.length_total_m),
            ("width", self.width_m),
            ("fill_height", self.fill_height_cm),
            ("bulk_density", self.bulk_density_kg_m3),
        ] {
            if value <= 0.0 {
                return Err(CalcError::invalid_input(field, value.to_string(), "Must be greater than zero"));
            }
        }
        if self.cost_per_tonne < 0.0 {
            return Err(CalcError::invalid_input(
                "cost_per_ton",
                self.cost_per_tonne.to_string(),
                "Cost per tonne cannot be negative",
            ));
        }
        if self.corner_radius_cm < 0.0 {
            return Err(CalcError::invalid_input(
                "corner_radius",
                self.corner_radius_cm.to_string(),
                "Corner radius cannot be negative",
            ));
        }
        Ok(())
    }
}

/// Basin fill results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillResult {
    /// Straight section length `L_total - W` (m)
    pub straight_length_m: f64,
    /// End arc radius `W / 2` (m)
    pub end_radius_m: f64,
    pub plan_area_m2: f64,
    pub base_volume_m3: f64,
    pub fillet_volume_m3: f64,
    pub total_volume_m3: f64,
    pub weight_kg: f64,
    pub weight_t: f64,
    pub total_cost: f64,
}

impl FillResult {
    fn zero() -> Self {
        FillResult {
            straight_length_m: 0.0,
            end_radius_m: 0.0,
            plan_area_m2: 0.0,
            base_volume_m3: 0.0,
            fillet_volume_m3: 0.0,
            total_volume_m3: 0.0,
            weight_kg: 0.0,
            weight_t: 0.0,
            total_cost: 0.0,
        }
    }
}

/// Calculate fill volume, weight and cost.
pub fn calculate(input: &FillInput) -> CalcResult<FillResult> {
    input.validate()?;
    if input.is_blank() {
        return Ok(FillResult::zero());
    }

    let height_m = cm_to_m(input.fill_height_cm);
    let corner_m = cm_to_m(input.corner_radius_cm);

    let straight_length_m = input.length_total_m - input.width_m;
    let end_radius_m = input.width_m / 2.0;

    // Rectangle plus two semicircles (one full circle)
    let plan_area_m2 = input.width_m * straight_length_m + PI * end_radius_m.powi(2);
    let base_volume_m3 = plan_area_m2 * height_m;

    let fillet_volume_m3 = if corner_m > 0.0 {
        let outer = 2.0 * straight_length_m + 2.0 * PI * end_radius_m;
        let central_wall = 2.0 * straight_length_m;
        let section = PI * corner_m.powi(2) / 4.0;
        (outer + central_wall) * section
    } else {
        0.0
    };

    let total_volume_m3 = base_volume_m3 + fillet_volume_m3;
    let weight_kg = total_volume_m3 * input.bulk_density_kg_m3;
    let weight_t = kg_to_t(weight_kg);

    Ok(FillResult {
        straight_length_m,
        end_radius_m,
        plan_area_m2,
        base_volume_m3,
        fillet_volume_m3,
        total_volume_m3,
        weight_kg,
        weight_t,
        total_cost: weight_t * input.cost_per_tonne,
    })
}

impl Takeoff for FillInput {
    type Output = FillResult;

    const COMPONENT: Component = Component::FillMaterial;

    fn calculate(&self) -> CalcResult<FillResult> {
        calculate(self)
    }

    fn total_cost(output: &FillResult) -> f64 {
        output.total_cost
    }

    fn headline(output: &FillResult) -> Quantity {
        Quantity::new("Fill volume", output.total_volume_m3, "m³", 3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn basin(length: f64, width: f64, height_cm: f64, corner_cm: f64) -> FillInput {
        FillInput {
            length_total_m: length,
            width_m: width,
            fill_height_cm: height_cm,
            corner_radius_cm: corner_cm,
            ..Default::default()
        }
    }

    #[test]
    fn test_length_must_exceed_width() {
        let err = calculate(&basin(5.0, 6.0, 0.0, 0.0)).unwrap_err();
        assert!(matches!(err, CalcError::GeometryError { .. }));

        let err = calculate(&basin(5.0, 6.0, 40.0, 10.0)).unwrap_err();
        assert_eq!(err.error_code(), "GEOMETRY_ERROR");

        assert!(calculate(&basin(6.0, 6.0, 40.0, 0.0)).is_err());
    }

    #[test]
    fn test_plan_area_and_base_volume() {
        let result = calculate(&basin(30.0, 10.0, 50.0, 0.0)).unwrap();
        let expected_area = 10.0 * 20.0 + PI * 25.0;
        assert!((result.plan_area_m2 - expected_area).abs() < EPS);
        assert!((result.base_volume_m3 - expected_area * 0.5).abs() < EPS);
        assert_eq!(result.fillet_volume_m3, 0.0);
    }

    #[test]
    fn test_fillet_volume() {
        let result = calculate(&basin(30.0, 10.0, 50.0, 20.0)).unwrap();
        // run = 4 × 20 + 2π × 5; section = π × 0.2² / 4
        let run = 80.0 + 10.0 * PI;
        let section = PI * 0.04 / 4.0;
        assert!((result.fillet_volume_m3 - run * section).abs() < EPS);
        assert!((result.total_volume_m3 - (result.base_volume_m3 + result.fillet_volume_m3)).abs() < EPS);
    }

    #[test]
    fn test_weight_and_cost() {
        let input = FillInput {
            bulk_density_kg_m3: 2000.0,
            cost_per_tonne: 10.0,
            ..basin(30.0, 10.0, 50.0, 0.0)
        };
        let result = calculate(&input).unwrap();
        let volume = (200.0 + 25.0 * PI) * 0.5;
        assert!((result.weight_kg - volume * 2000.0).abs() < 1e-6);
        assert!((result.weight_t - volume * 2.0).abs() < 1e-9);
        assert!((result.total_cost - volume * 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_blank_basin_is_zero() {
        let result = calculate(&FillInput::default()).unwrap();
        assert_eq!(result.total_volume_m3, 0.0);
        assert_eq!(result.total_cost, 0.0);
    }

    #[test]
    fn test_invalid_material() {
        let input = FillInput {
            bulk_density_kg_m3: 0.0,
            ..basin(30.0, 10.0, 50.0, 0.0)
        };
        assert!(matches!(calculate(&input), Err(CalcError::InvalidInput { .. })));

        let input = FillInput {
            cost_per_tonne: -1.0,
            ..basin(30.0, 10.0, 50.0, 0.0)
        };
        assert!(calculate(&input).is_err());
        assert!(calculate(&basin(30.0, 10.0, 0.0, 0.0)).is_err());
        assert!(calculate(&basin(30.0, 10.0, 50.0, -5.0)).is_err());
    }

    #[test]
    fn test_session_keys() {
        let json = serde_json::to_value(FillInput::default()).unwrap();
        for key in ["length_total", "width", "fill_height", "corner_radius", "bulk_density", "cost_per_ton"] {
            assert!(json.get(key).is_some(), "missing key {key}");
        }
    }
}
