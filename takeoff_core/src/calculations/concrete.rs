//! # Concrete Element Calculation
//!
//! Volume, formwork, reinforcement and cost for one of four element types.
//!
//! | Element | Volume | Formwork area |
//! |---|---|---|
//! | Slab / base | L·W·T·N | 2(L+W)·T·N |
//! | Strip footing | L·W·T | 2·L·T (ends ignored) |
//! | Wall | L·H·T·N | 2·L·H·N (both faces) |
//! | Isolated footing | L·W·T·N | 2(L+W)·T·N |
//!
//! Thicknesses are entered in centimeters. Each element keeps its own
//! geometry so switching the selection never loses values.
//!
//! Rebar is priced per tonne: `rebar_cost = volume × intensity / 1000 × rate`.
//!
//! ## Example
//!
//! ```rust
//! use takeoff_core::calculations::concrete::{calculate, ConcreteInput, ElementKind};
//!
//! let mut input = ConcreteInput::default();
//! input.select_element(ElementKind::Slab);
//! input.slab_length = 5.0;
//! input.slab_width = 4.0;
//! input.slab_thickness_cm = 20.0;
//!
//! let result = calculate(&input).unwrap();
//! assert!((result.volume_m3 - 4.0).abs() < 1e-9);
//! assert!((result.formwork_area_m2 - 3.6).abs() < 1e-9);
//! ```

use serde::{Deserialize, Deserializer, Serialize};

use super::{deserialize_count, Component, Quantity, Takeoff};
use crate::errors::{CalcError, CalcResult};
use crate::materials::RebarLevel;
use crate::units::{cm_to_m, kg_to_t};

/// Concrete element types, persisted by index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(into = "u8")]
pub enum ElementKind {
    #[default]
    Slab,
    StripFooting,
    Wall,
    IsolatedFooting,
}

impl ElementKind {
    pub const ALL: [ElementKind; 4] = [
        ElementKind::Slab,
        ElementKind::StripFooting,
        ElementKind::Wall,
        ElementKind::IsolatedFooting,
    ];

    pub fn index(&self) -> u8 {
        match self {
            ElementKind::Slab => 0,
            ElementKind::StripFooting => 1,
            ElementKind::Wall => 2,
            ElementKind::IsolatedFooting => 3,
        }
    }

    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(usize::from(index)).copied()
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ElementKind::Slab => "Slab / Base",
            ElementKind::StripFooting => "Strip Footing",
            ElementKind::Wall => "Wall",
            ElementKind::IsolatedFooting => "Isolated Footing",
        }
    }

    /// Help text shown when this element is selected.
    pub fn description(&self) -> &'static str {
        match self {
            ElementKind::Slab => {
                "Slab / Base: A flat, horizontal concrete element such as a floor slab, \
                 equipment pad or raft base. Defined by length, width and thickness, \
                 with one or more identical slabs."
            }
            ElementKind::StripFooting => {
                "Strip Footing: A continuous strip of concrete running under walls or rows \
                 of columns. Defined by total strip length, width and thickness. Often cast \
                 in a trench."
            }
            ElementKind::Wall => {
                "Wall: A vertical reinforced concrete wall, such as a retaining wall or tank \
                 wall. Defined by length, clear height and thickness, with an optional count \
                 of identical walls."
            }
            ElementKind::IsolatedFooting => {
                "Isolated Footing: A single pad footing under a column or small group of \
                 columns. Defined by plan length, plan width and thickness, with a count for \
                 multiple footings."
            }
        }
    }

    /// Parse from common string representations
    pub fn from_str_flexible(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace([' ', '-', '/'], "_").as_str() {
            "slab" | "base" | "slab___base" | "0" => Some(ElementKind::Slab),
            "strip" | "strip_footing" | "1" => Some(ElementKind::StripFooting),
            "wall" | "2" => Some(ElementKind::Wall),
            "isolated" | "isolated_footing" | "iso" | "pad" | "3" => Some(ElementKind::IsolatedFooting),
            _ => None,
        }
    }
}

impl From<u8> for ElementKind {
    /// Out-of-range indices fall back to a slab.
    fn from(index: u8) -> Self {
        ElementKind::from_index(index).unwrap_or_default()
    }
}

impl<'de> Deserialize<'de> for ElementKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let index = deserialize_count(deserializer)?;
        Ok(u8::try_from(index).map(ElementKind::from).unwrap_or_default())
    }
}

impl From<ElementKind> for u8 {
    fn from(kind: ElementKind) -> Self {
        kind.index()
    }
}

impl std::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Geometry of the selected element, extracted from the flat input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ElementGeometry {
    Slab { length: f64, width: f64, thickness_cm: f64, count: u32 },
    StripFooting { length: f64, width: f64, thickness_cm: f64 },
    Wall { length: f64, height: f64, thickness_cm: f64, count: u32 },
    IsolatedFooting { length: f64, width: f64, thickness_cm: f64, count: u32 },
}

impl ElementGeometry {
    /// All dimensions exactly zero: the element was never filled in.
    pub fn is_blank(&self) -> bool {
        match *self {
            ElementGeometry::Slab { length, width, thickness_cm, .. }
            | ElementGeometry::StripFooting { length, width, thickness_cm }
            | ElementGeometry::IsolatedFooting { length, width, thickness_cm, .. } => {
                length == 0.0 && width == 0.0 && thickness_cm == 0.0
            }
            ElementGeometry::Wall { length, height, thickness_cm, .. } => {
                length == 0.0 && height == 0.0 && thickness_cm == 0.0
            }
        }
    }

    fn validate(&self) -> CalcResult<()> {
        let (ok, element, factors, value) = match *self {
            ElementGeometry::Slab { length, width, thickness_cm, count } => (
                length > 0.0 && width > 0.0 && thickness_cm > 0.0 && count > 0,
                "slabs",
                "length, width, thickness and count",
                format!("L={} W={} T={}cm N={}", length, width, thickness_cm, count),
            ),
            ElementGeometry::StripFooting { length, width, thickness_cm } => (
                length > 0.0 && width > 0.0 && thickness_cm > 0.0,
                "strip footings",
                "length, width and thickness",
                format!("L={} W={} T={}cm", length, width, thickness_cm),
            ),
            ElementGeometry::Wall { length, height, thickness_cm, count } => (
                length > 0.0 && height > 0.0 && thickness_cm > 0.0 && count > 0,
                "walls",
                "length, height, thickness and count",
                format!("L={} H={} T={}cm N={}", length, height, thickness_cm, count),
            ),
            ElementGeometry::IsolatedFooting { length, width, thickness_cm, count } => (
                length > 0.0 && width > 0.0 && thickness_cm > 0.0 && count > 0,
                "isolated footings",
                "length, width, thickness and count",
                format!("L={} W={} T={}cm N={}", length, width, thickness_cm, count),
            ),
        };
        if ok {
            Ok(())
        } else {
            Err(CalcError::invalid_input(
                format!("{}: {}", element, factors),
                value,
                format!("For {}, {} must all be > 0.", element, factors),
            ))
        }
    }

    /// Volume (m³) and formwork contact area (m²).
    pub fn volume_and_formwork(&self) -> (f64, f64) {
        match *self {
            ElementGeometry::Slab { length, width, thickness_cm, count }
            | ElementGeometry::IsolatedFooting { length, width, thickness_cm, count } => {
                let t = cm_to_m(thickness_cm);
                let n = count as f64;
                (length * width * t * n, 2.0 * (length + width) * t * n)
            }
            ElementGeometry::StripFooting { length, width, thickness_cm } => {
                let t = cm_to_m(thickness_cm);
                (length * width * t, 2.0 * length * t)
            }
            ElementGeometry::Wall { length, height, thickness_cm, count } => {
                let t = cm_to_m(thickness_cm);
                let n = count as f64;
                (length * height * t * n, 2.0 * length * height * n)
            }
        }
    }
}

/// Input parameters for concrete works.
///
/// Field names match the session file keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConcreteInput {
    #[serde(rename = "element_type_index")]
    pub element: ElementKind,

    pub slab_length: f64,
    pub slab_width: f64,
    pub slab_thickness_cm: f64,
    #[serde(deserialize_with = "deserialize_count")]
    pub slab_count: u32,

    pub strip_length: f64,
    pub strip_width: f64,
    pub strip_thickness_cm: f64,

    pub wall_length: f64,
    pub wall_height: f64,
    pub wall_thickness_cm: f64,
    #[serde(deserialize_with = "deserialize_count")]
    pub wall_count: u32,

    pub iso_length: f64,
    pub iso_width: f64,
    pub iso_thickness_cm: f64,
    #[serde(deserialize_with = "deserialize_count")]
    pub iso_count: u32,

    /// Concrete density (kg/m³)
    #[serde(rename = "conc_density")]
    pub density_kg_m3: f64,
    /// Concrete price per m³
    #[serde(rename = "conc_cost")]
    pub concrete_cost_per_m3: f64,
    /// Reinforcement intensity (kg of steel per m³ of concrete)
    #[serde(rename = "rebar_intensity")]
    pub rebar_kg_per_m3: f64,
    /// Reinforcement price per tonne
    #[serde(rename = "rebar_cost")]
    pub rebar_cost_per_t: f64,
    /// Formwork price per m² of contact area
    pub formwork_rate: f64,
}

impl Default for ConcreteInput {
    fn default() -> Self {
        ConcreteInput {
            element: ElementKind::Slab,
            slab_length: 0.0,
            slab_width: 0.0,
            slab_thickness_cm: 0.0,
            slab_count: 1,
            strip_length: 0.0,
            strip_width: 0.0,
            strip_thickness_cm: 0.0,
            wall_length: 0.0,
            wall_height: 0.0,
            wall_thickness_cm: 0.0,
            wall_count: 1,
            iso_length: 0.0,
            iso_width: 0.0,
            iso_thickness_cm: 0.0,
            iso_count: 1,
            density_kg_m3: 2400.0,
            concrete_cost_per_m3: 60.0,
            rebar_kg_per_m3: 100.0,
            rebar_cost_per_t: 640.0,
            formwork_rate: 15.0,
        }
    }
}

impl ConcreteInput {
    /// Switch the active element and return its help text.
    pub fn select_element(&mut self, kind: ElementKind) -> &'static str {
        self.element = kind;
        kind.description()
    }

    /// Apply a rebar preset. `Custom` leaves the intensity as it is.
    pub fn apply_rebar_level(&mut self, level: RebarLevel) {
        if let Some(intensity) = level.intensity_kg_per_m3() {
            self.rebar_kg_per_m3 = intensity;
        }
    }

    /// Geometry of the currently selected element.
    pub fn geometry(&self) -> ElementGeometry {
        match self.element {
            ElementKind::Slab => ElementGeometry::Slab {
                length: self.slab_length,
                width: self.slab_width,
                thickness_cm: self.slab_thickness_cm,
                count: self.slab_count,
            },
            ElementKind::StripFooting => ElementGeometry::StripFooting {
                length: self.strip_length,
                width: self.strip_width,
                thickness_cm: self.strip_thickness_cm,
            },
            ElementKind::Wall => ElementGeometry::Wall {
                length: self.wall_length,
                height: self.wall_height,
                thickness_cm: self.wall_thickness_cm,
                count: self.wall_count,
            },
            ElementKind::IsolatedFooting => ElementGeometry::IsolatedFooting {
                length: self.iso_length,
                width: self.iso_width,
                thickness_cm: self.iso_thickness_cm,
                count: self.iso_count,
            },
        }
    }

    /// Validate input parameters.
    ///
    /// A blank element (all dimensions zero) is valid and computes to zero.
    pub fn validate(&self) -> CalcResult<()> {
        let geometry = self.geometry();
        if !geometry.is_blank() {
            geometry.validate()?;
        }
        for (field, value) in [
            ("conc_density", self.density_kg_m3),
            ("conc_cost", self.concrete_cost_per_m3),
            ("rebar_intensity", self.rebar_kg_per_m3),
            ("rebar_cost", self.rebar_cost_per_t),
            ("formwork_rate", self.formwork_rate),
        ] {
            if value < 0.0 {
                return Err(CalcError::invalid_input(
                    field,
                    value.to_string(),
                    "Material parameters cannot be negative",
                ));
            }
        }
        Ok(())
    }
}

/// Concrete works results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcreteResult {
    pub element: ElementKind,
    pub volume_m3: f64,
    pub formwork_area_m2: f64,
    pub concrete_weight_kg: f64,
    pub rebar_kg: f64,
    pub rebar_t: f64,
    pub concrete_cost: f64,
    pub rebar_cost: f64,
    pub formwork_cost: f64,
    pub total_cost: f64,
}

/// Calculate volume, formwork, rebar and cost for the selected element.
pub fn calculate(input: &ConcreteInput) -> CalcResult<ConcreteResult> {
    input.validate()?;

    let geometry = input.geometry();
    let (volume_m3, formwork_area_m2) = if geometry.is_blank() {
        (0.0, 0.0)
    } else {
        geometry.volume_and_formwork()
    };

    let concrete_weight_kg = volume_m3 * input.density_kg_m3;
    let rebar_kg = volume_m3 * input.rebar_kg_per_m3;
    let rebar_t = kg_to_t(rebar_kg);

    let concrete_cost = volume_m3 * input.concrete_cost_per_m3;
    let rebar_cost = rebar_t * input.rebar_cost_per_t;
    let formwork_cost = formwork_area_m2 * input.formwork_rate;

    Ok(ConcreteResult {
        element: input.element,
        volume_m3,
        formwork_area_m2,
        concrete_weight_kg,
        rebar_kg,
        rebar_t,
        concrete_cost,
        rebar_cost,
        formwork_cost,
        total_cost: concrete_cost + rebar_cost + formwork_cost,
    })
}

impl Takeoff for ConcreteInput {
    type Output = ConcreteResult;

    const COMPONENT: Component = Component::Concrete;

    fn calculate(&self) -> CalcResult<ConcreteResult> {
        calculate(self)
    }

    fn total_cost(output: &ConcreteResult) -> f64 {
        output.total_cost
    }

    fn headline(output: &ConcreteResult) -> Quantity {
        Quantity::new("Concrete volume", output.volume_m3, "m³", 3)
    }

    /// Dimensions and materials return to defaults; the selected element
    /// stays selected.
    fn reset(&mut self) {
        let element = self.element;
        *self = ConcreteInput::default();
        self.element = element;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn slab(length: f64, width: f64, thickness_cm: f64, count: u32) -> ConcreteInput {
        ConcreteInput {
            slab_length: length,
            slab_width: width,
            slab_thickness_cm: thickness_cm,
            slab_count: count,
            ..Default::default()
        }
    }

    #[test]
    fn test_slab_scenario() {
        let result = calculate(&slab(5.0, 4.0, 20.0, 1)).unwrap();
        assert!((result.volume_m3 - 4.0).abs() < EPS);
        assert!((result.formwork_area_m2 - 3.6).abs() < EPS);
        assert!((result.concrete_weight_kg - 9600.0).abs() < 1e-6);
        // 4 m³ × 100 kg/m³ = 400 kg = 0.4 t
        assert!((result.rebar_kg - 400.0).abs() < 1e-9);
        assert!((result.rebar_t - 0.4).abs() < EPS);
    }

    #[test]
    fn test_costs_use_rebar_tonnes() {
        let result = calculate(&slab(5.0, 4.0, 20.0, 1)).unwrap();
        assert!((result.concrete_cost - 240.0).abs() < 1e-9);
        assert!((result.rebar_cost - 256.0).abs() < 1e-9);
        assert!((result.formwork_cost - 54.0).abs() < 1e-9);
        assert!((result.total_cost - 550.0).abs() < 1e-9);
    }

    #[test]
    fn test_strip_footing_ignores_count() {
        let mut input = ConcreteInput {
            strip_length: 12.0,
            strip_width: 0.6,
            strip_thickness_cm: 30.0,
            ..Default::default()
        };
        input.select_element(ElementKind::StripFooting);
        let result = calculate(&input).unwrap();
        assert!((result.volume_m3 - 2.16).abs() < EPS);
        assert!((result.formwork_area_m2 - 7.2).abs() < EPS);
    }

    #[test]
    fn test_wall_formwork_both_faces() {
        let mut input = ConcreteInput {
            wall_length: 8.0,
            wall_height: 3.0,
            wall_thickness_cm: 25.0,
            wall_count: 2,
            ..Default::default()
        };
        input.select_element(ElementKind::Wall);
        let result = calculate(&input).unwrap();
        assert!((result.volume_m3 - 12.0).abs() < EPS);
        assert!((result.formwork_area_m2 - 96.0).abs() < EPS);
    }

    #[test]
    fn test_isolated_footing() {
        let mut input = ConcreteInput {
            iso_length: 1.5,
            iso_width: 1.5,
            iso_thickness_cm: 50.0,
            iso_count: 4,
            ..Default::default()
        };
        input.select_element(ElementKind::IsolatedFooting);
        let result = calculate(&input).unwrap();
        assert!((result.volume_m3 - 4.5).abs() < EPS);
        assert!((result.formwork_area_m2 - 12.0).abs() < EPS);
    }

    #[test]
    fn test_partial_geometry_rejected() {
        let err = calculate(&slab(5.0, 0.0, 20.0, 1)).unwrap_err();
        match err {
            CalcError::InvalidInput { field, reason, .. } => {
                assert!(field.starts_with("slabs"));
                assert!(reason.contains("length, width, thickness and count"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(calculate(&slab(5.0, 4.0, 20.0, 0)).is_err());
    }

    #[test]
    fn test_blank_element_is_zero() {
        let result = calculate(&ConcreteInput::default()).unwrap();
        assert_eq!(result.volume_m3, 0.0);
        assert_eq!(result.total_cost, 0.0);
    }

    #[test]
    fn test_inactive_elements_not_validated() {
        // Slab selected; a half-filled wall does not matter
        let input = ConcreteInput {
            wall_length: 3.0,
            ..slab(5.0, 4.0, 20.0, 1)
        };
        assert!(calculate(&input).is_ok());
    }

    #[test]
    fn test_select_element_returns_help_text() {
        let mut input = ConcreteInput::default();
        let text = input.select_element(ElementKind::Wall);
        assert!(text.starts_with("Wall:"));
        assert_eq!(input.element, ElementKind::Wall);
    }

    #[test]
    fn test_rebar_presets() {
        let mut input = ConcreteInput::default();
        input.apply_rebar_level(RebarLevel::Heavy);
        assert_eq!(input.rebar_kg_per_m3, 120.0);
        input.rebar_kg_per_m3 = 77.0;
        input.apply_rebar_level(RebarLevel::Custom);
        assert_eq!(input.rebar_kg_per_m3, 77.0);
    }

    #[test]
    fn test_element_index_serialization() {
        let mut input = ConcreteInput::default();
        input.select_element(ElementKind::IsolatedFooting);
        let json = serde_json::to_value(&input).unwrap();
        assert_eq!(json["element_type_index"], 3);
        assert_eq!(json["conc_density"], 2400.0);

        let loaded: ConcreteInput = serde_json::from_str(r#"{"element_type_index": 9}"#).unwrap();
        assert_eq!(loaded.element, ElementKind::Slab);
    }

    #[test]
    fn test_reset_keeps_element() {
        let mut input = slab(5.0, 4.0, 20.0, 1);
        input.select_element(ElementKind::Wall);
        input.rebar_cost_per_t = 900.0;
        Takeoff::reset(&mut input);
        assert_eq!(input.element, ElementKind::Wall);
        assert_eq!(input.slab_length, 0.0);
        assert_eq!(input.rebar_cost_per_t, 640.0);
    }
}
