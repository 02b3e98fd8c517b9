//! # Unit Types
//!
//! Lightweight newtype wrappers for the metric units the takeoff formulas
//! mix: plan dimensions are entered in meters, while slab thicknesses, fill
//! heights, fillet radii, trench depths and lift thicknesses are entered in
//! centimeters. Masses come out in kilograms and are priced per tonne.
//!
//! Inputs stay plain `f64` fields so session files remain flat JSON numbers;
//! the wrappers are used at the point of conversion so a cm value can never
//! reach a volume formula unconverted.
//!
//! ## Example
//!
//! ```rust
//! use takeoff_core::units::{Centimeters, Meters, Kilograms, Tonnes};
//!
//! let thickness: Meters = Centimeters(20.0).into();
//! assert!((thickness.0 - 0.2).abs() < 1e-12);
//!
//! let rebar: Tonnes = Kilograms(400.0).into();
//! assert!((rebar.0 - 0.4).abs() < 1e-12);
//! ```

use serde::{Deserialize, Serialize};

/// Length in meters
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Meters(pub f64);

/// Length in centimeters
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Centimeters(pub f64);

impl From<Centimeters> for Meters {
    fn from(cm: Centimeters) -> Self {
        Meters(cm.0 / 100.0)
    }
}

/// Mass in kilograms
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Kilograms(pub f64);

/// Mass in metric tonnes (1 t = 1000 kg)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tonnes(pub f64);

impl From<Kilograms> for Tonnes {
    fn from(kg: Kilograms) -> Self {
        Tonnes(kg.0 / 1000.0)
    }
}

/// Convert a centimeter input straight to a meter value.
pub fn cm_to_m(cm: f64) -> f64 {
    Meters::from(Centimeters(cm)).0
}

/// Convert a kilogram mass straight to tonnes.
pub fn kg_to_t(kg: f64) -> f64 {
    Tonnes::from(Kilograms(kg)).0
}
