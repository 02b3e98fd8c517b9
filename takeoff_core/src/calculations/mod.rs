//! # Takeoff Calculations
//!
//! Six independent calculators, each following the same pattern:
//!
//! - `*Input` - Input parameters (JSON-serializable, flat, with defaults)
//! - `*Result` - Calculation results (JSON-serializable)
//! - `calculate(&input) -> CalcResult<*Result>` - Pure calculation function
//!
//! The [`Takeoff`] trait ties an input type to its result and to the output
//! contract the aggregator reads (total cost, headline quantity, optional
//! breakdown text). [`Calculator`] owns one input plus its last successful
//! result and implements [`CostSource`], the object-safe seam the
//! aggregator drives.
//!
//! ## Available Calculations
//!
//! - [`masonry`] - Block, pallet and cost counts for walls, arcs and reactors
//! - [`concrete`] - Slabs, strip footings, walls and isolated footings
//! - [`fill`] - Racetrack basin fill with corner fillets
//! - [`earthworks`] - Platform and trench cut with compaction effort
//! - [`labor`] - Fixed 11-trade roster, schedule and overheads
//! - [`equipment`] - Plant fleet hire, fuel and overheads

pub mod concrete;
pub mod earthworks;
pub mod equipment;
pub mod fill;
pub mod labor;
pub mod masonry;

use std::fmt;

use serde::de::{self, DeserializeOwned, Unexpected, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, warn};

use crate::errors::{CalcError, CalcResult};
use crate::format::grouped;

// Re-export commonly used types
pub use concrete::{ConcreteInput, ConcreteResult, ElementKind};
pub use earthworks::{EarthworksInput, EarthworksResult};
pub use equipment::{EquipmentInput, EquipmentResult, EquipmentRow};
pub use fill::{FillInput, FillResult};
pub use labor::{LaborInput, LaborResult, TradeSlot};
pub use masonry::{MasonryInput, MasonryResult};

/// A headcount or multiplier read from a session file. Whole numbers
/// written as floats (`30.0`) or strings (`"30"`) are accepted.
struct Count(u32);

struct CountVisitor;

impl<'de> Visitor<'de> for CountVisitor {
    type Value = u32;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a non-negative whole number")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<u32, E> {
        u32::try_from(v).map_err(|_| E::invalid_value(Unexpected::Unsigned(v), &self))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<u32, E> {
        u32::try_from(v).map_err(|_| E::invalid_value(Unexpected::Signed(v), &self))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<u32, E> {
        if v.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(&v) {
            Ok(v as u32)
        } else {
            Err(E::invalid_value(Unexpected::Float(v), &self))
        }
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<u32, E> {
        match v.trim().parse::<f64>() {
            Ok(number) => self.visit_f64(number),
            Err(_) => Err(E::invalid_value(Unexpected::Str(v), &self)),
        }
    }
}

impl<'de> Deserialize<'de> for Count {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(CountVisitor).map(Count)
    }
}

pub(crate) fn deserialize_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    Count::deserialize(deserializer).map(|c| c.0)
}

pub(crate) fn deserialize_opt_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    Option::<Count>::deserialize(deserializer).map(|c| c.map(|c| c.0))
}

/// The six cost components of a project, in summary order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    Masonry,
    FillMaterial,
    Concrete,
    Earthworks,
    Labor,
    Equipment,
}

impl Component {
    pub const ALL: [Component; 6] = [
        Component::Masonry,
        Component::FillMaterial,
        Component::Concrete,
        Component::Earthworks,
        Component::Labor,
        Component::Equipment,
    ];

    /// Key of this component's section in a session file
    pub fn section_key(&self) -> &'static str {
        match self {
            Component::Masonry => "breeze_block",
            Component::FillMaterial => "sweet_sand",
            Component::Concrete => "concrete",
            Component::Earthworks => "land_prep",
            Component::Labor => "manpower",
            Component::Equipment => "equipment",
        }
    }

    /// Label used on summary cost lines
    pub fn label(&self) -> &'static str {
        match self {
            Component::Masonry => "Blockwork (breeze blocks)",
            Component::FillMaterial => "Sweet sand (reactor base)",
            Component::Concrete => "Concrete works",
            Component::Earthworks => "Land preparation",
            Component::Labor => "Manpower",
            Component::Equipment => "Equipment & machinery",
        }
    }

    /// Parse from common string representations (CLI names, section keys)
    pub fn from_str_flexible(s: &str) -> CalcResult<Self> {
        match s.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "masonry" | "blocks" | "blockwork" | "breeze_block" => Ok(Component::Masonry),
            "fill" | "fill_material" | "sand" | "sweet_sand" => Ok(Component::FillMaterial),
            "concrete" => Ok(Component::Concrete),
            "earthworks" | "land_prep" | "land" => Ok(Component::Earthworks),
            "labor" | "labour" | "manpower" => Ok(Component::Labor),
            "equipment" | "plant" | "machinery" => Ok(Component::Equipment),
            _ => Err(CalcError::catalog_entry_not_found(s)),
        }
    }
}

impl std::fmt::Display for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A named quantity with its unit, e.g. total wall area in m².
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Quantity {
    pub label: &'static str,
    pub value: f64,
    pub unit: &'static str,
    /// Decimals used when displayed
    pub decimals: usize,
}

impl Quantity {
    pub fn new(label: &'static str, value: f64, unit: &'static str, decimals: usize) -> Self {
        Quantity { label, value, unit, decimals }
    }

    /// Formatted value with unit, e.g. "1,234.50 m²"
    pub fn display_value(&self) -> String {
        format!("{} {}", grouped(self.value, self.decimals), self.unit)
    }
}

/// How a recalculation reports invalid input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecalcMode {
    /// Invalid input is returned to the caller as an error.
    #[default]
    Interactive,
    /// Invalid input is recorded on the calculator and not returned.
    /// Used for forced recomputes after load and before aggregation.
    Silent,
}

/// Binds an input type to its pure calculation and output contract.
pub trait Takeoff: std::fmt::Debug + Default + Clone + Serialize + DeserializeOwned {
    type Output: std::fmt::Debug + Clone + Serialize;

    const COMPONENT: Component;

    fn calculate(&self) -> CalcResult<Self::Output>;

    fn total_cost(output: &Self::Output) -> f64;

    /// The quantity shown for this component in the summary snapshot
    fn headline(output: &Self::Output) -> Quantity;

    /// Optional per-line breakdown text
    fn breakdown(_output: &Self::Output) -> Option<String> {
        None
    }

    /// Restore default inputs
    fn reset(&mut self) {
        *self = Self::default();
    }

    /// Repair values a freshly loaded section may carry (unknown names,
    /// out-of-range selections). Never fails.
    fn normalize(&mut self) {}
}

/// One calculator: its current input and the outputs of its last
/// successful calculation.
#[derive(Debug, Clone)]
pub struct Calculator<T: Takeoff> {
    input: T,
    output: Option<T::Output>,
    last_error: Option<CalcError>,
}

impl<T: Takeoff> Default for Calculator<T> {
    fn default() -> Self {
        Calculator::new(T::default())
    }
}

impl<T: Takeoff> Calculator<T> {
    pub fn new(input: T) -> Self {
        Calculator {
            input,
            output: None,
            last_error: None,
        }
    }

    pub fn input(&self) -> &T {
        &self.input
    }

    /// Mutable access to the input. Outputs are left as they are until the
    /// next recalculation.
    pub fn input_mut(&mut self) -> &mut T {
        &mut self.input
    }

    /// Replace the whole input (load). Outputs are cleared.
    pub fn set_input(&mut self, input: T) {
        self.input = input;
        self.output = None;
        self.last_error = None;
    }

    /// Result of the last successful calculation
    pub fn output(&self) -> Option<&T::Output> {
        self.output.as_ref()
    }

    /// Error recorded by the last silent recalculation, if it failed
    pub fn last_error(&self) -> Option<&CalcError> {
        self.last_error.as_ref()
    }

    /// Recompute outputs from the current input.
    ///
    /// On success the new result replaces the old one. On failure the
    /// previous result is left untouched; in [`RecalcMode::Interactive`] the
    /// error is returned, in [`RecalcMode::Silent`] it is recorded (see
    /// [`Calculator::last_error`]) and the previous result is returned.
    pub fn recalculate(&mut self, mode: RecalcMode) -> CalcResult<Option<&T::Output>> {
        match self.input.calculate() {
            Ok(output) => {
                debug!(component = ?T::COMPONENT, total = T::total_cost(&output), "recalculated");
                self.last_error = None;
                self.output = Some(output);
                Ok(self.output.as_ref())
            }
            Err(e) => match mode {
                RecalcMode::Interactive => {
                    debug!(component = ?T::COMPONENT, error = %e, "rejected input");
                    Err(e)
                }
                RecalcMode::Silent => {
                    warn!(component = ?T::COMPONENT, error = %e, "silent recalculation failed; keeping previous outputs");
                    self.last_error = Some(e);
                    Ok(self.output.as_ref())
                }
            },
        }
    }

    /// Restore default inputs and clear outputs.
    pub fn reset(&mut self) {
        self.input.reset();
        self.output = None;
        self.last_error = None;
    }
}

/// What the aggregator needs from a calculator.
pub trait CostSource {
    fn component(&self) -> Component;

    /// Recompute silently from current inputs.
    fn force_recompute(&mut self);

    /// Why the last forced recompute failed, if it did
    fn failure(&self) -> Option<&CalcError>;

    fn total_cost(&self) -> Option<f64>;

    fn headline(&self) -> Option<Quantity>;

    fn breakdown(&self) -> Option<String>;
}

impl<T: Takeoff> CostSource for Calculator<T> {
    fn component(&self) -> Component {
        T::COMPONENT
    }

    fn force_recompute(&mut self) {
        // Silent mode never returns an error.
        let _ = self.recalculate(RecalcMode::Silent);
    }

    fn failure(&self) -> Option<&CalcError> {
        self.last_error.as_ref()
    }

    fn total_cost(&self) -> Option<f64> {
        self.output.as_ref().map(T::total_cost)
    }

    fn headline(&self) -> Option<Quantity> {
        self.output.as_ref().map(T::headline)
    }

    fn breakdown(&self) -> Option<String> {
        self.output.as_ref().and_then(T::breakdown)
    }
}
