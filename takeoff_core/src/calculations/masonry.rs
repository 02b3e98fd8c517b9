//! # Masonry Quantity Calculation
//!
//! Converts wall geometry into block, pallet and cost counts for the
//! selected block type.
//!
//! Three independent geometry groups feed one total face area:
//!
//! - **Straight walls**: `L × H × N`
//! - **Arcs** (half circles): `π × r × H × N`
//! - **Reactors**: `H × (3L + 2π(W/2)) × N`, i.e. two long side walls and one
//!   central wall of length L, closed by two semicircular end arches of
//!   radius W/2
//!
//! A group with any zero (or negative) factor contributes no area.
//!
//! ## Example
//!
//! ```rust
//! use takeoff_core::calculations::masonry::{calculate, MasonryInput};
//!
//! let input = MasonryInput {
//!     wall_length: 10.0,
//!     wall_height: 3.0,
//!     ..Default::default()
//! };
//!
//! let result = calculate(&input).unwrap();
//! assert_eq!(result.blocks_required, 375);
//! assert_eq!(result.pallets_required, 4);
//! assert_eq!(result.leftover_blocks, 57);
//! ```

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{deserialize_count, Component, Quantity, Takeoff};
use crate::errors::{CalcError, CalcResult};
use crate::materials::{catalog, BlockType};

/// Straight walls of length L in one reactor (two sides plus the divider).
pub const REACTOR_STRAIGHT_WALLS: f64 = 3.0;

/// Semicircular end arches in one reactor.
pub const REACTOR_END_ARCHES: f64 = 2.0;

/// Input parameters for a masonry takeoff.
///
/// Lengths and heights are in meters; counts are whole numbers.
///
/// ## JSON Example
///
/// ```json
/// {
///   "block_name": "40 x 20 x 20 cm (hollow)",
///   "cost_per_block": 0.55,
///   "wall_length": 10.0,
///   "wall_height": 3.0,
///   "wall_count": 1,
///   "arc_radius": 0.0,
///   "arc_height": 0.0,
///   "arc_count": 0,
///   "reactor_length": 0.0,
///   "reactor_width": 0.0,
///   "reactor_height": 0.0,
///   "reactor_count": 0
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MasonryInput {
    /// Selected catalog entry
    pub block_name: Option<String>,

    /// Price per block (overrides the catalog default)
    pub cost_per_block: f64,

    pub wall_length: f64,
    pub wall_height: f64,
    #[serde(deserialize_with = "deserialize_count")]
    pub wall_count: u32,

    pub arc_radius: f64,
    pub arc_height: f64,
    #[serde(deserialize_with = "deserialize_count")]
    pub arc_count: u32,

    pub reactor_length: f64,
    /// Reactor width; the end arches have radius width / 2
    pub reactor_width: f64,
    pub reactor_height: f64,
    #[serde(deserialize_with = "deserialize_count")]
    pub reactor_count: u32,
}

impl Default for MasonryInput {
    fn default() -> Self {
        let block = catalog().first();
        MasonryInput {
            block_name: Some(block.name.clone()),
            cost_per_block: block.default_cost,
            wall_length: 0.0,
            wall_height: 0.0,
            wall_count: 1,
            arc_radius: 0.0,
            arc_height: 0.0,
            arc_count: 0,
            reactor_length: 0.0,
            reactor_width: 0.0,
            reactor_height: 0.0,
            reactor_count: 0,
        }
    }
}

impl MasonryInput {
    /// Select a block type and apply its default price.
    pub fn select_block(&mut self, name: &str) -> CalcResult<&BlockType> {
        let block = catalog()
            .get(name)
            .ok_or_else(|| CalcError::catalog_entry_not_found(name))?;
        self.block_name = Some(block.name.clone());
        self.cost_per_block = block.default_cost;
        Ok(block)
    }

    /// The selected block type.
    pub fn block(&self) -> CalcResult<&'static BlockType> {
        let name = self
            .block_name
            .as_deref()
            .ok_or_else(|| CalcError::missing_field("block_name"))?;
        catalog()
            .get(name)
            .ok_or_else(|| CalcError::catalog_entry_not_found(name))
    }

    /// Validate input parameters.
    pub fn validate(&self) -> CalcResult<()> {
        self.block()?;
        if self.cost_per_block < 0.0 {
            return Err(CalcError::invalid_input(
                "cost_per_block",
                self.cost_per_block.to_string(),
                "Cost per block cannot be negative",
            ));
        }
        Ok(())
    }

    /// Straight wall area (m²)
    pub fn wall_area_m2(&self) -> f64 {
        if self.wall_length > 0.0 && self.wall_height > 0.0 && self.wall_count > 0 {
            self.wall_length * self.wall_height * self.wall_count as f64
        } else {
            0.0
        }
    }

    /// Half-circle arc area (m²)
    pub fn arc_area_m2(&self) -> f64 {
        if self.arc_radius > 0.0 && self.arc_height > 0.0 && self.arc_count > 0 {
            PI * self.arc_radius * self.arc_height * self.arc_count as f64
        } else {
            0.0
        }
    }

    /// Reactor wall area (m²)
    pub fn reactor_area_m2(&self) -> f64 {
        if self.reactor_length > 0.0
            && self.reactor_width > 0.0
            && self.reactor_height > 0.0
            && self.reactor_count > 0
        {
            let end_radius = self.reactor_width / 2.0;
            let run = REACTOR_STRAIGHT_WALLS * self.reactor_length + REACTOR_END_ARCHES * PI * end_radius;
            self.reactor_height * run * self.reactor_count as f64
        } else {
            0.0
        }
    }
}

/// Masonry takeoff results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MasonryResult {
    pub block_name: String,
    pub block_face_area_m2: f64,
    pub units_per_pallet: u32,
    pub cost_per_block: f64,

    pub wall_area_m2: f64,
    pub arc_area_m2: f64,
    pub reactor_area_m2: f64,
    pub total_area_m2: f64,

    pub blocks_required: u64,
    pub pallets_required: u64,
    /// Blocks left on the last pallet, always below `units_per_pallet`
    pub leftover_blocks: u64,

    pub total_cost: f64,
}

/// Calculate block, pallet and cost counts.
pub fn calculate(input: &MasonryInput) -> CalcResult<MasonryResult> {
    input.validate()?;
    let block = input.block()?;

    let wall_area_m2 = input.wall_area_m2();
    let arc_area_m2 = input.arc_area_m2();
    let reactor_area_m2 = input.reactor_area_m2();
    let total_area_m2 = wall_area_m2 + arc_area_m2 + reactor_area_m2;

    let face = block.face_area_m2();
    let blocks_required = if face > 0.0 && total_area_m2 > 0.0 {
        (total_area_m2 / face).ceil() as u64
    } else {
        0
    };

    let per_pallet = u64::from(block.units_per_pallet);
    let pallets_required = blocks_required.div_ceil(per_pallet);
    let leftover_blocks = (per_pallet - blocks_required % per_pallet) % per_pallet;

    Ok(MasonryResult {
        block_name: block.name.clone(),
        block_face_area_m2: face,
        units_per_pallet: block.units_per_pallet,
        cost_per_block: input.cost_per_block,
        wall_area_m2,
        arc_area_m2,
        reactor_area_m2,
        total_area_m2,
        blocks_required,
        pallets_required,
        leftover_blocks,
        total_cost: blocks_required as f64 * input.cost_per_block,
    })
}

impl Takeoff for MasonryInput {
    type Output = MasonryResult;

    const COMPONENT: Component = Component::Masonry;

    fn calculate(&self) -> CalcResult<MasonryResult> {
        calculate(self)
    }

    fn total_cost(output: &MasonryResult) -> f64 {
        output.total_cost
    }

    fn headline(output: &MasonryResult) -> Quantity {
        Quantity::new("Blockwork area", output.total_area_m2, "m²", 2)
    }

    /// Geometry goes back to defaults; the block selection stays and its
    /// price returns to the catalog default.
    fn reset(&mut self) {
        let selected = self.block_name.clone();
        *self = MasonryInput::default();
        if let Some(name) = selected {
            if let Some(block) = catalog().get(&name) {
                self.block_name = Some(block.name.clone());
                self.cost_per_block = block.default_cost;
            }
        }
    }

    fn normalize(&mut self) {
        let known = self
            .block_name
            .as_deref()
            .is_some_and(|name| catalog().get(name).is_some());
        if !known {
            let fallback = catalog().first();
            warn!(
                requested = self.block_name.as_deref().unwrap_or(""),
                using = %fallback.name,
                "unknown block type in session; keeping default selection"
            );
            self.block_name = Some(fallback.name.clone());
        }
    }
}
