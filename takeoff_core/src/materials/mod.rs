//! # Materials Reference Data
//!
//! Reference data the calculators look up by name or preset:
//!
//! - **Blocks**: masonry block sizes, pallet quantities and default prices,
//!   loaded from an embedded TOML table (or a replacement installed at start-up)
//! - **Rebar**: typical reinforcement intensities for concrete elements
//!
//! ## Example
//!
//! ```rust
//! use takeoff_core::materials::{catalog, RebarLevel};
//!
//! let block = catalog().get("40 x 20 x 20 cm (hollow)").unwrap();
//! assert_eq!(block.units_per_pallet, 108);
//!
//! assert_eq!(RebarLevel::Medium.intensity_kg_per_m3(), Some(90.0));
//! ```

pub mod blocks;
pub mod rebar;

pub use blocks::{catalog, install_catalog, BlockCatalog, BlockType};
pub use rebar::RebarLevel;
