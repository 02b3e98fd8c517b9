//! # takeoff_core - Construction Quantity Takeoff Engine
//!
//! `takeoff_core` turns site dimensions, unit rates and crew/plant schedules into
//! quantities and costs for a small civil/structural project. All inputs and
//! outputs are JSON-serializable, so a session can be saved, edited by hand
//! and reloaded.
//!
//! ## Design Philosophy
//!
//! - **Pure calculations**: Each calculator is a plain input struct and a
//!   `calculate` function that returns a result or a structured error
//! - **JSON-First**: Inputs, results and errors implement Serialize/Deserialize
//! - **Explicit modes**: Interactive recomputes surface errors; silent ones
//!   (load, aggregation) log them and keep the last good output
//! - **No hidden coupling**: The aggregator only asks each calculator for a
//!   cost, a headline quantity and an optional breakdown
//!
//! ## Quick Start
//!
//! ```rust
//! use takeoff_core::{Aggregator, Workbook};
//!
//! let mut workbook = Workbook::new();
//! workbook.masonry.input_mut().wall_length = 10.0;
//! workbook.masonry.input_mut().wall_height = 3.0;
//!
//! let summary = Aggregator::new().refresh(&mut workbook).clone();
//! assert!((summary.grand_total - 206.25).abs() < 1e-9);
//! ```
//!
//! ## Modules
//!
//! - [`calculations`] - The six calculators and the recompute/cost-source seams
//! - [`workbook`] - In-memory session owning one calculator per component
//! - [`aggregator`] - Project summary across all calculators
//! - [`file_io`] - Session files with atomic saves and schema checks
//! - [`report`] - Plain-text multi-section cost report
//! - [`materials`] - Block catalog and rebar intensity levels
//! - [`format`] - Money and grouped-number formatting
//! - [`units`] - Type-safe unit wrappers
//! - [`errors`] - Structured error types

pub mod aggregator;
pub mod calculations;
pub mod errors;
pub mod file_io;
pub mod format;
pub mod materials;
pub mod report;
pub mod units;
pub mod workbook;

// Re-export commonly used types at crate root for convenience
pub use aggregator::{AggregateSummary, Aggregator, CostLine, LineStatus, QuantityLine};
pub use calculations::{Calculator, Component, CostSource, Quantity, RecalcMode, Takeoff};
pub use errors::{CalcError, CalcResult};
pub use file_io::{load_session, save_session, SessionDocument, SCHEMA_VERSION};
pub use workbook::Workbook;
