//! # Aggregator
//!
//! Collects each calculator's total cost and headline quantity into one
//! project summary. The aggregator does no geometry of its own: it forces
//! every source to recompute silently, then reads and sums.
//!
//! A source whose recompute fails contributes zero, is flagged with the
//! reason, and never stops the others from contributing.
//!
//! ## Example
//!
//! ```rust
//! use takeoff_core::aggregator::Aggregator;
//! use takeoff_core::workbook::Workbook;
//!
//! let mut workbook = Workbook::new();
//! workbook.labor.input_mut().trade_mut(0).unwrap().workers = 10;
//!
//! let mut aggregator = Aggregator::new();
//! let summary = aggregator.refresh(&mut workbook);
//! assert_eq!(summary.grand_total, 12000.0);
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::calculations::{Component, CostSource};
use crate::format::{money, NOT_AVAILABLE};
use crate::workbook::Workbook;

/// State of one cost line after a refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineStatus {
    /// Fresh result from current inputs
    Calculated,
    /// Recompute failed; cost counted as zero
    Failed,
    /// No result available; cost counted as zero
    Unavailable,
}

/// One component's contribution to the project total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostLine {
    pub component: Component,
    pub label: String,
    /// Contribution to the grand total (zero unless calculated)
    pub cost: f64,
    pub status: LineStatus,
    /// Why the line is not calculated
    pub reason: Option<String>,
}

impl CostLine {
    /// Cost as shown in tables: money, or "N/A" when not calculated.
    pub fn cost_text(&self) -> String {
        match self.status {
            LineStatus::Calculated => money(self.cost),
            LineStatus::Failed | LineStatus::Unavailable => NOT_AVAILABLE.to_string(),
        }
    }
}

/// One headline quantity in the snapshot table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantityLine {
    pub component: Component,
    pub label: String,
    pub value: Option<f64>,
    pub unit: String,
    /// Formatted value with unit, or "N/A"
    pub text: String,
}

/// Consolidated project costs at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateSummary {
    pub refreshed_utc: DateTime<Utc>,
    /// Six lines in component order
    pub lines: Vec<CostLine>,
    /// Sum of the six line costs
    pub grand_total: f64,
    pub quantities: Vec<QuantityLine>,
}

impl AggregateSummary {
    pub fn line(&self, component: Component) -> Option<&CostLine> {
        self.lines.iter().find(|l| l.component == component)
    }

    pub fn quantity(&self, component: Component) -> Option<&QuantityLine> {
        self.quantities.iter().find(|q| q.component == component)
    }

    /// Lines that did not contribute a calculated cost.
    pub fn flagged(&self) -> impl Iterator<Item = &CostLine> {
        self.lines.iter().filter(|l| l.status != LineStatus::Calculated)
    }

    /// Every component contributed a calculated cost.
    pub fn is_complete(&self) -> bool {
        self.flagged().next().is_none()
    }
}

/// Force-recompute every source and build a summary from their outputs.
pub fn aggregate<'a>(sources: impl IntoIterator<Item = &'a mut dyn CostSource>) -> AggregateSummary {
    let mut lines = Vec::new();
    let mut quantities = Vec::new();

    for source in sources {
        source.force_recompute();
        let component = source.component();

        let (cost, status, reason) = match (source.failure(), source.total_cost()) {
            (Some(err), _) => {
                warn!(component = ?component, error = %err, "excluded from project total");
                (0.0, LineStatus::Failed, Some(err.to_string()))
            }
            (None, Some(cost)) => (cost, LineStatus::Calculated, None),
            (None, None) => (0.0, LineStatus::Unavailable, Some("no calculation yet".to_string())),
        };
        lines.push(CostLine {
            component,
            label: component.label().to_string(),
            cost,
            status,
            reason,
        });

        // A failed source may still hold an older output; don't show it.
        let headline = if status == LineStatus::Calculated { source.headline() } else { None };
        quantities.push(match headline {
            Some(q) => QuantityLine {
                component,
                label: q.label.to_string(),
                value: Some(q.value),
                unit: q.unit.to_string(),
                text: q.display_value(),
            },
            None => QuantityLine {
                component,
                label: headline_label(component).to_string(),
                value: None,
                unit: String::new(),
                text: NOT_AVAILABLE.to_string(),
            },
        });
    }

    let grand_total = lines.iter().map(|l| l.cost).sum();
    info!(grand_total, "project summary refreshed");

    AggregateSummary {
        refreshed_utc: Utc::now(),
        lines,
        grand_total,
        quantities,
    }
}

fn headline_label(component: Component) -> &'static str {
    match component {
        Component::Masonry => "Blockwork area",
        Component::FillMaterial => "Fill volume",
        Component::Concrete => "Concrete volume",
        Component::Earthworks => "Cut volume",
        Component::Labor => "Man-hours",
        Component::Equipment => "Equipment operating hours",
    }
}

/// Holds the most recent summary; stale until refreshed.
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    last: Option<AggregateSummary>,
}

impl Aggregator {
    pub fn new() -> Self {
        Aggregator::default()
    }

    /// Recompute every calculator in the workbook and rebuild the summary.
    pub fn refresh(&mut self, workbook: &mut Workbook) -> &AggregateSummary {
        self.last.insert(aggregate(workbook.sources_mut()))
    }

    /// The last summary, if any refresh has happened.
    pub fn summary(&self) -> Option<&AggregateSummary> {
        self.last.as_ref()
    }
}
