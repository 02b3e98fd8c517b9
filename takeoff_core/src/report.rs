//! # Report Module
//!
//! Plain-text cost report built from the latest project summary and each
//! calculator's detail.
//!
//! ## Layout
//!
//! 1. Cost summary (six lines and the project total)
//! 2. Blockwork areas, blocks, pallets and leftover
//! 3. Fill material
//! 4. Concrete works
//! 5. Land preparation
//! 6. Manpower, with the trade breakdown
//! 7. Equipment, with fuel, mobilisation, overhead and per-row breakdown
//! 8. Notes
//!
//! Anything a calculator cannot supply prints as "N/A".
//!
//! ## Example
//!
//! ```rust
//! use takeoff_core::aggregator::Aggregator;
//! use takeoff_core::report::render_report;
//! use takeoff_core::workbook::Workbook;
//!
//! let mut workbook = Workbook::new();
//! let mut aggregator = Aggregator::new();
//! let text = render_report(&mut workbook, &mut aggregator);
//! assert!(text.contains("1.7 TOTAL PROJECT COST"));
//! ```

use std::fmt::Write;

use crate::aggregator::{AggregateSummary, Aggregator};
use crate::calculations::{Calculator, Component, Takeoff};
use crate::format::{grouped, money, NOT_AVAILABLE};
use crate::workbook::Workbook;

pub const REPORT_TITLE: &str = "Construction Project Detailed Cost Report";

const LABEL_WIDTH: usize = 36;
const RULE_WIDTH: usize = 78;

/// Output of a calculator whose last recompute succeeded.
fn fresh<T: Takeoff>(calc: &Calculator<T>) -> Option<&T::Output> {
    match calc.last_error() {
        Some(_) => None,
        None => calc.output(),
    }
}

fn or_na(value: Option<String>) -> String {
    value.unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

struct Sheet {
    out: String,
}

impl Sheet {
    fn header(&mut self, title: &str) {
        let _ = writeln!(self.out, "{title}");
        let _ = writeln!(self.out, "{}", "=".repeat(title.chars().count()));
    }

    fn rule(&mut self) {
        let _ = writeln!(self.out, "{}", "-".repeat(RULE_WIDTH));
    }

    fn line(&mut self, text: &str) {
        let _ = writeln!(self.out, "{text}");
    }

    fn row(&mut self, label: &str, value: &str) {
        let label = format!("{label}:");
        let _ = writeln!(self.out, "{label:<LABEL_WIDTH$}{value}");
    }

    fn blank(&mut self) {
        self.out.push('\n');
    }
}

/// Refresh the summary and render the full report.
pub fn render_report(workbook: &mut Workbook, aggregator: &mut Aggregator) -> String {
    let summary = aggregator.refresh(workbook).clone();
    render_with_summary(workbook, &summary)
}

/// Render from an already-refreshed summary.
pub fn render_with_summary(workbook: &Workbook, summary: &AggregateSummary) -> String {
    let mut sheet = Sheet { out: String::new() };

    sheet.header(REPORT_TITLE);
    sheet.line(&format!(
        "Generated {}",
        summary.refreshed_utc.format("%Y-%m-%d %H:%M UTC")
    ));
    sheet.rule();
    sheet.blank();

    cost_summary(&mut sheet, summary);
    blockwork(&mut sheet, workbook);
    fill(&mut sheet, workbook, summary);
    concrete(&mut sheet, workbook, summary);
    land_prep(&mut sheet, workbook, summary);
    manpower(&mut sheet, workbook, summary);
    equipment(&mut sheet, workbook, summary);
    notes(&mut sheet, summary);

    sheet.out
}

fn cost_text(summary: &AggregateSummary, component: Component) -> String {
    or_na(summary.line(component).map(|l| l.cost_text()))
}

fn quantity_text(summary: &AggregateSummary, component: Component) -> String {
    or_na(summary.quantity(component).map(|q| q.text.clone()))
}

fn cost_summary(sheet: &mut Sheet, summary: &AggregateSummary) {
    sheet.header("1. Cost Summary");
    for (i, component) in Component::ALL.iter().enumerate() {
        sheet.row(&format!("1.{} {}", i + 1, component.label()), &cost_text(summary, *component));
    }
    sheet.blank();
    sheet.row("1.7 TOTAL PROJECT COST", &money(summary.grand_total));
    sheet.rule();
    sheet.blank();
}

fn blockwork(sheet: &mut Sheet, workbook: &Workbook) {
    let result = fresh(&workbook.masonry);
    let area = |value: Option<f64>| or_na(value.map(|v| format!("{} m²", grouped(v, 2))));
    let count = |value: Option<u64>| or_na(value.map(|v| grouped(v as f64, 0)));

    sheet.header("2. Blockwork (Breeze Blocks)");
    sheet.row("2.1 Total blockwork area", &area(result.map(|r| r.total_area_m2)));
    sheet.row("2.2 Straight walls area", &area(result.map(|r| r.wall_area_m2)));
    sheet.row("2.3 Half-circle arcs area", &area(result.map(|r| r.arc_area_m2)));
    sheet.row("2.4 Raceway reactor walls area", &area(result.map(|r| r.reactor_area_m2)));
    sheet.blank();
    sheet.row("2.5 Blocks required", &count(result.map(|r| r.blocks_required)));
    sheet.row("2.6 Pallets required", &count(result.map(|r| r.pallets_required)));
    sheet.row("2.7 Leftover blocks (last pallet)", &count(result.map(|r| r.leftover_blocks)));
    sheet.row("2.8 Block type", &or_na(result.map(|r| r.block_name.clone())));
    sheet.rule();
    sheet.blank();
}

fn fill(sheet: &mut Sheet, workbook: &Workbook, summary: &AggregateSummary) {
    let result = fresh(&workbook.fill);
    sheet.header("3. Sweet Sand (Reactor Base Fill)");
    sheet.row("3.1 Total sweet sand cost", &cost_text(summary, Component::FillMaterial));
    sheet.row("3.2 Sweet sand volume", &quantity_text(summary, Component::FillMaterial));
    sheet.row(
        "3.3 Sweet sand weight",
        &or_na(result.map(|r| format!("{} t", grouped(r.weight_t, 2)))),
    );
    sheet.rule();
    sheet.blank();
}

fn concrete(sheet: &mut Sheet, workbook: &Workbook, summary: &AggregateSummary) {
    let result = fresh(&workbook.concrete);
    sheet.header("4. Concrete Works");
    sheet.row("4.1 Total concrete cost", &cost_text(summary, Component::Concrete));
    sheet.row("4.2 Concrete volume", &quantity_text(summary, Component::Concrete));
    sheet.row(
        "4.3 Element type",
        &or_na(result.map(|r| r.element.display_name().to_string())),
    );
    sheet.row(
        "4.4 Formwork area",
        &or_na(result.map(|r| format!("{} m²", grouped(r.formwork_area_m2, 2)))),
    );
    sheet.row(
        "4.5 Reinforcement",
        &or_na(result.map(|r| format!("{} t", grouped(r.rebar_t, 3)))),
    );
    sheet.rule();
    sheet.blank();
}

fn land_prep(sheet: &mut Sheet, workbook: &Workbook, summary: &AggregateSummary) {
    let result = fresh(&workbook.earthworks);
    sheet.header("5. Land Preparation");
    sheet.row("5.1 Total land preparation cost", &cost_text(summary, Component::Earthworks));
    sheet.row("5.2 Total cut volume", &quantity_text(summary, Component::Earthworks));
    sheet.row(
        "5.3 Compaction (area-passes)",
        &or_na(result.map(|r| format!("{} m²", grouped(r.area_passes_m2, 1)))),
    );
    sheet.row(
        "5.4 Compaction target",
        &or_na(result.map(|r| format!("{}% Proctor", grouped(r.compaction_target_pct, 1)))),
    );
    sheet.rule();
    sheet.blank();
}

fn manpower(sheet: &mut Sheet, workbook: &Workbook, summary: &AggregateSummary) {
    sheet.header("6. Manpower");
    sheet.row("6.1 Total manpower cost", &cost_text(summary, Component::Labor));
    sheet.row("6.2 Total man-hours", &quantity_text(summary, Component::Labor));
    sheet.blank();
    breakdown_block(sheet, "6.3", fresh(&workbook.labor).map(|r| r.breakdown()));
    sheet.rule();
    sheet.blank();
}

fn equipment(sheet: &mut Sheet, workbook: &Workbook, summary: &AggregateSummary) {
    let result = fresh(&workbook.equipment);
    sheet.header("7. Equipment & Machinery");
    sheet.line("7.1 Totals:");
    sheet.row("      Operating hours (all machines)", &quantity_text(summary, Component::Equipment));
    sheet.row("      Total equipment cost", &cost_text(summary, Component::Equipment));
    sheet.blank();
    sheet.line("7.2 Fuel & overheads:");
    sheet.row(
        "      Fuel consumption",
        &or_na(result.map(|r| format!("{} L", grouped(r.total_fuel_litres, 1)))),
    );
    sheet.row("      Fuel cost", &or_na(result.map(|r| money(r.total_fuel_cost))));
    sheet.row("      Mobilisation + demob", &or_na(result.map(|r| money(r.mobilisation_cost))));
    sheet.row("      Plant overhead + misc", &or_na(result.map(|r| money(r.overhead_cost))));
    sheet.blank();
    breakdown_block(sheet, "7.3", result.map(|r| r.breakdown()));
    sheet.rule();
    sheet.blank();
}

fn breakdown_block(sheet: &mut Sheet, number: &str, text: Option<String>) {
    match text.filter(|t| !t.trim().is_empty()) {
        Some(text) => {
            sheet.line(&format!("{number} Breakdown:"));
            for line in text.lines() {
                sheet.line(&format!("      {line}"));
            }
        }
        None => sheet.line(&format!(
            "{number} Breakdown not available (no calculation yet)."
        )),
    }
}

fn notes(sheet: &mut Sheet, summary: &AggregateSummary) {
    sheet.header("8. Notes & Assumptions");
    for line in summary.flagged() {
        let reason = line.reason.as_deref().unwrap_or("unknown");
        sheet.line(&format!("- {} excluded from the total: {}", line.component.label(), reason));
    }
    sheet.line("- This is an internal report for estimates only.");
    sheet.line("- For final design and construction, verify quantities, unit rates,");
    sheet.line("  and assumptions with detailed engineering drawings and site conditions.");
}
