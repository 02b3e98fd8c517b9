//! Output formatting module

use anyhow::Result;
use serde::Serialize;
use takeoff_core::calculations::EquipmentRow;
use takeoff_core::format::{grouped, money_with};
use takeoff_core::materials::BlockCatalog;
use takeoff_core::{AggregateSummary, LineStatus};

use crate::cli::OutputFormat;

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Summary table text, costs in the given currency symbol.
pub fn summary_table(summary: &AggregateSummary, currency: &str) -> String {
    let mut out = String::new();
    out.push_str("Project Summary\n");
    out.push_str("===============\n");
    for line in &summary.lines {
        let cost = match line.status {
            LineStatus::Calculated => money_with(line.cost, currency),
            LineStatus::Failed | LineStatus::Unavailable => "N/A".to_string(),
        };
        out.push_str(&format!("{:<28}{:>18}\n", line.label, cost));
    }
    out.push_str(&"-".repeat(46));
    out.push('\n');
    out.push_str(&format!(
        "{:<28}{:>18}\n",
        "TOTAL PROJECT COST",
        money_with(summary.grand_total, currency)
    ));

    out.push_str("\nQuantities\n----------\n");
    for q in &summary.quantities {
        out.push_str(&format!("{:<28}{:>18}\n", q.label, q.text));
    }

    let flagged: Vec<_> = summary.flagged().collect();
    if !flagged.is_empty() {
        out.push_str("\nExcluded from total:\n");
        for line in flagged {
            out.push_str(&format!(
                "  {}: {}\n",
                line.label,
                line.reason.as_deref().unwrap_or("unknown")
            ));
        }
    }
    out
}

pub fn output_summary(format: OutputFormat, summary: &AggregateSummary, currency: &str) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(summary),
        OutputFormat::Table => {
            print!("{}", summary_table(summary, currency));
            Ok(())
        }
    }
}

pub fn blocks_table(catalog: &BlockCatalog) -> String {
    let mut out = format!(
        "{:<28}{:>10}{:>10}{:>12}{:>10}\n",
        "Block", "Face m²", "Pallet", "Blocks/m²", "Price"
    );
    for block in catalog.iter() {
        let face = block.face_area_m2();
        out.push_str(&format!(
            "{:<28}{:>10}{:>10}{:>12}{:>10}\n",
            block.name,
            grouped(face, 3),
            block.units_per_pallet,
            grouped(1.0 / face, 2),
            grouped(block.default_cost, 2)
        ));
    }
    out
}

pub fn fleet_table(rows: &[EquipmentRow]) -> String {
    let mut out = format!(
        "{:>3}  {:<26}{:>6}{:>10}{:>10}{:>8}\n",
        "#", "Name", "Units", "Rate/h", "Fuel L/h", "Util %"
    );
    for (i, row) in rows.iter().enumerate() {
        out.push_str(&format!(
            "{:>3}  {:<26}{:>6}{:>10}{:>10}{:>8}\n",
            i,
            row.display_name(i),
            row.count,
            grouped(row.hourly_rate, 2),
            grouped(row.fuel_l_per_h, 1),
            grouped(row.utilization_pct, 0)
        ));
    }
    out
}
