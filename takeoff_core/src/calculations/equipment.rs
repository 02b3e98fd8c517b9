//! # Equipment Cost Calculation
//!
//! Operating hours, fuel and hire cost for a fleet of plant items working a
//! common schedule, plus mobilisation and plant overheads.
//!
//! Per active row:
//!
//! ```text
//! hours  = count × days × hours_per_day × utilisation / 100
//! hire   = hours × hourly rate
//! litres = hours × fuel burn (L/h)
//! fuel   = litres × fuel price
//! ```
//!
//! A row with no units, no rate or no utilisation is inactive and skipped.

use std::fmt::Write as _;

use serde::{Deserialize, Deserializer, Serialize};

use super::{deserialize_count, deserialize_opt_count, Component, Quantity, Takeoff};
use crate::errors::{CalcError, CalcResult};
use crate::format::{grouped, money};

/// One plant item on the fleet list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentRow {
    pub name: String,
    /// Units on site
    #[serde(deserialize_with = "deserialize_count")]
    pub count: u32,
    /// Hire rate per operating hour
    #[serde(rename = "hire_rate_day")]
    pub hourly_rate: f64,
    /// Fuel burn (litres per operating hour)
    #[serde(rename = "fuel_lph")]
    pub fuel_l_per_h: f64,
    /// Share of scheduled hours actually worked (0-100)
    #[serde(rename = "util_pct")]
    pub utilization_pct: f64,
}

impl EquipmentRow {
    pub fn new(name: impl Into<String>, hourly_rate: f64, fuel_l_per_h: f64) -> Self {
        EquipmentRow {
            name: name.into(),
            count: 0,
            hourly_rate,
            fuel_l_per_h,
            utilization_pct: 70.0,
        }
    }

    /// Blank row appended by the user.
    pub fn blank() -> Self {
        EquipmentRow::new("", 0.0, 0.0)
    }

    /// Name shown in breakdowns; blank names become "Item N" (1-based).
    pub fn display_name(&self, index: usize) -> String {
        let name = self.name.trim();
        if name.is_empty() {
            format!("Item {}", index + 1)
        } else {
            name.to_string()
        }
    }
}

fn default_fleet() -> Vec<EquipmentRow> {
    vec![
        EquipmentRow::new("20t Excavator", 90.0, 18.0),
        EquipmentRow::new("Wheel Loader", 80.0, 15.0),
        EquipmentRow::new("Vibratory Roller", 60.0, 10.0),
        EquipmentRow::new("Water Tanker", 55.0, 8.0),
        EquipmentRow::new("Concrete Pump", 120.0, 20.0),
        EquipmentRow::new("Mobile Crane", 150.0, 22.0),
        EquipmentRow::new("Tipper Truck", 70.0, 14.0),
        EquipmentRow::new("Telehandler / Forklift", 65.0, 9.0),
    ]
}

#[derive(Deserialize)]
struct StoredRow {
    #[serde(default)]
    name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_count")]
    count: Option<u32>,
    #[serde(default)]
    hire_rate_day: Option<f64>,
    #[serde(default)]
    fuel_lph: Option<f64>,
    #[serde(default)]
    util_pct: Option<f64>,
}

/// Stored rows overlay the default fleet by position. Missing fields keep
/// the default row's value, except `count` which defaults to 0.
fn merge_rows<'de, D>(deserializer: D) -> Result<Vec<EquipmentRow>, D::Error>
where
    D: Deserializer<'de>,
{
    let stored = Vec::<StoredRow>::deserialize(deserializer)?;
    let defaults = default_fleet();
    let rows = stored
        .into_iter()
        .enumerate()
        .map(|(i, row)| {
            let mut base = defaults.get(i).cloned().unwrap_or_else(EquipmentRow::blank);
            if let Some(name) = row.name {
                base.name = name;
            }
            base.count = row.count.unwrap_or(0);
            if let Some(rate) = row.hire_rate_day {
                base.hourly_rate = rate;
            }
            if let Some(fuel) = row.fuel_lph {
                base.fuel_l_per_h = fuel;
            }
            if let Some(util) = row.util_pct {
                base.utilization_pct = util;
            }
            base
        })
        .collect();
    Ok(rows)
}

/// Input parameters for equipment and machinery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EquipmentInput {
    #[serde(deserialize_with = "merge_rows")]
    pub rows: Vec<EquipmentRow>,

    #[serde(deserialize_with = "deserialize_count")]
    pub days: u32,
    pub hours_per_day: f64,
    /// Fuel price per litre
    pub fuel_price: f64,

    pub mobilisation: f64,
    pub demobilisation: f64,
    #[serde(rename = "daily_plant_overhead")]
    pub daily_overhead: f64,
    #[serde(rename = "misc_plant_allow")]
    pub misc_allowance: f64,
}

impl Default for EquipmentInput {
    fn default() -> Self {
        EquipmentInput {
            rows: default_fleet(),
            days: 30,
            hours_per_day: 8.0,
            fuel_price: 0.50,
            mobilisation: 0.0,
            demobilisation: 0.0,
            daily_overhead: 0.0,
            misc_allowance: 0.0,
        }
    }
}

impl EquipmentInput {
    /// Append a blank row and return its index.
    pub fn add_row(&mut self) -> usize {
        self.rows.push(EquipmentRow::blank());
        self.rows.len() - 1
    }

    /// Remove a row by index.
    pub fn remove_row(&mut self, index: usize) -> CalcResult<EquipmentRow> {
        if index >= self.rows.len() {
            return Err(CalcError::invalid_input(
                "rows",
                index.to_string(),
                format!("No equipment row at index {} ({} rows)", index, self.rows.len()),
            ));
        }
        Ok(self.rows.remove(index))
    }

    /// Scheduled hours per unit at 100% utilisation
    pub fn schedule_hours(&self) -> f64 {
        self.days as f64 * self.hours_per_day
    }

    /// Validate input parameters.
    pub fn validate(&self) -> CalcResult<()> {
        if self.days == 0 {
            return Err(CalcError::invalid_input(
                "days",
                self.days.to_string(),
                "Working days must be greater than zero",
            ));
        }
        if self.hours_per_day < 0.0 {
            return Err(CalcError::invalid_input(
                "hours_per_day",
                self.hours_per_day.to_string(),
                "Operating hours per day cannot be negative",
            ));
        }
        if self.fuel_price < 0.0 {
            return Err(CalcError::invalid_input(
                "fuel_price",
                self.fuel_price.to_string(),
                "Fuel price cannot be negative",
            ));
        }
        for (i, row) in self.rows.iter().enumerate() {
            if row.utilization_pct > 100.0 {
                return Err(CalcError::invalid_input(
                    format!("rows[{}].util_pct", i),
                    row.utilization_pct.to_string(),
                    "Utilisation cannot exceed 100%",
                ));
            }
            if row.fuel_l_per_h < 0.0 {
                return Err(CalcError::invalid_input(
                    format!("rows[{}].fuel_lph", i),
                    row.fuel_l_per_h.to_string(),
                    "Fuel burn cannot be negative",
                ));
            }
        }
        Ok(())
    }
}

/// Cost line for one active row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentLine {
    pub name: String,
    pub count: u32,
    pub utilization_pct: f64,
    pub hours: f64,
    pub fuel_litres: f64,
    pub hire_cost: f64,
    pub fuel_cost: f64,
}

/// Equipment results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentResult {
    pub days: u32,
    pub hours_per_day: f64,
    pub fuel_price: f64,
    /// Hours per unit at 100% utilisation
    pub schedule_hours: f64,

    pub rows: Vec<EquipmentLine>,

    pub total_hours: f64,
    pub total_hire_cost: f64,
    pub total_fuel_litres: f64,
    pub total_fuel_cost: f64,
    pub mobilisation_cost: f64,
    pub overhead_cost: f64,
    pub grand_total: f64,
}

impl EquipmentResult {
    /// Human-readable line-item breakdown.
    pub fn breakdown(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Schedule: {} days × {:.1} h/day = {:.1} h per unit (100% utilisation).",
            self.days, self.hours_per_day, self.schedule_hours
        );
        let _ = writeln!(out, "Fuel price: ${:.3} per litre.", self.fuel_price);
        out.push('\n');
        out.push_str("Per-equipment details:\n");
        out.push_str("Name | Units | Utilisation | Hours | Fuel (L) | Hire cost (USD) | Fuel cost (USD)\n");
        out.push_str(&"-".repeat(90));
        out.push('\n');
        for line in &self.rows {
            let _ = writeln!(
                out,
                "{} | {} | {:.1}% | {} h | {} L | {} | {}",
                line.name,
                line.count,
                line.utilization_pct,
                grouped(line.hours, 1),
                grouped(line.fuel_litres, 1),
                money(line.hire_cost),
                money(line.fuel_cost)
            );
        }
        out.push('\n');
        let _ = writeln!(out, "Total operating hours (all machines): {} h", grouped(self.total_hours, 1));
        let _ = writeln!(out, "Total hire cost: {}", money(self.total_hire_cost));
        let _ = writeln!(out, "Total fuel consumption: {} L", grouped(self.total_fuel_litres, 1));
        let _ = writeln!(out, "Total fuel cost: {}", money(self.total_fuel_cost));
        let _ = writeln!(out, "Mobilisation + demobilisation: {}", money(self.mobilisation_cost));
        let _ = writeln!(out, "Plant overhead + misc: {}", money(self.overhead_cost));
        let _ = write!(out, "Grand total equipment cost: {}", money(self.grand_total));
        out
    }
}

/// Calculate operating hours, fuel and plant cost.
pub fn calculate(input: &EquipmentInput) -> CalcResult<EquipmentResult> {
    input.validate()?;

    let schedule_hours = input.schedule_hours();
    let mut rows = Vec::new();
    let mut total_hours = 0.0;
    let mut total_hire_cost = 0.0;
    let mut total_fuel_litres = 0.0;
    let mut total_fuel_cost = 0.0;

    for (i, row) in input.rows.iter().enumerate() {
        if row.count == 0 || row.hourly_rate <= 0.0 || row.utilization_pct <= 0.0 || input.hours_per_day == 0.0 {
            continue;
        }

        let hours = row.count as f64 * schedule_hours * (row.utilization_pct / 100.0);
        let hire_cost = hours * row.hourly_rate;
        let fuel_litres = hours * row.fuel_l_per_h;
        let fuel_cost = fuel_litres * input.fuel_price;

        total_hours += hours;
        total_hire_cost += hire_cost;
        total_fuel_litres += fuel_litres;
        total_fuel_cost += fuel_cost;

        rows.push(EquipmentLine {
            name: row.display_name(i),
            count: row.count,
            utilization_pct: row.utilization_pct,
            hours,
            fuel_litres,
            hire_cost,
            fuel_cost,
        });
    }

    let mobilisation_cost = input.mobilisation + input.demobilisation;
    let overhead_cost = input.daily_overhead * input.days as f64 + input.misc_allowance;

    Ok(EquipmentResult {
        days: input.days,
        hours_per_day: input.hours_per_day,
        fuel_price: input.fuel_price,
        schedule_hours,
        rows,
        total_hours,
        total_hire_cost,
        total_fuel_litres,
        total_fuel_cost,
        mobilisation_cost,
        overhead_cost,
        grand_total: total_hire_cost + total_fuel_cost + mobilisation_cost + overhead_cost,
    })
}

impl Takeoff for EquipmentInput {
    type Output = EquipmentResult;

    const COMPONENT: Component = Component::Equipment;

    fn calculate(&self) -> CalcResult<EquipmentResult> {
        calculate(self)
    }

    fn total_cost(output: &EquipmentResult) -> f64 {
        output.grand_total
    }

    fn headline(output: &EquipmentResult) -> Quantity {
        Quantity::new("Equipment operating hours", output.total_hours, "h", 1)
    }

    fn breakdown(output: &EquipmentResult) -> Option<String> {
        Some(output.breakdown())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn one_excavator() -> EquipmentInput {
        let mut input = EquipmentInput::default();
        input.rows[0].count = 1;
        input
    }

    #[test]
    fn test_excavator_scenario() {
        let input = one_excavator();
        assert_eq!(input.schedule_hours(), 240.0);

        let result = calculate(&input).unwrap();
        let line = &result.rows[0];
        assert!((line.hours - 168.0).abs() < EPS);
        assert!((line.hire_cost - 15120.0).abs() < 1e-6);
        assert!((line.fuel_litres - 3024.0).abs() < 1e-6);
        assert!((line.fuel_cost - 1512.0).abs() < 1e-6);
        assert!((result.grand_total - 16632.0).abs() < 1e-6);
    }

    #[test]
    fn test_inactive_rows_skipped() {
        let mut input = one_excavator();
        input.rows[1].count = 2;
        input.rows[1].utilization_pct = 0.0;
        input.rows[2].count = 1;
        input.rows[2].hourly_rate = 0.0;
        let result = calculate(&input).unwrap();
        assert_eq!(result.rows.len(), 1);

        input.hours_per_day = 0.0;
        let result = calculate(&input).unwrap();
        assert!(result.rows.is_empty());
        assert_eq!(result.grand_total, 0.0);
    }

    #[test]
    fn test_overheads() {
        let mut input = EquipmentInput::default();
        input.mobilisation = 1000.0;
        input.demobilisation = 800.0;
        input.daily_overhead = 50.0;
        input.misc_allowance = 200.0;
        let result = calculate(&input).unwrap();
        assert_eq!(result.mobilisation_cost, 1800.0);
        assert_eq!(result.overhead_cost, 1700.0);
        assert_eq!(result.grand_total, 3500.0);
    }

    #[test]
    fn test_validation() {
        let mut input = one_excavator();
        input.days = 0;
        assert!(calculate(&input).is_err());

        let mut input = one_excavator();
        input.hours_per_day = -1.0;
        assert!(calculate(&input).is_err());

        let mut input = one_excavator();
        input.fuel_price = -0.1;
        assert!(calculate(&input).is_err());

        let mut input = one_excavator();
        input.rows[0].utilization_pct = 120.0;
        assert!(calculate(&input).is_err());
    }

    #[test]
    fn test_add_and_remove_rows() {
        let mut input = EquipmentInput::default();
        let idx = input.add_row();
        assert_eq!(idx, 8);
        input.rows[idx].count = 1;
        input.rows[idx].hourly_rate = 40.0;
        let result = calculate(&input).unwrap();
        assert_eq!(result.rows[0].name, "Item 9");

        let removed = input.remove_row(0).unwrap();
        assert_eq!(removed.name, "20t Excavator");
        assert_eq!(input.rows.len(), 8);
        assert!(input.remove_row(99).is_err());
    }

    #[test]
    fn test_breakdown_text() {
        let text = calculate(&one_excavator()).unwrap().breakdown();
        assert!(text.starts_with("Schedule: 30 days × 8.0 h/day = 240.0 h per unit (100% utilisation)."));
        assert!(text.contains("Fuel price: $0.500 per litre."));
        assert!(text.contains("20t Excavator | 1 | 70.0% | 168.0 h | 3,024.0 L | $15,120.00 | $1,512.00"));
        assert!(text.ends_with("Grand total equipment cost: $16,632.00"));
    }

    #[test]
    fn test_rows_merge_with_defaults() {
        let json = r#"{
            "rows": [
                {"name": "Big Digger", "count": 2, "hire_rate_day": 95.0},
                {"count": 1},
                {},
                {}, {}, {}, {}, {},
                {"name": "Compressor", "count": 1, "hire_rate_day": 20.0, "fuel_lph": 4.0, "util_pct": 50.0}
            ],
            "fuel_price": 0.8
        }"#;
        let input: EquipmentInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.rows.len(), 9);
        assert_eq!(input.rows[0].name, "Big Digger");
        assert_eq!(input.rows[0].fuel_l_per_h, 18.0);
        assert_eq!(input.rows[1].name, "Wheel Loader");
        assert_eq!(input.rows[1].count, 1);
        assert_eq!(input.rows[8].utilization_pct, 50.0);
        assert_eq!(input.days, 30);
        assert_eq!(input.fuel_price, 0.8);
    }

    #[test]
    fn test_session_keys() {
        let json = serde_json::to_value(EquipmentInput::default()).unwrap();
        assert_eq!(json["rows"][0]["hire_rate_day"], 90.0);
        assert_eq!(json["rows"][0]["util_pct"], 70.0);
        assert!(json.get("daily_plant_overhead").is_some());
        assert!(json.get("misc_plant_allow").is_some());
    }
}
