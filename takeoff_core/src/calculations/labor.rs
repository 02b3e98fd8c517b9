//! # Labor Cost Calculation
//!
//! Man-hours and cost for a fixed roster of eleven trades working a common
//! schedule, plus mobilisation, demobilisation and site overheads.
//!
//! A trade with no workers or no rate is inactive: it is left out of the
//! totals and the breakdown, and is not an error.
//!
//! ## Example
//!
//! ```rust
//! use takeoff_core::calculations::labor::{calculate, LaborInput};
//!
//! let mut input = LaborInput::default();
//! let labourers = input.trade_mut(0).unwrap();
//! labourers.workers = 10;
//! labourers.rate = 5.0;
//!
//! let result = calculate(&input).unwrap();
//! assert_eq!(result.total_man_hours, 2400.0);
//! assert_eq!(result.total_labor_cost, 12000.0);
//! ```

use std::fmt::Write as _;

use serde::{Deserialize, Deserializer, Serialize};

use super::{deserialize_count, deserialize_opt_count, Component, Quantity, Takeoff};
use crate::errors::{CalcError, CalcResult};
use crate::format::{grouped, money};

/// The roster, in display order.
pub const TRADES: [&str; 11] = [
    "General Labourer",
    "Carpenter / Formwork",
    "Steel Fixer",
    "Concrete Crew / Finisher",
    "Mason / Block Layer",
    "Electrician",
    "Plumber / Pipefitter",
    "Equipment Operator",
    "Foreman / Supervisor",
    "Site Engineer / Manager",
    "Safety Officer / HSE",
];

/// Default hourly rates, aligned with [`TRADES`].
const DEFAULT_RATES: [f64; 11] = [5.0, 7.0, 7.5, 6.5, 6.5, 8.0, 7.5, 8.0, 10.0, 12.0, 9.0];

/// One trade on the roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeSlot {
    trade: String,
    /// Headcount
    #[serde(deserialize_with = "deserialize_count")]
    pub workers: u32,
    /// Hourly rate
    pub rate: f64,
}

impl TradeSlot {
    pub fn trade(&self) -> &str {
        &self.trade
    }

    pub fn is_active(&self) -> bool {
        self.workers > 0 && self.rate > 0.0
    }
}

fn default_workforce() -> Vec<TradeSlot> {
    TRADES
        .iter()
        .zip(DEFAULT_RATES)
        .map(|(trade, rate)| TradeSlot {
            trade: (*trade).to_string(),
            workers: 0,
            rate,
        })
        .collect()
}

#[derive(Deserialize)]
struct StoredSlot {
    #[serde(default, deserialize_with = "deserialize_opt_count")]
    workers: Option<u32>,
    #[serde(default)]
    rate: Option<f64>,
}

/// Stored rows are applied to the roster by position; extra rows are
/// ignored and trade names always come from the roster.
fn merge_workforce<'de, D>(deserializer: D) -> Result<Vec<TradeSlot>, D::Error>
where
    D: Deserializer<'de>,
{
    let stored = Vec::<StoredSlot>::deserialize(deserializer)?;
    let mut roster = default_workforce();
    for (slot, row) in roster.iter_mut().zip(stored) {
        slot.workers = row.workers.unwrap_or(0);
        if let Some(rate) = row.rate {
            slot.rate = rate;
        }
    }
    Ok(roster)
}

/// Input parameters for manpower.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaborInput {
    #[serde(deserialize_with = "merge_workforce")]
    workforce: Vec<TradeSlot>,

    /// Working days
    #[serde(deserialize_with = "deserialize_count")]
    pub days: u32,
    /// Normal hours per day
    pub hours_normal: f64,
    /// Overtime hours per day
    pub hours_ot: f64,
    /// Overtime pay multiplier (>= 1.0)
    pub ot_factor: f64,

    pub mobilisation: f64,
    pub demobilisation: f64,
    /// Site overhead per working day
    pub daily_overhead: f64,
    pub misc_allowance: f64,
}

impl Default for LaborInput {
    fn default() -> Self {
        LaborInput {
            workforce: default_workforce(),
            days: 30,
            hours_normal: 8.0,
            hours_ot: 0.0,
            ot_factor: 1.5,
            mobilisation: 0.0,
            demobilisation: 0.0,
            daily_overhead: 0.0,
            misc_allowance: 0.0,
        }
    }
}

impl LaborInput {
    pub fn workforce(&self) -> &[TradeSlot] {
        &self.workforce
    }

    pub fn trade_mut(&mut self, index: usize) -> Option<&mut TradeSlot> {
        self.workforce.get_mut(index)
    }

    /// Find a trade by name (case-insensitive).
    pub fn trade_by_name_mut(&mut self, name: &str) -> CalcResult<&mut TradeSlot> {
        let wanted = name.trim().to_lowercase();
        self.workforce
            .iter_mut()
            .find(|slot| slot.trade.to_lowercase() == wanted)
            .ok_or_else(|| CalcError::catalog_entry_not_found(name))
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
        if self.hours_normal < 0.0 || self.hours_ot < 0.0 {
            return Err(CalcError::invalid_input(
                "hours_normal/hours_ot",
                format!("{} / {}", self.hours_normal, self.hours_ot),
                "Working hours cannot be negative",
            ));
        }
        if self.ot_factor < 1.0 {
            return Err(CalcError::invalid_input(
                "ot_factor",
                self.ot_factor.to_string(),
                "Overtime factor should be at least 1.0",
            ));
        }
        Ok(())
    }
}

/// Cost line for one active trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeLine {
    pub trade: String,
    pub workers: u32,
    pub man_hours: f64,
    pub cost: f64,
}

/// Manpower results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaborResult {
    pub days: u32,
    pub hours_normal: f64,
    pub hours_ot: f64,
    pub ot_factor: f64,

    /// Active trades only, in roster order
    pub trades: Vec<TradeLine>,

    pub total_man_hours: f64,
    pub total_labor_cost: f64,
    /// Mobilisation plus demobilisation
    pub mobilisation_cost: f64,
    /// Daily overhead × days plus misc allowance
    pub overhead_cost: f64,
    pub grand_total: f64,
}

impl LaborResult {
    /// Human-readable line-item breakdown.
    pub fn breakdown(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Schedule: {} days, {:.1} h/day normal, {:.1} h/day overtime at x{:.2}.",
            self.days, self.hours_normal, self.hours_ot, self.ot_factor
        );
        out.push('\n');
        out.push_str("Per-trade details:\n");
        out.push_str("Trade | Workers | Man-hours | Labour cost (USD)\n");
        out.push_str(&"-".repeat(60));
        out.push('\n');
        for line in &self.trades {
            let _ = writeln!(
                out,
                "{} | {} | {} h | {}",
                line.trade,
                line.workers,
                grouped(line.man_hours, 1),
                money(line.cost)
            );
        }
        out.push('\n');
        let _ = writeln!(out, "Total labour cost: {}", money(self.total_labor_cost));
        let _ = writeln!(out, "Mobilisation + demobilisation: {}", money(self.mobilisation_cost));
        let _ = writeln!(out, "Overhead + misc: {}", money(self.overhead_cost));
        let _ = write!(out, "Grand total manpower-related cost: {}", money(self.grand_total));
        out
    }
}

/// Calculate man-hours and labour cost.
pub fn calculate(input: &LaborInput) -> CalcResult<LaborResult> {
    input.validate()?;

    let days = input.days as f64;
    let mut trades = Vec::new();
    let mut total_man_hours = 0.0;
    let mut total_labor_cost = 0.0;

    for slot in input.workforce.iter().filter(|s| s.is_active()) {
        let crew_days = slot.workers as f64 * days;
        let man_hours = crew_days * (input.hours_normal + input.hours_ot);
        let cost = crew_days * input.hours_normal * slot.rate
            + crew_days * input.hours_ot * slot.rate * input.ot_factor;

        total_man_hours += man_hours;
        total_labor_cost += cost;
        trades.push(TradeLine {
            trade: slot.trade.clone(),
            workers: slot.workers,
            man_hours,
            cost,
        });
    }

    let mobilisation_cost = input.mobilisation + input.demobilisation;
    let overhead_cost = input.daily_overhead * days + input.misc_allowance;

    Ok(LaborResult {
        days: input.days,
        hours_normal: input.hours_normal,
        hours_ot: input.hours_ot,
        ot_factor: input.ot_factor,
        trades,
        total_man_hours,
        total_labor_cost,
        mobilisation_cost,
        overhead_cost,
        grand_total: total_labor_cost + mobilisation_cost + overhead_cost,
    })
}

impl Takeoff for LaborInput {
    type Output = LaborResult;

    const COMPONENT: Component = Component::Labor;

    fn calculate(&self) -> CalcResult<LaborResult> {
        calculate(self)
    }

    fn total_cost(output: &LaborResult) -> f64 {
        output.grand_total
    }

    fn headline(output: &LaborResult) -> Quantity {
        Quantity::new("Man-hours", output.total_man_hours, "h", 1)
    }

    fn breakdown(output: &LaborResult) -> Option<String> {
        Some(output.breakdown())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_labourers(workers: u32, rate: f64) -> LaborInput {
        let mut input = LaborInput::default();
        let slot = input.trade_mut(0).unwrap();
        slot.workers = workers;
        slot.rate = rate;
        input
    }

    #[test]
    fn test_single_trade_scenario() {
        let result = calculate(&with_labourers(10, 5.0)).unwrap();
        assert_eq!(result.total_man_hours, 2400.0);
        assert_eq!(result.total_labor_cost, 12000.0);
        assert_eq!(result.grand_total, 12000.0);
        assert_eq!(result.trades.len(), 1);
    }

    #[test]
    fn test_overtime_premium() {
        let mut input = with_labourers(2, 10.0);
        input.days = 10;
        input.hours_ot = 2.0;
        input.ot_factor = 1.5;
        let result = calculate(&input).unwrap();
        // 2 × 10 × (8 + 2) = 200 h; 2×10×8×10 + 2×10×2×10×1.5 = 1600 + 600
        assert_eq!(result.total_man_hours, 200.0);
        assert!((result.total_labor_cost - 2200.0).abs() < 1e-9);
    }

    #[test]
    fn test_overheads_and_mobilisation() {
        let mut input = with_labourers(1, 5.0);
        input.mobilisation = 500.0;
        input.demobilisation = 250.0;
        input.daily_overhead = 20.0;
        input.misc_allowance = 100.0;
        let result = calculate(&input).unwrap();
        assert_eq!(result.mobilisation_cost, 750.0);
        assert_eq!(result.overhead_cost, 700.0);
        assert!((result.grand_total - (1200.0 + 750.0 + 700.0)).abs() < 1e-9);
    }

    #[test]
    fn test_inactive_trades_skipped() {
        let mut input = with_labourers(10, 5.0);
        input.trade_mut(1).unwrap().workers = 3;
        input.trade_mut(1).unwrap().rate = 0.0;
        let result = calculate(&input).unwrap();
        assert_eq!(result.trades.len(), 1);
        assert_eq!(result.total_man_hours, 2400.0);
    }

    #[test]
    fn test_validation() {
        let mut input = with_labourers(1, 5.0);
        input.days = 0;
        assert!(calculate(&input).is_err());

        let mut input = with_labourers(1, 5.0);
        input.hours_ot = -1.0;
        assert!(calculate(&input).is_err());

        let mut input = with_labourers(1, 5.0);
        input.ot_factor = 0.9;
        assert!(calculate(&input).is_err());
    }

    #[test]
    fn test_breakdown_text() {
        let text = calculate(&with_labourers(10, 5.0)).unwrap().breakdown();
        assert!(text.starts_with("Schedule: 30 days, 8.0 h/day normal, 0.0 h/day overtime at x1.50."));
        assert!(text.contains("General Labourer | 10 | 2,400.0 h | $12,000.00"));
        assert!(text.contains(&"-".repeat(60)));
        assert!(text.ends_with("Grand total manpower-related cost: $12,000.00"));
    }

    #[test]
    fn test_trade_lookup_by_name() {
        let mut input = LaborInput::default();
        input.trade_by_name_mut("steel fixer").unwrap().workers = 4;
        assert_eq!(input.workforce()[2].workers, 4);
        assert!(input.trade_by_name_mut("Roofer").is_err());
    }

    #[test]
    fn test_workforce_merges_by_position() {
        let json = r#"{
            "workforce": [
                {"trade": "Renamed", "workers": 3, "rate": 6.0},
                {"workers": 1}
            ],
            "days": 20
        }"#;
        let input: LaborInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.workforce().len(), 11);
        assert_eq!(input.workforce()[0].trade(), "General Labourer");
        assert_eq!(input.workforce()[0].workers, 3);
        assert_eq!(input.workforce()[0].rate, 6.0);
        assert_eq!(input.workforce()[1].rate, 7.0);
        assert_eq!(input.workforce()[10].rate, 9.0);
        assert_eq!(input.days, 20);
        assert_eq!(input.ot_factor, 1.5);
    }

    #[test]
    fn test_session_shape() {
        let json = serde_json::to_value(LaborInput::default()).unwrap();
        assert_eq!(json["workforce"].as_array().unwrap().len(), 11);
        assert_eq!(json["workforce"][0]["trade"], "General Labourer");
        assert_eq!(json["hours_normal"], 8.0);
    }
}
