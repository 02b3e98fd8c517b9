//! # Workbook
//!
//! The in-memory session: one [`Calculator`] per cost component.
//!
//! ```text
//! Workbook
//! ├── masonry     Calculator<MasonryInput>     "breeze_block"
//! ├── fill        Calculator<FillInput>        "sweet_sand"
//! ├── concrete    Calculator<ConcreteInput>    "concrete"
//! ├── earthworks  Calculator<EarthworksInput>  "land_prep"
//! ├── labor       Calculator<LaborInput>       "manpower"
//! └── equipment   Calculator<EquipmentInput>   "equipment"
//! ```
//!
//! Each calculator's input is exported and restored independently as one
//! section of the session `data` object.
//!
//! ## Example
//!
//! ```rust
//! use takeoff_core::calculations::Component;
//! use takeoff_core::workbook::Workbook;
//!
//! let mut workbook = Workbook::new();
//! workbook.masonry.input_mut().wall_length = 10.0;
//! workbook.masonry.input_mut().wall_height = 3.0;
//! workbook.recalculate(Component::Masonry).unwrap();
//!
//! assert_eq!(workbook.masonry.output().unwrap().blocks_required, 375);
//! ```

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::calculations::{
    Calculator, Component, ConcreteInput, CostSource, EarthworksInput, ElementKind, EquipmentInput, FillInput,
    LaborInput, MasonryInput, RecalcMode, Takeoff,
};
use crate::errors::{CalcError, CalcResult};
use crate::materials::RebarLevel;

/// The six calculators of one session.
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    pub masonry: Calculator<MasonryInput>,
    pub fill: Calculator<FillInput>,
    pub concrete: Calculator<ConcreteInput>,
    pub earthworks: Calculator<EarthworksInput>,
    pub labor: Calculator<LaborInput>,
    pub equipment: Calculator<EquipmentInput>,
}

impl Workbook {
    /// A workbook with every calculator at its defaults.
    pub fn new() -> Self {
        Workbook::default()
    }

    /// Build a workbook from a session `data` object.
    ///
    /// Missing sections and fields take their defaults. A section that cannot
    /// be read at all falls back to defaults with a warning. Outputs are
    /// recomputed silently before returning.
    pub fn from_data(data: &Map<String, Value>) -> Self {
        let mut workbook = Workbook {
            masonry: restore(data),
            fill: restore(data),
            concrete: restore(data),
            earthworks: restore(data),
            labor: restore(data),
            equipment: restore(data),
        };
        workbook.recalculate_all();
        workbook
    }

    /// Export every calculator's input as a session `data` object.
    pub fn export_data(&self) -> CalcResult<Map<String, Value>> {
        let mut data = Map::new();
        export(&mut data, &self.masonry)?;
        export(&mut data, &self.fill)?;
        export(&mut data, &self.concrete)?;
        export(&mut data, &self.earthworks)?;
        export(&mut data, &self.labor)?;
        export(&mut data, &self.equipment)?;
        Ok(data)
    }

    /// Restore every calculator to defaults and clear all outputs.
    pub fn reset_all(&mut self) {
        for component in Component::ALL {
            self.reset(component);
        }
        info!("reset all calculators");
    }

    /// Restore one calculator to defaults.
    pub fn reset(&mut self, component: Component) {
        match component {
            Component::Masonry => self.masonry.reset(),
            Component::FillMaterial => self.fill.reset(),
            Component::Concrete => self.concrete.reset(),
            Component::Earthworks => self.earthworks.reset(),
            Component::Labor => self.labor.reset(),
            Component::Equipment => self.equipment.reset(),
        }
    }

    /// Recompute one calculator, returning its validation error if any.
    pub fn recalculate(&mut self, component: Component) -> CalcResult<()> {
        let mode = RecalcMode::Interactive;
        match component {
            Component::Masonry => self.masonry.recalculate(mode).map(|_| ()),
            Component::FillMaterial => self.fill.recalculate(mode).map(|_| ()),
            Component::Concrete => self.concrete.recalculate(mode).map(|_| ()),
            Component::Earthworks => self.earthworks.recalculate(mode).map(|_| ()),
            Component::Labor => self.labor.recalculate(mode).map(|_| ()),
            Component::Equipment => self.equipment.recalculate(mode).map(|_| ()),
        }
    }

    /// Recompute every calculator silently.
    pub fn recalculate_all(&mut self) {
        for source in self.sources_mut() {
            source.force_recompute();
        }
    }

    /// All calculators as cost sources, in summary order.
    pub fn sources_mut(&mut self) -> [&mut dyn CostSource; 6] {
        [
            &mut self.masonry,
            &mut self.fill,
            &mut self.concrete,
            &mut self.earthworks,
            &mut self.labor,
            &mut self.equipment,
        ]
    }

    pub fn source(&self, component: Component) -> &dyn CostSource {
        match component {
            Component::Masonry => &self.masonry,
            Component::FillMaterial => &self.fill,
            Component::Concrete => &self.concrete,
            Component::Earthworks => &self.earthworks,
            Component::Labor => &self.labor,
            Component::Equipment => &self.equipment,
        }
    }

    /// Current input of one calculator as JSON.
    pub fn section(&self, component: Component) -> CalcResult<Value> {
        let value = match component {
            Component::Masonry => serde_json::to_value(self.masonry.input())?,
            Component::FillMaterial => serde_json::to_value(self.fill.input())?,
            Component::Concrete => serde_json::to_value(self.concrete.input())?,
            Component::Earthworks => serde_json::to_value(self.earthworks.input())?,
            Component::Labor => serde_json::to_value(self.labor.input())?,
            Component::Equipment => serde_json::to_value(self.equipment.input())?,
        };
        Ok(value)
    }

    /// Set one input field by dotted path (e.g. `workforce.0.workers`).
    ///
    /// Selections go through their default-applying operations: a new
    /// `block_name` brings its catalog price, `element_type_index` accepts an
    /// element name, and `rebar_level` applies a preset intensity.
    /// Outputs are not recomputed.
    pub fn edit(&mut self, component: Component, path: &str, value: Value) -> CalcResult<()> {
        match (component, path) {
            (Component::Masonry, "block_name") => {
                let name = value
                    .as_str()
                    .ok_or_else(|| CalcError::invalid_input(path, value.to_string(), "Expected a block name"))?;
                self.masonry.input_mut().select_block(name)?;
            }
            (Component::Concrete, "element_type_index") | (Component::Concrete, "element") => {
                let kind = match &value {
                    Value::String(s) => ElementKind::from_str_flexible(s),
                    Value::Number(n) => n.as_u64().and_then(|i| u8::try_from(i).ok()).and_then(ElementKind::from_index),
                    _ => None,
                }
                .ok_or_else(|| CalcError::invalid_input(path, value.to_string(), "Unknown element type"))?;
                self.concrete.input_mut().select_element(kind);
            }
            (Component::Concrete, "rebar_level") => {
                let level = value
                    .as_str()
                    .and_then(RebarLevel::from_str_flexible)
                    .ok_or_else(|| {
                        CalcError::invalid_input(path, value.to_string(), "Expected custom, light, medium or heavy")
                    })?;
                self.concrete.input_mut().apply_rebar_level(level);
            }
            (Component::Masonry, _) => patch(&mut self.masonry, path, value)?,
            (Component::FillMaterial, _) => patch(&mut self.fill, path, value)?,
            (Component::Concrete, _) => patch(&mut self.concrete, path, value)?,
            (Component::Earthworks, _) => patch(&mut self.earthworks, path, value)?,
            (Component::Labor, _) => patch(&mut self.labor, path, value)?,
            (Component::Equipment, _) => patch(&mut self.equipment, path, value)?,
        }
        debug!(section = component.section_key(), field = path, "input edited");
        Ok(())
    }
}

fn restore<T: Takeoff>(data: &Map<String, Value>) -> Calculator<T> {
    let key = T::COMPONENT.section_key();
    let mut input = match data.get(key) {
        None => {
            debug!(section = key, "section missing; using defaults");
            T::default()
        }
        Some(value) if !value.is_object() => {
            warn!(section = key, "section is not an object; using defaults");
            T::default()
        }
        Some(value) => match serde_json::from_value::<T>(value.clone()) {
            Ok(input) => input,
            Err(e) => {
                warn!(section = key, error = %e, "unreadable fields; restoring field by field");
                restore_fields(key, value)
            }
        },
    };
    input.normalize();
    Calculator::new(input)
}

/// Keep every stored field that reads cleanly; the rest take their defaults.
fn restore_fields<T: Takeoff>(key: &str, value: &Value) -> T {
    let Some(stored) = value.as_object() else {
        return T::default();
    };
    let mut kept = Map::new();
    for (field, item) in stored {
        kept.insert(field.clone(), item.clone());
        if let Err(e) = serde_json::from_value::<T>(Value::Object(kept.clone())) {
            warn!(section = key, field = %field, error = %e, "unreadable field; using its default");
            kept.remove(field);
        }
    }
    serde_json::from_value(Value::Object(kept)).unwrap_or_default()
}

fn export<T: Takeoff>(data: &mut Map<String, Value>, calc: &Calculator<T>) -> CalcResult<()> {
    data.insert(T::COMPONENT.section_key().to_string(), serde_json::to_value(calc.input())?);
    Ok(())
}

/// Replace one field of an input through its JSON form.
fn patch<T: Takeoff>(calc: &mut Calculator<T>, path: &str, value: Value) -> CalcResult<()> {
    let mut doc = serde_json::to_value(calc.input())?;
    let slot = locate(&mut doc, path)?;
    let shown = value.to_string();
    *slot = value;
    let input: T = serde_json::from_value(doc).map_err(|e| CalcError::invalid_input(path, shown, e.to_string()))?;
    *calc.input_mut() = input;
    Ok(())
}

fn locate<'a>(doc: &'a mut Value, path: &str) -> CalcResult<&'a mut Value> {
    let unknown = || CalcError::invalid_input(path, "", "Unknown field");
    let mut current = doc;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get_mut(segment).ok_or_else(unknown)?,
            Value::Array(items) => {
                let index: usize = segment.parse().map_err(|_| unknown())?;
                items.get_mut(index).ok_or_else(unknown)?
            }
            _ => return Err(unknown()),
        };
    }
    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_export_has_six_sections() {
        let data = Workbook::new().export_data().unwrap();
        for component in Component::ALL {
            assert!(data.contains_key(component.section_key()));
        }
        assert_eq!(data.len(), 6);
    }

    #[test]
    fn test_from_data_roundtrip() {
        let mut workbook = Workbook::new();
        workbook.fill.input_mut().length_total_m = 30.0;
        workbook.fill.input_mut().width_m = 10.0;
        workbook.fill.input_mut().fill_height_cm = 50.0;
        workbook.labor.input_mut().days = 45;
        let data = workbook.export_data().unwrap();

        let restored = Workbook::from_data(&data);
        assert_eq!(restored.fill.input(), workbook.fill.input());
        assert_eq!(restored.labor.input().days, 45);
        // recomputed on load
        assert!(restored.fill.output().unwrap().total_volume_m3 > 0.0);
    }

    #[test]
    fn test_bad_section_falls_back_to_defaults() {
        let data = json!({
            "manpower": {"days": "many"},
            "land_prep": [1, 2, 3],
            "sweet_sand": {"width": 4.0, "unknown_key": true}
        });
        let workbook = Workbook::from_data(data.as_object().unwrap());
        assert_eq!(workbook.labor.input().days, 30);
        assert_eq!(workbook.earthworks.input(), &EarthworksInput::default());
        assert_eq!(workbook.fill.input().width_m, 4.0);
    }

    #[test]
    fn test_bad_field_keeps_the_rest_of_its_section() {
        let data = json!({
            "manpower": {
                "workforce": [{"workers": 10, "rate": 5.0}],
                "days": 30.0,
                "hours_normal": 9.0,
                "hours_ot": "lots"
            },
            "land_prep": {"site_area": 120.0, "trench_count": "2"}
        });
        let workbook = Workbook::from_data(data.as_object().unwrap());
        let labour = workbook.labor.input();
        assert_eq!(labour.workforce()[0].workers, 10);
        assert_eq!(labour.days, 30);
        assert_eq!(labour.hours_normal, 9.0);
        assert_eq!(labour.hours_ot, LaborInput::default().hours_ot);
        assert_eq!(workbook.earthworks.input().site_area, 120.0);
        assert_eq!(workbook.earthworks.input().trench_count, 2);
    }

    #[test]
    fn test_load_recompute_is_silent() {
        // Half-filled fill basin: invalid, but loading must not fail
        let data = json!({"sweet_sand": {"length_total": 5.0, "width": 6.0, "fill_height": 30.0}});
        let workbook = Workbook::from_data(data.as_object().unwrap());
        assert!(workbook.fill.output().is_none());
        assert!(workbook.fill.last_error().is_some());
    }

    #[test]
    fn test_edit_by_path() {
        let mut workbook = Workbook::new();
        workbook.edit(Component::Labor, "workforce.0.workers", json!(10)).unwrap();
        workbook.edit(Component::Labor, "days", json!(30)).unwrap();
        workbook.recalculate(Component::Labor).unwrap();
        assert_eq!(workbook.labor.output().unwrap().total_man_hours, 2400.0);

        workbook.edit(Component::Equipment, "rows.0.count", json!(1)).unwrap();
        assert_eq!(workbook.equipment.input().rows[0].count, 1);
    }

    #[test]
    fn test_edit_rejects_unknown_or_mistyped() {
        let mut workbook = Workbook::new();
        assert!(workbook.edit(Component::FillMaterial, "nope", json!(1)).is_err());
        assert!(workbook.edit(Component::Labor, "days", json!("many")).is_err());
        assert!(workbook.edit(Component::Labor, "workforce.20.workers", json!(1)).is_err());
        assert_eq!(workbook.labor.input().days, 30);
    }

    #[test]
    fn test_edit_selections_apply_defaults() {
        let mut workbook = Workbook::new();
        workbook
            .edit(Component::Masonry, "block_name", json!("AAC 60 x 25 x 20 cm"))
            .unwrap();
        assert_eq!(workbook.masonry.input().cost_per_block, 1.90);

        workbook.edit(Component::Concrete, "element_type_index", json!("wall")).unwrap();
        assert_eq!(workbook.concrete.input().element, ElementKind::Wall);
        workbook.edit(Component::Concrete, "element_type_index", json!(3)).unwrap();
        assert_eq!(workbook.concrete.input().element, ElementKind::IsolatedFooting);

        workbook.edit(Component::Concrete, "rebar_level", json!("light")).unwrap();
        assert_eq!(workbook.concrete.input().rebar_kg_per_m3, 60.0);
    }

    #[test]
    fn test_reset_all() {
        let mut workbook = Workbook::new();
        workbook.earthworks.input_mut().site_area = 100.0;
        workbook.recalculate_all();
        workbook.reset_all();
        assert_eq!(workbook.earthworks.input().site_area, 0.0);
        assert!(workbook.earthworks.output().is_none());
    }
}
