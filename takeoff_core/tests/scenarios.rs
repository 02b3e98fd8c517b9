//! End-to-end scenarios through the workbook and aggregator.

use takeoff_core::calculations::{concrete, equipment, fill, labor, masonry};
use takeoff_core::calculations::{ConcreteInput, ElementKind, EquipmentInput, FillInput, LaborInput, MasonryInput};
use takeoff_core::{Aggregator, CalcError, Component, LineStatus, RecalcMode, Workbook};

const EPS: f64 = 1e-9;

#[test]
fn test_single_wall_blockwork() {
    let input = MasonryInput {
        wall_length: 10.0,
        wall_height: 3.0,
        ..Default::default()
    };
    let result = masonry::calculate(&input).unwrap();

    assert!((result.total_area_m2 - 30.0).abs() < EPS);
    assert_eq!(result.blocks_required, 375);
    assert_eq!(result.pallets_required, 4);
    assert_eq!(result.leftover_blocks, 57);
    assert!((result.total_cost - 206.25).abs() < EPS);
}

#[test]
fn test_slab_volume_and_formwork() {
    let mut input = ConcreteInput::default();
    input.select_element(ElementKind::Slab);
    input.slab_length = 5.0;
    input.slab_width = 4.0;
    input.slab_thickness_cm = 20.0;
    input.slab_count = 1;

    let result = concrete::calculate(&input).unwrap();
    assert!((result.volume_m3 - 4.0).abs() < EPS);
    assert!((result.formwork_area_m2 - 3.6).abs() < EPS);
}

#[test]
fn test_fill_basin_shorter_than_wide() {
    let input = FillInput {
        length_total_m: 5.0,
        width_m: 6.0,
        fill_height_cm: 30.0,
        ..Default::default()
    };
    assert!(matches!(
        fill::calculate(&input).unwrap_err(),
        CalcError::GeometryError { .. }
    ));
}

#[test]
fn test_labour_crew() {
    let mut input = LaborInput::default();
    input.trade_mut(0).unwrap().workers = 10;
    let result = labor::calculate(&input).unwrap();

    assert!((result.total_man_hours - 2400.0).abs() < EPS);
    assert!((result.grand_total - 12000.0).abs() < EPS);
}

#[test]
fn test_single_excavator() {
    let mut input = EquipmentInput::default();
    input.rows[0].count = 1;
    let result = equipment::calculate(&input).unwrap();

    assert!((result.schedule_hours - 240.0).abs() < EPS);
    assert!((result.total_hours - 168.0).abs() < EPS);
    assert!((result.total_hire_cost - 15120.0).abs() < EPS);
    assert!((result.total_fuel_litres - 3024.0).abs() < EPS);
    assert!((result.total_fuel_cost - 1512.0).abs() < EPS);
}

#[test]
fn test_project_summary_with_one_failure() {
    let mut workbook = Workbook::new();
    workbook.masonry.input_mut().wall_length = 10.0;
    workbook.masonry.input_mut().wall_height = 3.0;
    workbook.labor.input_mut().trade_mut(0).unwrap().workers = 10;
    workbook.fill.input_mut().length_total_m = 5.0;
    workbook.fill.input_mut().width_m = 6.0;

    let mut aggregator = Aggregator::new();
    let summary = aggregator.refresh(&mut workbook);

    assert!((summary.grand_total - 12206.25).abs() < EPS);
    assert_eq!(summary.line(Component::FillMaterial).unwrap().status, LineStatus::Failed);
    assert_eq!(summary.line(Component::Labor).unwrap().status, LineStatus::Calculated);
    assert_eq!(summary.quantity(Component::Labor).unwrap().text, "2,400.0 h");
}

#[test]
fn test_interactive_error_keeps_previous_output() {
    let mut workbook = Workbook::new();
    workbook.fill.input_mut().length_total_m = 12.0;
    workbook.fill.input_mut().width_m = 4.0;
    workbook.fill.input_mut().fill_height_cm = 30.0;
    workbook.recalculate(Component::FillMaterial).unwrap();
    let before = workbook.fill.output().cloned().unwrap();

    workbook.fill.input_mut().width_m = 20.0;
    let err = workbook.fill.recalculate(RecalcMode::Interactive).unwrap_err();
    assert!(err.is_input_error());
    assert_eq!(workbook.fill.output(), Some(&before));
}
