//! Physical bound filter tests

use super::fixtures::{self, input_a};
use crate::error::SanitizeError;
use crate::models::{ArrayMetadata, Channel};
use crate::sanitizer::bounds::{filter_current, filter_irradiance, filter_voltage};
use crate::series::TimeSeries;

fn single_column(channel: Channel, values: Vec<Option<f64>>) -> TimeSeries {
    let axis = fixtures::day_axis()[..values.len()].to_vec();
    let mut series = TimeSeries::new(axis).unwrap();
    series.insert_column(input_a().key(channel), values).unwrap();
    series
}

#[test]
fn test_current_ceiling_is_inclusive() {
    // 1.2 × 9 A × 2 strings
    let ceiling = 1.2 * 9.0 * 2.0;
    let mut series = single_column(
        Channel::Current,
        vec![Some(ceiling), Some(ceiling + 0.001), Some(-0.5), Some(0.0), Some(5.0), None],
    );
    let nulled = filter_current(&mut series, &fixtures::array(), 1.2).unwrap();
    assert_eq!(nulled, 3);
    assert_eq!(
        series.column(&input_a().key(Channel::Current)).unwrap(),
        &[Some(ceiling), None, None, None, Some(5.0), None]
    );
}

#[test]
fn test_voltage_ceiling() {
    // 45 V × 20 modules
    let mut series = single_column(
        Channel::Voltage,
        vec![Some(900.0), Some(900.01), Some(-1.0), Some(600.0)],
    );
    assert_eq!(filter_voltage(&mut series, &fixtures::array()).unwrap(), 2);
    assert_eq!(
        series.column(&input_a().key(Channel::Voltage)).unwrap(),
        &[Some(900.0), None, None, Some(600.0)]
    );
}

#[test]
fn test_irradiance_bounds_are_exclusive() {
    let mut series = single_column(
        Channel::Irradiance,
        vec![Some(0.0), Some(0.1), Some(1199.9), Some(1200.0), Some(-3.0)],
    );
    assert_eq!(filter_irradiance(&mut series, 0.0, 1200.0), 3);
    assert_eq!(series.null_count(), 3);
}

#[test]
fn test_filters_are_idempotent() {
    let mut dataset = fixtures::clean_day();
    let array = fixtures::array();
    // Inject out-of-range readings
    let current = dataset
        .telemetry
        .column_mut(&input_a().key(Channel::Current))
        .unwrap();
    current[150] = Some(50.0);
    current[151] = Some(-2.0);

    let mut once = dataset.telemetry.clone();
    filter_current(&mut once, &array, 1.2).unwrap();
    filter_voltage(&mut once, &array).unwrap();

    let mut twice = once.clone();
    assert_eq!(filter_current(&mut twice, &array, 1.2).unwrap(), 0);
    assert_eq!(filter_voltage(&mut twice, &array).unwrap(), 0);
    assert_eq!(once, twice);
}

#[test]
fn test_filters_leave_other_channels_alone() {
    let mut dataset = fixtures::clean_day();
    let before = dataset.telemetry.column(&input_a().key(Channel::Power)).unwrap().to_vec();
    filter_current(&mut dataset.telemetry, &fixtures::array(), 1.2).unwrap();
    assert_eq!(
        dataset.telemetry.column(&input_a().key(Channel::Power)).unwrap(),
        before.as_slice()
    );
    assert_eq!(dataset.telemetry.len(), fixtures::ROWS_PER_DAY);
}

#[test]
fn test_input_without_metadata_is_configuration_error() {
    let mut series = single_column(Channel::Current, vec![Some(1.0)]);
    let err = filter_current(&mut series, &ArrayMetadata::default(), 1.2).unwrap_err();
    assert!(matches!(err, SanitizeError::Configuration { .. }));
}
