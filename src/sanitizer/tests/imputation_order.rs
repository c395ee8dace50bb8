//! Imputation engine tests

use super::fixtures::{self, hm, input_a, input_b, punch_gap};
use crate::config::SanitizerConfig;
use crate::error::SanitizeError;
use crate::models::Channel;
use crate::sanitizer::imputation::{impute_channel, impute_input, impute_missing};
use crate::series::{Cell, TimeSeries};

/// Midday gap in V and I of input B, daytime rows only
fn gapped_day() -> (TimeSeries, TimeSeries) {
    let mut dataset = fixtures::clean_day();
    punch_gap(
        &mut dataset.telemetry,
        &input_b(),
        &[Channel::Voltage, Channel::Current],
        hm(11, 0),
        hm(13, 0),
    );
    let keep: Vec<bool> = dataset
        .telemetry
        .index()
        .iter()
        .map(|ts| ts.time() >= hm(6, 0) && ts.time() < hm(21, 0))
        .collect();
    (
        dataset.telemetry.select_rows(&keep).unwrap(),
        dataset.weather.select_rows(&keep).unwrap(),
    )
}

fn seconds(series: &TimeSeries) -> Vec<Cell> {
    series
        .index()
        .iter()
        .map(|ts| Some(ts.and_utc().timestamp() as f64))
        .collect()
}

#[test]
fn test_voltage_before_current_is_not_equivalent() {
    let (telemetry, weather) = gapped_day();
    let id = input_b();
    let voltage = telemetry.column(&id.key(Channel::Voltage)).unwrap();
    let current = telemetry.column(&id.key(Channel::Current)).unwrap();
    let g = weather.column(&id.key(Channel::Irradiance)).unwrap();
    let tmod = weather.column(&id.key(Channel::ModuleTemperature)).unwrap();
    let t = seconds(&telemetry);

    let filled_voltage =
        impute_channel(&id, Channel::Voltage, voltage, &[g, tmod, t.as_slice()], 1.0).unwrap();
    let with_imputed_voltage = impute_channel(
        &id,
        Channel::Current,
        current,
        &[filled_voltage.as_slice(), g, tmod, t.as_slice()],
        1.0,
    )
    .unwrap();
    let with_raw_voltage = impute_channel(
        &id,
        Channel::Current,
        current,
        &[voltage, g, tmod, t.as_slice()],
        1.0,
    )
    .unwrap();

    assert_ne!(with_imputed_voltage, with_raw_voltage);
    assert!(with_imputed_voltage.iter().all(Option::is_some));
    // Raw voltage leaves the overlapping gap without a complete predictor row
    assert!(with_raw_voltage.iter().any(Option::is_none));
}

#[test]
fn test_complete_channel_passes_through() {
    let (telemetry, weather) = gapped_day();
    let result = impute_input(&input_a(), &telemetry, &weather, 1.0).unwrap();
    assert_eq!(result.imputed_cells, 0);
    assert_eq!(
        result.voltage.as_slice(),
        telemetry.column(&input_a().key(Channel::Voltage)).unwrap()
    );
}

#[test]
fn test_gap_filled_with_plausible_values() {
    let (telemetry, weather) = gapped_day();
    let result = impute_input(&input_b(), &telemetry, &weather, 1.0).unwrap();
    assert_eq!(result.imputed_cells, 48);
    assert!(result.voltage.iter().all(|v| v.is_some_and(|v| v > 400.0 && v < 800.0)));
    assert!(result.current.iter().all(|i| i.is_some_and(|i| i > 0.0 && i < 21.6)));
}

#[test]
fn test_missing_module_temperature_names_input() {
    let (telemetry, mut weather) = gapped_day();
    weather.remove_column(&input_b().key(Channel::ModuleTemperature));
    let err = impute_input(&input_b(), &telemetry, &weather, 1.0).unwrap_err();
    match err {
        SanitizeError::MissingFeature {
            input,
            channel,
            stage,
            ..
        } => {
            assert_eq!(input, "Inv01-M2");
            assert_eq!(channel, "Tmod");
            assert_eq!(stage, "imputation");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_missing_predictor_ignored_when_nothing_to_impute() {
    let (telemetry, mut weather) = gapped_day();
    weather.remove_column(&input_a().key(Channel::ModuleTemperature));
    assert!(impute_input(&input_a(), &telemetry, &weather, 1.0).is_ok());
}

#[test]
fn test_no_training_rows_is_missing_feature() {
    let (telemetry, weather) = gapped_day();
    let id = input_b();
    let all_null = vec![None; telemetry.len()];
    let g = weather.column(&id.key(Channel::Irradiance)).unwrap();
    let err = impute_channel(&id, Channel::Voltage, &all_null, &[g], 1.0).unwrap_err();
    assert!(matches!(err, SanitizeError::MissingFeature { .. }));
}

#[test]
fn test_parallel_and_sequential_agree() {
    let (telemetry, weather) = gapped_day();
    let parallel = impute_missing(&telemetry, &weather, &SanitizerConfig::default()).unwrap();
    let sequential =
        impute_missing(&telemetry, &weather, &SanitizerConfig::default().sequential()).unwrap();
    assert_eq!(parallel, sequential);
    assert_eq!(
        parallel.null_count(),
        0,
        "every gap cell has complete predictors"
    );
}

#[test]
fn test_short_predictor_is_alignment_error() {
    let (telemetry, weather) = gapped_day();
    let id = input_b();
    let voltage = telemetry.column(&id.key(Channel::Voltage)).unwrap();
    let g = weather.column(&id.key(Channel::Irradiance)).unwrap();
    let err = impute_channel(&id, Channel::Voltage, voltage, &[&g[1..]], 1.0).unwrap_err();
    assert!(matches!(err, SanitizeError::Alignment { .. }));
}
