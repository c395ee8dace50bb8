//! End-to-end tests for the sanitizer
//!
//! These tests drive the public API the way the binary does: CSV files on
//! disk, array metadata loaded through polars, a full pipeline run and the
//! reports written back out.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use pv_sanitizer::io;
use pv_sanitizer::{
    Channel, DataQualityReport, FillStrategy, FixedTimezone, InputId, IrradianceType, Sanitizer,
    SanitizerConfig, SiteMetadata, Status, TimeSeries,
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const ARRAY_CSV: &str = "\
group,subgroup,input_name,surface_tilt,surface_azimuth,i_sc,v_oc,modules_per_string,number_of_strings
Inv01,M1,East roof,20,170,9,45,20,2
Inv01,M2,West roof,30,190,9,45,20,2
";

/// Rooftop plant near Zurich, 5-minute data in local time
fn site() -> SiteMetadata {
    SiteMetadata {
        latitude: 47.37,
        longitude: 8.54,
        altitude: 400.0,
        timezone: Some("Europe/Zurich".to_string()),
        irradiance_type: IrradianceType::PlaneOfArray,
        telemetry_resolution_min: Some(5),
        weather_resolution_min: Some(5),
    }
}

fn axis() -> Vec<NaiveDateTime> {
    let start = NaiveDate::from_ymd_opt(2023, 7, 4)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    (0..288).map(|i| start + Duration::minutes(5 * i)).collect()
}

fn sanitizer(dir: &Path) -> Sanitizer {
    let array_path = dir.join("array.csv");
    fs::write(&array_path, ARRAY_CSV).unwrap();
    let array = io::read_array_metadata_csv(&array_path).unwrap();
    Sanitizer::new(site(), array, &FixedTimezone("UTC".into())).unwrap()
}

/// Telemetry and weather that follow 90% of clear sky, with V, I and P of
/// `Inv01-M2` missing between 10:30 and 12:30
fn write_inputs(sanitizer: &Sanitizer, dir: &Path) {
    let axis = axis();
    let reference = sanitizer.clear_sky_reference(&axis).unwrap();
    let mut telemetry = TimeSeries::new(axis.clone()).unwrap();
    let mut weather = TimeSeries::new(axis.clone()).unwrap();

    let gap_from = NaiveTime::from_hms_opt(10, 30, 0).unwrap();
    let gap_to = NaiveTime::from_hms_opt(12, 30, 0).unwrap();

    for id in sanitizer.array().ids() {
        let cs = reference.column(&id.key(Channel::ClearSky)).unwrap();
        let in_gap = |row: usize| {
            id.subgroup == "M2" && axis[row].time() >= gap_from && axis[row].time() < gap_to
        };

        let mut g = Vec::new();
        let mut tmod = Vec::new();
        let mut tamb = Vec::new();
        let mut current = Vec::new();
        let mut voltage = Vec::new();
        let mut power = Vec::new();
        for (row, cs) in cs.iter().enumerate() {
            let irradiance = 0.9 * cs.unwrap_or(0.0);
            let ambient = 18.0 + 8.0 * (row as f64 / 288.0);
            let module = ambient + 0.028 * irradiance;
            let i = 17.5 * irradiance / 1000.0 * (1.0 + 0.015 * (row as f64 * 0.3).cos()) + 0.02;
            let v = 560.0 + 0.04 * irradiance - 1.4 * (module - 25.0) + 2.5 * (row as f64).sin();
            g.push(Some(irradiance));
            tamb.push(Some(ambient));
            tmod.push(Some(module));
            if in_gap(row) {
                current.push(None);
                voltage.push(None);
                power.push(None);
            } else {
                current.push(Some(i));
                voltage.push(Some(v));
                power.push(Some(v * i));
            }
        }

        telemetry.insert_column(id.key(Channel::Current), current).unwrap();
        telemetry.insert_column(id.key(Channel::Voltage), voltage).unwrap();
        telemetry.insert_column(id.key(Channel::Power), power).unwrap();
        weather.insert_column(id.key(Channel::Irradiance), g).unwrap();
        weather.insert_column(id.key(Channel::ModuleTemperature), tmod).unwrap();
        weather.insert_column(id.key(Channel::AmbientTemperature), tamb).unwrap();
    }

    io::write_series_csv(&telemetry, &dir.join("telemetry.csv")).unwrap();
    io::write_series_csv(&weather, &dir.join("weather.csv")).unwrap();
}

#[test]
fn test_csv_files_through_full_pipeline() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();
    let sanitizer = sanitizer(dir);
    write_inputs(&sanitizer, dir);

    let telemetry = io::read_series_csv(&dir.join("telemetry.csv")).unwrap();
    let weather = io::read_series_csv(&dir.join("weather.csv")).unwrap();
    assert_eq!(telemetry.len(), 288);
    assert_eq!(telemetry.width(), 6);

    let result = sanitizer.run(&telemetry, &weather).unwrap();
    assert_eq!(result.strategy, FillStrategy::Regression);
    assert!(result.report.missing_pct > 0.5);
    // Filters removed nothing, so nulls after equal nulls before
    assert_eq!(result.report.outlier_pct, 1.0);
    assert_eq!(result.report.missing_post_sanitation_pct, 0.0);
    assert_eq!(result.report.data_points, 288 * 6);

    // Power inside the gap is rebuilt from the imputed V and I
    let west = InputId::new("Inv01", "M2");
    let v = result.sanitized.column(&west.key(Channel::Voltage)).unwrap();
    let i = result.sanitized.column(&west.key(Channel::Current)).unwrap();
    let p = result.sanitized.column(&west.key(Channel::Power)).unwrap();
    let filtered_p = result.filtered.column(&west.key(Channel::Power)).unwrap();
    for row in 0..result.sanitized.len() {
        if filtered_p[row].is_none() {
            assert_eq!(p[row], Some(v[row].unwrap() * i[row].unwrap()));
        }
    }

    assert_eq!(result.breakdown_pre[0].name, "East roof");
    assert_eq!(result.breakdown_pre[0].missing_pct, 0.0);
    assert!(result.breakdown_pre[1].missing_pct > 0.0);
    assert_eq!(result.breakdown_post[1].available_pct, 100.0);

    let output = dir.join("out").join("telemetry_sanitized.csv");
    io::write_series_csv(&result.sanitized, &output).unwrap();
    let reloaded = io::read_series_csv(&output).unwrap();
    assert_eq!(reloaded.index(), result.sanitized.index());
    assert_eq!(reloaded.null_count(), 0);
}

#[test]
fn test_small_gap_is_carried_forward() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();
    let sanitizer =
        sanitizer(dir).with_config(SanitizerConfig::default().with_imputation_threshold(25.0));
    write_inputs(&sanitizer, dir);

    let telemetry = io::read_series_csv(&dir.join("telemetry.csv")).unwrap();
    let weather = io::read_series_csv(&dir.join("weather.csv")).unwrap();
    let result = sanitizer.run(&telemetry, &weather).unwrap();

    assert_eq!(result.strategy, FillStrategy::CarryForward);
    assert_eq!(result.report.missing_post_sanitation_pct, 0.0);
    // Two hours of one input out of a summer day is several percent missing
    assert_eq!(result.report.pre_sanitation_status(), Status::Poor);
    assert_eq!(result.report.post_sanitation_status(), Status::Superb);
}

#[test]
fn test_report_written_as_field_value_table() {
    let temp_dir = TempDir::new().unwrap();
    let report = DataQualityReport {
        data_points: 12_345,
        temporal_resolution_min: 5.0,
        missing_pct: 1.25,
        outlier_pct: 0.0,
        missing_post_sanitation_pct: 0.0,
    };
    let path = temp_dir.path().join("report.csv");
    let mut df = io::report_to_dataframe(&report).unwrap();
    io::write_csv(&mut df, &path).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "Field,Value");
    assert_eq!(lines[1], "Data Points Available,12.345 K");
    assert_eq!(lines[2], "Temporal Resolution,5 Mins");
    assert_eq!(lines[3], "Missing Data (%),1.25 %");
    assert_eq!(report.pre_sanitation_status(), Status::Good);
    assert_eq!(report.post_sanitation_status(), Status::Superb);
}

#[test]
fn test_status_band_edges() {
    assert_eq!(Status::classify(100.0), Status::Superb);
    assert_eq!(Status::classify(99.51), Status::Superb);
    assert_eq!(Status::classify(99.5), Status::Good);
    assert_eq!(Status::classify(98.0), Status::Good);
    assert_eq!(Status::classify(97.99), Status::Normal);
    assert_eq!(Status::classify(95.0), Status::Normal);
    assert_eq!(Status::classify(94.99), Status::Poor);
}

#[test]
fn test_clear_sky_reference_is_deterministic() {
    let temp_dir = TempDir::new().unwrap();
    let sanitizer = sanitizer(temp_dir.path());
    let first = sanitizer.clear_sky_reference(&axis()).unwrap();
    let second = sanitizer.clear_sky_reference(&axis()).unwrap();
    assert_eq!(first, second);

    // Local midnight is dark, local noon is not
    let east = InputId::new("Inv01", "M1").key(Channel::ClearSky);
    let values = first.column(&east).unwrap();
    assert_eq!(values[0], Some(0.0));
    assert!(values[144].is_some_and(|cs| cs > 500.0));
}
