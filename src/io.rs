//! CSV boundary built on polars.
//!
//! Telemetry and weather files carry a `timestamp` column followed by one
//! column per `group-subgroup-channel` key. Array metadata files carry one
//! row per input.

use crate::constants::{TIMESTAMP_COLUMN, TIMESTAMP_FORMAT};
use crate::error::{Result, SanitizeError};
use crate::models::{ArrayMetadata, ChannelKey, InputId, InputMetadata};
use crate::sanitizer::{DataQualityReport, InputAvailability};
use crate::series::{Cell, TimeSeries};
use chrono::NaiveDateTime;
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tracing::{debug, info};

/// Array metadata column names
pub mod metadata_columns {
    pub const GROUP: &str = "group";
    pub const SUBGROUP: &str = "subgroup";
    pub const INPUT_NAME: &str = "input_name";
    pub const SURFACE_TILT: &str = "surface_tilt";
    pub const SURFACE_AZIMUTH: &str = "surface_azimuth";
    pub const I_SC: &str = "i_sc";
    pub const V_OC: &str = "v_oc";
    pub const MODULES_PER_STRING: &str = "modules_per_string";
    pub const NUMBER_OF_STRINGS: &str = "number_of_strings";
}

fn read_csv(path: &Path) -> Result<DataFrame> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;
    debug!(
        "Read {} rows x {} columns from {}",
        df.height(),
        df.width(),
        path.display()
    );
    Ok(df)
}

fn string_column(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let column = df.column(name)?.cast(&DataType::String)?;
    Ok(column
        .str()?
        .into_iter()
        .map(|v| v.map(|s| s.trim().to_string()))
        .collect())
}

fn float_column(df: &DataFrame, name: &str) -> Result<Vec<Cell>> {
    let column = df.column(name)?.cast(&DataType::Float64)?;
    Ok(column.f64()?.into_iter().collect())
}

fn optional_float_column(df: &DataFrame, name: &str, rows: usize) -> Result<Vec<Cell>> {
    if df.get_column_names().iter().any(|c| c.as_str() == name) {
        float_column(df, name)
    } else {
        Ok(vec![None; rows])
    }
}

fn parse_timestamp(raw: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT).map_err(|e| {
        SanitizeError::configuration(format!(
            "timestamp '{raw}' does not match {TIMESTAMP_FORMAT}: {e}"
        ))
    })
}

/// Convert a wide frame into an aligned series.
///
/// Rows are sorted by timestamp and duplicate timestamps keep their first
/// occurrence.
pub fn dataframe_to_series(df: &DataFrame) -> Result<TimeSeries> {
    let timestamps = string_column(df, TIMESTAMP_COLUMN)?
        .into_iter()
        .enumerate()
        .map(|(row, raw)| match raw {
            Some(raw) => parse_timestamp(&raw),
            None => Err(SanitizeError::configuration(format!(
                "row {row} has no timestamp"
            ))),
        })
        .collect::<Result<Vec<_>>>()?;

    let mut keys = Vec::new();
    let mut columns = Vec::new();
    for name in df.get_column_names() {
        if name.as_str() == TIMESTAMP_COLUMN {
            continue;
        }
        keys.push(ChannelKey::parse_flat(name.as_str())?);
        columns.push(float_column(df, name.as_str())?);
    }

    let rows = timestamps
        .into_iter()
        .enumerate()
        .map(|(row, ts)| (ts, columns.iter().map(|values| values[row]).collect()))
        .collect();
    TimeSeries::from_rows(keys, rows)
}

/// Read a telemetry or weather CSV
pub fn read_series_csv(path: &Path) -> Result<TimeSeries> {
    let series = dataframe_to_series(&read_csv(path)?)?;
    info!(
        "Loaded {} timestamps and {} channels from {}",
        series.len(),
        series.width(),
        path.display()
    );
    Ok(series)
}

fn count(value: Cell, field: &str, row: usize) -> Result<Option<u32>> {
    match value {
        None => Ok(None),
        Some(v) if v >= 0.0 && v.fract() == 0.0 && v <= u32::MAX as f64 => Ok(Some(v as u32)),
        Some(v) => Err(SanitizeError::configuration(format!(
            "{field} on metadata row {row} must be a whole number, got {v}"
        ))),
    }
}

/// Convert an array metadata frame
pub fn dataframe_to_array_metadata(df: &DataFrame) -> Result<ArrayMetadata> {
    use metadata_columns::*;

    let rows = df.height();
    let groups = string_column(df, GROUP)?;
    let subgroups = string_column(df, SUBGROUP)?;
    let names = if df.get_column_names().iter().any(|c| c.as_str() == INPUT_NAME) {
        string_column(df, INPUT_NAME)?
    } else {
        vec![None; rows]
    };
    let tilts = optional_float_column(df, SURFACE_TILT, rows)?;
    let azimuths = optional_float_column(df, SURFACE_AZIMUTH, rows)?;
    let i_scs = optional_float_column(df, I_SC, rows)?;
    let v_ocs = optional_float_column(df, V_OC, rows)?;
    let modules = optional_float_column(df, MODULES_PER_STRING, rows)?;
    let strings = optional_float_column(df, NUMBER_OF_STRINGS, rows)?;

    let mut inputs = Vec::with_capacity(rows);
    for row in 0..rows {
        let (Some(group), Some(subgroup)) = (&groups[row], &subgroups[row]) else {
            return Err(SanitizeError::configuration(format!(
                "metadata row {row} is missing group or subgroup"
            )));
        };
        let id = InputId::new(group.clone(), subgroup.clone());
        inputs.push(InputMetadata {
            name: names[row].clone().unwrap_or_else(|| id.to_string()),
            id,
            surface_tilt: tilts[row],
            surface_azimuth: azimuths[row],
            i_sc: i_scs[row],
            v_oc: v_ocs[row],
            modules_per_string: count(modules[row], MODULES_PER_STRING, row)?,
            strings_per_input: count(strings[row], NUMBER_OF_STRINGS, row)?,
        });
    }
    ArrayMetadata::new(inputs)
}

/// Read an array metadata CSV
pub fn read_array_metadata_csv(path: &Path) -> Result<ArrayMetadata> {
    let array = dataframe_to_array_metadata(&read_csv(path)?)?;
    info!("Loaded metadata for {} inputs from {}", array.len(), path.display());
    Ok(array)
}

/// Wide frame with a formatted timestamp column and one column per key
pub fn series_to_dataframe(series: &TimeSeries) -> Result<DataFrame> {
    let timestamps: Vec<String> = series
        .index()
        .iter()
        .map(|ts| ts.format(TIMESTAMP_FORMAT).to_string())
        .collect();
    let mut columns = vec![Column::new(TIMESTAMP_COLUMN.into(), timestamps)];
    for (key, values) in series.columns() {
        columns.push(Column::new(key.flat_name().into(), values.to_vec()));
    }
    Ok(DataFrame::new(columns)?)
}

/// Report as a two-column `Field`/`Value` frame
pub fn report_to_dataframe(report: &DataQualityReport) -> Result<DataFrame> {
    let (fields, values): (Vec<String>, Vec<String>) = report
        .rows()
        .into_iter()
        .map(|(field, value)| (field.to_string(), value))
        .unzip();
    Ok(DataFrame::new(vec![
        Column::new("Field".into(), fields),
        Column::new("Value".into(), values),
    ])?)
}

/// Per-input breakdown as an `Input`/`Missing/Bad`/`Available` frame
pub fn breakdown_to_dataframe(breakdown: &[InputAvailability]) -> Result<DataFrame> {
    let names: Vec<String> = breakdown.iter().map(|b| b.name.clone()).collect();
    let missing: Vec<f64> = breakdown.iter().map(|b| b.missing_pct).collect();
    let available: Vec<f64> = breakdown.iter().map(|b| b.available_pct).collect();
    Ok(DataFrame::new(vec![
        Column::new("Input".into(), names),
        Column::new("Missing/Bad".into(), missing),
        Column::new("Available".into(), available),
    ])?)
}

/// Write a frame to CSV, creating parent directories
pub fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).include_header(true).finish(df)?;
    debug!("Wrote {} rows to {}", df.height(), path.display());
    Ok(())
}

/// Write a series to CSV
pub fn write_series_csv(series: &TimeSeries, path: &Path) -> Result<()> {
    let mut df = series_to_dataframe(series)?;
    write_csv(&mut df, path)
}
