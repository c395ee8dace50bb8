//! Data quality summary and status banding.

use crate::constants::{report_fields, status_bands};
use crate::models::{ArrayMetadata, Channel, InputId};
use crate::series::TimeSeries;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Round to two decimals
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Overall data quality band
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Status {
    Poor,
    Normal,
    Good,
    Superb,
}

impl Status {
    /// Band an availability percentage.
    ///
    /// Only values strictly above 99.5 are superb; 98 and 95 belong to the
    /// band they open.
    pub fn classify(availability: f64) -> Self {
        if availability > status_bands::SUPERB_ABOVE {
            Status::Superb
        } else if availability >= status_bands::GOOD_FROM {
            Status::Good
        } else if availability >= status_bands::NORMAL_FROM {
            Status::Normal
        } else {
            Status::Poor
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Superb => "Superb",
            Status::Good => "Good",
            Status::Normal => "Normal",
            Status::Poor => "Poor",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ratio of nulls after bound filtering to nulls before it.
///
/// Not a percentage of total cells. When nothing was null before the filters
/// the ratio is undefined, so rejected cells are reported as a percentage of
/// all `cells` instead; zero only when the filters rejected nothing.
pub fn outlier_ratio(nulls_before_filter: usize, nulls_after_filter: usize, cells: usize) -> f64 {
    if nulls_before_filter > 0 {
        round2(nulls_after_filter as f64 / nulls_before_filter as f64)
    } else if nulls_after_filter == 0 || cells == 0 {
        0.0
    } else {
        round2(nulls_after_filter as f64 / cells as f64 * 100.0)
    }
}

/// Summary record handed to reporting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataQualityReport {
    /// Raw telemetry cells received
    pub data_points: usize,
    /// Telemetry resolution in minutes
    pub temporal_resolution_min: f64,
    /// Null share of daylight telemetry after bound filtering, %
    pub missing_pct: f64,
    /// See [`outlier_ratio`]
    pub outlier_pct: f64,
    /// Null share after sanitation, %
    pub missing_post_sanitation_pct: f64,
}

impl DataQualityReport {
    /// `100 - (missing + outlier)`
    pub fn pre_sanitation_availability(&self) -> f64 {
        100.0 - (self.missing_pct + self.outlier_pct)
    }

    pub fn post_sanitation_availability(&self) -> f64 {
        100.0 - self.missing_post_sanitation_pct
    }

    pub fn pre_sanitation_status(&self) -> Status {
        Status::classify(self.pre_sanitation_availability())
    }

    pub fn post_sanitation_status(&self) -> Status {
        Status::classify(self.post_sanitation_availability())
    }

    /// Field name and display value, in report order
    pub fn rows(&self) -> Vec<(&'static str, String)> {
        vec![
            (
                report_fields::DATA_POINTS_AVAILABLE,
                format!("{} K", self.data_points as f64 / 1000.0),
            ),
            (
                report_fields::TEMPORAL_RESOLUTION,
                format!("{} Mins", self.temporal_resolution_min),
            ),
            (report_fields::MISSING_DATA, format!("{} %", self.missing_pct)),
            (report_fields::OUTLIERS, format!("{} %", self.outlier_pct)),
            (
                report_fields::MISSING_DATA_POST_SANITATION,
                format!("{} %", self.missing_post_sanitation_pct),
            ),
        ]
    }
}

/// Missing and available share of one input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputAvailability {
    pub input: InputId,
    pub name: String,
    pub missing_pct: f64,
    pub available_pct: f64,
}

/// Per-input missing/available split, power excluded.
///
/// Missing is the mean null share over the input's remaining channels.
pub fn input_breakdown(series: &TimeSeries, array: &ArrayMetadata) -> Vec<InputAvailability> {
    let rows = series.len();
    array
        .inputs()
        .iter()
        .map(|meta| {
            let shares: Vec<f64> = series
                .columns_for(&meta.id)
                .filter(|(key, _)| key.channel != Channel::Power)
                .map(|(_, values)| {
                    if rows == 0 {
                        0.0
                    } else {
                        values.iter().filter(|v| v.is_none()).count() as f64 / rows as f64
                    }
                })
                .collect();
            let missing_pct = if shares.is_empty() {
                100.0
            } else {
                round2(shares.iter().sum::<f64>() / shares.len() as f64 * 100.0)
            };
            InputAvailability {
                input: meta.id.clone(),
                name: meta.name.clone(),
                missing_pct,
                available_pct: 100.0 - missing_pct,
            }
        })
        .collect()
}
