//! Application constants for the PV sanitizer
//!
//! This module contains default policy values, physical model coefficients,
//! channel tags and report field names used throughout the pipeline.

// =============================================================================
// Channel Tags
// =============================================================================

/// Channel tags as they appear in the third part of a column key
pub mod channel_tags {
    pub const CURRENT: &str = "I";
    pub const VOLTAGE: &str = "V";
    pub const POWER: &str = "P";
    pub const IRRADIANCE: &str = "G";
    pub const GHI: &str = "GHI";
    pub const AMBIENT_TEMPERATURE: &str = "Tamb";
    pub const MODULE_TEMPERATURE: &str = "Tmod";
    pub const CLEAR_SKY: &str = "CS_G";
}

/// Separator between group, subgroup and channel in flat column names
pub const COLUMN_SEPARATOR: char = '-';

/// Name of the timestamp column in CSV input and output
pub const TIMESTAMP_COLUMN: &str = "timestamp";

/// Timestamp format used for CSV input and output
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// =============================================================================
// Pipeline Defaults
// =============================================================================

/// Clear-sky value a row must exceed (for at least one input) to count as daylight
pub const DEFAULT_DAYLIGHT_THRESHOLD: f64 = 10.0;

/// Lower irradiance bound (exclusive), W/m²
pub const DEFAULT_IRRADIANCE_LOW: f64 = 0.0;

/// Upper irradiance bound (exclusive), W/m²
pub const DEFAULT_IRRADIANCE_HIGH: f64 = 1200.0;

/// Multiplier on Isc × strings for the current ceiling.
/// Accommodates irradiance up to 1200 W/m² against 1000 W/m² STC.
pub const DEFAULT_CURRENT_HEADROOM: f64 = 1.2;

/// Missing percentage above which regression imputation runs instead of carry-fill
pub const DEFAULT_IMPUTATION_THRESHOLD_PCT: f64 = 0.5;

/// Ridge regularization strength
pub const DEFAULT_RIDGE_ALPHA: f64 = 1.0;

/// Ground reflectance used by the transposition model
pub const DEFAULT_ALBEDO: f64 = 0.25;

/// Linke turbidity used by the Ineichen clear-sky model
pub const DEFAULT_LINKE_TURBIDITY: f64 = 3.0;

/// Number of leading deltas inspected when inferring a sampling step
pub const FREQUENCY_INFERENCE_WINDOW: usize = 10;

// =============================================================================
// Physical Model Coefficients
// =============================================================================

pub mod solar {
    /// Solar constant used for extraterrestrial irradiance, W/m²
    pub const SOLAR_CONSTANT: f64 = 1366.1;

    /// Standard sea-level pressure, Pa
    pub const SEA_LEVEL_PRESSURE: f64 = 101_325.0;

    /// Aerosol optical depth at 700 nm for the simplified Solis model
    pub const SOLIS_AOD700: f64 = 0.1;

    /// Precipitable water (cm) for the simplified Solis model
    pub const SOLIS_PRECIPITABLE_WATER: f64 = 1.0;

    /// Below this cosine of zenith the beam component is treated as zero
    pub const MIN_COS_ZENITH: f64 = 1e-6;

    /// Cosine floor used by the clearness index
    pub const CLEARNESS_MIN_COS_ZENITH: f64 = 0.065;

    /// Clearness index ceiling
    pub const MAX_CLEARNESS_INDEX: f64 = 2.0;

    /// Zenith (degrees) beyond which Erbs DNI is forced to zero
    pub const ERBS_MAX_ZENITH: f64 = 87.0;
}

pub mod module_temperature {
    /// Sandia coefficient `a` for glass/cell/polymer sheet, open rack
    pub const SANDIA_A: f64 = -3.56;
}

// =============================================================================
// Data Quality Report
// =============================================================================

/// Status band edges applied to availability (100 - missing [- outlier])
pub mod status_bands {
    /// Strictly above this is "Superb"
    pub const SUPERB_ABOVE: f64 = 99.5;
    /// At or above this is "Good"
    pub const GOOD_FROM: f64 = 98.0;
    /// At or above this is "Normal"
    pub const NORMAL_FROM: f64 = 95.0;
}

/// Fixed report field names exposed to downstream consumers
pub mod report_fields {
    pub const DATA_POINTS_AVAILABLE: &str = "Data Points Available";
    pub const TEMPORAL_RESOLUTION: &str = "Temporal Resolution";
    pub const MISSING_DATA: &str = "Missing Data (%)";
    pub const OUTLIERS: &str = "Outliers (%)";
    pub const MISSING_DATA_POST_SANITATION: &str = "Missing Data Post Sanitation (%)";
}
