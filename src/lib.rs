//! PV Sanitizer Library
//!
//! A Rust library for cleaning photovoltaic telemetry before performance
//! analysis.
//!
//! This library provides tools for:
//! - Computing a per-input clear-sky irradiance reference from site geometry
//! - Dropping night rows against that reference
//! - Nulling currents and voltages outside nameplate limits
//! - Filling gaps by per-input ridge regression or carry-fill
//! - Summarizing data quality before and after sanitation

pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod io;
pub mod models;
pub mod sanitizer;
pub mod series;
pub mod solar;
pub mod timezone;

// Re-export commonly used types
pub use config::{ClearSkyModel, SanitizerConfig};
pub use error::{Result, SanitizeError};
pub use models::{ArrayMetadata, Channel, ChannelKey, InputId, InputMetadata, IrradianceType, SiteMetadata};
pub use sanitizer::{DataQualityReport, FillStrategy, InputAvailability, SanitizationResult, Sanitizer, Status};
pub use series::{Cell, TimeSeries};
pub use timezone::{FixedTimezone, TimezoneLookup};
