//! Telemetry sanitization pipeline.
//!
//! Orchestrates the stages in order: operational irradiance and irradiance
//! filtering on the weather, clear-sky reference on the telemetry axis,
//! night elimination, current and voltage bound filters, then regression
//! imputation or carry-fill depending on how much data is missing.

pub mod alignment;
pub mod bounds;
pub mod daylight;
pub mod imputation;
pub mod quality;
pub mod regression;
pub mod temperature;

#[cfg(test)]
pub mod tests;

pub use quality::{DataQualityReport, InputAvailability, Status};

use crate::config::SanitizerConfig;
use crate::error::{Result, SanitizeError};
use crate::models::{ArrayMetadata, Channel, SiteMetadata};
use crate::series::{Cell, TimeSeries, resolve_resolution};
use crate::solar;
use crate::timezone::{TimezoneLookup, resolve_site_timezone};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;
use tracing::{debug, info, warn};

/// How remaining nulls were filled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FillStrategy {
    /// Per-input ridge regression
    Regression,
    /// Forward fill followed by backward fill
    CarryForward,
}

impl fmt::Display for FillStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FillStrategy::Regression => f.write_str("regression"),
            FillStrategy::CarryForward => f.write_str("carry-forward"),
        }
    }
}

/// Everything a run hands to reporting
#[derive(Debug, Clone)]
pub struct SanitizationResult {
    /// Filtered and filled daylight telemetry
    pub sanitized: TimeSeries,
    /// Daylight telemetry after bound filtering, before filling
    pub filtered: TimeSeries,
    /// Clear-sky reference on the full telemetry axis
    pub clear_sky: TimeSeries,
    /// Daylight weather on the telemetry axis
    pub weather: TimeSeries,
    pub report: DataQualityReport,
    pub breakdown_pre: Vec<InputAvailability>,
    pub breakdown_post: Vec<InputAvailability>,
    pub strategy: FillStrategy,
}

/// Sanitizer for one site
#[derive(Debug, Clone)]
pub struct Sanitizer {
    site: SiteMetadata,
    array: ArrayMetadata,
    timezone: Tz,
    config: SanitizerConfig,
}

impl Sanitizer {
    /// Create a sanitizer, resolving the site timezone up front
    pub fn new(
        site: SiteMetadata,
        array: ArrayMetadata,
        lookup: &dyn TimezoneLookup,
    ) -> Result<Self> {
        site.validate()?;
        if array.is_empty() {
            return Err(SanitizeError::configuration(
                "array metadata lists no inputs",
            ));
        }
        let timezone = resolve_site_timezone(&site, lookup)?;
        Ok(Self {
            site,
            array,
            timezone,
            config: SanitizerConfig::default(),
        })
    }

    /// Configure the sanitizer
    pub fn with_config(mut self, config: SanitizerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &SanitizerConfig {
        &self.config
    }

    pub fn array(&self) -> &ArrayMetadata {
        &self.array
    }

    /// Clear-sky reference on an arbitrary site-local axis
    pub fn clear_sky_reference(&self, index: &[chrono::NaiveDateTime]) -> Result<TimeSeries> {
        solar::clear_sky_reference(index, &self.site, &self.array, &self.timezone, &self.config)
    }

    /// Run the full pipeline over one telemetry table and its weather
    pub fn run(&self, telemetry: &TimeSeries, weather: &TimeSeries) -> Result<SanitizationResult> {
        let start_time = Instant::now();
        self.config.validate()?;
        let config = &self.config;

        info!(
            "Sanitizing {} rows x {} columns for {} inputs",
            telemetry.len(),
            telemetry.width(),
            self.array.len()
        );
        let data_points = telemetry.cell_count();

        let mut telemetry = telemetry.clone();
        telemetry.ensure_channels(self.array.ids(), &Channel::TELEMETRY);
        let resolution = resolve_resolution(self.site.telemetry_resolution_min, telemetry.index())?;

        // Weather: GHI -> POA, physical filter, then onto the telemetry axis
        let mut weather = solar::operational_irradiance(
            weather,
            &self.site,
            &self.array,
            &self.timezone,
            config,
        )?;
        bounds::filter_irradiance(&mut weather, config.irradiance_low, config.irradiance_high);
        let mut weather = alignment::align_weather(
            &weather,
            self.site.weather_resolution_min,
            telemetry.index(),
            resolution,
        )?;
        if config.estimate_module_temperature {
            temperature::estimate_module_temperature(&mut weather, self.array.ids())?;
        }

        let clear_sky = self.clear_sky_reference(telemetry.index())?;
        let daylight = daylight::eliminate_night(&telemetry, &clear_sky, config.daylight_threshold)?;
        let weather = daylight::eliminate_night(&weather, &clear_sky, config.daylight_threshold)?;
        info!(
            "Daylight mask kept {} of {} rows",
            daylight.len(),
            telemetry.len()
        );

        let nulls_before_filter = daylight.null_count();

        let mut filtered = daylight.clone();
        let current_nulled =
            bounds::filter_current(&mut filtered, &self.array, config.current_headroom)?;
        let voltage_nulled = bounds::filter_voltage(&mut filtered, &self.array)?;
        let outlier_pct = quality::outlier_ratio(
            nulls_before_filter,
            filtered.null_count(),
            filtered.cell_count(),
        );
        info!(
            "Bound filters nulled {} current and {} voltage cells",
            current_nulled, voltage_nulled
        );

        // The report and the fill strategy gate share one missing figure
        let gate_pct = filtered.missing_pct();
        let missing_pct = quality::round2(gate_pct);
        let (mut sanitized, strategy) = if gate_pct > config.imputation_threshold_pct {
            info!(
                "Missing data {:.2}% exceeds {}%, imputing with ridge regression",
                gate_pct, config.imputation_threshold_pct
            );
            (
                imputation::impute_missing(&filtered, &weather, config)?,
                FillStrategy::Regression,
            )
        } else {
            debug!(
                "Missing data {:.2}% within {}%, carrying values forward",
                gate_pct, config.imputation_threshold_pct
            );
            let mut carried = filtered.clone();
            carried.forward_fill();
            carried.backward_fill();
            (carried, FillStrategy::CarryForward)
        };

        let negatives = sanitized.null_where(|x| x < 0.0);
        if negatives > 0 {
            warn!("Nulled {} negative values after filling", negatives);
        }
        let reconstructed = reconstruct_power(&mut sanitized, &self.array);
        debug!("Reconstructed {} power cells from V x I", reconstructed);

        let report = DataQualityReport {
            data_points,
            temporal_resolution_min: resolution.num_seconds() as f64 / 60.0,
            missing_pct,
            outlier_pct,
            missing_post_sanitation_pct: quality::round2(sanitized.missing_pct()),
        };
        let breakdown_pre = quality::input_breakdown(&filtered, &self.array);
        let breakdown_post = quality::input_breakdown(&sanitized, &self.array);

        info!(
            "Sanitization finished in {}ms using {}: missing {}% -> {}%",
            start_time.elapsed().as_millis(),
            strategy,
            report.missing_pct,
            report.missing_post_sanitation_pct
        );

        Ok(SanitizationResult {
            sanitized,
            filtered,
            clear_sky,
            weather,
            report,
            breakdown_pre,
            breakdown_post,
            strategy,
        })
    }
}

/// Fill null power cells from voltage and current; returns cells filled
fn reconstruct_power(series: &mut TimeSeries, array: &ArrayMetadata) -> usize {
    let mut filled = 0;
    for id in array.ids() {
        let (Some(voltage), Some(current)) = (
            series.column(&id.key(Channel::Voltage)),
            series.column(&id.key(Channel::Current)),
        ) else {
            continue;
        };
        let product: Vec<Cell> = voltage
            .iter()
            .zip(current)
            .map(|(v, i)| v.zip(*i).map(|(v, i)| v * i))
            .collect();
        let Some(power) = series.column_mut(&id.key(Channel::Power)) else {
            continue;
        };
        for (p, vi) in power.iter_mut().zip(product) {
            if p.is_none() && vi.is_some() {
                *p = vi;
                filled += 1;
            }
        }
    }
    filled
}
