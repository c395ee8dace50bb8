//! Reconciling the weather series with the telemetry axis.

use crate::error::{Result, SanitizeError};
use crate::series::{TimeSeries, resolve_resolution};
use chrono::{Duration, NaiveDateTime};
use tracing::debug;

/// Bring `weather` onto the telemetry axis.
///
/// Finer weather is mean-resampled to `telemetry_resolution` first; weather
/// coarser than the telemetry cannot be aligned, nor can weather that shares
/// no timestamp with it.
pub fn align_weather(
    weather: &TimeSeries,
    declared_weather_min: Option<u32>,
    axis: &[NaiveDateTime],
    telemetry_resolution: Duration,
) -> Result<TimeSeries> {
    let weather_resolution = resolve_resolution(declared_weather_min, weather.index())?;
    if weather_resolution > telemetry_resolution {
        return Err(SanitizeError::alignment(format!(
            "weather resolution {}s is coarser than telemetry resolution {}s",
            weather_resolution.num_seconds(),
            telemetry_resolution.num_seconds()
        )));
    }

    let resampled = if weather_resolution < telemetry_resolution {
        debug!(
            "Resampling weather from {}s to {}s",
            weather_resolution.num_seconds(),
            telemetry_resolution.num_seconds()
        );
        weather.resample_mean(telemetry_resolution)?
    } else {
        weather.clone()
    };

    if resampled.overlap(axis) == 0 {
        return Err(SanitizeError::alignment(
            "weather and telemetry share no timestamps",
        ));
    }
    resampled.reindex(axis)
}
