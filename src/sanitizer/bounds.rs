//! Physical bound filters.
//!
//! Each filter nulls failing cells in place and never removes rows. A null
//! cell never satisfies a bound, so reapplying a filter changes nothing.

use crate::error::{Result, SanitizeError};
use crate::models::{ArrayMetadata, Channel, ChannelKey, InputMetadata};
use crate::series::{Cell, TimeSeries};
use tracing::debug;

/// Null every present cell that `valid` rejects; returns cells nulled
fn null_invalid(values: &mut [Cell], valid: impl Fn(f64) -> bool) -> usize {
    let mut nulled = 0;
    for v in values.iter_mut() {
        if v.is_some_and(|x| !valid(x)) {
            *v = None;
            nulled += 1;
        }
    }
    nulled
}

fn keys_of(series: &TimeSeries, channels: &[Channel]) -> Vec<ChannelKey> {
    series
        .keys()
        .filter(|key| channels.contains(&key.channel))
        .cloned()
        .collect()
}

fn metadata_for<'a>(array: &'a ArrayMetadata, key: &ChannelKey) -> Result<&'a InputMetadata> {
    array.get(&key.input()).ok_or_else(|| {
        SanitizeError::configuration(format!(
            "no array metadata for input {} (column {key})",
            key.input()
        ))
    })
}

/// Keep irradiance strictly inside `(low, high)`
pub fn filter_irradiance(series: &mut TimeSeries, low: f64, high: f64) -> usize {
    let mut nulled = 0;
    for key in keys_of(series, &[Channel::Irradiance, Channel::Ghi]) {
        if let Some(values) = series.column_mut(&key) {
            nulled += null_invalid(values, |g| low < g && g < high);
        }
    }
    debug!("Irradiance filter nulled {} cells", nulled);
    nulled
}

/// Keep current in `(0, headroom × Isc × strings]` for each input
pub fn filter_current(
    series: &mut TimeSeries,
    array: &ArrayMetadata,
    headroom: f64,
) -> Result<usize> {
    let mut nulled = 0;
    for key in keys_of(series, &[Channel::Current]) {
        let ceiling = metadata_for(array, &key)?.current_ceiling(headroom)?;
        if let Some(values) = series.column_mut(&key) {
            nulled += null_invalid(values, |i| 0.0 < i && i <= ceiling);
        }
    }
    debug!("Current filter nulled {} cells", nulled);
    Ok(nulled)
}

/// Keep voltage in `(0, Voc × modules per string]` for each input
pub fn filter_voltage(series: &mut TimeSeries, array: &ArrayMetadata) -> Result<usize> {
    let mut nulled = 0;
    for key in keys_of(series, &[Channel::Voltage]) {
        let ceiling = metadata_for(array, &key)?.voltage_ceiling()?;
        if let Some(values) = series.column_mut(&key) {
            nulled += null_invalid(values, |v| 0.0 < v && v <= ceiling);
        }
    }
    debug!("Voltage filter nulled {} cells", nulled);
    Ok(nulled)
}
