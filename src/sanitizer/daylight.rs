//! Night-time row elimination against the clear-sky reference.

use crate::error::{Result, SanitizeError};
use crate::series::TimeSeries;
use tracing::debug;

/// Rows where at least one clear-sky column exceeds `threshold`
pub fn daylight_rows(reference: &TimeSeries, threshold: f64) -> Vec<bool> {
    (0..reference.len())
        .map(|row| {
            reference
                .columns()
                .any(|(_, values)| values[row].is_some_and(|cs| cs > threshold))
        })
        .collect()
}

/// Drop every row of `series` whose clear-sky reference does not exceed
/// `threshold` for any input.
///
/// The reference must share the series' axis. Rows are removed, not nulled.
pub fn eliminate_night(
    series: &TimeSeries,
    reference: &TimeSeries,
    threshold: f64,
) -> Result<TimeSeries> {
    if series.index() != reference.index() {
        return Err(SanitizeError::alignment(format!(
            "clear-sky reference has {} rows but the series has {} rows on a different axis",
            reference.len(),
            series.len()
        )));
    }
    let keep = daylight_rows(reference, threshold);
    let masked = series.select_rows(&keep)?;
    debug!(
        "Daylight mask kept {} of {} rows (threshold {})",
        masked.len(),
        series.len(),
        threshold
    );
    Ok(masked)
}
