//! Aligned multi-channel time series.
//!
//! The shared container every stage reads and returns: one strictly
//! increasing timestamp axis and any number of nullable numeric columns keyed
//! by [`ChannelKey`]. Null is `None`; NaN never appears in a column because
//! it is normalized to `None` on insertion.
//!
//! Null propagation: any comparison against a null cell is false, filters
//! leave null cells null, and aggregates skip them.

use crate::constants::FREQUENCY_INFERENCE_WINDOW;
use crate::error::{Result, SanitizeError};
use crate::models::{Channel, ChannelKey, InputId};
use chrono::{DateTime, Duration, NaiveDateTime};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// One nullable cell
pub type Cell = Option<f64>;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TimeSeries {
    index: Vec<NaiveDateTime>,
    columns: BTreeMap<ChannelKey, Vec<Cell>>,
}

impl TimeSeries {
    /// Create an empty-column series over a strictly increasing axis
    pub fn new(index: Vec<NaiveDateTime>) -> Result<Self> {
        if let Some(pos) = index.windows(2).position(|w| w[0] >= w[1]) {
            return Err(SanitizeError::alignment(format!(
                "timestamp axis is not strictly increasing at {} -> {}",
                index[pos],
                index[pos + 1]
            )));
        }
        Ok(Self {
            index,
            columns: BTreeMap::new(),
        })
    }

    /// Build a series from unordered rows.
    ///
    /// Rows are sorted by timestamp and duplicate timestamps are dropped,
    /// keeping the first occurrence. Each row must have one value per key.
    pub fn from_rows(keys: Vec<ChannelKey>, mut rows: Vec<(NaiveDateTime, Vec<Cell>)>) -> Result<Self> {
        if let Some((ts, _)) = rows.iter().find(|(_, values)| values.len() != keys.len()) {
            return Err(SanitizeError::alignment(format!(
                "row at {ts} does not have {} values",
                keys.len()
            )));
        }
        let unique_keys: BTreeSet<&ChannelKey> = keys.iter().collect();
        if unique_keys.len() != keys.len() {
            return Err(SanitizeError::configuration("duplicate column keys"));
        }

        let total = rows.len();
        rows.sort_by_key(|(ts, _)| *ts);
        rows.dedup_by_key(|(ts, _)| *ts);
        if rows.len() < total {
            debug!("Dropped {} duplicate timestamps", total - rows.len());
        }

        let index: Vec<NaiveDateTime> = rows.iter().map(|(ts, _)| *ts).collect();
        let mut series = Self::new(index)?;
        for (col, key) in keys.into_iter().enumerate() {
            let values = rows.iter().map(|(_, values)| values[col]).collect();
            series.insert_column(key, values)?;
        }
        Ok(series)
    }

    pub fn index(&self) -> &[NaiveDateTime] {
        &self.index
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Number of columns
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn cell_count(&self) -> usize {
        self.len() * self.width()
    }

    pub fn null_count(&self) -> usize {
        self.columns
            .values()
            .map(|values| values.iter().filter(|v| v.is_none()).count())
            .sum()
    }

    /// Null cells as a percentage of all cells; 0 for an empty table
    pub fn missing_pct(&self) -> f64 {
        let cells = self.cell_count();
        if cells == 0 {
            0.0
        } else {
            self.null_count() as f64 / cells as f64 * 100.0
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &ChannelKey> {
        self.columns.keys()
    }

    pub fn columns(&self) -> impl Iterator<Item = (&ChannelKey, &[Cell])> {
        self.columns.iter().map(|(k, v)| (k, v.as_slice()))
    }

    /// Distinct inputs that own at least one column
    pub fn inputs(&self) -> BTreeSet<InputId> {
        self.columns.keys().map(ChannelKey::input).collect()
    }

    pub fn contains(&self, key: &ChannelKey) -> bool {
        self.columns.contains_key(key)
    }

    pub fn column(&self, key: &ChannelKey) -> Option<&[Cell]> {
        self.columns.get(key).map(Vec::as_slice)
    }

    pub fn column_mut(&mut self, key: &ChannelKey) -> Option<&mut [Cell]> {
        self.columns.get_mut(key).map(Vec::as_mut_slice)
    }

    /// Insert or replace a column; NaN values become null
    pub fn insert_column(&mut self, key: ChannelKey, values: Vec<Cell>) -> Result<()> {
        if values.len() != self.len() {
            return Err(SanitizeError::alignment(format!(
                "column {key} has {} values but the axis has {} rows",
                values.len(),
                self.len()
            )));
        }
        let values = values
            .into_iter()
            .map(|v| v.filter(|x| !x.is_nan()))
            .collect();
        self.columns.insert(key, values);
        Ok(())
    }

    pub fn remove_column(&mut self, key: &ChannelKey) -> Option<Vec<Cell>> {
        self.columns.remove(key)
    }

    /// Columns belonging to one input, in channel order
    pub fn columns_for<'a>(
        &'a self,
        input: &'a InputId,
    ) -> impl Iterator<Item = (&'a ChannelKey, &'a [Cell])> + 'a {
        self.columns()
            .filter(move |(key, _)| key.belongs_to(input))
    }

    /// Add an all-null column for every missing `(input, channel)` pair
    pub fn ensure_channels<'a>(
        &mut self,
        inputs: impl IntoIterator<Item = &'a InputId>,
        channels: &[Channel],
    ) {
        let rows = self.len();
        for input in inputs {
            for &channel in channels {
                self.columns
                    .entry(input.key(channel))
                    .or_insert_with(|| vec![None; rows]);
            }
        }
    }

    /// Keep only rows whose flag is true
    pub fn select_rows(&self, keep: &[bool]) -> Result<Self> {
        if keep.len() != self.len() {
            return Err(SanitizeError::alignment(format!(
                "row mask has {} entries but the axis has {} rows",
                keep.len(),
                self.len()
            )));
        }
        let index = self
            .index
            .iter()
            .zip(keep)
            .filter_map(|(ts, &k)| k.then_some(*ts))
            .collect();
        let columns = self
            .columns
            .iter()
            .map(|(key, values)| {
                let kept = values
                    .iter()
                    .zip(keep)
                    .filter_map(|(v, &k)| k.then_some(*v))
                    .collect();
                (key.clone(), kept)
            })
            .collect();
        Ok(Self { index, columns })
    }

    /// Re-express the series on another strictly increasing axis.
    ///
    /// Timestamps absent from `self` become null rows.
    pub fn reindex(&self, axis: &[NaiveDateTime]) -> Result<Self> {
        let mut target = Self::new(axis.to_vec())?;
        let positions: Vec<Option<usize>> = {
            let mut positions = Vec::with_capacity(axis.len());
            let mut cursor = 0;
            for ts in axis {
                while cursor < self.index.len() && self.index[cursor] < *ts {
                    cursor += 1;
                }
                if cursor < self.index.len() && self.index[cursor] == *ts {
                    positions.push(Some(cursor));
                } else {
                    positions.push(None);
                }
            }
            positions
        };
        for (key, values) in &self.columns {
            let reindexed = positions
                .iter()
                .map(|pos| pos.and_then(|p| values[p]))
                .collect();
            target.columns.insert(key.clone(), reindexed);
        }
        Ok(target)
    }

    /// Number of timestamps shared with another axis
    pub fn overlap(&self, axis: &[NaiveDateTime]) -> usize {
        let (mut i, mut j, mut shared) = (0, 0, 0);
        while i < self.index.len() && j < axis.len() {
            match self.index[i].cmp(&axis[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    shared += 1;
                    i += 1;
                    j += 1;
                }
            }
        }
        shared
    }

    /// Carry the last observed value forward over nulls
    pub fn forward_fill(&mut self) {
        for values in self.columns.values_mut() {
            let mut last = None;
            for v in values.iter_mut() {
                match v {
                    Some(x) => last = Some(*x),
                    None => *v = last,
                }
            }
        }
    }

    /// Carry the next observed value backward over nulls
    pub fn backward_fill(&mut self) {
        for values in self.columns.values_mut() {
            let mut next = None;
            for v in values.iter_mut().rev() {
                match v {
                    Some(x) => next = Some(*x),
                    None => *v = next,
                }
            }
        }
    }

    /// Null every cell for which `invalid` returns true; returns cells nulled
    pub fn null_where(&mut self, invalid: impl Fn(f64) -> bool) -> usize {
        let mut nulled = 0;
        for values in self.columns.values_mut() {
            for v in values.iter_mut() {
                if v.is_some_and(&invalid) {
                    *v = None;
                    nulled += 1;
                }
            }
        }
        nulled
    }

    /// Mean-resample onto bins of `resolution`, labelled by bin start.
    ///
    /// Every bin between the first and last observation is emitted; bins
    /// without observations are null.
    pub fn resample_mean(&self, resolution: Duration) -> Result<Self> {
        let step = resolution.num_seconds();
        if step <= 0 {
            return Err(SanitizeError::insufficient_frequency(format!(
                "cannot resample to a non-positive resolution of {step}s"
            )));
        }
        let (Some(first), Some(last)) = (self.index.first(), self.index.last()) else {
            return Ok(self.clone());
        };

        let start = floor_to(*first, step)?;
        let end = floor_to(*last, step)?;
        let bins = ((end - start).num_seconds() / step) as usize + 1;
        let index: Vec<NaiveDateTime> = (0..bins)
            .map(|b| start + Duration::seconds(b as i64 * step))
            .collect();
        let bin_of: Vec<usize> = self
            .index
            .iter()
            .map(|ts| floor_to(*ts, step).map(|f| ((f - start).num_seconds() / step) as usize))
            .collect::<Result<_>>()?;

        let mut resampled = Self::new(index)?;
        for (key, values) in &self.columns {
            let mut sums = vec![0.0; bins];
            let mut counts = vec![0usize; bins];
            for (&bin, value) in bin_of.iter().zip(values) {
                if let Some(x) = value {
                    sums[bin] += x;
                    counts[bin] += 1;
                }
            }
            let means = sums
                .into_iter()
                .zip(counts)
                .map(|(sum, n)| (n > 0).then(|| sum / n as f64))
                .collect();
            resampled.columns.insert(key.clone(), means);
        }
        Ok(resampled)
    }
}

/// Floor a timestamp to a multiple of `step_secs` since the Unix epoch
fn floor_to(ts: NaiveDateTime, step_secs: i64) -> Result<NaiveDateTime> {
    let secs = ts.and_utc().timestamp();
    let floored = secs - secs.rem_euclid(step_secs);
    DateTime::from_timestamp(floored, 0)
        .map(|dt| dt.naive_utc())
        .ok_or_else(|| SanitizeError::alignment(format!("timestamp {ts} out of range")))
}

/// Infer the sampling step from the leading deltas of an axis.
///
/// The first [`FREQUENCY_INFERENCE_WINDOW`] deltas must all be equal.
pub fn infer_resolution(index: &[NaiveDateTime]) -> Result<Duration> {
    if index.len() < 2 {
        return Err(SanitizeError::insufficient_frequency(format!(
            "need at least two timestamps, found {}",
            index.len()
        )));
    }
    let window = &index[..index.len().min(FREQUENCY_INFERENCE_WINDOW + 1)];
    let first = window[1] - window[0];
    if first <= Duration::zero() {
        return Err(SanitizeError::insufficient_frequency(
            "timestamps are not increasing",
        ));
    }
    if window.windows(2).any(|w| w[1] - w[0] != first) {
        return Err(SanitizeError::insufficient_frequency(
            "no discernible sampling frequency in the leading timestamps",
        ));
    }
    Ok(first)
}

/// Resolve a declared resolution in minutes, inferring it when absent
pub fn resolve_resolution(declared_min: Option<u32>, index: &[NaiveDateTime]) -> Result<Duration> {
    match declared_min {
        Some(minutes) => Ok(Duration::minutes(minutes as i64)),
        None => infer_resolution(index),
    }
}
