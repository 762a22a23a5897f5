use chrono::{DateTime, Utc};

use crate::error::{AlignError, Result};

/// Time axis of a raw recording, before it is re-based to elapsed seconds.
#[derive(Debug, Clone, PartialEq)]
pub enum TimeAxis {
    /// Plain numeric axis, already in seconds. Passed through unchanged.
    Seconds(Vec<f64>),
    /// Wall-clock timestamps, converted relative to the shared origin.
    Timestamps(Vec<DateTime<Utc>>),
}

impl TimeAxis {
    pub fn len(&self) -> usize {
        match self {
            TimeAxis::Seconds(values) => values.len(),
            TimeAxis::Timestamps(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn first_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            TimeAxis::Timestamps(values) => values.first().copied(),
            TimeAxis::Seconds(_) => None,
        }
    }
}

/// A recording as handed over by the loader: one time axis and one or more
/// value columns of the same length (e.g. accelerometer x/y/z).
#[derive(Debug, Clone, PartialEq)]
pub struct RawSeries {
    pub name: String,
    pub time: TimeAxis,
    pub columns: Vec<(String, Vec<f64>)>,
}

impl RawSeries {
    pub fn new(name: impl Into<String>, time: TimeAxis) -> Self {
        Self {
            name: name.into(),
            time,
            columns: Vec::new(),
        }
    }

    pub fn with_column(mut self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.columns.push((name.into(), values));
        self
    }
}

/// Canonical series consumed by the alignment engine: elapsed seconds against
/// a median-centred amplitude. Never mutated after preparation; displayed
/// coordinates are derived from it with an offset and a scale.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    times: Vec<f64>,
    values: Vec<f64>,
}

impl TimeSeries {
    /// Build a series from parallel vectors. Times must be finite and strictly
    /// increasing; values may contain NaN for missing samples.
    pub fn new(times: Vec<f64>, values: Vec<f64>) -> Result<Self> {
        Self::validated("series", times, values)
    }

    pub(crate) fn validated(name: &str, times: Vec<f64>, values: Vec<f64>) -> Result<Self> {
        if times.is_empty() {
            return Err(AlignError::malformed(name, "series is empty"));
        }
        if times.len() != values.len() {
            return Err(AlignError::malformed(
                name,
                format!(
                    "time axis has {} samples but values have {}",
                    times.len(),
                    values.len()
                ),
            ));
        }
        if let Some(idx) = times.iter().position(|t| !t.is_finite()) {
            return Err(AlignError::malformed(
                name,
                format!("non-finite time at sample {}", idx),
            ));
        }
        if let Some(idx) = times.windows(2).position(|pair| pair[1] <= pair[0]) {
            return Err(AlignError::malformed(
                name,
                format!(
                    "time axis not strictly increasing at sample {} ({} -> {})",
                    idx + 1,
                    times[idx],
                    times[idx + 1]
                ),
            ));
        }
        Ok(Self { times, values })
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn first_time(&self) -> f64 {
        self.times[0]
    }

    pub fn last_time(&self) -> f64 {
        self.times[self.times.len() - 1]
    }

    /// Samples whose displayed time `t + offset` lies in `(start, end]`.
    ///
    /// Returns `(displayed_time, raw_value)` pairs; scaling is left to the caller.
    pub fn visible(&self, offset: f64, start: f64, end: f64) -> impl Iterator<Item = (f64, f64)> + '_ {
        let lo = self.times.partition_point(|&t| t + offset <= start);
        let hi = self.times.partition_point(|&t| t + offset <= end);
        let hi = hi.max(lo);
        self.times[lo..hi]
            .iter()
            .zip(&self.values[lo..hi])
            .map(move |(&t, &v)| (t + offset, v))
    }

    /// Median spacing between the first `n` samples. `None` with fewer than two.
    pub fn median_interval(&self, n: usize) -> Option<f64> {
        let head = &self.times[..n.min(self.times.len())];
        let diffs: Vec<f64> = head.windows(2).map(|pair| pair[1] - pair[0]).collect();
        super::stats::nan_median(&diffs)
    }
}
