use chrono::{DateTime, Utc};

use crate::error::{AlignError, Result};
use crate::series::stats::nan_median;
use crate::series::types::{RawSeries, TimeAxis, TimeSeries};

/// Reference plus candidates, all re-based onto the reference's origin.
#[derive(Debug, Clone)]
pub struct PreparedStreams {
    pub reference: TimeSeries,
    pub candidates: Vec<(String, TimeSeries)>,
}

/// Normalize one raw recording into the engine's canonical form.
///
/// Amplitude is the per-sample magnitude of all columns minus its median;
/// time is elapsed seconds since `origin` for timestamp axes, untouched for
/// numeric ones. A timestamp axis without a shared origin falls back to its
/// own first sample.
pub fn prepare_stream(raw: &RawSeries, origin: Option<DateTime<Utc>>) -> Result<TimeSeries> {
    if raw.time.is_empty() {
        return Err(AlignError::malformed(&raw.name, "series is empty"));
    }
    if raw.columns.is_empty() {
        return Err(AlignError::malformed(&raw.name, "series has no value columns"));
    }
    for (column, values) in &raw.columns {
        if values.len() != raw.time.len() {
            return Err(AlignError::malformed(
                &raw.name,
                format!(
                    "column '{}' has {} samples, time axis has {}",
                    column,
                    values.len(),
                    raw.time.len()
                ),
            ));
        }
    }

    let magnitude = column_magnitude(&raw.columns);
    let center = nan_median(&magnitude).unwrap_or(0.0);
    let centered: Vec<f64> = magnitude.iter().map(|v| v - center).collect();

    let times = elapsed_seconds(&raw.time, origin);
    TimeSeries::validated(&raw.name, times, centered)
}

/// Prepare the reference and every candidate against the reference's first
/// timestamp.
pub fn prepare_all(reference: &RawSeries, candidates: &[RawSeries]) -> Result<PreparedStreams> {
    let origin = reference.time.first_timestamp();
    let prepared_reference = prepare_stream(reference, origin)?;

    let prepared_candidates = candidates
        .iter()
        .map(|raw| prepare_stream(raw, origin).map(|series| (raw.name.clone(), series)))
        .collect::<Result<Vec<_>>>()?;

    Ok(PreparedStreams {
        reference: prepared_reference,
        candidates: prepared_candidates,
    })
}

/// Euclidean norm across columns. A single column is returned as-is so that
/// signed signals keep their sign.
fn column_magnitude(columns: &[(String, Vec<f64>)]) -> Vec<f64> {
    if let [(_, only)] = columns {
        return only.clone();
    }

    let len = columns[0].1.len();
    (0..len)
        .map(|i| {
            columns
                .iter()
                .map(|(_, values)| values[i] * values[i])
                .sum::<f64>()
                .sqrt()
        })
        .collect()
}

fn elapsed_seconds(axis: &TimeAxis, origin: Option<DateTime<Utc>>) -> Vec<f64> {
    match axis {
        TimeAxis::Seconds(values) => values.clone(),
        TimeAxis::Timestamps(values) => {
            let start = origin.unwrap_or(values[0]);
            values
                .iter()
                .map(|t| {
                    let delta = *t - start;
                    match delta.num_nanoseconds() {
                        Some(nanos) => nanos as f64 / 1e9,
                        None => delta.num_milliseconds() as f64 / 1e3,
                    }
                })
                .collect()
        }
    }
}
