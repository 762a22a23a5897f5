//! JSON recordings file for the command-line front-end.
//!
//! ```json
//! {
//!   "reference": { "name": "watch", "time": { "timestamps": ["2024-03-01T12:00:00Z", ...] },
//!                  "columns": { "x": [0.1, ...], "y": [...], "z": [...] } },
//!   "candidates": [
//!     { "name": "rcs_left", "time": { "seconds": [0, 15, 30, ...] }, "time_scale": 1000,
//!       "columns": { "x": [0.2, null, ...] } }
//!   ]
//! }
//! ```
//!
//! `null` samples become NaN. `time_scale` divides a numeric time axis, e.g.
//! 1000 for millisecond clocks.

use std::collections::BTreeMap;
use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::series::{RawSeries, TimeAxis};

#[derive(Debug, Clone, Deserialize)]
pub struct AlignmentInput {
    pub reference: SeriesSpec,
    pub candidates: Vec<SeriesSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeriesSpec {
    pub name: String,
    pub time: TimeSpec,
    #[serde(default)]
    pub time_scale: Option<f64>,
    pub columns: BTreeMap<String, Vec<Option<f64>>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeSpec {
    Seconds(Vec<f64>),
    Timestamps(Vec<DateTime<Utc>>),
}

impl SeriesSpec {
    pub fn into_raw(self) -> Result<RawSeries> {
        let time = match (self.time, self.time_scale) {
            (TimeSpec::Seconds(values), None) => TimeAxis::Seconds(values),
            (TimeSpec::Seconds(values), Some(divisor)) => {
                if !(divisor.is_finite() && divisor > 0.0) {
                    bail!("'{}': time_scale must be positive, got {}", self.name, divisor);
                }
                TimeAxis::Seconds(values.into_iter().map(|t| t / divisor).collect())
            }
            (TimeSpec::Timestamps(values), scale) => {
                if scale.is_some() {
                    log::warn!("'{}': time_scale ignored for timestamp axis", self.name);
                }
                TimeAxis::Timestamps(values)
            }
        };

        let columns = self
            .columns
            .into_iter()
            .map(|(column, values)| {
                let values = values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect();
                (column, values)
            })
            .collect();

        Ok(RawSeries {
            name: self.name,
            time,
            columns,
        })
    }
}

impl AlignmentInput {
    pub fn from_json(contents: &str) -> Result<Self> {
        serde_json::from_str(contents).context("Failed to parse recordings")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read recordings from {}", path.display()))?;
        Self::from_json(&contents).with_context(|| format!("In {}", path.display()))
    }

    pub fn into_raw(self) -> Result<(RawSeries, Vec<RawSeries>)> {
        let reference = self.reference.into_raw()?;
        let candidates = self
            .candidates
            .into_iter()
            .map(SeriesSpec::into_raw)
            .collect::<Result<Vec<_>>>()?;
        Ok((reference, candidates))
    }
}
