//! Pure viewport and hypothesis arithmetic behind the operator commands.
//!
//! Nothing here touches session state; the controller feeds in the current
//! viewport/hypothesis and stores whatever comes back.

use serde::Serialize;

use crate::error::{AlignError, Result};
use crate::series::stats::{finite_min_max, finite_stdev};

/// Visible time window in elapsed seconds. Always finite with `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    start: f64,
    end: f64,
}

impl Viewport {
    pub fn new(start: f64, end: f64) -> Option<Self> {
        if start.is_finite() && end.is_finite() && start < end {
            Some(Self { start, end })
        } else {
            None
        }
    }

    /// Smallest window containing both `[a_start, a_end]` and
    /// `[b_start, b_end]`. Two single-sample series at the same instant get a
    /// one-second window around that instant.
    pub fn covering(a: (f64, f64), b: (f64, f64)) -> Self {
        let start = a.0.min(b.0);
        let end = a.1.max(b.1);
        Self::new(start, end).unwrap_or(Self {
            start: start - 0.5,
            end: start + 0.5,
        })
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn width(&self) -> f64 {
        self.end - self.start
    }

    pub fn center(&self) -> f64 {
        self.start + self.width() / 2.0
    }

    /// Trim `width / (2 * factor)` from each side.
    pub fn zoomed_in(&self, factor: f64) -> Self {
        let indent = self.width() / (factor * 2.0);
        Self::new(self.start + indent, self.end - indent).unwrap_or(*self)
    }

    /// Inverse of [`Viewport::zoomed_in`] for the same factor.
    pub fn zoomed_out(&self, factor: f64) -> Self {
        let new_width = self.width() / (1.0 - 1.0 / factor);
        let un_indent = new_width / (2.0 * factor);
        Self::new(self.start - un_indent, self.end + un_indent).unwrap_or(*self)
    }

    pub fn panned(&self, delta: f64) -> Self {
        Self::new(self.start + delta, self.end + delta).unwrap_or(*self)
    }

    pub fn look_step(&self, look_factor: f64) -> f64 {
        self.width() / look_factor
    }

    pub fn shift_step(&self, shift_factor: f64) -> f64 {
        self.width() / shift_factor
    }
}

/// Round an offset the way it is displayed and committed.
pub fn round_offset(offset: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    (offset * scale).round() / scale
}

/// Y-axis limits for the visible amplitudes of every plotted stream.
///
/// Streams with no finite samples are skipped. Fails with `DegenerateRange`
/// when nothing finite is left or the limits would not span a range.
pub fn amplitude_range<'a, I>(visible: I) -> Result<(f64, f64)>
where
    I: IntoIterator<Item = &'a [f64]>,
{
    let mut minima = Vec::new();
    let mut maxima = Vec::new();
    for amplitudes in visible {
        if let Some((lo, hi)) = finite_min_max(amplitudes.iter().copied()) {
            minima.push(lo);
            maxima.push(hi);
        }
    }

    let lowest = minima.into_iter().reduce(f64::min);
    let highest = maxima.into_iter().reduce(f64::max);
    let (lowest, highest) = match (lowest, highest) {
        (Some(lo), Some(hi)) => (lo, hi),
        _ => return Err(AlignError::DegenerateRange),
    };

    let ymax = 1.1 * highest;
    let ymin = if lowest < 0.0 { 1.1 * lowest } else { 0.9 * lowest };
    if ymin < ymax {
        Ok((ymin, ymax))
    } else {
        Err(AlignError::DegenerateRange)
    }
}

/// Scale that matches the aligning stream's spread to the reference's.
///
/// `None` when either side has nothing finite in view or the aligning stream
/// is flat.
pub fn auto_scale<R, A>(reference_visible: R, aligning_visible: A) -> Option<f64>
where
    R: IntoIterator<Item = f64>,
    A: IntoIterator<Item = f64>,
{
    let reference_sd = finite_stdev(reference_visible)?;
    let aligning_sd = finite_stdev(aligning_visible)?;
    let scale = reference_sd / aligning_sd;
    if scale.is_finite() && scale > 0.0 {
        Some(scale)
    } else {
        None
    }
}
