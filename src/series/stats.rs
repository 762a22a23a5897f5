//! NaN-aware statistics shared by preparation and the transform engine.
//!
//! Missing samples are carried as NaN all the way through, so every helper
//! here skips non-finite values instead of propagating them.

/// Median of the finite values, or `None` when there are none.
pub fn nan_median(values: &[f64]) -> Option<f64> {
    let mut finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return None;
    }
    finite.sort_by(|a, b| a.total_cmp(b));

    let mid = finite.len() / 2;
    if finite.len() % 2 == 0 {
        Some((finite[mid - 1] + finite[mid]) / 2.0)
    } else {
        Some(finite[mid])
    }
}

/// Smallest and largest finite value.
pub fn finite_min_max<I>(values: I) -> Option<(f64, f64)>
where
    I: IntoIterator<Item = f64>,
{
    values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Population standard deviation of the finite values.
pub fn finite_stdev<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    // Welford's update keeps this single-pass.
    let mut count = 0u64;
    let mut mean = 0.0;
    let mut m2 = 0.0;
    for v in values.into_iter().filter(|v| v.is_finite()) {
        count += 1;
        let delta = v - mean;
        mean += delta / count as f64;
        m2 += delta * (v - mean);
    }
    if count == 0 {
        None
    } else {
        Some((m2 / count as f64).sqrt())
    }
}
