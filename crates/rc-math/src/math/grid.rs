//! Evenly spaced grids.

/// `n` evenly spaced points from `low` to `high`, both inclusive.
///
/// `n == 1` yields `[low]`; `n == 0` yields an empty vector. The last point is
/// exactly `high` so rounding never pushes it past the bound.
pub fn linspace(low: f64, high: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![low],
        _ => {
            let step = (high - low) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { high } else { low + step * i as f64 })
                .collect()
        }
    }
}
