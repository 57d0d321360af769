//! Grid construction and bin lookup with numpy/scipy semantics.
//!
//! The completeness kernel and the Hess diagrams were tabulated with numpy,
//! so edge handling here follows `numpy.linspace`, `numpy.arange`,
//! `numpy.digitize` and `scipy.stats.binned_statistic_2d` exactly rather
//! than rounding to "nice" bins.

use ndarray::Array2;

use crate::error::{Error, Result};

/// Upper limit on the number of values [`arange`] will produce.
pub const MAX_BINS: usize = 1_000_000;

/// `num` evenly spaced samples from `start` to `stop` inclusive.
///
/// The final sample is exactly `stop`, as in `numpy.linspace`.
pub fn linspace(start: f64, stop: f64, num: usize) -> Vec<f64> {
    match num {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (num - 1) as f64;
            let mut out: Vec<f64> = (0..num).map(|i| start + i as f64 * step).collect();
            out[num - 1] = stop;
            out
        }
    }
}

/// Values `start + i * step` for `i` in `0..ceil((stop - start) / step)`.
pub fn arange(start: f64, stop: f64, step: f64) -> Result<Vec<f64>> {
    if !step.is_finite() || step <= 0.0 {
        return Err(Error::InvalidArgument(format!(
            "bin step must be positive and finite, got {step}"
        )));
    }
    let n = ((stop - start) / step).ceil().max(0.0);
    if !n.is_finite() || n > MAX_BINS as f64 {
        return Err(Error::InvalidArgument(format!(
            "range [{start}, {stop}) with step {step} exceeds {MAX_BINS} values"
        )));
    }
    let n = n as usize;
    Ok((0..n).map(|i| start + i as f64 * step).collect())
}

/// Bin edges from `min` to `max` in steps of `step`, including `max`.
///
/// Built as `arange(min, max + step / 2, step)` so that floating-point
/// accumulation cannot drop the upper edge.
pub fn edges(min: f64, max: f64, step: f64) -> Result<Vec<f64>> {
    if !min.is_finite() || !max.is_finite() {
        return Err(Error::InvalidArgument(format!(
            "bin range must be finite, got ({min}, {max})"
        )));
    }
    if min >= max {
        return Err(Error::InvalidArgument(format!(
            "bin range must satisfy min < max, got ({min}, {max})"
        )));
    }
    arange(min, max + step / 2.0, step)
}

/// Index of the bin containing `x`, as returned by `numpy.digitize`.
///
/// For increasing `bins` the result `i` satisfies
/// `bins[i-1] <= x < bins[i]`; for decreasing `bins` it satisfies
/// `bins[i-1] > x >= bins[i]`. Values beyond either end give `0` or
/// `bins.len()`. NaN sorts after every edge: it gives `bins.len()` for
/// increasing bins and `0` for decreasing ones.
pub fn digitize(x: f64, bins: &[f64]) -> usize {
    let n = bins.len();
    let increasing = n < 2 || bins[0] <= bins[n - 1];
    if x.is_nan() {
        return if increasing { n } else { 0 };
    }
    if increasing {
        bins.partition_point(|&b| b <= x)
    } else {
        n - bins.iter().rev().take_while(|&&b| b <= x).count()
    }
}

/// `numpy.around`: round half to even at `decimals` places.
fn around(x: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (x * scale).round_ties_even() / scale
}

/// Decimal places used to decide whether a sample sits on the last edge:
/// `int(-log10(min bin width)) + 6`.
fn edge_decimals(edges: &[f64]) -> i32 {
    let min_width = edges
        .windows(2)
        .map(|w| w[1] - w[0])
        .fold(f64::INFINITY, f64::min);
    (-min_width.log10()) as i32 + 6
}

/// Bin position of `x` among `edges`, scipy style: right-open bins with the
/// last bin closed on the right, where "on the right edge" is judged after
/// rounding to `decimals` places. `None` if `x` lies outside or is NaN.
fn bin_of(x: f64, edges: &[f64], decimals: i32) -> Option<usize> {
    let n = edges.len();
    if n < 2 || x.is_nan() {
        return None;
    }
    let last = edges[n - 1];
    if x >= last && around(x, decimals) == around(last, decimals) {
        return Some(n - 2);
    }
    match digitize(x, edges) {
        0 => None,
        i if i == n => None,
        i => Some(i - 1),
    }
}

/// Compute a statistic over the samples falling in each 2D bin.
///
/// `statistic` receives the indices of the samples in a bin and is called
/// for every bin, including empty ones. The result has shape
/// `(x_edges.len() - 1, y_edges.len() - 1)`.
pub fn binned_statistic_2d<F>(
    x: &[f64],
    y: &[f64],
    x_edges: &[f64],
    y_edges: &[f64],
    mut statistic: F,
) -> Result<Array2<f64>>
where
    F: FnMut(&[usize]) -> f64,
{
    if x.len() != y.len() {
        return Err(Error::InvalidArgument(format!(
            "x and y sample counts differ: {} vs {}",
            x.len(),
            y.len()
        )));
    }
    if x_edges.len() < 2 || y_edges.len() < 2 {
        return Err(Error::InvalidArgument(
            "at least two edges are needed along each axis".to_string(),
        ));
    }

    let nx = x_edges.len() - 1;
    let ny = y_edges.len() - 1;
    let x_decimals = edge_decimals(x_edges);
    let y_decimals = edge_decimals(y_edges);
    let mut members: Vec<Vec<usize>> = vec![Vec::new(); nx * ny];
    for (i, (&xv, &yv)) in x.iter().zip(y).enumerate() {
        let bx = bin_of(xv, x_edges, x_decimals);
        let by = bin_of(yv, y_edges, y_decimals);
        if let (Some(bx), Some(by)) = (bx, by) {
            members[bx * ny + by].push(i);
        }
    }

    Ok(Array2::from_shape_fn((nx, ny), |(bx, by)| {
        statistic(&members[bx * ny + by])
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64, tol: f64) {
        assert!(
            (a - b).abs() < tol,
            "expected {a} ~= {b} (diff = {})",
            (a - b).abs()
        );
    }

    #[test]
    fn linspace_endpoints() {
        let ly = linspace(31.5, 22.5, 91);
        assert_eq!(ly.len(), 91);
        assert_eq!(ly[0], 31.5);
        assert_eq!(ly[90], 22.5);
        assert_close(ly[45], 27.0, 1e-12);

        let lx = linspace(-1.1, 0.4, 16);
        assert_eq!(lx[15], 0.4);
        assert_close(lx[11], 0.0, 1e-12);
    }

    #[test]
    fn edges_include_upper_bound() {
        let e = edges(18.0, 20.0, 0.5).unwrap();
        assert_eq!(e, vec![18.0, 18.5, 19.0, 19.5, 20.0]);

        let e = edges(20.0, 28.0, 0.1).unwrap();
        assert_eq!(e.len(), 81);
        assert_close(*e.last().unwrap(), 28.0, 1e-9);

        let e = edges(-1.0, 4.0, 0.25).unwrap();
        assert_eq!(e.len(), 21);
        assert_eq!(*e.last().unwrap(), 4.0);
    }

    #[test]
    fn edges_reject_bad_ranges() {
        assert!(edges(20.0, 18.0, 0.5).is_err());
        assert!(edges(18.0, 20.0, 0.0).is_err());
        assert!(edges(18.0, 20.0, -0.5).is_err());
        assert!(edges(18.0, 20.0, f64::NAN).is_err());
        assert!(edges(f64::NAN, 20.0, 0.5).is_err());
    }

    #[test]
    fn edges_reject_unbounded_grids() {
        assert!(matches!(
            edges(0.0, f64::INFINITY, 0.1),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            edges(f64::NEG_INFINITY, 0.0, 0.1),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            edges(0.0, 1e9, 1e-6),
            Err(Error::InvalidArgument(_))
        ));
        assert!(arange(0.0, 1.0, 1e-300).is_err());
        assert_eq!(edges(0.0, 100.0, 0.001).unwrap().len(), 100_001);
    }

    #[test]
    fn digitize_increasing() {
        let bins = [0.0, 1.0, 2.0, 3.0];
        assert_eq!(digitize(-0.5, &bins), 0);
        assert_eq!(digitize(0.0, &bins), 1);
        assert_eq!(digitize(0.5, &bins), 1);
        assert_eq!(digitize(1.0, &bins), 2);
        assert_eq!(digitize(3.0, &bins), 4);
        assert_eq!(digitize(7.0, &bins), 4);
        assert_eq!(digitize(f64::NAN, &bins), 4);
    }

    #[test]
    fn digitize_decreasing() {
        let bins = [3.0, 2.0, 1.0, 0.0];
        // bins[i-1] > x >= bins[i]
        assert_eq!(digitize(3.5, &bins), 0);
        assert_eq!(digitize(3.0, &bins), 0);
        assert_eq!(digitize(2.5, &bins), 1);
        assert_eq!(digitize(2.0, &bins), 1);
        assert_eq!(digitize(0.0, &bins), 3);
        assert_eq!(digitize(-1.0, &bins), 4);
        assert_eq!(digitize(f64::NAN, &bins), 0);
    }

    #[test]
    fn binned_counts_and_right_edge() {
        let x_edges = [0.0, 1.0, 2.0];
        let y_edges = [0.0, 10.0];
        let x = [0.0, 0.5, 1.0, 2.0, 2.5, f64::NAN];
        let y = [5.0, 5.0, 5.0, 10.0, 5.0, 5.0];

        let counts =
            binned_statistic_2d(&x, &y, &x_edges, &y_edges, |idx| idx.len() as f64).unwrap();
        assert_eq!(counts.dim(), (2, 1));
        assert_eq!(counts[[0, 0]], 2.0);
        // x = 1.0 opens the second bin; x = 2.0 and y = 10.0 sit on the closed right edges.
        assert_eq!(counts[[1, 0]], 2.0);
    }

    #[test]
    fn right_edge_tolerates_rounding_drift() {
        let x_edges = [0.0, 1.0, 2.0];
        let y_edges = [0.0, 1.0];
        // Drift below 1e-6 of the bin width still lands in the closed last bin.
        let x = [2.0 + 1e-12, 2.0 + 1e-3, -1e-12];
        let y = [0.5, 0.5, 0.5];
        let counts =
            binned_statistic_2d(&x, &y, &x_edges, &y_edges, |idx| idx.len() as f64).unwrap();
        assert_eq!(counts[[1, 0]], 1.0);
        assert_eq!(counts[[0, 0]], 0.0);
    }

    #[test]
    fn binned_statistic_sees_empty_bins() {
        let x_edges = [0.0, 1.0, 2.0];
        let y_edges = [0.0, 1.0, 2.0];
        let x = [0.5];
        let y = [1.5];
        let out = binned_statistic_2d(&x, &y, &x_edges, &y_edges, |idx| {
            if idx.is_empty() { f64::NAN } else { 1.0 }
        })
        .unwrap();
        assert_eq!(out[[0, 1]], 1.0);
        assert!(out[[0, 0]].is_nan());
        assert!(out[[1, 0]].is_nan());
        assert!(out[[1, 1]].is_nan());
    }

    #[test]
    fn binned_statistic_length_mismatch() {
        let res = binned_statistic_2d(&[0.0], &[], &[0.0, 1.0], &[0.0, 1.0], |_| 0.0);
        assert!(matches!(res, Err(Error::InvalidArgument(_))));
    }
}
