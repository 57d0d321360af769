//! Seeded k-means clustering.
//!
//! k-means++ seeding followed by Lloyd iterations, repeated `n_init` times
//! with the lowest-inertia run kept. Convergence uses a tolerance relative
//! to the mean per-axis variance of the data, so the same `tol` works for
//! degrees and for magnitudes.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::error::{Error, Result};

/// Configuration for [`kmeans`].
#[derive(Debug, Clone)]
pub struct KMeansConfig {
    pub n_clusters: usize,
    /// Number of independent seedings; the best by inertia wins.
    pub n_init: usize,
    /// Maximum Lloyd iterations per seeding.
    pub max_iter: usize,
    /// Relative tolerance on the squared centroid shift.
    pub tol: f64,
    pub seed: u64,
}

impl Default for KMeansConfig {
    fn default() -> Self {
        Self {
            n_clusters: 6,
            n_init: 10,
            max_iter: 300,
            tol: 1e-4,
            seed: 0,
        }
    }
}

/// Output of a clustering run.
#[derive(Debug, Clone)]
pub struct KMeansResult<const D: usize> {
    pub centroids: Vec<[f64; D]>,
    /// Cluster label of each input point.
    pub labels: Vec<usize>,
    /// Sum of squared distances of points to their centroid.
    pub inertia: f64,
    /// Lloyd iterations used by the winning seeding.
    pub n_iter: usize,
}

fn dist_sq<const D: usize>(a: &[f64; D], b: &[f64; D]) -> f64 {
    let mut s = 0.0;
    for i in 0..D {
        let d = a[i] - b[i];
        s += d * d;
    }
    s
}

/// Index of and squared distance to the closest centroid.
pub fn nearest<const D: usize>(point: &[f64; D], centroids: &[[f64; D]]) -> Option<(usize, f64)> {
    centroids
        .iter()
        .enumerate()
        .map(|(i, c)| (i, dist_sq(point, c)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
}

/// Mean of the per-axis variances, used to scale the tolerance.
fn mean_variance<const D: usize>(points: &[[f64; D]]) -> f64 {
    let n = points.len() as f64;
    let mut total = 0.0;
    for axis in 0..D {
        let mean = points.iter().map(|p| p[axis]).sum::<f64>() / n;
        total += points.iter().map(|p| (p[axis] - mean).powi(2)).sum::<f64>() / n;
    }
    total / D as f64
}

/// k-means++ seeding: each new centre is drawn with probability
/// proportional to the squared distance to the closest existing centre.
fn kmeans_pp_init<const D: usize>(
    points: &[[f64; D]],
    k: usize,
    rng: &mut StdRng,
) -> Vec<[f64; D]> {
    let mut centroids = Vec::with_capacity(k);
    centroids.push(points[rng.random_range(0..points.len())]);

    let mut min_dist: Vec<f64> = points.iter().map(|p| dist_sq(p, &centroids[0])).collect();
    while centroids.len() < k {
        let total: f64 = min_dist.iter().sum();
        let next = if total > 0.0 {
            let target = rng.random::<f64>() * total;
            let mut acc = 0.0;
            let mut chosen = points.len() - 1;
            for (i, &d) in min_dist.iter().enumerate() {
                acc += d;
                if acc >= target && d > 0.0 {
                    chosen = i;
                    break;
                }
            }
            chosen
        } else {
            // All points coincide with existing centres.
            rng.random_range(0..points.len())
        };

        let c = points[next];
        for (d, p) in min_dist.iter_mut().zip(points) {
            *d = d.min(dist_sq(p, &c));
        }
        centroids.push(c);
    }
    centroids
}

fn lloyd<const D: usize>(
    points: &[[f64; D]],
    mut centroids: Vec<[f64; D]>,
    max_iter: usize,
    tol: f64,
) -> KMeansResult<D> {
    let k = centroids.len();
    let mut labels = vec![0usize; points.len()];
    let mut n_iter = 0;

    for iter in 0..max_iter {
        n_iter = iter + 1;
        for (label, p) in labels.iter_mut().zip(points) {
            *label = nearest(p, &centroids).map_or(0, |(i, _)| i);
        }

        let mut sums = vec![[0.0; D]; k];
        let mut counts = vec![0usize; k];
        for (&label, p) in labels.iter().zip(points) {
            counts[label] += 1;
            for axis in 0..D {
                sums[label][axis] += p[axis];
            }
        }

        let mut new_centroids = centroids.clone();
        for c in 0..k {
            if counts[c] > 0 {
                for axis in 0..D {
                    new_centroids[c][axis] = sums[c][axis] / counts[c] as f64;
                }
            } else {
                // Empty cluster: restart it on the point worst served by its centre.
                let far = points
                    .iter()
                    .zip(&labels)
                    .map(|(p, &l)| dist_sq(p, &centroids[l]))
                    .enumerate()
                    .max_by(|a, b| a.1.total_cmp(&b.1))
                    .map_or(0, |(i, _)| i);
                new_centroids[c] = points[far];
            }
        }

        let shift: f64 = centroids
            .iter()
            .zip(&new_centroids)
            .map(|(a, b)| dist_sq(a, b))
            .sum();
        centroids = new_centroids;
        if shift <= tol {
            break;
        }
    }

    let mut inertia = 0.0;
    for (label, p) in labels.iter_mut().zip(points) {
        let (i, d) = nearest(p, &centroids).unwrap_or((0, 0.0));
        *label = i;
        inertia += d;
    }

    KMeansResult {
        centroids,
        labels,
        inertia,
        n_iter,
    }
}

/// Cluster `points` into `config.n_clusters` groups.
pub fn kmeans<const D: usize>(
    points: &[[f64; D]],
    config: &KMeansConfig,
) -> Result<KMeansResult<D>> {
    let k = config.n_clusters;
    if k == 0 {
        return Err(Error::InvalidArgument(
            "k-means needs at least one cluster".to_string(),
        ));
    }
    if points.len() < k {
        return Err(Error::InvalidArgument(format!(
            "k-means with {k} clusters needs at least {k} points, got {}",
            points.len()
        )));
    }
    if points.iter().flatten().any(|v| !v.is_finite()) {
        return Err(Error::InvalidArgument(
            "k-means input contains non-finite coordinates".to_string(),
        ));
    }

    let tol = config.tol * mean_variance(points);
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut best: Option<KMeansResult<D>> = None;
    for run in 0..config.n_init.max(1) {
        let init = kmeans_pp_init(points, k, &mut rng);
        let result = lloyd(points, init, config.max_iter, tol);
        debug!(
            "k-means run {run}: inertia={:.6e} after {} iterations",
            result.inertia, result.n_iter
        );
        if best.as_ref().is_none_or(|b| result.inertia < b.inertia) {
            best = Some(result);
        }
    }

    best.ok_or_else(|| Error::InvalidArgument("k-means produced no result".to_string()))
}
