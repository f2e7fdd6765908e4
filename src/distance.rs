use ndarray::{Array2, ArrayView1, ArrayView2};
use rayon::prelude::*;

/// Euclidean distance between two rows
#[inline]
pub fn euclidean(a: &ArrayView1<f64>, b: &ArrayView1<f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

/// Index of the centroid nearest to `point`.
///
/// Uses a strict `<` comparison, so on ties the lowest index wins.
pub fn nearest_centroid(point: &ArrayView1<f64>, centroids: &ArrayView2<f64>) -> usize {
    let mut best_dist = f64::INFINITY;
    let mut best = 0;

    for (j, centroid) in centroids.outer_iter().enumerate() {
        let dist = euclidean(point, &centroid);
        if dist < best_dist {
            best_dist = dist;
            best = j;
        }
    }

    best
}

/// Assign every row of `points` to its nearest centroid
pub fn assign_to_nearest(points: &ArrayView2<f64>, centroids: &ArrayView2<f64>) -> Vec<usize> {
    (0..points.nrows())
        .into_par_iter()
        .map(|i| nearest_centroid(&points.row(i), centroids))
        .collect()
}

/// Component-wise mean of the points assigned to each cluster.
///
/// A cluster with no members keeps its centroid from `previous`.
pub fn recompute_centroids(
    points: &ArrayView2<f64>,
    labels: &[usize],
    previous: &ArrayView2<f64>,
) -> Array2<f64> {
    let k = previous.nrows();
    let n_features = previous.ncols();

    let mut sums: Array2<f64> = Array2::zeros((k, n_features));
    let mut counts = vec![0usize; k];

    for (point, &label) in points.outer_iter().zip(labels) {
        counts[label] += 1;
        for j in 0..n_features {
            sums[[label, j]] += point[j];
        }
    }

    let mut centroids = previous.to_owned();
    for (cluster_idx, &count) in counts.iter().enumerate() {
        if count > 0 {
            for j in 0..n_features {
                centroids[[cluster_idx, j]] = sums[[cluster_idx, j]] / count as f64;
            }
        }
    }

    centroids
}

/// Sum of the distances each centroid moved
pub fn compute_centroid_shift(old_centroids: &ArrayView2<f64>, new_centroids: &ArrayView2<f64>) -> f64 {
    old_centroids
        .outer_iter()
        .zip(new_centroids.outer_iter())
        .map(|(old_c, new_c)| euclidean(&old_c, &new_c))
        .sum()
}
