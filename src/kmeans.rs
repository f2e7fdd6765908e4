use crate::algorithm::{Algorithm, AlgorithmKind, Step};
use crate::config::RunConfig;
use crate::dataset::Dataset;
use crate::distance::{assign_to_nearest, compute_centroid_shift, recompute_centroids};
use crate::error::RunError;
use crate::execution::RunState;
use ndarray::{Array2, ArrayView2};
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

/// Stepwise k-means over the dataset's (immutable) locations.
///
/// Each iteration assigns every instance to its nearest centroid, writes the
/// centroid index as the working label, then moves each centroid to the mean
/// of its members. When no centroid moves the run has converged and stops at
/// the next loop check.
///
/// # Example
///
/// ```
/// use datavis::{AlgorithmKind, RunConfig, parse};
/// use datavis::execution::{NoopObserver, Run, RunOutcome, SharedState};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let dataset = parse("@a\tL\t0,0\n@b\tL\t0,1\n@c\tM\t9,9\n@d\tM\t9,8\n").unwrap();
/// let config = RunConfig::default()
///     .with_max_iterations(20)
///     .with_num_clusters(2)
///     .with_pacing(Duration::ZERO)
///     .with_seed(42);
///
/// let state = SharedState::new(dataset);
/// let mut run = Run::new(AlgorithmKind::KMeans.build(config), state.clone(), Arc::new(NoopObserver));
/// run.start().unwrap();
/// assert_eq!(run.join().unwrap(), RunOutcome::SelfTerminated);
///
/// let state = state.read();
/// assert_eq!(state.dataset().label("@a"), state.dataset().label("@b"));
/// assert_ne!(state.dataset().label("@a"), state.dataset().label("@c"));
/// ```
pub struct KMeansClusterer {
    config: RunConfig,

    /// Locations in declaration order, shape (n_instances, 2)
    points: Array2<f64>,

    /// Current centroids, shape (k, 2). Empty until initialized.
    centroids: Array2<f64>,
}

impl KMeansClusterer {
    pub fn new(config: RunConfig) -> Self {
        Self {
            config,
            points: Array2::zeros((0, 2)),
            centroids: Array2::zeros((0, 2)),
        }
    }

    /// Start from the given centroids instead of random seeding. `centroids`
    /// must have one row per configured cluster.
    pub fn with_centroids(config: RunConfig, dataset: &Dataset, centroids: Array2<f64>) -> Self {
        Self {
            config,
            points: points_of(dataset),
            centroids,
        }
    }

    pub fn num_clusters(&self) -> usize {
        self.config.clusters()
    }

    /// Current centroids, one row per cluster
    pub fn centroids(&self) -> ArrayView2<'_, f64> {
        self.centroids.view()
    }

    /// Assignment then recompute. Returns `true` if no centroid moved.
    fn step(&mut self, state: &mut RunState) -> bool {
        let labels = assign_to_nearest(&self.points.view(), &self.centroids.view());

        let dataset = state.dataset_mut();
        for (i, &label) in labels.iter().enumerate() {
            dataset.set_label_at(i, label.to_string());
        }

        let updated = recompute_centroids(&self.points.view(), &labels, &self.centroids.view());
        let unchanged = updated == self.centroids;

        log::debug!(
            "KMeans: shift = {:.6}",
            compute_centroid_shift(&self.centroids.view(), &updated.view())
        );
        self.centroids = updated;
        unchanged
    }
}

fn points_of(dataset: &Dataset) -> Array2<f64> {
    let mut points = Array2::zeros((dataset.len(), 2));
    for (i, location) in dataset.locations().iter().enumerate() {
        points[[i, 0]] = location.x;
        points[[i, 1]] = location.y;
    }
    points
}

/// Pick `k` distinct instances at random and use their locations as centroids
fn initialize_centroids(points: &ArrayView2<f64>, k: usize, rng: &mut ChaCha8Rng) -> Array2<f64> {
    let indices: Vec<usize> = (0..points.nrows()).collect();
    let selected: Vec<usize> = indices.choose_multiple(rng, k).cloned().collect();

    let mut centroids = Array2::zeros((k, points.ncols()));
    for (centroid_idx, &data_idx) in selected.iter().enumerate() {
        centroids.row_mut(centroid_idx).assign(&points.row(data_idx));
    }
    centroids
}

impl Algorithm for KMeansClusterer {
    fn kind(&self) -> AlgorithmKind {
        AlgorithmKind::KMeans
    }

    fn config(&self) -> &RunConfig {
        &self.config
    }

    fn initialize(&mut self, dataset: &Dataset, rng: &mut ChaCha8Rng) -> Result<(), RunError> {
        let k = self.num_clusters();
        if dataset.len() < k {
            return Err(RunError::InsufficientInstances {
                required: k,
                available: dataset.len(),
            });
        }

        self.points = points_of(dataset);
        if self.centroids.nrows() != k {
            self.centroids = initialize_centroids(&self.points.view(), k, rng);
            log::debug!("KMeans: seeded {} centroids from {} instances", k, dataset.len());
        }
        Ok(())
    }

    fn iterate(&mut self, _iteration: usize, state: &mut RunState, _rng: &mut ChaCha8Rng) -> Step {
        if self.step(state) {
            Step::Converged
        } else {
            Step::Continue
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use ndarray::array;
    use rand::SeedableRng;

    fn two_groups() -> Dataset {
        parse("@a\tL\t0,0\n@b\tL\t1,1\n@c\tL\t10,10\n@d\tL\t11,11\n").unwrap()
    }

    #[test]
    fn test_initialize_picks_distinct_instances() {
        let dataset = two_groups();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut kmeans = KMeansClusterer::new(RunConfig::default().with_num_clusters(4));

        kmeans.initialize(&dataset, &mut rng).unwrap();

        let centroids = kmeans.centroids();
        assert_eq!(centroids.nrows(), 4);
        for i in 0..4 {
            for j in (i + 1)..4 {
                assert_ne!(centroids.row(i), centroids.row(j));
            }
        }
    }

    #[test]
    fn test_initialize_with_too_few_instances() {
        let dataset = parse("@a\tL\t0,0\n@b\tL\t1,1\n").unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut kmeans = KMeansClusterer::new(RunConfig::default().with_num_clusters(3));

        assert_eq!(
            kmeans.initialize(&dataset, &mut rng),
            Err(RunError::InsufficientInstances {
                required: 3,
                available: 2
            })
        );
    }

    #[test]
    fn test_step_assigns_and_converges() {
        let dataset = two_groups();
        let config = RunConfig::default().with_num_clusters(2);
        let mut kmeans =
            KMeansClusterer::with_centroids(config, &dataset, array![[0.0, 0.0], [10.0, 10.0]]);
        let mut state = RunState::new(dataset);
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        // First pass moves both centroids to the group means
        assert_eq!(kmeans.iterate(1, &mut state, &mut rng), Step::Continue);
        assert_eq!(kmeans.centroids(), array![[0.5, 0.5], [10.5, 10.5]]);
        assert_eq!(state.dataset().label("@b"), Some("0"));
        assert_eq!(state.dataset().label("@c"), Some("1"));

        // Second pass changes nothing
        assert_eq!(kmeans.iterate(2, &mut state, &mut rng), Step::Converged);
    }

    #[test]
    fn test_equidistant_point_joins_lower_index() {
        let dataset = parse("@m\tL\t5,5\n").unwrap();
        let config = RunConfig::default().with_num_clusters(2);
        let mut kmeans =
            KMeansClusterer::with_centroids(config, &dataset, array![[0.0, 0.0], [10.0, 10.0]]);
        let mut state = RunState::new(dataset);
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        kmeans.iterate(1, &mut state, &mut rng);
        assert_eq!(state.dataset().label("@m"), Some("0"));
        // The empty cluster keeps its centroid
        assert_eq!(kmeans.centroids().row(1), array![10.0, 10.0]);
    }
}
