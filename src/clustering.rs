use crate::algorithm::{Algorithm, AlgorithmKind, Step};
use crate::config::RunConfig;
use crate::execution::RunState;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

/// Baseline clusterer that relabels every instance uniformly at random with
/// one of `"0"..numClusters-1` each iteration. Never stops early.
pub struct RandomClustering {
    config: RunConfig,
    tokens: Vec<String>,
}

impl RandomClustering {
    pub fn new(config: RunConfig) -> Self {
        let tokens = (0..config.clusters()).map(|i| i.to_string()).collect();
        Self { config, tokens }
    }

    pub fn num_clusters(&self) -> usize {
        self.tokens.len()
    }
}

impl Algorithm for RandomClustering {
    fn kind(&self) -> AlgorithmKind {
        AlgorithmKind::RandomClustering
    }

    fn config(&self) -> &RunConfig {
        &self.config
    }

    fn iterate(&mut self, _iteration: usize, state: &mut RunState, rng: &mut ChaCha8Rng) -> Step {
        let dataset = state.dataset_mut();
        for i in 0..dataset.len() {
            if let Some(token) = self.tokens.choose(rng) {
                dataset.set_label_at(i, token.clone());
            }
        }
        Step::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use rand::SeedableRng;

    #[test]
    fn test_labels_use_cluster_tokens() {
        let dataset = parse("@a\tL\t1,1\n@b\tL\t2,2\n@c\tM\t3,3\n@d\tnull\t4,4\n").unwrap();
        let mut state = RunState::new(dataset);
        let mut clustering = RandomClustering::new(RunConfig::default().with_num_clusters(3));
        let mut rng = ChaCha8Rng::seed_from_u64(11);

        for iteration in 1..=20 {
            assert_eq!(
                clustering.iterate(iteration, &mut state, &mut rng),
                Step::Continue
            );
            for label in state.dataset().labels() {
                assert!(["0", "1", "2"].contains(&label.as_str()));
            }
        }
        // Original labels are untouched
        assert_eq!(state.dataset().original_label("@c"), Some("M"));
    }

    #[test]
    fn test_token_count_matches_config() {
        let clustering = RandomClustering::new(RunConfig::default().with_num_clusters(4));
        assert_eq!(clustering.num_clusters(), 4);
    }
}
