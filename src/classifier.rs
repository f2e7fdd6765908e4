use crate::algorithm::{Algorithm, AlgorithmKind, Line, Step};
use crate::config::RunConfig;
use crate::execution::RunState;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

/// Fraction of the budget after which early stopping may happen
const EARLY_STOP_AFTER: f64 = 0.6;

/// Chance of stopping on each iteration past [`EARLY_STOP_AFTER`]
const EARLY_STOP_PROBABILITY: f64 = 0.05;

/// Baseline classifier that proposes a random line each iteration.
///
/// The line is `a·x + 10·y + c = 0` with integer `a` in `[-20, 0]` and `c`
/// in `[0, 10]`. It ignores the data entirely.
pub struct RandomClassifier {
    config: RunConfig,
}

impl RandomClassifier {
    pub fn new(config: RunConfig) -> Self {
        Self { config }
    }

    fn random_line(rng: &mut ChaCha8Rng) -> Line {
        let a = -(2.0 * rng.gen::<f64>() * 10.0).round();
        let c = rng.gen_range(0..=10);
        Line::new(a, 10.0, c as f64)
    }

    fn should_stop_early(&self, iteration: usize, rng: &mut ChaCha8Rng) -> bool {
        iteration as f64 > self.config.max_iterations as f64 * EARLY_STOP_AFTER
            && rng.gen::<f64>() < EARLY_STOP_PROBABILITY
    }
}

impl Algorithm for RandomClassifier {
    fn kind(&self) -> AlgorithmKind {
        AlgorithmKind::RandomClassifier
    }

    fn config(&self) -> &RunConfig {
        &self.config
    }

    fn iterate(&mut self, iteration: usize, state: &mut RunState, rng: &mut ChaCha8Rng) -> Step {
        let line = Self::random_line(rng);
        log::trace!("Iteration {}: {}", iteration, line);
        state.set_line(line);

        if self.should_stop_early(iteration, rng) {
            Step::Halt
        } else {
            Step::Continue
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;
    use rand::SeedableRng;

    #[test]
    fn test_line_ranges() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for _ in 0..1000 {
            let line = RandomClassifier::random_line(&mut rng);
            assert!((-20.0..=0.0).contains(&line.a));
            assert_eq!(line.a.fract(), 0.0);
            assert_eq!(line.b, 10.0);
            assert!((0.0..=10.0).contains(&line.c));
        }
    }

    #[test]
    fn test_never_stops_in_first_sixty_percent() {
        let mut classifier = RandomClassifier::new(RunConfig::default().with_max_iterations(100));
        let mut state = RunState::new(Dataset::new());
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        for iteration in 1..=60 {
            assert_eq!(
                classifier.iterate(iteration, &mut state, &mut rng),
                Step::Continue
            );
        }
        assert!(state.line().is_some());
    }

    #[test]
    fn test_eventually_stops_early() {
        let classifier = RandomClassifier::new(RunConfig::default().with_max_iterations(100_000));
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let stopped = (60_001..100_000).any(|i| classifier.should_stop_early(i, &mut rng));
        assert!(stopped);
    }
}
