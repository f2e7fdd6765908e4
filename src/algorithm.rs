use crate::classifier::RandomClassifier;
use crate::clustering::RandomClustering;
use crate::config::RunConfig;
use crate::dataset::Dataset;
use crate::error::RunError;
use crate::execution::RunState;
use crate::kmeans::KMeansClusterer;
use rand_chacha::ChaCha8Rng;
use std::fmt;

/// What the engine should do after an iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Keep iterating
    Continue,

    /// Nothing changed; stop at the next loop check unless the budget is
    /// already exhausted
    Converged,

    /// Stop right away, before the budget is exhausted
    Halt,
}

/// A stepwise procedure driven by [`crate::execution::Run`].
///
/// Implementations hold only their own run state; pacing, cadence, pausing
/// and cancellation are handled by the engine.
pub trait Algorithm: Send {
    fn kind(&self) -> AlgorithmKind;

    fn config(&self) -> &RunConfig;

    fn name(&self) -> &'static str {
        self.kind().name()
    }

    fn max_iterations(&self) -> usize {
        self.config().max_iterations
    }

    fn update_interval(&self) -> usize {
        self.config().update_interval
    }

    /// One-time setup before the first iteration, run on the caller's thread.
    fn initialize(&mut self, _dataset: &Dataset, _rng: &mut ChaCha8Rng) -> Result<(), RunError> {
        Ok(())
    }

    /// Execute iteration `iteration` (1-based), publishing output into `state`
    fn iterate(&mut self, iteration: usize, state: &mut RunState, rng: &mut ChaCha8Rng) -> Step;
}

/// Broad category of an algorithm, deciding its output and configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlgorithmFamily {
    Classification,
    Clustering,
}

impl AlgorithmFamily {
    /// Whether algorithms of this family can run on `dataset`.
    ///
    /// Classification needs at least two distinct non-null labels.
    pub fn is_available(&self, dataset: &Dataset) -> bool {
        match self {
            AlgorithmFamily::Classification => dataset.distinct_labels().len() >= 2,
            AlgorithmFamily::Clustering => !dataset.is_empty(),
        }
    }
}

impl fmt::Display for AlgorithmFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlgorithmFamily::Classification => write!(f, "Classification"),
            AlgorithmFamily::Clustering => write!(f, "Clustering"),
        }
    }
}

/// Every algorithm the crate can run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlgorithmKind {
    RandomClassifier,
    RandomClustering,
    KMeans,
}

/// Registry entry: how to present and construct one algorithm
pub struct Registration {
    pub kind: AlgorithmKind,
    pub name: &'static str,
    pub family: AlgorithmFamily,
    build: fn(RunConfig) -> Box<dyn Algorithm>,
}

const ENTRIES: [Registration; 3] = [
    Registration {
        kind: AlgorithmKind::RandomClassifier,
        name: "Random Classifier",
        family: AlgorithmFamily::Classification,
        build: build_random_classifier,
    },
    Registration {
        kind: AlgorithmKind::RandomClustering,
        name: "Random Clustering",
        family: AlgorithmFamily::Clustering,
        build: build_random_clustering,
    },
    Registration {
        kind: AlgorithmKind::KMeans,
        name: "KMeans Clusterer",
        family: AlgorithmFamily::Clustering,
        build: build_kmeans,
    },
];

// Every entry sits at its kind's index
const _: () = {
    let mut i = 0;
    while i < ENTRIES.len() {
        assert!(ENTRIES[i].kind.index() == i);
        i += 1;
    }
};

/// All registered algorithms, in presentation order
pub static REGISTRY: [Registration; 3] = ENTRIES;

fn build_random_classifier(config: RunConfig) -> Box<dyn Algorithm> {
    Box::new(RandomClassifier::new(config))
}

fn build_random_clustering(config: RunConfig) -> Box<dyn Algorithm> {
    Box::new(RandomClustering::new(config))
}

fn build_kmeans(config: RunConfig) -> Box<dyn Algorithm> {
    Box::new(KMeansClusterer::new(config))
}

impl AlgorithmKind {
    /// All kinds, in registry order
    pub fn all() -> impl Iterator<Item = AlgorithmKind> {
        REGISTRY.iter().map(|r| r.kind)
    }

    /// All kinds of one family, in registry order
    pub fn of_family(family: AlgorithmFamily) -> impl Iterator<Item = AlgorithmKind> {
        REGISTRY
            .iter()
            .filter(move |r| r.family == family)
            .map(|r| r.kind)
    }

    /// Position of this kind's entry in [`REGISTRY`]
    const fn index(self) -> usize {
        match self {
            AlgorithmKind::RandomClassifier => 0,
            AlgorithmKind::RandomClustering => 1,
            AlgorithmKind::KMeans => 2,
        }
    }

    pub fn registration(self) -> &'static Registration {
        &REGISTRY[self.index()]
    }

    pub fn name(self) -> &'static str {
        self.registration().name
    }

    pub fn family(self) -> AlgorithmFamily {
        self.registration().family
    }

    /// Construct a fresh, idle instance of this algorithm
    pub fn build(self, config: RunConfig) -> Box<dyn Algorithm> {
        (self.registration().build)(config)
    }
}

impl fmt::Display for AlgorithmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where a line sits relative to a visible y range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinePlacement {
    Visible,
    North,
    South,
}

/// Classifier output: the line `a·x + b·y + c = 0`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl Line {
    pub fn new(a: f64, b: f64, c: f64) -> Self {
        Self { a, b, c }
    }

    /// y value on the line at `x`. Undefined (non-finite) for vertical lines.
    pub fn y_at(&self, x: f64) -> f64 {
        (-self.c - self.a * x) / self.b
    }

    /// Whether the segment of the line over `min_x..=max_x` crosses the
    /// visible range `min_y..=max_y`, or lies entirely above or below it.
    pub fn placement(&self, min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> LinePlacement {
        let y0 = self.y_at(min_x);
        let y1 = self.y_at(max_x);
        if y0 < min_y && y1 < min_y {
            LinePlacement::South
        } else if y0 > max_y && y1 > max_y {
            LinePlacement::North
        } else {
            LinePlacement::Visible
        }
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x + {}y + {} = 0", self.a, self.b, self.c)
    }
}
