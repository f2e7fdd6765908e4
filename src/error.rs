use std::fmt;
use thiserror::Error;

/// Reason a single line of `.tsd` text was rejected
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ViolationKind {
    /// The instance name does not start with `@`
    #[error("Invalid name '{0}'. All data instance names must start with the @ character.")]
    InvalidName(String),

    /// The instance name was already used by an earlier accepted line
    #[error("Duplicate name = {0}")]
    DuplicateName(String),

    /// The location is not two finite numbers separated by a single comma
    #[error("Malformed location '{0}'. Expected two numbers separated by a comma.")]
    MalformedNumber(String),

    /// The line does not have exactly three tab-separated fields
    #[error("Expected 3 tab-separated fields, found {0}")]
    MalformedRecord(usize),

    /// An empty line appeared before the end of the input
    #[error("Empty line before end of data")]
    EmptyLine,
}

/// One rejected line, numbered as `1 + instances accepted before it`
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub line: usize,
    pub kind: ViolationKind,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Line {}: {}", self.line, self.kind)
    }
}

/// Aggregate failure for a parse: every rejected line, in input order
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{} invalid line(s) in data; first: {}", .violations.len(), first_violation(.violations))]
pub struct ParseReport {
    pub violations: Vec<Violation>,
}

fn first_violation(violations: &[Violation]) -> String {
    violations
        .first()
        .map(ToString::to_string)
        .unwrap_or_default()
}

impl ParseReport {
    /// Lines of the report, one per violation
    pub fn messages(&self) -> Vec<String> {
        self.violations.iter().map(ToString::to_string).collect()
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Rejection of a raw configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// One or more fields still hold the "not yet configured" sentinel
    #[error("Algorithm has not been configured")]
    NotConfigured,

    /// A field that must be non-negative is negative
    #[error("{field} cannot be negative (got {value})")]
    Negative { field: &'static str, value: i64 },

    /// Update interval larger than the iteration budget
    #[error("Update interval ({interval}) cannot be greater than the number of max iterations ({max_iterations})")]
    IntervalExceedsBudget { interval: i64, max_iterations: i64 },

    /// Cluster count outside the supported range
    #[error("Number of clusters must be between {min} and {max} (got {value})")]
    ClusterCountOutOfRange { value: i64, min: usize, max: usize },

    /// More clusters requested than there are instances to seed them
    #[error("Number of clusters ({clusters}) cannot exceed the number of data points ({instances})")]
    ClusterCountExceedsInstances { clusters: usize, instances: usize },
}

/// Failures that prevent a run from starting or finishing normally
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RunError {
    /// Not enough distinct instances to seed the requested centroids
    #[error("Insufficient data: {available} instance(s) available, {required} required to seed centroids")]
    InsufficientInstances { required: usize, available: usize },

    /// `start()` called on a run that already left the idle state
    #[error("Run has already been started")]
    AlreadyStarted,

    /// `join()` called on a run that was never started
    #[error("Run has not been started")]
    NotStarted,

    /// The worker thread could not be spawned
    #[error("Failed to spawn algorithm worker: {0}")]
    Spawn(String),

    /// Another run is still running or paused
    #[error("Another algorithm run is still active")]
    AlreadyActive,

    /// No dataset has been loaded
    #[error("No dataset loaded")]
    NoDataset,

    /// The selected algorithm has no valid configuration yet
    #[error("{0} has not been configured")]
    NotConfigured(&'static str),

    /// The algorithm family cannot run on the loaded dataset
    #[error("{0} is not available for the loaded dataset")]
    Unavailable(&'static str),

    /// The worker thread panicked before reporting an outcome
    #[error("Algorithm worker panicked")]
    WorkerPanicked,
}

/// Errors raised by dataset access and file I/O
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("No instance named '{0}'")]
    UnknownInstance(String),

    #[error(transparent)]
    Parse(#[from] ParseReport),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Crate-level error for the [`crate::Session`] surface
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Run(#[from] RunError),
}

impl From<ParseReport> for Error {
    fn from(report: ParseReport) -> Self {
        Error::Dataset(DatasetError::Parse(report))
    }
}
