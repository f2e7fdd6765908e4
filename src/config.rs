use crate::algorithm::AlgorithmFamily;
use crate::error::ConfigError;
use std::time::Duration;

/// Smallest supported cluster count
pub const MIN_CLUSTERS: usize = 2;

/// Largest supported cluster count
pub const MAX_CLUSTERS: usize = 4;

/// Value of a [`RawConfig`] field that has not been set yet
pub const UNSET: i64 = -1;

/// Delay between iterations, and before the first one
pub const DEFAULT_PACING: Duration = Duration::from_millis(750);

/// Configuration fields as entered by the user, before validation.
///
/// Fields holding [`UNSET`] mean "not yet configured".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawConfig {
    pub max_iterations: i64,
    pub update_interval: i64,
    pub continuous: bool,
    pub num_clusters: i64,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self::unset()
    }
}

impl RawConfig {
    /// A configuration with every field unset
    pub fn unset() -> Self {
        Self {
            max_iterations: UNSET,
            update_interval: UNSET,
            continuous: false,
            num_clusters: UNSET,
        }
    }

    /// Fields for a classification run
    pub fn classification(max_iterations: i64, update_interval: i64, continuous: bool) -> Self {
        Self {
            max_iterations,
            update_interval,
            continuous,
            num_clusters: UNSET,
        }
    }

    /// Fields for a clustering run
    pub fn clustering(
        max_iterations: i64,
        update_interval: i64,
        continuous: bool,
        num_clusters: i64,
    ) -> Self {
        Self {
            max_iterations,
            update_interval,
            continuous,
            num_clusters,
        }
    }

    /// Validate the fields for an algorithm of `family` running over a
    /// dataset of `instances` points.
    ///
    /// # Errors
    ///
    /// Returns the first rule the fields break, checked in this order:
    /// unset fields, negative budget, negative interval, interval above the
    /// budget, then (clustering only) cluster count range and cluster count
    /// above the number of instances.
    pub fn validate(
        &self,
        family: AlgorithmFamily,
        instances: usize,
    ) -> Result<RunConfig, ConfigError> {
        let clustering = family == AlgorithmFamily::Clustering;

        if self.max_iterations == UNSET
            || self.update_interval == UNSET
            || (clustering && self.num_clusters == UNSET)
        {
            return Err(ConfigError::NotConfigured);
        }
        if self.max_iterations < 0 {
            return Err(ConfigError::Negative {
                field: "Number of max iterations",
                value: self.max_iterations,
            });
        }
        if self.update_interval < 0 {
            return Err(ConfigError::Negative {
                field: "Update interval",
                value: self.update_interval,
            });
        }
        if self.update_interval > self.max_iterations {
            return Err(ConfigError::IntervalExceedsBudget {
                interval: self.update_interval,
                max_iterations: self.max_iterations,
            });
        }

        let num_clusters = if clustering {
            let range = MIN_CLUSTERS as i64..=MAX_CLUSTERS as i64;
            if !range.contains(&self.num_clusters) {
                return Err(ConfigError::ClusterCountOutOfRange {
                    value: self.num_clusters,
                    min: MIN_CLUSTERS,
                    max: MAX_CLUSTERS,
                });
            }
            let clusters = self.num_clusters as usize;
            if clusters > instances {
                return Err(ConfigError::ClusterCountExceedsInstances {
                    clusters,
                    instances,
                });
            }
            Some(clusters)
        } else {
            None
        };

        Ok(RunConfig {
            max_iterations: self.max_iterations as usize,
            update_interval: self.update_interval as usize,
            continuous: self.continuous,
            num_clusters,
            ..RunConfig::default()
        })
    }

    /// Validate, or fall back to [`RunConfig::fallback`] with a warning.
    ///
    /// The rejection, if any, is returned alongside the configuration so the
    /// caller can tell the user which defaults were substituted and why.
    pub fn validate_or_fallback(
        &self,
        family: AlgorithmFamily,
        instances: usize,
    ) -> (RunConfig, Option<ConfigError>) {
        match self.validate(family, instances) {
            Ok(config) => (config, None),
            Err(err) => {
                let fallback = RunConfig::fallback(family);
                log::warn!("Invalid configuration ({}); using defaults {:?}", err, fallback);
                (fallback, Some(err))
            }
        }
    }
}

/// Validated, immutable run parameters
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    /// Iteration budget
    pub max_iterations: usize,

    /// Cadence at which progress is reported (and, when not continuous, the
    /// run pauses). Zero disables cadence reports.
    pub update_interval: usize,

    /// Keep running through cadence boundaries instead of pausing
    pub continuous: bool,

    /// Cluster count, present only for clustering algorithms
    pub num_clusters: Option<usize>,

    /// Delay between iterations and before the first one
    pub pacing: Duration,

    /// Seed for the run's random number generator; `None` seeds from entropy
    pub seed: Option<u64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_iterations: 15,
            update_interval: 1,
            continuous: true,
            num_clusters: None,
            pacing: DEFAULT_PACING,
            seed: None,
        }
    }
}

impl RunConfig {
    /// Defaults substituted for a rejected configuration
    pub fn fallback(family: AlgorithmFamily) -> Self {
        Self {
            num_clusters: match family {
                AlgorithmFamily::Clustering => Some(MIN_CLUSTERS),
                AlgorithmFamily::Classification => None,
            },
            ..Self::default()
        }
    }

    /// Set the iteration budget
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the update interval
    pub fn with_update_interval(mut self, update_interval: usize) -> Self {
        self.update_interval = update_interval;
        self
    }

    /// Set continuous mode
    pub fn with_continuous(mut self, continuous: bool) -> Self {
        self.continuous = continuous;
        self
    }

    /// Set the cluster count
    pub fn with_num_clusters(mut self, num_clusters: usize) -> Self {
        self.num_clusters = Some(num_clusters);
        self
    }

    /// Set the pacing delay
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    /// Set the random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Re-check the run parameters against the rules of [`RawConfig::validate`].
    ///
    /// Pacing and seed are kept as they are; a clustering configuration
    /// without a cluster count is [`ConfigError::NotConfigured`].
    pub fn validate(&self, family: AlgorithmFamily, instances: usize) -> Result<RunConfig, ConfigError> {
        let to_raw = |value: usize| i64::try_from(value).unwrap_or(i64::MAX);
        let raw = RawConfig {
            max_iterations: to_raw(self.max_iterations),
            update_interval: to_raw(self.update_interval),
            continuous: self.continuous,
            num_clusters: self.num_clusters.map_or(UNSET, to_raw),
        };
        let mut checked = raw.validate(family, instances)?;
        checked.pacing = self.pacing;
        checked.seed = self.seed;
        Ok(checked)
    }

    /// Whether iteration `iteration` is a cadence boundary
    pub fn is_cadence(&self, iteration: usize) -> bool {
        self.update_interval != 0 && iteration % self.update_interval == 0
    }

    /// Cluster count, or the smallest supported one when unset
    pub fn clusters(&self) -> usize {
        self.num_clusters.unwrap_or(MIN_CLUSTERS)
    }
}
