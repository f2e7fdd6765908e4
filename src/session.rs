use crate::algorithm::AlgorithmKind;
use crate::config::{RawConfig, RunConfig};
use crate::dataset::Dataset;
use crate::error::{ConfigError, Error, RunError};
use crate::execution::{Run, RunObserver, RunOutcome, RunStatus, SharedState};
use crate::parser;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// The consumer side of the engine.
///
/// A session owns the loaded dataset, one validated configuration per
/// algorithm and at most one [`Run`]. It refuses to start a run while
/// another is running or paused, and hands every run the observer it was
/// created with.
pub struct Session {
    observer: Arc<dyn RunObserver>,
    state: Option<SharedState>,
    configs: HashMap<AlgorithmKind, RunConfig>,
    run: Option<Run>,
}

impl Session {
    pub fn new(observer: Arc<dyn RunObserver>) -> Self {
        Self {
            observer,
            state: None,
            configs: HashMap::new(),
            run: None,
        }
    }

    /// Parse `text` and make it the current dataset.
    ///
    /// On failure the previous dataset is kept.
    pub fn load_text(&mut self, text: &str) -> Result<usize, Error> {
        self.ensure_idle()?;
        let dataset = parser::parse(text)?;
        Ok(self.install(dataset))
    }

    /// Read a `.tsd` file and make it the current dataset
    pub fn load_file<P: AsRef<Path>>(&mut self, path: P) -> Result<usize, Error> {
        self.ensure_idle()?;
        let dataset = Dataset::from_tsd_file(path)?;
        Ok(self.install(dataset))
    }

    fn install(&mut self, mut dataset: Dataset) -> usize {
        dataset.refresh_summary();
        let len = dataset.len();
        log::info!(
            "Loaded {} instance(s) with {} distinct label(s)",
            len,
            dataset.distinct_labels().len()
        );
        self.run = None;
        self.configs.clear();
        self.state = Some(SharedState::new(dataset));
        len
    }

    /// Shared view of the loaded dataset and the current run's output
    pub fn state(&self) -> Option<&SharedState> {
        self.state.as_ref()
    }

    fn instance_count(&self) -> usize {
        self.state.as_ref().map_or(0, |s| s.read().dataset().len())
    }

    /// Algorithms that can run on the loaded dataset, in registry order
    pub fn available_algorithms(&self) -> Vec<AlgorithmKind> {
        let Some(state) = &self.state else {
            return Vec::new();
        };
        let state = state.read();
        AlgorithmKind::all()
            .filter(|kind| kind.family().is_available(state.dataset()))
            .collect()
    }

    /// Validate and store the configuration for `kind`
    pub fn configure(&mut self, kind: AlgorithmKind, raw: RawConfig) -> Result<&RunConfig, ConfigError> {
        let config = raw.validate(kind.family(), self.instance_count())?;
        Ok(self.store_config(kind, config))
    }

    /// Validate the configuration for `kind`, storing the fallback defaults
    /// if it is rejected. The rejection is returned for display.
    pub fn configure_or_default(&mut self, kind: AlgorithmKind, raw: RawConfig) -> Option<ConfigError> {
        let (config, rejection) = raw.validate_or_fallback(kind.family(), self.instance_count());
        self.store_config(kind, config);
        rejection
    }

    /// Check a prepared configuration, e.g. one with custom pacing or seed,
    /// against the loaded dataset and store it for `kind`
    pub fn set_config(&mut self, kind: AlgorithmKind, config: RunConfig) -> Result<&RunConfig, ConfigError> {
        let config = config.validate(kind.family(), self.instance_count())?;
        Ok(self.store_config(kind, config))
    }

    fn store_config(&mut self, kind: AlgorithmKind, config: RunConfig) -> &RunConfig {
        self.configs.insert(kind, config);
        &self.configs[&kind]
    }

    pub fn config(&self, kind: AlgorithmKind) -> Option<&RunConfig> {
        self.configs.get(&kind)
    }

    /// Start `kind` with its stored configuration.
    ///
    /// Working labels and classifier output are reset first, so every run
    /// starts from the original labels.
    pub fn start(&mut self, kind: AlgorithmKind) -> Result<(), Error> {
        self.ensure_idle()?;
        let state = self.state.clone().ok_or(RunError::NoDataset)?;
        if !kind.family().is_available(state.read().dataset()) {
            return Err(RunError::Unavailable(kind.name()).into());
        }
        let config = self
            .configs
            .get(&kind)
            .cloned()
            .ok_or(RunError::NotConfigured(kind.name()))?;

        state.write().reset();

        // Replacing the previous run joins its (finished) worker
        self.run = None;
        let mut run = Run::new(kind.build(config), state, Arc::clone(&self.observer));
        run.start()?;
        self.run = Some(run);
        Ok(())
    }

    fn ensure_idle(&self) -> Result<(), RunError> {
        if self.is_running() {
            Err(RunError::AlreadyActive)
        } else {
            Ok(())
        }
    }

    /// Whether a run is running or paused
    pub fn is_running(&self) -> bool {
        self.run.as_ref().is_some_and(Run::is_active)
    }

    /// Status of the current run, if any
    pub fn status(&self) -> Option<RunStatus> {
        self.run.as_ref().map(Run::status)
    }

    pub fn run(&self) -> Option<&Run> {
        self.run.as_ref()
    }

    pub fn resume(&self) {
        if let Some(run) = &self.run {
            run.request_resume();
        }
    }

    /// Cancel the current run. A run that already ended is left as it is.
    pub fn cancel(&self) {
        if let Some(run) = self.run.as_ref().filter(|run| !run.status().is_terminal()) {
            run.cancel();
        }
    }

    /// Wait for the current run to end
    pub fn join(&mut self) -> Result<RunOutcome, RunError> {
        self.run.as_mut().ok_or(RunError::NotStarted)?.join()
    }
}
