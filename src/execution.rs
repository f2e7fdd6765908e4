//! Background execution of an [`Algorithm`].
//!
//! A [`Run`] owns one algorithm instance and, once started, one worker
//! thread. The worker paces iterations, reports progress to a
//! [`RunObserver`] at every cadence boundary, pauses there until resumed
//! when the run is not continuous, and stops cooperatively on cancellation.
//!
//! The worker and the consumer share two things: the [`SharedState`] (working
//! labels, classifier line, current iteration) behind a read-write lock, and
//! a control block (status, cancel flag, resume request) behind a mutex with
//! a condition variable that both pause waits and pacing sleeps block on.

use crate::algorithm::{Algorithm, Line, Step};
use crate::config::RunConfig;
use crate::dataset::Dataset;
use crate::error::RunError;
use parking_lot::{Condvar, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Hooks a consumer receives while a run progresses.
///
/// Every hook is called on the worker thread. Implementations must return
/// quickly and must not call back into the [`Run`] in a way that waits on
/// the worker (such as [`Run::join`]).
///
/// Hooks for iteration `i` arrive before hooks for iteration `i + 1`, a
/// terminal hook is always the last one, and nothing is delivered once the
/// worker has observed cancellation. By the time a terminal hook runs the
/// run's status is already terminal.
pub trait RunObserver: Send + Sync {
    /// Iteration `iteration` (1-based) is about to execute
    fn on_iteration_started(&self, _iteration: usize) {}

    /// Progress report at a cadence boundary, and once more for the
    /// terminal iteration when it was not already reported
    fn on_cadence_reached(&self, _iteration: usize) {}

    /// The run paused and waits for [`Run::request_resume`]
    fn on_pause_required(&self) {}

    /// The run left the pause
    fn on_pause_cleared(&self) {}

    /// The run exhausted its iteration budget
    fn on_completed(&self) {}

    /// The run stopped early on its own
    fn on_self_terminated(&self) {}
}

/// Observer that ignores every hook
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl RunObserver for NoopObserver {}

/// Lifecycle of a [`Run`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Idle,
    Running,
    Paused,
    Completed,
    SelfTerminated,
    Cancelled,
}

impl RunStatus {
    /// Running or paused
    pub fn is_active(&self) -> bool {
        matches!(self, RunStatus::Running | RunStatus::Paused)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Completed | RunStatus::SelfTerminated | RunStatus::Cancelled
        )
    }
}

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The iteration budget was exhausted
    Completed,

    /// The algorithm stopped early on its own
    SelfTerminated,

    /// The run was cancelled
    Cancelled,
}

impl From<RunOutcome> for RunStatus {
    fn from(outcome: RunOutcome) -> Self {
        match outcome {
            RunOutcome::Completed => RunStatus::Completed,
            RunOutcome::SelfTerminated => RunStatus::SelfTerminated,
            RunOutcome::Cancelled => RunStatus::Cancelled,
        }
    }
}

/// State an algorithm publishes while it runs
#[derive(Debug, Clone)]
pub struct RunState {
    dataset: Dataset,
    line: Option<Line>,
    iteration: usize,
}

impl RunState {
    pub fn new(dataset: Dataset) -> Self {
        Self {
            dataset,
            line: None,
            iteration: 0,
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Mutable access for algorithms updating working labels
    pub fn dataset_mut(&mut self) -> &mut Dataset {
        &mut self.dataset
    }

    /// Current classifier output, if any
    pub fn line(&self) -> Option<Line> {
        self.line
    }

    pub fn set_line(&mut self, line: Line) {
        self.line = Some(line);
    }

    /// Last iteration executed (0 before the first one)
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// Clear run output and restore original labels
    pub(crate) fn reset(&mut self) {
        self.dataset.reset_labels();
        self.line = None;
        self.iteration = 0;
    }
}

/// Handle to the [`RunState`] shared between a worker and its consumer
#[derive(Debug, Clone)]
pub struct SharedState {
    inner: Arc<RwLock<RunState>>,
}

impl SharedState {
    pub fn new(dataset: Dataset) -> Self {
        Self {
            inner: Arc::new(RwLock::new(RunState::new(dataset))),
        }
    }

    /// Read access; hold the guard briefly, the worker waits on it
    pub fn read(&self) -> RwLockReadGuard<'_, RunState> {
        self.inner.read()
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, RunState> {
        self.inner.write()
    }
}

#[derive(Debug)]
struct ControlState {
    status: RunStatus,
    cancelled: bool,
    resume_requested: bool,
}

/// Status, cancellation and resume signalling for one run
#[derive(Debug)]
struct Control {
    state: Mutex<ControlState>,
    signal: Condvar,
}

impl Control {
    fn new() -> Self {
        Self {
            state: Mutex::new(ControlState {
                status: RunStatus::Idle,
                cancelled: false,
                resume_requested: false,
            }),
            signal: Condvar::new(),
        }
    }

    fn status(&self) -> RunStatus {
        self.state.lock().status
    }

    fn set_status(&self, status: RunStatus) {
        self.state.lock().status = status;
    }

    fn cancel(&self) {
        self.state.lock().cancelled = true;
        self.signal.notify_all();
    }

    fn is_cancelled(&self) -> bool {
        self.state.lock().cancelled
    }

    fn request_resume(&self) {
        self.state.lock().resume_requested = true;
        self.signal.notify_all();
    }

    /// Wait for `duration`. Returns `false` if cancelled before or during it.
    fn sleep(&self, duration: Duration) -> bool {
        let mut state = self.state.lock();
        if duration.is_zero() {
            return !state.cancelled;
        }
        let deadline = Instant::now() + duration;
        while !state.cancelled {
            if self.signal.wait_until(&mut state, deadline).timed_out() {
                break;
            }
        }
        !state.cancelled
    }

    /// Mark the run paused; resume requests made before this point are dropped
    fn enter_pause(&self) {
        let mut state = self.state.lock();
        state.resume_requested = false;
        state.status = RunStatus::Paused;
    }

    /// Block until resumed. Returns `false` if cancelled instead.
    fn wait_for_resume(&self) -> bool {
        let mut state = self.state.lock();
        while !state.resume_requested && !state.cancelled {
            self.signal.wait(&mut state);
        }
        if state.cancelled {
            return false;
        }
        state.resume_requested = false;
        state.status = RunStatus::Running;
        true
    }
}

/// One execution of one algorithm against a shared dataset.
///
/// Created idle; [`Run::start`] initializes the algorithm on the calling
/// thread and hands it to a dedicated worker. Dropping a run cancels it and
/// waits for the worker to exit.
pub struct Run {
    name: &'static str,
    config: RunConfig,
    algorithm: Option<Box<dyn Algorithm>>,
    state: SharedState,
    observer: Arc<dyn RunObserver>,
    control: Arc<Control>,
    worker: Option<JoinHandle<RunOutcome>>,
    outcome: Option<RunOutcome>,
}

impl Run {
    pub fn new(
        algorithm: Box<dyn Algorithm>,
        state: SharedState,
        observer: Arc<dyn RunObserver>,
    ) -> Self {
        Self {
            name: algorithm.name(),
            config: algorithm.config().clone(),
            algorithm: Some(algorithm),
            state,
            observer,
            control: Arc::new(Control::new()),
            worker: None,
            outcome: None,
        }
    }

    /// Initialize the algorithm and start the worker.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The run is not idle
    /// - The algorithm cannot initialize against the dataset (no callback is
    ///   emitted in that case and the run stays idle)
    /// - The worker thread cannot be spawned
    pub fn start(&mut self) -> Result<(), RunError> {
        if self.status() != RunStatus::Idle {
            return Err(RunError::AlreadyStarted);
        }
        let mut algorithm = self.algorithm.take().ok_or(RunError::AlreadyStarted)?;

        let mut rng = match self.config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        let initialized = {
            let state = self.state.read();
            algorithm.initialize(state.dataset(), &mut rng)
        };
        if let Err(err) = initialized {
            log::warn!("{} failed to initialize: {}", self.name, err);
            self.algorithm = Some(algorithm);
            return Err(err);
        }

        self.control.set_status(RunStatus::Running);

        let worker = Worker {
            algorithm,
            config: self.config.clone(),
            state: self.state.clone(),
            observer: Arc::clone(&self.observer),
            control: Arc::clone(&self.control),
            rng,
        };

        let handle = thread::Builder::new()
            .name(self.name.to_string())
            .spawn(move || worker.run())
            .map_err(|e| {
                self.control.set_status(RunStatus::Idle);
                RunError::Spawn(e.to_string())
            })?;

        log::info!(
            "Started {} (max_iterations={}, update_interval={}, continuous={})",
            self.name,
            self.config.max_iterations,
            self.config.update_interval,
            self.config.continuous
        );
        self.worker = Some(handle);
        Ok(())
    }

    /// Let a paused run continue. Has no effect unless the run is paused.
    pub fn request_resume(&self) {
        if self.status() == RunStatus::Paused {
            log::debug!("Resume requested for {}", self.name);
            self.control.request_resume();
        }
    }

    /// Ask the worker to stop. No new iteration starts afterwards and a
    /// pending pause is released; an iteration already executing finishes.
    pub fn cancel(&self) {
        log::debug!("Cancel requested for {}", self.name);
        self.control.cancel();
    }

    pub fn status(&self) -> RunStatus {
        self.control.status()
    }

    /// Running or paused
    pub fn is_active(&self) -> bool {
        self.status().is_active()
    }

    /// Wait for the worker to finish and return how the run ended.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::NotStarted`] for a run that was never started and
    /// [`RunError::WorkerPanicked`] if the worker panicked.
    pub fn join(&mut self) -> Result<RunOutcome, RunError> {
        if let Some(outcome) = self.outcome {
            return Ok(outcome);
        }
        let worker = self.worker.take().ok_or(RunError::NotStarted)?;
        match worker.join() {
            Ok(outcome) => {
                self.outcome = Some(outcome);
                Ok(outcome)
            }
            Err(_) => {
                self.control.set_status(RunStatus::Cancelled);
                Err(RunError::WorkerPanicked)
            }
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn max_iterations(&self) -> usize {
        self.config.max_iterations
    }

    pub fn update_interval(&self) -> usize {
        self.config.update_interval
    }

    pub fn state(&self) -> &SharedState {
        &self.state
    }

    /// Current classifier line, `a·x + b·y + c = 0`
    pub fn line_equation(&self) -> Option<Line> {
        self.state.read().line()
    }

    /// Fraction of the iteration budget executed so far
    pub fn progress(&self) -> f64 {
        if self.config.max_iterations == 0 {
            return 1.0;
        }
        self.state.read().iteration() as f64 / self.config.max_iterations as f64
    }
}

impl Drop for Run {
    fn drop(&mut self) {
        self.control.cancel();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

/// Everything the worker thread owns
struct Worker {
    algorithm: Box<dyn Algorithm>,
    config: RunConfig,
    state: SharedState,
    observer: Arc<dyn RunObserver>,
    control: Arc<Control>,
    rng: ChaCha8Rng,
}

impl Worker {
    fn run(mut self) -> RunOutcome {
        let outcome = self.execute();
        self.control.set_status(outcome.into());
        log::info!(
            "{} finished: {:?} after {} iteration(s)",
            self.algorithm.name(),
            outcome,
            self.state.read().iteration()
        );
        outcome
    }

    fn execute(&mut self) -> RunOutcome {
        // Leave the consumer time to show the initial state
        if !self.control.sleep(self.config.pacing) {
            return RunOutcome::Cancelled;
        }

        let mut iteration = 0;
        let mut last_reported = 0;
        let mut converged = false;

        let terminal = loop {
            if self.control.is_cancelled() {
                return RunOutcome::Cancelled;
            }
            if iteration >= self.config.max_iterations {
                break RunOutcome::Completed;
            }
            if converged {
                break RunOutcome::SelfTerminated;
            }

            iteration += 1;
            self.observer.on_iteration_started(iteration);

            let step = {
                let mut state = self.state.write();
                state.iteration = iteration;
                self.algorithm.iterate(iteration, &mut state, &mut self.rng)
            };

            if self.config.is_cadence(iteration) {
                if self.control.is_cancelled() {
                    return RunOutcome::Cancelled;
                }
                self.observer.on_cadence_reached(iteration);
                last_reported = iteration;
                if !self.config.continuous && !self.pause() {
                    return RunOutcome::Cancelled;
                }
            }

            match step {
                Step::Halt => break RunOutcome::SelfTerminated,
                Step::Converged => converged = true,
                Step::Continue => {}
            }

            if !self.control.sleep(self.config.pacing) {
                return RunOutcome::Cancelled;
            }
        };

        if self.control.is_cancelled() {
            return RunOutcome::Cancelled;
        }
        if iteration != last_reported {
            self.observer.on_cadence_reached(iteration);
        }
        // Terminal before the hook so the consumer can start the next run from it
        self.control.set_status(terminal.into());
        match terminal {
            RunOutcome::Completed => self.observer.on_completed(),
            RunOutcome::SelfTerminated => self.observer.on_self_terminated(),
            RunOutcome::Cancelled => {}
        }
        terminal
    }

    /// Returns `false` if cancelled while paused
    fn pause(&self) -> bool {
        self.control.enter_pause();
        log::debug!("{} paused", self.algorithm.name());
        self.observer.on_pause_required();

        if !self.control.wait_for_resume() {
            return false;
        }
        log::debug!("{} resumed", self.algorithm.name());
        self.observer.on_pause_cleared();
        true
    }
}
