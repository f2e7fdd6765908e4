//! # datavis
//!
//! Engine behind an interactive 2-D data visualizer: a parser for `.tsd`
//! (tab-separated data) files, validated run configurations, and iterative
//! classification and clustering algorithms that execute on a background
//! worker which can be paced, paused, resumed and cancelled.
//!
//! ## Features
//!
//! - **Line-numbered parsing**: every malformed line is reported, not just the first
//! - **Stepwise algorithms**: a random classifier, random clustering and k-means,
//!   all sharing one iteration contract
//! - **Cooperative execution**: progress callbacks at a configurable cadence,
//!   pause/resume for step-by-step display and prompt cancellation
//! - **Reproducible runs**: seed the RNG through [`RunConfig::with_seed`]
//!
//! ## Example
//!
//! ```rust
//! use datavis::{AlgorithmKind, RawConfig, Session};
//! use datavis::execution::{NoopObserver, RunOutcome};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let mut session = Session::new(Arc::new(NoopObserver));
//! session.load_text("@a\tcat\t1,1\n@b\tdog\t3,3\n@c\tcat\t5,5\n").unwrap();
//!
//! let config = RawConfig::clustering(10, 2, true, 2)
//!     .validate(AlgorithmKind::RandomClustering.family(), 3)
//!     .unwrap()
//!     .with_pacing(Duration::ZERO);
//! session.set_config(AlgorithmKind::RandomClustering, config).unwrap();
//!
//! session.start(AlgorithmKind::RandomClustering).unwrap();
//! assert_eq!(session.join().unwrap(), RunOutcome::Completed);
//!
//! let state = session.state().unwrap().read();
//! assert!(state.dataset().labels().iter().all(|l| l == "0" || l == "1"));
//! ```
//!
//! ## Parsing
//!
//! ```rust
//! use datavis::parse;
//!
//! let report = parse("@a\tL\t1,1\nb\tL\t2,2\n@a\tL\t3,3\n").unwrap_err();
//! assert_eq!(report.len(), 2);
//! assert_eq!(report.violations[0].line, 2);
//! ```

pub mod algorithm;
pub mod classifier;
pub mod clustering;
pub mod config;
pub mod dataset;
mod distance;
pub mod error;
pub mod execution;
pub mod kmeans;
pub mod parser;
pub mod session;

pub use algorithm::{Algorithm, AlgorithmFamily, AlgorithmKind, Line, LinePlacement, Step};
pub use config::{RawConfig, RunConfig};
pub use dataset::{Bounds, Dataset, Instance, Point, NULL_LABEL};
pub use error::{ConfigError, DatasetError, Error, ParseReport, RunError, Violation, ViolationKind};
pub use execution::{Run, RunObserver, RunOutcome, RunStatus, SharedState};
pub use parser::{parse, validate};
pub use session::Session;
