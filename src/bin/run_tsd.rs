//! Run one algorithm over a `.tsd` file and print its progress
//!
//! The run is continuous and unpaced unless a pacing is given, so this is
//! mostly useful for checking datasets and configurations from a shell.
//! Set `RUST_LOG=debug` to see the worker's own log lines.
//!
//! Usage: `run-tsd <input.tsd> <algorithm> <max_iters> <interval> [clusters] [seed]`
//!
//! `<algorithm>` is one of `classifier`, `random-clustering` or `kmeans`.

use datavis::execution::RunObserver;
use datavis::{AlgorithmFamily, AlgorithmKind, LinePlacement, RawConfig, Session};
use std::env;
use std::sync::Arc;
use std::time::Duration;

/// Prints every cadence report to stdout
struct Printer;

impl RunObserver for Printer {
    fn on_cadence_reached(&self, iteration: usize) {
        println!("iteration {}", iteration);
    }

    fn on_completed(&self) {
        println!("completed");
    }

    fn on_self_terminated(&self) {
        println!("stopped early");
    }
}

fn parse_kind(name: &str) -> Option<AlgorithmKind> {
    match name {
        "classifier" => Some(AlgorithmKind::RandomClassifier),
        "random-clustering" => Some(AlgorithmKind::RandomClustering),
        "kmeans" => Some(AlgorithmKind::KMeans),
        _ => None,
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 5 || args.len() > 7 {
        eprintln!(
            "Usage: {} <input.tsd> <algorithm> <max_iters> <interval> [clusters] [seed]",
            args[0]
        );
        std::process::exit(1);
    }

    let input_path = &args[1];
    let kind = parse_kind(&args[2]).ok_or_else(|| format!("Unknown algorithm: {}", args[2]))?;
    let max_iters: i64 = args[3].parse()?;
    let interval: i64 = args[4].parse()?;
    let clusters: i64 = args.get(5).map(|s| s.parse()).transpose()?.unwrap_or(2);
    let seed: Option<u64> = args.get(6).map(|s| s.parse()).transpose()?;

    let mut session = Session::new(Arc::new(Printer));
    let instances = session.load_file(input_path)?;
    eprintln!("Loaded {} instance(s) from {}", instances, input_path);

    let raw = match kind.family() {
        AlgorithmFamily::Classification => RawConfig::classification(max_iters, interval, true),
        AlgorithmFamily::Clustering => RawConfig::clustering(max_iters, interval, true, clusters),
    };
    let mut config = raw.validate(kind.family(), instances)?.with_pacing(Duration::ZERO);
    if let Some(seed) = seed {
        config = config.with_seed(seed);
    }
    session.set_config(kind, config)?;

    eprintln!("Running {}", kind);
    session.start(kind)?;
    let outcome = session.join()?;
    eprintln!("Outcome: {:?}", outcome);

    let state = session.state().ok_or("No dataset loaded")?.read();
    if let Some(line) = state.line() {
        println!("line: {}", line);
        if let Some(bounds) = state.dataset().bounds() {
            let placement = line.placement(bounds.min_x, bounds.max_x, bounds.min_y, bounds.max_y);
            if placement != LinePlacement::Visible {
                println!("line is outside the plot ({:?})", placement);
            }
        }
    } else {
        for instance in state.dataset().instances() {
            println!("{}\t{}", instance.name, instance.label);
        }
    }

    Ok(())
}
