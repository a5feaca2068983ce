//! Run orchestration.
//!
//! One run wires the pipeline together:
//!
//! ```text
//! Walker ──► intake (bounded) ──► WorkerPool (N threads) ──► outcomes (bounded) ──► Aggregator
//! ```
//!
//! The walker closes the intake channel by dropping its sender when it
//! returns; the workers close the outcome channel when the last one exits.
//! The aggregator runs on the calling thread and returns once the outcome
//! channel is closed, after which the walker's summary is read through its
//! join handle.

use crate::aggregate::{Aggregator, Outcome, Report};
use crate::cli::Config;
use crate::error::{Error, Result};
use crate::formats::{Registry, Transformer};
use crate::parallel::{Job, WorkerPool, panic_message};
use crate::terminal::{Progress, print_error, print_success};
use crate::walker::Walker;
use crossbeam_channel::bounded;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use tracing::info;

/// Runs the strip pipeline over a folder.
pub struct Processor {
    config: Config,
    transformer: Arc<dyn Transformer>,
}

impl Processor {
    /// Create a processor backed by the built-in format registry.
    pub fn new(config: Config) -> Self {
        let registry = Registry::new(config.dry_run);
        Self::with_transformer(config, Arc::new(registry))
    }

    /// Create a processor with a custom transformer.
    pub fn with_transformer(config: Config, transformer: Arc<dyn Transformer>) -> Self {
        Self {
            config,
            transformer,
        }
    }

    /// Strip every eligible file under `root`.
    ///
    /// Per-file failures and traversal errors end up in the returned
    /// [`Report`]; `Err` means the pipeline could not be started at all.
    pub fn process_folder(&self, root: &Path) -> Result<Report> {
        let start = Instant::now();
        let workers = self.config.worker_count();
        let capacity = self.config.queue_capacity;

        info!(
            root = %root.display(),
            workers,
            capacity,
            dry_run = self.config.dry_run,
            "starting run"
        );

        let (job_tx, job_rx) = bounded::<Job>(capacity);
        let (outcome_tx, outcome_rx) = bounded::<Outcome>(capacity);

        // The pool takes the only outcome sender; our intake receiver is
        // dropped right after so the workers hold the last clones.
        let pool = WorkerPool::spawn(workers, job_rx, outcome_tx, Arc::clone(&self.transformer))?;

        let walker = Walker::new(root).follow_links(self.config.follow_links);
        let transformer = Arc::clone(&self.transformer);
        let walk_handle = thread::Builder::new()
            .name(String::from("exifstrip-walker"))
            .spawn(move || walker.run(|path| transformer.accepts(path), job_tx))
            .map_err(Error::ThreadSpawn)?;

        let mut progress = Progress::new(!self.config.quiet);
        let verbose = self.config.verbose;
        let collected = Aggregator::collect(&outcome_rx, |outcome| {
            progress.record(outcome);
            if verbose {
                // Hide the spinner so the line is not printed over it.
                progress.suspend(|| report_outcome(outcome));
            }
        });
        progress.finish();

        // The outcome channel is closed, so every worker has left its loop
        // and the intake channel has no receivers left.
        let walk = walk_handle
            .join()
            .map_err(|payload| Error::WalkerPanic(panic_message(payload.as_ref())))?;
        pool.join()?;

        let report = Report::new(collected, walk, start.elapsed());
        info!(
            processed = report.stats().processed,
            failed = report.stats().failed,
            skipped = report.stats().skipped,
            "run finished"
        );
        Ok(report)
    }
}

fn report_outcome(outcome: &Outcome) {
    match outcome {
        Outcome::Processed { path, .. } => {
            print_success(&format!("Cleaned {}", path.display()));
        }
        Outcome::Failed { .. } => print_error(&outcome.to_string()),
    }
}
