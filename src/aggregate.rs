//! Outcome collection and the run-level report.

use crate::error::{AggregateError, Error, Result, TraversalError};
use crate::formats::Transformed;
use crate::walker::WalkSummary;
use crossbeam_channel::Receiver;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Result of processing a single job.
#[derive(Debug)]
pub enum Outcome {
    /// The file was rewritten.
    Processed {
        path: PathBuf,
        worker: usize,
        stats: Transformed,
    },
    /// The transform failed; the file may or may not have been touched.
    Failed {
        path: PathBuf,
        worker: usize,
        cause: Error,
    },
}

impl Outcome {
    pub fn path(&self) -> &Path {
        match self {
            Outcome::Processed { path, .. } | Outcome::Failed { path, .. } => path,
        }
    }

    pub fn worker(&self) -> usize {
        match self {
            Outcome::Processed { worker, .. } | Outcome::Failed { worker, .. } => *worker,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed { .. })
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Processed { path, worker, .. } => {
                write!(f, "worker {}: processed file {}", worker, path.display())
            }
            Outcome::Failed {
                path,
                worker,
                cause,
            } => write!(
                f,
                "worker {}: error processing file {}: {}",
                worker,
                path.display(),
                cause
            ),
        }
    }
}

/// A failed job, as kept by the aggregator.
#[derive(Debug)]
pub struct Failure {
    pub path: PathBuf,
    pub worker: usize,
    pub cause: Error,
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "worker {}: error processing file {}: {}",
            self.worker,
            self.path.display(),
            self.cause
        )
    }
}

/// Statistics for one run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunStats {
    /// Eligible files found by the walker.
    pub discovered: usize,
    /// Files rewritten successfully.
    pub processed: usize,
    /// Files whose transform failed.
    pub failed: usize,
    /// Regular files skipped for not being a target type.
    pub skipped: usize,
    /// Total size of the processed files before rewriting.
    pub bytes_before: u64,
    /// Total size of the processed files after rewriting.
    pub bytes_after: u64,
    /// Wall-clock time of the run.
    pub duration: Duration,
}

impl RunStats {
    /// Bytes dropped by rewriting; zero if the files grew.
    pub fn bytes_removed(&self) -> u64 {
        self.bytes_before.saturating_sub(self.bytes_after)
    }

    /// Number of outcomes received.
    pub fn completed(&self) -> usize {
        self.processed + self.failed
    }
}

/// Everything the aggregator gathered from the outcome channel.
#[derive(Debug, Default)]
pub struct Collected {
    pub processed: usize,
    pub bytes_before: u64,
    pub bytes_after: u64,
    /// Failures in arrival order.
    pub failures: Vec<Failure>,
}

/// Drains the outcome channel.
pub struct Aggregator;

impl Aggregator {
    /// Receive outcomes until every sender is gone.
    ///
    /// `observe` sees each outcome before it is folded in.
    pub fn collect<F>(outcomes: &Receiver<Outcome>, mut observe: F) -> Collected
    where
        F: FnMut(&Outcome),
    {
        let mut collected = Collected::default();

        for outcome in outcomes.iter() {
            observe(&outcome);

            match outcome {
                Outcome::Processed { stats, .. } => {
                    collected.processed += 1;
                    collected.bytes_before += stats.bytes_before;
                    collected.bytes_after += stats.bytes_after;
                }
                Outcome::Failed {
                    path,
                    worker,
                    cause,
                } => collected.failures.push(Failure {
                    path,
                    worker,
                    cause,
                }),
            }
        }

        debug!(
            processed = collected.processed,
            failed = collected.failures.len(),
            "outcome channel closed"
        );
        collected
    }
}

/// Final result of one run.
#[derive(Debug)]
pub struct Report {
    stats: RunStats,
    traversal_error: Option<TraversalError>,
    failures: Vec<Failure>,
}

impl Report {
    /// Combine the aggregator's output with the walker's terminal result.
    pub fn new(collected: Collected, walk: WalkSummary, duration: Duration) -> Self {
        let stats = RunStats {
            discovered: walk.discovered,
            processed: collected.processed,
            failed: collected.failures.len(),
            skipped: walk.skipped,
            bytes_before: collected.bytes_before,
            bytes_after: collected.bytes_after,
            duration,
        };

        Self {
            stats,
            traversal_error: walk.error,
            failures: collected.failures,
        }
    }

    /// True iff no file failed and the walk completed.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && self.traversal_error.is_none()
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    pub fn traversal_error(&self) -> Option<&TraversalError> {
        self.traversal_error.as_ref()
    }

    pub fn failures(&self) -> &[Failure] {
        &self.failures
    }

    /// Problem lines: traversal error first, then failures in arrival order.
    pub fn error_lines(&self) -> Vec<String> {
        self.traversal_error
            .iter()
            .map(|e| format!("Error walking the path: {}", e))
            .chain(self.failures.iter().map(Failure::to_string))
            .collect()
    }

    /// Collapse into the stats on success, or one combined error.
    pub fn into_result(self) -> Result<RunStats> {
        if self.is_success() {
            Ok(self.stats)
        } else {
            Err(AggregateError::new(self.error_lines()).into())
        }
    }
}
