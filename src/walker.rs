//! Directory traversal feeding the intake channel.
//!
//! The walker is the only producer on the intake channel. It owns the
//! sender and drops it when it returns, which is what tells the workers
//! that no more jobs are coming.

use crate::error::TraversalError;
use crate::parallel::Job;
use crossbeam_channel::Sender;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Terminal result of one walk.
#[derive(Debug, Default)]
pub struct WalkSummary {
    /// Eligible files sent to the intake channel.
    pub discovered: usize,
    /// Regular files that were not a target type.
    pub skipped: usize,
    /// The error that stopped traversal early, if any.
    pub error: Option<TraversalError>,
}

/// Recursive walker over one root directory.
#[derive(Debug, Clone)]
pub struct Walker {
    root: PathBuf,
    follow_links: bool,
}

impl Walker {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            follow_links: false,
        }
    }

    /// Follow symbolic links while walking.
    pub fn follow_links(mut self, yes: bool) -> Self {
        self.follow_links = yes;
        self
    }

    /// Walk the tree, sending each eligible file as a [`Job`].
    ///
    /// Blocks whenever `intake` is full. Stops at the first traversal error,
    /// or early if every receiver is gone. `intake` is dropped on return.
    pub fn run<F>(&self, accepts: F, intake: Sender<Job>) -> WalkSummary
    where
        F: Fn(&Path) -> bool,
    {
        let mut summary = WalkSummary::default();
        info!(root = %self.root.display(), "walking");

        let entries = WalkDir::new(&self.root)
            .follow_links(self.follow_links)
            .sort_by_file_name();

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    let err = TraversalError::from(err);
                    warn!(
                        path = ?err.path(),
                        symlink_loop = err.is_loop(),
                        "stopping walk: {}",
                        err
                    );
                    summary.error = Some(err);
                    break;
                }
            };

            let file_type = entry.file_type();
            if file_type.is_dir() {
                continue;
            }
            if !file_type.is_file() {
                debug!(path = %entry.path().display(), "ignoring non-regular file");
                continue;
            }

            if !accepts(entry.path()) {
                info!("Skipping non-target file: {}", entry.path().display());
                summary.skipped += 1;
                continue;
            }

            if intake.send(Job::new(entry.into_path())).is_err() {
                warn!("intake channel closed, stopping walk");
                break;
            }
            summary.discovered += 1;
        }

        info!(
            discovered = summary.discovered,
            skipped = summary.skipped,
            "walk finished"
        );
        summary
    }
}
