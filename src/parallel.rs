//! Fixed-size worker pool.
//!
//! Workers pull [`Job`]s from a shared bounded intake channel, run the
//! [`Transformer`] on each, and push one [`Outcome`] per job onto a shared
//! bounded outcome channel. Every worker owns a clone of the outcome sender,
//! so the outcome channel closes exactly once: when the last worker exits
//! after the intake channel has been closed and drained.

use crate::aggregate::Outcome;
use crate::error::{Error, Result};
use crate::formats::Transformer;
use crossbeam_channel::{Receiver, Sender};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

/// One eligible file waiting to be transformed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub path: PathBuf,
}

impl Job {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// A running pool of worker threads.
pub struct WorkerPool {
    workers: Vec<Worker>,
}

impl WorkerPool {
    /// Start `size` workers on the given channels.
    ///
    /// Takes ownership of `outcomes`; the caller keeps no sender, so the
    /// outcome channel is closed by the workers alone.
    pub fn spawn(
        size: usize,
        intake: Receiver<Job>,
        outcomes: Sender<Outcome>,
        transformer: Arc<dyn Transformer>,
    ) -> Result<Self> {
        if size == 0 {
            return Err(Error::InvalidArgument {
                argument: String::from("--jobs"),
                reason: String::from("Worker pool must have at least 1 worker"),
            });
        }

        let mut workers = Vec::with_capacity(size);
        for id in 0..size {
            workers.push(Worker::spawn(
                id,
                intake.clone(),
                outcomes.clone(),
                Arc::clone(&transformer),
            )?);
        }
        debug!(workers = size, "worker pool started");

        Ok(Self { workers })
    }

    /// Get the number of worker threads.
    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Wait for every worker to exit.
    ///
    /// Workers exit once the intake channel is closed and empty, or once the
    /// outcome receiver is gone.
    pub fn join(self) -> Result<()> {
        let mut first_error = None;
        for worker in self.workers {
            if let Err(payload) = worker.thread.join() {
                let err = Error::WorkerPanic {
                    worker: worker.id,
                    message: panic_message(payload.as_ref()),
                };
                warn!("{}", err);
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

/// A worker thread in the pool.
struct Worker {
    id: usize,
    thread: JoinHandle<()>,
}

impl Worker {
    fn spawn(
        id: usize,
        intake: Receiver<Job>,
        outcomes: Sender<Outcome>,
        transformer: Arc<dyn Transformer>,
    ) -> Result<Self> {
        let thread = thread::Builder::new()
            .name(format!("exifstrip-worker-{}", id))
            .spawn(move || worker_loop(id, intake, outcomes, transformer))
            .map_err(Error::ThreadSpawn)?;

        Ok(Self { id, thread })
    }
}

fn worker_loop(
    id: usize,
    intake: Receiver<Job>,
    outcomes: Sender<Outcome>,
    transformer: Arc<dyn Transformer>,
) {
    let mut handled = 0usize;

    // recv() errors only once the walker has dropped its sender and the
    // queue is empty.
    while let Ok(job) = intake.recv() {
        let outcome = run_job(id, job, transformer.as_ref());
        handled += 1;

        if outcomes.send(outcome).is_err() {
            // Nobody is collecting any more.
            warn!(worker = id, "outcome channel closed, stopping worker");
            break;
        }
    }

    debug!(worker = id, jobs = handled, "worker exiting");
}

/// Transform one file, turning a panic into a failed outcome.
fn run_job(id: usize, job: Job, transformer: &dyn Transformer) -> Outcome {
    let result = panic::catch_unwind(AssertUnwindSafe(|| transformer.transform(&job.path)));

    match result {
        Ok(Ok(stats)) => {
            debug!(worker = id, path = %job.path.display(), "processed");
            Outcome::Processed {
                path: job.path,
                worker: id,
                stats,
            }
        }
        Ok(Err(cause)) => {
            warn!(worker = id, path = %job.path.display(), "{}", cause);
            Outcome::Failed {
                path: job.path,
                worker: id,
                cause,
            }
        }
        Err(payload) => {
            let cause = Error::WorkerPanic {
                worker: id,
                message: panic_message(payload.as_ref()),
            };
            warn!(worker = id, path = %job.path.display(), "{}", cause);
            Outcome::Failed {
                path: job.path,
                worker: id,
                cause,
            }
        }
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        String::from("unknown panic payload")
    }
}

/// Get the number of available CPU cores.
pub fn available_parallelism() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::Transformed;
    use crossbeam_channel::bounded;
    use std::collections::HashSet;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts calls; fails on paths containing "bad", panics on "panic".
    #[derive(Default)]
    struct FakeTransformer {
        calls: AtomicUsize,
    }

    impl Transformer for FakeTransformer {
        fn accepts(&self, _path: &Path) -> bool {
            true
        }

        fn transform(&self, path: &Path) -> Result<Transformed> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let name = path.to_string_lossy();
            if name.contains("panic") {
                panic!("transform blew up on {}", name);
            }
            if name.contains("bad") {
                return Err(Error::UnsupportedFormat {
                    path: path.to_path_buf(),
                });
            }
            Ok(Transformed {
                bytes_before: 10,
                bytes_after: 7,
            })
        }
    }

    /// Feed `paths` through a pool of `size` workers and collect every outcome.
    fn run_pool(size: usize, paths: &[&str], capacity: usize) -> (Vec<Outcome>, usize) {
        let fake = Arc::new(FakeTransformer::default());
        let (job_tx, job_rx) = bounded(capacity);
        let (out_tx, out_rx) = bounded(capacity);

        let pool = WorkerPool::spawn(size, job_rx, out_tx, fake.clone()).unwrap();
        assert_eq!(pool.size(), size);

        let owned: Vec<String> = paths.iter().map(|p| p.to_string()).collect();
        let feeder = thread::spawn(move || {
            for path in owned {
                job_tx.send(Job::new(path)).unwrap();
            }
        });

        let outcomes: Vec<Outcome> = out_rx.iter().collect();
        feeder.join().unwrap();
        pool.join().unwrap();
        (outcomes, fake.calls.load(Ordering::SeqCst))
    }

    #[test]
    fn test_available_parallelism() {
        assert!(available_parallelism() >= 1);
    }

    #[test]
    fn test_zero_workers_rejected() {
        let (_job_tx, job_rx) = bounded::<Job>(1);
        let (out_tx, _out_rx) = bounded::<Outcome>(1);
        let result = WorkerPool::spawn(0, job_rx, out_tx, Arc::new(FakeTransformer::default()));
        assert!(matches!(result, Err(Error::InvalidArgument { .. })));
    }

    #[test]
    fn test_one_outcome_per_job() {
        let paths: Vec<String> = (0..50).map(|i| format!("img-{}.jpg", i)).collect();
        let refs: Vec<&str> = paths.iter().map(String::as_str).collect();

        let (outcomes, calls) = run_pool(4, &refs, 3);

        assert_eq!(outcomes.len(), 50);
        assert_eq!(calls, 50);
        let seen: HashSet<_> = outcomes.iter().map(|o| o.path().to_path_buf()).collect();
        assert_eq!(seen.len(), 50, "no job may be processed twice");
    }

    #[test]
    fn test_no_jobs_terminates() {
        let (outcomes, calls) = run_pool(3, &[], 1);
        assert!(outcomes.is_empty());
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_more_workers_than_jobs() {
        let (outcomes, _) = run_pool(16, &["a.png", "b.png"], 1);
        assert_eq!(outcomes.len(), 2);
    }

    #[test]
    fn test_single_worker_tiny_queues() {
        let paths: Vec<String> = (0..20).map(|i| format!("{}.png", i)).collect();
        let refs: Vec<&str> = paths.iter().map(String::as_str).collect();
        let (outcomes, _) = run_pool(1, &refs, 1);
        assert_eq!(outcomes.len(), 20);
        assert!(outcomes.iter().all(|o| o.worker() == 0));
    }

    #[test]
    fn test_failure_is_isolated() {
        let (outcomes, _) = run_pool(2, &["ok1.jpg", "bad.jpg", "ok2.jpg"], 4);

        let failed: Vec<_> = outcomes.iter().filter(|o| o.is_failed()).collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].path(), Path::new("bad.jpg"));
        assert_eq!(outcomes.iter().filter(|o| !o.is_failed()).count(), 2);
    }

    #[test]
    fn test_panic_becomes_failed_outcome() {
        let (outcomes, _) = run_pool(2, &["panic.jpg", "fine.jpg", "also-fine.jpg"], 4);

        assert_eq!(outcomes.len(), 3);
        let failed: Vec<_> = outcomes.iter().filter(|o| o.is_failed()).collect();
        assert_eq!(failed.len(), 1);
        match failed[0] {
            Outcome::Failed { cause, .. } => {
                assert!(matches!(cause, Error::WorkerPanic { .. }));
                assert!(cause.to_string().contains("transform blew up"));
            }
            Outcome::Processed { .. } => unreachable!(),
        }
    }

    #[test]
    fn test_workers_stop_when_collector_gone() {
        let (job_tx, job_rx) = bounded(8);
        let (out_tx, out_rx) = bounded(1);
        let pool = WorkerPool::spawn(2, job_rx, out_tx, Arc::new(FakeTransformer::default())).unwrap();

        drop(out_rx);
        for i in 0..4 {
            job_tx.send(Job::new(format!("{}.jpg", i))).unwrap();
        }
        drop(job_tx);

        pool.join().unwrap();
    }

    #[test]
    fn test_panic_message_payloads() {
        let s: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(panic_message(s.as_ref()), "static");
        let owned: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(owned.as_ref()), "owned");
        let other: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(other.as_ref()), "unknown panic payload");
    }
}
