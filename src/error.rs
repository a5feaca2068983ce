//! Error types for exifstrip.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for exifstrip operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while stripping a tree of images.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error on a specific file.
    #[error("I/O error for '{}': {source}", path.display())]
    Io {
        #[source]
        source: io::Error,
        path: PathBuf,
    },

    /// File not found.
    #[error("File not found: '{}'", path.display())]
    NotFound { path: PathBuf },

    /// Permission denied.
    #[error("Permission denied: '{}'", path.display())]
    PermissionDenied { path: PathBuf },

    /// The bytes do not parse as the expected format.
    #[error("Failed to decode '{}' as {format}: {source}", path.display())]
    Decode {
        path: PathBuf,
        format: &'static str,
        #[source]
        source: image::ImageError,
    },

    /// The decoded pixels could not be written back out.
    #[error("Failed to encode '{}' as {format}: {source}", path.display())]
    Encode {
        path: PathBuf,
        format: &'static str,
        #[source]
        source: image::ImageError,
    },

    /// No transform is registered for this file.
    #[error("Unsupported format for '{}'", path.display())]
    UnsupportedFormat { path: PathBuf },

    /// A transform panicked, or a worker thread could not be joined.
    #[error("Worker {worker} panicked: {message}")]
    WorkerPanic { worker: usize, message: String },

    /// The walker thread panicked.
    #[error("Walker panicked: {0}")]
    WalkerPanic(String),

    /// Invalid configuration value.
    #[error("Invalid argument '{argument}': {reason}")]
    InvalidArgument { argument: String, reason: String },

    /// A pipeline thread could not be started.
    #[error("Failed to spawn thread: {0}")]
    ThreadSpawn(#[source] io::Error),

    /// One or more files or the walk failed during a run.
    #[error(transparent)]
    Aggregate(#[from] AggregateError),
}

impl Error {
    /// Create an I/O error with path context.
    pub fn io_with_path(err: io::Error, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match err.kind() {
            io::ErrorKind::NotFound => Error::NotFound { path },
            io::ErrorKind::PermissionDenied => Error::PermissionDenied { path },
            _ => Error::Io { source: err, path },
        }
    }

    /// Create a decode error.
    pub fn decode(path: impl Into<PathBuf>, format: &'static str, source: image::ImageError) -> Self {
        Error::Decode {
            path: path.into(),
            format,
            source,
        }
    }

    /// Create an encode error.
    pub fn encode(path: impl Into<PathBuf>, format: &'static str, source: image::ImageError) -> Self {
        Error::Encode {
            path: path.into(),
            format,
            source,
        }
    }
}

/// Failure of the directory walk itself, as opposed to a per-file failure.
///
/// Aborts further discovery but never the jobs already handed to workers.
#[derive(Error, Debug)]
#[error("{source}")]
pub struct TraversalError {
    #[source]
    source: walkdir::Error,
}

impl TraversalError {
    /// Path the walker was visiting when it failed, if known.
    pub fn path(&self) -> Option<&Path> {
        self.source.path()
    }

    /// Underlying I/O error, if the failure came from the filesystem.
    pub fn io_error(&self) -> Option<&io::Error> {
        self.source.io_error()
    }

    /// Whether the failure was a symlink loop.
    pub fn is_loop(&self) -> bool {
        self.source.loop_ancestor().is_some()
    }
}

impl From<walkdir::Error> for TraversalError {
    fn from(source: walkdir::Error) -> Self {
        Self { source }
    }
}

/// Combined error for a run: the traversal error (if any) followed by every
/// per-file failure in arrival order.
#[derive(Error, Debug)]
#[error("errors occurred:\n{}", .lines.join("\n"))]
pub struct AggregateError {
    lines: Vec<String>,
}

impl AggregateError {
    /// Build from already-rendered problem lines.
    pub fn new(lines: Vec<String>) -> Self {
        Self { lines }
    }
}
