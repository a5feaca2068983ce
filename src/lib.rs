//! exifstrip - strip metadata from a tree of images
//!
//! Walks a folder, finds every JPEG and PNG by extension, and rewrites each
//! file in place by decoding and re-encoding its pixels. EXIF, XMP, text
//! chunks and comments do not survive the round trip.
//!
//! # Supported Formats
//!
//! - JPEG (.jpg, .jpeg), re-encoded at quality 100
//! - PNG (.png), re-encoded losslessly
//!
//! # Pipeline
//!
//! A walker thread feeds a bounded job queue, a fixed pool of workers
//! transforms files, and the calling thread aggregates the results into a
//! single [`Report`]. One bad file never stops the others.
//!
//! # Example
//!
//! ```no_run
//! use exifstrip::{Config, Processor};
//! use std::path::Path;
//!
//! let processor = Processor::new(Config::default());
//! let report = processor.process_folder(Path::new("photos")).unwrap();
//! println!("Processed {} files", report.stats().processed);
//! ```

pub mod aggregate;
pub mod cli;
pub mod error;
pub mod formats;
pub mod parallel;
pub mod processor;
pub mod terminal;
pub mod walker;

pub use aggregate::{Aggregator, Outcome, Report, RunStats};
pub use cli::Config;
pub use error::{Error, Result, TraversalError};
pub use formats::{ImageFormat, Registry, Transformed, Transformer};
pub use parallel::{Job, WorkerPool, available_parallelism};
pub use processor::Processor;
pub use walker::{WalkSummary, Walker};
