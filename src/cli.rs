//! Command-line configuration.

use crate::parallel::available_parallelism;
use clap::Parser;
use std::path::PathBuf;

/// Application name.
pub const NAME: &str = "exifstrip";

/// Default capacity of the intake and outcome channels.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;

/// Strip metadata from every JPEG and PNG under a folder
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(
    name = NAME,
    version,
    about = "Strip metadata from every JPEG and PNG under a folder",
    long_about = "Recursively finds .jpg, .jpeg and .png files and rewrites each one in place \
                  by decoding and re-encoding its pixels. EXIF, XMP, text chunks and comments \
                  are dropped. Files are modified destructively; keep a backup.",
    after_help = "EXAMPLES:\n    \
        exifstrip ./photos                 Strip everything under ./photos\n    \
        exifstrip -j 4 ./photos            Use 4 worker threads\n    \
        exifstrip -n -v ./photos           Dry run, list every file"
)]
pub struct Config {
    /// Folder to process recursively
    #[arg(value_name = "ROOT")]
    pub root: Option<PathBuf>,

    /// Number of worker threads (default: available CPU cores)
    #[arg(short = 'j', long, value_name = "N", value_parser = parse_positive)]
    pub jobs: Option<usize>,

    /// Capacity of the job and result queues
    #[arg(
        long,
        value_name = "N",
        default_value_t = DEFAULT_QUEUE_CAPACITY,
        value_parser = parse_positive
    )]
    pub queue_capacity: usize,

    /// Follow symbolic links while walking
    #[arg(short = 'L', long)]
    pub follow_links: bool,

    /// Decode and re-encode without writing anything
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Show every processed file and debug logs
    #[arg(short = 'v', long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Suppress everything except errors
    #[arg(short = 'q', long)]
    pub quiet: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: None,
            jobs: None,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            follow_links: false,
            dry_run: false,
            verbose: false,
            quiet: false,
        }
    }
}

impl Config {
    /// Worker count, falling back to the number of CPU cores.
    pub fn worker_count(&self) -> usize {
        self.jobs.unwrap_or_else(available_parallelism)
    }
}

/// Parse a count that must be at least 1.
fn parse_positive(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err(String::from("must be at least 1")),
        Ok(n) => Ok(n),
        Err(_) => Err(format!("'{}' is not a valid number", value)),
    }
}
