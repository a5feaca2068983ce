//! exifstrip - strip metadata from a tree of images.

use clap::{CommandFactory, Parser};
use exifstrip::cli::Config;
use exifstrip::processor::Processor;
use exifstrip::terminal::{print_error, print_info, print_success, print_summary, print_warning};
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let config = Config::parse();

    // No folder given: show usage, not an error.
    let Some(root) = config.root.clone() else {
        let _ = Config::command().print_help();
        return ExitCode::SUCCESS;
    };

    setup_logging(&config);

    if config.dry_run && !config.quiet {
        print_info("Dry run: no files will be modified");
    }

    let processor = Processor::new(config.clone());
    let report = match processor.process_folder(&root) {
        Ok(report) => report,
        Err(e) => {
            error!("{}", e);
            print_error(&format!("Error processing folder: {}", e));
            return ExitCode::FAILURE;
        }
    };

    if report.stats().discovered == 0 && report.traversal_error().is_none() && !config.quiet {
        print_warning("No JPG or PNG files found");
    }

    print_summary(report.stats(), config.dry_run, config.quiet);

    match report.into_result() {
        Ok(_) => {
            if !config.quiet {
                print_success("Successfully removed metadata from all JPG and PNG files.");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            print_error(&format!("Error processing folder: {}", e));
            ExitCode::FAILURE
        }
    }
}

fn setup_logging(config: &Config) {
    let default = if config.quiet {
        "error"
    } else if config.verbose {
        "exifstrip=debug,warn"
    } else {
        "exifstrip=info,warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
