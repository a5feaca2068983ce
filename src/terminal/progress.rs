//! Live progress and the end-of-run summary.

use super::colors::{Status, format_size, stdout_supports_color, symbol};
use crate::aggregate::{Outcome, RunStats};
use console::{Alignment, pad_str, style};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, IsTerminal};
use std::time::Duration;

/// Longest file name shown on the progress line.
const MAX_NAME: usize = 30;

/// Inner width of the summary box, borders excluded.
const BOX_WIDTH: usize = 38;

/// Running counter for a walk whose total is not known up front.
///
/// Drawn as a spinner on stderr; hidden when stderr is not a terminal.
pub struct Progress {
    bar: ProgressBar,
    done: usize,
    failed: usize,
}

impl Progress {
    pub fn new(enabled: bool) -> Self {
        let bar = if enabled && io::stderr().is_terminal() {
            spinner()
        } else {
            ProgressBar::hidden()
        };

        Self {
            bar,
            done: 0,
            failed: 0,
        }
    }

    /// Count one outcome and update the spinner message.
    pub fn record(&mut self, outcome: &Outcome) {
        self.done += 1;
        if outcome.is_failed() {
            self.failed += 1;
        }

        if !self.bar.is_hidden() {
            let name = outcome
                .path()
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            self.bar.set_message(self.line(&name));
        }
    }

    /// Run `f` with the spinner cleared, then redraw it.
    pub fn suspend<F: FnOnce() -> R, R>(&self, f: F) -> R {
        self.bar.suspend(f)
    }

    pub fn done(&self) -> usize {
        self.done
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    fn line(&self, current: &str) -> String {
        format!(
            "{} files done, {} failed - {}",
            self.done,
            self.failed,
            shorten(current, MAX_NAME)
        )
    }

    /// Remove the spinner so later output starts on a clean line.
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

fn spinner() -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} [{elapsed}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

/// Keep the tail of `name` if it is longer than `max` characters.
fn shorten(name: &str, max: usize) -> String {
    let count = name.chars().count();
    if count <= max {
        return name.to_string();
    }
    let tail: String = name.chars().skip(count - (max - 3)).collect();
    format!("...{}", tail)
}

/// Lines of the summary box.
fn summary_lines(stats: &RunStats, dry_run: bool, color: bool) -> Vec<String> {
    let mut lines = vec![format!(
        "  {} Processed:   {} files",
        symbol(Status::Success, color),
        stats.processed
    )];

    if stats.failed > 0 {
        lines.push(format!(
            "  {} Failed:      {} files",
            symbol(Status::Error, color),
            stats.failed
        ));
    }
    if stats.skipped > 0 {
        lines.push(format!(
            "  {} Skipped:     {} files",
            symbol(Status::Warning, color),
            stats.skipped
        ));
    }

    lines.push(String::new());
    let verb = if dry_run { "Would remove" } else { "Bytes removed" };
    lines.push(format!("  {}: {}", verb, format_size(stats.bytes_removed())));
    lines.push(format!(
        "  Time elapsed: {:.1}s",
        stats.duration.as_secs_f64()
    ));
    lines
}

/// One row of the box. Padding counts visible columns, not escape bytes.
fn boxed(content: &str, align: Alignment) -> String {
    format!("\u{2502}{}\u{2502}", pad_str(content, BOX_WIDTH, align, None))
}

/// Print a summary report box.
pub fn print_summary(stats: &RunStats, dry_run: bool, quiet: bool) {
    if quiet {
        return;
    }

    let color = stdout_supports_color();
    let rule = "\u{2500}".repeat(BOX_WIDTH);
    let title = style("Processing Complete").bold().force_styling(color).to_string();

    println!();
    println!("\u{256D}{}\u{256E}", rule);
    println!("{}", boxed(&title, Alignment::Center));
    println!("\u{251C}{}\u{2524}", rule);
    for line in summary_lines(stats, dry_run, color) {
        println!("{}", boxed(&line, Alignment::Left));
    }
    println!("\u{2570}{}\u{256F}", rule);
}
