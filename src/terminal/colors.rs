//! Status symbols and styled console output.
//!
//! Color is used only when the stream is a terminal and `NO_COLOR` is unset.

use console::{StyledObject, style};
use humansize::{BINARY, format_size as human_size};

/// Check if stdout is a terminal that supports colors.
pub fn stdout_supports_color() -> bool {
    console::colors_enabled() && std::env::var_os("NO_COLOR").is_none()
}

/// Check if stderr is a terminal that supports colors.
pub fn stderr_supports_color() -> bool {
    console::colors_enabled_stderr() && std::env::var_os("NO_COLOR").is_none()
}

/// Kind of status line, each with its own symbol and color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Error,
    Warning,
    Info,
}

impl Status {
    fn symbol(self) -> char {
        match self {
            Status::Success => '\u{2713}',
            Status::Error => '\u{2717}',
            Status::Warning => '\u{26A0}',
            Status::Info => '\u{2139}',
        }
    }

    /// Bold plus the status color, or plain text when `color` is false.
    pub fn paint<D>(self, content: D, color: bool) -> StyledObject<D> {
        let styled = style(content).force_styling(color).bold();
        match self {
            Status::Success => styled.green(),
            Status::Error => styled.red(),
            Status::Warning => styled.yellow(),
            Status::Info => styled.blue(),
        }
    }
}

/// The status symbol, styled.
pub fn symbol(status: Status, color: bool) -> StyledObject<char> {
    status.paint(status.symbol(), color)
}

/// Render `message` behind its status symbol.
pub fn status_line(status: Status, message: &str, color: bool) -> String {
    format!("{} {}", symbol(status, color), message)
}

/// Print a success message.
pub fn print_success(message: &str) {
    println!("{}", status_line(Status::Success, message, stdout_supports_color()));
}

/// Print an error message to stderr.
pub fn print_error(message: &str) {
    eprintln!("{}", status_line(Status::Error, message, stderr_supports_color()));
}

/// Print a warning message.
pub fn print_warning(message: &str) {
    println!("{}", status_line(Status::Warning, message, stdout_supports_color()));
}

/// Print an info message.
pub fn print_info(message: &str) {
    println!("{}", status_line(Status::Info, message, stdout_supports_color()));
}

/// Format a byte count in binary units.
pub fn format_size(bytes: u64) -> String {
    human_size(bytes, BINARY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use console::strip_ansi_codes;

    #[test]
    fn test_status_line_plain() {
        assert_eq!(status_line(Status::Success, "done", false), "\u{2713} done");
        assert_eq!(status_line(Status::Error, "nope", false), "\u{2717} nope");
    }

    #[test]
    fn test_status_line_colored() {
        let line = status_line(Status::Warning, "careful", true);
        assert!(line.starts_with("\x1b["));
        assert_eq!(strip_ansi_codes(&line), "\u{26A0} careful");
    }

    #[test]
    fn test_symbols() {
        assert_eq!(symbol(Status::Info, false).to_string(), "\u{2139}");
        assert_ne!(
            symbol(Status::Success, true).to_string(),
            symbol(Status::Error, true).to_string()
        );
    }

    #[test]
    fn test_format_size_bytes() {
        assert_eq!(format_size(500), "500 B");
    }

    #[test]
    fn test_format_size_units() {
        assert_eq!(format_size(2048), "2 KiB");
        assert_eq!(format_size(5 * 1024 * 1024), "5 MiB");
        assert_eq!(format_size(2 * 1024 * 1024 * 1024), "2 GiB");
    }
}
