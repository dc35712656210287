//! Output formatting
//!
//! Results go to stdout so they can be piped; status lines go to stderr.

use console::{style, Term};

/// Status and result printer
#[derive(Debug)]
pub struct Reporter {
    term: Term,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl Reporter {
    /// Create a new reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            use_color,
            quiet,
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }

        let prefix = if self.use_color {
            style("✓").green().bold().to_string()
        } else {
            "OK".to_string()
        };

        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// Print a failure message
    pub fn failure(&self, message: &str) {
        // Failures are printed in quiet mode too
        let prefix = if self.use_color {
            style("✗").red().bold().to_string()
        } else {
            "FAIL".to_string()
        };

        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.quiet {
            return;
        }

        let prefix = if self.use_color {
            style("ℹ").blue().bold().to_string()
        } else {
            "INFO".to_string()
        };

        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// Format a `label: value` result line
    #[must_use]
    pub fn field_line(&self, label: &str, value: &str, width: usize) -> String {
        let label = format!("{label:<width$}");
        if self.use_color {
            format!("{} {value}", style(label).cyan())
        } else {
            format!("{label} {value}")
        }
    }

    /// Print aligned `label: value` result lines to stdout
    pub fn fields(&self, rows: &[(&str, String)]) {
        let width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0) + 1;
        for (label, value) in rows {
            println!("{}", self.field_line(&format!("{label}:"), value, width));
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod reporter_tests {
        use super::*;

        #[test]
        fn test_default_reporter() {
            let reporter = Reporter::default();
            assert!(reporter.use_color);
            assert!(!reporter.quiet);
        }

        #[test]
        fn test_plain_field_line_is_padded() {
            let reporter = Reporter::new(false, false);
            assert_eq!(reporter.field_line("id:", "edit-body", 6), "id:    edit-body");
        }

        #[test]
        fn test_messages_do_not_panic() {
            let reporter = Reporter::new(false, false);
            reporter.success("done");
            reporter.info("note");
            reporter.failure("broken");
        }

        #[test]
        fn test_quiet_mode_still_reports_failures() {
            let reporter = Reporter::new(false, true);
            reporter.success("hidden");
            reporter.info("hidden");
            reporter.failure("shown");
        }
    }
}
