//! Stderr logger for the binary

use super::traits::Logger;

/// Writes diagnostics to stderr, keeping stdout for command output.
///
/// Warnings and errors are always shown; debug and info only when verbose.
#[derive(Debug, Clone)]
pub struct ConsoleLogger {
    prefix: String,
    verbose: bool,
}

impl Default for ConsoleLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleLogger {
    /// Warnings and errors only
    pub fn new() -> Self {
        Self {
            prefix: "[acctswap]".to_string(),
            verbose: false,
        }
    }

    /// Everything, for `--verbose`
    pub fn verbose() -> Self {
        Self {
            verbose: true,
            ..Self::new()
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    fn line(&self, level: &str, message: &str) -> String {
        format!("{} {}: {}", self.prefix, level, message)
    }
}

impl Logger for ConsoleLogger {
    fn debug(&self, message: &str) {
        if self.verbose {
            eprintln!("{}", self.line("debug", message));
        }
    }

    fn info(&self, message: &str) {
        if self.verbose {
            eprintln!("{}", self.line("info", message));
        }
    }

    fn warn(&self, message: &str) {
        eprintln!("{}", self.line("warning", message));
    }

    fn error(&self, message: &str) {
        eprintln!("{}", self.line("error", message));
    }
}
