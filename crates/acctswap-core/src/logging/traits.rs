//! Logger trait definition

use std::sync::Arc;

/// Logger abstraction used by the command layer
///
/// Implementations:
/// - `NoOpLogger`: Silent logger for tests and embedding
/// - `ConsoleLogger`: Logs to stderr; debug and info only with `--verbose`
pub trait Logger: Send + Sync {
    /// Log a debug message
    fn debug(&self, message: &str);

    /// Log an info message
    fn info(&self, message: &str);

    /// Log a warning message
    fn warn(&self, message: &str);

    /// Log an error message
    fn error(&self, message: &str);
}

/// Type alias for an Arc-wrapped logger
pub type SharedLogger = Arc<dyn Logger>;

/// Convenience macros for logging
#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $($arg:tt)*) => {
        $logger.debug(&format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_info {
    ($logger:expr, $($arg:tt)*) => {
        $logger.info(&format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warn {
    ($logger:expr, $($arg:tt)*) => {
        $logger.warn(&format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_error {
    ($logger:expr, $($arg:tt)*) => {
        $logger.error(&format!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder {
        lines: Mutex<Vec<String>>,
    }

    impl Logger for Recorder {
        fn debug(&self, message: &str) {
            self.lines.lock().push(format!("debug:{message}"));
        }
        fn info(&self, message: &str) {
            self.lines.lock().push(format!("info:{message}"));
        }
        fn warn(&self, message: &str) {
            self.lines.lock().push(format!("warn:{message}"));
        }
        fn error(&self, message: &str) {
            self.lines.lock().push(format!("error:{message}"));
        }
    }

    #[test]
    fn test_macros_format_arguments() {
        let recorder = Recorder::default();
        log_debug!(recorder, "id={}", 3);
        log_warn!(recorder, "{} left", "one");

        let lines = recorder.lines.lock();
        assert_eq!(lines.as_slice(), ["debug:id=3", "warn:one left"]);
    }
}
