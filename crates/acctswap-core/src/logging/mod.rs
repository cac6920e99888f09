//! Logging abstractions
//!
//! Commands report progress through a `Logger` handed in by the binary, while
//! storage backends write to the global debug file in `file_logger`.

mod traits;
mod noop;
mod console;
pub mod file_logger;

pub use traits::{Logger, SharedLogger};
pub use noop::NoOpLogger;
pub use console::ConsoleLogger;

pub use file_logger::{log_file_path, LogLevel};
