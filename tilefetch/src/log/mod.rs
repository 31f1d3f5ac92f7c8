//! Logging abstraction layer.
//!
//! Library components log through the [`Logger`] trait rather than calling
//! `tracing` directly, so tests can run them silently or capture what they
//! report.
//!
//! - `TracingLogger`: production adapter that delegates to the `tracing` crate
//! - `NoOpLogger`: silent logger for tests
//!
//! Components accept an `Arc<dyn Logger>` and use the crate's macros:
//!
//! ```
//! use tilefetch::log::{Logger, NoOpLogger};
//! use tilefetch::{log_debug, log_info};
//! use std::sync::Arc;
//!
//! let logger: Arc<dyn Logger> = Arc::new(NoOpLogger);
//! log_info!(logger, "Session started: {} tiles", 25);
//! log_debug!(logger, "Skipped {}", "14/6785/1716");
//! ```

mod noop;
mod tracing_adapter;
mod r#trait;

pub use noop::NoOpLogger;
pub use r#trait::{LogLevel, Logger};
pub use tracing_adapter::TracingLogger;

#[cfg(test)]
pub(crate) use noop::tests::RecordingLogger;
