//! Observability subsystem for divforms
//!
//! - Structured logging through `tracing` (JSON or pretty)
//! - Lock-free operational counters
//!
//! # Principles
//!
//! 1. Observability is read-only
//! 2. No side effects on request handling
//! 3. Counters are monotonic and reset only on process start

mod logger;
mod metrics;

pub use logger::{init_logging, LogFormat, LoggingConfig};
pub use metrics::{MetricsRegistry, MetricsSnapshot};
