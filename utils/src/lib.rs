//! Shared utilities for statkit binaries.

pub mod logging;

pub use logging::{init_logging, LogFormat, LoggingError, ParseLogFormatError};
