//! Structured logging setup.

pub mod logging;

pub use logging::{LoggingConfig, init_logging};
