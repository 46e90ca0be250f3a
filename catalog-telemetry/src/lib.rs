//! Logging and metrics setup shared by catalog binaries and tests.

pub mod metrics;
pub mod tracing;
