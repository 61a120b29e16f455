//! Shared helpers: error types, digests, path checks and telemetry.

pub mod digest;
pub mod errors;
pub mod paths;
pub mod telemetry;
