//! Infrastructure adapters and runtime bootstrap.

pub mod catalog;
pub mod error;
pub mod http;
pub mod origin;
pub mod prewarm_driver;
pub mod telemetry;
