pub mod config;
pub mod error;
pub mod farm;
pub mod telemetry;
