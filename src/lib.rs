#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod bar_ref;
pub mod config;
pub mod error;
pub mod queue;
pub mod service;
pub mod surface;
pub mod telemetry;
pub mod types;

pub type Result<T> = std::result::Result<T, error::Error>;
