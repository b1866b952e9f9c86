pub mod config;
pub mod domain;
pub mod infra;
pub mod messaging;
pub mod metrics;
pub mod utils;
