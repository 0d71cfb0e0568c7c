//! Traffic prediction service: configuration and HTTP wiring

pub mod api;
pub mod config;
