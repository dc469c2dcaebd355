//! Application configuration

mod app_config;

pub use app_config::{AppConfig, HarnessConfig, LogFormat, LoggingConfig};
