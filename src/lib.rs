//! Booking Prep - предобработка данных бронирований отелей

pub mod config;
pub mod error;
pub mod frame;
pub mod io;
pub mod models;
pub mod pipeline;
pub mod preprocessing;
pub mod types;

pub use config::{Config, ConfigError, PathConfig, ProcessingConfig};
pub use error::{ProcessingError, Stage, StageError};
pub use pipeline::DataProcessor;
pub use types::*;

/// Инициализация логирования (повторный вызов ничего не делает)
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
