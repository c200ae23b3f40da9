//! Shared types for coursefinder: configuration and the course catalog model.

pub mod config;
pub mod course;

pub use config::{CatalogConfig, Config, ConfigError, EmbeddingConfig, EmbeddingProvider, LoggingConfig, SearchConfig};
pub use course::{CourseField, CourseRecord, is_missing};
