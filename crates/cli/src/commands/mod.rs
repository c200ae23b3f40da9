//! CLI command implementations

mod catalog;
mod config;
mod search;

pub use catalog::{cmd_courses, cmd_filters, cmd_preload, cmd_suggestions};
pub use config::{cmd_config_init, cmd_config_show};
pub use search::cmd_search;
