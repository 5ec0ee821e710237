pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliArgs;
pub use config::TomlConfig;

pub use adapters::LocalStorage;
pub use crate::core::{
    etl::{EtlEngine, EtlOutcome},
    pipeline::{CostPipeline, Sources},
};
pub use utils::error::{CostError, Result};
