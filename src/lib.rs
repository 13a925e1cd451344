pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{CsvRecordSource, LocalStore};
pub use core::{engine::ColorEngine, pipeline::DatasetPipeline};
pub use domain::model::{ColorBreakpoint, ColorTable, Rgb, TableKind};
pub use utils::error::{ColorError, Result};
