pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::http::{HttpEntityValidator, HttpImportApi};
pub use app::pipelines::csv_import_pipeline::CsvImportPipeline;
pub use config::{cli::LocalStorage, toml_config::ImportConfig};
#[cfg(feature = "cli")]
pub use config::CliArgs;
pub use self::core::dispatcher::{Dispatcher, ImportProgress, ProgressReporter, IMPORT_PROGRESS};
pub use self::core::etl::ImportEngine;
pub use utils::error::{ImportError, Result};
