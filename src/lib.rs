pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{LocalStorage, PostgresStore, SqliteStore};
pub use config::database::{Backend, DatabaseConfig};
pub use crate::core::{
    etl::{EtlEngine, RunPlan},
    importer::Importer,
    report::CityCountReporter,
};
pub use utils::error::{EtlError, Result};
