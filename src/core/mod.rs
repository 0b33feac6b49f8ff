pub mod batch;
pub mod etl;
pub mod importer;
pub mod json_stream;
pub mod report;
pub mod sql;

pub use crate::domain::model::{CityRecord, ImportSummary, QueryResult};
pub use crate::domain::ports::{CityStore, Storage};
pub use crate::utils::error::Result;
