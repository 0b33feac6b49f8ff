use crate::domain::model::{City, Country, QueryResult, State};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<String>> + Send;
}

/// Relational target of the import. Every insert ignores rows whose id
/// already exists.
#[async_trait]
pub trait CityStore: Send + Sync {
    /// Creates the tables that are missing and resets the staging table.
    async fn create_schema(&self) -> Result<()>;
    async fn insert_states(&self, rows: &[State]) -> Result<u64>;
    async fn insert_countries(&self, rows: &[Country]) -> Result<u64>;
    async fn insert_staged_cities(&self, rows: &[City]) -> Result<u64>;
    /// Moves staged cities into `cities` once their parents are loaded.
    async fn promote_staged_cities(&self) -> Result<u64>;
    async fn count_cities(&self, country_name: &str, state_name: &str) -> Result<QueryResult>;
}
