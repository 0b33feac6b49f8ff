use crate::core::batch::{Batcher, Flush};
use crate::core::json_stream::spawn_reader;
use crate::domain::model::ImportSummary;
use crate::domain::ports::CityStore;
use crate::utils::error::Result;
use crate::utils::logger::timed;
use std::path::Path;
use std::sync::Arc;

pub const DEFAULT_BATCH_SIZE: usize = 10_000;

// Records in flight between the file reader thread and the writer.
const CHANNEL_CAPACITY: usize = 1024;

pub struct Importer<S: CityStore> {
    store: Arc<S>,
    batch_size: usize,
}

impl<S: CityStore> Importer<S> {
    pub fn new(store: Arc<S>, batch_size: usize) -> Self {
        Self { store, batch_size }
    }

    /// Prepares the schema, streams `data_path` into the parent tables and
    /// the staging table, then promotes staged cities.
    pub async fn import(&self, data_path: &Path) -> Result<ImportSummary> {
        timed("create_db_structures", self.store.create_schema()).await?;

        let mut summary = timed("insert_json_to_db", self.load_records(data_path)).await?;

        summary.cities_promoted =
            timed("move_data_from_tmp_table", self.store.promote_staged_cities()).await?;

        tracing::info!(
            "Imported {} records ({} states, {} countries, {} cities promoted) in {} batches",
            summary.records_read,
            summary.states_written,
            summary.countries_written,
            summary.cities_promoted,
            summary.batches_flushed
        );
        Ok(summary)
    }

    async fn load_records(&self, data_path: &Path) -> Result<ImportSummary> {
        let (mut records, reader) = spawn_reader(data_path.to_path_buf(), CHANNEL_CAPACITY);
        let mut batcher = Batcher::new(self.batch_size);
        let mut summary = ImportSummary::default();

        while let Some(record) = records.recv().await {
            for flush in batcher.push(record) {
                if let Err(e) = self.write(flush, &mut summary).await {
                    // Closing the channel makes the reader thread stop at its next send.
                    drop(records);
                    let _ = reader.await;
                    return Err(e);
                }
            }
        }

        summary.records_read = reader.await??;

        for flush in batcher.finish() {
            self.write(flush, &mut summary).await?;
        }

        Ok(summary)
    }

    async fn write(&self, flush: Flush, summary: &mut ImportSummary) -> Result<()> {
        let rows = flush.len();
        match flush {
            Flush::States(states) => {
                let inserted = self.store.insert_states(&states).await?;
                tracing::debug!("Flushed {} states ({} new)", rows, inserted);
                summary.states_written += rows;
            }
            Flush::Countries(countries) => {
                let inserted = self.store.insert_countries(&countries).await?;
                tracing::debug!("Flushed {} countries ({} new)", rows, inserted);
                summary.countries_written += rows;
            }
            Flush::Cities(cities) => {
                let inserted = self.store.insert_staged_cities(&cities).await?;
                tracing::debug!("Staged {} cities ({} new)", rows, inserted);
                summary.cities_staged += rows;
            }
        }
        summary.batches_flushed += 1;
        Ok(())
    }
}
