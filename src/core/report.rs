use crate::domain::model::{CityCountReport, QueryResult};
use crate::domain::ports::{CityStore, Storage};
use crate::utils::error::{EtlError, Result};
use std::sync::Arc;

pub const DEFAULT_REPORT_TEMPLATE: &str = "Number of cities for {state} in {country}";

/// Answers "how many cities does `state` of `country` have" and saves the
/// answer as a CSV report.
pub struct CityCountReporter<S: CityStore, T: Storage> {
    store: Arc<S>,
    storage: T,
    name_template: String,
}

impl<S: CityStore, T: Storage> CityCountReporter<S, T> {
    pub fn new(store: Arc<S>, storage: T) -> Self {
        Self::with_template(store, storage, DEFAULT_REPORT_TEMPLATE)
    }

    pub fn with_template(store: Arc<S>, storage: T, name_template: &str) -> Self {
        Self {
            store,
            storage,
            name_template: name_template.to_string(),
        }
    }

    pub async fn number_of_cities(&self, country: &str, state: &str) -> Result<CityCountReport> {
        let result = self.store.count_cities(country, state).await?;

        let number_of_cities = match result.first_value() {
            Some(value) => value.parse::<i64>().map_err(|e| {
                EtlError::processing(format!("unexpected city count '{}': {}", value, e))
            })?,
            None => 0,
        };

        let file_name = format!("{}.csv", render_report_name(&self.name_template, country, state));
        let csv_data = render_csv(&result)?;
        let report_path = self.storage.write_file(&file_name, &csv_data).await?;
        tracing::debug!("Report written to {}", report_path);

        Ok(CityCountReport {
            country: country.to_string(),
            state: state.to_string(),
            number_of_cities,
            report_path,
        })
    }
}

/// Country and state are made file-name safe before they are substituted, so
/// the report always lands directly inside the storage base directory.
pub fn render_report_name(template: &str, country: &str, state: &str) -> String {
    template
        .replace("{country}", &file_name_component(country))
        .replace("{state}", &file_name_component(state))
        .replace(
            "{timestamp}",
            &chrono::Utc::now().format("%Y%m%d_%H%M%S").to_string(),
        )
}

fn file_name_component(value: &str) -> String {
    let replaced: String = value
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    replaced.replace("..", "_")
}

/// Header row with the column names, then one line per result row.
pub fn render_csv(result: &QueryResult) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&result.columns)?;
    for row in &result.rows {
        writer.write_record(row)?;
    }
    writer
        .into_inner()
        .map_err(|e| EtlError::IoError(e.into_error()))
}
