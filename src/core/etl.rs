use crate::core::importer::Importer;
use crate::core::report::CityCountReporter;
use crate::domain::model::{CityCountReport, ImportSummary};
use crate::domain::ports::{CityStore, Storage};
use crate::utils::error::Result;
use crate::utils::logger::timed;
use crate::utils::monitor::SystemMonitor;
use std::path::PathBuf;
use std::time::Instant;

/// What a single run should do.
#[derive(Debug, Clone)]
pub struct RunPlan {
    /// `None` skips the import and only runs the report.
    pub data_path: Option<PathBuf>,
    pub country: String,
    pub state: String,
}

#[derive(Debug, Clone)]
pub struct EtlOutcome {
    pub import: Option<ImportSummary>,
    pub report: CityCountReport,
}

pub struct EtlEngine<S: CityStore, T: Storage> {
    importer: Importer<S>,
    reporter: CityCountReporter<S, T>,
    monitor: SystemMonitor,
}

impl<S: CityStore, T: Storage> EtlEngine<S, T> {
    pub fn new(importer: Importer<S>, reporter: CityCountReporter<S, T>) -> Self {
        Self::new_with_monitoring(importer, reporter, false)
    }

    pub fn new_with_monitoring(
        importer: Importer<S>,
        reporter: CityCountReporter<S, T>,
        monitor_enabled: bool,
    ) -> Self {
        Self {
            importer,
            reporter,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self, plan: &RunPlan) -> Result<EtlOutcome> {
        tracing::info!("Starting ETL process");
        self.monitor.log_phase("Start");

        let import = match &plan.data_path {
            Some(path) => {
                tracing::info!("Importing {}", path.display());
                let started = Instant::now();
                let summary = timed("import_data_to_db", self.importer.import(path)).await?;
                self.monitor.log_import(&summary, started.elapsed());
                Some(summary)
            }
            None => {
                tracing::info!("Import skipped");
                None
            }
        };

        let report = timed(
            "number_of_cities",
            self.reporter.number_of_cities(&plan.country, &plan.state),
        )
        .await?;
        self.monitor.log_phase("Report");
        self.monitor.log_final();

        Ok(EtlOutcome { import, report })
    }
}
