use anyhow::Context;
use cities_etl::core::etl::EtlOutcome;
use cities_etl::core::CityStore;
use cities_etl::utils::error::ErrorSeverity;
use cities_etl::utils::{logger, validation::Validate};
use cities_etl::{
    CityCountReporter, CliConfig, DatabaseConfig, EtlEngine, EtlError, Importer, LocalStorage,
    PostgresStore, SqliteStore,
};
use clap::Parser;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    if config.json_logs {
        logger::init_json_logger(config.verbose, config.log_file.as_deref())
            .context("failed to open the log file")?;
    } else {
        logger::init_cli_logger(config.verbose, config.log_file.as_deref())
            .context("failed to open the log file")?;
    }

    tracing::info!("Starting cities-etl");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    if let Err(e) = config.validate() {
        fail(&e);
    }

    let db_config =
        match DatabaseConfig::from_file(&config.config, config.backend, config.section_name()) {
            Ok(db_config) => db_config,
            Err(e) => fail(&e),
        };
    if let Err(e) = db_config.validate() {
        fail(&e);
    }

    if config.monitor {
        tracing::info!("System monitoring enabled");
    }

    let outcome = match &db_config {
        DatabaseConfig::Postgres(pg) => match PostgresStore::connect(pg).await {
            Ok(store) => run(store, &config).await,
            Err(e) => Err(e),
        },
        DatabaseConfig::Sqlite(sqlite) => match SqliteStore::open(&sqlite.path) {
            Ok(store) => run(store, &config).await,
            Err(e) => Err(e),
        },
    };

    match outcome {
        Ok(outcome) => {
            if let Some(summary) = &outcome.import {
                println!(
                    "Imported {} records into {} states, {} countries and {} cities",
                    summary.records_read,
                    summary.states_written,
                    summary.countries_written,
                    summary.cities_promoted
                );
            }
            let report = &outcome.report;
            println!(
                "Number of cities for {} in {}: {}",
                report.state, report.country, report.number_of_cities
            );
            println!("Report saved to: {}", report.report_path);
            tracing::info!("ETL process completed successfully");
        }
        Err(e) => fail(&e),
    }

    Ok(())
}

async fn run<S: CityStore>(store: S, config: &CliConfig) -> cities_etl::Result<EtlOutcome> {
    let store = Arc::new(store);
    let importer = Importer::new(store.clone(), config.batch_size);
    let reporter = CityCountReporter::with_template(
        store,
        LocalStorage::new(config.output_dir.clone()),
        &config.report_name,
    );

    let engine = EtlEngine::new_with_monitoring(importer, reporter, config.monitor);
    engine.run(&config.run_plan()).await
}

fn fail(e: &EtlError) -> ! {
    tracing::error!(
        "ETL process failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("{}", e.user_friendly_message());
    eprintln!("Suggestion: {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}
