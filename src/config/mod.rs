pub mod database;

#[cfg(feature = "cli")]
pub use cli::CliConfig;

#[cfg(feature = "cli")]
mod cli {
    use crate::config::database::Backend;
    use crate::core::etl::RunPlan;
    use crate::core::importer::DEFAULT_BATCH_SIZE;
    use crate::core::report::DEFAULT_REPORT_TEMPLATE;
    use crate::utils::error::Result;
    use crate::utils::validation::{
        validate_non_empty_string, validate_path, validate_positive_number, Validate,
    };
    use clap::Parser;
    use std::path::PathBuf;

    #[derive(Debug, Clone, Parser)]
    #[command(name = "cities-etl")]
    #[command(about = "Import a JSON dump of cities into a relational database and count cities per state")]
    pub struct CliConfig {
        /// Database configuration file (TOML)
        #[arg(short, long, default_value = "database.toml")]
        pub config: PathBuf,

        #[arg(long, value_enum, default_value = "postgres")]
        pub backend: Backend,

        /// Config file section to read; defaults to the backend's own section
        #[arg(long)]
        pub section: Option<String>,

        /// JSON file holding an array of city records
        #[arg(short, long, default_value = "data/cities.json")]
        pub data: PathBuf,

        /// Rows buffered per table before they are written
        #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
        pub batch_size: usize,

        #[arg(long, default_value = "Poland")]
        pub country: String,

        #[arg(long, default_value = "Masovian Voivodeship")]
        pub state: String,

        /// Directory the CSV report is written to
        #[arg(short, long, default_value = ".")]
        pub output_dir: PathBuf,

        /// Report file name without extension; {country}, {state} and {timestamp} are replaced
        #[arg(long, default_value = DEFAULT_REPORT_TEMPLATE)]
        pub report_name: String,

        /// Only run the report against data that is already loaded
        #[arg(long)]
        pub skip_import: bool,

        /// Also write log lines to this file (truncated on start)
        #[arg(long)]
        pub log_file: Option<PathBuf>,

        /// Emit JSON log lines instead of the compact format
        #[arg(long)]
        pub json_logs: bool,

        #[arg(short, long, help = "Enable verbose output")]
        pub verbose: bool,

        #[arg(long, help = "Log CPU and memory usage per phase")]
        pub monitor: bool,
    }

    impl CliConfig {
        pub fn section_name(&self) -> &str {
            self.section
                .as_deref()
                .unwrap_or_else(|| self.backend.default_section())
        }

        pub fn run_plan(&self) -> RunPlan {
            RunPlan {
                data_path: (!self.skip_import).then(|| self.data.clone()),
                country: self.country.clone(),
                state: self.state.clone(),
            }
        }
    }

    impl Validate for CliConfig {
        fn validate(&self) -> Result<()> {
            validate_path("config", &self.config.to_string_lossy())?;
            if !self.skip_import {
                validate_path("data", &self.data.to_string_lossy())?;
            }
            validate_path("output_dir", &self.output_dir.to_string_lossy())?;
            validate_positive_number("batch_size", self.batch_size, 1)?;
            validate_non_empty_string("country", &self.country)?;
            validate_non_empty_string("state", &self.state)?;
            validate_non_empty_string("report_name", &self.report_name)?;
            Ok(())
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_defaults() {
            let config = CliConfig::parse_from(["cities-etl"]);
            assert_eq!(config.backend, Backend::Postgres);
            assert_eq!(config.section_name(), "postgresql");
            assert_eq!(config.batch_size, 10_000);
            assert_eq!(config.country, "Poland");
            assert_eq!(config.state, "Masovian Voivodeship");
            assert_eq!(config.data, PathBuf::from("data/cities.json"));
            assert!(config.validate().is_ok());

            let plan = config.run_plan();
            assert_eq!(plan.data_path, Some(PathBuf::from("data/cities.json")));
        }

        #[test]
        fn test_skip_import_and_sqlite_backend() {
            let config = CliConfig::parse_from([
                "cities-etl",
                "--backend",
                "sqlite",
                "--skip-import",
                "--country",
                "Germany",
                "--state",
                "Bavaria",
            ]);
            assert_eq!(config.section_name(), "sqlite");
            assert!(config.run_plan().data_path.is_none());
            assert_eq!(config.run_plan().state, "Bavaria");
        }

        #[test]
        fn test_explicit_section_wins() {
            let config = CliConfig::parse_from(["cities-etl", "--section", "staging_db"]);
            assert_eq!(config.section_name(), "staging_db");
        }

        #[test]
        fn test_json_logs_combine_with_log_file() {
            let config =
                CliConfig::parse_from(["cities-etl", "--json-logs", "--log-file", "run.log"]);
            assert!(config.json_logs);
            assert_eq!(config.log_file, Some(PathBuf::from("run.log")));
        }

        #[test]
        fn test_zero_batch_size_rejected() {
            let config = CliConfig::parse_from(["cities-etl", "--batch-size", "0"]);
            assert!(config.validate().is_err());
        }
    }
}
