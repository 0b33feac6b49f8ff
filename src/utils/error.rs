use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("PostgreSQL error: {0}")]
    PostgresError(#[from] tokio_postgres::Error),

    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Section {section} not found in the {file} file")]
    MissingSectionError { section: String, file: String },

    #[error("Missing configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("Background task failed: {0}")]
    TaskError(#[from] tokio::task::JoinError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Input,
    Database,
    Output,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn processing(message: impl Into<String>) -> Self {
        EtlError::ProcessingError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::TomlError(_)
            | EtlError::MissingSectionError { .. }
            | EtlError::MissingConfigError { .. }
            | EtlError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            EtlError::JsonError(_) | EtlError::ProcessingError { .. } => ErrorCategory::Input,
            EtlError::PostgresError(_) | EtlError::SqliteError(_) => ErrorCategory::Database,
            EtlError::CsvError(_) => ErrorCategory::Output,
            EtlError::IoError(_) | EtlError::TaskError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Configuration | ErrorCategory::Input | ErrorCategory::Output => {
                ErrorSeverity::High
            }
            // A dropped connection is worth retrying; everything else the server
            // rejected will be rejected again.
            ErrorCategory::Database => match self {
                EtlError::PostgresError(e) if e.is_closed() => ErrorSeverity::Medium,
                EtlError::SqliteError(rusqlite::Error::SqliteFailure(e, _))
                    if e.code == rusqlite::ErrorCode::DatabaseBusy =>
                {
                    ErrorSeverity::Medium
                }
                _ => ErrorSeverity::High,
            },
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            EtlError::MissingSectionError { .. } => {
                "Add the database section to the config file or pass --section"
            }
            EtlError::MissingConfigError { .. } | EtlError::InvalidConfigValueError { .. } => {
                "Check the config file and command line arguments"
            }
            EtlError::TomlError(_) => "Make sure the config file is valid TOML",
            EtlError::JsonError(_) | EtlError::ProcessingError { .. } => {
                "Make sure the data file is a JSON array of city records"
            }
            EtlError::PostgresError(_) => {
                "Check that PostgreSQL is reachable and the credentials are correct"
            }
            EtlError::SqliteError(_) => "Check that the SQLite file is writable and not locked",
            EtlError::CsvError(_) => "Check that the output directory is writable",
            EtlError::IoError(_) => "Check file paths and permissions",
            EtlError::TaskError(_) => "Re-run with --verbose and inspect the log",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Input => format!("Could not read the input data: {}", self),
            ErrorCategory::Database => format!("Database operation failed: {}", self),
            ErrorCategory::Output => format!("Could not write the report: {}", self),
            ErrorCategory::System => format!("System error: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
