use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{
    redact_url, validate_database_url, validate_non_empty_string, validate_path, validate_range,
    validate_required_field, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum Backend {
    Postgres,
    Sqlite,
}

impl Backend {
    /// Config file section read when `--section` is not given.
    pub fn default_section(self) -> &'static str {
        match self {
            Backend::Postgres => "postgresql",
            Backend::Sqlite => "sqlite",
        }
    }
}

/// Connection settings for PostgreSQL. `url` wins over the individual fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PgConfig {
    pub url: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub dbname: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqliteConfig {
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseConfig {
    Postgres(PgConfig),
    Sqlite(SqliteConfig),
}

impl DatabaseConfig {
    /// Loads one backend section from a TOML database file.
    pub fn from_file<P: AsRef<Path>>(path: P, backend: Backend, section: &str) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(
            &content,
            backend,
            section,
            &path.as_ref().display().to_string(),
        )
    }

    /// Parses `content` and deserialises `[section]` for `backend`.
    /// `file_label` only shows up in the missing-section error.
    pub fn from_toml_str(
        content: &str,
        backend: Backend,
        section: &str,
        file_label: &str,
    ) -> Result<Self> {
        let processed_content = substitute_env_vars(content)?;
        let table: toml::Table = toml::from_str(&processed_content)?;

        let value = table
            .get(section)
            .cloned()
            .ok_or_else(|| EtlError::MissingSectionError {
                section: section.to_string(),
                file: file_label.to_string(),
            })?;

        match backend {
            Backend::Postgres => Ok(DatabaseConfig::Postgres(value.try_into()?)),
            Backend::Sqlite => Ok(DatabaseConfig::Sqlite(value.try_into()?)),
        }
    }

    pub fn backend(&self) -> Backend {
        match self {
            DatabaseConfig::Postgres(_) => Backend::Postgres,
            DatabaseConfig::Sqlite(_) => Backend::Sqlite,
        }
    }
}

/// Replaces `${VAR}` placeholders (e.g. `${PGPASSWORD}`) with environment values.
fn substitute_env_vars(content: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([^}]+)\}")
        .map_err(|e| EtlError::processing(format!("invalid substitution pattern: {}", e)))?;

    let result = re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
    });

    Ok(result.to_string())
}

impl PgConfig {
    /// Connection target without credentials, for log lines.
    pub fn display_target(&self) -> String {
        match &self.url {
            Some(url) => redact_url(url),
            None => format!(
                "{}:{}/{}",
                self.host.as_deref().unwrap_or("localhost"),
                self.port.unwrap_or(5432),
                self.dbname.as_deref().unwrap_or("")
            ),
        }
    }
}

impl Validate for PgConfig {
    fn validate(&self) -> Result<()> {
        if let Some(url) = &self.url {
            return validate_database_url("postgresql.url", url);
        }

        validate_required_field("postgresql.dbname", &self.dbname)?;
        if let Some(host) = &self.host {
            validate_non_empty_string("postgresql.host", host)?;
        }
        if let Some(port) = self.port {
            validate_range("postgresql.port", port, 1, u16::MAX)?;
        }
        Ok(())
    }
}

impl Validate for SqliteConfig {
    fn validate(&self) -> Result<()> {
        validate_path("sqlite.path", &self.path)
    }
}

impl Validate for DatabaseConfig {
    fn validate(&self) -> Result<()> {
        match self {
            DatabaseConfig::Postgres(config) => config.validate(),
            DatabaseConfig::Sqlite(config) => config.validate(),
        }
    }
}
