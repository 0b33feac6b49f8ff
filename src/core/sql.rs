//! SQL text shared by the PostgreSQL and SQLite stores.
//!
//! Both engines accept the same DDL and `ON CONFLICT` clauses; only the bind
//! placeholder syntax and the bound-parameter ceiling differ.

use crate::utils::error::{EtlError, Result};

pub const POSTGRES_MAX_PARAMS: usize = 65_535;
pub const SQLITE_MAX_PARAMS: usize = 32_766;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    /// `$1, $2, ...`
    Dollar,
    /// `?1, ?2, ...`
    Question,
}

impl Placeholder {
    pub fn render(self, index: usize) -> String {
        match self {
            Placeholder::Dollar => format!("${}", index),
            Placeholder::Question => format!("?{}", index),
        }
    }
}

const CREATE_STATES: &str = "CREATE TABLE IF NOT EXISTS states (
    id INTEGER NOT NULL,
    code VARCHAR(255),
    name VARCHAR(255),
    PRIMARY KEY (id)
)";

const CREATE_COUNTRIES: &str = "CREATE TABLE IF NOT EXISTS countries (
    id INTEGER NOT NULL,
    code VARCHAR(255),
    name VARCHAR(255),
    PRIMARY KEY (id)
)";

const CREATE_CITIES: &str = "CREATE TABLE IF NOT EXISTS cities (
    id INTEGER NOT NULL,
    name VARCHAR(255),
    state_id INTEGER,
    country_id INTEGER,
    latitude VARCHAR(255),
    longitude VARCHAR(255),
    wikiDataId VARCHAR(255),
    PRIMARY KEY (id),
    FOREIGN KEY (state_id) REFERENCES states (id),
    FOREIGN KEY (country_id) REFERENCES countries (id)
)";

const DROP_CITIES_TMP: &str = "DROP TABLE IF EXISTS cities_tmp";

const CREATE_CITIES_TMP: &str = "CREATE TABLE cities_tmp (
    id INTEGER NOT NULL,
    name VARCHAR(255),
    state_id INTEGER,
    country_id INTEGER,
    latitude VARCHAR(255),
    longitude VARCHAR(255),
    wikiDataId VARCHAR(255),
    PRIMARY KEY (id)
)";

/// `WHERE true` keeps SQLite from reading `ON CONFLICT` as a join constraint.
pub const PROMOTE_STAGED_CITIES: &str =
    "INSERT INTO cities SELECT * FROM cities_tmp WHERE true ON CONFLICT (id) DO NOTHING";

/// DDL in execution order. Parents come before `cities`; the staging table is
/// recreated from scratch.
pub fn schema_statements() -> [&'static str; 5] {
    [
        CREATE_STATES,
        CREATE_COUNTRIES,
        CREATE_CITIES,
        DROP_CITIES_TMP,
        CREATE_CITIES_TMP,
    ]
}

pub fn count_cities_statement(placeholder: Placeholder) -> String {
    format!(
        "SELECT COUNT(ct.id) AS number_of_cities
FROM cities ct
JOIN states s ON ct.state_id = s.id
JOIN countries ctr ON ct.country_id = ctr.id
WHERE ctr.name = {}
AND s.name = {}",
        placeholder.render(1),
        placeholder.render(2)
    )
}

/// Number of rows that fit in one statement without exceeding `max_params`.
pub fn rows_per_statement(column_count: usize, max_params: usize) -> Result<usize> {
    if column_count == 0 {
        return Err(EtlError::processing("insert statement needs at least one column"));
    }
    let rows = max_params / column_count;
    if rows == 0 {
        return Err(EtlError::processing(format!(
            "{} columns exceed the limit of {} bound parameters",
            column_count, max_params
        )));
    }
    Ok(rows)
}

/// Multi-row `INSERT ... VALUES (...), (...) ON CONFLICT (id) DO NOTHING`.
/// Returns `None` for an empty batch.
pub fn insert_statement(
    table: &str,
    columns: &[&str],
    row_count: usize,
    placeholder: Placeholder,
) -> Option<String> {
    if row_count == 0 || columns.is_empty() {
        return None;
    }

    let width = columns.len();
    let tuples: Vec<String> = (0..row_count)
        .map(|row| {
            let params: Vec<String> = (1..=width)
                .map(|col| placeholder.render(row * width + col))
                .collect();
            format!("({})", params.join(", "))
        })
        .collect();

    Some(format!(
        "INSERT INTO {} ({}) VALUES {} ON CONFLICT (id) DO NOTHING",
        table,
        columns.join(", "),
        tuples.join(", ")
    ))
}
