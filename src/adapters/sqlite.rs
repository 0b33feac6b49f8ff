//! SQLite implementation of `CityStore`.
//!
//! Runs the same schema and statements as the PostgreSQL store, which makes
//! it usable for local runs without a server and for tests.
//!
//! # Invariants
//! - Connections have `foreign_keys=ON`, so promotion fails on orphan cities.
//! - Every statement runs on tokio's blocking pool via `spawn_blocking`; the
//!   connection lock is only taken there and never held across an `.await`.

use crate::core::sql::{
    count_cities_statement, insert_statement, rows_per_statement, schema_statements, Placeholder,
    PROMOTE_STAGED_CITIES, SQLITE_MAX_PARAMS,
};
use crate::domain::model::{City, Country, QueryResult, SqlValue, State, TableRow};
use crate::domain::ports::CityStore;
use crate::utils::error::{EtlError, Result};
use async_trait::async_trait;
use rusqlite::types::{Value, ValueRef};
use rusqlite::{params, params_from_iter, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let started_at = Instant::now();
        let conn = Connection::open(path.as_ref())?;
        let store = Self::bootstrap(conn)?;
        tracing::info!(
            "Opened SQLite database {} in {}ms",
            path.as_ref().display(),
            started_at.elapsed().as_millis()
        );
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::bootstrap(Connection::open_in_memory()?)
    }

    fn bootstrap(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Runs `work` against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, work: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| EtlError::processing("SQLite connection lock poisoned"))?;
            work(&mut *guard)
        })
        .await?
    }

    async fn insert_rows<R: TableRow>(&self, rows: &[R]) -> Result<u64> {
        if rows.is_empty() {
            return Ok(0);
        }
        let chunk_size = rows_per_statement(R::COLUMNS.len(), SQLITE_MAX_PARAMS)?;

        // Statements and bound values are built up front so the closure owns them.
        let statements: Vec<(String, Vec<Value>)> = rows
            .chunks(chunk_size)
            .filter_map(|chunk| {
                let sql =
                    insert_statement(R::TABLE, R::COLUMNS, chunk.len(), Placeholder::Question)?;
                let values = chunk
                    .iter()
                    .flat_map(|row| row.values())
                    .map(to_sqlite_value)
                    .collect();
                Some((sql, values))
            })
            .collect();

        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            let mut inserted = 0u64;
            for (sql, values) in &statements {
                inserted += tx.execute(sql, params_from_iter(values.iter()))? as u64;
            }
            tx.commit()?;
            Ok(inserted)
        })
        .await
    }
}

fn query_city_count(
    conn: &Connection,
    country_name: &str,
    state_name: &str,
) -> Result<QueryResult> {
    let mut statement = conn.prepare(&count_cities_statement(Placeholder::Question))?;

    let columns: Vec<String> = statement
        .column_names()
        .into_iter()
        .map(str::to_string)
        .collect();
    let width = columns.len();

    let rows = statement
        .query_map(params![country_name, state_name], |row| {
            (0..width)
                .map(|idx| row.get_ref(idx).map(cell_to_string))
                .collect::<rusqlite::Result<Vec<String>>>()
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(QueryResult { columns, rows })
}

fn to_sqlite_value(value: SqlValue) -> Value {
    match value {
        SqlValue::Int(v) => Value::Integer(i64::from(v)),
        SqlValue::Text(Some(v)) => Value::Text(v),
        SqlValue::Text(None) => Value::Null,
    }
}

fn cell_to_string(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(v) => v.to_string(),
        ValueRef::Real(v) => v.to_string(),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => String::from_utf8_lossy(bytes).into_owned(),
    }
}

#[async_trait]
impl CityStore for SqliteStore {
    async fn create_schema(&self) -> Result<()> {
        self.with_conn(|conn| {
            let tx = conn.transaction()?;
            for statement in schema_statements() {
                tx.execute_batch(statement)?;
            }
            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn insert_states(&self, rows: &[State]) -> Result<u64> {
        self.insert_rows(rows).await
    }

    async fn insert_countries(&self, rows: &[Country]) -> Result<u64> {
        self.insert_rows(rows).await
    }

    async fn insert_staged_cities(&self, rows: &[City]) -> Result<u64> {
        self.insert_rows(rows).await
    }

    async fn promote_staged_cities(&self) -> Result<u64> {
        self.with_conn(|conn| Ok(conn.execute(PROMOTE_STAGED_CITIES, [])? as u64))
            .await
    }

    async fn count_cities(&self, country_name: &str, state_name: &str) -> Result<QueryResult> {
        let country_name = country_name.to_string();
        let state_name = state_name.to_string();
        self.with_conn(move |conn| query_city_count(conn, &country_name, &state_name))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(id: i32, name: &str) -> State {
        State {
            id,
            code: None,
            name: name.to_string(),
        }
    }

    fn country(id: i32, name: &str) -> Country {
        Country {
            id,
            code: Some("PL".to_string()),
            name: name.to_string(),
        }
    }

    fn city(id: i32, state_id: i32, country_id: i32) -> City {
        City {
            id,
            name: format!("City {}", id),
            state_id,
            country_id,
            latitude: Some("52.1".to_string()),
            longitude: None,
            wiki_data_id: None,
        }
    }

    #[tokio::test]
    async fn test_duplicate_ids_are_ignored() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.create_schema().await.unwrap();

        assert_eq!(store.insert_states(&[state(1, "A"), state(2, "B")]).await.unwrap(), 2);
        assert_eq!(store.insert_states(&[state(2, "B again"), state(3, "C")]).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_promote_and_count() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.create_schema().await.unwrap();
        store.insert_states(&[state(1, "Masovian Voivodeship"), state(2, "Lesser Poland")]).await.unwrap();
        store.insert_countries(&[country(176, "Poland")]).await.unwrap();
        store
            .insert_staged_cities(&[city(10, 1, 176), city(11, 1, 176), city(12, 2, 176)])
            .await
            .unwrap();

        assert_eq!(store.promote_staged_cities().await.unwrap(), 3);
        assert_eq!(store.promote_staged_cities().await.unwrap(), 0);

        let result = store.count_cities("Poland", "Masovian Voivodeship").await.unwrap();
        assert_eq!(result.columns, vec!["number_of_cities".to_string()]);
        assert_eq!(result.first_value(), Some("2"));
    }

    #[tokio::test]
    async fn test_promote_rejects_orphan_city() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.create_schema().await.unwrap();
        store.insert_staged_cities(&[city(10, 99, 98)]).await.unwrap();

        let err = store.promote_staged_cities().await.unwrap_err();
        assert!(matches!(err, EtlError::SqliteError(_)));
    }

    #[tokio::test]
    async fn test_create_schema_resets_staging_only() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.create_schema().await.unwrap();
        store.insert_states(&[state(1, "S")]).await.unwrap();
        store.insert_countries(&[country(2, "C")]).await.unwrap();
        store.insert_staged_cities(&[city(3, 1, 2)]).await.unwrap();

        store.create_schema().await.unwrap();

        assert_eq!(store.promote_staged_cities().await.unwrap(), 0);
        assert_eq!(store.insert_states(&[state(1, "S")]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_large_batch_is_split_under_parameter_limit() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.create_schema().await.unwrap();

        let states: Vec<State> = (0..12_000).map(|id| state(id, "S")).collect();
        assert_eq!(store.insert_states(&states).await.unwrap(), 12_000);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_inserts_leave_the_runtime_free() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let store = SqliteStore::open_in_memory().unwrap();
        store.create_schema().await.unwrap();

        let ticks = Arc::new(AtomicUsize::new(0));
        let ticker = tokio::spawn({
            let ticks = Arc::clone(&ticks);
            async move {
                loop {
                    ticks.fetch_add(1, Ordering::SeqCst);
                    tokio::task::yield_now().await;
                }
            }
        });

        let states: Vec<State> = (0..10_000).map(|id| state(id, "S")).collect();
        assert_eq!(store.insert_states(&states).await.unwrap(), 10_000);
        ticker.abort();

        assert!(
            ticks.load(Ordering::SeqCst) > 0,
            "other tasks must run while SQLite works"
        );
    }
}
