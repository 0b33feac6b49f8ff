use crate::config::database::PgConfig;
use crate::core::sql::{
    count_cities_statement, insert_statement, rows_per_statement, schema_statements, Placeholder,
    POSTGRES_MAX_PARAMS, PROMOTE_STAGED_CITIES,
};
use crate::domain::model::{City, Country, QueryResult, SqlValue, State, TableRow};
use crate::domain::ports::CityStore;
use crate::utils::error::Result;
use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio_postgres::types::ToSql;
use tokio_postgres::{Client, NoTls, Row};

pub struct PostgresStore {
    client: Mutex<Client>,
}

impl PostgresStore {
    pub async fn connect(config: &PgConfig) -> Result<Self> {
        let pg_config = to_pg_config(config)?;
        tracing::info!("Connecting to PostgreSQL at {}", config.display_target());

        let (client, connection) = pg_config.connect(NoTls).await?;

        // The connection object drives the socket; it finishes when the client is dropped.
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!("PostgreSQL connection error: {}", e);
            }
        });

        Ok(Self {
            client: Mutex::new(client),
        })
    }

    async fn insert_rows<R: TableRow + Sync>(&self, rows: &[R]) -> Result<u64> {
        if rows.is_empty() {
            return Ok(0);
        }
        let chunk_size = rows_per_statement(R::COLUMNS.len(), POSTGRES_MAX_PARAMS)?;

        let mut client = self.client.lock().await;
        let tx = client.transaction().await?;
        let mut inserted = 0;

        for chunk in rows.chunks(chunk_size) {
            let Some(sql) = insert_statement(R::TABLE, R::COLUMNS, chunk.len(), Placeholder::Dollar)
            else {
                continue;
            };
            let values: Vec<SqlValue> = chunk.iter().flat_map(|row| row.values()).collect();
            let params: Vec<&(dyn ToSql + Sync)> = values.iter().map(as_param).collect();
            inserted += tx.execute(sql.as_str(), &params).await?;
        }

        tx.commit().await?;
        Ok(inserted)
    }
}

pub fn to_pg_config(config: &PgConfig) -> Result<tokio_postgres::Config> {
    if let Some(url) = &config.url {
        return Ok(url.parse::<tokio_postgres::Config>()?);
    }

    let mut pg_config = tokio_postgres::Config::new();
    pg_config.host(config.host.as_deref().unwrap_or("localhost"));
    pg_config.port(config.port.unwrap_or(5432));
    if let Some(dbname) = &config.dbname {
        pg_config.dbname(dbname);
    }
    if let Some(user) = &config.user {
        pg_config.user(user);
    }
    if let Some(password) = &config.password {
        pg_config.password(password);
    }
    pg_config.application_name("cities-etl");
    Ok(pg_config)
}

fn as_param(value: &SqlValue) -> &(dyn ToSql + Sync) {
    match value {
        SqlValue::Int(v) => v as &(dyn ToSql + Sync),
        SqlValue::Text(v) => v as &(dyn ToSql + Sync),
    }
}

fn cell_to_string(row: &Row, idx: usize) -> String {
    if let Ok(value) = row.try_get::<_, Option<i64>>(idx) {
        return value.map(|v| v.to_string()).unwrap_or_default();
    }
    if let Ok(value) = row.try_get::<_, Option<i32>>(idx) {
        return value.map(|v| v.to_string()).unwrap_or_default();
    }
    row.try_get::<_, Option<String>>(idx)
        .ok()
        .flatten()
        .unwrap_or_default()
}

#[async_trait]
impl CityStore for PostgresStore {
    async fn create_schema(&self) -> Result<()> {
        let mut client = self.client.lock().await;
        let tx = client.transaction().await?;
        for statement in schema_statements() {
            tx.batch_execute(statement).await?;
        }
        tx.commit().await?;
        Ok(())
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
        let client = self.client.lock().await;
        Ok(client.execute(PROMOTE_STAGED_CITIES, &[]).await?)
    }

    async fn count_cities(&self, country_name: &str, state_name: &str) -> Result<QueryResult> {
        let client = self.client.lock().await;
        let statement = client
            .prepare(&count_cities_statement(Placeholder::Dollar))
            .await?;

        let columns = statement
            .columns()
            .iter()
            .map(|column| column.name().to_string())
            .collect();
        let rows = client
            .query(&statement, &[&country_name, &state_name])
            .await?
            .iter()
            .map(|row| (0..row.len()).map(|idx| cell_to_string(row, idx)).collect())
            .collect();

        Ok(QueryResult { columns, rows })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_pg_config_from_fields() {
        let config = PgConfig {
            url: None,
            host: Some("db".to_string()),
            port: Some(6543),
            dbname: Some("cities".to_string()),
            user: Some("etl".to_string()),
            password: Some("secret".to_string()),
        };

        let pg_config = to_pg_config(&config).unwrap();
        assert_eq!(pg_config.get_ports(), &[6543]);
        assert_eq!(pg_config.get_dbname(), Some("cities"));
        assert_eq!(pg_config.get_user(), Some("etl"));
        assert_eq!(pg_config.get_password(), Some(&b"secret"[..]));
    }

    #[test]
    fn test_to_pg_config_prefers_url() {
        let config = PgConfig {
            url: Some("postgresql://reader@warehouse:5433/geo".to_string()),
            host: Some("ignored".to_string()),
            ..PgConfig::default()
        };

        let pg_config = to_pg_config(&config).unwrap();
        assert_eq!(pg_config.get_ports(), &[5433]);
        assert_eq!(pg_config.get_dbname(), Some("geo"));
        assert_eq!(pg_config.get_user(), Some("reader"));
    }
}
