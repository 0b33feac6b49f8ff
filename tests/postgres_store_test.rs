//! Runs against a live server: `CITIES_ETL_PG_URL=postgresql://... cargo test -- --ignored`

use anyhow::Result;
use cities_etl::config::database::PgConfig;
use cities_etl::core::CityStore;
use cities_etl::domain::model::{City, Country, State};
use cities_etl::PostgresStore;

#[tokio::test]
#[ignore]
async fn test_postgres_store_round_trip() -> Result<()> {
    let url = std::env::var("CITIES_ETL_PG_URL")?;
    let store = PostgresStore::connect(&PgConfig {
        url: Some(url),
        ..PgConfig::default()
    })
    .await?;

    store.create_schema().await?;
    store
        .insert_states(&[State {
            id: 910_001,
            code: Some("T1".to_string()),
            name: "Test State".to_string(),
        }])
        .await?;
    store
        .insert_countries(&[Country {
            id: 910_002,
            code: Some("TC".to_string()),
            name: "Test Country".to_string(),
        }])
        .await?;
    store
        .insert_staged_cities(&[City {
            id: 910_003,
            name: "Test City".to_string(),
            state_id: 910_001,
            country_id: 910_002,
            latitude: Some("1.0".to_string()),
            longitude: Some("2.0".to_string()),
            wiki_data_id: None,
        }])
        .await?;
    store.promote_staged_cities().await?;

    let result = store.count_cities("Test Country", "Test State").await?;
    assert_eq!(result.columns, vec!["number_of_cities".to_string()]);
    assert_eq!(result.first_value(), Some("1"));

    Ok(())
}
