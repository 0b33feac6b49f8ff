use serde::{Deserialize, Deserializer, Serialize};

/// One element of the input JSON array. Carries the city together with
/// denormalised copies of its state and country.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityRecord {
    pub id: i32,
    pub name: String,
    pub state_id: i32,
    #[serde(default)]
    pub state_code: Option<String>,
    pub state_name: String,
    pub country_id: i32,
    #[serde(default)]
    pub country_code: Option<String>,
    pub country_name: String,
    #[serde(default, deserialize_with = "text_or_number")]
    pub latitude: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub longitude: Option<String>,
    #[serde(rename = "wikiDataId", default)]
    pub wiki_data_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TextOrNumber {
    Text(String),
    Number(serde_json::Number),
}

// Coordinates show up both as "52.22977" and 52.22977 depending on the dump.
fn text_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<TextOrNumber>::deserialize(deserializer)?;
    Ok(value.map(|v| match v {
        TextOrNumber::Text(s) => s,
        TextOrNumber::Number(n) => n.to_string(),
    }))
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct State {
    pub id: i32,
    pub code: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Country {
    pub id: i32,
    pub code: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct City {
    pub id: i32,
    pub name: String,
    pub state_id: i32,
    pub country_id: i32,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub wiki_data_id: Option<String>,
}

impl CityRecord {
    pub fn split(self) -> (State, Country, City) {
        let state = State {
            id: self.state_id,
            code: self.state_code,
            name: self.state_name,
        };
        let country = Country {
            id: self.country_id,
            code: self.country_code,
            name: self.country_name,
        };
        let city = City {
            id: self.id,
            name: self.name,
            state_id: self.state_id,
            country_id: self.country_id,
            latitude: self.latitude,
            longitude: self.longitude,
            wiki_data_id: self.wiki_data_id,
        };
        (state, country, city)
    }
}

/// A value bound to an insert statement. Every column in the schema is
/// either an INTEGER or a nullable VARCHAR.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    Int(i32),
    Text(Option<String>),
}

pub trait TableRow {
    const TABLE: &'static str;
    const COLUMNS: &'static [&'static str];

    fn values(&self) -> Vec<SqlValue>;
}

impl TableRow for State {
    const TABLE: &'static str = "states";
    const COLUMNS: &'static [&'static str] = &["id", "code", "name"];

    fn values(&self) -> Vec<SqlValue> {
        vec![
            SqlValue::Int(self.id),
            SqlValue::Text(self.code.clone()),
            SqlValue::Text(Some(self.name.clone())),
        ]
    }
}

impl TableRow for Country {
    const TABLE: &'static str = "countries";
    const COLUMNS: &'static [&'static str] = &["id", "code", "name"];

    fn values(&self) -> Vec<SqlValue> {
        vec![
            SqlValue::Int(self.id),
            SqlValue::Text(self.code.clone()),
            SqlValue::Text(Some(self.name.clone())),
        ]
    }
}

/// Cities are always written to the staging table first; see
/// `CityStore::promote_staged_cities`.
impl TableRow for City {
    const TABLE: &'static str = "cities_tmp";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "state_id",
        "country_id",
        "latitude",
        "longitude",
        "wikiDataId",
    ];

    fn values(&self) -> Vec<SqlValue> {
        vec![
            SqlValue::Int(self.id),
            SqlValue::Text(Some(self.name.clone())),
            SqlValue::Int(self.state_id),
            SqlValue::Int(self.country_id),
            SqlValue::Text(self.latitude.clone()),
            SqlValue::Text(self.longitude.clone()),
            SqlValue::Text(self.wiki_data_id.clone()),
        ]
    }
}

/// Column names plus rows rendered as text, ready for a CSV writer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl QueryResult {
    pub fn first_value(&self) -> Option<&str> {
        self.rows.first().and_then(|row| row.first()).map(String::as_str)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub records_read: usize,
    pub states_written: usize,
    pub countries_written: usize,
    pub cities_staged: usize,
    pub batches_flushed: usize,
    pub cities_promoted: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CityCountReport {
    pub country: String,
    pub state: String,
    pub number_of_cities: i64,
    pub report_path: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_record_with_string_coordinates() {
        let json = r#"{
            "id": 52111, "name": "Warsaw",
            "state_id": 1637, "state_code": "14", "state_name": "Masovian Voivodeship",
            "country_id": 176, "country_code": "PL", "country_name": "Poland",
            "latitude": "52.22977", "longitude": "21.01178", "wikiDataId": "Q270"
        }"#;

        let record: CityRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.latitude.as_deref(), Some("52.22977"));
        assert_eq!(record.wiki_data_id.as_deref(), Some("Q270"));
    }

    #[test]
    fn test_deserialize_record_with_numeric_coordinates_and_missing_optionals() {
        let json = r#"{
            "id": 1, "name": "Nowhere",
            "state_id": 2, "state_name": "S", "state_code": null,
            "country_id": 3, "country_name": "C",
            "latitude": 12.5, "longitude": -7, "extra": true
        }"#;

        let record: CityRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.latitude.as_deref(), Some("12.5"));
        assert_eq!(record.longitude.as_deref(), Some("-7"));
        assert_eq!(record.state_code, None);
        assert_eq!(record.country_code, None);
        assert_eq!(record.wiki_data_id, None);
    }

    #[test]
    fn test_split_keeps_foreign_keys() {
        let record = CityRecord {
            id: 10,
            name: "Radom".to_string(),
            state_id: 1637,
            state_code: Some("14".to_string()),
            state_name: "Masovian Voivodeship".to_string(),
            country_id: 176,
            country_code: Some("PL".to_string()),
            country_name: "Poland".to_string(),
            latitude: None,
            longitude: None,
            wiki_data_id: None,
        };

        let (state, country, city) = record.split();
        assert_eq!(state.id, city.state_id);
        assert_eq!(country.id, city.country_id);
        assert_eq!(country.code.as_deref(), Some("PL"));
        assert_eq!(city.values().len(), City::COLUMNS.len());
    }

    #[test]
    fn test_first_value() {
        let result = QueryResult {
            columns: vec!["number_of_cities".to_string()],
            rows: vec![vec!["7".to_string()]],
        };
        assert_eq!(result.first_value(), Some("7"));
        assert_eq!(QueryResult::default().first_value(), None);
    }
}
