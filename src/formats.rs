use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One book as returned upstream. Every field is kept, in order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookRecord(pub Map<String, Value>);

impl BookRecord {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field).filter(|v| !v.is_null())
    }

    pub fn str_field(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    pub fn rank(&self) -> Option<i64> {
        self.get("rank").and_then(Value::as_i64)
    }

    pub fn title(&self) -> Option<&str> {
        self.str_field("title")
    }

    pub fn author(&self) -> Option<&str> {
        self.str_field("author")
    }

    pub fn weeks_on_list(&self) -> Option<i64> {
        self.get("weeks_on_list").and_then(Value::as_i64)
    }

    pub fn publisher(&self) -> Option<&str> {
        self.str_field("publisher")
    }

    pub fn description(&self) -> Option<&str> {
        self.str_field("description")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookListMeta {
    pub list_name: String,
    pub list_name_encoded: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListSnapshot {
    pub list_name: String,
    pub list_name_encoded: String,
    pub books: Vec<BookRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestsellerSnapshot {
    #[serde(with = "utc_seconds")]
    pub updated: DateTime<Utc>,
    pub lists: Vec<ListSnapshot>,
}

/// `2026-01-01T00:00:00Z`
mod utc_seconds {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize as _, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, FORMAT)
            .map(|naive| naive.and_utc())
            .map_err(serde::de::Error::custom)
    }
}
