//! Row types for the managed table.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::services::database::error::{StoreError, StoreResult};
use crate::services::database::schema::NAME_MAX_LEN;

/// A persisted row. `id` and `created_at` are assigned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: i64,
    pub name: String,
    pub value: i64,
    #[serde(with = "created_at_format")]
    pub created_at: Option<NaiveDateTime>,
}

impl std::fmt::Display for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "id={} name={} value={} created_at=", self.id, self.name, self.value)?;
        match self.created_at {
            Some(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S")),
            None => Ok(()),
        }
    }
}

/// A row about to be inserted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecord {
    pub name: String,
    #[serde(default)]
    pub value: i64,
}

impl NewRecord {
    pub fn new(name: impl Into<String>, value: i64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    /// Reject names that are empty or longer than the column allows.
    pub fn validate(&self) -> StoreResult<()> {
        if self.name.trim().is_empty() {
            return Err(StoreError::Validation("name must not be empty".to_string()));
        }
        let len = self.name.chars().count();
        if len > NAME_MAX_LEN {
            return Err(StoreError::Validation(format!(
                "name '{}…' is {} characters, limit is {}",
                self.name.chars().take(16).collect::<String>(),
                len,
                NAME_MAX_LEN
            )));
        }
        Ok(())
    }
}

/// `created_at` is written as `YYYY-MM-DD HH:MM:SS`, empty when absent.
mod created_at_format {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S: Serializer>(
        value: &Option<NaiveDateTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(ts) => serializer.serialize_str(&ts.format(FORMAT).to_string()),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDateTime>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if raw.trim().is_empty() {
            return Ok(None);
        }
        NaiveDateTime::parse_from_str(raw.trim(), FORMAT)
            .map(Some)
            .map_err(serde::de::Error::custom)
    }
}
