//! Paginated query results

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::MALFORMED_PAGE;
use crate::errors::{ForceLinkError, Result};

/// One record of a query result. Only `id` and `type` are interpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub data: Map<String, Value>,
}

impl Record {
    pub fn new(id: impl Into<String>, record_type: impl Into<String>) -> Self {
        Self { id: id.into(), record_type: record_type.into(), data: Map::new() }
    }

    /// Build a record from a wire object such as
    /// `{"attributes": {"type": "Account", "url": ...}, "Id": "001..", "Name": ..}`.
    ///
    /// Aggregate rows carry no `Id` and yield an empty `id`.
    pub fn from_value(value: Value) -> Self {
        let mut data = match value {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                map
            }
        };

        let record_type = data
            .remove("attributes")
            .and_then(|attrs| attrs.get("type").and_then(Value::as_str).map(str::to_string))
            .unwrap_or_default();
        let id = data
            .get("Id")
            .or_else(|| data.get("id"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_default();

        Self { id, record_type, data }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.data.get(field)
    }
}

/// One page of a query.
///
/// `next_cursor` is present exactly when `done` is false. `total_size` is
/// informational; only `done` decides termination.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub done: bool,
    pub total_size: u64,
    pub records: Vec<Record>,
    pub next_cursor: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePage {
    done: bool,
    #[serde(default)]
    total_size: u64,
    #[serde(default)]
    records: Vec<Value>,
    #[serde(default)]
    next_records_url: Option<String>,
}

impl QueryResult {
    /// Final page.
    pub fn last(total_size: u64, records: Vec<Record>) -> Self {
        Self { done: true, total_size, records, next_cursor: None }
    }

    /// Intermediate page continued by `cursor`.
    pub fn partial(total_size: u64, records: Vec<Record>, cursor: impl Into<String>) -> Self {
        Self { done: false, total_size, records, next_cursor: Some(cursor.into()) }
    }

    /// Decode a `{done, totalSize, records, nextRecordsUrl}` page.
    pub fn from_wire(body: &str) -> Result<Self> {
        let page: WirePage = serde_json::from_str(body).map_err(|e| {
            ForceLinkError::api(200, MALFORMED_PAGE, format!("undecodable query page: {e}"))
        })?;

        let result = Self {
            done: page.done,
            total_size: page.total_size,
            records: page.records.into_iter().map(Record::from_value).collect(),
            next_cursor: page.next_records_url.filter(|c| !c.is_empty()),
        };
        result.validate()?;
        Ok(result)
    }

    /// Enforce the `next_cursor` iff `!done` invariant.
    pub fn validate(&self) -> Result<()> {
        match (self.done, self.next_cursor.is_some()) {
            (false, false) => Err(ForceLinkError::api(
                200,
                MALFORMED_PAGE,
                "page is not done but carries no nextRecordsUrl",
            )),
            (true, true) => Err(ForceLinkError::api(
                200,
                MALFORMED_PAGE,
                "page is done but still carries a nextRecordsUrl",
            )),
            _ => Ok(()),
        }
    }
}
