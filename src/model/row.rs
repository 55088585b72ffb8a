//! Raw message-store rows.
//!
//! A row is one record from the device's SMS store, flattened to a map of
//! column name → string value. Any column may be missing.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{Result, SmsMimeError};

/// Column names of the SMS content provider.
pub mod columns {
    pub const ID: &str = "_id";
    pub const THREAD_ID: &str = "thread_id";
    pub const ADDRESS: &str = "address";
    pub const DATE: &str = "date";
    pub const PROTOCOL: &str = "protocol";
    pub const READ: &str = "read";
    pub const STATUS: &str = "status";
    pub const TYPE: &str = "type";
    pub const SERVICE_CENTER: &str = "service_center";
    pub const BODY: &str = "body";
}

/// One record from the message store.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(from = "BTreeMap<String, serde_json::Value>")]
pub struct Row {
    fields: BTreeMap<String, String>,
}

impl Row {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter, mostly for tests and adapters.
    pub fn with(mut self, column: &str, value: impl Into<String>) -> Self {
        self.insert(column, value);
        self
    }

    /// Set a column value.
    pub fn insert(&mut self, column: &str, value: impl Into<String>) {
        self.fields.insert(column.to_string(), value.into());
    }

    /// Get a column value.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }

    /// The sender/recipient phone number, if present and not blank.
    pub fn address(&self) -> Option<&str> {
        self.get(columns::ADDRESS).filter(|a| !a.trim().is_empty())
    }

    /// The `date` column as epoch milliseconds.
    ///
    /// Returns `None` when the column is missing or not an integer.
    pub fn date_millis(&self) -> Option<i64> {
        self.get(columns::DATE)?.trim().parse().ok()
    }

    /// The `type` column as an integer code.
    pub fn type_code(&self) -> Option<i32> {
        self.get(columns::TYPE)?.trim().parse().ok()
    }

    /// Number of columns present.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the row has no columns at all.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl From<BTreeMap<String, serde_json::Value>> for Row {
    fn from(map: BTreeMap<String, serde_json::Value>) -> Self {
        let fields = map
            .into_iter()
            .filter_map(|(column, value)| {
                let text = match value {
                    serde_json::Value::Null => return None,
                    serde_json::Value::String(s) => s,
                    serde_json::Value::Bool(b) => (if b { "1" } else { "0" }).to_string(),
                    other => other.to_string(),
                };
                Some((column, text))
            })
            .collect();
        Self { fields }
    }
}

impl FromIterator<(String, String)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// Load a JSON array of rows (one object per message) from disk.
///
/// Values may be strings, numbers or booleans; `null` columns are dropped.
pub fn load_rows(path: &Path) -> Result<Vec<Row>> {
    if !path.exists() {
        return Err(SmsMimeError::FileNotFound(path.to_path_buf()));
    }
    let data = std::fs::read(path).map_err(|e| SmsMimeError::io(path, e))?;
    serde_json::from_slice(&data).map_err(|e| SmsMimeError::InvalidRows {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}
