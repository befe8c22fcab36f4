// SPDX-License-Identifier: PMPL-1.0-or-later

//! Schema-validated record tables
//!
//! Game data tables arrive as JSON dumps: an array of objects, one per row.
//! A [`Schema`] declares which fields each row must carry and their kinds,
//! and every row is checked when the table is loaded. Field access after
//! that is typed and fails with a [`FieldError`] instead of a silent default.

pub mod stats;

use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

pub use stats::{StatField, StatFieldTable};

/// Row-reference value the game uses for "no row".
pub const UNDEFINED_KEY: u64 = 18374403900871474942;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Int,
    Bool,
    /// Optional reference to a row of another table.
    Key,
    Bytes,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldKind::String => "string",
            FieldKind::Int => "int",
            FieldKind::Bool => "bool",
            FieldKind::Key => "key",
            FieldKind::Bytes => "bytes",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    String(String),
    Int(i64),
    Bool(bool),
    Key(Option<usize>),
    Bytes(Vec<u8>),
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::String(_) => FieldKind::String,
            FieldValue::Int(_) => FieldKind::Int,
            FieldValue::Bool(_) => FieldKind::Bool,
            FieldValue::Key(_) => FieldKind::Key,
            FieldValue::Bytes(_) => FieldKind::Bytes,
        }
    }

    fn from_json(kind: FieldKind, value: &Value) -> Option<Self> {
        match (kind, value) {
            (FieldKind::String, Value::String(s)) => Some(FieldValue::String(s.clone())),
            (FieldKind::Int, Value::Number(n)) => n.as_i64().map(FieldValue::Int),
            (FieldKind::Bool, Value::Bool(b)) => Some(FieldValue::Bool(*b)),
            (FieldKind::Bool, Value::String(s)) => match s.to_ascii_lowercase().as_str() {
                "true" => Some(FieldValue::Bool(true)),
                "false" => Some(FieldValue::Bool(false)),
                _ => None,
            },
            (FieldKind::Key, Value::Null) => Some(FieldValue::Key(None)),
            (FieldKind::Key, Value::Number(n)) => {
                let raw = n.as_u64()?;
                if raw == UNDEFINED_KEY {
                    Some(FieldValue::Key(None))
                } else {
                    usize::try_from(raw).ok().map(|row| FieldValue::Key(Some(row)))
                }
            }
            (FieldKind::Bytes, Value::Array(items)) => items
                .iter()
                .map(|item| item.as_u64().and_then(|b| u8::try_from(b).ok()))
                .collect::<Option<Vec<u8>>>()
                .map(FieldValue::Bytes),
            _ => None,
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[derive(Debug, Error)]
pub enum FieldError {
    #[error("field '{field}' not found in {table} row {row}")]
    FieldNotFound {
        table: String,
        row: usize,
        field: String,
    },
    #[error("field '{field}' in {table} row {row} is {actual}, expected {expected}")]
    TypeMismatch {
        table: String,
        row: usize,
        field: String,
        expected: FieldKind,
        actual: String,
    },
    #[error("{table} row {row} is not an object")]
    NotAnObject { table: String, row: usize },
    #[error("{table} table is not a JSON array of rows")]
    Json {
        table: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone)]
pub struct Schema {
    name: String,
    fields: Vec<(String, FieldKind)>,
}

impl Schema {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, id: &str, kind: FieldKind) -> Self {
        self.fields.push((id.to_string(), kind));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[(String, FieldKind)] {
        &self.fields
    }

    /// Checks a raw row and converts it to typed values.
    fn validate(&self, row: usize, raw: &Value) -> Result<HashMap<String, FieldValue>, FieldError> {
        let object = raw.as_object().ok_or_else(|| FieldError::NotAnObject {
            table: self.name.clone(),
            row,
        })?;
        let mut values = HashMap::with_capacity(self.fields.len());
        for (id, kind) in &self.fields {
            let value = object.get(id).ok_or_else(|| FieldError::FieldNotFound {
                table: self.name.clone(),
                row,
                field: id.clone(),
            })?;
            let typed = FieldValue::from_json(*kind, value).ok_or_else(|| {
                FieldError::TypeMismatch {
                    table: self.name.clone(),
                    row,
                    field: id.clone(),
                    expected: *kind,
                    actual: json_kind(value).to_string(),
                }
            })?;
            values.insert(id.clone(), typed);
        }
        Ok(values)
    }
}

#[derive(Debug, Clone)]
pub struct Record {
    table: Arc<str>,
    row: usize,
    values: HashMap<String, FieldValue>,
}

impl Record {
    pub fn row(&self) -> usize {
        self.row
    }

    /// Untyped access to a declared field.
    pub fn get_raw(&self, field: &str) -> Result<&FieldValue, FieldError> {
        self.values
            .get(field)
            .ok_or_else(|| FieldError::FieldNotFound {
                table: self.table.to_string(),
                row: self.row,
                field: field.to_string(),
            })
    }

    pub fn get_string(&self, field: &str) -> Result<&str, FieldError> {
        match self.get_raw(field)? {
            FieldValue::String(value) => Ok(value),
            other => Err(self.mismatch(field, FieldKind::String, other)),
        }
    }

    pub fn get_int(&self, field: &str) -> Result<i64, FieldError> {
        match self.get_raw(field)? {
            FieldValue::Int(value) => Ok(*value),
            other => Err(self.mismatch(field, FieldKind::Int, other)),
        }
    }

    pub fn get_bool(&self, field: &str) -> Result<bool, FieldError> {
        match self.get_raw(field)? {
            FieldValue::Bool(value) => Ok(*value),
            other => Err(self.mismatch(field, FieldKind::Bool, other)),
        }
    }

    pub fn get_key(&self, field: &str) -> Result<Option<usize>, FieldError> {
        match self.get_raw(field)? {
            FieldValue::Key(value) => Ok(*value),
            other => Err(self.mismatch(field, FieldKind::Key, other)),
        }
    }

    fn mismatch(&self, field: &str, expected: FieldKind, actual: &FieldValue) -> FieldError {
        FieldError::TypeMismatch {
            table: self.table.to_string(),
            row: self.row,
            field: field.to_string(),
            expected,
            actual: actual.kind().to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecordTable {
    records: Vec<Record>,
}

impl RecordTable {
    /// Loads a JSON row dump, validating every row against `schema`.
    pub fn from_json(bytes: &[u8], schema: Schema) -> Result<Self, FieldError> {
        let rows: Vec<Value> =
            serde_json::from_slice(bytes).map_err(|source| FieldError::Json {
                table: schema.name.clone(),
                source,
            })?;
        let table: Arc<str> = Arc::from(schema.name.as_str());
        let records = rows
            .iter()
            .enumerate()
            .map(|(row, raw)| -> Result<Record, FieldError> {
                Ok(Record {
                    table: Arc::clone(&table),
                    row,
                    values: schema.validate(row, raw)?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { records })
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Schema {
        Schema::new("Stats")
            .field("Id", FieldKind::String)
            .field("IsLocal", FieldKind::Bool)
    }

    #[test]
    fn test_typed_access() {
        let table = RecordTable::from_json(
            br#"[{"Id": "base_maximum_life", "IsLocal": false, "Extra": 1}]"#,
            schema(),
        )
        .unwrap();
        let record = &table.records()[0];
        assert_eq!(record.get_string("Id").unwrap(), "base_maximum_life");
        assert!(!record.get_bool("IsLocal").unwrap());
        // Undeclared fields are not exposed.
        assert!(matches!(
            record.get_raw("Extra"),
            Err(FieldError::FieldNotFound { .. })
        ));
        assert!(matches!(
            record.get_int("Id"),
            Err(FieldError::TypeMismatch {
                expected: FieldKind::Int,
                ..
            })
        ));
    }

    #[test]
    fn test_missing_field_fails_the_load() {
        let err = RecordTable::from_json(br#"[{"Id": "a", "IsLocal": true}, {"Id": "b"}]"#, schema())
            .unwrap_err();
        assert!(matches!(
            err,
            FieldError::FieldNotFound { row: 1, ref field, .. } if field == "IsLocal"
        ));
    }

    #[test]
    fn test_bool_accepts_stringified_values() {
        let table =
            RecordTable::from_json(br#"[{"Id": "a", "IsLocal": "True"}]"#, schema()).unwrap();
        assert!(table.records()[0].get_bool("IsLocal").unwrap());
    }

    #[test]
    fn test_undefined_key_reads_as_none() {
        let schema = Schema::new("Mods").field("StatsKey1", FieldKind::Key);
        let table = RecordTable::from_json(
            br#"[{"StatsKey1": 18374403900871474942}, {"StatsKey1": 4}, {"StatsKey1": null}]"#,
            schema,
        )
        .unwrap();
        let keys: Vec<Option<usize>> = table
            .records()
            .iter()
            .map(|r| r.get_key("StatsKey1").unwrap())
            .collect();
        assert_eq!(keys, vec![None, Some(4), None]);
    }

    #[test]
    fn test_wrong_json_shape() {
        assert!(matches!(
            RecordTable::from_json(br#"{"Id": "a"}"#, schema()),
            Err(FieldError::Json { .. })
        ));
        assert!(matches!(
            RecordTable::from_json(br#"[1]"#, schema()),
            Err(FieldError::NotAnObject { row: 0, .. })
        ));
    }
}
