// SPDX-License-Identifier: PMPL-1.0-or-later

//! The Stats table: internal stat ids and their local-only flag

use crate::matcher::has_matching_identifier;
use crate::records::{FieldError, FieldKind, RecordTable, Schema};
use crate::reconcile::StatLocality;
use crate::types::StatRecord;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatField {
    pub id: String,
    pub is_local: bool,
}

#[derive(Debug, Clone, Default)]
pub struct StatFieldTable {
    fields: Vec<StatField>,
}

impl StatFieldTable {
    pub fn schema() -> Schema {
        Schema::new("Stats")
            .field("Id", FieldKind::String)
            .field("IsLocal", FieldKind::Bool)
    }

    pub fn from_table(table: &RecordTable) -> Result<Self, FieldError> {
        let fields = table
            .records()
            .iter()
            .map(|record| -> Result<StatField, FieldError> {
                Ok(StatField {
                    id: record.get_string("Id")?.to_string(),
                    is_local: record.get_bool("IsLocal")?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { fields })
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, FieldError> {
        let table = RecordTable::from_json(bytes, Self::schema())?;
        Self::from_table(&table)
    }

    pub fn from_fields(fields: Vec<StatField>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[StatField] {
        &self.fields
    }

    /// Stat id at a table row, as referenced by other tables' keys.
    pub fn id_at(&self, row: usize) -> Option<&str> {
        self.fields.get(row).map(|field| field.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl StatLocality for StatFieldTable {
    fn is_local(&self, record: &StatRecord) -> bool {
        self.fields
            .iter()
            .any(|field| field.is_local && has_matching_identifier(record, &field.id))
    }
}
