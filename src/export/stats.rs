// SPDX-License-Identifier: PMPL-1.0-or-later

//! `stats.json`: resolved taxonomy rows grouped by label
//!
//! ```text
//! { label: { trade_id: { "id", "mod"?: "local", "negated",
//!   "text": { "1".."L": { signature: template } } } } }
//! ```
//!
//! `L` is the number of configured languages. Every language index is
//! written even when the record has no lines in it.

use crate::types::ResolvedRow;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone)]
struct LabelGroup {
    label: String,
    rows: Vec<ResolvedRow>,
}

#[derive(Debug, Clone)]
pub struct StatsDocument {
    languages: Vec<String>,
    groups: Vec<LabelGroup>,
}

impl StatsDocument {
    /// Groups rows under `labels` (taxonomy order). A trade id repeated
    /// within a label keeps its first row.
    pub fn new(languages: &[String], labels: &[String], rows: Vec<ResolvedRow>) -> Self {
        let mut groups: Vec<LabelGroup> = labels
            .iter()
            .map(|label| LabelGroup {
                label: label.clone(),
                rows: Vec::new(),
            })
            .collect();
        let mut group_index: HashMap<String, usize> = HashMap::new();
        for (index, group) in groups.iter().enumerate() {
            group_index.entry(group.label.clone()).or_insert(index);
        }
        let mut seen_ids: Vec<HashSet<String>> = vec![HashSet::new(); groups.len()];

        for row in rows {
            for section in &row.text_by_language {
                if !languages.contains(&section.language) {
                    tracing::debug!(
                        language = %section.language,
                        record = %row.full_identifier,
                        "language not configured, dropped from export"
                    );
                }
            }

            let index = match group_index.get(&row.label) {
                Some(&index) => index,
                None => {
                    let index = groups.len();
                    group_index.insert(row.label.clone(), index);
                    groups.push(LabelGroup {
                        label: row.label.clone(),
                        rows: Vec::new(),
                    });
                    seen_ids.push(HashSet::new());
                    index
                }
            };
            if !seen_ids[index].insert(row.trade_id.clone()) {
                tracing::debug!(
                    label = %row.label,
                    trade_id = %row.trade_id,
                    "trade id already exported, keeping the first"
                );
                continue;
            }
            groups[index].rows.push(row);
        }

        Self {
            languages: languages.to_vec(),
            groups,
        }
    }

    pub fn row_count(&self) -> usize {
        self.groups.iter().map(|group| group.rows.len()).sum()
    }

    pub fn label_count(&self) -> usize {
        self.groups.len()
    }
}

impl Serialize for StatsDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.groups.len()))?;
        for group in &self.groups {
            map.serialize_entry(
                &group.label,
                &RowsView {
                    rows: &group.rows,
                    languages: &self.languages,
                },
            )?;
        }
        map.end()
    }
}

struct RowsView<'a> {
    rows: &'a [ResolvedRow],
    languages: &'a [String],
}

impl Serialize for RowsView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.rows.len()))?;
        for row in self.rows {
            map.serialize_entry(
                &row.trade_id,
                &RowView {
                    row,
                    languages: self.languages,
                },
            )?;
        }
        map.end()
    }
}

struct RowView<'a> {
    row: &'a ResolvedRow,
    languages: &'a [String],
}

impl Serialize for RowView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("id", &self.row.full_identifier)?;
        if self.row.is_local {
            map.serialize_entry("mod", "local")?;
        }
        map.serialize_entry("negated", &self.row.negated)?;
        map.serialize_entry(
            "text",
            &TextView {
                row: self.row,
                languages: self.languages,
            },
        )?;
        map.end()
    }
}

struct TextView<'a> {
    row: &'a ResolvedRow,
    languages: &'a [String],
}

impl Serialize for TextView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.languages.len()))?;
        for (index, language) in self.languages.iter().enumerate() {
            let templates = self
                .row
                .text_by_language
                .iter()
                .find(|section| &section.language == language)
                .map(|section| section.templates.as_slice())
                .unwrap_or(&[]);
            map.serialize_entry(&(index + 1).to_string(), &TemplatesView(templates))?;
        }
        map.end()
    }
}

struct TemplatesView<'a>(&'a [(String, String)]);

impl Serialize for TemplatesView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (signature, template) in self.0 {
            map.serialize_entry(signature, template)?;
        }
        map.end()
    }
}
