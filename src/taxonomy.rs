// SPDX-License-Identifier: PMPL-1.0-or-later

//! Trade-site stat taxonomy
//!
//! The trade API publishes its searchable stats as
//! `{"result": [{"label": "Explicit", "entries": [{"id": "explicit.stat_1", "text": "..."}]}]}`.

use crate::types::TaxonomyEntry;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct RawTaxonomy {
    result: Vec<RawGroup>,
}

#[derive(Debug, Deserialize)]
struct RawGroup {
    label: String,
    #[serde(default)]
    entries: Vec<RawEntry>,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    id: String,
    text: String,
}

#[derive(Debug, Clone, Default)]
pub struct Taxonomy {
    labels: Vec<String>,
    entries: Vec<TaxonomyEntry>,
}

impl Taxonomy {
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let raw: RawTaxonomy =
            serde_json::from_slice(bytes).context("taxonomy is not a trade stats document")?;

        let mut taxonomy = Taxonomy::default();
        for group in raw.result {
            let label = group.label.to_lowercase();
            let prefix = format!("{}.", label);
            for entry in group.entries {
                let trade_id = entry
                    .id
                    .strip_prefix(&prefix)
                    .unwrap_or(&entry.id)
                    .to_string();
                taxonomy.entries.push(TaxonomyEntry {
                    label: label.clone(),
                    trade_id,
                    display_text: entry.text,
                });
            }
            if !taxonomy.labels.contains(&label) {
                taxonomy.labels.push(label);
            }
        }
        Ok(taxonomy)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        Self::from_json(&bytes).with_context(|| format!("parsing {}", path.display()))
    }

    /// Lowercased labels in first-seen order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn entries(&self) -> &[TaxonomyEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
