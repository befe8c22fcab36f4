// SPDX-License-Identifier: PMPL-1.0-or-later

//! Run configuration
//!
//! Every table the export relies on (languages, trade suffixes, labels that
//! are expected to stay unresolved, description files) is plain data here
//! and can be overridden from a YAML or JSON file.

use crate::matcher::DEFAULT_TRADE_SUFFIXES;
use crate::types::BASE_LANGUAGE;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Export order of the game's languages; position + 1 is the language index.
pub const DEFAULT_LANGUAGES: &[&str] = &[
    BASE_LANGUAGE,
    "Portuguese",
    "Russian",
    "Thai",
    "German",
    "French",
    "Spanish",
    "Korean",
    "SimplifiedChinese",
    "TraditionalChinese",
    "Japanese",
];

/// Trade labels with no internal description by nature.
pub const DEFAULT_SUPPRESSED_LABELS: &[&str] = &["pseudo", "delve", "monster", "veiled"];

pub const DEFAULT_DESCRIPTION_FILES: &[&str] = &[
    "stat_descriptions.txt",
    "map_stat_descriptions.txt",
    "atlas_stat_descriptions.txt",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    pub languages: Vec<String>,
    pub trade_suffixes: Vec<String>,
    pub suppressed_labels: Vec<String>,
    /// Files under `Metadata/StatDescriptions`, concatenated in this order.
    pub description_files: Vec<String>,
    pub parallel: bool,
}

fn owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            languages: owned(DEFAULT_LANGUAGES),
            trade_suffixes: owned(DEFAULT_TRADE_SUFFIXES),
            suppressed_labels: owned(DEFAULT_SUPPRESSED_LABELS),
            description_files: owned(DEFAULT_DESCRIPTION_FILES),
            parallel: false,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let config: Config = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&raw)
                .with_context(|| format!("parsing {}", path.display()))?,
            _ => serde_json::from_str(&raw)
                .with_context(|| format!("parsing {}", path.display()))?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.languages.is_empty() {
            return Err(anyhow!("configuration lists no languages"));
        }
        if self.description_files.is_empty() {
            return Err(anyhow!("configuration lists no description files"));
        }
        Ok(())
    }

    /// First configured language; description files open in it.
    pub fn base_language(&self) -> &str {
        self.languages
            .first()
            .map(String::as_str)
            .unwrap_or(BASE_LANGUAGE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.base_language(), "English");
        assert_eq!(config.languages[2], "Russian");
        assert!(config.trade_suffixes.contains(&" (Local)".to_string()));
    }

    #[test]
    fn test_yaml_overrides_keep_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stat-mapper.yaml");
        fs::write(&path, "languages: [English, German]\nparallel: true\n").unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.languages, vec!["English", "German"]);
        assert!(config.parallel);
        assert_eq!(config.suppressed_labels, owned(DEFAULT_SUPPRESSED_LABELS));
    }

    #[test]
    fn test_json_config_and_validation() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stat-mapper.json");
        fs::write(&path, r#"{"languages": []}"#).unwrap();
        assert!(Config::load(&path).is_err());

        fs::write(&path, r#"{"suppressed-labels": ["pseudo"]}"#).unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.suppressed_labels, vec!["pseudo"]);
    }
}
