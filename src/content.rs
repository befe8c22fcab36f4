// SPDX-License-Identifier: PMPL-1.0-or-later

//! Game content access
//!
//! The exporter reads an extracted copy of the game's bundle: description
//! files under `Metadata/StatDescriptions` and JSON dumps of the data tables
//! under `Data`.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const STAT_DESCRIPTIONS_DIR: &str = "Metadata/StatDescriptions";
pub const STATS_TABLE: &str = "Data/Stats.json";
pub const MODS_TABLE: &str = "Data/Mods.json";

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("{path} not found in content")]
    NotFound { path: String },
    #[error("cannot read {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} is not decodable text")]
    Undecodable { path: String },
}

/// Read-only view of the game's files, addressed by `/`-separated paths.
pub trait ContentSource: Sync {
    fn read_file(&self, relative_path: &str) -> Result<Vec<u8>, ContentError>;
    fn exists(&self, relative_path: &str) -> bool;

    fn read_text(&self, relative_path: &str) -> Result<String, ContentError> {
        let bytes = self.read_file(relative_path)?;
        decode_text(&bytes).ok_or_else(|| ContentError::Undecodable {
            path: relative_path.to_string(),
        })
    }
}

/// Content extracted to a directory on disk.
#[derive(Debug, Clone)]
pub struct DirectoryContent {
    root: PathBuf,
}

impl DirectoryContent {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, relative_path: &str) -> PathBuf {
        relative_path
            .split('/')
            .filter(|part| !part.is_empty())
            .fold(self.root.clone(), |path, part| path.join(part))
    }
}

impl ContentSource for DirectoryContent {
    fn read_file(&self, relative_path: &str) -> Result<Vec<u8>, ContentError> {
        let path = self.resolve(relative_path);
        fs::read(&path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ContentError::NotFound {
                    path: relative_path.to_string(),
                }
            } else {
                ContentError::Io {
                    path: relative_path.to_string(),
                    source,
                }
            }
        })
    }

    fn exists(&self, relative_path: &str) -> bool {
        self.resolve(relative_path).is_file()
    }
}

/// Decodes a game text file.
///
/// The BOM decides when present. Otherwise UTF-16LE is recognised by its
/// zero high bytes, then UTF-8 is tried, then Windows-1252.
pub fn decode_text(bytes: &[u8]) -> Option<String> {
    if let Some((encoding, _)) = encoding_rs::Encoding::for_bom(bytes) {
        let (text, had_errors) = encoding.decode_with_bom_removal(bytes);
        return (!had_errors).then(|| text.into_owned());
    }
    if bytes.len() >= 2 && bytes.len() % 2 == 0 && bytes[0] != 0 && bytes[1] == 0 {
        let (text, had_errors) = encoding_rs::UTF_16LE.decode_without_bom_handling(bytes);
        if !had_errors {
            return Some(text.into_owned());
        }
    }
    match std::str::from_utf8(bytes) {
        Ok(text) => Some(text.to_string()),
        Err(_) => {
            let (text, _, had_errors) = encoding_rs::WINDOWS_1252.decode(bytes);
            (!had_errors).then(|| text.into_owned())
        }
    }
}

/// Concatenates the named description files in order, skipping missing ones.
/// Fails only when none of them exist.
pub fn read_descriptions<C>(content: &C, files: &[String]) -> Result<String, ContentError>
where
    C: ContentSource + ?Sized,
{
    let mut combined = String::new();
    let mut found = 0;
    for file in files {
        let path = format!("{}/{}", STAT_DESCRIPTIONS_DIR, file);
        if !content.exists(&path) {
            tracing::warn!(path = %path, "description file missing, skipped");
            continue;
        }
        let text = content.read_text(&path)?;
        tracing::debug!(path = %path, bytes = text.len(), "read description file");
        combined.push_str(&text);
        if !combined.ends_with('\n') {
            combined.push('\n');
        }
        found += 1;
    }
    if found == 0 {
        return Err(ContentError::NotFound {
            path: format!("{}/{}", STAT_DESCRIPTIONS_DIR, files.join(", ")),
        });
    }
    Ok(combined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn utf16le_with_bom(text: &str) -> Vec<u8> {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in text.encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        bytes
    }

    #[test]
    fn test_decode_utf16_with_bom() {
        let bytes = utf16le_with_bom("description\r\n1 base_maximum_life\r\n");
        assert_eq!(
            decode_text(&bytes).unwrap(),
            "description\r\n1 base_maximum_life\r\n"
        );
    }

    #[test]
    fn test_decode_utf16_without_bom() {
        let bytes: Vec<u8> = "lang \"German\""
            .encode_utf16()
            .flat_map(|unit| unit.to_le_bytes())
            .collect();
        assert_eq!(decode_text(&bytes).unwrap(), "lang \"German\"");
    }

    #[test]
    fn test_decode_falls_back_to_windows_1252() {
        assert_eq!(decode_text("Leben".as_bytes()).unwrap(), "Leben");
        assert_eq!(decode_text(&[0x4D, 0xFC, 0x6C, 0x6C]).unwrap(), "Müll");
    }

    #[test]
    fn test_directory_content_reads_nested_paths() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("Metadata").join("StatDescriptions");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("stat_descriptions.txt"), utf16le_with_bom("a\n")).unwrap();
        fs::write(nested.join("map_stat_descriptions.txt"), "b").unwrap();

        let content = DirectoryContent::new(dir.path());
        assert!(content.exists("Metadata/StatDescriptions/stat_descriptions.txt"));
        assert!(matches!(
            content.read_file("Data/Stats.json"),
            Err(ContentError::NotFound { .. })
        ));

        let files = vec![
            "stat_descriptions.txt".to_string(),
            "atlas_stat_descriptions.txt".to_string(),
            "map_stat_descriptions.txt".to_string(),
        ];
        assert_eq!(read_descriptions(&content, &files).unwrap(), "a\nb\n");
        assert!(read_descriptions(&content, &["nope.txt".to_string()]).is_err());
    }
}
