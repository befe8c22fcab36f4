// SPDX-License-Identifier: PMPL-1.0-or-later

//! `mods.json`: mod value ranges grouped by the stats they roll
//!
//! ```text
//! { "Default": { "<stat ids>": { "<mod id>": [ {"min", "max"}, ... ] } } }
//! ```

use crate::records::{FieldError, FieldKind, Record, RecordTable, Schema, StatFieldTable};
use anyhow::{anyhow, Result};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::{HashMap, HashSet};

/// Stat slots a mod row carries.
pub const STATS_PER_MOD: usize = 6;

const ROOT_KEY: &str = "Default";

pub fn schema() -> Schema {
    let mut schema = Schema::new("Mods")
        .field("Id", FieldKind::String)
        .field("CorrectGroup", FieldKind::String);
    for slot in 1..=STATS_PER_MOD {
        schema = schema.field(&format!("StatsKey{}", slot), FieldKind::Key);
    }
    for slot in 1..=STATS_PER_MOD {
        schema = schema
            .field(&format!("Stat{}Min", slot), FieldKind::Int)
            .field(&format!("Stat{}Max", slot), FieldKind::Int);
    }
    schema
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct StatRange {
    pub min: i64,
    pub max: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModEntry {
    /// Mod id with its group name removed.
    pub key: String,
    /// Ranges of stats 1 through the last slot holding a stat.
    pub ranges: Vec<StatRange>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModGroup {
    /// Distinct stat ids of the mod, space separated.
    pub stats: String,
    pub mods: Vec<ModEntry>,
}

#[derive(Debug, Clone, Default)]
pub struct ModsDocument {
    groups: Vec<ModGroup>,
}

fn read_mod(record: &Record, stats: &StatFieldTable) -> Result<(String, ModEntry)> {
    let mut stat_ids: Vec<&str> = Vec::new();
    let mut last_valid = 0;
    for slot in 1..=STATS_PER_MOD {
        let Some(row) = record.get_key(&format!("StatsKey{}", slot))? else {
            continue;
        };
        let id = stats.id_at(row).ok_or_else(|| {
            anyhow!(
                "Mods row {} references Stats row {}, which does not exist",
                record.row(),
                row
            )
        })?;
        if !stat_ids.contains(&id) {
            stat_ids.push(id);
        }
        last_valid = slot;
    }

    let ranges = (1..=last_valid)
        .map(|slot| -> Result<StatRange, FieldError> {
            Ok(StatRange {
                min: record.get_int(&format!("Stat{}Min", slot))?,
                max: record.get_int(&format!("Stat{}Max", slot))?,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let id = record.get_string("Id")?;
    let group = record.get_string("CorrectGroup")?;
    let key = if group.is_empty() {
        id.to_string()
    } else {
        id.replace(group, "")
    };

    Ok((stat_ids.join(" "), ModEntry { key, ranges }))
}

impl ModsDocument {
    /// Groups mods in first-seen order. A mod key repeated within a group
    /// keeps its first entry.
    pub fn build(mods: &RecordTable, stats: &StatFieldTable) -> Result<Self> {
        let mut document = ModsDocument::default();
        let mut group_index: HashMap<String, usize> = HashMap::new();
        let mut seen_keys: Vec<HashSet<String>> = Vec::new();

        for record in mods.records() {
            let (stat_key, entry) = read_mod(record, stats)?;
            let index = match group_index.get(&stat_key) {
                Some(&index) => index,
                None => {
                    let index = document.groups.len();
                    group_index.insert(stat_key.clone(), index);
                    document.groups.push(ModGroup {
                        stats: stat_key,
                        mods: Vec::new(),
                    });
                    seen_keys.push(HashSet::new());
                    index
                }
            };
            let group = &mut document.groups[index];
            if !seen_keys[index].insert(entry.key.clone()) {
                tracing::debug!(group = %group.stats, key = %entry.key, "duplicate mod key skipped");
                continue;
            }
            group.mods.push(entry);
        }
        Ok(document)
    }

    pub fn groups(&self) -> &[ModGroup] {
        &self.groups
    }

    pub fn mod_count(&self) -> usize {
        self.groups.iter().map(|group| group.mods.len()).sum()
    }
}

impl Serialize for ModsDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut root = serializer.serialize_map(Some(1))?;
        root.serialize_entry(ROOT_KEY, &GroupsView(&self.groups))?;
        root.end()
    }
}

struct GroupsView<'a>(&'a [ModGroup]);

impl Serialize for GroupsView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for group in self.0 {
            map.serialize_entry(&group.stats, &ModsView(&group.mods))?;
        }
        map.end()
    }
}

struct ModsView<'a>(&'a [ModEntry]);

impl Serialize for ModsView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for entry in self.0 {
            map.serialize_entry(&entry.key, &entry.ranges)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::StatField;
    use serde_json::json;

    const NONE: u64 = crate::records::UNDEFINED_KEY;

    fn stats() -> StatFieldTable {
        StatFieldTable::from_fields(
            ["base_maximum_life", "local_minimum_added_fire_damage", "local_maximum_added_fire_damage"]
                .iter()
                .map(|id| StatField {
                    id: id.to_string(),
                    is_local: false,
                })
                .collect(),
        )
    }

    fn mod_row(id: &str, group: &str, keys: [u64; 6], ranges: [(i64, i64); 6]) -> serde_json::Value {
        let mut row = json!({"Id": id, "CorrectGroup": group});
        let object = row.as_object_mut().unwrap();
        for (i, key) in keys.iter().enumerate() {
            object.insert(format!("StatsKey{}", i + 1), json!(key));
        }
        for (i, (min, max)) in ranges.iter().enumerate() {
            object.insert(format!("Stat{}Min", i + 1), json!(min));
            object.insert(format!("Stat{}Max", i + 1), json!(max));
        }
        row
    }

    fn table(rows: Vec<serde_json::Value>) -> RecordTable {
        let bytes = serde_json::to_vec(&rows).unwrap();
        RecordTable::from_json(&bytes, schema()).unwrap()
    }

    #[test]
    fn test_groups_by_stat_ids_and_strips_group() {
        let empty = [(0, 0); 6];
        let mut life = empty;
        life[0] = (10, 19);
        let mut fire = empty;
        fire[0] = (1, 2);
        fire[1] = (3, 4);
        let mods = table(vec![
            mod_row("IncreasedLife1", "IncreasedLife", [0, NONE, NONE, NONE, NONE, NONE], life),
            mod_row("LocalAddedFireDamage1", "LocalAddedFireDamage", [1, 2, NONE, NONE, NONE, NONE], fire),
            mod_row("IncreasedLife2", "IncreasedLife", [0, NONE, NONE, NONE, NONE, NONE], life),
        ]);
        let document = ModsDocument::build(&mods, &stats()).unwrap();
        assert_eq!(document.groups().len(), 2);
        assert_eq!(document.mod_count(), 3);

        let json = serde_json::to_value(&document).unwrap();
        assert_eq!(
            json["Default"]["base_maximum_life"]["1"],
            json!([{"min": 10, "max": 19}])
        );
        assert_eq!(
            json["Default"]["local_minimum_added_fire_damage local_maximum_added_fire_damage"]["1"],
            json!([{"min": 1, "max": 2}, {"min": 3, "max": 4}])
        );
    }

    #[test]
    fn test_ranges_run_to_last_valid_key() {
        let mut ranges = [(0, 0); 6];
        ranges[2] = (5, 7);
        let mods = table(vec![mod_row(
            "Gap1",
            "",
            [0, NONE, 0, NONE, NONE, NONE],
            ranges,
        )]);
        let document = ModsDocument::build(&mods, &stats()).unwrap();
        let group = &document.groups()[0];
        assert_eq!(group.stats, "base_maximum_life");
        assert_eq!(group.mods[0].key, "Gap1");
        assert_eq!(group.mods[0].ranges.len(), 3);
        assert_eq!(group.mods[0].ranges[2], StatRange { min: 5, max: 7 });
    }

    #[test]
    fn test_dangling_stat_key_is_an_error() {
        let mods = table(vec![mod_row(
            "Broken",
            "Broken",
            [40, NONE, NONE, NONE, NONE, NONE],
            [(0, 0); 6],
        )]);
        assert!(ModsDocument::build(&mods, &stats()).is_err());
    }

    #[test]
    fn test_repeated_mod_key_keeps_first_entry() {
        let mut first = [(0, 0); 6];
        first[0] = (10, 19);
        let mut second = [(0, 0); 6];
        second[0] = (20, 29);
        let life = [0, NONE, NONE, NONE, NONE, NONE];
        let mods = table(vec![
            mod_row("IncreasedLife1", "IncreasedLife", life, first),
            mod_row("IncreasedLife1", "IncreasedLife", life, second),
            mod_row("IncreasedLife2", "IncreasedLife", life, second),
        ]);
        let document = ModsDocument::build(&mods, &stats()).unwrap();
        assert_eq!(document.groups().len(), 1);
        let group = &document.groups()[0];
        assert_eq!(group.mods.len(), 2);
        assert_eq!(group.mods[0].ranges[0], StatRange { min: 10, max: 19 });
        assert_eq!(group.mods[1].key, "2");
    }
}
