// SPDX-License-Identifier: PMPL-1.0-or-later

//! Stat-Mapper: stat description resolution for Path of Exile assets.
//!
//! The game describes every modifier stat with localized text templates
//! ("%1%%% increased Physical Damage"). The trade site publishes its own
//! taxonomy of searchable stats as literal strings with `#` placeholders.
//! This crate parses the templates and maps every taxonomy entry back to
//! the stat description that generates it.
//!
//! PIPELINE:
//! 1. **Descriptions**: block parser for `stat_descriptions.txt` files.
//! 2. **Matcher**: compiled per-line patterns with value-class checks.
//! 3. **Reconcile**: taxonomy entries to resolved rows with every language.
//! 4. **Export**: `stats.json` and `mods.json` artifacts.

pub mod config;
pub mod content;
pub mod descriptions;
pub mod diagnostics;
pub mod export;
pub mod matcher;
pub mod reconcile;
pub mod records;
pub mod report;
pub mod taxonomy;
pub mod types;
