//! Read and write `modlist.txt`: the ordered, priority-carrying list of mods
//! for a profile.
//!
//! Format (one entry per line, `\n` line endings):
//!   `+Name`            — enabled
//!   `-Name`            — disabled
//!   `*Name`            — enabled and locked (force-enabled, cannot be toggled)
//!   `+Name_separator`  — enabled separator (also accepted on read)
//!   `-Name_separator`  — separator, canonical written form
//!
//! Index 0 is the highest priority entry; the last line is the lowest.
//! Blank lines and lines not starting with `+`, `-`, or `*` are ignored on
//! read. Separators always round-trip through a `-` prefix on write.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

const SEPARATOR_SUFFIX: &str = "_separator";

/// Manifest sentinel: files deploy to the game root rather than any mod's
/// data path. Never a real scan target for the Mod Index.
pub const ROOT_FOLDER_NAME: &str = "[Root_Folder]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModEntry {
    pub name: String,
    pub enabled: bool,
    pub locked: bool,
    pub is_separator: bool,
}

impl ModEntry {
    pub fn is_separator_name(name: &str) -> bool {
        name.ends_with(SEPARATOR_SUFFIX)
    }

    /// Human-readable name: strips the `_separator` suffix for separators.
    pub fn display_name(&self) -> &str {
        if self.is_separator {
            self.name
                .strip_suffix(SEPARATOR_SUFFIX)
                .unwrap_or(&self.name)
        } else {
            &self.name
        }
    }
}

/// Parse `modlist.txt`. Returns an empty list if the file does not exist —
/// a missing manifest is not an error, it's an empty profile.
pub fn read_modlist(path: &Path) -> Result<Vec<ModEntry>> {
    if !path.is_file() {
        return Ok(Vec::new());
    }
    let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    Ok(parse_modlist(&raw))
}

fn parse_modlist(raw: &str) -> Vec<ModEntry> {
    let mut entries = Vec::new();
    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut chars = line.chars();
        let prefix = match chars.next() {
            Some(c) => c,
            None => continue,
        };
        let name = chars.as_str().to_string();
        if name.is_empty() {
            continue;
        }
        match prefix {
            '+' => entries.push(ModEntry {
                is_separator: ModEntry::is_separator_name(&name),
                name,
                enabled: true,
                locked: false,
            }),
            '-' => {
                let is_sep = ModEntry::is_separator_name(&name);
                entries.push(ModEntry {
                    name,
                    enabled: is_sep,
                    locked: is_sep,
                    is_separator: is_sep,
                });
            }
            '*' => entries.push(ModEntry {
                is_separator: false,
                name,
                enabled: true,
                locked: true,
            }),
            _ => {}
        }
    }
    entries
}

/// Write `entries` back to `path` in order. Ends with exactly one trailing
/// newline iff there is at least one entry. Separators are always re-emitted
/// with a `-` prefix regardless of how they were read.
pub fn write_modlist(path: &Path, entries: &[ModEntry]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let mut lines = Vec::with_capacity(entries.len());
    for entry in entries {
        let prefix = if entry.is_separator {
            '-'
        } else if entry.locked {
            '*'
        } else if entry.enabled {
            '+'
        } else {
            '-'
        };
        lines.push(format!("{prefix}{}", entry.name));
    }
    let mut body = lines.join("\n");
    if !lines.is_empty() {
        body.push('\n');
    }
    fs::write(path, body).with_context(|| format!("write {}", path.display()))
}
