//! Build `filemap.txt` (and, when root-deploy files are present,
//! `filemap_root.txt`) from the current manifest: for every relative path,
//! resolve which enabled mod wins, and classify each mod's conflict status.
//!
//! Reads file lists from the Mod Index (fast path); falls back to a full
//! rebuild when the index is missing or corrupt.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::config::GameConfig;
use crate::index::{Index, ModIndexCache, OVERWRITE_NAME};
use crate::modlist::read_modlist;
use crate::sink::Logger;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConflictStatus {
    /// No conflicts at all.
    None,
    /// Wins some/all conflicts, loses none.
    Wins,
    /// Loses some conflicts, wins none.
    Loses,
    /// Wins some, loses some.
    Partial,
    /// Every file this mod provides is overridden — nothing it ships
    /// reaches the game.
    Full,
}

pub struct FilemapResult {
    pub file_count: usize,
    pub conflict_map: HashMap<String, ConflictStatus>,
    pub overrides: HashMap<String, HashSet<String>>,
    pub overridden_by: HashMap<String, HashSet<String>>,
}

/// Build `output_path` (`filemap.txt`) and, if needed, a sibling
/// `filemap_root.txt`, from `modlist_path` and the Mod Index rooted at
/// `output_path`'s parent directory.
pub fn build_filemap(
    modlist_path: &Path,
    staging_root: &Path,
    output_path: &Path,
    config: &GameConfig,
    index_cache: &mut ModIndexCache,
    logger: &dyn Logger,
) -> Result<FilemapResult> {
    let entries = read_modlist(modlist_path)?;
    let enabled: Vec<_> = entries
        .into_iter()
        .filter(|e| !e.is_separator && e.enabled)
        .collect();

    // modlist index 0 = highest priority, so walk low-to-high, then append
    // the always-highest-priority overwrite folder.
    let mut priority_order: Vec<String> = enabled
        .into_iter()
        .rev()
        .map(|e| e.name)
        .filter(|n| n != crate::modlist::ROOT_FOLDER_NAME)
        .collect();
    priority_order.push(OVERWRITE_NAME.to_string());

    let index_path = output_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join("modindex.txt");

    let index: Index = match index_cache.read(&index_path) {
        Some(idx) => idx.clone(),
        None => {
            logger.log("mod index missing or unreadable, rebuilding from disk");
            index_cache.rebuild(&index_path, staging_root, config, logger)?;
            index_cache.read(&index_path).cloned().unwrap_or_default()
        }
    };

    let mut raw: HashMap<String, HashMap<String, String>> = HashMap::new();
    let mut raw_root: HashMap<String, HashMap<String, String>> = HashMap::new();
    for name in &priority_order {
        if let Some(entry) = index.get(name) {
            if !entry.normal.is_empty() {
                raw.insert(name.clone(), entry.normal.clone());
            }
            if !entry.root.is_empty() {
                raw_root.insert(name.clone(), entry.root.clone());
            }
        }
    }

    let mut filemap_winner: HashMap<String, String> = HashMap::new();
    let mut mod_files: HashMap<String, HashSet<String>> = HashMap::new();
    for name in &priority_order {
        let Some(files) = raw.get(name) else {
            continue;
        };
        mod_files.insert(name.clone(), files.keys().cloned().collect());
        for key in files.keys() {
            filemap_winner.insert(key.clone(), name.clone());
        }
    }

    let mut filemap: HashMap<String, (String, String)> = HashMap::new();
    for (rel_key, winner) in &filemap_winner {
        let rel_str = raw
            .get(winner)
            .and_then(|f| f.get(rel_key))
            .cloned()
            .unwrap_or_else(|| rel_key.clone());
        filemap.insert(rel_key.clone(), (rel_str, winner.clone()));
    }

    let mut overrides: HashMap<String, HashSet<String>> =
        priority_order.iter().map(|s| (s.clone(), HashSet::new())).collect();
    let mut overridden_by: HashMap<String, HashSet<String>> =
        priority_order.iter().map(|s| (s.clone(), HashSet::new())).collect();

    let mut current_holder: HashMap<String, String> = HashMap::new();
    for name in &priority_order {
        let Some(keys) = mod_files.get(name) else {
            continue;
        };
        for key in keys {
            if let Some(loser) = current_holder.get(key) {
                overrides.get_mut(name).unwrap().insert(loser.clone());
                overridden_by.get_mut(loser).unwrap().insert(name.clone());
            }
            current_holder.insert(key.clone(), name.clone());
        }
    }

    let mut conflict_map: HashMap<String, ConflictStatus> = HashMap::new();
    for name in &priority_order {
        let keys = mod_files.get(name);
        let has_wins = !overrides[name].is_empty();
        let has_loses = !overridden_by[name].is_empty();
        let status = match keys {
            None => ConflictStatus::None,
            Some(keys) if keys.is_empty() => ConflictStatus::None,
            Some(_) if !has_wins && !has_loses => ConflictStatus::None,
            Some(keys)
                if has_loses
                    && keys
                        .iter()
                        .all(|k| filemap.get(k).map(|(_, w)| w != name).unwrap_or(true)) =>
            {
                ConflictStatus::Full
            }
            Some(_) if has_wins && !has_loses => ConflictStatus::Wins,
            Some(_) if has_loses && !has_wins => ConflictStatus::Loses,
            Some(_) => ConflictStatus::Partial,
        };
        conflict_map.insert(name.clone(), status);
    }

    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let mut sorted_keys: Vec<&String> = filemap.keys().collect();
    sorted_keys.sort();
    let mut body = String::new();
    for rel_key in &sorted_keys {
        let (rel_str, mod_name) = &filemap[*rel_key];
        body.push_str(&format!("{rel_str}\t{mod_name}\n"));
    }
    fs::write(output_path, body).with_context(|| format!("write {}", output_path.display()))?;
    let mut file_count = sorted_keys.len();

    let root_output = output_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join("filemap_root.txt");
    if !raw_root.is_empty() {
        let mut root_winner: HashMap<String, String> = HashMap::new();
        for name in &priority_order {
            let Some(rfiles) = raw_root.get(name) else {
                continue;
            };
            for key in rfiles.keys() {
                root_winner.insert(key.clone(), name.clone());
            }
        }
        let mut root_filemap: HashMap<String, (String, String)> = HashMap::new();
        for (rel_key, winner) in &root_winner {
            let rel_str = raw_root
                .get(winner)
                .and_then(|f| f.get(rel_key))
                .cloned()
                .unwrap_or_else(|| rel_key.clone());
            root_filemap.insert(rel_key.clone(), (rel_str, winner.clone()));
        }
        let mut sorted_root: Vec<&String> = root_filemap.keys().collect();
        sorted_root.sort();
        let mut root_body = String::new();
        for rel_key in &sorted_root {
            let (rel_str, mod_name) = &root_filemap[*rel_key];
            root_body.push_str(&format!("{rel_str}\t{mod_name}\n"));
        }
        fs::write(&root_output, root_body)
            .with_context(|| format!("write {}", root_output.display()))?;
        file_count += sorted_root.len();
    } else if root_output.is_file() {
        fs::remove_file(&root_output)
            .with_context(|| format!("remove stale {}", root_output.display()))?;
    }

    Ok(FilemapResult {
        file_count,
        conflict_map,
        overrides,
        overridden_by,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DeploymentShape;
    use crate::index::ModFiles;
    use crate::modlist::{write_modlist, ModEntry};
    use crate::sink::NullLogger;

    fn config(tmp: &Path) -> GameConfig {
        GameConfig {
            game_name: "Test".into(),
            deployment_shape: DeploymentShape::DataBackup,
            profile_root: tmp.join("profile"),
            staging_root: tmp.join("staging"),
            destination_root: tmp.join("dest"),
            strip_prefixes: Vec::new(),
            per_mod_strip_prefixes: HashMap::new(),
            allowed_extensions: Vec::new(),
            root_deploy_folders: Vec::new(),
            game_root: None,
        }
    }

    fn entry(name: &str) -> ModEntry {
        ModEntry {
            name: name.to_string(),
            enabled: true,
            locked: false,
            is_separator: false,
        }
    }

    #[test]
    fn higher_priority_mod_wins_and_loser_gets_full_conflict() {
        let tmp = tempfile::tempdir().unwrap();
        let profile_root = tmp.path().join("profile");
        fs::create_dir_all(&profile_root).unwrap();
        let modlist_path = profile_root.join("modlist.txt");
        // index 0 = highest priority
        write_modlist(&modlist_path, &[entry("High"), entry("Low")]).unwrap();

        let index_path = profile_root.join("modindex.txt");
        let mut cache = ModIndexCache::new();
        let mut high_files = ModFiles::default();
        high_files.normal.insert("a.txt".into(), "a.txt".into());
        cache.update(&index_path, "High", high_files).unwrap();
        let mut low_files = ModFiles::default();
        low_files.normal.insert("a.txt".into(), "a.txt".into());
        cache.update(&index_path, "Low", low_files).unwrap();

        let output_path = profile_root.join("filemap.txt");
        let result = build_filemap(
            &modlist_path,
            &tmp.path().join("staging"),
            &output_path,
            &config(tmp.path()),
            &mut cache,
            &NullLogger,
        )
        .unwrap();

        assert_eq!(result.file_count, 1);
        assert_eq!(result.conflict_map["High"], ConflictStatus::Wins);
        assert_eq!(result.conflict_map["Low"], ConflictStatus::Full);
        assert!(result.overrides["High"].contains("Low"));
        assert!(result.overridden_by["Low"].contains("High"));

        let written = fs::read_to_string(&output_path).unwrap();
        assert_eq!(written, "a.txt\tHigh\n");
    }

    #[test]
    fn disjoint_mods_have_no_conflicts() {
        let tmp = tempfile::tempdir().unwrap();
        let profile_root = tmp.path().join("profile");
        fs::create_dir_all(&profile_root).unwrap();
        let modlist_path = profile_root.join("modlist.txt");
        write_modlist(&modlist_path, &[entry("A"), entry("B")]).unwrap();

        let index_path = profile_root.join("modindex.txt");
        let mut cache = ModIndexCache::new();
        let mut a_files = ModFiles::default();
        a_files.normal.insert("a.txt".into(), "a.txt".into());
        cache.update(&index_path, "A", a_files).unwrap();
        let mut b_files = ModFiles::default();
        b_files.normal.insert("b.txt".into(), "b.txt".into());
        cache.update(&index_path, "B", b_files).unwrap();

        let output_path = profile_root.join("filemap.txt");
        let result = build_filemap(
            &modlist_path,
            &tmp.path().join("staging"),
            &output_path,
            &config(tmp.path()),
            &mut cache,
            &NullLogger,
        )
        .unwrap();

        assert_eq!(result.file_count, 2);
        assert_eq!(result.conflict_map["A"], ConflictStatus::None);
        assert_eq!(result.conflict_map["B"], ConflictStatus::None);
    }

    #[test]
    fn disabled_mods_are_excluded() {
        let tmp = tempfile::tempdir().unwrap();
        let profile_root = tmp.path().join("profile");
        fs::create_dir_all(&profile_root).unwrap();
        let modlist_path = profile_root.join("modlist.txt");
        let mut disabled = entry("Off");
        disabled.enabled = false;
        write_modlist(&modlist_path, &[disabled]).unwrap();

        let index_path = profile_root.join("modindex.txt");
        let mut cache = ModIndexCache::new();
        let mut files = ModFiles::default();
        files.normal.insert("a.txt".into(), "a.txt".into());
        cache.update(&index_path, "Off", files).unwrap();

        let output_path = profile_root.join("filemap.txt");
        let result = build_filemap(
            &modlist_path,
            &tmp.path().join("staging"),
            &output_path,
            &config(tmp.path()),
            &mut cache,
            &NullLogger,
        )
        .unwrap();
        assert_eq!(result.file_count, 0);
    }
}
