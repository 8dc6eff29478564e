//! Persistent cache of every mod's file list (`modindex.txt`), so the
//! Filemap Builder can skip a full disk scan on every enable/disable/reorder
//! and only rescan when a mod is installed, removed, or the caller asks for
//! an explicit rebuild.
//!
//! Format — one header line then one tab-separated data line per file:
//!   `#modindex v2`
//!   `<mod_name>\t<rel_key_lower>\t<rel_str_normalized>\t<kind>`
//! where `<kind>` is `n` (normal) or `r` (root-deploy). Folder-segment casing
//! is normalized across every mod at write time (see
//! [`normalize_folder_cases`]) so readers never need to redo that step.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{Context, Result};
use rayon::prelude::*;

use crate::config::GameConfig;
use crate::scanner::scan_dir;
use crate::sink::Logger;

pub const OVERWRITE_NAME: &str = "[Overwrite]";
const INDEX_HEADER: &str = "#modindex v2\n";

/// One mod's file lists: key (lowercase) -> display (original, folder-case
/// normalized).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModFiles {
    pub normal: HashMap<String, String>,
    pub root: HashMap<String, String>,
}

pub type Index = HashMap<String, ModFiles>;

/// Owns the in-memory `(path, mtime)` cache for one index file. Not global —
/// callers that need the cache to persist across calls hold one of these for
/// the lifetime of a profile session.
#[derive(Default)]
pub struct ModIndexCache {
    cached: Option<(PathBuf, SystemTime, Index)>,
}

impl ModIndexCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `index_path`, returning `None` if it is missing, unreadable, or
    /// carries an unrecognised header — the caller's cue to fall back to
    /// [`ModIndexCache::rebuild`].
    pub fn read(&mut self, index_path: &Path) -> Option<&Index> {
        let mtime = fs::metadata(index_path).ok()?.modified().ok()?;
        if let Some((cached_path, cached_mtime, _)) = &self.cached {
            if cached_path == index_path && *cached_mtime == mtime {
                return self.cached.as_ref().map(|(_, _, idx)| idx);
            }
        }
        let raw = fs::read_to_string(index_path).ok()?;
        let mut lines = raw.lines();
        if lines.next() != Some(INDEX_HEADER.trim_end_matches('\n')) {
            return None;
        }
        let mut index: Index = HashMap::new();
        for line in lines {
            if line.is_empty() {
                continue;
            }
            let parts: Vec<&str> = line.splitn(4, '\t').collect();
            if parts.len() != 4 {
                continue;
            }
            let (mod_name, rel_key, rel_str, kind) = (parts[0], parts[1], parts[2], parts[3]);
            let entry = index.entry(mod_name.to_string()).or_default();
            if kind == "r" {
                entry.root.insert(rel_key.to_string(), rel_str.to_string());
            } else {
                entry.normal.insert(rel_key.to_string(), rel_str.to_string());
            }
        }
        self.cached = Some((index_path.to_path_buf(), mtime, index));
        self.cached.as_ref().map(|(_, _, idx)| idx)
    }

    /// Normalize folder-case across the whole index — `normal` and `root`
    /// maps share one canonical-casing pool, since the same folder segment
    /// (e.g. a plugin loader's directory) can appear in one mod's `root` map
    /// and another mod's `normal` map and must still resolve to one casing —
    /// then write it atomically (temp file + rename) and refresh the cache
    /// to match.
    fn write(&mut self, index_path: &Path, mut index: Index) -> Result<()> {
        let mut maps: Vec<&mut HashMap<String, String>> = Vec::new();
        for files in index.values_mut() {
            maps.push(&mut files.normal);
            maps.push(&mut files.root);
        }
        normalize_folder_cases_in(maps.into_iter());

        if let Some(parent) = index_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
        }
        let tmp = index_path.with_extension("tmp");
        let mut body = String::from(INDEX_HEADER);
        for (mod_name, files) in &index {
            for (rel_key, rel_str) in &files.normal {
                body.push_str(&format!("{mod_name}\t{rel_key}\t{rel_str}\tn\n"));
            }
            for (rel_key, rel_str) in &files.root {
                body.push_str(&format!("{mod_name}\t{rel_key}\t{rel_str}\tr\n"));
            }
        }
        fs::write(&tmp, body).with_context(|| format!("write {}", tmp.display()))?;
        fs::rename(&tmp, index_path)
            .with_context(|| format!("rename {} to {}", tmp.display(), index_path.display()))?;

        match fs::metadata(index_path).and_then(|m| m.modified()) {
            Ok(mtime) => self.cached = Some((index_path.to_path_buf(), mtime, index)),
            Err(_) => self.cached = None,
        }
        Ok(())
    }

    /// Add or replace a single mod's entry, reading the existing index (if
    /// any) first. Call this after installing a mod.
    pub fn update(
        &mut self,
        index_path: &Path,
        mod_name: &str,
        files: ModFiles,
    ) -> Result<()> {
        let mut index = self.read(index_path).cloned().unwrap_or_default();
        index.insert(mod_name.to_string(), files);
        self.write(index_path, index)
    }

    /// Remove one or more mods from the index. No-op if the index is
    /// missing or none of `mod_names` are present. Call after deleting mod
    /// folders from staging.
    pub fn remove(&mut self, index_path: &Path, mod_names: &[String]) -> Result<()> {
        if !index_path.is_file() {
            return Ok(());
        }
        let Some(mut index) = self.read(index_path).cloned() else {
            return Ok(());
        };
        let mut changed = false;
        for name in mod_names {
            if index.remove(name).is_some() {
                changed = true;
            }
        }
        if changed {
            self.write(index_path, index)?;
        }
        Ok(())
    }

    /// Scan every mod folder under `staging_root` (plus the `[Overwrite]`
    /// folder, which sits alongside staging) in parallel and rewrite the
    /// full index. This is the slow path — triggered explicitly, never on
    /// every enable/disable/reorder.
    pub fn rebuild(
        &mut self,
        index_path: &Path,
        staging_root: &Path,
        config: &GameConfig,
        logger: &dyn Logger,
    ) -> Result<()> {
        let mut scan_targets: Vec<(String, PathBuf)> = Vec::new();
        if let Ok(read) = fs::read_dir(staging_root) {
            for entry in read.flatten() {
                if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                    if let Some(name) = entry.file_name().to_str() {
                        scan_targets.push((name.to_string(), entry.path()));
                    }
                }
            }
        } else {
            logger.log(&format!(
                "mod index rebuild: cannot read staging root {}",
                staging_root.display()
            ));
        }
        let overwrite_dir = staging_root
            .parent()
            .map(|p| p.join("overwrite"))
            .unwrap_or_else(|| staging_root.join("overwrite"));
        scan_targets.push((OVERWRITE_NAME.to_string(), overwrite_dir));

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(20)
            .build()
            .context("build scan thread pool")?;

        let allowed_extensions: HashSet<String> =
            config.allowed_extensions.iter().map(|s| s.to_lowercase()).collect();
        let root_deploy_folders: HashSet<String> =
            config.root_deploy_folders.iter().map(|s| s.to_lowercase()).collect();
        let base_strip: HashSet<String> =
            config.strip_prefixes.iter().map(|s| s.to_lowercase()).collect();

        let results: Vec<(String, ModFiles)> = pool.install(|| {
            scan_targets
                .par_iter()
                .map(|(name, dir)| {
                    let mod_strip = config.per_mod_strip_prefixes.get(name);
                    let mut strip = base_strip.clone();
                    let mut path_prefixes = Vec::new();
                    if let Some(entries) = mod_strip {
                        for s in entries {
                            if s.contains('/') {
                                path_prefixes.push(s.clone());
                            } else {
                                strip.insert(s.to_lowercase());
                            }
                        }
                    }
                    let scanned = scan_dir(
                        name,
                        dir,
                        &strip,
                        &allowed_extensions,
                        &root_deploy_folders,
                        &path_prefixes,
                    );
                    (
                        scanned.source_name,
                        ModFiles {
                            normal: scanned.normal,
                            root: scanned.root,
                        },
                    )
                })
                .collect()
        });

        let index: Index = results.into_iter().collect();
        self.write(index_path, index)
    }
}

/// Pick the canonical casing for a folder segment seen under two names:
/// whichever has more uppercase characters; on a tie, the lexicographically
/// smaller one, so the choice is independent of which mod was scanned first.
fn pick_canonical_segment(a: &str, b: &str) -> String {
    let upper_a = a.chars().filter(|c| c.is_uppercase()).count();
    let upper_b = b.chars().filter(|c| c.is_uppercase()).count();
    let winner = match upper_a.cmp(&upper_b) {
        std::cmp::Ordering::Greater => a,
        std::cmp::Ordering::Less => b,
        std::cmp::Ordering::Equal => {
            if a <= b {
                a
            } else {
                b
            }
        }
    };
    winner.to_string()
}

/// Rewrite every folder segment (all path components but the last) across
/// the given file maps so that each unique lowercase segment uses one
/// consistent casing everywhere. File names are left untouched.
fn normalize_folder_cases_in<'a>(maps: impl Iterator<Item = &'a mut HashMap<String, String>>) {
    let maps: Vec<&mut HashMap<String, String>> = maps.collect();
    let mut canonical: HashMap<String, String> = HashMap::new();
    for map in &maps {
        for rel_str in map.values() {
            let parts: Vec<&str> = rel_str.split('/').collect();
            for seg in parts.iter().take(parts.len().saturating_sub(1)) {
                let key = seg.to_lowercase();
                canonical
                    .entry(key)
                    .and_modify(|existing| *existing = pick_canonical_segment(existing, seg))
                    .or_insert_with(|| seg.to_string());
            }
        }
    }
    if canonical.is_empty() {
        return;
    }
    for map in maps {
        for rel_str in map.values_mut() {
            let parts: Vec<&str> = rel_str.split('/').collect();
            if parts.len() < 2 {
                continue;
            }
            let mut new_parts: Vec<String> = parts[..parts.len() - 1]
                .iter()
                .map(|seg| canonical.get(&seg.to_lowercase()).cloned().unwrap_or_else(|| seg.to_string()))
                .collect();
            new_parts.push(parts[parts.len() - 1].to_string());
            let new_rel = new_parts.join("/");
            if new_rel != *rel_str {
                *rel_str = new_rel;
            }
        }
    }
}
