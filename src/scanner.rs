//! Walk a single mod's source directory into the two key→display maps the
//! Mod Index stores per mod: `normal` (deploys under the game's data path)
//! and `root` (deploys directly under the game root).
//!
//! Every function here is pure — no shared state, no logging, safe to call
//! from any thread — so the Mod Index can fan a rebuild out across a worker
//! pool without synchronisation beyond collecting the return values.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use walkdir::WalkDir;

use crate::paths::normalize_separators;

/// MO2-style metadata files present in every mod folder; never real game
/// files.
const EXCLUDE_NAMES: &[&str] = &["meta.ini"];

/// Result of scanning one mod's source directory.
pub struct ScanResult {
    pub source_name: String,
    /// key (lowercase, `/`-separated) -> display (original case)
    pub normal: HashMap<String, String>,
    pub root: HashMap<String, String>,
}

/// Full-path prefixes to strip once, longest match first, before the
/// top-level `strip_prefixes` pass. Case-insensitive.
pub fn scan_dir(
    source_name: &str,
    source_dir: &Path,
    strip_prefixes: &HashSet<String>,
    allowed_extensions: &HashSet<String>,
    root_deploy_folders: &HashSet<String>,
    strip_path_prefixes: &[String],
) -> ScanResult {
    let mut normal = HashMap::new();
    let mut root = HashMap::new();

    let mut sorted_path_prefixes: Vec<(String, usize)> = strip_path_prefixes
        .iter()
        .map(|p| (p.to_lowercase(), p.chars().count()))
        .collect();
    sorted_path_prefixes.sort_by(|a, b| b.1.cmp(&a.1));

    for entry in WalkDir::new(source_dir)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy();
        if EXCLUDE_NAMES.contains(&file_name.as_ref()) {
            continue;
        }
        let relative = match entry.path().strip_prefix(source_dir) {
            Ok(r) => r,
            Err(_) => continue,
        };
        let mut rel_str = normalize_separators(&relative.to_string_lossy());

        // Strip full path prefixes first (per-mod "ignore this folder" paths).
        if !sorted_path_prefixes.is_empty() {
            let rel_lower = rel_str.to_lowercase();
            for (p_lower, p_len) in &sorted_path_prefixes {
                if &rel_lower == p_lower || rel_lower.starts_with(&format!("{p_lower}/")) {
                    let char_count = rel_str.chars().count();
                    rel_str = rel_str
                        .chars()
                        .skip((*p_len).min(char_count))
                        .collect::<String>()
                        .trim_start_matches('/')
                        .to_string();
                    break;
                }
            }
        }

        // Strip leading wrapper folders declared by the game, repeatedly.
        if !strip_prefixes.is_empty() {
            while let Some(slash) = rel_str.find('/') {
                let (first_seg, remainder) = rel_str.split_at(slash);
                if strip_prefixes.contains(&first_seg.to_lowercase()) {
                    rel_str = remainder.trim_start_matches('/').to_string();
                } else {
                    break;
                }
            }
        }

        // Route files under root_deploy_folders to the root map, bypassing
        // the extension filter entirely.
        if !root_deploy_folders.is_empty() {
            if let Some(slash) = rel_str.find('/') {
                let top_seg = &rel_str[..slash];
                if root_deploy_folders.contains(&top_seg.to_lowercase()) {
                    root.insert(rel_str.to_lowercase(), rel_str);
                    continue;
                }
            }
        }

        // Extension filter.
        if !allowed_extensions.is_empty() {
            let ext = Path::new(&rel_str)
                .extension()
                .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
                .unwrap_or_default();
            if !allowed_extensions.contains(&ext) {
                continue;
            }
        }

        normal.insert(rel_str.to_lowercase(), rel_str);
    }

    ScanResult {
        source_name: source_name.to_string(),
        normal,
        root,
    }
}
