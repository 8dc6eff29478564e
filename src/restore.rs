//! Undo what [`crate::deploy`] did, for both deployment shapes.
//!
//! - **Data-backup**: [`restore_data_core`] classifies every file sitting in
//!   the destination as a deployed mod file, a vanilla file recoverable from
//!   the `_Core` backup, or a runtime-created file that belongs to neither —
//!   the last kind is rescued into the `[Overwrite]` pseudo-mod instead of
//!   being discarded, with the Mod Index updated in place so the next
//!   filemap build sees it without a rescan.
//! - **Root-overlay**: [`restore_root_folder`] / [`restore_filemap_from_root`]
//!   replay a deployment log backwards: remove every file it placed, restore
//!   whatever was individually backed up, and delete any top-level
//!   directory the deploy created — regardless of whether anything is left
//!   in it, matching the deploy side's "do not attempt a smart emptiness
//!   check" behavior.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::deploy::{clear_dir, FILEMAP_BACKUP_DIR, FILEMAP_LOG_NAME, ROOT_BACKUP_NAME, ROOT_LOG_NAME};
use crate::index::{ModFiles, ModIndexCache, OVERWRITE_NAME};
use crate::paths::{is_under, normalize_separators};
use crate::sink::Logger;

fn is_symlink(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .map(|m| m.file_type().is_symlink())
        .unwrap_or(false)
}

fn hardlink_count(path: &Path) -> u64 {
    fs::metadata(path).map(|m| nlink(&m)).unwrap_or(1)
}

#[cfg(unix)]
fn nlink(meta: &fs::Metadata) -> u64 {
    std::os::unix::fs::MetadataExt::nlink(meta)
}

#[cfg(not(unix))]
fn nlink(_meta: &fs::Metadata) -> u64 {
    1
}

/// Remove leftover empty subdirectories under `root`, deepest-first. Best
/// effort: a non-empty or otherwise unremovable directory is left alone.
fn prune_empty_dirs(root: &Path) {
    let mut dirs: Vec<_> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir() && e.path() != root)
        .map(|e| e.path().to_path_buf())
        .collect();
    dirs.sort_by_key(|d| std::cmp::Reverse(d.components().count()));
    for dir in dirs {
        let _ = fs::remove_dir(&dir);
    }
}

/// Restore a data-backup destination: if `core_dir` is missing there is
/// nothing to restore. Otherwise, classify every file currently in
/// `deploy_dir` — files that are symlinks, hardlinked to a staging source,
/// present under `core_dir` (a vanilla file a copy-mode deploy placed back
/// without a hardlink), or whose key is tracked by the filemap or the Mod
/// Index's `normal` map are deployed mod files and are simply discarded when
/// `deploy_dir` is cleared; everything else is a runtime-created file and
/// gets rescued into `overwrite_dir` before the clear, with the Mod Index's
/// `[Overwrite]` entry updated in place. Finally, every file from `core_dir`
/// moves back into `deploy_dir` and `core_dir` is removed.
pub fn restore_data_core(
    deploy_dir: &Path,
    core_dir: &Path,
    overwrite_dir: &Path,
    filemap_path: &Path,
    index_path: &Path,
    index_cache: &mut ModIndexCache,
    logger: &dyn Logger,
) -> Result<usize> {
    if !core_dir.is_dir() {
        logger.log("Nothing to restore — no backup core found.");
        return Ok(0);
    }

    if deploy_dir.is_dir() {
        let core_lower: HashSet<String> = walkdir::WalkDir::new(core_dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| {
                let rel = e.path().strip_prefix(core_dir).unwrap();
                normalize_separators(&rel.to_string_lossy()).to_lowercase()
            })
            .collect();

        let filemap_lower: HashSet<String> = fs::read_to_string(filemap_path)
            .unwrap_or_default()
            .lines()
            .filter_map(|l| l.split_once('\t'))
            .map(|(rel, _)| rel.to_lowercase())
            .collect();

        let modindex_lower: HashSet<String> = index_cache
            .read(index_path)
            .map(|index| {
                index
                    .values()
                    .flat_map(|files: &ModFiles| files.normal.keys())
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        let mut rescued = HashMap::new();
        for entry in walkdir::WalkDir::new(deploy_dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let path = entry.path();
            let rel = path.strip_prefix(deploy_dir).unwrap();
            let rel_display = normalize_separators(&rel.to_string_lossy());
            let rel_lower = rel_display.to_lowercase();

            let is_tracked = is_symlink(path)
                || hardlink_count(path) > 1
                || core_lower.contains(&rel_lower)
                || filemap_lower.contains(&rel_lower)
                || modindex_lower.contains(&rel_lower);
            if is_tracked {
                continue;
            }

            let dst = overwrite_dir.join(rel);
            if let Some(parent) = dst.parent() {
                fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
            }
            fs::rename(path, &dst)
                .with_context(|| format!("rescue {} -> {}", path.display(), dst.display()))?;
            logger.log(&format!("Rescued runtime file {rel_display} into [Overwrite]."));
            rescued.insert(rel_lower, rel_display);
        }

        if !rescued.is_empty() {
            let mut files = ModFiles::default();
            for entry in walkdir::WalkDir::new(overwrite_dir)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
            {
                let rel = entry.path().strip_prefix(overwrite_dir).unwrap();
                let display = normalize_separators(&rel.to_string_lossy());
                files.normal.insert(display.to_lowercase(), display);
            }
            index_cache.update(index_path, OVERWRITE_NAME, files)?;
        }

        clear_dir(deploy_dir)?;
    } else {
        fs::create_dir_all(deploy_dir).with_context(|| format!("create {}", deploy_dir.display()))?;
    }

    let files: Vec<_> = walkdir::WalkDir::new(core_dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path().to_path_buf())
        .collect();
    let count = files.len();
    for src in files {
        let rel = src.strip_prefix(core_dir).unwrap();
        let dst = deploy_dir.join(rel);
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
        }
        fs::rename(&src, &dst)
            .with_context(|| format!("restore {} -> {}", src.display(), dst.display()))?;
    }
    fs::remove_dir_all(core_dir).with_context(|| format!("remove {}", core_dir.display()))?;

    logger.log(&format!("Restored {count} vanilla file(s) from backup."));
    Ok(count)
}

/// Undo [`crate::deploy::deploy_root_folder`]: remove every file its log
/// recorded, restore anything it backed up into [`ROOT_BACKUP_NAME`], and
/// remove every top-level directory it created — regardless of whether it
/// still holds other files.
pub fn restore_root_folder(root_folder_dir: &Path, game_root: &Path, logger: &dyn Logger) -> Result<usize> {
    let base = root_folder_dir.parent().unwrap_or(root_folder_dir);
    let log_path = base.join(ROOT_LOG_NAME);
    let backup_dir = base.join(ROOT_BACKUP_NAME);

    if !log_path.is_file() {
        logger.log("No root-folder deployment log found — nothing to restore.");
        return Ok(0);
    }

    let raw = fs::read_to_string(&log_path).with_context(|| format!("read {}", log_path.display()))?;
    let (files_section, dirs_section) = match raw.split_once("\n---dirs---\n") {
        Some((f, d)) => (f, Some(d)),
        None => (raw.as_str(), None),
    };

    let mut removed = 0;
    for rel in files_section.lines().filter(|l| !l.is_empty()) {
        let dst = game_root.join(rel);
        if !is_under(&dst, game_root) {
            logger.log(&format!("WARN: skipping traversal-unsafe path {rel}"));
            continue;
        }
        if dst.is_file() {
            fs::remove_file(&dst).with_context(|| format!("remove {}", dst.display()))?;
            removed += 1;
        }
    }

    if backup_dir.is_dir() {
        let backed_up: Vec<_> = walkdir::WalkDir::new(&backup_dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.path().to_path_buf())
            .collect();
        for src in backed_up {
            let rel = src.strip_prefix(&backup_dir).unwrap();
            let dst = game_root.join(rel);
            if !is_under(&dst, game_root) {
                logger.log(&format!("WARN: skipping traversal-unsafe restore {}", rel.display()));
                continue;
            }
            if let Some(parent) = dst.parent() {
                fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
            }
            fs::rename(&src, &dst)
                .with_context(|| format!("restore {} -> {}", src.display(), dst.display()))?;
        }
        fs::remove_dir_all(&backup_dir).with_context(|| format!("remove {}", backup_dir.display()))?;
    }

    fs::remove_file(&log_path).with_context(|| format!("remove {}", log_path.display()))?;

    if let Some(dirs) = dirs_section {
        for dir in dirs.lines().filter(|l| !l.is_empty()) {
            let dir_path = game_root.join(dir);
            if !is_under(&dir_path, game_root) {
                logger.log(&format!("WARN: skipping traversal-unsafe directory {dir}"));
                continue;
            }
            if dir_path.is_dir() {
                fs::remove_dir_all(&dir_path)
                    .with_context(|| format!("remove {}", dir_path.display()))?;
            }
        }
    }

    prune_empty_dirs(game_root);
    logger.log(&format!("Root Folder: removed {removed} file(s)."));
    Ok(removed)
}

/// Undo [`crate::deploy::deploy_filemap_to_root`]: remove every file its log
/// recorded and restore anything it backed up into [`FILEMAP_BACKUP_DIR`].
/// Never creates or removes directories the way [`restore_root_folder`]
/// does, since that deploy never considers freshly-created top-level dirs.
pub fn restore_filemap_from_root(filemap_path: &Path, game_root: &Path, logger: &dyn Logger) -> Result<usize> {
    let base = filemap_path.parent().unwrap_or_else(|| Path::new("."));
    let log_path = base.join(FILEMAP_LOG_NAME);
    let backup_dir = base.join(FILEMAP_BACKUP_DIR);

    if !log_path.is_file() {
        logger.log("No filemap deployment log found — nothing to restore.");
        return Ok(0);
    }

    let raw = fs::read_to_string(&log_path).with_context(|| format!("read {}", log_path.display()))?;
    let mut removed = 0;
    for rel in raw.lines().filter(|l| !l.is_empty()) {
        let dst = game_root.join(rel);
        if !is_under(&dst, game_root) {
            logger.log(&format!("WARN: skipping traversal-unsafe path {rel}"));
            continue;
        }
        if dst.is_file() {
            fs::remove_file(&dst).with_context(|| format!("remove {}", dst.display()))?;
            removed += 1;
        }
    }

    if backup_dir.is_dir() {
        let backed_up: Vec<_> = walkdir::WalkDir::new(&backup_dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.path().to_path_buf())
            .collect();
        for src in backed_up {
            let rel = src.strip_prefix(&backup_dir).unwrap();
            let dst = game_root.join(rel);
            if !is_under(&dst, game_root) {
                logger.log(&format!("WARN: skipping traversal-unsafe restore {}", rel.display()));
                continue;
            }
            if let Some(parent) = dst.parent() {
                fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
            }
            fs::rename(&src, &dst)
                .with_context(|| format!("restore {} -> {}", src.display(), dst.display()))?;
        }
        fs::remove_dir_all(&backup_dir).with_context(|| format!("remove {}", backup_dir.display()))?;
    }

    fs::remove_file(&log_path).with_context(|| format!("remove {}", log_path.display()))?;
    prune_empty_dirs(game_root);
    logger.log(&format!("Filemap: removed {removed} file(s) from game root."));
    Ok(removed)
}
