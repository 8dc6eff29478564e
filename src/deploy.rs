//! Link mod files from staging into a game install, in one of two shapes
//! (see [`crate::config::DeploymentShape`]):
//!
//! - **Data-backup**: [`move_to_core`] bulk-moves the destination's existing
//!   contents to a sibling `_Core` folder once, [`deploy_filemap`] links mod
//!   files in, [`deploy_core`] fills any remaining gap from the backup.
//! - **Root-overlay**: [`deploy_filemap_to_root`] / [`deploy_root_folder`]
//!   back up only the individual files a mod overwrites, and record every
//!   placed path (plus freshly-created top-level directories) in a
//!   deployment log so [`crate::restore`] can undo precisely that.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::index::OVERWRITE_NAME;
use crate::paths::{normalize_separators, resolve_nocase, NoCaseCache};
use crate::sink::{Logger, ProgressSink};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkMode {
    Hardlink,
    Symlink,
    Copy,
}

pub const ROOT_BACKUP_NAME: &str = "Root_Backup";
pub const ROOT_LOG_NAME: &str = "root_folder_deployed.txt";
pub const FILEMAP_LOG_NAME: &str = "filemap_deployed.txt";
pub const FILEMAP_BACKUP_DIR: &str = "filemap_backup";

fn transfer(src: &Path, dst: &Path, mode: LinkMode) -> Result<()> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    match mode {
        LinkMode::Hardlink => fs::hard_link(src, dst)
            .with_context(|| format!("hardlink {} -> {}", src.display(), dst.display())),
        LinkMode::Symlink => symlink(src, dst)
            .with_context(|| format!("symlink {} -> {}", src.display(), dst.display())),
        LinkMode::Copy => fs::copy(src, dst)
            .map(|_| ())
            .with_context(|| format!("copy {} -> {}", src.display(), dst.display())),
    }
}

#[cfg(unix)]
fn symlink(src: &Path, dst: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(src, dst)
}

#[cfg(windows)]
fn symlink(src: &Path, dst: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_file(src, dst)
}

/// Delete every file under `directory`, then remove now-empty subdirectories
/// deepest-first. The directory itself is kept. Returns the file count.
pub(crate) fn clear_dir(directory: &Path) -> Result<usize> {
    let mut removed = 0;
    let mut dirs = Vec::new();
    for entry in walkdir::WalkDir::new(directory).contents_first(false) {
        let entry = entry?;
        if entry.file_type().is_file() {
            fs::remove_file(entry.path())
                .with_context(|| format!("remove {}", entry.path().display()))?;
            removed += 1;
        } else if entry.file_type().is_dir() && entry.path() != directory {
            dirs.push(entry.path().to_path_buf());
        }
    }
    dirs.sort_by_key(|d| std::cmp::Reverse(d.components().count()));
    for dir in dirs {
        let _ = fs::remove_dir(&dir);
    }
    Ok(removed)
}

pub fn default_core(deploy_dir: &Path) -> PathBuf {
    let name = deploy_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    deploy_dir
        .parent()
        .map(|p| p.join(format!("{name}_Core")))
        .unwrap_or_else(|| PathBuf::from(format!("{name}_Core")))
}

/// Move all files from `deploy_dir` into `core_dir`. If `core_dir` already
/// exists it is removed first. `core_dir` is always created, even if
/// `deploy_dir` was empty, so a later restore never reports "nothing to
/// restore".
pub fn move_to_core(deploy_dir: &Path, core_dir: &Path, logger: &dyn Logger) -> Result<usize> {
    if core_dir.exists() {
        logger.log(&format!(
            "{} already exists — removing old backup first.",
            core_dir.display()
        ));
        fs::remove_dir_all(core_dir)
            .with_context(|| format!("remove stale {}", core_dir.display()))?;
    }

    if !deploy_dir.is_dir() {
        fs::create_dir_all(core_dir).with_context(|| format!("create {}", core_dir.display()))?;
        return Ok(0);
    }

    let files: Vec<PathBuf> = walkdir::WalkDir::new(deploy_dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path().to_path_buf())
        .collect();

    if files.is_empty() {
        fs::create_dir_all(core_dir).with_context(|| format!("create {}", core_dir.display()))?;
        return Ok(0);
    }

    for src in &files {
        let rel = src.strip_prefix(deploy_dir).unwrap();
        let dst = core_dir.join(rel);
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
        }
        fs::rename(src, &dst)
            .with_context(|| format!("move {} -> {}", src.display(), dst.display()))?;
    }
    clear_dir(deploy_dir)?;
    Ok(files.len())
}

/// Resolve a filemap entry's source file on disk, trying (in order):
/// direct join, case-insensitive walk, global strip-prefix reinjection (1 or
/// 2 segments, longest/sorted deterministic order), then per-mod prefix
/// lists (full-path prefixes first, then an accumulating segment chain).
#[allow(clippy::too_many_arguments)]
fn resolve_source(
    mod_root: &Path,
    rel_str: &str,
    is_overwrite: bool,
    global_strip: &[String],
    per_mod_strip: Option<&Vec<String>>,
    cache: &mut NoCaseCache,
) -> Option<PathBuf> {
    let direct = mod_root.join(rel_str);
    if direct.is_file() {
        return Some(direct);
    }
    if let Some(found) = resolve_nocase(mod_root, rel_str, cache) {
        return Some(found);
    }

    if !global_strip.is_empty() {
        let mut prefixes: Vec<&String> = global_strip.iter().collect();
        prefixes.sort();
        for p1 in &prefixes {
            let candidate = format!("{p1}/{rel_str}");
            if let Some(found) = resolve_nocase(mod_root, &candidate, cache) {
                return Some(found);
            }
            for p2 in &prefixes {
                let candidate = format!("{p1}/{p2}/{rel_str}");
                if let Some(found) = resolve_nocase(mod_root, &candidate, cache) {
                    return Some(found);
                }
            }
        }
    }

    if !is_overwrite {
        if let Some(mod_strip) = per_mod_strip {
            let path_prefixes: Vec<&String> = mod_strip.iter().filter(|p| p.contains('/')).collect();
            for p in &path_prefixes {
                let candidate = format!("{p}/{rel_str}");
                if let Some(found) = resolve_nocase(mod_root, &candidate, cache) {
                    return Some(found);
                }
            }
            let segments: Vec<&String> = mod_strip.iter().filter(|p| !p.contains('/')).collect();
            let mut prefix_path = String::new();
            for seg in segments {
                prefix_path.push_str(seg);
                prefix_path.push('/');
                let candidate = format!("{prefix_path}{rel_str}");
                if let Some(found) = resolve_nocase(mod_root, &candidate, cache) {
                    return Some(found);
                }
            }
        }
    }
    None
}

fn read_filemap_lines(filemap_path: &Path) -> Result<Vec<(String, String)>> {
    let raw = fs::read_to_string(filemap_path)
        .with_context(|| format!("read {}", filemap_path.display()))?;
    Ok(raw
        .lines()
        .filter_map(|line| line.split_once('\t'))
        .map(|(rel, name)| (rel.to_string(), name.to_string()))
        .collect())
}

pub struct DeployedFiles {
    pub count: usize,
    pub placed_lower: HashSet<String>,
}

/// Read `filemap_path` and transfer every listed file into `deploy_dir`.
#[allow(clippy::too_many_arguments)]
pub fn deploy_filemap(
    filemap_path: &Path,
    deploy_dir: &Path,
    staging_root: &Path,
    mode: LinkMode,
    strip_prefixes: &[String],
    per_mod_strip_prefixes: &std::collections::HashMap<String, Vec<String>>,
    logger: &dyn Logger,
    progress: &dyn ProgressSink,
) -> Result<DeployedFiles> {
    let overwrite_dir = staging_root
        .parent()
        .map(|p| p.join("overwrite"))
        .unwrap_or_else(|| staging_root.join("overwrite"));
    let lines = read_filemap_lines(filemap_path)?;
    let total_lines = lines.len();

    let mut cache = NoCaseCache::new();
    let mut already_seen = HashSet::new();
    let mut tasks = Vec::new();

    for (idx, (rel_str, mod_name)) in lines.into_iter().enumerate() {
        let rel_lower = rel_str.to_lowercase();
        if !already_seen.insert(rel_lower.clone()) {
            continue;
        }
        let is_overwrite = mod_name == OVERWRITE_NAME;
        let mod_root = if is_overwrite {
            overwrite_dir.clone()
        } else {
            staging_root.join(&mod_name)
        };
        let source = resolve_source(
            &mod_root,
            &rel_str,
            is_overwrite,
            strip_prefixes,
            per_mod_strip_prefixes.get(&mod_name),
            &mut cache,
        );
        let Some(src) = source else {
            logger.log(&format!("WARN: source not found — {rel_str} ({mod_name})"));
            continue;
        };
        let dst = deploy_dir.join(normalize_separators(&rel_str));
        tasks.push((src, dst, rel_lower));

        if (idx + 1) % 500 == 0 {
            progress.progress(idx + 1, total_lines, "resolve");
        }
    }

    let total = tasks.len();
    let mut linked = 0;
    let mut placed_lower = HashSet::new();
    for (done, (src, dst, rel_lower)) in tasks.into_iter().enumerate() {
        match transfer(&src, &dst, mode) {
            Ok(()) => {
                linked += 1;
                placed_lower.insert(rel_lower);
            }
            Err(e) => logger.log(&format!("WARN: could not transfer {}: {e}", dst.display())),
        }
        if (done + 1) % 200 == 0 || done + 1 == total {
            progress.progress(done + 1, total, "deploy");
        }
    }

    Ok(DeployedFiles {
        count: linked,
        placed_lower,
    })
}

/// Fill any path under `core_dir` not already covered by `already_placed`
/// into `deploy_dir`.
pub fn deploy_core(
    deploy_dir: &Path,
    already_placed: &HashSet<String>,
    core_dir: &Path,
    mode: LinkMode,
    logger: &dyn Logger,
    progress: &dyn ProgressSink,
) -> Result<usize> {
    if !core_dir.is_dir() {
        return Ok(0);
    }
    let files: Vec<PathBuf> = walkdir::WalkDir::new(core_dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path().to_path_buf())
        .collect();
    let total = files.len();
    let mut linked = 0;
    for (done, src) in files.into_iter().enumerate() {
        let rel = src.strip_prefix(core_dir).unwrap();
        let rel_lower = normalize_separators(&rel.to_string_lossy()).to_lowercase();
        if already_placed.contains(&rel_lower) {
            continue;
        }
        let dst = deploy_dir.join(rel);
        match transfer(&src, &dst, mode) {
            Ok(()) => linked += 1,
            Err(e) => logger.log(&format!("WARN: could not transfer {}: {e}", rel.display())),
        }
        progress.progress(done + 1, total, "fill-core");
    }
    Ok(linked)
}

/// Transfer files from `root_folder_dir` into `game_root`, backing up any
/// existing destination file individually, and writing a deployment log
/// (`root_folder_deployed.txt`) recording placed paths plus any freshly
/// created top-level directories.
pub fn deploy_root_folder(
    root_folder_dir: &Path,
    game_root: &Path,
    mode: LinkMode,
    logger: &dyn Logger,
) -> Result<usize> {
    if !root_folder_dir.is_dir() {
        return Ok(0);
    }
    let sources: Vec<(PathBuf, PathBuf)> = walkdir::WalkDir::new(root_folder_dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let rel = e.path().strip_prefix(root_folder_dir).unwrap().to_path_buf();
            (e.path().to_path_buf(), rel)
        })
        .collect();
    if sources.is_empty() {
        return Ok(0);
    }

    let backup_dir = root_folder_dir
        .parent()
        .unwrap_or(root_folder_dir)
        .join(ROOT_BACKUP_NAME);
    let log_path = root_folder_dir
        .parent()
        .unwrap_or(root_folder_dir)
        .join(ROOT_LOG_NAME);

    let mut placed = Vec::new();
    let mut created_dirs: HashSet<String> = HashSet::new();

    for (src, rel) in &sources {
        let dst = game_root.join(rel);
        let components: Vec<_> = rel.components().collect();
        if components.len() > 1 {
            if let Some(top) = components.first() {
                let top_path = game_root.join(top.as_os_str());
                if !top_path.exists() {
                    created_dirs.insert(top.as_os_str().to_string_lossy().into_owned());
                }
            }
        }

        if dst.exists() && !is_symlink(&dst) {
            let bak = backup_dir.join(rel);
            if let Some(parent) = bak.parent() {
                fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
            }
            fs::rename(&dst, &bak)
                .with_context(|| format!("back up {} -> {}", dst.display(), bak.display()))?;
            logger.log(&format!("Backed up existing {} -> {ROOT_BACKUP_NAME}/", rel.display()));
        } else if is_symlink(&dst) {
            fs::remove_file(&dst).with_context(|| format!("remove stale symlink {}", dst.display()))?;
        }

        match transfer(src, &dst, mode) {
            Ok(()) => placed.push(normalize_separators(&rel.to_string_lossy())),
            Err(e) => logger.log(&format!("WARN: could not transfer root file {}: {e}", rel.display())),
        }
    }

    let mut body = placed.join("\n");
    if !created_dirs.is_empty() {
        let mut sorted: Vec<&String> = created_dirs.iter().collect();
        sorted.sort();
        body.push_str("\n---dirs---\n");
        body.push_str(
            &sorted
                .into_iter()
                .cloned()
                .collect::<Vec<_>>()
                .join("\n"),
        );
    }
    fs::write(&log_path, body).with_context(|| format!("write {}", log_path.display()))?;

    logger.log(&format!("Root Folder: {} file(s) transferred to game root.", placed.len()));
    Ok(placed.len())
}

/// Deploy mod files directly into `game_root`, backing up only the
/// individual files they overwrite (never touching anything a mod doesn't
/// replace), and writing `filemap_deployed.txt` for a later restore.
#[allow(clippy::too_many_arguments)]
pub fn deploy_filemap_to_root(
    filemap_path: &Path,
    game_root: &Path,
    staging_root: &Path,
    mode: LinkMode,
    strip_prefixes: &[String],
    per_mod_strip_prefixes: &std::collections::HashMap<String, Vec<String>>,
    logger: &dyn Logger,
    progress: &dyn ProgressSink,
) -> Result<DeployedFiles> {
    let overwrite_dir = staging_root
        .parent()
        .map(|p| p.join("overwrite"))
        .unwrap_or_else(|| staging_root.join("overwrite"));
    let backup_dir = filemap_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(FILEMAP_BACKUP_DIR);
    let log_path = filemap_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(FILEMAP_LOG_NAME);

    if backup_dir.exists() {
        fs::remove_dir_all(&backup_dir)
            .with_context(|| format!("clear stale {}", backup_dir.display()))?;
    }

    let lines = read_filemap_lines(filemap_path)?;
    let total_lines = lines.len();
    let mut cache = NoCaseCache::new();
    let mut already_seen = HashSet::new();
    let mut tasks = Vec::new();

    for (idx, (rel_str, mod_name)) in lines.into_iter().enumerate() {
        let rel_lower = rel_str.to_lowercase();
        if !already_seen.insert(rel_lower.clone()) {
            continue;
        }
        let is_overwrite = mod_name == OVERWRITE_NAME;
        let mod_root = if is_overwrite {
            overwrite_dir.clone()
        } else {
            staging_root.join(&mod_name)
        };
        let source = resolve_source(
            &mod_root,
            &rel_str,
            is_overwrite,
            strip_prefixes,
            per_mod_strip_prefixes.get(&mod_name),
            &mut cache,
        );
        let Some(src) = source else {
            logger.log(&format!("WARN: source not found — {rel_str} ({mod_name})"));
            continue;
        };
        let dst = game_root.join(normalize_separators(&rel_str));
        tasks.push((src, dst, rel_lower, rel_str));

        if (idx + 1) % 500 == 0 {
            progress.progress(idx + 1, total_lines, "resolve");
        }
    }

    let total = tasks.len();
    let mut linked = 0;
    let mut placed_lower = HashSet::new();
    let mut placed_log = Vec::new();

    for (done, (src, dst, rel_lower, rel_str)) in tasks.into_iter().enumerate() {
        if dst.exists() && !is_symlink(&dst) {
            let bak = backup_dir.join(&rel_str);
            if let Some(parent) = bak.parent() {
                fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
            }
            fs::rename(&dst, &bak)
                .with_context(|| format!("back up {} -> {}", dst.display(), bak.display()))?;
        } else if is_symlink(&dst) {
            fs::remove_file(&dst).with_context(|| format!("remove stale symlink {}", dst.display()))?;
        }

        match transfer(&src, &dst, mode) {
            Ok(()) => {
                linked += 1;
                placed_lower.insert(rel_lower);
                placed_log.push(normalize_separators(&rel_str));
            }
            Err(e) => logger.log(&format!("WARN: could not transfer {rel_str}: {e}")),
        }
        if (done + 1) % 200 == 0 || done + 1 == total {
            progress.progress(done + 1, total, "deploy");
        }
    }

    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    fs::write(&log_path, placed_log.join("\n"))
        .with_context(|| format!("write {}", log_path.display()))?;

    Ok(DeployedFiles {
        count: linked,
        placed_lower,
    })
}

fn is_symlink(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .map(|m| m.file_type().is_symlink())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::NullLogger;
    use std::collections::HashMap;

    fn noop_progress(_: usize, _: usize, _: &str) {}

    #[test]
    fn move_to_core_moves_files_and_creates_empty_core_when_source_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let deploy_dir = tmp.path().join("Data");
        let core_dir = tmp.path().join("Data_Core");
        fs::create_dir_all(&deploy_dir).unwrap();

        let moved = move_to_core(&deploy_dir, &core_dir, &NullLogger).unwrap();
        assert_eq!(moved, 0);
        assert!(core_dir.is_dir());

        fs::write(deploy_dir.join("a.txt"), b"x").unwrap();
        let moved = move_to_core(&deploy_dir, &core_dir, &NullLogger).unwrap();
        assert_eq!(moved, 1);
        assert!(core_dir.join("a.txt").is_file());
        assert!(!deploy_dir.join("a.txt").exists());
    }

    #[test]
    fn deploy_filemap_places_listed_files_via_hardlink() {
        let tmp = tempfile::tempdir().unwrap();
        let staging_root = tmp.path().join("mods");
        let mod_dir = staging_root.join("MyMod");
        fs::create_dir_all(&mod_dir).unwrap();
        fs::write(mod_dir.join("a.txt"), b"hello").unwrap();

        let filemap_path = tmp.path().join("filemap.txt");
        fs::write(&filemap_path, "a.txt\tMyMod\n").unwrap();

        let deploy_dir = tmp.path().join("Data");
        fs::create_dir_all(&deploy_dir).unwrap();

        let result = deploy_filemap(
            &filemap_path,
            &deploy_dir,
            &staging_root,
            LinkMode::Hardlink,
            &[],
            &HashMap::new(),
            &NullLogger,
            &noop_progress,
        )
        .unwrap();

        assert_eq!(result.count, 1);
        assert!(result.placed_lower.contains("a.txt"));
        assert_eq!(fs::read_to_string(deploy_dir.join("a.txt")).unwrap(), "hello");
    }

    #[test]
    fn deploy_filemap_resolves_stripped_prefix_reinjection() {
        let tmp = tempfile::tempdir().unwrap();
        let staging_root = tmp.path().join("mods");
        let mod_dir = staging_root.join("MyMod");
        fs::create_dir_all(mod_dir.join("plugins")).unwrap();
        fs::write(mod_dir.join("plugins/Mod.dll"), b"x").unwrap();

        let filemap_path = tmp.path().join("filemap.txt");
        fs::write(&filemap_path, "Mod.dll\tMyMod\n").unwrap();

        let deploy_dir = tmp.path().join("Data");
        fs::create_dir_all(&deploy_dir).unwrap();

        let result = deploy_filemap(
            &filemap_path,
            &deploy_dir,
            &staging_root,
            LinkMode::Hardlink,
            &["plugins".to_string()],
            &HashMap::new(),
            &NullLogger,
            &noop_progress,
        )
        .unwrap();
        assert_eq!(result.count, 1);
        assert!(deploy_dir.join("Mod.dll").is_file());
    }

    #[test]
    fn deploy_core_skips_already_placed_files() {
        let tmp = tempfile::tempdir().unwrap();
        let core_dir = tmp.path().join("Data_Core");
        fs::create_dir_all(&core_dir).unwrap();
        fs::write(core_dir.join("vanilla.txt"), b"v").unwrap();
        fs::write(core_dir.join("overridden.txt"), b"v").unwrap();

        let deploy_dir = tmp.path().join("Data");
        fs::create_dir_all(&deploy_dir).unwrap();

        let mut already_placed = HashSet::new();
        already_placed.insert("overridden.txt".to_string());

        let linked = deploy_core(
            &deploy_dir,
            &already_placed,
            &core_dir,
            LinkMode::Hardlink,
            &NullLogger,
            &noop_progress,
        )
        .unwrap();

        assert_eq!(linked, 1);
        assert!(deploy_dir.join("vanilla.txt").is_file());
        assert!(!deploy_dir.join("overridden.txt").exists());
    }

    #[test]
    fn deploy_root_folder_backs_up_existing_file_and_logs_created_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let root_folder_dir = tmp.path().join("Root_Folder");
        fs::create_dir_all(root_folder_dir.join("BepInEx/plugins")).unwrap();
        fs::write(root_folder_dir.join("BepInEx/plugins/Mod.dll"), b"x").unwrap();

        let game_root = tmp.path().join("game");
        fs::create_dir_all(&game_root).unwrap();

        let count = deploy_root_folder(&root_folder_dir, &game_root, LinkMode::Copy, &NullLogger).unwrap();
        assert_eq!(count, 1);
        assert!(game_root.join("BepInEx/plugins/Mod.dll").is_file());

        let log_path = tmp.path().join(ROOT_LOG_NAME);
        let log = fs::read_to_string(&log_path).unwrap();
        assert!(log.contains("BepInEx/plugins/Mod.dll"));
        assert!(log.contains("---dirs---"));
        assert!(log.contains("BepInEx"));
    }

    #[test]
    fn deploy_filemap_to_root_backs_up_overwritten_vanilla_file() {
        let tmp = tempfile::tempdir().unwrap();
        let staging_root = tmp.path().join("mods");
        let mod_dir = staging_root.join("MyMod");
        fs::create_dir_all(&mod_dir).unwrap();
        fs::write(mod_dir.join("config.ini"), b"modded").unwrap();

        let game_root = tmp.path().join("game");
        fs::create_dir_all(&game_root).unwrap();
        fs::write(game_root.join("config.ini"), b"vanilla").unwrap();

        let filemap_path = tmp.path().join("filemap.txt");
        fs::write(&filemap_path, "config.ini\tMyMod\n").unwrap();

        let result = deploy_filemap_to_root(
            &filemap_path,
            &game_root,
            &staging_root,
            LinkMode::Copy,
            &[],
            &HashMap::new(),
            &NullLogger,
            &noop_progress,
        )
        .unwrap();
        assert_eq!(result.count, 1);
        assert_eq!(fs::read_to_string(game_root.join("config.ini")).unwrap(), "modded");
        let backup_dir = tmp.path().join(FILEMAP_BACKUP_DIR);
        assert_eq!(fs::read_to_string(backup_dir.join("config.ini")).unwrap(), "vanilla");
    }
}
