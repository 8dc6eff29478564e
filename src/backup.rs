//! Timestamped snapshots of the small per-profile text files (manifest,
//! plugin list, UI-state JSON sidecars), independent of deploy/restore, so a
//! profile's mod selection can be rolled back on its own.
//!
//! Snapshot directories are named `YYYYMMDD_HHMMSS` — lexicographic name
//! order is chronological order, so pruning to the newest N is a sort plus a
//! slice, and listing needs no stat calls beyond the one that confirms a
//! manifest copy is present.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use time::macros::format_description;
use time::OffsetDateTime;

const RETAIN: usize = 10;
const SNAPSHOT_FILES: &[&str] = &["modlist.txt", "plugins.txt"];

/// Copy `modlist.txt`, `plugins.txt` (whichever exist) and every `*.json`
/// file directly under `profile_root` into a new `backups/<timestamp>/`
/// snapshot, then prune older snapshots down to the ten newest. `now` is
/// caller-supplied so the rotator has no hidden dependency on the system
/// clock.
pub fn create_snapshot(profile_root: &Path, now: OffsetDateTime) -> Result<PathBuf> {
    let backups_root = profile_root.join("backups");
    fs::create_dir_all(&backups_root).context("create backups dir")?;

    let format = format_description!("[year][month][day]_[hour][minute][second]");
    let name = now.format(&format).context("format snapshot timestamp")?;
    let snapshot_dir = backups_root.join(&name);
    fs::create_dir_all(&snapshot_dir)
        .with_context(|| format!("create {}", snapshot_dir.display()))?;

    for file in SNAPSHOT_FILES {
        let src = profile_root.join(file);
        if src.is_file() {
            fs::copy(&src, snapshot_dir.join(file))
                .with_context(|| format!("copy {file} into snapshot"))?;
        }
    }
    if let Ok(read) = fs::read_dir(profile_root) {
        for entry in read.flatten() {
            let path = entry.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(name) = path.file_name() {
                let _ = fs::copy(&path, snapshot_dir.join(name));
            }
        }
    }

    prune(&backups_root)?;
    Ok(snapshot_dir)
}

/// Snapshot directories under `profile_root/backups`, newest first.
pub fn list_snapshots(profile_root: &Path) -> Result<Vec<PathBuf>> {
    let backups_root = profile_root.join("backups");
    let mut names = snapshot_names(&backups_root)?;
    names.sort_unstable_by(|a, b| b.cmp(a));
    Ok(names.into_iter().map(|n| backups_root.join(n)).collect())
}

/// Copy every file from `snapshot_dir` back over its live counterpart under
/// `profile_root`. Returns the number of files restored.
pub fn restore_snapshot(profile_root: &Path, snapshot_dir: &Path) -> Result<usize> {
    let mut restored = 0;
    for entry in fs::read_dir(snapshot_dir)
        .with_context(|| format!("read {}", snapshot_dir.display()))?
        .flatten()
    {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name() else {
            continue;
        };
        fs::copy(&path, profile_root.join(name))
            .with_context(|| format!("restore {}", name.to_string_lossy()))?;
        restored += 1;
    }
    Ok(restored)
}

/// Subdirectory names under `backups_root` matching the `YYYYMMDD_HHMMSS`
/// pattern and containing a `modlist.txt` copy — the rotator's definition of
/// "is a snapshot" (see [`list_snapshots`]).
fn snapshot_names(backups_root: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    let Ok(read) = fs::read_dir(backups_root) else {
        return Ok(names);
    };
    for entry in read.flatten() {
        if !entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
            continue;
        };
        if is_timestamp_name(&name) && entry.path().join("modlist.txt").is_file() {
            names.push(name);
        }
    }
    Ok(names)
}

fn is_timestamp_name(name: &str) -> bool {
    let bytes = name.as_bytes();
    bytes.len() == 15
        && bytes[8] == b'_'
        && bytes[..8].iter().all(u8::is_ascii_digit)
        && bytes[9..].iter().all(u8::is_ascii_digit)
}

fn prune(backups_root: &Path) -> Result<()> {
    let mut names = snapshot_names(backups_root)?;
    if names.len() <= RETAIN {
        return Ok(());
    }
    names.sort_unstable();
    let drop_count = names.len() - RETAIN;
    for name in &names[..drop_count] {
        let dir = backups_root.join(name);
        fs::remove_dir_all(&dir).with_context(|| format!("prune {}", dir.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    fn stamp(seconds_offset: i64) -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap() + Duration::seconds(seconds_offset)
    }

    #[test]
    fn snapshot_copies_manifest_plugins_and_json_sidecars() {
        let tmp = tempfile::tempdir().unwrap();
        let profile_root = tmp.path();
        fs::write(profile_root.join("modlist.txt"), "+A\n").unwrap();
        fs::write(profile_root.join("plugins.txt"), "A.esp\n").unwrap();
        fs::write(profile_root.join("separator_locks.json"), "{}").unwrap();
        fs::write(profile_root.join("filemap.txt"), "a.txt\tA\n").unwrap();

        let snapshot_dir = create_snapshot(profile_root, stamp(0)).unwrap();
        assert!(snapshot_dir.join("modlist.txt").is_file());
        assert!(snapshot_dir.join("plugins.txt").is_file());
        assert!(snapshot_dir.join("separator_locks.json").is_file());
        assert!(!snapshot_dir.join("filemap.txt").exists());
    }

    #[test]
    fn snapshot_name_is_chronologically_sortable() {
        let tmp = tempfile::tempdir().unwrap();
        let profile_root = tmp.path();
        fs::write(profile_root.join("modlist.txt"), "+A\n").unwrap();

        let first = create_snapshot(profile_root, stamp(0)).unwrap();
        let second = create_snapshot(profile_root, stamp(60)).unwrap();
        assert!(first.file_name() < second.file_name());

        let listed = list_snapshots(profile_root).unwrap();
        assert_eq!(listed, vec![second, first]);
    }

    #[test]
    fn retains_only_ten_newest() {
        let tmp = tempfile::tempdir().unwrap();
        let profile_root = tmp.path();
        fs::write(profile_root.join("modlist.txt"), "+A\n").unwrap();

        for i in 0..12 {
            create_snapshot(profile_root, stamp(i * 60)).unwrap();
        }
        let listed = list_snapshots(profile_root).unwrap();
        assert_eq!(listed.len(), 10);
        // Newest-first: the most recent snapshot is index 0.
        assert!(listed[0].file_name().unwrap().to_string_lossy().contains("_"));
    }

    #[test]
    fn restore_copies_snapshot_files_back_over_live_ones() {
        let tmp = tempfile::tempdir().unwrap();
        let profile_root = tmp.path();
        fs::write(profile_root.join("modlist.txt"), "+A\n+B\n").unwrap();
        let snapshot_dir = create_snapshot(profile_root, stamp(0)).unwrap();

        fs::write(profile_root.join("modlist.txt"), "+A\n").unwrap();
        let restored = restore_snapshot(profile_root, &snapshot_dir).unwrap();
        assert_eq!(restored, 1);
        assert_eq!(fs::read_to_string(profile_root.join("modlist.txt")).unwrap(), "+A\n+B\n");
    }

    #[test]
    fn directories_not_matching_timestamp_pattern_are_ignored_on_list() {
        let tmp = tempfile::tempdir().unwrap();
        let profile_root = tmp.path();
        fs::create_dir_all(profile_root.join("backups/not_a_snapshot")).unwrap();
        fs::write(profile_root.join("backups/not_a_snapshot/modlist.txt"), "+A\n").unwrap();

        let listed = list_snapshots(profile_root).unwrap();
        assert!(listed.is_empty());
    }
}
