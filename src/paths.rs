//! Case-folded path keys, case-insensitive resolution under a root, and a
//! path-traversal guard.
//!
//! Every dictionary keyed by relative path in this crate uses the *key*
//! (forward-slash, lowercase) produced here, never the display form, so that
//! the same logical file from two differently-cased mod folders collides
//! into one entry regardless of host filesystem case sensitivity.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Forward-slash normalise then lowercase. `key_of(display) == display` iff
/// `display` was already `/`-separated and lowercase.
pub fn key_of(display: &str) -> String {
    normalize_separators(display).to_lowercase()
}

/// Replace `\` with `/`. Relative-path display forms in this crate never
/// contain a literal backslash once normalised.
pub fn normalize_separators(display: &str) -> String {
    display.replace('\\', "/")
}

/// Per-directory case-insensitive name cache, reused across repeated
/// `resolve_nocase` calls so that resolving many filemap entries under the
/// same mod root costs one `read_dir` per directory rather than one per
/// file.
#[derive(Default)]
pub struct NoCaseCache {
    dirs: HashMap<PathBuf, HashMap<String, PathBuf>>,
}

impl NoCaseCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn listing(&mut self, dir: &Path) -> Option<&HashMap<String, PathBuf>> {
        if !self.dirs.contains_key(dir) {
            let mut entries = HashMap::new();
            if let Ok(read) = std::fs::read_dir(dir) {
                for entry in read.flatten() {
                    if let Some(name) = entry.file_name().to_str() {
                        entries.insert(name.to_lowercase(), entry.path());
                    }
                }
            }
            self.dirs.insert(dir.to_path_buf(), entries);
        }
        self.dirs.get(dir)
    }
}

/// Walk each segment of `rel` under `root`, matching case-insensitively
/// against real directory entries. Returns the real path iff a *file* exists
/// at the end of the walk; returns `None` for a missing segment, a directory
/// at the final segment, or any unreadable intermediate directory.
pub fn resolve_nocase(root: &Path, rel: &str, cache: &mut NoCaseCache) -> Option<PathBuf> {
    let mut current = root.to_path_buf();
    for part in normalize_separators(rel).split('/').filter(|s| !s.is_empty()) {
        let part_lower = part.to_lowercase();
        let listing = cache.listing(&current)?;
        let matched = listing.get(&part_lower)?;
        current = matched.clone();
    }
    if current.is_file() {
        Some(current)
    } else {
        None
    }
}

/// Returns true iff `p`, once resolved (symlinks followed), lies under
/// `root`, also resolved. Used before any destructive operation on a path
/// derived from an untrusted manifest or log; a failing check is the
/// caller's cue to log and skip, never to raise an error (spec's
/// `path_traversal` error kind).
pub fn is_under(p: &Path, root: &Path) -> bool {
    let resolved_root = match dunce_resolve(root) {
        Some(r) => r,
        None => return false,
    };
    let resolved_p = match dunce_resolve(p) {
        Some(r) => r,
        None => {
            // p may not exist yet (e.g. a destination we're about to create).
            // Resolve its parent instead and re-append the final component.
            let Some(parent) = p.parent() else {
                return false;
            };
            let Some(resolved_parent) = dunce_resolve(parent) else {
                return false;
            };
            return resolved_parent.starts_with(&resolved_root);
        }
    };
    resolved_p.starts_with(&resolved_root)
}

fn dunce_resolve(p: &Path) -> Option<PathBuf> {
    p.canonicalize().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn key_of_lowercases_and_normalizes_separators() {
        assert_eq!(key_of("Scripts\\Foo.pex"), "scripts/foo.pex");
        assert_eq!(key_of("Scripts/Foo.pex"), "scripts/foo.pex");
    }

    #[test]
    fn resolve_nocase_finds_mismatched_case() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("Scripts")).unwrap();
        fs::write(tmp.path().join("Scripts/Foo.pex"), b"x").unwrap();

        let mut cache = NoCaseCache::new();
        let found = resolve_nocase(tmp.path(), "scripts/foo.pex", &mut cache);
        assert_eq!(found, Some(tmp.path().join("Scripts/Foo.pex")));
    }

    #[test]
    fn resolve_nocase_rejects_directory_target() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("Scripts")).unwrap();

        let mut cache = NoCaseCache::new();
        assert_eq!(resolve_nocase(tmp.path(), "Scripts", &mut cache), None);
    }

    #[test]
    fn resolve_nocase_missing_file_returns_none() {
        let tmp = tempfile::tempdir().unwrap();
        let mut cache = NoCaseCache::new();
        assert_eq!(resolve_nocase(tmp.path(), "nope.txt", &mut cache), None);
    }

    #[test]
    fn is_under_detects_traversal() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("root");
        fs::create_dir_all(&root).unwrap();
        let inside = root.join("a").join("b.txt");
        fs::create_dir_all(inside.parent().unwrap()).unwrap();
        fs::write(&inside, b"x").unwrap();
        assert!(is_under(&inside, &root));

        let outside = tmp.path().join("elsewhere.txt");
        fs::write(&outside, b"x").unwrap();
        assert!(!is_under(&outside, &root));
    }

    #[test]
    fn is_under_handles_nonexistent_destination() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("root");
        fs::create_dir_all(&root).unwrap();
        let future_file = root.join("not_yet_created.txt");
        assert!(is_under(&future_file, &root));
    }
}
