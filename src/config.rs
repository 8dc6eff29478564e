//! Per-profile game configuration: deployment shape, path-rewrite rules, and
//! the directory layout a profile operates over. No component in this crate
//! probes the filesystem for install locations — every path here is
//! supplied by the caller already resolved.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Which on-disk shape the Deployer/Restorer use for this game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentShape {
    /// Bulk-move existing destination contents to a sibling `_Core` folder
    /// once, then link mod files in, filling gaps from the core backup.
    DataBackup,
    /// Per-file backup into a `*_Backup` folder alongside a deployment log;
    /// used when the destination is the game's installation root itself.
    RootOverlay,
    /// The profile only builds/reads package files (LSPK); nothing is
    /// deployed onto disk.
    PackageOnly,
}

/// The plain configuration record a profile operates under: deployment
/// shape, path-rewrite rules, and the three directories a profile touches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    pub game_name: String,
    pub deployment_shape: DeploymentShape,

    /// Profile root: `modlist.txt`, `modindex.txt`, `filemap.txt`, and the
    /// JSON sidecars live here.
    pub profile_root: PathBuf,
    /// Staging root: one subdirectory per installed mod.
    pub staging_root: PathBuf,
    /// Where mod files are ultimately deployed (game data dir or game root,
    /// depending on `deployment_shape`).
    pub destination_root: PathBuf,

    /// Lowercase top-level folder names stripped from every mod's paths
    /// (e.g. `{"data"}` when mods ship a wrapping `Data/` folder the game
    /// does not expect).
    #[serde(default)]
    pub strip_prefixes: Vec<String>,
    /// Per-mod override/addition to `strip_prefixes`; entries containing a
    /// `/` are full-path prefixes instead of single segments. Stored as
    /// `mod_strip_prefixes.json` next to the manifest.
    #[serde(default)]
    pub per_mod_strip_prefixes: HashMap<String, Vec<String>>,
    /// When non-empty, only files whose lowercase extension (with leading
    /// dot) appears here are included in the normal filemap.
    #[serde(default)]
    pub allowed_extensions: Vec<String>,
    /// Lowercase top-level folder names whose files deploy to the game root
    /// instead of the destination data path, bypassing `allowed_extensions`.
    #[serde(default)]
    pub root_deploy_folders: Vec<String>,
    /// The game's actual install root, when it differs from
    /// `destination_root` (e.g. a `DataBackup` profile whose destination is
    /// a `Data/` subfolder but whose `root_deploy_folders` content and
    /// `Root_Folder/` staging directory belong in the game's top-level
    /// install directory instead). `None` when `destination_root` already
    /// is the game root (`RootOverlay`) or nothing ever targets it
    /// (`PackageOnly`).
    #[serde(default)]
    pub game_root: Option<PathBuf>,
}

impl GameConfig {
    pub fn load_or_create(
        config_path: &std::path::Path,
        default_game_name: &str,
        profile_root: PathBuf,
        staging_root: PathBuf,
        destination_root: PathBuf,
    ) -> Result<Self> {
        if config_path.exists() {
            let raw = fs::read_to_string(config_path)
                .with_context(|| format!("read {}", config_path.display()))?;
            let config: GameConfig =
                serde_json::from_str(&raw).with_context(|| format!("parse {}", config_path.display()))?;
            return Ok(config);
        }

        let config = GameConfig {
            game_name: default_game_name.to_string(),
            deployment_shape: DeploymentShape::DataBackup,
            profile_root,
            staging_root,
            destination_root,
            strip_prefixes: Vec::new(),
            per_mod_strip_prefixes: HashMap::new(),
            allowed_extensions: Vec::new(),
            root_deploy_folders: Vec::new(),
            game_root: None,
        };
        config.save(config_path)?;
        Ok(config)
    }

    pub fn save(&self, config_path: &std::path::Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
        }
        let raw = serde_json::to_string_pretty(self).context("serialize game config")?;
        fs::write(config_path, raw).with_context(|| format!("write {}", config_path.display()))
    }

    /// Read `profile_root/mod_strip_prefixes.json`, merging it over
    /// `per_mod_strip_prefixes` (file wins on a per-mod basis). Silently
    /// returns the in-memory map unchanged on a missing or invalid file.
    pub fn load_per_mod_strip_prefixes(&mut self) {
        let path = self.profile_root.join("mod_strip_prefixes.json");
        let Ok(raw) = fs::read_to_string(&path) else {
            return;
        };
        if let Ok(parsed) = serde_json::from_str::<HashMap<String, Vec<String>>>(&raw) {
            self.per_mod_strip_prefixes.extend(parsed);
        }
    }
}
