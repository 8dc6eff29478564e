//! Thin CLI front end over the library crate's nine components. Exists so
//! every component can be exercised end-to-end without a GUI — the GUI
//! itself is a collaborator's concern, not this crate's.
//!
//! Argument parsing is hand-rolled in the `--flag value` / `--flag=value`
//! style rather than via a parsing crate, matching the teacher's own
//! convention for its CLI surface.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Result};

use modlink::backup;
use modlink::config::{DeploymentShape, GameConfig};
use modlink::deploy::{self, LinkMode};
use modlink::filemap;
use modlink::index::ModIndexCache;
use modlink::modlist;
use modlink::package;
use modlink::restore;
use modlink::sink::StderrLogger;

const CONFIG_FILE: &str = "config.json";
const MODLIST_FILE: &str = "modlist.txt";
const MODINDEX_FILE: &str = "modindex.txt";
const FILEMAP_FILE: &str = "filemap.txt";
const FILEMAP_ROOT_FILE: &str = "filemap_root.txt";
const ROOT_FOLDER_DIR: &str = "Root_Folder";

pub fn run() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut tokens = args.iter().map(String::as_str);
    match tokens.next() {
        None | Some("--help" | "-h" | "help") => {
            print_help();
            Ok(())
        }
        Some("--version" | "-V" | "version") => {
            println!("modlink v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Some("init") => cmd_init(tokens.collect()),
        Some("index") => cmd_index(tokens.collect()),
        Some("filemap") => cmd_filemap(tokens.collect()),
        Some("deploy") => cmd_deploy(tokens.collect()),
        Some("restore") => cmd_restore(tokens.collect()),
        Some("backup") => cmd_backup(tokens.collect()),
        Some("modlist") => cmd_modlist(tokens.collect()),
        Some("pak") => cmd_pak(tokens.collect()),
        Some(other) => {
            bail!("unknown command {other:?} — run `modlink --help`");
        }
    }
}

fn print_help() {
    println!(
        "modlink {}\n\n\
         Usage:\n  \
         modlink init --profile DIR --staging DIR --dest DIR [--shape data_backup|root_overlay|package_only] [--game-name NAME] [--game-root DIR]\n  \
         modlink index rebuild --profile DIR --staging DIR\n  \
         modlink filemap build --profile DIR --staging DIR\n  \
         modlink deploy --profile DIR --staging DIR [--mode hardlink|symlink|copy]\n  \
         modlink restore --profile DIR\n  \
         modlink backup create --profile DIR\n  \
         modlink backup list --profile DIR\n  \
         modlink backup restore --profile DIR SNAPSHOT_NAME\n  \
         modlink modlist show --profile DIR\n  \
         modlink pak list PAK_PATH\n  \
         modlink pak extract PAK_PATH SUFFIX [--out FILE]\n",
        env!("CARGO_PKG_VERSION")
    );
}

/// Pull `--flag value` / `--flag=value` pairs out of a token list, returning
/// the leftover positional arguments in order.
fn take_flags<'a>(tokens: &[&'a str], flags: &[&str]) -> (Vec<(&'a str, String)>, Vec<&'a str>) {
    let mut found = Vec::new();
    let mut positional = Vec::new();
    let mut iter = tokens.iter().peekable();
    while let Some(&tok) = iter.next() {
        if let Some(name) = flags.iter().find(|f| tok == **f) {
            if let Some(&value) = iter.peek() {
                found.push((*name, value.to_string()));
                iter.next();
            }
            continue;
        }
        if let Some((name, value)) = flags.iter().find_map(|f| {
            tok.strip_prefix(f)
                .and_then(|rest| rest.strip_prefix('='))
                .map(|v| (*f, v.to_string()))
        }) {
            found.push((name, value));
            continue;
        }
        positional.push(tok);
    }
    (found, positional)
}

fn flag_value(found: &[(&str, String)], name: &str) -> Option<String> {
    found.iter().find(|(n, _)| *n == name).map(|(_, v)| v.clone())
}

fn required_flag(found: &[(&str, String)], name: &str) -> Result<String> {
    flag_value(found, name).ok_or_else(|| anyhow!("missing required --{name}"))
}

fn config_path(profile_root: &Path) -> PathBuf {
    profile_root.join(CONFIG_FILE)
}

/// `Root_Folder/`, a sibling of the staging root's `mods/`/`overwrite/`.
fn root_folder_dir(staging_root: &Path) -> PathBuf {
    staging_root
        .parent()
        .map(|p| p.join(ROOT_FOLDER_DIR))
        .unwrap_or_else(|| staging_root.join(ROOT_FOLDER_DIR))
}

fn load_config(profile_root: &Path) -> Result<GameConfig> {
    let path = config_path(profile_root);
    if !path.is_file() {
        bail!(
            "no {} found under {} — run `modlink init` first",
            CONFIG_FILE,
            profile_root.display()
        );
    }
    let mut config = GameConfig::load_or_create(
        &path,
        "",
        profile_root.to_path_buf(),
        profile_root.to_path_buf(),
        profile_root.to_path_buf(),
    )?;
    config.load_per_mod_strip_prefixes();
    Ok(config)
}

fn cmd_init(tokens: Vec<&str>) -> Result<()> {
    let (found, _) = take_flags(
        &tokens,
        &["--profile", "--staging", "--dest", "--shape", "--game-name", "--game-root"],
    );
    let profile_root = PathBuf::from(required_flag(&found, "--profile")?);
    let staging_root = PathBuf::from(required_flag(&found, "--staging")?);
    let destination_root = PathBuf::from(required_flag(&found, "--dest")?);
    let game_name = flag_value(&found, "--game-name").unwrap_or_else(|| "Unnamed Game".to_string());
    let shape = match flag_value(&found, "--shape").as_deref() {
        None | Some("data_backup") => DeploymentShape::DataBackup,
        Some("root_overlay") => DeploymentShape::RootOverlay,
        Some("package_only") => DeploymentShape::PackageOnly,
        Some(other) => bail!("unknown --shape {other:?}"),
    };

    let mut config = GameConfig::load_or_create(
        &config_path(&profile_root),
        &game_name,
        profile_root.clone(),
        staging_root,
        destination_root,
    )?;
    config.deployment_shape = shape;
    config.game_root = flag_value(&found, "--game-root").map(PathBuf::from);
    config.save(&config_path(&profile_root))?;
    println!("Initialized profile at {}", profile_root.display());
    Ok(())
}

fn cmd_index(tokens: Vec<&str>) -> Result<()> {
    let (found, positional) = take_flags(&tokens, &["--profile", "--staging"]);
    let profile_root = PathBuf::from(required_flag(&found, "--profile")?);
    match positional.first() {
        Some(&"rebuild") => {
            let config = load_config(&profile_root)?;
            let staging_root = flag_value(&found, "--staging")
                .map(PathBuf::from)
                .unwrap_or_else(|| config.staging_root.clone());
            let mut cache = ModIndexCache::new();
            cache.rebuild(
                &profile_root.join(MODINDEX_FILE),
                &staging_root,
                &config,
                &StderrLogger,
            )?;
            println!("Mod index rebuilt at {}", profile_root.join(MODINDEX_FILE).display());
            Ok(())
        }
        other => bail!("usage: modlink index rebuild --profile DIR (got {other:?})"),
    }
}

fn cmd_filemap(tokens: Vec<&str>) -> Result<()> {
    let (found, positional) = take_flags(&tokens, &["--profile", "--staging"]);
    let profile_root = PathBuf::from(required_flag(&found, "--profile")?);
    match positional.first() {
        Some(&"build") => {
            let config = load_config(&profile_root)?;
            let staging_root = flag_value(&found, "--staging")
                .map(PathBuf::from)
                .unwrap_or_else(|| config.staging_root.clone());
            let mut cache = ModIndexCache::new();
            let result = filemap::build_filemap(
                &profile_root.join(MODLIST_FILE),
                &staging_root,
                &profile_root.join(FILEMAP_FILE),
                &config,
                &mut cache,
                &StderrLogger,
            )?;
            println!("Filemap built: {} file(s) across {} mod(s).", result.file_count, result.conflict_map.len());
            Ok(())
        }
        other => bail!("usage: modlink filemap build --profile DIR (got {other:?})"),
    }
}

fn cmd_deploy(tokens: Vec<&str>) -> Result<()> {
    let (found, _) = take_flags(&tokens, &["--profile", "--staging", "--mode"]);
    let profile_root = PathBuf::from(required_flag(&found, "--profile")?);
    let config = load_config(&profile_root)?;
    let staging_root = flag_value(&found, "--staging")
        .map(PathBuf::from)
        .unwrap_or_else(|| config.staging_root.clone());
    let mode = match flag_value(&found, "--mode").as_deref() {
        None | Some("hardlink") => LinkMode::Hardlink,
        Some("symlink") => LinkMode::Symlink,
        Some("copy") => LinkMode::Copy,
        Some(other) => bail!("unknown --mode {other:?}"),
    };

    let filemap_path = profile_root.join(FILEMAP_FILE);
    let noop_progress = |_done: usize, _total: usize, _phase: &str| {};

    match config.deployment_shape {
        DeploymentShape::DataBackup => {
            let core_dir = deploy::default_core(&config.destination_root);
            if !core_dir.is_dir() {
                deploy::move_to_core(&config.destination_root, &core_dir, &StderrLogger)?;
            }
            let placed = deploy::deploy_filemap(
                &filemap_path,
                &config.destination_root,
                &staging_root,
                mode,
                &config.strip_prefixes,
                &config.per_mod_strip_prefixes,
                &StderrLogger,
                &noop_progress,
            )?;
            let filled = deploy::deploy_core(
                &config.destination_root,
                &placed.placed_lower,
                &core_dir,
                mode,
                &StderrLogger,
                &noop_progress,
            )?;
            println!("Deployed {} mod file(s), filled {} vanilla file(s) from backup.", placed.count, filled);
        }
        DeploymentShape::RootOverlay => {
            let placed = deploy::deploy_filemap_to_root(
                &filemap_path,
                &config.destination_root,
                &staging_root,
                mode,
                &config.strip_prefixes,
                &config.per_mod_strip_prefixes,
                &StderrLogger,
                &noop_progress,
            )?;
            println!("Deployed {} file(s) into game root.", placed.count);
        }
        DeploymentShape::PackageOnly => {
            println!("Deployment shape is package_only — nothing to deploy.");
        }
    }

    if let Some(game_root) = &config.game_root {
        let filemap_root_path = profile_root.join(FILEMAP_ROOT_FILE);
        if filemap_root_path.is_file() {
            let placed = deploy::deploy_filemap_to_root(
                &filemap_root_path,
                game_root,
                &staging_root,
                mode,
                &config.strip_prefixes,
                &config.per_mod_strip_prefixes,
                &StderrLogger,
                &noop_progress,
            )?;
            println!("Deployed {} root-deploy-folder file(s) into game root.", placed.count);
        }

        let root_folder = root_folder_dir(&staging_root);
        if root_folder.is_dir() {
            let count = deploy::deploy_root_folder(&root_folder, game_root, mode, &StderrLogger)?;
            println!("Deployed {count} file(s) from Root_Folder into game root.");
        }
    }
    Ok(())
}

fn cmd_restore(tokens: Vec<&str>) -> Result<()> {
    let (found, _) = take_flags(&tokens, &["--profile"]);
    let profile_root = PathBuf::from(required_flag(&found, "--profile")?);
    let config = load_config(&profile_root)?;

    match config.deployment_shape {
        DeploymentShape::DataBackup => {
            let core_dir = deploy::default_core(&config.destination_root);
            let overwrite_dir = config
                .staging_root
                .parent()
                .map(|p| p.join("overwrite"))
                .unwrap_or_else(|| config.staging_root.join("overwrite"));
            let mut cache = ModIndexCache::new();
            let restored = restore::restore_data_core(
                &config.destination_root,
                &core_dir,
                &overwrite_dir,
                &profile_root.join(FILEMAP_FILE),
                &profile_root.join(MODINDEX_FILE),
                &mut cache,
                &StderrLogger,
            )?;
            println!("Restored {restored} vanilla file(s).");
        }
        DeploymentShape::RootOverlay => {
            let restored = restore::restore_filemap_from_root(
                &profile_root.join(FILEMAP_FILE),
                &config.destination_root,
                &StderrLogger,
            )?;
            println!("Removed {restored} deployed file(s) from game root.");
        }
        DeploymentShape::PackageOnly => {
            println!("Deployment shape is package_only — nothing to restore.");
        }
    }

    if let Some(game_root) = &config.game_root {
        let filemap_root_path = profile_root.join(FILEMAP_ROOT_FILE);
        if filemap_root_path.is_file() {
            let removed = restore::restore_filemap_from_root(&filemap_root_path, game_root, &StderrLogger)?;
            println!("Removed {removed} root-deploy-folder file(s) from game root.");
        }

        let root_folder = root_folder_dir(&config.staging_root);
        let removed = restore::restore_root_folder(&root_folder, game_root, &StderrLogger)?;
        if removed > 0 {
            println!("Removed {removed} file(s) deployed from Root_Folder.");
        }
    }
    Ok(())
}

fn cmd_backup(tokens: Vec<&str>) -> Result<()> {
    let (found, positional) = take_flags(&tokens, &["--profile"]);
    let profile_root = PathBuf::from(required_flag(&found, "--profile")?);
    match positional.first() {
        Some(&"create") => {
            let dir = backup::create_snapshot(&profile_root, time::OffsetDateTime::now_utc())?;
            println!("Backup snapshot created at {}", dir.display());
            Ok(())
        }
        Some(&"list") => {
            for snapshot in backup::list_snapshots(&profile_root)? {
                println!("{}", snapshot.display());
            }
            Ok(())
        }
        Some(&"restore") => {
            let name = positional.get(1).ok_or_else(|| anyhow!("usage: modlink backup restore --profile DIR SNAPSHOT_NAME"))?;
            let snapshot_dir = profile_root.join("backups").join(name);
            let restored = backup::restore_snapshot(&profile_root, &snapshot_dir)?;
            println!("Restored {restored} file(s) from {}", snapshot_dir.display());
            Ok(())
        }
        other => bail!("usage: modlink backup <create|list|restore> --profile DIR (got {other:?})"),
    }
}

fn cmd_modlist(tokens: Vec<&str>) -> Result<()> {
    let (found, positional) = take_flags(&tokens, &["--profile"]);
    let profile_root = PathBuf::from(required_flag(&found, "--profile")?);
    match positional.first() {
        Some(&"show") => {
            let entries = modlist::read_modlist(&profile_root.join(MODLIST_FILE))?;
            for (idx, entry) in entries.iter().enumerate() {
                let status = if entry.is_separator {
                    "separator"
                } else if entry.locked {
                    "locked"
                } else if entry.enabled {
                    "enabled"
                } else {
                    "disabled"
                };
                println!("{idx:>3}  {:<10} {}", status, entry.display_name());
            }
            Ok(())
        }
        other => bail!("usage: modlink modlist show --profile DIR (got {other:?})"),
    }
}

fn cmd_pak(tokens: Vec<&str>) -> Result<()> {
    let (found, positional) = take_flags(&tokens, &["--out"]);
    match positional.first() {
        Some(&"list") => {
            let path = PathBuf::from(positional.get(1).ok_or_else(|| anyhow!("usage: modlink pak list PAK_PATH"))?);
            for name in package::list_names(&path)? {
                println!("{name}");
            }
            Ok(())
        }
        Some(&"extract") => {
            let path = PathBuf::from(positional.get(1).ok_or_else(|| anyhow!("usage: modlink pak extract PAK_PATH SUFFIX"))?);
            let suffix = positional.get(2).ok_or_else(|| anyhow!("usage: modlink pak extract PAK_PATH SUFFIX"))?;
            match package::extract_named(&path, suffix)? {
                Some(bytes) => {
                    if let Some(out) = flag_value(&found, "--out") {
                        std::fs::write(&out, &bytes)?;
                        println!("Wrote {} byte(s) to {out}", bytes.len());
                    } else {
                        std::io::Write::write_all(&mut std::io::stdout(), &bytes)?;
                    }
                    Ok(())
                }
                None => bail!("no member ending in {suffix:?} found in {}", path.display()),
            }
        }
        other => bail!("usage: modlink pak <list|extract> PAK_PATH [...] (got {other:?})"),
    }
}
