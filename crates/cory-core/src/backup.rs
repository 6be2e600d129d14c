use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::info;
use walkdir::WalkDir;
use zip::CompressionMethod;
use zip::write::FileOptions;

use crate::error::{Error, Result};

pub const LEVEL_DATA_BACKUP: &str = "level_data_backup";
pub const BACKUP_DIR: &str = "pycoryBackups";
pub const PLAYDATA_BACKUP_FIRST: &str = "_playdata_backup_FIRST";
pub const PLAYDATA_BACKUP_NEWEST: &str = "_playdata_backup_1";
pub const PLAYDATA_BACKUP_OLDER: &str = "_playdata_backup_2";

fn sibling_dir(location: &Path) -> &Path {
    location
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."))
}

/// Writes `level_data_backup` next to level_data unless it already exists.
/// The backup is taken once and never refreshed.
pub fn backup_level_data(location: &Path, content: &str) -> Result<Option<PathBuf>> {
    let dest = sibling_dir(location).join(LEVEL_DATA_BACKUP);
    if dest.is_file() {
        return Ok(None);
    }
    info!(path = %dest.display(), "making level_data backup");
    fs::write(&dest, content)?;
    Ok(Some(dest))
}

/// Keeps a one-off FIRST copy plus two rotating generations of _playdata in
/// `pycoryBackups/`. `_1` always holds `content`, the previous `_1` moves to
/// `_2` and the previous `_2` is dropped. Returns the backup directory.
pub fn rotate_playdata_backups(location: &Path, content: &str) -> Result<PathBuf> {
    let dir = sibling_dir(location).join(BACKUP_DIR);
    fs::create_dir_all(&dir)?;

    let first = dir.join(PLAYDATA_BACKUP_FIRST);
    if !first.is_file() {
        info!(path = %first.display(), "making first _playdata backup");
        fs::write(&first, content)?;
    }

    let newest = dir.join(PLAYDATA_BACKUP_NEWEST);
    let older = dir.join(PLAYDATA_BACKUP_OLDER);
    match fs::remove_file(&older) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }
    if newest.is_file() {
        fs::rename(&newest, &older)?;
    }
    fs::write(&newest, content)?;
    Ok(dir)
}

/// Zips a save directory next to it as `<name>_<timestamp>.zip` and returns
/// the archive path. `pycoryBackups/` and any `.zip` already inside the
/// directory are left out.
pub fn snapshot_save_dir(dir: &Path) -> Result<PathBuf> {
    let dest = snapshot_path(dir)?;
    let mut zip = zip::ZipWriter::new(fs::File::create(&dest)?);
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o644);
    let entries = WalkDir::new(dir)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !skip_in_snapshot(e.path()));
    let mut files = 0usize;
    for entry in entries {
        let entry = entry.map_err(|e| io::Error::other(e.to_string()))?;
        let rel = entry
            .path()
            .strip_prefix(dir)
            .map_err(|e| io::Error::other(e.to_string()))?;
        let name = rel.to_string_lossy().replace('\\', "/");
        if entry.file_type().is_dir() {
            zip.add_directory(name, options)?;
        } else {
            zip.start_file(name, options)?;
            zip.write_all(&fs::read(entry.path())?)?;
            files += 1;
        }
    }
    zip.finish()?;
    info!(path = %dest.display(), files, "wrote save snapshot");
    Ok(dest)
}

fn skip_in_snapshot(path: &Path) -> bool {
    match path.file_name().and_then(|n| n.to_str()) {
        Some(name) => name == BACKUP_DIR || name.ends_with(".zip"),
        None => false,
    }
}

fn snapshot_path(dir: &Path) -> Result<PathBuf> {
    if !dir.is_dir() {
        return Err(Error::NotFound(format!(
            "save directory {}",
            dir.display()
        )));
    }
    let parent = dir.parent().unwrap_or(Path::new("."));
    let name = dir.file_name().and_then(|s| s.to_str()).unwrap_or("save");
    let ts = chrono::Local::now().format("%Y%m%d-%H%M%S");
    Ok(parent.join(format!("{}_{}.zip", name, ts)))
}
