//! Finding the save directory and level_data.
//!
//! Each path is taken from, in order: an explicit argument, an environment
//! variable, or the platform default held in a [`PathConfig`].
use std::env;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};
use crate::level_data::LevelData;
use crate::playdata::Playdata;

pub const SAVE_PATH_ENV: &str = "CHICORYSAVEPATH";
pub const LEVEL_DATA_PATH_ENV: &str = "CHICORYLEVELDATA";

pub const PLAYDATA_FILE: &str = "_playdata";

const STEAM_APP_ID: &str = "1123450";
const GAME_DIR: &str = "Chicory A Colorful Tale";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathSource {
    Argument,
    Environment,
    Default,
}

impl fmt::Display for PathSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PathSource::Argument => "Argument",
            PathSource::Environment => "Environment",
            PathSource::Default => "Default",
        })
    }
}

/// Default locations. Resolve once at startup and pass by reference.
#[derive(Debug, Clone, Default)]
pub struct PathConfig {
    pub save_dir: Option<PathBuf>,
    pub level_data: Option<PathBuf>,
}

impl PathConfig {
    /// Where the game keeps its files on the current platform.
    pub fn platform_defaults() -> Self {
        let home = dirs::home_dir();
        if cfg!(windows) {
            Self {
                save_dir: dirs::data_local_dir().map(|d| d.join("paintdog").join("save")),
                level_data: Some(
                    PathBuf::from(r"C:\Program Files (x86)\Steam\steamapps\common")
                        .join(GAME_DIR)
                        .join("level_data"),
                ),
            }
        } else if cfg!(target_os = "macos") {
            Self {
                save_dir: dirs::data_dir().map(|d| d.join("paintdog").join("save")),
                level_data: None,
            }
        } else {
            let steam = home.map(|h| h.join(".local/share/Steam/steamapps"));
            Self {
                save_dir: steam.as_ref().map(|s| {
                    s.join("compatdata")
                        .join(STEAM_APP_ID)
                        .join("pfx/drive_c/users/steamuser/Local Settings/Application Data/paintdog/save")
                }),
                level_data: steam.map(|s| s.join("common").join(GAME_DIR).join("level_data")),
            }
        }
    }

    pub fn resolve_save_dir(&self, explicit: Option<&Path>) -> Result<(PathBuf, PathSource)> {
        pick(
            explicit,
            env::var_os(SAVE_PATH_ENV),
            self.save_dir.as_deref(),
        )
        .ok_or_else(|| Error::NotFound("no save directory configured for this platform".into()))
    }

    pub fn resolve_level_data(&self, explicit: Option<&Path>) -> Result<(PathBuf, PathSource)> {
        pick(
            explicit,
            env::var_os(LEVEL_DATA_PATH_ENV),
            self.level_data.as_deref(),
        )
        .ok_or_else(|| Error::NotFound("no level_data location configured for this platform".into()))
    }

    pub fn find_save(&self, explicit: Option<&Path>) -> Result<Save> {
        let (path, from) = self.resolve_save_dir(explicit)?;
        if !path.is_dir() {
            return Err(Error::NotFound(format!(
                "save directory {} (from {})",
                path.display(),
                from
            )));
        }
        debug!(path = %path.display(), %from, "found save");
        Ok(Save::new(path))
    }

    pub fn find_level_data(&self, explicit: Option<&Path>) -> Result<LevelData> {
        let (path, from) = self.resolve_level_data(explicit)?;
        if !path.is_file() {
            return Err(Error::NotFound(format!(
                "level_data {} (from {})",
                path.display(),
                from
            )));
        }
        debug!(path = %path.display(), %from, "found level_data");
        Ok(LevelData::new(path))
    }
}

fn pick(
    explicit: Option<&Path>,
    env_value: Option<OsString>,
    default: Option<&Path>,
) -> Option<(PathBuf, PathSource)> {
    if let Some(p) = explicit.filter(|p| !p.as_os_str().is_empty()) {
        return Some((expand_home(p), PathSource::Argument));
    }
    if let Some(v) = env_value.filter(|v| !v.is_empty()) {
        return Some((expand_home(Path::new(&v)), PathSource::Environment));
    }
    default.map(|p| (p.to_path_buf(), PathSource::Default))
}

/// Expands a leading `~` to the home directory.
pub fn expand_home(p: &Path) -> PathBuf {
    match (p.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => p.to_path_buf(),
    }
}

/// A save directory.
#[derive(Debug, Clone)]
pub struct Save {
    location: PathBuf,
    pub playdata: Playdata,
}

impl Save {
    pub fn new(location: impl Into<PathBuf>) -> Self {
        let location = location.into();
        let playdata = Playdata::new(location.join(PLAYDATA_FILE));
        Self { location, playdata }
    }

    pub fn location(&self) -> &Path {
        &self.location
    }
}

impl fmt::Display for Save {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.location.display())
    }
}
