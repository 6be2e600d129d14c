//! level_data: one JSON object mapping screen keys to screen entries.
//!
//! ```no_run
//! use cory_core::{LevelData, OpenMode};
//!
//! let level = LevelData::new("level_data");
//! level.open(OpenMode::Write, |doc| {
//!     let geo = doc.get("0_1_2")?.geo().unwrap_or_default().to_string();
//!     doc.get("0_0_0")?.set_geo(geo)
//! })?;
//! # Ok::<(), cory_core::Error>(())
//! ```
use std::fmt;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::debug;

use crate::backup;
use crate::error::{Error, Result};
use crate::screen::ScreenRecord;
use crate::session::{OpenMode, SaveDocument, open_session};
use crate::tracked::TrackedMap;

#[derive(Debug, Clone)]
enum ScreenSlot {
    Raw(Value),
    Screen(Box<ScreenRecord>),
}

impl ScreenSlot {
    fn is_dirty(&self) -> bool {
        match self {
            ScreenSlot::Raw(_) => false,
            ScreenSlot::Screen(r) => r.is_dirty(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LevelDataDocument {
    screens: TrackedMap<ScreenSlot>,
}

impl LevelDataDocument {
    pub fn new(root: Value, writable: bool) -> Result<Self> {
        let Value::Object(map) = root else {
            return Err(Error::wrong_kind("level_data root", "a JSON object"));
        };
        let entries = map
            .into_iter()
            .map(|(k, v)| (k, ScreenSlot::Raw(v)))
            .collect();
        Ok(Self {
            screens: TrackedMap::new(writable, entries),
        })
    }

    pub fn from_json(text: &str, writable: bool) -> Result<Self> {
        Self::new(serde_json::from_str(text)?, writable)
    }

    pub fn is_writable(&self) -> bool {
        self.screens.is_writable()
    }

    pub fn len(&self) -> usize {
        self.screens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.screens.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.screens.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.screens.keys()
    }

    /// The screen at `key`, built from its raw entry on first access. Later
    /// calls return the same record.
    pub fn get(&mut self, key: &str) -> Result<&mut ScreenRecord> {
        let writable = self.screens.is_writable();
        let slot = self
            .screens
            .slot_mut(key)
            .ok_or_else(|| Error::NotFound(format!("screen {:?}", key)))?;
        if let ScreenSlot::Raw(raw) = slot {
            let map = raw.as_object().ok_or_else(|| {
                Error::DataIntegrity(format!("screen {:?} is not a JSON object", key))
            })?;
            let record = ScreenRecord::new(writable, map.clone())?;
            debug!(key, "promoted screen");
            *slot = ScreenSlot::Screen(Box::new(record));
        }
        match slot {
            ScreenSlot::Screen(r) => Ok(r.as_mut()),
            ScreenSlot::Raw(_) => Err(Error::DataIntegrity(format!(
                "screen {:?} could not be promoted",
                key
            ))),
        }
    }

    /// Replaces (or adds) a screen. Only JSON objects are accepted.
    pub fn set(&mut self, key: impl Into<String>, value: Value) -> Result<()> {
        if !self.is_writable() {
            return Err(Error::WriteProtected { what: "level_data" });
        }
        let key = key.into();
        let Value::Object(map) = value else {
            return Err(Error::wrong_kind(format!("screen {:?}", key), "a JSON object"));
        };
        let record = ScreenRecord::new(true, map)?;
        self.screens.insert(key, ScreenSlot::Screen(Box::new(record)))?;
        Ok(())
    }

    pub fn remove(&mut self, key: &str) -> Result<()> {
        self.screens.remove(key)?;
        Ok(())
    }

    pub fn is_dirty(&self) -> bool {
        self.screens.is_dirty() || self.screens.slots().any(|(_, s)| s.is_dirty())
    }

    /// Root object ready for encoding; promoted screens contribute their
    /// folded raw entries, everything else is passed through as parsed.
    pub fn to_serializable(&mut self) -> Value {
        let mut root = Map::with_capacity(self.screens.len());
        for (key, slot) in self.screens.slots_mut() {
            let value = match slot {
                ScreenSlot::Raw(v) => v.clone(),
                ScreenSlot::Screen(r) => Value::Object(r.to_serializable().clone()),
            };
            root.insert(key.clone(), value);
        }
        Value::Object(root)
    }

    /// Compact JSON (`,` and `:` separators), keys in input order.
    pub fn serialize(&mut self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_serializable())?)
    }
}

impl SaveDocument for LevelDataDocument {
    const KIND: &'static str = "level_data";

    fn parse(text: &str, writable: bool) -> Result<Self> {
        Self::from_json(text, writable)
    }

    fn make_backups(location: &Path, content: &str) -> Result<()> {
        backup::backup_level_data(location, content)?;
        Ok(())
    }

    fn is_dirty(&self) -> bool {
        LevelDataDocument::is_dirty(self)
    }

    fn serialize(&mut self) -> Result<String> {
        LevelDataDocument::serialize(self)
    }
}

/// Handle on a level_data file.
#[derive(Debug, Clone)]
pub struct LevelData {
    location: PathBuf,
}

impl LevelData {
    pub fn new(location: impl Into<PathBuf>) -> Self {
        Self {
            location: location.into(),
        }
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    /// Opens level_data for the duration of `f`. Write mode makes the one-off
    /// backup first and rewrites the file afterwards if anything changed.
    pub fn open<R>(
        &self,
        mode: OpenMode,
        f: impl FnOnce(&mut LevelDataDocument) -> Result<R>,
    ) -> Result<R> {
        self.open_with(mode, true, f)
    }

    pub fn open_with<R>(
        &self,
        mode: OpenMode,
        backup: bool,
        f: impl FnOnce(&mut LevelDataDocument) -> Result<R>,
    ) -> Result<R> {
        open_session(&self.location, mode, backup, f)
    }
}

impl fmt::Display for LevelData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.location.display())
    }
}
