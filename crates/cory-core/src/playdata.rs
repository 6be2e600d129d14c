//! `_playdata`: the player's save, one value per line.
//!
//! Every line ends with `" \n"`. Scalar lines hold the screen triple and the
//! position; a handful of lines hold compact JSON objects. JSON lines are
//! parsed on first access and re-encoded on write only if they changed, so
//! the rest of the file is written back byte for byte.
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde_json::Value;
use tracing::{debug, warn};

use crate::backup;
use crate::error::{Error, Result};
use crate::recursive::RecursiveMap;
use crate::session::{OpenMode, SaveDocument, open_session};
use crate::tracked::TrackedList;

/// Trailing marker of every playdata line.
pub const LINE_TAIL: &str = " \n";

const X_LINE: usize = 0;
const Y_LINE: usize = 1;
const LAYER_LINE: usize = 2;
const POS_X_LINE: usize = 4;
const POS_Y_LINE: usize = 5;

/// The JSON-object lines of playdata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DictLine {
    State,
    CharacterStates,
    /// `{ "DECOR NAME": { "x", "y", "lvl": "SCREEN_X_Y", "flip", "time" } }`
    Decor,
    /// `{ "<screen number>" | "0": ["photo path"] }`
    Photos,
    /// `{ "layer_x_y.paint": "<encoded paint>" }`
    Paint,
}

impl DictLine {
    pub const ALL: [DictLine; 5] = [
        DictLine::State,
        DictLine::CharacterStates,
        DictLine::Decor,
        DictLine::Photos,
        DictLine::Paint,
    ];

    /// Zero-based line index.
    pub fn index(self) -> usize {
        match self {
            DictLine::State => 3,
            DictLine::CharacterStates => 6,
            DictLine::Decor => 9,
            DictLine::Photos => 13,
            DictLine::Paint => 18,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DictLine::State => "state",
            DictLine::CharacterStates => "character_states",
            DictLine::Decor => "decor",
            DictLine::Photos => "photos",
            DictLine::Paint => "paint",
        }
    }
}

impl fmt::Display for DictLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DictLine {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        DictLine::ALL
            .into_iter()
            .find(|d| d.name() == s)
            .ok_or_else(|| Error::NotFound(format!("playdata field {:?}", s)))
    }
}

#[derive(Debug, Clone)]
enum Line {
    Text(String),
    // `source` is the line as read; None once the whole object was replaced.
    Dict {
        source: Option<String>,
        map: RecursiveMap,
    },
}

fn body(raw: &str) -> &str {
    raw.strip_suffix(LINE_TAIL).unwrap_or_else(|| raw.trim_end())
}

#[derive(Debug, Clone)]
pub struct PlaydataDocument {
    lines: TrackedList<Line>,
}

impl PlaydataDocument {
    pub fn new(text: &str, writable: bool) -> Self {
        let lines = text
            .split_inclusive('\n')
            .map(|l| Line::Text(l.to_string()))
            .collect();
        Self {
            lines: TrackedList::new(writable, lines),
        }
    }

    pub fn is_writable(&self) -> bool {
        self.lines.is_writable()
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    fn check(&self) -> Result<()> {
        if self.is_writable() {
            Ok(())
        } else {
            Err(Error::WriteProtected { what: "playdata" })
        }
    }

    fn scalar<T>(&self, index: usize, what: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        let text = match self.lines.get(index) {
            Ok(Line::Text(s)) => body(s),
            Ok(Line::Dict { .. }) => {
                return Err(Error::DataIntegrity(format!(
                    "line {} ({}) holds an object",
                    index + 1,
                    what
                )));
            }
            Err(_) => {
                return Err(Error::DataIntegrity(format!(
                    "playdata has no line {} ({})",
                    index + 1,
                    what
                )));
            }
        };
        text.trim().parse().map_err(|e| {
            Error::DataIntegrity(format!("line {} ({}): {}: {:?}", index + 1, what, e, text))
        })
    }

    fn set_scalar(&mut self, index: usize, value: impl fmt::Display) -> Result<()> {
        if index >= self.lines.len() {
            return Err(Error::DataIntegrity(format!(
                "playdata has no line {}",
                index + 1
            )));
        }
        self.lines
            .set(index, Line::Text(format!("{}{}", value, LINE_TAIL)))?;
        Ok(())
    }

    /// Screen location as `[layer, x, y]`.
    pub fn screen(&self) -> Result<[i64; 3]> {
        Ok([
            self.scalar(LAYER_LINE, "layer")?,
            self.scalar(X_LINE, "x")?,
            self.scalar(Y_LINE, "y")?,
        ])
    }

    /// Takes `[layer, x, y]`.
    pub fn set_screen(&mut self, value: &[i64]) -> Result<()> {
        self.check()?;
        let &[layer, x, y] = value else {
            return Err(Error::ValueRange {
                field: "screen",
                expected: 3,
                got: value.len(),
            });
        };
        self.set_scalar(LAYER_LINE, layer)?;
        self.set_scalar(X_LINE, x)?;
        self.set_scalar(Y_LINE, y)
    }

    /// Position on the screen as `[x, y]`.
    pub fn position(&self) -> Result<[f64; 2]> {
        Ok([
            self.scalar(POS_X_LINE, "position x")?,
            self.scalar(POS_Y_LINE, "position y")?,
        ])
    }

    pub fn set_position(&mut self, value: &[f64]) -> Result<()> {
        self.check()?;
        let &[x, y] = value else {
            return Err(Error::ValueRange {
                field: "position",
                expected: 2,
                got: value.len(),
            });
        };
        if POS_Y_LINE >= self.lines.len() {
            return Err(Error::DataIntegrity(format!(
                "playdata has no line {} (position y)",
                POS_Y_LINE + 1
            )));
        }
        // Debug keeps the ".0" on whole numbers.
        self.set_scalar(POS_X_LINE, format!("{:?}", x))?;
        self.set_scalar(POS_Y_LINE, format!("{:?}", y))
    }

    /// The parsed object on `which`'s line. Parsing happens once and never
    /// marks the document dirty.
    pub fn dict(&mut self, which: DictLine) -> Result<&mut RecursiveMap> {
        let writable = self.lines.is_writable();
        let slot = self.lines.slot_mut(which.index()).ok_or_else(|| {
            Error::DataIntegrity(format!("playdata has no {} line", which))
        })?;
        if let Line::Text(src) = slot {
            if !src.ends_with(LINE_TAIL) {
                warn!(line = %which, "object line lacks the trailing space marker");
            }
            let Value::Object(map) = serde_json::from_str::<Value>(body(src))? else {
                return Err(Error::DataIntegrity(format!(
                    "{} line is not a JSON object",
                    which
                )));
            };
            let source = std::mem::take(src);
            debug!(line = %which, "parsed playdata object line");
            *slot = Line::Dict {
                source: Some(source),
                map: RecursiveMap::new(writable, map),
            };
        }
        match slot {
            Line::Dict { map, .. } => Ok(map),
            Line::Text(_) => Err(Error::DataIntegrity(format!(
                "{} line could not be parsed",
                which
            ))),
        }
    }

    /// Replaces a whole object line. `value` must be a JSON object.
    pub fn set_dict(&mut self, which: DictLine, value: Value) -> Result<()> {
        self.check()?;
        let Value::Object(map) = value else {
            return Err(Error::wrong_kind(which.name(), "a dict"));
        };
        if which.index() >= self.lines.len() {
            return Err(Error::DataIntegrity(format!(
                "playdata has no {} line",
                which
            )));
        }
        let writable = self.is_writable();
        self.lines.set(
            which.index(),
            Line::Dict {
                source: None,
                map: RecursiveMap::new(writable, map),
            },
        )?;
        Ok(())
    }

    pub fn state(&mut self) -> Result<&mut RecursiveMap> {
        self.dict(DictLine::State)
    }

    pub fn set_state(&mut self, value: Value) -> Result<()> {
        self.set_dict(DictLine::State, value)
    }

    pub fn character_states(&mut self) -> Result<&mut RecursiveMap> {
        self.dict(DictLine::CharacterStates)
    }

    pub fn set_character_states(&mut self, value: Value) -> Result<()> {
        self.set_dict(DictLine::CharacterStates, value)
    }

    pub fn decor(&mut self) -> Result<&mut RecursiveMap> {
        self.dict(DictLine::Decor)
    }

    pub fn set_decor(&mut self, value: Value) -> Result<()> {
        self.set_dict(DictLine::Decor, value)
    }

    pub fn photos(&mut self) -> Result<&mut RecursiveMap> {
        self.dict(DictLine::Photos)
    }

    pub fn set_photos(&mut self, value: Value) -> Result<()> {
        self.set_dict(DictLine::Photos, value)
    }

    pub fn paint(&mut self) -> Result<&mut RecursiveMap> {
        self.dict(DictLine::Paint)
    }

    pub fn set_paint(&mut self, value: Value) -> Result<()> {
        self.set_dict(DictLine::Paint, value)
    }

    pub fn is_dirty(&self) -> bool {
        self.lines.is_dirty()
            || self
                .lines
                .iter()
                .any(|l| matches!(l, Line::Dict { map, .. } if map.is_dirty()))
    }

    /// The file contents. Object lines are re-encoded only if they changed.
    pub fn serialize(&self) -> Result<String> {
        let mut out = String::new();
        for line in self.lines.iter() {
            match line {
                Line::Text(s) => out.push_str(s),
                Line::Dict {
                    source: Some(src),
                    map,
                } if !map.is_dirty() => out.push_str(src),
                Line::Dict { map, .. } => {
                    out.push_str(&serde_json::to_string(&map.to_value())?);
                    out.push_str(LINE_TAIL);
                }
            }
        }
        Ok(out)
    }
}

impl SaveDocument for PlaydataDocument {
    const KIND: &'static str = "_playdata";

    fn parse(text: &str, writable: bool) -> Result<Self> {
        Ok(Self::new(text, writable))
    }

    fn make_backups(location: &Path, content: &str) -> Result<()> {
        backup::rotate_playdata_backups(location, content)?;
        Ok(())
    }

    fn is_dirty(&self) -> bool {
        PlaydataDocument::is_dirty(self)
    }

    fn serialize(&mut self) -> Result<String> {
        PlaydataDocument::serialize(self)
    }
}

/// Handle on a `_playdata` file.
#[derive(Debug, Clone)]
pub struct Playdata {
    location: PathBuf,
}

impl Playdata {
    pub fn new(location: impl Into<PathBuf>) -> Self {
        Self {
            location: location.into(),
        }
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    /// Opens _playdata for the duration of `f`. Write mode rotates the
    /// backups before `f` runs and rewrites the file afterwards if anything
    /// changed.
    pub fn open<R>(
        &self,
        mode: OpenMode,
        f: impl FnOnce(&mut PlaydataDocument) -> Result<R>,
    ) -> Result<R> {
        self.open_with(mode, true, f)
    }

    pub fn open_with<R>(
        &self,
        mode: OpenMode,
        backup: bool,
        f: impl FnOnce(&mut PlaydataDocument) -> Result<R>,
    ) -> Result<R> {
        open_session(&self.location, mode, backup, f)
    }
}

impl fmt::Display for Playdata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.location.display())
    }
}
