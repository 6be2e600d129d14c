//! Typed view of one level_data screen entry (`"<area>_<x>_<y>"`).
//!
//! The record keeps the raw JSON object it was built from and writes scalar
//! fields straight through to it. `exits`, `objects` and `decos` are parsed
//! once at construction and only folded back into the raw object by
//! [`ScreenRecord::to_serializable`] when they changed, so untouched keys
//! (including ones this type does not know about) pass through verbatim.
use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::exits::ExitsFlags;
use crate::recursive::RecursiveList;
use crate::tracked::Tracker;

const EXITS: &str = "exits";
const OBJECTS: &str = "objects";
const DECOS: &str = "decos";

/// Scalar fields of a screen that can be set from loosely typed input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenField {
    Geo,
    Ambiance,
    Palette,
    Title,
    Area,
    Transition,
    Music,
    ObjectId,
    Name,
    Exits,
}

impl ScreenField {
    pub const ALL: [ScreenField; 10] = [
        ScreenField::Geo,
        ScreenField::Ambiance,
        ScreenField::Palette,
        ScreenField::Title,
        ScreenField::Area,
        ScreenField::Transition,
        ScreenField::Music,
        ScreenField::ObjectId,
        ScreenField::Name,
        ScreenField::Exits,
    ];

    /// Key in the raw level_data object.
    pub fn key(self) -> &'static str {
        match self {
            ScreenField::Geo => "geo",
            ScreenField::Ambiance => "ambiance",
            ScreenField::Palette => "palette",
            ScreenField::Title => "title",
            ScreenField::Area => "area",
            ScreenField::Transition => "transition",
            ScreenField::Music => "music",
            ScreenField::ObjectId => "object_id",
            ScreenField::Name => "name",
            ScreenField::Exits => EXITS,
        }
    }

    fn is_integer(self) -> bool {
        matches!(self, ScreenField::Transition | ScreenField::ObjectId)
    }
}

impl fmt::Display for ScreenField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ScreenField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ScreenField::ALL
            .into_iter()
            .find(|f| f.key() == s)
            .ok_or_else(|| Error::NotFound(format!("screen field {:?}", s)))
    }
}

#[derive(Debug, Clone)]
pub struct ScreenRecord {
    raw: Map<String, Value>,
    tracker: Tracker,
    exits: ExitsFlags,
    objects: RecursiveList,
    decos: RecursiveList,
}

impl ScreenRecord {
    pub fn new(writable: bool, raw: Map<String, Value>) -> Result<Self> {
        let exits = match raw.get(EXITS) {
            None => ExitsFlags::default(),
            Some(Value::String(s)) => ExitsFlags::parse(s)?,
            Some(other) => {
                return Err(Error::DataIntegrity(format!(
                    "exits must be a string, got {}",
                    other
                )));
            }
        };
        let objects = RecursiveList::new(writable, array_field(&raw, OBJECTS)?);
        let decos = RecursiveList::new(writable, array_field(&raw, DECOS)?);
        Ok(Self {
            raw,
            tracker: Tracker::new(writable),
            exits,
            objects,
            decos,
        })
    }

    pub fn is_writable(&self) -> bool {
        self.tracker.writable()
    }

    pub fn is_dirty(&self) -> bool {
        self.tracker.dirty()
            || self.exits.is_dirty()
            || self.objects.is_dirty()
            || self.decos.is_dirty()
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.raw.get(key).and_then(Value::as_str)
    }

    pub fn geo(&self) -> Option<&str> {
        self.str_field("geo")
    }

    pub fn ambiance(&self) -> Option<&str> {
        self.str_field("ambiance")
    }

    pub fn palette(&self) -> Option<&str> {
        self.str_field("palette")
    }

    pub fn title(&self) -> Option<&str> {
        self.str_field("title")
    }

    pub fn area(&self) -> Option<&str> {
        self.str_field("area")
    }

    pub fn music(&self) -> Option<&str> {
        self.str_field("music")
    }

    pub fn name(&self) -> Option<&str> {
        self.str_field("name")
    }

    pub fn transition(&self) -> Option<i64> {
        self.raw.get("transition").and_then(as_integer)
    }

    /// Required: a screen without a usable object id is malformed.
    pub fn object_id(&self) -> Result<i64> {
        match self.raw.get("object_id") {
            Some(v) => as_integer(v).ok_or_else(|| {
                Error::DataIntegrity(format!("object_id is not an integer: {}", v))
            }),
            None => Err(Error::DataIntegrity("screen has no object_id".into())),
        }
    }

    /// Any key of the raw entry, including ones without a typed accessor.
    pub fn raw_field(&self, key: &str) -> Option<&Value> {
        self.raw.get(key)
    }

    fn write(&mut self, key: &str, value: Value) -> Result<()> {
        self.tracker.check("screen")?;
        self.raw.insert(key.to_string(), value);
        self.tracker.touch();
        Ok(())
    }

    pub fn set_geo(&mut self, value: impl Into<String>) -> Result<()> {
        self.write("geo", Value::String(value.into()))
    }

    pub fn set_ambiance(&mut self, value: impl Into<String>) -> Result<()> {
        self.write("ambiance", Value::String(value.into()))
    }

    pub fn set_palette(&mut self, value: impl Into<String>) -> Result<()> {
        self.write("palette", Value::String(value.into()))
    }

    pub fn set_title(&mut self, value: impl Into<String>) -> Result<()> {
        self.write("title", Value::String(value.into()))
    }

    pub fn set_area(&mut self, value: impl Into<String>) -> Result<()> {
        self.write("area", Value::String(value.into()))
    }

    pub fn set_music(&mut self, value: impl Into<String>) -> Result<()> {
        self.write("music", Value::String(value.into()))
    }

    pub fn set_name(&mut self, value: impl Into<String>) -> Result<()> {
        self.write("name", Value::String(value.into()))
    }

    pub fn set_transition(&mut self, value: i64) -> Result<()> {
        self.write("transition", Value::from(value))
    }

    pub fn set_object_id(&mut self, value: i64) -> Result<()> {
        self.write("object_id", Value::from(value))
    }

    /// Sets a field from loosely typed JSON, coercing it to the field's type.
    /// String fields accept strings, numbers and booleans; integer fields
    /// accept integral numbers and numeric strings; exits accepts a 4 digit
    /// 0/1 string or the same digits as a number.
    pub fn set_field(&mut self, field: ScreenField, value: Value) -> Result<()> {
        self.tracker.check("screen")?;
        if field == ScreenField::Exits {
            // `1010` arrives as a JSON number.
            let s = match value {
                Value::String(s) => s,
                Value::Number(n) if n.is_u64() => n.to_string(),
                _ => return Err(Error::wrong_kind(field.key(), "a 4 digit 0/1 string")),
            };
            let parsed = ExitsFlags::parse(&s)?;
            let exits = self.exits_mut()?;
            exits.down = parsed.down;
            exits.up = parsed.up;
            exits.left = parsed.left;
            exits.right = parsed.right;
            return Ok(());
        }
        let coerced = if field.is_integer() {
            Value::from(as_integer(&value).ok_or_else(|| Error::wrong_kind(field.key(), "an integer"))?)
        } else {
            Value::String(match value {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => return Err(Error::wrong_kind(field.key(), "a string")),
            })
        };
        self.write(field.key(), coerced)
    }

    /// Current value of a scalar field as JSON (exits as its 4 digit string).
    pub fn field(&self, field: ScreenField) -> Option<Value> {
        match field {
            ScreenField::Exits => Some(Value::String(self.exits.to_string())),
            _ => self.raw.get(field.key()).cloned(),
        }
    }

    pub fn exits(&self) -> &ExitsFlags {
        &self.exits
    }

    pub fn exits_mut(&mut self) -> Result<&mut ExitsFlags> {
        self.tracker.check("screen")?;
        Ok(&mut self.exits)
    }

    pub fn objects(&mut self) -> &mut RecursiveList {
        &mut self.objects
    }

    pub fn decos(&mut self) -> &mut RecursiveList {
        &mut self.decos
    }

    /// Folds changed exits/objects/decos back into the raw entry and returns it.
    pub fn to_serializable(&mut self) -> &Map<String, Value> {
        if self.exits.is_dirty() {
            self.raw
                .insert(EXITS.to_string(), Value::String(self.exits.to_string()));
        }
        if self.objects.is_dirty() {
            self.raw.insert(OBJECTS.to_string(), self.objects.to_value());
        }
        if self.decos.is_dirty() {
            self.raw.insert(DECOS.to_string(), self.decos.to_value());
        }
        &self.raw
    }

    pub fn into_raw(mut self) -> Map<String, Value> {
        self.to_serializable();
        self.raw
    }
}

fn array_field(raw: &Map<String, Value>, key: &str) -> Result<Vec<Value>> {
    match raw.get(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items.clone()),
        Some(other) => Err(Error::DataIntegrity(format!(
            "{} must be an array, got {}",
            key, other
        ))),
    }
}

fn as_integer(v: &Value) -> Option<i64> {
    match v {
        // Floats must be whole and inside i64; `as` would saturate.
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0)
                .filter(|f| (i64::MIN as f64..i64::MAX as f64).contains(f))
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
