use std::fmt;

use crate::error::{Error, Result};

pub const DEFAULT_EXITS: &str = "1111";

/// Which edges of a screen can be walked through. Stored in level_data as a
/// four character `0`/`1` string in down, up, left, right order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitsFlags {
    pub down: bool,
    pub up: bool,
    pub left: bool,
    pub right: bool,
    original: String,
}

impl ExitsFlags {
    pub fn parse(s: &str) -> Result<Self> {
        let bits: Vec<bool> = s
            .chars()
            .map(|c| match c {
                '0' => Ok(false),
                '1' => Ok(true),
                other => Err(Error::DataIntegrity(format!(
                    "exits must be 0/1 digits, found {:?} in {:?}",
                    other, s
                ))),
            })
            .collect::<Result<_>>()?;
        let &[down, up, left, right] = bits.as_slice() else {
            return Err(Error::DataIntegrity(format!(
                "exits must be 4 digits, got {:?}",
                s
            )));
        };
        Ok(Self {
            down,
            up,
            left,
            right,
            original: s.to_string(),
        })
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    /// Differs from the string it was parsed from.
    pub fn is_dirty(&self) -> bool {
        self.to_string() != self.original
    }
}

impl Default for ExitsFlags {
    fn default() -> Self {
        Self {
            down: true,
            up: true,
            left: true,
            right: true,
            original: DEFAULT_EXITS.to_string(),
        }
    }
}

impl fmt::Display for ExitsFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in [self.down, self.up, self.left, self.right] {
            f.write_str(if b { "1" } else { "0" })?;
        }
        Ok(())
    }
}
