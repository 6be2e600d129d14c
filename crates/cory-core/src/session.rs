use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use std::str::FromStr;

use tracing::{debug, info};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpenMode {
    #[default]
    Read,
    Write,
}

impl OpenMode {
    pub fn writable(self) -> bool {
        self == OpenMode::Write
    }
}

impl FromStr for OpenMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "r" | "read" => Ok(OpenMode::Read),
            "w" | "write" => Ok(OpenMode::Write),
            other => Err(Error::wrong_kind(
                format!("mode {:?}", other),
                "\"r\" or \"w\"",
            )),
        }
    }
}

impl fmt::Display for OpenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OpenMode::Read => "r",
            OpenMode::Write => "w",
        })
    }
}

/// A document that can be opened in a scoped session over one save file.
pub trait SaveDocument: Sized {
    /// Name used in logs and errors.
    const KIND: &'static str;

    fn parse(text: &str, writable: bool) -> Result<Self>;

    /// Called with the untouched file contents before a writable session
    /// hands out the document.
    fn make_backups(location: &Path, content: &str) -> Result<()>;

    fn is_dirty(&self) -> bool;

    fn serialize(&mut self) -> Result<String>;
}

pub(crate) fn read_source(location: &Path, what: &str) -> Result<String> {
    fs::read_to_string(location).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => {
            Error::NotFound(format!("{} at {}", what, location.display()))
        }
        _ => Error::Io(e),
    })
}

/// Runs `f` over the document at `location`. In write mode the file is
/// rewritten afterwards only if `f` returned `Ok` and the document is dirty.
pub fn open_session<D, R, F>(location: &Path, mode: OpenMode, backup: bool, f: F) -> Result<R>
where
    D: SaveDocument,
    F: FnOnce(&mut D) -> Result<R>,
{
    let content = read_source(location, D::KIND)?;
    let writable = mode.writable();
    if writable && backup {
        D::make_backups(location, &content)?;
    }
    let mut doc = D::parse(&content, writable)?;
    let out = f(&mut doc)?;
    if writable {
        if doc.is_dirty() {
            let text = doc.serialize()?;
            fs::write(location, text)?;
            info!(path = %location.display(), "wrote {}", D::KIND);
        } else {
            debug!(path = %location.display(), "{} unchanged, not writing", D::KIND);
        }
    }
    Ok(out)
}
