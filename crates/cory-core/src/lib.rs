//! cory-core: change-tracking access to Chicory save files
//!
//! This crate focuses on a small, well-factored surface:
//! - Tracked containers: writable/read-only guards and dirty flags, flat
//!   (`tracked`) and lazily promoted over JSON (`recursive`)
//! - Typed documents for `level_data` (screens) and `_playdata` (fixed lines)
//! - Scoped sessions that back up before and write back only what changed
//! - Geo blob codec, save/level_data location, save directory snapshots
//!
pub mod backup;
pub mod decode;
pub mod error;
pub mod exits;
pub mod level_data;
pub mod locate;
pub mod playdata;
pub mod pointer;
pub mod recursive;
pub mod screen;
pub mod session;
pub mod tracked;

pub use backup::{backup_level_data, rotate_playdata_backups, snapshot_save_dir};
pub use decode::{GEO_SIZE, Geo, GeoCell, PAINT_SIZE, decode, encode, geo};
pub use error::{Error, Result};
pub use exits::ExitsFlags;
pub use level_data::{LevelData, LevelDataDocument};
pub use locate::{PathConfig, PathSource, Save};
pub use playdata::{DictLine, Playdata, PlaydataDocument};
pub use pointer::{get_pointer, remove_pointer, set_pointer};
pub use recursive::{Item, Node, RecursiveList, RecursiveMap};
pub use screen::{ScreenField, ScreenRecord};
pub use session::{OpenMode, SaveDocument};
pub use tracked::{TrackedList, TrackedMap, Tracker};
