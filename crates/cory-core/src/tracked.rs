// Flat change-tracking containers.
// - `TrackedMap<V>`: insertion-ordered string-keyed map.
// - `TrackedList<T>`: sequence.
// Both refuse mutation unless opened writable and raise a dirty flag on every
// successful mutation. The flag is not recursive at this level; see
// `recursive` for containers whose dirtiness composes.
use indexmap::IndexMap;

use crate::error::{Error, Result};

/// Writable/dirty bookkeeping shared by every tracked container.
#[derive(Debug, Clone, Copy, Default)]
pub struct Tracker {
    writable: bool,
    dirty: bool,
}

impl Tracker {
    pub fn new(writable: bool) -> Self {
        Self {
            writable,
            dirty: false,
        }
    }

    pub fn writable(&self) -> bool {
        self.writable
    }

    pub fn dirty(&self) -> bool {
        self.dirty
    }

    /// Fails unless writable. `what` names the container in the error.
    pub fn check(&self, what: &'static str) -> Result<()> {
        if self.writable {
            Ok(())
        } else {
            Err(Error::WriteProtected { what })
        }
    }

    pub fn touch(&mut self) {
        self.dirty = true;
    }
}

#[derive(Debug, Clone)]
pub struct TrackedMap<V> {
    tracker: Tracker,
    entries: IndexMap<String, V>,
}

impl<V> TrackedMap<V> {
    pub fn new(writable: bool, entries: IndexMap<String, V>) -> Self {
        Self {
            tracker: Tracker::new(writable),
            entries,
        }
    }

    pub fn is_writable(&self) -> bool {
        self.tracker.writable()
    }

    pub fn is_dirty(&self) -> bool {
        self.tracker.dirty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn get(&self, key: &str) -> Result<&V> {
        self.entries
            .get(key)
            .ok_or_else(|| Error::NotFound(format!("key {:?}", key)))
    }

    /// Inserts or replaces; an existing key keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, value: V) -> Result<Option<V>> {
        self.tracker.check("dict")?;
        let old = self.entries.insert(key.into(), value);
        self.tracker.touch();
        Ok(old)
    }

    pub fn remove(&mut self, key: &str) -> Result<V> {
        self.tracker.check("dict")?;
        let v = self
            .entries
            .shift_remove(key)
            .ok_or_else(|| Error::NotFound(format!("key {:?}", key)))?;
        self.tracker.touch();
        Ok(v)
    }

    pub fn extend<I: IntoIterator<Item = (String, V)>>(&mut self, items: I) -> Result<()> {
        self.tracker.check("dict")?;
        self.entries.extend(items);
        self.tracker.touch();
        Ok(())
    }

    // Untracked access, used to promote a slot in place.
    pub(crate) fn slot_mut(&mut self, key: &str) -> Option<&mut V> {
        self.entries.get_mut(key)
    }

    pub(crate) fn slots(&self) -> impl Iterator<Item = (&String, &V)> {
        self.entries.iter()
    }

    pub(crate) fn slots_mut(&mut self) -> impl Iterator<Item = (&String, &mut V)> {
        self.entries.iter_mut()
    }

    pub fn into_inner(self) -> IndexMap<String, V> {
        self.entries
    }
}

#[derive(Debug, Clone)]
pub struct TrackedList<T> {
    tracker: Tracker,
    items: Vec<T>,
}

impl<T> TrackedList<T> {
    pub fn new(writable: bool, items: Vec<T>) -> Self {
        Self {
            tracker: Tracker::new(writable),
            items,
        }
    }

    pub fn is_writable(&self) -> bool {
        self.tracker.writable()
    }

    pub fn is_dirty(&self) -> bool {
        self.tracker.dirty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn get(&self, index: usize) -> Result<&T> {
        let len = self.items.len();
        self.items
            .get(index)
            .ok_or_else(|| out_of_range(index, len))
    }

    pub fn set(&mut self, index: usize, value: T) -> Result<T> {
        self.tracker.check("list")?;
        let len = self.items.len();
        let slot = self
            .items
            .get_mut(index)
            .ok_or_else(|| out_of_range(index, len))?;
        let old = std::mem::replace(slot, value);
        self.tracker.touch();
        Ok(old)
    }

    pub fn push(&mut self, value: T) -> Result<()> {
        self.tracker.check("list")?;
        self.items.push(value);
        self.tracker.touch();
        Ok(())
    }

    pub fn insert(&mut self, index: usize, value: T) -> Result<()> {
        self.tracker.check("list")?;
        if index > self.items.len() {
            return Err(out_of_range(index, self.items.len()));
        }
        self.items.insert(index, value);
        self.tracker.touch();
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Result<T> {
        self.tracker.check("list")?;
        if index >= self.items.len() {
            return Err(out_of_range(index, self.items.len()));
        }
        let v = self.items.remove(index);
        self.tracker.touch();
        Ok(v)
    }

    pub fn extend<I: IntoIterator<Item = T>>(&mut self, items: I) -> Result<()> {
        self.tracker.check("list")?;
        self.items.extend(items);
        self.tracker.touch();
        Ok(())
    }

    pub(crate) fn slot_mut(&mut self, index: usize) -> Option<&mut T> {
        self.items.get_mut(index)
    }

    pub fn into_inner(self) -> Vec<T> {
        self.items
    }
}

fn out_of_range(index: usize, len: usize) -> Error {
    Error::IndexOutOfRange(format!("list index {} (len {})", index, len))
}
