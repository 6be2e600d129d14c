//! Recursive change-tracking containers over `serde_json::Value`.
//!
//! Every entry is stored as a [`Node`]: either the raw JSON value as it was
//! parsed, or a wrapped container. Reading an entry that holds a raw object or
//! array promotes it in place to a [`RecursiveMap`] / [`RecursiveList`] with
//! the parent's writable flag, so later reads return the same instance and
//! mutations anywhere below the root are visible through [`RecursiveMap::is_dirty`].
//! Entries that were never read stay raw and are never walked.
use serde_json::{Map, Value};
use tracing::trace;

use crate::error::{Error, Result};
use crate::tracked::{TrackedList, TrackedMap};

#[derive(Debug, Clone)]
pub enum Node {
    Raw(Value),
    Map(RecursiveMap),
    List(RecursiveList),
}

impl Node {
    fn promote(&mut self, writable: bool) {
        let promoted = match self {
            Node::Raw(Value::Object(m)) => {
                Node::Map(RecursiveMap::new(writable, std::mem::take(m)))
            }
            Node::Raw(Value::Array(a)) => {
                Node::List(RecursiveList::new(writable, std::mem::take(a)))
            }
            _ => return,
        };
        trace!(writable, "promoted nested container");
        *self = promoted;
    }

    fn item(&mut self) -> Item<'_> {
        match self {
            Node::Raw(v) => Item::Value(v),
            Node::Map(m) => Item::Map(m),
            Node::List(l) => Item::List(l),
        }
    }

    pub fn is_dirty(&self) -> bool {
        match self {
            Node::Raw(_) => false,
            Node::Map(m) => m.is_dirty(),
            Node::List(l) => l.is_dirty(),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Node::Raw(v) => v.clone(),
            Node::Map(m) => m.to_value(),
            Node::List(l) => l.to_value(),
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            Node::Raw(v) => v,
            Node::Map(m) => m.into_value(),
            Node::List(l) => l.into_value(),
        }
    }
}

/// Borrowed view of one entry after promotion.
#[derive(Debug)]
pub enum Item<'a> {
    Value(&'a Value),
    Map(&'a mut RecursiveMap),
    List(&'a mut RecursiveList),
}

impl<'a> Item<'a> {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Item::Value(v) => Some(*v),
            _ => None,
        }
    }

    pub fn into_map(self) -> Option<&'a mut RecursiveMap> {
        match self {
            Item::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn into_list(self) -> Option<&'a mut RecursiveList> {
        match self {
            Item::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Item::Value(v) => (*v).clone(),
            Item::Map(m) => m.to_value(),
            Item::List(l) => l.to_value(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecursiveMap {
    inner: TrackedMap<Node>,
}

impl RecursiveMap {
    pub fn new(writable: bool, map: Map<String, Value>) -> Self {
        let entries = map.into_iter().map(|(k, v)| (k, Node::Raw(v))).collect();
        Self {
            inner: TrackedMap::new(writable, entries),
        }
    }

    pub fn is_writable(&self) -> bool {
        self.inner.is_writable()
    }

    /// True if this map or any promoted descendant was mutated.
    pub fn is_dirty(&self) -> bool {
        self.inner.is_dirty() || self.inner.slots().any(|(_, n)| n.is_dirty())
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.inner.keys()
    }

    pub fn get(&mut self, key: &str) -> Result<Item<'_>> {
        let writable = self.inner.is_writable();
        let node = self
            .inner
            .slot_mut(key)
            .ok_or_else(|| Error::NotFound(format!("key {:?}", key)))?;
        node.promote(writable);
        Ok(node.item())
    }

    pub fn map(&mut self, key: &str) -> Result<&mut RecursiveMap> {
        self.get(key)?
            .into_map()
            .ok_or_else(|| Error::wrong_kind(key, "an object"))
    }

    pub fn list(&mut self, key: &str) -> Result<&mut RecursiveList> {
        self.get(key)?
            .into_list()
            .ok_or_else(|| Error::wrong_kind(key, "an array"))
    }

    /// Scalar at `key`; objects and arrays are rejected with `WrongKind`.
    pub fn value(&mut self, key: &str) -> Result<&Value> {
        match self.get(key)? {
            Item::Value(v) => Ok(v),
            _ => Err(Error::wrong_kind(key, "a scalar")),
        }
    }

    /// Plain snapshot of an entry without promoting it.
    pub fn peek(&self, key: &str) -> Option<Value> {
        self.inner.get(key).ok().map(Node::to_value)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Result<()> {
        self.inner.insert(key, Node::Raw(value.into()))?;
        Ok(())
    }

    pub fn remove(&mut self, key: &str) -> Result<Value> {
        Ok(self.inner.remove(key)?.into_value())
    }

    pub fn update(&mut self, items: Map<String, Value>) -> Result<()> {
        self.inner
            .extend(items.into_iter().map(|(k, v)| (k, Node::Raw(v))))
    }

    pub fn to_value(&self) -> Value {
        let map: Map<String, Value> = self
            .inner
            .slots()
            .map(|(k, n)| (k.clone(), n.to_value()))
            .collect();
        Value::Object(map)
    }

    pub fn into_value(self) -> Value {
        let map: Map<String, Value> = self
            .inner
            .into_inner()
            .into_iter()
            .map(|(k, n)| (k, n.into_value()))
            .collect();
        Value::Object(map)
    }
}

#[derive(Debug, Clone)]
pub struct RecursiveList {
    inner: TrackedList<Node>,
}

impl RecursiveList {
    pub fn new(writable: bool, items: Vec<Value>) -> Self {
        Self {
            inner: TrackedList::new(writable, items.into_iter().map(Node::Raw).collect()),
        }
    }

    pub fn is_writable(&self) -> bool {
        self.inner.is_writable()
    }

    pub fn is_dirty(&self) -> bool {
        self.inner.is_dirty() || self.inner.iter().any(Node::is_dirty)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn get(&mut self, index: usize) -> Result<Item<'_>> {
        let writable = self.inner.is_writable();
        let len = self.inner.len();
        let node = self.inner.slot_mut(index).ok_or_else(|| {
            Error::IndexOutOfRange(format!("list index {} (len {})", index, len))
        })?;
        node.promote(writable);
        Ok(node.item())
    }

    pub fn map(&mut self, index: usize) -> Result<&mut RecursiveMap> {
        self.get(index)?
            .into_map()
            .ok_or_else(|| Error::wrong_kind(format!("[{}]", index), "an object"))
    }

    pub fn list(&mut self, index: usize) -> Result<&mut RecursiveList> {
        self.get(index)?
            .into_list()
            .ok_or_else(|| Error::wrong_kind(format!("[{}]", index), "an array"))
    }

    pub fn value(&mut self, index: usize) -> Result<&Value> {
        match self.get(index)? {
            Item::Value(v) => Ok(v),
            _ => Err(Error::wrong_kind(format!("[{}]", index), "a scalar")),
        }
    }

    pub fn peek(&self, index: usize) -> Option<Value> {
        self.inner.get(index).ok().map(Node::to_value)
    }

    pub fn set(&mut self, index: usize, value: impl Into<Value>) -> Result<()> {
        self.inner.set(index, Node::Raw(value.into()))?;
        Ok(())
    }

    pub fn push(&mut self, value: impl Into<Value>) -> Result<()> {
        self.inner.push(Node::Raw(value.into()))
    }

    pub fn insert(&mut self, index: usize, value: impl Into<Value>) -> Result<()> {
        self.inner.insert(index, Node::Raw(value.into()))
    }

    pub fn remove(&mut self, index: usize) -> Result<Value> {
        Ok(self.inner.remove(index)?.into_value())
    }

    pub fn extend<I: IntoIterator<Item = Value>>(&mut self, items: I) -> Result<()> {
        self.inner.extend(items.into_iter().map(Node::Raw))
    }

    pub fn to_value(&self) -> Value {
        Value::Array(self.inner.iter().map(Node::to_value).collect())
    }

    pub fn into_value(self) -> Value {
        Value::Array(
            self.inner
                .into_inner()
                .into_iter()
                .map(Node::into_value)
                .collect(),
        )
    }
}
