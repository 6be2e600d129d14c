// JSON Pointer (RFC 6901) editing routed through the recursive containers.
// - `get_pointer`: plain snapshot, promotes nothing.
// - `set_pointer` / `remove_pointer`: walk by promoting each parent so the
//   edit lands in a tracked container and dirties the document.
// Array tokens are decimal indices; `-` on set appends.
use serde_json::Value;

use crate::error::{Error, Result};
use crate::recursive::{Item, RecursiveList, RecursiveMap};

fn unescape_token(tok: &str) -> String {
    let s = tok.replace("~1", "/");
    s.replace("~0", "~")
}

fn tokens(pointer: &str) -> Result<Vec<String>> {
    if pointer.is_empty() {
        return Ok(Vec::new());
    }
    let rest = pointer
        .strip_prefix('/')
        .ok_or_else(|| Error::NotFound(format!("json pointer must start with '/': {}", pointer)))?;
    Ok(rest.split('/').map(unescape_token).collect())
}

fn parse_index(tok: &str) -> Result<usize> {
    tok.parse()
        .map_err(|_| Error::IndexOutOfRange(format!("array index invalid: {}", tok)))
}

enum Cursor<'a> {
    Map(&'a mut RecursiveMap),
    List(&'a mut RecursiveList),
}

impl<'a> Cursor<'a> {
    fn step(self, tok: &str) -> Result<Cursor<'a>> {
        let item = match self {
            Cursor::Map(m) => m.get(tok)?,
            Cursor::List(l) => l.get(parse_index(tok)?)?,
        };
        match item {
            Item::Map(m) => Ok(Cursor::Map(m)),
            Item::List(l) => Ok(Cursor::List(l)),
            Item::Value(_) => Err(Error::wrong_kind(tok, "an object or array")),
        }
    }
}

fn walk_parent<'a>(root: &'a mut RecursiveMap, pointer: &str) -> Result<(Cursor<'a>, String)> {
    let mut toks = tokens(pointer)?;
    let last = toks
        .pop()
        .ok_or_else(|| Error::NotFound("cannot address the root itself".into()))?;
    let mut cur = Cursor::Map(root);
    for t in &toks {
        cur = cur.step(t)?;
    }
    Ok((cur, last))
}

pub fn get_pointer(root: &RecursiveMap, pointer: &str) -> Option<Value> {
    if pointer.is_empty() {
        return Some(root.to_value());
    }
    let mut toks = tokens(pointer).ok()?.into_iter();
    let first = toks.next()?;
    let mut cur = root.peek(&first)?;
    for t in toks {
        cur = match cur {
            Value::Object(mut m) => m.remove(&t)?,
            Value::Array(mut a) => {
                let i: usize = t.parse().ok()?;
                if i >= a.len() {
                    return None;
                }
                a.swap_remove(i)
            }
            _ => return None,
        };
    }
    Some(cur)
}

pub fn set_pointer(root: &mut RecursiveMap, pointer: &str, value: Value) -> Result<()> {
    let (parent, last) = walk_parent(root, pointer)?;
    match parent {
        Cursor::Map(m) => m.set(last, value),
        Cursor::List(l) if last == "-" => l.push(value),
        Cursor::List(l) => l.set(parse_index(&last)?, value),
    }
}

pub fn remove_pointer(root: &mut RecursiveMap, pointer: &str) -> Result<Value> {
    let (parent, last) = walk_parent(root, pointer)?;
    match parent {
        Cursor::Map(m) => m.remove(&last),
        Cursor::List(l) => l.remove(parse_index(&last)?),
    }
}
