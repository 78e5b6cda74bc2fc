//! Kernel object handles and the walk that swaps them for live objects.
//!
//! A handle is the JSON object `{"hash": <u64>, "type": "<kind>"}`. Payloads
//! sent to the kernel may contain handles anywhere in their nested maps and
//! arrays; on the kernel side they are replaced by the objects they name
//! (`rehydrate`), and live objects in a result are registered and replaced by
//! fresh handles before the result leaves the kernel (`dehydrate`). Both walks
//! work on plain `serde_json::Value` trees and know nothing about transport.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Kind tag used for solid shapes owned by the kernel
pub const SHAPE_HANDLE_TYPE: &str = "kernel-shape";

/// Opaque token for an object living in the kernel's execution context
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HandleRef {
    pub hash: u64,
    #[serde(rename = "type")]
    pub kind: String,
}

impl HandleRef {
    pub fn shape(hash: u64) -> Self {
        Self {
            hash,
            kind: SHAPE_HANDLE_TYPE.to_string(),
        }
    }

    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("hash".to_string(), Value::from(self.hash));
        map.insert("type".to_string(), Value::from(self.kind.clone()));
        Value::Object(map)
    }
}

/// Recognize a handle marker: an object with exactly `hash` and `type`.
pub fn is_handle(value: &Value) -> Option<HandleRef> {
    let map = value.as_object()?;
    if map.len() != 2 {
        return None;
    }
    let hash = map.get("hash")?.as_u64()?;
    let kind = map.get("type")?.as_str()?;
    Some(HandleRef {
        hash,
        kind: kind.to_string(),
    })
}

/// All distinct handles referenced anywhere in `value`, in first-seen order.
pub fn collect_handles(value: &Value) -> Vec<HandleRef> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    let mut stack = vec![value];

    while let Some(current) = stack.pop() {
        if let Some(handle) = is_handle(current) {
            if seen.insert(handle.hash) {
                out.push(handle);
            }
            continue;
        }
        match current {
            Value::Array(items) => stack.extend(items.iter().rev()),
            Value::Object(map) => stack.extend(map.values().rev()),
            _ => {}
        }
    }

    out
}

/// A JSON-shaped tree whose leaves may be live kernel objects
#[derive(Debug, Clone, PartialEq)]
pub enum Hydrated<T> {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<Hydrated<T>>),
    Object(BTreeMap<String, Hydrated<T>>),
    Live(T),
}

impl<T> Hydrated<T> {
    /// Field lookup on an object node
    pub fn get(&self, key: &str) -> Option<&Hydrated<T>> {
        match self {
            Hydrated::Object(map) => map.get(key),
            _ => None,
        }
    }

    pub fn as_live(&self) -> Option<&T> {
        match self {
            Hydrated::Live(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Hydrated<T>]> {
        match self {
            Hydrated::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Convert back to plain JSON. Fails if the subtree holds a live object.
    pub fn to_plain(&self) -> Option<Value> {
        Some(match self {
            Hydrated::Null => Value::Null,
            Hydrated::Bool(b) => Value::Bool(*b),
            Hydrated::Number(n) => Value::Number(n.clone()),
            Hydrated::String(s) => Value::String(s.clone()),
            Hydrated::Array(items) => Value::Array(
                items
                    .iter()
                    .map(Hydrated::to_plain)
                    .collect::<Option<Vec<_>>>()?,
            ),
            Hydrated::Object(map) => {
                let mut out = Map::new();
                for (k, v) in map {
                    out.insert(k.clone(), v.to_plain()?);
                }
                Value::Object(out)
            }
            Hydrated::Live(_) => return None,
        })
    }
}

impl<T> From<Value> for Hydrated<T> {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Hydrated::Null,
            Value::Bool(b) => Hydrated::Bool(b),
            Value::Number(n) => Hydrated::Number(n),
            Value::String(s) => Hydrated::String(s),
            Value::Array(items) => Hydrated::Array(items.into_iter().map(Hydrated::from).collect()),
            Value::Object(map) => {
                Hydrated::Object(map.into_iter().map(|(k, v)| (k, Hydrated::from(v))).collect())
            }
        }
    }
}

/// Replace every handle in `value` with the object `resolve` returns for it.
///
/// Each distinct handle is resolved once; later occurrences reuse the visited
/// result. Returns the first handle `resolve` does not know.
pub fn rehydrate<T, F>(value: &Value, mut resolve: F) -> Result<Hydrated<T>, HandleRef>
where
    T: Clone,
    F: FnMut(&HandleRef) -> Option<T>,
{
    let mut visited: HashMap<u64, T> = HashMap::new();
    rehydrate_inner(value, &mut resolve, &mut visited)
}

fn rehydrate_inner<T, F>(
    value: &Value,
    resolve: &mut F,
    visited: &mut HashMap<u64, T>,
) -> Result<Hydrated<T>, HandleRef>
where
    T: Clone,
    F: FnMut(&HandleRef) -> Option<T>,
{
    if let Some(handle) = is_handle(value) {
        if let Some(obj) = visited.get(&handle.hash) {
            return Ok(Hydrated::Live(obj.clone()));
        }
        let obj = resolve(&handle).ok_or_else(|| handle.clone())?;
        visited.insert(handle.hash, obj.clone());
        return Ok(Hydrated::Live(obj));
    }

    Ok(match value {
        Value::Array(items) => Hydrated::Array(
            items
                .iter()
                .map(|item| rehydrate_inner(item, resolve, visited))
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Value::Object(map) => {
            let mut out = BTreeMap::new();
            for (k, v) in map {
                out.insert(k.clone(), rehydrate_inner(v, resolve, visited)?);
            }
            Hydrated::Object(out)
        }
        other => Hydrated::from(other.clone()),
    })
}

/// Register every live object in `tree` and substitute the returned handle.
pub fn dehydrate<T, F>(tree: Hydrated<T>, mut register: F) -> Value
where
    F: FnMut(T) -> HandleRef,
{
    dehydrate_inner(tree, &mut register)
}

fn dehydrate_inner<T, F>(tree: Hydrated<T>, register: &mut F) -> Value
where
    F: FnMut(T) -> HandleRef,
{
    match tree {
        Hydrated::Null => Value::Null,
        Hydrated::Bool(b) => Value::Bool(b),
        Hydrated::Number(n) => Value::Number(n),
        Hydrated::String(s) => Value::String(s),
        Hydrated::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| dehydrate_inner(item, register))
                .collect(),
        ),
        Hydrated::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, dehydrate_inner(v, register)))
                .collect(),
        ),
        Hydrated::Live(obj) => register(obj).to_value(),
    }
}
