//! Structural JSON equality and added/deleted/updated diffs.
//!
//! Arrays are walked like objects keyed by their index, so a changed field in
//! the third event shows up under `"2"`.

use serde::Serialize;
use serde_json::{Map, Number, Value};

/// Keys added, deleted and updated going from `expected` to `actual`.
///
/// `updated` is an object of changed keys when both sides are containers. When
/// either root is a scalar it is the `actual` value itself.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailedDiff {
    pub added: Map<String, Value>,
    pub deleted: Map<String, Value>,
    pub updated: Value,
}

impl DetailedDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.deleted.is_empty()
            && matches!(&self.updated, Value::Object(map) if map.is_empty())
    }
}

/// Deep equality: sequences are order-sensitive, objects are not, and values
/// of different JSON types never match (`"5"` ≠ `5`). Numbers compare by
/// value, so `5` equals `5.0`.
pub fn json_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => numbers_eq(x, y),
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(a, b)| json_eq(a, b))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x
                    .iter()
                    .all(|(k, v)| y.get(k).is_some_and(|other| json_eq(v, other)))
        }
        _ => false,
    }
}

fn numbers_eq(x: &Number, y: &Number) -> bool {
    if let (Some(a), Some(b)) = (x.as_i64(), y.as_i64()) {
        return a == b;
    }
    if let (Some(a), Some(b)) = (x.as_u64(), y.as_u64()) {
        return a == b;
    }
    match (x.as_f64(), y.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Diff `expected` against `actual`.
pub fn detailed_diff(expected: &Value, actual: &Value) -> DetailedDiff {
    DetailedDiff {
        added: into_map(added(expected, actual)),
        deleted: into_map(deleted(expected, actual)),
        updated: updated(expected, actual),
    }
}

fn added(lhs: &Value, rhs: &Value) -> Value {
    let mut acc = Map::new();
    if json_eq(lhs, rhs) {
        return Value::Object(acc);
    }
    let Some(entries) = entries(rhs) else {
        return Value::Object(acc);
    };
    if !is_container(lhs) {
        return Value::Object(acc);
    }
    for (key, rv) in entries {
        match child(lhs, &key) {
            Some(lv) => {
                let difference = added(lv, rv);
                if !is_empty_container(&difference) {
                    acc.insert(key, difference);
                }
            }
            None => {
                acc.insert(key, rv.clone());
            }
        }
    }
    Value::Object(acc)
}

fn deleted(lhs: &Value, rhs: &Value) -> Value {
    let mut acc = Map::new();
    if json_eq(lhs, rhs) {
        return Value::Object(acc);
    }
    let Some(entries) = entries(lhs) else {
        return Value::Object(acc);
    };
    if !is_container(rhs) {
        return Value::Object(acc);
    }
    for (key, lv) in entries {
        match child(rhs, &key) {
            Some(rv) => {
                let difference = deleted(lv, rv);
                if !is_empty_container(&difference) {
                    acc.insert(key, difference);
                }
            }
            None => {
                acc.insert(key, Value::Null);
            }
        }
    }
    Value::Object(acc)
}

fn updated(lhs: &Value, rhs: &Value) -> Value {
    if json_eq(lhs, rhs) {
        return Value::Object(Map::new());
    }
    if !is_container(lhs) || !is_container(rhs) {
        return rhs.clone();
    }
    let mut acc = Map::new();
    for (key, rv) in entries(rhs).unwrap_or_default() {
        let Some(lv) = child(lhs, &key) else {
            continue;
        };
        let difference = updated(lv, rv);
        // An emptied container is still an update.
        if is_empty_container(&difference)
            && (is_empty_container(lv) || !is_empty_container(rv))
        {
            continue;
        }
        acc.insert(key, difference);
    }
    Value::Object(acc)
}

fn is_container(value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::Array(_))
}

fn is_empty_container(value: &Value) -> bool {
    match value {
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn entries(value: &Value) -> Option<Vec<(String, &Value)>> {
    match value {
        Value::Object(map) => Some(map.iter().map(|(k, v)| (k.clone(), v)).collect()),
        Value::Array(items) => Some(
            items
                .iter()
                .enumerate()
                .map(|(i, v)| (i.to_string(), v))
                .collect(),
        ),
        _ => None,
    }
}

fn child<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(key),
        Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

fn into_map(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
