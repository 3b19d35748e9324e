//! Key-value records.
//!
//! Map-like sources (a `HashMap`, a `BTreeMap`, a JSON object) are streamed as
//! [`KeyValue`] records so that every element of a stream has one uniform
//! shape. JSON objects nest: a value that is itself an object is exposed as a
//! [`Node::Nested`] list of records rather than as a raw map.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, StreamError};
use crate::value::kind;

/// An immutable `(key, value)` pair.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct KeyValue<K, V> {
    key: K,
    value: V,
}

impl<K, V> KeyValue<K, V> {
    pub fn new(key: K, value: V) -> Self {
        Self { key, value }
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn into_pair(self) -> (K, V) {
        (self.key, self.value)
    }
}

impl<K, V> From<(K, V)> for KeyValue<K, V> {
    fn from((key, value): (K, V)) -> Self {
        Self { key, value }
    }
}

/// The value side of a record read from a JSON object.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    /// Anything that is not an object.
    Leaf(Value),
    /// An object, exposed as records in key order of the source.
    Nested(Vec<KeyValue<String, Node>>),
}

impl Node {
    /// Convert back into a plain JSON value.
    pub fn into_value(self) -> Value {
        match self {
            Node::Leaf(v) => v,
            Node::Nested(records) => Value::Object(
                records
                    .into_iter()
                    .map(|kv| {
                        let (k, node) = kv.into_pair();
                        (k, node.into_value())
                    })
                    .collect(),
            ),
        }
    }

    pub fn as_leaf(&self) -> Option<&Value> {
        match self {
            Node::Leaf(v) => Some(v),
            Node::Nested(_) => None,
        }
    }

    pub fn as_nested(&self) -> Option<&[KeyValue<String, Node>]> {
        match self {
            Node::Leaf(_) => None,
            Node::Nested(records) => Some(records),
        }
    }
}

impl From<Value> for Node {
    fn from(v: Value) -> Self {
        match v {
            Value::Object(map) => Node::Nested(records(map)),
            other => Node::Leaf(other),
        }
    }
}

/// Normalize a JSON object into records, recursively.
pub fn records(map: Map<String, Value>) -> Vec<KeyValue<String, Node>> {
    map.into_iter()
        .map(|(k, v)| KeyValue::new(k, Node::from(v)))
        .collect()
}

/// Elements that can become a dict entry.
///
/// Tuples and records always can. A dynamic [`Value`] can when it is a
/// two-element array with a string key, or an object shaped like a serialized
/// [`KeyValue`] (`{"key": .., "value": ..}`); anything else is a
/// [`StreamError::TypeMismatch`].
pub trait IntoPair<K, V> {
    fn into_pair(self) -> Result<(K, V)>;
}

impl<K, V> IntoPair<K, V> for (K, V) {
    fn into_pair(self) -> Result<(K, V)> {
        Ok(self)
    }
}

impl<K, V> IntoPair<K, V> for KeyValue<K, V> {
    fn into_pair(self) -> Result<(K, V)> {
        Ok(KeyValue::into_pair(self))
    }
}

impl IntoPair<String, Value> for Value {
    fn into_pair(self) -> Result<(String, Value)> {
        match self {
            Value::Array(mut items) if items.len() == 2 => {
                let value = items.pop().unwrap_or(Value::Null);
                match items.pop() {
                    Some(Value::String(key)) => Ok((key, value)),
                    Some(other) => Err(StreamError::mismatch(format!(
                        "dict key must be a string, got {}",
                        kind(&other)
                    ))),
                    None => Err(StreamError::mismatch("empty pair")),
                }
            }
            Value::Object(mut map) if map.len() == 2 && map.contains_key("key") && map.contains_key("value") => {
                let value = map.remove("value").unwrap_or(Value::Null);
                match map.remove("key") {
                    Some(Value::String(key)) => Ok((key, value)),
                    _ => Err(StreamError::mismatch("record key must be a string")),
                }
            }
            other => Err(StreamError::mismatch(format!(
                "cannot create dict entries from {} element",
                kind(&other)
            ))),
        }
    }
}
