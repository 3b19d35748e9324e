//! Collecting terminal operations.
//!
//! Typed streams collect into standard containers through dedicated methods:
//!
//! - [`Stream::to_list`], [`Stream::to_tuple`], [`Stream::to_set`]
//! - [`Stream::to_string`], joining `Display` elements with a delimiter
//! - [`Stream::to_dict`], [`Stream::to_dict_with`], [`Stream::to_dict_merging`]
//!
//! Streams of dynamic [`Value`] elements can also pick the target at runtime
//! with [`Stream::collect`] and a [`Collector`], the way a configuration file or
//! a command line names the output shape.

use std::collections::{HashMap, HashSet};
use std::fmt::{Debug, Display};
use std::hash::Hash;
use std::str::FromStr;

use serde_json::{Map, Value};

use crate::error::{Result, StreamError};
use crate::record::IntoPair;
use crate::Stream;

impl<'a, T: 'a> Stream<'a, T> {
    /// Collect all elements into a `Vec<T>`, in stream order.
    ///
    /// # Example
    /// ```
    /// use pipestream::Stream;
    ///
    /// let v = Stream::of(vec![3, 1, 2]).sort().to_list()?;
    /// assert_eq!(v, vec![1, 2, 3]);
    /// # Ok::<(), pipestream::StreamError>(())
    /// ```
    pub fn to_list(self) -> Result<Vec<T>> {
        self.guard.terminal("to_list", |seq| Ok(seq.collect()))
    }

    /// Collect all elements into an immutable boxed slice.
    pub fn to_tuple(self) -> Result<Box<[T]>> {
        self.guard.terminal("to_tuple", |seq| Ok(seq.collect()))
    }

    pub fn to_set(self) -> Result<HashSet<T>>
    where
        T: Eq + Hash,
    {
        self.guard.terminal("to_set", |seq| Ok(seq.collect()))
    }

    /// Join the elements' `Display` forms with `delimiter`.
    ///
    /// ```
    /// use pipestream::Stream;
    ///
    /// assert_eq!(Stream::of([1, 2, 3]).to_string(", ")?, "1, 2, 3");
    /// # Ok::<(), pipestream::StreamError>(())
    /// ```
    pub fn to_string(self, delimiter: &str) -> Result<String>
    where
        T: Display,
    {
        self.guard.terminal("to_string", |seq| {
            let mut out = String::new();
            for (i, item) in seq.enumerate() {
                if i > 0 {
                    out.push_str(delimiter);
                }
                out.push_str(&item.to_string());
            }
            Ok(out)
        })
    }

    /// Build a map from elements that already are pairs: tuples,
    /// [`KeyValue`](crate::KeyValue) records, or `[key, value]` JSON values.
    ///
    /// # Errors
    /// - [`StreamError::TypeMismatch`] if an element is not a pair.
    /// - [`StreamError::DuplicateKey`] on the first colliding key.
    pub fn to_dict<K, V>(self) -> Result<HashMap<K, V>>
    where
        T: IntoPair<K, V>,
        K: Eq + Hash + Debug,
    {
        self.guard.terminal("to_dict", |seq| {
            let mut out = HashMap::new();
            for item in seq {
                let (k, v) = item.into_pair()?;
                insert_unique(&mut out, k, v)?;
            }
            Ok(out)
        })
    }

    /// Build a map with `collector` turning each element into a `(key, value)`
    /// pair.
    ///
    /// # Errors
    /// [`StreamError::DuplicateKey`] naming the first colliding key.
    pub fn to_dict_with<K, V, F>(self, mut collector: F) -> Result<HashMap<K, V>>
    where
        K: Eq + Hash + Debug,
        F: FnMut(T) -> (K, V),
    {
        self.guard.terminal("to_dict", |seq| {
            let mut out = HashMap::new();
            for item in seq {
                let (k, v) = collector(item);
                insert_unique(&mut out, k, v)?;
            }
            Ok(out)
        })
    }

    /// Like [`Stream::to_dict_with`], resolving colliding keys with
    /// `merger(old, new)`.
    ///
    /// ```
    /// use pipestream::Stream;
    ///
    /// let words = Stream::of(["apple", "avocado", "banana"]);
    /// let first = words.to_dict_merging(|w| (w.chars().next(), w), |old, _new| old)?;
    /// assert_eq!(first[&Some('a')], "apple");
    /// # Ok::<(), pipestream::StreamError>(())
    /// ```
    pub fn to_dict_merging<K, V, F, M>(self, mut collector: F, mut merger: M) -> Result<HashMap<K, V>>
    where
        K: Eq + Hash,
        F: FnMut(T) -> (K, V),
        M: FnMut(V, V) -> V,
    {
        self.guard.terminal("to_dict", |seq| {
            let mut out: HashMap<K, V> = HashMap::new();
            for item in seq {
                let (k, v) = collector(item);
                let merged = match out.remove(&k) {
                    Some(old) => merger(old, v),
                    None => v,
                };
                out.insert(k, merged);
            }
            Ok(out)
        })
    }
}

fn insert_unique<K, V>(out: &mut HashMap<K, V>, key: K, value: V) -> Result<()>
where
    K: Eq + Hash + Debug,
{
    if out.contains_key(&key) {
        return Err(StreamError::duplicate(&key));
    }
    out.insert(key, value);
    Ok(())
}

/* ===================== runtime-selected collection ===================== */

/// Output shape of [`Stream::collect`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CollectTarget {
    /// JSON array in stream order.
    #[default]
    List,
    /// Same as `List`; kept for sources that name the immutable variant.
    Tuple,
    /// JSON array of distinct elements in first-seen order.
    Set,
    /// JSON object; needs a dict collector.
    Dict,
    /// String joined with the collector's delimiter.
    Str,
    /// Whatever the collector's finisher builds from all elements.
    Custom,
}

impl FromStr for CollectTarget {
    type Err = StreamError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "list" => Ok(Self::List),
            "tuple" => Ok(Self::Tuple),
            "set" => Ok(Self::Set),
            "dict" | "map" => Ok(Self::Dict),
            "str" | "string" => Ok(Self::Str),
            "custom" => Ok(Self::Custom),
            other => Err(StreamError::invalid(format!(
                "unsupported collection type '{other}', expected one of: list, tuple, set, dict, str, custom"
            ))),
        }
    }
}

type DictCollector<'a> = Box<dyn FnMut(Value) -> (String, Value) + 'a>;
type Merger<'a> = Box<dyn FnMut(Value, Value) -> Value + 'a>;
type Finisher<'a> = Box<dyn FnOnce(Vec<Value>) -> Value + 'a>;

/// Configuration for [`Stream::collect`].
///
/// Built with [`Collector::new`] (or [`Collector::parse`] from a type name)
/// and refined with the `with_*` methods. Callbacks are checked against the
/// target when the stream is collected: a dict target needs a dict collector,
/// a custom target needs a finisher, and callbacks that the target would
/// ignore are rejected rather than silently dropped.
#[derive(Default)]
pub struct Collector<'a> {
    target: CollectTarget,
    dict_collector: Option<DictCollector<'a>>,
    merger: Option<Merger<'a>>,
    finisher: Option<Finisher<'a>>,
    delimiter: String,
}

impl<'a> Collector<'a> {
    pub fn new(target: CollectTarget) -> Self {
        Self {
            target,
            ..Self::default()
        }
    }

    /// Collector for a target named by string (`"list"`, `"set"`, `"dict"`, ...).
    pub fn parse(name: &str) -> Result<Self> {
        Ok(Self::new(name.parse()?))
    }

    pub fn target(&self) -> CollectTarget {
        self.target
    }

    /// Turn each element into a `(key, value)` entry of the dict.
    pub fn with_dict_collector<F>(mut self, collector: F) -> Self
    where
        F: FnMut(Value) -> (String, Value) + 'a,
    {
        self.dict_collector = Some(Box::new(collector));
        self
    }

    /// Resolve colliding dict keys with `merger(old, new)`.
    pub fn with_merger<F>(mut self, merger: F) -> Self
    where
        F: FnMut(Value, Value) -> Value + 'a,
    {
        self.merger = Some(Box::new(merger));
        self
    }

    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    pub fn with_finisher<F>(mut self, finisher: F) -> Self
    where
        F: FnOnce(Vec<Value>) -> Value + 'a,
    {
        self.finisher = Some(Box::new(finisher));
        self
    }

    fn validate(&self) -> Result<()> {
        let dict_callbacks = self.dict_collector.is_some() || self.merger.is_some();
        match self.target {
            CollectTarget::Dict if self.dict_collector.is_none() => Err(StreamError::invalid(
                "missing required collector callback: dict target needs a dict collector",
            )),
            CollectTarget::Custom if self.finisher.is_none() => Err(StreamError::invalid(
                "missing required collector callback: custom target needs a finisher",
            )),
            CollectTarget::Dict => Ok(()),
            target if dict_callbacks => Err(StreamError::invalid(format!(
                "dict collector or merger given for {target:?} target"
            ))),
            CollectTarget::Custom => Ok(()),
            target if self.finisher.is_some() => Err(StreamError::invalid(format!(
                "finisher given for {target:?} target"
            ))),
            _ => Ok(()),
        }
    }
}

impl Debug for Collector<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collector")
            .field("target", &self.target)
            .field("dict_collector", &self.dict_collector.is_some())
            .field("merger", &self.merger.is_some())
            .field("finisher", &self.finisher.is_some())
            .field("delimiter", &self.delimiter)
            .finish()
    }
}

impl<'a> Stream<'a, Value> {
    /// Collect dynamic elements into the shape `collector` names.
    ///
    /// # Errors
    /// - [`StreamError::InvalidArgument`] when the collector is missing a
    ///   callback its target needs, or carries one the target cannot use.
    /// - [`StreamError::DuplicateKey`] for a colliding dict key without a merger.
    ///
    /// # Example
    /// ```
    /// use pipestream::{Collector, CollectTarget, Stream};
    /// use serde_json::json;
    ///
    /// let joined = Stream::of([json!("a"), json!(1), json!(true)])
    ///     .collect(Collector::new(CollectTarget::Str).with_delimiter("-"))?;
    /// assert_eq!(joined, json!("a-1-true"));
    /// # Ok::<(), pipestream::StreamError>(())
    /// ```
    pub fn collect(self, collector: Collector<'a>) -> Result<Value> {
        self.guard.terminal("collect", move |seq| {
            collector.validate()?;
            let Collector {
                target,
                dict_collector,
                merger,
                finisher,
                delimiter,
            } = collector;
            match target {
                CollectTarget::List | CollectTarget::Tuple => Ok(Value::Array(seq.collect())),
                CollectTarget::Set => {
                    let mut seen = HashSet::new();
                    Ok(Value::Array(
                        seq.filter(|v| seen.insert(v.to_string())).collect(),
                    ))
                }
                CollectTarget::Str => {
                    let parts: Vec<String> = seq.map(|v| display_value(&v)).collect();
                    Ok(Value::String(parts.join(&delimiter)))
                }
                CollectTarget::Dict => {
                    let mut entry = dict_collector
                        .ok_or_else(|| StreamError::invalid("missing required collector callback"))?;
                    let mut merger = merger;
                    let mut out = Map::new();
                    for item in seq {
                        let (k, v) = entry(item);
                        let merged = match (out.remove(&k), merger.as_mut()) {
                            (Some(old), Some(merge)) => merge(old, v),
                            (Some(_), None) => return Err(StreamError::duplicate(&k)),
                            (None, _) => v,
                        };
                        out.insert(k, merged);
                    }
                    Ok(Value::Object(out))
                }
                CollectTarget::Custom => {
                    let finish = finisher
                        .ok_or_else(|| StreamError::invalid("missing required collector callback"))?;
                    Ok(finish(seq.collect()))
                }
            }
        })
    }
}

/// Strings join without their JSON quotes; everything else in JSON form.
fn display_value(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
