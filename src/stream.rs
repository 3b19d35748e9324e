//! The chainable [`Stream`] façade: constructors and intermediate operations.
//!
//! Terminal operations live in [`terminal`](crate::terminal) and
//! [`collect`](crate::collect); grouping in [`group`](crate::group); delegation
//! to registered sequence functions in [`adapter`](crate::adapter).

use std::hash::Hash;
use std::ops::Range;

use serde_json::{Map, Value};

use crate::error::{Result, StreamError};
use crate::guard::{Fault, Guard, Released};
use crate::record::{records, KeyValue, Node};
use crate::sequence::{self, BoxedSeq, Nullable, SortOrder};
use crate::value;

/// A lazy, use-once pipeline over a sequence of `T`.
///
/// Intermediate operations (`filter`, `map`, `sort`, ...) take the stream by
/// value and return it with a new stage attached; nothing is computed until a
/// terminal operation (`to_list`, `count`, `reduce`, ...) pulls the elements.
/// Terminal operations consume the stream and fire its close hooks exactly
/// once.
///
/// ```
/// use pipestream::Stream;
///
/// let squares = Stream::of(1..=10)
///     .filter(|n| n % 2 == 1)
///     .map(|n| n * n)
///     .to_list()?;
/// assert_eq!(squares, vec![1, 9, 25, 49, 81]);
/// # Ok::<(), pipestream::StreamError>(())
/// ```
#[must_use = "streams are lazy and do nothing unless a terminal operation runs"]
pub struct Stream<'a, T> {
    pub(crate) guard: Guard<'a, T>,
}

/// Validate a count argument. Negative or unrepresentable counts are rejected.
pub(crate) fn count_arg<N>(n: N, op: &str) -> Result<usize>
where
    N: TryInto<usize> + Copy + std::fmt::Display,
{
    n.try_into()
        .map_err(|_| StreamError::invalid(format!("{op} count must be non-negative, got {n}")))
}

/* ===================== constructors ===================== */

impl<'a, T: 'a> Stream<'a, T> {
    /// Stream over any iterable.
    pub fn of<I>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: 'a,
    {
        Self::from_seq(Box::new(items.into_iter()))
    }

    /// Stream over `items`, or an empty stream if any of them is absent.
    pub fn of_nullable<I>(items: I) -> Self
    where
        I: IntoIterator<Item = Option<T>>,
    {
        match items.into_iter().collect::<Option<Vec<T>>>() {
            Some(all) => Self::of(all),
            None => Self::empty(),
        }
    }

    pub fn empty() -> Self {
        Self::from_seq(Box::new(std::iter::empty()))
    }

    /// Infinite stream `seed, step(seed), step(step(seed)), ...`.
    pub fn iterate<F>(seed: T, step: F) -> Self
    where
        F: FnMut(&T) -> T + 'a,
    {
        Self::from_seq(Box::new(sequence::iterate(seed, step)))
    }

    /// Like [`Stream::iterate`], ending before the first value failing `condition`.
    pub fn iterate_while<F, P>(seed: T, step: F, condition: P) -> Self
    where
        F: FnMut(&T) -> T + 'a,
        P: FnMut(&T) -> bool + 'a,
    {
        Self::from_seq(Box::new(sequence::iterate_while(seed, step, condition)))
    }

    /// Infinite stream of values produced by `supplier`.
    pub fn generate<F>(supplier: F) -> Self
    where
        F: FnMut() -> T + 'a,
    {
        Self::from_seq(Box::new(sequence::generate(supplier)))
    }

    /// Infinite stream repeating `value`.
    pub fn constant(value: T) -> Self
    where
        T: Clone,
    {
        Self::from_seq(Box::new(std::iter::repeat(value)))
    }

    /// Concatenate streams in order. No streams gives an empty stream.
    pub fn concat_all<S>(streams: S) -> Self
    where
        S: IntoIterator<Item = Stream<'a, T>>,
    {
        streams
            .into_iter()
            .fold(Self::empty(), |acc, next| acc.concat_stream(next))
    }

    pub(crate) fn from_seq(seq: BoxedSeq<'a, T>) -> Self {
        Stream {
            guard: Guard::new(seq),
        }
    }

    pub(crate) fn failed(err: StreamError) -> Self {
        Stream {
            guard: Guard::poisoned(err),
        }
    }
}

impl<'a> Stream<'a, i64> {
    /// `start..stop` by `step`. A negative step counts down; a zero step
    /// poisons the stream with [`StreamError::InvalidArgument`].
    pub fn range(start: i64, stop: i64, step: i64) -> Self {
        match sequence::range(start, stop, step) {
            Ok(seq) => Self::from_seq(Box::new(seq)),
            Err(err) => Self::failed(err),
        }
    }

    pub fn from_range(range: Range<i64>) -> Self {
        Self::range(range.start, range.end, 1)
    }
}

impl<'a, K: 'a, V: 'a> Stream<'a, KeyValue<K, V>> {
    /// Stream the entries of a map-like source as [`KeyValue`] records.
    pub fn from_map<M>(map: M) -> Self
    where
        M: IntoIterator<Item = (K, V)>,
        M::IntoIter: 'a,
    {
        Self::of(map.into_iter().map(KeyValue::from))
    }

    /// Append the entries of a map-like source.
    pub fn concat_map<M>(self, map: M) -> Self
    where
        M: IntoIterator<Item = (K, V)>,
        M::IntoIter: 'a,
    {
        self.concat(map.into_iter().map(KeyValue::from))
    }
}

impl<'a> Stream<'a, KeyValue<String, Node>> {
    /// Stream a JSON object as records; nested objects become [`Node::Nested`].
    pub fn from_object(map: Map<String, Value>) -> Self {
        Self::of(records(map))
    }
}

impl<'a> Stream<'a, Value> {
    /// Stream a JSON document: the elements of an array, the entries of an
    /// object as `[key, value]` pairs, or a scalar on its own.
    pub fn from_json(doc: Value) -> Self {
        match doc {
            Value::Array(items) => Self::of(items),
            Value::Object(map) => Self::of(
                map.into_iter()
                    .map(|(k, v)| Value::Array(vec![Value::String(k), v])),
            ),
            scalar => Self::of([scalar]),
        }
    }

    /// Recursively flatten nested arrays; strings and objects stay whole.
    pub fn flatten(self) -> Self {
        self.pipe("flatten", value::flatten)
    }

    /// Flat-map with a mapper returning dynamic values. A result that is not an
    /// array stops the stream with [`StreamError::TypeMismatch`], reported by
    /// the terminal operation.
    pub fn flat_map_values<F>(self, mut mapper: F) -> Self
    where
        F: FnMut(Value) -> Value + 'a,
    {
        self.try_pipe("flat_map", move |seq, fault| {
            let fault = fault.clone();
            Ok(seq
                .map_while(move |v| match mapper(v) {
                    Value::Array(items) => Some(items),
                    other => {
                        fault.raise(StreamError::mismatch(format!(
                            "flat_map result is not iterable: {other}"
                        )));
                        None
                    }
                })
                .flatten())
        })
    }
}

/* ===================== intermediate operations ===================== */

impl<'a, T: 'a> Stream<'a, T> {
    pub(crate) fn pipe<U, I, F>(self, op: &'static str, f: F) -> Stream<'a, U>
    where
        U: 'a,
        I: Iterator<Item = U> + 'a,
        F: FnOnce(BoxedSeq<'a, T>) -> I,
    {
        Stream {
            guard: self
                .guard
                .intermediate(op, |seq, _| Ok(Box::new(f(seq)) as BoxedSeq<'a, U>)),
        }
    }

    pub(crate) fn try_pipe<U, I, F>(self, op: &'static str, f: F) -> Stream<'a, U>
    where
        U: 'a,
        I: Iterator<Item = U> + 'a,
        F: FnOnce(BoxedSeq<'a, T>, &Fault) -> Result<I>,
    {
        Stream {
            guard: self
                .guard
                .intermediate(op, |seq, fault| Ok(Box::new(f(seq, fault)?) as BoxedSeq<'a, U>)),
        }
    }

    /// Append the elements of `other`.
    pub fn concat<I>(self, other: I) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: 'a,
    {
        let other: BoxedSeq<'a, T> = Box::new(other.into_iter());
        self.pipe("concat", move |seq| sequence::concat([seq, other]))
    }

    /// Append another stream. Its close hooks join this stream's hooks.
    pub fn concat_stream(self, other: Stream<'a, T>) -> Self {
        Stream {
            guard: self.guard.combine(other.guard, "concat", |a, b| {
                Box::new(sequence::concat([a, b]))
            }),
        }
    }

    /// Put the elements of `other` in front of this stream's elements.
    pub fn prepend<I>(self, other: I) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: 'a,
    {
        let other: BoxedSeq<'a, T> = Box::new(other.into_iter());
        self.pipe("prepend", move |seq| sequence::concat([other, seq]))
    }

    pub fn filter<P>(self, predicate: P) -> Self
    where
        P: FnMut(&T) -> bool + 'a,
    {
        self.pipe("filter", move |seq| sequence::filter(seq, predicate))
    }

    pub fn map<U, F>(self, mapper: F) -> Stream<'a, U>
    where
        U: 'a,
        F: FnMut(T) -> U + 'a,
    {
        self.pipe("map", move |seq| sequence::map(seq, mapper))
    }

    /// Drop absent elements (and falsy ones when `discard_falsy` is set), then
    /// map what remains.
    ///
    /// ```
    /// use pipestream::Stream;
    ///
    /// let words = [None, Some("foo"), Some(""), Some("bar")];
    /// let kept = Stream::of(words).filter_map(|s| s.to_uppercase(), false).to_list()?;
    /// assert_eq!(kept, vec!["FOO", "", "BAR"]);
    /// let truthy = Stream::of(words).filter_map(|s| s.to_uppercase(), true).to_list()?;
    /// assert_eq!(truthy, vec!["FOO", "BAR"]);
    /// # Ok::<(), pipestream::StreamError>(())
    /// ```
    pub fn filter_map<U, F>(self, mapper: F, discard_falsy: bool) -> Stream<'a, U>
    where
        T: Nullable,
        U: 'a,
        F: FnMut(T::Inner) -> U + 'a,
    {
        self.pipe("filter_map", move |seq| {
            sequence::filter_map(seq, mapper, discard_falsy)
        })
    }

    pub fn flat_map<U, F>(self, mapper: F) -> Stream<'a, U::Item>
    where
        U: IntoIterator + 'a,
        U::IntoIter: 'a,
        U::Item: 'a,
        F: FnMut(T) -> U + 'a,
    {
        self.pipe("flat_map", move |seq| sequence::flat_map(seq, mapper))
    }

    /// Observe each element as it is pulled, without changing it.
    pub fn peek<F>(self, action: F) -> Self
    where
        F: FnMut(&T) + 'a,
    {
        self.pipe("peek", move |seq| sequence::peek(seq, action))
    }

    /// Keep the first occurrence of each value.
    pub fn distinct(self) -> Self
    where
        T: Eq + Hash + Clone,
    {
        self.pipe("distinct", sequence::distinct)
    }

    /// Discard the first `count` elements. A negative count poisons the
    /// stream with [`StreamError::InvalidArgument`].
    pub fn skip<N>(self, count: N) -> Self
    where
        N: TryInto<usize> + Copy + std::fmt::Display,
    {
        self.try_pipe("skip", move |seq, _| {
            Ok(sequence::skip(seq, count_arg(count, "skip")?))
        })
    }

    /// Keep at most the first `count` elements.
    pub fn limit<N>(self, count: N) -> Self
    where
        N: TryInto<usize> + Copy + std::fmt::Display,
    {
        self.try_pipe("limit", move |seq, _| {
            Ok(sequence::limit(seq, count_arg(count, "limit")?))
        })
    }

    /// Alias for [`Stream::limit`].
    pub fn head<N>(self, count: N) -> Self
    where
        N: TryInto<usize> + Copy + std::fmt::Display,
    {
        self.try_pipe("head", move |seq, _| {
            Ok(sequence::limit(seq, count_arg(count, "head")?))
        })
    }

    /// Keep only the last `count` elements.
    pub fn tail<N>(self, count: N) -> Self
    where
        N: TryInto<usize> + Copy + std::fmt::Display,
    {
        self.try_pipe("tail", move |seq, _| {
            Ok(sequence::tail(seq, count_arg(count, "tail")?))
        })
    }

    pub fn take_while<P>(self, predicate: P) -> Self
    where
        P: FnMut(&T) -> bool + 'a,
    {
        self.pipe("take_while", move |seq| sequence::take_while(seq, predicate))
    }

    pub fn drop_while<P>(self, predicate: P) -> Self
    where
        P: FnMut(&T) -> bool + 'a,
    {
        self.pipe("drop_while", move |seq| sequence::drop_while(seq, predicate))
    }

    /// Stable ascending sort by natural order.
    pub fn sort(self) -> Self
    where
        T: Ord,
    {
        self.pipe("sort", |seq| sequence::sort_by(seq, |a: &T, b: &T| a.cmp(b)))
    }

    /// Stable sort with a comparator.
    pub fn sort_by<C>(self, compare: C) -> Self
    where
        C: FnMut(&T, &T) -> std::cmp::Ordering + 'a,
    {
        self.pipe("sort", move |seq| sequence::sort_by(seq, compare))
    }

    /// Stable sort by an extracted key.
    pub fn sort_by_key<K, F>(self, key: F, order: SortOrder) -> Self
    where
        K: Ord + 'a,
        F: FnMut(&T) -> K + 'a,
    {
        self.pipe("sort", move |seq| sequence::sort_by_key(seq, key, order))
    }

    /// Stable descending sort by natural order.
    pub fn reverse(self) -> Self
    where
        T: Ord,
    {
        self.pipe("reverse", |seq| {
            sequence::sort_by(seq, |a: &T, b: &T| SortOrder::Descending.apply(a.cmp(b)))
        })
    }

    /// Pair each element with its index, counting from `start`.
    pub fn enumerate(self, start: usize) -> Stream<'a, (usize, T)> {
        self.pipe("enumerate", move |seq| sequence::enumerate(seq, start))
    }

    /// Register a hook fired once when the stream is closed, either by a
    /// terminal operation or by [`Stream::close`].
    pub fn on_close<F>(self, hook: F) -> Self
    where
        F: FnOnce() + 'a,
    {
        Stream {
            guard: self.guard.on_close(Box::new(hook)),
        }
    }

    /// Close the stream without running a terminal operation. Idempotent:
    /// hooks fire on the first call only. Any later operation fails with
    /// [`StreamError::IllegalState`].
    pub fn close(&mut self) {
        self.guard.close();
    }

    /// Whether the stream was closed or consumed.
    pub fn is_consumed(&self) -> bool {
        self.guard.is_consumed()
    }

    /// Detach the sequence for plain Rust iteration. This counts as the
    /// terminal operation; close hooks fire when the returned iterator is
    /// dropped.
    pub fn into_iter_checked(self) -> Result<Released<'a, T>> {
        self.guard.release("into_iter")
    }
}

impl<'a, T: 'a> FromIterator<T> for Stream<'a, T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Stream::of(iter.into_iter().collect::<Vec<_>>())
    }
}

impl<T> std::fmt::Debug for Stream<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stream")
            .field("consumed", &self.guard.is_consumed())
            .finish_non_exhaustive()
    }
}
