//! Terminal operations.
//!
//! Every method here takes the stream by value, pulls as many elements as it
//! needs, fires the close hooks, and returns a plain result. Element lookups
//! return `Option<T>` (the crate's value container, see
//! [`Optional`](crate::Optional)) rather than failing on an empty stream.

use std::cmp::Ordering;

use crate::error::{Result, StreamError};
use crate::sequence::Truthy;
use crate::value::Summable;
use crate::Stream;

/// Destination for [`Stream::save`].
///
/// Format-specific writers (JSON, CSV, ...) implement this outside the crate;
/// `Vec<T>` implements it for tests and in-memory capture.
pub trait Sink<T> {
    fn write_all(&mut self, items: &mut dyn Iterator<Item = T>) -> anyhow::Result<()>;
}

impl<T> Sink<T> for Vec<T> {
    fn write_all(&mut self, items: &mut dyn Iterator<Item = T>) -> anyhow::Result<()> {
        self.extend(items);
        Ok(())
    }
}

impl<'a, T: 'a> Stream<'a, T> {
    pub fn for_each<F>(self, action: F) -> Result<()>
    where
        F: FnMut(T),
    {
        self.guard.terminal("for_each", |seq| {
            seq.for_each(action);
            Ok(())
        })
    }

    pub fn count(self) -> Result<usize> {
        self.guard.terminal("count", |seq| Ok(seq.count()))
    }

    /// Fold the elements pairwise, starting from the first one. `None` for an
    /// empty stream.
    pub fn reduce<F>(self, accumulator: F) -> Result<Option<T>>
    where
        F: FnMut(T, T) -> T,
    {
        self.guard.terminal("reduce", |seq| Ok(seq.reduce(accumulator)))
    }

    /// Fold the elements starting from `identity`.
    ///
    /// ```
    /// use pipestream::Stream;
    ///
    /// assert_eq!(Stream::of([1, 2, 3]).fold(3, |acc, x| acc + x)?, 9);
    /// # Ok::<(), pipestream::StreamError>(())
    /// ```
    pub fn fold<U, F>(self, identity: U, accumulator: F) -> Result<U>
    where
        F: FnMut(U, T) -> U,
    {
        self.guard
            .terminal("reduce", |seq| Ok(seq.fold(identity, accumulator)))
    }

    /// Sum of the elements; zero for an empty stream.
    pub fn sum(self) -> Result<T>
    where
        T: Summable,
    {
        self.guard
            .terminal("sum", |mut seq| seq.try_fold(T::zero(), T::try_add))
    }

    /// Arithmetic mean of the elements; `0.0` for an empty stream.
    pub fn average(self) -> Result<f64>
    where
        T: Summable,
    {
        self.guard.terminal("average", |seq| {
            let mut count = 0usize;
            let mut total = 0.0;
            for item in seq {
                total += item.to_f64()?;
                count += 1;
            }
            Ok(if count == 0 { 0.0 } else { total / count as f64 })
        })
    }

    pub fn min(self) -> Result<Option<T>>
    where
        T: Ord,
    {
        self.guard.terminal("min", |seq| Ok(seq.min()))
    }

    pub fn max(self) -> Result<Option<T>>
    where
        T: Ord,
    {
        self.guard.terminal("max", |seq| Ok(seq.max()))
    }

    /// Smallest element by `compare`; the first one wins on ties.
    pub fn min_by<C>(self, compare: C) -> Result<Option<T>>
    where
        C: FnMut(&T, &T) -> Ordering,
    {
        self.guard.terminal("min", |seq| Ok(seq.min_by(compare)))
    }

    /// Largest element by `compare`; the last one wins on ties.
    pub fn max_by<C>(self, compare: C) -> Result<Option<T>>
    where
        C: FnMut(&T, &T) -> Ordering,
    {
        self.guard.terminal("max", |seq| Ok(seq.max_by(compare)))
    }

    pub fn min_by_key<K, F>(self, key: F) -> Result<Option<T>>
    where
        K: Ord,
        F: FnMut(&T) -> K,
    {
        self.guard.terminal("min", |seq| Ok(seq.min_by_key(key)))
    }

    pub fn max_by_key<K, F>(self, key: F) -> Result<Option<T>>
    where
        K: Ord,
        F: FnMut(&T) -> K,
    {
        self.guard.terminal("max", |seq| Ok(seq.max_by_key(key)))
    }

    pub fn find_first(self) -> Result<Option<T>> {
        self.guard.terminal("find_first", |mut seq| Ok(seq.next()))
    }

    /// Some element of the stream. Execution is sequential, so this is
    /// always the first one.
    pub fn find_any(self) -> Result<Option<T>> {
        self.guard.terminal("find_any", |mut seq| Ok(seq.next()))
    }

    /// First element matching `predicate`.
    pub fn find<P>(self, mut predicate: P) -> Result<Option<T>>
    where
        P: FnMut(&T) -> bool,
    {
        self.guard
            .terminal("find_first", |mut seq| Ok(seq.find(|item| predicate(item))))
    }

    pub fn take_first(self) -> Result<Option<T>> {
        self.guard.terminal("take_first", |mut seq| Ok(seq.next()))
    }

    pub fn take_last(self) -> Result<Option<T>> {
        self.guard.terminal("take_last", |seq| Ok(seq.last()))
    }

    /// Element at `index`; a negative index counts from the end.
    pub fn take_nth(self, index: isize) -> Result<Option<T>> {
        self.guard.terminal("take_nth", |mut seq| {
            if index >= 0 {
                return Ok(seq.nth(index.unsigned_abs()));
            }
            let mut all: Vec<T> = seq.collect();
            let back = index.unsigned_abs();
            if back > all.len() {
                return Ok(None);
            }
            Ok(Some(all.swap_remove(all.len() - back)))
        })
    }

    pub fn any_match<P>(self, predicate: P) -> Result<bool>
    where
        P: FnMut(T) -> bool,
    {
        self.guard
            .terminal("any_match", |mut seq| Ok(seq.any(predicate)))
    }

    pub fn all_match<P>(self, predicate: P) -> Result<bool>
    where
        P: FnMut(T) -> bool,
    {
        self.guard
            .terminal("all_match", |mut seq| Ok(seq.all(predicate)))
    }

    pub fn none_match<P>(self, mut predicate: P) -> Result<bool>
    where
        P: FnMut(T) -> bool,
    {
        self.guard
            .terminal("none_match", |mut seq| Ok(!seq.any(|item| predicate(item))))
    }

    /// Whether this stream and `other` hold equal elements in the same order.
    pub fn compare_with<I>(self, other: I) -> Result<bool>
    where
        I: IntoIterator<Item = T>,
        T: PartialEq,
    {
        self.compare_with_by(other, |a, b| a == b)
    }

    /// Like [`Stream::compare_with`] with a custom element comparison.
    pub fn compare_with_by<I, C>(self, other: I, mut same: C) -> Result<bool>
    where
        I: IntoIterator,
        C: FnMut(&T, &I::Item) -> bool,
    {
        self.guard.terminal("compare_with", |mut seq| {
            let mut other = other.into_iter();
            loop {
                match (seq.next(), other.next()) {
                    (None, None) => return Ok(true),
                    (Some(a), Some(b)) if same(&a, &b) => continue,
                    _ => return Ok(false),
                }
            }
        })
    }

    /// Number of elements satisfying `predicate`.
    pub fn quantify<P>(self, mut predicate: P) -> Result<usize>
    where
        P: FnMut(&T) -> bool,
    {
        self.guard
            .terminal("quantify", |seq| Ok(seq.filter(|item| predicate(item)).count()))
    }

    /// Number of truthy elements.
    pub fn quantify_truthy(self) -> Result<usize>
    where
        T: Truthy,
    {
        self.quantify(Truthy::is_truthy)
    }

    /// Split into elements matching and not matching `predicate`.
    pub fn partition<P>(self, predicate: P) -> Result<(Vec<T>, Vec<T>)>
    where
        P: FnMut(&T) -> bool,
    {
        self.guard
            .terminal("partition", |seq| Ok(seq.partition(predicate)))
    }

    /// Write every element to `sink`.
    pub fn save<S>(self, sink: &mut S) -> Result<()>
    where
        S: Sink<T> + ?Sized,
    {
        self.guard.terminal("save", |mut seq| {
            sink.write_all(&mut seq)
                .map_err(|err| StreamError::external("save", err))
        })
    }
}
