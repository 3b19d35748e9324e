//! Lazy sequence generators.
//!
//! Stateless building blocks the [`Stream`](crate::Stream) façade composes.
//! Each function takes an input iterator by value and returns a new lazy
//! iterator; nothing is pulled from the input until the result is iterated.
//!
//! All of them assume a single forward pass over their input. Stages that
//! need the whole input before producing anything ([`tail`], [`sort_by`])
//! defer that work until the first element is requested.
//!
//! ```
//! use pipestream::sequence;
//!
//! let evens = sequence::filter(1..=10, |n: &i32| n % 2 == 0);
//! let last_two: Vec<_> = sequence::tail(evens, 2).collect();
//! assert_eq!(last_two, vec![8, 10]);
//! ```

use std::cmp::Ordering;
use std::collections::{HashSet, VecDeque};
use std::hash::Hash;
use std::iter::FusedIterator;

use crate::error::{Result, StreamError};

/// A boxed, type-erased lazy sequence.
pub type BoxedSeq<'a, T> = Box<dyn Iterator<Item = T> + 'a>;

/// Keep the elements matching `predicate`.
pub fn filter<I, P>(seq: I, predicate: P) -> impl Iterator<Item = I::Item>
where
    I: Iterator,
    P: FnMut(&I::Item) -> bool,
{
    seq.filter(predicate)
}

/// Apply `mapper` to every element.
pub fn map<I, U, F>(seq: I, mapper: F) -> impl Iterator<Item = U>
where
    I: Iterator,
    F: FnMut(I::Item) -> U,
{
    seq.map(mapper)
}

/// Skip absent elements (or every falsy element when `discard_falsy` is set),
/// then apply `mapper` to what is left.
pub fn filter_map<I, U, F>(seq: I, mut mapper: F, discard_falsy: bool) -> impl Iterator<Item = U>
where
    I: Iterator,
    I::Item: Nullable,
    F: FnMut(<I::Item as Nullable>::Inner) -> U,
{
    seq.filter_map(move |item| {
        if discard_falsy && !item.is_truthy() {
            return None;
        }
        item.into_inner().map(&mut mapper)
    })
}

/// Concatenate the sequences produced by `mapper`.
pub fn flat_map<I, U, F>(seq: I, mapper: F) -> impl Iterator<Item = U::Item>
where
    I: Iterator,
    U: IntoIterator,
    F: FnMut(I::Item) -> U,
{
    seq.flat_map(mapper)
}

/// Pass elements through unchanged, calling `action` once per element as it
/// is pulled downstream.
pub fn peek<I, F>(seq: I, action: F) -> impl Iterator<Item = I::Item>
where
    I: Iterator,
    F: FnMut(&I::Item),
{
    seq.inspect(action)
}

/// First occurrence of every value, in encounter order.
pub fn distinct<I>(seq: I) -> Distinct<I>
where
    I: Iterator,
    I::Item: Eq + Hash + Clone,
{
    Distinct {
        seq,
        seen: HashSet::new(),
    }
}

/// Iterator returned by [`distinct`].
pub struct Distinct<I: Iterator> {
    seq: I,
    seen: HashSet<I::Item>,
}

impl<I> Iterator for Distinct<I>
where
    I: Iterator,
    I::Item: Eq + Hash + Clone,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        let seen = &mut self.seen;
        self.seq.find(|item| seen.insert(item.clone()))
    }
}

/// Drop the first `count` elements.
pub fn skip<I: Iterator>(seq: I, count: usize) -> impl Iterator<Item = I::Item> {
    seq.skip(count)
}

/// Keep at most the first `count` elements.
pub fn limit<I: Iterator>(seq: I, count: usize) -> impl Iterator<Item = I::Item> {
    seq.take(count)
}

/// Keep only the last `count` elements.
///
/// At most `count` elements are buffered; older ones are evicted as newer
/// ones arrive.
pub fn tail<I: Iterator>(seq: I, count: usize) -> Tail<I> {
    Tail {
        seq: Some(seq),
        count,
        buffer: VecDeque::new(),
    }
}

/// Iterator returned by [`tail`].
pub struct Tail<I: Iterator> {
    seq: Option<I>,
    count: usize,
    buffer: VecDeque<I::Item>,
}

impl<I: Iterator> Iterator for Tail<I> {
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(seq) = self.seq.take() {
            if self.count > 0 {
                for item in seq {
                    if self.buffer.len() == self.count {
                        self.buffer.pop_front();
                    }
                    self.buffer.push_back(item);
                }
            }
        }
        self.buffer.pop_front()
    }
}

impl<I: Iterator> FusedIterator for Tail<I> {}

/// Yield elements while `predicate` holds, then stop for good.
pub fn take_while<I, P>(seq: I, predicate: P) -> impl Iterator<Item = I::Item>
where
    I: Iterator,
    P: FnMut(&I::Item) -> bool,
{
    seq.take_while(predicate)
}

/// Discard elements while `predicate` holds; the predicate is never consulted
/// again after its first failure.
pub fn drop_while<I, P>(seq: I, predicate: P) -> impl Iterator<Item = I::Item>
where
    I: Iterator,
    P: FnMut(&I::Item) -> bool,
{
    seq.skip_while(predicate)
}

/// Stable sort with `compare`. The input is materialized on the first pull.
pub fn sort_by<I, C>(seq: I, compare: C) -> Sorted<I, C>
where
    I: Iterator,
    C: FnMut(&I::Item, &I::Item) -> Ordering,
{
    Sorted {
        state: SortState::Pending(seq, compare),
    }
}

/// Stable sort by an extracted key, ascending or descending.
pub fn sort_by_key<I, K, F>(
    seq: I,
    mut key: F,
    order: SortOrder,
) -> Sorted<I, impl FnMut(&I::Item, &I::Item) -> Ordering>
where
    I: Iterator,
    K: Ord,
    F: FnMut(&I::Item) -> K,
{
    sort_by(seq, move |a, b| order.apply(key(a).cmp(&key(b))))
}

/// Direction of a sort.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    /// Orient an ascending comparison result. Equal stays equal, so a
    /// descending sort keeps equal elements in encounter order.
    pub fn apply(self, ord: Ordering) -> Ordering {
        match self {
            SortOrder::Ascending => ord,
            SortOrder::Descending => ord.reverse(),
        }
    }
}

/// Iterator returned by [`sort_by`].
pub struct Sorted<I: Iterator, C> {
    state: SortState<I, C>,
}

enum SortState<I: Iterator, C> {
    Pending(I, C),
    Draining(std::vec::IntoIter<I::Item>),
}

impl<I, C> Iterator for Sorted<I, C>
where
    I: Iterator,
    C: FnMut(&I::Item, &I::Item) -> Ordering,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        let drained = std::mem::replace(&mut self.state, SortState::Draining(Vec::new().into_iter()));
        let mut items = match drained {
            SortState::Pending(seq, mut compare) => {
                let mut all: Vec<I::Item> = seq.collect();
                all.sort_by(&mut compare);
                all.into_iter()
            }
            SortState::Draining(items) => items,
        };
        let next = items.next();
        self.state = SortState::Draining(items);
        next
    }
}

/// Pair every element with its index, counting from `start`. Stops once the
/// index no longer fits in a `usize`.
pub fn enumerate<I: Iterator>(seq: I, start: usize) -> impl Iterator<Item = (usize, I::Item)> {
    seq.enumerate()
        .map_while(move |(i, item)| start.checked_add(i).map(|n| (n, item)))
}

/// Chain sequences one after another.
pub fn concat<S>(sequences: S) -> impl Iterator<Item = <S::Item as IntoIterator>::Item>
where
    S: IntoIterator,
    S::Item: IntoIterator,
{
    sequences.into_iter().flatten()
}

/// `seed, f(seed), f(f(seed)), ...` forever.
pub fn iterate<T, F>(seed: T, mut step: F) -> impl Iterator<Item = T>
where
    F: FnMut(&T) -> T,
{
    std::iter::successors(Some(seed), move |prev| Some(step(prev)))
}

/// Like [`iterate`], but stops at the first value for which `condition` is false.
pub fn iterate_while<T, F, P>(seed: T, step: F, condition: P) -> impl Iterator<Item = T>
where
    F: FnMut(&T) -> T,
    P: FnMut(&T) -> bool,
{
    iterate(seed, step).take_while(condition)
}

/// Infinite sequence of values produced by `supplier`.
pub fn generate<T, F: FnMut() -> T>(supplier: F) -> impl Iterator<Item = T> {
    std::iter::repeat_with(supplier)
}

/// `start..stop` by `step`; a negative step counts down. A zero step is rejected.
pub fn range(start: i64, stop: i64, step: i64) -> Result<impl Iterator<Item = i64>> {
    if step == 0 {
        return Err(StreamError::invalid("range step must not be zero"));
    }
    let mut next = start;
    Ok(std::iter::from_fn(move || {
        let live = if step > 0 { next < stop } else { next > stop };
        if !live {
            return None;
        }
        let current = next;
        next = next.saturating_add(step);
        Some(current)
    }))
}

/// Truthiness, as used by `filter_map(.., discard_falsy = true)` and `quantify`.
///
/// Zero numbers, empty strings and collections, `false`, and absent values are
/// falsy; everything else is truthy.
pub trait Truthy {
    fn is_truthy(&self) -> bool;
}

macro_rules! truthy_numbers {
    ($($t:ty),*) => {
        $(impl Truthy for $t {
            fn is_truthy(&self) -> bool {
                *self != (0 as $t)
            }
        })*
    };
}

truthy_numbers!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64);

impl Truthy for bool {
    fn is_truthy(&self) -> bool {
        *self
    }
}

impl Truthy for String {
    fn is_truthy(&self) -> bool {
        !self.is_empty()
    }
}

impl Truthy for &str {
    fn is_truthy(&self) -> bool {
        !self.is_empty()
    }
}

impl<T> Truthy for Vec<T> {
    fn is_truthy(&self) -> bool {
        !self.is_empty()
    }
}

impl<T: Truthy> Truthy for Option<T> {
    fn is_truthy(&self) -> bool {
        self.as_ref().is_some_and(Truthy::is_truthy)
    }
}

/// An element that may be absent. [`filter_map`] unwraps present values and
/// drops absent ones.
pub trait Nullable: Truthy {
    type Inner;

    fn into_inner(self) -> Option<Self::Inner>;
}

impl<T: Truthy> Nullable for Option<T> {
    type Inner = T;

    fn into_inner(self) -> Option<T> {
        self
    }
}
