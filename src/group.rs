//! Streaming group-by.
//!
//! [`GroupBy`] partitions a single-pass sequence into maximal contiguous runs
//! of elements that share a classifier key, without materializing the input.
//! Each run is handed out as a `(key, Group)` pair; the [`Group`] is a lazy
//! iterator that reads straight from the shared cursor.
//!
//! Because all groups share one cursor, only the most recently produced group
//! is live. Asking for the next group first drains whatever is left of the
//! live one, so a caller that abandons a group half-way never sees its
//! leftovers mixed into the next group, and never loses the next group's
//! first element. A group that is no longer live yields nothing.
//!
//! ```
//! use pipestream::group::group_by;
//!
//! let groups = group_by("AAAABBBCCD".chars(), |c| *c);
//! let mut keys = Vec::new();
//! for (key, group) in &groups {
//!     keys.push((key, group.count()));
//! }
//! assert_eq!(keys, vec![('A', 4), ('B', 3), ('C', 2), ('D', 1)]);
//! ```
//!
//! On a [`Stream`] the same engine backs the terminal operations
//! [`Stream::group_by`], [`Stream::group_by_identity`] and
//! [`Stream::group_by_with`], plus [`Stream::into_groups`] for lazy access.

use std::cell::RefCell;
use std::collections::HashMap;
use std::hash::Hash;

use crate::error::{Result, StreamError};
use crate::guard::Released;
use crate::Stream;

/// Group the contiguous runs of `iter` by `classifier`.
pub fn group_by<I, K, F>(iter: I, classifier: F) -> GroupBy<I::IntoIter, K, F>
where
    I: IntoIterator,
    K: PartialEq + Clone,
    F: FnMut(&I::Item) -> K,
{
    GroupBy {
        cursor: RefCell::new(Cursor {
            iter: iter.into_iter(),
            classifier,
            pending: None,
            current_key: None,
            head: None,
            index: 0,
            group_done: true,
            exhausted: false,
        }),
    }
}

/// The grouping cursor. See the [module docs](self).
pub struct GroupBy<I: Iterator, K, F> {
    cursor: RefCell<Cursor<I, K, F>>,
}

struct Cursor<I: Iterator, K, F> {
    iter: I,
    classifier: F,
    /// First element of the next group, pulled while looking for the end of
    /// the current one.
    pending: Option<(K, I::Item)>,
    current_key: Option<K>,
    /// First element of the live group, not yet handed to the caller.
    head: Option<I::Item>,
    /// Number of groups produced so far; the live group has this index.
    index: usize,
    group_done: bool,
    exhausted: bool,
}

impl<I, K, F> Cursor<I, K, F>
where
    I: Iterator,
    K: PartialEq,
    F: FnMut(&I::Item) -> K,
{
    /// Next element of the live group, or `None` once the run has ended.
    fn step(&mut self) -> Option<I::Item> {
        if self.group_done {
            return None;
        }
        if let Some(first) = self.head.take() {
            return Some(first);
        }
        let Some(item) = self.iter.next() else {
            self.exhausted = true;
            self.group_done = true;
            return None;
        };
        let key = (self.classifier)(&item);
        if self.current_key.as_ref() == Some(&key) {
            Some(item)
        } else {
            self.pending = Some((key, item));
            self.group_done = true;
            None
        }
    }

    fn start_next(&mut self) -> Option<K>
    where
        K: Clone,
    {
        while self.step().is_some() {}
        let (key, first) = match self.pending.take() {
            Some(next) => next,
            None if self.exhausted => return None,
            None => match self.iter.next() {
                Some(item) => ((self.classifier)(&item), item),
                None => {
                    self.exhausted = true;
                    return None;
                }
            },
        };
        self.current_key = Some(key.clone());
        self.head = Some(first);
        self.index += 1;
        self.group_done = false;
        Some(key)
    }
}

impl<I, K, F> GroupBy<I, K, F>
where
    I: Iterator,
    K: PartialEq + Clone,
    F: FnMut(&I::Item) -> K,
{
    /// Advance to the next group, draining the live one first.
    pub fn next_group(&self) -> Option<(K, Group<'_, I, K, F>)> {
        let mut cursor = self.cursor.borrow_mut();
        let key = cursor.start_next()?;
        let index = cursor.index;
        Some((key, Group { parent: self, index }))
    }
}

impl<'p, I, K, F> IntoIterator for &'p GroupBy<I, K, F>
where
    I: Iterator,
    K: PartialEq + Clone,
    F: FnMut(&I::Item) -> K,
{
    type Item = (K, Group<'p, I, K, F>);
    type IntoIter = Groups<'p, I, K, F>;

    fn into_iter(self) -> Self::IntoIter {
        Groups { parent: self }
    }
}

/// Iterator over the `(key, group)` pairs of a [`GroupBy`].
pub struct Groups<'p, I: Iterator, K, F> {
    parent: &'p GroupBy<I, K, F>,
}

impl<'p, I, K, F> Iterator for Groups<'p, I, K, F>
where
    I: Iterator,
    K: PartialEq + Clone,
    F: FnMut(&I::Item) -> K,
{
    type Item = (K, Group<'p, I, K, F>);

    fn next(&mut self) -> Option<Self::Item> {
        self.parent.next_group()
    }
}

/// One contiguous run of equal keys. Yields nothing once a later group has
/// been requested.
pub struct Group<'p, I: Iterator, K, F> {
    parent: &'p GroupBy<I, K, F>,
    index: usize,
}

impl<I, K, F> Iterator for Group<'_, I, K, F>
where
    I: Iterator,
    K: PartialEq,
    F: FnMut(&I::Item) -> K,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<I::Item> {
        let mut cursor = self.parent.cursor.borrow_mut();
        if cursor.index != self.index {
            return None;
        }
        cursor.step()
    }
}

/// Result of a [`Stream::group_by_with`] collector for one group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GroupValue<V> {
    /// Appended to whatever list is already stored under the key.
    Many(Vec<V>),
    /// Replaces whatever is stored under the key.
    One(V),
}

impl<'a, T: 'a> Stream<'a, T> {
    /// Group contiguous runs by `classifier`, materializing each group.
    ///
    /// Entries keep the order in which their runs appear. A key that occurs
    /// in several separate runs gets one entry per run; use
    /// [`Stream::group_by_with`] to merge them.
    ///
    /// # Example
    /// ```
    /// use pipestream::Stream;
    ///
    /// let parity = Stream::of([1, 3, 2, 4, 5]).group_by(|n| n % 2)?;
    /// assert_eq!(parity, vec![(1, vec![1, 3]), (0, vec![2, 4]), (1, vec![5])]);
    /// # Ok::<(), pipestream::StreamError>(())
    /// ```
    pub fn group_by<K, F>(self, classifier: F) -> Result<Vec<(K, Vec<T>)>>
    where
        K: PartialEq + Clone,
        F: FnMut(&T) -> K,
    {
        self.guard.terminal("group_by", |seq| {
            let groups = group_by(seq, classifier);
            let out = (&groups)
                .into_iter()
                .map(|(key, group)| (key, group.collect()))
                .collect();
            Ok(out)
        })
    }

    /// [`Stream::group_by`] keyed by the elements themselves.
    pub fn group_by_identity(self) -> Result<Vec<(T, Vec<T>)>>
    where
        T: PartialEq + Clone,
    {
        self.group_by(T::clone)
    }

    /// Group contiguous runs, then pass each `(key, group)` through
    /// `collector`, which picks the final key and value.
    ///
    /// A [`GroupValue::Many`] result is appended to the list already stored
    /// under the final key (or starts one); a [`GroupValue::One`] result
    /// replaces it. Final keys keep first-seen order.
    ///
    /// # Errors
    /// [`StreamError::TypeMismatch`] when `Many` would be appended to a key
    /// that holds a single `One` value.
    ///
    /// # Example
    /// ```
    /// use pipestream::{GroupValue, Stream};
    ///
    /// let merged = Stream::of("AABAAC".chars())
    ///     .group_by_with(|c| *c, |k, g| (k, GroupValue::Many(g)))?;
    /// assert_eq!(merged[0], ('A', GroupValue::Many(vec!['A'; 4])));
    /// # Ok::<(), pipestream::StreamError>(())
    /// ```
    pub fn group_by_with<K, F, K2, V, C>(
        self,
        classifier: F,
        mut collector: C,
    ) -> Result<Vec<(K2, GroupValue<V>)>>
    where
        K: PartialEq + Clone,
        F: FnMut(&T) -> K,
        K2: Eq + Hash + Clone + std::fmt::Debug,
        C: FnMut(K, Vec<T>) -> (K2, GroupValue<V>),
    {
        self.guard.terminal("group_by", |seq| {
            let groups = group_by(seq, classifier);
            let mut out: Vec<(K2, GroupValue<V>)> = Vec::new();
            let mut slots: HashMap<K2, usize> = HashMap::new();
            for (key, group) in &groups {
                let (key, value) = collector(key, group.collect());
                let Some(&slot) = slots.get(&key) else {
                    slots.insert(key.clone(), out.len());
                    out.push((key, value));
                    continue;
                };
                let stored = &mut out[slot].1;
                match (stored, value) {
                    (GroupValue::Many(existing), GroupValue::Many(more)) => existing.extend(more),
                    (GroupValue::One(_), GroupValue::Many(_)) => {
                        return Err(StreamError::mismatch(format!(
                            "cannot append a group to the single value stored under {key:?}"
                        )));
                    }
                    (stored, one @ GroupValue::One(_)) => *stored = one,
                }
            }
            Ok(out)
        })
    }

    /// Hand out the lazy grouping cursor itself. Counts as the terminal
    /// operation; close hooks fire when the cursor is dropped.
    pub fn into_groups<K, F>(self, classifier: F) -> Result<GroupBy<Released<'a, T>, K, F>>
    where
        K: PartialEq + Clone,
        F: FnMut(&T) -> K,
    {
        let released = self.guard.release("group_by")?;
        Ok(group_by(released, classifier))
    }
}
