//! Extra combinators in the style of the classic itertools recipes.
//!
//! Stages that need to know the length of their input (`view` with negative
//! indices, `subslices`, `ncycles`, `unique`) buffer it when the first element
//! is pulled, never earlier.

use std::collections::{HashSet, VecDeque};
use std::hash::Hash;

use crate::error::{Result, StreamError};
use crate::guard::Fault;
use crate::sequence::{self, BoxedSeq, SortOrder};
use crate::stream::count_arg;
use crate::Stream;

/// What [`Stream::grouper`] does with a final chunk shorter than `n`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChunkPolicy<T> {
    /// Pad the chunk with copies of the value.
    Fill(T),
    /// Fail with [`StreamError::InvalidArgument`] when the short chunk is reached.
    Strict,
    /// Drop the short chunk.
    Ignore,
}

impl<T> ChunkPolicy<T> {
    /// Policy from a flag name: `"fill"` (needs `fill_value`), `"strict"` or
    /// `"ignore"`.
    pub fn parse(flag: &str, fill_value: Option<T>) -> Result<Self> {
        match (flag, fill_value) {
            ("fill", Some(value)) => Ok(Self::Fill(value)),
            ("fill", None) => Err(StreamError::invalid("'fill' policy needs a fill value")),
            ("strict", _) => Ok(Self::Strict),
            ("ignore", _) => Ok(Self::Ignore),
            (other, _) => Err(StreamError::invalid(format!(
                "invalid incomplete flag '{other}', expected: 'fill', 'strict', or 'ignore'"
            ))),
        }
    }
}

/// Run `f` over the whole input, but only once the first element is wanted.
fn deferred<'a, T, I, F>(seq: BoxedSeq<'a, T>, f: F) -> impl Iterator<Item = I::Item> + 'a
where
    T: 'a,
    I: IntoIterator,
    I::IntoIter: 'a,
    F: FnOnce(Vec<T>) -> I + 'a,
{
    std::iter::once_with(move || f(seq.collect())).flatten()
}

/// Resolve a possibly negative index against `len`, clamped to `0..=len`.
fn resolve(index: isize, len: usize) -> usize {
    if index < 0 {
        len.saturating_sub(index.unsigned_abs())
    } else {
        index.unsigned_abs().min(len)
    }
}

impl<'a, T: 'a> Stream<'a, T> {
    /// Stream `f(start), f(start + 1), ...`, ending only when the index
    /// would pass `i64::MAX`.
    pub fn tabulate<F>(mut f: F, start: i64) -> Self
    where
        F: FnMut(i64) -> T + 'a,
    {
        Self::of(std::iter::successors(Some(start), |i| i.checked_add(1)).map(move |i| f(i)))
    }

    /// Repeat the whole stream `count` times.
    pub fn ncycles(self, count: usize) -> Self
    where
        T: Clone,
    {
        self.pipe("ncycles", move |seq| {
            deferred(seq, move |saved: Vec<T>| {
                (0..count).flat_map(move |_| saved.clone())
            })
        })
    }

    /// Skip ahead `count` elements, or discard everything when `count` is
    /// `None`. A negative count poisons the stream.
    pub fn consume(self, count: Option<i64>) -> Self {
        self.try_pipe("consume", move |seq, _| {
            let skip = match count {
                Some(n) => Some(count_arg(n, "consume")?),
                None => None,
            };
            Ok(deferred_skip(seq, skip))
        })
    }

    /// Slice the stream by position. Negative `start`/`stop` count from
    /// the end, which buffers the input; `step` must be positive.
    ///
    /// ```
    /// use pipestream::Stream;
    ///
    /// assert_eq!(Stream::of(0..10).view(-4, Some(-1), None).to_list()?, vec![6, 7, 8]);
    /// assert_eq!(Stream::of(0..10).view(1, Some(8), Some(3)).to_list()?, vec![1, 4, 7]);
    /// # Ok::<(), pipestream::StreamError>(())
    /// ```
    pub fn view(self, start: isize, stop: Option<isize>, step: Option<isize>) -> Self {
        self.try_pipe("view", move |seq, _| {
            let step = match step {
                None => 1,
                Some(s) if s > 0 => s.unsigned_abs(),
                Some(s) => {
                    return Err(StreamError::invalid(format!(
                        "view step must be a positive integer, got {s}"
                    )));
                }
            };
            let relative = start < 0 || stop.is_some_and(|s| s < 0);
            let out: BoxedSeq<'a, T> = if relative {
                Box::new(deferred(seq, move |all: Vec<T>| {
                    let len = all.len();
                    let from = resolve(start, len);
                    let to = stop.map_or(len, |s| resolve(s, len)).max(from);
                    all.into_iter().take(to).skip(from).step_by(step)
                }))
            } else {
                let from = start.unsigned_abs();
                let bounded: BoxedSeq<'a, T> = match stop {
                    Some(s) => Box::new(seq.take(s.unsigned_abs())),
                    None => seq,
                };
                Box::new(bounded.skip(from).step_by(step))
            };
            Ok(out)
        })
    }

    /// Distinct elements in sorted order.
    pub fn unique(self, order: SortOrder) -> Self
    where
        T: Ord,
    {
        self.pipe("unique", move |seq| {
            deferred(seq, move |mut all: Vec<T>| {
                all.sort_by(|a, b| order.apply(a.cmp(b)));
                all.dedup();
                all
            })
        })
    }

    /// Drop elements equal to the one just before them.
    pub fn unique_just_seen(self) -> Self
    where
        T: PartialEq + Clone,
    {
        self.unique_just_seen_by(T::clone)
    }

    /// Drop elements whose key equals the key of the element just before.
    pub fn unique_just_seen_by<K, F>(self, mut key: F) -> Self
    where
        K: PartialEq + 'a,
        F: FnMut(&T) -> K + 'a,
    {
        let mut last: Option<K> = None;
        self.pipe("unique_just_seen", move |seq| {
            seq.filter(move |item| {
                let k = key(item);
                if last.as_ref() == Some(&k) {
                    return false;
                }
                last = Some(k);
                true
            })
        })
    }

    /// Keep the first element for every distinct key.
    pub fn unique_ever_seen_by<K, F>(self, mut key: F) -> Self
    where
        K: Eq + Hash + 'a,
        F: FnMut(&T) -> K + 'a,
    {
        let mut seen = HashSet::new();
        self.pipe("unique_ever_seen", move |seq| {
            seq.filter(move |item| seen.insert(key(item)))
        })
    }

    /// Overlapping windows of `size` consecutive elements.
    ///
    /// ```
    /// use pipestream::Stream;
    ///
    /// let windows = Stream::of("abcd".chars()).sliding_window(3).to_list()?;
    /// assert_eq!(windows, vec![vec!['a', 'b', 'c'], vec!['b', 'c', 'd']]);
    /// # Ok::<(), pipestream::StreamError>(())
    /// ```
    pub fn sliding_window<N>(self, size: N) -> Stream<'a, Vec<T>>
    where
        T: Clone,
        N: TryInto<usize> + Copy + std::fmt::Display,
    {
        self.try_pipe("sliding_window", move |seq, _| {
            let size = count_arg(size, "sliding_window")?;
            if size == 0 {
                return Err(StreamError::invalid("sliding_window size must be positive"));
            }
            let mut window: VecDeque<T> = VecDeque::with_capacity(size);
            Ok(seq.filter_map(move |item| {
                if window.len() == size {
                    window.pop_front();
                }
                window.push_back(item);
                (window.len() == size).then(|| window.iter().cloned().collect())
            }))
        })
    }

    /// Non-overlapping chunks of `size` elements; `policy` decides what
    /// happens to a short final chunk.
    pub fn grouper<N>(self, size: N, policy: ChunkPolicy<T>) -> Stream<'a, Vec<T>>
    where
        T: Clone,
        N: TryInto<usize> + Copy + std::fmt::Display,
    {
        self.try_pipe("grouper", move |seq, fault| {
            let size = count_arg(size, "grouper")?;
            if size == 0 {
                return Err(StreamError::invalid("grouper size must be positive"));
            }
            Ok(Chunks {
                seq,
                size,
                policy,
                fault: fault.clone(),
            })
        })
    }

    /// Indices of the elements equal to `value`, looking only at positions
    /// `start..stop`.
    pub fn find_indices(self, value: T, start: usize, stop: Option<usize>) -> Stream<'a, usize>
    where
        T: PartialEq,
    {
        self.pipe("find_indices", move |seq| {
            let bounded: BoxedSeq<'a, T> = match stop {
                Some(stop) => Box::new(seq.take(stop)),
                None => seq,
            };
            sequence::enumerate(bounded, 0)
                .skip(start)
                .filter_map(move |(i, item)| (item == value).then_some(i))
        })
    }

    /// Every contiguous non-empty slice, shortest-start first.
    ///
    /// ```
    /// use pipestream::Stream;
    ///
    /// let slices = Stream::of([1, 2, 3]).subslices().to_list()?;
    /// assert_eq!(slices, vec![vec![1], vec![1, 2], vec![1, 2, 3], vec![2], vec![2, 3], vec![3]]);
    /// # Ok::<(), pipestream::StreamError>(())
    /// ```
    pub fn subslices(self) -> Stream<'a, Vec<T>>
    where
        T: Clone,
    {
        self.pipe("subslices", |seq| {
            deferred(seq, |all: Vec<T>| {
                let len = all.len();
                (0..len).flat_map(move |i| {
                    let all = all.clone();
                    (i + 1..=len).map(move |j| all[i..j].to_vec())
                })
            })
        })
    }

    /// Whether all elements are equal. True for an empty stream.
    pub fn all_equal(self) -> Result<bool>
    where
        T: PartialEq,
    {
        self.guard.terminal("all_equal", |mut seq| {
            let Some(first) = seq.next() else {
                return Ok(true);
            };
            Ok(seq.all(|item| item == first))
        })
    }

    /// Whether all elements map to the same key.
    pub fn all_equal_by<K, F>(self, mut key: F) -> Result<bool>
    where
        K: PartialEq,
        F: FnMut(&T) -> K,
    {
        self.guard.terminal("all_equal", |mut seq| {
            let Some(first) = seq.next().map(|item| key(&item)) else {
                return Ok(true);
            };
            Ok(seq.all(|item| key(&item) == first))
        })
    }
}

impl<'a, T> Stream<'a, T>
where
    T: IntoIterator + 'a,
    T::IntoIter: 'a,
    T::Item: 'a,
{
    /// Visit the inner sequences in turn, one element from each, until all
    /// are exhausted.
    ///
    /// ```
    /// use pipestream::Stream;
    ///
    /// let mixed = Stream::of([vec![1, 4, 6], vec![2], vec![3, 5]]).round_robin().to_list()?;
    /// assert_eq!(mixed, vec![1, 2, 3, 4, 5, 6]);
    /// # Ok::<(), pipestream::StreamError>(())
    /// ```
    pub fn round_robin(self) -> Stream<'a, T::Item> {
        self.pipe("round_robin", |seq| {
            let mut queue: Option<VecDeque<T::IntoIter>> = None;
            let mut seq = Some(seq);
            std::iter::from_fn(move || {
                let active = queue.get_or_insert_with(|| {
                    seq.take()
                        .map(|s| s.map(IntoIterator::into_iter).collect())
                        .unwrap_or_default()
                });
                while let Some(mut inner) = active.pop_front() {
                    if let Some(item) = inner.next() {
                        active.push_back(inner);
                        return Some(item);
                    }
                }
                None
            })
        })
    }
}

fn deferred_skip<'a, T: 'a>(mut seq: BoxedSeq<'a, T>, skip: Option<usize>) -> BoxedSeq<'a, T> {
    match skip {
        Some(n) => Box::new(seq.skip(n)),
        None => Box::new(std::iter::from_fn(move || {
            seq.by_ref().for_each(drop);
            None
        })),
    }
}

struct Chunks<'a, T> {
    seq: BoxedSeq<'a, T>,
    size: usize,
    policy: ChunkPolicy<T>,
    fault: Fault,
}

impl<T: Clone> Iterator for Chunks<'_, T> {
    type Item = Vec<T>;

    fn next(&mut self) -> Option<Vec<T>> {
        let mut chunk: Vec<T> = self.seq.by_ref().take(self.size).collect();
        if chunk.is_empty() || chunk.len() == self.size {
            return (!chunk.is_empty()).then_some(chunk);
        }
        match &self.policy {
            ChunkPolicy::Fill(value) => {
                chunk.resize(self.size, value.clone());
                Some(chunk)
            }
            ChunkPolicy::Ignore => None,
            ChunkPolicy::Strict => {
                self.fault.raise(StreamError::invalid(format!(
                    "grouper: final chunk has {} of {} elements",
                    chunk.len(),
                    self.size
                )));
                None
            }
        }
    }
}
