//! Delegating a stage to a registered sequence function.
//!
//! Some sequence transformations already exist as ordinary functions with
//! their own argument conventions (`chain`, `islice`, `takewhile`, ...).
//! Rather than wrapping each one in a dedicated combinator, a stream can hand
//! its current sequence to such a function through [`Stream::use_fn`] and
//! continue with whatever sequence the function returns.
//!
//! Each function is registered once under a tag together with its
//! [`Convention`], which decides where the stream's sequence goes among the
//! caller's keyword arguments:
//!
//! | Convention              | Call shape                                  |
//! |-------------------------|---------------------------------------------|
//! | `SequenceFirst`         | `f(seq, kwarg values...)`                   |
//! | `SequenceLast`          | `f(kwarg values..., seq)`                   |
//! | `SequenceOnly`          | `f(seq)`                                    |
//! | `Named("iterable")`     | `f(iterable = seq, other kwargs by name)`   |
//!
//! Registered functions receive a [`Call`], pull their arguments from it, and
//! report failures with `anyhow`; the stream wraps such a failure into
//! [`StreamError::External`]. Delegation is an intermediate operation: the
//! function wires up a new lazy sequence and nothing is pulled until a
//! terminal operation runs.
//!
//! ```
//! use pipestream::{Arg, Kwargs, Registry, Stream};
//!
//! let registry = Registry::standard();
//! let head = Stream::of(1..100)
//!     .use_fn(&registry, "takewhile", Kwargs::new().arg("predicate", Arg::predicate(|n: &i32| *n < 4)))
//!     .to_list()?;
//! assert_eq!(head, vec![1, 2, 3]);
//! # Ok::<(), pipestream::StreamError>(())
//! ```

use std::collections::{HashMap, VecDeque};

use anyhow::{anyhow, bail, ensure};
use serde_json::Value;
use tracing::debug;

use crate::error::StreamError;
use crate::sequence::BoxedSeq;
use crate::Stream;

/// One argument passed to a delegated function.
pub enum Arg<'a, T> {
    Seq(BoxedSeq<'a, T>),
    Int(i64),
    Value(Value),
    Elem(T),
    Predicate(Box<dyn Fn(&T) -> bool + 'a>),
    Func(Box<dyn Fn(T, T) -> T + 'a>),
}

impl<T> Arg<'_, T> {
    fn kind(&self) -> &'static str {
        match self {
            Arg::Seq(_) => "sequence",
            Arg::Int(_) => "integer",
            Arg::Value(_) => "value",
            Arg::Elem(_) => "element",
            Arg::Predicate(_) => "predicate",
            Arg::Func(_) => "function",
        }
    }
}

impl<'a, T: 'a> Arg<'a, T> {
    pub fn seq<I>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: 'a,
    {
        Arg::Seq(Box::new(items.into_iter()))
    }

    pub fn predicate(f: impl Fn(&T) -> bool + 'a) -> Self {
        Arg::Predicate(Box::new(f))
    }

    pub fn func(f: impl Fn(T, T) -> T + 'a) -> Self {
        Arg::Func(Box::new(f))
    }

    pub fn into_seq(self) -> anyhow::Result<BoxedSeq<'a, T>> {
        match self {
            Arg::Seq(seq) => Ok(seq),
            other => bail!("expected a sequence, got {}", other.kind()),
        }
    }

    pub fn into_int(self) -> anyhow::Result<i64> {
        match self {
            Arg::Int(n) => Ok(n),
            Arg::Value(v) => v
                .as_i64()
                .ok_or_else(|| anyhow!("expected an integer, got {v}")),
            other => bail!("expected an integer, got {}", other.kind()),
        }
    }

    pub fn into_elem(self) -> anyhow::Result<T> {
        match self {
            Arg::Elem(x) => Ok(x),
            other => bail!("expected an element, got {}", other.kind()),
        }
    }

    pub fn into_predicate(self) -> anyhow::Result<Box<dyn Fn(&T) -> bool + 'a>> {
        match self {
            Arg::Predicate(p) => Ok(p),
            other => bail!("expected a predicate, got {}", other.kind()),
        }
    }

    pub fn into_func(self) -> anyhow::Result<Box<dyn Fn(T, T) -> T + 'a>> {
        match self {
            Arg::Func(f) => Ok(f),
            other => bail!("expected a function, got {}", other.kind()),
        }
    }
}

impl<T> std::fmt::Debug for Arg<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Arg::Int(n) => f.debug_tuple("Int").field(n).finish(),
            Arg::Value(v) => f.debug_tuple("Value").field(v).finish(),
            other => write!(f, "{}(..)", other.kind()),
        }
    }
}

/// Keyword arguments for a delegated call, in the order given.
pub struct Kwargs<'a, T> {
    entries: Vec<(String, Arg<'a, T>)>,
}

impl<T> Default for Kwargs<'_, T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<'a, T> Kwargs<'a, T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arg(mut self, name: impl Into<String>, value: Arg<'a, T>) -> Self {
        self.entries.push((name.into(), value));
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Where the stream's sequence goes in a delegated call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Convention {
    /// Sequence first, then the keyword values positionally.
    SequenceFirst,
    /// Keyword values positionally, then the sequence.
    SequenceLast,
    /// The sequence alone; keyword arguments are rejected.
    SequenceOnly,
    /// The sequence is passed by name alongside the keyword arguments.
    Named(&'static str),
}

/// The bound arguments of one delegated call.
pub struct Call<'a, T> {
    function: String,
    positional: VecDeque<Arg<'a, T>>,
    named: Vec<(String, Arg<'a, T>)>,
}

impl<'a, T: 'a> Call<'a, T> {
    fn bind(
        function: &str,
        convention: Convention,
        seq: BoxedSeq<'a, T>,
        kwargs: Kwargs<'a, T>,
    ) -> Result<Self, StreamError> {
        let entries = kwargs.entries;
        let mut call = Call {
            function: function.to_string(),
            positional: VecDeque::new(),
            named: Vec::new(),
        };
        match convention {
            Convention::SequenceFirst => {
                call.positional.push_back(Arg::Seq(seq));
                call.positional.extend(entries.into_iter().map(|(_, arg)| arg));
            }
            Convention::SequenceLast => {
                call.positional.extend(entries.into_iter().map(|(_, arg)| arg));
                call.positional.push_back(Arg::Seq(seq));
            }
            Convention::SequenceOnly => {
                if !entries.is_empty() {
                    return Err(StreamError::invalid(format!(
                        "`{function}` takes only the stream's sequence, got {} keyword argument(s)",
                        entries.len()
                    )));
                }
                call.positional.push_back(Arg::Seq(seq));
            }
            Convention::Named(name) => {
                call.named = entries;
                call.named.push((name.to_string(), Arg::Seq(seq)));
            }
        }
        Ok(call)
    }

    /// Name the function was registered under.
    pub fn function(&self) -> &str {
        &self.function
    }

    /// Next positional argument.
    pub fn positional(&mut self) -> anyhow::Result<Arg<'a, T>> {
        self.positional
            .pop_front()
            .ok_or_else(|| anyhow!("`{}`: missing positional argument", self.function))
    }

    /// All positional arguments not taken yet.
    pub fn remaining(&mut self) -> Vec<Arg<'a, T>> {
        self.positional.drain(..).collect()
    }

    /// Take a named argument, if given.
    pub fn named(&mut self, name: &str) -> Option<Arg<'a, T>> {
        let at = self.named.iter().position(|(n, _)| n == name)?;
        Some(self.named.remove(at).1)
    }

    pub fn required(&mut self, name: &str) -> anyhow::Result<Arg<'a, T>> {
        self.named(name)
            .ok_or_else(|| anyhow!("`{}`: missing argument `{name}`", self.function))
    }

    /// Fail if any argument was left untaken.
    pub fn finish(self) -> anyhow::Result<()> {
        ensure!(
            self.positional.is_empty(),
            "`{}`: {} unexpected positional argument(s)",
            self.function,
            self.positional.len()
        );
        if let Some((name, _)) = self.named.first() {
            bail!("`{}`: unexpected argument `{name}`", self.function);
        }
        Ok(())
    }
}

type Delegate<'a, T> = Box<dyn Fn(Call<'a, T>) -> anyhow::Result<BoxedSeq<'a, T>> + 'a>;

struct Entry<'a, T> {
    convention: Convention,
    function: Delegate<'a, T>,
}

/// Functions a stream can delegate to, keyed by tag.
pub struct Registry<'a, T> {
    entries: HashMap<String, Entry<'a, T>>,
}

impl<T> Default for Registry<'_, T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<'a, T: 'a> Registry<'a, T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `function` under `tag`, replacing any earlier registration.
    pub fn register<F>(&mut self, tag: impl Into<String>, convention: Convention, function: F) -> &mut Self
    where
        F: Fn(Call<'a, T>) -> anyhow::Result<BoxedSeq<'a, T>> + 'a,
    {
        self.entries.insert(
            tag.into(),
            Entry {
                convention,
                function: Box::new(function),
            },
        );
        self
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.entries.contains_key(tag)
    }

    pub fn convention(&self, tag: &str) -> Option<Convention> {
        self.entries.get(tag).map(|e| e.convention)
    }

    /// The built-in functions:
    ///
    /// - `chain` (sequence first): the stream followed by every extra sequence.
    /// - `islice` (sequence first): `stop`, `start, stop` or `start, stop, step`.
    /// - `takewhile`, `dropwhile`, `filterfalse` (sequence last): a predicate.
    /// - `cycle` (sequence only): repeat the elements forever.
    /// - `accumulate` (named `iterable`): running `func` results, optionally
    ///   starting with `initial`.
    pub fn standard() -> Self
    where
        T: Clone,
    {
        let mut registry = Self::new();
        registry
            .register("chain", Convention::SequenceFirst, |mut call| {
                let mut parts = vec![call.positional()?.into_seq()?];
                for extra in call.remaining() {
                    parts.push(extra.into_seq()?);
                }
                Ok(Box::new(parts.into_iter().flatten()))
            })
            .register("islice", Convention::SequenceFirst, |mut call| {
                let seq = call.positional()?.into_seq()?;
                let bounds = call
                    .remaining()
                    .into_iter()
                    .map(Arg::into_int)
                    .collect::<anyhow::Result<Vec<i64>>>()?;
                let (start, stop, step) = match bounds[..] {
                    [stop] => (0, stop, 1),
                    [start, stop] => (start, stop, 1),
                    [start, stop, step] => (start, stop, step),
                    _ => bail!("`islice` takes 1 to 3 bounds, got {}", bounds.len()),
                };
                ensure!(
                    start >= 0 && stop >= 0,
                    "`islice` bounds must be non-negative"
                );
                ensure!(step > 0, "`islice` step must be positive");
                let (start, stop, step) = (start as usize, stop as usize, step as usize);
                Ok(Box::new(seq.take(stop).skip(start).step_by(step)))
            })
            .register("takewhile", Convention::SequenceLast, |mut call| {
                let predicate = call.positional()?.into_predicate()?;
                let seq = call.positional()?.into_seq()?;
                call.finish()?;
                Ok(Box::new(seq.take_while(move |x| predicate(x))))
            })
            .register("dropwhile", Convention::SequenceLast, |mut call| {
                let predicate = call.positional()?.into_predicate()?;
                let seq = call.positional()?.into_seq()?;
                call.finish()?;
                Ok(Box::new(seq.skip_while(move |x| predicate(x))))
            })
            .register("filterfalse", Convention::SequenceLast, |mut call| {
                let predicate = call.positional()?.into_predicate()?;
                let seq = call.positional()?.into_seq()?;
                call.finish()?;
                Ok(Box::new(seq.filter(move |x| !predicate(x))))
            })
            .register("cycle", Convention::SequenceOnly, |mut call| {
                let seq = call.positional()?.into_seq()?;
                Ok(Box::new(cycle(seq)))
            })
            .register("accumulate", Convention::Named("iterable"), |mut call| {
                let seq = call.required("iterable")?.into_seq()?;
                let func = call.required("func")?.into_func()?;
                let initial = call.named("initial").map(Arg::into_elem).transpose()?;
                call.finish()?;
                let mut total = initial.clone();
                Ok(Box::new(initial.into_iter().chain(seq.map(move |x| {
                    let next = match total.take() {
                        Some(acc) => func(acc, x),
                        None => x,
                    };
                    total = Some(next.clone());
                    next
                }))))
            });
        registry
    }
}

/// Lazy cycle over a single-pass sequence: elements are saved on the first
/// pass and replayed afterwards.
fn cycle<'a, T: Clone + 'a>(mut seq: BoxedSeq<'a, T>) -> impl Iterator<Item = T> + 'a {
    let mut saved: Vec<T> = Vec::new();
    let mut first_pass = true;
    let mut at = 0;
    std::iter::from_fn(move || {
        if first_pass {
            if let Some(x) = seq.next() {
                saved.push(x.clone());
                return Some(x);
            }
            first_pass = false;
        }
        if saved.is_empty() {
            return None;
        }
        let x = saved[at % saved.len()].clone();
        at += 1;
        Some(x)
    })
}

impl<'a, T: 'a> Stream<'a, T> {
    /// Replace the current sequence with the result of the function
    /// registered under `tag`.
    ///
    /// An unknown tag, or keyword arguments the convention cannot place,
    /// poison the stream with [`StreamError::InvalidArgument`]; an error
    /// returned by the function itself becomes [`StreamError::External`].
    pub fn use_fn(self, registry: &Registry<'a, T>, tag: &str, kwargs: Kwargs<'a, T>) -> Self {
        self.try_pipe("use", |seq, _| {
            let entry = registry.entries.get(tag).ok_or_else(|| {
                StreamError::invalid(format!("no function registered under `{tag}`"))
            })?;
            debug!(function = tag, convention = ?entry.convention, args = kwargs.len(), "delegating stage");
            let call = Call::bind(tag, entry.convention, seq, kwargs)?;
            (entry.function)(call).map_err(|err| StreamError::external(tag, err))
        })
    }

    /// Delegate to an unregistered function with an explicit convention.
    pub fn use_with<F>(self, convention: Convention, kwargs: Kwargs<'a, T>, function: F) -> Self
    where
        F: FnOnce(Call<'a, T>) -> anyhow::Result<BoxedSeq<'a, T>>,
    {
        self.try_pipe("use", |seq, _| {
            debug!(function = "<inline>", convention = ?convention, args = kwargs.len(), "delegating stage");
            let call = Call::bind("<inline>", convention, seq, kwargs)?;
            function(call).map_err(|err| StreamError::external("<inline>", err))
        })
    }
}
