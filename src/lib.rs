//! # Pipestream
//!
//! **Lazy, use-once, chainable streams** over in-memory sequences, in the
//! spirit of Java's `Stream` API. A [`Stream`] wraps one lazy sequence;
//! intermediate operations attach stages to it, and a single terminal
//! operation pulls the elements through and consumes the stream.
//!
//! ## Key Features
//!
//! - **Fluent pipeline API** - filter, map, flat_map, distinct, sort, skip/limit/tail, ...
//! - **Use-once semantics** - terminal operations take the stream by value; an
//!   explicitly closed stream rejects every further operation
//! - **Close hooks** - release resources exactly once on every terminal path
//! - **Streaming group-by** - partition contiguous runs by key in a single pass
//! - **Delegation** - hand a stage to a registered sequence function via [`Registry`]
//! - **Dynamic elements** - streams of [`serde_json::Value`] flatten, sum and
//!   collect with runtime checks
//!
//! ## Quick Start
//!
//! ```
//! use pipestream::*;
//! # use anyhow::Result;
//!
//! # fn main() -> Result<()> {
//! let words = ["apple", "banana", "avocado", "cherry", "blueberry"];
//!
//! let long_words = Stream::of(words)
//!     .filter(|w| w.len() > 5)
//!     .map(str::to_uppercase)
//!     .sort()
//!     .to_list()?;
//! assert_eq!(long_words, vec!["AVOCADO", "BANANA", "BLUEBERRY", "CHERRY"]);
//!
//! let by_initial = Stream::of(words)
//!     .sort()
//!     .group_by(|w| w.chars().next())?;
//! assert_eq!(by_initial[0], (Some('a'), vec!["apple", "avocado"]));
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Concepts
//!
//! ### Streams
//!
//! A [`Stream<'a, T>`](Stream) is **lazy** (nothing runs until a terminal
//! operation pulls), **single-pass** (the source is read once, forward only)
//! and **use-once** (a terminal operation consumes it).
//!
//! Constructors: [`of`](Stream::of), [`of_nullable`](Stream::of_nullable),
//! [`empty`](Stream::empty), [`iterate`](Stream::iterate),
//! [`generate`](Stream::generate), [`range`](Stream::range),
//! [`from_map`](Stream::from_map), [`from_json`](Stream::from_json),
//! [`concat_all`](Stream::concat_all), [`tabulate`](Stream::tabulate).
//!
//! ### Intermediate operations
//!
//! Take the stream by value and return it with a new stage:
//! [`filter`](Stream::filter), [`map`](Stream::map),
//! [`filter_map`](Stream::filter_map), [`flat_map`](Stream::flat_map),
//! [`peek`](Stream::peek), [`distinct`](Stream::distinct),
//! [`skip`](Stream::skip), [`limit`](Stream::limit), [`tail`](Stream::tail),
//! [`take_while`](Stream::take_while), [`drop_while`](Stream::drop_while),
//! [`sort`](Stream::sort), [`reverse`](Stream::reverse),
//! [`enumerate`](Stream::enumerate), [`concat`](Stream::concat), and the
//! recipe stages in [`recipes`].
//!
//! An argument that cannot be valid (a negative count, a zero step) does not
//! panic and does not break the chain: it poisons the stream, and the next
//! terminal operation reports it.
//!
//! ### Terminal operations
//!
//! Consume the stream, fire its close hooks, and return a [`Result`]:
//! [`for_each`](Stream::for_each), [`reduce`](Stream::reduce),
//! [`count`](Stream::count), [`sum`](Stream::sum),
//! [`average`](Stream::average), [`min`](Stream::min), [`max`](Stream::max),
//! [`find_first`](Stream::find_first), [`any_match`](Stream::any_match),
//! [`compare_with`](Stream::compare_with), [`quantify`](Stream::quantify),
//! [`group_by`](Stream::group_by), [`to_list`](Stream::to_list),
//! [`to_dict`](Stream::to_dict), [`collect`](Stream::collect),
//! [`save`](Stream::save), ...
//!
//! Element lookups return `Option<T>`; the [`Optional`] trait adds
//! `get()`, which fails with [`StreamError::ValueAbsent`] instead of panicking.
//!
//! ### Errors
//!
//! Every failure is a [`StreamError`]. Argument errors are detected when the
//! operation is chained; element errors (summing a string) when the element
//! is pulled. The crate never logs an error or retries.
//!
//! ### Logging
//!
//! Lifecycle events (terminal operations, closing, delegation) are emitted
//! through [`tracing`] at `trace`/`debug` level. Install any subscriber to see
//! them; the crate never installs one itself.

pub mod adapter;
pub mod collect;
pub mod error;
pub mod group;
mod guard;
pub mod optional;
pub mod recipes;
pub mod record;
pub mod sequence;
pub mod stream;
pub mod terminal;
pub mod testing;
pub mod value;

// General re-exports
pub use adapter::{Arg, Call, Convention, Kwargs, Registry};
pub use collect::{CollectTarget, Collector};
pub use error::{Result, StreamError};
pub use group::{GroupBy, GroupValue};
pub use guard::Released;
pub use optional::Optional;
pub use recipes::ChunkPolicy;
pub use record::{IntoPair, KeyValue, Node};
pub use sequence::{BoxedSeq, Nullable, SortOrder, Truthy};
pub use stream::Stream;
pub use terminal::Sink;
pub use value::Summable;
