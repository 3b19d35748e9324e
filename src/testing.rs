//! Testing utilities for stream pipelines.
//!
//! - **Assertions**: compare stream outputs with expected results and check
//!   the use-once contract ([`assert_consumed`], [`assert_illegal_state`]).
//! - **Hook probes**: [`HookProbe`] counts how often close hooks fire.
//!
//! # Quick Start
//!
//! ```
//! use pipestream::Stream;
//! use pipestream::testing::*;
//!
//! # fn main() -> anyhow::Result<()> {
//! let probe = HookProbe::new();
//! let doubled = Stream::of([1, 2, 3])
//!     .on_close(probe.hook())
//!     .map(|x| x * 2)
//!     .to_list()?;
//!
//! assert_collections_equal(&doubled, &[2, 4, 6]);
//! assert_eq!(probe.fired(), 1);
//! # Ok(())
//! # }
//! ```

pub mod assertions;

pub use assertions::*;

use std::cell::Cell;
use std::rc::Rc;

/// Counts close-hook invocations.
///
/// Every hook created by [`HookProbe::hook`] increments the shared counter
/// when it runs.
#[derive(Clone, Debug, Default)]
pub struct HookProbe {
    fired: Rc<Cell<usize>>,
}

impl HookProbe {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A hook to pass to [`Stream::on_close`](crate::Stream::on_close).
    pub fn hook(&self) -> impl FnOnce() + 'static {
        let fired = Rc::clone(&self.fired);
        move || fired.set(fired.get() + 1)
    }

    /// Total number of hook invocations so far.
    #[must_use]
    pub fn fired(&self) -> usize {
        self.fired.get()
    }
}
