//! Use-once lifecycle of a stream.
//!
//! A stream is a small state machine:
//!
//! ```text
//!   Active(seq) --intermediate--> Active(seq')
//!   Active(seq) --bad argument--> Poisoned(err)
//!   Active | Poisoned --terminal / close--> Consumed
//! ```
//!
//! Terminal operations take the stream by value, so ordinary code cannot touch
//! a stream after its terminal operation. The `Consumed` state remains for the
//! one path the type system cannot close: an explicit [`close`](crate::Stream::close)
//! through `&mut`, after which every operation fails with
//! [`StreamError::IllegalState`].
//!
//! Intermediate operations cannot return an error without breaking the
//! chain, so a rejected argument poisons the stream instead; the error is
//! reported by whichever terminal operation runs next. Element-level failures
//! discovered mid-iteration are raised into a shared [`Fault`] slot, which the
//! terminal operation checks once it has finished pulling.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, trace};

use crate::error::{Result, StreamError};
use crate::sequence::BoxedSeq;

pub(crate) enum State<'a, T> {
    Active(BoxedSeq<'a, T>),
    Poisoned(StreamError),
    Consumed,
}

/// Slot for an error found while elements are being pulled.
///
/// Adapters that can fail mid-sequence stop yielding and record the first
/// failure here. A fault also reads the slots of every stream merged into
/// its own, so failures from a concatenated part still reach the terminal.
#[derive(Clone, Default)]
pub(crate) struct Fault(Rc<FaultSlot>);

#[derive(Default)]
struct FaultSlot {
    error: RefCell<Option<StreamError>>,
    absorbed: RefCell<Vec<Fault>>,
}

impl Fault {
    pub(crate) fn raise(&self, err: StreamError) {
        let mut slot = self.0.error.borrow_mut();
        if slot.is_none() {
            *slot = Some(err);
        }
    }

    fn absorb(&self, other: Fault) {
        self.0.absorbed.borrow_mut().push(other);
    }

    /// Own failure first, then absorbed ones in merge order.
    fn take(&self) -> Option<StreamError> {
        if let Some(err) = self.0.error.borrow_mut().take() {
            return Some(err);
        }
        self.0.absorbed.borrow().iter().find_map(Fault::take)
    }
}

type CloseHook<'a> = Box<dyn FnOnce() + 'a>;

pub(crate) struct Guard<'a, T> {
    state: State<'a, T>,
    hooks: Vec<CloseHook<'a>>,
    fault: Fault,
}

impl<'a, T> Guard<'a, T> {
    pub(crate) fn new(seq: BoxedSeq<'a, T>) -> Self {
        Self {
            state: State::Active(seq),
            hooks: Vec::new(),
            fault: Fault::default(),
        }
    }

    pub(crate) fn poisoned(err: StreamError) -> Self {
        Self {
            state: State::Poisoned(err),
            hooks: Vec::new(),
            fault: Fault::default(),
        }
    }

    pub(crate) fn is_consumed(&self) -> bool {
        matches!(self.state, State::Consumed)
    }

    /// Replace the current sequence. `op` names the operation for the
    /// error raised when the stream is no longer usable.
    pub(crate) fn intermediate<U: 'a>(
        self,
        op: &'static str,
        f: impl FnOnce(BoxedSeq<'a, T>, &Fault) -> Result<BoxedSeq<'a, U>>,
    ) -> Guard<'a, U> {
        let Guard { state, hooks, fault } = self;
        let state = match state {
            State::Active(seq) => match f(seq, &fault) {
                Ok(next) => State::Active(next),
                Err(err) => State::Poisoned(err),
            },
            State::Poisoned(err) => State::Poisoned(err),
            State::Consumed => State::Poisoned(StreamError::IllegalState { operation: op }),
        };
        Guard { state, hooks, fault }
    }

    /// Merge another guard into this one: `f` receives both sequences.
    /// Close hooks of both sides are kept, and the merged fault keeps reading
    /// the other side's slot.
    pub(crate) fn combine<U: 'a>(
        self,
        other: Guard<'a, T>,
        op: &'static str,
        f: impl FnOnce(BoxedSeq<'a, T>, BoxedSeq<'a, T>) -> BoxedSeq<'a, U>,
    ) -> Guard<'a, U> {
        let Guard { state, mut hooks, fault } = self;
        let Guard {
            state: other_state,
            hooks: other_hooks,
            fault: other_fault,
        } = other;
        hooks.extend(other_hooks);
        let state = match (state, other_state) {
            (State::Active(a), State::Active(b)) => State::Active(f(a, b)),
            (State::Poisoned(err), _) | (_, State::Poisoned(err)) => State::Poisoned(err),
            (State::Consumed, _) | (_, State::Consumed) => {
                State::Poisoned(StreamError::IllegalState { operation: op })
            }
        };
        fault.absorb(other_fault);
        Guard { state, hooks, fault }
    }

    /// Register a close hook. Hooks fire in registration order, at most once.
    pub(crate) fn on_close(mut self, hook: CloseHook<'a>) -> Self {
        match self.state {
            State::Consumed => {
                self.state = State::Poisoned(StreamError::IllegalState { operation: "on_close" })
            }
            _ => self.hooks.push(hook),
        }
        self
    }

    /// Run a terminal operation: mark the stream consumed, hand `f` the
    /// sequence, fire the close hooks, then report the first failure.
    pub(crate) fn terminal<R>(
        mut self,
        op: &'static str,
        f: impl FnOnce(BoxedSeq<'a, T>) -> Result<R>,
    ) -> Result<R> {
        let state = std::mem::replace(&mut self.state, State::Consumed);
        let seq = match state {
            State::Active(seq) => seq,
            State::Poisoned(err) => {
                self.fire_hooks();
                return Err(err);
            }
            State::Consumed => return Err(StreamError::IllegalState { operation: op }),
        };
        trace!(operation = op, "running terminal operation");
        let outcome = f(seq);
        self.fire_hooks();
        match self.fault.take() {
            Some(err) => Err(err),
            None => outcome,
        }
    }

    /// Hand the sequence out without running anything. The hooks travel
    /// with it and fire when the returned iterator is dropped.
    pub(crate) fn release(mut self, op: &'static str) -> Result<Released<'a, T>> {
        match std::mem::replace(&mut self.state, State::Consumed) {
            State::Active(seq) => Ok(Released {
                seq,
                hooks: std::mem::take(&mut self.hooks),
                fault: self.fault.clone(),
            }),
            State::Poisoned(err) => {
                self.fire_hooks();
                Err(err)
            }
            State::Consumed => Err(StreamError::IllegalState { operation: op }),
        }
    }

    pub(crate) fn close(&mut self) {
        if !self.is_consumed() {
            self.state = State::Consumed;
            self.fire_hooks();
        }
    }

    fn fire_hooks(&mut self) {
        if self.hooks.is_empty() {
            return;
        }
        debug!(hooks = self.hooks.len(), "stream closed");
        for hook in self.hooks.drain(..) {
            hook();
        }
    }
}

/// A sequence detached from its stream, see [`Stream::into_iter_checked`](crate::Stream::into_iter_checked).
pub struct Released<'a, T> {
    seq: BoxedSeq<'a, T>,
    hooks: Vec<CloseHook<'a>>,
    fault: Fault,
}

impl<T> Released<'_, T> {
    /// Error raised by an element-level failure so far, if any. Iteration
    /// stops at the first such failure.
    pub fn take_error(&self) -> Option<StreamError> {
        self.fault.take()
    }
}

impl<T> Iterator for Released<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.seq.next()
    }
}

impl<T> Drop for Released<'_, T> {
    fn drop(&mut self) {
        if self.hooks.is_empty() {
            return;
        }
        debug!(hooks = self.hooks.len(), "stream closed");
        for hook in self.hooks.drain(..) {
            hook();
        }
    }
}
