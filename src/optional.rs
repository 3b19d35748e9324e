//! `Option<T>` as the value container.
//!
//! Element lookups (`min`, `find_first`, `reduce`, ...) return `Option<T>`.
//! Most of the container vocabulary already exists on `Option` (`is_some`,
//! `unwrap_or`, `unwrap_or_else`, `map`, `filter`); [`Optional`] adds the
//! pieces that fail with a [`StreamError`] instead of panicking.

use crate::error::{Result, StreamError};

pub trait Optional<T> {
    /// The value, or [`StreamError::ValueAbsent`].
    fn get(self) -> Result<T>;

    /// The value, or the error built by `err`.
    fn or_else_raise<E, F>(self, err: F) -> std::result::Result<T, E>
    where
        F: FnOnce() -> E;

    /// Run `present` on the value or `absent` when there is none.
    fn if_present_or_else<P, A>(self, present: P, absent: A)
    where
        P: FnOnce(T),
        A: FnOnce();
}

impl<T> Optional<T> for Option<T> {
    fn get(self) -> Result<T> {
        self.ok_or(StreamError::ValueAbsent)
    }

    fn or_else_raise<E, F>(self, err: F) -> std::result::Result<T, E>
    where
        F: FnOnce() -> E,
    {
        self.ok_or_else(err)
    }

    fn if_present_or_else<P, A>(self, present: P, absent: A)
    where
        P: FnOnce(T),
        A: FnOnce(),
    {
        match self {
            Some(value) => present(value),
            None => absent(),
        }
    }
}
