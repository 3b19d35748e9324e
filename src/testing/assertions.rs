//! Assertion functions for stream outputs.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use crate::error::{Result, StreamError};
use crate::Stream;

/// Assert that two collections are equal in order and content.
///
/// # Panics
///
/// Panics naming the first differing index, or the length difference.
///
/// # Example
///
/// ```
/// use pipestream::testing::assert_collections_equal;
///
/// assert_collections_equal(&[1, 2, 3], &[1, 2, 3]);
/// ```
pub fn assert_collections_equal<T: Debug + PartialEq>(actual: &[T], expected: &[T]) {
    if let Some(i) = actual.iter().zip(expected).position(|(a, e)| a != e) {
        panic!(
            "Collection mismatch at index {i}:\n  Expected: {:?}\n  Actual: {:?}\n  Full expected: {expected:?}\n  Full actual: {actual:?}",
            expected[i], actual[i]
        );
    }
    assert_eq!(
        actual.len(),
        expected.len(),
        "Collection length mismatch:\n  Expected: {expected:?}\n  Actual: {actual:?}"
    );
}

/// Assert that two collections hold the same elements with the same
/// multiplicities, ignoring order.
///
/// # Panics
///
/// Panics listing missing and unexpected elements.
///
/// # Example
///
/// ```
/// use pipestream::testing::assert_collections_unordered_equal;
///
/// assert_collections_unordered_equal(&[3, 1, 2, 1], &[1, 1, 2, 3]);
/// ```
pub fn assert_collections_unordered_equal<T: Debug + Eq + Hash>(actual: &[T], expected: &[T]) {
    let mut balance: HashMap<&T, isize> = HashMap::new();
    for item in expected {
        *balance.entry(item).or_default() += 1;
    }
    for item in actual {
        *balance.entry(item).or_default() -= 1;
    }
    let missing: Vec<_> = balance.iter().filter(|(_, n)| **n > 0).map(|(t, _)| *t).collect();
    let extra: Vec<_> = balance.iter().filter(|(_, n)| **n < 0).map(|(t, _)| *t).collect();
    assert!(
        missing.is_empty() && extra.is_empty(),
        "Collection content mismatch:\n  Missing elements: {missing:?}\n  Extra elements: {extra:?}\n  Expected: {expected:?}\n  Actual: {actual:?}"
    );
}

/// Assert that two collections of key-value pairs are equal after sorting by
/// key. Handy for comparing the contents of a `HashMap` from `to_dict`.
///
/// # Example
///
/// ```
/// use pipestream::testing::assert_kv_collections_equal;
///
/// assert_kv_collections_equal(vec![("b", 2), ("a", 1)], vec![("a", 1), ("b", 2)]);
/// ```
pub fn assert_kv_collections_equal<K, V>(actual: impl IntoIterator<Item = (K, V)>, expected: Vec<(K, V)>)
where
    K: Debug + Ord,
    V: Debug + PartialEq,
{
    let mut actual: Vec<(K, V)> = actual.into_iter().collect();
    let mut expected = expected;
    actual.sort_by(|a, b| a.0.cmp(&b.0));
    expected.sort_by(|a, b| a.0.cmp(&b.0));
    assert_collections_equal(&actual, &expected);
}

/// Assert that every element satisfies `predicate`.
///
/// ```
/// use pipestream::testing::assert_all;
///
/// assert_all(&[2, 4, 6], |x| x % 2 == 0);
/// ```
pub fn assert_all<T: Debug>(collection: &[T], predicate: impl Fn(&T) -> bool) {
    if let Some(i) = collection.iter().position(|x| !predicate(x)) {
        panic!(
            "Predicate failed for element at index {i}:\n  Element: {:?}\n  Collection: {collection:?}",
            collection[i]
        );
    }
}

/// Assert that at least one element satisfies `predicate`.
pub fn assert_any<T: Debug>(collection: &[T], predicate: impl Fn(&T) -> bool) {
    assert!(
        collection.iter().any(predicate),
        "No elements satisfied the predicate:\n  Collection: {collection:?}"
    );
}

/// Assert that no element satisfies `predicate`.
pub fn assert_none<T: Debug>(collection: &[T], predicate: impl Fn(&T) -> bool) {
    if let Some(i) = collection.iter().position(predicate) {
        panic!(
            "Predicate unexpectedly succeeded for element at index {i}:\n  Element: {:?}\n  Collection: {collection:?}",
            collection[i]
        );
    }
}

/// Assert that `outcome` failed with [`StreamError::IllegalState`] for
/// `operation`.
///
/// ```
/// use pipestream::Stream;
/// use pipestream::testing::assert_illegal_state;
///
/// let mut s = Stream::of([1, 2]);
/// s.close();
/// assert_illegal_state(s.count(), "count");
/// ```
pub fn assert_illegal_state<R: Debug>(outcome: Result<R>, operation: &str) {
    match outcome {
        Err(StreamError::IllegalState { operation: op }) => assert_eq!(
            op, operation,
            "IllegalState raised for the wrong operation"
        ),
        other => panic!("Expected IllegalState for `{operation}`, got {other:?}"),
    }
}

/// Assert that a stream is closed: it reports itself consumed and a further
/// terminal operation fails with [`StreamError::IllegalState`].
pub fn assert_consumed<T>(stream: Stream<'_, T>) {
    assert!(stream.is_consumed(), "Stream is still active");
    assert_illegal_state(stream.count(), "count");
}
