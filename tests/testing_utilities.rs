//! Integration tests demonstrating the testing utilities.

use anyhow::Result;
use pipestream::testing::*;
use pipestream::*;

#[test]
fn test_basic_pipeline_with_assertions() -> Result<()> {
    let result = Stream::of(vec![1, 2, 3]).map(|x| x * 2).to_list()?;
    assert_collections_equal(&result, &[2, 4, 6]);
    Ok(())
}

#[test]
fn test_unordered_comparison() -> Result<()> {
    let result: Vec<i32> = Stream::of(vec![3, 1, 2]).map(|x| x * 10).to_set()?.into_iter().collect();
    assert_collections_unordered_equal(&result, &[10, 20, 30]);
    Ok(())
}

#[test]
fn test_kv_dict_contents() -> Result<()> {
    let dict = Stream::of(["a", "bb", "ccc"]).to_dict_with(|w| (w, w.len()))?;
    assert_kv_collections_equal(dict, vec![("a", 1), ("bb", 2), ("ccc", 3)]);
    Ok(())
}

#[test]
fn test_predicate_assertions() -> Result<()> {
    let evens = Stream::of(1..=10).filter(|x| x % 2 == 0).to_list()?;
    assert_all(&evens, |x| x % 2 == 0);
    assert_any(&evens, |x| *x > 8);
    assert_none(&evens, |x| *x > 10);
    Ok(())
}

#[test]
fn test_hook_probe_counts_every_hook() -> Result<()> {
    let probe = HookProbe::new();
    let total = Stream::of([1, 2])
        .on_close(probe.hook())
        .concat_stream(Stream::of([3]).on_close(probe.hook()))
        .sum()?;
    assert_eq!(total, 6);
    assert_eq!(probe.fired(), 2);
    Ok(())
}

#[test]
fn test_consumed_stream_assertion() {
    let mut stream = Stream::of(["x"]);
    stream.close();
    assert_consumed(stream);
}

#[test]
#[should_panic(expected = "Collection mismatch at index 1")]
fn test_assertion_failure_reports_index() {
    assert_collections_equal(&[1, 2, 3], &[1, 5, 3]);
}

#[test]
#[should_panic(expected = "Missing elements")]
fn test_unordered_assertion_respects_multiplicity() {
    assert_collections_unordered_equal(&[1, 2], &[1, 1, 2]);
}

#[test]
#[should_panic(expected = "Stream is still active")]
fn test_consumed_assertion_rejects_active_streams() {
    assert_consumed(Stream::of([1]));
}

#[test]
#[should_panic(expected = "Expected IllegalState")]
fn test_illegal_state_assertion_rejects_success() {
    assert_illegal_state(Stream::of([1]).count(), "count");
}
