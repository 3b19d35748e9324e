use pipestream::testing::*;
use pipestream::*;

#[test]
fn terminal_operation_fires_close_hook_once() -> anyhow::Result<()> {
    let probe = HookProbe::new();
    let total = Stream::of([1, 2, 3]).on_close(probe.hook()).sum()?;
    assert_eq!(total, 6);
    assert_eq!(probe.fired(), 1);
    Ok(())
}

#[test]
fn hooks_fire_in_registration_order() -> anyhow::Result<()> {
    let order = std::cell::RefCell::new(Vec::new());
    Stream::of([1])
        .on_close(|| order.borrow_mut().push("first"))
        .map(|n| n + 1)
        .on_close(|| order.borrow_mut().push("second"))
        .count()?;
    assert_eq!(*order.borrow(), vec!["first", "second"]);
    Ok(())
}

#[test]
fn close_is_idempotent() {
    let probe = HookProbe::new();
    let mut stream = Stream::of([1, 2]).on_close(probe.hook());
    stream.close();
    stream.close();
    assert_eq!(probe.fired(), 1);
    assert_consumed(stream);
    assert_eq!(probe.fired(), 1);
}

#[test]
fn every_operation_after_close_is_illegal() {
    let mut stream = Stream::of([1, 2, 3]);
    stream.close();
    assert_illegal_state(stream.filter(|n| *n > 1).to_list(), "filter");

    let mut stream = Stream::of([1, 2, 3]);
    stream.close();
    assert_illegal_state(stream.to_list(), "to_list");

    let mut stream = Stream::of([1, 2, 3]);
    stream.close();
    assert_illegal_state(stream.group_by(|n| n % 2), "group_by");

    let mut stream = Stream::of([1, 2, 3]);
    stream.close();
    assert_illegal_state(stream.skip(1).sort().count(), "skip");

    let mut stream = Stream::of([1, 2, 3]);
    stream.close();
    assert_illegal_state(stream.into_iter_checked().map(|_| ()), "into_iter");
}

#[test]
fn closed_stream_poisons_a_concatenation() {
    let mut closed = Stream::of([1]);
    closed.close();
    let outcome = Stream::of([0]).concat_stream(closed).to_list();
    assert_illegal_state(outcome, "concat");
}

#[test]
fn hooks_fire_even_when_the_terminal_fails() {
    let probe = HookProbe::new();
    let outcome = Stream::of([1, 2]).on_close(probe.hook()).limit(-1).count();
    assert!(matches!(outcome, Err(StreamError::InvalidArgument(_))));
    assert_eq!(probe.fired(), 1);

    let probe = HookProbe::new();
    let outcome = Stream::of([serde_json::json!(1), serde_json::json!("a")])
        .on_close(probe.hook())
        .sum();
    assert!(matches!(outcome, Err(StreamError::TypeMismatch(_))));
    assert_eq!(probe.fired(), 1);
}

#[test]
fn concatenated_streams_keep_both_hooks() -> anyhow::Result<()> {
    let left = HookProbe::new();
    let right = HookProbe::new();
    Stream::of([1])
        .on_close(left.hook())
        .concat_stream(Stream::of([2]).on_close(right.hook()))
        .count()?;
    assert_eq!((left.fired(), right.fired()), (1, 1));
    Ok(())
}

#[test]
fn element_errors_in_the_appended_stream_reach_the_terminal() {
    let outcome = Stream::of([vec![0]])
        .concat_stream(Stream::of([1, 2, 3, 4]).grouper(3, ChunkPolicy::Strict))
        .to_list();
    assert!(matches!(outcome, Err(StreamError::InvalidArgument(_))));
}

#[test]
fn element_errors_in_the_leading_stream_reach_the_terminal() {
    let closed = HookProbe::new();
    let outcome = Stream::from_json(serde_json::json!([[1], 2]))
        .flat_map_values(|v| v)
        .concat_stream(Stream::of([serde_json::json!(3)]).on_close(closed.hook()))
        .count();
    assert!(matches!(outcome, Err(StreamError::TypeMismatch(_))));
    assert_eq!(closed.fired(), 1);
}

#[test]
fn element_errors_survive_concat_all() {
    let failing = Stream::from_json(serde_json::json!([[1], 2])).flat_map_values(|v| v);
    let outcome = Stream::concat_all([failing]).to_list();
    assert!(matches!(outcome, Err(StreamError::TypeMismatch(_))));

    let outcome = Stream::concat_all([
        Stream::of([serde_json::json!(0)]),
        Stream::of([serde_json::json!(1)]),
        Stream::from_json(serde_json::json!([true])).flat_map_values(|v| v),
    ])
    .map(|v| v.to_string())
    .to_list();
    assert!(matches!(outcome, Err(StreamError::TypeMismatch(_))));
}

#[test]
fn released_concatenation_reports_element_errors() -> anyhow::Result<()> {
    let mut iter = Stream::of([vec![0]])
        .concat_stream(Stream::of([1, 2]).grouper(3, ChunkPolicy::Strict))
        .into_iter_checked()?;
    assert_eq!(iter.next(), Some(vec![0]));
    assert_eq!(iter.next(), None);
    assert!(matches!(iter.take_error(), Some(StreamError::InvalidArgument(_))));
    Ok(())
}

#[test]
fn dropping_an_unused_stream_does_not_fire_hooks() {
    let probe = HookProbe::new();
    drop(Stream::of([1]).on_close(probe.hook()));
    assert_eq!(probe.fired(), 0);
}

#[test]
fn released_iterator_fires_hooks_when_dropped() -> anyhow::Result<()> {
    let probe = HookProbe::new();
    let mut iter = Stream::of([1, 2, 3]).on_close(probe.hook()).into_iter_checked()?;
    assert_eq!(iter.next(), Some(1));
    assert_eq!(probe.fired(), 0);
    drop(iter);
    assert_eq!(probe.fired(), 1);
    Ok(())
}

#[test]
fn released_iterator_reports_element_errors() -> anyhow::Result<()> {
    let mut iter = Stream::of([serde_json::json!([1]), serde_json::json!(2)])
        .flat_map_values(|v| v)
        .into_iter_checked()?;
    assert_eq!(iter.next(), Some(serde_json::json!(1)));
    assert_eq!(iter.next(), None);
    assert!(matches!(iter.take_error(), Some(StreamError::TypeMismatch(_))));
    Ok(())
}

#[test]
fn debug_shows_consumption() {
    let mut stream = Stream::of([1]);
    assert!(format!("{stream:?}").contains("consumed: false"));
    stream.close();
    assert!(format!("{stream:?}").contains("consumed: true"));
}
