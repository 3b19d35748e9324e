use pipestream::*;

#[test]
fn chain_appends_extra_sequences() -> anyhow::Result<()> {
    let registry = Registry::standard();
    let v = Stream::of([1, 2])
        .use_fn(
            &registry,
            "chain",
            Kwargs::new().arg("b", Arg::seq([3])).arg("c", Arg::seq([4, 5])),
        )
        .to_list()?;
    assert_eq!(v, vec![1, 2, 3, 4, 5]);
    Ok(())
}

#[test]
fn islice_accepts_one_to_three_bounds() -> anyhow::Result<()> {
    let registry = Registry::standard();
    let stop = Stream::of(0..10)
        .use_fn(&registry, "islice", Kwargs::new().arg("stop", Arg::Int(3)))
        .to_list()?;
    assert_eq!(stop, vec![0, 1, 2]);

    let stepped = Stream::of(0..10)
        .use_fn(
            &registry,
            "islice",
            Kwargs::new()
                .arg("start", Arg::Int(2))
                .arg("stop", Arg::Int(9))
                .arg("step", Arg::Int(3)),
        )
        .to_list()?;
    assert_eq!(stepped, vec![2, 5, 8]);

    let from_json = Stream::of(0..10)
        .use_fn(&registry, "islice", Kwargs::new().arg("stop", Arg::Value(serde_json::json!(2))))
        .to_list()?;
    assert_eq!(from_json, vec![0, 1]);
    Ok(())
}

#[test]
fn islice_rejects_bad_bounds() {
    let registry = Registry::standard();
    for kwargs in [
        Kwargs::new(),
        Kwargs::new().arg("stop", Arg::Int(-1)),
        Kwargs::new()
            .arg("start", Arg::Int(0))
            .arg("stop", Arg::Int(5))
            .arg("step", Arg::Int(0)),
    ] {
        let outcome = Stream::of(0..10).use_fn(&registry, "islice", kwargs).to_list();
        match outcome {
            Err(StreamError::External { function, .. }) => assert_eq!(function, "islice"),
            other => panic!("expected an external failure, got {other:?}"),
        }
    }
}

#[test]
fn predicate_functions_take_the_sequence_last() -> anyhow::Result<()> {
    let registry = Registry::standard();
    assert_eq!(registry.convention("takewhile"), Some(Convention::SequenceLast));
    let small = || Kwargs::new().arg("predicate", Arg::predicate(|n: &i32| *n < 3));
    let data = [1, 2, 3, 1];

    let taken = Stream::of(data).use_fn(&registry, "takewhile", small()).to_list()?;
    assert_eq!(taken, vec![1, 2]);

    let dropped = Stream::of(data).use_fn(&registry, "dropwhile", small()).to_list()?;
    assert_eq!(dropped, vec![3, 1]);

    let rejected = Stream::of(data).use_fn(&registry, "filterfalse", small()).to_list()?;
    assert_eq!(rejected, vec![3]);
    Ok(())
}

#[test]
fn cycle_repeats_lazily() -> anyhow::Result<()> {
    let registry = Registry::standard();
    let v = Stream::of(["a", "b"])
        .use_fn(&registry, "cycle", Kwargs::new())
        .limit(5)
        .to_list()?;
    assert_eq!(v, vec!["a", "b", "a", "b", "a"]);

    let int_registry = Registry::standard();
    let none = Stream::<i32>::empty().use_fn(&int_registry, "cycle", Kwargs::new()).to_list()?;
    assert!(none.is_empty());
    Ok(())
}

#[test]
fn sequence_only_functions_reject_keyword_arguments() {
    let registry = Registry::standard();
    let outcome = Stream::of([1])
        .use_fn(&registry, "cycle", Kwargs::new().arg("n", Arg::Int(2)))
        .to_list();
    assert!(matches!(outcome, Err(StreamError::InvalidArgument(_))));
}

#[test]
fn accumulate_passes_the_sequence_by_name() -> anyhow::Result<()> {
    let registry = Registry::standard();
    let running = Stream::of([1, 2, 3, 4])
        .use_fn(&registry, "accumulate", Kwargs::new().arg("func", Arg::func(|a, b| a + b)))
        .to_list()?;
    assert_eq!(running, vec![1, 3, 6, 10]);

    let seeded = Stream::of([1, 2])
        .use_fn(
            &registry,
            "accumulate",
            Kwargs::new()
                .arg("initial", Arg::Elem(10))
                .arg("func", Arg::func(|a, b| a * b)),
        )
        .to_list()?;
    assert_eq!(seeded, vec![10, 10, 20]);
    Ok(())
}

#[test]
fn unknown_tags_poison_the_stream() {
    let registry = Registry::<i32>::standard();
    assert!(!registry.contains("zip_longest"));
    let outcome = Stream::of([1]).use_fn(&registry, "zip_longest", Kwargs::new()).count();
    assert!(matches!(outcome, Err(StreamError::InvalidArgument(_))));
}

#[test]
fn wrong_argument_kind_is_reported_by_the_function() {
    let registry = Registry::standard();
    let outcome = Stream::of([1, 2])
        .use_fn(&registry, "takewhile", Kwargs::new().arg("predicate", Arg::Int(1)))
        .to_list();
    assert!(matches!(outcome, Err(StreamError::External { .. })));
}

#[test]
fn custom_registrations() -> anyhow::Result<()> {
    let mut registry = Registry::<i32>::new();
    registry.register("every_other", Convention::SequenceFirst, |mut call| {
        let seq = call.positional()?.into_seq()?;
        call.finish()?;
        Ok(Box::new(seq.step_by(2)))
    });
    assert_eq!(registry.convention("every_other"), Some(Convention::SequenceFirst));

    let v = Stream::of(1..=6).use_fn(&registry, "every_other", Kwargs::new()).to_list()?;
    assert_eq!(v, vec![1, 3, 5]);

    let outcome = Stream::of(1..=6)
        .use_fn(&registry, "every_other", Kwargs::new().arg("extra", Arg::Int(1)))
        .to_list();
    assert!(matches!(outcome, Err(StreamError::External { .. })));
    Ok(())
}

#[test]
fn inline_delegation() -> anyhow::Result<()> {
    let v = Stream::of([3, 1, 2])
        .use_with(
            Convention::Named("items"),
            Kwargs::new().arg("bonus", Arg::Elem(9)),
            |mut call| {
                let items = call.required("items")?.into_seq()?;
                let bonus = call.required("bonus")?.into_elem()?;
                Ok(Box::new(items.chain(std::iter::once(bonus))))
            },
        )
        .to_list()?;
    assert_eq!(v, vec![3, 1, 2, 9]);
    Ok(())
}

#[test]
fn delegation_is_lazy() -> anyhow::Result<()> {
    let mut pulled = 0;
    let registry = Registry::standard();
    let v = Stream::of(1..)
        .peek(|_| pulled += 1)
        .use_fn(&registry, "islice", Kwargs::new().arg("stop", Arg::Int(2)))
        .to_list()?;
    drop(registry);
    assert_eq!(v, vec![1, 2]);
    assert_eq!(pulled, 2);
    Ok(())
}
