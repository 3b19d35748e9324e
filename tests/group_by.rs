use pipestream::group::group_by;
use pipestream::*;
use proptest::prelude::*;

#[test]
fn default_classifier_groups_runs() -> anyhow::Result<()> {
    let groups = Stream::of("AAAABBBCCD".chars()).group_by_identity()?;
    assert_eq!(
        groups,
        vec![
            ('A', vec!['A'; 4]),
            ('B', vec!['B'; 3]),
            ('C', vec!['C'; 2]),
            ('D', vec!['D']),
        ]
    );
    Ok(())
}

#[test]
fn non_contiguous_keys_get_separate_entries() -> anyhow::Result<()> {
    let groups = Stream::of([1, 1, 2, 1]).group_by_identity()?;
    assert_eq!(groups, vec![(1, vec![1, 1]), (2, vec![2]), (1, vec![1])]);
    Ok(())
}

#[test]
fn empty_input_has_no_groups() -> anyhow::Result<()> {
    assert!(Stream::<i32>::empty().group_by(|n| *n)?.is_empty());
    Ok(())
}

#[test]
fn collector_appends_iterable_results() -> anyhow::Result<()> {
    let merged = Stream::of("AABAAC".chars()).group_by_with(|c| *c, |k, g| (k, GroupValue::Many(g)))?;
    assert_eq!(
        merged,
        vec![
            ('A', GroupValue::Many(vec!['A'; 4])),
            ('B', GroupValue::Many(vec!['B'])),
            ('C', GroupValue::Many(vec!['C'])),
        ]
    );
    Ok(())
}

#[test]
fn collector_single_values_replace() -> anyhow::Result<()> {
    let sizes = Stream::of("AABAAAC".chars())
        .group_by_with(|c| *c, |k, g| (k, GroupValue::One(g.len())))?;
    assert_eq!(
        sizes,
        vec![
            ('A', GroupValue::One(3)),
            ('B', GroupValue::One(1)),
            ('C', GroupValue::One(1)),
        ]
    );
    Ok(())
}

#[test]
fn collector_can_rename_keys() -> anyhow::Result<()> {
    let parity = Stream::of([1, 3, 2, 5])
        .group_by_with(|n| n % 2, |k, g| (if k == 0 { "even" } else { "odd" }, GroupValue::Many(g)))?;
    assert_eq!(
        parity,
        vec![("odd", GroupValue::Many(vec![1, 3, 5])), ("even", GroupValue::Many(vec![2]))]
    );
    Ok(())
}

#[test]
fn appending_to_a_single_value_is_a_type_mismatch() {
    let mut first = true;
    let outcome = Stream::of([1, 2, 1]).group_by_with(
        |n| *n,
        |k, g| {
            let value = if first { GroupValue::One(g[0]) } else { GroupValue::Many(g) };
            first = false;
            (k, value)
        },
    );
    assert!(matches!(outcome, Err(StreamError::TypeMismatch(_))));
}

#[test]
fn abandoned_groups_are_drained() {
    let groups = group_by([1, 1, 1, 2, 2, 3], |n| *n);
    let mut seen = Vec::new();
    for (key, mut group) in &groups {
        // take one element of each group and abandon the rest
        seen.push((key, group.next()));
    }
    assert_eq!(seen, vec![(1, Some(1)), (2, Some(2)), (3, Some(3))]);
}

#[test]
fn stale_groups_yield_nothing() {
    let groups = group_by("aab".chars(), |c| *c);
    let (_, first) = groups.next_group().expect("first group");
    let (key, second) = groups.next_group().expect("second group");
    assert_eq!(key, 'b');
    assert_eq!(first.count(), 0);
    assert_eq!(second.collect::<String>(), "b");
    assert!(groups.next_group().is_none());
}

#[test]
fn lazy_groups_from_a_stream() -> anyhow::Result<()> {
    let groups = Stream::of(["ant", "ape", "bee", "cat", "cow"]).into_groups(|w| w.as_bytes()[0])?;
    let sizes: Vec<(u8, usize)> = (&groups).into_iter().map(|(k, g)| (k, g.count())).collect();
    assert_eq!(sizes, vec![(b'a', 2), (b'b', 1), (b'c', 2)]);
    Ok(())
}

/// Reference grouping: contiguous runs computed on a materialized vector.
fn runs(data: &[u8]) -> Vec<(u8, Vec<u8>)> {
    let mut out: Vec<(u8, Vec<u8>)> = Vec::new();
    for &x in data {
        match out.last_mut() {
            Some((k, run)) if *k == x => run.push(x),
            _ => out.push((x, vec![x])),
        }
    }
    out
}

proptest! {
    #[test]
    fn groups_match_reference_runs(data in prop::collection::vec(0u8..4, 0..64)) {
        let groups = Stream::of(data.clone()).group_by_identity().unwrap();
        prop_assert_eq!(groups, runs(&data));
    }

    #[test]
    fn groups_are_never_skipped_or_duplicated(
        data in prop::collection::vec(0u8..4, 0..64),
        takes in prop::collection::vec(0usize..5, 64),
    ) {
        let expected = runs(&data);
        let groups = group_by(data.clone(), |x| *x);
        let mut keys = Vec::new();
        for (i, (key, group)) in (&groups).into_iter().enumerate() {
            // drain a random prefix of each group, possibly nothing
            let taken: Vec<u8> = group.take(takes[i % takes.len()]).collect();
            let full = &expected[i].1;
            prop_assert_eq!(&taken[..], &full[..taken.len()]);
            keys.push(key);
        }
        let expected_keys: Vec<u8> = expected.iter().map(|(k, _)| *k).collect();
        prop_assert_eq!(keys, expected_keys);
    }

    #[test]
    fn flattened_groups_reproduce_the_input(data in prop::collection::vec(0u8..3, 0..64)) {
        let groups = Stream::of(data.clone()).group_by(|x| *x).unwrap();
        let flat: Vec<u8> = groups.into_iter().flat_map(|(_, g)| g).collect();
        prop_assert_eq!(flat, data);
    }
}
