use std::cmp::Ordering;

use pipestream::value::compare;
use pipestream::*;
use serde_json::{json, Value};

#[test]
fn dynamic_values_sort_by_kind_then_content() -> anyhow::Result<()> {
    let sorted = Stream::of([json!("b"), json!(10), json!(null), json!(2.5), json!("a"), json!(true)])
        .sort_by(compare)
        .to_list()?;
    assert_eq!(
        sorted,
        vec![json!(null), json!(true), json!(2.5), json!(10), json!("a"), json!("b")]
    );
    Ok(())
}

#[test]
fn arrays_compare_lexicographically() {
    assert_eq!(compare(&json!([1, 2]), &json!([1, 3])), Ordering::Less);
    assert_eq!(compare(&json!([1, 2]), &json!([1])), Ordering::Greater);
    assert_eq!(compare(&json!({"a": 1}), &json!({"a": 1})), Ordering::Equal);
}

#[test]
fn truthiness_of_dynamic_values() {
    for falsy in [json!(null), json!(false), json!(0), json!(0.0), json!(""), json!([]), json!({})] {
        assert!(!falsy.is_truthy(), "{falsy} should be falsy");
    }
    for truthy in [json!(true), json!(-1), json!("0"), json!([0]), json!({"k": null})] {
        assert!(truthy.is_truthy(), "{truthy} should be truthy");
    }
}

#[test]
fn filter_map_on_dynamic_values_drops_nulls() -> anyhow::Result<()> {
    let kept = Stream::of([json!(0), json!(null), json!(3)])
        .filter_map(|v| v, false)
        .to_list()?;
    assert_eq!(kept, vec![json!(0), json!(3)]);

    let truthy = Stream::of([json!(0), json!(null), json!(3)])
        .filter_map(|v| v, true)
        .to_list()?;
    assert_eq!(truthy, vec![json!(3)]);
    Ok(())
}

#[test]
fn average_of_dynamic_values() -> anyhow::Result<()> {
    assert_eq!(Stream::of([json!(1), json!(2)]).average()?, 1.5);
    assert!(matches!(
        Stream::of([json!(1), json!(null)]).average(),
        Err(StreamError::TypeMismatch(_))
    ));
    Ok(())
}

#[test]
fn integer_sums_widen_to_floats_on_overflow() -> anyhow::Result<()> {
    let total = Stream::of([json!(i64::MAX), json!(1)]).sum()?;
    assert!(total.is_f64());
    Ok(())
}

#[test]
fn float_sums_out_of_range_overflow() {
    let outcome = Stream::of([json!(1.7e308), json!(1.7e308)]).sum();
    assert!(matches!(outcome, Err(StreamError::Overflow { operation: "sum" })));

    let outcome = Stream::of([json!(1.7e308), json!(1.7e308), json!(1)]).sum();
    assert!(matches!(outcome, Err(StreamError::Overflow { operation: "sum" })));
}

#[test]
fn nested_objects_become_nested_records() {
    let node = Node::from(json!({"a": 1, "b": {"c": [true]}}));
    let records = node.as_nested().expect("object");
    assert_eq!(records[0].key(), "a");
    assert_eq!(records[0].value().as_leaf(), Some(&json!(1)));
    let inner = records[1].value().as_nested().expect("nested object");
    assert_eq!(inner[0], KeyValue::new("c".to_string(), Node::Leaf(json!([true]))));
    assert_eq!(node.into_value(), json!({"a": 1, "b": {"c": [true]}}));
}

#[test]
fn from_object_streams_records() -> anyhow::Result<()> {
    let Value::Object(map) = json!({"x": 1, "y": {"z": 2}}) else {
        unreachable!()
    };
    let keys = Stream::from_object(map).map(|kv| kv.key().clone()).to_list()?;
    assert_eq!(keys, vec!["x", "y"]);
    Ok(())
}

#[test]
fn key_value_records_serialize_as_objects() -> anyhow::Result<()> {
    let kv = KeyValue::new("k".to_string(), 3);
    let encoded = serde_json::to_value(&kv)?;
    assert_eq!(encoded, json!({"key": "k", "value": 3}));
    let (k, v) = encoded.into_pair()?;
    assert_eq!((k.as_str(), v), ("k", json!(3)));
    Ok(())
}

#[test]
fn into_pair_rejects_malformed_values() {
    for bad in [json!([1, 2]), json!(["only"]), json!({"key": "k"}), json!("kv")] {
        let outcome: Result<(String, Value)> = bad.into_pair();
        assert!(matches!(outcome, Err(StreamError::TypeMismatch(_))));
    }
}
