//! Dynamic elements.
//!
//! Streams are generic, but some behaviors only make sense when elements are
//! dynamically typed: recursively flattening arbitrarily nested data, summing
//! elements that may turn out not to be numbers, or collecting into a target
//! chosen at runtime. Those streams carry [`serde_json::Value`] elements, and
//! this module holds the glue that gives `Value` those semantics.

use std::cmp::Ordering;

use ordered_float::OrderedFloat;
use serde_json::Value;

use crate::error::{Result, StreamError};
use crate::sequence::{Nullable, Truthy};

impl Truthy for Value {
    fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
            Value::String(s) => !s.is_empty(),
            Value::Array(items) => !items.is_empty(),
            Value::Object(map) => !map.is_empty(),
        }
    }
}

impl Nullable for Value {
    type Inner = Value;

    fn into_inner(self) -> Option<Value> {
        match self {
            Value::Null => None,
            other => Some(other),
        }
    }
}

/// Numeric folding used by `sum` and `average`.
///
/// Implemented for the primitive numbers (integer addition is checked) and for
/// [`Value`], where a non-numeric element is a [`StreamError::TypeMismatch`].
pub trait Summable: Sized {
    /// Additive identity, returned for an empty stream.
    fn zero() -> Self;

    fn try_add(self, rhs: Self) -> Result<Self>;

    fn to_f64(&self) -> Result<f64>;
}

macro_rules! summable_ints {
    ($($t:ty),*) => {
        $(impl Summable for $t {
            fn zero() -> Self {
                0
            }

            fn try_add(self, rhs: Self) -> Result<Self> {
                self.checked_add(rhs).ok_or(StreamError::Overflow { operation: "sum" })
            }

            fn to_f64(&self) -> Result<f64> {
                Ok(*self as f64)
            }
        })*
    };
}

macro_rules! summable_floats {
    ($($t:ty),*) => {
        $(impl Summable for $t {
            fn zero() -> Self {
                0.0
            }

            fn try_add(self, rhs: Self) -> Result<Self> {
                Ok(self + rhs)
            }

            fn to_f64(&self) -> Result<f64> {
                Ok(f64::from(*self))
            }
        })*
    };
}

summable_ints!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);
summable_floats!(f32, f64);

impl Summable for Value {
    fn zero() -> Self {
        Value::from(0)
    }

    fn try_add(self, rhs: Self) -> Result<Self> {
        let (Value::Number(a), Value::Number(b)) = (&self, &rhs) else {
            let offender = if self.is_number() { &rhs } else { &self };
            return Err(StreamError::mismatch(format!(
                "cannot sum non-number element {offender}"
            )));
        };
        if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
            if let Some(total) = x.checked_add(y) {
                return Ok(Value::from(total));
            }
        }
        let total = a.as_f64().unwrap_or(f64::NAN) + b.as_f64().unwrap_or(f64::NAN);
        if !total.is_finite() {
            return Err(StreamError::Overflow { operation: "sum" });
        }
        Ok(Value::from(total))
    }

    fn to_f64(&self) -> Result<f64> {
        self.as_f64()
            .ok_or_else(|| StreamError::mismatch(format!("cannot average non-number element {self}")))
    }
}

/// Total order over dynamic values.
///
/// Values of different kinds order by kind: null, booleans, numbers, strings,
/// arrays, objects. Numbers compare numerically (NaN-safe via `OrderedFloat`),
/// arrays lexicographically, objects by their entry lists.
///
/// ```
/// use pipestream::value::compare;
/// use serde_json::json;
/// use std::cmp::Ordering;
///
/// assert_eq!(compare(&json!(2), &json!(10)), Ordering::Less);
/// assert_eq!(compare(&json!(null), &json!("a")), Ordering::Less);
/// ```
pub fn compare(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(i), Some(j)) => i.cmp(&j),
            _ => OrderedFloat(x.as_f64().unwrap_or(f64::NAN))
                .cmp(&OrderedFloat(y.as_f64().unwrap_or(f64::NAN))),
        },
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => {
            for (l, r) in x.iter().zip(y) {
                let ord = compare(l, r);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        (Value::Object(x), Value::Object(y)) => {
            for ((lk, lv), (rk, rv)) in x.iter().zip(y) {
                let ord = lk.cmp(rk).then_with(|| compare(lv, rv));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        _ => rank(a).cmp(&rank(b)),
    }
}

fn rank(v: &Value) -> u8 {
    match v {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Recursively flatten nested arrays. Strings, objects and scalars are atoms.
///
/// ```
/// use pipestream::value::flatten;
/// use serde_json::json;
///
/// let flat: Vec<_> = flatten(vec![json!([1, [2, [3]]]), json!("ab")]).collect();
/// assert_eq!(flat, vec![json!(1), json!(2), json!(3), json!("ab")]);
/// ```
pub fn flatten<I>(seq: I) -> Flatten<I::IntoIter>
where
    I: IntoIterator<Item = Value>,
{
    Flatten {
        seq: seq.into_iter(),
        stack: Vec::new(),
    }
}

/// Iterator returned by [`flatten`].
pub struct Flatten<I> {
    seq: I,
    stack: Vec<std::vec::IntoIter<Value>>,
}

impl<I: Iterator<Item = Value>> Iterator for Flatten<I> {
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        loop {
            let next = match self.stack.last_mut() {
                Some(nested) => match nested.next() {
                    Some(v) => v,
                    None => {
                        self.stack.pop();
                        continue;
                    }
                },
                None => self.seq.next()?,
            };
            match next {
                Value::Array(items) => self.stack.push(items.into_iter()),
                atom => return Some(atom),
            }
        }
    }
}

/// Kind name used in error messages.
pub(crate) fn kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
