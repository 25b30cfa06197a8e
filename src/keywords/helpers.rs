//! Shared comparison helpers for keyword evaluation.

use num_cmp::NumCmp;
use serde_json::{Map, Number, Value};

macro_rules! against {
    ($left:expr, $right:expr, $op:ident) => {
        if let Some(right) = $right.as_u64() {
            NumCmp::$op($left, right)
        } else if let Some(right) = $right.as_i64() {
            NumCmp::$op($left, right)
        } else {
            NumCmp::$op($left, $right.as_f64().expect("number representation"))
        }
    };
}

macro_rules! number_cmp {
    ($name:ident, $op:ident) => {
        pub(crate) fn $name(left: &Number, right: &Number) -> bool {
            if let Some(left) = left.as_u64() {
                against!(left, right, $op)
            } else if let Some(left) = left.as_i64() {
                against!(left, right, $op)
            } else {
                let left = left.as_f64().expect("number representation");
                against!(left, right, $op)
            }
        }
    };
}

number_cmp!(number_eq, num_eq);
number_cmp!(number_lt, num_lt);
number_cmp!(number_le, num_le);
number_cmp!(number_gt, num_gt);
number_cmp!(number_ge, num_ge);

/// Whether a JSON number represents an integral value (`3.0` counts).
pub(crate) fn is_integral(number: &Number) -> bool {
    number.is_u64()
        || number.is_i64()
        || number.as_f64().map_or(false, |float| float.fract() == 0.0)
}

/// JSON equality with numeric equivalence across representations, so
/// `1`, `1.0`, and `1u64` compare equal wherever they appear.
pub(crate) fn equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(left), Value::Bool(right)) => left == right,
        (Value::String(left), Value::String(right)) => left == right,
        (Value::Number(left), Value::Number(right)) => number_eq(left, right),
        (Value::Array(left), Value::Array(right)) => equal_arrays(left, right),
        (Value::Object(left), Value::Object(right)) => equal_objects(left, right),
        (_, _) => false,
    }
}

pub(crate) fn equal_arrays(left: &[Value], right: &[Value]) -> bool {
    left.len() == right.len()
        && left
            .iter()
            .zip(right)
            .all(|(left, right)| equal(left, right))
}

pub(crate) fn equal_objects(left: &Map<String, Value>, right: &Map<String, Value>) -> bool {
    left.len() == right.len()
        && left.iter().all(|(key, left)| {
            right
                .get(key)
                .map_or(false, |right| equal(left, right))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    #[test_case(&json!(1), &json!(1.0), true; "positive ints equal")]
    #[test_case(&json!(-1), &json!(-1.0), true; "negative ints equal")]
    #[test_case(&json!(1), &json!(1.5), false; "ints not equal")]
    #[test_case(&json!([1, 2]), &json!([1.0, 2.0]), true; "arrays equal")]
    #[test_case(&json!({"a": 1}), &json!({"a": 1.0}), true; "objects equal")]
    #[test_case(&json!({"a": 1}), &json!({"b": 1}), false; "objects not equal")]
    #[test_case(&json!("1"), &json!(1), false; "string not equal to number")]
    fn equality(left: &Value, right: &Value, expected: bool) {
        assert_eq!(equal(left, right), expected);
    }

    #[test]
    fn mixed_representation_comparison() {
        let small = Number::from(3u64);
        let large = Number::from_f64(3.5).unwrap();
        assert!(number_lt(&small, &large));
        assert!(number_ge(&large, &small));
        let negative = Number::from(-7i64);
        assert!(number_lt(&negative, &small));
    }

    #[test_case(&Number::from(3u64), true; "positive int is integral")]
    #[test_case(&Number::from(-3i64), true; "negative int is integral")]
    #[test_case(&Number::from_f64(3.0).unwrap(), true; "whole float is integral")]
    #[test_case(&Number::from_f64(3.5).unwrap(), false; "fractional float is not integral")]
    fn integrality(number: &Number, expected: bool) {
        assert_eq!(is_integral(number), expected);
    }
}
