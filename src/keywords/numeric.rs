//! Numeric constraints: `multipleOf` and the four bound keywords.

use crate::{
    compiler::Context,
    context::EvalContext,
    error::{ValidationError, ValidationErrorKind},
    fields::KeywordSet,
    keywords::helpers,
    paths::{InstancePath, JsonPointer},
    primitive_type::PrimitiveType,
    schema::ObjectSchema,
    validator::KeywordValidator,
};
use serde_json::{Number, Value};

/// Tolerance for float `multipleOf`: the remainder and its distance from
/// the divisor are both compared against this bound.
const MULTIPLE_OF_TOLERANCE: f64 = 1e-9;

pub(crate) struct NumberValidator {
    multiple_of: Option<f64>,
    maximum: Option<Number>,
    exclusive_maximum: Option<Number>,
    minimum: Option<Number>,
    exclusive_minimum: Option<Number>,
    location: JsonPointer,
}

pub(crate) fn compile(ctx: &Context, object: &ObjectSchema) -> Option<KeywordValidator> {
    let present = object.keywords();
    let gate = |flag: KeywordSet, name: &str| present.contains_all(flag) && ctx.enabled(name);

    let multiple_of = if gate(KeywordSet::MULTIPLE_OF, "multipleOf") {
        object
            .multiple_of()
            .and_then(Number::as_f64)
            .filter(|divisor| !skips_multiple_of(object, *divisor))
    } else {
        None
    };
    let maximum = gate(KeywordSet::MAXIMUM, "maximum").then(|| object.maximum().cloned()).flatten();
    let exclusive_maximum = gate(KeywordSet::EXCLUSIVE_MAXIMUM, "exclusiveMaximum")
        .then(|| object.exclusive_maximum().cloned())
        .flatten();
    let minimum = gate(KeywordSet::MINIMUM, "minimum").then(|| object.minimum().cloned()).flatten();
    let exclusive_minimum = gate(KeywordSet::EXCLUSIVE_MINIMUM, "exclusiveMinimum")
        .then(|| object.exclusive_minimum().cloned())
        .flatten();

    if multiple_of.is_none()
        && maximum.is_none()
        && exclusive_maximum.is_none()
        && minimum.is_none()
        && exclusive_minimum.is_none()
    {
        return None;
    }
    Some(KeywordValidator::Number(NumberValidator {
        multiple_of,
        maximum,
        exclusive_maximum,
        minimum,
        exclusive_minimum,
        location: ctx.location().clone(),
    }))
}

/// An integer-typed schema trivially satisfies any `multipleOf` in (0, 1),
/// so the check is dropped at compile time.
fn skips_multiple_of(object: &ObjectSchema, divisor: f64) -> bool {
    object.types().contains(PrimitiveType::Integer)
        && !object.types().contains(PrimitiveType::Number)
        && divisor > 0.0
        && divisor < 1.0
}

impl NumberValidator {
    pub(crate) fn validate(
        &self,
        _ctx: &mut EvalContext,
        instance: &Value,
        path: &InstancePath,
    ) -> Result<(), ValidationError> {
        let Value::Number(item) = instance else {
            return Ok(());
        };
        if let Some(divisor) = self.multiple_of {
            if !is_multiple_of(item, divisor) {
                return Err(ValidationError::new(
                    ValidationErrorKind::MultipleOf {
                        multiple_of: divisor,
                    },
                    self.location.join("multipleOf"),
                    path.into(),
                ));
            }
        }
        if let Some(limit) = &self.maximum {
            if helpers::number_gt(item, limit) {
                return Err(ValidationError::new(
                    ValidationErrorKind::Maximum {
                        limit: Value::Number(limit.clone()),
                    },
                    self.location.join("maximum"),
                    path.into(),
                ));
            }
        }
        if let Some(limit) = &self.exclusive_maximum {
            if helpers::number_ge(item, limit) {
                return Err(ValidationError::new(
                    ValidationErrorKind::ExclusiveMaximum {
                        limit: Value::Number(limit.clone()),
                    },
                    self.location.join("exclusiveMaximum"),
                    path.into(),
                ));
            }
        }
        if let Some(limit) = &self.minimum {
            if helpers::number_lt(item, limit) {
                return Err(ValidationError::new(
                    ValidationErrorKind::Minimum {
                        limit: Value::Number(limit.clone()),
                    },
                    self.location.join("minimum"),
                    path.into(),
                ));
            }
        }
        if let Some(limit) = &self.exclusive_minimum {
            if helpers::number_le(item, limit) {
                return Err(ValidationError::new(
                    ValidationErrorKind::ExclusiveMinimum {
                        limit: Value::Number(limit.clone()),
                    },
                    self.location.join("exclusiveMinimum"),
                    path.into(),
                ));
            }
        }
        Ok(())
    }
}

fn is_multiple_of(item: &Number, divisor: f64) -> bool {
    let item = item.as_f64().expect("number representation");
    if divisor.fract() == 0.0 {
        // A value with a fractional part is never a multiple of an integer.
        return item.fract() == 0.0 && (item % divisor) == 0.0;
    }
    let remainder = (item % divisor).abs();
    remainder < MULTIPLE_OF_TOLERANCE || (divisor - remainder).abs() < MULTIPLE_OF_TOLERANCE
}

#[cfg(test)]
mod tests {
    use crate::tests_util;
    use serde_json::{json, Value};
    use test_case::test_case;

    #[test_case(&json!({"multipleOf": 2}), &json!(4))]
    #[test_case(&json!({"multipleOf": 1.5}), &json!(4.5))]
    #[test_case(&json!({"multipleOf": 0.01}), &json!(19.99); "tolerance absorbs float noise")]
    #[test_case(&json!({"maximum": 3}), &json!(3.0); "boundary max")]
    #[test_case(&json!({"minimum": 3}), &json!(3))]
    #[test_case(&json!({"exclusiveMaximum": 3}), &json!(2.9))]
    #[test_case(&json!({"exclusiveMinimum": 1}), &json!(1.1))]
    #[test_case(&json!({"minimum": 100}), &json!("text"); "non-numbers ignored")]
    #[test_case(&json!({"type": "integer", "multipleOf": 0.5}), &json!(7); "integer skips fractional divisor")]
    fn valid(schema: &Value, instance: &Value) {
        tests_util::is_valid(schema, instance);
    }

    #[test_case(&json!({"multipleOf": 2}), &json!(7))]
    #[test_case(&json!({"multipleOf": 1.5}), &json!(4.0))]
    #[test_case(&json!({"maximum": 3}), &json!(3.5))]
    #[test_case(&json!({"minimum": 3}), &json!(2.5))]
    #[test_case(&json!({"exclusiveMaximum": 3}), &json!(3))]
    #[test_case(&json!({"exclusiveMinimum": 1}), &json!(1.0))]
    #[test_case(&json!({"minimum": 1}), &json!(-2))]
    fn invalid(schema: &Value, instance: &Value) {
        tests_util::is_not_valid(schema, instance);
    }

    #[test]
    fn large_integers_compare_exactly() {
        tests_util::is_valid(&json!({"minimum": 0}), &json!(u64::MAX));
        tests_util::is_not_valid(&json!({"maximum": 0}), &json!(u64::MAX));
    }

    #[test]
    fn error_location() {
        tests_util::assert_schema_path(&json!({"multipleOf": 2}), &json!(3), "/multipleOf");
    }
}
