//! The `const` keyword.

use crate::{
    compiler::Context,
    context::EvalContext,
    error::{ValidationError, ValidationErrorKind},
    keywords::helpers,
    paths::{InstancePath, JsonPointer},
    schema::ObjectSchema,
    validator::KeywordValidator,
};
use serde_json::Value;

pub(crate) struct ConstValidator {
    expected: Value,
    location: JsonPointer,
}

pub(crate) fn compile(ctx: &Context, object: &ObjectSchema) -> KeywordValidator {
    KeywordValidator::Const(ConstValidator {
        expected: object.const_value().cloned().unwrap_or(Value::Null),
        location: ctx.location().join("const"),
    })
}

impl ConstValidator {
    pub(crate) fn validate(
        &self,
        _ctx: &mut EvalContext,
        instance: &Value,
        path: &InstancePath,
    ) -> Result<(), ValidationError> {
        if helpers::equal(instance, &self.expected) {
            Ok(())
        } else {
            Err(ValidationError::new(
                ValidationErrorKind::Constant {
                    expected: self.expected.clone(),
                },
                self.location.clone(),
                path.into(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::tests_util;
    use serde_json::{json, Value};
    use test_case::test_case;

    #[test_case(&json!({"const": 2}), &json!(2))]
    #[test_case(&json!({"const": 2}), &json!(2.0); "numeric equivalence")]
    #[test_case(&json!({"const": {"a": [1.0]}}), &json!({"a": [1]}))]
    #[test_case(&json!({"const": null}), &json!(null))]
    fn valid(schema: &Value, instance: &Value) {
        tests_util::is_valid(schema, instance);
    }

    #[test_case(&json!({"const": 2}), &json!(5))]
    #[test_case(&json!({"const": "a"}), &json!("b"))]
    #[test_case(&json!({"const": null}), &json!(0))]
    fn invalid(schema: &Value, instance: &Value) {
        tests_util::is_not_valid(schema, instance);
    }
}
