//! The `type` keyword.

use crate::{
    compiler::Context,
    context::EvalContext,
    error::{ValidationError, ValidationErrorKind},
    keywords::helpers,
    paths::{InstancePath, JsonPointer},
    primitive_type::{PrimitiveType, PrimitiveTypeSet},
    schema::ObjectSchema,
    validator::KeywordValidator,
};
use serde_json::Value;

pub(crate) struct TypeValidator {
    types: PrimitiveTypeSet,
    location: JsonPointer,
}

pub(crate) fn compile(ctx: &Context, object: &ObjectSchema) -> KeywordValidator {
    KeywordValidator::Type(TypeValidator {
        types: object.types(),
        location: ctx.location().join("type"),
    })
}

impl TypeValidator {
    pub(crate) fn validate(
        &self,
        _ctx: &mut EvalContext,
        instance: &Value,
        path: &InstancePath,
    ) -> Result<(), ValidationError> {
        let matches = match instance {
            Value::Number(number) => {
                self.types.contains(PrimitiveType::Number)
                    // Integral floats satisfy `integer`; 3.0 counts as 3.
                    || (self.types.contains(PrimitiveType::Integer)
                        && helpers::is_integral(number))
            }
            other => self.types.contains(PrimitiveType::from(other)),
        };
        if matches {
            Ok(())
        } else {
            Err(ValidationError::new(
                ValidationErrorKind::Type {
                    expected: self.types,
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

    #[test_case(&json!({"type": "integer"}), &json!(3))]
    #[test_case(&json!({"type": "integer"}), &json!(3.0); "integral float")]
    #[test_case(&json!({"type": "integer"}), &json!(-2))]
    #[test_case(&json!({"type": "number"}), &json!(3))]
    #[test_case(&json!({"type": "number"}), &json!(3.5))]
    #[test_case(&json!({"type": ["integer", "string"]}), &json!("s"))]
    #[test_case(&json!({"type": "null"}), &json!(null))]
    #[test_case(&json!({"type": "array"}), &json!([]))]
    fn valid(schema: &Value, instance: &Value) {
        tests_util::is_valid(schema, instance);
    }

    #[test_case(&json!({"type": "integer"}), &json!(3.5))]
    #[test_case(&json!({"type": "integer"}), &json!("3"))]
    #[test_case(&json!({"type": "string"}), &json!(null))]
    #[test_case(&json!({"type": ["integer", "string"]}), &json!(null))]
    #[test_case(&json!({"type": "boolean"}), &json!(0))]
    fn invalid(schema: &Value, instance: &Value) {
        tests_util::is_not_valid(schema, instance);
    }

    #[test]
    fn error_location() {
        tests_util::assert_schema_path(&json!({"type": "integer"}), &json!("x"), "/type");
    }
}
