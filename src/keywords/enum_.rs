//! The `enum` keyword.

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

pub(crate) struct EnumValidator {
    options: Vec<Value>,
    location: JsonPointer,
}

pub(crate) fn compile(ctx: &Context, object: &ObjectSchema) -> KeywordValidator {
    KeywordValidator::Enum(EnumValidator {
        options: object.enum_values().to_vec(),
        location: ctx.location().join("enum"),
    })
}

impl EnumValidator {
    pub(crate) fn validate(
        &self,
        _ctx: &mut EvalContext,
        instance: &Value,
        path: &InstancePath,
    ) -> Result<(), ValidationError> {
        if self
            .options
            .iter()
            .any(|option| helpers::equal(instance, option))
        {
            Ok(())
        } else {
            Err(ValidationError::new(
                ValidationErrorKind::Enumeration {
                    options: self.options.clone(),
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

    #[test_case(&json!({"enum": [1, 2, 3]}), &json!(2))]
    #[test_case(&json!({"enum": [1.0]}), &json!(1))]
    #[test_case(&json!({"enum": ["a", null]}), &json!(null))]
    fn valid(schema: &Value, instance: &Value) {
        tests_util::is_valid(schema, instance);
    }

    #[test_case(&json!({"enum": [1, 2, 3]}), &json!(4))]
    #[test_case(&json!({"enum": []}), &json!(1); "empty options")]
    fn invalid(schema: &Value, instance: &Value) {
        tests_util::is_not_valid(schema, instance);
    }

    #[test]
    fn error_location() {
        tests_util::assert_schema_path(&json!({"enum": [1]}), &json!(2), "/enum");
    }
}
