//! String constraints: `maxLength`, `minLength`, `pattern`.
//!
//! Lengths count Unicode code points, not bytes.

use crate::{
    compiler::Context,
    context::EvalContext,
    error::{CompileError, ValidationError, ValidationErrorKind},
    fields::KeywordSet,
    paths::{InstancePath, JsonPointer},
    schema::ObjectSchema,
    validator::KeywordValidator,
};
use fancy_regex::Regex;
use serde_json::Value;

pub(crate) struct StringValidator {
    max_length: Option<u64>,
    min_length: Option<u64>,
    pattern: Option<(String, Regex)>,
    location: JsonPointer,
}

pub(crate) fn compile(
    ctx: &Context,
    object: &ObjectSchema,
) -> Result<Option<KeywordValidator>, CompileError> {
    let present = object.keywords();
    let max_length = (present.contains_all(KeywordSet::MAX_LENGTH)
        && ctx.enabled("maxLength"))
    .then(|| object.max_length());
    let min_length = (present.contains_all(KeywordSet::MIN_LENGTH)
        && ctx.enabled("minLength"))
    .then(|| object.min_length());
    let pattern = if present.contains_all(KeywordSet::PATTERN) && ctx.enabled("pattern") {
        let source = object.pattern();
        // Patterns compile once per schema; failure aborts compilation.
        let regex = Regex::new(source).map_err(|error| CompileError::InvalidPattern {
            pattern: source.to_owned(),
            source: Box::new(error),
        })?;
        Some((source.to_owned(), regex))
    } else {
        None
    };
    if max_length.is_none() && min_length.is_none() && pattern.is_none() {
        return Ok(None);
    }
    Ok(Some(KeywordValidator::String(StringValidator {
        max_length,
        min_length,
        pattern,
        location: ctx.location().clone(),
    })))
}

impl StringValidator {
    pub(crate) fn validate(
        &self,
        _ctx: &mut EvalContext,
        instance: &Value,
        path: &InstancePath,
    ) -> Result<(), ValidationError> {
        let Value::String(item) = instance else {
            return Ok(());
        };
        let length = bytecount::num_chars(item.as_bytes()) as u64;
        if let Some(limit) = self.max_length {
            if length > limit {
                return Err(ValidationError::new(
                    ValidationErrorKind::MaxLength { limit, length },
                    self.location.join("maxLength"),
                    path.into(),
                ));
            }
        }
        if let Some(limit) = self.min_length {
            if length < limit {
                return Err(ValidationError::new(
                    ValidationErrorKind::MinLength { limit, length },
                    self.location.join("minLength"),
                    path.into(),
                ));
            }
        }
        if let Some((source, regex)) = &self.pattern {
            if !matches!(regex.is_match(item), Ok(true)) {
                return Err(ValidationError::new(
                    ValidationErrorKind::Pattern {
                        pattern: source.clone(),
                    },
                    self.location.join("pattern"),
                    path.into(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::tests_util;
    use serde_json::{json, Value};
    use test_case::test_case;

    #[test_case(&json!({"minLength": 3}), &json!("foo"); "boundary accepts")]
    #[test_case(&json!({"maxLength": 3}), &json!("foo"))]
    #[test_case(&json!({"minLength": 2}), &json!("äö"); "code points not bytes")]
    #[test_case(&json!({"maxLength": 2}), &json!("日本"); "multibyte max")]
    #[test_case(&json!({"pattern": "^a+$"}), &json!("aaa"))]
    #[test_case(&json!({"minLength": 100}), &json!(42); "non-strings ignored")]
    fn valid(schema: &Value, instance: &Value) {
        tests_util::is_valid(schema, instance);
    }

    #[test_case(&json!({"minLength": 4}), &json!("foo"); "one short")]
    #[test_case(&json!({"maxLength": 2}), &json!("foo"))]
    #[test_case(&json!({"maxLength": 1}), &json!("äö"))]
    #[test_case(&json!({"pattern": "^a+$"}), &json!("abc"))]
    fn invalid(schema: &Value, instance: &Value) {
        tests_util::is_not_valid(schema, instance);
    }

    #[test]
    fn message_names_both_numbers() {
        let error = tests_util::validate_error(&json!({"minLength": 1}), &json!(""));
        assert_eq!(
            error.to_string(),
            "string length (0) is shorter than minLength (1)"
        );
    }

    #[test]
    fn error_locations() {
        tests_util::assert_schema_path(&json!({"minLength": 1}), &json!(""), "/minLength");
        tests_util::assert_schema_path(&json!({"pattern": "^a"}), &json!("b"), "/pattern");
    }
}
