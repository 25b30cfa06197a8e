//! `unevaluatedProperties` and `unevaluatedItems`.
//!
//! These run last within their schema node, consuming the annotations every
//! earlier keyword (and every in-place applicator, including references)
//! merged into the current frame.

use crate::{
    compiler::{self, Context},
    context::EvalContext,
    error::{CompileError, ValidationError, ValidationErrorKind},
    keywords::object::validate_child,
    paths::{InstancePath, JsonPointer},
    schema::ObjectSchema,
    validator::{KeywordValidator, SchemaNode},
};
use serde_json::Value;

pub(crate) struct UnevaluatedPropertiesValidator {
    node: Box<SchemaNode>,
    location: JsonPointer,
}

pub(crate) struct UnevaluatedItemsValidator {
    node: Box<SchemaNode>,
    location: JsonPointer,
}

pub(crate) fn compile_properties(
    ctx: &Context,
    object: &ObjectSchema,
) -> Result<KeywordValidator, CompileError> {
    let schema = object
        .unevaluated_properties()
        .expect("`unevaluatedProperties` keyword is present");
    let node = compiler::compile_node(&ctx.at("unevaluatedProperties"), schema)?;
    Ok(KeywordValidator::UnevaluatedProperties(
        UnevaluatedPropertiesValidator {
            node: Box::new(node),
            location: ctx.location().join("unevaluatedProperties"),
        },
    ))
}

pub(crate) fn compile_items(
    ctx: &Context,
    object: &ObjectSchema,
) -> Result<KeywordValidator, CompileError> {
    let schema = object
        .unevaluated_items()
        .expect("`unevaluatedItems` keyword is present");
    let node = compiler::compile_node(&ctx.at("unevaluatedItems"), schema)?;
    Ok(KeywordValidator::UnevaluatedItems(
        UnevaluatedItemsValidator {
            node: Box::new(node),
            location: ctx.location().join("unevaluatedItems"),
        },
    ))
}

impl UnevaluatedPropertiesValidator {
    pub(crate) fn validate(
        &self,
        ctx: &mut EvalContext,
        instance: &Value,
        path: &InstancePath,
    ) -> Result<(), ValidationError> {
        let Value::Object(item) = instance else {
            return Ok(());
        };
        for (key, value) in item {
            if ctx.property_evaluated(key) {
                continue;
            }
            let child_path = path.push(key.as_str());
            if let Err(error) = validate_child(&self.node, ctx, value, &child_path) {
                if error.is_cancelled() {
                    return Err(error);
                }
                return Err(ValidationError::new(
                    ValidationErrorKind::UnevaluatedProperties {
                        property: key.clone(),
                    },
                    self.location.clone(),
                    (&child_path).into(),
                )
                .with_cause(error));
            }
            ctx.mark_property(key);
        }
        Ok(())
    }
}

impl UnevaluatedItemsValidator {
    pub(crate) fn validate(
        &self,
        ctx: &mut EvalContext,
        instance: &Value,
        path: &InstancePath,
    ) -> Result<(), ValidationError> {
        let Value::Array(items) = instance else {
            return Ok(());
        };
        for (index, value) in items.iter().enumerate() {
            if ctx.item_evaluated(index) {
                continue;
            }
            let child_path = path.push(index);
            if let Err(error) = validate_child(&self.node, ctx, value, &child_path) {
                if error.is_cancelled() {
                    return Err(error);
                }
                return Err(ValidationError::new(
                    ValidationErrorKind::UnevaluatedItems { index },
                    self.location.clone(),
                    (&child_path).into(),
                )
                .with_cause(error));
            }
            ctx.mark_item(index);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::tests_util;
    use serde_json::{json, Value};
    use test_case::test_case;

    #[test_case(
        &json!({"properties": {"a": true}, "unevaluatedProperties": false}),
        &json!({"a": 1})
    )]
    #[test_case(
        &json!({"unevaluatedProperties": {"type": "integer"}}),
        &json!({"a": 1, "b": 2})
    )]
    #[test_case(
        &json!({
            "allOf": [{"properties": {"a": true}}, {"properties": {"b": true}}],
            "unevaluatedProperties": false
        }),
        &json!({"a": 1, "b": 2});
        "all-of branches contribute annotations"
    )]
    #[test_case(
        &json!({
            "anyOf": [
                {"properties": {"a": true}, "required": ["a"]},
                {"properties": {"b": true}, "required": ["b"]}
            ],
            "unevaluatedProperties": false
        }),
        &json!({"a": 1});
        "successful any-of branch contributes"
    )]
    #[test_case(
        &json!({
            "$ref": "#/$defs/base",
            "$defs": {"base": {"properties": {"a": true}}},
            "unevaluatedProperties": false
        }),
        &json!({"a": 1});
        "annotations cross reference boundaries"
    )]
    #[test_case(
        &json!({"prefixItems": [true], "unevaluatedItems": false}),
        &json!([1])
    )]
    #[test_case(
        &json!({"contains": {"type": "integer"}, "unevaluatedItems": false}),
        &json!([1, 2]);
        "contains marks matched items"
    )]
    fn valid(schema: &Value, instance: &Value) {
        tests_util::is_valid(schema, instance);
    }

    #[test_case(
        &json!({"properties": {"a": true}, "unevaluatedProperties": false}),
        &json!({"a": 1, "b": 2})
    )]
    #[test_case(
        &json!({"unevaluatedProperties": {"type": "integer"}}),
        &json!({"a": "x"})
    )]
    #[test_case(
        &json!({
            "anyOf": [
                {"properties": {"a": true}, "required": ["a"]},
                {"properties": {"b": true}, "required": ["b"]}
            ],
            "unevaluatedProperties": false
        }),
        &json!({"a": 1, "c": 3});
        "failed branches contribute nothing"
    )]
    #[test_case(
        &json!({"prefixItems": [true], "unevaluatedItems": false}),
        &json!([1, 2])
    )]
    #[test_case(
        &json!({"contains": {"type": "integer"}, "unevaluatedItems": false}),
        &json!([1, "x"])
    )]
    fn invalid(schema: &Value, instance: &Value) {
        tests_util::is_not_valid(schema, instance);
    }

    #[test]
    fn unevaluated_property_error_names_the_key() {
        let error = tests_util::validate_error(
            &json!({"properties": {"a": true}, "unevaluatedProperties": false}),
            &json!({"a": 1, "b": 2}),
        );
        assert_eq!(
            error.to_string(),
            "unevaluated property \"b\" is not allowed"
        );
        assert_eq!(error.instance_path.to_string(), "/b");
    }

    #[test]
    fn if_annotations_are_discarded() {
        // The `if` branch evaluates `a` only for its verdict; the
        // annotation does not escape, so `a` is unevaluated here.
        let schema = json!({
            "if": {"properties": {"a": {"type": "integer"}}},
            "unevaluatedProperties": false
        });
        tests_util::is_not_valid(&schema, &json!({"a": 1}));
    }

    #[test]
    fn failed_not_contributes_nothing() {
        let schema = json!({
            "not": {"properties": {"a": {"type": "string"}}, "required": ["a"]},
            "unevaluatedProperties": false
        });
        tests_util::is_not_valid(&schema, &json!({"a": 1}));
    }
}
