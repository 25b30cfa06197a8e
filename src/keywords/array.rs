//! Array keywords: shape constraints (`maxItems`, `minItems`,
//! `uniqueItems`) and applicators (`prefixItems`, `items`, `contains` with
//! its `minContains` / `maxContains` companions).

use crate::{
    compiler::{self, Context},
    context::EvalContext,
    error::{CompileError, ValidationError, ValidationErrorKind},
    fields::KeywordSet,
    keywords::{helpers, object::validate_child},
    paths::{InstancePath, JsonPointer},
    schema::ObjectSchema,
    validator::{KeywordValidator, SchemaNode},
};
use serde_json::Value;

pub(crate) struct ArrayShapeValidator {
    max_items: Option<u64>,
    min_items: Option<u64>,
    unique_items: bool,
    location: JsonPointer,
}

pub(crate) fn compile_shape(ctx: &Context, object: &ObjectSchema) -> Option<KeywordValidator> {
    let present = object.keywords();
    let max_items =
        (present.contains_all(KeywordSet::MAX_ITEMS) && ctx.enabled("maxItems"))
            .then(|| object.max_items());
    let min_items =
        (present.contains_all(KeywordSet::MIN_ITEMS) && ctx.enabled("minItems"))
            .then(|| object.min_items());
    let unique_items = present.contains_all(KeywordSet::UNIQUE_ITEMS)
        && ctx.enabled("uniqueItems")
        && object.unique_items();
    if max_items.is_none() && min_items.is_none() && !unique_items {
        return None;
    }
    Some(KeywordValidator::ArrayShape(ArrayShapeValidator {
        max_items,
        min_items,
        unique_items,
        location: ctx.location().clone(),
    }))
}

impl ArrayShapeValidator {
    pub(crate) fn validate(
        &self,
        _ctx: &mut EvalContext,
        instance: &Value,
        path: &InstancePath,
    ) -> Result<(), ValidationError> {
        let Value::Array(items) = instance else {
            return Ok(());
        };
        let count = items.len() as u64;
        if let Some(limit) = self.max_items {
            if count > limit {
                return Err(ValidationError::new(
                    ValidationErrorKind::MaxItems { limit, count },
                    self.location.join("maxItems"),
                    path.into(),
                ));
            }
        }
        if let Some(limit) = self.min_items {
            if count < limit {
                return Err(ValidationError::new(
                    ValidationErrorKind::MinItems { limit, count },
                    self.location.join("minItems"),
                    path.into(),
                ));
            }
        }
        if self.unique_items {
            if let Some((first, second)) = first_duplicate(items) {
                return Err(ValidationError::new(
                    ValidationErrorKind::UniqueItems { first, second },
                    self.location.join("uniqueItems"),
                    path.into(),
                ));
            }
        }
        Ok(())
    }
}

fn first_duplicate(items: &[Value]) -> Option<(usize, usize)> {
    for (second, candidate) in items.iter().enumerate().skip(1) {
        for (first, earlier) in items[..second].iter().enumerate() {
            if helpers::equal(earlier, candidate) {
                return Some((first, second));
            }
        }
    }
    None
}

pub(crate) struct ArrayApplicatorsValidator {
    prefix_items: Vec<SchemaNode>,
    items: Option<Box<SchemaNode>>,
    contains: Option<Box<SchemaNode>>,
    min_contains: Option<u64>,
    max_contains: Option<u64>,
    location: JsonPointer,
}

pub(crate) fn compile_applicators(
    ctx: &Context,
    object: &ObjectSchema,
) -> Result<Option<KeywordValidator>, CompileError> {
    let present = object.keywords();

    let mut prefix_items = Vec::new();
    if present.contains_all(KeywordSet::PREFIX_ITEMS) && ctx.enabled("prefixItems") {
        let ctx = ctx.at("prefixItems");
        for (index, schema) in object.prefix_items().iter().enumerate() {
            prefix_items.push(compiler::compile_node(&ctx.at(index), schema)?);
        }
    }

    let items = if present.contains_all(KeywordSet::ITEMS) && ctx.enabled("items") {
        object
            .items()
            .map(|schema| compiler::compile_node(&ctx.at("items"), schema).map(Box::new))
            .transpose()?
    } else {
        None
    };

    let contains = if present.contains_all(KeywordSet::CONTAINS) && ctx.enabled("contains") {
        object
            .contains()
            .map(|schema| compiler::compile_node(&ctx.at("contains"), schema).map(Box::new))
            .transpose()?
    } else {
        None
    };
    // minContains / maxContains only mean something next to `contains`.
    let min_contains = (contains.is_some()
        && present.contains_all(KeywordSet::MIN_CONTAINS)
        && ctx.enabled("minContains"))
    .then(|| object.min_contains());
    let max_contains = (contains.is_some()
        && present.contains_all(KeywordSet::MAX_CONTAINS)
        && ctx.enabled("maxContains"))
    .then(|| object.max_contains());

    if prefix_items.is_empty() && items.is_none() && contains.is_none() {
        return Ok(None);
    }
    Ok(Some(KeywordValidator::ArrayApplicators(
        ArrayApplicatorsValidator {
            prefix_items,
            items,
            contains,
            min_contains,
            max_contains,
            location: ctx.location().clone(),
        },
    )))
}

impl ArrayApplicatorsValidator {
    pub(crate) fn validate(
        &self,
        ctx: &mut EvalContext,
        instance: &Value,
        path: &InstancePath,
    ) -> Result<(), ValidationError> {
        let Value::Array(items) = instance else {
            return Ok(());
        };

        for (index, (node, value)) in self.prefix_items.iter().zip(items).enumerate() {
            let child_path = path.push(index);
            validate_child(node, ctx, value, &child_path)?;
            ctx.mark_item(index);
        }

        if let Some(node) = &self.items {
            for (index, value) in items.iter().enumerate().skip(self.prefix_items.len()) {
                let child_path = path.push(index);
                validate_child(node, ctx, value, &child_path)?;
                ctx.mark_item(index);
            }
        }

        if let Some(node) = &self.contains {
            let mut matches = 0u64;
            for (index, value) in items.iter().enumerate() {
                let child_path = path.push(index);
                match validate_child(node, ctx, value, &child_path) {
                    Ok(()) => {
                        ctx.mark_item(index);
                        matches += 1;
                    }
                    Err(error) if error.is_cancelled() => return Err(error),
                    Err(_) => {}
                }
            }
            let minimum = self.min_contains.unwrap_or(1);
            if matches < minimum {
                let kind = if self.min_contains.is_none() {
                    ValidationErrorKind::Contains
                } else {
                    ValidationErrorKind::MinContains {
                        limit: minimum,
                        count: matches,
                    }
                };
                let keyword = if self.min_contains.is_none() {
                    "contains"
                } else {
                    "minContains"
                };
                return Err(ValidationError::new(
                    kind,
                    self.location.join(keyword),
                    path.into(),
                ));
            }
            if let Some(limit) = self.max_contains {
                if matches > limit {
                    return Err(ValidationError::new(
                        ValidationErrorKind::MaxContains {
                            limit,
                            count: matches,
                        },
                        self.location.join("maxContains"),
                        path.into(),
                    ));
                }
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

    #[test_case(&json!({"items": {"type": "integer"}}), &json!([1, 2, 3]))]
    #[test_case(&json!({"items": {"type": "integer"}}), &json!([]))]
    #[test_case(&json!({"prefixItems": [{"type": "string"}, {"type": "integer"}]}), &json!(["a", 1, true]))]
    #[test_case(&json!({"prefixItems": [{"type": "string"}], "items": {"type": "integer"}}), &json!(["a", 1, 2]))]
    #[test_case(&json!({"maxItems": 2}), &json!([1, 2]))]
    #[test_case(&json!({"minItems": 2}), &json!([1, 2]))]
    #[test_case(&json!({"uniqueItems": true}), &json!([1, 2, 3]))]
    #[test_case(&json!({"uniqueItems": false}), &json!([1, 1]))]
    #[test_case(&json!({"contains": {"minimum": 5}}), &json!([1, 7]))]
    #[test_case(&json!({"contains": {"minimum": 5}, "minContains": 0}), &json!([1, 2]); "minContains zero")]
    #[test_case(&json!({"contains": {"minimum": 5}, "minContains": 2, "maxContains": 3}), &json!([5, 6, 1]))]
    #[test_case(&json!({"maxItems": 0}), &json!("not an array"); "non-arrays ignored")]
    fn valid(schema: &Value, instance: &Value) {
        tests_util::is_valid(schema, instance);
    }

    #[test_case(&json!({"items": {"type": "integer"}}), &json!([1, "x"]))]
    #[test_case(&json!({"prefixItems": [{"type": "string"}]}), &json!([1]))]
    #[test_case(&json!({"prefixItems": [{"type": "string"}], "items": {"type": "integer"}}), &json!(["a", "b"]))]
    #[test_case(&json!({"maxItems": 2}), &json!([1, 2, 3]))]
    #[test_case(&json!({"minItems": 2}), &json!([1]))]
    #[test_case(&json!({"uniqueItems": true}), &json!([1, 2, 2]))]
    #[test_case(&json!({"contains": {"minimum": 5}}), &json!([1, 2]))]
    #[test_case(&json!({"contains": {"minimum": 5}, "minContains": 2}), &json!([5, 1]))]
    #[test_case(&json!({"contains": {"minimum": 5}, "maxContains": 1}), &json!([5, 6]))]
    fn invalid(schema: &Value, instance: &Value) {
        tests_util::is_not_valid(schema, instance);
    }

    #[test]
    fn duplicate_error_names_indexes() {
        let error = tests_util::validate_error(&json!({"uniqueItems": true}), &json!([1, 2, 2]));
        assert_eq!(
            error.to_string(),
            "array has duplicate items at indexes 1 and 2"
        );
    }

    #[test]
    fn max_items_message_names_both_numbers() {
        let error = tests_util::validate_error(
            &json!({"maxItems": 5}),
            &json!([1, 2, 3, 4, 5, 6]),
        );
        assert_eq!(error.to_string(), "array has 6 items, more than the maximum of 5");
    }

    #[test]
    fn item_error_carries_instance_path() {
        let error = tests_util::validate_error(
            &json!({"items": {"type": "integer"}}),
            &json!([1, "x"]),
        );
        assert_eq!(error.instance_path.to_string(), "/1");
        assert_eq!(error.schema_path.to_string(), "/items/type");
    }
}
