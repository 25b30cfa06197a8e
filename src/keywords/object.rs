//! Object keywords: shape constraints (`maxProperties`, `minProperties`,
//! `required`) and applicators (`properties`, `patternProperties`,
//! `additionalProperties`, `propertyNames`, `dependentSchemas`,
//! `dependentRequired`).

use crate::{
    compiler::{self, Context},
    context::EvalContext,
    error::{CompileError, ValidationError, ValidationErrorKind},
    fields::KeywordSet,
    paths::{InstancePath, JsonPointer},
    schema::ObjectSchema,
    validator::{KeywordValidator, SchemaNode},
};
use fancy_regex::Regex;
use serde_json::Value;

pub(crate) struct ObjectShapeValidator {
    max_properties: Option<u64>,
    min_properties: Option<u64>,
    required: Vec<String>,
    location: JsonPointer,
}

pub(crate) fn compile_shape(ctx: &Context, object: &ObjectSchema) -> Option<KeywordValidator> {
    let present = object.keywords();
    let max_properties = (present.contains_all(KeywordSet::MAX_PROPERTIES)
        && ctx.enabled("maxProperties"))
    .then(|| object.max_properties());
    let min_properties = (present.contains_all(KeywordSet::MIN_PROPERTIES)
        && ctx.enabled("minProperties"))
    .then(|| object.min_properties());
    let required = if present.contains_all(KeywordSet::REQUIRED) && ctx.enabled("required") {
        object.required().to_vec()
    } else {
        Vec::new()
    };
    if max_properties.is_none() && min_properties.is_none() && required.is_empty() {
        return None;
    }
    Some(KeywordValidator::ObjectShape(ObjectShapeValidator {
        max_properties,
        min_properties,
        required,
        location: ctx.location().clone(),
    }))
}

impl ObjectShapeValidator {
    pub(crate) fn validate(
        &self,
        _ctx: &mut EvalContext,
        instance: &Value,
        path: &InstancePath,
    ) -> Result<(), ValidationError> {
        let Value::Object(item) = instance else {
            return Ok(());
        };
        let count = item.len() as u64;
        if let Some(limit) = self.max_properties {
            if count > limit {
                return Err(ValidationError::new(
                    ValidationErrorKind::MaxProperties { limit, count },
                    self.location.join("maxProperties"),
                    path.into(),
                ));
            }
        }
        if let Some(limit) = self.min_properties {
            if count < limit {
                return Err(ValidationError::new(
                    ValidationErrorKind::MinProperties { limit, count },
                    self.location.join("minProperties"),
                    path.into(),
                ));
            }
        }
        for name in &self.required {
            if !item.contains_key(name) {
                return Err(ValidationError::new(
                    ValidationErrorKind::Required {
                        property: name.clone(),
                    },
                    self.location.join("required"),
                    path.into(),
                ));
            }
        }
        Ok(())
    }
}

pub(crate) struct ObjectApplicatorsValidator {
    properties: Vec<(String, SchemaNode)>,
    pattern_properties: Vec<(String, Regex, SchemaNode)>,
    additional_properties: Option<Box<SchemaNode>>,
    property_names: Option<Box<SchemaNode>>,
    dependent_schemas: Vec<(String, SchemaNode)>,
    dependent_required: Vec<(String, Vec<String>)>,
    location: JsonPointer,
}

pub(crate) fn compile_applicators(
    ctx: &Context,
    object: &ObjectSchema,
) -> Result<Option<KeywordValidator>, CompileError> {
    let present = object.keywords();

    let mut properties = Vec::new();
    if present.contains_all(KeywordSet::PROPERTIES) && ctx.enabled("properties") {
        let ctx = ctx.at("properties");
        for (name, schema) in object.properties() {
            let node = compiler::compile_node(&ctx.at(name.clone()), schema)?;
            properties.push((name.clone(), node));
        }
    }

    let mut pattern_properties = Vec::new();
    if present.contains_all(KeywordSet::PATTERN_PROPERTIES) && ctx.enabled("patternProperties") {
        let ctx = ctx.at("patternProperties");
        for (pattern, schema) in object.pattern_properties() {
            let regex = Regex::new(pattern).map_err(|error| CompileError::InvalidPattern {
                pattern: pattern.clone(),
                source: Box::new(error),
            })?;
            let node = compiler::compile_node(&ctx.at(pattern.clone()), schema)?;
            pattern_properties.push((pattern.clone(), regex, node));
        }
    }

    let additional_properties = if present.contains_all(KeywordSet::ADDITIONAL_PROPERTIES)
        && ctx.enabled("additionalProperties")
    {
        object
            .additional_properties()
            .map(|schema| {
                compiler::compile_node(&ctx.at("additionalProperties"), schema).map(Box::new)
            })
            .transpose()?
    } else {
        None
    };

    let property_names = if present.contains_all(KeywordSet::PROPERTY_NAMES)
        && ctx.enabled("propertyNames")
    {
        object
            .property_names()
            .map(|schema| compiler::compile_node(&ctx.at("propertyNames"), schema).map(Box::new))
            .transpose()?
    } else {
        None
    };

    let mut dependent_schemas = Vec::new();
    if present.contains_all(KeywordSet::DEPENDENT_SCHEMAS) && ctx.enabled("dependentSchemas") {
        let ctx = ctx.at("dependentSchemas");
        for (name, schema) in object.dependent_schemas() {
            let node = compiler::compile_node(&ctx.at(name.clone()), schema)?;
            dependent_schemas.push((name.clone(), node));
        }
    }

    let dependent_required = if present.contains_all(KeywordSet::DEPENDENT_REQUIRED)
        && ctx.enabled("dependentRequired")
    {
        object
            .dependent_required()
            .iter()
            .map(|(name, dependencies)| (name.clone(), dependencies.clone()))
            .collect()
    } else {
        Vec::new()
    };

    if properties.is_empty()
        && pattern_properties.is_empty()
        && additional_properties.is_none()
        && property_names.is_none()
        && dependent_schemas.is_empty()
        && dependent_required.is_empty()
    {
        return Ok(None);
    }
    Ok(Some(KeywordValidator::ObjectApplicators(
        ObjectApplicatorsValidator {
            properties,
            pattern_properties,
            additional_properties,
            property_names,
            dependent_schemas,
            dependent_required,
            location: ctx.location().clone(),
        },
    )))
}

impl ObjectApplicatorsValidator {
    pub(crate) fn validate(
        &self,
        ctx: &mut EvalContext,
        instance: &Value,
        path: &InstancePath,
    ) -> Result<(), ValidationError> {
        let Value::Object(item) = instance else {
            return Ok(());
        };

        // `properties` first, then `patternProperties`, then
        // `additionalProperties` over whatever neither matched. Each
        // successful match marks its property evaluated in the current
        // frame.
        for (name, node) in &self.properties {
            if let Some(value) = item.get(name) {
                let child_path = path.push(name.as_str());
                validate_child(node, ctx, value, &child_path)?;
                ctx.mark_property(name);
            }
        }

        for (_, regex, node) in &self.pattern_properties {
            for (key, value) in item {
                if matches!(regex.is_match(key), Ok(true)) {
                    let child_path = path.push(key.as_str());
                    validate_child(node, ctx, value, &child_path)?;
                    ctx.mark_property(key);
                }
            }
        }

        if let Some(node) = &self.additional_properties {
            for (key, value) in item {
                if self.matched_by_earlier_applicator(key) {
                    continue;
                }
                let child_path = path.push(key.as_str());
                if let Err(error) = validate_child(node, ctx, value, &child_path) {
                    return Err(ValidationError::new(
                        ValidationErrorKind::AdditionalProperties {
                            property: key.clone(),
                        },
                        self.location.join("additionalProperties"),
                        (&child_path).into(),
                    )
                    .with_cause(error));
                }
                ctx.mark_property(key);
            }
        }

        if let Some(node) = &self.property_names {
            for key in item.keys() {
                let name_instance = Value::String(key.clone());
                if let Err(error) = validate_child(node, ctx, &name_instance, path) {
                    return Err(ValidationError::new(
                        ValidationErrorKind::PropertyNames {
                            property: key.clone(),
                        },
                        self.location.join("propertyNames"),
                        path.into(),
                    )
                    .with_cause(error));
                }
            }
        }

        // `dependentSchemas` applies to the whole object, so annotations it
        // produces land in the current frame.
        for (name, node) in &self.dependent_schemas {
            if item.contains_key(name) {
                node.validate(ctx, instance, path)?;
            }
        }

        for (name, dependencies) in &self.dependent_required {
            if item.contains_key(name) {
                for dependency in dependencies {
                    if !item.contains_key(dependency) {
                        return Err(ValidationError::new(
                            ValidationErrorKind::DependentRequired {
                                property: name.clone(),
                                dependency: dependency.clone(),
                            },
                            self.location.join("dependentRequired"),
                            path.into(),
                        ));
                    }
                }
            }
        }

        Ok(())
    }

    fn matched_by_earlier_applicator(&self, key: &str) -> bool {
        self.properties.iter().any(|(name, _)| name == key)
            || self
                .pattern_properties
                .iter()
                .any(|(_, regex, _)| matches!(regex.is_match(key), Ok(true)))
    }
}

/// Validate a child instance: its annotations describe the child, not the
/// current object, so they run in a discarded scratch frame.
pub(crate) fn validate_child(
    node: &SchemaNode,
    ctx: &mut EvalContext,
    instance: &Value,
    path: &InstancePath,
) -> Result<(), ValidationError> {
    ctx.push_frame();
    let result = node.validate(ctx, instance, path);
    ctx.discard_frame();
    result
}

#[cfg(test)]
mod tests {
    use crate::tests_util;
    use serde_json::{json, Value};
    use test_case::test_case;

    #[test_case(&json!({"properties": {"a": {"type": "integer"}}}), &json!({"a": 3}))]
    #[test_case(&json!({"properties": {"a": {"type": "integer"}}}), &json!({"b": "x"}); "unlisted key")]
    #[test_case(&json!({"required": ["a"]}), &json!({"a": null}))]
    #[test_case(&json!({"maxProperties": 1}), &json!({"a": 1}))]
    #[test_case(&json!({"minProperties": 1}), &json!({"a": 1}))]
    #[test_case(&json!({"patternProperties": {"^n_": {"type": "number"}}}), &json!({"n_a": 1, "other": "x"}))]
    #[test_case(&json!({"propertyNames": {"maxLength": 3}}), &json!({"ab": 1}))]
    #[test_case(&json!({"dependentRequired": {"a": ["b"]}}), &json!({"b": 1}))]
    #[test_case(&json!({"dependentSchemas": {"a": {"required": ["b"]}}}), &json!({"c": 1}))]
    #[test_case(&json!({"required": ["a"]}), &json!("not an object"); "non-objects ignored")]
    fn valid(schema: &Value, instance: &Value) {
        tests_util::is_valid(schema, instance);
    }

    #[test_case(&json!({"properties": {"a": {"type": "integer"}}}), &json!({"a": "x"}))]
    #[test_case(&json!({"required": ["a"]}), &json!({}))]
    #[test_case(&json!({"maxProperties": 1}), &json!({"a": 1, "b": 2}))]
    #[test_case(&json!({"minProperties": 2}), &json!({"a": 1}))]
    #[test_case(&json!({"patternProperties": {"^n_": {"type": "number"}}}), &json!({"n_a": "x"}))]
    #[test_case(&json!({"propertyNames": {"maxLength": 3}}), &json!({"abcd": 1}))]
    #[test_case(&json!({"dependentRequired": {"a": ["b"]}}), &json!({"a": 1}))]
    #[test_case(&json!({"dependentSchemas": {"a": {"required": ["b"]}}}), &json!({"a": 1}))]
    fn invalid(schema: &Value, instance: &Value) {
        tests_util::is_not_valid(schema, instance);
    }

    #[test]
    fn additional_properties_applies_to_unmatched_keys() {
        let schema = json!({
            "properties": {"a": true},
            "patternProperties": {"^p_": true},
            "additionalProperties": {"type": "string"}
        });
        tests_util::is_valid(&schema, &json!({"a": 1, "p_b": 2, "c": "str"}));
        tests_util::is_not_valid(&schema, &json!({"a": 1, "c": 3}));
    }

    #[test]
    fn additional_properties_false_names_the_property() {
        let error = tests_util::validate_error(
            &json!({"properties": {"a": true}, "additionalProperties": false}),
            &json!({"a": 1, "b": 2}),
        );
        assert_eq!(error.to_string(), "additional property \"b\" is not allowed");
        assert_eq!(error.instance_path.to_string(), "/b");
        assert!(error.cause().is_some());
    }

    #[test]
    fn property_error_carries_instance_path() {
        let error = tests_util::validate_error(
            &json!({"properties": {"a": {"properties": {"b": {"type": "integer"}}}}}),
            &json!({"a": {"b": "x"}}),
        );
        assert_eq!(error.instance_path.to_string(), "/a/b");
        assert_eq!(error.schema_path.to_string(), "/properties/a/properties/b/type");
    }
}
