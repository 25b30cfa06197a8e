//! Logical composition: `allOf`, `anyOf`, `oneOf`, `not`.
//!
//! Branch annotations follow the success rules: `allOf` contributes every
//! branch (all succeeded or the whole keyword failed), `anyOf` contributes
//! the first successful branch, `oneOf` exactly the single successful one,
//! and `not` contributes nothing.

use crate::{
    compiler::{self, Context},
    context::EvalContext,
    error::{CompileError, ValidationError, ValidationErrorKind},
    paths::{InstancePath, JsonPointer},
    schema::ObjectSchema,
    validator::{KeywordValidator, SchemaNode},
};
use serde_json::Value;

pub(crate) struct AllOfValidator {
    branches: Vec<SchemaNode>,
}

pub(crate) struct AnyOfValidator {
    branches: Vec<SchemaNode>,
    location: JsonPointer,
}

pub(crate) struct OneOfValidator {
    branches: Vec<SchemaNode>,
    location: JsonPointer,
}

pub(crate) struct NotValidator {
    node: Box<SchemaNode>,
    location: JsonPointer,
}

fn compile_branches(
    ctx: &Context,
    keyword: &'static str,
    schemas: &[crate::schema::Schema],
) -> Result<Vec<SchemaNode>, CompileError> {
    let ctx = ctx.at(keyword);
    schemas
        .iter()
        .enumerate()
        .map(|(index, schema)| compiler::compile_node(&ctx.at(index), schema))
        .collect()
}

pub(crate) fn compile_all_of(
    ctx: &Context,
    object: &ObjectSchema,
) -> Result<KeywordValidator, CompileError> {
    Ok(KeywordValidator::AllOf(AllOfValidator {
        branches: compile_branches(ctx, "allOf", object.all_of())?,
    }))
}

pub(crate) fn compile_any_of(
    ctx: &Context,
    object: &ObjectSchema,
) -> Result<KeywordValidator, CompileError> {
    Ok(KeywordValidator::AnyOf(AnyOfValidator {
        branches: compile_branches(ctx, "anyOf", object.any_of())?,
        location: ctx.location().join("anyOf"),
    }))
}

pub(crate) fn compile_one_of(
    ctx: &Context,
    object: &ObjectSchema,
) -> Result<KeywordValidator, CompileError> {
    Ok(KeywordValidator::OneOf(OneOfValidator {
        branches: compile_branches(ctx, "oneOf", object.one_of())?,
        location: ctx.location().join("oneOf"),
    }))
}

pub(crate) fn compile_not(
    ctx: &Context,
    object: &ObjectSchema,
) -> Result<KeywordValidator, CompileError> {
    let schema = object.not().expect("`not` keyword is present");
    let node = compiler::compile_node(&ctx.at("not"), schema)?;
    Ok(KeywordValidator::Not(NotValidator {
        node: Box::new(node),
        location: ctx.location().join("not"),
    }))
}

impl AllOfValidator {
    pub(crate) fn validate(
        &self,
        ctx: &mut EvalContext,
        instance: &Value,
        path: &InstancePath,
    ) -> Result<(), ValidationError> {
        // A failing branch fails the whole keyword, so branches may write
        // annotations straight into the current frame.
        for branch in &self.branches {
            branch.validate(ctx, instance, path)?;
        }
        Ok(())
    }
}

impl AnyOfValidator {
    pub(crate) fn validate(
        &self,
        ctx: &mut EvalContext,
        instance: &Value,
        path: &InstancePath,
    ) -> Result<(), ValidationError> {
        let mut first_failure = None;
        for branch in &self.branches {
            ctx.push_frame();
            match branch.validate(ctx, instance, path) {
                Ok(()) => {
                    ctx.merge_frame();
                    return Ok(());
                }
                Err(error) => {
                    ctx.discard_frame();
                    if error.is_cancelled() {
                        return Err(error);
                    }
                    first_failure.get_or_insert(error);
                }
            }
        }
        let mut error = ValidationError::new(
            ValidationErrorKind::AnyOf,
            self.location.clone(),
            path.into(),
        );
        if let Some(cause) = first_failure {
            error = error.with_cause(cause);
        }
        Err(error)
    }
}

impl OneOfValidator {
    pub(crate) fn validate(
        &self,
        ctx: &mut EvalContext,
        instance: &Value,
        path: &InstancePath,
    ) -> Result<(), ValidationError> {
        let mut winner = None;
        let mut first_failure = None;
        for branch in &self.branches {
            ctx.push_frame();
            match branch.validate(ctx, instance, path) {
                Ok(()) => {
                    let frame = ctx.take_frame();
                    if winner.is_some() {
                        return Err(ValidationError::new(
                            ValidationErrorKind::OneOfMultipleValid,
                            self.location.clone(),
                            path.into(),
                        ));
                    }
                    winner = Some(frame);
                }
                Err(error) => {
                    ctx.discard_frame();
                    if error.is_cancelled() {
                        return Err(error);
                    }
                    first_failure.get_or_insert(error);
                }
            }
        }
        match winner {
            Some(frame) => {
                ctx.absorb_frame(frame);
                Ok(())
            }
            None => {
                let mut error = ValidationError::new(
                    ValidationErrorKind::OneOfNotValid,
                    self.location.clone(),
                    path.into(),
                );
                if let Some(cause) = first_failure {
                    error = error.with_cause(cause);
                }
                Err(error)
            }
        }
    }
}

impl NotValidator {
    pub(crate) fn validate(
        &self,
        ctx: &mut EvalContext,
        instance: &Value,
        path: &InstancePath,
    ) -> Result<(), ValidationError> {
        ctx.push_frame();
        let result = self.node.validate(ctx, instance, path);
        ctx.discard_frame();
        match result {
            Ok(()) => Err(ValidationError::new(
                ValidationErrorKind::Not,
                self.location.clone(),
                path.into(),
            )),
            Err(error) if error.is_cancelled() => Err(error),
            Err(_) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::tests_util;
    use serde_json::{json, Value};
    use test_case::test_case;

    #[test_case(&json!({"allOf": [{"type": "integer"}, {"minimum": 2}]}), &json!(3))]
    #[test_case(&json!({"anyOf": [{"type": "string", "minLength": 1}, {"type": "number", "minimum": 0}]}), &json!("x"))]
    #[test_case(&json!({"anyOf": [{"type": "string", "minLength": 1}, {"type": "number", "minimum": 0}]}), &json!(42.5))]
    #[test_case(&json!({"oneOf": [{"type": "integer"}, {"minimum": 2}]}), &json!(1))]
    #[test_case(&json!({"not": {"type": "integer"}}), &json!("x"))]
    fn valid(schema: &Value, instance: &Value) {
        tests_util::is_valid(schema, instance);
    }

    #[test_case(&json!({"allOf": [{"type": "integer"}, {"minimum": 2}]}), &json!(1))]
    #[test_case(&json!({"anyOf": [{"type": "string", "minLength": 1}, {"type": "number", "minimum": 0}]}), &json!(true))]
    #[test_case(&json!({"oneOf": [{"type": "integer"}, {"minimum": 2}]}), &json!(3); "two branches match")]
    #[test_case(&json!({"oneOf": [{"type": "integer"}, {"minimum": 2}]}), &json!(1.5); "no branch matches")]
    #[test_case(&json!({"not": {"type": "integer"}}), &json!(1))]
    fn invalid(schema: &Value, instance: &Value) {
        tests_util::is_not_valid(schema, instance);
    }

    #[test]
    fn any_of_failure_chains_the_first_branch_error() {
        let error = tests_util::validate_error(
            &json!({"anyOf": [{"type": "string"}, {"type": "number"}]}),
            &json!(true),
        );
        assert_eq!(error.to_string(), "none of the schemas in \"anyOf\" matched");
        assert_eq!(
            error.cause().expect("chained branch error").to_string(),
            "value is not of type \"string\""
        );
    }

    #[test]
    fn one_of_distinguishes_zero_from_many() {
        let schema = json!({"oneOf": [{"type": "integer"}, {"minimum": 2}]});
        let none = tests_util::validate_error(&schema, &json!(1.5));
        assert_eq!(none.to_string(), "none of the schemas in \"oneOf\" matched");
        let many = tests_util::validate_error(&schema, &json!(3));
        assert_eq!(many.to_string(), "more than one schema in \"oneOf\" matched");
    }

    #[test]
    fn error_locations() {
        tests_util::assert_schema_path(
            &json!({"allOf": [{"type": "string"}]}),
            &json!(1),
            "/allOf/0/type",
        );
        tests_util::assert_schema_path(
            &json!({"oneOf": [{"type": "string"}]}),
            &json!(1),
            "/oneOf",
        );
    }
}
