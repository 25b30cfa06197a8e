//! The `if` / `then` / `else` conditional.

use crate::{
    compiler::{self, Context},
    context::EvalContext,
    error::{CompileError, ValidationError},
    fields::KeywordSet,
    schema::ObjectSchema,
    paths::InstancePath,
    validator::{KeywordValidator, SchemaNode},
};
use serde_json::Value;

pub(crate) struct ConditionalValidator {
    condition: Box<SchemaNode>,
    then: Option<Box<SchemaNode>>,
    else_: Option<Box<SchemaNode>>,
}

/// `then` / `else` without `if` are inert, so the whole family compiles
/// only when `if` is present.
pub(crate) fn compile(
    ctx: &Context,
    object: &ObjectSchema,
) -> Result<Option<KeywordValidator>, CompileError> {
    if !object.keywords().contains_all(KeywordSet::IF) || !ctx.enabled("if") {
        return Ok(None);
    }
    let condition = object.if_schema().expect("`if` keyword is present");
    let condition = Box::new(compiler::compile_node(&ctx.at("if"), condition)?);
    let then = if object.keywords().contains_all(KeywordSet::THEN) && ctx.enabled("then") {
        object
            .then_schema()
            .map(|schema| compiler::compile_node(&ctx.at("then"), schema).map(Box::new))
            .transpose()?
    } else {
        None
    };
    let else_ = if object.keywords().contains_all(KeywordSet::ELSE) && ctx.enabled("else") {
        object
            .else_schema()
            .map(|schema| compiler::compile_node(&ctx.at("else"), schema).map(Box::new))
            .transpose()?
    } else {
        None
    };
    Ok(Some(KeywordValidator::Conditional(ConditionalValidator {
        condition,
        then,
        else_,
    })))
}

impl ConditionalValidator {
    pub(crate) fn validate(
        &self,
        ctx: &mut EvalContext,
        instance: &Value,
        path: &InstancePath,
    ) -> Result<(), ValidationError> {
        // `if` runs purely for its verdict: errors are silenced and its
        // annotations are discarded.
        ctx.push_frame();
        let verdict = self.condition.validate(ctx, instance, path);
        ctx.discard_frame();
        if let Err(error) = &verdict {
            if error.is_cancelled() {
                return verdict;
            }
        }
        let branch = if verdict.is_ok() {
            &self.then
        } else {
            &self.else_
        };
        match branch {
            Some(node) => node.validate(ctx, instance, path),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::tests_util;
    use serde_json::{json, Value};
    use test_case::test_case;

    #[test_case(&json!({"if": {"type": "integer"}, "then": {"minimum": 0}}), &json!(1))]
    #[test_case(&json!({"if": {"type": "integer"}, "then": {"minimum": 0}}), &json!("text"); "else branch absent")]
    #[test_case(&json!({"if": {"type": "integer"}, "else": {"type": "string"}}), &json!("text"))]
    #[test_case(&json!({"then": {"type": "integer"}}), &json!("ignored without if"))]
    #[test_case(&json!({"else": {"type": "integer"}}), &json!("ignored without if"))]
    fn valid(schema: &Value, instance: &Value) {
        tests_util::is_valid(schema, instance);
    }

    #[test_case(&json!({"if": {"type": "integer"}, "then": {"minimum": 0}}), &json!(-1))]
    #[test_case(&json!({"if": {"type": "integer"}, "else": {"type": "string"}}), &json!(true))]
    fn invalid(schema: &Value, instance: &Value) {
        tests_util::is_not_valid(schema, instance);
    }

    #[test]
    fn branch_error_is_reported_from_the_branch() {
        let error = tests_util::validate_error(
            &json!({"if": {"type": "integer"}, "then": {"minimum": 0}}),
            &json!(-1),
        );
        assert_eq!(error.schema_path.to_string(), "/then/minimum");
    }
}
