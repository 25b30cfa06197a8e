//! `$ref` and `$dynamicRef`.
//!
//! References are dereferenced and compiled eagerly. A reference that is
//! already being compiled up-stack would recurse forever, so it compiles to
//! a lazy thunk instead: the target is dereferenced on first validation and
//! memoized. Sibling keywords always apply alongside a reference.

use crate::{
    compiler::{self, CompileOptions, Context},
    context::EvalContext,
    error::{CompileError, ReferenceError, ValidationError, ValidationErrorKind},
    paths::{InstancePath, JsonPointer},
    reference::{self, Fragment},
    resolver::Resolver,
    schema::{ObjectSchema, Schema},
    validator::{KeywordValidator, SchemaNode},
    vocabulary::VocabularySet,
};
use ahash::AHashMap;
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::Arc;
use url::Url;

pub(crate) enum RefValidator {
    Static(StaticRef),
    Lazy(LazyRef),
}

pub(crate) struct StaticRef {
    node: Box<SchemaNode>,
    absolute: String,
    location: JsonPointer,
}

/// Thunk for a reference that takes part in a cycle. The target is known to
/// resolve (the cycle was detected while compiling it), so dereferencing at
/// validation time only re-runs work that already succeeded once.
pub(crate) struct LazyRef {
    reference: String,
    absolute: String,
    config: Arc<CompileOptions>,
    resolver: Arc<Resolver>,
    vocabularies: Arc<VocabularySet>,
    base_uri: Arc<Url>,
    location: JsonPointer,
    cell: OnceCell<SchemaNode>,
}

pub(crate) fn compile_ref(
    ctx: &Context,
    object: &ObjectSchema,
) -> Result<KeywordValidator, CompileError> {
    Ok(KeywordValidator::Ref(compile_reference(
        ctx,
        object.reference(),
    )?))
}

fn compile_reference(ctx: &Context, reference: &str) -> Result<RefValidator, CompileError> {
    let absolute = ctx.absolute_reference(reference)?;
    if !ctx.begin_reference(&absolute) {
        return Ok(RefValidator::Lazy(LazyRef {
            reference: reference.to_owned(),
            absolute,
            config: Arc::clone(&ctx.config),
            resolver: Arc::clone(&ctx.resolver),
            vocabularies: Arc::clone(&ctx.vocabularies),
            base_uri: Arc::clone(&ctx.base_uri),
            location: ctx.location().join("$ref"),
            cell: OnceCell::new(),
        }));
    }
    let compiled = compile_target(ctx, reference).map(|node| {
        RefValidator::Static(StaticRef {
            node: Box::new(node),
            absolute: absolute.clone(),
            location: ctx.location().join("$ref"),
        })
    });
    ctx.end_reference(&absolute);
    compiled
}

fn compile_target(ctx: &Context, reference: &str) -> Result<SchemaNode, CompileError> {
    let (target, target_base) = ctx.resolve(reference)?;
    let target_ctx = ctx.for_target(target_base);
    compiler::compile_node(&target_ctx, &target)
}

impl RefValidator {
    pub(crate) fn validate(
        &self,
        ctx: &mut EvalContext,
        instance: &Value,
        path: &InstancePath,
    ) -> Result<(), ValidationError> {
        let (node, absolute, location) = match self {
            RefValidator::Static(validator) => (
                &*validator.node,
                &validator.absolute,
                &validator.location,
            ),
            RefValidator::Lazy(validator) => (
                validator.node(),
                &validator.absolute,
                &validator.location,
            ),
        };
        validate_through(node, absolute, location, ctx, instance, path)
    }
}

/// Cross a reference boundary: guard against evaluation-time cycles that
/// make no progress through the instance, then validate the target.
fn validate_through(
    node: &SchemaNode,
    absolute: &str,
    location: &JsonPointer,
    ctx: &mut EvalContext,
    instance: &Value,
    path: &InstancePath,
) -> Result<(), ValidationError> {
    if ctx.is_cancelled() {
        return Err(ValidationError::new(
            ValidationErrorKind::Cancelled,
            location.clone(),
            path.into(),
        ));
    }
    if !ctx.enter_reference(absolute, instance) {
        return Err(ValidationError::new(
            ValidationErrorKind::CircularReference {
                reference: absolute.to_owned(),
            },
            location.clone(),
            path.into(),
        ));
    }
    let result = node.validate(ctx, instance, path);
    ctx.leave_reference();
    result
}

impl LazyRef {
    fn node(&self) -> &SchemaNode {
        self.cell.get_or_init(|| {
            let ctx = Context::from_parts(
                Arc::clone(&self.config),
                Arc::clone(&self.resolver),
                Arc::clone(&self.vocabularies),
                Arc::clone(&self.base_uri),
            );
            // INVARIANT: this reference resolved and its target compiled
            // before the cycle that produced this thunk was detected.
            compile_target(&ctx, &self.reference).expect("cyclic reference target compiles")
        })
    }
}

pub(crate) struct DynamicRefValidator {
    /// Plain-name fragment to search the dynamic scope for; `None` when the
    /// reference has a pointer fragment and behaves statically.
    anchor: Option<String>,
    fallback: RefValidator,
    config: Arc<CompileOptions>,
    resolver: Arc<Resolver>,
    vocabularies: Arc<VocabularySet>,
    location: JsonPointer,
    targets: RwLock<AHashMap<usize, Arc<SchemaNode>>>,
}

pub(crate) fn compile_dynamic_ref(
    ctx: &Context,
    object: &ObjectSchema,
) -> Result<KeywordValidator, CompileError> {
    let reference_str = object.dynamic_reference();
    let anchor = match reference::parse(reference_str) {
        Ok(parsed) => match parsed.fragment {
            Fragment::Anchor(name) => Some(name),
            _ => None,
        },
        Err(error) => return Err(error.into()),
    };
    let fallback = compile_reference(ctx, reference_str)?;
    Ok(KeywordValidator::DynamicRef(DynamicRefValidator {
        anchor,
        fallback,
        config: Arc::clone(&ctx.config),
        resolver: Arc::clone(&ctx.resolver),
        vocabularies: Arc::clone(&ctx.vocabularies),
        location: ctx.location().join("$dynamicRef"),
        targets: RwLock::new(AHashMap::new()),
    }))
}

impl DynamicRefValidator {
    pub(crate) fn validate(
        &self,
        ctx: &mut EvalContext,
        instance: &Value,
        path: &InstancePath,
    ) -> Result<(), ValidationError> {
        if let Some(name) = &self.anchor {
            // Walk the dynamic scope from outermost to innermost; the first
            // schema carrying a matching `$dynamicAnchor` wins.
            let matched = ctx.scopes().find_map(|entry| {
                entry.schema.as_object().and_then(|object| {
                    (object.dynamic_anchor() == name)
                        .then(|| (entry.schema.clone(), Arc::clone(&entry.base_uri)))
                })
            });
            if let Some((schema, base_uri)) = matched {
                let key = format!("{base_uri}#{name}");
                let node = self.target_node(name, &schema, base_uri, path)?;
                return validate_through(&node, &key, &self.location, ctx, instance, path);
            }
        }
        // No dynamic anchor in scope: static `$ref` semantics.
        self.fallback.validate(ctx, instance, path)
    }

    fn target_node(
        &self,
        name: &str,
        schema: &Schema,
        base_uri: Arc<Url>,
        path: &InstancePath,
    ) -> Result<Arc<SchemaNode>, ValidationError> {
        let key = schema.identity();
        if let Some(node) = self.targets.read().get(&key) {
            return Ok(Arc::clone(node));
        }
        let ctx = Context::from_parts(
            Arc::clone(&self.config),
            Arc::clone(&self.resolver),
            Arc::clone(&self.vocabularies),
            base_uri,
        );
        let node = compiler::compile_node(&ctx, schema).map_err(|_| {
            ValidationError::new(
                ValidationErrorKind::Reference(ReferenceError::not_found(format!("#{name}"))),
                self.location.clone(),
                path.into(),
            )
        })?;
        let node = Arc::new(node);
        self.targets.write().insert(key, Arc::clone(&node));
        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use crate::tests_util;
    use serde_json::{json, Value};
    use test_case::test_case;

    #[test_case(
        &json!({
            "properties": {"home": {"$ref": "#/$defs/address"}},
            "$defs": {"address": {"type": "object", "required": ["street"]}}
        }),
        &json!({"home": {"street": "Main"}})
    )]
    #[test_case(
        &json!({
            "$defs": {"person": {"$anchor": "person", "type": "object"}},
            "properties": {"who": {"$ref": "#person"}}
        }),
        &json!({"who": {}});
        "anchor reference"
    )]
    fn valid(schema: &Value, instance: &Value) {
        tests_util::is_valid(schema, instance);
    }

    #[test]
    fn referenced_errors_surface_at_the_referring_location() {
        let error = tests_util::validate_error(
            &json!({
                "properties": {"foo": {"$ref": "#/$defs/foo"}},
                "$defs": {"foo": {"type": "string"}}
            }),
            &json!({"foo": 42}),
        );
        assert_eq!(error.schema_path.to_string(), "/properties/foo/type");
        assert_eq!(error.instance_path.to_string(), "/foo");
    }

    #[test]
    fn sibling_keywords_apply_alongside_ref() {
        let schema = json!({
            "$defs": {"narrow": {"maxLength": 3}},
            "properties": {
                "code": {"$ref": "#/$defs/narrow", "minLength": 2}
            }
        });
        tests_util::is_valid(&schema, &json!({"code": "ab"}));
        // Too long for the referenced schema.
        tests_util::is_not_valid(&schema, &json!({"code": "abcd"}));
        // Long enough for the reference but short of the sibling keyword.
        tests_util::is_not_valid(&schema, &json!({"code": "a"}));
    }

    #[test]
    fn recursive_schema_terminates() {
        let schema = json!({
            "type": "object",
            "properties": {
                "value": {"type": "integer"},
                "next": {"$ref": "#"}
            },
            "required": ["value"]
        });
        tests_util::is_valid(
            &schema,
            &json!({"value": 1, "next": {"value": 2, "next": {"value": 3}}}),
        );
        tests_util::is_not_valid(&schema, &json!({"value": 1, "next": {"value": "x"}}));
    }

    #[test]
    fn mutually_recursive_schemas_terminate() {
        let schema = json!({
            "$defs": {
                "a": {"properties": {"b": {"$ref": "#/$defs/b"}}, "required": []},
                "b": {"properties": {"a": {"$ref": "#/$defs/a"}}}
            },
            "$ref": "#/$defs/a"
        });
        tests_util::is_valid(&schema, &json!({"b": {"a": {"b": {}}}}));
    }

    #[test]
    fn self_reference_without_progress_is_circular() {
        // `$ref: #` applied to the same instance location cycles without
        // consuming input.
        let error = tests_util::validate_error(&json!({"$ref": "#"}), &json!(1));
        assert!(matches!(
            error.kind,
            crate::ValidationErrorKind::CircularReference { .. }
        ));
    }

    #[test]
    fn dynamic_ref_honors_the_outermost_anchor() {
        // The classic tree / strict-tree pair: the outer schema re-binds
        // the "node" anchor, so inner nodes must also satisfy it.
        let tree = json!({
            "$id": "https://example.com/tree",
            "$dynamicAnchor": "node",
            "type": "object",
            "properties": {
                "data": true,
                "children": {
                    "type": "array",
                    "items": {"$dynamicRef": "#node"}
                }
            }
        });
        let strict_tree = json!({
            "$id": "https://example.com/strict-tree",
            "$dynamicAnchor": "node",
            "$ref": "tree",
            "unevaluatedProperties": false
        });
        let schema = crate::Schema::from_value(&strict_tree).unwrap();
        let validator = crate::Validator::options()
            .with_document(
                "https://example.com/tree",
                crate::Schema::from_value(&tree).unwrap(),
            )
            .compile(&schema)
            .unwrap();
        assert!(validator.is_valid(&json!({"children": [{"data": 1}]})));
        // The nested node carries a property the strict outer schema
        // forbids; plain `$ref` semantics would have accepted it.
        assert!(!validator.is_valid(
            &json!({"children": [{"daat": 1}]})
        ));
    }
}
