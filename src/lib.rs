//! Compile JSON Schema draft 2020-12 documents into reusable validators.
//!
//! The crate covers the full compile-and-evaluate pipeline: a typed schema
//! model with a keyword-presence bitmap, a fluent builder, intra- and
//! inter-document reference resolution (including `$dynamicRef` and cyclic
//! schemas), vocabulary-gated compilation, and annotation-aware evaluation
//! for the `unevaluated*` keywords.
//!
//! # One-off validation
//!
//! ```rust
//! use serde_json::json;
//! use json_schema::Schema;
//!
//! let schema = Schema::from_value(&json!({"type": "string"})).unwrap();
//! assert!(json_schema::is_valid(&schema, &json!("hello")));
//! assert!(!json_schema::is_valid(&schema, &json!(42)));
//! ```
//!
//! # Reusable validators
//!
//! Compile once, validate many times; compiled validators are immutable and
//! can be shared across threads.
//!
//! ```rust
//! use serde_json::json;
//! use json_schema::Schema;
//!
//! let schema = Schema::from_value(&json!({
//!     "type": "object",
//!     "properties": {"name": {"type": "string", "minLength": 1}},
//!     "required": ["name"]
//! }))
//! .unwrap();
//! let validator = json_schema::compile(&schema).unwrap();
//!
//! assert!(validator.is_valid(&json!({"name": "Ada"})));
//! let error = validator.validate(&json!({"name": ""})).unwrap_err();
//! assert_eq!(error.instance_path.to_string(), "/name");
//! ```
//!
//! # Building schemas programmatically
//!
//! ```rust
//! use json_schema::{PrimitiveType, SchemaBuilder};
//!
//! let schema = SchemaBuilder::new()
//!     .schema_type(PrimitiveType::Object)
//!     .property(
//!         "age",
//!         SchemaBuilder::new()
//!             .schema_type(PrimitiveType::Integer)
//!             .minimum(0)
//!             .must_build(),
//!     )
//!     .required(["age"])
//!     .must_build();
//! assert!(schema.has(json_schema::KeywordSet::PROPERTIES));
//! ```
//!
//! # External documents
//!
//! Non-local references are fetched through a caller-supplied
//! [`SchemaLoader`]; without one they fail with a loader-missing error.
//! Documents can also be pre-registered with
//! [`CompileOptions::with_document`].

mod builder;
mod compiler;
mod context;
pub mod error;
mod fields;
mod keywords;
pub mod meta;
pub mod paths;
mod primitive_type;
mod reference;
mod resolver;
mod schema;
mod validator;
mod vocabulary;

pub use builder::SchemaBuilder;
pub use compiler::CompileOptions;
pub use context::{Annotations, Cancellation};
pub use error::{
    BuildError, CompileError, ReferenceError, ValidationError, ValidationErrorKind,
};
pub use fields::KeywordSet;
pub use primitive_type::{PrimitiveType, PrimitiveTypeSet};
pub use reference::validate_reference;
pub use resolver::{LoaderError, SchemaLoader};
pub use schema::{ObjectSchema, Schema};
pub use validator::Validator;
pub use vocabulary::{Vocabulary, VocabularySet};

use serde_json::Value;

/// Compile a schema with the default options.
pub fn compile(schema: &Schema) -> Result<Validator, CompileError> {
    CompileOptions::new().compile(schema)
}

/// Shortcut for one-off validation.
///
/// Panics if the schema fails to compile; build a [`Validator`] explicitly
/// to handle compilation errors.
#[must_use]
pub fn is_valid(schema: &Schema, instance: &Value) -> bool {
    let validator = compile(schema).expect("invalid schema");
    validator.is_valid(instance)
}

#[cfg(test)]
pub(crate) mod tests_util {
    use crate::{Schema, ValidationError, Validator};
    use serde_json::Value;

    pub(crate) fn compile(schema: &Value) -> Validator {
        let schema = Schema::from_value(schema).expect("schema parses");
        crate::compile(&schema).expect("schema compiles")
    }

    pub(crate) fn is_valid(schema: &Value, instance: &Value) {
        let compiled = compile(schema);
        if let Err(error) = compiled.validate(instance) {
            panic!("{instance} should be valid: {error} at {}", error.instance_path);
        }
        assert!(compiled.is_valid(instance));
        assert!(compiled.apply(instance).is_ok());
    }

    pub(crate) fn is_not_valid(schema: &Value, instance: &Value) {
        let compiled = compile(schema);
        assert!(
            compiled.validate(instance).is_err(),
            "{instance} should not be valid (via validate)"
        );
        assert!(
            !compiled.is_valid(instance),
            "{instance} should not be valid (via is_valid)"
        );
        assert!(
            compiled.apply(instance).is_err(),
            "{instance} should not be valid (via apply)"
        );
    }

    pub(crate) fn validate_error(schema: &Value, instance: &Value) -> ValidationError {
        compile(schema)
            .validate(instance)
            .expect_err("instance should not be valid")
    }

    pub(crate) fn assert_schema_path(schema: &Value, instance: &Value, expected: &str) {
        let error = validate_error(schema, instance);
        assert_eq!(error.schema_path.to_string(), expected);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn is_valid_shortcut() {
        let schema = Schema::from_value(&json!({"minLength": 5})).unwrap();
        assert!(is_valid(&schema, &json!("foobar")));
        assert!(!is_valid(&schema, &json!("foo")));
    }

    #[test]
    fn boolean_schemas_compile() {
        let accept = compile(&Schema::Bool(true)).unwrap();
        assert!(accept.is_valid(&json!({"anything": [1, 2, 3]})));
        let reject = compile(&Schema::Bool(false)).unwrap();
        assert!(!reject.is_valid(&json!(null)));
    }

    #[test]
    fn recompiled_schema_validates_identically() {
        let source = json!({
            "type": "object",
            "properties": {"a": {"type": "integer", "minimum": 0}},
            "required": ["a"],
            "unevaluatedProperties": false
        });
        let schema = Schema::from_value(&source).unwrap();
        let original = compile(&schema).unwrap();
        let reparsed = Schema::from_value(&schema.to_value()).unwrap();
        let recompiled = compile(&reparsed).unwrap();
        for instance in [
            json!({"a": 1}),
            json!({"a": -1}),
            json!({"a": 1, "b": 2}),
            json!({}),
            json!(null),
        ] {
            assert_eq!(
                original.is_valid(&instance),
                recompiled.is_valid(&instance),
                "{instance}"
            );
        }
    }
}
