//! The compiled validator tree and its interpreter.
//!
//! Compilation produces a [`SchemaNode`] per schema: an ordered list of
//! [`KeywordValidator`]s plus the schema identity and base URI needed for
//! the dynamic scope. The validator set is a closed enum, so the dispatch
//! below is exhaustive; adding a keyword family means adding a variant.

use crate::{
    compiler::CompileOptions,
    context::{Annotations, Cancellation, EvalContext, ScopeEntry},
    error::{ValidationError, ValidationErrorKind},
    keywords::{
        array::{ArrayApplicatorsValidator, ArrayShapeValidator},
        conditional::ConditionalValidator,
        const_::ConstValidator,
        enum_::EnumValidator,
        format::FormatValidator,
        logical::{AllOfValidator, AnyOfValidator, NotValidator, OneOfValidator},
        numeric::NumberValidator,
        object::{ObjectApplicatorsValidator, ObjectShapeValidator},
        ref_::{DynamicRefValidator, RefValidator},
        string::StringValidator,
        type_::TypeValidator,
        unevaluated::{UnevaluatedItemsValidator, UnevaluatedPropertiesValidator},
    },
    paths::{InstancePath, JsonPointer},
    schema::Schema,
};
use serde_json::Value;
use std::{fmt, sync::Arc};
use url::Url;

/// A compiled schema, ready to validate instances.
///
/// Immutable after compilation; share it freely across threads.
pub struct Validator {
    root: SchemaNode,
    config: Arc<CompileOptions>,
}

impl Validator {
    /// Start configuring a compilation.
    pub fn options() -> CompileOptions {
        CompileOptions::new()
    }

    pub(crate) fn new(root: SchemaNode, config: Arc<CompileOptions>) -> Self {
        Self { root, config }
    }

    /// Validate an instance, returning the first failure in keyword order.
    pub fn validate(&self, instance: &Value) -> Result<(), ValidationError> {
        self.run(instance, None).map(drop)
    }

    /// Validate with a cancellation handle; observing a cancelled handle
    /// aborts with a [`ValidationErrorKind::Cancelled`] error.
    pub fn validate_with(
        &self,
        instance: &Value,
        cancellation: &Cancellation,
    ) -> Result<(), ValidationError> {
        self.run(instance, Some(cancellation)).map(drop)
    }

    #[must_use]
    pub fn is_valid(&self, instance: &Value) -> bool {
        self.validate(instance).is_ok()
    }

    /// Validate and return the root-level annotation tables: which
    /// properties and items of the instance were evaluated by any keyword.
    pub fn apply(&self, instance: &Value) -> Result<Annotations, ValidationError> {
        self.run(instance, None)
    }

    /// Validate anything serializable, e.g. a struct whose field names
    /// match schema property names.
    pub fn validate_serializable<T: serde::Serialize>(
        &self,
        value: &T,
    ) -> Result<(), ValidationError> {
        let instance = serde_json::to_value(value).map_err(|error| {
            ValidationError::new(
                ValidationErrorKind::Serialization {
                    reason: error.to_string(),
                },
                JsonPointer::new(),
                JsonPointer::new(),
            )
        })?;
        self.validate(&instance)
    }

    fn run(
        &self,
        instance: &Value,
        cancellation: Option<&Cancellation>,
    ) -> Result<Annotations, ValidationError> {
        let mut ctx = EvalContext::new(cancellation);
        let path = InstancePath::root();
        self.root.validate(&mut ctx, instance, &path)?;
        Ok(ctx.annotations())
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator")
            .field("config", &self.config)
            .finish()
    }
}

/// One compiled schema node: its validators in evaluation order plus the
/// identity pushed onto the dynamic scope while the node runs.
pub(crate) struct SchemaNode {
    schema: Schema,
    base_uri: Arc<Url>,
    location: JsonPointer,
    validators: Vec<KeywordValidator>,
}

impl SchemaNode {
    pub(crate) fn new(
        schema: Schema,
        ctx: &crate::compiler::Context,
        validators: Vec<KeywordValidator>,
    ) -> Self {
        Self {
            schema,
            base_uri: Arc::clone(&ctx.base_uri),
            location: ctx.location().clone(),
            validators,
        }
    }

    pub(crate) fn location(&self) -> &JsonPointer {
        &self.location
    }

    pub(crate) fn validate(
        &self,
        ctx: &mut EvalContext,
        instance: &Value,
        path: &InstancePath,
    ) -> Result<(), ValidationError> {
        if ctx.is_cancelled() {
            return Err(ValidationError::new(
                ValidationErrorKind::Cancelled,
                self.location.clone(),
                path.into(),
            ));
        }
        ctx.push_scope(ScopeEntry {
            schema: self.schema.clone(),
            base_uri: Arc::clone(&self.base_uri),
        });
        let mut result = Ok(());
        for validator in &self.validators {
            if let Err(error) = validator.validate(ctx, instance, path) {
                result = Err(error);
                break;
            }
        }
        ctx.pop_scope();
        result
    }
}

impl fmt::Debug for SchemaNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaNode")
            .field("location", &self.location.to_string())
            .field("validators", &self.validators.len())
            .finish()
    }
}

/// The closed set of compiled keyword-family validators.
pub(crate) enum KeywordValidator {
    /// The `false` schema.
    Reject { location: JsonPointer },
    Ref(RefValidator),
    DynamicRef(DynamicRefValidator),
    Type(TypeValidator),
    Const(ConstValidator),
    Enum(EnumValidator),
    String(StringValidator),
    Number(NumberValidator),
    Format(FormatValidator),
    ObjectShape(ObjectShapeValidator),
    ArrayShape(ArrayShapeValidator),
    AllOf(AllOfValidator),
    AnyOf(AnyOfValidator),
    OneOf(OneOfValidator),
    Not(NotValidator),
    Conditional(ConditionalValidator),
    ObjectApplicators(ObjectApplicatorsValidator),
    ArrayApplicators(ArrayApplicatorsValidator),
    UnevaluatedItems(UnevaluatedItemsValidator),
    UnevaluatedProperties(UnevaluatedPropertiesValidator),
}

impl KeywordValidator {
    fn validate(
        &self,
        ctx: &mut EvalContext,
        instance: &Value,
        path: &InstancePath,
    ) -> Result<(), ValidationError> {
        match self {
            KeywordValidator::Reject { location } => Err(ValidationError::new(
                ValidationErrorKind::FalseSchema,
                location.clone(),
                path.into(),
            )),
            KeywordValidator::Ref(validator) => validator.validate(ctx, instance, path),
            KeywordValidator::DynamicRef(validator) => validator.validate(ctx, instance, path),
            KeywordValidator::Type(validator) => validator.validate(ctx, instance, path),
            KeywordValidator::Const(validator) => validator.validate(ctx, instance, path),
            KeywordValidator::Enum(validator) => validator.validate(ctx, instance, path),
            KeywordValidator::String(validator) => validator.validate(ctx, instance, path),
            KeywordValidator::Number(validator) => validator.validate(ctx, instance, path),
            KeywordValidator::Format(validator) => validator.validate(ctx, instance, path),
            KeywordValidator::ObjectShape(validator) => validator.validate(ctx, instance, path),
            KeywordValidator::ArrayShape(validator) => validator.validate(ctx, instance, path),
            KeywordValidator::AllOf(validator) => validator.validate(ctx, instance, path),
            KeywordValidator::AnyOf(validator) => validator.validate(ctx, instance, path),
            KeywordValidator::OneOf(validator) => validator.validate(ctx, instance, path),
            KeywordValidator::Not(validator) => validator.validate(ctx, instance, path),
            KeywordValidator::Conditional(validator) => validator.validate(ctx, instance, path),
            KeywordValidator::ObjectApplicators(validator) => {
                validator.validate(ctx, instance, path)
            }
            KeywordValidator::ArrayApplicators(validator) => {
                validator.validate(ctx, instance, path)
            }
            KeywordValidator::UnevaluatedItems(validator) => {
                validator.validate(ctx, instance, path)
            }
            KeywordValidator::UnevaluatedProperties(validator) => {
                validator.validate(ctx, instance, path)
            }
        }
    }
}
