//! Error types for schema construction, reference resolution, compilation,
//! and instance validation.

use crate::{paths::JsonPointer, primitive_type::PrimitiveTypeSet};
use serde_json::Value;
use std::fmt;

/// A structural violation caught while building or parsing a schema.
#[derive(Debug)]
pub enum BuildError {
    /// `type` named an empty set of primitives.
    EmptyTypes,
    /// `type` named something that is not a primitive type.
    UnknownType { name: String },
    /// `required` listed the same property twice.
    DuplicateRequired { name: String },
    /// A lower bound exceeds its paired upper bound.
    BoundsConflict {
        lower: &'static str,
        upper: &'static str,
    },
    /// `$anchor` / `$dynamicAnchor` is not a plain name.
    InvalidAnchor {
        keyword: &'static str,
        anchor: String,
    },
    /// `$ref` / `$dynamicRef` is not a valid reference.
    Reference {
        keyword: &'static str,
        source: ReferenceError,
    },
    /// A keyword payload has the wrong shape.
    InvalidValue {
        keyword: &'static str,
        reason: String,
    },
}

impl BuildError {
    pub(crate) fn invalid_value(keyword: &'static str, reason: impl Into<String>) -> Self {
        BuildError::InvalidValue {
            keyword,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::EmptyTypes => f.write_str("`type` must name at least one primitive type"),
            BuildError::UnknownType { name } => {
                write!(f, "unknown primitive type \"{name}\"")
            }
            BuildError::DuplicateRequired { name } => {
                write!(f, "`required` lists \"{name}\" more than once")
            }
            BuildError::BoundsConflict { lower, upper } => {
                write!(f, "`{lower}` must not exceed `{upper}`")
            }
            BuildError::InvalidAnchor { keyword, anchor } => {
                write!(f, "`{keyword}` value \"{anchor}\" is not a plain name")
            }
            BuildError::Reference { keyword, source } => {
                write!(f, "`{keyword}` is not a valid reference: {source}")
            }
            BuildError::InvalidValue { keyword, reason } => {
                write!(f, "invalid `{keyword}` value: {reason}")
            }
        }
    }
}

impl std::error::Error for BuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BuildError::Reference { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// A failure to resolve a reference to its target schema.
#[derive(Debug)]
pub enum ReferenceError {
    /// The reference string is empty.
    Empty,
    /// The reference does not parse as a URI-reference, or its fragment is
    /// neither a JSON Pointer nor a plain-name anchor.
    Malformed { reference: String },
    /// The reference resolved to no known document or location.
    NotFound { reference: String },
    /// A plain-name fragment named an anchor that does not exist.
    NoSuchAnchor { anchor: String },
    /// A JSON Pointer fragment leads outside the document.
    PointerToNowhere { pointer: String },
    /// An external document was needed but no loader is configured.
    LoaderMissing { uri: String },
    /// The external loader failed.
    LoadFailed {
        uri: String,
        source: anyhow::Error,
    },
    /// A reference cycle could not be broken lazily.
    Cycle { reference: String },
}

impl ReferenceError {
    pub(crate) fn malformed(reference: impl Into<String>) -> Self {
        ReferenceError::Malformed {
            reference: reference.into(),
        }
    }

    pub(crate) fn not_found(reference: impl Into<String>) -> Self {
        ReferenceError::NotFound {
            reference: reference.into(),
        }
    }

    pub(crate) fn no_such_anchor(anchor: impl Into<String>) -> Self {
        ReferenceError::NoSuchAnchor {
            anchor: anchor.into(),
        }
    }

    pub(crate) fn pointer_to_nowhere(pointer: impl Into<String>) -> Self {
        ReferenceError::PointerToNowhere {
            pointer: pointer.into(),
        }
    }

    pub(crate) fn loader_missing(uri: impl Into<String>) -> Self {
        ReferenceError::LoaderMissing { uri: uri.into() }
    }

    pub(crate) fn load_failed(uri: impl Into<String>, source: anyhow::Error) -> Self {
        ReferenceError::LoadFailed {
            uri: uri.into(),
            source,
        }
    }
}

impl fmt::Display for ReferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceError::Empty => f.write_str("reference is empty"),
            ReferenceError::Malformed { reference } => {
                write!(f, "reference \"{reference}\" is malformed")
            }
            ReferenceError::NotFound { reference } => {
                write!(f, "reference \"{reference}\" does not resolve to a schema")
            }
            ReferenceError::NoSuchAnchor { anchor } => {
                write!(f, "anchor \"{anchor}\" does not exist")
            }
            ReferenceError::PointerToNowhere { pointer } => {
                write!(f, "pointer \"{pointer}\" does not exist")
            }
            ReferenceError::LoaderMissing { uri } => {
                write!(f, "no loader is configured to retrieve \"{uri}\"")
            }
            ReferenceError::LoadFailed { uri, source } => {
                write!(f, "loading \"{uri}\" failed: {source}")
            }
            ReferenceError::Cycle { reference } => {
                write!(f, "reference \"{reference}\" forms an unbreakable cycle")
            }
        }
    }
}

impl std::error::Error for ReferenceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReferenceError::LoadFailed { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// A failure to compile a schema into a validator.
#[derive(Debug)]
pub enum CompileError {
    /// The schema violates its own structural invariants.
    Schema(BuildError),
    /// A reference could not be resolved.
    Reference(ReferenceError),
    /// A meta-schema requires a vocabulary this implementation does not know.
    UnsupportedVocabulary { uri: String },
    /// A `pattern` / `patternProperties` regex failed to compile.
    InvalidPattern {
        pattern: String,
        source: Box<fancy_regex::Error>,
    },
    /// The schema failed validation against the draft 2020-12 meta-schema.
    MetaSchema(Box<ValidationError>),
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::Schema(error) => write!(f, "invalid schema: {error}"),
            CompileError::Reference(error) => error.fmt(f),
            CompileError::UnsupportedVocabulary { uri } => {
                write!(f, "unsupported vocabulary \"{uri}\" is required")
            }
            CompileError::InvalidPattern { pattern, source } => {
                write!(f, "pattern \"{pattern}\" failed to compile: {source}")
            }
            CompileError::MetaSchema(error) => {
                write!(f, "schema does not conform to the meta-schema: {error}")
            }
        }
    }
}

impl std::error::Error for CompileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CompileError::Schema(error) => Some(error),
            CompileError::Reference(error) => Some(error),
            CompileError::InvalidPattern { source, .. } => Some(source),
            CompileError::MetaSchema(error) => Some(error),
            CompileError::UnsupportedVocabulary { .. } => None,
        }
    }
}

impl From<BuildError> for CompileError {
    fn from(error: BuildError) -> Self {
        CompileError::Schema(error)
    }
}

impl From<ReferenceError> for CompileError {
    fn from(error: ReferenceError) -> Self {
        CompileError::Reference(error)
    }
}

/// An instance failed validation (or the attempt was aborted).
///
/// Carries the first failure reached in keyword order; failures raised by
/// sub-schemas are chained through [`ValidationError::cause`].
#[derive(Debug)]
pub struct ValidationError {
    /// What went wrong.
    pub kind: ValidationErrorKind,
    /// Path from the instance root to the offending value.
    pub instance_path: JsonPointer,
    /// Path from the schema root to the keyword that failed.
    pub schema_path: JsonPointer,
    cause: Option<Box<ValidationError>>,
}

/// Every way an instance can fail validation.
#[derive(Debug)]
pub enum ValidationErrorKind {
    /// The instance has the wrong primitive type.
    Type { expected: PrimitiveTypeSet },
    /// The instance differs from the `const` value.
    Constant { expected: Value },
    /// The instance is not one of the `enum` options.
    Enumeration { options: Vec<Value> },
    /// String is shorter than `minLength`.
    MinLength { limit: u64, length: u64 },
    /// String is longer than `maxLength`.
    MaxLength { limit: u64, length: u64 },
    /// String does not match `pattern`.
    Pattern { pattern: String },
    /// Number is not a multiple of `multipleOf`.
    MultipleOf { multiple_of: f64 },
    /// Number is below `minimum`.
    Minimum { limit: Value },
    /// Number is above `maximum`.
    Maximum { limit: Value },
    /// Number is at or below `exclusiveMinimum`.
    ExclusiveMinimum { limit: Value },
    /// Number is at or above `exclusiveMaximum`.
    ExclusiveMaximum { limit: Value },
    /// Array has fewer than `minItems` items.
    MinItems { limit: u64, count: u64 },
    /// Array has more than `maxItems` items.
    MaxItems { limit: u64, count: u64 },
    /// Array has duplicate items despite `uniqueItems`.
    UniqueItems { first: usize, second: usize },
    /// No array item matches the `contains` schema.
    Contains,
    /// Fewer than `minContains` items match the `contains` schema.
    MinContains { limit: u64, count: u64 },
    /// More than `maxContains` items match the `contains` schema.
    MaxContains { limit: u64, count: u64 },
    /// Object has fewer than `minProperties` properties.
    MinProperties { limit: u64, count: u64 },
    /// Object has more than `maxProperties` properties.
    MaxProperties { limit: u64, count: u64 },
    /// A `required` property is missing.
    Required { property: String },
    /// A `dependentRequired` dependency is missing.
    DependentRequired {
        property: String,
        dependency: String,
    },
    /// A property fell through to a failing `additionalProperties`.
    AdditionalProperties { property: String },
    /// A property name failed the `propertyNames` schema.
    PropertyNames { property: String },
    /// An unevaluated property is not allowed.
    UnevaluatedProperties { property: String },
    /// An unevaluated item is not allowed.
    UnevaluatedItems { index: usize },
    /// The `false` schema allows nothing.
    FalseSchema,
    /// No `anyOf` branch matched.
    AnyOf,
    /// No `oneOf` branch matched.
    OneOfNotValid,
    /// More than one `oneOf` branch matched.
    OneOfMultipleValid,
    /// The instance matched the schema under `not`.
    Not,
    /// The instance does not conform to an asserted `format`.
    Format { format: String },
    /// A reference failed to resolve during validation.
    Reference(ReferenceError),
    /// A reference cycle was entered with no progress through the instance.
    CircularReference { reference: String },
    /// The caller cancelled validation.
    Cancelled,
    /// The instance could not be serialized to JSON.
    Serialization { reason: String },
}

impl ValidationError {
    pub(crate) fn new(
        kind: ValidationErrorKind,
        schema_path: JsonPointer,
        instance_path: JsonPointer,
    ) -> Self {
        Self {
            kind,
            instance_path,
            schema_path,
            cause: None,
        }
    }

    pub(crate) fn with_cause(mut self, cause: ValidationError) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// The chained child failure, when an applicator converted one into its
    /// own error.
    pub fn cause(&self) -> Option<&ValidationError> {
        self.cause.as_deref()
    }

    /// `true` when validation was aborted rather than failed.
    pub fn is_cancelled(&self) -> bool {
        matches!(self.kind, ValidationErrorKind::Cancelled)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ValidationErrorKind::Type { expected } => {
                if expected.len() == 1 {
                    write!(f, "value is not of type \"{expected}\"")
                } else {
                    write!(f, "value is not one of types {expected}")
                }
            }
            ValidationErrorKind::Constant { expected } => {
                write!(f, "{expected} was expected")
            }
            ValidationErrorKind::Enumeration { options } => {
                write!(f, "value is not one of {}", Value::from(options.clone()))
            }
            ValidationErrorKind::MinLength { limit, length } => {
                write!(f, "string length ({length}) is shorter than minLength ({limit})")
            }
            ValidationErrorKind::MaxLength { limit, length } => {
                write!(f, "string length ({length}) is longer than maxLength ({limit})")
            }
            ValidationErrorKind::Pattern { pattern } => {
                write!(f, "value does not match \"{pattern}\"")
            }
            ValidationErrorKind::MultipleOf { multiple_of } => {
                write!(f, "value is not a multiple of {multiple_of}")
            }
            ValidationErrorKind::Minimum { limit } => {
                write!(f, "value is less than the minimum of {limit}")
            }
            ValidationErrorKind::Maximum { limit } => {
                write!(f, "value is greater than the maximum of {limit}")
            }
            ValidationErrorKind::ExclusiveMinimum { limit } => {
                write!(f, "value is less than or equal to the exclusive minimum of {limit}")
            }
            ValidationErrorKind::ExclusiveMaximum { limit } => {
                write!(f, "value is greater than or equal to the exclusive maximum of {limit}")
            }
            ValidationErrorKind::MinItems { limit, count } => {
                write!(f, "array has {count} items, fewer than minItems ({limit})")
            }
            ValidationErrorKind::MaxItems { limit, count } => {
                write!(f, "array has {count} items, more than the maximum of {limit}")
            }
            ValidationErrorKind::UniqueItems { first, second } => {
                write!(f, "array has duplicate items at indexes {first} and {second}")
            }
            ValidationErrorKind::Contains => {
                f.write_str("no array items match the \"contains\" schema")
            }
            ValidationErrorKind::MinContains { limit, count } => {
                write!(f, "{count} array items match \"contains\", fewer than minContains ({limit})")
            }
            ValidationErrorKind::MaxContains { limit, count } => {
                write!(f, "{count} array items match \"contains\", more than maxContains ({limit})")
            }
            ValidationErrorKind::MinProperties { limit, count } => {
                write!(f, "object has {count} properties, fewer than minProperties ({limit})")
            }
            ValidationErrorKind::MaxProperties { limit, count } => {
                write!(f, "object has {count} properties, more than maxProperties ({limit})")
            }
            ValidationErrorKind::Required { property } => {
                write!(f, "\"{property}\" is a required property")
            }
            ValidationErrorKind::DependentRequired {
                property,
                dependency,
            } => {
                write!(f, "\"{dependency}\" is required when \"{property}\" is present")
            }
            ValidationErrorKind::AdditionalProperties { property } => {
                write!(f, "additional property \"{property}\" is not allowed")
            }
            ValidationErrorKind::PropertyNames { property } => {
                write!(f, "property name \"{property}\" is invalid")
            }
            ValidationErrorKind::UnevaluatedProperties { property } => {
                write!(f, "unevaluated property \"{property}\" is not allowed")
            }
            ValidationErrorKind::UnevaluatedItems { index } => {
                write!(f, "unevaluated item at index {index} is not allowed")
            }
            ValidationErrorKind::FalseSchema => f.write_str("false schema allows nothing"),
            ValidationErrorKind::AnyOf => {
                f.write_str("none of the schemas in \"anyOf\" matched")
            }
            ValidationErrorKind::OneOfNotValid => {
                f.write_str("none of the schemas in \"oneOf\" matched")
            }
            ValidationErrorKind::OneOfMultipleValid => {
                f.write_str("more than one schema in \"oneOf\" matched")
            }
            ValidationErrorKind::Not => {
                f.write_str("value must not match the schema in \"not\"")
            }
            ValidationErrorKind::Format { format } => {
                write!(f, "value does not conform to format \"{format}\"")
            }
            ValidationErrorKind::Reference(error) => error.fmt(f),
            ValidationErrorKind::CircularReference { reference } => {
                write!(f, "circular reference detected at \"{reference}\"")
            }
            ValidationErrorKind::Cancelled => f.write_str("validation was cancelled"),
            ValidationErrorKind::Serialization { reason } => {
                write!(f, "instance could not be serialized: {reason}")
            }
        }
    }
}

impl std::error::Error for ValidationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match (&self.cause, &self.kind) {
            (Some(cause), _) => Some(cause.as_ref()),
            (None, ValidationErrorKind::Reference(error)) => Some(error),
            _ => None,
        }
    }
}
