//! The construction-phase mirror of the schema model.
//!
//! `SchemaBuilder` is the only mutable view of a schema: fluent setters
//! accumulate keywords, `build` checks cross-keyword invariants and
//! produces an immutable [`Schema`].

use crate::{
    error::BuildError,
    fields::KeywordSet,
    keywords::helpers,
    primitive_type::{PrimitiveType, PrimitiveTypeSet},
    reference::{is_plain_name, validate_reference},
    schema::{ObjectSchema, Schema},
};
use ahash::AHashSet;
use serde_json::{Number, Value};
use std::sync::Arc;

/// Accumulates keywords for an object-form schema.
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
    object: ObjectSchema,
}

macro_rules! string_setter {
    ($(#[$doc:meta])* $name:ident, $field:ident, $flag:ident) => {
        $(#[$doc])*
        #[must_use]
        pub fn $name(mut self, value: impl Into<String>) -> Self {
            self.object.$field = Some(value.into());
            self.object.fields.insert(KeywordSet::$flag);
            self
        }
    };
}

macro_rules! u64_setter {
    ($name:ident, $flag:ident) => {
        #[must_use]
        pub fn $name(mut self, value: u64) -> Self {
            self.object.$name = Some(value);
            self.object.fields.insert(KeywordSet::$flag);
            self
        }
    };
}

macro_rules! number_setter {
    ($name:ident, $flag:ident) => {
        #[must_use]
        pub fn $name(mut self, value: impl Into<Number>) -> Self {
            self.object.$name = Some(value.into());
            self.object.fields.insert(KeywordSet::$flag);
            self
        }
    };
}

macro_rules! schema_setter {
    ($(#[$doc:meta])* $name:ident, $field:ident, $flag:ident) => {
        $(#[$doc])*
        #[must_use]
        pub fn $name(mut self, schema: Schema) -> Self {
            self.object.$field = Some(schema);
            self.object.fields.insert(KeywordSet::$flag);
            self
        }
    };
}

macro_rules! schema_list_setter {
    ($name:ident, $field:ident, $flag:ident) => {
        #[must_use]
        pub fn $name(mut self, schemas: impl IntoIterator<Item = Schema>) -> Self {
            self.object.$field = schemas.into_iter().collect();
            self.object.fields.insert(KeywordSet::$flag);
            self
        }
    };
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a copy of every keyword on an existing schema. Boolean
    /// schemas carry no keywords, so they yield an empty builder.
    pub fn from_schema(schema: &Schema) -> Self {
        match schema {
            Schema::Bool(_) => Self::new(),
            Schema::Object(object) => Self {
                object: (**object).clone(),
            },
        }
    }

    string_setter!(
        /// Set `$schema`, the dialect URI.
        schema_uri, schema_uri, SCHEMA
    );
    string_setter!(
        /// Set `$id`, the base URI of this schema resource.
        id, id, ID
    );
    string_setter!(anchor, anchor, ANCHOR);
    string_setter!(dynamic_anchor, dynamic_anchor, DYNAMIC_ANCHOR);
    string_setter!(
        /// Set `$ref`.
        reference, reference, REF
    );
    string_setter!(
        /// Set `$dynamicRef`.
        dynamic_reference, dynamic_reference, DYNAMIC_REF
    );
    string_setter!(comment, comment, COMMENT);
    string_setter!(title, title, TITLE);
    string_setter!(description, description, DESCRIPTION);
    string_setter!(pattern, pattern, PATTERN);
    string_setter!(format, format, FORMAT);
    string_setter!(content_encoding, content_encoding, CONTENT_ENCODING);
    string_setter!(content_media_type, content_media_type, CONTENT_MEDIA_TYPE);

    u64_setter!(max_length, MAX_LENGTH);
    u64_setter!(min_length, MIN_LENGTH);
    u64_setter!(max_items, MAX_ITEMS);
    u64_setter!(min_items, MIN_ITEMS);
    u64_setter!(max_contains, MAX_CONTAINS);
    u64_setter!(min_contains, MIN_CONTAINS);
    u64_setter!(max_properties, MAX_PROPERTIES);
    u64_setter!(min_properties, MIN_PROPERTIES);

    number_setter!(multiple_of, MULTIPLE_OF);
    number_setter!(maximum, MAXIMUM);
    number_setter!(exclusive_maximum, EXCLUSIVE_MAXIMUM);
    number_setter!(minimum, MINIMUM);
    number_setter!(exclusive_minimum, EXCLUSIVE_MINIMUM);

    schema_setter!(items, items, ITEMS);
    schema_setter!(contains, contains, CONTAINS);
    schema_setter!(additional_properties, additional_properties, ADDITIONAL_PROPERTIES);
    schema_setter!(property_names, property_names, PROPERTY_NAMES);
    schema_setter!(
        /// Set the `if` schema.
        if_schema, if_, IF
    );
    schema_setter!(
        /// Set the `then` schema.
        then_schema, then, THEN
    );
    schema_setter!(
        /// Set the `else` schema.
        else_schema, else_, ELSE
    );
    schema_setter!(not, not, NOT);
    schema_setter!(unevaluated_items, unevaluated_items, UNEVALUATED_ITEMS);
    schema_setter!(
        unevaluated_properties,
        unevaluated_properties,
        UNEVALUATED_PROPERTIES
    );

    schema_list_setter!(prefix_items, prefix_items, PREFIX_ITEMS);
    schema_list_setter!(all_of, all_of, ALL_OF);
    schema_list_setter!(any_of, any_of, ANY_OF);
    schema_list_setter!(one_of, one_of, ONE_OF);

    /// Add one primitive to the `type` set.
    #[must_use]
    pub fn schema_type(mut self, primitive: PrimitiveType) -> Self {
        self.object.types = self.object.types.with(primitive);
        self.object.fields.insert(KeywordSet::TYPE);
        self
    }

    /// Replace the `type` set.
    #[must_use]
    pub fn types(mut self, primitives: impl IntoIterator<Item = PrimitiveType>) -> Self {
        self.object.types = primitives.into_iter().collect();
        self.object.fields.insert(KeywordSet::TYPE);
        self
    }

    #[must_use]
    pub fn enum_values(mut self, options: impl IntoIterator<Item = Value>) -> Self {
        self.object.enum_ = options.into_iter().collect();
        self.object.fields.insert(KeywordSet::ENUM);
        self
    }

    #[must_use]
    pub fn const_value(mut self, value: Value) -> Self {
        self.object.const_ = Some(value);
        self.object.fields.insert(KeywordSet::CONST);
        self
    }

    #[must_use]
    pub fn default_value(mut self, value: Value) -> Self {
        self.object.default = Some(value);
        self.object.fields.insert(KeywordSet::DEFAULT);
        self
    }

    /// Add one example.
    #[must_use]
    pub fn example(mut self, value: Value) -> Self {
        self.object.examples.push(value);
        self.object.fields.insert(KeywordSet::EXAMPLES);
        self
    }

    #[must_use]
    pub fn unique_items(mut self, unique: bool) -> Self {
        self.object.unique_items = unique;
        self.object.fields.insert(KeywordSet::UNIQUE_ITEMS);
        self
    }

    /// Replace the `required` list.
    #[must_use]
    pub fn required<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.object.required = names.into_iter().map(Into::into).collect();
        self.object.fields.insert(KeywordSet::REQUIRED);
        self
    }

    /// Add one `dependentRequired` entry.
    #[must_use]
    pub fn dependent_required<I, S>(mut self, property: impl Into<String>, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.object.dependent_required.insert(
            property.into(),
            dependencies.into_iter().map(Into::into).collect(),
        );
        self.object.fields.insert(KeywordSet::DEPENDENT_REQUIRED);
        self
    }

    /// Add one `properties` entry.
    #[must_use]
    pub fn property(mut self, name: impl Into<String>, schema: Schema) -> Self {
        self.object.properties.insert(name.into(), schema);
        self.object.fields.insert(KeywordSet::PROPERTIES);
        self
    }

    /// Add one `patternProperties` entry.
    #[must_use]
    pub fn pattern_property(mut self, pattern: impl Into<String>, schema: Schema) -> Self {
        self.object.pattern_properties.insert(pattern.into(), schema);
        self.object.fields.insert(KeywordSet::PATTERN_PROPERTIES);
        self
    }

    /// Add one `dependentSchemas` entry.
    #[must_use]
    pub fn dependent_schema(mut self, property: impl Into<String>, schema: Schema) -> Self {
        self.object.dependent_schemas.insert(property.into(), schema);
        self.object.fields.insert(KeywordSet::DEPENDENT_SCHEMAS);
        self
    }

    /// Add one `$defs` entry.
    #[must_use]
    pub fn definition(mut self, name: impl Into<String>, schema: Schema) -> Self {
        self.object.defs.insert(name.into(), schema);
        self.object.fields.insert(KeywordSet::DEFS);
        self
    }

    /// Add one `$vocabulary` entry.
    #[must_use]
    pub fn vocabulary(mut self, uri: impl Into<String>, required: bool) -> Self {
        self.object.vocabulary.insert(uri.into(), required);
        self.object.fields.insert(KeywordSet::VOCABULARY);
        self
    }

    /// Preserve an unknown keyword verbatim.
    #[must_use]
    pub fn extra(mut self, name: impl Into<String>, value: Value) -> Self {
        self.object.extras.insert(name.into(), value);
        self
    }

    /// Clear the keywords in `mask` along with their presence bits.
    #[must_use]
    pub fn reset(mut self, mask: KeywordSet) -> Self {
        macro_rules! clear {
            ($(($flag:ident, $field:ident),)*) => {
                $(
                    if mask.contains_all(KeywordSet::$flag) {
                        self.object.$field = Default::default();
                    }
                )*
            };
        }
        clear! {
            (SCHEMA, schema_uri),
            (ID, id),
            (ANCHOR, anchor),
            (DYNAMIC_ANCHOR, dynamic_anchor),
            (REF, reference),
            (DYNAMIC_REF, dynamic_reference),
            (VOCABULARY, vocabulary),
            (COMMENT, comment),
            (DEFS, defs),
            (TITLE, title),
            (DESCRIPTION, description),
            (DEFAULT, default),
            (EXAMPLES, examples),
            (TYPE, types),
            (ENUM, enum_),
            (CONST, const_),
            (MULTIPLE_OF, multiple_of),
            (MAXIMUM, maximum),
            (EXCLUSIVE_MAXIMUM, exclusive_maximum),
            (MINIMUM, minimum),
            (EXCLUSIVE_MINIMUM, exclusive_minimum),
            (MAX_LENGTH, max_length),
            (MIN_LENGTH, min_length),
            (PATTERN, pattern),
            (MAX_ITEMS, max_items),
            (MIN_ITEMS, min_items),
            (UNIQUE_ITEMS, unique_items),
            (MAX_CONTAINS, max_contains),
            (MIN_CONTAINS, min_contains),
            (MAX_PROPERTIES, max_properties),
            (MIN_PROPERTIES, min_properties),
            (REQUIRED, required),
            (DEPENDENT_REQUIRED, dependent_required),
            (PREFIX_ITEMS, prefix_items),
            (ITEMS, items),
            (CONTAINS, contains),
            (ADDITIONAL_PROPERTIES, additional_properties),
            (PROPERTIES, properties),
            (PATTERN_PROPERTIES, pattern_properties),
            (DEPENDENT_SCHEMAS, dependent_schemas),
            (PROPERTY_NAMES, property_names),
            (IF, if_),
            (THEN, then),
            (ELSE, else_),
            (ALL_OF, all_of),
            (ANY_OF, any_of),
            (ONE_OF, one_of),
            (NOT, not),
            (UNEVALUATED_ITEMS, unevaluated_items),
            (UNEVALUATED_PROPERTIES, unevaluated_properties),
            (FORMAT, format),
            (CONTENT_ENCODING, content_encoding),
            (CONTENT_MEDIA_TYPE, content_media_type),
        }
        self.object.fields.remove(mask);
        self
    }

    /// Validate the accumulated keywords and produce an immutable schema.
    pub fn build(self) -> Result<Schema, BuildError> {
        validate(&self.object)?;
        Ok(Schema::Object(Arc::new(self.object)))
    }

    /// Infallible [`build`](Self::build): panics on a structural violation.
    pub fn must_build(self) -> Schema {
        self.build()
            .unwrap_or_else(|error| panic!("schema failed to build: {error}"))
    }

    /// Parse the keywords of a JSON object into a builder.
    pub(crate) fn parse(value: &Value) -> Result<SchemaBuilder, BuildError> {
        let map = value
            .as_object()
            .ok_or_else(|| BuildError::invalid_value("schema", "expected an object"))?;
        let mut builder = SchemaBuilder::new();
        for (keyword, value) in map {
            builder = match keyword.as_str() {
                "$schema" => builder.schema_uri(expect_str("$schema", value)?),
                "$id" => builder.id(expect_str("$id", value)?),
                "$anchor" => builder.anchor(expect_str("$anchor", value)?),
                "$dynamicAnchor" => builder.dynamic_anchor(expect_str("$dynamicAnchor", value)?),
                "$ref" => builder.reference(expect_str("$ref", value)?),
                "$dynamicRef" => builder.dynamic_reference(expect_str("$dynamicRef", value)?),
                "$vocabulary" => parse_vocabulary(builder, value)?,
                "$comment" => builder.comment(expect_str("$comment", value)?),
                "$defs" => parse_schema_map(builder, value, "$defs", |builder, name, schema| {
                    builder.definition(name, schema)
                })?,
                "title" => builder.title(expect_str("title", value)?),
                "description" => builder.description(expect_str("description", value)?),
                "default" => builder.default_value(value.clone()),
                "examples" => {
                    let examples = expect_array("examples", value)?;
                    let mut next = builder;
                    for example in examples {
                        next = next.example(example.clone());
                    }
                    // An empty list still marks the keyword present.
                    next.object.fields.insert(KeywordSet::EXAMPLES);
                    next
                }
                "type" => builder.types(parse_types(value)?),
                "enum" => builder.enum_values(expect_array("enum", value)?.iter().cloned()),
                "const" => builder.const_value(value.clone()),
                "multipleOf" => builder.multiple_of(expect_number("multipleOf", value)?),
                "maximum" => builder.maximum(expect_number("maximum", value)?),
                "exclusiveMaximum" => {
                    builder.exclusive_maximum(expect_number("exclusiveMaximum", value)?)
                }
                "minimum" => builder.minimum(expect_number("minimum", value)?),
                "exclusiveMinimum" => {
                    builder.exclusive_minimum(expect_number("exclusiveMinimum", value)?)
                }
                "maxLength" => builder.max_length(expect_u64("maxLength", value)?),
                "minLength" => builder.min_length(expect_u64("minLength", value)?),
                "pattern" => builder.pattern(expect_str("pattern", value)?),
                "maxItems" => builder.max_items(expect_u64("maxItems", value)?),
                "minItems" => builder.min_items(expect_u64("minItems", value)?),
                "uniqueItems" => builder.unique_items(expect_bool("uniqueItems", value)?),
                "maxContains" => builder.max_contains(expect_u64("maxContains", value)?),
                "minContains" => builder.min_contains(expect_u64("minContains", value)?),
                "maxProperties" => builder.max_properties(expect_u64("maxProperties", value)?),
                "minProperties" => builder.min_properties(expect_u64("minProperties", value)?),
                "required" => builder.required(expect_string_array("required", value)?),
                "dependentRequired" => parse_dependent_required(builder, value)?,
                "prefixItems" => {
                    builder.prefix_items(parse_schema_array("prefixItems", value)?)
                }
                "items" => builder.items(Schema::from_value(value)?),
                "contains" => builder.contains(Schema::from_value(value)?),
                "additionalProperties" => {
                    builder.additional_properties(Schema::from_value(value)?)
                }
                "properties" => {
                    parse_schema_map(builder, value, "properties", |builder, name, schema| {
                        builder.property(name, schema)
                    })?
                }
                "patternProperties" => parse_schema_map(
                    builder,
                    value,
                    "patternProperties",
                    |builder, pattern, schema| builder.pattern_property(pattern, schema),
                )?,
                "dependentSchemas" => parse_schema_map(
                    builder,
                    value,
                    "dependentSchemas",
                    |builder, name, schema| builder.dependent_schema(name, schema),
                )?,
                "propertyNames" => builder.property_names(Schema::from_value(value)?),
                "if" => builder.if_schema(Schema::from_value(value)?),
                "then" => builder.then_schema(Schema::from_value(value)?),
                "else" => builder.else_schema(Schema::from_value(value)?),
                "allOf" => builder.all_of(parse_schema_array("allOf", value)?),
                "anyOf" => builder.any_of(parse_schema_array("anyOf", value)?),
                "oneOf" => builder.one_of(parse_schema_array("oneOf", value)?),
                "not" => builder.not(Schema::from_value(value)?),
                "unevaluatedItems" => builder.unevaluated_items(Schema::from_value(value)?),
                "unevaluatedProperties" => {
                    builder.unevaluated_properties(Schema::from_value(value)?)
                }
                "format" => builder.format(expect_str("format", value)?),
                "contentEncoding" => {
                    builder.content_encoding(expect_str("contentEncoding", value)?)
                }
                "contentMediaType" => {
                    builder.content_media_type(expect_str("contentMediaType", value)?)
                }
                _ => builder.extra(keyword.clone(), value.clone()),
            };
        }
        Ok(builder)
    }
}

fn validate(object: &ObjectSchema) -> Result<(), BuildError> {
    if object.fields.contains_all(KeywordSet::TYPE) && object.types.is_empty() {
        return Err(BuildError::EmptyTypes);
    }
    let mut seen = AHashSet::with_capacity(object.required.len());
    for name in &object.required {
        if !seen.insert(name.as_str()) {
            return Err(BuildError::DuplicateRequired { name: name.clone() });
        }
    }
    let bounds: [(&Option<u64>, &Option<u64>, &'static str, &'static str); 4] = [
        (&object.min_length, &object.max_length, "minLength", "maxLength"),
        (&object.min_items, &object.max_items, "minItems", "maxItems"),
        (
            &object.min_contains,
            &object.max_contains,
            "minContains",
            "maxContains",
        ),
        (
            &object.min_properties,
            &object.max_properties,
            "minProperties",
            "maxProperties",
        ),
    ];
    for (lower, upper, lower_name, upper_name) in bounds {
        if let (Some(lower), Some(upper)) = (lower, upper) {
            if lower > upper {
                return Err(BuildError::BoundsConflict {
                    lower: lower_name,
                    upper: upper_name,
                });
            }
        }
    }
    if let (Some(minimum), Some(maximum)) = (&object.minimum, &object.maximum) {
        if !helpers::number_le(minimum, maximum) {
            return Err(BuildError::BoundsConflict {
                lower: "minimum",
                upper: "maximum",
            });
        }
    }
    if let Some(multiple_of) = &object.multiple_of {
        if !helpers::number_gt(multiple_of, &Number::from(0u64)) {
            return Err(BuildError::invalid_value(
                "multipleOf",
                "must be greater than zero",
            ));
        }
    }
    for (keyword, anchor) in [
        ("$anchor", &object.anchor),
        ("$dynamicAnchor", &object.dynamic_anchor),
    ] {
        if let Some(anchor) = anchor {
            if !is_plain_name(anchor) {
                return Err(BuildError::InvalidAnchor {
                    keyword,
                    anchor: anchor.clone(),
                });
            }
        }
    }
    for (keyword, reference) in [
        ("$ref", &object.reference),
        ("$dynamicRef", &object.dynamic_reference),
    ] {
        if let Some(reference) = reference {
            validate_reference(reference)
                .map_err(|source| BuildError::Reference { keyword, source })?;
        }
    }
    Ok(())
}

fn expect_str<'a>(keyword: &'static str, value: &'a Value) -> Result<&'a str, BuildError> {
    value
        .as_str()
        .ok_or_else(|| BuildError::invalid_value(keyword, "expected a string"))
}

fn expect_bool(keyword: &'static str, value: &Value) -> Result<bool, BuildError> {
    value
        .as_bool()
        .ok_or_else(|| BuildError::invalid_value(keyword, "expected a boolean"))
}

fn expect_u64(keyword: &'static str, value: &Value) -> Result<u64, BuildError> {
    if let Some(number) = value.as_u64() {
        return Ok(number);
    }
    // Integer-valued floats are accepted, the same as `1` vs `1.0`.
    if let Some(float) = value.as_f64() {
        if float.fract() == 0.0 && float >= 0.0 {
            return Ok(float as u64);
        }
    }
    Err(BuildError::invalid_value(
        keyword,
        "expected a non-negative integer",
    ))
}

fn expect_number(keyword: &'static str, value: &Value) -> Result<Number, BuildError> {
    match value {
        Value::Number(number) => Ok(number.clone()),
        _ => Err(BuildError::invalid_value(keyword, "expected a number")),
    }
}

fn expect_array<'a>(keyword: &'static str, value: &'a Value) -> Result<&'a [Value], BuildError> {
    value
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| BuildError::invalid_value(keyword, "expected an array"))
}

fn expect_string_array(keyword: &'static str, value: &Value) -> Result<Vec<String>, BuildError> {
    expect_array(keyword, value)?
        .iter()
        .map(|entry| {
            entry
                .as_str()
                .map(str::to_owned)
                .ok_or_else(|| BuildError::invalid_value(keyword, "expected an array of strings"))
        })
        .collect()
}

fn parse_schema_array(keyword: &'static str, value: &Value) -> Result<Vec<Schema>, BuildError> {
    expect_array(keyword, value)?
        .iter()
        .map(Schema::from_value)
        .collect()
}

fn parse_schema_map(
    builder: SchemaBuilder,
    value: &Value,
    keyword: &'static str,
    add: impl Fn(SchemaBuilder, String, Schema) -> SchemaBuilder,
) -> Result<SchemaBuilder, BuildError> {
    let map = value
        .as_object()
        .ok_or_else(|| BuildError::invalid_value(keyword, "expected an object of schemas"))?;
    let mut builder = builder;
    for (name, entry) in map {
        builder = add(builder, name.clone(), Schema::from_value(entry)?);
    }
    Ok(builder)
}

fn parse_vocabulary(builder: SchemaBuilder, value: &Value) -> Result<SchemaBuilder, BuildError> {
    let map = value
        .as_object()
        .ok_or_else(|| BuildError::invalid_value("$vocabulary", "expected an object"))?;
    let mut builder = builder;
    for (uri, required) in map {
        let required = expect_bool("$vocabulary", required)?;
        builder = builder.vocabulary(uri.clone(), required);
    }
    Ok(builder)
}

fn parse_dependent_required(
    builder: SchemaBuilder,
    value: &Value,
) -> Result<SchemaBuilder, BuildError> {
    let map = value.as_object().ok_or_else(|| {
        BuildError::invalid_value("dependentRequired", "expected an object of string arrays")
    })?;
    let mut builder = builder;
    for (property, dependencies) in map {
        let dependencies = expect_string_array("dependentRequired", dependencies)?;
        builder = builder.dependent_required(property.clone(), dependencies);
    }
    Ok(builder)
}

fn parse_types(value: &Value) -> Result<PrimitiveTypeSet, BuildError> {
    match value {
        Value::String(name) => parse_type_name(name).map(PrimitiveTypeSet::from),
        Value::Array(names) => {
            if names.is_empty() {
                return Err(BuildError::EmptyTypes);
            }
            names
                .iter()
                .map(|entry| {
                    entry
                        .as_str()
                        .ok_or_else(|| {
                            BuildError::invalid_value("type", "expected a string or string array")
                        })
                        .and_then(parse_type_name)
                })
                .collect()
        }
        _ => Err(BuildError::invalid_value(
            "type",
            "expected a string or string array",
        )),
    }
}

fn parse_type_name(name: &str) -> Result<PrimitiveType, BuildError> {
    name.parse()
        .map_err(|()| BuildError::UnknownType { name: name.into() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fluent_construction() {
        let schema = SchemaBuilder::new()
            .schema_type(PrimitiveType::Object)
            .property(
                "name",
                SchemaBuilder::new()
                    .schema_type(PrimitiveType::String)
                    .min_length(1)
                    .must_build(),
            )
            .required(["name"])
            .must_build();
        assert_eq!(
            schema.to_value(),
            json!({
                "type": "object",
                "required": ["name"],
                "properties": {"name": {"type": "string", "minLength": 1}}
            })
        );
    }

    #[test]
    fn clone_round_trip() {
        let original = Schema::from_value(&json!({
            "type": ["object", "null"],
            "properties": {"a": {"type": "integer"}},
            "required": ["a"],
            "minProperties": 1,
            "x-extra": true
        }))
        .unwrap();
        let copy = SchemaBuilder::from_schema(&original).build().unwrap();
        assert_eq!(original, copy);
    }

    #[test]
    fn reset_clears_exactly_the_mask() {
        let builder = SchemaBuilder::new()
            .schema_type(PrimitiveType::String)
            .min_length(2)
            .max_length(4)
            .pattern("^a");
        let schema = builder
            .reset(KeywordSet::MIN_LENGTH | KeywordSet::PATTERN)
            .must_build();
        assert!(!schema.has_any(KeywordSet::MIN_LENGTH | KeywordSet::PATTERN));
        assert!(schema.has(KeywordSet::TYPE | KeywordSet::MAX_LENGTH));
        let object = schema.as_object().unwrap();
        assert_eq!(object.max_length(), 4);
        assert_eq!(object.min_length(), 0);
        assert_eq!(object.pattern(), "");
    }

    #[test]
    fn duplicate_required_rejected() {
        let error = SchemaBuilder::new()
            .required(["a", "b", "a"])
            .build()
            .unwrap_err();
        assert!(matches!(
            error,
            BuildError::DuplicateRequired { name } if name == "a"
        ));
    }

    #[test]
    fn bound_conflicts_rejected() {
        assert!(matches!(
            SchemaBuilder::new().min_length(5).max_length(2).build(),
            Err(BuildError::BoundsConflict {
                lower: "minLength",
                upper: "maxLength",
            })
        ));
        assert!(SchemaBuilder::new()
            .minimum(10)
            .maximum(2)
            .build()
            .is_err());
        assert!(SchemaBuilder::new()
            .min_items(1)
            .max_items(1)
            .build()
            .is_ok());
    }

    #[test]
    fn anchors_must_be_plain_names() {
        assert!(SchemaBuilder::new().anchor("with/slash").build().is_err());
        assert!(SchemaBuilder::new().anchor("3startsWithDigit").build().is_err());
        assert!(SchemaBuilder::new().anchor("plain-name_1").build().is_ok());
    }

    #[test]
    fn references_are_checked() {
        assert!(SchemaBuilder::new().reference("").build().is_err());
        assert!(SchemaBuilder::new().reference("#a/b").build().is_err());
        assert!(SchemaBuilder::new()
            .reference("#/$defs/other")
            .build()
            .is_ok());
    }

    #[test]
    fn empty_type_array_rejected() {
        assert!(Schema::from_value(&json!({"type": []})).is_err());
        assert!(Schema::from_value(&json!({"type": "float"})).is_err());
    }

    #[test]
    fn multiple_of_must_be_positive() {
        assert!(Schema::from_value(&json!({"multipleOf": 0})).is_err());
        assert!(Schema::from_value(&json!({"multipleOf": 0.5})).is_ok());
    }

    #[test]
    fn keyword_payload_types_checked() {
        assert!(Schema::from_value(&json!({"minLength": -1})).is_err());
        assert!(Schema::from_value(&json!({"minLength": 2.5})).is_err());
        assert!(Schema::from_value(&json!({"minLength": 2.0})).is_ok());
        assert!(Schema::from_value(&json!({"required": [1]})).is_err());
        assert!(Schema::from_value(&json!({"pattern": 7})).is_err());
    }
}
