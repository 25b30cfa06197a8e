//! The immutable in-memory schema model.
//!
//! A [`Schema`] is either one of the two boolean schemas or an object-form
//! schema holding a subset of the standard draft 2020-12 keywords. Object
//! schemas are reference-counted so the resolver can hand the same child to
//! multiple parents without deep copies; `Clone` is O(1) everywhere.

use crate::{
    builder::SchemaBuilder,
    error::BuildError,
    fields::{KeywordSet, KEYWORD_NAMES},
    primitive_type::PrimitiveTypeSet,
};
use serde::{
    de::{self, Deserializer},
    ser::{SerializeMap, Serializer},
    Deserialize, Serialize,
};
use serde_json::{Number, Value};
use std::{collections::BTreeMap, sync::Arc};

/// A parsed JSON Schema document or sub-schema.
#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    /// `true` accepts every instance; `false` rejects every instance.
    Bool(bool),
    /// An object-form schema.
    Object(Arc<ObjectSchema>),
}

impl Schema {
    /// Parse a schema from a JSON value.
    pub fn from_value(value: &Value) -> Result<Schema, BuildError> {
        match value {
            Value::Bool(accept) => Ok(Schema::Bool(*accept)),
            Value::Object(_) => SchemaBuilder::parse(value)?.build(),
            _ => Err(BuildError::invalid_value(
                "schema",
                "a schema must be a boolean or an object",
            )),
        }
    }

    /// Serialize the schema to a JSON value in canonical keyword order.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).expect("schema serialization is infallible")
    }

    /// The set of keywords present on this schema.
    pub fn keywords(&self) -> KeywordSet {
        match self {
            Schema::Bool(_) => KeywordSet::EMPTY,
            Schema::Object(object) => object.fields,
        }
    }

    /// `true` when every keyword in `mask` is present.
    pub fn has(&self, mask: KeywordSet) -> bool {
        self.keywords().contains_all(mask)
    }

    /// `true` when at least one keyword in `mask` is present.
    pub fn has_any(&self, mask: KeywordSet) -> bool {
        self.keywords().intersects(mask)
    }

    /// The object form, unless this is a boolean schema.
    pub fn as_object(&self) -> Option<&ObjectSchema> {
        match self {
            Schema::Bool(_) => None,
            Schema::Object(object) => Some(object),
        }
    }

    /// Stable identity for compiled-schema memo tables. Boolean schemas
    /// share two reserved identities.
    pub(crate) fn identity(&self) -> usize {
        match self {
            Schema::Bool(false) => 0,
            Schema::Bool(true) => 1,
            Schema::Object(object) => Arc::as_ptr(object) as usize,
        }
    }
}

impl Serialize for Schema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Schema::Bool(accept) => serializer.serialize_bool(*accept),
            Schema::Object(object) => object.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Schema {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Schema::from_value(&value).map_err(de::Error::custom)
    }
}

/// The object form of a schema: one field per standard keyword plus the
/// presence bitmap and preserved unknown keywords.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectSchema {
    pub(crate) fields: KeywordSet,
    pub(crate) schema_uri: Option<String>,
    pub(crate) id: Option<String>,
    pub(crate) anchor: Option<String>,
    pub(crate) dynamic_anchor: Option<String>,
    pub(crate) reference: Option<String>,
    pub(crate) dynamic_reference: Option<String>,
    pub(crate) vocabulary: BTreeMap<String, bool>,
    pub(crate) comment: Option<String>,
    pub(crate) defs: BTreeMap<String, Schema>,
    pub(crate) title: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) default: Option<Value>,
    pub(crate) examples: Vec<Value>,
    pub(crate) types: PrimitiveTypeSet,
    pub(crate) enum_: Vec<Value>,
    pub(crate) const_: Option<Value>,
    pub(crate) multiple_of: Option<Number>,
    pub(crate) maximum: Option<Number>,
    pub(crate) exclusive_maximum: Option<Number>,
    pub(crate) minimum: Option<Number>,
    pub(crate) exclusive_minimum: Option<Number>,
    pub(crate) max_length: Option<u64>,
    pub(crate) min_length: Option<u64>,
    pub(crate) pattern: Option<String>,
    pub(crate) max_items: Option<u64>,
    pub(crate) min_items: Option<u64>,
    pub(crate) unique_items: bool,
    pub(crate) max_contains: Option<u64>,
    pub(crate) min_contains: Option<u64>,
    pub(crate) max_properties: Option<u64>,
    pub(crate) min_properties: Option<u64>,
    pub(crate) required: Vec<String>,
    pub(crate) dependent_required: BTreeMap<String, Vec<String>>,
    pub(crate) prefix_items: Vec<Schema>,
    pub(crate) items: Option<Schema>,
    pub(crate) contains: Option<Schema>,
    pub(crate) additional_properties: Option<Schema>,
    pub(crate) properties: BTreeMap<String, Schema>,
    pub(crate) pattern_properties: BTreeMap<String, Schema>,
    pub(crate) dependent_schemas: BTreeMap<String, Schema>,
    pub(crate) property_names: Option<Schema>,
    pub(crate) if_: Option<Schema>,
    pub(crate) then: Option<Schema>,
    pub(crate) else_: Option<Schema>,
    pub(crate) all_of: Vec<Schema>,
    pub(crate) any_of: Vec<Schema>,
    pub(crate) one_of: Vec<Schema>,
    pub(crate) not: Option<Schema>,
    pub(crate) unevaluated_items: Option<Schema>,
    pub(crate) unevaluated_properties: Option<Schema>,
    pub(crate) format: Option<String>,
    pub(crate) content_encoding: Option<String>,
    pub(crate) content_media_type: Option<String>,
    pub(crate) extras: BTreeMap<String, Value>,
}

macro_rules! str_accessor {
    ($(#[$doc:meta])* $name:ident, $field:ident) => {
        $(#[$doc])*
        pub fn $name(&self) -> &str {
            self.$field.as_deref().unwrap_or_default()
        }
    };
}

macro_rules! u64_accessor {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        pub fn $name(&self) -> u64 {
            self.$name.unwrap_or(0)
        }
    };
}

macro_rules! number_accessor {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        pub fn $name(&self) -> Option<&Number> {
            self.$name.as_ref()
        }
    };
}

macro_rules! schema_accessor {
    ($(#[$doc:meta])* $name:ident, $field:ident) => {
        $(#[$doc])*
        pub fn $name(&self) -> Option<&Schema> {
            self.$field.as_ref()
        }
    };
}

impl ObjectSchema {
    /// The set of keywords present on this schema.
    pub fn keywords(&self) -> KeywordSet {
        self.fields
    }

    str_accessor!(
        /// The `$schema` dialect URI, or "" when absent.
        schema_uri, schema_uri
    );
    str_accessor!(
        /// The `$id` base URI, or "" when absent.
        id, id
    );
    str_accessor!(
        /// The `$anchor` plain name, or "" when absent.
        anchor, anchor
    );
    str_accessor!(
        /// The `$dynamicAnchor` plain name, or "" when absent.
        dynamic_anchor, dynamic_anchor
    );
    str_accessor!(
        /// The `$ref` reference string, or "" when absent.
        reference, reference
    );
    str_accessor!(
        /// The `$dynamicRef` reference string, or "" when absent.
        dynamic_reference, dynamic_reference
    );
    str_accessor!(comment, comment);
    str_accessor!(title, title);
    str_accessor!(description, description);
    str_accessor!(
        /// The `pattern` source, or "" when absent.
        pattern, pattern
    );
    str_accessor!(format, format);
    str_accessor!(content_encoding, content_encoding);
    str_accessor!(content_media_type, content_media_type);

    u64_accessor!(max_length);
    u64_accessor!(min_length);
    u64_accessor!(max_items);
    u64_accessor!(min_items);
    u64_accessor!(max_contains);
    u64_accessor!(min_contains);
    u64_accessor!(max_properties);
    u64_accessor!(min_properties);

    number_accessor!(multiple_of);
    number_accessor!(maximum);
    number_accessor!(exclusive_maximum);
    number_accessor!(minimum);
    number_accessor!(exclusive_minimum);

    /// The `type` keyword as a set; empty when absent.
    pub fn types(&self) -> PrimitiveTypeSet {
        self.types
    }

    pub fn unique_items(&self) -> bool {
        self.unique_items
    }

    pub fn vocabulary(&self) -> &BTreeMap<String, bool> {
        &self.vocabulary
    }

    pub fn defs(&self) -> &BTreeMap<String, Schema> {
        &self.defs
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn examples(&self) -> &[Value] {
        &self.examples
    }

    pub fn enum_values(&self) -> &[Value] {
        &self.enum_
    }

    pub fn const_value(&self) -> Option<&Value> {
        self.const_.as_ref()
    }

    pub fn required(&self) -> &[String] {
        &self.required
    }

    pub fn dependent_required(&self) -> &BTreeMap<String, Vec<String>> {
        &self.dependent_required
    }

    pub fn prefix_items(&self) -> &[Schema] {
        &self.prefix_items
    }

    schema_accessor!(items, items);
    schema_accessor!(contains, contains);
    schema_accessor!(additional_properties, additional_properties);
    schema_accessor!(property_names, property_names);
    schema_accessor!(
        /// The `if` schema.
        if_schema, if_
    );
    schema_accessor!(
        /// The `then` schema.
        then_schema, then
    );
    schema_accessor!(
        /// The `else` schema.
        else_schema, else_
    );
    schema_accessor!(not, not);
    schema_accessor!(unevaluated_items, unevaluated_items);
    schema_accessor!(unevaluated_properties, unevaluated_properties);

    pub fn properties(&self) -> &BTreeMap<String, Schema> {
        &self.properties
    }

    pub fn pattern_properties(&self) -> &BTreeMap<String, Schema> {
        &self.pattern_properties
    }

    pub fn dependent_schemas(&self) -> &BTreeMap<String, Schema> {
        &self.dependent_schemas
    }

    pub fn all_of(&self) -> &[Schema] {
        &self.all_of
    }

    pub fn any_of(&self) -> &[Schema] {
        &self.any_of
    }

    pub fn one_of(&self) -> &[Schema] {
        &self.one_of
    }

    /// Unknown keywords, preserved verbatim.
    pub fn extras(&self) -> &BTreeMap<String, Value> {
        &self.extras
    }

    /// Every directly-embedded sub-schema, in canonical keyword order.
    pub fn subschemas(&self) -> impl Iterator<Item = &Schema> {
        let mut children: Vec<&Schema> = Vec::new();
        children.extend(self.defs.values());
        children.extend(&self.prefix_items);
        children.extend(self.items.iter());
        children.extend(self.contains.iter());
        children.extend(self.additional_properties.iter());
        children.extend(self.properties.values());
        children.extend(self.pattern_properties.values());
        children.extend(self.dependent_schemas.values());
        children.extend(self.property_names.iter());
        children.extend(self.if_.iter());
        children.extend(self.then.iter());
        children.extend(self.else_.iter());
        children.extend(&self.all_of);
        children.extend(&self.any_of);
        children.extend(&self.one_of);
        children.extend(self.not.iter());
        children.extend(self.unevaluated_items.iter());
        children.extend(self.unevaluated_properties.iter());
        children.into_iter()
    }

    fn serialize_keyword<M: SerializeMap>(&self, map: &mut M, name: &str) -> Result<(), M::Error> {
        match name {
            "$schema" => map.serialize_entry(name, self.schema_uri.as_deref().unwrap_or("")),
            "$id" => map.serialize_entry(name, self.id.as_deref().unwrap_or("")),
            "$anchor" => map.serialize_entry(name, self.anchor.as_deref().unwrap_or("")),
            "$dynamicAnchor" => {
                map.serialize_entry(name, self.dynamic_anchor.as_deref().unwrap_or(""))
            }
            "$ref" => map.serialize_entry(name, self.reference.as_deref().unwrap_or("")),
            "$dynamicRef" => {
                map.serialize_entry(name, self.dynamic_reference.as_deref().unwrap_or(""))
            }
            "$vocabulary" => map.serialize_entry(name, &self.vocabulary),
            "$comment" => map.serialize_entry(name, self.comment.as_deref().unwrap_or("")),
            "$defs" => map.serialize_entry(name, &self.defs),
            "title" => map.serialize_entry(name, self.title.as_deref().unwrap_or("")),
            "description" => map.serialize_entry(name, self.description.as_deref().unwrap_or("")),
            "default" => map.serialize_entry(name, self.default.as_ref().unwrap_or(&Value::Null)),
            "examples" => map.serialize_entry(name, &self.examples),
            "type" => {
                if let Some(single) = self.types.single() {
                    map.serialize_entry(name, single.as_str())
                } else {
                    let names: Vec<&str> =
                        self.types.iter().map(|primitive| primitive.as_str()).collect();
                    map.serialize_entry(name, &names)
                }
            }
            "enum" => map.serialize_entry(name, &self.enum_),
            "const" => map.serialize_entry(name, self.const_.as_ref().unwrap_or(&Value::Null)),
            "multipleOf" => map.serialize_entry(name, &self.multiple_of),
            "maximum" => map.serialize_entry(name, &self.maximum),
            "exclusiveMaximum" => map.serialize_entry(name, &self.exclusive_maximum),
            "minimum" => map.serialize_entry(name, &self.minimum),
            "exclusiveMinimum" => map.serialize_entry(name, &self.exclusive_minimum),
            "maxLength" => map.serialize_entry(name, &self.max_length),
            "minLength" => map.serialize_entry(name, &self.min_length),
            "pattern" => map.serialize_entry(name, self.pattern.as_deref().unwrap_or("")),
            "maxItems" => map.serialize_entry(name, &self.max_items),
            "minItems" => map.serialize_entry(name, &self.min_items),
            "uniqueItems" => map.serialize_entry(name, &self.unique_items),
            "maxContains" => map.serialize_entry(name, &self.max_contains),
            "minContains" => map.serialize_entry(name, &self.min_contains),
            "maxProperties" => map.serialize_entry(name, &self.max_properties),
            "minProperties" => map.serialize_entry(name, &self.min_properties),
            "required" => map.serialize_entry(name, &self.required),
            "dependentRequired" => map.serialize_entry(name, &self.dependent_required),
            "prefixItems" => map.serialize_entry(name, &self.prefix_items),
            "items" => map.serialize_entry(name, &self.items),
            "contains" => map.serialize_entry(name, &self.contains),
            "additionalProperties" => map.serialize_entry(name, &self.additional_properties),
            "properties" => map.serialize_entry(name, &self.properties),
            "patternProperties" => map.serialize_entry(name, &self.pattern_properties),
            "dependentSchemas" => map.serialize_entry(name, &self.dependent_schemas),
            "propertyNames" => map.serialize_entry(name, &self.property_names),
            "if" => map.serialize_entry(name, &self.if_),
            "then" => map.serialize_entry(name, &self.then),
            "else" => map.serialize_entry(name, &self.else_),
            "allOf" => map.serialize_entry(name, &self.all_of),
            "anyOf" => map.serialize_entry(name, &self.any_of),
            "oneOf" => map.serialize_entry(name, &self.one_of),
            "not" => map.serialize_entry(name, &self.not),
            "unevaluatedItems" => map.serialize_entry(name, &self.unevaluated_items),
            "unevaluatedProperties" => map.serialize_entry(name, &self.unevaluated_properties),
            "format" => map.serialize_entry(name, self.format.as_deref().unwrap_or("")),
            "contentEncoding" => {
                map.serialize_entry(name, self.content_encoding.as_deref().unwrap_or(""))
            }
            "contentMediaType" => {
                map.serialize_entry(name, self.content_media_type.as_deref().unwrap_or(""))
            }
            _ => unreachable!("serialize_keyword called with an unknown keyword"),
        }
    }
}

impl Serialize for ObjectSchema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for &name in KEYWORD_NAMES {
            if let Some(flag) = KeywordSet::for_name(name) {
                if self.fields.contains_all(flag) {
                    self.serialize_keyword(&mut map, name)?;
                }
            }
        }
        for (name, value) in &self.extras {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
