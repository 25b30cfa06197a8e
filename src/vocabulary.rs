//! Vocabulary gates for keyword compilation.
//!
//! Each draft 2020-12 vocabulary maps to one bit inside an evaluation
//! scope; keywords whose vocabulary is disabled are skipped entirely at
//! compile time.

use crate::{error::CompileError, schema::Schema};
use ahash::AHashSet;
use std::{fmt, str::FromStr};

/// One of the draft 2020-12 vocabularies, or a custom one named by URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Vocabulary {
    Core,
    Applicator,
    Unevaluated,
    Validation,
    Metadata,
    FormatAnnotation,
    FormatAssertion,
    Content,
    Custom(String),
}

impl FromStr for Vocabulary {
    type Err = ();

    fn from_str(uri: &str) -> Result<Self, Self::Err> {
        match uri {
            "https://json-schema.org/draft/2020-12/vocab/core" => Ok(Vocabulary::Core),
            "https://json-schema.org/draft/2020-12/vocab/applicator" => Ok(Vocabulary::Applicator),
            "https://json-schema.org/draft/2020-12/vocab/unevaluated" => {
                Ok(Vocabulary::Unevaluated)
            }
            "https://json-schema.org/draft/2020-12/vocab/validation" => Ok(Vocabulary::Validation),
            "https://json-schema.org/draft/2020-12/vocab/meta-data" => Ok(Vocabulary::Metadata),
            "https://json-schema.org/draft/2020-12/vocab/format-annotation" => {
                Ok(Vocabulary::FormatAnnotation)
            }
            "https://json-schema.org/draft/2020-12/vocab/format-assertion" => {
                Ok(Vocabulary::FormatAssertion)
            }
            "https://json-schema.org/draft/2020-12/vocab/content" => Ok(Vocabulary::Content),
            _ => Err(()),
        }
    }
}

impl Vocabulary {
    const fn bit(&self) -> u8 {
        match self {
            Vocabulary::Core => 1,
            Vocabulary::Applicator => 1 << 1,
            Vocabulary::Unevaluated => 1 << 2,
            Vocabulary::Validation => 1 << 3,
            Vocabulary::Metadata => 1 << 4,
            Vocabulary::FormatAnnotation => 1 << 5,
            Vocabulary::FormatAssertion => 1 << 6,
            Vocabulary::Content => 1 << 7,
            Vocabulary::Custom(_) => 0,
        }
    }

    /// The vocabulary that owns a keyword. Unknown keywords belong to no
    /// vocabulary and are never compiled.
    pub(crate) fn of_keyword(keyword: &str) -> Option<Vocabulary> {
        Some(match keyword {
            "$schema" | "$id" | "$anchor" | "$dynamicAnchor" | "$ref" | "$dynamicRef"
            | "$vocabulary" | "$comment" | "$defs" => Vocabulary::Core,
            "prefixItems" | "items" | "contains" | "additionalProperties" | "properties"
            | "patternProperties" | "dependentSchemas" | "propertyNames" | "if" | "then"
            | "else" | "allOf" | "anyOf" | "oneOf" | "not" => Vocabulary::Applicator,
            "unevaluatedItems" | "unevaluatedProperties" => Vocabulary::Unevaluated,
            "type" | "enum" | "const" | "multipleOf" | "maximum" | "exclusiveMaximum"
            | "minimum" | "exclusiveMinimum" | "maxLength" | "minLength" | "pattern"
            | "maxItems" | "minItems" | "uniqueItems" | "maxContains" | "minContains"
            | "maxProperties" | "minProperties" | "required" | "dependentRequired" => {
                Vocabulary::Validation
            }
            "title" | "description" | "default" | "examples" => Vocabulary::Metadata,
            "format" => Vocabulary::FormatAnnotation,
            "contentEncoding" | "contentMediaType" => Vocabulary::Content,
            _ => return None,
        })
    }
}

impl fmt::Display for Vocabulary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Vocabulary::Core => f.write_str("core"),
            Vocabulary::Applicator => f.write_str("applicator"),
            Vocabulary::Unevaluated => f.write_str("unevaluated"),
            Vocabulary::Validation => f.write_str("validation"),
            Vocabulary::Metadata => f.write_str("meta-data"),
            Vocabulary::FormatAnnotation => f.write_str("format-annotation"),
            Vocabulary::FormatAssertion => f.write_str("format-assertion"),
            Vocabulary::Content => f.write_str("content"),
            Vocabulary::Custom(uri) => f.write_str(uri),
        }
    }
}

/// The vocabularies enabled within one compilation scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VocabularySet {
    known: u8,
    custom: AHashSet<String>,
}

/// Everything the standard 2020-12 meta-schema enables; `format-assertion`
/// is opt-in there and stays off by default.
const DEFAULT_2020_12: u8 = 0b1011_1111;

impl Default for VocabularySet {
    fn default() -> Self {
        Self {
            known: DEFAULT_2020_12,
            custom: AHashSet::new(),
        }
    }
}

impl VocabularySet {
    pub(crate) fn empty() -> Self {
        Self {
            known: 0,
            custom: AHashSet::new(),
        }
    }

    pub(crate) fn add(&mut self, vocabulary: Vocabulary) {
        match vocabulary {
            Vocabulary::Custom(uri) => {
                self.custom.insert(uri);
            }
            known => self.known |= known.bit(),
        }
    }

    #[must_use]
    pub fn contains(&self, vocabulary: &Vocabulary) -> bool {
        match vocabulary {
            Vocabulary::Custom(uri) => self.custom.contains(uri),
            known => self.known & known.bit() != 0,
        }
    }

    /// Whether a keyword may be compiled in this scope.
    #[must_use]
    pub fn is_keyword_enabled(&self, keyword: &str) -> bool {
        match Vocabulary::of_keyword(keyword) {
            // `format` asserts under either of its vocabularies.
            Some(Vocabulary::FormatAnnotation) => {
                self.contains(&Vocabulary::FormatAnnotation)
                    || self.contains(&Vocabulary::FormatAssertion)
            }
            Some(vocabulary) => self.contains(&vocabulary),
            None => false,
        }
    }

    /// Derive the active set from a meta-schema's `$vocabulary` object.
    ///
    /// Unknown vocabularies marked required fail compilation; optional ones
    /// are ignored.
    pub(crate) fn from_meta_schema(meta: &Schema) -> Result<VocabularySet, CompileError> {
        let Some(object) = meta.as_object() else {
            return Ok(VocabularySet::default());
        };
        if !object.keywords().contains_all(crate::KeywordSet::VOCABULARY) {
            return Ok(VocabularySet::default());
        }
        let mut set = VocabularySet::empty();
        for (uri, required) in object.vocabulary() {
            match uri.parse::<Vocabulary>() {
                Ok(vocabulary) => set.add(vocabulary),
                Err(()) if *required => {
                    return Err(CompileError::UnsupportedVocabulary { uri: uri.clone() });
                }
                Err(()) => {}
            }
        }
        Ok(set)
    }
}
