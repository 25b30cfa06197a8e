//! Keyword-presence bitmap for schema nodes.
//!
//! Every standard keyword owns one bit; bit order is the canonical keyword
//! order used for iteration and serialization. Callers combine flags with
//! `|` and test presence with [`Schema::has`](crate::Schema::has) /
//! [`Schema::has_any`](crate::Schema::has_any).

use std::{
    fmt,
    ops::{BitOr, BitOrAssign},
};

/// A set of schema keywords, one bit per keyword.
#[derive(Clone, Copy, Default, Eq, PartialEq, Hash)]
pub struct KeywordSet(u64);

macro_rules! keyword_flags {
    ($(($flag:ident, $name:literal, $bit:literal),)*) => {
        impl KeywordSet {
            $(
                #[doc = concat!("The `", $name, "` keyword.")]
                pub const $flag: KeywordSet = KeywordSet(1 << $bit);
            )*
        }

        /// Keyword names in canonical (bit) order.
        pub(crate) const KEYWORD_NAMES: &[&str] = &[$($name,)*];

        impl KeywordSet {
            /// The keyword name for a single-flag set.
            pub fn name(self) -> Option<&'static str> {
                if self.0.count_ones() != 1 {
                    return None;
                }
                KEYWORD_NAMES
                    .get(self.0.trailing_zeros() as usize)
                    .copied()
            }

            /// Look up the flag for a keyword name.
            pub fn for_name(name: &str) -> Option<KeywordSet> {
                KEYWORD_NAMES
                    .iter()
                    .position(|known| *known == name)
                    .map(|bit| KeywordSet(1 << bit))
            }
        }
    };
}

keyword_flags! {
    (SCHEMA, "$schema", 0),
    (ID, "$id", 1),
    (ANCHOR, "$anchor", 2),
    (DYNAMIC_ANCHOR, "$dynamicAnchor", 3),
    (REF, "$ref", 4),
    (DYNAMIC_REF, "$dynamicRef", 5),
    (VOCABULARY, "$vocabulary", 6),
    (COMMENT, "$comment", 7),
    (DEFS, "$defs", 8),
    (TITLE, "title", 9),
    (DESCRIPTION, "description", 10),
    (DEFAULT, "default", 11),
    (EXAMPLES, "examples", 12),
    (TYPE, "type", 13),
    (ENUM, "enum", 14),
    (CONST, "const", 15),
    (MULTIPLE_OF, "multipleOf", 16),
    (MAXIMUM, "maximum", 17),
    (EXCLUSIVE_MAXIMUM, "exclusiveMaximum", 18),
    (MINIMUM, "minimum", 19),
    (EXCLUSIVE_MINIMUM, "exclusiveMinimum", 20),
    (MAX_LENGTH, "maxLength", 21),
    (MIN_LENGTH, "minLength", 22),
    (PATTERN, "pattern", 23),
    (MAX_ITEMS, "maxItems", 24),
    (MIN_ITEMS, "minItems", 25),
    (UNIQUE_ITEMS, "uniqueItems", 26),
    (MAX_CONTAINS, "maxContains", 27),
    (MIN_CONTAINS, "minContains", 28),
    (MAX_PROPERTIES, "maxProperties", 29),
    (MIN_PROPERTIES, "minProperties", 30),
    (REQUIRED, "required", 31),
    (DEPENDENT_REQUIRED, "dependentRequired", 32),
    (PREFIX_ITEMS, "prefixItems", 33),
    (ITEMS, "items", 34),
    (CONTAINS, "contains", 35),
    (ADDITIONAL_PROPERTIES, "additionalProperties", 36),
    (PROPERTIES, "properties", 37),
    (PATTERN_PROPERTIES, "patternProperties", 38),
    (DEPENDENT_SCHEMAS, "dependentSchemas", 39),
    (PROPERTY_NAMES, "propertyNames", 40),
    (IF, "if", 41),
    (THEN, "then", 42),
    (ELSE, "else", 43),
    (ALL_OF, "allOf", 44),
    (ANY_OF, "anyOf", 45),
    (ONE_OF, "oneOf", 46),
    (NOT, "not", 47),
    (UNEVALUATED_ITEMS, "unevaluatedItems", 48),
    (UNEVALUATED_PROPERTIES, "unevaluatedProperties", 49),
    (FORMAT, "format", 50),
    (CONTENT_ENCODING, "contentEncoding", 51),
    (CONTENT_MEDIA_TYPE, "contentMediaType", 52),
}

impl KeywordSet {
    /// The empty set.
    pub const EMPTY: KeywordSet = KeywordSet(0);

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// `true` when every flag in `mask` is set.
    pub const fn contains_all(self, mask: KeywordSet) -> bool {
        self.0 & mask.0 == mask.0
    }

    /// `true` when at least one flag in `mask` is set.
    pub const fn intersects(self, mask: KeywordSet) -> bool {
        self.0 & mask.0 != 0
    }

    pub(crate) fn insert(&mut self, mask: KeywordSet) {
        self.0 |= mask.0;
    }

    pub(crate) fn remove(&mut self, mask: KeywordSet) {
        self.0 &= !mask.0;
    }

    /// Iterate the names of set keywords in canonical order.
    pub fn iter(self) -> impl Iterator<Item = &'static str> {
        KEYWORD_NAMES
            .iter()
            .enumerate()
            .filter(move |(bit, _)| self.0 & (1 << bit) != 0)
            .map(|(_, name)| *name)
    }
}

impl BitOr for KeywordSet {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for KeywordSet {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for KeywordSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn composition() {
        let mask = KeywordSet::MIN_LENGTH | KeywordSet::MAX_LENGTH;
        assert!(mask.contains_all(KeywordSet::MIN_LENGTH));
        assert!(mask.contains_all(KeywordSet::MIN_LENGTH | KeywordSet::MAX_LENGTH));
        assert!(!mask.contains_all(KeywordSet::PATTERN));
        assert!(mask.intersects(KeywordSet::MAX_LENGTH | KeywordSet::PATTERN));
        assert!(!mask.intersects(KeywordSet::PATTERN));
    }

    #[test]
    fn insert_and_remove() {
        let mut set = KeywordSet::EMPTY;
        set.insert(KeywordSet::TYPE | KeywordSet::REQUIRED);
        assert!(set.contains_all(KeywordSet::TYPE));
        set.remove(KeywordSet::TYPE);
        assert!(!set.intersects(KeywordSet::TYPE));
        assert!(set.contains_all(KeywordSet::REQUIRED));
    }

    #[test_case(KeywordSet::REF, "$ref")]
    #[test_case(KeywordSet::MIN_LENGTH, "minLength")]
    #[test_case(KeywordSet::UNEVALUATED_PROPERTIES, "unevaluatedProperties")]
    fn names(flag: KeywordSet, name: &str) {
        assert_eq!(flag.name(), Some(name));
        assert_eq!(KeywordSet::for_name(name), Some(flag));
    }

    #[test]
    fn composite_has_no_name() {
        assert_eq!((KeywordSet::TYPE | KeywordSet::ENUM).name(), None);
        assert_eq!(KeywordSet::EMPTY.name(), None);
    }

    #[test]
    fn canonical_iteration() {
        let set = KeywordSet::PROPERTIES | KeywordSet::TYPE | KeywordSet::REF;
        assert_eq!(
            set.iter().collect::<Vec<_>>(),
            vec!["$ref", "type", "properties"]
        );
    }

    #[test]
    fn bit_count_matches_names() {
        assert_eq!(KEYWORD_NAMES.len(), 53);
    }
}
