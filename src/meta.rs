//! The embedded draft 2020-12 meta-schema bundle.
//!
//! The meta documents are compiled once per process into a shared validator
//! used by default to check input schemas at compile time.

use crate::{compiler::STANDARD_DIALECT, schema::Schema, CompileOptions, Validator};
use once_cell::sync::Lazy;

const DOCUMENTS: &[(&str, &str)] = &[
    (
        STANDARD_DIALECT,
        include_str!("../metas/draft2020-12/schema.json"),
    ),
    (
        "https://json-schema.org/draft/2020-12/meta/core",
        include_str!("../metas/draft2020-12/meta/core.json"),
    ),
    (
        "https://json-schema.org/draft/2020-12/meta/applicator",
        include_str!("../metas/draft2020-12/meta/applicator.json"),
    ),
    (
        "https://json-schema.org/draft/2020-12/meta/unevaluated",
        include_str!("../metas/draft2020-12/meta/unevaluated.json"),
    ),
    (
        "https://json-schema.org/draft/2020-12/meta/validation",
        include_str!("../metas/draft2020-12/meta/validation.json"),
    ),
    (
        "https://json-schema.org/draft/2020-12/meta/meta-data",
        include_str!("../metas/draft2020-12/meta/meta-data.json"),
    ),
    (
        "https://json-schema.org/draft/2020-12/meta/format-annotation",
        include_str!("../metas/draft2020-12/meta/format-annotation.json"),
    ),
    (
        "https://json-schema.org/draft/2020-12/meta/content",
        include_str!("../metas/draft2020-12/meta/content.json"),
    ),
];

static SCHEMAS: Lazy<Vec<(&'static str, Schema)>> = Lazy::new(|| {
    DOCUMENTS
        .iter()
        .map(|(uri, text)| {
            let value = serde_json::from_str(text).expect("embedded meta-schema is valid JSON");
            let schema =
                Schema::from_value(&value).expect("embedded meta-schema is a valid schema");
            (*uri, schema)
        })
        .collect()
});

/// The parsed draft 2020-12 meta-schema.
pub fn schema() -> &'static Schema {
    &SCHEMAS[0].1
}

/// The process-wide validator compiled from the meta-schema bundle.
pub fn validator() -> &'static Validator {
    static VALIDATOR: Lazy<Validator> = Lazy::new(|| {
        let mut options = CompileOptions::new().without_schema_validation();
        for (uri, schema) in SCHEMAS.iter() {
            options = options.with_document(*uri, schema.clone());
        }
        options
            .compile(schema())
            .expect("embedded meta-schema compiles")
    });
    &VALIDATOR
}
