//! Schema compilation: configuration, the compile-time context, and the
//! translation of schema nodes into validator trees.

use crate::{
    error::{CompileError, ReferenceError},
    fields::KeywordSet,
    keywords::{array, conditional, const_, enum_, format, logical, numeric, object, ref_, string, type_, unevaluated},
    paths::{JsonPointer, PathChunk},
    reference::DEFAULT_BASE_URL,
    resolver::{Resolver, SchemaLoader},
    schema::{ObjectSchema, Schema},
    validator::{KeywordValidator, SchemaNode, Validator},
    vocabulary::VocabularySet,
};
use ahash::AHashSet;
use std::{cell::RefCell, fmt, rc::Rc, sync::Arc};
use url::Url;

pub(crate) const STANDARD_DIALECT: &str = "https://json-schema.org/draft/2020-12/schema";

/// Configuration for schema compilation.
///
/// ```rust
/// use serde_json::json;
/// use json_schema::{Schema, Validator};
///
/// let schema = Schema::from_value(&json!({"format": "email"})).unwrap();
/// let validator = Validator::options()
///     .should_validate_formats(true)
///     .compile(&schema)
///     .expect("invalid schema");
/// assert!(!validator.is_valid(&json!("not an email")));
/// ```
#[derive(Clone)]
pub struct CompileOptions {
    loader: Option<Arc<dyn SchemaLoader>>,
    documents: Vec<(String, Schema)>,
    validate_schema: bool,
    validate_formats: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            loader: None,
            documents: Vec::new(),
            validate_schema: true,
            validate_formats: false,
        }
    }
}

impl fmt::Debug for CompileOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompileOptions")
            .field("has_loader", &self.loader.is_some())
            .field("documents", &self.documents.len())
            .field("validate_schema", &self.validate_schema)
            .field("validate_formats", &self.validate_formats)
            .finish()
    }
}

impl CompileOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install an external document loader for non-local references.
    #[must_use]
    pub fn with_loader(mut self, loader: impl SchemaLoader + 'static) -> Self {
        self.loader = Some(Arc::new(loader));
        self
    }

    /// Pre-register a document under an absolute URI, bypassing the loader.
    #[must_use]
    pub fn with_document(mut self, uri: impl Into<String>, schema: Schema) -> Self {
        self.documents.push((uri.into(), schema));
        self
    }

    /// Turn `format` keywords into assertions instead of annotations.
    #[must_use]
    pub fn should_validate_formats(mut self, validate: bool) -> Self {
        self.validate_formats = validate;
        self
    }

    /// Skip validating the input schema against the meta-schema.
    #[must_use]
    pub fn without_schema_validation(mut self) -> Self {
        self.validate_schema = false;
        self
    }

    pub(crate) fn validate_formats(&self) -> bool {
        self.validate_formats
    }

    /// Compile `schema` into a reusable validator.
    pub fn compile(&self, schema: &Schema) -> Result<Validator, CompileError> {
        build_validator(self.clone(), schema)
    }
}

pub(crate) fn build_validator(
    config: CompileOptions,
    schema: &Schema,
) -> Result<Validator, CompileError> {
    let default_base = Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid");
    let base_uri = match schema.as_object() {
        Some(object) if !object.id().is_empty() => default_base
            .join(object.id())
            .map_err(|_| ReferenceError::malformed(object.id().to_owned()))?,
        _ => default_base.clone(),
    };

    let resolver = Arc::new(Resolver::new(config.loader.clone()));
    for (uri, document) in &config.documents {
        let url =
            Url::parse(uri).map_err(|_| ReferenceError::malformed(uri.clone()))?;
        resolver.install(&url, document)?;
    }
    resolver.install(&base_uri, schema)?;

    let vocabularies = active_vocabularies(schema, &resolver, &base_uri)?;

    if config.validate_schema {
        if let Err(error) = crate::meta::validator().validate(&schema.to_value()) {
            return Err(CompileError::MetaSchema(Box::new(error)));
        }
    }

    let config = Arc::new(config);
    // The context starts from the default base; `compile_node` joins the
    // root's `$id` itself when it enters the resource.
    let ctx = Context {
        config: Arc::clone(&config),
        resolver,
        vocabularies: Arc::new(vocabularies),
        base_uri: Arc::new(default_base),
        location: JsonPointer::new(),
        in_flight: Rc::new(RefCell::new(AHashSet::new())),
    };
    let root = compile_node(&ctx, schema)?;
    Ok(Validator::new(root, config))
}

/// The active vocabulary set comes from the schema's `$schema` dialect. The
/// standard 2020-12 dialect (and the absence of one) enables the default
/// set; a custom meta-schema is loaded and its `$vocabulary` parsed. When
/// the dialect cannot be retrieved because no loader is configured, the
/// default set applies.
fn active_vocabularies(
    schema: &Schema,
    resolver: &Resolver,
    base_uri: &Url,
) -> Result<VocabularySet, CompileError> {
    let Some(object) = schema.as_object() else {
        return Ok(VocabularySet::default());
    };
    let dialect = object.schema_uri();
    if dialect.is_empty() || dialect == STANDARD_DIALECT {
        return Ok(VocabularySet::default());
    }
    let url = base_uri
        .join(dialect)
        .map_err(|_| ReferenceError::malformed(dialect.to_owned()))?;
    match resolver.document(&url) {
        Ok(meta) => VocabularySet::from_meta_schema(&meta.root),
        Err(ReferenceError::LoaderMissing { .. }) => Ok(VocabularySet::default()),
        Err(error) => Err(error.into()),
    }
}

/// Compile-time context: tracks the schema path, the resolution scope, and
/// the set of references currently being compiled (for cycle breaking).
#[derive(Clone)]
pub(crate) struct Context {
    pub(crate) config: Arc<CompileOptions>,
    pub(crate) resolver: Arc<Resolver>,
    pub(crate) vocabularies: Arc<VocabularySet>,
    pub(crate) base_uri: Arc<Url>,
    location: JsonPointer,
    in_flight: Rc<RefCell<AHashSet<String>>>,
}

impl Context {
    /// Context for a lazily-compiled reference target at validation time.
    pub(crate) fn from_parts(
        config: Arc<CompileOptions>,
        resolver: Arc<Resolver>,
        vocabularies: Arc<VocabularySet>,
        base_uri: Arc<Url>,
    ) -> Self {
        Self {
            config,
            resolver,
            vocabularies,
            base_uri,
            location: JsonPointer::new(),
            in_flight: Rc::new(RefCell::new(AHashSet::new())),
        }
    }

    pub(crate) fn location(&self) -> &JsonPointer {
        &self.location
    }

    /// A context one schema-path step deeper.
    pub(crate) fn at(&self, chunk: impl Into<PathChunk>) -> Self {
        let mut next = self.clone();
        next.location = self.location.join(chunk);
        next
    }

    /// Enter a schema resource: an embedded `$id` changes the base URI.
    fn in_resource(&self, object: &ObjectSchema) -> Result<Self, CompileError> {
        if object.id().is_empty() {
            return Ok(self.clone());
        }
        let base = self
            .base_uri
            .join(object.id())
            .map_err(|_| ReferenceError::malformed(object.id().to_owned()))?;
        let mut next = self.clone();
        next.base_uri = Arc::new(base);
        Ok(next)
    }

    /// A context whose resolution scope is the referenced document.
    pub(crate) fn for_target(&self, target_base: Url) -> Self {
        let mut next = self.clone();
        next.base_uri = Arc::new(target_base);
        next
    }

    pub(crate) fn enabled(&self, keyword: &str) -> bool {
        self.vocabularies.is_keyword_enabled(keyword)
    }

    pub(crate) fn resolve(&self, reference: &str) -> Result<(Schema, Url), ReferenceError> {
        self.resolver.resolve(&self.base_uri, reference)
    }

    /// The reference in absolute form, used as the cycle-detection key.
    pub(crate) fn absolute_reference(&self, reference: &str) -> Result<String, ReferenceError> {
        self.base_uri
            .join(reference)
            .map(Url::into)
            .map_err(|_| ReferenceError::malformed(reference.to_owned()))
    }

    /// Returns `false` when the reference is already being compiled
    /// up-stack, which means eager compilation would recurse forever.
    pub(crate) fn begin_reference(&self, absolute: &str) -> bool {
        self.in_flight.borrow_mut().insert(absolute.to_owned())
    }

    pub(crate) fn end_reference(&self, absolute: &str) {
        self.in_flight.borrow_mut().remove(absolute);
    }
}

/// Compile one schema node into its ordered validator list.
///
/// Families are emitted in the fixed order that evaluation requires:
/// references first (their annotations must be visible to later keywords),
/// then type and primitive constraints, logical and conditional applicators,
/// object and array applicators, and the `unevaluated*` pair last so they
/// see every annotation produced by their siblings.
pub(crate) fn compile_node(ctx: &Context, schema: &Schema) -> Result<SchemaNode, CompileError> {
    let object = match schema {
        Schema::Bool(true) => return Ok(SchemaNode::new(schema.clone(), ctx, Vec::new())),
        Schema::Bool(false) => {
            let validators = vec![KeywordValidator::Reject {
                location: ctx.location().clone(),
            }];
            return Ok(SchemaNode::new(schema.clone(), ctx, validators));
        }
        Schema::Object(object) => object,
    };

    let ctx = ctx.in_resource(object)?;
    let present = object.keywords();
    let mut validators = Vec::new();

    if present.contains_all(KeywordSet::REF) && ctx.enabled("$ref") {
        validators.push(ref_::compile_ref(&ctx, object)?);
    }
    if present.contains_all(KeywordSet::DYNAMIC_REF) && ctx.enabled("$dynamicRef") {
        validators.push(ref_::compile_dynamic_ref(&ctx, object)?);
    }
    if present.contains_all(KeywordSet::TYPE) && ctx.enabled("type") {
        validators.push(type_::compile(&ctx, object));
    }
    if present.contains_all(KeywordSet::CONST) && ctx.enabled("const") {
        validators.push(const_::compile(&ctx, object));
    }
    if present.contains_all(KeywordSet::ENUM) && ctx.enabled("enum") {
        validators.push(enum_::compile(&ctx, object));
    }
    if let Some(validator) = string::compile(&ctx, object)? {
        validators.push(validator);
    }
    if let Some(validator) = numeric::compile(&ctx, object) {
        validators.push(validator);
    }
    if let Some(validator) = format::compile(&ctx, object) {
        validators.push(validator);
    }
    if let Some(validator) = object::compile_shape(&ctx, object) {
        validators.push(validator);
    }
    if let Some(validator) = array::compile_shape(&ctx, object) {
        validators.push(validator);
    }
    if present.contains_all(KeywordSet::ALL_OF) && ctx.enabled("allOf") {
        validators.push(logical::compile_all_of(&ctx, object)?);
    }
    if present.contains_all(KeywordSet::ANY_OF) && ctx.enabled("anyOf") {
        validators.push(logical::compile_any_of(&ctx, object)?);
    }
    if present.contains_all(KeywordSet::ONE_OF) && ctx.enabled("oneOf") {
        validators.push(logical::compile_one_of(&ctx, object)?);
    }
    if present.contains_all(KeywordSet::NOT) && ctx.enabled("not") {
        validators.push(logical::compile_not(&ctx, object)?);
    }
    if let Some(validator) = conditional::compile(&ctx, object)? {
        validators.push(validator);
    }
    if let Some(validator) = object::compile_applicators(&ctx, object)? {
        validators.push(validator);
    }
    if let Some(validator) = array::compile_applicators(&ctx, object)? {
        validators.push(validator);
    }
    if present.contains_all(KeywordSet::UNEVALUATED_ITEMS) && ctx.enabled("unevaluatedItems") {
        validators.push(unevaluated::compile_items(&ctx, object)?);
    }
    if present.contains_all(KeywordSet::UNEVALUATED_PROPERTIES)
        && ctx.enabled("unevaluatedProperties")
    {
        validators.push(unevaluated::compile_properties(&ctx, object)?);
    }

    Ok(SchemaNode::new(schema.clone(), &ctx, validators))
}
