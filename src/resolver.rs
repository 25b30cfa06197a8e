//! Document resolution: the schema cache, anchor indexes, and the external
//! document loader hook.

use crate::{
    error::ReferenceError,
    reference::{self, Fragment},
    schema::Schema,
};
use ahash::AHashMap;
use parking_lot::RwLock;
use serde_json::Value;
use std::{fmt, sync::Arc};
use url::Url;

/// Opaque error type returned by loaders on retrieval failures.
pub type LoaderError = anyhow::Error;

/// Retrieves external schema documents.
///
/// The resolver consults the loader only for absolute URIs that are not
/// already in its cache; without a loader every non-local reference fails
/// with [`ReferenceError::LoaderMissing`]. Loaders that may block should
/// observe their own deadline or cancellation signal.
pub trait SchemaLoader: Send + Sync {
    /// Fetch the raw bytes of the schema document identified by `uri`.
    fn load(&self, uri: &Url) -> Result<Vec<u8>, LoaderError>;
}

/// An ingested schema resource: its root plus the anchor indexes built by a
/// one-pass scan at installation time.
pub(crate) struct Document {
    pub(crate) root: Schema,
    pub(crate) anchors: AHashMap<String, Schema>,
    pub(crate) dynamic_anchors: AHashMap<String, Schema>,
}

impl Document {
    fn new(root: Schema) -> Self {
        Self {
            root,
            anchors: AHashMap::new(),
            dynamic_anchors: AHashMap::new(),
        }
    }
}

/// Resolves references to their target schemas, caching every ingested
/// document for the resolver's lifetime.
pub struct Resolver {
    loader: Option<Arc<dyn SchemaLoader>>,
    cache: RwLock<AHashMap<String, Arc<Document>>>,
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("documents", &self.cache.read().len())
            .field("has_loader", &self.loader.is_some())
            .finish()
    }
}

impl Resolver {
    pub(crate) fn new(loader: Option<Arc<dyn SchemaLoader>>) -> Self {
        Self {
            loader,
            cache: RwLock::new(AHashMap::new()),
        }
    }

    /// Ingest a schema resource under `base`, indexing its anchors and
    /// registering every embedded resource (`$id` below the root) under its
    /// own absolute URI.
    pub(crate) fn install(&self, base: &Url, schema: &Schema) -> Result<(), ReferenceError> {
        let mut pending = vec![(base.clone(), schema.clone())];
        while let Some((resource_base, resource)) = pending.pop() {
            let mut document = Document::new(resource.clone());
            index_resource(&resource, &resource_base, &mut document, &mut pending)?;
            self.cache
                .write()
                .insert(cache_key(&resource_base), Arc::new(document));
        }
        Ok(())
    }

    /// Fetch the document for an absolute, fragmentless URI, consulting the
    /// loader on a cache miss. New documents are installed before return, so
    /// every URI is loaded at most once per resolver.
    pub(crate) fn document(&self, uri: &Url) -> Result<Arc<Document>, ReferenceError> {
        let key = cache_key(uri);
        if let Some(document) = self.cache.read().get(&key) {
            return Ok(Arc::clone(document));
        }
        let loader = self
            .loader
            .as_ref()
            .ok_or_else(|| ReferenceError::loader_missing(&key))?;
        let bytes = loader
            .load(uri)
            .map_err(|source| ReferenceError::load_failed(&key, source))?;
        let value: Value = serde_json::from_slice(&bytes)
            .map_err(|source| ReferenceError::load_failed(&key, anyhow::Error::new(source)))?;
        let schema = Schema::from_value(&value)
            .map_err(|source| ReferenceError::load_failed(&key, anyhow::Error::new(source)))?;
        // The document may declare its own canonical `$id`.
        let base = match schema.as_object().map(|object| object.id()) {
            Some(id) if !id.is_empty() => uri
                .join(id)
                .map_err(|_| ReferenceError::malformed(id.to_owned()))?,
            _ => uri.clone(),
        };
        self.install(&base, &schema)?;
        if base != *uri {
            self.install(uri, &schema)?;
        }
        self.document_from_cache(&key)
    }

    fn document_from_cache(&self, key: &str) -> Result<Arc<Document>, ReferenceError> {
        self.cache
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| ReferenceError::not_found(key))
    }

    /// Resolve a reference against a base URI, returning the target schema
    /// and the fragmentless URI of the document it lives in.
    pub(crate) fn resolve(
        &self,
        base_uri: &Url,
        reference_str: &str,
    ) -> Result<(Schema, Url), ReferenceError> {
        let parsed = reference::parse(reference_str)?;
        let mut target = if parsed.uri.is_empty() {
            base_uri.clone()
        } else {
            base_uri
                .join(parsed.uri)
                .map_err(|_| ReferenceError::malformed(reference_str))?
        };
        target.set_fragment(None);
        let document = self.document(&target)?;
        let schema = match &parsed.fragment {
            Fragment::Empty => document.root.clone(),
            Fragment::Pointer(pointer) => descend(&document.root, pointer)
                .ok_or_else(|| ReferenceError::pointer_to_nowhere(pointer.clone()))?,
            Fragment::Anchor(anchor) => document
                .anchors
                .get(anchor)
                .or_else(|| document.dynamic_anchors.get(anchor))
                .cloned()
                .ok_or_else(|| ReferenceError::no_such_anchor(anchor.clone()))?,
        };
        Ok((schema, target))
    }
}

fn cache_key(uri: &Url) -> String {
    let mut key = uri.clone();
    key.set_fragment(None);
    key.into()
}

/// One-pass scan of a resource: record every `$anchor` / `$dynamicAnchor`,
/// and queue embedded resources for their own installation. Anchors below
/// an embedded `$id` belong to that inner resource, not to this one.
fn index_resource(
    schema: &Schema,
    base: &Url,
    document: &mut Document,
    pending: &mut Vec<(Url, Schema)>,
) -> Result<(), ReferenceError> {
    let Some(object) = schema.as_object() else {
        return Ok(());
    };
    if !object.anchor().is_empty() {
        document
            .anchors
            .insert(object.anchor().to_owned(), schema.clone());
    }
    if !object.dynamic_anchor().is_empty() {
        document
            .dynamic_anchors
            .insert(object.dynamic_anchor().to_owned(), schema.clone());
    }
    for child in object.subschemas() {
        match child.as_object() {
            Some(inner) if !inner.id().is_empty() => {
                let embedded_base = base
                    .join(inner.id())
                    .map_err(|_| ReferenceError::malformed(inner.id().to_owned()))?;
                pending.push((embedded_base, child.clone()));
            }
            _ => index_resource(child, base, document, pending)?,
        }
    }
    Ok(())
}

/// JSON-Pointer descent over the typed schema model. Pointers that land in
/// preserved unknown keywords continue through the raw JSON value and are
/// re-parsed as a schema at the end.
fn descend(root: &Schema, pointer: &str) -> Option<Schema> {
    enum Cursor<'a> {
        Node(&'a Schema),
        Raw(&'a Value),
    }

    let mut cursor = Cursor::Node(root);
    let mut tokens = reference::pointer_tokens(pointer).peekable();
    while let Some(token) = tokens.next() {
        cursor = match cursor {
            Cursor::Raw(value) => Cursor::Raw(step_value(value, &token)?),
            Cursor::Node(schema) => {
                let object = schema.as_object()?;
                match token.as_ref() {
                    "$defs" => Cursor::Node(object.defs().get(tokens.next()?.as_ref())?),
                    "properties" => {
                        Cursor::Node(object.properties().get(tokens.next()?.as_ref())?)
                    }
                    "patternProperties" => {
                        Cursor::Node(object.pattern_properties().get(tokens.next()?.as_ref())?)
                    }
                    "dependentSchemas" => {
                        Cursor::Node(object.dependent_schemas().get(tokens.next()?.as_ref())?)
                    }
                    "prefixItems" => {
                        Cursor::Node(object.prefix_items().get(parse_index(&tokens.next()?)?)?)
                    }
                    "allOf" => Cursor::Node(object.all_of().get(parse_index(&tokens.next()?)?)?),
                    "anyOf" => Cursor::Node(object.any_of().get(parse_index(&tokens.next()?)?)?),
                    "oneOf" => Cursor::Node(object.one_of().get(parse_index(&tokens.next()?)?)?),
                    "items" => Cursor::Node(object.items()?),
                    "contains" => Cursor::Node(object.contains()?),
                    "additionalProperties" => Cursor::Node(object.additional_properties()?),
                    "propertyNames" => Cursor::Node(object.property_names()?),
                    "if" => Cursor::Node(object.if_schema()?),
                    "then" => Cursor::Node(object.then_schema()?),
                    "else" => Cursor::Node(object.else_schema()?),
                    "not" => Cursor::Node(object.not()?),
                    "unevaluatedItems" => Cursor::Node(object.unevaluated_items()?),
                    "unevaluatedProperties" => Cursor::Node(object.unevaluated_properties()?),
                    other => Cursor::Raw(object.extras().get(other)?),
                }
            }
        };
    }
    match cursor {
        Cursor::Node(schema) => Some(schema.clone()),
        Cursor::Raw(value) => Schema::from_value(value).ok(),
    }
}

fn step_value<'a>(value: &'a Value, token: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(token),
        Value::Array(items) => items.get(parse_index(token)?),
        _ => None,
    }
}

fn parse_index(token: &str) -> Option<usize> {
    if token.starts_with('+') || (token.starts_with('0') && token.len() != 1) {
        None
    } else {
        token.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::DEFAULT_BASE_URL;
    use serde_json::json;

    fn base() -> Url {
        Url::parse(DEFAULT_BASE_URL).unwrap()
    }

    fn resolver_with(schema: &Value) -> Resolver {
        let resolver = Resolver::new(None);
        let schema = Schema::from_value(schema).unwrap();
        resolver.install(&base(), &schema).unwrap();
        resolver
    }

    #[test]
    fn pointer_descent() {
        let resolver = resolver_with(&json!({
            "$defs": {"address": {"type": "object"}},
            "properties": {"home": {"$ref": "#/$defs/address"}},
            "allOf": [{"minProperties": 1}]
        }));
        let (target, _) = resolver.resolve(&base(), "#/$defs/address").unwrap();
        assert_eq!(target.to_value(), json!({"type": "object"}));
        let (target, _) = resolver.resolve(&base(), "#/allOf/0").unwrap();
        assert_eq!(target.to_value(), json!({"minProperties": 1}));
    }

    #[test]
    fn pointer_with_escapes() {
        let resolver = resolver_with(&json!({
            "properties": {"a/b": {"type": "null"}, "c~d": {"type": "boolean"}}
        }));
        let (target, _) = resolver.resolve(&base(), "#/properties/a~1b").unwrap();
        assert_eq!(target.to_value(), json!({"type": "null"}));
        let (target, _) = resolver.resolve(&base(), "#/properties/c~0d").unwrap();
        assert_eq!(target.to_value(), json!({"type": "boolean"}));
    }

    #[test]
    fn pointer_to_nowhere() {
        let resolver = resolver_with(&json!({"$defs": {"a": {}}}));
        assert!(matches!(
            resolver.resolve(&base(), "#/$defs/missing"),
            Err(ReferenceError::PointerToNowhere { .. })
        ));
    }

    #[test]
    fn anchor_lookup() {
        let resolver = resolver_with(&json!({
            "$defs": {
                "person": {"$anchor": "person", "type": "object"}
            }
        }));
        let (target, _) = resolver.resolve(&base(), "#person").unwrap();
        assert_eq!(
            target.to_value(),
            json!({"$anchor": "person", "type": "object"})
        );
        assert!(matches!(
            resolver.resolve(&base(), "#nobody"),
            Err(ReferenceError::NoSuchAnchor { .. })
        ));
    }

    #[test]
    fn embedded_resource_gets_its_own_scope() {
        let root = Url::parse("https://example.com/root.json").unwrap();
        let resolver = Resolver::new(None);
        let schema = Schema::from_value(&json!({
            "$id": "https://example.com/root.json",
            "$defs": {
                "inner": {
                    "$id": "https://example.com/inner.json",
                    "$anchor": "start",
                    "type": "integer"
                }
            }
        }))
        .unwrap();
        resolver.install(&root, &schema).unwrap();
        // The embedded resource resolves by its own URI...
        let (target, scope) = resolver
            .resolve(&root, "https://example.com/inner.json")
            .unwrap();
        assert_eq!(scope.as_str(), "https://example.com/inner.json");
        assert_eq!(target.as_object().unwrap().anchor(), "start");
        // ...and owns its anchors.
        let (target, _) = resolver
            .resolve(&root, "https://example.com/inner.json#start")
            .unwrap();
        assert_eq!(target.as_object().unwrap().anchor(), "start");
        assert!(matches!(
            resolver.resolve(&root, "#start"),
            Err(ReferenceError::NoSuchAnchor { .. })
        ));
    }

    #[test]
    fn missing_loader_reported() {
        let resolver = resolver_with(&json!({}));
        assert!(matches!(
            resolver.resolve(&base(), "https://example.com/other.json"),
            Err(ReferenceError::LoaderMissing { .. })
        ));
    }

    #[test]
    fn loader_is_consulted_once() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        struct CountingLoader(AtomicUsize);

        impl SchemaLoader for CountingLoader {
            fn load(&self, _uri: &Url) -> Result<Vec<u8>, LoaderError> {
                self.0.fetch_add(1, Ordering::SeqCst);
                Ok(serde_json::to_vec(&json!({"type": "string"})).unwrap())
            }
        }

        let loader = Arc::new(CountingLoader(AtomicUsize::new(0)));
        let resolver = Resolver::new(Some(loader.clone()));
        resolver
            .install(&base(), &Schema::from_value(&json!({})).unwrap())
            .unwrap();
        for _ in 0..3 {
            let (target, _) = resolver
                .resolve(&base(), "https://example.com/remote.json")
                .unwrap();
            assert_eq!(target.to_value(), json!({"type": "string"}));
        }
        assert_eq!(loader.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn loader_failure_surfaces() {
        struct FailingLoader;

        impl SchemaLoader for FailingLoader {
            fn load(&self, _uri: &Url) -> Result<Vec<u8>, LoaderError> {
                Err(anyhow::anyhow!("connection refused"))
            }
        }

        let resolver = Resolver::new(Some(Arc::new(FailingLoader)));
        resolver
            .install(&base(), &Schema::from_value(&json!({})).unwrap())
            .unwrap();
        assert!(matches!(
            resolver.resolve(&base(), "https://example.com/gone.json"),
            Err(ReferenceError::LoadFailed { .. })
        ));
    }

    #[test]
    fn pointer_into_preserved_keywords() {
        let resolver = resolver_with(&json!({
            "x-templates": {"name": {"type": "string", "minLength": 1}}
        }));
        let (target, _) = resolver.resolve(&base(), "#/x-templates/name").unwrap();
        assert_eq!(target.to_value(), json!({"type": "string", "minLength": 1}));
    }
}
