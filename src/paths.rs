//! Paths into schemas and validated instances.

use std::{fmt, fmt::Write, slice::Iter};

/// JSON Pointer assembled from individual path components.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct JsonPointer(Vec<PathChunk>);

impl JsonPointer {
    pub(crate) fn new() -> Self {
        Self(Vec::new())
    }

    /// Iterate over the underlying path components.
    pub fn iter(&self) -> Iter<'_, PathChunk> {
        self.0.iter()
    }

    /// The last path component, if any.
    #[must_use]
    pub fn last(&self) -> Option<&PathChunk> {
        self.0.last()
    }

    pub(crate) fn join(&self, chunk: impl Into<PathChunk>) -> Self {
        let mut next = self.clone();
        next.0.push(chunk.into());
        next
    }
}

impl fmt::Display for JsonPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for chunk in &self.0 {
            f.write_char('/')?;
            match chunk {
                PathChunk::Property(name) => {
                    for ch in name.chars() {
                        match ch {
                            '/' => f.write_str("~1")?,
                            '~' => f.write_str("~0")?,
                            _ => f.write_char(ch)?,
                        }
                    }
                }
                PathChunk::Index(index) => f.write_str(itoa::Buffer::new().format(*index))?,
                PathChunk::Keyword(keyword) => f.write_str(keyword)?,
            }
        }
        Ok(())
    }
}

/// A single step within a JSON document: an object key, an array index, or
/// a schema keyword.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PathChunk {
    /// Property name within a JSON object.
    Property(Box<str>),
    /// Index within a JSON array.
    Index(usize),
    /// JSON Schema keyword.
    Keyword(&'static str),
}

impl From<String> for PathChunk {
    fn from(value: String) -> Self {
        PathChunk::Property(value.into_boxed_str())
    }
}

impl From<&'static str> for PathChunk {
    fn from(value: &'static str) -> Self {
        PathChunk::Keyword(value)
    }
}

impl From<usize> for PathChunk {
    fn from(value: usize) -> Self {
        PathChunk::Index(value)
    }
}

/// Borrowed step used while walking an instance.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum ChunkRef<'a> {
    Property(&'a str),
    Index(usize),
}

impl<'a> From<&'a str> for ChunkRef<'a> {
    fn from(value: &'a str) -> Self {
        ChunkRef::Property(value)
    }
}

impl From<usize> for ChunkRef<'_> {
    fn from(value: usize) -> Self {
        ChunkRef::Index(value)
    }
}

/// Linked-list node tracking the instance path during evaluation.
///
/// Nodes live on the stack of the recursive interpreter, so extending the
/// path allocates nothing; a [`JsonPointer`] is materialized only when an
/// error is actually constructed.
#[derive(Debug, Clone, Copy)]
pub(crate) struct InstancePath<'a> {
    segment: Option<ChunkRef<'a>>,
    parent: Option<&'a InstancePath<'a>>,
}

impl<'a> InstancePath<'a> {
    pub(crate) const fn root() -> Self {
        Self {
            segment: None,
            parent: None,
        }
    }

    #[must_use]
    pub(crate) fn push<'s>(&'s self, segment: impl Into<ChunkRef<'s>>) -> InstancePath<'s>
    where
        'a: 's,
    {
        InstancePath {
            segment: Some(segment.into()),
            parent: Some(self),
        }
    }

    pub(crate) fn to_pointer(&self) -> JsonPointer {
        let mut chunks = Vec::new();
        let mut node = Some(self);
        while let Some(current) = node {
            if let Some(segment) = current.segment {
                chunks.push(match segment {
                    ChunkRef::Property(name) => PathChunk::Property(name.into()),
                    ChunkRef::Index(index) => PathChunk::Index(index),
                });
            }
            node = current.parent;
        }
        chunks.reverse();
        JsonPointer(chunks)
    }
}

impl From<&InstancePath<'_>> for JsonPointer {
    fn from(path: &InstancePath<'_>) -> Self {
        path.to_pointer()
    }
}

impl From<Vec<PathChunk>> for JsonPointer {
    fn from(chunks: Vec<PathChunk>) -> Self {
        Self(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn escaping() {
        let pointer = JsonPointer::new()
            .join("/".to_string())
            .join("~".to_string());
        assert_eq!(pointer.to_string(), "/~1/~0");
        let data = json!({"/": {"~": 42}});
        assert_eq!(data.pointer(&pointer.to_string()), Some(&json!(42)));
    }

    #[test]
    fn instance_path_materialization() {
        let root = InstancePath::root();
        let outer = root.push("items");
        let inner = outer.push(3usize);
        assert_eq!(inner.to_pointer().to_string(), "/items/3");
        assert_eq!(root.to_pointer().to_string(), "");
    }

    #[test]
    fn keyword_chunks() {
        let pointer = JsonPointer::new().join("properties").join("a".to_string());
        assert_eq!(pointer.to_string(), "/properties/a");
        assert_eq!(pointer.last(), Some(&PathChunk::Property("a".into())));
    }
}
