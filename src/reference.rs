//! Reference strings: parsing, classification, and syntactic validation.
//!
//! A reference is a URI-reference optionally followed by a fragment. The
//! fragment is either a JSON Pointer (`/`-prefixed) or a plain-name anchor;
//! mixed forms are rejected.

use crate::error::ReferenceError;
use percent_encoding::percent_decode_str;
use std::borrow::Cow;
use url::Url;

/// Base used to give relative references an absolute form when the schema
/// itself declares no `$id`.
pub(crate) const DEFAULT_BASE_URL: &str = "json-schema:///";

/// A reference split into its URI part and fragment.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ParsedReference<'a> {
    /// Everything before the `#`, possibly empty.
    pub(crate) uri: &'a str,
    pub(crate) fragment: Fragment,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Fragment {
    /// No fragment, or the bare `#`.
    Empty,
    /// A `/`-prefixed JSON Pointer, percent-decoded.
    Pointer(String),
    /// A plain-name anchor.
    Anchor(String),
}

pub(crate) fn parse(reference: &str) -> Result<ParsedReference<'_>, ReferenceError> {
    if reference.is_empty() {
        return Err(ReferenceError::Empty);
    }
    let (uri, fragment) = match reference.split_once('#') {
        None => (reference, None),
        Some((uri, fragment)) => {
            if fragment.contains('#') {
                return Err(ReferenceError::malformed(reference));
            }
            (uri, Some(fragment))
        }
    };
    if !uri.is_empty() && parse_uri_reference(uri).is_none() {
        return Err(ReferenceError::malformed(reference));
    }
    let fragment = match fragment {
        None | Some("") => Fragment::Empty,
        Some(raw) => {
            let decoded = percent_decode_str(raw)
                .decode_utf8()
                .map_err(|_| ReferenceError::malformed(reference))?;
            if decoded.starts_with('/') {
                Fragment::Pointer(decoded.into_owned())
            } else if is_plain_name(&decoded) {
                Fragment::Anchor(decoded.into_owned())
            } else {
                return Err(ReferenceError::malformed(reference));
            }
        }
    };
    Ok(ParsedReference { uri, fragment })
}

/// Check a reference for syntactic validity without resolving it.
pub fn validate_reference(reference: &str) -> Result<(), ReferenceError> {
    parse(reference).map(|_| ())
}

/// Parse a URI-reference, resolving relative forms against the default base.
fn parse_uri_reference(uri: &str) -> Option<Url> {
    match Url::parse(uri) {
        Ok(url) => Some(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let base = Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid");
            base.join(uri).ok()
        }
        Err(_) => None,
    }
}

/// Plain-name anchors start with a letter or underscore and continue with
/// letters, digits, `-`, `_`, `.`, or `:`.
pub(crate) fn is_plain_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.' | ':'))
}

/// Split a JSON Pointer into unescaped tokens (`~1` ⇒ `/`, `~0` ⇒ `~`).
pub(crate) fn pointer_tokens(pointer: &str) -> impl Iterator<Item = Cow<'_, str>> {
    pointer.split('/').skip(1).map(unescape_token)
}

fn unescape_token(token: &str) -> Cow<'_, str> {
    if token.contains('~') {
        Cow::Owned(token.replace("~1", "/").replace("~0", "~"))
    } else {
        Cow::Borrowed(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("#/$defs/address")]
    #[test_case("#person")]
    #[test_case("https://example.com/schemas/base.json")]
    #[test_case("https://example.com/schemas/base.json#/properties/a")]
    #[test_case("other.json#anchor_1")]
    #[test_case("../sibling.json")]
    #[test_case("#")]
    #[test_case("#/a~0b/c~1d")]
    fn accepts(reference: &str) {
        assert!(validate_reference(reference).is_ok());
    }

    #[test_case(""; "empty")]
    #[test_case("#a#b"; "double hash")]
    #[test_case("#a/b"; "mixed fragment")]
    #[test_case("#1abc"; "anchor starting with digit")]
    #[test_case("http://[invalid"; "unparseable uri")]
    fn rejects(reference: &str) {
        assert!(validate_reference(reference).is_err());
    }

    #[test]
    fn empty_reference_is_its_own_error() {
        assert!(matches!(validate_reference(""), Err(ReferenceError::Empty)));
    }

    #[test]
    fn classifies_fragments() {
        let parsed = parse("base.json#/a/b").unwrap();
        assert_eq!(parsed.uri, "base.json");
        assert_eq!(parsed.fragment, Fragment::Pointer("/a/b".into()));

        let parsed = parse("#node").unwrap();
        assert_eq!(parsed.uri, "");
        assert_eq!(parsed.fragment, Fragment::Anchor("node".into()));

        let parsed = parse("base.json").unwrap();
        assert_eq!(parsed.fragment, Fragment::Empty);
    }

    #[test]
    fn unescapes_pointer_tokens() {
        let tokens: Vec<_> = pointer_tokens("/a~1b/c~0d/plain").collect();
        assert_eq!(tokens, vec!["a/b", "c~d", "plain"]);
    }

    #[test]
    fn percent_decodes_fragments() {
        let parsed = parse("#/spaced%20name").unwrap();
        assert_eq!(parsed.fragment, Fragment::Pointer("/spaced name".into()));
    }
}
