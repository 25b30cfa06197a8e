//! Opt-in assertions for well-known `format` values.
//!
//! Under the 2020-12 `format-annotation` vocabulary the keyword is an
//! annotation; it asserts only when the caller opts in (or the dialect
//! enables `format-assertion`). Unknown formats are ignored.

use crate::{
    compiler::Context,
    context::EvalContext,
    error::{ValidationError, ValidationErrorKind},
    fields::KeywordSet,
    paths::{InstancePath, JsonPointer},
    schema::ObjectSchema,
    validator::KeywordValidator,
    vocabulary::Vocabulary,
};
use email_address::EmailAddress;
use serde_json::Value;
use std::{
    net::{Ipv4Addr, Ipv6Addr},
    str::FromStr,
};
use url::Url;
use uuid_simd::{parse_hyphenated, Out};

pub(crate) struct FormatValidator {
    format: String,
    check: fn(&str) -> bool,
    location: JsonPointer,
}

pub(crate) fn compile(ctx: &Context, object: &ObjectSchema) -> Option<KeywordValidator> {
    if !object.keywords().contains_all(KeywordSet::FORMAT) || !ctx.enabled("format") {
        return None;
    }
    let asserts = ctx.config.validate_formats()
        || ctx.vocabularies.contains(&Vocabulary::FormatAssertion);
    if !asserts {
        return None;
    }
    let format = object.format();
    let check = check_for(format)?;
    Some(KeywordValidator::Format(FormatValidator {
        format: format.to_owned(),
        check,
        location: ctx.location().join("format"),
    }))
}

fn check_for(format: &str) -> Option<fn(&str) -> bool> {
    Some(match format {
        "date" => is_valid_date,
        "date-time" => is_valid_date_time,
        "email" => is_valid_email,
        "hostname" => is_valid_hostname,
        "ipv4" => is_valid_ipv4,
        "ipv6" => is_valid_ipv6,
        "json-pointer" => is_valid_json_pointer,
        "regex" => is_valid_regex,
        "uri" => is_valid_uri,
        "uuid" => is_valid_uuid,
        _ => return None,
    })
}

impl FormatValidator {
    pub(crate) fn validate(
        &self,
        _ctx: &mut EvalContext,
        instance: &Value,
        path: &InstancePath,
    ) -> Result<(), ValidationError> {
        let Value::String(item) = instance else {
            return Ok(());
        };
        if (self.check)(item) {
            Ok(())
        } else {
            Err(ValidationError::new(
                ValidationErrorKind::Format {
                    format: self.format.clone(),
                },
                self.location.clone(),
                path.into(),
            ))
        }
    }
}

fn is_valid_date(item: &str) -> bool {
    let format = time::macros::format_description!("[year]-[month]-[day]");
    time::Date::parse(item, format).is_ok()
}

fn is_valid_date_time(item: &str) -> bool {
    time::OffsetDateTime::parse(item, &time::format_description::well_known::Rfc3339).is_ok()
}

fn is_valid_email(item: &str) -> bool {
    let Ok(parsed) = EmailAddress::from_str(item) else {
        return false;
    };
    let domain = parsed.domain();
    if let Some(literal) = domain.strip_prefix('[').and_then(|d| d.strip_suffix(']')) {
        if let Some(address) = literal.strip_prefix("IPv6:") {
            address.parse::<Ipv6Addr>().is_ok()
        } else {
            literal.parse::<Ipv4Addr>().is_ok()
        }
    } else {
        is_valid_hostname(domain)
    }
}

fn is_valid_hostname(item: &str) -> bool {
    !(item.is_empty()
        || item.starts_with('-')
        || item.ends_with('-')
        || item.len() > 255
        || item
            .chars()
            .any(|ch| !(ch.is_ascii_alphanumeric() || ch == '-' || ch == '.'))
        || item.split('.').any(|label| label.is_empty() || label.len() > 63))
}

fn is_valid_ipv4(item: &str) -> bool {
    Ipv4Addr::from_str(item).is_ok()
}

fn is_valid_ipv6(item: &str) -> bool {
    Ipv6Addr::from_str(item).is_ok()
}

fn is_valid_json_pointer(item: &str) -> bool {
    if item.is_empty() {
        return true;
    }
    if !item.starts_with('/') {
        return false;
    }
    let mut chars = item.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '~' && !matches!(chars.peek(), Some('0') | Some('1')) {
            return false;
        }
    }
    true
}

fn is_valid_regex(item: &str) -> bool {
    fancy_regex::Regex::new(item).is_ok()
}

fn is_valid_uri(item: &str) -> bool {
    Url::parse(item).is_ok()
}

fn is_valid_uuid(item: &str) -> bool {
    let mut parsed = [0u8; 16];
    parse_hyphenated(item.as_bytes(), Out::from_mut(&mut parsed)).is_ok()
}

#[cfg(test)]
mod tests {
    use crate::{Schema, Validator};
    use serde_json::{json, Value};
    use test_case::test_case;

    fn assert_format(format: &str, instance: &Value, expected: bool) {
        let schema = Schema::from_value(&json!({"format": format})).unwrap();
        let validator = Validator::options()
            .should_validate_formats(true)
            .compile(&schema)
            .unwrap();
        assert_eq!(
            validator.is_valid(instance),
            expected,
            "format {format} on {instance}"
        );
    }

    #[test_case("email", &json!("j@x.y"), true)]
    #[test_case("email", &json!("not an email"), false)]
    #[test_case("hostname", &json!("example.com"), true)]
    #[test_case("hostname", &json!("-leading.dash"), false)]
    #[test_case("ipv4", &json!("127.0.0.1"), true)]
    #[test_case("ipv4", &json!("2001:db8::1"), false)]
    #[test_case("ipv6", &json!("2001:db8::1"), true)]
    #[test_case("uuid", &json!("1d1b0a6d-babc-4cb1-9ba5-50bb8dc4ea49"), true)]
    #[test_case("uuid", &json!("not-a-uuid"), false)]
    #[test_case("date", &json!("2024-02-29"), true)]
    #[test_case("date", &json!("2024-02-30"), false)]
    #[test_case("date-time", &json!("2024-02-29T10:00:00Z"), true)]
    #[test_case("date-time", &json!("10 o'clock"), false)]
    #[test_case("uri", &json!("https://example.com/a"), true)]
    #[test_case("uri", &json!("not absolute"), false)]
    #[test_case("regex", &json!("^a+$"), true)]
    #[test_case("regex", &json!("a{2,1}"), false)]
    #[test_case("json-pointer", &json!("/a/b~0c"), true)]
    #[test_case("json-pointer", &json!("/a~2"), false)]
    #[test_case("json-pointer", &json!(""), true; "empty pointer")]
    fn assertion(format: &str, instance: &Value, expected: bool) {
        assert_format(format, instance, expected);
    }

    #[test]
    fn annotation_only_by_default() {
        let schema = Schema::from_value(&json!({"format": "email"})).unwrap();
        let validator = crate::compile(&schema).unwrap();
        assert!(validator.is_valid(&json!("not an email")));
    }

    #[test]
    fn non_strings_are_ignored() {
        assert_format("email", &json!(42), true);
    }

    #[test]
    fn unknown_formats_are_ignored() {
        assert_format("flux-capacitance", &json!("anything"), true);
    }
}
