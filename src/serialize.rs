//! Short human-readable summaries of values.
pub mod locale;
pub mod signature;

pub use signature::{ParsedSignature, parse_signature, parse_source};

use crate::error::Result;
use crate::realm::{ObjectId, Realm, Value, primitive_string};

pub const DEFAULT_TRUNCATE_AT: usize = 100;
const ELLIPSIS: char = '…';

/// Summary string for `value`.
///
/// Strings are quoted, then cut to `truncate_at` characters plus `…`. A
/// string that fits in `truncate_at - 2` characters keeps both quotes; a
/// longer one keeps the opening quote and its first `truncate_at - 1`
/// characters, so the summary never exceeds `truncate_at + 1` characters.
/// Numbers and dates use `en-US` formatting, functions their source text.
/// Other objects contribute their own `toString` result only when it is a
/// custom override; the stock object and array renderings yield `""`.
///
/// Fails only when a function's source cannot be parsed.
pub fn serialize(realm: &mut Realm, value: &Value, truncate_at: usize) -> Result<String> {
    match value {
        Value::Null | Value::Undefined | Value::Bool(_) | Value::Symbol(_) => {
            Ok(primitive_string(value))
        }
        Value::String(s) => Ok(truncate(&format!("\"{s}\""), truncate_at)),
        Value::Number(n) => Ok(locale::format_number(*n)),
        Value::Object(_) if realm.date_value(value).is_some() => {
            Ok(locale::format_date(realm.date_value(value).unwrap_or(f64::NAN)))
        }
        Value::Object(_) if realm.is_callable(value) => Ok(parse_signature(realm, Some(value))?
            .map(|sig| sig.to_string())
            .unwrap_or_default()),
        Value::Object(obj) => Ok(custom_string(realm, *obj, truncate_at)),
    }
}

fn custom_string(realm: &mut Realm, obj: ObjectId, truncate_at: usize) -> String {
    let Ok(method) = realm.get(obj, "toString") else {
        return String::new();
    };
    let Some(method_id) = method.as_object().filter(|_| realm.is_callable(&method)) else {
        return String::new();
    };
    let intrinsics = realm.intrinsics();
    if method_id == intrinsics.object_to_string || method_id == intrinsics.array_to_string {
        return String::new();
    }
    match realm.call(&method, &Value::Object(obj), &[]) {
        Ok(Value::Object(_)) => String::new(),
        Ok(Value::String(s)) => truncate(&s, truncate_at),
        Ok(other) => truncate(&primitive_string(&other), truncate_at),
        Err(thrown) => {
            tracing::debug!(%thrown, "toString override threw; summary left empty");
            String::new()
        }
    }
}

/// First `limit` characters plus an ellipsis, or `text` unchanged.
pub fn truncate(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((cut, _)) => {
            let mut out = text[..cut].to_string();
            out.push(ELLIPSIS);
            out
        }
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DescribeError, Thrown};
    use crate::realm::Property;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn summary(realm: &mut Realm, value: impl Into<Value>) -> String {
        serialize(realm, &value.into(), DEFAULT_TRUNCATE_AT).unwrap()
    }

    #[test]
    fn primitives() {
        let mut realm = Realm::new();
        let sym = realm.new_symbol(Some("id"));
        assert_eq!(summary(&mut realm, Value::Null), "null");
        assert_eq!(summary(&mut realm, Value::Undefined), "undefined");
        assert_eq!(summary(&mut realm, true), "true");
        assert_eq!(summary(&mut realm, sym), "Symbol(id)");
        assert_eq!(summary(&mut realm, "short"), "\"short\"");
        assert_eq!(summary(&mut realm, 1234.5), "1,234.5");
    }

    #[test]
    fn long_strings_are_cut() {
        let mut realm = Realm::new();
        let out = summary(&mut realm, "x".repeat(200));
        assert_eq!(out.chars().count(), 101);
        assert!(out.starts_with("\"xxx"));
        assert!(out.ends_with('…'));
    }

    #[test]
    fn strings_at_the_limit_keep_their_quotes() {
        let mut realm = Realm::new();
        let fits = summary(&mut realm, "y".repeat(98));
        assert_eq!(fits.chars().count(), 100);
        assert!(fits.ends_with("y\""));

        let over = summary(&mut realm, "y".repeat(99));
        assert_eq!(over, format!("\"{}…", "y".repeat(99)));
        assert_eq!(over.chars().count(), 101);
    }

    #[test]
    fn functions_render_their_source() {
        let mut realm = Realm::new();
        let f = realm.new_function("add", "function add(a, b) { return a + b }");
        assert_eq!(summary(&mut realm, f), "function add(a, b) { return a + b }");

        let broken = realm.new_function("x", "class X {}");
        let err = serialize(&mut realm, &Value::Object(broken), 100).unwrap_err();
        assert!(matches!(err, DescribeError::UnparseableFunction { .. }));
    }

    #[test]
    fn dates_use_locale_format() {
        let mut realm = Realm::new();
        let date = realm.new_date(0.0);
        assert_eq!(summary(&mut realm, date), "1/1/1970, 12:00:00 AM");
        let invalid = realm.new_date(f64::NAN);
        assert_eq!(summary(&mut realm, invalid), "Invalid Date");
    }

    #[test]
    fn stock_renderings_are_suppressed() {
        let mut realm = Realm::new();
        let obj = realm.new_object();
        let array = realm.new_array([Value::from(1), Value::from(2)]);
        let bare = realm.new_object_with_prototype(None);
        assert_eq!(summary(&mut realm, obj), "");
        assert_eq!(summary(&mut realm, array), "");
        assert_eq!(summary(&mut realm, bare), "");
    }

    #[test]
    fn custom_to_string_is_used() {
        let mut realm = Realm::new();
        let obj = realm.new_object();
        let method = realm.new_native("toString", 0, |_, _, _| Ok(Value::from("Point(1, 2)")));
        realm.define(obj, "toString", Property::hidden(method));
        assert_eq!(summary(&mut realm, obj), "Point(1, 2)");

        let err = realm.new_error("boom");
        assert_eq!(summary(&mut realm, err), "Error: boom");
    }

    #[test]
    fn throwing_to_string_yields_empty_summary() {
        let mut realm = Realm::new();
        let obj = realm.new_object();
        let method = realm.new_native("toString", 0, |_, _, _| Err(Thrown::error("nope")));
        realm.define(obj, "toString", Property::hidden(method));
        assert_eq!(summary(&mut realm, obj), "");
    }

    proptest! {
        #[test]
        fn truncated_length_is_bounded(text in ".{0,300}", limit in 0usize..150) {
            let out = truncate(&text, limit);
            prop_assert!(out.chars().count() <= limit + 1);
            if text.chars().count() <= limit {
                prop_assert_eq!(out, text);
            } else {
                prop_assert!(out.ends_with('…'));
            }
        }
    }
}
