//! HTML rendering of a [`Description`] tree.
use std::fmt::Write;

use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::describe::{Description, PropertyDescription, PropertyValue};
use crate::sample::Bucket;
use crate::serialize::ParsedSignature;

const STYLESHEET: &str = "object-describe.css";

/// Full HTML document for `description`. Every text and attribute value is
/// escaped; absent optional fields simply render nothing.
pub fn render_html(description: &Description) -> String {
    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html>\n  <head>\n    <meta charset=\"utf-8\"/>\n");
    let _ = writeln!(out, "    <link type=\"text/css\" rel=\"stylesheet\" href=\"{STYLESHEET}\"/>");
    out.push_str("  </head>\n  <body>\n");
    render_object(&mut out, description, false);
    out.push_str("\n  </body>\n</html>\n");
    out
}

fn render_object(out: &mut String, d: &Description, hide_kind: bool) {
    if d.is_primitive {
        let _ = write!(
            out,
            "<span class=\"value primitive typeof-{}\">{}</span>",
            encode_double_quoted_attribute(&d.kind),
            encode_text(d.value.as_deref().unwrap_or_default()),
        );
        return;
    }
    let mut classes = String::from("object");
    if d.is_circular {
        classes.push_str(" is-circular");
    }
    if d.is_iterable {
        classes.push_str(" is-iterable");
    }
    if d.is_iterator {
        classes.push_str(" is-iterator");
    }
    let _ = write!(out, "<div class=\"{classes}\">");
    if !hide_kind {
        let _ = write!(out, "<div class=\"instance-of\">{}</div>", encode_text(&d.kind));
    }
    if let Some(summary) = d.summary.as_deref().filter(|s| !s.is_empty()) {
        let _ = write!(out, "<div class=\"summary\">{}</div>", encode_text(summary));
    }
    if let Some(sample) = &d.iterable_sample {
        out.push_str("<div class=\"iterable-values\">");
        for bucket in &sample.buckets {
            render_bucket(out, bucket);
        }
        if sample.truncated {
            out.push_str("<div class=\"truncated\">…</div>");
        }
        out.push_str("</div>");
    }
    if let Some(properties) = &d.properties {
        out.push_str("<div class=\"properties\">");
        for property in properties {
            render_property(out, property);
        }
        out.push_str("</div>");
    }
    if let Some(proto) = &d.prototype_description {
        out.push_str("<div class=\"prototype\"><span class=\"label\">prototype</span>");
        render_object(out, proto, false);
        out.push_str("</div>");
    }
    out.push_str("</div>");
}

fn render_bucket(out: &mut String, bucket: &Bucket<Description>) {
    let _ = write!(
        out,
        "<details class=\"bucket\"><summary>{}–{}</summary>",
        bucket.lower_bound, bucket.upper_bound
    );
    for (offset, item) in bucket.items.iter().enumerate() {
        let _ = write!(
            out,
            "<div class=\"iterator-value\"><span class=\"index\">{}</span> <span class=\"instance-of\">{}</span> ",
            bucket.lower_bound + offset,
            encode_text(&item.kind),
        );
        render_object(out, item, true);
        out.push_str("</div>");
    }
    out.push_str("</details>");
}

fn render_property(out: &mut String, p: &PropertyDescription) {
    let mut classes = String::from("property");
    for (on, class) in [
        (p.enumerable, "is-enumerable"),
        (p.configurable, "is-configurable"),
        (!p.overridden_by.is_empty(), "is-overridden"),
        (p.is_accessor(), "is-accessor"),
        (p.is_restricted, "is-restricted"),
    ] {
        if on {
            classes.push(' ');
            classes.push_str(class);
        }
    }
    let _ = write!(
        out,
        "<div class=\"{} typeof-{}\"><span class=\"name\">{}</span> ",
        classes,
        encode_double_quoted_attribute(&p.kind),
        encode_text(&p.name),
    );
    let _ = write!(out, "<span class=\"from\">from {}</span> ", encode_text(&p.declared_on));
    if !p.overridden_by.is_empty() {
        let _ = write!(
            out,
            "<span class=\"overridden-by\">overridden by {}</span> ",
            encode_text(&p.overridden_by.join(", "))
        );
    }
    render_signature(out, "getter", p.getter_signature.as_ref());
    render_signature(out, "setter", p.setter_signature.as_ref());
    let _ = write!(out, "<span class=\"instance-of\">{}</span> ", encode_text(&p.kind));
    match &p.value {
        PropertyValue::Primitive(value) => {
            let _ = write!(out, "<span class=\"value\">{}</span>", encode_text(value));
        }
        PropertyValue::Described(nested) => {
            out.push_str("<span class=\"value\">");
            render_object(out, nested, true);
            out.push_str("</span>");
        }
    }
    out.push_str("</div>");
}

fn render_signature(out: &mut String, role: &str, signature: Option<&ParsedSignature>) {
    let Some(sig) = signature else { return };
    let mut classes = format!("signature {role}");
    if sig.is_native {
        classes.push_str(" is-native");
    }
    let _ = write!(
        out,
        "<code class=\"{classes}\">{role} ({})</code> ",
        encode_text(&sig.parameters.join(", "))
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::describe::describe;
    use crate::realm::{Property, Realm, Value};
    use crate::sample::BucketedSample;

    #[test]
    fn primitive_document() {
        let html = render_html(&Description::primitive("string".into(), "\"<b>\"".into()));
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("typeof-string"));
        assert!(html.contains("&quot;&lt;b&gt;&quot;") || html.contains("\"&lt;b&gt;\""));
        assert!(!html.contains("<b>"));
    }

    #[test]
    fn empty_description_renders() {
        let html = render_html(&Description::default());
        assert!(html.contains("class=\"object\""));
    }

    #[test]
    fn names_and_values_are_escaped() {
        let mut realm = Realm::new();
        let obj = realm.new_object();
        realm.set(obj, "<script>", "</script>");
        let html = render_html(&describe(&mut realm, &Value::Object(obj)).unwrap());
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn renders_every_optional_part() {
        let mut realm = Realm::new();
        let base = realm.define_class("Base", None);
        let derived = realm.define_class("Derived", Some(&base));
        realm.define_method(base.prototype, "m", "m() {}");
        realm.define_method(derived.prototype, "m", "m() {}");
        let instance = realm.instantiate(&derived);
        let getter = realm.new_function("get g", "get g() { return 1 }");
        realm.define(instance, "g", Property::accessor(Some(getter), None));
        realm.set(instance, "self", instance);
        let list = realm.new_array((0..12).map(Value::from));
        realm.set(instance, "list", list);

        let html = render_html(&describe(&mut realm, &Value::Object(instance)).unwrap());
        assert!(html.contains("overridden by Derived"));
        assert!(html.contains("is-accessor"));
        assert!(html.contains("<code class=\"signature getter\">getter ()</code>"));
        assert!(html.contains("is-circular"));
        assert!(html.contains("Circular: "));
        assert!(html.contains("<summary>0–9</summary>"));
        assert!(html.contains("<summary>10–11</summary>"));
        assert!(html.contains("class=\"prototype\""));
    }

    #[test]
    fn truncated_samples_are_flagged() {
        let description = Description {
            kind: "Generator".into(),
            is_iterable: true,
            iterable_sample: Some(BucketedSample { buckets: Vec::new(), truncated: true }),
            ..Description::default()
        };
        assert!(render_html(&description).contains("class=\"truncated\""));
    }
}
