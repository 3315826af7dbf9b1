//! Type classification and the structural predicates the engine relies on.
use crate::realm::{ObjectId, PropertyKey, Realm, Value};

/// Semantic kind of a value.
///
/// Primitives (and functions) report their type name verbatim, `null` reports
/// `"null"`. Objects prefer a `Symbol.toStringTag` declared on the object
/// itself or its immediate prototype (never further up), then the
/// constructor's name, then the structural tag. Never fails.
pub fn classify(realm: &mut Realm, value: &Value) -> String {
    let obj = match value {
        Value::Undefined => return "undefined".into(),
        Value::Null => return "null".into(),
        Value::Bool(_) => return "boolean".into(),
        Value::Number(_) => return "number".into(),
        Value::String(_) => return "string".into(),
        Value::Symbol(_) => return "symbol".into(),
        Value::Object(_) if realm.is_callable(value) => return "function".into(),
        Value::Object(obj) => *obj,
    };
    if let Some(tag) = immediate_tag(realm, obj) {
        return tag;
    }
    if let Some(name) = constructor_name(realm, obj) {
        return name;
    }
    realm.object(obj).class.builtin_tag().to_string()
}

fn immediate_tag(realm: &mut Realm, obj: ObjectId) -> Option<String> {
    let key = PropertyKey::from(&realm.symbols().to_string_tag);
    let holders = [Some(obj), realm.prototype_of(obj)];
    for holder in holders.into_iter().flatten() {
        if !realm.has_own(holder, &key) {
            continue;
        }
        if let Ok(Value::String(tag)) = realm.get(holder, &key) {
            if !tag.is_empty() {
                return Some(tag.to_string());
            }
        }
    }
    None
}

fn constructor_name(realm: &mut Realm, obj: ObjectId) -> Option<String> {
    let ctor = realm.get(obj, "constructor").ok()?;
    let ctor = ctor.as_object().filter(|_| realm.is_callable(&ctor))?;
    match realm.get(ctor, "name").ok()? {
        Value::String(name) if !name.is_empty() => Some(name.to_string()),
        _ => None,
    }
}

/// The engine's pragmatic notion of "primitive": language primitives, `null`,
/// plus functions and dates, which are serialized rather than walked.
pub fn is_primitive_or_null(realm: &Realm, value: &Value) -> bool {
    match value {
        Value::Object(_) => realm.is_callable(value) || realm.date_value(value).is_some(),
        _ => true,
    }
}

/// Exposes a callable `Symbol.iterator`. A throwing lookup counts as "no".
pub fn is_iterable(realm: &mut Realm, value: &Value) -> bool {
    let key = PropertyKey::from(&realm.symbols().iterator);
    has_method(realm, value, key)
}

/// Exposes a callable `next`.
pub fn is_iterator(realm: &mut Realm, value: &Value) -> bool {
    has_method(realm, value, PropertyKey::from("next"))
}

fn has_method(realm: &mut Realm, value: &Value, key: PropertyKey) -> bool {
    let Some(obj) = value.as_object() else { return false };
    realm.get(obj, key).is_ok_and(|method| realm.is_callable(&method))
}

/// Arrays, and objects carrying an own numeric `length`.
pub fn is_array_like(realm: &Realm, obj: ObjectId) -> bool {
    if realm.is_array(obj) {
        return true;
    }
    realm
        .own_property(obj, &PropertyKey::from("length"))
        .is_some_and(|p| matches!(p.slot, crate::realm::Slot::Data(Value::Number(_))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realm::Property;

    #[test]
    fn primitives_report_type_names() {
        let mut realm = Realm::new();
        let sym = realm.new_symbol(Some("s"));
        assert_eq!(classify(&mut realm, &Value::Undefined), "undefined");
        assert_eq!(classify(&mut realm, &Value::Null), "null");
        assert_eq!(classify(&mut realm, &Value::from(f64::NAN)), "number");
        assert_eq!(classify(&mut realm, &Value::from("s")), "string");
        assert_eq!(classify(&mut realm, &Value::from(true)), "boolean");
        assert_eq!(classify(&mut realm, &Value::Symbol(sym)), "symbol");
        let f = realm.new_function("f", "function f() {}");
        assert_eq!(classify(&mut realm, &Value::Object(f)), "function");
    }

    #[test]
    fn objects_use_constructor_names() {
        let mut realm = Realm::new();
        let obj = Value::Object(realm.new_object());
        let array = Value::Object(realm.new_array([]));
        let date = Value::Object(realm.new_date(0.0));
        assert_eq!(classify(&mut realm, &obj), "Object");
        assert_eq!(classify(&mut realm, &array), "Array");
        assert_eq!(classify(&mut realm, &date), "Date");

        let base = realm.define_class("Base", None);
        let derived = realm.define_class("Derived", Some(&base));
        let instance = Value::Object(realm.instantiate(&derived));
        assert_eq!(classify(&mut realm, &instance), "Derived");
        assert_eq!(classify(&mut realm, &Value::Object(base.prototype)), "Base");
    }

    #[test]
    fn tags_only_count_on_the_object_or_its_prototype() {
        let mut realm = Realm::new();
        let tag = realm.symbols().to_string_tag.clone();
        let grandparent = realm.new_object();
        realm.define(grandparent, tag.clone(), Property::frozen("Distant"));
        let parent = realm.new_object_with_prototype(Some(grandparent));
        let child = realm.new_object_with_prototype(Some(parent));
        // inherited from two levels up: ignored
        assert_eq!(classify(&mut realm, &Value::Object(child)), "Object");

        realm.define(parent, tag, Property::frozen("Custom"));
        assert_eq!(classify(&mut realm, &Value::Object(child)), "Custom");

        let generator = Value::Object(realm.new_generator(|_| Ok(None)));
        assert_eq!(classify(&mut realm, &generator), "Generator");
    }

    #[test]
    fn null_prototype_objects_fall_back_to_structural_tag() {
        let mut realm = Realm::new();
        let bare = Value::Object(realm.new_object_with_prototype(None));
        assert_eq!(classify(&mut realm, &bare), "Object");
    }

    #[test]
    fn pragmatic_primitives_include_functions_and_dates() {
        let mut realm = Realm::new();
        let f = Value::Object(realm.new_function("f", "function f() {}"));
        let date = Value::Object(realm.new_date(0.0));
        let obj = Value::Object(realm.new_object());
        assert!(is_primitive_or_null(&realm, &Value::Null));
        assert!(is_primitive_or_null(&realm, &f));
        assert!(is_primitive_or_null(&realm, &date));
        assert!(!is_primitive_or_null(&realm, &obj));
    }

    #[test]
    fn iterable_and_iterator_duck_typing() {
        let mut realm = Realm::new();
        let array = Value::Object(realm.new_array([]));
        let generator = Value::Object(realm.new_generator(|_| Ok(None)));
        let obj = Value::Object(realm.new_object());
        assert!(is_iterable(&mut realm, &array));
        assert!(!is_iterator(&mut realm, &array));
        assert!(is_iterable(&mut realm, &generator));
        assert!(is_iterator(&mut realm, &generator));
        assert!(!is_iterable(&mut realm, &obj));
        assert!(!is_iterable(&mut realm, &Value::from("abc")));
    }
}
