//! Built-in constructors and prototypes installed into a fresh realm.
use std::rc::Rc;

use chrono::{DateTime, Utc};

use super::{Function, NativeFn, ObjectClass, ObjectData, ObjectId, Property, PropertyKey, Realm, Value};
use crate::error::Thrown;

pub(super) fn install(realm: &mut Realm) {
    // The two roots must exist before any native function can be allocated.
    let object_prototype = realm.alloc(ObjectData::new(ObjectClass::Ordinary, None));
    let call: NativeFn = Rc::new(noop);
    let root = Function { source: Rc::from("function () { [native code] }"), call: Some(call) };
    let function_prototype =
        realm.alloc(ObjectData::new(ObjectClass::Function(root), Some(object_prototype)));
    realm.intrinsics.object_prototype = object_prototype;
    realm.intrinsics.function_prototype = function_prototype;

    install_object(realm, object_prototype);
    install_function(realm, function_prototype);
    install_array(realm, object_prototype);
    install_date(realm, object_prototype);
    install_error(realm, object_prototype);
    install_iterators(realm, object_prototype);
}

// ------------------------------- Helpers ---------------------------------- //

fn noop(_: &mut Realm, _: &Value, _: &[Value]) -> Result<Value, Thrown> {
    Ok(Value::Undefined)
}

fn method(
    realm: &mut Realm,
    holder: ObjectId,
    name: &str,
    length: u32,
    call: impl Fn(&mut Realm, &Value, &[Value]) -> Result<Value, Thrown> + 'static,
) -> ObjectId {
    let f = realm.new_native(name, length, call);
    realm.define(holder, name, Property::hidden(f));
    f
}

fn constructor(
    realm: &mut Realm,
    prototype: ObjectId,
    name: &str,
    length: u32,
    call: impl Fn(&mut Realm, &Value, &[Value]) -> Result<Value, Thrown> + 'static,
) -> ObjectId {
    let ctor = realm.new_native(name, length, call);
    realm.define(ctor, "prototype", Property::frozen(prototype).configurable(false));
    realm.define(prototype, "constructor", Property::hidden(ctor));
    ctor
}

fn receiver(this: &Value, method: &str) -> Result<ObjectId, Thrown> {
    this.as_object()
        .ok_or_else(|| Thrown::type_error(format!("{method} called on non-object")))
}

fn arg(args: &[Value], i: usize) -> Value {
    args.get(i).cloned().unwrap_or(Value::Undefined)
}

fn tag_property(realm: &mut Realm, holder: ObjectId, tag: &str) {
    let key = realm.symbols.to_string_tag.clone();
    realm.define(holder, key, Property::frozen(tag));
}

// -------------------------------- Object ---------------------------------- //

fn install_object(realm: &mut Realm, proto: ObjectId) {
    constructor(realm, proto, "Object", 1, |realm, _, args| {
        Ok(match args.first() {
            Some(v @ Value::Object(_)) => v.clone(),
            _ => Value::Object(realm.new_object()),
        })
    });
    method(realm, proto, "hasOwnProperty", 1, |realm, this, args| {
        let obj = receiver(this, "hasOwnProperty")?;
        let key = realm.to_property_key(&arg(args, 0))?;
        Ok(Value::Bool(realm.has_own(obj, &key)))
    });
    method(realm, proto, "isPrototypeOf", 1, |realm, this, args| {
        let (Some(target), Some(obj)) = (arg(args, 0).as_object(), this.as_object()) else {
            return Ok(Value::Bool(false));
        };
        let mut cursor = realm.prototype_of(target);
        while let Some(id) = cursor {
            if id == obj {
                return Ok(Value::Bool(true));
            }
            cursor = realm.prototype_of(id);
        }
        Ok(Value::Bool(false))
    });
    method(realm, proto, "propertyIsEnumerable", 1, |realm, this, args| {
        let obj = receiver(this, "propertyIsEnumerable")?;
        let key = realm.to_property_key(&arg(args, 0))?;
        Ok(Value::Bool(realm.own_property(obj, &key).is_some_and(|p| p.enumerable)))
    });
    let to_string = method(realm, proto, "toString", 0, |realm, this, _| {
        let tag = match this {
            Value::Undefined => "Undefined".to_string(),
            Value::Null => "Null".to_string(),
            Value::Object(obj) => {
                let key = realm.symbols.to_string_tag.clone();
                match realm.get(*obj, key)? {
                    Value::String(tag) => tag.to_string(),
                    _ => realm.object(*obj).class.builtin_tag().to_string(),
                }
            }
            _ => "Object".to_string(),
        };
        Ok(Value::from(format!("[object {tag}]")))
    });
    realm.intrinsics.object_to_string = to_string;
    method(realm, proto, "toLocaleString", 0, |realm, this, _| {
        realm.to_string(this).map(Value::from)
    });
    method(realm, proto, "valueOf", 0, |_, this, _| Ok(this.clone()));
}

// ------------------------------- Function --------------------------------- //

fn install_function(realm: &mut Realm, proto: ObjectId) {
    constructor(realm, proto, "Function", 1, |_, _, _| {
        Err(Thrown::error("Function constructor is not supported"))
    });
    method(realm, proto, "toString", 0, |realm, this, _| {
        match realm.function(this) {
            Some(f) => Ok(Value::String(f.source.clone())),
            None => Err(Thrown::type_error("Function.prototype.toString requires that 'this' be a Function")),
        }
    });
    method(realm, proto, "call", 1, |realm, this, args| {
        let rest = args.get(1..).unwrap_or_default();
        realm.call(this, &arg(args, 0), rest)
    });
}

// -------------------------------- Array ----------------------------------- //

fn install_array(realm: &mut Realm, object_prototype: ObjectId) {
    let proto = realm.alloc(ObjectData::new(ObjectClass::Array, Some(object_prototype)));
    realm.define(proto, "length", Property::hidden(0.0).configurable(false));
    realm.intrinsics.array_prototype = proto;

    constructor(realm, proto, "Array", 1, |realm, _, args| {
        Ok(Value::Object(realm.new_array(args.iter().cloned())))
    });
    method(realm, proto, "join", 1, |realm, this, args| {
        let array = receiver(this, "Array.prototype.join")?;
        let separator = match arg(args, 0) {
            Value::Undefined => ",".to_string(),
            other => realm.to_string(&other)?,
        };
        if realm.joining.contains(&array) {
            return Ok(Value::from(""));
        }
        realm.joining.push(array);
        let joined = join(realm, array, &separator);
        realm.joining.retain(|id| *id != array);
        joined.map(Value::from)
    });
    method(realm, proto, "push", 1, |realm, this, args| {
        let array = receiver(this, "Array.prototype.push")?;
        let mut len = length_of(realm, array)?;
        for item in args {
            realm.set(array, len, item.clone());
            len += 1;
        }
        realm.set(array, "length", len as f64);
        Ok(Value::Number(len as f64))
    });
    let to_string = method(realm, proto, "toString", 0, |realm, this, _| {
        let array = receiver(this, "Array.prototype.toString")?;
        let join = realm.get(array, "join")?;
        if realm.is_callable(&join) {
            return realm.call(&join, this, &[]);
        }
        let fallback = Value::Object(realm.intrinsics.object_to_string);
        realm.call(&fallback, this, &[])
    });
    realm.intrinsics.array_to_string = to_string;

    let values = method(realm, proto, "values", 0, |realm, this, _| {
        let array = receiver(this, "Array.prototype.values")?;
        let proto = realm.intrinsics.array_iterator_prototype;
        let mut index = 0usize;
        let iterator = realm.new_iterator(proto, move |realm| {
            if index >= length_of(realm, array)? {
                return Ok(None);
            }
            let item = realm.get(array, index)?;
            index += 1;
            Ok(Some(item))
        });
        Ok(Value::Object(iterator))
    });
    let key = realm.symbols.iterator.clone();
    realm.define(proto, key, Property::hidden(values));
}

fn length_of(realm: &mut Realm, array: ObjectId) -> Result<usize, Thrown> {
    let len = realm.get(array, "length")?.as_number().unwrap_or(0.0);
    Ok(if len.is_finite() && len > 0.0 { len as usize } else { 0 })
}

fn join(realm: &mut Realm, array: ObjectId, separator: &str) -> Result<String, Thrown> {
    let len = length_of(realm, array)?;
    let mut parts = Vec::with_capacity(len);
    for i in 0..len {
        let item = realm.get(array, i)?;
        parts.push(if item.is_nullish() { String::new() } else { realm.to_string(&item)? });
    }
    Ok(parts.join(separator))
}

// --------------------------------- Date ----------------------------------- //

fn install_date(realm: &mut Realm, object_prototype: ObjectId) {
    let proto = realm.new_object_with_prototype(Some(object_prototype));
    realm.intrinsics.date_prototype = proto;

    constructor(realm, proto, "Date", 7, |realm, _, args| {
        let millis = match args.first() {
            Some(Value::Number(n)) => *n,
            _ => Utc::now().timestamp_millis() as f64,
        };
        Ok(Value::Object(realm.new_date(millis)))
    });
    method(realm, proto, "getTime", 0, |realm, this, _| {
        realm
            .date_value(this)
            .map(Value::Number)
            .ok_or_else(|| Thrown::type_error("this is not a Date object."))
    });
    method(realm, proto, "toISOString", 0, |realm, this, _| {
        let millis = realm.date_value(this).ok_or_else(|| Thrown::type_error("this is not a Date object."))?;
        let date = utc(millis).ok_or_else(|| Thrown::range_error("Invalid time value"))?;
        Ok(Value::from(date.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()))
    });
    method(realm, proto, "toString", 0, |realm, this, _| {
        let millis = realm.date_value(this).ok_or_else(|| Thrown::type_error("this is not a Date object."))?;
        Ok(Value::from(match utc(millis) {
            Some(date) => date.format("%a %b %d %Y %H:%M:%S GMT+0000 (Coordinated Universal Time)").to_string(),
            None => "Invalid Date".to_string(),
        }))
    });
}

fn utc(millis: f64) -> Option<DateTime<Utc>> {
    if !millis.is_finite() {
        return None;
    }
    DateTime::from_timestamp_millis(millis as i64)
}

// --------------------------------- Error ---------------------------------- //

fn install_error(realm: &mut Realm, object_prototype: ObjectId) {
    let proto = realm.new_object_with_prototype(Some(object_prototype));
    realm.intrinsics.error_prototype = proto;

    constructor(realm, proto, "Error", 1, |realm, _, args| {
        let message = match args.first() {
            Some(Value::Undefined) | None => String::new(),
            Some(other) => realm.to_string(other)?,
        };
        Ok(Value::Object(realm.new_error(&message)))
    });
    realm.define(proto, "name", Property::hidden("Error"));
    realm.define(proto, "message", Property::hidden(""));
    method(realm, proto, "toString", 0, |realm, this, _| {
        let error = receiver(this, "Error.prototype.toString")?;
        let name = realm.get(error, "name")?;
        let message = realm.get(error, "message")?;
        let name = if name.is_nullish() { "Error".to_string() } else { realm.to_string(&name)? };
        let message = if message.is_nullish() { String::new() } else { realm.to_string(&message)? };
        Ok(Value::from(match (name.is_empty(), message.is_empty()) {
            (_, true) => name,
            (true, false) => message,
            (false, false) => format!("{name}: {message}"),
        }))
    });
}

// ------------------------------- Iterators -------------------------------- //

fn install_iterators(realm: &mut Realm, object_prototype: ObjectId) {
    for (tag, slot) in [("Generator", 0), ("Array Iterator", 1)] {
        let proto = realm.new_object_with_prototype(Some(object_prototype));
        method(realm, proto, "next", 1, |realm, this, _| {
            let step = realm.advance(this)?;
            Ok(Value::Object(realm.iter_result(step)))
        });
        let itself = realm.new_native("[Symbol.iterator]", 0, |_, this, _| Ok(this.clone()));
        let key: PropertyKey = realm.symbols.iterator.clone().into();
        realm.define(proto, key, Property::hidden(itself));
        tag_property(realm, proto, tag);
        match slot {
            0 => realm.intrinsics.generator_prototype = proto,
            _ => realm.intrinsics.array_iterator_prototype = proto,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_to_string_reports_builtin_tags() {
        let mut realm = Realm::new();
        let to_string = Value::Object(realm.intrinsics().object_to_string);
        let array = Value::Object(realm.new_array([]));
        let tagged = realm.call(&to_string, &array, &[]).unwrap();
        assert_eq!(tagged.as_str(), Some("[object Array]"));
        let generator = Value::Object(realm.new_generator(|_| Ok(None)));
        let tagged = realm.call(&to_string, &generator, &[]).unwrap();
        assert_eq!(tagged.as_str(), Some("[object Generator]"));
    }

    #[test]
    fn error_to_string_joins_name_and_message() {
        let mut realm = Realm::new();
        let error = Value::Object(realm.new_error("boom"));
        assert_eq!(realm.to_string(&error).unwrap(), "Error: boom");
    }

    #[test]
    fn date_to_iso_string() {
        let mut realm = Realm::new();
        let date = realm.new_date(0.0);
        let to_iso = realm.get(date, "toISOString").unwrap();
        let iso = realm.call(&to_iso, &Value::Object(date), &[]).unwrap();
        assert_eq!(iso.as_str(), Some("1970-01-01T00:00:00.000Z"));
    }

    #[test]
    fn function_to_string_returns_source() {
        let mut realm = Realm::new();
        let f = Value::Object(realm.new_function("add", "function add(a, b) { return a + b; }"));
        assert_eq!(realm.to_string(&f).unwrap(), "function add(a, b) { return a + b; }");
    }
}
