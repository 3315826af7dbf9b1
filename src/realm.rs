//! Dynamic object heap the describe engine inspects.
//!
//! Objects live in an arena and are addressed by [`ObjectId`]; identity is
//! handle equality. Each object has an internal class, an explicit prototype
//! link, and an ordered table of own properties (data or accessor). Property
//! reads walk the prototype chain and run getters against the original
//! receiver, so a getter that raises surfaces as a [`Thrown`] at the read.
//!
//! Iteration follows the usual protocol: `obj[Symbol.iterator]()` yields an
//! iterator whose `next()` returns `{ value, done }` result objects.
pub mod value;
pub mod object;
mod intrinsics;
mod json;

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

pub use object::{Function, IteratorState, NativeFn, ObjectClass, ObjectData, Property, Slot, StepFn};
pub use value::{ObjectId, PropertyKey, Symbol, Value};

use crate::error::Thrown;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Clone, Debug)]
pub struct WellKnownSymbols {
    pub iterator: Symbol,
    pub to_string_tag: Symbol,
}

/// Built-in objects installed into every realm.
#[derive(Clone, Debug, Default)]
pub struct Intrinsics {
    pub object_prototype: ObjectId,
    pub function_prototype: ObjectId,
    pub array_prototype: ObjectId,
    pub date_prototype: ObjectId,
    pub error_prototype: ObjectId,
    pub generator_prototype: ObjectId,
    pub array_iterator_prototype: ObjectId,
    /// The default `Object.prototype.toString`.
    pub object_to_string: ObjectId,
    /// The default `Array.prototype.toString`.
    pub array_to_string: ObjectId,
}

/// Constructor/prototype pair produced by [`Realm::define_class`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClassRef {
    pub constructor: ObjectId,
    pub prototype: ObjectId,
}

/// Handle returned by [`Realm::get_iterator`].
#[derive(Clone, Debug)]
pub struct IteratorRecord {
    pub iterator: Value,
    next: Value,
}

pub struct Realm {
    objects: Vec<ObjectData>,
    next_symbol: u32,
    symbols: WellKnownSymbols,
    intrinsics: Intrinsics,
    /// Arrays currently being joined; a re-entrant join yields "".
    joining: Vec<ObjectId>,
}

impl fmt::Debug for Realm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Realm").field("objects", &self.objects.len()).finish_non_exhaustive()
    }
}

impl Default for Realm {
    fn default() -> Self {
        Self::new()
    }
}

// ————————————————————————————————————————————————————————————————————————————
// CONSTRUCTION
// ————————————————————————————————————————————————————————————————————————————

impl Realm {
    pub fn new() -> Self {
        let mut realm = Self {
            objects: Vec::new(),
            next_symbol: 2,
            symbols: WellKnownSymbols {
                iterator: Symbol::new(0, Some("Symbol.iterator")),
                to_string_tag: Symbol::new(1, Some("Symbol.toStringTag")),
            },
            intrinsics: Intrinsics::default(),
            joining: Vec::new(),
        };
        intrinsics::install(&mut realm);
        realm
    }

    pub fn intrinsics(&self) -> &Intrinsics {
        &self.intrinsics
    }
    pub fn symbols(&self) -> &WellKnownSymbols {
        &self.symbols
    }

    pub fn new_symbol(&mut self, description: Option<&str>) -> Symbol {
        let symbol = Symbol::new(self.next_symbol, description);
        self.next_symbol += 1;
        symbol
    }

    pub(crate) fn alloc(&mut self, data: ObjectData) -> ObjectId {
        self.objects.push(data);
        ObjectId(self.objects.len() - 1)
    }

    /// Ordinary object inheriting from `Object.prototype`.
    pub fn new_object(&mut self) -> ObjectId {
        let proto = self.intrinsics.object_prototype;
        self.new_object_with_prototype(Some(proto))
    }

    /// Ordinary object with an explicit (possibly null) prototype.
    pub fn new_object_with_prototype(&mut self, prototype: Option<ObjectId>) -> ObjectId {
        self.alloc(ObjectData::new(ObjectClass::Ordinary, prototype))
    }

    pub fn new_array(&mut self, items: impl IntoIterator<Item = Value>) -> ObjectId {
        let proto = self.intrinsics.array_prototype;
        let array = self.alloc(ObjectData::new(ObjectClass::Array, Some(proto)));
        let mut len = 0usize;
        for (i, item) in items.into_iter().enumerate() {
            self.objects[array.0].properties.insert(PropertyKey::from(i), Property::data(item));
            len = i + 1;
        }
        self.objects[array.0]
            .properties
            .insert("length".into(), Property::hidden(len as f64).configurable(false));
        array
    }

    pub fn new_date(&mut self, epoch_millis: f64) -> ObjectId {
        let proto = self.intrinsics.date_prototype;
        self.alloc(ObjectData::new(ObjectClass::Date(epoch_millis), Some(proto)))
    }

    pub fn new_error(&mut self, message: &str) -> ObjectId {
        let proto = self.intrinsics.error_prototype;
        let error = self.alloc(ObjectData::new(ObjectClass::Error, Some(proto)));
        if !message.is_empty() {
            self.define(error, "message", Property::hidden(message));
        }
        error
    }

    /// Built-in style function; its source reads `function name() { [native code] }`.
    pub fn new_native(
        &mut self,
        name: &str,
        length: u32,
        call: impl Fn(&mut Realm, &Value, &[Value]) -> Result<Value, Thrown> + 'static,
    ) -> ObjectId {
        let call: NativeFn = Rc::new(call);
        let source = format!("function {name}() {{ [native code] }}");
        self.alloc_function(name, length, &source, Some(call))
    }

    /// Function known only by its source text. Calling it returns `undefined`.
    pub fn new_function(&mut self, name: &str, source: &str) -> ObjectId {
        self.alloc_function(name, 0, source, None)
    }

    /// Function with both source text and behaviour.
    pub fn new_function_with(
        &mut self,
        name: &str,
        source: &str,
        call: impl Fn(&mut Realm, &Value, &[Value]) -> Result<Value, Thrown> + 'static,
    ) -> ObjectId {
        let call: NativeFn = Rc::new(call);
        self.alloc_function(name, 0, source, Some(call))
    }

    fn alloc_function(&mut self, name: &str, length: u32, source: &str, call: Option<NativeFn>) -> ObjectId {
        let proto = self.intrinsics.function_prototype;
        let function = Function { source: Rc::from(source), call };
        let id = self.alloc(ObjectData::new(ObjectClass::Function(function), Some(proto)));
        self.define(id, "length", Property::frozen(f64::from(length)));
        self.define(id, "name", Property::frozen(name));
        id
    }

    /// Iterator object driven by `step`, inheriting from `prototype`.
    pub fn new_iterator(
        &mut self,
        prototype: ObjectId,
        step: impl FnMut(&mut Realm) -> Result<Option<Value>, Thrown> + 'static,
    ) -> ObjectId {
        let step: StepFn = Rc::new(RefCell::new(step));
        let state = IteratorState { step, done: Rc::new(Cell::new(false)) };
        self.alloc(ObjectData::new(ObjectClass::Iterator(state), Some(prototype)))
    }

    /// Generator object; `step` produces successive values until `Ok(None)`.
    pub fn new_generator(
        &mut self,
        step: impl FnMut(&mut Realm) -> Result<Option<Value>, Thrown> + 'static,
    ) -> ObjectId {
        let proto = self.intrinsics.generator_prototype;
        self.new_iterator(proto, step)
    }

    /// Constructor + prototype pair wired the way a class declaration is.
    pub fn define_class(&mut self, name: &str, parent: Option<&ClassRef>) -> ClassRef {
        let parent_prototype = parent.map_or(self.intrinsics.object_prototype, |p| p.prototype);
        let prototype = self.new_object_with_prototype(Some(parent_prototype));
        let constructor = self.new_function(name, &format!("function {name}() {{}}"));
        self.define(constructor, "prototype", Property::frozen(prototype).configurable(false));
        self.define(prototype, "constructor", Property::hidden(constructor));
        if let Some(parent) = parent {
            self.objects[constructor.0].prototype = Some(parent.constructor);
        }
        ClassRef { constructor, prototype }
    }

    pub fn instantiate(&mut self, class: &ClassRef) -> ObjectId {
        self.new_object_with_prototype(Some(class.prototype))
    }

    /// Non-enumerable method defined from source text, the way class bodies
    /// declare them.
    pub fn define_method(&mut self, obj: ObjectId, name: &str, source: &str) -> ObjectId {
        let method = self.new_function(name, source);
        self.define(obj, name, Property::hidden(method));
        method
    }

    /// Result object `{ value, done }` for the iteration protocol.
    pub fn iter_result(&mut self, value: Option<Value>) -> ObjectId {
        let result = self.new_object();
        let done = value.is_none();
        self.set(result, "value", value.unwrap_or(Value::Undefined));
        self.set(result, "done", done);
        result
    }
}

// ————————————————————————————————————————————————————————————————————————————
// PROPERTIES
// ————————————————————————————————————————————————————————————————————————————

impl Realm {
    pub fn object(&self, id: ObjectId) -> &ObjectData {
        &self.objects[id.0]
    }

    /// Define or replace an own property.
    pub fn define(&mut self, obj: ObjectId, key: impl Into<PropertyKey>, property: Property) {
        let key = key.into();
        self.grow_length(obj, &key);
        self.objects[obj.0].properties.insert(key, property);
    }

    /// Assignment: overwrites an own data property's value, otherwise defines
    /// a fresh enumerable data property.
    pub fn set(&mut self, obj: ObjectId, key: impl Into<PropertyKey>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        if let Some(existing) = self.objects[obj.0].properties.get_mut(&key) {
            if let Slot::Data(current) = &mut existing.slot {
                *current = value;
                return;
            }
        }
        self.define(obj, key, Property::data(value));
    }

    fn grow_length(&mut self, obj: ObjectId, key: &PropertyKey) {
        let data = &mut self.objects[obj.0];
        if !matches!(data.class, ObjectClass::Array) {
            return;
        }
        let Some(index) = key.as_index() else { return };
        if let Some(Property { slot: Slot::Data(Value::Number(len)), .. }) = data.properties.get_mut(&PropertyKey::from("length")) {
            if f64::from(index) >= *len {
                *len = f64::from(index) + 1.0;
            }
        }
    }

    pub fn prototype_of(&self, obj: ObjectId) -> Option<ObjectId> {
        self.objects[obj.0].prototype
    }

    /// Rejects links that would make the chain cyclic.
    pub fn set_prototype(&mut self, obj: ObjectId, prototype: Option<ObjectId>) -> Result<(), Thrown> {
        let mut cursor = prototype;
        while let Some(id) = cursor {
            if id == obj {
                return Err(Thrown::type_error("Cyclic __proto__ value"));
            }
            cursor = self.objects[id.0].prototype;
        }
        self.objects[obj.0].prototype = prototype;
        Ok(())
    }

    /// Own keys: array indices ascending, other names in insertion order,
    /// then symbols in insertion order.
    pub fn own_keys(&self, obj: ObjectId) -> Vec<PropertyKey> {
        let props = &self.objects[obj.0].properties;
        let mut indices: Vec<(u32, &PropertyKey)> =
            props.keys().filter_map(|k| k.as_index().map(|i| (i, k))).collect();
        indices.sort_by_key(|(i, _)| *i);
        let names = props.keys().filter(|k| !k.is_symbol() && k.as_index().is_none());
        let symbols = props.keys().filter(|k| k.is_symbol());
        indices.into_iter().map(|(_, k)| k).chain(names).chain(symbols).cloned().collect()
    }

    pub fn own_property(&self, obj: ObjectId, key: &PropertyKey) -> Option<&Property> {
        self.objects[obj.0].properties.get(key)
    }

    pub fn has_own(&self, obj: ObjectId, key: &PropertyKey) -> bool {
        self.objects[obj.0].properties.contains_key(key)
    }

    fn lookup(&self, obj: ObjectId, key: &PropertyKey) -> Option<Slot> {
        let mut cursor = Some(obj);
        while let Some(id) = cursor {
            let data = &self.objects[id.0];
            if let Some(property) = data.properties.get(key) {
                return Some(property.slot.clone());
            }
            cursor = data.prototype;
        }
        None
    }

    /// `obj[key]`: walks the chain and runs getters with `obj` as receiver.
    pub fn get(&mut self, obj: ObjectId, key: impl Into<PropertyKey>) -> Result<Value, Thrown> {
        match self.lookup(obj, &key.into()) {
            None | Some(Slot::Accessor { get: None, .. }) => Ok(Value::Undefined),
            Some(Slot::Data(value)) => Ok(value),
            Some(Slot::Accessor { get: Some(getter), .. }) => {
                self.call(&Value::Object(getter), &Value::Object(obj), &[])
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// CALLS & COERCION
// ————————————————————————————————————————————————————————————————————————————

impl Realm {
    pub fn is_callable(&self, value: &Value) -> bool {
        self.function(value).is_some()
    }

    pub fn function(&self, value: &Value) -> Option<&Function> {
        match &self.objects[value.as_object()?.0].class {
            ObjectClass::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn date_value(&self, value: &Value) -> Option<f64> {
        match self.objects[value.as_object()?.0].class {
            ObjectClass::Date(millis) => Some(millis),
            _ => None,
        }
    }

    pub fn is_array(&self, obj: ObjectId) -> bool {
        matches!(self.objects[obj.0].class, ObjectClass::Array)
    }

    pub fn call(&mut self, func: &Value, this: &Value, args: &[Value]) -> Result<Value, Thrown> {
        let Some(function) = self.function(func) else {
            return Err(Thrown::type_error(format!("{} is not a function", self.type_of(func))));
        };
        match function.call.clone() {
            Some(call) => call(self, this, args),
            None => Ok(Value::Undefined),
        }
    }

    /// Language-level `typeof`.
    pub fn type_of(&self, value: &Value) -> &'static str {
        match value {
            Value::Undefined => "undefined",
            Value::Null => "object",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Symbol(_) => "symbol",
            Value::Object(_) if self.is_callable(value) => "function",
            Value::Object(_) => "object",
        }
    }

    /// `ToString` on a value. Objects go through their `toString` method.
    pub fn to_string(&mut self, value: &Value) -> Result<String, Thrown> {
        match value {
            Value::Symbol(_) => Err(Thrown::type_error("Cannot convert a Symbol value to a string")),
            Value::Object(obj) => {
                let method = self.get(*obj, "toString")?;
                let result = self.call(&method, value, &[])?;
                if result.as_object().is_some() {
                    return Err(Thrown::type_error("Cannot convert object to primitive value"));
                }
                self.to_string(&result)
            }
            primitive => Ok(primitive_string(primitive)),
        }
    }

    pub fn to_property_key(&mut self, value: &Value) -> Result<PropertyKey, Thrown> {
        match value {
            Value::Symbol(sym) => Ok(PropertyKey::Symbol(sym.clone())),
            other => self.to_string(other).map(PropertyKey::from),
        }
    }
}

/// Plain string form of a primitive (`String(value)` without method lookup).
pub fn primitive_string(value: &Value) -> String {
    match value {
        Value::Undefined => "undefined".into(),
        Value::Null => "null".into(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => number_string(*n),
        Value::String(s) => s.to_string(),
        Value::Symbol(sym) => sym.to_string(),
        Value::Object(_) => "[object Object]".into(),
    }
}

fn number_string(n: f64) -> String {
    if n.is_nan() {
        "NaN".into()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity".into() } else { "-Infinity".into() }
    } else if n == 0.0 {
        "0".into()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{n:.0}")
    } else {
        format!("{n}")
    }
}

// ————————————————————————————————————————————————————————————————————————————
// ITERATION
// ————————————————————————————————————————————————————————————————————————————

impl Realm {
    /// `value[Symbol.iterator]()`, plus the iterator's `next` method.
    pub fn get_iterator(&mut self, value: &Value) -> Result<IteratorRecord, Thrown> {
        let not_iterable = || Thrown::type_error(format!("{} is not iterable", primitive_string(value)));
        let Some(obj) = value.as_object() else { return Err(not_iterable()) };
        let key = self.symbols.iterator.clone();
        let method = self.get(obj, key)?;
        if !self.is_callable(&method) {
            return Err(not_iterable());
        }
        let iterator = self.call(&method, value, &[])?;
        let Some(it) = iterator.as_object() else {
            return Err(Thrown::type_error("Result of the Symbol.iterator method is not an object"));
        };
        let next = self.get(it, "next")?;
        Ok(IteratorRecord { iterator, next })
    }

    /// One `next()` call; `Ok(None)` when the iterator reports `done`.
    pub fn step(&mut self, record: &IteratorRecord) -> Result<Option<Value>, Thrown> {
        let result = self.call(&record.next, &record.iterator, &[])?;
        let Some(obj) = result.as_object() else {
            return Err(Thrown::type_error(format!(
                "Iterator result {} is not an object",
                primitive_string(&result)
            )));
        };
        if self.get(obj, "done")?.is_truthy() {
            return Ok(None);
        }
        self.get(obj, "value").map(Some)
    }

    /// Lazy element stream over an iterable. Stops after the first error.
    pub fn values(&mut self, value: &Value) -> Result<Values<'_>, Thrown> {
        let record = self.get_iterator(value)?;
        Ok(Values { realm: self, record, finished: false })
    }

    /// Drive an iterator object's step function (the shared native `next`).
    pub(crate) fn advance(&mut self, this: &Value) -> Result<Option<Value>, Thrown> {
        let state = match this.as_object().map(|id| &self.objects[id.0].class) {
            Some(ObjectClass::Iterator(state)) => state.clone(),
            _ => {
                return Err(Thrown::type_error(format!(
                    "next method called on incompatible receiver {}",
                    primitive_string(this)
                )));
            }
        };
        if state.done.get() {
            return Ok(None);
        }
        let Ok(mut step) = state.step.try_borrow_mut() else {
            return Err(Thrown::type_error("Generator is already running"));
        };
        let out = (&mut *step)(self);
        drop(step);
        if !matches!(out, Ok(Some(_))) {
            state.done.set(true);
        }
        out
    }
}

pub struct Values<'r> {
    realm: &'r mut Realm,
    record: IteratorRecord,
    finished: bool,
}

impl Iterator for Values<'_> {
    type Item = Result<Value, Thrown>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.realm.step(&self.record) {
            Ok(Some(value)) => Some(Ok(value)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(error) => {
                self.finished = true;
                Some(Err(error))
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn own_keys_order_indices_names_symbols() {
        let mut realm = Realm::new();
        let obj = realm.new_object();
        let sym = realm.new_symbol(Some("s"));
        realm.set(obj, "b", 1);
        realm.set(obj, sym.clone(), 2);
        realm.set(obj, "2", 3);
        realm.set(obj, "a", 4);
        realm.set(obj, "0", 5);
        let keys: Vec<String> = realm.own_keys(obj).iter().map(ToString::to_string).collect();
        assert_eq!(keys, ["0", "2", "b", "a", "Symbol(s)"]);
    }

    #[test]
    fn getters_run_against_the_receiver() {
        let mut realm = Realm::new();
        let proto = realm.new_object();
        let getter = realm.new_function_with("get who", "get who() { return this.name }", |realm, this, _| {
            let obj = this.as_object().ok_or_else(|| Thrown::type_error("no receiver"))?;
            realm.get(obj, "name")
        });
        realm.define(proto, "who", Property::accessor(Some(getter), None));
        let child = realm.new_object_with_prototype(Some(proto));
        realm.set(child, "name", "child");
        let who = realm.get(child, "who").unwrap();
        assert_eq!(who.as_str(), Some("child"));
    }

    #[test]
    fn prototype_cycles_are_rejected() {
        let mut realm = Realm::new();
        let a = realm.new_object();
        let b = realm.new_object_with_prototype(Some(a));
        let err = realm.set_prototype(a, Some(b)).unwrap_err();
        assert!(err.is_type_error());
    }

    #[test]
    fn arrays_iterate_through_the_protocol() {
        let mut realm = Realm::new();
        let array = realm.new_array([Value::from(1), Value::from(2), Value::from(3)]);
        let items: Vec<f64> = realm
            .values(&Value::Object(array))
            .unwrap()
            .map(|v| v.unwrap().as_number().unwrap())
            .collect();
        assert_eq!(items, [1.0, 2.0, 3.0]);
    }

    #[test]
    fn push_grows_length() {
        let mut realm = Realm::new();
        let array = realm.new_array([]);
        let push = realm.get(array, "push").unwrap();
        realm.call(&push, &Value::Object(array), &[Value::from("x"), Value::from("y")]).unwrap();
        assert_eq!(realm.get(array, "length").unwrap().as_number(), Some(2.0));
        assert_eq!(realm.to_string(&Value::Object(array)).unwrap(), "x,y");
    }

    #[test]
    fn cyclic_join_is_empty() {
        let mut realm = Realm::new();
        let array = realm.new_array([Value::from(1)]);
        realm.set(array, 1usize, array);
        assert_eq!(realm.to_string(&Value::Object(array)).unwrap(), "1,");
    }

    #[test]
    fn generators_stop_after_exhaustion() {
        let mut realm = Realm::new();
        let mut n = 0;
        let generator = realm.new_generator(move |_| {
            n += 1;
            Ok((n <= 2).then(|| Value::from(n)))
        });
        let count = realm.values(&Value::Object(generator)).unwrap().count();
        assert_eq!(count, 2);
        // exhausted generators stay exhausted
        assert_eq!(realm.values(&Value::Object(generator)).unwrap().count(), 0);
    }

    #[test]
    fn next_on_incompatible_receiver_is_a_type_error() {
        let mut realm = Realm::new();
        let proto = realm.intrinsics().generator_prototype;
        let err = realm.values(&Value::Object(proto)).unwrap().next().unwrap().unwrap_err();
        assert!(err.is_type_error());
    }

    #[test]
    fn calling_a_non_function_is_a_type_error() {
        let mut realm = Realm::new();
        let err = realm.call(&Value::from(3), &Value::Undefined, &[]).unwrap_err();
        assert_eq!(err.message, "number is not a function");
    }
}
