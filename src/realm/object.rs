use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use super::{ObjectId, PropertyKey, Realm, Value};
use crate::error::Thrown;

/// Behaviour of a native function: `(realm, this, args) -> result`.
pub type NativeFn = Rc<dyn Fn(&mut Realm, &Value, &[Value]) -> Result<Value, Thrown>>;

/// One step of an iterator: `Ok(None)` once exhausted.
pub type StepFn = Rc<RefCell<dyn FnMut(&mut Realm) -> Result<Option<Value>, Thrown>>>;

#[derive(Clone, Debug)]
pub enum Slot {
    Data(Value),
    Accessor { get: Option<ObjectId>, set: Option<ObjectId> },
}

#[derive(Clone, Debug)]
pub struct Property {
    pub slot: Slot,
    pub enumerable: bool,
    pub configurable: bool,
    pub writable: bool,
}

impl Property {
    /// Plain assignment-style property: enumerable, writable, configurable.
    pub fn data(value: impl Into<Value>) -> Self {
        Self { slot: Slot::Data(value.into()), enumerable: true, configurable: true, writable: true }
    }
    /// Built-in method style: writable and configurable but not enumerable.
    pub fn hidden(value: impl Into<Value>) -> Self {
        Self { enumerable: false, ..Self::data(value) }
    }
    /// Neither enumerable nor writable; configurable.
    pub fn frozen(value: impl Into<Value>) -> Self {
        Self { enumerable: false, writable: false, ..Self::data(value) }
    }
    pub fn accessor(get: Option<ObjectId>, set: Option<ObjectId>) -> Self {
        Self { slot: Slot::Accessor { get, set }, enumerable: false, configurable: true, writable: false }
    }
    pub fn enumerable(mut self, enumerable: bool) -> Self {
        self.enumerable = enumerable;
        self
    }
    pub fn configurable(mut self, configurable: bool) -> Self {
        self.configurable = configurable;
        self
    }
    pub fn is_accessor(&self) -> bool {
        matches!(self.slot, Slot::Accessor { .. })
    }
}

#[derive(Clone)]
pub struct Function {
    pub source: Rc<str>,
    pub call: Option<NativeFn>,
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("source", &self.source)
            .field("native", &self.call.is_some())
            .finish()
    }
}

#[derive(Clone)]
pub struct IteratorState {
    pub(crate) step: StepFn,
    pub(crate) done: Rc<Cell<bool>>,
}

impl fmt::Debug for IteratorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IteratorState").field("done", &self.done.get()).finish()
    }
}

/// Internal class of an object. Drives the structural tag and the
/// date/function special cases.
#[derive(Clone, Debug)]
pub enum ObjectClass {
    Ordinary,
    Array,
    Date(f64),
    Error,
    Function(Function),
    Iterator(IteratorState),
}

impl ObjectClass {
    /// Tag reported by the default `Object.prototype.toString` protocol.
    pub fn builtin_tag(&self) -> &'static str {
        match self {
            Self::Ordinary | Self::Iterator(_) => "Object",
            Self::Array => "Array",
            Self::Date(_) => "Date",
            Self::Error => "Error",
            Self::Function(_) => "Function",
        }
    }
}

#[derive(Clone, Debug)]
pub struct ObjectData {
    pub class: ObjectClass,
    pub prototype: Option<ObjectId>,
    pub properties: IndexMap<PropertyKey, Property>,
}

impl ObjectData {
    pub(crate) fn new(class: ObjectClass, prototype: Option<ObjectId>) -> Self {
        Self { class, prototype, properties: IndexMap::new() }
    }
}
