use std::fmt;
use std::rc::Rc;

/// Handle to an object allocated in a [`Realm`](super::Realm). Two values
/// refer to the same object iff their ids are equal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub(crate) usize);

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Symbol {
    id: u32,
    description: Option<Rc<str>>,
}

impl Symbol {
    pub(crate) fn new(id: u32, description: Option<&str>) -> Self {
        Self { id, description: description.map(Rc::from) }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.description.as_deref().unwrap_or(""))
    }
}

#[derive(Clone, Debug)]
pub enum Value {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(Rc<str>),
    Symbol(Symbol),
    Object(ObjectId),
}

impl Value {
    pub fn string(s: impl AsRef<str>) -> Self {
        Self::String(Rc::from(s.as_ref()))
    }
    pub fn as_object(&self) -> Option<ObjectId> {
        match self {
            Self::Object(id) => Some(*id),
            _ => None,
        }
    }
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }
    pub fn is_nullish(&self) -> bool {
        matches!(self, Self::Undefined | Self::Null)
    }
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Undefined | Self::Null => false,
            Self::Bool(b) => *b,
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::String(s) => !s.is_empty(),
            Self::Symbol(_) | Self::Object(_) => true,
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self { Self::Number(n) }
}
impl From<i32> for Value {
    fn from(n: i32) -> Self { Self::Number(f64::from(n)) }
}
impl From<bool> for Value {
    fn from(b: bool) -> Self { Self::Bool(b) }
}
impl From<&str> for Value {
    fn from(s: &str) -> Self { Self::string(s) }
}
impl From<String> for Value {
    fn from(s: String) -> Self { Self::String(Rc::from(s)) }
}
impl From<Symbol> for Value {
    fn from(s: Symbol) -> Self { Self::Symbol(s) }
}
impl From<ObjectId> for Value {
    fn from(id: ObjectId) -> Self { Self::Object(id) }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    String(Rc<str>),
    Symbol(Symbol),
}

impl PropertyKey {
    /// The numeric value of a canonical array index key ("0", "17", but not
    /// "007" or "1.5").
    pub fn as_index(&self) -> Option<u32> {
        let Self::String(s) = self else { return None };
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if s.len() > 1 && s.starts_with('0') {
            return None;
        }
        s.parse::<u32>().ok().filter(|n| *n != u32::MAX)
    }
    pub fn is_symbol(&self) -> bool {
        matches!(self, Self::Symbol(_))
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Symbol(sym) => sym.fmt(f),
        }
    }
}

impl From<&str> for PropertyKey {
    fn from(s: &str) -> Self { Self::String(Rc::from(s)) }
}
impl From<String> for PropertyKey {
    fn from(s: String) -> Self { Self::String(Rc::from(s)) }
}
impl From<usize> for PropertyKey {
    fn from(i: usize) -> Self { Self::String(Rc::from(i.to_string())) }
}
impl From<Symbol> for PropertyKey {
    fn from(s: Symbol) -> Self { Self::Symbol(s) }
}
impl From<&PropertyKey> for PropertyKey {
    fn from(k: &PropertyKey) -> Self { k.clone() }
}
impl From<&Symbol> for PropertyKey {
    fn from(s: &Symbol) -> Self { Self::Symbol(s.clone()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_index_keys_only() {
        assert_eq!(PropertyKey::from("0").as_index(), Some(0));
        assert_eq!(PropertyKey::from("42").as_index(), Some(42));
        assert_eq!(PropertyKey::from("007").as_index(), None);
        assert_eq!(PropertyKey::from("1.5").as_index(), None);
        assert_eq!(PropertyKey::from("length").as_index(), None);
        assert_eq!(PropertyKey::from("").as_index(), None);
    }

    #[test]
    fn symbols_display_with_description() {
        assert_eq!(Symbol::new(7, Some("Symbol.iterator")).to_string(), "Symbol(Symbol.iterator)");
        assert_eq!(Symbol::new(8, None).to_string(), "Symbol()");
        assert_eq!(PropertyKey::from(Symbol::new(9, Some("tag"))).to_string(), "Symbol(tag)");
    }
}
