use serde::{Deserialize, Serialize};

use crate::sample::BucketedSample;
use crate::serialize::ParsedSignature;

// ————————————————————————————————————————————————————————————————————————————
// DESCRIPTION TREE
// ————————————————————————————————————————————————————————————————————————————

/// Report for one inspected value. Contains no cycles and only plain data,
/// so it always serializes to JSON.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Description {
    pub kind: String,
    pub is_primitive: bool,
    /// Serialized form; primitives only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Best-effort one-line stringification; composites only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub is_iterable: bool,
    pub is_iterator: bool,
    /// Own properties in key order. Absent for primitives and circular markers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Vec<PropertyDescription>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iterable_sample: Option<BucketedSample<Description>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prototype_description: Option<Box<Description>>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_circular: bool,
}

impl Description {
    pub fn primitive(kind: String, value: String) -> Self {
        Self { kind, is_primitive: true, value: Some(value), ..Self::default() }
    }

    /// Stand-in for an object already on the traversal path.
    pub fn circular(kind: String, summary: &str) -> Self {
        Self {
            kind,
            summary: Some(format!("Circular: {summary}")),
            is_circular: true,
            ..Self::default()
        }
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDescription> {
        self.properties.as_ref()?.iter().find(|p| p.name == name)
    }

    /// This description followed by each prototype description, nearest first.
    pub fn chain(&self) -> impl Iterator<Item = &Description> {
        std::iter::successors(Some(self), |d| d.prototype_description.as_deref())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PropertyDescription {
    /// Symbol keys appear as `Symbol(description)`.
    pub name: String,
    pub kind: String,
    pub enumerable: bool,
    pub configurable: bool,
    pub declared_on: String,
    /// Kinds of descendants on the walked chain that redeclare this name,
    /// nearest first.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub overridden_by: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub getter_signature: Option<ParsedSignature>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub setter_signature: Option<ParsedSignature>,
    /// Reading the value was refused; `value` holds the restricted sentinel.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_restricted: bool,
    pub value: PropertyValue,
}

impl PropertyDescription {
    pub fn is_accessor(&self) -> bool {
        self.getter_signature.is_some() || self.setter_signature.is_some()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Primitive(String),
    Described(Box<Description>),
}

impl Default for PropertyValue {
    fn default() -> Self {
        Self::Primitive(String::new())
    }
}

impl PropertyValue {
    pub fn as_primitive(&self) -> Option<&str> {
        match self {
            Self::Primitive(s) => Some(s),
            Self::Described(_) => None,
        }
    }
    pub fn as_description(&self) -> Option<&Description> {
        match self {
            Self::Described(d) => Some(d),
            Self::Primitive(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn optional_fields_are_omitted() {
        let description = Description::primitive("number".into(), "1".into());
        let json = serde_json::to_value(&description).unwrap();
        assert_eq!(
            json,
            json!({"kind": "number", "isPrimitive": true, "value": "1", "isIterable": false, "isIterator": false})
        );
    }

    #[test]
    fn property_values_are_untagged() {
        let json = json!({
            "name": "p", "kind": "Object", "enumerable": true, "configurable": true,
            "declaredOn": "Object",
            "value": {"kind": "Object", "isCircular": true, "summary": "Circular: "}
        });
        let property: PropertyDescription = serde_json::from_value(json).unwrap();
        let nested = property.value.as_description().unwrap();
        assert!(nested.is_circular);
        assert!(property.overridden_by.is_empty());

        let primitive: PropertyValue = serde_json::from_value(json!("42")).unwrap();
        assert_eq!(primitive.as_primitive(), Some("42"));
    }
}
