//! Typed view of a JSON-LD graph node.
//!
//! The API returns nodes as objects keyed by fully-qualified vocabulary URIs.
//! Rather than poking into raw `serde_json::Value` and getting `None` back on
//! typos, a [`Node`] classifies each property value up front and fails with a
//! typed error on missing keys or malformed references.

use crate::error::{KgError, Result};
use serde_json::{Map, Value};

/// Namespace prefixed to short property names to form node keys.
pub const VOCAB_NAMESPACE: &str = "https://openminds.ebrains.eu/vocab/";

/// Build a fully-qualified node key from a short property name.
pub fn vocab_key(name: &str) -> String {
    format!("{}{}", VOCAB_NAMESPACE, name)
}

/// A single property value on a node.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// A scalar JSON value (string, number, bool, null).
    Scalar(Value),
    /// A link to another node, wire form `{"@id": <URI>}`.
    Reference { id: String },
    /// A nested node embedded inline.
    Node(Node),
    /// An ordered list of values.
    List(Vec<PropertyValue>),
}

impl PropertyValue {
    fn from_value(value: Value) -> PropertyValue {
        match value {
            Value::Object(map) => {
                // An object whose only key is @id is a reference stub
                if map.len() == 1 {
                    if let Some(Value::String(id)) = map.get("@id") {
                        return PropertyValue::Reference { id: id.clone() };
                    }
                }
                PropertyValue::Node(Node::from_map(map))
            }
            Value::Array(items) => {
                PropertyValue::List(items.into_iter().map(PropertyValue::from_value).collect())
            }
            other => PropertyValue::Scalar(other),
        }
    }

    fn to_value(&self) -> Value {
        match self {
            PropertyValue::Scalar(v) => v.clone(),
            PropertyValue::Reference { id } => {
                let mut map = Map::new();
                map.insert("@id".to_string(), Value::String(id.clone()));
                Value::Object(map)
            }
            PropertyValue::Node(node) => node.to_value(),
            PropertyValue::List(items) => {
                Value::Array(items.iter().map(PropertyValue::to_value).collect())
            }
        }
    }
}

/// A graph node: an ordered mapping from property-URI keys to values.
///
/// Insertion order is preserved so a node round-trips through display in the
/// order the API returned it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Node {
    properties: Vec<(String, PropertyValue)>,
}

impl Node {
    /// Convert a deserialized API payload into a typed node.
    /// Fails unless the payload is a JSON object.
    pub fn from_value(value: Value) -> Result<Node> {
        match value {
            Value::Object(map) => Ok(Node::from_map(map)),
            other => Err(KgError::InvalidReference(format!(
                "expected a JSON object node, got {}",
                type_name(&other)
            ))),
        }
    }

    fn from_map(map: Map<String, Value>) -> Node {
        Node {
            properties: map
                .into_iter()
                .map(|(k, v)| (k, PropertyValue::from_value(v)))
                .collect(),
        }
    }

    /// Convert back to a plain JSON value for display.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        for (key, value) in &self.properties {
            map.insert(key.clone(), value.to_value());
        }
        Value::Object(map)
    }

    /// Look up a property by its fully-qualified key.
    pub fn get(&self, key: &str) -> Result<&PropertyValue> {
        self.properties
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
            .ok_or_else(|| KgError::MissingProperty(key.to_string()))
    }

    /// Extract the identifier from a reference-valued property.
    ///
    /// The identifier is the last path segment of the reference URI,
    /// e.g. `https://kg.example.org/api/instances/abcd-1234` -> `abcd-1234`.
    pub fn reference_id(&self, key: &str) -> Result<String> {
        match self.get(key)? {
            PropertyValue::Reference { id } => {
                let segment = id.rsplit('/').next().filter(|s| !s.is_empty());
                match segment {
                    Some(s) => Ok(s.to_string()),
                    None => Err(KgError::InvalidReference(format!(
                        "reference URI at {} has no identifier segment: {}",
                        key, id
                    ))),
                }
            }
            other => Err(KgError::InvalidReference(format!(
                "property {} is not a reference: {:?}",
                key, other
            ))),
        }
    }

    /// Replace (or add) a property value in place.
    pub fn insert(&mut self, key: String, value: PropertyValue) {
        if let Some(entry) = self.properties.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = value;
        } else {
            self.properties.push((key, value));
        }
    }

    /// Iterate properties in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
