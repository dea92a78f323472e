//! Entity identity: type plus ordered identifier values.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::Value;

/// One identifier component. Restricted to the storage classes that hash
/// and order exactly, so keys can index the reconstruction cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyValue {
    Integer(i64),
    Text(String),
    Blob(Vec<u8>),
}

impl KeyValue {
    /// Narrow a column value into a key component. `None` for values that
    /// cannot identify a row (null, real, json).
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Integer(i) => Some(KeyValue::Integer(*i)),
            Value::Boolean(b) => Some(KeyValue::Integer(i64::from(*b))),
            Value::Text(s) => Some(KeyValue::Text(s.clone())),
            Value::DateTime(dt) => Some(KeyValue::Text(dt.to_rfc3339())),
            Value::Blob(b) => Some(KeyValue::Blob(b.clone())),
            Value::Null | Value::Real(_) | Value::Json(_) => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            KeyValue::Integer(i) => Value::Integer(*i),
            KeyValue::Text(s) => Value::Text(s.clone()),
            KeyValue::Blob(b) => Value::Blob(b.clone()),
        }
    }
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyValue::Integer(i) => write!(f, "{i}"),
            KeyValue::Text(s) => f.write_str(s),
            KeyValue::Blob(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

impl From<i64> for KeyValue {
    fn from(v: i64) -> Self {
        KeyValue::Integer(v)
    }
}

impl From<&str> for KeyValue {
    fn from(v: &str) -> Self {
        KeyValue::Text(v.to_string())
    }
}

impl From<String> for KeyValue {
    fn from(v: String) -> Self {
        KeyValue::Text(v)
    }
}

/// `(type, identifier values)` in the declared identifier order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityKey {
    pub entity_type: String,
    pub values: Vec<KeyValue>,
}

impl EntityKey {
    pub fn new(entity_type: impl Into<String>, values: Vec<KeyValue>) -> Self {
        Self {
            entity_type: entity_type.into(),
            values,
        }
    }

    /// Key for a type with a single identifier field.
    pub fn single(entity_type: impl Into<String>, value: impl Into<KeyValue>) -> Self {
        Self::new(entity_type, vec![value.into()])
    }

    /// Same identifier values under another type (subtype re-dispatch).
    pub fn retyped(&self, entity_type: impl Into<String>) -> Self {
        Self::new(entity_type, self.values.clone())
    }

    /// The identifier rendered for error messages, e.g. `1` or `1:en`.
    pub fn id_string(&self) -> String {
        self.values
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(":")
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.entity_type, self.id_string())
    }
}

/// Identifier values as passed to lookups: a single scalar or, for
/// composite identifiers, the values in declared order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier(pub Vec<KeyValue>);

impl Identifier {
    pub fn values(&self) -> &[KeyValue] {
        &self.0
    }

    pub fn into_key(self, entity_type: impl Into<String>) -> EntityKey {
        EntityKey::new(entity_type, self.0)
    }
}

impl From<i64> for Identifier {
    fn from(v: i64) -> Self {
        Identifier(vec![KeyValue::Integer(v)])
    }
}

impl From<&str> for Identifier {
    fn from(v: &str) -> Self {
        Identifier(vec![KeyValue::from(v)])
    }
}

impl From<String> for Identifier {
    fn from(v: String) -> Self {
        Identifier(vec![KeyValue::Text(v)])
    }
}

impl From<KeyValue> for Identifier {
    fn from(v: KeyValue) -> Self {
        Identifier(vec![v])
    }
}

impl From<Vec<KeyValue>> for Identifier {
    fn from(v: Vec<KeyValue>) -> Self {
        Identifier(v)
    }
}

impl From<&EntityKey> for Identifier {
    fn from(key: &EntityKey) -> Self {
        Identifier(key.values.clone())
    }
}
