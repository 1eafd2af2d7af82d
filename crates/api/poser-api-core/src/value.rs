//! Value: property readings produced by a host document.
//! All numeric types use f32, matching the host's float properties.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

/// Coarse kind of a [`Value`], handy for dispatch and error messages.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ValueKind {
    Float,
    Int,
    Bool,
    Vec3,
    Quat,
    Vector,
    Text,
    Record,
    List,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum Value {
    /// Scalar float
    Float(f32),

    /// Integer property (frame numbers, indices)
    Int(i64),

    /// Boolean flag
    Bool(bool),

    /// 3D vector (location, euler rotation, scale)
    Vec3([f32; 3]),

    /// Quaternion stored host-style as (w, x, y, z)
    Quat([f32; 4]),

    /// Generic, variable-length numeric vector
    Vector(Vec<f32>),

    /// Text / enum identifiers
    Text(String),

    /// Named fields or keyed collection items
    Record(HashMap<String, Value>),

    /// Ordered collection
    List(Vec<Value>),
}

impl Value {
    /// Return the coarse kind of this value.
    #[inline]
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Float(_) => ValueKind::Float,
            Value::Int(_) => ValueKind::Int,
            Value::Bool(_) => ValueKind::Bool,
            Value::Vec3(_) => ValueKind::Vec3,
            Value::Quat(_) => ValueKind::Quat,
            Value::Vector(_) => ValueKind::Vector,
            Value::Text(_) => ValueKind::Text,
            Value::Record(_) => ValueKind::Record,
            Value::List(_) => ValueKind::List,
        }
    }

    /// Convenience constructors
    pub fn f(v: f32) -> Self {
        Value::Float(v)
    }

    pub fn vec3(x: f32, y: f32, z: f32) -> Self {
        Value::Vec3([x, y, z])
    }

    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    /// Build a record from `(name, value)` pairs.
    pub fn record<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Value::Record(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Component `index` of a vector-like value, as a scalar value.
    pub fn component(&self, index: usize) -> Option<Value> {
        match self {
            Value::Vec3(a) => a.get(index).copied().map(Value::Float),
            Value::Quat(a) => a.get(index).copied().map(Value::Float),
            Value::Vector(v) => v.get(index).copied().map(Value::Float),
            Value::List(items) => items.get(index).cloned(),
            _ => None,
        }
    }

    /// Field or key lookup on a record.
    pub fn member(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Record(map) => map.get(name),
            _ => None,
        }
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}
