//! Coercion helpers used when a driver variable reads a property.
//! Drivers only consume scalars, so everything collapses to f32.

use crate::Value;

/// Attempt to coerce a Value into a scalar f32.
/// Rules:
/// - Float -> its value
/// - Int -> cast
/// - Bool -> 1.0 / 0.0
/// - Vec3/Quat/Vector -> not a scalar (a component must be addressed)
/// - Text/Record/List -> not a scalar
pub fn to_float(v: &Value) -> Option<f32> {
    match v {
        Value::Float(f) => Some(*f),
        Value::Int(i) => Some(*i as f32),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

/// Convert a Value into a Vec<f32>.
/// - Vec3/Quat -> components
/// - scalar kinds -> single-element vec
/// - List -> flattened scalar items
/// - Text/Record -> empty
pub fn to_vector(v: &Value) -> Vec<f32> {
    match v {
        Value::Vec3(a) => a.to_vec(),
        Value::Quat(a) => a.to_vec(),
        Value::Vector(vec) => vec.clone(),
        Value::List(items) => items.iter().flat_map(to_vector).collect(),
        Value::Text(_) | Value::Record(_) => Vec::new(),
        other => to_float(other).into_iter().collect(),
    }
}
