//! poser-api-core: values, property paths and rotation math shared by the rig
//! document model and the pose compiler (engine-agnostic).

pub mod coercion;
pub mod property_path;
pub mod rotation;
pub mod value;

pub use property_path::{PathSegment, PropertyPath, PropertySource};
pub use rotation::{EulerOrder, RotationMode};
pub use value::{Value, ValueKind};
