//! poser-rig-core: the host document the action poser compiles into.
//!
//! The document is a plain data store: objects with armatures, pose bones
//! carrying local transforms and action constraints, actions with fcurves,
//! and drivers whose scripted expressions can be evaluated live. Everything
//! round-trips through serde so a host can persist it natively.

pub mod action;
pub mod constraint;
pub mod driver;
pub mod error;
pub mod expr;
pub mod object;
pub mod scene;
pub mod transform;

pub use action::{Action, FCurve, Keyframe};
pub use constraint::{ActionConstraint, MixMode};
pub use driver::{
    AnimationData, ChannelKind, ChannelRotationMode, Driver, DriverOutput, DriverVariable,
    TransformChannel, TransformSpace, VariableSource,
};
pub use error::RigError;
pub use expr::Expr;
pub use object::{Armature, Object, ObjectKind, PoseBone};
pub use scene::{unique_name, HostMode, Scene, ToolSettings};
pub use transform::{BoneTransform, Trs};

pub use poser_api_core::{PathSegment, PropertyPath, RotationMode, Value};
