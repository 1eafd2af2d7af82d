//! Structural validity of a pose, checked before it is compiled.

use std::fmt;

use poser_api_core::PropertyPath;
use poser_rig_core::Scene;

use crate::pose::{Pose, PoseType, TargetType};

/// Why a pose cannot be compiled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Invalid {
    MissingName,
    MissingTarget,
    TargetNotFound(String),
    MissingBone,
    UnresolvedPath(String),
}

impl fmt::Display for Invalid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Invalid::MissingName => f.write_str("pose has no name"),
            Invalid::MissingTarget => f.write_str("pose has no target"),
            Invalid::TargetNotFound(t) => write!(f, "target '{t}' does not exist"),
            Invalid::MissingBone => f.write_str("pose has no target bone"),
            Invalid::UnresolvedPath(e) => write!(f, "property path does not resolve: {e}"),
        }
    }
}

/// Check `pose` against the document.
///
/// Combo poses only need a name; their references are resolved at compile
/// time. Property-driven poses must have a path that reads successfully
/// from the target.
pub fn validate(pose: &Pose, scene: &Scene) -> Result<(), Invalid> {
    if pose.name.is_empty() {
        return Err(Invalid::MissingName);
    }
    if pose.pose_type == PoseType::Combo {
        return Ok(());
    }
    let target = match pose.target.as_deref() {
        Some(t) if !t.is_empty() => t,
        _ => return Err(Invalid::MissingTarget),
    };
    let object = scene
        .object(target)
        .map_err(|_| Invalid::TargetNotFound(target.to_string()))?;
    match pose.target_type {
        TargetType::BoneTransform if pose.bone.is_empty() => Err(Invalid::MissingBone),
        TargetType::BoneTransform => Ok(()),
        TargetType::SceneProperty => PropertyPath::parse(&pose.data_path)
            .and_then(|path| path.resolve(object))
            .map(|_| ())
            .map_err(Invalid::UnresolvedPath),
    }
}

pub fn is_valid(pose: &Pose, scene: &Scene) -> bool {
    validate(pose, scene).is_ok()
}
