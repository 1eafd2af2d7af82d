//! Flattening of a pose's dependency graph into driver variables.
//!
//! A simple pose contributes one variable. A combo pose contributes the
//! variables of `corr_pose_a` followed by those of `corr_pose_b`, recursively,
//! so the driving set of a combo is every simple pose reachable from it.

use indexmap::IndexMap;
use poser_api_core::PropertyPath;
use poser_rig_core::{ChannelRotationMode, TransformChannel, TransformSpace};

use crate::error::PoserError;
use crate::library::PoseLibrary;
use crate::pose::{Pose, PoseType, TargetType};

/// The live value a variable reads.
#[derive(Clone, Debug, PartialEq)]
pub enum VariableInput {
    Bone {
        bone: String,
        channel: TransformChannel,
        space: TransformSpace,
        /// Only set for rotation channels.
        rotation_mode: Option<ChannelRotationMode>,
    },
    Property {
        path: PropertyPath,
    },
}

/// One flattened driving input with the range it is normalized over.
#[derive(Clone, Debug, PartialEq)]
pub struct VariableDescriptor {
    /// Name of the simple pose this variable came from.
    pub pose: String,
    pub target: String,
    pub input: VariableInput,
    pub min: f32,
    pub max: f32,
}

impl VariableDescriptor {
    pub fn is_rotation(&self) -> bool {
        matches!(&self.input, VariableInput::Bone { channel, .. } if channel.is_rotation())
    }
}

/// Variable name -> descriptor, in collection order.
pub type VariableMap = IndexMap<String, VariableDescriptor>;

/// Collect the driving variables of `pose`, named `var0`, `var1`, ...
///
/// Unresolved combo references (empty or naming no pose) and simple poses
/// without a usable target are skipped. A combo that reaches itself fails
/// with [`PoserError::ComboCycle`].
pub fn collect(pose: &Pose, library: &PoseLibrary) -> Result<VariableMap, PoserError> {
    let mut vars = VariableMap::new();
    let mut path = Vec::new();
    walk(pose, library, &mut path, &mut vars)?;
    Ok(vars)
}

fn walk<'a>(
    pose: &'a Pose,
    library: &'a PoseLibrary,
    path: &mut Vec<&'a str>,
    vars: &mut VariableMap,
) -> Result<(), PoserError> {
    match pose.pose_type {
        PoseType::Simple => {
            if let Some(descriptor) = describe(pose) {
                vars.insert(format!("var{}", vars.len()), descriptor);
            }
            Ok(())
        }
        PoseType::Combo => {
            if path.contains(&pose.name.as_str()) {
                let mut chain: Vec<String> = path.iter().map(|s| s.to_string()).collect();
                chain.push(pose.name.clone());
                return Err(PoserError::ComboCycle(chain));
            }
            path.push(&pose.name);
            for reference in [&pose.corr_pose_a, &pose.corr_pose_b] {
                match library.find(reference) {
                    Some(next) if !reference.is_empty() => walk(next, library, path, vars)?,
                    _ => log::debug!(
                        "combo '{}': reference '{}' does not resolve, skipped",
                        pose.name,
                        reference
                    ),
                }
            }
            path.pop();
            Ok(())
        }
    }
}

fn describe(pose: &Pose) -> Option<VariableDescriptor> {
    let target = match pose.target.as_deref() {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => {
            log::debug!("pose '{}' has no target, no variable collected", pose.name);
            return None;
        }
    };
    let input = match pose.target_type {
        TargetType::BoneTransform => VariableInput::Bone {
            bone: pose.bone.clone(),
            channel: pose.channel,
            space: pose.space,
            rotation_mode: pose.channel.is_rotation().then_some(pose.rot_mode),
        },
        TargetType::SceneProperty => match PropertyPath::parse(&pose.data_path) {
            Ok(path) => VariableInput::Property { path },
            Err(err) => {
                log::debug!("pose '{}' has an unusable path: {err}", pose.name);
                return None;
            }
        },
    };
    Some(VariableDescriptor {
        pose: pose.name.clone(),
        target,
        input,
        min: pose.transform_min,
        max: pose.transform_max,
    })
}
