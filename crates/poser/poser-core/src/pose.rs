//! Pose records: what drives a pose and which bones it plays its action on.

use poser_rig_core::{ChannelRotationMode, MixMode, TransformChannel, TransformSpace};
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PoseType {
    /// Driven directly by one bone channel or scene property.
    #[default]
    Simple,
    /// Gated by two other poses.
    Combo,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetType {
    #[default]
    BoneTransform,
    SceneProperty,
}

/// One output bone of a pose and the influence its constraint gets.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoseBoneEntry {
    pub bone: String,
    pub influence: f32,
}

impl Default for PoseBoneEntry {
    fn default() -> Self {
        Self {
            bone: String::new(),
            influence: 1.0,
        }
    }
}

impl PoseBoneEntry {
    pub fn new(bone: impl Into<String>) -> Self {
        Self {
            bone: bone.into(),
            ..Default::default()
        }
    }

    pub fn with_influence(bone: impl Into<String>, influence: f32) -> Self {
        Self {
            bone: bone.into(),
            influence,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pose {
    pub name: String,
    /// When false the pose is left out of a full compile.
    pub build: bool,
    #[serde(rename = "type")]
    pub pose_type: PoseType,
    pub target_type: TargetType,

    // driving reference (simple poses)
    pub target: Option<String>,
    pub bone: String,
    pub data_path: String,
    pub channel: TransformChannel,
    pub space: TransformSpace,
    pub rot_mode: ChannelRotationMode,
    pub transform_min: f32,
    pub transform_max: f32,

    // combo references
    pub corr_pose_a: String,
    pub corr_pose_b: String,

    pub action: Option<String>,
    pub start_frame: i32,
    pub end_frame: i32,
    pub mix: MixMode,

    /// Written by the compiled influence driver; never authored.
    pub influence: f32,
    pub bones: Vec<PoseBoneEntry>,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            name: String::new(),
            build: true,
            pose_type: PoseType::Simple,
            target_type: TargetType::BoneTransform,
            target: None,
            bone: String::new(),
            data_path: String::new(),
            channel: TransformChannel::LocX,
            space: TransformSpace::Local,
            rot_mode: ChannelRotationMode::Auto,
            transform_min: 0.0,
            transform_max: 1.0,
            corr_pose_a: String::new(),
            corr_pose_b: String::new(),
            action: None,
            start_frame: 0,
            end_frame: 10,
            mix: MixMode::BeforeFull,
            influence: 0.0,
            bones: Vec::new(),
        }
    }
}

impl Pose {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// A simple pose driven by `channel` of `bone` on `target`.
    pub fn bone_driven(
        name: impl Into<String>,
        target: impl Into<String>,
        bone: impl Into<String>,
        channel: TransformChannel,
    ) -> Self {
        Self {
            target: Some(target.into()),
            bone: bone.into(),
            channel,
            ..Self::new(name)
        }
    }

    /// A simple pose driven by the property at `data_path` on `target`.
    pub fn property_driven(
        name: impl Into<String>,
        target: impl Into<String>,
        data_path: impl Into<String>,
    ) -> Self {
        Self {
            target_type: TargetType::SceneProperty,
            target: Some(target.into()),
            data_path: data_path.into(),
            ..Self::new(name)
        }
    }

    /// A combo pose gated by poses `a` and `b`.
    pub fn combo(name: impl Into<String>, a: impl Into<String>, b: impl Into<String>) -> Self {
        Self {
            pose_type: PoseType::Combo,
            corr_pose_a: a.into(),
            corr_pose_b: b.into(),
            ..Self::new(name)
        }
    }

    pub fn with_range(mut self, min: f32, max: f32) -> Self {
        self.transform_min = min;
        self.transform_max = max;
        self
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn with_bones<I, S>(mut self, bones: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.bones = bones.into_iter().map(PoseBoneEntry::new).collect();
        self
    }

    pub fn is_combo(&self) -> bool {
        self.pose_type == PoseType::Combo
    }

    pub fn has_bone_entry(&self, bone: &str) -> bool {
        self.bones.iter().any(|b| b.bone == bone)
    }

    /// Copy of every authored field and bone entry. The compiled influence
    /// is not carried over.
    pub fn duplicate(&self) -> Pose {
        Pose {
            influence: 0.0,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_host_property_defaults() {
        let p = Pose::default();
        assert!(p.build);
        assert_eq!((p.transform_min, p.transform_max), (0.0, 1.0));
        assert_eq!((p.start_frame, p.end_frame), (0, 10));
        assert_eq!(PoseBoneEntry::default().influence, 1.0);
    }

    #[test]
    fn serde_uses_type_tag_and_defaults() {
        let p: Pose = serde_json::from_str(
            r#"{ "name": "Both", "type": "COMBO", "corr_pose_a": "A", "corr_pose_b": "B" }"#,
        )
        .unwrap();
        assert!(p.is_combo());
        assert!(p.build);
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["type"], "COMBO");
        assert_eq!(json["channel"], "LOC_X");
    }

    #[test]
    fn duplicate_drops_influence() {
        let mut p = Pose::bone_driven("Smile", "Rig", "Mouth", TransformChannel::LocY)
            .with_bones(["Lip.L", "Lip.R"]);
        p.influence = 0.7;
        let d = p.duplicate();
        assert_eq!(d.influence, 0.0);
        assert_eq!(d.bones, p.bones);
        assert_eq!(d.target, p.target);
    }
}
