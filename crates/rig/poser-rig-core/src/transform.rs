//! Local bone/object transforms and simple TRS composition for world-space reads.

use poser_api_core::rotation::{euler_to_quat, quat_mul, quat_normalize, quat_rotate, QUAT_IDENTITY};
use poser_api_core::RotationMode;
use serde::{Deserialize, Serialize};

/// Authored local transform. Both rotation representations are stored; the
/// `rotation_mode` decides which one is live.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoneTransform {
    pub location: [f32; 3],
    pub rotation_euler: [f32; 3],
    /// (w, x, y, z)
    pub rotation_quaternion: [f32; 4],
    pub rotation_mode: RotationMode,
    pub scale: [f32; 3],
}

impl Default for BoneTransform {
    fn default() -> Self {
        Self {
            location: [0.0; 3],
            rotation_euler: [0.0; 3],
            rotation_quaternion: QUAT_IDENTITY,
            rotation_mode: RotationMode::Quaternion,
            scale: [1.0; 3],
        }
    }
}

impl BoneTransform {
    /// Reset location, both rotations and scale to identity. The rotation mode is kept.
    pub fn reset(&mut self) {
        self.location = [0.0; 3];
        self.rotation_euler = [0.0; 3];
        self.rotation_quaternion = QUAT_IDENTITY;
        self.scale = [1.0; 3];
    }

    pub fn is_identity(&self) -> bool {
        self.location == [0.0; 3]
            && self.rotation_euler == [0.0; 3]
            && self.rotation_quaternion == QUAT_IDENTITY
            && self.scale == [1.0; 3]
    }

    /// The live rotation as a unit quaternion.
    pub fn rotation_quat(&self) -> [f32; 4] {
        match self.rotation_mode.euler_order() {
            Some(order) => euler_to_quat(self.rotation_euler, order),
            None => quat_normalize(self.rotation_quaternion),
        }
    }

    pub fn to_trs(&self) -> Trs {
        Trs {
            translation: self.location,
            rotation: self.rotation_quat(),
            scale: self.scale,
        }
    }
}

/// Translation / rotation / scale triple. Composition ignores shear.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Trs {
    pub translation: [f32; 3],
    pub rotation: [f32; 4],
    pub scale: [f32; 3],
}

impl Default for Trs {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Trs {
    pub const IDENTITY: Trs = Trs {
        translation: [0.0; 3],
        rotation: QUAT_IDENTITY,
        scale: [1.0; 3],
    };

    pub fn from_translation(translation: [f32; 3]) -> Self {
        Trs {
            translation,
            ..Trs::IDENTITY
        }
    }

    /// `self` applied after `child` (parent space <- child space).
    pub fn compose(&self, child: &Trs) -> Trs {
        let scaled = [
            self.scale[0] * child.translation[0],
            self.scale[1] * child.translation[1],
            self.scale[2] * child.translation[2],
        ];
        let moved = quat_rotate(self.rotation, scaled);
        Trs {
            translation: [
                self.translation[0] + moved[0],
                self.translation[1] + moved[1],
                self.translation[2] + moved[2],
            ],
            rotation: quat_normalize(quat_mul(self.rotation, child.rotation)),
            scale: [
                self.scale[0] * child.scale[0],
                self.scale[1] * child.scale[1],
                self.scale[2] * child.scale[2],
            ],
        }
    }
}
