//! The ordered pose collection owned by a rig, with its selection indices.

use poser_rig_core::{unique_name, Scene};
use serde::{Deserialize, Serialize};

use crate::config::Preferences;
use crate::error::PoserError;
use crate::pose::{Pose, PoseBoneEntry};
use crate::suffix::{
    find_opposite_action, find_opposite_bone, find_opposite_object, find_opposite_pose,
    swap_suffix,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MoveDirection {
    Up,
    Down,
    Top,
    Bottom,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CopyMode {
    #[default]
    All,
    Active,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoseLibrary {
    pub poses: Vec<Pose>,
    /// Selected pose. Stays inside `0..len` while the list is non-empty.
    pub index: usize,
    /// Selected entry in the active pose's bone list.
    pub bones_index: usize,
}

impl PoseLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.poses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Pose> {
        self.poses.iter()
    }

    pub fn find(&self, name: &str) -> Option<&Pose> {
        self.poses.iter().find(|p| p.name == name)
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut Pose> {
        self.poses.iter_mut().find(|p| p.name == name)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.poses.iter().position(|p| p.name == name)
    }

    pub fn get(&self, index: usize) -> Result<&Pose, PoserError> {
        let len = self.poses.len();
        self.poses
            .get(index)
            .ok_or(PoserError::PoseIndex { index, len })
    }

    pub fn get_mut(&mut self, index: usize) -> Result<&mut Pose, PoserError> {
        let len = self.poses.len();
        self.poses
            .get_mut(index)
            .ok_or(PoserError::PoseIndex { index, len })
    }

    pub fn active(&self) -> Option<&Pose> {
        self.poses.get(self.index)
    }

    fn unique_pose_name(&self, base: &str) -> String {
        unique_name(base, |n| self.find(n).is_some())
    }

    /// Append a pose, uniquifying its name. Selects it and returns its index.
    pub fn push(&mut self, mut pose: Pose) -> usize {
        pose.name = self.unique_pose_name(&pose.name);
        self.poses.push(pose);
        self.index = self.poses.len() - 1;
        self.index
    }

    /// Append an empty pose named after the default name.
    pub fn add(&mut self, prefs: &Preferences) -> usize {
        self.push(Pose::new(prefs.default_name.clone()))
    }

    /// Remove the pose at `index`. The selection moves to the previous pose,
    /// or stays at 0 when the first pose is removed.
    pub fn remove(&mut self, index: usize) -> Result<Pose, PoserError> {
        self.get(index)?;
        let removed = self.poses.remove(index);
        self.index = index.saturating_sub(1).min(self.poses.len().saturating_sub(1));
        Ok(removed)
    }

    pub fn clear(&mut self) {
        self.poses.clear();
        self.index = 0;
        self.bones_index = 0;
    }

    fn insert_after(&mut self, index: usize, pose: Pose) -> usize {
        let at = index + 1;
        self.poses.insert(at, pose);
        self.index = at;
        at
    }

    /// Insert a copy of the pose at `index` right after it. The action is
    /// shared, not copied.
    pub fn duplicate(&mut self, index: usize) -> Result<usize, PoserError> {
        let mut copy = self.get(index)?.duplicate();
        copy.name = self.unique_pose_name(&copy.name);
        Ok(self.insert_after(index, copy))
    }

    /// Insert an opposite-side copy of the pose at `index` right after it.
    ///
    /// The name is side-swapped. Target object, driving bone, action, output
    /// bones and combo references are swapped when an opposite counterpart
    /// exists and kept otherwise.
    pub fn mirror(
        &mut self,
        index: usize,
        scene: &Scene,
        rig: &str,
        prefs: &Preferences,
    ) -> Result<usize, PoserError> {
        let source = self.get(index)?;
        let mut pose = source.duplicate();

        pose.name = self.unique_pose_name(&swap_suffix(&source.name, prefs));

        if let Some(target) = pose
            .target
            .as_deref()
            .and_then(|t| find_opposite_object(scene, t, prefs))
        {
            pose.target = Some(target);
        }
        let bone_owner = match pose.target.as_deref() {
            Some(t) if scene.armature(t).is_ok() => t.to_string(),
            _ => rig.to_string(),
        };
        if let Some(bone) = find_opposite_bone(scene, &bone_owner, &pose.bone, prefs) {
            pose.bone = bone;
        }
        if let Some(action) = pose
            .action
            .as_deref()
            .and_then(|a| find_opposite_action(scene, a, prefs))
        {
            pose.action = Some(action);
        }
        pose.bones = source
            .bones
            .iter()
            .map(|entry| PoseBoneEntry {
                bone: find_opposite_bone(scene, rig, &entry.bone, prefs)
                    .unwrap_or_else(|| entry.bone.clone()),
                influence: entry.influence,
            })
            .collect();
        if let Some(a) = find_opposite_pose(self, &source.corr_pose_a, prefs) {
            pose.corr_pose_a = a;
        }
        if let Some(b) = find_opposite_pose(self, &source.corr_pose_b, prefs) {
            pose.corr_pose_b = b;
        }

        Ok(self.insert_after(index, pose))
    }

    /// Move the selected pose. Moves past either end are ignored.
    pub fn move_active(&mut self, direction: MoveDirection) {
        let idx = self.index;
        let last = match self.poses.len() {
            0 => return,
            n => n - 1,
        };
        if idx > last {
            return;
        }
        let to = match direction {
            MoveDirection::Up if idx >= 1 => idx - 1,
            MoveDirection::Down if idx < last => idx + 1,
            MoveDirection::Top if idx >= 1 => 0,
            MoveDirection::Bottom if idx < last => last,
            _ => return,
        };
        let pose = self.poses.remove(idx);
        self.poses.insert(to, pose);
        self.index = to;
    }

    /// Append copies of this library's poses (all, or the selected one) to `target`.
    /// Returns how many poses were copied.
    pub fn copy_to(&self, target: &mut PoseLibrary, mode: CopyMode) -> usize {
        let poses: Vec<&Pose> = match mode {
            CopyMode::All => self.poses.iter().collect(),
            CopyMode::Active => self.active().into_iter().collect(),
        };
        for pose in &poses {
            target.push((*pose).clone());
        }
        poses.len()
    }

    /// Every pose referring to `action` drops the reference.
    pub fn clear_action_refs(&mut self, action: &str) {
        for pose in &mut self.poses {
            if pose.action.as_deref() == Some(action) {
                pose.action = None;
            }
        }
    }

    /// Every pose referring to `old` refers to `new` instead.
    pub fn rename_action_refs(&mut self, old: &str, new: &str) {
        for pose in &mut self.poses {
            if pose.action.as_deref() == Some(old) {
                pose.action = Some(new.to_string());
            }
        }
    }
}
