//! Action edit: an isolated mode for hand-posing a pose's action.
//!
//! Entering snapshots the rig state, clears every bone to rest, makes the
//! pose's action active, turns auto-key on and suspends the compiled network.
//! For combo poses every simple pose reachable through the combo references
//! gets a temporary full-weight constraint so the combined motion is visible.
//! Leaving restores the snapshot exactly and removes the temporary constraints.

use std::collections::VecDeque;

use indexmap::IndexMap;
use poser_rig_core::{BoneTransform, HostMode};
use serde::{Deserialize, Serialize};

use crate::compile::place_constraints;
use crate::error::PoserError;
use crate::library::PoseLibrary;
use crate::naming::{constraint_in_path, is_temp_constraint, temp_constraint_name};
use crate::pose::Pose;
use crate::purge::{disable, enable};
use crate::report::Report;
use crate::RigContext;

/// Rig state captured on entering action edit.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditSnapshot {
    /// Pose being edited.
    pub pose: String,
    pub active_object: Option<String>,
    pub active_action: Option<String>,
    pub selected_bones: Vec<String>,
    pub active_bone: Option<String>,
    pub bone_transforms: IndexMap<String, BoneTransform>,
    pub autokey: bool,
}

/// The single action-edit slot of a rig.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "snapshot", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EditSession {
    #[default]
    Idle,
    Editing(EditSnapshot),
}

impl EditSession {
    pub fn is_editing(&self) -> bool {
        matches!(self, EditSession::Editing(_))
    }

    pub fn snapshot(&self) -> Option<&EditSnapshot> {
        match self {
            EditSession::Editing(s) => Some(s),
            EditSession::Idle => None,
        }
    }

    /// Name of the pose being edited.
    pub fn editing_pose(&self) -> Option<&str> {
        self.snapshot().map(|s| s.pose.as_str())
    }
}

/// Simple poses reachable from a combo, breadth-first through
/// `corr_pose_a` then `corr_pose_b`. Each pose appears once.
pub fn nested_simple_poses<'a>(
    pose: &'a Pose,
    library: &'a PoseLibrary,
) -> Result<Vec<&'a Pose>, PoserError> {
    let mut out: Vec<&Pose> = Vec::new();
    let mut queue: VecDeque<(&str, Vec<&str>)> = VecDeque::new();
    let root_path = vec![pose.name.as_str()];
    queue.push_back((pose.corr_pose_a.as_str(), root_path.clone()));
    queue.push_back((pose.corr_pose_b.as_str(), root_path));

    while let Some((name, ancestors)) = queue.pop_front() {
        if ancestors.contains(&name) {
            let mut chain: Vec<String> = ancestors.iter().map(|s| s.to_string()).collect();
            chain.push(name.to_string());
            return Err(PoserError::ComboCycle(chain));
        }
        let Some(next) = library.find(name).filter(|_| !name.is_empty()) else {
            log::debug!("combo reference '{name}' does not resolve, skipped");
            continue;
        };
        if next.is_combo() {
            let mut path = ancestors.clone();
            path.push(next.name.as_str());
            queue.push_back((next.corr_pose_a.as_str(), path.clone()));
            queue.push_back((next.corr_pose_b.as_str(), path));
        } else if !out.iter().any(|p| p.name == next.name) {
            out.push(next);
        }
    }
    Ok(out)
}

/// Enter action edit for the pose at `index`.
///
/// A failed action assignment is reported and the edit still proceeds.
pub fn enter_edit(
    ctx: &mut RigContext<'_>,
    library: &PoseLibrary,
    session: &mut EditSession,
    index: usize,
) -> Result<Report, PoserError> {
    if session.is_editing() {
        return Err(PoserError::AlreadyEditing);
    }
    let pose = library.get(index)?;
    let nested = if pose.is_combo() {
        nested_simple_poses(pose, library)?
    } else {
        Vec::new()
    };
    let mut report = Report::new();

    let rig_object = ctx.scene.object(ctx.rig)?;
    let armature = ctx.armature()?;
    let snapshot = EditSnapshot {
        pose: pose.name.clone(),
        active_object: ctx.scene.active_object.clone(),
        active_action: rig_object.active_action().map(str::to_string),
        selected_bones: armature.selected_bones(),
        active_bone: armature.active_bone.clone(),
        bone_transforms: armature
            .bones
            .iter()
            .map(|(name, bone)| (name.clone(), bone.transform.clone()))
            .collect(),
        autokey: ctx.scene.tool_settings.use_keyframe_insert_auto,
    };

    for bone in ctx.armature_mut()?.bones.values_mut() {
        bone.transform.reset();
    }

    if let Err(err) = ctx.scene.assign_action(ctx.rig, pose.action.as_deref()) {
        report.error(format!(
            "action couldn't be assigned: {}",
            pose.action.as_deref().unwrap_or_default()
        ));
        log::warn!("{err}");
    }

    ctx.scene.tool_settings.use_keyframe_insert_auto = true;
    disable(ctx)?;

    for nested_pose in nested {
        let name = temp_constraint_name(ctx.prefs, &nested_pose.name);
        place_constraints(ctx, nested_pose, &name, 1.0, &mut report)?;
    }

    *session = EditSession::Editing(snapshot);
    report.info(format!("action edit engaged for '{}'", pose.name));
    Ok(report)
}

/// Leave action edit and restore the snapshot taken on entry.
///
/// An active object or action that can't be restored is reported and the
/// rest of the snapshot is still applied.
pub fn leave_edit(
    ctx: &mut RigContext<'_>,
    session: &mut EditSession,
) -> Result<Report, PoserError> {
    let snapshot = match std::mem::take(session) {
        EditSession::Editing(snapshot) => snapshot,
        EditSession::Idle => return Err(PoserError::NotEditing),
    };
    let mut report = Report::new();
    ctx.scene.tool_settings.use_keyframe_insert_auto = false;

    if let Some(original) = snapshot.active_object.as_deref() {
        if ctx.scene.active_object.as_deref() != Some(original) {
            ctx.scene.set_mode(HostMode::Object);
            if let Err(err) = ctx.scene.set_active_object(original) {
                report.error(format!("active object couldn't be restored: {original}"));
                log::warn!("{err}");
            }
            ctx.scene.set_mode(HostMode::Pose);
        }
    }

    if let Err(err) = ctx
        .scene
        .assign_action(ctx.rig, snapshot.active_action.as_deref())
    {
        report.error(format!(
            "action couldn't be assigned: {}",
            snapshot.active_action.as_deref().unwrap_or_default()
        ));
        log::warn!("{err}");
    }

    let armature = ctx.armature_mut()?;
    for (name, bone) in armature.bones.iter_mut() {
        bone.select = false;
        match snapshot.bone_transforms.get(name) {
            Some(t) => bone.transform = t.clone(),
            None => bone.transform.reset(),
        }
    }
    for name in &snapshot.selected_bones {
        if let Some(bone) = armature.bones.get_mut(name) {
            bone.select = true;
        }
    }
    armature.active_bone = snapshot
        .active_bone
        .clone()
        .filter(|b| armature.bones.contains_key(b));

    remove_temp_constraints(ctx)?;
    enable(ctx)?;

    ctx.scene.tool_settings.use_keyframe_insert_auto = snapshot.autokey;
    report.info(format!("action edit disabled for '{}'", snapshot.pose));
    Ok(report)
}

/// Enter action edit for the pose at `index`, or leave it when engaged.
pub fn toggle_edit(
    ctx: &mut RigContext<'_>,
    library: &PoseLibrary,
    session: &mut EditSession,
    index: usize,
) -> Result<Report, PoserError> {
    if session.is_editing() {
        leave_edit(ctx, session)
    } else {
        enter_edit(ctx, library, session, index)
    }
}

/// Remove temporary constraints, and any driver bound through them first.
fn remove_temp_constraints(ctx: &mut RigContext<'_>) -> Result<usize, PoserError> {
    let prefs = ctx.prefs;
    let object = ctx.scene.object_mut(ctx.rig)?;
    if let Some(ad) = object.animation_data.as_mut() {
        ad.drivers_remove_where(|path| {
            constraint_in_path(path).is_some_and(|c| is_temp_constraint(prefs, c))
        });
    }
    let mut removed = 0;
    if let Some(arm) = object.armature.as_mut() {
        for bone in arm.bones.values_mut() {
            removed += bone
                .remove_constraints_where(|name| is_temp_constraint(prefs, name))
                .len();
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use poser_rig_core::TransformChannel;

    fn simple(name: &str) -> Pose {
        Pose::bone_driven(name, "Rig", "Ctrl", TransformChannel::LocX)
    }

    #[test]
    fn nested_walk_is_breadth_first_and_deduplicated() {
        let mut lib = PoseLibrary::new();
        for n in ["P1", "P2", "P3"] {
            lib.push(simple(n));
        }
        lib.push(Pose::combo("C2", "P2", "P1"));
        lib.push(Pose::combo("C", "C2", "P3"));
        let c = lib.find("C").unwrap();
        let names: Vec<&str> = nested_simple_poses(c, &lib)
            .unwrap()
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, ["P3", "P2", "P1"]);
    }

    #[test]
    fn nested_walk_detects_cycles() {
        let mut lib = PoseLibrary::new();
        lib.push(Pose::combo("C1", "C2", ""));
        lib.push(Pose::combo("C2", "C1", ""));
        let c = lib.find("C1").unwrap();
        assert!(matches!(
            nested_simple_poses(c, &lib),
            Err(PoserError::ComboCycle(_))
        ));
    }

    #[test]
    fn session_serializes_with_state_tag() {
        let idle = serde_json::to_value(EditSession::Idle).unwrap();
        assert_eq!(idle["state"], "IDLE");
        let editing = EditSession::Editing(EditSnapshot {
            pose: "Smile".into(),
            ..Default::default()
        });
        let json = serde_json::to_value(&editing).unwrap();
        assert_eq!(json["state"], "EDITING");
        assert_eq!(json["snapshot"]["pose"], "Smile");
        let back: EditSession = serde_json::from_value(json).unwrap();
        assert_eq!(back.editing_pose(), Some("Smile"));
    }
}
