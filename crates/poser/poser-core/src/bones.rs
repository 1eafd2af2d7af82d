//! Output-bone list editing and target bone selection.

use crate::error::PoserError;
use crate::library::PoseLibrary;
use crate::pose::{PoseBoneEntry, TargetType};
use crate::RigContext;

/// Append an empty bone entry to the pose at `index` and select it.
pub fn add_bone_entry(library: &mut PoseLibrary, index: usize) -> Result<usize, PoserError> {
    let pose = library.get_mut(index)?;
    pose.bones.push(PoseBoneEntry::new(""));
    let at = pose.bones.len() - 1;
    library.bones_index = at;
    Ok(at)
}

/// Remove bone entry `bone_index`. The bone selection moves to the previous
/// entry, or stays at 0 when the first entry is removed.
pub fn remove_bone_entry(
    library: &mut PoseLibrary,
    index: usize,
    bone_index: usize,
) -> Result<PoseBoneEntry, PoserError> {
    let pose = library.get_mut(index)?;
    let len = pose.bones.len();
    if bone_index >= len {
        return Err(PoserError::BoneIndex {
            index: bone_index,
            len,
        });
    }
    let removed = pose.bones.remove(bone_index);
    library.bones_index = bone_index.saturating_sub(1);
    Ok(removed)
}

pub fn remove_all_bones(library: &mut PoseLibrary, index: usize) -> Result<usize, PoserError> {
    let pose = library.get_mut(index)?;
    let n = pose.bones.len();
    pose.bones.clear();
    library.bones_index = 0;
    Ok(n)
}

/// Append every bone selected on the rig that is not listed yet.
/// Returns how many entries were added.
pub fn add_selected_bones(
    ctx: &RigContext<'_>,
    library: &mut PoseLibrary,
    index: usize,
) -> Result<usize, PoserError> {
    let selected = ctx.armature()?.selected_bones();
    let pose = library.get_mut(index)?;
    let mut added = 0;
    for name in selected {
        if !pose.has_bone_entry(&name) {
            pose.bones.push(PoseBoneEntry::new(name));
            added += 1;
        }
    }
    let last = pose.bones.len().saturating_sub(1);
    library.bones_index = last;
    Ok(added)
}

/// Remove every entry whose bone is selected on the rig.
pub fn remove_selected_bones(
    ctx: &RigContext<'_>,
    library: &mut PoseLibrary,
    index: usize,
) -> Result<usize, PoserError> {
    let selected = ctx.armature()?.selected_bones();
    let pose = library.get_mut(index)?;
    let before = pose.bones.len();
    pose.bones.retain(|e| !selected.contains(&e.bone));
    let remaining = pose.bones.len();
    library.bones_index = library.bones_index.min(remaining.saturating_sub(1));
    Ok(before - remaining)
}

/// Append the bones keyed in the pose's action. Channel groups name bones;
/// groups without a matching rig bone are ignored.
pub fn add_from_action(
    ctx: &RigContext<'_>,
    library: &mut PoseLibrary,
    index: usize,
) -> Result<usize, PoserError> {
    let groups = action_groups(ctx, library, index)?;
    let armature = ctx.armature()?;
    let pose = library.get_mut(index)?;
    let mut added = 0;
    for group in groups {
        if armature.has_bone(&group) && !pose.has_bone_entry(&group) {
            pose.bones.push(PoseBoneEntry::new(group));
            added += 1;
        }
    }
    let last = pose.bones.len().saturating_sub(1);
    library.bones_index = last;
    Ok(added)
}

fn action_groups(
    ctx: &RigContext<'_>,
    library: &PoseLibrary,
    index: usize,
) -> Result<Vec<String>, PoserError> {
    let pose = library.get(index)?;
    let name = pose
        .action
        .as_deref()
        .ok_or_else(|| PoserError::NoAction(pose.name.clone()))?;
    let action = ctx
        .scene
        .action(name)
        .ok_or_else(|| poser_rig_core::RigError::ActionNotFound(name.to_string()))?;
    Ok(action.groups.clone())
}

fn select(ctx: &mut RigContext<'_>, names: &[String]) -> Result<usize, PoserError> {
    let armature = ctx.armature_mut()?;
    let mut selected = 0;
    for name in names {
        match armature.bones.get_mut(name) {
            Some(bone) => {
                bone.select = true;
                selected += 1;
            }
            None => log::debug!("bone '{name}' not on rig, not selected"),
        }
    }
    Ok(selected)
}

/// Select the rig bones listed on the pose. Adds to the current selection.
pub fn select_pose_bones(
    ctx: &mut RigContext<'_>,
    library: &PoseLibrary,
    index: usize,
) -> Result<usize, PoserError> {
    let names: Vec<String> = library
        .get(index)?
        .bones
        .iter()
        .map(|e| e.bone.clone())
        .collect();
    select(ctx, &names)
}

/// Select the rig bones keyed in the pose's action.
pub fn select_action_bones(
    ctx: &mut RigContext<'_>,
    library: &PoseLibrary,
    index: usize,
) -> Result<usize, PoserError> {
    let groups = action_groups(ctx, library, index)?;
    select(ctx, &groups)
}

/// Make the rig's active bone the driving input of the pose at `index`.
pub fn set_active_bone_as_target(
    ctx: &RigContext<'_>,
    library: &mut PoseLibrary,
    index: usize,
) -> Result<(), PoserError> {
    let bone = ctx
        .armature()?
        .active_bone
        .clone()
        .ok_or(PoserError::NoActiveBone)?;
    let pose = library.get_mut(index)?;
    pose.target = Some(ctx.rig.to_string());
    pose.target_type = TargetType::BoneTransform;
    pose.bone = bone;
    Ok(())
}

/// Select the driving bone of the pose at `index` and make it active,
/// switching the active object to the pose target first when needed.
pub fn select_target_bone(
    ctx: &mut RigContext<'_>,
    library: &PoseLibrary,
    index: usize,
) -> Result<(), PoserError> {
    let pose = library.get(index)?;
    let target = pose
        .target
        .as_deref()
        .ok_or_else(|| PoserError::NoTarget(pose.name.clone()))?;
    ctx.scene.switch_active_object(target)?;
    let armature = ctx.scene.armature_mut(target)?;
    let bone = armature.bones.get_mut(&pose.bone).ok_or_else(|| {
        poser_rig_core::RigError::BoneNotFound {
            object: target.to_string(),
            bone: pose.bone.clone(),
        }
    })?;
    bone.select = true;
    armature.active_bone = Some(pose.bone.clone());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Preferences;
    use crate::pose::Pose;
    use poser_rig_core::{
        Action, FCurve, HostMode, Object, PoseBone, Scene, TransformChannel,
    };

    fn rig() -> Scene {
        let mut scene = Scene::new();
        let obj = scene.add_object("Rig", Object::armature());
        let arm = obj.armature.as_mut().unwrap();
        for b in ["Ctrl", "Jaw", "Lip.L", "Lip.R"] {
            arm.add_bone(b, PoseBone::default());
        }
        scene.add_object("Face", Object::armature());
        scene.armature_mut("Face").unwrap().add_bone("Brow", PoseBone::default());
        scene.active_object = Some("Rig".into());
        scene.mode = HostMode::Pose;
        scene
    }

    #[test]
    fn removing_entries_clamps_the_bone_index() {
        let mut lib = PoseLibrary::new();
        lib.push(Pose::new("P").with_bones(["A", "B", "C"]));
        lib.bones_index = 2;
        remove_bone_entry(&mut lib, 0, 0).unwrap();
        assert_eq!(lib.bones_index, 0);
        remove_bone_entry(&mut lib, 0, 1).unwrap();
        assert_eq!(lib.bones_index, 0);
        assert_eq!(lib.poses[0].bones[0].bone, "B");
        assert!(matches!(
            remove_bone_entry(&mut lib, 0, 3),
            Err(PoserError::BoneIndex { index: 3, len: 1 })
        ));
        assert_eq!(add_bone_entry(&mut lib, 0).unwrap(), 1);
        assert_eq!(remove_all_bones(&mut lib, 0).unwrap(), 2);
    }

    #[test]
    fn selected_bones_are_added_once_and_removed() {
        let mut scene = rig();
        for b in ["Jaw", "Lip.L"] {
            scene.bone_mut("Rig", b).unwrap().select = true;
        }
        let prefs = Preferences::default();
        let mut lib = PoseLibrary::new();
        lib.push(Pose::new("P").with_bones(["Jaw"]));
        let ctx = RigContext::new(&mut scene, "Rig", &prefs);
        assert_eq!(add_selected_bones(&ctx, &mut lib, 0).unwrap(), 1);
        assert_eq!(lib.bones_index, 1);
        assert_eq!(remove_selected_bones(&ctx, &mut lib, 0).unwrap(), 2);
        assert!(lib.poses[0].bones.is_empty());
    }

    #[test]
    fn action_groups_add_only_rig_bones() {
        let mut scene = rig();
        let mut action = Action::default();
        for group in ["Jaw", "Tongue", "Lip.R"] {
            action.add_fcurve(FCurve::new("location", 0).with_group(group));
        }
        scene.add_action("AP-P", action);
        let prefs = Preferences::default();
        let mut lib = PoseLibrary::new();
        lib.push(Pose::new("P").with_action("AP-P").with_bones(["Jaw"]));
        let mut ctx = RigContext::new(&mut scene, "Rig", &prefs);
        assert_eq!(add_from_action(&ctx, &mut lib, 0).unwrap(), 1);
        assert_eq!(lib.poses[0].bones[1].bone, "Lip.R");
        assert_eq!(select_action_bones(&mut ctx, &lib, 0).unwrap(), 2);
        assert_eq!(ctx.armature().unwrap().selected_bones(), ["Jaw", "Lip.R"]);
    }

    #[test]
    fn target_bone_round_trip() {
        let mut scene = rig();
        scene.armature_mut("Rig").unwrap().active_bone = Some("Ctrl".into());
        let prefs = Preferences::default();
        let mut lib = PoseLibrary::new();
        lib.push(Pose::new("P"));
        lib.push(Pose::bone_driven("Q", "Face", "Brow", TransformChannel::LocZ));
        let mut ctx = RigContext::new(&mut scene, "Rig", &prefs);

        set_active_bone_as_target(&ctx, &mut lib, 0).unwrap();
        assert_eq!(lib.poses[0].target.as_deref(), Some("Rig"));
        assert_eq!(lib.poses[0].bone, "Ctrl");

        select_target_bone(&mut ctx, &lib, 1).unwrap();
        assert_eq!(ctx.scene.active_object.as_deref(), Some("Face"));
        assert_eq!(ctx.scene.mode, HostMode::Pose);
        let face = ctx.scene.armature("Face").unwrap();
        assert_eq!(face.active_bone.as_deref(), Some("Brow"));
        assert!(face.bones["Brow"].select);
    }

    #[test]
    fn no_active_bone_is_an_error() {
        let mut scene = rig();
        let prefs = Preferences::default();
        let mut lib = PoseLibrary::new();
        lib.push(Pose::new("P"));
        let ctx = RigContext::new(&mut scene, "Rig", &prefs);
        assert_eq!(
            set_active_bone_as_target(&ctx, &mut lib, 0),
            Err(PoserError::NoActiveBone)
        );
    }
}
