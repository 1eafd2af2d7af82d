//! Per-pose action management.

use poser_rig_core::Action;

use crate::error::PoserError;
use crate::library::PoseLibrary;
use crate::report::Report;
use crate::RigContext;

fn action_of(library: &PoseLibrary, index: usize) -> Result<String, PoserError> {
    let pose = library.get(index)?;
    pose.action
        .clone()
        .ok_or_else(|| PoserError::NoAction(pose.name.clone()))
}

/// Create an empty action for the pose at `index` and assign it.
///
/// The action is named after the pose with the pose or combo prefix and is
/// kept alive with a fake user. Returns the final action name.
pub fn new_action(
    ctx: &mut RigContext<'_>,
    library: &mut PoseLibrary,
    index: usize,
) -> Result<String, PoserError> {
    let pose = library.get_mut(index)?;
    let prefix = if pose.is_combo() {
        &ctx.prefs.combo_prefix
    } else {
        &ctx.prefs.pose_prefix
    };
    let action = Action {
        use_fake_user: true,
        ..Default::default()
    };
    let name = ctx.scene.add_action(&format!("{prefix}{}", pose.name), action);
    log::debug!("created action '{name}' for pose '{}'", pose.name);
    pose.action = Some(name.clone());
    Ok(name)
}

/// Copy the pose's action under a suffixed name and assign the copy to the pose.
pub fn duplicate_action(
    ctx: &mut RigContext<'_>,
    library: &mut PoseLibrary,
    index: usize,
) -> Result<String, PoserError> {
    let current = action_of(library, index)?;
    let copy = ctx
        .scene
        .action(&current)
        .cloned()
        .ok_or_else(|| poser_rig_core::RigError::ActionNotFound(current.clone()))?;
    let name = ctx.scene.add_action(&current, copy);
    library.get_mut(index)?.action = Some(name.clone());
    Ok(name)
}

/// Delete the pose's action from the document. Every pose, constraint and
/// active-action reference to it is cleared.
pub fn delete_action(
    ctx: &mut RigContext<'_>,
    library: &mut PoseLibrary,
    index: usize,
) -> Result<String, PoserError> {
    let name = action_of(library, index)?;
    if ctx.scene.remove_action(&name).is_none() {
        log::debug!("action '{name}' was already gone from the document");
    }
    library.clear_action_refs(&name);
    Ok(name)
}

/// Rename the pose's action. The name is uniquified against other actions.
pub fn rename_action(
    ctx: &mut RigContext<'_>,
    library: &mut PoseLibrary,
    index: usize,
    new_name: &str,
) -> Result<String, PoserError> {
    let old = action_of(library, index)?;
    let name = ctx.scene.rename_action(&old, new_name)?;
    library.rename_action_refs(&old, &name);
    Ok(name)
}

/// Drop curves of the pose's action whose values never change, then groups
/// left empty.
pub fn remove_flat_curves(
    ctx: &mut RigContext<'_>,
    library: &PoseLibrary,
    index: usize,
) -> Result<Report, PoserError> {
    let name = action_of(library, index)?;
    let action = ctx
        .scene
        .action_mut(&name)
        .ok_or_else(|| poser_rig_core::RigError::ActionNotFound(name.clone()))?;
    let removed = action.remove_flat_curves();
    let mut report = Report::new();
    report.info(format!("{removed} flat curves removed from '{name}'"));
    Ok(report)
}
