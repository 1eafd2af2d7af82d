//! Pose compilation: constraints, evaluation-time drivers and influence drivers.

use poser_api_core::Value;
use poser_rig_core::{ActionConstraint, DriverOutput};

use crate::collect::collect;
use crate::edit::{leave_edit, EditSession};
use crate::error::PoserError;
use crate::library::PoseLibrary;
use crate::naming::{constraint_name, eval_time_path, influence_path, influence_target};
use crate::pose::Pose;
use crate::purge::purge;
use crate::report::Report;
use crate::synth::synthesize;
use crate::validity::validate;
use crate::RigContext;

/// Add one action constraint named `name` per output bone of `pose`.
///
/// Bones missing from the rig are reported and skipped. Returns the
/// `(bone, constraint)` names actually placed.
pub(crate) fn place_constraints(
    ctx: &mut RigContext<'_>,
    pose: &Pose,
    name: &str,
    eval_time: f32,
    report: &mut Report,
) -> Result<Vec<(String, String)>, PoserError> {
    let armature = ctx.armature_mut()?;
    let mut placed = Vec::with_capacity(pose.bones.len());
    for entry in &pose.bones {
        let Some(bone) = armature.bones.get_mut(&entry.bone) else {
            report.warning(format!(
                "pose '{}': bone '{}' not found, skipped",
                pose.name, entry.bone
            ));
            continue;
        };
        let constraint = ActionConstraint {
            name: name.to_string(),
            enabled: true,
            action: pose.action.clone(),
            frame_start: pose.start_frame,
            frame_end: pose.end_frame,
            mix_mode: pose.mix,
            influence: entry.influence,
            use_eval_time: true,
            eval_time,
        };
        let final_name = bone.add_constraint(constraint);
        placed.push((entry.bone.clone(), final_name));
    }
    Ok(placed)
}

/// Compile one pose onto the rig.
///
/// Expects compiled artifacts of the same pose to have been purged; compiling
/// twice stacks a second, suffixed constraint on each bone.
pub fn compile(
    ctx: &mut RigContext<'_>,
    library: &PoseLibrary,
    pose: &Pose,
) -> Result<Report, PoserError> {
    let mut report = Report::new();
    let vars = collect(pose, library)?;
    let mode = ctx.prefs.blend_mode;
    let name = constraint_name(ctx.prefs, &pose.name);
    log::debug!("compiling pose '{}' with {} variables", pose.name, vars.len());

    let placed = place_constraints(ctx, pose, &name, 0.0, &mut report)?;
    if vars.is_empty() {
        report.warning(format!(
            "pose '{}' has no driving inputs, no drivers created",
            pose.name
        ));
    }
    for (bone, constraint) in &placed {
        synthesize(ctx.scene, ctx.rig, eval_time_path(bone, constraint), &vars, mode)?;
    }

    ctx.scene
        .object_mut(ctx.rig)?
        .properties
        .insert(name, Value::Float(0.0));

    synthesize(ctx.scene, ctx.rig, influence_path(&pose.name), &vars, mode)?;
    Ok(report)
}

/// Purge, then compile every pose that is flagged for build and valid, in
/// list order. Leaves action edit first when it is engaged.
pub fn compile_all(
    ctx: &mut RigContext<'_>,
    library: &PoseLibrary,
    session: &mut EditSession,
) -> Result<Report, PoserError> {
    let mut report = Report::new();
    if session.is_editing() {
        report.extend(leave_edit(ctx, session)?);
    }
    purge(ctx)?;

    let mut built = 0;
    for pose in library.iter() {
        if !pose.build {
            log::debug!("pose '{}' excluded from build", pose.name);
            continue;
        }
        if let Err(reason) = validate(pose, ctx.scene) {
            report.warning(format!("pose '{}' skipped: {reason}", pose.name));
            continue;
        }
        match compile(ctx, library, pose) {
            Ok(r) => {
                report.extend(r);
                built += 1;
            }
            Err(err @ PoserError::ComboCycle(_)) => {
                report.error(format!("pose '{}' skipped: {err}", pose.name));
            }
            Err(err) => return Err(err),
        }
    }
    report.info(format!("{built} poses created successfully"));
    Ok(report)
}

/// Evaluate the rig's drivers. Constraint evaluation times are written on
/// the rig; influence outputs are written onto the matching poses.
pub fn evaluate(
    ctx: &mut RigContext<'_>,
    library: &mut PoseLibrary,
) -> Result<Vec<DriverOutput>, PoserError> {
    let mut outputs = ctx.scene.evaluate_drivers(ctx.rig)?;
    for out in outputs.iter_mut() {
        let (Some(value), Some(pose_name)) = (out.value, influence_target(&out.data_path)) else {
            continue;
        };
        if let Some(pose) = library.find_mut(pose_name) {
            pose.influence = value;
            out.applied = true;
        }
    }
    Ok(outputs)
}
