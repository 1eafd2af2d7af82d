//! Removal and toggling of compiled artifacts.
//!
//! Artifacts are found by name only: constraints whose name contains the
//! constraint prefix, drivers bound through such a constraint or onto a pose
//! influence, and the rig custom properties keyed by a constraint name.

use crate::error::PoserError;
use crate::naming::{constraint_in_path, influence_target, is_compiled_constraint};
use crate::RigContext;

/// Counts of what a purge removed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PurgeSummary {
    pub constraints: usize,
    pub drivers: usize,
    pub properties: usize,
}

impl PurgeSummary {
    pub fn is_empty(&self) -> bool {
        self.constraints == 0 && self.drivers == 0 && self.properties == 0
    }
}

/// Remove every compiled artifact from the rig. Safe to repeat.
pub fn purge(ctx: &mut RigContext<'_>) -> Result<PurgeSummary, PoserError> {
    let prefs = ctx.prefs;
    let object = ctx.scene.object_mut(ctx.rig)?;
    let mut summary = PurgeSummary::default();

    if let Some(ad) = object.animation_data.as_mut() {
        summary.drivers = ad.drivers_remove_where(|path| {
            influence_target(path).is_some()
                || constraint_in_path(path).is_some_and(|c| is_compiled_constraint(prefs, c))
        });
    }

    let before = object.properties.len();
    object
        .properties
        .retain(|key, _| !is_compiled_constraint(prefs, key));
    summary.properties = before - object.properties.len();

    if let Some(arm) = object.armature.as_mut() {
        for bone in arm.bones.values_mut() {
            summary.constraints += bone
                .remove_constraints_where(|name| is_compiled_constraint(prefs, name))
                .len();
        }
    }

    log::info!(
        "purged {} constraints, {} drivers, {} properties from '{}'",
        summary.constraints,
        summary.drivers,
        summary.properties,
        ctx.rig
    );
    Ok(summary)
}

/// Set `enabled` on every compiled constraint. Returns how many were touched.
pub fn set_enabled(ctx: &mut RigContext<'_>, enabled: bool) -> Result<usize, PoserError> {
    let prefs = ctx.prefs;
    let arm = ctx.scene.armature_mut(ctx.rig)?;
    let mut touched = 0;
    for bone in arm.bones.values_mut() {
        for c in bone
            .constraints
            .iter_mut()
            .filter(|c| is_compiled_constraint(prefs, &c.name))
        {
            c.enabled = enabled;
            touched += 1;
        }
    }
    log::debug!("set enabled={enabled} on {touched} compiled constraints");
    Ok(touched)
}

pub fn enable(ctx: &mut RigContext<'_>) -> Result<usize, PoserError> {
    set_enabled(ctx, true)
}

pub fn disable(ctx: &mut RigContext<'_>) -> Result<usize, PoserError> {
    set_enabled(ctx, false)
}
