//! Left/right side suffix swapping and opposite-name lookups.

use poser_rig_core::Scene;

use crate::config::Preferences;
use crate::library::PoseLibrary;

/// Swap a trailing left suffix for the right one or vice versa. Names without
/// either suffix come back unchanged. Empty suffixes never match.
pub fn swap_side_suffix(name: &str, left: &str, right: &str) -> String {
    if !left.is_empty() {
        if let Some(stem) = name.strip_suffix(left) {
            return format!("{stem}{right}");
        }
    }
    if !right.is_empty() {
        if let Some(stem) = name.strip_suffix(right) {
            return format!("{stem}{left}");
        }
    }
    name.to_string()
}

/// [`swap_side_suffix`] with the suffixes from `prefs`.
pub fn swap_suffix(name: &str, prefs: &Preferences) -> String {
    swap_side_suffix(name, &prefs.left_suffix, &prefs.right_suffix)
}

/// The opposite-side name when it differs from `name` and `exists` accepts it.
fn opposite(name: &str, prefs: &Preferences, exists: impl Fn(&str) -> bool) -> Option<String> {
    let swapped = swap_suffix(name, prefs);
    (swapped != name && exists(&swapped)).then_some(swapped)
}

pub fn find_opposite_bone(
    scene: &Scene,
    armature_object: &str,
    bone: &str,
    prefs: &Preferences,
) -> Option<String> {
    let armature = scene.armature(armature_object).ok()?;
    opposite(bone, prefs, |n| armature.has_bone(n))
}

pub fn find_opposite_object(scene: &Scene, object: &str, prefs: &Preferences) -> Option<String> {
    opposite(object, prefs, |n| scene.has_object(n))
}

pub fn find_opposite_action(scene: &Scene, action: &str, prefs: &Preferences) -> Option<String> {
    opposite(action, prefs, |n| scene.action(n).is_some())
}

pub fn find_opposite_pose(library: &PoseLibrary, pose: &str, prefs: &Preferences) -> Option<String> {
    opposite(pose, prefs, |n| library.find(n).is_some())
}
