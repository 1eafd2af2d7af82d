//! Names and property paths of compiled artifacts.
//!
//! Compile, purge and the edit session all go through these functions; a
//! compiled artifact is recognised by its name alone.

use poser_api_core::{PathSegment, PropertyPath};

use crate::config::Preferences;

/// Name of every constraint compiled for `pose_name`.
pub fn constraint_name(prefs: &Preferences, pose_name: &str) -> String {
    format!("{}{}", prefs.constraint_prefix, pose_name)
}

/// Name of the temporary constraints created for `pose_name` during action edit.
pub fn temp_constraint_name(prefs: &Preferences, pose_name: &str) -> String {
    format!("{}{}", prefs.temp_marker, pose_name)
}

pub fn is_compiled_constraint(prefs: &Preferences, name: &str) -> bool {
    name.contains(&prefs.constraint_prefix)
}

pub fn is_temp_constraint(prefs: &Preferences, name: &str) -> bool {
    name.contains(&prefs.temp_marker)
}

/// `pose.bones["<bone>"].constraints["<constraint>"]`
pub fn constraint_path(bone: &str, constraint: &str) -> PropertyPath {
    PropertyPath::new(Vec::new())
        .field("pose")
        .field("bones")
        .key(bone)
        .field("constraints")
        .key(constraint)
}

/// `pose.bones["<bone>"].constraints["<constraint>"].eval_time`
pub fn eval_time_path(bone: &str, constraint: &str) -> PropertyPath {
    constraint_path(bone, constraint).field("eval_time")
}

/// `ap_poses["<pose>"].influence`
pub fn influence_path(pose_name: &str) -> PropertyPath {
    PropertyPath::new(Vec::new())
        .field("ap_poses")
        .key(pose_name)
        .field("influence")
}

/// The pose name of an `ap_poses["<pose>"].influence` path.
pub fn influence_target(path: &PropertyPath) -> Option<&str> {
    match path.segments.as_slice() {
        [PathSegment::Field(root), PathSegment::Key(pose), PathSegment::Field(attr)]
            if root == "ap_poses" && attr == "influence" =>
        {
            Some(pose.as_str())
        }
        _ => None,
    }
}

/// The constraint named by a path that goes through `constraints["<name>"]`.
pub fn constraint_in_path(path: &PropertyPath) -> Option<&str> {
    path.segments.windows(2).find_map(|pair| match pair {
        [PathSegment::Field(f), PathSegment::Key(name)] if f == "constraints" => {
            Some(name.as_str())
        }
        _ => None,
    })
}
