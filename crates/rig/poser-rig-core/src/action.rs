//! Actions: named animation clips made of fcurves grouped by bone name.

use serde::{Deserialize, Serialize};

use crate::object::ObjectKind;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub frame: f32,
    pub value: f32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FCurve {
    pub data_path: String,
    pub array_index: usize,
    /// Channel group; for bone channels this is the bone name.
    pub group: Option<String>,
    pub keyframes: Vec<Keyframe>,
}

impl FCurve {
    pub fn new(data_path: impl Into<String>, array_index: usize) -> Self {
        Self {
            data_path: data_path.into(),
            array_index,
            ..Default::default()
        }
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_keys(mut self, keys: &[(f32, f32)]) -> Self {
        self.keyframes = keys
            .iter()
            .map(|&(frame, value)| Keyframe { frame, value })
            .collect();
        self
    }

    /// A curve is flat when every key has the same value at 5 decimal places.
    /// Curves with fewer than two keys are flat.
    pub fn is_flat(&self) -> bool {
        let mut values = self
            .keyframes
            .iter()
            .map(|k| (k.value as f64 * 100_000.0).round() as i64);
        match values.next() {
            Some(first) => values.all(|v| v == first),
            None => true,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Action {
    /// Kind of object this action animates. `None` means not yet bound to a kind.
    pub id_root: Option<ObjectKind>,
    pub use_fake_user: bool,
    pub fcurves: Vec<FCurve>,
    pub groups: Vec<String>,
}

impl Action {
    /// Append a curve, registering its group if new.
    pub fn add_fcurve(&mut self, curve: FCurve) {
        if let Some(group) = &curve.group {
            if !self.groups.iter().any(|g| g == group) {
                self.groups.push(group.clone());
            }
        }
        self.fcurves.push(curve);
    }

    /// Remove flat curves, then every group left without channels.
    /// Returns how many curves were removed.
    pub fn remove_flat_curves(&mut self) -> usize {
        let before = self.fcurves.len();
        self.fcurves.retain(|c| !c.is_flat());
        let curves = &self.fcurves;
        self.groups
            .retain(|g| curves.iter().any(|c| c.group.as_deref() == Some(g.as_str())));
        before - self.fcurves.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_detection_rounds_to_five_places() {
        assert!(FCurve::new("location", 0).is_flat());
        assert!(FCurve::new("location", 0)
            .with_keys(&[(0.0, 1.0), (10.0, 1.000_001)])
            .is_flat());
        assert!(!FCurve::new("location", 0)
            .with_keys(&[(0.0, 1.0), (10.0, 1.1)])
            .is_flat());
    }

    #[test]
    fn removing_flat_curves_prunes_empty_groups() {
        let mut action = Action::default();
        action.add_fcurve(
            FCurve::new("pose.bones[\"Jaw\"].location", 1)
                .with_group("Jaw")
                .with_keys(&[(0.0, 0.0), (10.0, 0.2)]),
        );
        action.add_fcurve(
            FCurve::new("pose.bones[\"Lip\"].location", 0)
                .with_group("Lip")
                .with_keys(&[(0.0, 0.0), (10.0, 0.0)]),
        );
        assert_eq!(action.remove_flat_curves(), 1);
        assert_eq!(action.fcurves.len(), 1);
        assert_eq!(action.groups, vec!["Jaw".to_string()]);
    }
}
