//! Action constraints: per-bone artifacts that play a frame range of an action
//! at a position given by `eval_time` (when `use_eval_time` is set).

use serde::{Deserialize, Serialize};

/// How the action's transform is combined with the bone's own transform.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MixMode {
    #[default]
    BeforeFull,
    Before,
    BeforeSplit,
    AfterFull,
    After,
    AfterSplit,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionConstraint {
    pub name: String,
    pub enabled: bool,
    pub action: Option<String>,
    pub frame_start: i32,
    pub frame_end: i32,
    pub mix_mode: MixMode,
    pub influence: f32,
    pub use_eval_time: bool,
    /// Normalized play position in [0, 1] across `frame_start..frame_end`.
    pub eval_time: f32,
}

impl Default for ActionConstraint {
    fn default() -> Self {
        Self {
            name: "Action".to_string(),
            enabled: true,
            action: None,
            frame_start: 0,
            frame_end: 10,
            mix_mode: MixMode::default(),
            influence: 1.0,
            use_eval_time: false,
            eval_time: 0.0,
        }
    }
}

impl ActionConstraint {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// The frame currently sampled from the action.
    pub fn current_frame(&self) -> f32 {
        let start = self.frame_start as f32;
        let end = self.frame_end as f32;
        start + (end - start) * self.eval_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_frame_follows_eval_time() {
        let mut c = ActionConstraint {
            frame_start: 10,
            frame_end: 20,
            ..ActionConstraint::new("AP-smile")
        };
        assert_eq!(c.current_frame(), 10.0);
        c.eval_time = 0.5;
        assert_eq!(c.current_frame(), 15.0);
    }

    #[test]
    fn mix_mode_uses_host_names() {
        let json = serde_json::to_string(&MixMode::AfterSplit).unwrap();
        assert_eq!(json, "\"AFTER_SPLIT\"");
    }
}
