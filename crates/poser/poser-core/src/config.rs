//! User preferences for the action poser.

use serde::{Deserialize, Serialize};

/// How each normalized term of a blend expression is shaped.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlendMode {
    /// `(value - min) / (max - min)`, unclamped.
    #[default]
    Raw,
    /// `max(0, (value - min) / (max - min))`.
    Floored,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// Prefix on every compiled constraint. Purge will miss constraints
    /// compiled under a different prefix.
    pub constraint_prefix: String,
    pub left_suffix: String,
    pub right_suffix: String,
    /// Prefix for actions created for simple poses.
    pub pose_prefix: String,
    /// Prefix for actions created for combo poses.
    pub combo_prefix: String,
    /// Base name for new poses.
    pub default_name: String,
    /// Name marker of the temporary constraints created while editing an action.
    pub temp_marker: String,
    pub blend_mode: BlendMode,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            constraint_prefix: "AP-".to_string(),
            left_suffix: ".L".to_string(),
            right_suffix: ".R".to_string(),
            pose_prefix: "AP-".to_string(),
            combo_prefix: "AC-".to_string(),
            default_name: "Pose".to_string(),
            temp_marker: "AP_TEMP-".to_string(),
            blend_mode: BlendMode::Raw,
        }
    }
}
