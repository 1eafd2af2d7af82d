use poser_rig_core::RigError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PoserError {
    #[error(transparent)]
    Rig(#[from] RigError),
    #[error("pose index {index} out of range (len {len})")]
    PoseIndex { index: usize, len: usize },
    #[error("bone index {index} out of range (len {len})")]
    BoneIndex { index: usize, len: usize },
    #[error("pose '{0}' not found")]
    PoseNotFound(String),
    #[error("pose '{0}' has no action")]
    NoAction(String),
    #[error("pose '{0}' has no target")]
    NoTarget(String),
    #[error("combo poses form a cycle: {}", .0.join(" -> "))]
    ComboCycle(Vec<String>),
    #[error("no active bone")]
    NoActiveBone,
    #[error("action edit is already engaged")]
    AlreadyEditing,
    #[error("action edit is not engaged")]
    NotEditing,
}
