use thiserror::Error;

/// Errors produced by document lookups, assignments and driver evaluation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RigError {
    #[error("object '{0}' not found")]
    ObjectNotFound(String),
    #[error("object '{0}' is not an armature")]
    NotAnArmature(String),
    #[error("bone '{bone}' not found on '{object}'")]
    BoneNotFound { object: String, bone: String },
    #[error("action '{0}' not found")]
    ActionNotFound(String),
    #[error("action '{action}' cannot be assigned to '{object}': {reason}")]
    IncompatibleAction {
        object: String,
        action: String,
        reason: String,
    },
    #[error("property path error: {0}")]
    Path(String),
    #[error("'{0}' does not hold a scalar value")]
    NotScalar(String),
    #[error("'{0}' is not a writable property")]
    Unwritable(String),
    #[error("driver expression error: {0}")]
    Expression(String),
}
