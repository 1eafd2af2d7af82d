//! poser-core: driver-controlled action poses for a rig.
//!
//! A pose plays a frame range of an action on a set of bones, gated by a
//! blend of live inputs (bone transform channels or scene properties). Combo
//! poses gate on other poses. Compiling a pose places one action constraint
//! per output bone and binds a min-of-normalized-terms driver to each
//! constraint's evaluation time and to the pose's own influence.
//!
//! Every operation works on a [`RigContext`]: the document, the name of the
//! rig object that owns the poses, and the user [`Preferences`].

pub mod actions;
pub mod bones;
pub mod collect;
pub mod compile;
pub mod config;
pub mod edit;
pub mod error;
pub mod library;
pub mod naming;
pub mod pose;
pub mod purge;
pub mod report;
pub mod suffix;
pub mod synth;
pub mod validity;

use poser_rig_core::{Armature, Scene};

pub use collect::{collect, VariableDescriptor, VariableInput, VariableMap};
pub use compile::{compile, compile_all, evaluate};
pub use config::{BlendMode, Preferences};
pub use edit::{enter_edit, leave_edit, toggle_edit, EditSession, EditSnapshot};
pub use error::PoserError;
pub use library::{CopyMode, MoveDirection, PoseLibrary};
pub use pose::{Pose, PoseBoneEntry, PoseType, TargetType};
pub use purge::{disable, enable, purge, PurgeSummary};
pub use report::{Report, ReportEntry, ReportLevel};
pub use suffix::{swap_side_suffix, swap_suffix};
pub use validity::{is_valid, validate, Invalid};

/// The document and rig an operation acts on.
pub struct RigContext<'a> {
    pub scene: &'a mut Scene,
    /// Name of the armature object that owns the poses and compiled artifacts.
    pub rig: &'a str,
    pub prefs: &'a Preferences,
}

impl<'a> RigContext<'a> {
    pub fn new(scene: &'a mut Scene, rig: &'a str, prefs: &'a Preferences) -> Self {
        Self { scene, rig, prefs }
    }

    pub fn armature(&self) -> Result<&Armature, PoserError> {
        Ok(self.scene.armature(self.rig)?)
    }

    pub fn armature_mut(&mut self) -> Result<&mut Armature, PoserError> {
        Ok(self.scene.armature_mut(self.rig)?)
    }
}
