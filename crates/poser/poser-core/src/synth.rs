//! Blend-expression synthesis.
//!
//! A pose's flattened variables become one driver expression:
//!
//! ```text
//! min((var0 - min0) / (max0 - min0), (degrees(var1) - min1) / (max1 - min1), ...)
//! ```
//!
//! Rotation inputs are converted to degrees so ranges are authored in
//! degrees. The expression is always wrapped in `min(...)`, even with a
//! single term. With [`BlendMode::Floored`] each term becomes `max(0, term)`.

use poser_api_core::PropertyPath;
use poser_rig_core::{ChannelRotationMode, Driver, DriverVariable, Scene, VariableSource};

use crate::collect::{VariableDescriptor, VariableInput, VariableMap};
use crate::config::BlendMode;
use crate::error::PoserError;

fn number(v: f32) -> String {
    format!("{v:?}")
}

fn term(name: &str, var: &VariableDescriptor, mode: BlendMode) -> String {
    let value = if var.is_rotation() {
        format!("degrees({name})")
    } else {
        name.to_string()
    };
    let (min, max) = (number(var.min), number(var.max));
    let ratio = format!("({value} - {min}) / ({max} - {min})");
    match mode {
        BlendMode::Raw => ratio,
        BlendMode::Floored => format!("max(0, {ratio})"),
    }
}

/// The blend expression for `vars`, terms in map order. `None` when empty.
pub fn expression(vars: &VariableMap, mode: BlendMode) -> Option<String> {
    if vars.is_empty() {
        return None;
    }
    let terms: Vec<String> = vars
        .iter()
        .map(|(name, var)| term(name, var, mode))
        .collect();
    Some(format!("min({})", terms.join(", ")))
}

fn variable(name: &str, var: &VariableDescriptor) -> DriverVariable {
    let source = match &var.input {
        VariableInput::Bone {
            bone,
            channel,
            space,
            rotation_mode,
        } => VariableSource::TransformChannel {
            object: var.target.clone(),
            bone: bone.clone(),
            channel: *channel,
            space: *space,
            rotation_mode: rotation_mode.unwrap_or(ChannelRotationMode::Auto),
        },
        VariableInput::Property { path } => VariableSource::SingleProp {
            object: var.target.clone(),
            path: path.clone(),
        },
    };
    DriverVariable {
        name: name.to_string(),
        source,
    }
}

/// Build the driver bound to `data_path`. `None` when `vars` is empty.
pub fn build_driver(
    data_path: PropertyPath,
    vars: &VariableMap,
    mode: BlendMode,
) -> Option<Driver> {
    let expression = expression(vars, mode)?;
    Some(Driver {
        data_path,
        expression,
        variables: vars.iter().map(|(name, var)| variable(name, var)).collect(),
    })
}

/// Install the blend driver for `vars` on `data_path` of the rig object,
/// replacing any driver already there. Returns false when `vars` is empty
/// and nothing was installed.
pub fn synthesize(
    scene: &mut Scene,
    rig: &str,
    data_path: PropertyPath,
    vars: &VariableMap,
    mode: BlendMode,
) -> Result<bool, PoserError> {
    let object = scene.object_mut(rig)?;
    match build_driver(data_path, vars, mode) {
        Some(driver) => {
            object.animation_data_mut().driver_add(driver);
            Ok(true)
        }
        None => Ok(false),
    }
}
