//! The scene document: object and action namespaces, the active object, host
//! mode and tool settings, plus live driver evaluation.

use indexmap::IndexMap;
use poser_api_core::coercion::to_float;
use poser_api_core::rotation::{quat_to_euler, swing_twist};
use poser_api_core::{EulerOrder, PathSegment, PropertyPath, Value};
use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::driver::{
    ChannelKind, ChannelRotationMode, DriverOutput, DriverVariable, TransformChannel,
    TransformSpace, VariableSource,
};
use crate::error::RigError;
use crate::expr::Expr;
use crate::object::{Armature, Object, ObjectKind, PoseBone};
use crate::transform::{BoneTransform, Trs};

/// Return `base` if it is free, otherwise the first free `stem.NNN` name,
/// where `stem` is `base` without an existing numeric suffix.
pub fn unique_name<F: Fn(&str) -> bool>(base: &str, taken: F) -> String {
    if !taken(base) {
        return base.to_string();
    }
    let stem = match base.rsplit_once('.') {
        Some((stem, digits))
            if digits.len() == 3 && digits.chars().all(|c| c.is_ascii_digit()) =>
        {
            stem
        }
        _ => base,
    };
    (1..)
        .map(|n| format!("{stem}.{n:03}"))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| base.to_string())
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HostMode {
    #[default]
    Object,
    Pose,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    pub use_keyframe_insert_auto: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scene {
    pub objects: IndexMap<String, Object>,
    pub actions: IndexMap<String, Action>,
    pub active_object: Option<String>,
    pub mode: HostMode,
    pub tool_settings: ToolSettings,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an object, replacing any object of the same name.
    pub fn add_object(&mut self, name: impl Into<String>, object: Object) -> &mut Object {
        let entry = self.objects.entry(name.into());
        let slot = entry.or_default();
        *slot = object;
        slot
    }

    pub fn has_object(&self, name: &str) -> bool {
        self.objects.contains_key(name)
    }

    pub fn object(&self, name: &str) -> Result<&Object, RigError> {
        self.objects
            .get(name)
            .ok_or_else(|| RigError::ObjectNotFound(name.to_string()))
    }

    pub fn object_mut(&mut self, name: &str) -> Result<&mut Object, RigError> {
        self.objects
            .get_mut(name)
            .ok_or_else(|| RigError::ObjectNotFound(name.to_string()))
    }

    pub fn armature(&self, name: &str) -> Result<&Armature, RigError> {
        self.object(name)?
            .armature
            .as_ref()
            .ok_or_else(|| RigError::NotAnArmature(name.to_string()))
    }

    pub fn armature_mut(&mut self, name: &str) -> Result<&mut Armature, RigError> {
        self.object_mut(name)?
            .armature
            .as_mut()
            .ok_or_else(|| RigError::NotAnArmature(name.to_string()))
    }

    pub fn bone(&self, object: &str, bone: &str) -> Result<&PoseBone, RigError> {
        self.armature(object)?
            .bones
            .get(bone)
            .ok_or_else(|| RigError::BoneNotFound {
                object: object.to_string(),
                bone: bone.to_string(),
            })
    }

    pub fn bone_mut(&mut self, object: &str, bone: &str) -> Result<&mut PoseBone, RigError> {
        self.armature_mut(object)?
            .bones
            .get_mut(bone)
            .ok_or_else(|| RigError::BoneNotFound {
                object: object.to_string(),
                bone: bone.to_string(),
            })
    }

    // --- actions ---

    /// Add an action under a unique name derived from `name`. Returns the final name.
    pub fn add_action(&mut self, name: &str, action: Action) -> String {
        let final_name = unique_name(name, |n| self.actions.contains_key(n));
        self.actions.insert(final_name.clone(), action);
        final_name
    }

    pub fn action(&self, name: &str) -> Option<&Action> {
        self.actions.get(name)
    }

    pub fn action_mut(&mut self, name: &str) -> Option<&mut Action> {
        self.actions.get_mut(name)
    }

    /// Remove an action and clear every active-action and constraint reference to it.
    pub fn remove_action(&mut self, name: &str) -> Option<Action> {
        let removed = self.actions.shift_remove(name)?;
        self.retarget_action_refs(name, None);
        Some(removed)
    }

    /// Rename an action (uniquified) and update every reference. Returns the final name.
    pub fn rename_action(&mut self, old: &str, new: &str) -> Result<String, RigError> {
        if old == new {
            return Ok(old.to_string());
        }
        let action = self
            .actions
            .shift_remove(old)
            .ok_or_else(|| RigError::ActionNotFound(old.to_string()))?;
        let final_name = self.add_action(new, action);
        self.retarget_action_refs(old, Some(&final_name));
        Ok(final_name)
    }

    fn retarget_action_refs(&mut self, old: &str, new: Option<&str>) {
        let new = new.map(str::to_string);
        for obj in self.objects.values_mut() {
            if let Some(ad) = obj.animation_data.as_mut() {
                if ad.action.as_deref() == Some(old) {
                    ad.action = new.clone();
                }
            }
            let Some(arm) = obj.armature.as_mut() else {
                continue;
            };
            for bone in arm.bones.values_mut() {
                for c in bone.constraints.iter_mut() {
                    if c.action.as_deref() == Some(old) {
                        c.action = new.clone();
                    }
                }
            }
        }
    }

    /// Make `action` the active action of `object`, or clear it with `None`.
    ///
    /// An action already bound to another object kind is rejected. An unbound
    /// action becomes bound to the object's kind.
    pub fn assign_action(&mut self, object: &str, action: Option<&str>) -> Result<(), RigError> {
        let kind = self.object(object)?.kind;
        if let Some(name) = action {
            let act = self
                .actions
                .get_mut(name)
                .ok_or_else(|| RigError::ActionNotFound(name.to_string()))?;
            match act.id_root {
                Some(root) if root != kind => {
                    return Err(RigError::IncompatibleAction {
                        object: object.to_string(),
                        action: name.to_string(),
                        reason: format!(
                            "action animates {} data, object is {}",
                            root.as_str(),
                            kind.as_str()
                        ),
                    })
                }
                Some(_) => {}
                None => act.id_root = Some(kind),
            }
        }
        self.object_mut(object)?.animation_data_mut().action = action.map(str::to_string);
        Ok(())
    }

    // --- context ---

    pub fn set_mode(&mut self, mode: HostMode) {
        if self.mode != mode {
            log::debug!("host mode {:?} -> {:?}", self.mode, mode);
            self.mode = mode;
        }
    }

    pub fn set_active_object(&mut self, name: &str) -> Result<(), RigError> {
        self.object(name)?;
        self.active_object = Some(name.to_string());
        Ok(())
    }

    /// Switch the active object while in pose mode: leave to object mode,
    /// change the active object, then enter pose mode on it.
    pub fn switch_active_object(&mut self, name: &str) -> Result<(), RigError> {
        if self.active_object.as_deref() == Some(name) {
            return Ok(());
        }
        let restore_pose = self.mode == HostMode::Pose;
        self.set_mode(HostMode::Object);
        self.set_active_object(name)?;
        if restore_pose && self.object(name)?.kind == ObjectKind::Armature {
            self.set_mode(HostMode::Pose);
        }
        Ok(())
    }

    // --- properties ---

    /// Read a scalar property of `object` through a structured path.
    pub fn read_property(&self, object: &str, path: &PropertyPath) -> Result<f32, RigError> {
        let obj = self.object(object)?;
        let value = path.resolve(obj).map_err(RigError::Path)?;
        to_float(&value).ok_or_else(|| RigError::NotScalar(path.to_string()))
    }

    /// Write a scalar onto a writable property of `object`.
    ///
    /// Writable: custom properties on the object or a bone, the `eval_time`
    /// and `influence` of a bone constraint, and single components of object
    /// or bone transforms.
    pub fn write_property(
        &mut self,
        object: &str,
        path: &PropertyPath,
        value: f32,
    ) -> Result<(), RigError> {
        use PathSegment::{Field, Index, Key};
        let unwritable = || RigError::Unwritable(path.to_string());
        let obj = self.object_mut(object)?;
        match path.segments.as_slice() {
            [Key(key)] => {
                obj.properties.insert(key.clone(), Value::Float(value));
                Ok(())
            }
            [Field(attr), Index(i)] => {
                write_component(&mut obj.transform, attr, *i, value).ok_or_else(unwritable)
            }
            [Field(pose), Field(bones), Key(bone_name), rest @ ..]
                if pose == "pose" && bones == "bones" =>
            {
                let bone = obj
                    .armature
                    .as_mut()
                    .and_then(|arm| arm.bones.get_mut(bone_name))
                    .ok_or_else(|| RigError::BoneNotFound {
                        object: object.to_string(),
                        bone: bone_name.clone(),
                    })?;
                match rest {
                    [Key(key)] => {
                        bone.properties.insert(key.clone(), Value::Float(value));
                        Ok(())
                    }
                    [Field(constraints), Key(name), Field(attr)] if constraints == "constraints" => {
                        let c = bone.constraint_mut(name).ok_or_else(unwritable)?;
                        match attr.as_str() {
                            "eval_time" => c.eval_time = value,
                            "influence" => c.influence = value,
                            _ => return Err(unwritable()),
                        }
                        Ok(())
                    }
                    [Field(attr), Index(i)] => {
                        write_component(&mut bone.transform, attr, *i, value)
                            .ok_or_else(unwritable)
                    }
                    _ => Err(unwritable()),
                }
            }
            _ => Err(unwritable()),
        }
    }

    // --- transforms ---

    /// World transform of an object (empty `bone`) or of one of its bones.
    pub fn world_trs(&self, object: &str, bone: &str) -> Result<Trs, RigError> {
        let obj = self.object(object)?;
        let root = obj.transform.to_trs();
        if bone.is_empty() {
            return Ok(root);
        }
        let arm = self.armature(object)?;
        let mut chain = Vec::new();
        let mut cursor = Some(bone.to_string());
        while let Some(name) = cursor {
            let b = arm.bones.get(&name).ok_or_else(|| RigError::BoneNotFound {
                object: object.to_string(),
                bone: name.clone(),
            })?;
            chain.push(Trs::from_translation(b.head).compose(&b.transform.to_trs()));
            // parent loops are broken at the bone count
            if chain.len() > arm.bones.len() {
                break;
            }
            cursor = b.parent.clone();
        }
        Ok(chain
            .iter()
            .rev()
            .fold(root, |acc, local| acc.compose(local)))
    }

    /// Sample one transform channel of an object or bone.
    pub fn channel_value(
        &self,
        object: &str,
        bone: &str,
        channel: TransformChannel,
        space: TransformSpace,
        rotation_mode: ChannelRotationMode,
    ) -> Result<f32, RigError> {
        let axis = channel.axis();
        let local: &BoneTransform = if bone.is_empty() {
            &self.object(object)?.transform
        } else {
            &self.bone(object, bone)?.transform
        };
        let (trs, own_euler) = match space {
            TransformSpace::Local => (
                local.to_trs(),
                local
                    .rotation_mode
                    .euler_order()
                    .map(|order| (order, local.rotation_euler)),
            ),
            TransformSpace::World => (self.world_trs(object, bone)?, None),
        };
        Ok(match channel.kind() {
            ChannelKind::Location => trs.translation[axis],
            ChannelKind::Scale => trs.scale[axis],
            ChannelKind::Rotation => rotation_component(trs.rotation, own_euler, rotation_mode, axis),
        })
    }

    fn variable_value(&self, source: &VariableSource) -> Result<f32, RigError> {
        match source {
            VariableSource::TransformChannel {
                object,
                bone,
                channel,
                space,
                rotation_mode,
            } => self.channel_value(object, bone, *channel, *space, *rotation_mode),
            VariableSource::SingleProp { object, path } => self.read_property(object, path),
        }
    }

    /// Evaluate every driver on `object` and write results back where the
    /// target path is writable. Invalid drivers yield `value: None`.
    pub fn evaluate_drivers(&mut self, object: &str) -> Result<Vec<DriverOutput>, RigError> {
        let drivers = match &self.object(object)?.animation_data {
            Some(ad) => ad.drivers.clone(),
            None => return Ok(Vec::new()),
        };
        let mut outputs = Vec::with_capacity(drivers.len());
        for driver in drivers {
            let value = self.evaluate_driver(&driver.expression, &driver.variables);
            let value = match value {
                Ok(v) => Some(v),
                Err(err) => {
                    log::debug!("driver on '{}' is invalid: {err}", driver.data_path);
                    None
                }
            };
            let applied = match value {
                Some(v) => match self.write_property(object, &driver.data_path, v) {
                    Ok(()) => true,
                    Err(RigError::Unwritable(_)) => false,
                    Err(err) => {
                        log::debug!("driver output for '{}' dropped: {err}", driver.data_path);
                        false
                    }
                },
                None => false,
            };
            outputs.push(DriverOutput {
                data_path: driver.data_path,
                value,
                applied,
            });
        }
        Ok(outputs)
    }

    fn evaluate_driver(
        &self,
        expression: &str,
        variables: &[DriverVariable],
    ) -> Result<f32, RigError> {
        let expr = Expr::parse(expression)?;
        let values = variables
            .iter()
            .map(|v| Ok((v.name.as_str(), self.variable_value(&v.source)?)))
            .collect::<Result<Vec<(&str, f32)>, RigError>>()?;
        expr.eval(&|name: &str| values.iter().find(|(n, _)| *n == name).map(|(_, v)| *v))
    }
}

fn write_component(t: &mut BoneTransform, attr: &str, index: usize, value: f32) -> Option<()> {
    let slot = match attr {
        "location" => t.location.get_mut(index)?,
        "rotation_euler" => t.rotation_euler.get_mut(index)?,
        "rotation_quaternion" => t.rotation_quaternion.get_mut(index)?,
        "scale" => t.scale.get_mut(index)?,
        _ => return None,
    };
    *slot = value;
    Some(())
}

/// Read rotation component `axis` in radians.
///
/// Swing/twist modes give the twist angle on the twist axis and the swing's
/// XYZ euler angle on the other two.
fn rotation_component(
    q: [f32; 4],
    own_euler: Option<(EulerOrder, [f32; 3])>,
    mode: ChannelRotationMode,
    axis: usize,
) -> f32 {
    if let Some(order) = mode.euler_order() {
        return match own_euler {
            Some((own, euler)) if own == order => euler[axis],
            _ => quat_to_euler(q, order)[axis],
        };
    }
    if let Some(twist_axis) = mode.twist_axis() {
        let (swing, twist) = swing_twist(q, twist_axis);
        return if axis == twist_axis {
            twist
        } else {
            quat_to_euler(swing, EulerOrder::Xyz)[axis]
        };
    }
    match mode {
        ChannelRotationMode::Quaternion => q[axis + 1],
        _ => match own_euler {
            Some((_, euler)) => euler[axis],
            None => quat_to_euler(q, EulerOrder::Xyz)[axis],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::ActionConstraint;
    use crate::driver::Driver;
    use poser_api_core::RotationMode;

    fn scene() -> Scene {
        let mut scene = Scene::new();
        let rig = scene.add_object("Rig", Object::armature());
        let arm = rig.armature.as_mut().unwrap();
        arm.add_bone("Root", PoseBone::default());
        arm.add_bone("Jaw", PoseBone::with_parent("Root", [0.0, 1.0, 0.0]));
        scene.add_object("Cube", Object::new(ObjectKind::Mesh));
        scene
    }

    #[test]
    fn unique_names_increment_numeric_suffix() {
        let taken = ["Pose", "Pose.001"];
        assert_eq!(unique_name("Free", |n| taken.contains(&n)), "Free");
        assert_eq!(unique_name("Pose", |n| taken.contains(&n)), "Pose.002");
        assert_eq!(unique_name("Pose.001", |n| taken.contains(&n)), "Pose.002");
    }

    #[test]
    fn action_assignment_checks_kind() {
        let mut scene = scene();
        let name = scene.add_action("Smile", Action::default());
        scene.assign_action("Rig", Some(&name)).unwrap();
        assert_eq!(scene.object("Rig").unwrap().active_action(), Some("Smile"));
        assert_eq!(
            scene.action("Smile").unwrap().id_root,
            Some(ObjectKind::Armature)
        );
        let err = scene.assign_action("Cube", Some("Smile")).unwrap_err();
        assert!(matches!(err, RigError::IncompatibleAction { .. }));
        assert!(scene.assign_action("Rig", Some("Nope")).is_err());
    }

    #[test]
    fn rename_and_remove_action_update_references() {
        let mut scene = scene();
        scene.add_action("A", Action::default());
        scene.assign_action("Rig", Some("A")).unwrap();
        scene
            .bone_mut("Rig", "Jaw")
            .unwrap()
            .add_constraint(ActionConstraint {
                action: Some("A".into()),
                ..ActionConstraint::new("AP-a")
            });
        let renamed = scene.rename_action("A", "B").unwrap();
        assert_eq!(renamed, "B");
        assert_eq!(scene.object("Rig").unwrap().active_action(), Some("B"));
        scene.remove_action("B");
        assert_eq!(scene.object("Rig").unwrap().active_action(), None);
        let c = scene.bone("Rig", "Jaw").unwrap().constraint("AP-a").unwrap();
        assert_eq!(c.action, None);
    }

    #[test]
    fn world_space_follows_parent_chain() {
        let mut scene = scene();
        scene.bone_mut("Rig", "Root").unwrap().transform.location = [2.0, 0.0, 0.0];
        scene.bone_mut("Rig", "Jaw").unwrap().transform.location = [0.0, 0.5, 0.0];
        let local = scene
            .channel_value(
                "Rig",
                "Jaw",
                TransformChannel::LocY,
                TransformSpace::Local,
                ChannelRotationMode::Auto,
            )
            .unwrap();
        assert_eq!(local, 0.5);
        let world = scene.world_trs("Rig", "Jaw").unwrap();
        assert!((world.translation[0] - 2.0).abs() < 1e-5);
        assert!((world.translation[1] - 1.5).abs() < 1e-5);
    }

    #[test]
    fn euler_bones_read_their_own_angles() {
        let mut scene = scene();
        let t = &mut scene.bone_mut("Rig", "Jaw").unwrap().transform;
        t.rotation_mode = RotationMode::Xyz;
        t.rotation_euler = [0.25, 0.0, 0.0];
        let v = scene
            .channel_value(
                "Rig",
                "Jaw",
                TransformChannel::RotX,
                TransformSpace::Local,
                ChannelRotationMode::Auto,
            )
            .unwrap();
        assert!((v - 0.25).abs() < 1e-6);
        let twist = scene
            .channel_value(
                "Rig",
                "Jaw",
                TransformChannel::RotX,
                TransformSpace::Local,
                ChannelRotationMode::SwingTwistX,
            )
            .unwrap();
        assert!((twist - 0.25).abs() < 1e-5);
    }

    #[test]
    fn drivers_write_constraint_eval_time() {
        let mut scene = scene();
        scene.bone_mut("Rig", "Jaw").unwrap().transform.location = [0.0, 5.0, 0.0];
        scene
            .bone_mut("Rig", "Jaw")
            .unwrap()
            .add_constraint(ActionConstraint::new("AP-open"));
        let target = PropertyPath::parse("pose.bones[\"Jaw\"].constraints[\"AP-open\"].eval_time")
            .unwrap();
        let unbound = PropertyPath::parse("ap_poses[\"open\"].influence").unwrap();
        let var = DriverVariable {
            name: "var0".into(),
            source: VariableSource::TransformChannel {
                object: "Rig".into(),
                bone: "Jaw".into(),
                channel: TransformChannel::LocY,
                space: TransformSpace::Local,
                rotation_mode: ChannelRotationMode::Auto,
            },
        };
        let ad = scene.object_mut("Rig").unwrap().animation_data_mut();
        for path in [&target, &unbound] {
            ad.driver_add(Driver {
                data_path: path.clone(),
                expression: "min((var0 - 0.0) / (10.0 - 0.0))".into(),
                variables: vec![var.clone()],
            });
        }
        let outputs = scene.evaluate_drivers("Rig").unwrap();
        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs[0].value, Some(0.5));
        assert!(outputs[0].applied);
        assert_eq!(outputs[1].value, Some(0.5));
        assert!(!outputs[1].applied);
        let c = scene.bone("Rig", "Jaw").unwrap().constraint("AP-open").unwrap();
        assert_eq!(c.eval_time, 0.5);
    }

    #[test]
    fn custom_properties_read_and_write() {
        let mut scene = scene();
        let path = PropertyPath::parse("[\"smile\"]").unwrap();
        assert!(scene.read_property("Rig", &path).is_err());
        scene.write_property("Rig", &path, 0.0).unwrap();
        assert_eq!(scene.read_property("Rig", &path), Ok(0.0));
        let bad = PropertyPath::parse("type").unwrap();
        assert!(matches!(
            scene.read_property("Rig", &bad),
            Err(RigError::NotScalar(_))
        ));
        assert!(matches!(
            scene.write_property("Rig", &bad, 1.0),
            Err(RigError::Unwritable(_))
        ));
    }
}
