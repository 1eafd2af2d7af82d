//! Scene objects, armatures and pose bones, plus their reflective property view.

use hashbrown::HashMap;
use indexmap::IndexMap;
use poser_api_core::{PropertySource, Value};
use serde::{Deserialize, Serialize};

use crate::constraint::ActionConstraint;
use crate::driver::AnimationData;
use crate::scene::unique_name;
use crate::transform::BoneTransform;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObjectKind {
    #[default]
    Empty,
    Mesh,
    Armature,
}

impl ObjectKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ObjectKind::Empty => "EMPTY",
            ObjectKind::Mesh => "MESH",
            ObjectKind::Armature => "ARMATURE",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoseBone {
    pub parent: Option<String>,
    /// Rest offset from the parent (or armature origin), in parent space.
    pub head: [f32; 3],
    pub transform: BoneTransform,
    pub select: bool,
    pub constraints: Vec<ActionConstraint>,
    pub properties: HashMap<String, Value>,
}

impl PoseBone {
    pub fn with_parent(parent: impl Into<String>, head: [f32; 3]) -> Self {
        Self {
            parent: Some(parent.into()),
            head,
            ..Default::default()
        }
    }

    /// Add a constraint, renaming it `Name.001`-style if the name is taken.
    /// Returns the final name.
    pub fn add_constraint(&mut self, mut constraint: ActionConstraint) -> String {
        let taken = |n: &str| self.constraints.iter().any(|c| c.name == n);
        constraint.name = unique_name(&constraint.name, taken);
        let name = constraint.name.clone();
        self.constraints.push(constraint);
        name
    }

    pub fn constraint(&self, name: &str) -> Option<&ActionConstraint> {
        self.constraints.iter().find(|c| c.name == name)
    }

    pub fn constraint_mut(&mut self, name: &str) -> Option<&mut ActionConstraint> {
        self.constraints.iter_mut().find(|c| c.name == name)
    }

    /// Remove every constraint whose name satisfies `pred`, returning the removed names.
    pub fn remove_constraints_where<F>(&mut self, pred: F) -> Vec<String>
    where
        F: Fn(&str) -> bool,
    {
        let mut removed = Vec::new();
        self.constraints.retain(|c| {
            if pred(&c.name) {
                removed.push(c.name.clone());
                false
            } else {
                true
            }
        });
        removed
    }

    fn to_value(&self) -> Value {
        let t = &self.transform;
        let constraints = self
            .constraints
            .iter()
            .map(|c| (c.name.clone(), constraint_value(c)));
        let mut fields: HashMap<String, Value> = self.properties.clone();
        fields.extend([
            ("location".to_string(), Value::Vec3(t.location)),
            ("rotation_euler".to_string(), Value::Vec3(t.rotation_euler)),
            (
                "rotation_quaternion".to_string(),
                Value::Quat(t.rotation_quaternion),
            ),
            (
                "rotation_mode".to_string(),
                Value::text(enum_name(&t.rotation_mode)),
            ),
            ("scale".to_string(), Value::Vec3(t.scale)),
            ("head".to_string(), Value::Vec3(self.head)),
            ("select".to_string(), Value::Bool(self.select)),
            (
                "parent".to_string(),
                Value::text(self.parent.clone().unwrap_or_default()),
            ),
            ("constraints".to_string(), Value::record(constraints)),
        ]);
        Value::Record(fields)
    }
}

fn enum_name<T: Serialize>(v: &T) -> String {
    match serde_json::to_value(v) {
        Ok(serde_json::Value::String(s)) => s,
        _ => String::new(),
    }
}

fn constraint_value(c: &ActionConstraint) -> Value {
    Value::record([
        ("name", Value::text(c.name.clone())),
        ("enabled", Value::Bool(c.enabled)),
        ("action", Value::text(c.action.clone().unwrap_or_default())),
        ("frame_start", Value::Int(c.frame_start as i64)),
        ("frame_end", Value::Int(c.frame_end as i64)),
        ("mix_mode", Value::text(enum_name(&c.mix_mode))),
        ("influence", Value::Float(c.influence)),
        ("use_eval_time", Value::Bool(c.use_eval_time)),
        ("eval_time", Value::Float(c.eval_time)),
    ])
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Armature {
    /// Pose bones in hierarchy-independent, stable order.
    pub bones: IndexMap<String, PoseBone>,
    pub active_bone: Option<String>,
}

impl Armature {
    pub fn add_bone(&mut self, name: impl Into<String>, bone: PoseBone) {
        self.bones.insert(name.into(), bone);
    }

    pub fn has_bone(&self, name: &str) -> bool {
        self.bones.contains_key(name)
    }

    pub fn selected_bones(&self) -> Vec<String> {
        self.bones
            .iter()
            .filter(|(_, b)| b.select)
            .map(|(n, _)| n.clone())
            .collect()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Object {
    pub kind: ObjectKind,
    pub transform: BoneTransform,
    pub armature: Option<Armature>,
    pub animation_data: Option<AnimationData>,
    /// Custom properties, addressed as `["name"]`.
    pub properties: HashMap<String, Value>,
}

impl Object {
    pub fn new(kind: ObjectKind) -> Self {
        Self {
            kind,
            armature: (kind == ObjectKind::Armature).then(Armature::default),
            ..Default::default()
        }
    }

    pub fn armature() -> Self {
        Self::new(ObjectKind::Armature)
    }

    /// Animation data, created on first use.
    pub fn animation_data_mut(&mut self) -> &mut AnimationData {
        self.animation_data.get_or_insert_with(AnimationData::default)
    }

    pub fn active_action(&self) -> Option<&str> {
        self.animation_data
            .as_ref()
            .and_then(|ad| ad.action.as_deref())
    }
}

impl PropertySource for Object {
    fn field(&self, name: &str) -> Option<Value> {
        let t = &self.transform;
        match name {
            "type" => Some(Value::text(self.kind.as_str())),
            "location" => Some(Value::Vec3(t.location)),
            "rotation_euler" => Some(Value::Vec3(t.rotation_euler)),
            "rotation_quaternion" => Some(Value::Quat(t.rotation_quaternion)),
            "rotation_mode" => Some(Value::text(enum_name(&t.rotation_mode))),
            "scale" => Some(Value::Vec3(t.scale)),
            "pose" => self.armature.as_ref().map(|arm| {
                let bones = arm.bones.iter().map(|(n, b)| (n.clone(), b.to_value()));
                Value::record([("bones", Value::record(bones))])
            }),
            "animation_data" => self.animation_data.as_ref().map(|ad| {
                Value::record([("action", Value::text(ad.action.clone().unwrap_or_default()))])
            }),
            _ => None,
        }
    }

    fn key(&self, key: &str) -> Option<Value> {
        self.properties.get(key).cloned()
    }
}
