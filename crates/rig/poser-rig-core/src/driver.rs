//! Drivers: scripted expressions bound to a property path, fed by variables that
//! read live transform channels or single properties.

use poser_api_core::{EulerOrder, PropertyPath};
use serde::{Deserialize, Serialize};

/// Component family of a [`TransformChannel`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    Location,
    Rotation,
    Scale,
}

/// One of the nine readable transform components.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransformChannel {
    #[default]
    LocX,
    LocY,
    LocZ,
    RotX,
    RotY,
    RotZ,
    ScaleX,
    ScaleY,
    ScaleZ,
}

impl TransformChannel {
    pub const ALL: [TransformChannel; 9] = [
        TransformChannel::LocX,
        TransformChannel::LocY,
        TransformChannel::LocZ,
        TransformChannel::RotX,
        TransformChannel::RotY,
        TransformChannel::RotZ,
        TransformChannel::ScaleX,
        TransformChannel::ScaleY,
        TransformChannel::ScaleZ,
    ];

    pub fn kind(self) -> ChannelKind {
        match self {
            TransformChannel::LocX | TransformChannel::LocY | TransformChannel::LocZ => {
                ChannelKind::Location
            }
            TransformChannel::RotX | TransformChannel::RotY | TransformChannel::RotZ => {
                ChannelKind::Rotation
            }
            _ => ChannelKind::Scale,
        }
    }

    /// Axis index: 0 for X, 1 for Y, 2 for Z.
    pub fn axis(self) -> usize {
        match self {
            TransformChannel::LocX | TransformChannel::RotX | TransformChannel::ScaleX => 0,
            TransformChannel::LocY | TransformChannel::RotY | TransformChannel::ScaleY => 1,
            _ => 2,
        }
    }

    pub fn is_rotation(self) -> bool {
        self.kind() == ChannelKind::Rotation
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransformSpace {
    #[default]
    #[serde(rename = "WORLD_SPACE")]
    World,
    #[serde(rename = "LOCAL_SPACE")]
    Local,
}

/// How a rotation channel is decomposed before a component is read.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChannelRotationMode {
    /// The source's own euler order, or XYZ for quaternion sources.
    #[default]
    Auto,
    Xyz,
    Xzy,
    Yxz,
    Yzx,
    Zxy,
    Zyx,
    /// Raw quaternion x/y/z components.
    Quaternion,
    SwingTwistX,
    SwingTwistY,
    SwingTwistZ,
}

impl ChannelRotationMode {
    pub fn euler_order(self) -> Option<EulerOrder> {
        match self {
            ChannelRotationMode::Xyz => Some(EulerOrder::Xyz),
            ChannelRotationMode::Xzy => Some(EulerOrder::Xzy),
            ChannelRotationMode::Yxz => Some(EulerOrder::Yxz),
            ChannelRotationMode::Yzx => Some(EulerOrder::Yzx),
            ChannelRotationMode::Zxy => Some(EulerOrder::Zxy),
            ChannelRotationMode::Zyx => Some(EulerOrder::Zyx),
            _ => None,
        }
    }

    /// Twist axis index for the swing/twist modes.
    pub fn twist_axis(self) -> Option<usize> {
        match self {
            ChannelRotationMode::SwingTwistX => Some(0),
            ChannelRotationMode::SwingTwistY => Some(1),
            ChannelRotationMode::SwingTwistZ => Some(2),
            _ => None,
        }
    }
}

/// Where a driver variable reads its value from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VariableSource {
    /// A transform component of an object, or of one of its bones when `bone` is set.
    TransformChannel {
        object: String,
        #[serde(default)]
        bone: String,
        channel: TransformChannel,
        #[serde(default)]
        space: TransformSpace,
        #[serde(default)]
        rotation_mode: ChannelRotationMode,
    },
    /// Any scalar property reachable from the object by path.
    SingleProp { object: String, path: PropertyPath },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DriverVariable {
    pub name: String,
    pub source: VariableSource,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Driver {
    pub data_path: PropertyPath,
    pub expression: String,
    #[serde(default)]
    pub variables: Vec<DriverVariable>,
}

/// Result of evaluating one driver.
#[derive(Clone, Debug, PartialEq)]
pub struct DriverOutput {
    pub data_path: PropertyPath,
    /// `None` when the driver is invalid (bad expression or unreadable variable).
    pub value: Option<f32>,
    /// Whether the value was written onto the owning object.
    pub applied: bool,
}

/// Per-object animation state: the active action and the driver stack.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationData {
    pub action: Option<String>,
    pub drivers: Vec<Driver>,
}

impl AnimationData {
    /// Add a driver on `data_path`, replacing any driver already bound there.
    pub fn driver_add(&mut self, driver: Driver) -> &mut Driver {
        self.drivers.retain(|d| d.data_path != driver.data_path);
        self.drivers.push(driver);
        let last = self.drivers.len() - 1;
        &mut self.drivers[last]
    }

    pub fn driver(&self, data_path: &PropertyPath) -> Option<&Driver> {
        self.drivers.iter().find(|d| &d.data_path == data_path)
    }

    /// Remove the driver bound to `data_path`. Returns whether one existed.
    pub fn driver_remove(&mut self, data_path: &PropertyPath) -> bool {
        let before = self.drivers.len();
        self.drivers.retain(|d| &d.data_path != data_path);
        before != self.drivers.len()
    }

    /// Remove every driver whose path satisfies `pred`. Returns how many were removed.
    pub fn drivers_remove_where<F>(&mut self, pred: F) -> usize
    where
        F: Fn(&PropertyPath) -> bool,
    {
        let before = self.drivers.len();
        self.drivers.retain(|d| !pred(&d.data_path));
        before - self.drivers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_axes_and_kinds() {
        assert_eq!(TransformChannel::RotY.axis(), 1);
        assert!(TransformChannel::RotY.is_rotation());
        assert_eq!(TransformChannel::ScaleZ.kind(), ChannelKind::Scale);
        assert_eq!(TransformChannel::ALL.len(), 9);
    }

    #[test]
    fn driver_add_replaces_same_path() {
        let path = PropertyPath::parse("[\"x\"]").unwrap();
        let mut ad = AnimationData::default();
        ad.driver_add(Driver {
            data_path: path.clone(),
            expression: "1".into(),
            variables: vec![],
        });
        ad.driver_add(Driver {
            data_path: path.clone(),
            expression: "2".into(),
            variables: vec![],
        });
        assert_eq!(ad.drivers.len(), 1);
        assert_eq!(ad.driver(&path).unwrap().expression, "2");
        assert!(ad.driver_remove(&path));
        assert!(!ad.driver_remove(&path));
    }

    #[test]
    fn variable_source_serde_is_tagged() {
        let src = VariableSource::TransformChannel {
            object: "Rig".into(),
            bone: "Jaw".into(),
            channel: TransformChannel::RotX,
            space: TransformSpace::Local,
            rotation_mode: ChannelRotationMode::SwingTwistY,
        };
        let json = serde_json::to_value(&src).unwrap();
        assert_eq!(json["type"], "TRANSFORM_CHANNEL");
        assert_eq!(json["space"], "LOCAL_SPACE");
        assert_eq!(json["rotation_mode"], "SWING_TWIST_Y");
        let back: VariableSource = serde_json::from_value(json).unwrap();
        assert_eq!(back, src);
    }
}
