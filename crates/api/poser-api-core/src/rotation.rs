//! Rotation helpers:
//! - euler <-> quaternion conversion for all six axis orders
//! - quaternion products and normalization
//! - swing/twist decomposition used by driver rotation modes
//!
//! Quaternions are host-style `(w, x, y, z)`. Euler angles are radians stored
//! as `[x, y, z]` regardless of the order they are applied in.

use serde::{Deserialize, Serialize};

pub const QUAT_IDENTITY: [f32; 4] = [1.0, 0.0, 0.0, 0.0];

/// Order in which euler axes are applied (`Xyz` applies X first).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EulerOrder {
    #[default]
    Xyz,
    Xzy,
    Yxz,
    Yzx,
    Zxy,
    Zyx,
}

impl EulerOrder {
    /// Axis indices in application order.
    pub fn axes(self) -> [usize; 3] {
        match self {
            EulerOrder::Xyz => [0, 1, 2],
            EulerOrder::Xzy => [0, 2, 1],
            EulerOrder::Yxz => [1, 0, 2],
            EulerOrder::Yzx => [1, 2, 0],
            EulerOrder::Zxy => [2, 0, 1],
            EulerOrder::Zyx => [2, 1, 0],
        }
    }

    /// Cyclic orders (XYZ, YZX, ZXY) have even parity.
    fn parity(self) -> f32 {
        match self {
            EulerOrder::Xyz | EulerOrder::Yzx | EulerOrder::Zxy => 1.0,
            _ => -1.0,
        }
    }
}

/// How a transform stores its rotation.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RotationMode {
    #[default]
    Quaternion,
    Xyz,
    Xzy,
    Yxz,
    Yzx,
    Zxy,
    Zyx,
}

impl RotationMode {
    /// The euler order, or `None` for quaternion storage.
    pub fn euler_order(self) -> Option<EulerOrder> {
        match self {
            RotationMode::Quaternion => None,
            RotationMode::Xyz => Some(EulerOrder::Xyz),
            RotationMode::Xzy => Some(EulerOrder::Xzy),
            RotationMode::Yxz => Some(EulerOrder::Yxz),
            RotationMode::Yzx => Some(EulerOrder::Yzx),
            RotationMode::Zxy => Some(EulerOrder::Zxy),
            RotationMode::Zyx => Some(EulerOrder::Zyx),
        }
    }
}

#[inline]
fn dot4(a: [f32; 4], b: [f32; 4]) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2] + a[3] * b[3]
}

/// Normalize a quaternion; a zero quaternion becomes identity.
#[inline]
pub fn quat_normalize(q: [f32; 4]) -> [f32; 4] {
    let len2 = dot4(q, q);
    if len2 > 0.0 {
        let inv = len2.sqrt().recip();
        [q[0] * inv, q[1] * inv, q[2] * inv, q[3] * inv]
    } else {
        QUAT_IDENTITY
    }
}

/// Hamilton product `a * b` (apply `b` first, then `a`).
pub fn quat_mul(a: [f32; 4], b: [f32; 4]) -> [f32; 4] {
    let [aw, ax, ay, az] = a;
    let [bw, bx, by, bz] = b;
    [
        aw * bw - ax * bx - ay * by - az * bz,
        aw * bx + ax * bw + ay * bz - az * by,
        aw * by - ax * bz + ay * bw + az * bx,
        aw * bz + ax * by - ay * bx + az * bw,
    ]
}

/// Rotate vector `v` by unit quaternion `q`.
pub fn quat_rotate(q: [f32; 4], v: [f32; 3]) -> [f32; 3] {
    let p = [0.0, v[0], v[1], v[2]];
    let conj = [q[0], -q[1], -q[2], -q[3]];
    let r = quat_mul(quat_mul(q, p), conj);
    [r[1], r[2], r[3]]
}

fn axis_quat(axis: usize, angle: f32) -> [f32; 4] {
    let (s, c) = (angle * 0.5).sin_cos();
    let mut q = [c, 0.0, 0.0, 0.0];
    q[axis + 1] = s;
    q
}

/// Convert euler angles applied in `order` into a quaternion.
pub fn euler_to_quat(euler: [f32; 3], order: EulerOrder) -> [f32; 4] {
    let [i, j, k] = order.axes();
    let qi = axis_quat(i, euler[i]);
    let qj = axis_quat(j, euler[j]);
    let qk = axis_quat(k, euler[k]);
    quat_mul(qk, quat_mul(qj, qi))
}

/// Row-major rotation matrix for a unit quaternion (column-vector convention).
pub fn quat_to_mat3(q: [f32; 4]) -> [[f32; 3]; 3] {
    let [w, x, y, z] = quat_normalize(q);
    [
        [
            1.0 - 2.0 * (y * y + z * z),
            2.0 * (x * y - w * z),
            2.0 * (x * z + w * y),
        ],
        [
            2.0 * (x * y + w * z),
            1.0 - 2.0 * (x * x + z * z),
            2.0 * (y * z - w * x),
        ],
        [
            2.0 * (x * z - w * y),
            2.0 * (y * z + w * x),
            1.0 - 2.0 * (x * x + y * y),
        ],
    ]
}

/// Convert a quaternion into euler angles for `order`.
///
/// Near gimbal lock the last axis is pinned to zero and the first absorbs the
/// remaining rotation.
pub fn quat_to_euler(q: [f32; 4], order: EulerOrder) -> [f32; 3] {
    let m = quat_to_mat3(q);
    let [i, j, k] = order.axes();
    let s = order.parity();

    let cos_b = m[k][j].hypot(m[k][k]);
    let b = (-s * m[k][i]).atan2(cos_b);
    let (a, c) = if cos_b > 1e-6 {
        (
            (s * m[k][j]).atan2(m[k][k]),
            (s * m[j][i]).atan2(m[i][i]),
        )
    } else {
        ((-s * m[j][k]).atan2(m[j][j]), 0.0)
    };

    let mut out = [0.0; 3];
    out[i] = a;
    out[j] = b;
    out[k] = c;
    out
}

/// Split `q` into `(swing, twist_angle)` where twist is about `axis` and
/// `q = swing * twist`.
pub fn swing_twist(q: [f32; 4], axis: usize) -> ([f32; 4], f32) {
    let q = quat_normalize(q);
    let t = [q[0], q[axis + 1]];
    let len = (t[0] * t[0] + t[1] * t[1]).sqrt();
    if len < 1e-6 {
        return (q, 0.0);
    }
    let mut twist = [t[0] / len, 0.0, 0.0, 0.0];
    twist[axis + 1] = t[1] / len;
    let angle = 2.0 * twist[axis + 1].atan2(twist[0]);
    let twist_inv = [twist[0], -twist[1], -twist[2], -twist[3]];
    let swing = quat_mul(q, twist_inv);
    (swing, angle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    const ORDERS: [EulerOrder; 6] = [
        EulerOrder::Xyz,
        EulerOrder::Xzy,
        EulerOrder::Yxz,
        EulerOrder::Yzx,
        EulerOrder::Zxy,
        EulerOrder::Zyx,
    ];

    fn approx3(a: [f32; 3], b: [f32; 3]) {
        for n in 0..3 {
            assert!((a[n] - b[n]).abs() < 1e-4, "left={a:?} right={b:?}");
        }
    }

    #[test]
    fn euler_round_trips_for_every_order() {
        let e = [0.3, -0.4, 0.5];
        for order in ORDERS {
            let q = euler_to_quat(e, order);
            approx3(quat_to_euler(q, order), e);
        }
    }

    #[test]
    fn single_axis_rotation_reads_back_on_its_axis() {
        let q = euler_to_quat([0.0, 0.0, FRAC_PI_2], EulerOrder::Xyz);
        let v = quat_rotate(q, [1.0, 0.0, 0.0]);
        approx3(v, [0.0, 1.0, 0.0]);
        for order in ORDERS {
            approx3(quat_to_euler(q, order), [0.0, 0.0, FRAC_PI_2]);
        }
    }

    #[test]
    fn swing_twist_extracts_pure_twist() {
        let q = euler_to_quat([0.0, 0.7, 0.0], EulerOrder::Xyz);
        let (swing, twist) = swing_twist(q, 1);
        assert!((twist - 0.7).abs() < 1e-5);
        assert!((swing[0] - 1.0).abs() < 1e-5);
    }

    #[test]
    fn rotation_mode_serde_names() {
        let json = serde_json::to_string(&RotationMode::Yzx).unwrap();
        assert_eq!(json, "\"YZX\"");
        assert_eq!(RotationMode::Quaternion.euler_order(), None);
    }
}
