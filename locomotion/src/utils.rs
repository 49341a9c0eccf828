use nalgebra::Vector3;

use crate::types::{Rot3, Vec3};

/// Planar (XZ) length of a displacement.
#[inline]
pub fn planar_length(v: &Vec3) -> f32 {
    (v.x * v.x + v.z * v.z).sqrt()
}

/// Slope (radians) of a displacement in its vertical plane: `atan(|y| / planar)`.
///
/// A purely vertical displacement is π/2; a zero displacement is flat (0).
#[inline]
pub fn vertical_slope(v: &Vec3) -> f32 {
    let planar = planar_length(v);
    if planar == 0.0 {
        return if v.y == 0.0 {
            0.0
        } else {
            std::f32::consts::FRAC_PI_2
        };
    }
    (v.y.abs() / planar).atan()
}

/// Returns true if `a` and `b` differ by less than `eps` on every axis.
#[inline]
pub fn vectors_equal(a: &Vec3, b: &Vec3, eps: f32) -> bool {
    (a.x - b.x).abs() < eps && (a.y - b.y).abs() < eps && (a.z - b.z).abs() < eps
}

/// Rotation about +Y by `yaw` radians.
#[inline]
pub fn yaw_rotation(yaw: f32) -> Rot3 {
    Rot3::from_axis_angle(&Vector3::y_axis(), yaw)
}

/// World-space facing of a node with the given yaw (local +Z rotated about +Y).
#[inline]
pub fn forward_from_yaw(yaw: f32) -> Vec3 {
    yaw_rotation(yaw) * Vec3::z()
}

/// Convert a point-of-view displacement (`right`, `up`, `forward`) into world space for a
/// node with the given yaw.
///
/// Meshes are modelled facing local -Z, so the planar axes are negated before rotating.
/// Callers compensate through the face-forward sign (see `Facing`).
#[inline]
pub fn pov_displacement(yaw: f32, right: f32, up: f32, forward: f32) -> Vec3 {
    yaw_rotation(yaw) * Vec3::new(-right, up, -forward)
}
